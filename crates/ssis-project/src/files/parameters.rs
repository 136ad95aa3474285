//! Reading and writing `SSIS:Parameter` declarations.
//!
//! ```xml
//! <SSIS:Parameter SSIS:Name="Url">
//!   <SSIS:Properties>
//!     <SSIS:Property SSIS:Name="Sensitive">0</SSIS:Property>
//!     <SSIS:Property SSIS:Name="Value">http://example</SSIS:Property>
//!   </SSIS:Properties>
//! </SSIS:Parameter>
//! ```

use ssis_model::Parameter;

use crate::codec::is_sensitive;
use crate::xml::{XmlElement, XmlNode};

/// Prefix of a qualified element name, including the colon.
pub(crate) fn prefix_of(element: &XmlElement) -> &str {
    match element.name.rfind(':') {
        Some(index) => &element.name[..=index],
        None => "",
    }
}

/// The `Property` element named `name` below `Properties`.
pub(crate) fn property<'a>(element: &'a XmlElement, name: &str) -> Option<&'a XmlElement> {
    element
        .child("Properties")?
        .children("Property")
        .find(|property| property.attribute_local("Name") == Some(name))
}

pub(crate) fn property_mut<'a>(
    element: &'a mut XmlElement,
    name: &str,
) -> Option<&'a mut XmlElement> {
    element
        .child_mut("Properties")?
        .children_mut("Property")
        .find(|property| property.attribute_local("Name") == Some(name))
}

/// Returns the named property, creating it (and `Properties`) if absent.
pub(crate) fn ensure_property<'a>(element: &'a mut XmlElement, name: &str) -> &'a mut XmlElement {
    let prefix = prefix_of(element).to_string();
    element
        .find_or_insert(
            |child| child.local_name() == "Properties",
            || XmlElement::new(format!("{prefix}Properties")),
        )
        .find_or_insert(
            |child| child.local_name() == "Property" && child.attribute_local("Name") == Some(name),
            || {
                XmlElement::new(format!("{prefix}Property"))
                    .with_attribute(format!("{prefix}Name"), name)
            },
        )
}

fn declares_sensitive(element: &XmlElement) -> bool {
    property(element, "Sensitive").is_some_and(|flag| flag.text().trim() == "1")
        || property(element, "Value").is_some_and(is_sensitive)
}

/// Marks the `Value` property of a sensitive parameter so the codec
/// protects it.
pub(crate) fn mark_sensitive_value(element: &mut XmlElement) {
    if !declares_sensitive(element) {
        return;
    }
    let prefix = prefix_of(element).to_string();
    if let Some(value) = property_mut(element, "Value") {
        if !is_sensitive(value) {
            value.set_attribute(format!("{prefix}Sensitive"), "1");
        }
    }
}

/// Reads a declaration as a parameter keyed by `key`.
pub(crate) fn read_parameter(element: &XmlElement, key: String) -> Parameter {
    let sensitive = declares_sensitive(element);
    let value = property(element, "Value").and_then(|value| {
        if value.attribute_local("nil") == Some("true") || (sensitive && !value.has_text()) {
            None
        } else {
            Some(value.text())
        }
    });
    Parameter::declared(key, value, sensitive)
}

/// Writes a value into a declaration's `Value` property.
///
/// A null value empties the property of a sensitive declaration and removes
/// it from any other, so both read back as null.
pub(crate) fn write_value(element: &mut XmlElement, value: Option<&str>) {
    let sensitive = declares_sensitive(element);
    if value.is_none() && !sensitive {
        if let Some(properties) = element.child_mut("Properties") {
            properties.children.retain(|node| {
                !matches!(node, XmlNode::Element(property)
                    if property.local_name() == "Property"
                        && property.attribute_local("Name") == Some("Value"))
            });
        }
        return;
    }
    let prefix = prefix_of(element).to_string();
    let value_property = ensure_property(element, "Value");
    value_property.set_text(value);
    if sensitive && !is_sensitive(value_property) {
        value_property.set_attribute(format!("{prefix}Sensitive"), "1");
    }
}

/// Declared name of a parameter element.
pub(crate) fn declared_name(element: &XmlElement) -> Option<&str> {
    element.attribute_local("Name")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn declaration(sensitive: &str, value: Option<&str>) -> XmlElement {
        let mut properties = XmlElement::new("SSIS:Properties").with_child(
            XmlElement::new("SSIS:Property")
                .with_attribute("SSIS:Name", "Sensitive")
                .with_text(sensitive),
        );
        if let Some(value) = value {
            properties = properties.with_child(
                XmlElement::new("SSIS:Property")
                    .with_attribute("SSIS:Name", "Value")
                    .with_text(value),
            );
        }
        XmlElement::new("SSIS:Parameter")
            .with_attribute("SSIS:Name", "P")
            .with_child(properties)
    }

    #[test]
    fn reads_plain_value() {
        let parameter = read_parameter(&declaration("0", Some("abc")), "Project::P".into());
        assert_eq!(parameter.value(), Some("abc"));
        assert!(!parameter.is_sensitive());
    }

    #[test]
    fn stripped_sensitive_value_is_null() {
        let mut element = declaration("1", Some(""));
        mark_sensitive_value(&mut element);
        let parameter = read_parameter(&element, "Project::P".into());
        assert!(parameter.is_sensitive());
        assert_eq!(parameter.value(), None);
        assert!(is_sensitive(property(&element, "Value").unwrap()));
    }

    #[test]
    fn write_creates_missing_value_property() {
        let mut element = declaration("1", None);
        write_value(&mut element, Some("secret"));
        let value = property(&element, "Value").unwrap();
        assert_eq!(value.text(), "secret");
        assert_eq!(value.attribute("SSIS:Sensitive"), Some("1"));
        assert_eq!(value.name, "SSIS:Property");
    }

    #[test]
    fn writing_null_removes_value_property() {
        let mut element = declaration("0", Some("abc"));
        write_value(&mut element, None);
        assert!(property(&element, "Value").is_none());
        assert!(property(&element, "Sensitive").is_some());
        assert_eq!(read_parameter(&element, "Project::P".into()).value(), None);
    }
}
