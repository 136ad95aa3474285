//! The merged parameter table of a project.

use std::collections::BTreeMap;
use std::collections::btree_map::Values;

use serde::{Deserialize, Serialize};

use crate::parameter::{Parameter, ParameterSource};

/// Name-keyed parameter store.
///
/// Every explicit update is applied; callers are responsible for applying
/// sources in increasing precedence order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterTable {
    entries: BTreeMap<String, Parameter>,
}

impl ParameterTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a declaration. Later declarations win.
    pub fn declare(&mut self, parameter: Parameter) {
        self.entries.insert(parameter.name().to_string(), parameter);
    }

    /// Seeds the table from a sequence of declarations.
    pub fn extend<I>(&mut self, parameters: I)
    where
        I: IntoIterator<Item = Parameter>,
    {
        for parameter in parameters {
            self.declare(parameter);
        }
    }

    /// Sets the value of a known parameter.
    ///
    /// Unknown names are ignored so configuration entries for parameters the
    /// project no longer declares do not break a build. Returns whether a
    /// parameter was updated.
    pub fn update(&mut self, name: &str, value: Option<String>, source: ParameterSource) -> bool {
        match self.entries.get_mut(name) {
            Some(parameter) => {
                parameter.set(value, source);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parameters in name order.
    pub fn iter(&self) -> Values<'_, String, Parameter> {
        self.entries.values()
    }
}

impl<'a> IntoIterator for &'a ParameterTable {
    type Item = &'a Parameter;
    type IntoIter = Values<'a, String, Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl std::ops::Index<&str> for ParameterTable {
    type Output = Parameter;

    fn index(&self, name: &str) -> &Self::Output {
        &self.entries[name]
    }
}
