use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use serde::Serialize;

use ssis_model::{ParameterSource, ParameterTable};
use ssis_project::BuildReport;

/// A parameter as shown to the user, with secrets masked.
#[derive(Debug, Serialize)]
pub struct ParameterRow<'a> {
    pub name: &'a str,
    pub value: Option<&'a str>,
    pub sensitive: bool,
    pub source: ParameterSource,
}

pub fn parameter_rows(table: &ParameterTable) -> Vec<ParameterRow<'_>> {
    table
        .iter()
        .map(|parameter| ParameterRow {
            name: parameter.name(),
            value: parameter.value().map(|_| parameter.display_value()),
            sensitive: parameter.is_sensitive(),
            source: parameter.source(),
        })
        .collect()
}

pub fn parameters_json(table: &ParameterTable) -> serde_json::Value {
    serde_json::json!({
        "count": table.len(),
        "parameters": parameter_rows(table),
    })
}

pub fn parameters_table(table: &ParameterTable) -> Table {
    let mut output = Table::new();
    output.set_header(vec![
        header_cell("Parameter"),
        header_cell("Value"),
        header_cell("Source"),
    ]);
    apply_table_style(&mut output);
    for parameter in table {
        let value = if parameter.value().is_none() || parameter.is_sensitive() {
            Cell::new(parameter.display_value()).add_attribute(Attribute::Dim)
        } else {
            Cell::new(parameter.display_value())
        };
        output.add_row(vec![
            Cell::new(parameter.name()),
            value,
            source_cell(parameter.source()),
        ]);
    }
    output
}

pub fn print_build_report(report: &BuildReport) {
    println!("Artifact: {}", report.output_path.display());
    println!("Protection level: {}", report.protection_level);
    println!("Parameters: {}", report.parameter_count);
    println!("SHA-256: {}", report.sha256);
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn header_cell(text: &str) -> Cell {
    Cell::new(text).add_attribute(Attribute::Bold)
}

fn source_cell(source: ParameterSource) -> Cell {
    let cell = Cell::new(source.as_str());
    match source {
        ParameterSource::Default => cell,
        ParameterSource::Configuration => cell.fg(Color::Cyan),
        ParameterSource::UserConfiguration => cell.fg(Color::Yellow),
        ParameterSource::Manual => cell.fg(Color::Green),
    }
}
