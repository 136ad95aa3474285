//! Argument parsing and output formatting for `ssis-build`.

use std::path::Path;

use clap::Parser;
use ssis_cli::cli::{Cli, Command};
use ssis_cli::commands::build_options;
use ssis_cli::summary::{parameter_rows, parameters_json};
use ssis_model::{Parameter, ParameterSource, ParameterTable, ProtectionLevel};

fn build_args(args: &[&str]) -> ssis_cli::cli::BuildArgs {
    let cli = Cli::try_parse_from(args).unwrap();
    match cli.command {
        Command::Build(args) => args,
        Command::Params(_) => panic!("expected build command"),
    }
}

fn sample_table() -> ParameterTable {
    let mut table = ParameterTable::new();
    table.declare(Parameter::declared("Project::Empty", None, false));
    table.declare(Parameter::declared(
        "Project::Password",
        Some("hunter2".into()),
        true,
    ));
    table.declare(Parameter::declared("Project::Url", Some("http://a".into()), false));
    table.update(
        "Project::Url",
        Some("http://x".into()),
        ParameterSource::Configuration,
    );
    table
}

#[test]
fn build_flags_map_onto_options() {
    let args = build_args(&[
        "ssis-build",
        "build",
        "Warehouse.dtproj",
        "-c",
        "Dev",
        "--protection-level",
        "EncryptSensitiveWithPassword",
        "--new-password",
        "pw",
        "-p",
        "Project::P1=X",
        "--parameter",
        "Project::Url=http://a?b=c",
        "--version-build",
        "12",
    ]);
    let options = build_options(&args);

    assert_eq!(args.project, Path::new("Warehouse.dtproj"));
    assert_eq!(options.configuration, "Dev");
    assert_eq!(
        options.protection_level,
        Some(ProtectionLevel::EncryptSensitiveWithPassword)
    );
    assert_eq!(options.artifact_password(), Some("pw"));
    assert_eq!(options.parameters.len(), 2);
    assert_eq!(options.parameters[1].name, "Project::Url");
    assert_eq!(options.parameters[1].value, "http://a?b=c");
    assert_eq!(options.version_build, Some(12));
    assert_eq!(options.version_major, None);
}

#[test]
fn build_defaults_to_development_configuration() {
    let args = build_args(&["ssis-build", "build", "Warehouse.dtproj"]);
    assert_eq!(args.configuration, "Development");
    assert!(args.parameters.is_empty());
}

#[test]
fn numeric_protection_level_is_accepted() {
    let args = build_args(&[
        "ssis-build",
        "build",
        "Warehouse.dtproj",
        "--protection-level",
        "3",
    ]);
    assert_eq!(
        args.protection_level,
        Some(ProtectionLevel::EncryptAllWithPassword)
    );
}

#[test]
fn user_key_protection_level_is_rejected() {
    let result = Cli::try_parse_from([
        "ssis-build",
        "build",
        "Warehouse.dtproj",
        "--protection-level",
        "EncryptSensitiveWithUserKey",
    ]);
    assert!(result.is_err());
}

#[test]
fn malformed_assignment_is_rejected() {
    let result = Cli::try_parse_from(["ssis-build", "build", "Warehouse.dtproj", "-p", "novalue"]);
    assert!(result.is_err());
}

#[test]
fn params_command_parses_json_flag() {
    let cli = Cli::try_parse_from(["ssis-build", "params", "out.ispac", "--json"]).unwrap();
    match cli.command {
        Command::Params(args) => {
            assert!(args.json);
            assert_eq!(args.path, Path::new("out.ispac"));
        }
        Command::Build(_) => panic!("expected params command"),
    }
}

#[test]
fn rows_mask_sensitive_values() {
    let table = sample_table();
    let rows = parameter_rows(&table);
    let password = rows
        .iter()
        .find(|row| row.name == "Project::Password")
        .unwrap();
    assert_eq!(password.value, Some("********"));
    assert!(password.sensitive);
}

#[test]
fn parameters_json_snapshot() {
    insta::assert_json_snapshot!(parameters_json(&sample_table()), @r#"
    {
      "count": 3,
      "parameters": [
        {
          "name": "Project::Empty",
          "sensitive": false,
          "source": "Default",
          "value": null
        },
        {
          "name": "Project::Password",
          "sensitive": true,
          "source": "Default",
          "value": "********"
        },
        {
          "name": "Project::Url",
          "sensitive": false,
          "source": "Configuration",
          "value": "http://x"
        }
      ]
    }
    "#);
}
