use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use ssis_project::archive::ARTIFACT_EXTENSION;
use ssis_project::{BuildOptions, BuildReport, Project, build};

use crate::cli::{BuildArgs, ParamsArgs};
use crate::summary::{parameters_json, parameters_table};

/// Maps command-line flags onto build options.
pub fn build_options(args: &BuildArgs) -> BuildOptions {
    BuildOptions {
        configuration: args.configuration.clone(),
        password: args.password.clone(),
        new_password: args.new_password.clone(),
        protection_level: args.protection_level,
        output_dir: args.output_dir.clone(),
        parameters: args.parameters.clone(),
        version_major: args.version_major,
        version_minor: args.version_minor,
        version_build: args.version_build,
        version_comments: args.version_comments.clone(),
    }
}

pub fn run_build(args: &BuildArgs) -> Result<BuildReport> {
    let options = build_options(args);
    debug!(
        project = %args.project.display(),
        configuration = %options.configuration,
        overrides = options.parameters.len(),
        "starting build"
    );
    build(&args.project, &options)
        .with_context(|| format!("build {}", args.project.display()))
}

pub fn run_params(args: &ParamsArgs) -> Result<()> {
    let project = load_for_inspection(&args.path, &args.configuration, args.password.as_deref())?;
    let Some(table) = project.parameters() else {
        return Ok(());
    };
    if args.json {
        let json = serde_json::to_string_pretty(&parameters_json(table))
            .context("serialize parameters")?;
        println!("{json}");
    } else {
        println!("{}", parameters_table(table));
    }
    Ok(())
}

/// Loads an artifact as-is, or a project definition with `configuration`
/// applied.
fn load_for_inspection(
    path: &Path,
    configuration: &str,
    password: Option<&str>,
) -> Result<Project> {
    let mut project = Project::new();
    let is_artifact = path
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case(ARTIFACT_EXTENSION));
    if is_artifact {
        project
            .load_from_archive(path, password)
            .with_context(|| format!("load artifact {}", path.display()))?;
    } else {
        project
            .load_from_source_layout(path, configuration, password)
            .with_context(|| format!("load project {}", path.display()))?;
    }
    Ok(project)
}
