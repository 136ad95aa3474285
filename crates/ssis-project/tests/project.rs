//! Loading, resolving and saving whole projects.

mod common;

use std::fs;

use common::{CONNECTION, PACKAGE, SECRET, archive_entries, layout_with, manifest, source_layout};
use ssis_project::{
    BuildOptions, ErrorKind, ParameterSource, Project, ProjectError, ProtectionLevel, build,
    compute_file_hash,
};

fn load(layout: &common::Layout, configuration: &str) -> Project {
    let mut project = Project::new();
    project
        .load_from_source_layout(&layout.project_path(), configuration, None)
        .unwrap();
    project
}

#[test]
fn dev_configuration_overrides_declared_value() {
    let layout = source_layout();
    let project = load(&layout, "Dev");
    let table = project.parameters().unwrap();

    let p1 = table.get("Project::P1").unwrap();
    assert_eq!(p1.value(), Some("X"));
    assert_eq!(p1.source(), ParameterSource::Configuration);

    let p2 = table.get("Project::P2").unwrap();
    assert_eq!(p2.value(), Some("B"));
    assert_eq!(p2.source(), ParameterSource::Default);

    // Overrides for parameters nobody declares are dropped.
    assert!(!table.contains("Project::Retired"));
}

#[test]
fn source_layout_exposes_metadata_and_files() {
    let layout = source_layout();
    let project = load(&layout, "Release");

    assert_eq!(project.name().as_deref(), Some("Warehouse"));
    assert_eq!(project.version_major(), Some(1));
    assert_eq!(project.version_build(), Some(7));
    assert_eq!(project.description().as_deref(), Some("Nightly warehouse load"));
    assert_eq!(
        project.protection_level().unwrap(),
        ProtectionLevel::DontSaveSensitive
    );
    assert_eq!(project.connection_names(), [CONNECTION]);
    assert_eq!(project.package_names(), [PACKAGE]);

    let table = project.parameters().unwrap();
    assert_eq!(table.len(), 5);
    assert_eq!(
        table.get("Load Customers.dtsx::BatchSize").unwrap().value(),
        Some("500")
    );
    let secret = table.get("Project::Secret").unwrap();
    assert!(secret.is_sensitive());
    assert_eq!(secret.value(), Some(SECRET));
}

#[test]
fn user_overlay_nulls_value_over_configuration() {
    let layout = source_layout();
    layout.write("Warehouse.dtproj.user", &common::user_overlay("Dev"));
    let project = load(&layout, "Dev");

    let p1 = project.parameters().unwrap().get("Project::P1").unwrap();
    assert_eq!(p1.value(), None);
    assert_eq!(p1.source(), ParameterSource::UserConfiguration);
}

#[test]
fn user_overlay_without_configuration_fails_load() {
    let layout = source_layout();
    layout.write("Warehouse.dtproj.user", &common::user_overlay("Release"));
    let mut project = Project::new();

    let err = project
        .load_from_source_layout(&layout.project_path(), "Dev", None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigurationNotFound);
    assert!(err.to_string().contains("Dev"));
    assert!(!project.is_loaded());
}

#[test]
fn unknown_configuration_is_reported_by_name() {
    let layout = source_layout();
    let mut project = Project::new();

    let err = project
        .load_from_source_layout(&layout.project_path(), "Production", None)
        .unwrap_err();
    match err {
        ProjectError::ConfigurationNotFound { name, .. } => assert_eq!(name, "Production"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!project.is_loaded());
}

#[test]
fn package_deployment_model_is_rejected() {
    let layout = layout_with("Package", &manifest(""));
    let mut project = Project::new();

    let err = project
        .load_from_source_layout(&layout.project_path(), "Dev", None)
        .unwrap_err();
    assert!(matches!(
        &err,
        ProjectError::UnsupportedDeploymentModel { found } if found == "Package"
    ));
    assert_eq!(err.kind(), ErrorKind::FormatMismatch);
    assert!(!project.is_loaded());
    assert!(project.parameters().is_none());
}

#[test]
fn missing_declared_package_is_not_found() {
    let layout = source_layout();
    fs::remove_file(layout.path(PACKAGE)).unwrap();
    let mut project = Project::new();

    let err = project
        .load_from_source_layout(&layout.project_path(), "Dev", None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(!project.is_loaded());
}

#[test]
fn manifest_declaration_wins_over_params() {
    let collision = r#"<SSIS:Parameter SSIS:Name="Project::P2">
              <SSIS:Properties>
                <SSIS:Property SSIS:Name="Sensitive">0</SSIS:Property>
                <SSIS:Property SSIS:Name="Value">from-manifest</SSIS:Property>
              </SSIS:Properties>
            </SSIS:Parameter>"#;
    let layout = layout_with("Project", &manifest(collision));
    let project = load(&layout, "Release");

    let p2 = project.parameters().unwrap().get("Project::P2").unwrap();
    assert_eq!(p2.value(), Some("from-manifest"));
    assert_eq!(p2.source(), ParameterSource::Default);
}

#[test]
fn update_parameter_ignores_unknown_names() {
    let layout = source_layout();
    let mut project = load(&layout, "Dev");

    let updated = project
        .update_parameter("Project::Nope", Some("1"), ParameterSource::Manual)
        .unwrap();
    assert!(!updated);
    assert!(!project.parameters().unwrap().contains("Project::Nope"));

    assert!(
        project
            .update_parameter("Project::P2", Some("Z"), ParameterSource::Manual)
            .unwrap()
    );
    let p2 = project.parameters().unwrap().get("Project::P2").unwrap();
    assert_eq!(p2.value(), Some("Z"));
    assert_eq!(p2.source(), ParameterSource::Manual);
}

#[test]
fn round_trip_preserves_non_sensitive_values() {
    let layout = source_layout();
    let mut project = load(&layout, "Dev");
    project
        .update_parameter(
            "Load Customers.dtsx::BatchSize",
            Some("2000"),
            ParameterSource::Manual,
        )
        .unwrap();
    let output = layout.path("bin/Dev/Warehouse.ispac");
    project.save(&output).unwrap();

    let mut reloaded = Project::new();
    reloaded.load_from_archive(&output, None).unwrap();
    let table = reloaded.parameters().unwrap();

    assert_eq!(table.get("Project::P1").unwrap().value(), Some("X"));
    assert_eq!(table.get("Project::P2").unwrap().value(), Some("B"));
    assert_eq!(
        table.get("CM.Source.ConnectionString").unwrap().value(),
        Some("Data Source=db01;Initial Catalog=Staging")
    );
    assert_eq!(
        table.get("Load Customers.dtsx::BatchSize").unwrap().value(),
        Some("2000")
    );
    for parameter in table {
        assert_eq!(parameter.source(), ParameterSource::Default);
    }

    let secret = table.get("Project::Secret").unwrap();
    assert!(secret.is_sensitive());
    assert_eq!(secret.value(), None);

    assert_eq!(reloaded.connection_names(), [CONNECTION]);
    assert_eq!(reloaded.package_names(), [PACKAGE]);
    assert_eq!(reloaded.version_build(), Some(7));
}

#[test]
fn dont_save_sensitive_never_writes_secrets() {
    let layout = source_layout();
    let project = load(&layout, "Dev");
    let output = layout.path("out.ispac");
    project.save(&output).unwrap();

    for (name, content) in archive_entries(&output) {
        assert!(!content.contains(SECRET), "{name} leaks the secret");
    }
}

#[test]
fn sensitive_values_round_trip_with_password() {
    let layout = source_layout();
    let project = load(&layout, "Dev");
    let output = layout.path("secure.ispac");
    project
        .save_with_protection(
            &output,
            ProtectionLevel::EncryptSensitiveWithPassword,
            Some("pw"),
        )
        .unwrap();

    for (name, content) in archive_entries(&output) {
        assert!(!content.contains(SECRET), "{name} leaks the secret");
    }

    let mut reloaded = Project::new();
    reloaded.load_from_archive(&output, Some("pw")).unwrap();
    assert_eq!(
        reloaded.protection_level().unwrap(),
        ProtectionLevel::EncryptSensitiveWithPassword
    );
    let table = reloaded.parameters().unwrap();
    assert_eq!(table.get("Project::Secret").unwrap().value(), Some(SECRET));
    assert_eq!(table.get("Project::P1").unwrap().value(), Some("X"));

    let mut wrong = Project::new();
    let err = wrong.load_from_archive(&output, Some("nope")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DecryptionFailure);
    assert!(!wrong.is_loaded());

    let err = Project::new()
        .load_from_archive(&output, None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DecryptionFailure);
}

#[test]
fn encrypt_all_hides_every_file() {
    let layout = source_layout();
    let project = load(&layout, "Dev");
    let output = layout.path("sealed.ispac");
    project
        .save_with_protection(&output, ProtectionLevel::EncryptAllWithPassword, Some("pw"))
        .unwrap();

    for (name, content) in archive_entries(&output) {
        if name == "[Content_Types].xml" {
            continue;
        }
        assert!(content.contains("EncryptedData"), "{name} is not sealed");
        assert!(!content.contains("Staging"), "{name} leaks plain text");
    }

    let mut reloaded = Project::new();
    reloaded.load_from_archive(&output, Some("pw")).unwrap();
    assert_eq!(
        reloaded.protection_level().unwrap(),
        ProtectionLevel::EncryptAllWithPassword
    );
    assert_eq!(
        reloaded
            .parameters()
            .unwrap()
            .get("Project::Secret")
            .unwrap()
            .value(),
        Some(SECRET)
    );

    let err = Project::new()
        .load_from_archive(&output, Some("wrong"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DecryptionFailure);
}

#[test]
fn password_level_without_password_writes_nothing() {
    let layout = source_layout();
    let project = load(&layout, "Dev");
    let output = layout.path("secure.ispac");

    let err = project
        .save_with_protection(&output, ProtectionLevel::EncryptAllWithPassword, Some(""))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingPassword);
    assert!(!output.exists());
}

#[test]
fn wrong_extension_fails_before_touching_disk() {
    let layout = source_layout();
    let project = load(&layout, "Dev");
    let output = layout.path("nested/out.zip");

    let err = project.save(&output).unwrap_err();
    assert!(matches!(err, ProjectError::WrongExtension { .. }));
    assert_eq!(err.kind(), ErrorKind::FormatMismatch);
    assert!(!output.exists());
    assert!(!layout.path("nested").exists());
}

#[test]
fn save_replaces_existing_artifact() {
    let layout = source_layout();
    let project = load(&layout, "Dev");
    let output = layout.path("out.ispac");
    fs::write(&output, b"stale").unwrap();

    project.save(&output).unwrap();

    let mut reloaded = Project::new();
    reloaded.load_from_archive(&output, None).unwrap();
    assert!(reloaded.is_loaded());
    assert!(!layout.path("out.ispac.tmp").exists());
}

#[test]
fn metadata_setters_are_saved() {
    let layout = source_layout();
    let mut project = load(&layout, "Dev");
    project.set_version_major(4).unwrap();
    project.set_version_minor(2).unwrap();
    project.set_version_comments("hotfix").unwrap();
    project.set_description("Rebuilt").unwrap();
    let output = layout.path("out.ispac");
    project.save(&output).unwrap();

    let mut reloaded = Project::new();
    reloaded.load_from_archive(&output, None).unwrap();
    assert_eq!(reloaded.version_major(), Some(4));
    assert_eq!(reloaded.version_minor(), Some(2));
    assert_eq!(reloaded.version_build(), Some(7));
    assert_eq!(reloaded.version_comments().as_deref(), Some("hotfix"));
    assert_eq!(reloaded.description().as_deref(), Some("Rebuilt"));
}

#[test]
fn build_writes_artifact_under_configuration_directory() {
    let layout = source_layout();
    let options = BuildOptions::new("Dev")
        .with_parameter("Project::P2", "manual")
        .with_parameter("Project::Unknown", "ignored")
        .with_protection_level(ProtectionLevel::EncryptSensitiveWithPassword)
        .with_new_password("pw");

    let report = build(&layout.project_path(), &options).unwrap();

    assert_eq!(report.output_path, layout.path("bin/Dev/Warehouse.ispac"));
    assert_eq!(
        report.protection_level,
        ProtectionLevel::EncryptSensitiveWithPassword
    );
    assert_eq!(report.parameter_count, 5);
    assert_eq!(report.sha256, compute_file_hash(&report.output_path).unwrap());

    let mut reloaded = Project::new();
    reloaded.load_from_archive(&report.output_path, Some("pw")).unwrap();
    let table = reloaded.parameters().unwrap();
    assert_eq!(table.get("Project::P1").unwrap().value(), Some("X"));
    assert_eq!(table.get("Project::P2").unwrap().value(), Some("manual"));
}

#[test]
fn artifact_hash_covers_saved_bytes() {
    use sha2::{Digest, Sha256};

    let layout = source_layout();
    let mut project = load(&layout, "Dev");
    let output = layout.path("out.ispac");
    project.save(&output).unwrap();

    let hash = compute_file_hash(&output).unwrap();
    assert_eq!(hash, hex::encode(Sha256::digest(fs::read(&output).unwrap())));

    project.set_description("Changed").unwrap();
    project.save(&output).unwrap();
    assert_ne!(compute_file_hash(&output).unwrap(), hash);
}

#[test]
fn build_defaults_to_project_protection_level() {
    let layout = source_layout();
    let output_dir = layout.path("artifacts");
    let options = BuildOptions::new("Release").with_output_dir(&output_dir);

    let report = build(&layout.project_path(), &options).unwrap();

    assert_eq!(report.output_path, output_dir.join("Warehouse.ispac"));
    assert_eq!(report.protection_level, ProtectionLevel::DontSaveSensitive);
    assert!(report.output_path.is_file());
}
