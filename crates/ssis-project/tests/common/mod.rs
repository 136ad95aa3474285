//! On-disk project fixtures shared by the integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub const PROJECT_FILE: &str = "Warehouse.dtproj";
pub const PACKAGE: &str = "Load Customers.dtsx";
pub const CONNECTION: &str = "Source.conmgr";
pub const SECRET: &str = "hunter2";

/// A source layout in a temporary directory.
pub struct Layout {
    pub dir: TempDir,
}

impl Layout {
    pub fn project_path(&self) -> PathBuf {
        self.dir.path().join(PROJECT_FILE)
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write(&self, name: &str, content: &str) {
        fs::write(self.path(name), content).unwrap();
    }
}

/// Manifest parameter declarations beyond the connection string.
pub fn manifest(extra_parameters: &str) -> String {
    format!(
        r#"<SSIS:Project SSIS:ProtectionLevel="DontSaveSensitive" xmlns:SSIS="www.microsoft.com/SqlServer/SSIS">
        <SSIS:Properties>
          <SSIS:Property SSIS:Name="Name">Warehouse</SSIS:Property>
          <SSIS:Property SSIS:Name="VersionMajor">1</SSIS:Property>
          <SSIS:Property SSIS:Name="VersionMinor">0</SSIS:Property>
          <SSIS:Property SSIS:Name="VersionBuild">7</SSIS:Property>
          <SSIS:Property SSIS:Name="Description">Nightly warehouse load</SSIS:Property>
        </SSIS:Properties>
        <SSIS:Packages>
          <SSIS:Package SSIS:Name="{PACKAGE}" SSIS:EntryPoint="1" />
        </SSIS:Packages>
        <SSIS:ConnectionManagers>
          <SSIS:ConnectionManager SSIS:Name="{CONNECTION}" />
        </SSIS:ConnectionManagers>
        <SSIS:DeploymentInfo>
          <SSIS:ProjectConnectionParameters>
            <SSIS:Parameter SSIS:Name="CM.Source.ConnectionString">
              <SSIS:Properties>
                <SSIS:Property SSIS:Name="Sensitive">0</SSIS:Property>
                <SSIS:Property SSIS:Name="Value">Data Source=db01;Initial Catalog=Staging</SSIS:Property>
              </SSIS:Properties>
            </SSIS:Parameter>
            {extra_parameters}
          </SSIS:ProjectConnectionParameters>
          <SSIS:PackageInfo>
            <SSIS:PackageMetaData SSIS:Name="{PACKAGE}">
              <SSIS:Parameters>
                <SSIS:Parameter SSIS:Name="BatchSize">
                  <SSIS:Properties>
                    <SSIS:Property SSIS:Name="Sensitive">0</SSIS:Property>
                    <SSIS:Property SSIS:Name="Value">500</SSIS:Property>
                  </SSIS:Properties>
                </SSIS:Parameter>
              </SSIS:Parameters>
            </SSIS:PackageMetaData>
          </SSIS:PackageInfo>
        </SSIS:DeploymentInfo>
      </SSIS:Project>"#
    )
}

/// Project definition with a `Dev` configuration setting `Project::P1` to
/// `X` and a `Release` configuration with no overrides.
pub fn dtproj(deployment_model: &str, manifest: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<Project xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:xsd="http://www.w3.org/2001/XMLSchema">
  <ProductVersion>15.0</ProductVersion>
  <DeploymentModel>{deployment_model}</DeploymentModel>
  <DeploymentModelSpecificContent>
    <Manifest>
      {manifest}
    </Manifest>
  </DeploymentModelSpecificContent>
  <Configurations>
    <Configuration>
      <Name>Dev</Name>
      <Options>
        <ParameterConfigurationValues>
          <ConfigurationSetting>
            <Id>0b2f3c1e</Id>
            <Name>Project::P1</Name>
            <Value xsi:type="xsd:string">X</Value>
          </ConfigurationSetting>
          <ConfigurationSetting>
            <Id>5d9a7e21</Id>
            <Name>Project::Retired</Name>
            <Value xsi:type="xsd:string">ignored</Value>
          </ConfigurationSetting>
        </ParameterConfigurationValues>
      </Options>
    </Configuration>
    <Configuration>
      <Name>Release</Name>
      <Options />
    </Configuration>
  </Configurations>
</Project>"#
    )
}

pub const PARAMS: &str = r#"<?xml version="1.0"?>
<SSIS:Parameters xmlns:SSIS="www.microsoft.com/SqlServer/SSIS">
  <SSIS:Parameter SSIS:Name="P1">
    <SSIS:Properties>
      <SSIS:Property SSIS:Name="Sensitive">0</SSIS:Property>
      <SSIS:Property SSIS:Name="Value">A</SSIS:Property>
    </SSIS:Properties>
  </SSIS:Parameter>
  <SSIS:Parameter SSIS:Name="P2">
    <SSIS:Properties>
      <SSIS:Property SSIS:Name="Sensitive">0</SSIS:Property>
      <SSIS:Property SSIS:Name="Value">B</SSIS:Property>
    </SSIS:Properties>
  </SSIS:Parameter>
  <SSIS:Parameter SSIS:Name="Secret">
    <SSIS:Properties>
      <SSIS:Property SSIS:Name="Sensitive">1</SSIS:Property>
      <SSIS:Property SSIS:Name="Value">hunter2</SSIS:Property>
    </SSIS:Properties>
  </SSIS:Parameter>
</SSIS:Parameters>"#;

pub const CONNECTION_MANAGER: &str = r#"<?xml version="1.0"?>
<DTS:ConnectionManager xmlns:DTS="www.microsoft.com/SqlServer/Dts" DTS:ObjectName="Source" DTS:CreationName="OLEDB">
  <DTS:ObjectData>
    <DTS:ConnectionManager DTS:ConnectionString="Data Source=db01;Initial Catalog=Staging" />
  </DTS:ObjectData>
</DTS:ConnectionManager>"#;

pub const PACKAGE_FILE: &str = r#"<?xml version="1.0"?>
<DTS:Executable xmlns:DTS="www.microsoft.com/SqlServer/Dts" DTS:ObjectName="Load Customers" DTS:ProtectionLevel="0">
  <DTS:Variables />
  <DTS:Executables />
</DTS:Executable>"#;

/// User overlay naming `Project::P1` under `configuration`.
pub fn user_overlay(configuration: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<DataTransformationsUserConfiguration xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <Configurations>
    <Configuration>
      <Name>{configuration}</Name>
      <Options>
        <ParameterConfigurationSensitiveValues>
          <ConfigurationSetting>
            <Name>Project::P1</Name>
            <Value xsi:type="xsd:string">local</Value>
          </ConfigurationSetting>
        </ParameterConfigurationSensitiveValues>
      </Options>
    </Configuration>
  </Configurations>
</DataTransformationsUserConfiguration>"#
    )
}

/// Writes the standard source layout.
pub fn source_layout() -> Layout {
    layout_with("Project", &manifest(""))
}

pub fn layout_with(deployment_model: &str, manifest: &str) -> Layout {
    let layout = Layout {
        dir: tempfile::tempdir().unwrap(),
    };
    layout.write(PROJECT_FILE, &dtproj(deployment_model, manifest));
    layout.write("Project.params", PARAMS);
    layout.write(CONNECTION, CONNECTION_MANAGER);
    layout.write(PACKAGE, PACKAGE_FILE);
    layout
}

/// Decompressed entries of an artifact, in archive order.
pub fn archive_entries(path: &Path) -> Vec<(String, String)> {
    use std::io::Read;

    let file = fs::File::open(path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut entry = archive.by_index(i).unwrap();
            let mut content = String::new();
            entry.read_to_string(&mut content).unwrap();
            (entry.name().to_string(), content)
        })
        .collect()
}
