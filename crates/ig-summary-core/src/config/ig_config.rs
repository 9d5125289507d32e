//! Implementation Guide metadata
//!
//! A data dictionary needs a handful of facts about the IG itself: its id
//! (for the default output filename), title and version (for the document
//! metadata), its dependencies (to load external definitions) and its resource
//! groups. They come from one of two places:
//!
//! - `sushi-config.yaml` in the root of a development clone of the IG; the
//!   IG Publisher output is then expected in `output/`
//! - `package.json` plus the single `ImplementationGuide` resource of an
//!   unpacked package
//!
//! **SUSHI documentation**: <https://fshschool.org/docs/sushi/configuration/>

use crate::error::IgSummaryError;
use crate::lake::DefinitionLake;
use crate::result::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

pub const SUSHI_CONFIG_FILE: &str = "sushi-config.yaml";
pub const PACKAGE_JSON_FILE: &str = "package.json";

/// The parts of sushi-config.yaml read by this tool
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SushiConfiguration {
    /// Canonical URL for the IG (required)
    pub canonical: String,

    /// FHIR version(s) - can be single string or array
    #[serde(default, deserialize_with = "deserialize_fhir_version")]
    pub fhir_version: Vec<String>,

    pub id: Option<String>,
    pub name: Option<String>,
    pub title: Option<String>,
    pub version: Option<String>,
    pub status: Option<String>,

    /// IG dependencies (package-id: version)
    pub dependencies: Option<IndexMap<String, DependencyVersion>>,

    /// Resource groups keyed by group id
    pub groups: Option<IndexMap<String, GroupDefinition>>,
}

/// Dependency version specification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum DependencyVersion {
    /// Simple version string
    Simple(String),

    /// Complex dependency with additional properties
    Complex {
        version: String,

        #[serde(skip_serializing_if = "Option::is_none")]
        uri: Option<String>,
    },
}

impl DependencyVersion {
    pub fn version(&self) -> &str {
        match self {
            DependencyVersion::Simple(version) => version,
            DependencyVersion::Complex { version, .. } => version,
        }
    }
}

/// A group as written in sushi-config.yaml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupDefinition {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub resources: Vec<String>,
}

/// A resource group of the IG
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceGroup {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub resources: Vec<String>,
}

fn deserialize_fhir_version<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum FhirVersionValue {
        Single(String),
        Multiple(Vec<String>),
    }

    match FhirVersionValue::deserialize(deserializer)? {
        FhirVersionValue::Single(s) => Ok(vec![s]),
        FhirVersionValue::Multiple(v) => Ok(v),
    }
}

impl SushiConfiguration {
    /// Parse sushi-config.yaml from YAML string
    pub fn from_yaml(yaml: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| IgSummaryError::io_error(path, e))?;
        Self::from_yaml(&contents).map_err(|e| IgSummaryError::parse_error(path, e.to_string()))
    }
}

/// `package.json` of an unpacked FHIR package
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageManifest {
    name: Option<String>,
    canonical: Option<String>,
    fhir_versions: Option<Vec<String>>,
    title: Option<String>,
    version: Option<String>,
}

/// IG metadata used by a data dictionary run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IgConfiguration {
    pub id: String,
    pub canonical: String,
    pub name: Option<String>,
    pub title: Option<String>,
    pub version: Option<String>,
    pub status: Option<String>,
    pub fhir_version: Vec<String>,
    /// package id → version
    pub dependencies: IndexMap<String, String>,
    pub groups: Vec<ResourceGroup>,
}

impl From<SushiConfiguration> for IgConfiguration {
    fn from(config: SushiConfiguration) -> Self {
        let dependencies = config
            .dependencies
            .unwrap_or_default()
            .into_iter()
            .map(|(package, version)| (package, version.version().to_string()))
            .collect();
        let groups = config
            .groups
            .unwrap_or_default()
            .into_iter()
            .map(|(id, group)| ResourceGroup {
                id,
                name: group.name,
                description: group.description,
                resources: group.resources,
            })
            .collect();

        Self {
            id: config.id.unwrap_or_default(),
            canonical: config.canonical,
            name: config.name,
            title: config.title,
            version: config.version,
            status: config.status,
            fhir_version: config.fhir_version,
            dependencies,
            groups,
        }
    }
}

impl IgConfiguration {
    /// Read `sushi-config.yaml`
    pub fn from_sushi_config(path: &Path) -> Result<Self> {
        info!("Has SUSHI configuration file");
        Ok(SushiConfiguration::from_file(path)?.into())
    }

    /// Build the configuration from `package.json` and the lake's ImplementationGuide
    pub fn from_package(package_json: &Path, lake: &DefinitionLake) -> Result<Self> {
        info!("No SUSHI configuration file found; reading package.json and the IG instance");
        if !package_json.is_file() {
            return Err(IgSummaryError::config_error(format!(
                "{} was not found. Make sure this file exists, or point --input to a folder with \
                 a {SUSHI_CONFIG_FILE} file and IG Publisher output in output/",
                package_json.display()
            )));
        }

        let contents = std::fs::read_to_string(package_json)
            .map_err(|e| IgSummaryError::io_error(package_json, e))?;
        let manifest: PackageManifest = serde_json::from_str(&contents)
            .map_err(|e| IgSummaryError::parse_error(package_json, e.to_string()))?;

        let (Some(name), Some(canonical), Some(fhir_versions)) =
            (manifest.name, manifest.canonical, manifest.fhir_versions)
        else {
            return Err(IgSummaryError::config_error(
                "package.json must contain canonical, fhirVersions, name",
            ));
        };

        let guides = lake.implementation_guides();
        if guides.len() > 1 {
            return Err(IgSummaryError::config_error(
                "Multiple ImplementationGuide instances found in the definitions folder",
            ));
        }
        let guide = guides.first().ok_or_else(|| {
            IgSummaryError::config_error("No ImplementationGuide instance found in the definitions folder")
        })?;

        let dependencies = guide
            .depends_on
            .iter()
            .flatten()
            .filter_map(|dep| Some((dep.package_id.clone()?, dep.version.clone()?)))
            .collect();

        Ok(Self {
            id: name,
            canonical,
            name: guide.name.clone(),
            title: manifest.title.or_else(|| guide.title.clone()),
            version: manifest.version.or_else(|| guide.version.clone()),
            status: guide.status.clone(),
            fhir_version: fhir_versions,
            dependencies,
            groups: Vec::new(),
        })
    }
}

/// Where an IG's definitions and metadata live on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgLayout {
    /// Folder holding the FHIR definition JSON files
    pub definitions_dir: PathBuf,
    /// `sushi-config.yaml`, when the input is a development clone
    pub sushi_config: Option<PathBuf>,
}

impl IgLayout {
    /// Inspect an `--input` folder
    pub fn discover(input: &Path) -> Result<Self> {
        if !input.is_dir() {
            return Err(IgSummaryError::config_error(format!(
                "The folder specified in --input ({}) does not exist",
                input.display()
            )));
        }

        let sushi_config = input.join(SUSHI_CONFIG_FILE);
        if sushi_config.is_file() {
            let definitions_dir = input.join("output");
            if !definitions_dir.is_dir() {
                return Err(IgSummaryError::config_error(format!(
                    "{} found, but {} does not exist. You may need to re-run the FHIR IG Publisher, \
                     or set --input to the folder that contains ImplementationGuide-<id>.json",
                    sushi_config.display(),
                    definitions_dir.display()
                )));
            }
            return Ok(Self {
                definitions_dir,
                sushi_config: Some(sushi_config),
            });
        }

        Ok(Self {
            definitions_dir: input.to_path_buf(),
            sushi_config: None,
        })
    }

    /// Read the IG metadata, using the lake for the package.json fallback
    pub fn configuration(&self, lake: &DefinitionLake) -> Result<IgConfiguration> {
        match &self.sushi_config {
            Some(path) => IgConfiguration::from_sushi_config(path),
            None => IgConfiguration::from_package(&self.definitions_dir.join(PACKAGE_JSON_FILE), lake),
        }
    }
}
