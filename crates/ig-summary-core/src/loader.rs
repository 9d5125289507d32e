//! File loading and parsing for FHIR resources
//!
//! Discovers JSON resources under a folder (recursively) and adds the
//! definitional ones to a [`DefinitionLake`]. A file that fails to parse is
//! recorded and skipped; it never aborts the load.

use crate::config::IgConfiguration;
use crate::error::IgSummaryError;
use crate::lake::DefinitionLake;
use crate::models::FhirResource;
use crate::result::{Result, ResultExt};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// File loader for FHIR resources
#[derive(Debug, Default)]
pub struct DefinitionLoader {
    /// Files successfully loaded
    loaded_count: usize,

    /// Detailed error messages
    errors: Vec<LoadError>,
}

/// Details about a file loading error
#[derive(Debug, Clone)]
pub struct LoadError {
    pub file_path: PathBuf,
    pub error_message: String,
}

/// Statistics about a loading operation
#[derive(Debug, Clone)]
pub struct LoadStats {
    pub loaded: usize,
    pub errors: usize,
    pub error_details: Vec<LoadError>,
}

impl DefinitionLoader {
    /// Create a new DefinitionLoader
    pub fn new() -> Self {
        Self::default()
    }

    /// Load FHIR resources from a file or directory into the lake
    pub fn load_into_lake(&mut self, path: &Path, lake: &mut DefinitionLake) -> Result<LoadStats> {
        if path.is_file() {
            self.load_json_file(path, lake)?;
        } else if path.is_dir() {
            self.load_directory(path, lake);
        } else {
            return Err(IgSummaryError::config_error(format!(
                "Definitions path not found: {}",
                path.display()
            )));
        }

        Ok(self.stats())
    }

    /// Load all JSON files from a directory recursively, recording failures
    fn load_directory(&mut self, path: &Path, lake: &mut DefinitionLake) {
        let entries = WalkDir::new(path)
            .follow_links(true)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file());

        for entry in entries {
            let entry_path = entry.path();
            let Some(name) = entry_path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            // Skip package.json and other non-FHIR files
            if name == "package.json" || name.starts_with('.') || !name.ends_with(".json") {
                debug!("Skipping {}", entry_path.display());
                continue;
            }

            if let Err(e) = self.load_json_file(entry_path, lake) {
                warn!("Failed to load {}: {}", entry_path.display(), e);
                self.errors.push(LoadError {
                    file_path: entry_path.to_path_buf(),
                    error_message: e.to_string(),
                });
            }
        }
    }

    /// Load JSON file
    fn load_json_file(&mut self, path: &Path, lake: &mut DefinitionLake) -> Result<()> {
        debug!("Loading JSON file: {}", path.display());

        let content = fs::read_to_string(path).map_err(|e| IgSummaryError::io_error(path, e))?;
        let resource: FhirResource = serde_json::from_str(&content)
            .map_err(|e| IgSummaryError::parse_error(path, e.to_string()))?;

        add_resource_to_lake(resource, lake);
        self.loaded_count += 1;

        Ok(())
    }

    /// Get current loading statistics
    pub fn stats(&self) -> LoadStats {
        LoadStats {
            loaded: self.loaded_count,
            errors: self.errors.len(),
            error_details: self.errors.clone(),
        }
    }
}

fn add_resource_to_lake(resource: FhirResource, lake: &mut DefinitionLake) {
    match resource {
        FhirResource::StructureDefinition(sd) => {
            debug!("Loaded StructureDefinition: {}", sd.name);
            lake.add_structure_definition(*sd);
        }
        FhirResource::ValueSet(vs) => {
            debug!("Loaded ValueSet: {}", vs.name);
            lake.add_value_set(*vs);
        }
        FhirResource::CodeSystem(cs) => {
            debug!("Loaded CodeSystem: {}", cs.name);
            lake.add_code_system(*cs);
        }
        FhirResource::ImplementationGuide(ig) => {
            debug!("Loaded ImplementationGuide: {:?}", ig.id);
            lake.add_implementation_guide(*ig);
        }
        FhirResource::Other => {
            debug!("Skipping non-definitional resource");
        }
    }
}

/// Root of the local FHIR package cache
///
/// `FHIR_PACKAGE_CACHE` wins over `~/.fhir/packages`.
pub fn default_package_cache() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("FHIR_PACKAGE_CACHE") {
        return Some(PathBuf::from(dir));
    }
    std::env::var("HOME")
        .ok()
        .map(|home| PathBuf::from(home).join(".fhir").join("packages"))
}

/// Load every dependency of the IG that is present in the package cache
///
/// Packages are expected at `<cache>/<packageId>#<version>/package`. Missing
/// packages are reported and skipped.
pub fn load_dependency_packages(
    config: &IgConfiguration,
    cache_root: &Path,
    lake: &mut DefinitionLake,
) -> LoadStats {
    let mut loader = DefinitionLoader::new();

    for (package_id, version) in &config.dependencies {
        let package_dir = cache_root
            .join(format!("{package_id}#{version}"))
            .join("package");
        if !package_dir.is_dir() {
            warn!(
                "Dependency {}#{} not found in package cache {}",
                package_id,
                version,
                cache_root.display()
            );
            continue;
        }

        info!("Loading dependency {}#{}", package_id, version);
        loader.load_into_lake(&package_dir, lake).log_and_continue();
    }

    loader.stats()
}
