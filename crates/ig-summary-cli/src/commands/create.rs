//! Create Command - data dictionary of an Implementation Guide
//!
//! ```sh
//! # IG source folder, definitions under output/
//! ig-summary create --input ./my-ig --output ./dictionary
//!
//! # Unpacked package with extra dependency folders
//! ig-summary create -i ./package -o ./dictionary -d ./us-core/package
//!
//! # Compare against the previous release
//! ig-summary create -i ./my-ig -o ./dictionary -c ./previous/ig-summary-my-ig.json
//! ```

use super::{require_dir, require_file};
use crate::output;
use anyhow::{Context, Result, bail};
use ig_summary_core::{
    DataDictionary, DataDictionaryMode, DataDictionarySettings, DefinitionLake, DefinitionLoader,
    DiffSettings, DiffSummary, Differ, IgLayout, JsonWorkbookSink, SummaryAssembler,
    WorkbookSink, default_package_cache, dictionary_workbook, load_dependency_packages,
    render_details,
};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Arguments of `ig-summary create`
#[derive(Debug, Clone)]
pub struct CreateOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub mode: Option<DataDictionaryMode>,
    pub settings: Option<PathBuf>,
    pub comparison: Option<PathBuf>,
    pub dependencies: Vec<PathBuf>,
}

pub fn create_command(options: CreateOptions) -> Result<()> {
    let start_time = Instant::now();
    output::print_header("Creating data dictionary");

    require_dir(&options.output, "--output")?;
    if let Some(comparison) = &options.comparison {
        require_file(comparison, "--comparison")?;
    }

    let layout = IgLayout::discover(&options.input)?;
    info!("Reading definitions from {}", layout.definitions_dir.display());

    let mut primary = DefinitionLake::new();
    let stats = DefinitionLoader::new()
        .load_into_lake(&layout.definitions_dir, &mut primary)
        .with_context(|| format!("Failed to load {}", layout.definitions_dir.display()))?;
    info!("Loaded {} definitions", stats.loaded);
    if stats.errors > 0 {
        warn!("{} files could not be read", stats.errors);
    }

    if primary.implementation_guides().is_empty() {
        bail!(
            "No ImplementationGuide instance found in {}. Point --input to the folder that \
             contains ImplementationGuide-<id>.json",
            layout.definitions_dir.display()
        );
    }
    let config = layout.configuration(&primary)?;

    let external = load_external(&config, &options.dependencies)?;
    debug!("External definitions: {:?}", external.stats());

    let mut settings = match &options.settings {
        Some(path) if path.is_file() => DataDictionarySettings::from_file(path)?,
        Some(path) => {
            warn!("Settings file {} not found; using defaults", path.display());
            DataDictionarySettings::default()
        }
        None => DataDictionarySettings::default(),
    };
    if let Some(mode) = options.mode {
        settings.mode = mode;
    }
    info!("Data dictionary mode: {}", settings.mode);

    let doc = SummaryAssembler::new(&primary, &external, &settings, &config).assemble()?;

    let name = settings.filename_or_default(&config.id);
    let json_path = options.output.join(format!("{name}.json"));
    doc.write(&json_path)?;
    output::print_written("Data dictionary", &json_path);

    let workbook = dictionary_workbook(&doc, &settings, &config);
    let workbook_path = JsonWorkbookSink::new(&options.output).write(&workbook, &name)?;
    output::print_written("Workbook", &workbook_path);
    output::print_dictionary_summary(&doc);

    if let Some(comparison) = &options.comparison {
        compare_with_previous(comparison, &doc)?;
    }

    info!("Finished in {:.2?}", start_time.elapsed());
    Ok(())
}

/// Dependency packages from the local package cache plus any `--dependency` folders
fn load_external(
    config: &ig_summary_core::IgConfiguration,
    extra: &[PathBuf],
) -> Result<DefinitionLake> {
    let mut external = DefinitionLake::new();

    match default_package_cache() {
        Some(cache) if cache.is_dir() => {
            let stats = load_dependency_packages(config, &cache, &mut external);
            info!("Loaded {} dependency definitions", stats.loaded);
        }
        _ if !config.dependencies.is_empty() => {
            warn!("No FHIR package cache found; dependency definitions are not available");
        }
        _ => {}
    }

    for dir in extra {
        let stats = DefinitionLoader::new()
            .load_into_lake(dir, &mut external)
            .with_context(|| format!("Failed to load dependency folder {}", dir.display()))?;
        info!("Loaded {} definitions from {}", stats.loaded, dir.display());
    }

    Ok(external)
}

fn compare_with_previous(previous: &std::path::Path, doc: &DataDictionary) -> Result<()> {
    let previous_doc = DataDictionary::load(previous)?;
    let differ = Differ::new(&previous_doc, doc, DiffSettings::default());

    let details = render_details(&differ);
    if !details.is_empty() {
        println!("{details}");
    }
    let summary = DiffSummary::of(&differ);
    summary.log();
    output::print_diff_summary(&summary);
    Ok(())
}
