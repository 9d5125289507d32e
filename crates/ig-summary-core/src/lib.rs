//! IG Summary Core
//!
//! Data dictionaries for FHIR Implementation Guides.
//! This crate loads the conformance resources an IG publishes, resolves every
//! profile element into tabular rows, and compares two data dictionaries.
//!
//! A typical run:
//!
//! 1. [`DefinitionLoader`] fills a [`DefinitionLake`] from the IG output
//!    folder and a second one from the dependency packages
//! 2. [`SummaryAssembler`] turns both into a [`DataDictionary`]
//! 3. [`dictionary_workbook`] lays the document out for a [`WorkbookSink`]
//! 4. [`Differ`] compares two documents and [`Differ::to_workbook`] lays the
//!    diff out

pub mod config;
pub mod diff;
pub mod dictionary;
pub mod element;
pub mod error;
pub mod fishable;
pub mod lake;
pub mod loader;
pub mod models;
pub mod result;
pub mod summary;
pub mod value_set;
pub mod workbook;

// Re-export commonly used types
pub use config::{
    DataDictionaryMode, DataDictionarySettings, DiffSettings, IgConfiguration, IgLayout,
    IncludedValueSets, ProfileGroups, ResolutionFailurePolicy,
};
pub use dictionary::{DataDictionary, DictionaryMetadata, SummaryRow};
pub use diff::{DiffDetails, DiffSummary, Differ, render_details};
pub use element::{DataElementRow, TabularRow};
pub use error::{ErrorKind, IgSummaryError};
pub use fishable::{DefinitionSources, FhirType, Fishable};
pub use lake::{DefinitionLake, LakeStats};
pub use loader::{DefinitionLoader, LoadStats, default_package_cache, load_dependency_packages};
pub use result::{Result, ResultExt};
pub use summary::SummaryAssembler;
pub use value_set::{ValueSetExpander, ValueSetRow};
pub use workbook::{JsonWorkbookSink, Sheet, SheetRow, Workbook, WorkbookSink, dictionary_workbook};

/// Initialize tracing subscriber for logging
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ig_summary=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name
pub const NAME: &str = env!("CARGO_PKG_NAME");
