//! Summary assembly
//!
//! Walks every profile of the IG, resolves its elements and gathers the rows
//! and summary tables of a [`DataDictionary`].

use crate::config::{
    DataDictionaryMode, DataDictionarySettings, IgConfiguration, ProfileGroups,
    ResolutionFailurePolicy,
};
use crate::dictionary::{DataDictionary, DictionaryMetadata, SummaryRow};
use crate::element::{DataElementRow, ElementMetadata, ProfileElement, ResolveContext};
use crate::error::IgSummaryError;
use crate::fishable::DefinitionSources;
use crate::lake::DefinitionLake;
use crate::models::StructureDefinition;
use crate::result::{Result, ResultExt};
use crate::value_set::ValueSetExpander;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Marks elements referenced by a quality measure
const USED_BY_MEASURE_URL: &str = "/StructureDefinition/used-by-measure";

pub struct SummaryAssembler<'a> {
    primary: &'a DefinitionLake,
    external: &'a DefinitionLake,
    settings: &'a DataDictionarySettings,
    config: &'a IgConfiguration,
    groups: ProfileGroups,
}

impl<'a> SummaryAssembler<'a> {
    pub fn new(
        primary: &'a DefinitionLake,
        external: &'a DefinitionLake,
        settings: &'a DataDictionarySettings,
        config: &'a IgConfiguration,
    ) -> Self {
        Self {
            primary,
            external,
            settings,
            config,
            groups: ProfileGroups::from_config(config),
        }
    }

    pub fn assemble(&self) -> Result<DataDictionary> {
        let profiles = self.primary.profiles();
        if profiles.is_empty() {
            return Err(IgSummaryError::config_error(
                "No profiles found in the IG definitions",
            ));
        }
        info!(
            "Summarizing {} profiles in {} mode",
            profiles.len(),
            self.settings.mode
        );

        let mut profile_elements = self.profile_elements(&profiles)?;

        let used_by_measure = used_by_measure_index(&profiles);
        for row in &mut profile_elements {
            let key = (row.profile_title.clone(), row.fhir_element.clone());
            if used_by_measure.contains(&key) {
                row.used_by_measure = Some("true".to_string());
            }
        }

        let expander = ValueSetExpander::new(self.primary.value_sets(), self.settings);
        let value_set_elements = expander.expand_all();

        Ok(DataDictionary {
            profiles: self.profile_rows(&profiles),
            profile_elements,
            value_sets: self.value_set_rows(),
            value_set_elements,
            extensions: self.extension_rows(),
            code_systems: self.code_system_rows(),
            metadata: DictionaryMetadata {
                title: self.config.title.clone().unwrap_or_default(),
                version: self.config.version.clone().unwrap_or_default(),
            },
        })
    }

    fn profile_elements(
        &self,
        profiles: &[&'a StructureDefinition],
    ) -> Result<Vec<DataElementRow>> {
        let sources = DefinitionSources::new(self.primary, self.external);
        let ctx = ResolveContext::new(sources, self.settings);

        let mut rows = Vec::new();
        let mut seen = HashSet::new();
        for &sd in profiles.iter().filter(|sd| !sd.is_abstract()) {
            let resolved = self.rows_for_profile(sd, ctx);
            let profile_rows = match self.settings.on_resolution_error {
                ResolutionFailurePolicy::Abort => resolved?,
                ResolutionFailurePolicy::SkipProfile => match resolved.recoverable()? {
                    Some(profile_rows) => profile_rows,
                    None => {
                        warn!("{} left out of the data dictionary", sd.url);
                        continue;
                    }
                },
            };

            // Extensions bring their sub-elements along, which other profiles may repeat
            for row in profile_rows {
                if seen.insert(row.diff_key()) {
                    rows.push(row);
                }
            }
        }
        Ok(rows)
    }

    fn rows_for_profile(
        &self,
        sd: &'a StructureDefinition,
        ctx: ResolveContext<'a>,
    ) -> Result<Vec<DataElementRow>> {
        debug!("Summarizing {}", sd.url);
        let group = self.groups.group_for(sd.id.as_deref().unwrap_or_default());
        let metadata = ElementMetadata::for_profile(
            sd.display_title(),
            group,
            sd.type_.clone().unwrap_or_default(),
            sd.url.clone(),
        );

        let mut rows = Vec::new();
        for elem in sd.snapshot_elements().iter().skip(1) {
            if self.settings.is_excluded(&elem.id) {
                warn!("{} wasn't included in the output summary report", elem.id);
                continue;
            }
            if self.settings.mode == DataDictionaryMode::MustSupport && !elem.is_must_support() {
                continue;
            }
            let element = ProfileElement::resolve(elem, metadata.clone(), ctx)?;
            rows.extend(element.to_rows());
        }
        Ok(rows)
    }

    /// Sorted by group, then title
    fn profile_rows(&self, profiles: &[&StructureDefinition]) -> Vec<SummaryRow> {
        let mut seen = HashSet::new();
        let mut rows: Vec<SummaryRow> = profiles
            .iter()
            .filter(|sd| seen.insert(sd.url.as_str()))
            .map(|sd| SummaryRow {
                group: Some(
                    self.groups
                        .group_for(sd.id.as_deref().unwrap_or_default())
                        .to_string(),
                ),
                title: sd.display_title().to_string(),
                url: sd.url.clone(),
                description: sd.description.clone().unwrap_or_default(),
            })
            .collect();
        rows.sort_by(|a, b| (&a.group, &a.title).cmp(&(&b.group, &b.title)));
        rows
    }

    fn extension_rows(&self) -> Vec<SummaryRow> {
        let mut seen = HashSet::new();
        self.primary
            .extensions()
            .into_iter()
            .filter(|sd| seen.insert(sd.url.as_str()))
            .map(|sd| summary_row(sd.title.as_deref(), &sd.url, sd.description.as_deref()))
            .collect()
    }

    fn value_set_rows(&self) -> Vec<SummaryRow> {
        self.primary
            .value_sets()
            .values()
            .map(|vs| summary_row(vs.title.as_deref(), &vs.url, vs.description.as_deref()))
            .collect()
    }

    fn code_system_rows(&self) -> Vec<SummaryRow> {
        let mut seen = HashSet::new();
        self.primary
            .code_systems()
            .filter(|cs| seen.insert(cs.url.as_str()))
            .map(|cs| summary_row(cs.title.as_deref(), &cs.url, cs.description.as_deref()))
            .collect()
    }
}

fn summary_row(title: Option<&str>, url: &str, description: Option<&str>) -> SummaryRow {
    SummaryRow {
        group: None,
        title: title.unwrap_or_default().to_string(),
        url: url.to_string(),
        description: description.unwrap_or_default().to_string(),
    }
}

/// (profile title, element id) of every element flagged as used by a measure
fn used_by_measure_index(profiles: &[&StructureDefinition]) -> HashSet<(String, String)> {
    let mut index = HashSet::new();
    for sd in profiles {
        let title = sd.display_title();
        for elem in sd.snapshot_elements().iter().skip(1) {
            if elem.has_extension_url_containing(USED_BY_MEASURE_URL) {
                index.insert((title.to_string(), elem.id.clone()));
            }
        }
    }
    index
}
