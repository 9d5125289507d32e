//! Ordered element sequence with id lookup
//!
//! Profiles describe their element tree as a flat, ordered list where the
//! parent/child and slice relationships are encoded in the element ids
//! (`Observation.component:systolic.value[x]`). [`ElementTree`] keeps that
//! order and answers the sibling queries resolution needs by id prefix and
//! suffix.

use crate::error::IgSummaryError;
use crate::models::{ElementDefinition, StructureDefinition};
use crate::result::Result;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct ElementTree<'a> {
    elements: &'a [ElementDefinition],
    index: HashMap<&'a str, usize>,
}

impl<'a> ElementTree<'a> {
    pub fn new(elements: &'a [ElementDefinition]) -> Self {
        let mut index = HashMap::with_capacity(elements.len());
        for (position, element) in elements.iter().enumerate() {
            index.entry(element.id.as_str()).or_insert(position);
        }
        Self { elements, index }
    }

    /// Tree over the snapshot of a structure definition
    pub fn snapshot(sd: &'a StructureDefinition) -> Self {
        Self::new(sd.snapshot_elements())
    }

    /// Tree over the differential of a structure definition
    pub fn differential(sd: &'a StructureDefinition) -> Self {
        Self::new(sd.differential_elements())
    }

    pub fn root(&self) -> Option<&'a ElementDefinition> {
        self.elements.first()
    }

    pub fn elements(&self) -> &'a [ElementDefinition] {
        self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn by_id(&self, id: &str) -> Option<&'a ElementDefinition> {
        self.index.get(id).map(|&position| &self.elements[position])
    }

    /// Elements whose id starts with `start`, excluding the element whose id is exactly `start`
    pub fn with_prefix(&self, start: &str) -> Vec<&'a ElementDefinition> {
        self.elements
            .iter()
            .filter(|e| e.id.starts_with(start) && e.id != start)
            .collect()
    }

    /// Elements whose id starts with `start` and ends with `end`
    pub fn with_prefix_and_suffix(&self, start: &str, end: &str) -> Vec<&'a ElementDefinition> {
        self.elements
            .iter()
            .filter(|e| e.id.starts_with(start) && e.id.ends_with(end))
            .collect()
    }

    /// Like [`Self::with_prefix_and_suffix`], but more than one match is an error
    pub fn unique_with_prefix_and_suffix(
        &self,
        start: &str,
        end: &str,
    ) -> Result<Option<&'a ElementDefinition>> {
        let matches = self.with_prefix_and_suffix(start, end);
        match matches.as_slice() {
            [] => Ok(None),
            [only] => Ok(Some(*only)),
            _ => Err(IgSummaryError::AmbiguousElement {
                start: start.to_string(),
                end: end.to_string(),
                count: matches.len(),
            }),
        }
    }

    /// Whether any element id starts with `start`
    pub fn any_with_prefix(&self, start: &str) -> bool {
        self.elements.iter().any(|e| e.id.starts_with(start))
    }
}
