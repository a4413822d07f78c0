// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spell catalogue — the persisted name→entry mapping, held raw until
// validation.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;
use tracing::{info, instrument};

use spelldeck_core::error::{Result, SpelldeckError};

/// Raw catalogue entries keyed by spell name. Iteration is in key order, so
/// a run never depends on the order of the source file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalogue {
    entries: BTreeMap<String, Value>,
}

impl Catalogue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object of `"Spell Name": { ...entry... }`.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let document: Value = serde_json::from_str(raw)?;
        let Value::Object(map) = document else {
            return Err(SpelldeckError::Catalogue(
                "expected a JSON object mapping spell names to entries".into(),
            ));
        };
        Ok(map.into_iter().collect())
    }

    /// Read and parse a catalogue file.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let catalogue = Self::from_json_str(&raw)?;
        info!(entries = catalogue.len(), "loaded catalogue");
        Ok(catalogue)
    }

    pub fn insert(&mut self, name: impl Into<String>, entry: Value) {
        self.entries.insert(name.into(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    /// Entry under exactly `name`, or failing that the single entry whose
    /// name matches ignoring case.
    pub fn get(&self, name: &str) -> Option<(&str, &Value)> {
        if let Some((key, entry)) = self.entries.get_key_value(name) {
            return Some((key.as_str(), entry));
        }
        let needle = name.trim().to_lowercase();
        self.iter().find(|(key, _)| key.to_lowercase() == needle)
    }
}

impl FromIterator<(String, Value)> for Catalogue {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
