// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Card pipeline — validate → filter → (per spell) resolve area, process text,
// render → concatenate.
//
// Every stage is a pure function of its input, so per-spell work may run on
// the rayon pool; the collected output always keeps filter order.

use rayon::prelude::*;
use tracing::{debug, info, instrument, warn};

use spelldeck_core::config::{AppConfig, SchemaErrorPolicy};
use spelldeck_core::error::{Result, SpelldeckError};
use spelldeck_core::types::{FilterCriteria, SortMode, Spell};

use crate::area;
use crate::catalogue::Catalogue;
use crate::filter;
use crate::markup;
use crate::schema::validate_entry;
use crate::text::{DEFAULT_WRAP_WIDTH, TextProcessor};

/// The subset of [`AppConfig`] the pipeline needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    pub max_text_length: usize,
    pub wrap_width: usize,
    pub sort: SortMode,
    pub on_schema_error: SchemaErrorPolicy,
    pub parallel: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            max_text_length: 600,
            wrap_width: DEFAULT_WRAP_WIDTH,
            sort: SortMode::Name,
            on_schema_error: SchemaErrorPolicy::Skip,
            parallel: true,
        }
    }
}

impl From<&AppConfig> for PipelineOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_text_length: config.max_text_length,
            wrap_width: config.wrap_width,
            sort: config.sort,
            on_schema_error: config.on_schema_error,
            parallel: config.parallel,
        }
    }
}

/// Per-run statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Cards rendered.
    pub total: usize,
    /// Cards whose text was shortened.
    pub truncated: usize,
    /// Catalogue entries dropped by validation.
    pub skipped: usize,
}

/// One rendered card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCard {
    pub name: String,
    pub markup: String,
    pub truncated: bool,
}

/// Result of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    /// All blocks, blank-line separated, in filter order.
    pub fragment: String,
    pub report: RunReport,
}

impl RunOutput {
    fn from_cards(cards: Vec<RenderedCard>, skipped: usize) -> Self {
        let report = RunReport {
            total: cards.len(),
            truncated: cards.iter().filter(|card| card.truncated).count(),
            skipped,
        };
        let mut fragment = cards
            .into_iter()
            .map(|card| card.markup)
            .collect::<Vec<_>>()
            .join("\n\n");
        if !fragment.is_empty() {
            fragment.push('\n');
        }
        Self { fragment, report }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(options: PipelineOptions) -> Self {
        Self { options }
    }

    fn text_processor(&self) -> TextProcessor {
        TextProcessor::new(self.options.max_text_length, self.options.wrap_width)
    }

    /// Validate every entry in key order. Returns the valid spells and how
    /// many entries were skipped. Under [`SchemaErrorPolicy::Abort`] the first
    /// invalid entry fails the call.
    pub fn validate_all(&self, catalogue: &Catalogue) -> Result<(Vec<Spell>, usize)> {
        let mut spells = Vec::with_capacity(catalogue.len());
        let mut skipped = 0;

        for (name, entry) in catalogue.iter() {
            match validate_entry(name, entry) {
                Ok(spell) => spells.push(spell),
                Err(e) => match self.options.on_schema_error {
                    SchemaErrorPolicy::Abort => return Err(e),
                    SchemaErrorPolicy::Skip => {
                        warn!(spell = name, error = %e, "skipping invalid catalogue entry");
                        skipped += 1;
                    }
                },
            }
        }
        Ok((spells, skipped))
    }

    /// Render every spell matching `criteria`.
    #[instrument(skip_all, fields(entries = catalogue.len()))]
    pub fn run(&self, catalogue: &Catalogue, criteria: &FilterCriteria) -> Result<RunOutput> {
        let (spells, skipped) = self.validate_all(catalogue)?;
        let selected = filter::select(&spells, criteria, self.options.sort);

        let render_one = |spell: &&Spell| self.render_spell(spell);
        let cards: Vec<RenderedCard> = if self.options.parallel {
            selected.par_iter().map(render_one).collect()
        } else {
            selected.iter().map(render_one).collect()
        };

        let output = RunOutput::from_cards(cards, skipped);
        info!(
            total = output.report.total,
            truncated = output.report.truncated,
            skipped = output.report.skipped,
            max_length = self.options.max_text_length,
            "rendered cards"
        );
        Ok(output)
    }

    /// Render exactly one spell, looked up by name ignoring case. Validation
    /// errors always fail here: there is nothing to skip to.
    #[instrument(skip(self, catalogue))]
    pub fn run_single(&self, catalogue: &Catalogue, name: &str) -> Result<RunOutput> {
        let (key, entry) = catalogue
            .get(name)
            .ok_or_else(|| SpelldeckError::SpellNotFound(name.to_string()))?;
        let spell = validate_entry(key, entry)?;
        Ok(RunOutput::from_cards(vec![self.render_spell(&spell)], 0))
    }

    /// Resolve, process and render a single validated spell.
    pub fn render_spell(&self, spell: &Spell) -> RenderedCard {
        let area = area::resolve_for(&spell.range, &spell.text);
        let body = self.text_processor().process(&spell.text);
        debug!(
            spell = %spell.name,
            area = ?area,
            truncated = body.truncated,
            "rendering card"
        );

        RenderedCard {
            name: spell.name.clone(),
            markup: markup::render(spell, area.as_ref(), &body.text),
            truncated: body.truncated,
        }
    }
}
