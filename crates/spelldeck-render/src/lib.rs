// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// spelldeck-render — Catalogue entries to LaTeX card markup.
//
// Provides catalogue loading, schema validation, spell selection, text
// truncation and wrapping, area-of-effect resolution, and the per-card markup
// renderer, composed by `Pipeline`.

pub mod area;
pub mod catalogue;
pub mod filter;
pub mod markup;
pub mod pipeline;
pub mod schema;
pub mod text;

// Re-export the primary entry points so callers can use `spelldeck_render::Pipeline` etc.
pub use catalogue::Catalogue;
pub use pipeline::{Pipeline, PipelineOptions, RenderedCard, RunOutput, RunReport};
pub use schema::validate_entry;
pub use text::{ProcessedText, TextProcessor};
