// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Spelldeck.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for all Spelldeck operations.
#[derive(Debug, Error)]
pub enum SpelldeckError {
    // -- Catalogue / selection errors --
    #[error("spell '{spell}': invalid field '{field}': {reason}")]
    Schema {
        spell: String,
        field: String,
        reason: String,
    },

    #[error("invalid filter value '{token}': {reason}")]
    Filter { token: String, reason: String },

    #[error("catalogue is malformed: {0}")]
    Catalogue(String),

    #[error("spell not found in catalogue: {0}")]
    SpellNotFound(String),

    // -- Typesetting / rasterization --
    #[error("template not found: {}", .0.display())]
    TemplateMissing(PathBuf),

    #[error("required tool not found on PATH: {0}")]
    ToolMissing(String),

    #[error("{tool} exited with {status}: {stderr}")]
    ExternalTool {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("expected output was not produced: {}", .0.display())]
    OutputMissing(PathBuf),

    // -- Command line --
    #[error("usage error: {0}")]
    Usage(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SpelldeckError {
    /// Shorthand for building a [`SpelldeckError::Schema`].
    pub fn schema(
        spell: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Schema {
            spell: spell.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for building a [`SpelldeckError::Filter`].
    pub fn filter(token: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Filter {
            token: token.into(),
            reason: reason.into(),
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SpelldeckError>;
