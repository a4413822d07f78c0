// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::types::SortMode;

/// What a run does when a catalogue entry fails validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaErrorPolicy {
    /// Log the entry, count it as skipped, and keep going.
    #[default]
    Skip,
    /// Fail the whole run on the first invalid entry.
    Abort,
}

/// Raster formats a single card can be exported to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    #[serde(alias = "jpeg")]
    Jpg,
    Svg,
}

impl ImageFormat {
    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg => "jpg",
            Self::Svg => "svg",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ImageFormat {
    type Err = String;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpg),
            "svg" => Ok(Self::Svg),
            other => Err(format!("unsupported image format '{other}' (expected png, jpg or svg)")),
        }
    }
}

/// Persistent application settings. Every field has a default, so a config
/// file only needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// JSON catalogue mapping spell names to entries.
    pub catalogue_path: PathBuf,
    /// Holds cards.tex, printable.tex and the generated spells.tex.
    pub tex_dir: PathBuf,
    /// Where compiled PDFs are copied.
    pub output_dir: PathBuf,
    /// Card text longer than this many characters is truncated.
    pub max_text_length: usize,
    /// Column the card text is wrapped at.
    pub wrap_width: usize,
    pub sort: SortMode,
    pub on_schema_error: SchemaErrorPolicy,
    /// Render spells on the rayon pool.
    pub parallel: bool,
    /// Engine passed to latexmk (`-xelatex`, `-pdflatex`, ...).
    pub latex_compiler: String,
    pub image_dpi: u32,
    pub image_format: ImageFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalogue_path: PathBuf::from("data/spells.json"),
            tex_dir: PathBuf::from("tex"),
            output_dir: PathBuf::from("pdf"),
            max_text_length: 600,
            wrap_width: 80,
            sort: SortMode::Name,
            on_schema_error: SchemaErrorPolicy::Skip,
            parallel: true,
            latex_compiler: "xelatex".into(),
            image_dpi: 600,
            image_format: ImageFormat::Png,
        }
    }
}

impl AppConfig {
    /// Load settings from a JSON file. A missing file gives the defaults; a
    /// file that exists but does not parse is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&raw)?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }
}
