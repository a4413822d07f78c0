// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rasterisation — render a compiled card PDF to PNG, JPEG or SVG with
// ImageMagick, falling back to poppler's pdftoppm.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info, instrument};

use spelldeck_core::config::ImageFormat;
use spelldeck_core::error::{Result, SpelldeckError};

use crate::tools;

/// Directory single-card exports go to when no output path is given.
pub const DEFAULT_SAMPLES_DIR: &str = "samples";

/// Characters that are unsafe in file names on at least one platform.
const UNSAFE_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*', ' '];

/// Renders one PDF page to an image file.
pub trait Rasterizer {
    /// Write `pdf` to `output` at `dpi` in `format`, returning the path written.
    fn rasterize(&self, pdf: &Path, output: &Path, dpi: u32, format: ImageFormat)
    -> Result<PathBuf>;
}

/// A conversion tool found on `PATH`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RasterTool {
    /// ImageMagick 7: `magick convert ...`.
    Magick(PathBuf),
    /// ImageMagick 6: `convert ...`.
    Convert(PathBuf),
    /// poppler-utils; cannot write SVG.
    Pdftoppm(PathBuf),
}

impl RasterTool {
    /// Pick the first usable tool on `PATH` for `format`.
    pub fn detect(format: ImageFormat) -> Result<Self> {
        Self::choose(
            tools::find_tool("magick").ok(),
            tools::find_tool("convert").ok(),
            tools::find_tool("pdftoppm").ok(),
            format,
        )
    }

    /// Preference order: ImageMagick 7, ImageMagick 6, pdftoppm (PNG/JPEG only).
    pub fn choose(
        magick: Option<PathBuf>,
        convert: Option<PathBuf>,
        pdftoppm: Option<PathBuf>,
        format: ImageFormat,
    ) -> Result<Self> {
        if let Some(path) = magick {
            return Ok(Self::Magick(path));
        }
        if let Some(path) = convert {
            return Ok(Self::Convert(path));
        }
        match (pdftoppm, format) {
            (Some(_), ImageFormat::Svg) => Err(SpelldeckError::ToolMissing(
                "ImageMagick (magick or convert) for SVG output".into(),
            )),
            (Some(path), _) => Ok(Self::Pdftoppm(path)),
            (None, _) => Err(SpelldeckError::ToolMissing(
                "ImageMagick (magick or convert) or pdftoppm".into(),
            )),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Magick(_) => "magick",
            Self::Convert(_) => "convert",
            Self::Pdftoppm(_) => "pdftoppm",
        }
    }

    pub fn program(&self) -> &Path {
        match self {
            Self::Magick(path) | Self::Convert(path) | Self::Pdftoppm(path) => path,
        }
    }

    /// Arguments after the program name.
    pub fn args(&self, pdf: &Path, output: &Path, dpi: u32, format: ImageFormat) -> Vec<OsString> {
        let dpi = dpi.to_string();
        let jpeg = format == ImageFormat::Jpg;
        let mut args: Vec<OsString> = Vec::new();
        match self {
            Self::Magick(_) | Self::Convert(_) => {
                if matches!(self, Self::Magick(_)) {
                    args.push("convert".into());
                }
                args.push("-density".into());
                args.push(dpi.into());
                args.push(pdf.into());
                args.push("-quality".into());
                args.push(if jpeg { "80" } else { "100" }.into());
                if jpeg {
                    for arg in ["-sampling-factor", "4:2:0", "-interlace", "JPEG", "-colorspace", "sRGB"] {
                        args.push(arg.into());
                    }
                }
                args.push(output.into());
            }
            Self::Pdftoppm(_) => {
                args.push(if jpeg { "-jpeg" } else { "-png" }.into());
                args.push("-r".into());
                args.push(dpi.into());
                args.push("-singlefile".into());
                args.push(pdf.into());
                args.push(output.with_extension("").into());
            }
        }
        args
    }

    /// Where the tool actually writes. pdftoppm appends its own extension to
    /// the stem it is given.
    pub fn written_path(&self, output: &Path, format: ImageFormat) -> PathBuf {
        match self {
            Self::Pdftoppm(_) => output.with_extension(format.extension()),
            _ => output.to_path_buf(),
        }
    }
}

/// [`Rasterizer`] backed by an external [`RasterTool`].
#[derive(Debug, Clone)]
pub struct ExternalRasterizer {
    tool: RasterTool,
}

impl ExternalRasterizer {
    pub fn new(tool: RasterTool) -> Self {
        Self { tool }
    }
}

impl Rasterizer for ExternalRasterizer {
    #[instrument(skip_all, fields(tool = self.tool.name(), dpi, %format))]
    fn rasterize(
        &self,
        pdf: &Path,
        output: &Path,
        dpi: u32,
        format: ImageFormat,
    ) -> Result<PathBuf> {
        if format == ImageFormat::Svg && matches!(self.tool, RasterTool::Pdftoppm(_)) {
            return Err(SpelldeckError::ToolMissing(
                "ImageMagick (magick or convert) for SVG output".into(),
            ));
        }
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut command = Command::new(self.tool.program());
        command.args(self.tool.args(pdf, output, dpi, format));
        tools::run(self.tool.name(), &mut command)?;

        let written = self.tool.written_path(output, format);
        if !written.is_file() {
            return Err(SpelldeckError::OutputMissing(written));
        }
        if written != output {
            debug!(from = %written.display(), to = %output.display(), "renaming output");
            fs::rename(&written, output)?;
        }
        info!(output = %output.display(), "rasterized card");
        Ok(output.to_path_buf())
    }
}

/// File-system-safe, lowercase version of a spell name.
///
/// `"Melf's Acid Arrow"` → `"melf's_acid_arrow"`, `"Tasha's: Mind/Whip"` →
/// `"tasha's__mind_whip"`.
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| if UNSAFE_FILENAME_CHARS.contains(&c) { '_' } else { c })
        .collect();
    replaced.trim_matches(['.', ' ']).to_lowercase()
}

/// `samples/<sanitized name>.<ext>`.
pub fn default_output_path(spell_name: &str, format: ImageFormat) -> PathBuf {
    Path::new(DEFAULT_SAMPLES_DIR).join(format!(
        "{}.{}",
        sanitize_filename(spell_name),
        format.extension()
    ))
}
