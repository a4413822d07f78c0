// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the command line.
//
// Every error is mapped to a one-line explanation plus a concrete suggestion.
// The severity tells the caller whose problem it is.

use crate::error::SpelldeckError;

/// Who has to act to fix an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The command line or criteria were wrong.
    UsageMistake,
    /// A catalogue entry or the catalogue file itself is broken.
    BadData,
    /// Something must be installed or created before retrying.
    ActionRequired,
    /// Disk, permissions, or an external tool failing at runtime.
    Environment,
}

/// A human-readable error with a plain message and an actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Short summary (printed first).
    pub message: String,
    /// What the user should try next.
    pub suggestion: String,
    pub severity: Severity,
}

/// Convert a `SpelldeckError` into a `HumanError`.
pub fn humanize_error(err: &SpelldeckError) -> HumanError {
    match err {
        SpelldeckError::Schema {
            spell,
            field,
            reason,
        } => HumanError {
            message: format!("The catalogue entry for \"{spell}\" is invalid."),
            suggestion: format!(
                "Fix the '{field}' field in the catalogue ({reason})."
            ),
            severity: Severity::BadData,
        },

        SpelldeckError::Filter { token, reason } => HumanError {
            message: format!("\"{token}\" is not a valid selection."),
            suggestion: format!(
                "{reason}. Levels are 0-9 and ranges are written low-high, e.g. -l 1-3."
            ),
            severity: Severity::UsageMistake,
        },

        SpelldeckError::Catalogue(detail) => HumanError {
            message: "The spell catalogue could not be read.".into(),
            suggestion: format!(
                "The file must be a JSON object mapping spell names to entries. ({detail})"
            ),
            severity: Severity::BadData,
        },

        SpelldeckError::SpellNotFound(name) => HumanError {
            message: format!("No spell called \"{name}\" is in the catalogue."),
            suggestion: "Check the spelling. Names are matched case-insensitively but must be complete.".into(),
            severity: Severity::UsageMistake,
        },

        SpelldeckError::TemplateMissing(path) => HumanError {
            message: format!("The LaTeX template {} is missing.", path.display()),
            suggestion: "Point tex_dir in the config at a directory containing cards.tex and printable.tex.".into(),
            severity: Severity::ActionRequired,
        },

        SpelldeckError::ToolMissing(tool) => humanize_missing_tool(tool),

        SpelldeckError::ExternalTool { tool, stderr, .. } => humanize_tool_failure(tool, stderr),

        SpelldeckError::OutputMissing(path) => HumanError {
            message: format!("{} was not created.", path.display()),
            suggestion: "Re-run with -v to see the tool output, and check the LaTeX log in the tex directory.".into(),
            severity: Severity::Environment,
        },

        SpelldeckError::Usage(detail) => HumanError {
            message: "The command line could not be understood.".into(),
            suggestion: format!("{detail}. Run `spelldeck --help` for the list of options."),
            severity: Severity::UsageMistake,
        },

        SpelldeckError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => HumanError {
                message: "A file or directory could not be found.".into(),
                suggestion: format!("Check the configured paths. ({io_err})"),
                severity: Severity::ActionRequired,
            },
            std::io::ErrorKind::PermissionDenied => HumanError {
                message: "Permission denied while reading or writing a file.".into(),
                suggestion: "Check the permissions on the tex and output directories.".into(),
                severity: Severity::Environment,
            },
            _ => HumanError {
                message: "There was a problem reading or writing a file.".into(),
                suggestion: format!("Try again. ({io_err})"),
                severity: Severity::Environment,
            },
        },

        SpelldeckError::Serialization(detail) => HumanError {
            message: "A JSON file could not be parsed.".into(),
            suggestion: format!("Check the catalogue and config files for syntax errors. ({detail})"),
            severity: Severity::BadData,
        },
    }
}

fn humanize_missing_tool(tools: &str) -> HumanError {
    let names: Vec<&str> = tools.split(',').map(str::trim).collect();
    let any = |candidates: &[&str]| names.iter().any(|name| candidates.contains(name));

    let suggestion = if any(&["latexmk", "xelatex", "pdflatex", "lualatex"]) {
        "Install a TeX distribution (TeX Live or MiKTeX) that provides latexmk and xelatex."
    } else if any(&["magick", "convert", "pdftoppm"]) || tools.contains("ImageMagick") {
        "Install ImageMagick (magick/convert) or poppler-utils (pdftoppm) to export images."
    } else {
        "Install it and make sure it is on your PATH."
    };
    let verb = if names.len() > 1 { "are" } else { "is" };
    HumanError {
        message: format!("{tools} {verb} not installed."),
        suggestion: suggestion.into(),
        severity: Severity::ActionRequired,
    }
}

/// Pick out the failure modes the typesetter and rasterizer commonly hit.
fn humanize_tool_failure(tool: &str, stderr: &str) -> HumanError {
    let lower = stderr.to_ascii_lowercase();

    if lower.contains(".sty' not found") || lower.contains(".sty not found") {
        HumanError {
            message: "A LaTeX package used by the templates is not installed.".into(),
            suggestion: "Install the missing package with your TeX distribution's package manager (tlmgr or the MiKTeX console).".into(),
            severity: Severity::ActionRequired,
        }
    } else if lower.contains("undefined control sequence") {
        HumanError {
            message: "The templates do not define a macro used on the cards.".into(),
            suggestion: "Make sure cards.tex defines the spell environment and \\areaicon, \\ritualmark, \\concentrationmark, \\spellattack and \\spelleffect.".into(),
            severity: Severity::BadData,
        }
    } else if lower.contains("not authorized") {
        HumanError {
            message: "ImageMagick refused to read the PDF.".into(),
            suggestion: "Allow PDF reading in ImageMagick's policy.xml, or install pdftoppm.".into(),
            severity: Severity::ActionRequired,
        }
    } else {
        HumanError {
            message: format!("{tool} failed."),
            suggestion: format!("Re-run with -v for details. ({})", first_line(stderr)),
            severity: Severity::Environment,
        }
    }
}

fn first_line(text: &str) -> &str {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("no output")
}
