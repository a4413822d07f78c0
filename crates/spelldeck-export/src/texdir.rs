// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The LaTeX working directory — templates in, generated fragment and PDFs out.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use spelldeck_core::error::{Result, SpelldeckError};

/// Templates that must exist before compiling.
pub const TEMPLATES: [&str; 2] = ["cards.tex", "printable.tex"];

/// File the templates `\input` the rendered cards from.
pub const SPELLS_FILE: &str = "spells.tex";

/// Suffixes of files latexmk leaves behind.
pub const INTERMEDIATE_SUFFIXES: [&str; 8] = [
    ".aux",
    ".log",
    ".out",
    ".toc",
    ".fdb_latexmk",
    ".fls",
    ".synctex.gz",
    ".xdv",
];

/// Handle on a tex directory such as `tex/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TexDir {
    root: PathBuf,
}

impl TexDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Paths of the templates, in compile order.
    pub fn templates(&self) -> Vec<PathBuf> {
        TEMPLATES.iter().map(|name| self.root.join(name)).collect()
    }

    /// PDF latexmk produces for `template` (`cards.tex` → `cards.pdf`).
    pub fn pdf_for(&self, template: &str) -> PathBuf {
        self.root.join(template).with_extension("pdf")
    }

    /// Fail with [`SpelldeckError::TemplateMissing`] on the first absent template.
    pub fn check_templates(&self) -> Result<()> {
        for template in self.templates() {
            if !template.is_file() {
                return Err(SpelldeckError::TemplateMissing(template));
            }
            debug!(template = %template.display(), "found template");
        }
        Ok(())
    }

    /// Write the rendered fragment to `spells.tex`, replacing any previous one.
    pub fn write_spells(&self, fragment: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.root)?;
        let path = self.root.join(SPELLS_FILE);
        fs::write(&path, fragment)?;
        info!(path = %path.display(), bytes = fragment.len(), "wrote spells fragment");
        Ok(path)
    }

    /// Copy the given PDFs into `dest`, creating it if needed. Every PDF must
    /// exist; a missing one is [`SpelldeckError::OutputMissing`].
    pub fn collect_pdfs(&self, pdfs: &[PathBuf], dest: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(dest)?;
        let mut copied = Vec::with_capacity(pdfs.len());
        for pdf in pdfs {
            if !pdf.is_file() {
                return Err(SpelldeckError::OutputMissing(pdf.clone()));
            }
            let Some(file_name) = pdf.file_name() else {
                return Err(SpelldeckError::OutputMissing(pdf.clone()));
            };
            let target = dest.join(file_name);
            fs::copy(pdf, &target)?;
            debug!(from = %pdf.display(), to = %target.display(), "copied pdf");
            copied.push(target);
        }
        Ok(copied)
    }

    /// Delete latexmk intermediates. Failures to remove a single file are
    /// logged and skipped. Returns how many files were removed.
    pub fn clean(&self) -> Result<usize> {
        let mut removed = 0;
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            let is_intermediate = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| INTERMEDIATE_SUFFIXES.iter().any(|s| name.ends_with(s)));
            if !is_intermediate || !path.is_file() {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => {
                    debug!(file = %path.display(), "removed intermediate");
                    removed += 1;
                }
                Err(e) => warn!(file = %path.display(), error = %e, "could not remove intermediate"),
            }
        }
        info!(removed, "cleaned tex directory");
        Ok(removed)
    }
}
