// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Typesetting — compile the tex directory's templates into PDFs.

use std::path::PathBuf;
use std::process::Command;

use tracing::{info, instrument};

use spelldeck_core::error::{Result, SpelldeckError};

use crate::texdir::{TEMPLATES, TexDir};
use crate::tools;

/// Turns a prepared tex directory into PDFs.
pub trait Typesetter {
    /// Executables that must be on `PATH` for [`Typesetter::typeset`] to work.
    fn required_tools(&self) -> Vec<String>;

    /// Compile every template, returning the produced PDFs in template order.
    fn typeset(&self, tex: &TexDir) -> Result<Vec<PathBuf>>;
}

/// Runs `latexmk -<compiler> -cd cards.tex printable.tex`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatexmkTypesetter {
    program: String,
    compiler: String,
}

impl LatexmkTypesetter {
    pub const PROGRAM: &'static str = "latexmk";

    /// `compiler` is the engine flag without its dash (`xelatex`, `pdflatex`, `lualatex`).
    pub fn new(compiler: impl Into<String>) -> Self {
        Self {
            program: Self::PROGRAM.to_string(),
            compiler: compiler.into(),
        }
    }

    /// Use a different latexmk executable.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// The command [`Typesetter::typeset`] runs.
    pub fn command(&self, tex: &TexDir) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg(format!("-{}", self.compiler.trim_start_matches('-')))
            .arg("-cd")
            .args(tex.templates());
        command
    }
}

impl Default for LatexmkTypesetter {
    fn default() -> Self {
        Self::new("xelatex")
    }
}

impl Typesetter for LatexmkTypesetter {
    fn required_tools(&self) -> Vec<String> {
        vec![
            self.program.clone(),
            self.compiler.trim_start_matches('-').to_string(),
        ]
    }

    #[instrument(skip_all, fields(tex = %tex.root().display(), compiler = %self.compiler))]
    fn typeset(&self, tex: &TexDir) -> Result<Vec<PathBuf>> {
        tex.check_templates()?;
        tools::run(&self.program, &mut self.command(tex))?;

        let pdfs: Vec<PathBuf> = TEMPLATES.iter().map(|t| tex.pdf_for(t)).collect();
        if let Some(missing) = pdfs.iter().find(|pdf| !pdf.is_file()) {
            return Err(SpelldeckError::OutputMissing(missing.clone()));
        }
        info!(count = pdfs.len(), "compiled pdfs");
        Ok(pdfs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn tex_dir() -> (tempfile::TempDir, TexDir) {
        let dir = tempfile::tempdir().unwrap();
        for template in TEMPLATES {
            fs::write(dir.path().join(template), "").unwrap();
        }
        let tex = TexDir::new(dir.path());
        (dir, tex)
    }

    #[test]
    fn command_line_matches_latexmk_usage() {
        let (_dir, tex) = tex_dir();
        let command = LatexmkTypesetter::new("pdflatex").command(&tex);
        let args: Vec<String> = command
            .get_args()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        assert_eq!(command.get_program(), "latexmk");
        assert_eq!(args[0], "-pdflatex");
        assert_eq!(args[1], "-cd");
        assert!(args[2].ends_with("cards.tex"));
        assert!(args[3].ends_with("printable.tex"));
    }

    #[test]
    fn leading_dash_on_compiler_is_tolerated() {
        let (_dir, tex) = tex_dir();
        let command = LatexmkTypesetter::new("-lualatex").command(&tex);
        assert_eq!(command.get_args().next().unwrap(), "-lualatex");
    }

    #[test]
    fn required_tools_include_engine() {
        assert_eq!(
            LatexmkTypesetter::default().required_tools(),
            ["latexmk", "xelatex"]
        );
    }

    #[test]
    fn missing_templates_fail_before_running() {
        let dir = tempfile::tempdir().unwrap();
        let tex = TexDir::new(dir.path());
        let typesetter = LatexmkTypesetter::default().with_program("spelldeck-no-such-latexmk");
        assert!(matches!(
            typesetter.typeset(&tex),
            Err(SpelldeckError::TemplateMissing(_))
        ));
    }

    #[cfg(unix)]
    fn fake_latexmk(dir: &std::path::Path, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("fake-latexmk");
        fs::write(&script, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        script.to_string_lossy().into_owned()
    }

    #[cfg(unix)]
    #[test]
    fn produced_pdfs_are_returned_in_template_order() {
        let (dir, tex) = tex_dir();
        let bin = tempfile::tempdir().unwrap();
        let program = fake_latexmk(
            bin.path(),
            r#"for f in "$@"; do case "$f" in *.tex) : > "${f%.tex}.pdf";; esac; done"#,
        );
        let pdfs = LatexmkTypesetter::default()
            .with_program(program)
            .typeset(&tex)
            .unwrap();
        assert_eq!(
            pdfs,
            [dir.path().join("cards.pdf"), dir.path().join("printable.pdf")]
        );
    }

    #[cfg(unix)]
    #[test]
    fn missing_output_is_reported() {
        let (_dir, tex) = tex_dir();
        let bin = tempfile::tempdir().unwrap();
        let program = fake_latexmk(bin.path(), "exit 0");
        assert!(matches!(
            LatexmkTypesetter::default().with_program(program).typeset(&tex),
            Err(SpelldeckError::OutputMissing(path)) if path.ends_with("cards.pdf")
        ));
    }

    #[cfg(unix)]
    #[test]
    fn compiler_failure_is_external_tool_error() {
        let (_dir, tex) = tex_dir();
        let bin = tempfile::tempdir().unwrap();
        let program = fake_latexmk(bin.path(), "echo '! Undefined control sequence.'; exit 12");
        match LatexmkTypesetter::default().with_program(program).typeset(&tex) {
            Err(SpelldeckError::ExternalTool { stderr, .. }) => {
                assert!(stderr.contains("Undefined control sequence"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
