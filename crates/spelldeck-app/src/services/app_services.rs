// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer — wires the catalogue, render pipeline, tex directory
// and external tools together for the two CLI commands.
//
// The typesetter is held as a trait object so tests can substitute one that
// writes placeholder PDFs instead of invoking latexmk.

use std::fs;
use std::path::PathBuf;

use tracing::{info, instrument, warn};

use spelldeck_core::AppConfig;
use spelldeck_core::config::ImageFormat;
use spelldeck_core::error::{Result, SpelldeckError};
use spelldeck_core::types::FilterCriteria;
use spelldeck_export::Rasterizer;
use spelldeck_export::texdir::TexDir;
use spelldeck_export::tools;
use spelldeck_export::typeset::{LatexmkTypesetter, Typesetter};
use spelldeck_render::catalogue::Catalogue;
use spelldeck_render::pipeline::{Pipeline, PipelineOptions, RunOutput, RunReport};

/// What `generate` does after rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildPlan {
    /// Run the typesetter and copy its PDFs to the output directory.
    pub compile: bool,
    /// Remove LaTeX intermediates afterwards. Ignored without `compile`.
    pub clean: bool,
}

impl Default for BuildPlan {
    fn default() -> Self {
        Self {
            compile: true,
            clean: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateOutcome {
    pub report: RunReport,
    pub spells_file: PathBuf,
    /// PDFs copied into the output directory. Empty when nothing was compiled.
    pub pdfs: Vec<PathBuf>,
}

/// Where and how `export-image` writes its image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    pub output: PathBuf,
    pub dpi: u32,
    pub format: ImageFormat,
    pub keep_pdf: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutcome {
    pub image: PathBuf,
    /// The single-card PDF, when kept.
    pub pdf: Option<PathBuf>,
}

pub struct AppServices {
    config: AppConfig,
    tex: TexDir,
    typesetter: Box<dyn Typesetter>,
}

impl AppServices {
    pub fn new(config: AppConfig, typesetter: Box<dyn Typesetter>) -> Self {
        let tex = TexDir::new(&config.tex_dir);
        info!(tex = %tex.root().display(), catalogue = %config.catalogue_path.display(), "initialising app services");
        Self {
            config,
            tex,
            typesetter,
        }
    }

    /// Services compiling through latexmk with the configured engine.
    pub fn with_latexmk(config: AppConfig) -> Self {
        let typesetter = LatexmkTypesetter::new(config.latex_compiler.clone());
        Self::new(config, Box::new(typesetter))
    }

    fn pipeline(&self) -> Pipeline {
        Pipeline::new(PipelineOptions::from(&self.config))
    }

    fn load_catalogue(&self) -> Result<Catalogue> {
        Catalogue::load(&self.config.catalogue_path)
    }

    /// Fail with [`SpelldeckError::ToolMissing`] naming every absent
    /// executable, and with [`SpelldeckError::TemplateMissing`] when a
    /// template is gone. Nothing has been written when this fails.
    pub fn preflight(&self) -> Result<()> {
        let required = self.typesetter.required_tools();
        let names: Vec<&str> = required.iter().map(String::as_str).collect();
        let missing = tools::missing_tools(&names);
        if !missing.is_empty() {
            return Err(SpelldeckError::ToolMissing(missing.join(", ")));
        }
        self.tex.check_templates()
    }

    /// Load, validate, filter and render. Touches no files beyond the catalogue.
    pub fn render(&self, criteria: &FilterCriteria) -> Result<RunOutput> {
        if criteria.is_unconstrained() {
            info!("no filters given, rendering the whole catalogue");
        }
        let catalogue = self.load_catalogue()?;
        self.pipeline().run(&catalogue, criteria)
    }

    /// Render the selection into `spells.tex` and, per `plan`, compile it and
    /// copy the PDFs to the output directory.
    #[instrument(skip_all, fields(compile = plan.compile, clean = plan.clean))]
    pub fn generate(&self, criteria: &FilterCriteria, plan: BuildPlan) -> Result<GenerateOutcome> {
        if plan.compile {
            self.preflight()?;
        }

        let output = self.render(criteria)?;
        let spells_file = self.tex.write_spells(&output.fragment)?;
        let report = output.report;
        info!(
            total = report.total,
            truncated = report.truncated,
            skipped = report.skipped,
            "rendered spell cards"
        );

        if !plan.compile {
            return Ok(GenerateOutcome {
                report,
                spells_file,
                pdfs: Vec::new(),
            });
        }
        if report.total == 0 {
            warn!("no spells matched the filters, skipping compilation");
            return Ok(GenerateOutcome {
                report,
                spells_file,
                pdfs: Vec::new(),
            });
        }

        let compiled = self.typesetter.typeset(&self.tex)?;
        let pdfs = self.tex.collect_pdfs(&compiled, &self.config.output_dir)?;
        if plan.clean {
            self.tex.clean()?;
        }
        info!(count = pdfs.len(), dir = %self.config.output_dir.display(), "pdfs ready");

        Ok(GenerateOutcome {
            report,
            spells_file,
            pdfs,
        })
    }

    /// Render one spell alone, compile it, and rasterize its card PDF into
    /// `request.output`. The PDF sits next to the image under the same stem
    /// and is removed afterwards unless `keep_pdf` is set.
    #[instrument(skip(self, request, rasterizer), fields(output = %request.output.display()))]
    pub fn export_image(
        &self,
        spell: &str,
        request: &ExportRequest,
        rasterizer: &dyn Rasterizer,
    ) -> Result<ExportOutcome> {
        self.preflight()?;

        let catalogue = self.load_catalogue()?;
        let output = self.pipeline().run_single(&catalogue, spell)?;
        self.tex.write_spells(&output.fragment)?;

        let compiled = self.typesetter.typeset(&self.tex)?;
        let cards = compiled
            .into_iter()
            .find(|pdf| pdf.file_stem().is_some_and(|stem| stem == "cards"))
            .ok_or_else(|| SpelldeckError::OutputMissing(self.tex.pdf_for("cards.tex")))?;

        let staging = tempfile::tempdir()?;
        let staged = self.tex.collect_pdfs(&[cards], staging.path())?;
        let pdf = request.output.with_extension("pdf");
        if let Some(parent) = pdf.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        for staged_pdf in &staged {
            fs::copy(staged_pdf, &pdf)?;
        }

        let rasterized = rasterizer.rasterize(&pdf, &request.output, request.dpi, request.format);
        let kept = if request.keep_pdf {
            Some(pdf)
        } else {
            if let Err(e) = fs::remove_file(&pdf) {
                warn!(pdf = %pdf.display(), error = %e, "could not remove intermediate pdf");
            }
            None
        };
        let image = rasterized?;
        info!(spell, image = %image.display(), "exported spell image");

        Ok(ExportOutcome { image, pdf: kept })
    }
}
