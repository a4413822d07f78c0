// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spelldeck Export — everything that leaves the process: the tex working
// directory, LaTeX compilation through latexmk, and PDF-to-image conversion
// through ImageMagick or pdftoppm. Each external step sits behind a trait so
// callers can swap in their own implementation.

pub mod rasterize;
pub mod texdir;
pub mod tools;
pub mod typeset;

pub use rasterize::{ExternalRasterizer, RasterTool, Rasterizer, sanitize_filename};
pub use texdir::TexDir;
pub use typeset::{LatexmkTypesetter, Typesetter};
