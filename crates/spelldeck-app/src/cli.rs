// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line surface — argument parsing, dispatch and exit codes.

use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::{debug, info};

use spelldeck_core::config::{AppConfig, ImageFormat, SchemaErrorPolicy};
use spelldeck_core::error::{Result, SpelldeckError};
use spelldeck_core::human_errors::humanize_error;
use spelldeck_core::types::{FilterCriteria, SortMode};
use spelldeck_export::rasterize::{ExternalRasterizer, RasterTool, default_output_path};
use spelldeck_render::filter::parse_levels;

use crate::services::app_services::{AppServices, BuildPlan, ExportRequest};

/// Config file read when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "spelldeck.json";

pub const USAGE: &str = "\
usage: spelldeck generate [options]
       spelldeck export-image <SPELL NAME> [options]

generate options:
  -c, --class CLASS         keep spells of this class (repeatable, any matches)
  -l, --level LEVEL         keep this level or range such as 1-3 (repeatable)
  -s, --school SCHOOL       keep spells of this school
  -n, --name TEXT           keep spells whose name contains TEXT
      --sort name|level     card order (default: name)
      --max-length N        truncate card text beyond N characters (default: 600)
      --strict              stop at the first invalid catalogue entry
  -o, --output DIR          where compiled PDFs are copied (default: pdf)
      --no-compile          only write tex/spells.tex
      --clean               remove LaTeX intermediates after compiling
      --latex-compiler CMD  engine passed to latexmk (default: xelatex)
      --stdout              print the card markup instead of writing files

export-image options:
  -o, --output FILE         image path (default: samples/<spell>.<format>)
  -d, --dpi DPI             resolution (default: 600)
  -f, --format FORMAT       png, jpg, jpeg or svg (default: png)
      --keep-pdf            keep the intermediate PDF next to the image

common options:
      --config FILE         settings file (default: spelldeck.json)
  -v, --verbose             debug logging
  -h, --help                show this help";

/// Parsed `generate` invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateArgs {
    pub classes: Vec<String>,
    pub levels: Vec<String>,
    pub school: Option<String>,
    pub name: Option<String>,
    pub sort: Option<SortMode>,
    pub max_length: Option<usize>,
    pub strict: bool,
    pub output_dir: Option<PathBuf>,
    pub no_compile: bool,
    pub clean: bool,
    pub latex_compiler: Option<String>,
    pub stdout: bool,
    pub config: Option<PathBuf>,
    pub verbose: bool,
}

/// Parsed `export-image` invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportArgs {
    pub spell: String,
    pub output: Option<PathBuf>,
    pub dpi: Option<u32>,
    pub format: Option<ImageFormat>,
    pub keep_pdf: bool,
    pub config: Option<PathBuf>,
    pub verbose: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Generate(GenerateArgs),
    ExportImage(ExportArgs),
    Help,
}

/// Parse the full argument vector, program name included.
pub fn parse_args(args: &[String]) -> Result<Command> {
    let rest = args.get(2..).unwrap_or_default();
    match args.get(1).map(String::as_str) {
        Some("generate") => parse_generate(rest),
        Some("export-image") => parse_export(rest),
        Some("help" | "-h" | "--help") | None => Ok(Command::Help),
        Some(other) => Err(SpelldeckError::Usage(format!("unknown command '{other}'"))),
    }
}

/// Whether debug logging was requested, looked up before full parsing so
/// the subscriber is ready when parsing logs.
pub fn wants_verbose(args: &[String]) -> bool {
    args.iter().any(|arg| arg == "-v" || arg == "--verbose")
}

fn parse_generate(args: &[String]) -> Result<Command> {
    let mut parsed = GenerateArgs::default();
    let mut tokens = Tokens::new(args);

    while let Some((flag, inline)) = tokens.next_flag() {
        match flag {
            "-c" | "--class" => parsed.classes.push(tokens.value(flag, inline)?),
            "-l" | "--level" => parsed.levels.push(tokens.value(flag, inline)?),
            "-s" | "--school" => set_once(&mut parsed.school, flag, tokens.value(flag, inline)?)?,
            "-n" | "--name" => set_once(&mut parsed.name, flag, tokens.value(flag, inline)?)?,
            "--sort" => parsed.sort = Some(parse_value(flag, &tokens.value(flag, inline)?)?),
            "--max-length" => {
                parsed.max_length = Some(parse_value(flag, &tokens.value(flag, inline)?)?)
            }
            "--strict" => parsed.strict = switch(flag, inline)?,
            "-o" | "--output" => parsed.output_dir = Some(tokens.value(flag, inline)?.into()),
            "--no-compile" => parsed.no_compile = switch(flag, inline)?,
            "--clean" => parsed.clean = switch(flag, inline)?,
            "--latex-compiler" => parsed.latex_compiler = Some(tokens.value(flag, inline)?),
            "--stdout" => parsed.stdout = switch(flag, inline)?,
            "--config" => parsed.config = Some(tokens.value(flag, inline)?.into()),
            "-v" | "--verbose" => parsed.verbose = switch(flag, inline)?,
            "-h" | "--help" => return Ok(Command::Help),
            other => return Err(unexpected(other)),
        }
    }
    Ok(Command::Generate(parsed))
}

fn parse_export(args: &[String]) -> Result<Command> {
    let mut parsed = ExportArgs::default();
    let mut spell: Option<String> = None;
    let mut tokens = Tokens::new(args);

    while let Some((flag, inline)) = tokens.next_flag() {
        match flag {
            "-o" | "--output" => parsed.output = Some(tokens.value(flag, inline)?.into()),
            "-d" | "--dpi" => parsed.dpi = Some(parse_value(flag, &tokens.value(flag, inline)?)?),
            "-f" | "--format" => {
                parsed.format = Some(parse_value(flag, &tokens.value(flag, inline)?)?)
            }
            "--keep-pdf" => parsed.keep_pdf = switch(flag, inline)?,
            "--config" => parsed.config = Some(tokens.value(flag, inline)?.into()),
            "-v" | "--verbose" => parsed.verbose = switch(flag, inline)?,
            "-h" | "--help" => return Ok(Command::Help),
            positional if !positional.starts_with('-') || positional == "-" => {
                if let Some(first) = &spell {
                    return Err(SpelldeckError::Usage(format!(
                        "export-image takes one spell name, got '{first}' and '{positional}' \
                         (quote names with spaces)"
                    )));
                }
                spell = Some(positional.to_string());
            }
            other => return Err(unexpected(other)),
        }
    }

    parsed.spell = spell
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| SpelldeckError::Usage("export-image needs a spell name".into()))?;
    if parsed.dpi == Some(0) {
        return Err(SpelldeckError::Usage("--dpi must be greater than 0".into()));
    }
    Ok(Command::ExportImage(parsed))
}

/// Walks the argument list, splitting `--flag=value` into its two halves.
struct Tokens<'a> {
    iter: std::slice::Iter<'a, String>,
}

impl<'a> Tokens<'a> {
    fn new(args: &'a [String]) -> Self {
        Self { iter: args.iter() }
    }

    fn next_flag(&mut self) -> Option<(&'a str, Option<&'a str>)> {
        let token = self.iter.next()?.as_str();
        match token.split_once('=') {
            Some((flag, value)) if token.starts_with("--") => Some((flag, Some(value))),
            _ => Some((token, None)),
        }
    }

    fn value(&mut self, flag: &str, inline: Option<&str>) -> Result<String> {
        if let Some(value) = inline {
            return Ok(value.to_string());
        }
        self.iter
            .next()
            .cloned()
            .ok_or_else(|| SpelldeckError::Usage(format!("{flag} needs a value")))
    }
}

/// Schools and name filters select one value each; a second one is a mistake
/// rather than an override.
fn set_once(slot: &mut Option<String>, flag: &str, value: String) -> Result<()> {
    if let Some(first) = slot {
        return Err(SpelldeckError::Usage(format!(
            "{flag} can only be given once (got '{first}' and '{value}')"
        )));
    }
    *slot = Some(value);
    Ok(())
}

fn switch(flag: &str, inline: Option<&str>) -> Result<bool> {
    match inline {
        None => Ok(true),
        Some(_) => Err(SpelldeckError::Usage(format!("{flag} does not take a value"))),
    }
}

fn parse_value<T>(flag: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim()
        .parse()
        .map_err(|e| SpelldeckError::Usage(format!("invalid value '{raw}' for {flag}: {e}")))
}

fn unexpected(flag: &str) -> SpelldeckError {
    SpelldeckError::Usage(format!("unknown option '{flag}'"))
}

// -- Dispatch ----------------------------------------------------------------

/// Run a full command line and return the process exit code:
/// 0 success, 1 runtime failure, 2 usage error.
pub fn run_with_args(args: &[String]) -> i32 {
    let command = match parse_args(args) {
        Ok(command) => command,
        Err(err) => {
            report(&err);
            eprintln!("\n{USAGE}");
            return 2;
        }
    };
    debug!(?command, "parsed command line");

    let outcome = match command {
        Command::Help => {
            println!("{USAGE}");
            return 0;
        }
        Command::Generate(args) => handle_generate(&args),
        Command::ExportImage(args) => handle_export(&args),
    };

    match outcome {
        Ok(()) => 0,
        Err(err) => {
            report(&err);
            exit_code(&err)
        }
    }
}

/// Usage and filter mistakes are the caller's; everything else is a runtime failure.
pub fn exit_code(err: &SpelldeckError) -> i32 {
    match err {
        SpelldeckError::Usage(_) | SpelldeckError::Filter { .. } => 2,
        _ => 1,
    }
}

fn report(err: &SpelldeckError) {
    let human = humanize_error(err);
    debug!(error = ?err, severity = ?human.severity, "command failed");
    eprintln!("error: {}", human.message);
    if !human.suggestion.is_empty() {
        eprintln!("  {}", human.suggestion);
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<AppConfig> {
    let path = path
        .cloned()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    AppConfig::load(path)
}

/// Apply command-line overrides on top of the loaded settings.
pub fn generate_config(args: &GenerateArgs, mut config: AppConfig) -> AppConfig {
    if let Some(sort) = args.sort {
        config.sort = sort;
    }
    if let Some(max_length) = args.max_length {
        config.max_text_length = max_length;
    }
    if args.strict {
        config.on_schema_error = SchemaErrorPolicy::Abort;
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(compiler) = &args.latex_compiler {
        config.latex_compiler = compiler.clone();
    }
    config
}

/// Selection criteria from the filter flags. Unset flags impose nothing.
pub fn criteria(args: &GenerateArgs) -> Result<FilterCriteria> {
    let non_empty = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };
    Ok(FilterCriteria {
        classes: (!args.classes.is_empty()).then(|| args.classes.iter().cloned().collect()),
        levels: if args.levels.is_empty() {
            None
        } else {
            Some(parse_levels(&args.levels)?)
        },
        school: non_empty(&args.school),
        name_substring: non_empty(&args.name),
    })
}

fn handle_generate(args: &GenerateArgs) -> Result<()> {
    let criteria = criteria(args)?;
    let config = generate_config(args, load_config(args.config.as_ref())?);
    let services = AppServices::with_latexmk(config);

    if args.stdout {
        let output = services.render(&criteria)?;
        print!("{}", output.fragment);
        return Ok(());
    }

    let plan = BuildPlan {
        compile: !args.no_compile,
        clean: args.clean,
    };
    let outcome = services.generate(&criteria, plan)?;
    debug!(report = ?outcome.report, "generate finished");
    if !plan.compile {
        println!("{}", outcome.spells_file.display());
    }
    for pdf in &outcome.pdfs {
        info!(pdf = %pdf.display(), "ready");
    }
    Ok(())
}

fn handle_export(args: &ExportArgs) -> Result<()> {
    let config = load_config(args.config.as_ref())?;
    let format = args.format.unwrap_or(config.image_format);
    let request = ExportRequest {
        output: args
            .output
            .clone()
            .unwrap_or_else(|| default_output_path(&args.spell, format)),
        dpi: args.dpi.unwrap_or(config.image_dpi),
        format,
        keep_pdf: args.keep_pdf,
    };

    let rasterizer = ExternalRasterizer::new(RasterTool::detect(format)?);
    let services = AppServices::with_latexmk(config);
    let outcome = services.export_image(&args.spell, &request, &rasterizer)?;
    println!("{}", outcome.image.display());
    if let Some(pdf) = &outcome.pdf {
        info!(pdf = %pdf.display(), "kept intermediate pdf");
    }
    Ok(())
}
