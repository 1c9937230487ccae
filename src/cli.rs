// ============================================================================
// Lumina CLI: headless batch editing via command-line arguments
// ============================================================================
//
// Usage examples:
//   lumina -i portrait.jpg --remove-background -o cutout.png
//   lumina -i shots/*.jpg --remove-background --background "#ffffff" --output-dir out/ --format jpeg
//   lumina -i product.png --scene "marble countertop, soft daylight" -o staged.png
//   lumina -i cutout.png --erase 10,10,80,10,24 -o cleaned.png
//
// No window is opened. Each file runs through the same editor session the
// GUI uses, synchronously on the current thread.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use eframe::egui;

use crate::components::colors::BackgroundColor;
use crate::components::tools::{BRUSH_SIZE_RANGE, EditorTool};
use crate::editor::{AiRequest, EditorError, EditorSession};
use crate::io::{self, ExportFormat, ImageIoError};
use crate::ops::ai::{self, ImageAiService, LocalImageService};
use crate::settings::AppSettings;

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// Lumina headless photo editor.
///
/// Remove backgrounds, erase regions, add a backdrop and export, no GUI required.
#[derive(Parser, Debug)]
#[command(
    name = "lumina",
    about = "Lumina headless background editor",
    long_about = "Run the Lumina editing pipeline on image files without opening the GUI.\n\
                  Steps run in a fixed order: background removal, erase strokes,\n\
                  AI scene, background colour, export.\n\n\
                  Example:\n  \
                  lumina -i portrait.jpg --remove-background -o cutout.png\n  \
                  lumina -i *.jpg --remove-background --background '#fff' --output-dir out/"
)]
pub struct CliArgs {
    /// Input file(s). Glob patterns accepted (e.g. "*.png", "shots/*.jpg").
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// Output file path. Only valid for single-file input.
    /// For batch input use --output-dir instead.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Remove the background of the original image.
    #[arg(long)]
    pub remove_background: bool,

    /// Describe a scene to place the subject into.
    #[arg(long, value_name = "PROMPT")]
    pub scene: Option<String>,

    /// Solid background: transparent, #rgb or #rrggbb.
    #[arg(long, value_name = "COLOR", value_parser = parse_background)]
    pub background: Option<BackgroundColor>,

    /// Output format: png or jpeg. Inferred from --output when omitted, else png.
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// Erase a line in surface pixels: X1,Y1,X2,Y2[,SIZE]. Repeatable.
    #[arg(long, value_name = "X1,Y1,X2,Y2[,SIZE]", value_parser = parse_erase)]
    pub erase: Vec<EraseStroke>,

    /// Use the offline colour-key backend instead of the configured AI provider.
    #[arg(long)]
    pub local: bool,

    /// Print per-file timing and debug logging.
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    /// Returns `true` when any CLI-mode flag is present in the real process arguments.
    /// Used by `main()` to route before creating an eframe window.
    pub fn is_cli_mode() -> bool {
        std::env::args().any(|a| a == "--input" || a == "-i")
    }
}

/// One straight eraser stroke in surface coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EraseStroke {
    pub from: egui::Pos2,
    pub to: egui::Pos2,
    pub size: Option<u32>,
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("load failed: {0}")]
    Load(ImageIoError),
    #[error(transparent)]
    Editor(#[from] EditorError),
    #[error("write failed: {0}")]
    Write(#[from] std::io::Error),
    #[error("no image to export")]
    NothingToExport,
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run all CLI processing and return an OS exit code.
/// `0` = all files succeeded, `1` = one or more files failed.
pub fn run(args: CliArgs) -> ExitCode {
    let service: Arc<dyn ImageAiService> = if args.local {
        Arc::new(LocalImageService::default())
    } else {
        match ai::service_from_settings(&AppSettings::load()) {
            Ok(service) => service,
            Err(e) => {
                eprintln!("error: {}", e);
                return ExitCode::FAILURE;
            }
        }
    };
    run_with(&args, service.as_ref())
}

/// [`run`] with an explicit AI backend.
pub fn run_with(args: &CliArgs, service: &dyn ImageAiService) -> ExitCode {
    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        eprintln!("error: no input files matched the given pattern(s).");
        return ExitCode::FAILURE;
    }

    if inputs.len() > 1 && args.output.is_some() && args.output_dir.is_none() {
        eprintln!(
            "error: {} input files given but --output only accepts a single file path.\n\
             Use --output-dir to specify a destination directory for batch processing.",
            inputs.len()
        );
        return ExitCode::FAILURE;
    }

    let format = match parse_format(args.format.as_deref(), args.output.as_deref()) {
        Some(f) => f,
        None => {
            eprintln!(
                "error: unsupported format '{}' (expected png or jpeg).",
                args.format.as_deref().unwrap_or_default()
            );
            return ExitCode::FAILURE;
        }
    };

    if let Some(dir) = &args.output_dir
        && let Err(e) = std::fs::create_dir_all(dir)
    {
        eprintln!("error: could not create output directory '{}': {}", dir.display(), e);
        return ExitCode::FAILURE;
    }

    log::info!("cli: {} file(s) with {} backend", inputs.len(), service.name());

    let total = inputs.len();
    let multi = total > 1;
    let mut any_failure = false;

    for (idx, input_path) in inputs.iter().enumerate() {
        if multi || args.verbose {
            println!("[{}/{}] {}", idx + 1, total, input_path.display());
        }
        let file_start = Instant::now();

        let Some(output_path) = build_output_path(
            input_path,
            args.output.as_deref(),
            args.output_dir.as_deref(),
            format,
        ) else {
            eprintln!("  error: cannot determine output path for '{}'.", input_path.display());
            any_failure = true;
            continue;
        };

        match run_one(input_path, &output_path, args, format, service) {
            Ok(()) => {
                if args.verbose || multi {
                    println!(
                        "  → {} ({:.0}ms)",
                        output_path.display(),
                        file_start.elapsed().as_secs_f64() * 1000.0
                    );
                }
            }
            Err(e) => {
                log::warn!("cli: {} failed: {}", input_path.display(), e);
                eprintln!("  error: {}", e);
                any_failure = true;
            }
        }
    }

    if any_failure { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

// ============================================================================
// Per-file processing pipeline
// ============================================================================

fn run_one(
    input: &Path,
    output: &Path,
    args: &CliArgs,
    format: ExportFormat,
    service: &dyn ImageAiService,
) -> Result<(), CliError> {
    // -- Step 1: Load ----------------------------------------------------
    let source = io::read_file_as_data_url(input).map_err(CliError::Load)?;
    let mut session = EditorSession::default();
    session.load_source(&source)?;

    // -- Step 2: Background removal -------------------------------------
    if args.remove_background {
        let request = session.begin_auto_remove();
        run_job(&mut session, request, service)?;
    }

    // -- Step 3: Erase strokes -------------------------------------------
    if !args.erase.is_empty() {
        session.select_tool(EditorTool::ManualErase);
        for stroke in &args.erase {
            apply_erase(&mut session, stroke);
        }
    }

    // -- Step 4: AI scene ------------------------------------------------
    if let Some(prompt) = &args.scene {
        let request = session.begin_scene(prompt)?;
        run_job(&mut session, request, service)?;
    }

    // -- Step 5: Background + export ------------------------------------
    if let Some(bg) = args.background {
        session.set_background(bg);
    }
    let exported = session.export(format)?.ok_or(CliError::NothingToExport)?;
    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output, &exported.bytes)?;
    Ok(())
}

fn run_job(session: &mut EditorSession, request: Option<AiRequest>, service: &dyn ImageAiService) -> Result<(), CliError> {
    let Some(request) = request else {
        log::debug!("cli: nothing to send");
        return Ok(());
    };
    let completion = request.run(service);
    session.finish_ai(completion)?;
    Ok(())
}

/// Replay a stroke with the surface drawn at its native size.
fn apply_erase(session: &mut EditorSession, stroke: &EraseStroke) {
    if let Some(size) = stroke.size {
        session.brush.set_size(size);
    }
    let [w, h] = session.surface().size();
    let native = egui::Rect::from_min_size(egui::Pos2::ZERO, egui::vec2(w as f32, h as f32));
    session.begin_stroke(stroke.from, native);
    session.continue_stroke(stroke.to, native);
    session.end_stroke();
}

// ============================================================================
// Helpers
// ============================================================================

/// Expand glob patterns and literal paths into a deduplicated, ordered list.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let as_path = Path::new(pattern);

        if as_path.exists() {
            if !result.iter().any(|p| p.as_path() == as_path) {
                result.push(as_path.to_path_buf());
            }
            continue;
        }

        match glob::glob(pattern) {
            Ok(entries) => {
                let mut matched = false;
                for entry in entries.flatten() {
                    if !result.contains(&entry) {
                        result.push(entry);
                    }
                    matched = true;
                }
                if !matched {
                    eprintln!("warning: pattern '{}' matched no files.", pattern);
                }
            }
            Err(e) => {
                eprintln!("warning: invalid glob '{}': {}", pattern, e);
            }
        }
    }

    result
}

/// Choose the export format from `--format` or the output file extension.
/// PNG when neither says otherwise; `None` for an unknown `--format`.
fn parse_format(format_arg: Option<&str>, output: Option<&Path>) -> Option<ExportFormat> {
    if let Some(f) = format_arg {
        return ExportFormat::parse(f);
    }
    Some(output.and_then(ExportFormat::from_path).unwrap_or_default())
}

/// Compute the output path for a single input file.
///
/// Priority:
/// 1. `--output` (explicit path, used for single-file input)
/// 2. `--output-dir` (batch directory, derives filename from input stem)
/// 3. Fallback: same directory as input, `<stem>_lumina.<ext>`
fn build_output_path(
    input: &Path,
    output: Option<&Path>,
    output_dir: Option<&Path>,
    format: ExportFormat,
) -> Option<PathBuf> {
    if let Some(out) = output {
        return Some(out.to_path_buf());
    }

    let ext = format.extension();
    let stem = input.file_stem()?.to_string_lossy().into_owned();

    if let Some(dir) = output_dir {
        return Some(dir.join(format!("{}.{}", stem, ext)));
    }

    let parent = input.parent().unwrap_or(Path::new("."));
    Some(parent.join(format!("{}_lumina.{}", stem, ext)))
}

fn parse_background(raw: &str) -> Result<BackgroundColor, String> {
    BackgroundColor::parse(raw).ok_or_else(|| format!("'{}' is not a colour (use transparent, #rgb or #rrggbb)", raw))
}

fn parse_erase(raw: &str) -> Result<EraseStroke, String> {
    let values: Vec<f32> = raw
        .split(',')
        .map(|v| v.trim().parse::<f32>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("'{}': {}", raw, e))?;
    let (coords, size) = match values.as_slice() {
        [x1, y1, x2, y2] => ([*x1, *y1, *x2, *y2], None),
        [x1, y1, x2, y2, size] => ([*x1, *y1, *x2, *y2], Some(*size)),
        _ => return Err(format!("'{}': expected X1,Y1,X2,Y2[,SIZE]", raw)),
    };
    let size = match size {
        Some(s) if s.fract() != 0.0 || !BRUSH_SIZE_RANGE.contains(&(s as u32)) => {
            return Err(format!(
                "'{}': size must be a whole number in {}..={}",
                raw,
                BRUSH_SIZE_RANGE.start(),
                BRUSH_SIZE_RANGE.end()
            ));
        }
        s => s.map(|s| s as u32),
    };
    Ok(EraseStroke {
        from: egui::pos2(coords[0], coords[1]),
        to: egui::pos2(coords[2], coords[3]),
        size,
    })
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
