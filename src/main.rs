use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{LevelFilter, debug};
use serde::Serialize;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use framescan::{
    Frame, InversionStrategy, Point, RqrrDecoder, ScanOptions, ScanOutcome, scan_frame,
};

/// Decode QR codes from image files.
///
/// Each file runs through the same fallback chain the scan worker uses:
/// raw, contrast-enhanced, denoised, then a centered crop for large frames.
#[derive(Debug, Parser)]
#[command(name = "framescan", version, about)]
struct Cli {
    /// Image files to scan (png or jpeg)
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Emit one JSON object per file instead of text lines
    #[arg(long)]
    json: bool,

    /// Pin one inversion strategy for every attempt. Unset, scanning
    /// starts at dont-invert and escalates retries to attempt-both.
    #[arg(long, value_enum)]
    inversion: Option<InversionArg>,

    /// Log debug detail to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum InversionArg {
    DontInvert,
    OnlyInvert,
    AttemptBoth,
    InvertFirst,
}

impl From<InversionArg> for InversionStrategy {
    fn from(arg: InversionArg) -> Self {
        match arg {
            InversionArg::DontInvert => Self::DontInvert,
            InversionArg::OnlyInvert => Self::OnlyInvert,
            InversionArg::AttemptBoth => Self::AttemptBoth,
            InversionArg::InvertFirst => Self::InvertFirst,
        }
    }
}

/// One line of scan output, shared by the text and JSON renderings.
#[derive(Debug, Serialize)]
struct FileReport {
    file: String,
    found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    corners: Option<[Point; 4]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    elapsed_ms: Option<f64>,
}

impl FileReport {
    fn from_outcome(path: &Path, outcome: ScanOutcome) -> Self {
        let elapsed_ms = Some(outcome.elapsed.as_secs_f64() * 1000.0);
        match outcome.decoded {
            Some(decoded) => Self {
                file: path.display().to_string(),
                found: true,
                text: Some(decoded.text),
                corners: Some([
                    decoded.location.top_left,
                    decoded.location.top_right,
                    decoded.location.bottom_left,
                    decoded.location.bottom_right,
                ]),
                error: None,
                elapsed_ms,
            },
            None => Self {
                file: path.display().to_string(),
                found: false,
                text: None,
                corners: None,
                error: None,
                elapsed_ms,
            },
        }
    }

    fn from_error(path: &Path, err: &anyhow::Error) -> Self {
        Self {
            file: path.display().to_string(),
            found: false,
            text: None,
            corners: None,
            error: Some(format!("{err:#}")),
            elapsed_ms: None,
        }
    }

    /// Results go to stdout, diagnostics to stderr.
    fn print(&self) {
        let elapsed = self.elapsed_ms.unwrap_or(0.0);
        if let Some(error) = &self.error {
            eprintln!("{}: error: {error}", self.file);
        } else if let Some(text) = &self.text {
            println!("{}: {text} ({elapsed:.1}ms)", self.file);
        } else {
            println!("{}: no code found ({elapsed:.1}ms)", self.file);
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let decoder = RqrrDecoder;
    let options = ScanOptions {
        inversion: cli.inversion.map(Into::into),
        ..ScanOptions::default()
    };

    let mut missed = false;
    let mut failed = false;

    for path in &cli.images {
        let report = match scan_file(&decoder, path, &options) {
            Ok(outcome) => {
                missed |= outcome.decoded.is_none();
                FileReport::from_outcome(path, outcome)
            }
            Err(err) => {
                failed = true;
                FileReport::from_error(path, &err)
            }
        };

        if cli.json {
            println!("{}", serde_json::to_string(&report)?);
        } else {
            report.print();
        }
    }

    Ok(if failed {
        ExitCode::from(2)
    } else if missed {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}

fn scan_file(decoder: &RqrrDecoder, path: &Path, options: &ScanOptions) -> Result<ScanOutcome> {
    let image = image::open(path)
        .with_context(|| format!("failed to read {}", path.display()))?
        .to_rgba8();
    let (width, height) = image.dimensions();
    let frame = Frame::new(width, height, image.into_raw())
        .context("image buffer does not match its dimensions")?;

    debug!("scanning {} ({width}x{height})", path.display());
    Ok(scan_frame(decoder, &frame, options)?)
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    // a failed logger init only costs diagnostics, never the scan
    let _ = TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );
}
