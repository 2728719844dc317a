use anyhow::Result;
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod client;
mod config;
mod error;
mod models;
mod session;

use crate::client::{ArtifactDownloader, ConversionService, ConverterClient, LinkPrinter, Navigator};
use crate::config::load_config;
use crate::session::{Controller, PreviewView, SessionRunner, StatusLine, ViewState};

#[derive(Parser)]
#[command(name = "playlist-converter")]
#[command(about = "Preview a playlist and download it through a conversion service")]
#[command(version)]
struct Args {
    /// Playlist URL to convert; omit to enter URLs interactively
    url: Option<String>,

    /// Download without asking for confirmation
    #[arg(short = 'y', long = "yes")]
    yes: bool,

    /// Conversion service base URL (overrides CONVERTER_URL)
    #[arg(long = "base-url")]
    base_url: Option<String>,

    /// Directory to save downloaded archives in (overrides DOWNLOAD_DIR)
    #[arg(short = 'o', long = "output-dir")]
    output_dir: Option<PathBuf>,

    /// Print the archive link instead of downloading it
    #[arg(long = "no-download")]
    no_download: bool,

    /// Quiet mode - only log warnings and errors
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    /// Verbose mode - log request details
    #[arg(short = 'v', long = "verbose", conflicts_with = "quiet")]
    verbose: bool,
}

fn init_tracing(args: &Args) {
    let default_level = if args.quiet {
        "warn"
    } else if args.verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("playlist_converter={default_level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args);

    // Load configuration from .env
    let mut config = load_config()?;
    if let Some(base_url) = &args.base_url {
        config.base_url = base_url.trim_end_matches('/').to_string();
    }
    if let Some(dir) = &args.output_dir {
        config.download_dir = dir.clone();
    }

    let client = ConverterClient::new(&config);

    // Test connection first
    println!("Testing connection to {}...", client.base_url());
    match client.ping() {
        Ok(()) => println!("✓ Conversion service is healthy"),
        Err(e) => {
            eprintln!("✗ Conversion service unavailable: {e}");
            return Err(e);
        }
    }

    let controller = Controller::new(config.reset_delay);
    if args.no_download {
        let navigator = LinkPrinter::new(&client);
        run(SessionRunner::new(controller, client, navigator), &args)
    } else {
        let navigator = ArtifactDownloader::new(client.clone(), config.download_dir.clone());
        run(SessionRunner::new(controller, client, navigator), &args)
    }
}

/// Show progress messages while the (blocking) request is out
fn show_progress(view: &ViewState) {
    if let Some(status @ StatusLine::Progress(_)) = &view.status {
        println!("{status}");
    }
}

fn run<S: ConversionService, N: Navigator>(runner: SessionRunner<S, N>, args: &Args) -> Result<()> {
    let mut runner = runner.with_observer(show_progress);
    let stdin = io::stdin();
    let mut input = stdin.lock();

    match &args.url {
        Some(url) => {
            convert_one(&mut runner, url, args.yes, &mut input)?;
            if runner.view().has_error() {
                return Err(anyhow::anyhow!(
                    "{}",
                    runner.view().status_text().unwrap_or_default()
                ));
            }
            Ok(())
        }
        None => {
            loop {
                let Some(url) = prompt(&mut input, "\nPlaylist URL (blank to quit): ")? else {
                    break;
                };
                if url.is_empty() {
                    break;
                }
                if let Err(e) = convert_one(&mut runner, &url, args.yes, &mut input) {
                    eprintln!("✗ {e:#}");
                }
            }
            println!("Bye!");
            Ok(())
        }
    }
}

/// Take one URL through analyze → preview → download.
///
/// Ends in `Err` when a download failed and was not retried, so a one-shot
/// run exits non-zero.
fn convert_one<S: ConversionService, N: Navigator>(
    runner: &mut SessionRunner<S, N>,
    url: &str,
    auto_confirm: bool,
    input: &mut impl BufRead,
) -> Result<()> {
    runner.submit(url)?;
    if let Some(preview) = &runner.view().preview {
        print_preview(preview);
    }
    print_status(runner.view());

    let mut failure = None;
    let mut abandoned = None;
    while let Some(tracks) = runner.controller().current_tracks() {
        let count = tracks.len();
        let retrying = runner.view().has_error();

        let answer = if auto_confirm && !retrying {
            Some("y".to_string())
        } else if auto_confirm {
            // Unattended runs don't retry; report the failure instead
            None
        } else {
            let label = if retrying {
                "Retry download? [y]es / [n]o: ".to_string()
            } else {
                format!("Download these {count} songs? [y]es / [n]o: ")
            };
            prompt(input, &label)?
        };

        match answer.as_deref().map(str::to_lowercase).as_deref() {
            Some("y" | "yes") => {
                if let Err(e) = runner.confirm() {
                    failure = Some(e);
                }
                print_status(runner.view());
            }
            Some("n" | "no" | "") | None => {
                if retrying {
                    abandoned = runner.view().status_text();
                }
                runner.cancel()?;
                println!("Cancelled.");
            }
            Some(other) => println!("Unrecognized answer '{other}'"),
        }
    }

    if runner.has_pending_reset() {
        runner.settle()?;
    }
    if let Some(e) = failure {
        return Err(e);
    }
    match abandoned {
        Some(status) => Err(anyhow::anyhow!("{status}")),
        None => Ok(()),
    }
}

fn print_preview(preview: &PreviewView) {
    println!();
    for line in preview.summary() {
        println!("{line}");
    }
    println!();
    for line in &preview.lines {
        println!("  {line}");
    }
    println!();
}

fn print_status(view: &ViewState) {
    if let Some(status) = &view.status {
        if status.is_error() {
            eprintln!("✗ {status}");
        } else {
            println!("{status}");
        }
    }
    for warning in &view.warnings {
        println!("⚠ {warning}");
    }
}

/// Read one trimmed line; `None` on end of input
fn prompt(input: &mut impl BufRead, label: &str) -> Result<Option<String>> {
    print!("{label}");
    io::stdout().flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}
