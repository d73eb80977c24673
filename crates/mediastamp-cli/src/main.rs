use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use mediastamp_core::{CancellationToken, ProcessControl, ProcessOptions, ToolOptions, Toolbox};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mediastamp", version, about = "Rename photos/videos to 'YYYY-MM-DD HH-MM-SS.ext' using metadata")]
struct Cli {
    /// Target folder
    #[arg(short, long)]
    folder: PathBuf,

    /// Process subfolders
    #[arg(short, long)]
    recursive: bool,

    /// Only print what would be done
    #[arg(long)]
    dry_run: bool,

    /// Don't use file mtime as fallback
    #[arg(long)]
    no_fallback_mtime: bool,

    /// Print result per file immediately
    #[arg(long)]
    progress: bool,

    /// Directory searched for exiftool/ffprobe before PATH (default: bin/ next to this executable)
    #[arg(long)]
    tool_dir: Option<PathBuf>,

    /// Only use tools from the tool directory, never from PATH
    #[arg(long)]
    no_system_tools: bool,

    /// Seconds to wait for a single exiftool/ffprobe call before killing it
    #[arg(long, default_value_t = 60)]
    tool_timeout: u64,
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let options = ProcessOptions {
        folder: cli.folder,
        recursive: cli.recursive,
        dry_run: cli.dry_run,
        fallback_mtime: !cli.no_fallback_mtime,
        tools: ToolOptions {
            dir: cli.tool_dir,
            search_path: !cli.no_system_tools,
            timeout_secs: cli.tool_timeout,
        },
    };

    let token = CancellationToken::new();
    let handler_token = token.clone();
    ctrlc::set_handler(move || handler_token.cancel())?;

    let toolbox = Toolbox::discover(&options.tools);
    println!("Settings:");
    println!(" folder: {}", options.folder.display());
    println!(" recursive: {}", options.recursive);
    println!(" dry-run: {}", options.dry_run);
    println!(" exiftool available: {}", toolbox.exiftool.is_some());
    println!(" ffprobe available: {}", toolbox.ffprobe.is_some());
    println!(" fallback to mtime: {}", options.fallback_mtime);
    println!();

    let bar = if cli.progress {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(0);
        bar.set_style(ProgressStyle::default_bar().template("[{bar:40}] {pos}/{len} renaming files")?);
        bar
    };

    let control = ProcessControl::new().with_cancel_token(token);
    let progress = cli.progress;
    let result = mediastamp_core::process_with_control(&options, &control, &|outcome, current, total| {
        if progress {
            let status = if outcome.success { "OK" } else { "ERR" };
            println!("{}: {} -> {}", status, outcome.path.display(), outcome.message);
        }
        bar.set_length(total);
        bar.set_position(current + 1);
    })?;
    bar.finish_and_clear();

    for outcome in &result.outcomes {
        let status = if outcome.success { "OK" } else { "ERR" };
        let name = outcome
            .path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        println!("{}: {} -> {}", status, name, outcome.message);
    }

    println!();
    println!(
        "Processed {} files: {} OK, {} errors/warnings.",
        result.outcomes.len(),
        result.ok,
        result.errors
    );

    if result.cancelled {
        eprintln!("\n[!] Stopped by user (Ctrl+C). Some files may already have been processed.");
        return Ok(ExitCode::from(130));
    }
    Ok(ExitCode::SUCCESS)
}
