// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bindewerk — bind a batch of mixed uploads into one PDF.
//
// Entry point. Initialises logging, parses the command line, and runs either
// a conversion batch or a capability report.

mod report;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use bindewerk_core::error::Result;
use bindewerk_core::{ConvertConfig, PaperSize};
use bindewerk_document::{BatchWorkspace, Capabilities, ConversionPipeline, SourceFile};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "bindewerk", version, about)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert files into a single PDF, in the order given.
    Convert(ConvertArgs),
    /// Report which optional tools (ffmpeg, ffprobe, DOCX support) are available.
    Capabilities(CapabilitiesArgs),
}

#[derive(Parser, Debug)]
struct ConvertArgs {
    /// JSON config file; flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory the finished PDF is written to.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Paper size (a4, a3, a5, letter, legal, tabloid).
    #[arg(long)]
    paper: Option<PaperSize>,

    /// Upper bound in seconds on each external tool run.
    #[arg(long)]
    timeout: Option<u64>,

    /// Maximum number of files extracted concurrently.
    #[arg(long)]
    jobs: Option<usize>,

    /// Parent directory for the batch scratch directory.
    #[arg(long)]
    scratch_dir: Option<PathBuf>,

    /// Print the full result as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Files to convert.
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

impl ConvertArgs {
    /// Fold command-line overrides into `config`.
    fn apply(&self, config: &mut ConvertConfig) {
        if let Some(paper) = self.paper {
            config.paper_size = paper;
        }
        if let Some(timeout) = self.timeout {
            config.process_timeout_secs = timeout;
        }
        if let Some(jobs) = self.jobs {
            config.max_parallel_extractions = jobs;
        }
        if let Some(dir) = &self.scratch_dir {
            config.scratch_root = Some(dir.clone());
        }
    }
}

#[derive(Parser, Debug)]
struct CapabilitiesArgs {
    /// JSON config file naming the tool paths.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print as JSON.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr so `--json` output stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let outcome = match cli.cmd {
        Command::Convert(args) => cmd_convert(args).await,
        Command::Capabilities(args) => cmd_capabilities(args).await,
    };

    match outcome {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = %err, "bindewerk failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<ConvertConfig> {
    match path {
        Some(path) => ConvertConfig::load(path),
        None => Ok(ConvertConfig::default()),
    }
}

async fn cmd_convert(args: ConvertArgs) -> Result<ExitCode> {
    let mut config = load_config(args.config.as_deref())?;
    args.apply(&mut config);

    let pipeline = ConversionPipeline::new(config).await?;
    let workspace = BatchWorkspace::for_config(pipeline.config(), &args.out_dir)?;
    let sources: Vec<SourceFile> = args.files.into_iter().map(SourceFile::from_path).collect();

    tracing::info!(files = sources.len(), "Starting conversion");
    let result = pipeline.run(sources, workspace).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        report::print_result(&result);
    }

    Ok(if result.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn cmd_capabilities(args: CapabilitiesArgs) -> Result<ExitCode> {
    let config = load_config(args.config.as_deref())?;
    config.validate()?;
    let capabilities = Capabilities::probe(&config).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&capabilities)?);
    } else {
        report::print_capabilities(&config, &capabilities);
    }
    Ok(ExitCode::SUCCESS)
}
