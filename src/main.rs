//! privmod - private node module finder.
//!
//! CLI entry point.

use clap::Parser;
use futures::stream::{self, StreamExt};
use privmod::capture::load_har;
use privmod::notify::{ConsoleOutput, FanOut, FindingCollector};
use privmod::{
    extract_module_names, CheckConfig, Commands, Config, ExtractConfig, Finding, ReplayConfig,
    ReplaySummary, Scanner,
};
use serde::Serialize;
use std::fs;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Serialize)]
struct ReplayReport<'a> {
    summary: &'a ReplaySummary,
    findings: &'a [Finding],
}

#[derive(Serialize)]
struct ExtractedFile {
    file: String,
    modules: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    // Set up logging
    let filter = if config.verbose {
        EnvFilter::new("privmod=debug,info")
    } else {
        EnvFilter::new("privmod=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match config.command.clone() {
        Commands::Replay(replay_config) => run_replay(replay_config, config.verbose).await,
        Commands::Extract(extract_config) => run_extract(extract_config),
        Commands::Check(check_config) => run_check(check_config, config.verbose).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => code,
    }
}

async fn run_replay(replay_config: ReplayConfig, verbose: bool) -> Result<(), ExitCode> {
    let console = Arc::new(ConsoleOutput::new(verbose, replay_config.json, replay_config.quiet));
    let collector = Arc::new(FindingCollector::new());
    let sink = Arc::new(FanOut::new().with(console.clone()).with(collector.clone()));

    let scanner = match Scanner::with_npm(
        &replay_config.registry.registry_config(),
        sink,
        console.clone(),
    ) {
        Ok(s) => s.with_lookup_concurrency(replay_config.registry.lookup_concurrency),
        Err(e) => {
            error!("Failed to create scanner: {}", e);
            return Err(ExitCode::FAILURE);
        }
    };

    if !replay_config.json && !replay_config.quiet {
        print_banner();
    }

    let start_time = Instant::now();
    let mut captures = Vec::new();
    let mut errors = Vec::new();

    for path in &replay_config.captures {
        let name = path.display().to_string();
        let capture = match load_har(path) {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to load capture {}: {}", name, e);
                return Err(ExitCode::FAILURE);
            }
        };

        console.print_progress(&format!(
            "Loaded {} transactions from {} ({} entries skipped)",
            capture.transactions.len(),
            name,
            capture.skipped.len()
        ));
        errors.extend(capture.skipped.iter().map(|s| format!("{}: {}", name, s)));
        console.print_replay_start(&name, capture.transactions.len());

        let pb = console.create_progress_bar(capture.transactions.len() as u64, "Analysing");
        scanner
            .observe_all(capture.transactions, replay_config.parallel, pb.as_ref())
            .await;
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }

        captures.push(name);
    }

    let summary = ReplaySummary {
        captures,
        stats: scanner.stats(),
        duration_secs: start_time.elapsed().as_secs_f64(),
        errors,
    };
    console.print_summary(&summary);

    let findings = collector.findings();
    let report = ReplayReport {
        summary: &summary,
        findings: &findings,
    };

    if replay_config.json || replay_config.output.is_some() {
        let json = match serde_json::to_string_pretty(&report) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize results: {}", e);
                return Err(ExitCode::FAILURE);
            }
        };

        if let Some(ref output_path) = replay_config.output {
            if let Err(e) = fs::write(output_path, &json) {
                error!("Failed to write output file: {}", e);
                return Err(ExitCode::FAILURE);
            }
            info!("Results written to: {:?}", output_path);
        } else {
            println!("{}", json);
        }
    }

    Ok(())
}

fn run_extract(extract_config: ExtractConfig) -> Result<(), ExitCode> {
    let console = ConsoleOutput::default();
    let mut extracted = Vec::new();

    for path in &extract_config.files {
        let bytes = match fs::read(path) {
            Ok(b) => b,
            Err(e) => {
                error!("Failed to read {}: {}", path.display(), e);
                return Err(ExitCode::FAILURE);
            }
        };

        let text = match std::str::from_utf8(&bytes) {
            Ok(text) => text,
            Err(_) => {
                warn!("{} is not valid UTF-8, treating it as empty", path.display());
                ""
            }
        };

        let file = ExtractedFile {
            file: path.display().to_string(),
            modules: extract_module_names(text),
        };

        if !extract_config.json {
            console.print_extracted(&file.file, &file.modules);
        }
        extracted.push(file);
    }

    if extract_config.json {
        match serde_json::to_string_pretty(&extracted) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("Failed to serialize results: {}", e);
                return Err(ExitCode::FAILURE);
            }
        }
    }

    Ok(())
}

async fn run_check(check_config: CheckConfig, verbose: bool) -> Result<(), ExitCode> {
    let names = match check_config.load_names() {
        Ok(n) => n,
        Err(e) => {
            error!("Failed to load package names: {}", e);
            return Err(ExitCode::FAILURE);
        }
    };

    let console = Arc::new(ConsoleOutput::new(verbose, false, false));
    let scanner = match Scanner::with_npm(
        &check_config.registry.registry_config(),
        Arc::new(FindingCollector::new()),
        console.clone(),
    ) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to create registry client: {}", e);
            return Err(ExitCode::FAILURE);
        }
    };

    console.print_info(&format!(
        "Checking {} package names against {}",
        names.len(),
        check_config.registry.registry
    ));

    let lookup_concurrency = check_config.registry.lookup_concurrency.max(1);
    let scanner = &scanner;
    let verdicts: Vec<(String, bool)> = stream::iter(names)
        .map(|name| async move {
            let public = scanner.is_public(&name).await;
            (name, public)
        })
        .buffered(lookup_concurrency)
        .collect()
        .await;

    for (name, public) in &verdicts {
        console.print_verdict(name, *public);
    }

    Ok(())
}

fn print_banner() {
    println!();
    println!("\x1b[36m╔══════════════════════════════════════════════════════════════╗\x1b[0m");
    println!("\x1b[36m║                    PRIVMOD v0.1.0                            ║\x1b[0m");
    println!("\x1b[36m║           Private Node Module Finder                         ║\x1b[0m");
    println!("\x1b[36m╚══════════════════════════════════════════════════════════════╝\x1b[0m");
    println!();
}
