//! deadsym CLI - unused import, definition and parameter detector.
//!
//! Features:
//! - TypeScript/JavaScript (incl. Vue, Svelte, Astro), Python, Go, Ruby, PHP
//! - Whole-directory workspace analysis with cross-file usage
//! - Incremental caching keyed by content fingerprint
//! - JSON-lines bridge (`--serve`) for editors and host processes

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use serde_json::{json, Value};
use std::io::{self, BufRead, Write};
use std::path::Path;

use deadsym_core::{
    detect_language, init_plain_logging, init_structured_logging, load_config, print_json,
    print_plain, Deadsym, Engine, SourceFile,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Unused symbol detector for TS/JS, Python, Go, Ruby and PHP")]
pub struct Cli {
    /// Path to the directory to analyze
    #[arg(default_value = ".")]
    path: String,

    /// Output results in JSON format
    #[arg(long)]
    json: bool,

    /// Filename patterns whose findings are suppressed
    #[arg(long, num_args = 1..)]
    ignore: Vec<String>,

    /// Do not read or write the .deadsym cache
    #[arg(long)]
    no_cache: bool,

    /// Do not report unused parameters
    #[arg(long)]
    no_params: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long)]
    log_json: bool,

    /// Print the language tag for a filename and exit
    #[arg(long, value_name = "FILE")]
    detect: Option<String>,

    /// Serve JSON-lines requests on stdin/stdout
    #[arg(long)]
    serve: bool,
}

/// One request line of the `--serve` bridge.
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
enum Request {
    Analyze(SourceFile),
    Workspace { files: Vec<SourceFile> },
    Detect { filename: String },
}

/// Answer a single request line. Malformed lines get an `error` object.
fn handle_line(engine: &Engine, line: &str) -> Value {
    let request: Request = match serde_json::from_str(line) {
        Ok(r) => r,
        Err(e) => return json!({ "error": format!("invalid request: {e}") }),
    };

    let response = match request {
        Request::Analyze(file) => serde_json::to_value(engine.analyze(&file)),
        Request::Workspace { files } => serde_json::to_value(engine.analyze_workspace(&files)),
        Request::Detect { filename } => {
            Ok(json!({ "language": engine.detect_language(&filename).as_str() }))
        }
    };
    response.unwrap_or_else(|e| json!({ "error": format!("serialization failed: {e}") }))
}

/// Read requests until EOF, answering each on its own line.
fn serve(input: impl BufRead, mut output: impl Write) -> Result<()> {
    let engine = Engine::new();
    for line in input.lines() {
        let line = line.context("Failed to read request")?;
        if line.trim().is_empty() {
            continue;
        }
        let response = handle_line(&engine, &line);
        writeln!(output, "{response}").context("Failed to write response")?;
        output.flush().context("Failed to flush response")?;
    }
    let stats = engine.stats();
    tracing::info!(
        extractions = stats.extractions,
        symbol_hits = stats.symbol_hits,
        result_hits = stats.result_hits,
        workspace_hits = stats.workspace_hits,
        "serve session ended"
    );
    Ok(())
}

/// Build the analysis from config file values, then CLI flags on top.
fn configure(cli: &Cli, root: &Path) -> (Deadsym, bool) {
    let mut builder = Deadsym::new(root);
    let mut json = cli.json;

    match load_config(root) {
        Ok(Some(cfg)) => {
            json |= cfg.wants_json();
            builder = builder.with_config(&cfg);
        }
        Ok(None) => {}
        Err(e) => {
            eprintln!("[WARN] config load failed: {:#}", e);
        }
    }

    builder = builder.ignore_patterns(cli.ignore.iter().cloned());
    if cli.no_cache {
        builder = builder.with_cache(false);
    }
    if cli.no_params {
        builder = builder.include_parameters(false);
    }
    (builder, json)
}

fn main() -> Result<()> {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("[PANIC] deadsym internal error: {}", info);
        eprintln!("[PANIC] The process will exit with code 2.");
    }));

    let cli = Cli::parse();

    if cli.log_json {
        init_structured_logging();
    } else {
        init_plain_logging();
    }

    if let Some(filename) = &cli.detect {
        println!("{}", detect_language(filename));
        return Ok(());
    }

    if cli.serve {
        let stdin = io::stdin();
        let stdout = io::stdout();
        return serve(stdin.lock(), stdout.lock());
    }

    let root = Path::new(&cli.path);
    if !root.is_dir() {
        anyhow::bail!("Not a directory: {}", cli.path);
    }

    let (builder, json) = configure(&cli, root);
    let report = builder
        .analyze()
        .with_context(|| format!("Failed to analyze: {}", cli.path))?;

    if json {
        print_json(&report.results);
    } else {
        print_plain(&report.results);
    }

    // Exit code (CI-friendly)
    std::process::exit(if report.has_findings() { 1 } else { 0 });
}
