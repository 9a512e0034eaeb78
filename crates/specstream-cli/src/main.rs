mod check;
mod config;
mod logging;

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use specstream_compiler::{ApplyMode, CompileOptions, Spec};
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "specstream")]
#[command(about = "SpecStream: streaming UI spec compiler and renderer")]
#[command(version)]
struct Cli {
    /// Fail on the first malformed line or failed patch
    #[arg(long, global = true)]
    strict: bool,

    /// Config file (defaults to ./specstream.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a SpecStream file and print the spec as JSON
    Compile {
        /// Input file, or - for stdin
        path: String,
    },

    /// Report every patch error and structural issue in a SpecStream file
    Check {
        /// Input file, or - for stdin
        path: String,
    },

    /// Compile, resolve against state and print the render tree as JSON
    Render {
        /// Input file, or - for stdin
        path: String,

        /// State JSON file (defaults to the spec's own state)
        #[arg(long, value_name = "FILE")]
        state: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    logging::init_tracing(&config.log.filter);

    let mut options = config.compiler;
    if cli.strict {
        options.mode = ApplyMode::Strict;
    }

    match cli.command {
        Command::Compile { path } => cmd_compile(&path, options),
        Command::Check { path } => cmd_check(&path),
        Command::Render { path, state } => cmd_render(&path, state.as_deref(), options),
    }
}

fn read_source(path: &str) -> String {
    if path == "-" {
        let mut source = String::new();
        if let Err(e) = std::io::stdin().read_to_string(&mut source) {
            eprintln!("Error reading stdin: {e}");
            std::process::exit(1);
        }
        return source;
    }

    let p = Path::new(path);
    if !p.exists() {
        eprintln!("Error: file not found: {path}");
        std::process::exit(1);
    }
    match std::fs::read_to_string(p) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading {path}: {e}");
            std::process::exit(1);
        }
    }
}

fn read_state(path: &Path) -> Value {
    let source = read_source(&path.to_string_lossy());
    match serde_json::from_str(&source) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("Invalid state JSON in {}: {e}", path.display());
            std::process::exit(1);
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error serializing output: {e}");
            std::process::exit(1);
        }
    }
}

fn compile(path: &str, options: CompileOptions) -> Spec {
    let source = read_source(path);
    match specstream_compiler::compile_with(&source, options) {
        Ok(spec) => spec,
        Err(e) => {
            eprintln!("Compile error: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_compile(path: &str, options: CompileOptions) {
    let spec = compile(path, options);
    print_json(&spec);
}

fn cmd_check(path: &str) {
    let source = read_source(path);
    let problems = check::check(&source);

    if problems.is_empty() {
        eprintln!("OK: {path}");
        return;
    }

    for problem in &problems {
        eprintln!("{problem}");
    }
    eprintln!("{} problem(s) in {path}", problems.len());
    std::process::exit(1);
}

fn cmd_render(path: &str, state: Option<&Path>, options: CompileOptions) {
    let spec = compile(path, options);
    let state = match state {
        Some(state_path) => read_state(state_path),
        None => specstream_runtime::initial_state(&spec),
    };

    match specstream_runtime::render(&spec, &state) {
        Some(tree) => print_json(&tree),
        None => {
            tracing::warn!(root = %spec.root, "Root element missing or hidden; nothing rendered");
            println!("null");
        }
    }
}
