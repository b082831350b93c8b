// src/main.rs

// AIPL
// A line-oriented pipeline language: every line is a literal or an `!operator` call
// fed by the previous line's result.

use clap::Parser as ClapParser;
use std::path::{Path, PathBuf};

use aipl::{Interpreter, Registry, Value};

#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// The script file to run.
    #[arg(required_unless_present = "list")]
    file: Option<PathBuf>,

    /// Print the result of every line, not only the last one.
    #[arg(long)]
    history: bool,

    /// List the built-in operators and exit.
    #[arg(long)]
    list: bool,

    /// Log filter such as `debug` or `aipl=trace`. Defaults to RUST_LOG.
    #[arg(long, value_name = "FILTER")]
    log: Option<String>,
}

/// Installs a stderr subscriber when a filter is given or RUST_LOG is set.
fn init_tracing(filter: Option<&str>) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = match filter {
        Some(directives) => EnvFilter::new(directives),
        None if std::env::var("RUST_LOG").is_ok() => EnvFilter::from_default_env(),
        None => return,
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(filter)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log.as_deref());

    let registry = match Registry::with_builtins() {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Fatal error building operator registry: {}", e);
            std::process::exit(1);
        }
    };

    if cli.list {
        for name in registry.names() {
            if let Some((descriptor, _)) = registry.lookup(name) {
                println!("{}", descriptor);
            }
        }
        return;
    }

    if let Some(path) = cli.file {
        if let Err(e) = run_script(&path, registry, cli.history) {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Runs the interpreter on a given script file in batch mode.
fn run_script(path: &Path, registry: Registry, show_history: bool) -> Result<(), String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read file '{}': {}", path.display(), e))?;

    let mut interpreter = Interpreter::new(registry);
    let result = interpreter.run_script(&content).map_err(|e| e.to_string())?;

    if show_history {
        for (i, value) in interpreter.history().iter().enumerate() {
            println!("${} = {}", i, render(value));
        }
    } else {
        println!("Result: {}", render(&result));
    }
    Ok(())
}

// Strings are quoted so an empty or whitespace result is still visible.
fn render(value: &Value) -> String {
    match value {
        Value::Str(s) => format!("{:?}", s),
        other => other.to_string(),
    }
}
