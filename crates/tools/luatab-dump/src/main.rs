use anyhow::{bail, Context, Result};
use clap::Parser;
use luatab::{Config, ScriptState, Value};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "luatab-dump")]
#[command(about = "Run Lua scripts and dump global tables", long_about = None)]
struct Cli {
    /// KDL configuration file. Defaults to LUATAB_* environment variables
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum nesting level expanded by dumps
    #[arg(short, long)]
    depth: Option<usize>,

    /// Set a global path before scripts run, e.g. `user.profile.level=3`
    #[arg(short, long = "set", value_name = "PATH=VALUE")]
    sets: Vec<String>,

    /// Global table to dump after scripts run (can specify multiple)
    #[arg(long = "dump", value_name = "NAME")]
    dumps: Vec<String>,

    /// Lua scripts, run in order
    #[arg(required = true)]
    scripts: Vec<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_kdl_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::from_env()?,
    };
    if let Some(depth) = cli.depth {
        if depth == 0 {
            bail!("--depth must be at least 1");
        }
        config.dump_depth = depth;
    }

    let state = ScriptState::with_config(config)?;

    for assignment in &cli.sets {
        let (path, value) = parse_assignment(assignment)?;
        state
            .set_path(&path, value)
            .with_context(|| format!("--set {assignment}"))?;
    }

    for script in &cli.scripts {
        info!(script = %script.display(), "running script");
        state.exec_file(script)?;
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for name in &cli.dumps {
        state.dump_global(name, &mut out)?;
    }
    out.flush()?;

    Ok(())
}

/// Split `a.b.c=VALUE` into its path segments and parsed value
fn parse_assignment(text: &str) -> Result<(Vec<&str>, Value)> {
    let Some((path, value)) = text.split_once('=') else {
        bail!("expected PATH=VALUE, got '{text}'");
    };
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        bail!("empty segment in path '{path}'");
    }
    Ok((segments, parse_value(value)))
}

fn parse_value(text: &str) -> Value {
    match text {
        "true" => Value::Boolean(true),
        "false" => Value::Boolean(false),
        _ => {
            if let Ok(i) = text.parse::<i64>() {
                Value::Integer(i)
            } else if let Ok(n) = text.parse::<f64>() {
                Value::Number(n)
            } else {
                Value::String(text.to_string())
            }
        }
    }
}
