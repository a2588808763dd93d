use anyhow::Context;
use clap::Parser;
use gendec::config::Config;
use gendec::error::GendecError;
use std::path::PathBuf;

/// Search for a source variant that compiles to the target object.
#[derive(Parser)]
#[command(name = "gendec", version, about)]
struct Cli {
    /// C source file to permute.
    src_path: PathBuf,

    /// Target object file to match.
    tgt_path: PathBuf,

    /// Working directory to change into first.
    #[arg(long)]
    dir: Option<PathBuf>,

    /// Range of lines to mutate, inclusive (eg: 1,4).
    #[arg(long)]
    lines: Option<String>,

    /// Configuration file (TOML).
    #[arg(long)]
    config: Option<PathBuf>,

    /// RNG seed for a reproducible run.
    #[arg(long)]
    seed: Option<u64>,
}

fn parse_line_range(text: &str) -> Result<(usize, usize), GendecError> {
    let invalid = || GendecError::Configuration(format!("Invalid line range '{}'", text));
    let (first, last) = text.split_once(',').ok_or_else(invalid)?;
    let first = first.trim().parse().map_err(|_| invalid())?;
    let last = last.trim().parse().map_err(|_| invalid())?;
    Ok((first, last))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if let Some(dir) = &cli.dir {
        std::env::set_current_dir(dir)
            .with_context(|| format!("cannot change to directory {}", dir.display()))?;
    }

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(lines) = &cli.lines {
        config.search.line_range = parse_line_range(lines)?;
    }
    if let Some(seed) = cli.seed {
        config.search.seed = Some(seed);
    }
    config.validate()?;

    gendec::toolchain::run(config, cli.src_path, cli.tgt_path)?;
    Ok(())
}
