//! External collaborators: the compiler, the binary-diff scorer, and the
//! staging of the working source file.

use crate::config::{Config, ToolchainConfig};
use crate::error::{GendecError, Result};
use crate::search::{FitnessEval, SearchEngine};
use crate::token::{self, Token};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::NamedTempFile;

/// Suffix appended to the working source path for the pristine backup.
pub const BACKUP_SUFFIX: &str = ".gendec-orig.c";

/// Debug snapshot of whatever the working file held at exit, written next
/// to the source.
pub const LAST_FILE: &str = "last.c";

/// Moves the working source aside for the run's duration and restores it
/// on drop, whichever way the run ends. While staged, the working path
/// holds the candidate currently being scored.
pub struct SourceStage {
    source: PathBuf,
    backup: PathBuf,
}

impl SourceStage {
    pub fn begin(source: &Path) -> Result<Self> {
        let mut backup = source.as_os_str().to_owned();
        backup.push(BACKUP_SUFFIX);
        let backup = PathBuf::from(backup);
        std::fs::rename(source, &backup)?;
        Ok(Self {
            source: source.to_path_buf(),
            backup,
        })
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup
    }
}

impl Drop for SourceStage {
    fn drop(&mut self) {
        let last = match self.source.parent() {
            Some(dir) if dir.as_os_str().is_empty() => PathBuf::from(LAST_FILE),
            Some(dir) => dir.join(LAST_FILE),
            None => PathBuf::from(LAST_FILE),
        };
        match std::fs::rename(&self.source, &last) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => log::warn!("could not snapshot working file: {}", err),
        }
        if let Err(err) = std::fs::rename(&self.backup, &self.source) {
            log::warn!(
                "could not restore {} from {}: {}",
                self.source.display(),
                self.backup.display(),
                err
            );
        }
    }
}

struct CompileResult {
    object: Option<NamedTempFile>,
    stdout: String,
    stderr: String,
}

/// The production fitness evaluator: compile the candidate, diff the
/// object against the target, score by diff-report size.
pub struct Toolchain {
    config: ToolchainConfig,
    source_path: PathBuf,
    target_path: PathBuf,
}

impl Toolchain {
    pub fn new(config: ToolchainConfig, source_path: PathBuf, target_path: PathBuf) -> Self {
        Self {
            config,
            source_path,
            target_path,
        }
    }

    /// Compile `text`. A non-zero compiler exit is a candidate-level
    /// failure (`object: None`); failing to run the compiler at all is
    /// a run-level error.
    fn compile(&self, text: &str) -> Result<CompileResult> {
        let src = tempfile::Builder::new().suffix(".c").tempfile()?;
        std::fs::write(src.path(), text)?;
        let object = tempfile::Builder::new().suffix(".o").tempfile()?;

        let mut cmd = Command::new(&self.config.compiler[0]);
        cmd.args(&self.config.compiler[1..])
            .args(&self.config.cflags)
            .arg("-c")
            .arg("-o")
            .arg(object.path())
            .arg(src.path());
        let output = cmd.output()?;

        Ok(CompileResult {
            object: output.status.success().then_some(object),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Diff the candidate object against the target. A non-zero exit here
    /// is fatal: the scorer itself is broken, not the candidate.
    fn score(&self, object: &Path) -> Result<f64> {
        let mut cmd = Command::new(&self.config.differ[0]);
        cmd.args(&self.config.differ[1..])
            .arg("diff")
            .arg("-1")
            .arg(&self.target_path)
            .arg("-2")
            .arg(object)
            .arg("-o")
            .arg("-");
        let output = cmd.output()?;
        if !output.status.success() {
            return Err(GendecError::ScoreTool(format!(
                "{}\n{}",
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            )));
        }
        Ok(output.stdout.len() as f64)
    }
}

impl FitnessEval for Toolchain {
    fn check_baseline(&mut self, tokens: &[Token]) -> Result<()> {
        let result = self.compile(&token::render(tokens))?;
        if result.object.is_none() {
            return Err(GendecError::InitialCompile {
                stdout: result.stdout,
                stderr: result.stderr,
            });
        }
        Ok(())
    }

    fn fitness(&mut self, tokens: &[Token]) -> Result<f64> {
        let text = token::render(tokens);
        // Keep the working path showing the candidate under test.
        std::fs::write(&self.source_path, &text)?;
        let result = self.compile(&text)?;
        match result.object {
            None => Ok(f64::INFINITY),
            Some(object) => self.score(object.path()),
        }
    }
}

/// Stage the source file, build the engine, and run the search until the
/// process is killed. The staging guard restores the original source on
/// every exit path.
pub fn run(config: Config, source_path: PathBuf, target_path: PathBuf) -> Result<()> {
    let stage = SourceStage::begin(&source_path)?;
    let text = std::fs::read_to_string(stage.backup_path())?;
    let tokens = token::parse(&text);
    let toolchain = Toolchain::new(config.toolchain, source_path, target_path);
    let mut engine = SearchEngine::new(config.search, tokens, toolchain)?;
    engine.run()
}
