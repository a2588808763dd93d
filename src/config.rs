use crate::error::{GendecError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Search parameters for the genetic loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Number of individuals per generation.
    pub population_size: usize,
    /// Upper bound on mutation rounds applied per individual; the actual
    /// count is drawn uniformly from `1..=mutation_rate`.
    pub mutation_rate: usize,
    /// First and last source line eligible for mutation, inclusive.
    pub line_range: (usize, usize),
    /// Optional RNG seed for reproducible runs.
    pub seed: Option<u64>,
    /// Stop after this many generations; `None` runs until killed.
    pub max_generations: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            mutation_rate: 5,
            line_range: (1, 1_000_000),
            seed: None,
            max_generations: None,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.population_size < 2 {
            return Err(GendecError::Configuration(
                "Population size must be at least 2".to_string(),
            ));
        }
        if self.mutation_rate < 1 {
            return Err(GendecError::Configuration(
                "Mutation rate must be at least 1".to_string(),
            ));
        }
        let (first, last) = self.line_range;
        if first < 1 || last < first {
            return Err(GendecError::Configuration(format!(
                "Invalid line range {},{}",
                first, last
            )));
        }
        Ok(())
    }
}

/// External compiler and binary-diff commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    /// Compiler invocation, argv[0] first (e.g. a wrapper plus the compiler).
    pub compiler: Vec<String>,
    /// Flags passed to every compile, before `-c -o <out> <in>`.
    pub cflags: Vec<String>,
    /// Diff tool invocation, argv[0] first; receives
    /// `-1 <target> -2 <candidate> -o -`.
    pub differ: Vec<String>,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            compiler: vec![
                "./build/tools/wibo".to_string(),
                "build/compilers/GC/1.0/mwcceppc.exe".to_string(),
            ],
            cflags: vec![
                "-nodefaults".to_string(),
                "-proc".to_string(),
                "gekko".to_string(),
                "-align".to_string(),
                "powerpc".to_string(),
                "-enum".to_string(),
                "int".to_string(),
                "-fp".to_string(),
                "hardware".to_string(),
                "-Cpp_exceptions".to_string(),
                "off".to_string(),
                "-O0".to_string(),
                "-opt".to_string(),
                "peephole".to_string(),
                "-g".to_string(),
                "-use_lmw_stmw".to_string(),
                "on".to_string(),
                "-maxerrors".to_string(),
                "1".to_string(),
                "-nosyspath".to_string(),
                "-RTTI".to_string(),
                "off".to_string(),
                "-fp_contract".to_string(),
                "on".to_string(),
                "-str".to_string(),
                "reuse".to_string(),
                "-multibyte".to_string(),
                "-i".to_string(),
                "include".to_string(),
            ],
            differ: vec!["../objdiff/target/release/objdiff-cli".to_string()],
        }
    }
}

impl ToolchainConfig {
    pub fn validate(&self) -> Result<()> {
        if self.compiler.is_empty() {
            return Err(GendecError::Configuration(
                "Compiler command must not be empty".to_string(),
            ));
        }
        if self.differ.is_empty() {
            return Err(GendecError::Configuration(
                "Diff command must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Top-level configuration, loadable from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub search: SearchConfig,
    pub toolchain: ToolchainConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.search.validate()?;
        self.toolchain.validate()
    }
}
