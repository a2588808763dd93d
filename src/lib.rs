//! Genetic search for a C source variant whose compiled object matches a
//! reference binary. Candidates are token streams mutated structurally;
//! fitness is the size of the binary diff against the target object.

pub mod config;
pub mod error;
pub mod lexer;
pub mod mutate;
pub mod search;
pub mod token;
pub mod toolchain;

pub use config::{Config, SearchConfig, ToolchainConfig};
pub use error::{GendecError, Result};
pub use search::{FitnessEval, Individual, SearchEngine};
pub use token::{parse, render, slice_by_lines, Token, TokenKind};
