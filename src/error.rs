use thiserror::Error;

#[derive(Error, Debug)]
pub enum GendecError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Mutation error: {0}")]
    Mutation(String),

    #[error("Initial compile failed:\n{stdout}\n{stderr}")]
    InitialCompile { stdout: String, stderr: String },

    #[error("Scoring failed: {0}")]
    ScoreTool(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config file error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, GendecError>;
