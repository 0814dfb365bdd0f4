use serde::Serialize;
use std::fmt;

/// Errors returned by the host bridge.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("host returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("invalid host response: {0}")]
    InvalidResponse(String),
}

/// Step of the per-page pipeline that produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Load,
    TranslateContent,
    FetchCode,
    TranslateCode,
    RenameFile,
    SaveCode,
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::TranslateContent => "content translation",
            Stage::FetchCode => "code fetch",
            Stage::TranslateCode => "code translation",
            Stage::RenameFile => "file rename",
            Stage::SaveCode => "code save",
            Stage::Write => "write",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{stage} failed: {message}")]
pub struct PageFailure {
    pub stage: Stage,
    pub message: String,
}

impl PageFailure {
    pub fn new(stage: Stage, message: impl Into<String>) -> Self {
        PageFailure {
            stage,
            message: message.into(),
        }
    }

    /// Wraps any displayable error with the stage it happened in.
    pub fn at(stage: Stage) -> impl FnOnce(anyhow::Error) -> Self {
        move |err| PageFailure::new(stage, format!("{err:#}"))
    }
}
