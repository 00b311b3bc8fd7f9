use std::path::PathBuf;

use crate::id::{ContainerId, WindowId};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Failures reported by the host runtime (window system / content engine).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("failed to allocate content surface: {0}")]
    SurfaceAllocation(String),

    #[error("failed to create window: {0}")]
    WindowCreation(String),

    #[error("unknown surface: {0}")]
    UnknownSurface(String),

    #[error("script execution failed: {0}")]
    Script(String),
}

#[derive(Debug, thiserror::Error)]
pub enum TabError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("invalid payload for {command}: {reason}")]
    InvalidPayload { command: String, reason: String },

    #[error("window not found: {0}")]
    WindowNotFound(WindowId),

    #[error("container not found: {0}")]
    ContainerNotFound(ContainerId),

    #[error("{id} failed to load (code {code}): {description}")]
    LoadFailure {
        id: ContainerId,
        code: i32,
        description: String,
    },

    #[error("{0} cannot be closed")]
    CloseDisabled(ContainerId),

    #[error("tab request abandoned before the frame became ready")]
    Abandoned,

    #[error(transparent)]
    Host(#[from] HostError),
}

#[derive(Debug, thiserror::Error)]
pub enum TabdeckError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Tab(#[from] TabError),

    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}
