//! Engine-level error type

use thiserror::Error;

use crate::config::ConfigError;
use crate::context::ContextError;
use crate::render::RenderError;
use crate::scene::RegistryError;
use crate::scheduler::SchedulerError;

/// Errors surfaced by canvas and scene setup
#[derive(Error, Debug)]
pub enum EngineError {
    /// A required context is missing or malformed
    #[error(transparent)]
    Context(#[from] ContextError),

    /// Scene registration failed
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Task registration failed
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    /// Renderer failure
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for engine setup
pub type EngineResult<T> = Result<T, EngineError>;
