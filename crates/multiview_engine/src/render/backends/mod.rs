//! Backend implementations

pub mod recording;

pub use recording::{BackendCommand, CommandLog, RecordingBackend};
