#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`error`]: Domain error types (`DockerControlError`)
//! - [`docker`]: Docker API abstraction (`DockerClient` trait, `BollardDockerClient`)
//! - [`control`]: nginx container operations (`NginxController`)

pub mod control;
pub mod docker;
pub mod error;

// --- Public API Re-exports ---

// Controller (main entry point)
pub use control::{NginxController, ReloadOutcome};

// Docker API
pub use docker::{BollardDockerClient, DockerClient, ExecOutput};

// Error
pub use error::DockerControlError;
