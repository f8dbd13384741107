//! Crate-level error type.

use thiserror::Error;

use crate::apply::ApplyError;
use crate::bootstrap::BootstrapError;
use crate::capture::CaptureError;
use crate::config::ConfigError;
use crate::transport::TransportError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Apply(#[from] ApplyError),

    #[error("markup contract violated: {0}")]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("push channel is disabled")]
    PushDisabled,
}
