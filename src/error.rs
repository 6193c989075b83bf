//! Error types for the browser boundary and the posting workflow.
//!
//! Only [`PostError::AuthenticationFailed`] and [`PostError::NoDestinationsResolved`]
//! end a run. Every other variant is reported and the run moves on to the next
//! attachment or destination.

use crate::attachment::AttachmentKind;
use crate::driver::Locator;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("element not found within {1:?}: {0}")]
    Timeout(Locator, Duration),
    #[error("window not found: {0}")]
    WindowNotFound(String),
    #[error("browser error: {0}")]
    Browser(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum PostError {
    #[error("element not found: {0}")]
    ElementNotFound(Locator),
    #[error("authentication failed: {0}")]
    AuthenticationFailed(Box<PostError>),
    #[error("destination not found: {0}")]
    DestinationNotFound(String),
    #[error("no destinations resolved")]
    NoDestinationsResolved,
    #[error("failed to upload {}: {reason}", path.display())]
    AttachmentUploadFailed { path: PathBuf, reason: String },
    #[error("unknown attachment kind ({kind}): {item}")]
    UnknownAttachmentKind { kind: AttachmentKind, item: String },
    #[error("failed to post to {destination}: {source}")]
    PostingFailed {
        destination: String,
        source: Box<PostError>,
    },
    #[error("{0}")]
    Driver(DriverError),
}

impl PostError {
    /// Whether this error ends the whole batch.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::AuthenticationFailed(_) | Self::NoDestinationsResolved
        )
    }
}

impl From<DriverError> for PostError {
    fn from(err: DriverError) -> Self {
        match err {
            DriverError::Timeout(locator, _) => Self::ElementNotFound(locator),
            err => Self::Driver(err),
        }
    }
}

pub type Result<T, E = PostError> = std::result::Result<T, E>;
