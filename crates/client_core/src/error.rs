//! Error taxonomy for every call the portal makes against its backend.

use shared::domain::ResourceKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport failure during {operation}: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{operation} rejected with HTTP {status}: {detail}")]
    Rejected {
        operation: &'static str,
        status: u16,
        detail: String,
    },
    #[error("malformed {operation} response: {source}")]
    Malformed {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("invalid credentials: login did not return an access token")]
    InvalidCredentials,
    #[error("not signed in")]
    NotAuthenticated,
    #[error("creating {resource} requires at least one branch")]
    MissingBranch { resource: ResourceKind },
    #[error("failed to sync {resource}: {source}")]
    Sync {
        resource: ResourceKind,
        #[source]
        source: Box<ClientError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    InvalidCredentials,
    Rejected,
    Malformed,
    Precondition,
    SyncFailed,
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Transport { .. } => ErrorKind::Transport,
            ClientError::Rejected { .. } => ErrorKind::Rejected,
            ClientError::Malformed { .. } => ErrorKind::Malformed,
            ClientError::InvalidCredentials => ErrorKind::InvalidCredentials,
            ClientError::NotAuthenticated | ClientError::MissingBranch { .. } => {
                ErrorKind::Precondition
            }
            ClientError::Sync { .. } => ErrorKind::SyncFailed,
        }
    }

    /// Whether re-issuing the same action may succeed without user changes.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Transport { .. } | ClientError::Malformed { .. } => true,
            ClientError::Rejected { status, .. } => *status >= 500 || *status == 429,
            ClientError::Sync { source, .. } => source.is_retryable(),
            ClientError::InvalidCredentials
            | ClientError::NotAuthenticated
            | ClientError::MissingBranch { .. } => false,
        }
    }

    /// HTTP status behind the error, looking through sync wrappers.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Rejected { status, .. } => Some(*status),
            ClientError::Sync { source, .. } => source.status(),
            _ => None,
        }
    }

    pub(crate) fn sync(resource: ResourceKind, source: ClientError) -> Self {
        ClientError::Sync {
            resource,
            source: Box::new(source),
        }
    }
}
