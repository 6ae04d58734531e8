//! UI/backend events and error modeling for the portal GUI controller.

use client_core::{AuthState, ClientError, DashboardState, ErrorKind};
use shared::domain::ResourceKind;

use crate::backend_bridge::commands::BackendCommand;

/// Everything the window needs to redraw after a backend command settles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardSnapshot {
    pub auth: AuthState,
    pub state: DashboardState,
    pub creatable: Vec<ResourceKind>,
}

impl DashboardSnapshot {
    pub fn can_create(&self, kind: ResourceKind) -> bool {
        self.creatable.contains(&kind)
    }
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    Info(String),
    /// Initial state published by the worker before any command runs.
    Snapshot(DashboardSnapshot),
    /// State after one dispatched command has finished, successfully or not.
    CommandSettled(DashboardSnapshot),
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Auth,
    Transport,
    Rejected,
    Validation,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    SignIn,
    Sync,
    Create(ResourceKind),
}

impl UiErrorContext {
    pub fn for_command(cmd: &BackendCommand) -> Self {
        match cmd {
            BackendCommand::SignIn => UiErrorContext::SignIn,
            BackendCommand::Resync => UiErrorContext::Sync,
            BackendCommand::AddBranch(_) => UiErrorContext::Create(ResourceKind::Branches),
            BackendCommand::AddPayment { .. } => UiErrorContext::Create(ResourceKind::Payments),
            BackendCommand::AddMaintenance => UiErrorContext::Create(ResourceKind::Maintenance),
            BackendCommand::EnrollMember => UiErrorContext::Create(ResourceKind::LoyaltyMembers),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
    retry: Option<BackendCommand>,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_ascii_lowercase();
        let category = if lower.contains("disconnect")
            || lower.contains("unreachable")
            || lower.contains("queue")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };
        Self {
            category,
            context,
            message,
            retry: None,
        }
    }

    /// Sync and create failures become a retry of `cmd`; sign-in and precondition
    /// failures do not, since retrying them repeats the same answer.
    pub fn from_client_error(err: &ClientError, cmd: &BackendCommand) -> Self {
        let context = match err {
            ClientError::Sync { .. } => UiErrorContext::Sync,
            _ => UiErrorContext::for_command(cmd),
        };
        let (category, message) = match err.kind() {
            ErrorKind::InvalidCredentials => (
                UiErrorCategory::Auth,
                "Invalid credentials: the backend did not issue an access token.".to_string(),
            ),
            ErrorKind::Transport => (
                UiErrorCategory::Transport,
                format!("Backend unreachable: {err}"),
            ),
            ErrorKind::Precondition => (UiErrorCategory::Validation, err.to_string()),
            ErrorKind::Malformed => (UiErrorCategory::Unknown, err.to_string()),
            ErrorKind::Rejected | ErrorKind::SyncFailed => {
                let category = match err.status() {
                    Some(401 | 403) => UiErrorCategory::Auth,
                    Some(_) => UiErrorCategory::Rejected,
                    None => UiErrorCategory::Transport,
                };
                (category, err.to_string())
            }
        };
        let retry = match (context, err.kind()) {
            (_, ErrorKind::InvalidCredentials | ErrorKind::Precondition) => None,
            (UiErrorContext::Sync, _) if *cmd == BackendCommand::SignIn => {
                Some(BackendCommand::Resync)
            }
            (UiErrorContext::SignIn, _) if !err.is_retryable() => None,
            _ => Some(cmd.clone()),
        };
        Self {
            category,
            context,
            message,
            retry,
        }
    }

    pub fn requires_reauth(&self) -> bool {
        self.category == UiErrorCategory::Auth
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn retry_command(&self) -> Option<&BackendCommand> {
        self.retry.as_ref()
    }
}
