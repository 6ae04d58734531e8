use shared::domain::ResourceKind;

pub mod config;
pub mod error;
pub mod samples;
pub mod session;
pub mod sync;
pub mod transport;
pub mod view;

pub use config::{load_settings, DemoCredentials, Settings};
pub use error::{ClientError, ErrorKind};
pub use samples::BranchDraft;
pub use session::{AuthState, SessionManager};
pub use sync::{Collection, Dashboard, DashboardState, SyncPolicy, SyncReport};
pub use transport::{HttpPortalApi, PortalApi};

/// Change notifications published by [`Dashboard`] after each transition.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    SessionChanged(AuthState),
    CollectionsReplaced(Vec<ResourceKind>),
    SyncFailed {
        resource: ResourceKind,
        message: String,
    },
    RecordCreated(ResourceKind),
    CreateFailed {
        resource: ResourceKind,
        message: String,
    },
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
