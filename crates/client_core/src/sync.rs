//! Resource sync controller: the four collections, the concurrent initial
//! fetch and the prepend-on-create operations.

use std::{fmt, str::FromStr, sync::Arc};

use futures::future::{join4, try_join4};
use shared::{
    domain::{BranchId, ResourceKind},
    protocol::{Branch, LoyaltyMember, MaintenanceTicket, Payment},
};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::{
    config::{DemoCredentials, Settings},
    error::ClientError,
    samples::{
        sample_loyalty_member, sample_maintenance_ticket, sample_payment, BranchDraft,
        EmailSuffixClock,
    },
    session::SessionManager,
    transport::{HttpPortalApi, PortalApi},
    ClientEvent,
};

/// How the four-way initial fetch treats a failure in one of its legs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncPolicy {
    /// First failure wins; no collection is touched.
    #[default]
    AllOrNothing,
    /// Every successful leg replaces its collection; failures are reported.
    RetainPartial,
}

#[derive(Debug, Error)]
#[error("unknown sync policy `{0}` (expected all-or-nothing or retain-partial)")]
pub struct UnknownSyncPolicy(pub String);

impl FromStr for SyncPolicy {
    type Err = UnknownSyncPolicy;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "all-or-nothing" | "strict" => Ok(SyncPolicy::AllOrNothing),
            "retain-partial" | "partial" => Ok(SyncPolicy::RetainPartial),
            _ => Err(UnknownSyncPolicy(raw.to_string())),
        }
    }
}

impl fmt::Display for SyncPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncPolicy::AllOrNothing => f.write_str("all-or-nothing"),
            SyncPolicy::RetainPartial => f.write_str("retain-partial"),
        }
    }
}

/// Ordered records of one kind, newest creations first.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<T> {
    items: Vec<T>,
    loaded: bool,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loaded: false,
        }
    }
}

/// A collection already loaded with `items`.
impl<T> From<Vec<T>> for Collection<T> {
    fn from(items: Vec<T>) -> Self {
        Self {
            items,
            loaded: true,
        }
    }
}

impl<T> Collection<T> {
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True once a sync has replaced the collection from the backend.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn replace(&mut self, items: Vec<T>) {
        self.items = items;
        self.loaded = true;
    }

    fn prepend(&mut self, item: T) {
        self.items.insert(0, item);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    pub branches: Collection<Branch>,
    pub payments: Collection<Payment>,
    pub maintenance: Collection<MaintenanceTicket>,
    pub loyalty_members: Collection<LoyaltyMember>,
}

impl DashboardState {
    pub fn len(&self, kind: ResourceKind) -> usize {
        match kind {
            ResourceKind::Branches => self.branches.len(),
            ResourceKind::Payments => self.payments.len(),
            ResourceKind::Maintenance => self.maintenance.len(),
            ResourceKind::LoyaltyMembers => self.loyalty_members.len(),
        }
    }

    pub fn is_loaded(&self, kind: ResourceKind) -> bool {
        match kind {
            ResourceKind::Branches => self.branches.is_loaded(),
            ResourceKind::Payments => self.payments.is_loaded(),
            ResourceKind::Maintenance => self.maintenance.is_loaded(),
            ResourceKind::LoyaltyMembers => self.loyalty_members.is_loaded(),
        }
    }

    /// The branch sample payments and tickets are bound to.
    pub fn first_branch_id(&self) -> Option<BranchId> {
        self.branches.first().map(|branch| branch.id)
    }
}

/// Outcome of a sync that was allowed to complete.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub refreshed: Vec<ResourceKind>,
    /// Only populated under [`SyncPolicy::RetainPartial`]; each entry is a
    /// [`ClientError::Sync`].
    pub failed: Vec<ClientError>,
}

impl SyncReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

type LegResult<T> = Result<Vec<T>, (ResourceKind, ClientError)>;

pub struct Dashboard {
    api: Arc<dyn PortalApi>,
    session: SessionManager,
    state: DashboardState,
    policy: SyncPolicy,
    synced_credential: Option<String>,
    email_clock: EmailSuffixClock,
    events: broadcast::Sender<ClientEvent>,
}

impl Dashboard {
    pub fn new(api: Arc<dyn PortalApi>, credentials: DemoCredentials) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            session: SessionManager::new(Arc::clone(&api), credentials),
            api,
            state: DashboardState::default(),
            policy: SyncPolicy::default(),
            synced_credential: None,
            email_clock: EmailSuffixClock::default(),
            events,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let api: Arc<dyn PortalApi> = Arc::new(HttpPortalApi::new(settings.backend_url.clone()));
        Self::new(api, settings.credentials.clone()).with_policy(settings.sync_policy)
    }

    pub fn with_policy(mut self, policy: SyncPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> SyncPolicy {
        self.policy
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    /// Whether the control for creating `kind` should be enabled.
    pub fn can_create(&self, kind: ResourceKind) -> bool {
        self.ensure_can_create(kind).is_ok()
    }

    /// Acquires a session and, when the credential is new, runs the initial
    /// sync. Returns `None` when no sync was needed.
    pub async fn sign_in(&mut self) -> Result<Option<SyncReport>, ClientError> {
        let acquired = self.session.acquire_session().await.map(|_| ());
        let _ = self
            .events
            .send(ClientEvent::SessionChanged(self.session.state().clone()));
        acquired?;

        if self.needs_initial_sync() {
            self.run_sync().await.map(Some)
        } else {
            Ok(None)
        }
    }

    /// Re-runs the four-way fetch on demand, e.g. after a failed initial sync.
    pub async fn resync(&mut self) -> Result<SyncReport, ClientError> {
        self.run_sync().await
    }

    fn needs_initial_sync(&self) -> bool {
        self.session.is_authenticated()
            && self.synced_credential.as_deref() != Some(self.session.credential())
    }

    async fn run_sync(&mut self) -> Result<SyncReport, ClientError> {
        if !self.session.is_authenticated() {
            return Err(ClientError::NotAuthenticated);
        }
        self.synced_credential = Some(self.session.credential().to_string());

        let api = Arc::clone(&self.api);
        let auth = self.session.auth_headers();
        let branches = async {
            api.list_branches(&auth)
                .await
                .map_err(|err| (ResourceKind::Branches, err))
        };
        let payments = async {
            api.list_payments(&auth)
                .await
                .map_err(|err| (ResourceKind::Payments, err))
        };
        let maintenance = async {
            api.list_maintenance(&auth)
                .await
                .map_err(|err| (ResourceKind::Maintenance, err))
        };
        let members = async {
            api.list_loyalty_members(&auth)
                .await
                .map_err(|err| (ResourceKind::LoyaltyMembers, err))
        };

        match self.policy {
            SyncPolicy::AllOrNothing => {
                match try_join4(branches, payments, maintenance, members).await {
                    Ok((branches, payments, maintenance, members)) => {
                        self.state.branches.replace(branches);
                        self.state.payments.replace(payments);
                        self.state.maintenance.replace(maintenance);
                        self.state.loyalty_members.replace(members);
                        let refreshed = ResourceKind::ALL.to_vec();
                        info!(
                            branches = self.state.branches.len(),
                            payments = self.state.payments.len(),
                            maintenance = self.state.maintenance.len(),
                            loyalty_members = self.state.loyalty_members.len(),
                            "initial sync complete"
                        );
                        let _ = self
                            .events
                            .send(ClientEvent::CollectionsReplaced(refreshed.clone()));
                        Ok(SyncReport {
                            refreshed,
                            failed: Vec::new(),
                        })
                    }
                    Err((resource, err)) => Err(self.sync_failed(resource, err)),
                }
            }
            SyncPolicy::RetainPartial => {
                let (branches, payments, maintenance, members) =
                    join4(branches, payments, maintenance, members).await;
                let mut report = SyncReport::default();
                self.apply_leg(
                    ResourceKind::Branches,
                    branches,
                    |state| &mut state.branches,
                    &mut report,
                );
                self.apply_leg(
                    ResourceKind::Payments,
                    payments,
                    |state| &mut state.payments,
                    &mut report,
                );
                self.apply_leg(
                    ResourceKind::Maintenance,
                    maintenance,
                    |state| &mut state.maintenance,
                    &mut report,
                );
                self.apply_leg(
                    ResourceKind::LoyaltyMembers,
                    members,
                    |state| &mut state.loyalty_members,
                    &mut report,
                );
                if !report.refreshed.is_empty() {
                    let _ = self
                        .events
                        .send(ClientEvent::CollectionsReplaced(report.refreshed.clone()));
                }
                info!(
                    refreshed = report.refreshed.len(),
                    failed = report.failed.len(),
                    "partial sync complete"
                );
                Ok(report)
            }
        }
    }

    fn apply_leg<T>(
        &mut self,
        kind: ResourceKind,
        leg: LegResult<T>,
        collection: impl FnOnce(&mut DashboardState) -> &mut Collection<T>,
        report: &mut SyncReport,
    ) {
        match leg {
            Ok(items) => {
                collection(&mut self.state).replace(items);
                report.refreshed.push(kind);
            }
            Err((resource, err)) => {
                let err = self.sync_failed(resource, err);
                report.failed.push(err);
            }
        }
    }

    fn sync_failed(&self, resource: ResourceKind, err: ClientError) -> ClientError {
        warn!(%resource, error = %err, "sync failed");
        let _ = self.events.send(ClientEvent::SyncFailed {
            resource,
            message: err.to_string(),
        });
        ClientError::sync(resource, err)
    }

    fn ensure_can_create(&self, kind: ResourceKind) -> Result<(), ClientError> {
        if !self.session.is_authenticated() {
            return Err(ClientError::NotAuthenticated);
        }
        if kind.requires_branch() && self.state.branches.is_empty() {
            return Err(ClientError::MissingBranch { resource: kind });
        }
        Ok(())
    }

    fn bound_branch(&self, kind: ResourceKind) -> Result<BranchId, ClientError> {
        self.ensure_can_create(kind)?;
        self.state
            .first_branch_id()
            .ok_or(ClientError::MissingBranch { resource: kind })
    }

    pub async fn create_branch(&mut self, draft: &BranchDraft) -> Result<Branch, ClientError> {
        self.ensure_can_create(ResourceKind::Branches)?;
        let auth = self.session.auth_headers();
        let result = self.api.create_branch(&auth, &draft.to_request()).await;
        finish_create(
            &self.events,
            &mut self.state.branches,
            ResourceKind::Branches,
            result,
        )
    }

    /// Posts the sample payment against the first branch, in `currency`.
    pub async fn create_payment(&mut self, currency: &str) -> Result<Payment, ClientError> {
        let branch_id = self.bound_branch(ResourceKind::Payments)?;
        let auth = self.session.auth_headers();
        let result = self
            .api
            .create_payment(&auth, &sample_payment(branch_id, currency))
            .await;
        finish_create(
            &self.events,
            &mut self.state.payments,
            ResourceKind::Payments,
            result,
        )
    }

    pub async fn create_maintenance_ticket(&mut self) -> Result<MaintenanceTicket, ClientError> {
        let branch_id = self.bound_branch(ResourceKind::Maintenance)?;
        let auth = self.session.auth_headers();
        let result = self
            .api
            .create_maintenance_ticket(&auth, &sample_maintenance_ticket(branch_id))
            .await;
        finish_create(
            &self.events,
            &mut self.state.maintenance,
            ResourceKind::Maintenance,
            result,
        )
    }

    pub async fn enroll_loyalty_member(&mut self) -> Result<LoyaltyMember, ClientError> {
        self.ensure_can_create(ResourceKind::LoyaltyMembers)?;
        let auth = self.session.auth_headers();
        let body = sample_loyalty_member(self.email_clock.next_now());
        let result = self.api.enroll_loyalty_member(&auth, &body).await;
        finish_create(
            &self.events,
            &mut self.state.loyalty_members,
            ResourceKind::LoyaltyMembers,
            result,
        )
    }
}

fn finish_create<T: Clone>(
    events: &broadcast::Sender<ClientEvent>,
    collection: &mut Collection<T>,
    resource: ResourceKind,
    result: Result<T, ClientError>,
) -> Result<T, ClientError> {
    match result {
        Ok(record) => {
            collection.prepend(record.clone());
            info!(%resource, total = collection.len(), "record created");
            let _ = events.send(ClientEvent::RecordCreated(resource));
            Ok(record)
        }
        Err(err) => {
            warn!(%resource, error = %err, "create failed");
            let _ = events.send(ClientEvent::CreateFailed {
                resource,
                message: err.to_string(),
            });
            Err(err)
        }
    }
}

#[cfg(test)]
#[path = "tests/sync_tests.rs"]
mod tests;
