//! In-memory backend used by the session and sync tests.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, AUTHORIZATION};
use shared::{
    domain::{BranchId, MemberId, PaymentId, ResourceKind, TicketId},
    protocol::{
        Branch, LoginResponse, LoyaltyMember, MaintenanceTicket, NewBranch, NewLoyaltyMember,
        NewMaintenanceTicket, NewPayment, Payment,
    },
};

use tokio::sync::Barrier;

use crate::{config::DemoCredentials, error::ClientError, transport::PortalApi};

#[derive(Default)]
pub(crate) struct FakeBackend {
    pub login_token: Option<String>,
    pub login_status: Option<u16>,
    pub seed_status: Option<u16>,
    pub branches: Vec<Branch>,
    pub payments: Vec<Payment>,
    pub maintenance: Vec<MaintenanceTicket>,
    pub members: Vec<LoyaltyMember>,
    pub failing_lists: HashSet<ResourceKind>,
    /// When set, every list call waits here before answering.
    pub list_barrier: Option<Arc<Barrier>>,
    pub reject_creates: bool,
    pub next_id: i64,
    pub calls: Vec<String>,
    pub seen_auth: Vec<String>,
    pub posted_payments: Vec<NewPayment>,
    pub posted_tickets: Vec<NewMaintenanceTicket>,
    pub posted_members: Vec<NewLoyaltyMember>,
    pub login_credentials: Vec<DemoCredentials>,
}

pub(crate) struct FakePortalApi {
    backend: Mutex<FakeBackend>,
}

impl FakePortalApi {
    pub fn new(backend: FakeBackend) -> Self {
        Self {
            backend: Mutex::new(backend),
        }
    }

    pub fn with_token(token: &str) -> Self {
        Self::new(FakeBackend {
            login_token: Some(token.to_string()),
            next_id: 100,
            ..FakeBackend::default()
        })
    }

    pub fn backend(&self) -> MutexGuard<'_, FakeBackend> {
        self.backend.lock().expect("fake backend lock")
    }

    async fn rendezvous(&self) {
        let barrier = self.backend().list_barrier.clone();
        if let Some(barrier) = barrier {
            barrier.wait().await;
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.backend().calls.clone()
    }

    pub fn post_count(&self) -> usize {
        self.backend()
            .calls
            .iter()
            .filter(|call| call.starts_with("POST /"))
            .count()
    }
}

pub(crate) fn branch(id: i64, name: &str) -> Branch {
    Branch {
        id: BranchId(id),
        name: name.to_string(),
        location: "City Center".to_string(),
        currency: "USD".to_string(),
    }
}

pub(crate) fn payment(id: i64, branch_id: i64) -> Payment {
    Payment {
        id: PaymentId(id),
        branch_id: BranchId(branch_id),
        service_name: "Laundry".to_string(),
        amount: 40.0.into(),
        currency: "USD".to_string(),
        status: "pending".to_string(),
        created_at: Some("2024-01-01T00:00:00".to_string()),
    }
}

fn rejected(operation: &'static str) -> ClientError {
    ClientError::Rejected {
        operation,
        status: 500,
        detail: "boom".to_string(),
    }
}

impl FakeBackend {
    fn record(&mut self, call: &str, auth: &HeaderMap) {
        self.calls.push(call.to_string());
        let value = auth
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        self.seen_auth.push(value);
    }

    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn list<T: Clone>(
        &mut self,
        resource: ResourceKind,
        auth: &HeaderMap,
        items: impl FnOnce(&Self) -> Vec<T>,
    ) -> Result<Vec<T>, ClientError> {
        self.record(&format!("GET {}", resource.path()), auth);
        if self.failing_lists.contains(&resource) {
            return Err(rejected("list"));
        }
        Ok(items(self))
    }

    fn create(&mut self, resource: ResourceKind, auth: &HeaderMap) -> Result<i64, ClientError> {
        self.record(&format!("POST {}", resource.path()), auth);
        if self.reject_creates {
            return Err(ClientError::Rejected {
                operation: "create",
                status: 422,
                detail: "invalid payload".to_string(),
            });
        }
        Ok(self.allocate_id())
    }
}

#[async_trait]
impl PortalApi for FakePortalApi {
    async fn seed_admin(&self, _credentials: &DemoCredentials) -> Result<(), ClientError> {
        let mut backend = self.backend();
        backend.calls.push("POST /setup/seed-admin".to_string());
        match backend.seed_status {
            Some(status) => Err(ClientError::Rejected {
                operation: "seed admin",
                status,
                detail: "seed failed".to_string(),
            }),
            None => Ok(()),
        }
    }

    async fn login(&self, credentials: &DemoCredentials) -> Result<LoginResponse, ClientError> {
        let mut backend = self.backend();
        backend.calls.push("POST /auth/login".to_string());
        backend.login_credentials.push(credentials.clone());
        match backend.login_status {
            Some(401) => Err(ClientError::InvalidCredentials),
            Some(status) => Err(ClientError::Rejected {
                operation: "login",
                status,
                detail: "login failed".to_string(),
            }),
            None => Ok(LoginResponse {
                access_token: backend.login_token.clone(),
            }),
        }
    }

    async fn list_branches(&self, auth: &HeaderMap) -> Result<Vec<Branch>, ClientError> {
        self.rendezvous().await;
        self.backend()
            .list(ResourceKind::Branches, auth, |b| b.branches.clone())
    }

    async fn list_payments(&self, auth: &HeaderMap) -> Result<Vec<Payment>, ClientError> {
        self.rendezvous().await;
        self.backend()
            .list(ResourceKind::Payments, auth, |b| b.payments.clone())
    }

    async fn list_maintenance(
        &self,
        auth: &HeaderMap,
    ) -> Result<Vec<MaintenanceTicket>, ClientError> {
        self.rendezvous().await;
        self.backend()
            .list(ResourceKind::Maintenance, auth, |b| b.maintenance.clone())
    }

    async fn list_loyalty_members(
        &self,
        auth: &HeaderMap,
    ) -> Result<Vec<LoyaltyMember>, ClientError> {
        self.rendezvous().await;
        self.backend()
            .list(ResourceKind::LoyaltyMembers, auth, |b| b.members.clone())
    }

    async fn create_branch(
        &self,
        auth: &HeaderMap,
        body: &NewBranch,
    ) -> Result<Branch, ClientError> {
        let id = self.backend().create(ResourceKind::Branches, auth)?;
        Ok(Branch {
            id: BranchId(id),
            name: body.name.clone(),
            location: body.location.clone(),
            currency: body.currency.clone(),
        })
    }

    async fn create_payment(
        &self,
        auth: &HeaderMap,
        body: &NewPayment,
    ) -> Result<Payment, ClientError> {
        let mut backend = self.backend();
        backend.posted_payments.push(body.clone());
        let id = backend.create(ResourceKind::Payments, auth)?;
        Ok(Payment {
            id: PaymentId(id),
            branch_id: body.branch_id,
            service_name: body.service_name.clone(),
            amount: body.amount.into(),
            currency: body.currency.clone(),
            status: body.status.clone(),
            created_at: Some("2024-01-02T08:30:00".to_string()),
        })
    }

    async fn create_maintenance_ticket(
        &self,
        auth: &HeaderMap,
        body: &NewMaintenanceTicket,
    ) -> Result<MaintenanceTicket, ClientError> {
        let mut backend = self.backend();
        backend.posted_tickets.push(body.clone());
        let id = backend.create(ResourceKind::Maintenance, auth)?;
        Ok(MaintenanceTicket {
            id: TicketId(id),
            branch_id: body.branch_id,
            title: body.title.clone(),
            priority: body.priority.clone(),
            status: "open".to_string(),
            created_at: None,
        })
    }

    async fn enroll_loyalty_member(
        &self,
        auth: &HeaderMap,
        body: &NewLoyaltyMember,
    ) -> Result<LoyaltyMember, ClientError> {
        let mut backend = self.backend();
        backend.posted_members.push(body.clone());
        let id = backend.create(ResourceKind::LoyaltyMembers, auth)?;
        Ok(LoyaltyMember {
            id: MemberId(id),
            member_type: body.member_type.clone(),
            full_name: body.full_name.clone(),
            email: body.email.clone(),
            points_balance: 0,
        })
    }
}
