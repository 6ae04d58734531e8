//! HTTP transport for the portal backend.

use async_trait::async_trait;
use reqwest::{header::HeaderMap, Client, Response};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::ResourceKind,
    error::ApiErrorBody,
    protocol::{
        Branch, LoginForm, LoginResponse, LoyaltyMember, MaintenanceTicket, NewBranch,
        NewLoyaltyMember, NewMaintenanceTicket, NewPayment, Payment, SeedAdminQuery,
    },
};
use tracing::{debug, warn};

use crate::{config::DemoCredentials, error::ClientError};

pub const SEED_ADMIN_PATH: &str = "/setup/seed-admin";
pub const LOGIN_PATH: &str = "/auth/login";

/// Every backend call the portal makes. Collection calls take the current
/// authorization headers; an empty map sends the request unauthenticated.
#[async_trait]
pub trait PortalApi: Send + Sync {
    async fn seed_admin(&self, credentials: &DemoCredentials) -> Result<(), ClientError>;
    async fn login(&self, credentials: &DemoCredentials) -> Result<LoginResponse, ClientError>;

    async fn list_branches(&self, auth: &HeaderMap) -> Result<Vec<Branch>, ClientError>;
    async fn list_payments(&self, auth: &HeaderMap) -> Result<Vec<Payment>, ClientError>;
    async fn list_maintenance(&self, auth: &HeaderMap)
        -> Result<Vec<MaintenanceTicket>, ClientError>;
    async fn list_loyalty_members(&self, auth: &HeaderMap)
        -> Result<Vec<LoyaltyMember>, ClientError>;

    async fn create_branch(&self, auth: &HeaderMap, body: &NewBranch)
        -> Result<Branch, ClientError>;
    async fn create_payment(
        &self,
        auth: &HeaderMap,
        body: &NewPayment,
    ) -> Result<Payment, ClientError>;
    async fn create_maintenance_ticket(
        &self,
        auth: &HeaderMap,
        body: &NewMaintenanceTicket,
    ) -> Result<MaintenanceTicket, ClientError>;
    async fn enroll_loyalty_member(
        &self,
        auth: &HeaderMap,
        body: &NewLoyaltyMember,
    ) -> Result<LoyaltyMember, ClientError>;
}

pub struct HttpPortalApi {
    http: Client,
    base_url: String,
}

impl HttpPortalApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn list<T: DeserializeOwned>(
        &self,
        resource: ResourceKind,
        operation: &'static str,
        auth: &HeaderMap,
    ) -> Result<Vec<T>, ClientError> {
        debug!(%resource, "fetching collection");
        let res = self
            .http
            .get(self.url(resource.path()))
            .headers(auth.clone())
            .send()
            .await
            .map_err(|source| ClientError::Transport { operation, source })?;
        decode(ensure_success(res, operation).await?, operation).await
    }

    async fn create<B, T>(
        &self,
        resource: ResourceKind,
        operation: &'static str,
        auth: &HeaderMap,
        body: &B,
    ) -> Result<T, ClientError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        debug!(%resource, "creating record");
        let res = self
            .http
            .post(self.url(resource.path()))
            .headers(auth.clone())
            .json(body)
            .send()
            .await
            .map_err(|source| ClientError::Transport { operation, source })?;
        decode(ensure_success(res, operation).await?, operation).await
    }
}

async fn ensure_success(res: Response, operation: &'static str) -> Result<Response, ClientError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let body = res.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ApiErrorBody>(&body)
        .ok()
        .and_then(|parsed| parsed.message())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string()
        });
    warn!(operation, status = status.as_u16(), %detail, "backend rejected request");
    Err(ClientError::Rejected {
        operation,
        status: status.as_u16(),
        detail,
    })
}

async fn decode<T: DeserializeOwned>(
    res: Response,
    operation: &'static str,
) -> Result<T, ClientError> {
    res.json::<T>().await.map_err(|source| {
        if source.is_decode() {
            ClientError::Malformed { operation, source }
        } else {
            ClientError::Transport { operation, source }
        }
    })
}

#[async_trait]
impl PortalApi for HttpPortalApi {
    async fn seed_admin(&self, credentials: &DemoCredentials) -> Result<(), ClientError> {
        let operation = "seed admin";
        let res = self
            .http
            .post(self.url(SEED_ADMIN_PATH))
            .query(&SeedAdminQuery {
                email: credentials.email.clone(),
                password: credentials.password.clone(),
            })
            .send()
            .await
            .map_err(|source| ClientError::Transport { operation, source })?;
        ensure_success(res, operation).await?;
        Ok(())
    }

    async fn login(&self, credentials: &DemoCredentials) -> Result<LoginResponse, ClientError> {
        let operation = "login";
        let res = self
            .http
            .post(self.url(LOGIN_PATH))
            .form(&LoginForm {
                username: credentials.email.clone(),
                password: credentials.password.clone(),
            })
            .send()
            .await
            .map_err(|source| ClientError::Transport { operation, source })?;
        if matches!(res.status().as_u16(), 400 | 401 | 403) {
            return Err(ClientError::InvalidCredentials);
        }
        decode(ensure_success(res, operation).await?, operation).await
    }

    async fn list_branches(&self, auth: &HeaderMap) -> Result<Vec<Branch>, ClientError> {
        self.list(ResourceKind::Branches, "list branches", auth).await
    }

    async fn list_payments(&self, auth: &HeaderMap) -> Result<Vec<Payment>, ClientError> {
        self.list(ResourceKind::Payments, "list payments", auth).await
    }

    async fn list_maintenance(
        &self,
        auth: &HeaderMap,
    ) -> Result<Vec<MaintenanceTicket>, ClientError> {
        self.list(ResourceKind::Maintenance, "list maintenance tickets", auth)
            .await
    }

    async fn list_loyalty_members(
        &self,
        auth: &HeaderMap,
    ) -> Result<Vec<LoyaltyMember>, ClientError> {
        self.list(ResourceKind::LoyaltyMembers, "list loyalty members", auth)
            .await
    }

    async fn create_branch(
        &self,
        auth: &HeaderMap,
        body: &NewBranch,
    ) -> Result<Branch, ClientError> {
        self.create(ResourceKind::Branches, "create branch", auth, body)
            .await
    }

    async fn create_payment(
        &self,
        auth: &HeaderMap,
        body: &NewPayment,
    ) -> Result<Payment, ClientError> {
        self.create(ResourceKind::Payments, "create payment", auth, body)
            .await
    }

    async fn create_maintenance_ticket(
        &self,
        auth: &HeaderMap,
        body: &NewMaintenanceTicket,
    ) -> Result<MaintenanceTicket, ClientError> {
        self.create(
            ResourceKind::Maintenance,
            "create maintenance ticket",
            auth,
            body,
        )
        .await
    }

    async fn enroll_loyalty_member(
        &self,
        auth: &HeaderMap,
        body: &NewLoyaltyMember,
    ) -> Result<LoyaltyMember, ClientError> {
        self.create(
            ResourceKind::LoyaltyMembers,
            "enroll loyalty member",
            auth,
            body,
        )
        .await
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
