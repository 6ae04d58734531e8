use serde::{Deserialize, Serialize};

use crate::{
    domain::{BranchId, MemberId, PaymentId, TicketId},
    lenient::{self, Amount},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub id: BranchId,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub location: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub branch_id: BranchId,
    #[serde(default, deserialize_with = "lenient::text")]
    pub service_name: String,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub amount: Amount,
    #[serde(default, deserialize_with = "lenient::text")]
    pub currency: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub status: String,
    /// Raw backend timestamp; parsed only when rendered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceTicket {
    pub id: TicketId,
    pub branch_id: BranchId,
    #[serde(default, deserialize_with = "lenient::text")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub priority: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoyaltyMember {
    pub id: MemberId,
    #[serde(default, deserialize_with = "lenient::text")]
    pub member_type: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub full_name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient::integer_or_zero")]
    pub points_balance: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBranch {
    pub name: String,
    pub location: String,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPayment {
    pub branch_id: BranchId,
    pub service_name: String,
    pub amount: f64,
    pub currency: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMaintenanceTicket {
    pub branch_id: BranchId,
    pub title: String,
    pub priority: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLoyaltyMember {
    pub member_type: String,
    pub full_name: String,
    pub email: String,
}

/// Query string of the seed endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedAdminQuery {
    pub email: String,
    pub password: String,
}

/// Form-encoded login body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl LoginResponse {
    /// The token, if the backend returned a usable one.
    pub fn token(&self) -> Option<&str> {
        self.access_token
            .as_deref()
            .filter(|token| !token.trim().is_empty())
    }
}
