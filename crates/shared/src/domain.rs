use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        /// Accepts a JSON number or a numeric string.
        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                crate::lenient::integer(deserializer).map($name)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(BranchId);
id_newtype!(PaymentId);
id_newtype!(TicketId);
id_newtype!(MemberId);

/// The four collections the portal keeps in view state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Branches,
    Payments,
    Maintenance,
    LoyaltyMembers,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Branches,
        ResourceKind::Payments,
        ResourceKind::Maintenance,
        ResourceKind::LoyaltyMembers,
    ];

    /// Collection endpoint, used for both listing and creating.
    pub fn path(self) -> &'static str {
        match self {
            ResourceKind::Branches => "/branches",
            ResourceKind::Payments => "/payments",
            ResourceKind::Maintenance => "/maintenance",
            ResourceKind::LoyaltyMembers => "/loyalty/members",
        }
    }

    /// Whether creating a record of this kind needs a loaded branch to bind to.
    pub fn requires_branch(self) -> bool {
        matches!(self, ResourceKind::Payments | ResourceKind::Maintenance)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Branches => "branches",
            ResourceKind::Payments => "payments",
            ResourceKind::Maintenance => "maintenance",
            ResourceKind::LoyaltyMembers => "loyalty members",
        };
        f.write_str(name)
    }
}

/// Display bucket for the open set of payment status strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Completed,
    Pending,
    Other,
}

impl PaymentStatus {
    pub fn classify(raw: &str) -> Self {
        match raw {
            "completed" => PaymentStatus::Completed,
            "pending" => PaymentStatus::Pending,
            _ => PaymentStatus::Other,
        }
    }
}
