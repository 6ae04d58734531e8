//! Form draft and the fixed synthetic payloads behind the "sample" actions.

use shared::{
    domain::BranchId,
    protocol::{NewBranch, NewLoyaltyMember, NewMaintenanceTicket, NewPayment},
};

pub const CURRENCIES: [&str; 4] = ["USD", "EUR", "GBP", "JPY"];

pub const SAMPLE_SERVICE_NAME: &str = "Spa Service";
pub const SAMPLE_PAYMENT_AMOUNT: f64 = 120.5;
pub const SAMPLE_PAYMENT_STATUS: &str = "completed";
pub const SAMPLE_TICKET_TITLE: &str = "HVAC Filter Replacement";
pub const SAMPLE_TICKET_PRIORITY: &str = "high";
pub const SAMPLE_MEMBER_TYPE: &str = "guest";
pub const SAMPLE_MEMBER_NAME: &str = "Alex Traveler";

/// Branch form contents. Stays populated after a create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchDraft {
    pub name: String,
    pub location: String,
    pub currency: String,
}

impl Default for BranchDraft {
    fn default() -> Self {
        Self {
            name: "Downtown".into(),
            location: "City Center".into(),
            currency: CURRENCIES[0].into(),
        }
    }
}

impl BranchDraft {
    pub fn to_request(&self) -> NewBranch {
        NewBranch {
            name: self.name.clone(),
            location: self.location.clone(),
            currency: self.currency.clone(),
        }
    }
}

pub fn sample_payment(branch_id: BranchId, currency: &str) -> NewPayment {
    NewPayment {
        branch_id,
        service_name: SAMPLE_SERVICE_NAME.into(),
        amount: SAMPLE_PAYMENT_AMOUNT,
        currency: currency.into(),
        status: SAMPLE_PAYMENT_STATUS.into(),
    }
}

pub fn sample_maintenance_ticket(branch_id: BranchId) -> NewMaintenanceTicket {
    NewMaintenanceTicket {
        branch_id,
        title: SAMPLE_TICKET_TITLE.into(),
        priority: SAMPLE_TICKET_PRIORITY.into(),
    }
}

pub fn sample_loyalty_member(email_suffix: i64) -> NewLoyaltyMember {
    NewLoyaltyMember {
        member_type: SAMPLE_MEMBER_TYPE.into(),
        full_name: SAMPLE_MEMBER_NAME.into(),
        email: format!("alex{email_suffix}@mail.com"),
    }
}

/// Millisecond timestamps for member emails, bumped past the previous value
/// when the clock has not advanced.
#[derive(Debug, Default)]
pub struct EmailSuffixClock {
    last: Option<i64>,
}

impl EmailSuffixClock {
    pub fn next_suffix(&mut self, now_millis: i64) -> i64 {
        let next = match self.last {
            Some(last) if now_millis <= last => last + 1,
            _ => now_millis,
        };
        self.last = Some(next);
        next
    }

    pub fn next_now(&mut self) -> i64 {
        self.next_suffix(chrono::Utc::now().timestamp_millis())
    }
}
