//! Presentation strings shared by the terminal and desktop front ends.

use chrono::{DateTime, Local, NaiveDateTime};
use shared::domain::ResourceKind;

pub const APP_TITLE: &str = "Hotel Operations Portal";
pub const APP_SUBTITLE: &str = "Multi-branch admin, staff, payments, maintenance, and loyalty.";
pub const SIGN_IN_LABEL: &str = "Seed & Sign In";
pub const SIGNED_IN_LABEL: &str = "Signed in";
pub const INVALID_CREDENTIALS_LABEL: &str = "Invalid credentials";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const INVALID_DATE: &str = "Invalid Date";

pub fn section_title(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Branches => "Branches",
        ResourceKind::Payments => "Payments (Non-booking)",
        ResourceKind::Maintenance => "Maintenance",
        ResourceKind::LoyaltyMembers => "Loyalty Members",
    }
}

pub fn empty_message(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Branches => "No branches yet.",
        ResourceKind::Payments => "No payments yet.",
        ResourceKind::Maintenance => "No maintenance yet.",
        ResourceKind::LoyaltyMembers => "No members yet.",
    }
}

pub fn action_label(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Branches => "Add",
        ResourceKind::Payments => "Add Sample",
        ResourceKind::Maintenance => "Create",
        ResourceKind::LoyaltyMembers => "Enroll",
    }
}

/// Renders a backend timestamp in local time.
///
/// Offset-carrying values are converted; naive values are taken as local
/// already. Missing or unparseable values render as `Invalid Date`.
pub fn format_timestamp(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim) else {
        return INVALID_DATE.to_string();
    };
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed
            .with_timezone(&Local)
            .format(TIMESTAMP_FORMAT)
            .to_string();
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_else(|| INVALID_DATE.to_string())
}

pub fn format_points(points: i64) -> String {
    format!("{points} pts")
}
