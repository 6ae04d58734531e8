//! Plain-text and JSON renderings of the dashboard.

use std::fmt::Write as _;

use client_core::{
    view::{
        action_label, empty_message, format_points, format_timestamp, section_title,
        APP_SUBTITLE, APP_TITLE, INVALID_CREDENTIALS_LABEL, SIGNED_IN_LABEL, SIGN_IN_LABEL,
    },
    AuthState, ClientError, DashboardState, ErrorKind,
};
use serde_json::{json, Value};
use shared::domain::{PaymentStatus, ResourceKind};

pub fn render_dashboard(
    auth: &AuthState,
    state: &DashboardState,
    can_create: impl Fn(ResourceKind) -> bool,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{APP_TITLE}");
    let _ = writeln!(out, "{APP_SUBTITLE}");
    let badge = match auth {
        AuthState::SignedIn { .. } => SIGNED_IN_LABEL,
        AuthState::SignedOut => SIGN_IN_LABEL,
        AuthState::InvalidCredentials => INVALID_CREDENTIALS_LABEL,
    };
    let _ = writeln!(out, "[{badge}]");

    for kind in ResourceKind::ALL {
        let action = if can_create(kind) {
            format!("[{}]", action_label(kind))
        } else {
            format!("[{} - disabled]", action_label(kind))
        };
        let _ = writeln!(out);
        let _ = writeln!(out, "== {} ==  {action}", section_title(kind));

        let lines = section_lines(kind, state);
        if lines.is_empty() {
            let _ = writeln!(out, "  {}", empty_message(kind));
        }
        for line in lines {
            let _ = writeln!(out, "{line}");
        }
    }
    out
}

fn section_lines(kind: ResourceKind, state: &DashboardState) -> Vec<String> {
    match kind {
        ResourceKind::Branches => state
            .branches
            .iter()
            .map(|b| format!("  {}\n    {} • {}", b.name, b.location, b.currency))
            .collect(),
        ResourceKind::Payments => state
            .payments
            .iter()
            .map(|p| {
                format!(
                    "  {} {}  [{}]\n    {} {} • {}",
                    status_marker(&p.status),
                    p.service_name,
                    p.status,
                    p.amount,
                    p.currency,
                    format_timestamp(p.created_at.as_deref())
                )
            })
            .collect(),
        ResourceKind::Maintenance => state
            .maintenance
            .iter()
            .map(|m| {
                format!(
                    "  {}  ({})\n    {} • {}",
                    m.title,
                    m.priority,
                    m.status,
                    format_timestamp(m.created_at.as_deref())
                )
            })
            .collect(),
        ResourceKind::LoyaltyMembers => state
            .loyalty_members
            .iter()
            .map(|m| {
                format!(
                    "  {}  [{}]\n    {} • {}",
                    m.full_name,
                    format_points(m.points_balance),
                    m.email,
                    m.member_type
                )
            })
            .collect(),
    }
}

fn status_marker(status: &str) -> char {
    match PaymentStatus::classify(status) {
        PaymentStatus::Completed => '+',
        PaymentStatus::Pending => '~',
        PaymentStatus::Other => '!',
    }
}

pub fn render_json(auth: &AuthState, state: &DashboardState) -> anyhow::Result<String> {
    let auth = match auth {
        AuthState::SignedOut => "signed_out",
        AuthState::SignedIn { .. } => "signed_in",
        AuthState::InvalidCredentials => "invalid_credentials",
    };
    let value: Value = json!({
        "auth": auth,
        "branches": state.branches.items(),
        "payments": state.payments.items(),
        "maintenance": state.maintenance.items(),
        "loyalty_members": state.loyalty_members.items(),
    });
    Ok(serde_json::to_string_pretty(&value)?)
}

/// One-line, user-facing explanation of a failed command.
pub fn describe_failure(err: &ClientError) -> String {
    let hint = if err.is_retryable() {
        " Run the command again to retry."
    } else {
        ""
    };
    match err.kind() {
        ErrorKind::InvalidCredentials => {
            "Invalid credentials: the backend did not issue an access token.".to_string()
        }
        ErrorKind::Transport => format!("Backend unreachable: {err}.{hint}"),
        ErrorKind::Precondition => format!("Action unavailable: {err}."),
        ErrorKind::Rejected | ErrorKind::Malformed | ErrorKind::SyncFailed => {
            format!("{err}.{hint}")
        }
    }
}
