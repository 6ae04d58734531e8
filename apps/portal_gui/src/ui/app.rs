//! Portal window: header, sign-in control, branch form, and the four resource sections.

use client_core::{
    samples::CURRENCIES,
    view::{
        action_label, empty_message, format_points, format_timestamp, section_title,
        APP_SUBTITLE, APP_TITLE, INVALID_CREDENTIALS_LABEL, SIGNED_IN_LABEL, SIGN_IN_LABEL,
    },
    AuthState, BranchDraft,
};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use egui::{Color32, RichText};
use shared::domain::{PaymentStatus, ResourceKind};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::{
    events::{DashboardSnapshot, UiError, UiErrorContext, UiEvent},
    orchestration::dispatch_backend_command,
};

const COMPLETED: Color32 = Color32::from_rgb(21, 128, 61);
const PENDING: Color32 = Color32::from_rgb(161, 98, 7);
const FAILED: Color32 = Color32::from_rgb(185, 28, 28);
const MUTED: Color32 = Color32::from_rgb(107, 114, 128);

pub struct PortalApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    backend_url: String,
    snapshot: DashboardSnapshot,
    draft: BranchDraft,
    in_flight: usize,
    status: String,
    banner: Option<UiError>,
}

impl PortalApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        backend_url: impl Into<String>,
    ) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            backend_url: backend_url.into(),
            snapshot: DashboardSnapshot::default(),
            draft: BranchDraft::default(),
            in_flight: 0,
            status: String::new(),
            banner: None,
        }
    }

    pub fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => {
                    self.status = message;
                    self.banner = None;
                }
                UiEvent::Snapshot(snapshot) => {
                    self.snapshot = snapshot;
                }
                UiEvent::CommandSettled(snapshot) => {
                    self.snapshot = snapshot;
                    self.in_flight = self.in_flight.saturating_sub(1);
                }
                UiEvent::Error(err) => {
                    tracing::warn!(context = ?err.context(), category = ?err.category(), "{}", err.message());
                    self.status.clear();
                    self.banner = Some(err);
                }
            }
        }
    }

    fn send(&mut self, cmd: BackendCommand) {
        if dispatch_backend_command(&self.cmd_tx, cmd, &mut self.status) {
            self.in_flight += 1;
        }
    }

    fn retry(&mut self) {
        if let Some(cmd) = self.banner.take().and_then(|err| err.retry_command().cloned()) {
            self.send(cmd);
        }
    }

    fn busy(&self) -> bool {
        self.in_flight > 0
    }

    /// Payments are recorded in the currency chosen on the branch form.
    fn payment_command(&self) -> BackendCommand {
        BackendCommand::AddPayment {
            currency: self.draft.currency.clone(),
        }
    }

    fn show_header(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.vertical(|ui| {
                ui.heading(APP_TITLE);
                ui.label(RichText::new(APP_SUBTITLE).color(MUTED));
            });
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                match &self.snapshot.auth {
                    AuthState::SignedIn { .. } => {
                        ui.label(RichText::new(SIGNED_IN_LABEL).color(COMPLETED).strong());
                    }
                    auth => {
                        let clicked = ui
                            .add_enabled(!self.busy(), egui::Button::new(SIGN_IN_LABEL))
                            .clicked();
                        if *auth == AuthState::InvalidCredentials {
                            ui.label(RichText::new(INVALID_CREDENTIALS_LABEL).color(FAILED));
                        }
                        if clicked {
                            self.send(BackendCommand::SignIn);
                        }
                    }
                }
                if self.busy() {
                    ui.spinner();
                }
            });
        });
        ui.label(RichText::new(&self.backend_url).small().color(MUTED));
    }

    fn show_banner(&mut self, ui: &mut egui::Ui) {
        let Some(err) = &self.banner else {
            if !self.status.is_empty() {
                ui.label(RichText::new(&self.status).color(MUTED));
            }
            return;
        };
        let can_retry = err.retry_command().is_some();
        let mut message = err.message().to_string();
        if err.requires_reauth() && err.context() != UiErrorContext::SignIn {
            message.push_str(" Sign in again to refresh the session.");
        }
        let mut retry = false;
        let mut dismiss = false;
        egui::Frame::group(ui.style())
            .fill(Color32::from_rgb(254, 242, 242))
            .show(ui, |ui| {
                ui.horizontal_wrapped(|ui| {
                    ui.label(RichText::new(message).color(FAILED));
                    if can_retry && ui.button("Retry").clicked() {
                        retry = true;
                    }
                    if ui.small_button("Dismiss").clicked() {
                        dismiss = true;
                    }
                });
            });
        if retry {
            self.retry();
        } else if dismiss {
            self.banner = None;
        }
    }

    fn section_header(&mut self, ui: &mut egui::Ui, kind: ResourceKind) -> bool {
        let enabled = self.snapshot.can_create(kind);
        let mut clicked = false;
        ui.horizontal(|ui| {
            ui.strong(section_title(kind));
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                clicked = ui
                    .add_enabled(enabled, egui::Button::new(action_label(kind)))
                    .clicked();
            });
        });
        clicked
    }

    fn show_branches(&mut self, ui: &mut egui::Ui) {
        let kind = ResourceKind::Branches;
        if self.section_header(ui, kind) {
            self.send(BackendCommand::AddBranch(self.draft.clone()));
        }
        egui::Grid::new("branch_form").num_columns(2).show(ui, |ui| {
            ui.label("Name");
            ui.text_edit_singleline(&mut self.draft.name);
            ui.end_row();
            ui.label("Location");
            ui.text_edit_singleline(&mut self.draft.location);
            ui.end_row();
            ui.label("Currency");
            currency_picker(ui, "branch_currency", &mut self.draft.currency);
            ui.end_row();
        });
        ui.separator();
        if self.snapshot.state.branches.is_empty() {
            ui.label(RichText::new(empty_message(kind)).color(MUTED));
        }
        for branch in self.snapshot.state.branches.iter() {
            ui.label(RichText::new(&branch.name).strong());
            ui.label(
                RichText::new(format!("{} • {}", branch.location, branch.currency))
                    .small()
                    .color(MUTED),
            );
        }
    }

    fn show_payments(&mut self, ui: &mut egui::Ui) {
        let kind = ResourceKind::Payments;
        if self.section_header(ui, kind) {
            self.send(self.payment_command());
        }
        ui.label(RichText::new(format!("New payments use {}", self.draft.currency)).color(MUTED));
        ui.separator();
        if self.snapshot.state.payments.is_empty() {
            ui.label(RichText::new(empty_message(kind)).color(MUTED));
        }
        for payment in self.snapshot.state.payments.iter() {
            let color = match PaymentStatus::classify(&payment.status) {
                PaymentStatus::Completed => COMPLETED,
                PaymentStatus::Pending => PENDING,
                PaymentStatus::Other => FAILED,
            };
            ui.horizontal(|ui| {
                ui.label(RichText::new(&payment.service_name).strong());
                ui.label(RichText::new(&payment.status).color(color));
            });
            ui.label(
                RichText::new(format!(
                    "{} {} • {}",
                    payment.amount,
                    payment.currency,
                    format_timestamp(payment.created_at.as_deref())
                ))
                .small()
                .color(MUTED),
            );
        }
    }

    fn show_maintenance(&mut self, ui: &mut egui::Ui) {
        let kind = ResourceKind::Maintenance;
        if self.section_header(ui, kind) {
            self.send(BackendCommand::AddMaintenance);
        }
        ui.separator();
        if self.snapshot.state.maintenance.is_empty() {
            ui.label(RichText::new(empty_message(kind)).color(MUTED));
        }
        for ticket in self.snapshot.state.maintenance.iter() {
            ui.horizontal(|ui| {
                ui.label(RichText::new(&ticket.title).strong());
                ui.label(RichText::new(&ticket.priority).color(PENDING));
            });
            ui.label(
                RichText::new(format!(
                    "{} • {}",
                    ticket.status,
                    format_timestamp(ticket.created_at.as_deref())
                ))
                .small()
                .color(MUTED),
            );
        }
    }

    fn show_members(&mut self, ui: &mut egui::Ui) {
        let kind = ResourceKind::LoyaltyMembers;
        if self.section_header(ui, kind) {
            self.send(BackendCommand::EnrollMember);
        }
        ui.separator();
        if self.snapshot.state.loyalty_members.is_empty() {
            ui.label(RichText::new(empty_message(kind)).color(MUTED));
        }
        for member in self.snapshot.state.loyalty_members.iter() {
            ui.horizontal(|ui| {
                ui.label(RichText::new(&member.full_name).strong());
                ui.label(RichText::new(format_points(member.points_balance)).color(COMPLETED));
            });
            ui.label(
                RichText::new(format!("{} • {}", member.email, member.member_type))
                    .small()
                    .color(MUTED),
            );
        }
    }
}

fn currency_picker(ui: &mut egui::Ui, salt: &str, selected: &mut String) {
    egui::ComboBox::from_id_salt(salt)
        .selected_text(selected.clone())
        .show_ui(ui, |ui| {
            for currency in CURRENCIES {
                ui.selectable_value(&mut *selected, currency.to_string(), currency);
            }
        });
}

impl eframe::App for PortalApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();

        egui::TopBottomPanel::top("portal_header").show(ctx, |ui| {
            ui.add_space(6.0);
            self.show_header(ui);
            ui.add_space(6.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.show_banner(ui);
            ui.add_space(8.0);
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.columns(2, |columns| {
                    egui::Frame::group(columns[0].style()).show(&mut columns[0], |ui| {
                        self.show_branches(ui)
                    });
                    egui::Frame::group(columns[1].style()).show(&mut columns[1], |ui| {
                        self.show_payments(ui)
                    });
                });
                ui.add_space(8.0);
                ui.columns(2, |columns| {
                    egui::Frame::group(columns[0].style()).show(&mut columns[0], |ui| {
                        self.show_maintenance(ui)
                    });
                    egui::Frame::group(columns[1].style()).show(&mut columns[1], |ui| {
                        self.show_members(ui)
                    });
                });
            });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use client_core::{ClientError, DashboardState};
    use crossbeam_channel::bounded;

    fn app() -> (PortalApp, Sender<UiEvent>, Receiver<BackendCommand>) {
        let (cmd_tx, cmd_rx) = bounded(8);
        let (ui_tx, ui_rx) = bounded(8);
        (
            PortalApp::new(cmd_tx, ui_rx, "http://localhost:8000"),
            ui_tx,
            cmd_rx,
        )
    }

    #[test]
    fn snapshot_replaces_view_and_settles_in_flight_command() {
        let (mut app, ui_tx, cmd_rx) = app();
        app.send(BackendCommand::SignIn);
        assert!(app.busy());
        assert_eq!(cmd_rx.try_recv().ok(), Some(BackendCommand::SignIn));

        let snapshot = DashboardSnapshot {
            auth: AuthState::SignedIn {
                token: "tok123".to_string(),
            },
            state: DashboardState::default(),
            creatable: vec![ResourceKind::Branches, ResourceKind::LoyaltyMembers],
        };
        ui_tx
            .try_send(UiEvent::CommandSettled(snapshot.clone()))
            .expect("send");
        app.process_ui_events();

        assert!(!app.busy());
        assert_eq!(app.snapshot, snapshot);
    }

    #[test]
    fn startup_snapshot_does_not_settle_a_pending_command() {
        let (mut app, ui_tx, _cmd_rx) = app();
        app.send(BackendCommand::SignIn);

        ui_tx
            .try_send(UiEvent::Snapshot(DashboardSnapshot::default()))
            .expect("send");
        app.process_ui_events();
        assert!(app.busy());

        ui_tx
            .try_send(UiEvent::CommandSettled(DashboardSnapshot::default()))
            .expect("send");
        app.process_ui_events();
        assert!(!app.busy());
    }

    #[test]
    fn retry_resends_the_failed_command_and_clears_banner() {
        let (mut app, ui_tx, cmd_rx) = app();
        let err = ClientError::Rejected {
            operation: "create maintenance ticket",
            status: 503,
            detail: "Service Unavailable".to_string(),
        };
        ui_tx
            .try_send(UiEvent::Error(UiError::from_client_error(
                &err,
                &BackendCommand::AddMaintenance,
            )))
            .expect("send");
        app.process_ui_events();
        assert!(app.banner.is_some());

        app.retry();

        assert!(app.banner.is_none());
        assert_eq!(cmd_rx.try_recv().ok(), Some(BackendCommand::AddMaintenance));
    }

    #[test]
    fn branch_form_keeps_its_contents_after_submission() {
        let (mut app, _ui_tx, cmd_rx) = app();
        app.draft.name = "Harbor".to_string();
        app.draft.currency = "GBP".to_string();

        app.send(BackendCommand::AddBranch(app.draft.clone()));

        assert_eq!(app.draft.name, "Harbor");
        match cmd_rx.try_recv().expect("queued") {
            BackendCommand::AddBranch(draft) => assert_eq!(draft.currency, "GBP"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn payment_uses_the_branch_form_currency() {
        let (mut app, _ui_tx, cmd_rx) = app();
        app.draft.currency = "EUR".to_string();

        app.send(app.payment_command());

        assert_eq!(
            cmd_rx.try_recv().ok(),
            Some(BackendCommand::AddPayment {
                currency: "EUR".to_string()
            })
        );
    }
}
