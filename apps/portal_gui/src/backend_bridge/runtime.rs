//! Backend worker: owns the dashboard and turns queued commands into UI events.

use std::thread::{self, JoinHandle};

use client_core::{ClientError, Dashboard, Settings};
use crossbeam_channel::{Receiver, Sender};
use shared::domain::ResourceKind;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{DashboardSnapshot, UiError, UiErrorContext, UiEvent};

pub fn snapshot(dashboard: &Dashboard) -> DashboardSnapshot {
    DashboardSnapshot {
        auth: dashboard.session().state().clone(),
        state: dashboard.state().clone(),
        creatable: ResourceKind::ALL
            .into_iter()
            .filter(|kind| dashboard.can_create(*kind))
            .collect(),
    }
}

/// Applies one command. Partial-sync failures surface as the first failed collection.
pub async fn execute(dashboard: &mut Dashboard, cmd: BackendCommand) -> Result<String, ClientError> {
    let report = match cmd {
        BackendCommand::SignIn => match dashboard.sign_in().await? {
            Some(report) => report,
            None => return Ok("Signed in; dashboard already up to date".to_string()),
        },
        BackendCommand::Resync => dashboard.resync().await?,
        BackendCommand::AddBranch(draft) => {
            let branch = dashboard.create_branch(&draft).await?;
            return Ok(format!("Created branch {}", branch.name));
        }
        BackendCommand::AddPayment { currency } => {
            let payment = dashboard.create_payment(&currency).await?;
            return Ok(format!(
                "Recorded {} {} {}",
                payment.service_name, payment.amount, payment.currency
            ));
        }
        BackendCommand::AddMaintenance => {
            let ticket = dashboard.create_maintenance_ticket().await?;
            return Ok(format!("Opened ticket {}", ticket.title));
        }
        BackendCommand::EnrollMember => {
            let member = dashboard.enroll_loyalty_member().await?;
            return Ok(format!("Enrolled {}", member.email));
        }
    };

    if let Some(err) = report.failed.into_iter().next() {
        return Err(err);
    }
    Ok(format!("Synced {} collections", report.refreshed.len()))
}

pub fn launch<F>(
    settings: Settings,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
    repaint: F,
) -> std::io::Result<JoinHandle<()>>
where
    F: Fn() + Send + 'static,
{
    thread::Builder::new()
        .name("portal-backend".to_string())
        .spawn(move || {
            let emit = |event: UiEvent| {
                if ui_tx.send(event).is_err() {
                    tracing::warn!("ui event queue closed; dropping event");
                }
                repaint();
            };

            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(err) => {
                    tracing::error!("failed to build backend runtime: {err}");
                    emit(UiEvent::Error(UiError::from_message(
                        UiErrorContext::BackendStartup,
                        format!("backend worker startup failure: failed to build runtime: {err}"),
                    )));
                    return;
                }
            };

            runtime.block_on(async {
                let mut dashboard = Dashboard::from_settings(&settings);
                tracing::info!(backend = %settings.backend_url, policy = %settings.sync_policy, "backend worker ready");
                emit(UiEvent::Snapshot(snapshot(&dashboard)));

                while let Ok(cmd) = cmd_rx.recv() {
                    tracing::debug!(command = cmd.name(), "running backend command");
                    match execute(&mut dashboard, cmd.clone()).await {
                        Ok(notice) => emit(UiEvent::Info(notice)),
                        Err(err) => emit(UiEvent::Error(UiError::from_client_error(&err, &cmd))),
                    }
                    emit(UiEvent::CommandSettled(snapshot(&dashboard)));
                }
                tracing::info!("ui command queue closed; backend worker exiting");
            });
        })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use client_core::{DemoCredentials, HttpPortalApi};

    use super::*;

    fn unreachable_dashboard() -> Dashboard {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);
        Dashboard::new(
            Arc::new(HttpPortalApi::new(format!("http://{addr}"))),
            DemoCredentials::default(),
        )
    }

    #[test]
    fn signed_out_snapshot_offers_no_actions() {
        let dashboard = unreachable_dashboard();
        let snapshot = snapshot(&dashboard);

        assert!(!snapshot.auth.is_signed_in());
        assert!(snapshot.creatable.is_empty());
        assert!(!snapshot.can_create(ResourceKind::Branches));
    }

    #[tokio::test]
    async fn sign_in_against_dead_backend_yields_retryable_error() {
        let mut dashboard = unreachable_dashboard();

        let err = execute(&mut dashboard, BackendCommand::SignIn)
            .await
            .expect_err("backend is down");

        assert!(err.is_retryable());
        let ui = UiError::from_client_error(&err, &BackendCommand::SignIn);
        assert_eq!(ui.retry_command(), Some(&BackendCommand::SignIn));
        assert!(!dashboard.session().is_authenticated());
    }

    #[tokio::test]
    async fn create_before_sign_in_is_refused_locally() {
        let mut dashboard = unreachable_dashboard();

        let err = execute(&mut dashboard, BackendCommand::EnrollMember)
            .await
            .expect_err("not signed in");

        assert!(matches!(err, ClientError::NotAuthenticated));
    }

    #[test]
    fn every_command_ends_with_a_settled_snapshot_even_on_a_tight_queue() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);
        let settings = Settings {
            backend_url: format!("http://{addr}"),
            ..Settings::default()
        };
        let (cmd_tx, cmd_rx) = crossbeam_channel::bounded(4);
        let (ui_tx, ui_rx) = crossbeam_channel::bounded(1);
        cmd_tx.send(BackendCommand::EnrollMember).expect("queue");
        cmd_tx.send(BackendCommand::AddMaintenance).expect("queue");
        drop(cmd_tx);

        let worker = launch(settings, cmd_rx, ui_tx, || {}).expect("spawn");
        let events: Vec<UiEvent> = ui_rx.iter().collect();
        worker.join().expect("worker exits");

        let kinds: Vec<&str> = events
            .iter()
            .map(|event| match event {
                UiEvent::Info(_) => "info",
                UiEvent::Snapshot(_) => "snapshot",
                UiEvent::CommandSettled(_) => "settled",
                UiEvent::Error(_) => "error",
            })
            .collect();
        assert_eq!(
            kinds,
            vec!["snapshot", "error", "settled", "error", "settled"]
        );
    }
}
