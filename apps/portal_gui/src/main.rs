use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::Parser;
use client_core::{
    config::{load_settings_from, normalize_backend_url},
    SyncPolicy,
};
use crossbeam_channel::bounded;
use eframe::egui;
use tracing_subscriber::EnvFilter;

mod backend_bridge;
mod controller;
mod ui;

use backend_bridge::commands::BackendCommand;
use controller::events::UiEvent;
use ui::app::PortalApp;

#[derive(Parser, Debug)]
#[command(name = "portal_gui", about = "Hotel operations portal desktop window")]
struct Args {
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    partial_sync: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut settings = load_settings_from(args.config.as_deref(), |key| std::env::var(key).ok())?;
    if let Some(url) = &args.server_url {
        settings.backend_url = normalize_backend_url(url)?;
    }
    if args.partial_sync {
        settings.sync_policy = SyncPolicy::RetainPartial;
    }

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(64);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(256);
    let backend_url = settings.backend_url.clone();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(client_core::view::APP_TITLE)
            .with_inner_size([1100.0, 760.0])
            .with_min_inner_size([820.0, 560.0]),
        ..Default::default()
    };
    eframe::run_native(
        client_core::view::APP_TITLE,
        options,
        Box::new(move |cc| {
            let egui_ctx = cc.egui_ctx.clone();
            backend_bridge::runtime::launch(settings, cmd_rx, ui_tx, move || {
                egui_ctx.request_repaint()
            })?;
            Ok(Box::new(PortalApp::new(cmd_tx, ui_rx, backend_url)))
        }),
    )
    .map_err(|err| anyhow!("portal window failed: {err}"))
}
