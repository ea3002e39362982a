//! Draftroom - outline note editor
//!
//! A Rust-based Org/Markdown editor with a focus mode and per-heading notes drawers.

mod app;
mod core;
mod ui;

use app::DraftroomApp;
use crate::core::config::AppConfig;
use crate::core::deps::{self, PathResolver};
use eframe::egui;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> eframe::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::filter::LevelFilter::INFO)
        .init();

    tracing::info!("Starting Draftroom...");

    let initial = std::env::args_os().nth(1).map(std::path::PathBuf::from);

    let config = AppConfig::load().unwrap_or_else(|e| {
        tracing::error!("Failed to load config, using defaults: {:#}", e);
        AppConfig::default()
    });

    // Missing tools only disable the features that need them
    let missing = deps::find_missing(&config.dependencies, &PathResolver::from_env());
    match deps::missing_message(&missing) {
        Some(message) => tracing::warn!("{}", message),
        None => tracing::info!("All external tools found"),
    }

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("Draftroom"),
        ..Default::default()
    };

    eframe::run_native(
        "Draftroom",
        native_options,
        Box::new(|cc| Ok(Box::new(DraftroomApp::new(cc, config, missing, initial)))),
    )
}
