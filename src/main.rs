// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! DENTMARK - dental image marker annotation
//!
//! A desktop application for placing typed markers on panoramic and
//! per-jaw dental photos and exporting the annotated images.

mod app;
mod ui;

use anyhow::Result;
use app::DentmarkApp;
use dentmark::config::Settings;

fn main() -> Result<()> {
    let settings = Settings::load_default();

    // RUST_LOG still wins over the settings file
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(settings.log_filter()),
    )
    .init();
    log::info!("Starting with settings {:?}", settings);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("DENTMARK - Dental Marker Annotation"),
        ..Default::default()
    };

    eframe::run_native(
        "DENTMARK",
        options,
        Box::new(move |_cc| Ok(Box::new(DentmarkApp::new(settings)))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
