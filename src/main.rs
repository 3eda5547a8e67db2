mod app;
mod audio;
mod color;
mod config;
mod data;
mod error;
mod pipeline;
mod render;
mod state;
mod ui;

use anyhow::Context;
use app::VoicePandaApp;
use clap::Parser;
use eframe::egui;

use config::Args;
use pipeline::Analysis;
use render::config::RenderConfig;
use state::AppState;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = args.resolve().context("resolving configuration")?;
    log::info!(
        "train={} test={} audio={}",
        config.train_table.display(),
        config.test_table.display(),
        config.audio_dir.display()
    );

    let analysis = Analysis::run(&config)?;

    if args.headless {
        print!("{}", analysis.summary);
        for gender in data::model::Gender::ALL {
            match analysis.exemplar(gender).map(|e| &e.signal) {
                Some(Ok(signal)) => println!(
                    "{gender} exemplar: {:.2} s at {} Hz",
                    signal.duration_secs(),
                    signal.sample_rate
                ),
                Some(Err(reason)) => println!("{gender} exemplar unavailable: {reason}"),
                None => {}
            }
        }
        return Ok(());
    }

    let render = RenderConfig::default();
    render.validate().context("invalid render configuration")?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 820.0])
            .with_min_inner_size([640.0, 420.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Voice Panda – Speech EDA",
        options,
        Box::new(move |_cc| Ok(Box::new(VoicePandaApp::new(AppState::new(analysis, render))))),
    )
    .map_err(|e| anyhow::anyhow!("viewer failed: {e}"))
}
