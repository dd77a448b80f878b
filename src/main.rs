// main.rs
mod app;
mod config;
mod utils;

use std::backtrace::Backtrace;
use std::io;
use std::panic::{self, AssertUnwindSafe};

use app::App;
use eframe::NativeOptions;
use tracing::{error, info};

fn main() {
    utils::init_logging();
    info!("Starting application...");

    panic::set_hook(Box::new(|panic_info| {
        error!("An error occurred: {panic_info}");
        eprintln!("\nFull backtrace:\n{}", Backtrace::force_capture());
    }));

    if panic::catch_unwind(AssertUnwindSafe(run)).is_err() {
        eprintln!("\nPress Enter to exit...");
        let mut line = String::new();
        let _ = io::stdin().read_line(&mut line);
        std::process::exit(1);
    }
}

fn run() {
    let native_options = NativeOptions {
        initial_window_size: Some(egui::Vec2::new(600.0, 450.0)),
        min_window_size: Some(egui::Vec2::new(500.0, 400.0)),
        drag_and_drop_support: true,
        resizable: true,
        ..Default::default()
    };
    eframe::run_native(
        "WebP Converter",
        native_options,
        Box::new(|cc| Box::new(App::new(cc))),
    );
}
