// app.rs
pub mod file_dialogs;
pub mod gui;
pub mod image_processing;
pub mod worker;

use eframe::egui;
use eframe::App as EframeApp;
use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use tracing::{error, info};

use crate::config::ConfigStore;
use image_processing::ConversionResult;
use worker::{Batch, ConversionWorker, Dispatched};

pub struct App {
    pub config: ConfigStore,
    worker: Option<ConversionWorker>,
    result_receiver: Option<Receiver<ConversionResult>>,
    /// Results of batches that had to run on the UI thread.
    inline_results: Vec<ConversionResult>,
}

impl App {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let config = ConfigStore::for_current_user();
        info!("Output directory: {}", config.output_dir().display());

        let ctx = cc.egui_ctx.clone();
        let (worker, result_receiver) = match ConversionWorker::spawn(move || ctx.request_repaint()) {
            Ok((worker, receiver)) => (Some(worker), Some(receiver)),
            Err(e) => {
                error!("Could not start conversion worker: {e}");
                (None, None)
            }
        };

        Self {
            config,
            worker,
            result_receiver,
            inline_results: Vec::new(),
        }
    }

    /// Queues a dropped batch against the output directory as it is right now.
    pub fn handle_drop(&mut self, files: Vec<PathBuf>) {
        let batch = Batch {
            files,
            output_dir: self.config.output_dir().to_path_buf(),
        };
        info!("Received drop of {} file(s)", batch.files.len());

        match worker::dispatch(self.worker.as_ref(), batch) {
            Dispatched::Queued => {}
            Dispatched::Finished { result, worker_lost } => {
                if worker_lost {
                    error!("Conversion worker stopped, further batches run on the UI thread");
                    self.worker = None;
                }
                self.inline_results.push(result);
            }
        }
    }

    pub fn change_output_directory(&mut self) {
        if let Some(dir) = file_dialogs::select_output_directory(self.config.output_dir()) {
            self.config.set_output_directory(dir);
        }
    }
}

impl EframeApp for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let dropped: Option<Vec<PathBuf>> = {
            let input = ctx.input();
            if input.raw.dropped_files.is_empty() {
                None
            } else {
                Some(
                    input
                        .raw
                        .dropped_files
                        .iter()
                        .filter_map(|file| file.path.clone())
                        .collect(),
                )
            }
        };
        if let Some(files) = dropped {
            self.handle_drop(files);
        }

        let mut finished = std::mem::take(&mut self.inline_results);
        if let Some(receiver) = &self.result_receiver {
            finished.extend(receiver.try_iter());
        }

        gui::render(self, ctx);

        for result in &finished {
            file_dialogs::show_summary(result);
        }
    }
}
