// file_dialogs.rs
use rfd::{FileDialog, MessageButtons, MessageDialog, MessageLevel};
use std::path::{Path, PathBuf};

use crate::app::image_processing::ConversionResult;

pub fn select_output_directory(current: &Path) -> Option<PathBuf> {
    FileDialog::new().set_directory(current).pick_folder()
}

/// Blocks the UI thread until the user dismisses it.
pub fn show_summary(result: &ConversionResult) {
    MessageDialog::new()
        .set_level(MessageLevel::Info)
        .set_title("Conversion Status")
        .set_description(&result.summary_message())
        .set_buttons(MessageButtons::Ok)
        .show();
}
