// image_processing.rs
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage, ImageError, ImageFormat, RgbImage};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::utils::measure_time;

pub const JPEG_QUALITY: u8 = 95;
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("{} is not a decodable WebP image: {source}", .path.display())]
    Decode { path: PathBuf, source: ImageError },
    #[error("failed to create {}: {source}", .path.display())]
    Create { path: PathBuf, source: io::Error },
    #[error("failed to encode {}: {source}", .path.display())]
    Encode { path: PathBuf, source: ImageError },
    #[error("failed to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("failed to delete original {}: {source}", .path.display())]
    Remove { path: PathBuf, source: io::Error },
}

#[derive(Debug)]
pub enum FileOutcome {
    Converted(PathBuf),
    Failed(ConvertError),
    Skipped,
}

/// Aggregate counts for one dropped batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConversionResult {
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl ConversionResult {
    pub fn record(&mut self, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Converted(_) => self.successful += 1,
            FileOutcome::Failed(_) => self.failed += 1,
            FileOutcome::Skipped => self.skipped += 1,
        }
    }

    pub fn summary_message(&self) -> String {
        format!(
            "Conversion complete!\nSuccessful: {}\nFailed: {}",
            self.successful, self.failed
        )
    }
}

/// Converts every `.webp` path in `input_files`, in order, into `output_directory`.
///
/// A failing file is logged and counted; it never stops the rest of the batch.
pub fn process(input_files: &[PathBuf], output_directory: &Path) -> ConversionResult {
    info!(
        "Processing batch of {} file(s) into {}",
        input_files.len(),
        output_directory.display()
    );

    let mut result = ConversionResult::default();
    for input_path in input_files {
        let outcome = process_file(input_path, output_directory);
        match &outcome {
            FileOutcome::Converted(output_path) => {
                info!("Converted {} -> {}", input_path.display(), output_path.display())
            }
            FileOutcome::Failed(e) => error!("Error processing {}: {e}", input_path.display()),
            FileOutcome::Skipped => debug!("Skipping non-WebP file {}", input_path.display()),
        }
        result.record(&outcome);
    }

    info!(
        "Batch finished: {} successful, {} failed, {} skipped",
        result.successful, result.failed, result.skipped
    );
    result
}

pub fn process_file(input_path: &Path, output_directory: &Path) -> FileOutcome {
    if !is_webp(input_path) {
        return FileOutcome::Skipped;
    }
    let stamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
    match convert_file(input_path, output_directory, &stamp) {
        Ok(output_path) => FileOutcome::Converted(output_path),
        Err(e) => FileOutcome::Failed(e),
    }
}

/// Case-insensitive `.webp` suffix on the whole path, so a bare `.webp` counts too.
pub fn is_webp(path: &Path) -> bool {
    path.to_string_lossy().to_ascii_lowercase().ends_with(".webp")
}

/// `<stem>_<stamp>.jpg`. Two inputs with the same stem and stamp map to the same name,
/// and the later write replaces the earlier file.
pub fn output_file_name(input_path: &Path, stamp: &str) -> String {
    let stem = input_path.file_stem().unwrap_or_default().to_string_lossy();
    format!("{stem}_{stamp}.jpg")
}

/// Decodes `input_path`, writes it as an RGB JPEG and deletes the original.
pub fn convert_file(
    input_path: &Path,
    output_directory: &Path,
    stamp: &str,
) -> Result<PathBuf, ConvertError> {
    let (img, load_duration) = measure_time(|| load_webp(input_path));
    debug!("Loading {} took {:?}", input_path.display(), load_duration);

    // Alpha is dropped, not composited.
    let rgb = img?.to_rgb8();

    let output_path = output_directory.join(output_file_name(input_path, stamp));
    let (saved, save_duration) = measure_time(|| save_jpeg(&rgb, &output_path));
    debug!("Saving {} took {:?}", output_path.display(), save_duration);
    saved?;

    fs::remove_file(input_path).map_err(|source| ConvertError::Remove {
        path: input_path.to_path_buf(),
        source,
    })?;
    Ok(output_path)
}

fn load_webp(path: &Path) -> Result<DynamicImage, ConvertError> {
    let data = fs::read(path).map_err(|source| ConvertError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    // libwebp refuses animations; `image` decodes their first frame.
    if let Some(webp) = webp::Decoder::new(&data).decode() {
        return Ok(webp.to_image());
    }
    image::load_from_memory_with_format(&data, ImageFormat::WebP).map_err(|source| {
        ConvertError::Decode {
            path: path.to_path_buf(),
            source,
        }
    })
}

fn save_jpeg(img: &RgbImage, output_path: &Path) -> Result<(), ConvertError> {
    let file = File::create(output_path).map_err(|source| ConvertError::Create {
        path: output_path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY)
        .encode(img.as_raw(), img.width(), img.height(), ColorType::Rgb8)
        .map_err(|source| ConvertError::Encode {
            path: output_path.to_path_buf(),
            source,
        })?;
    writer.flush().map_err(|source| ConvertError::Write {
        path: output_path.to_path_buf(),
        source,
    })
}
