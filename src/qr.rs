//! QR code generation
//!
//! Renders a payload (URL or free text) as a high-redundancy PNG.

use crate::error::{Service, VoiceError, VoiceResult};
use image::Luma;
use qrcode::{EcLevel, QrCode};
use std::path::{Path, PathBuf};
use tracing::info;

/// Pixel size of one QR module
const MODULE_PIXELS: u32 = 20;

/// QR collaborator
pub trait QrGenerator: Send + Sync {
    /// Render `payload` into a new image under `destination_dir`, returning its path
    fn generate(&self, payload: &str, destination_dir: &Path) -> VoiceResult<PathBuf>;
}

/// PNG renderer backed by the `qrcode` crate
#[derive(Debug, Default, Clone)]
pub struct QrCodeImage;

impl QrCodeImage {
    pub fn new() -> Self {
        Self
    }
}

impl QrGenerator for QrCodeImage {
    fn generate(&self, payload: &str, destination_dir: &Path) -> VoiceResult<PathBuf> {
        if payload.trim().is_empty() {
            return Err(qr_error("payload is empty"));
        }

        let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::H)
            .map_err(qr_error)?;
        let image = code
            .render::<Luma<u8>>()
            .module_dimensions(MODULE_PIXELS, MODULE_PIXELS)
            .dark_color(Luma([0u8]))
            .light_color(Luma([255u8]))
            .build();

        std::fs::create_dir_all(destination_dir).map_err(qr_error)?;
        let path = destination_dir.join(format!(
            "qrcode_{}.png",
            chrono::Local::now().format("%Y%m%d_%H%M%S_%3f")
        ));
        image.save(&path).map_err(qr_error)?;

        info!("🔳 QR code saved to {}", path.display());
        Ok(path)
    }
}

fn qr_error(cause: impl std::fmt::Display) -> VoiceError {
    VoiceError::service(Service::QrCode, cause)
}
