//! QR artifact rendering collaborator.
//!
//! The link service only needs "render this text to a scannable image" and an
//! opaque reference to store alongside the link. The shipped implementation
//! renders an SVG and packs it into a data URL, so the artifact travels with
//! the row like any other column.

use anyhow::{anyhow, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use qrcode::render::svg;
use qrcode::{EcLevel, QrCode};

pub trait QrRenderer: Send + Sync {
    /// Render `text` to a scannable image and return an opaque reference.
    fn render(&self, text: &str) -> Result<String>;
}

/// SVG renderer returning a `data:image/svg+xml;base64,...` URL.
pub struct SvgQrRenderer {
    min_dimension: u32,
}

impl SvgQrRenderer {
    pub fn new(min_dimension: u32) -> Self {
        Self { min_dimension }
    }
}

impl Default for SvgQrRenderer {
    fn default() -> Self {
        Self::new(256)
    }
}

impl QrRenderer for SvgQrRenderer {
    fn render(&self, text: &str) -> Result<String> {
        let code = QrCode::with_error_correction_level(text.as_bytes(), EcLevel::M)
            .map_err(|e| anyhow!("QR encoding failed: {e}"))?;

        let image = code
            .render::<svg::Color>()
            .min_dimensions(self.min_dimension, self.min_dimension)
            .build();

        Ok(format!(
            "data:image/svg+xml;base64,{}",
            BASE64.encode(image.as_bytes())
        ))
    }
}
