use image::{ImageBuffer, Rgba, RgbaImage};
use log::debug;
use ndarray::Array2;
use qrcode::{EcLevel, QrCode};

use crate::error::Result;

/// Modules of light margin drawn around the symbol unless the border is disabled.
pub const QUIET_ZONE: usize = 4;

/// QR error correction strength.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RecoveryLevel {
    /// Level L: 7% error recovery.
    Low,
    /// Level M: 15% error recovery. Good default choice.
    #[default]
    Medium,
    /// Level Q: 25% error recovery.
    High,
    /// Level H: 30% error recovery.
    Highest,
}

impl From<RecoveryLevel> for EcLevel {
    fn from(v: RecoveryLevel) -> Self {
        match v {
            RecoveryLevel::Low => EcLevel::L,
            RecoveryLevel::Medium => EcLevel::M,
            RecoveryLevel::High => EcLevel::Q,
            RecoveryLevel::Highest => EcLevel::H,
        }
    }
}

/// Colours used for dark and light modules.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    pub foreground: Rgba<u8>,
    pub background: Rgba<u8>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            foreground: Rgba([0, 0, 0, 255]),
            background: Rgba([255, 255, 255, 255]),
        }
    }
}

/// An encoded QR symbol. Immutable once built.
#[derive(Clone, Debug)]
pub struct Symbol {
    modules: Array2<bool>,
}

impl Symbol {
    pub fn new(content: &str, level: RecoveryLevel) -> Result<Self> {
        let code = QrCode::with_error_correction_level(content, level.into())?;

        let colors = code.to_colors();
        let width = code.width();
        let modules = Array2::from_shape_fn((width, width), |(y, x)| {
            matches!(colors[y * width + x], qrcode::Color::Dark)
        });

        debug!("Encoded {} bytes at {:?} into {}x{} modules", content.len(), level, width, width);
        Ok(Self { modules })
    }

    /// Module count along one side, quiet zone excluded.
    pub fn width(&self) -> usize {
        self.modules.nrows()
    }

    /// Module grid indexed `[[y, x]]`, `true` for dark modules.
    pub fn bitmap(&self, border: bool) -> Array2<bool> {
        if !border {
            return self.modules.clone();
        }

        let width = self.width();
        let side = width + 2 * QUIET_ZONE;
        Array2::from_shape_fn((side, side), |(y, x)| {
            let inside = (QUIET_ZONE..QUIET_ZONE + width).contains(&x)
                && (QUIET_ZONE..QUIET_ZONE + width).contains(&y);
            inside && self.modules[[y - QUIET_ZONE, x - QUIET_ZONE]]
        })
    }

    /// Renders a square bitmap of `size` pixels, or of one pixel per module if
    /// `size` is smaller than the module count.
    pub fn render(&self, size: u32, palette: &Palette, border: bool) -> RgbaImage {
        let bitmap = self.bitmap(border);
        let modules = bitmap.nrows();
        let size = size.max(modules as u32);
        let modules_per_pixel = modules as f64 / size as f64;

        ImageBuffer::from_fn(size, size, |x, y| {
            // Nearest-neighbour sampling of the module grid.
            let mx = ((x as f64 * modules_per_pixel) as usize).min(modules - 1);
            let my = ((y as f64 * modules_per_pixel) as usize).min(modules - 1);
            if bitmap[[my, mx]] {
                palette.foreground
            } else {
                palette.background
            }
        })
    }
}
