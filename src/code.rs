use std::io::Write;
use std::path::Path;

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ColorType, ImageEncoder, Rgba, RgbaImage};
use log::debug;

use crate::error::Result;
use crate::mask::{materialize, RoundMask};
use crate::overlay::{Avatar, BackgroundImage, ForegroundImage, Overlay};
use crate::qr::{Palette, RecoveryLevel, Symbol};

/// Everything that shapes the final image apart from the encoded content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Style {
    /// Corner radius of the final image in pixels.
    pub round: u32,
    pub avatar: Option<Avatar>,
    pub foreground_image: Option<ForegroundImage>,
    pub background_image: Option<BackgroundImage>,
    pub palette: Palette,
    /// Draw the quiet zone around the symbol.
    pub border: bool,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            round: 0,
            avatar: None,
            foreground_image: None,
            background_image: None,
            palette: Palette::default(),
            border: true,
        }
    }
}

impl Style {
    pub fn with_round(mut self, round: u32) -> Self {
        self.round = round;
        self
    }

    pub fn with_avatar(mut self, avatar: Avatar) -> Self {
        self.avatar = Some(avatar);
        self
    }

    pub fn with_foreground_image(mut self, img: ForegroundImage) -> Self {
        self.foreground_image = Some(img);
        self
    }

    pub fn with_background_image(mut self, img: BackgroundImage) -> Self {
        self.background_image = Some(img);
        self
    }

    pub fn with_foreground_color(mut self, color: Rgba<u8>) -> Self {
        self.palette.foreground = color;
        self
    }

    pub fn with_background_color(mut self, color: Rgba<u8>) -> Self {
        self.palette.background = color;
        self
    }

    pub fn with_border(mut self, border: bool) -> Self {
        self.border = border;
        self
    }
}

/// Renders `symbol` at `size` pixels and decorates it according to `style`.
///
/// Stages run in a fixed order: foreground fill, avatar, background, then the
/// rounded corners of the whole image. The first failing stage aborts the render.
pub fn render(symbol: &Symbol, style: &Style, size: u32) -> Result<RgbaImage> {
    let mut img = symbol.render(size, &style.palette, style.border);
    debug!("Rendered {}x{} base bitmap", img.width(), img.height());

    let stages: [(&str, Option<&dyn Overlay>); 3] = [
        ("foreground", style.foreground_image.as_ref().map(|o| o as &dyn Overlay)),
        ("avatar", style.avatar.as_ref().map(|o| o as &dyn Overlay)),
        ("background", style.background_image.as_ref().map(|o| o as &dyn Overlay)),
    ];
    for (name, overlay) in stages {
        if let Some(overlay) = overlay {
            img = overlay.apply(&img, &style.palette)?;
            debug!("Applied {name} overlay, now {}x{}", img.width(), img.height());
        }
    }

    Ok(materialize(&RoundMask::new(&img, style.round)))
}

/// PNG-encodes `img` with maximum compression.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    PngEncoder::new_with_quality(&mut bytes, CompressionType::Best, FilterType::Adaptive)
        .write_image(img.as_raw(), img.width(), img.height(), ColorType::Rgba8)?;
    Ok(bytes)
}

/// A QR code together with its decoration settings.
///
/// ```no_run
/// use image::Rgba;
/// use qr_decor::{Avatar, QrCode, RecoveryLevel};
///
/// let mut qr = QrCode::new("https://example.com", RecoveryLevel::Medium)?;
/// qr.set_round(20);
/// qr.set_foreground_color(Rgba([210, 10, 10, 128]));
/// qr.set_avatar(Avatar::new("avatar.jpg", 60, 60, 8));
/// qr.write_file(256, "out.png")?;
/// # Ok::<(), qr_decor::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct QrCode {
    symbol: Symbol,
    style: Style,
}

impl QrCode {
    pub fn new(content: &str, level: RecoveryLevel) -> Result<Self> {
        Ok(Self {
            symbol: Symbol::new(content, level)?,
            style: Style::default(),
        })
    }

    pub fn with_style(content: &str, level: RecoveryLevel, style: Style) -> Result<Self> {
        Ok(Self {
            symbol: Symbol::new(content, level)?,
            style,
        })
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn style(&self) -> &Style {
        &self.style
    }

    pub fn set_round(&mut self, round: u32) {
        self.style.round = round;
    }

    pub fn set_avatar(&mut self, avatar: Avatar) {
        self.style.avatar = Some(avatar);
    }

    pub fn set_background_image(&mut self, img: BackgroundImage) {
        self.style.background_image = Some(img);
    }

    pub fn set_background_color(&mut self, color: Rgba<u8>) {
        self.style.palette.background = color;
    }

    pub fn set_foreground_image(&mut self, img: ForegroundImage) {
        self.style.foreground_image = Some(img);
    }

    pub fn set_foreground_color(&mut self, color: Rgba<u8>) {
        self.style.palette.foreground = color;
    }

    pub fn disable_border(&mut self, disable: bool) {
        self.style.border = !disable;
    }

    /// The decorated image, `size` pixels square before any background overlay.
    pub fn image(&self, size: u32) -> Result<RgbaImage> {
        render(&self.symbol, &self.style, size)
    }

    /// The decorated image as PNG bytes.
    pub fn bytes(&self, size: u32) -> Result<Vec<u8>> {
        encode_png(&self.image(size)?)
    }

    pub fn write<W: Write>(&self, size: u32, mut out: W) -> Result<()> {
        let bytes = self.bytes(size)?;
        out.write_all(&bytes)?;
        Ok(())
    }

    /// Writes the PNG to `path`. Nothing is created if rendering fails.
    pub fn write_file(&self, size: u32, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.bytes(size)?;
        std::fs::write(path.as_ref(), bytes)?;
        debug!("Wrote {}", path.as_ref().display());
        Ok(())
    }
}
