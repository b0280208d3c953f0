//! Image overlays applied on top of the rendered QR bitmap.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::io::Reader as ImageReader;
use image::{DynamicImage, GenericImageView, ImageError, Rgba, RgbaImage};
use log::{debug, trace};

use crate::error::{Error, Result};
use crate::mask::RoundMask;
use crate::qr::Palette;

/// A decoration that turns one image into the next stage of the pipeline.
pub trait Overlay {
    fn apply(&self, base: &RgbaImage, palette: &Palette) -> Result<RgbaImage>;
}

/// Picture drawn in the middle of the code with rounded corners.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Avatar {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Corner radius in pixels; half the width gives a circle.
    pub round: u32,
}

impl Avatar {
    pub fn new(path: impl Into<PathBuf>, width: u32, height: u32, round: u32) -> Self {
        Self {
            path: path.into(),
            width,
            height,
            round,
        }
    }
}

impl Overlay for Avatar {
    fn apply(&self, base: &RgbaImage, _palette: &Palette) -> Result<RgbaImage> {
        let avatar = open_rgba("avatar", &self.path)?;
        let avatar = resize(&avatar, self.width, self.height);
        let avatar = RoundMask::new(&avatar, self.round);

        // Centred; negative when the avatar is larger than the base.
        let x = (base.width() as i64 - avatar.width() as i64) / 2;
        let y = (base.height() as i64 - avatar.height() as i64) / 2;
        debug!("Drawing {}x{} avatar at ({x}, {y})", avatar.width(), avatar.height());

        let mut out = base.clone();
        imageops::overlay(&mut out, &avatar, x, y);
        Ok(out)
    }
}

/// Picture the QR code is placed onto.
///
/// The QR image is resized to `width`x`height` and drawn at (`x`, `y`); the
/// result takes the background's dimensions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackgroundImage {
    pub path: PathBuf,
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl BackgroundImage {
    pub fn new(path: impl Into<PathBuf>, x: i64, y: i64, width: u32, height: u32) -> Self {
        Self {
            path: path.into(),
            x,
            y,
            width,
            height,
        }
    }
}

impl Overlay for BackgroundImage {
    fn apply(&self, base: &RgbaImage, _palette: &Palette) -> Result<RgbaImage> {
        let mut out = open_rgba("background", &self.path)?;
        let code = resize(base, self.width, self.height);

        debug!(
            "Placing {}x{} code on {}x{} background at ({}, {})",
            code.width(),
            code.height(),
            out.width(),
            out.height(),
            self.x,
            self.y
        );
        imageops::overlay(&mut out, &code, self.x, self.y);
        Ok(out)
    }
}

/// Picture sampled into the dark modules in place of a flat colour.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForegroundImage {
    pub path: PathBuf,
}

impl ForegroundImage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Overlay for ForegroundImage {
    fn apply(&self, base: &RgbaImage, palette: &Palette) -> Result<RgbaImage> {
        let fill = open_rgba("foreground", &self.path)?;
        let (width, height) = base.dimensions();

        // Stretched, not cropped.
        let fill = if fill.dimensions() != (width, height) {
            resize(&fill, width, height)
        } else {
            fill
        };

        Ok(recolor(base, &fill, palette.background))
    }
}

const OPAQUE_WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Replaces every pixel that is neither opaque white nor `background` with the
/// pixel of `fill` at the same position. Pixels beyond the fill are left as they are.
pub(crate) fn recolor(base: &RgbaImage, fill: &RgbaImage, background: Rgba<u8>) -> RgbaImage {
    let mut out = base.clone();
    let mut changed = 0usize;

    for (x, y, pixel) in out.enumerate_pixels_mut() {
        if *pixel == OPAQUE_WHITE || *pixel == background {
            continue;
        }
        if let Some(sample) = fill.get_pixel_checked(x, y) {
            *pixel = *sample;
            changed += 1;
        }
    }

    debug!("Recoloured {changed} foreground pixels");
    out
}

fn resize(img: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    trace!("Resizing {}x{} to {width}x{height}", img.width(), img.height());
    imageops::resize(img, width, height, FilterType::Lanczos3)
}

/// Opens and decodes an image file, guessing the format from its contents.
/// The file handle is released before returning, on success or failure.
fn open_rgba(stage: &'static str, path: &Path) -> Result<RgbaImage> {
    let file = File::open(path).map_err(|source| Error::FileOpen {
        stage,
        path: path.to_path_buf(),
        source,
    })?;

    let decode_err = |source: ImageError| Error::Decode {
        stage,
        path: path.to_path_buf(),
        source,
    };
    let decoded: DynamicImage = ImageReader::new(BufReader::new(file))
        .with_guessed_format()
        .map_err(|source| Error::FileOpen {
            stage,
            path: path.to_path_buf(),
            source,
        })?
        .decode()
        .map_err(decode_err)?;

    debug!(
        "Loaded {stage} image {} ({}x{})",
        path.display(),
        decoded.width(),
        decoded.height()
    );
    Ok(decoded.to_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::TRANSPARENT;
    use image::ImageBuffer;
    use tempfile::tempdir;

    fn save(dir: &Path, name: &str, img: &RgbaImage) -> PathBuf {
        let path = dir.join(name);
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn avatar_half_alpha_blends_with_base() {
        let dir = tempdir().unwrap();
        let path = save(
            dir.path(),
            "ghost.png",
            &RgbaImage::from_pixel(4, 4, Rgba([0, 0, 255, 128])),
        );

        let base = RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255]));
        let out = Avatar::new(&path, 4, 4, 0)
            .apply(&base, &Palette::default())
            .unwrap();

        let p = out.get_pixel(5, 5);
        assert_eq!(p[3], 255);
        assert!(p[0] > 100 && p[0] < 150, "{p:?}");
        assert!(p[2] > 100 && p[2] < 150, "{p:?}");
        assert_eq!(out.get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn background_clips_negative_offsets() {
        let dir = tempdir().unwrap();
        let path = save(
            dir.path(),
            "small.png",
            &RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255])),
        );

        let code = RgbaImage::from_pixel(6, 6, Rgba([9, 9, 9, 255]));
        let out = BackgroundImage::new(&path, -1, -1, 6, 6)
            .apply(&code, &Palette::default())
            .unwrap();

        assert_eq!(out.dimensions(), (4, 4));
        assert!(out.pixels().all(|p| *p == Rgba([9, 9, 9, 255])));
    }

    #[test]
    fn avatar_is_centred_with_round_corners() {
        let dir = tempdir().unwrap();
        let path = save(
            dir.path(),
            "avatar.png",
            &RgbaImage::from_pixel(30, 30, Rgba([0, 200, 0, 255])),
        );

        let base = RgbaImage::from_pixel(101, 80, Rgba([255, 255, 255, 255]));
        let out = Avatar::new(&path, 20, 20, 5)
            .apply(&base, &Palette::default())
            .unwrap();

        assert_eq!(out.dimensions(), (101, 80));
        // Top-left at ((101 - 20) / 2, (80 - 20) / 2) = (40, 30).
        assert_eq!(out.get_pixel(50, 40), &Rgba([0, 200, 0, 255]));
        assert_eq!(out.get_pixel(40, 35), &Rgba([0, 200, 0, 255]));
        assert_eq!(out.get_pixel(59, 49 - 5), &Rgba([0, 200, 0, 255]));
        assert_eq!(out.get_pixel(39, 35), &Rgba([255, 255, 255, 255]));
        assert_eq!(out.get_pixel(60, 35), &Rgba([255, 255, 255, 255]));
        // Rounded-off corner lets the base show through.
        assert_eq!(out.get_pixel(40, 30), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn avatar_larger_than_base_is_clipped() {
        let dir = tempdir().unwrap();
        let path = save(
            dir.path(),
            "big.png",
            &RgbaImage::from_pixel(8, 8, Rgba([1, 2, 3, 255])),
        );

        let base = RgbaImage::from_pixel(10, 10, Rgba([255, 255, 255, 255]));
        let out = Avatar::new(&path, 20, 20, 0)
            .apply(&base, &Palette::default())
            .unwrap();
        assert_eq!(out.dimensions(), (10, 10));
        assert!(out.pixels().all(|p| *p == Rgba([1, 2, 3, 255])));
    }

    #[test]
    fn avatar_missing_file() {
        let dir = tempdir().unwrap();
        let err = Avatar::new(dir.path().join("nope.png"), 10, 10, 0)
            .apply(&RgbaImage::new(20, 20), &Palette::default())
            .unwrap_err();
        assert!(matches!(err, Error::FileOpen { stage: "avatar", .. }), "{err}");
    }

    #[test]
    fn avatar_undecodable_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("garbage.png");
        std::fs::write(&path, b"definitely not an image").unwrap();

        let err = Avatar::new(&path, 10, 10, 0)
            .apply(&RgbaImage::new(20, 20), &Palette::default())
            .unwrap_err();
        assert!(matches!(err, Error::Decode { stage: "avatar", .. }), "{err}");
    }

    #[test]
    fn unreadable_file_is_open_error() {
        let dir = tempdir().unwrap();
        // A directory opens fine but cannot be read.
        let err = Avatar::new(dir.path(), 10, 10, 0)
            .apply(&RgbaImage::new(20, 20), &Palette::default())
            .unwrap_err();
        assert!(matches!(err, Error::FileOpen { stage: "avatar", .. }), "{err}");
    }

    #[test]
    fn background_frames_resized_code() {
        let dir = tempdir().unwrap();
        let path = save(
            dir.path(),
            "bg.png",
            &RgbaImage::from_pixel(120, 100, Rgba([10, 20, 30, 255])),
        );

        let code = RgbaImage::from_pixel(50, 50, Rgba([0, 0, 0, 255]));
        let out = BackgroundImage::new(&path, 10, 20, 80, 60)
            .apply(&code, &Palette::default())
            .unwrap();

        assert_eq!(out.dimensions(), (120, 100));
        assert_eq!(out.get_pixel(5, 5), &Rgba([10, 20, 30, 255]));
        assert_eq!(out.get_pixel(50, 50), &Rgba([0, 0, 0, 255]));
        assert_eq!(out.get_pixel(89, 79), &Rgba([0, 0, 0, 255]));
        assert_eq!(out.get_pixel(90, 50), &Rgba([10, 20, 30, 255]));
        assert_eq!(out.get_pixel(50, 80), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn background_missing_file() {
        let err = BackgroundImage::new("/nonexistent/bg.png", 0, 0, 10, 10)
            .apply(&RgbaImage::new(10, 10), &Palette::default())
            .unwrap_err();
        assert!(matches!(err, Error::FileOpen { stage: "background", .. }));
    }

    #[test]
    fn recolor_skips_white_and_background() {
        let background = Rgba([46, 216, 123, 255]);
        let mut base = RgbaImage::from_pixel(4, 3, Rgba([0, 0, 0, 255]));
        base.put_pixel(0, 0, OPAQUE_WHITE);
        base.put_pixel(1, 0, background);
        base.put_pixel(2, 0, Rgba([255, 255, 255, 254]));
        let fill = ImageBuffer::from_fn(4, 3, |x, y| Rgba([x as u8 * 10, y as u8 * 10, 7, 99]));

        let out = recolor(&base, &fill, background);

        assert_eq!(out.get_pixel(0, 0), &OPAQUE_WHITE);
        assert_eq!(out.get_pixel(1, 0), &background);
        // Only exact opaque white counts as white.
        assert_eq!(out.get_pixel(2, 0), fill.get_pixel(2, 0));
        for (x, y) in [(3, 0), (0, 1), (3, 2), (0, 2)] {
            assert_eq!(out.get_pixel(x, y), fill.get_pixel(x, y));
        }
    }

    // The scan covers every row of a non-square image, including rows past the width.
    #[test]
    fn recolor_scans_full_height_of_tall_image() {
        let base = RgbaImage::from_pixel(3, 9, Rgba([0, 0, 0, 255]));
        let fill = RgbaImage::from_pixel(3, 9, Rgba([5, 6, 7, 8]));
        let out = recolor(&base, &fill, Palette::default().background);
        assert!(out.pixels().all(|p| *p == Rgba([5, 6, 7, 8])));
    }

    #[test]
    fn recolor_leaves_pixels_beyond_small_fill() {
        let base = RgbaImage::from_pixel(6, 6, Rgba([0, 0, 0, 255]));
        let fill = RgbaImage::from_pixel(3, 2, Rgba([5, 6, 7, 8]));
        let out = recolor(&base, &fill, Palette::default().background);

        assert_eq!(out.get_pixel(2, 1), &Rgba([5, 6, 7, 8]));
        assert_eq!(out.get_pixel(3, 1), &Rgba([0, 0, 0, 255]));
        assert_eq!(out.get_pixel(0, 2), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn foreground_image_stretches_fill() {
        let dir = tempdir().unwrap();
        let path = save(
            dir.path(),
            "fill.png",
            &RgbaImage::from_pixel(7, 5, Rgba([200, 50, 50, 255])),
        );

        let mut base = RgbaImage::from_pixel(16, 16, Rgba([0, 0, 0, 255]));
        base.put_pixel(3, 3, OPAQUE_WHITE);
        let out = ForegroundImage::new(&path)
            .apply(&base, &Palette::default())
            .unwrap();

        assert_eq!(out.dimensions(), (16, 16));
        assert_eq!(out.get_pixel(3, 3), &OPAQUE_WHITE);
        assert_eq!(out.get_pixel(8, 8), &Rgba([200, 50, 50, 255]));
        assert_eq!(out.get_pixel(15, 15), &Rgba([200, 50, 50, 255]));
    }

    #[test]
    fn foreground_missing_file() {
        let err = ForegroundImage::new("/nonexistent/fill.png")
            .apply(&RgbaImage::new(4, 4), &Palette::default())
            .unwrap_err();
        assert!(matches!(err, Error::FileOpen { stage: "foreground", .. }));
    }
}
