//! Lazy alpha masks over RGBA images.
//!
//! Both masks borrow their source and decide per pixel access whether to pass
//! the source pixel through or report it fully transparent. Nothing is copied
//! until a caller asks for an owned buffer with [`materialize`].

use image::{GenericImageView, ImageBuffer, Rgba, RgbaImage};

pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Square window of a source image clipped to its inscribed circle.
pub struct CircleMask<'a, I> {
    source: &'a I,
    offset: (u32, u32),
    diameter: u32,
}

impl<'a, I> CircleMask<'a, I>
where
    I: GenericImageView<Pixel = Rgba<u8>>,
{
    /// Views the `diameter`-sized square whose top-left corner is `offset` in `source`.
    pub fn new(source: &'a I, offset: (u32, u32), diameter: u32) -> Self {
        Self {
            source,
            offset,
            diameter,
        }
    }

    /// The largest circle that fits the source, anchored at its top-left corner.
    pub fn inscribed(source: &'a I) -> Self {
        let (w, h) = source.dimensions();
        Self::new(source, (0, 0), w.min(h))
    }

    fn inside(&self, x: u32, y: u32) -> bool {
        let d = self.diameter as i64;
        let dx = (x as i64 - d / 2) as f64;
        let dy = (y as i64 - d / 2) as f64;
        // Pixels on the boundary circle are kept.
        (dx * dx + dy * dy).sqrt() <= d as f64 / 2.0
    }
}

impl<I> GenericImageView for CircleMask<'_, I>
where
    I: GenericImageView<Pixel = Rgba<u8>>,
{
    type Pixel = Rgba<u8>;

    fn dimensions(&self) -> (u32, u32) {
        (self.diameter, self.diameter)
    }

    fn bounds(&self) -> (u32, u32, u32, u32) {
        (0, 0, self.diameter, self.diameter)
    }

    fn get_pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        if !self.inside(x, y) {
            return TRANSPARENT;
        }

        let (w, h) = self.source.dimensions();
        match (self.offset.0.checked_add(x), self.offset.1.checked_add(y)) {
            (Some(sx), Some(sy)) if sx < w && sy < h => self.source.get_pixel(sx, sy),
            _ => TRANSPARENT,
        }
    }
}

/// Source image with its four corners rounded off to `radius`.
pub struct RoundMask<'a, I> {
    source: &'a I,
    radius: u32,
}

impl<'a, I> RoundMask<'a, I>
where
    I: GenericImageView<Pixel = Rgba<u8>>,
{
    pub fn new(source: &'a I, radius: u32) -> Self {
        Self { source, radius }
    }

    fn clipped(&self, x: u32, y: u32) -> bool {
        let (w, h) = self.source.dimensions();
        let (w, h, r) = (w as i64, h as i64, self.radius as i64);
        let (x, y) = (x as i64, y as i64);

        let outside = |cx: i64, cy: i64| (cx - x) * (cx - x) + (cy - y) * (cy - y) > r * r;

        // Each test is confined to its own corner cell, so at most one can match.
        (x <= r && y <= r && outside(r, r))
            || (x > w - r && y <= r && outside(w - r, r))
            || (x <= r && y > h - r && outside(r, h - r))
            || (x > w - r && y > h - r && outside(w - r, h - r))
    }
}

impl<I> GenericImageView for RoundMask<'_, I>
where
    I: GenericImageView<Pixel = Rgba<u8>>,
{
    type Pixel = Rgba<u8>;

    fn dimensions(&self) -> (u32, u32) {
        self.source.dimensions()
    }

    fn bounds(&self) -> (u32, u32, u32, u32) {
        let (w, h) = self.source.dimensions();
        (0, 0, w, h)
    }

    fn get_pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        if self.clipped(x, y) {
            TRANSPARENT
        } else {
            self.source.get_pixel(x, y)
        }
    }
}

/// Copies any RGBA view into an owned buffer.
pub fn materialize<V>(view: &V) -> RgbaImage
where
    V: GenericImageView<Pixel = Rgba<u8>>,
{
    let (w, h) = view.dimensions();
    ImageBuffer::from_fn(w, h, |x, y| view.get_pixel(x, y))
}
