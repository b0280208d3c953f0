//! Decorated QR codes.
//!
//! A [`QrCode`] renders its symbol as a square RGBA bitmap and then layers
//! cosmetic overlays on top: an image fill for the dark modules
//! ([`ForegroundImage`]), a centred picture with rounded corners ([`Avatar`]),
//! a picture to place the code onto ([`BackgroundImage`]) and finally rounded
//! corners for the whole image. The masking is done with lazy views
//! ([`CircleMask`], [`RoundMask`]) that never copy their source.

mod code;
mod error;
mod mask;
mod overlay;
mod qr;

pub use code::{encode_png, render, QrCode, Style};
pub use error::{Error, Result};
pub use mask::{materialize, CircleMask, RoundMask, TRANSPARENT};
pub use overlay::{Avatar, BackgroundImage, ForegroundImage, Overlay};
pub use qr::{Palette, RecoveryLevel, Symbol, QUIET_ZONE};
