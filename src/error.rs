use std::io;
use std::path::PathBuf;

use qrcode::types::QrError;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while building or writing a decorated QR code.
///
/// `stage` names the overlay that failed ("avatar", "background", "foreground").
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to open {stage} file {}: {source}", path.display())]
    FileOpen {
        stage: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to decode {stage} image {}: {source}", path.display())]
    Decode {
        stage: &'static str,
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to encode QR content: {0}")]
    Encoding(#[from] QrError),

    #[error("failed to encode PNG output: {0}")]
    Raster(#[from] image::ImageError),

    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}
