use clap::{Parser, ValueEnum};
use image::Rgba;
use qr_decor::RecoveryLevel;
use std::path::PathBuf;

#[derive(ValueEnum, Clone, Debug)]
#[clap(rename_all = "UPPER")]
pub enum EcArg {
    L,
    M,
    Q,
    H,
}

impl From<EcArg> for RecoveryLevel {
    fn from(v: EcArg) -> Self {
        match v {
            EcArg::L => RecoveryLevel::Low,
            EcArg::M => RecoveryLevel::Medium,
            EcArg::Q => RecoveryLevel::High,
            EcArg::H => RecoveryLevel::Highest,
        }
    }
}

/// Parses `RRGGBB` or `RRGGBBAA`, with or without a leading `#`.
pub fn parse_hex_color(hex: &str) -> Result<Rgba<u8>, String> {
    let hex = hex.trim_start_matches('#');
    if (hex.len() != 6 && hex.len() != 8) || !hex.is_ascii() {
        return Err(format!("Invalid hex color: #{}", hex));
    }

    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| e.to_string());
    let a = if hex.len() == 8 { channel(6)? } else { 255 };
    Ok(Rgba([channel(0)?, channel(2)?, channel(4)?, a]))
}

#[derive(Parser)]
#[command(name = "qr-decor")]
#[command(about = "Generate QR codes decorated with an avatar, image fill, background image and rounded corners")]
pub struct Args {
    /// Text to encode in the QR code
    #[arg(short, long)]
    pub text: String,

    /// Output PNG path
    #[arg(short, long)]
    pub output: PathBuf,

    /// Size of the QR bitmap in pixels (default: 256)
    #[arg(short, long, default_value = "256")]
    pub size: u32,

    /// Corner radius of the final image (default: 0)
    #[arg(short, long, default_value = "0")]
    pub round: u32,

    /// QR code error correction level (L, M, Q, H)
    #[arg(short = 'e', long, default_value = "M")]
    pub error_correction: EcArg,

    /// Dark module colour as RRGGBB or RRGGBBAA
    #[arg(long, value_parser = parse_hex_color)]
    pub foreground_color: Option<Rgba<u8>>,

    /// Light module colour as RRGGBB or RRGGBBAA
    #[arg(long, value_parser = parse_hex_color)]
    pub background_color: Option<Rgba<u8>>,

    /// Leave out the quiet zone around the symbol
    #[arg(long)]
    pub no_border: bool,

    /// Image drawn in the centre of the code
    #[arg(short, long)]
    pub avatar: Option<PathBuf>,

    /// Avatar width and height in pixels (default: 60)
    #[arg(long, default_value = "60")]
    pub avatar_size: u32,

    /// Avatar corner radius (default: 8)
    #[arg(long, default_value = "8")]
    pub avatar_round: u32,

    /// Image sampled into the dark modules
    #[arg(short, long)]
    pub fill: Option<PathBuf>,

    /// Image the code is placed onto
    #[arg(short, long)]
    pub background: Option<PathBuf>,

    /// Horizontal offset of the code on the background
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub background_x: i64,

    /// Vertical offset of the code on the background
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub background_y: i64,

    /// Size the code is scaled to on the background (default: --size)
    #[arg(long)]
    pub background_code_size: Option<u32>,
}
