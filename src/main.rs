mod args;

use anyhow::{Context, Result};
use args::Args;
use clap::Parser;
use qr_decor::{Avatar, BackgroundImage, ForegroundImage, QrCode};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    println!("Generating QR code for: {}", args.text);
    let mut qr = QrCode::new(&args.text, args.error_correction.into())
        .context("Failed to generate QR code")?;

    qr.set_round(args.round);
    qr.disable_border(args.no_border);
    if let Some(color) = args.foreground_color {
        qr.set_foreground_color(color);
    }
    if let Some(color) = args.background_color {
        qr.set_background_color(color);
    }
    if let Some(path) = args.fill {
        println!("Filling modules from: {}", path.display());
        qr.set_foreground_image(ForegroundImage::new(path));
    }
    if let Some(path) = args.avatar {
        println!("Using avatar: {}", path.display());
        qr.set_avatar(Avatar::new(path, args.avatar_size, args.avatar_size, args.avatar_round));
    }
    if let Some(path) = args.background {
        println!("Using background: {}", path.display());
        let code_size = args.background_code_size.unwrap_or(args.size);
        qr.set_background_image(BackgroundImage::new(
            path,
            args.background_x,
            args.background_y,
            code_size,
            code_size,
        ));
    }

    qr.write_file(args.size, &args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    println!("Saved to: {}", args.output.display());
    Ok(())
}
