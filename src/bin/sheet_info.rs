use anyhow::{Context, Result};
use clap::Parser;
use sprite_player::data::{load_image, GridOverrides, ImageSource, PlayerConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Print the frame grid of a sprite sheet", long_about = None)]
struct Args {
    /// Sprite sheet image (path or http(s) URL)
    #[arg(long)]
    sprite_sheet: String,

    #[arg(long)]
    frame_width: Option<u32>,

    #[arg(long)]
    frame_height: Option<u32>,

    #[arg(long)]
    columns: Option<u32>,

    #[arg(long)]
    start_frame: Option<u32>,

    #[arg(long)]
    end_frame: Option<u32>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = PlayerConfig {
        source: args.sprite_sheet.clone(),
        ..PlayerConfig::default()
    };
    GridOverrides {
        frame_width: args.frame_width,
        frame_height: args.frame_height,
        columns: args.columns,
        start_frame: args.start_frame,
        end_frame: args.end_frame,
        ..GridOverrides::default()
    }
    .apply(&mut config);

    let geometry = config.params().geometry().context("Invalid sheet geometry")?;
    let source = ImageSource::parse(&config.source);
    let sheet = load_image(&source).with_context(|| format!("Failed to load {}", source))?;
    let (width, height) = sheet.dimensions();

    log::info!("=== Sprite sheet {} ===", source);
    log::info!("Image: {}x{}", width, height);
    log::info!(
        "Grid: {}x{} frames, {} per row, {} whole frames available",
        geometry.frame_width(),
        geometry.frame_height(),
        geometry.columns(),
        geometry.frames_available(width, height)
    );
    log::info!(
        "Loop: frames {}..={} ({} frames)",
        geometry.start_frame(),
        geometry.end_frame(),
        geometry.loop_len()
    );

    if !geometry.fits(width, height) {
        let (required_width, required_height) = geometry.required_extent();
        anyhow::bail!(
            "Sheet is {}x{} but the loop needs at least {}x{}",
            width,
            height,
            required_width,
            required_height
        );
    }

    for frame in geometry.start_frame()..=geometry.end_frame() {
        let rect = geometry.source_rect(frame);
        log::info!(
            "  frame {:>3}: x={:<5} y={:<5} {}x{}",
            frame,
            rect.x,
            rect.y,
            rect.width,
            rect.height
        );
    }

    log::info!("Sheet holds the whole loop");
    Ok(())
}
