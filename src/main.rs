use anyhow::{Context, Result};
use clap::Parser;
use image::RgbaImage;
use rayon::prelude::*;
use sprite_player::data::{AssetManifest, GridOverrides, ImageSource, PlayerConfig};
use sprite_player::rendering::compose_strip;
use sprite_player::video::open_sink;
use sprite_player::{FixedRateDriver, PlayerHandle, PlayerStatus, RasterSurface, RefreshScheduler, SheetCache};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about = "Render looping sprite sheet animations headlessly", long_about = None)]
struct Args {
    /// Sprite sheet image (path or http(s) URL)
    #[arg(long)]
    sprite_sheet: Option<String>,

    /// Player config JSON (defaults: 64x64 frames, 12 columns, frames 0-26, 90 ms)
    #[arg(long, conflicts_with = "manifest")]
    config: Option<PathBuf>,

    /// Asset manifest JSON; every character asset is rendered side by side
    #[arg(long, conflicts_with = "sprite_sheet")]
    manifest: Option<PathBuf>,

    /// Output directory for PNG frames, or a .mov/.webm/.mp4/.gif file
    #[arg(long)]
    output: PathBuf,

    /// Width of one frame in the sheet
    #[arg(long)]
    frame_width: Option<u32>,

    /// Height of one frame in the sheet
    #[arg(long)]
    frame_height: Option<u32>,

    /// Frames per sheet row
    #[arg(long)]
    columns: Option<u32>,

    /// First frame of the loop
    #[arg(long)]
    start_frame: Option<u32>,

    /// Last frame of the loop (inclusive)
    #[arg(long)]
    end_frame: Option<u32>,

    /// Milliseconds between frame advances
    #[arg(long)]
    frame_delay_ms: Option<u32>,

    /// Destination surface width (defaults to the frame width)
    #[arg(long)]
    surface_width: Option<u32>,

    /// Destination surface height (defaults to the frame height)
    #[arg(long)]
    surface_height: Option<u32>,

    /// Simulated display refresh rate
    #[arg(long, default_value = "60")]
    refresh_hz: u32,

    /// Length of the rendered clip
    #[arg(long, default_value = "2000")]
    duration_ms: u32,

    /// Transparent pixels between gallery entries
    #[arg(long, default_value = "8")]
    gap: u32,
}

impl Args {
    fn grid_overrides(&self) -> GridOverrides {
        GridOverrides {
            frame_width: self.frame_width,
            frame_height: self.frame_height,
            columns: self.columns,
            start_frame: self.start_frame,
            end_frame: self.end_frame,
            frame_delay_ms: self.frame_delay_ms,
            surface_width: self.surface_width,
            surface_height: self.surface_height,
        }
    }
}

struct Entry {
    name: String,
    config: PlayerConfig,
}

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if args.refresh_hz == 0 {
        anyhow::bail!("--refresh-hz must be greater than zero");
    }

    let entries = collect_entries(&args)?;
    if entries.is_empty() {
        log::warn!("No character assets to render");
        return Ok(());
    }

    log::info!("Starting sprite preview renderer");
    log::info!("Output: {:?}", args.output);
    log::info!(
        "{} animation(s), {} ms @ {} Hz",
        entries.len(),
        args.duration_ms,
        args.refresh_hz
    );

    // Preload every sheet so playback starts on the first refresh
    let cache = SheetCache::global();
    let preloaded: Vec<_> = entries
        .par_iter()
        .map(|entry| {
            let result = cache.load_blocking(entry.config.image_source());
            if let Err(e) = &result {
                log::warn!("{}: {}", entry.name, e);
            }
            result
        })
        .collect();

    let scheduler = RefreshScheduler::new();
    let mut players = Vec::with_capacity(entries.len());
    for entry in &entries {
        let (width, height) = entry.config.surface_size();
        let player = PlayerHandle::create(
            &scheduler,
            cache,
            entry.config.image_source(),
            entry.config.params(),
            RasterSurface::new(width, height),
        )
        .with_context(|| format!("Invalid configuration for {}", entry.name))?;
        players.push(player);
    }
    // The cache holds sheets only while a player does
    drop(preloaded);

    let sizes: Vec<(u32, u32)> = entries.iter().map(|e| e.config.surface_size()).collect();
    let strip_width = sizes.iter().map(|s| s.0).sum::<u32>() + args.gap * (sizes.len() as u32 - 1);
    let strip_height = sizes.iter().map(|s| s.1).max().unwrap_or(0);

    let mut sink = open_sink(&args.output, strip_width, strip_height, args.refresh_hz)?;

    let mut driver = FixedRateDriver::new(args.refresh_hz, 0.0);
    let total_ticks = driver.ticks_for(args.duration_ms);
    log::info!("Rendering {} refreshes...", total_ticks);
    let start_time = std::time::Instant::now();

    driver.run(&scheduler, total_ticks, |index, now| {
        let frames: Vec<RgbaImage> = players
            .iter()
            .map(|p| p.with_surface(|s| s.pixels().clone()))
            .collect();
        let refs: Vec<&RgbaImage> = frames.iter().collect();
        sink.write_frame(&compose_strip(&refs, args.gap))?;

        // Progress logging
        if index % args.refresh_hz as u64 == 0 || index == total_ticks - 1 {
            let drawn: u64 = players.iter().map(|p| p.draw_count()).sum();
            log::info!(
                "Progress: {:.1}% ({}/{}) | t = {:.0} ms | frames drawn: {}",
                (index + 1) as f32 / total_ticks as f32 * 100.0,
                index + 1,
                total_ticks,
                now,
                drawn
            );
        }
        Ok(())
    })?;

    for (entry, player) in entries.iter().zip(&players) {
        match player.status() {
            PlayerStatus::Failed(reason) => log::warn!("{}: left blank ({})", entry.name, reason),
            status => log::info!("{}: {:?}, {} frames drawn", entry.name, status, player.draw_count()),
        }
        player.destroy();
    }

    let elapsed = start_time.elapsed();
    log::info!(
        "Rendering complete! Total time: {:.2}s ({:.1} refreshes/s)",
        elapsed.as_secs_f32(),
        total_ticks as f32 / elapsed.as_secs_f32().max(f32::EPSILON)
    );

    sink.finish()?;

    log::info!("Done!");
    Ok(())
}

/// Build the list of animations from the manifest, a config file or flags
fn collect_entries(args: &Args) -> Result<Vec<Entry>> {
    let overrides = args.grid_overrides();

    if let Some(manifest_path) = &args.manifest {
        let manifest = AssetManifest::load(manifest_path)?;
        return Ok(manifest
            .characters()
            .map(|asset| {
                let mut config = asset.config();
                overrides.apply(&mut config);
                Entry {
                    name: asset.name.clone(),
                    config,
                }
            })
            .collect());
    }

    let mut config = match &args.config {
        Some(path) => {
            let mut config = PlayerConfig::load(path)?;
            // Relative sheet paths are relative to the config file
            if !config.source.trim().is_empty() {
                let base_dir = path.parent().unwrap_or(Path::new(""));
                if let ImageSource::File(resolved) = config.image_source().resolved_against(base_dir) {
                    config.source = resolved.to_string_lossy().into_owned();
                }
            }
            config
        }
        None => PlayerConfig::default(),
    };

    if let Some(sheet) = &args.sprite_sheet {
        config.source = sheet.clone();
    }
    overrides.apply(&mut config);

    if config.source.trim().is_empty() {
        anyhow::bail!("No sprite sheet given: pass --sprite-sheet, --config or --manifest");
    }

    Ok(vec![Entry {
        name: config.source.clone(),
        config,
    }])
}
