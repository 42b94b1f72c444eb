use crate::data::{AnimationParams, ImageSource};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// One player's configuration as read from JSON. Missing fields take the
/// reference values: 64x64 frames, 12 columns, frames 0..=26, 90 ms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    #[serde(alias = "image", alias = "src")]
    pub source: String,
    pub frame_width: u32,
    pub frame_height: u32,
    pub columns: u32,
    pub start_frame: u32,
    pub end_frame: u32,
    pub frame_delay_ms: u32,
    pub surface_width: Option<u32>,
    pub surface_height: Option<u32>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        let params = AnimationParams::default();
        Self {
            source: String::new(),
            frame_width: params.frame_width,
            frame_height: params.frame_height,
            columns: params.columns,
            start_frame: params.start_frame,
            end_frame: params.end_frame,
            frame_delay_ms: params.frame_delay_ms,
            surface_width: None,
            surface_height: None,
        }
    }
}

impl PlayerConfig {
    /// Load a single player config from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read player config {:?}", path.as_ref()))?;

        let config: PlayerConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse player config {:?}", path.as_ref()))?;

        Ok(config)
    }

    pub fn params(&self) -> AnimationParams {
        AnimationParams {
            frame_width: self.frame_width,
            frame_height: self.frame_height,
            columns: self.columns,
            start_frame: self.start_frame,
            end_frame: self.end_frame,
            frame_delay_ms: self.frame_delay_ms,
        }
    }

    pub fn image_source(&self) -> ImageSource {
        ImageSource::parse(&self.source)
    }

    /// Destination size; defaults to one frame
    pub fn surface_size(&self) -> (u32, u32) {
        (
            self.surface_width.unwrap_or(self.frame_width),
            self.surface_height.unwrap_or(self.frame_height),
        )
    }
}

/// Optional grid overrides layered over a base config
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridOverrides {
    pub frame_width: Option<u32>,
    pub frame_height: Option<u32>,
    pub columns: Option<u32>,
    pub start_frame: Option<u32>,
    pub end_frame: Option<u32>,
    pub frame_delay_ms: Option<u32>,
    pub surface_width: Option<u32>,
    pub surface_height: Option<u32>,
}

impl GridOverrides {
    pub fn apply(&self, config: &mut PlayerConfig) {
        if let Some(v) = self.frame_width {
            config.frame_width = v;
        }
        if let Some(v) = self.frame_height {
            config.frame_height = v;
        }
        if let Some(v) = self.columns {
            config.columns = v;
        }
        if let Some(v) = self.start_frame {
            config.start_frame = v;
        }
        if let Some(v) = self.end_frame {
            config.end_frame = v;
        }
        if let Some(v) = self.frame_delay_ms {
            config.frame_delay_ms = v;
        }
        if self.surface_width.is_some() {
            config.surface_width = self.surface_width;
        }
        if self.surface_height.is_some() {
            config.surface_height = self.surface_height;
        }
    }
}

/// A named sprite asset from the asset library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteAsset {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    pub image: String,
    #[serde(flatten)]
    pub grid: GridOverrides,
}

impl SpriteAsset {
    /// Only character sheets are animated; backgrounds and audio are not sprite sheets
    pub fn is_character(&self) -> bool {
        match self.category.as_deref() {
            None => true,
            Some(category) => category == "characters" || category == "character",
        }
    }

    /// Reference config with this asset's image and overrides applied
    pub fn config(&self) -> PlayerConfig {
        let mut config = PlayerConfig {
            source: self.image.clone(),
            ..PlayerConfig::default()
        };
        self.grid.apply(&mut config);
        config
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetManifest {
    pub assets: Vec<SpriteAsset>,
}

impl AssetManifest {
    /// Load a manifest; relative image paths resolve against the manifest's directory
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read asset manifest {:?}", path))?;

        let mut manifest: AssetManifest = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse asset manifest {:?}", path))?;

        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_else(PathBuf::new);
        for asset in &mut manifest.assets {
            if let ImageSource::File(resolved) = ImageSource::parse(&asset.image).resolved_against(&base_dir) {
                asset.image = resolved.to_string_lossy().into_owned();
            }
        }

        log::info!("Loaded {} sprite assets from {:?}", manifest.assets.len(), path);

        Ok(manifest)
    }

    pub fn characters(&self) -> impl Iterator<Item = &SpriteAsset> {
        self.assets.iter().filter(|asset| asset.is_character())
    }
}
