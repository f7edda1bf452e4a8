use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use image::ImageReader;
use thiserror::Error;
use tracing::{debug, warn};

/// Handle to a drawable stored in an [`AssetProvider`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawableId(u32);

/// Decoded RGBA8 image, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drawable {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl Drawable {
    /// Returns `None` when `rgba` does not hold exactly `width * height` pixels.
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Option<Self> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return None;
        }
        Some(Self {
            width,
            height,
            rgba,
        })
    }

    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Self {
        let rgba = color
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            width,
            height,
            rgba,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let mut pixel = [0u8; 4];
        pixel.copy_from_slice(&self.rgba[offset..offset + 4]);
        Some(pixel)
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, color: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        self.rgba[offset..offset + 4].copy_from_slice(&color);
    }
}

/// Lookup from sprite key to drawable. A missing key is a normal outcome and
/// means "draw nothing".
pub trait AssetProvider {
    fn lookup(&self, key: &str) -> Option<DrawableId>;
    fn drawable(&self, id: DrawableId) -> Option<&Drawable>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpriteKeyError {
    #[error("sprite key is empty")]
    Empty,
    #[error("sprite key `{key}` must be relative")]
    Absolute { key: String },
    #[error("sprite key `{key}` contains an empty or parent path segment")]
    BadSegment { key: String },
    #[error("sprite key `{key}` contains invalid character '{character}'")]
    InvalidCharacter { key: String, character: char },
}

#[derive(Debug, Error)]
pub enum AtlasError {
    #[error(transparent)]
    InvalidKey(#[from] SpriteKeyError),
    #[error("sprite key `{0}` is already registered")]
    DuplicateKey(String),
    #[error("failed to read sprite directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Sprite keys are `/`-separated lowercase paths such as `tile/road_ns` or
/// `entity/worker/0`. They double as file paths relative to the sprite root.
pub fn validate_sprite_key(key: &str) -> Result<(), SpriteKeyError> {
    if key.is_empty() {
        return Err(SpriteKeyError::Empty);
    }
    if key.starts_with('/') {
        return Err(SpriteKeyError::Absolute {
            key: key.to_string(),
        });
    }
    if key
        .split('/')
        .any(|segment| segment.is_empty() || segment == "..")
    {
        return Err(SpriteKeyError::BadSegment {
            key: key.to_string(),
        });
    }
    if let Some(character) = key.chars().find(|ch| !is_sprite_key_char(*ch)) {
        return Err(SpriteKeyError::InvalidCharacter {
            key: key.to_string(),
            character,
        });
    }
    Ok(())
}

fn is_sprite_key_char(ch: char) -> bool {
    ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '_' | '-' | '/')
}

/// In-memory sprite store, filled once at startup.
#[derive(Debug, Default)]
pub struct SpriteAtlas {
    drawables: Vec<Drawable>,
    keys: HashMap<String, DrawableId>,
}

impl SpriteAtlas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, drawable: Drawable) -> Result<DrawableId, AtlasError> {
        validate_sprite_key(key)?;
        if self.keys.contains_key(key) {
            return Err(AtlasError::DuplicateKey(key.to_string()));
        }
        let id = DrawableId(self.drawables.len() as u32);
        self.drawables.push(drawable);
        self.keys.insert(key.to_string(), id);
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.drawables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drawables.is_empty()
    }

    /// Loads every `*.png` below `root`; the key is the path relative to `root`
    /// without extension. Files that fail to decode or carry an invalid key are
    /// logged and skipped.
    pub fn load_dir(root: &Path) -> Result<Self, AtlasError> {
        let mut files = Vec::new();
        collect_png_files(root, root, &mut files)?;
        files.sort_by(|(a, _), (b, _)| a.cmp(b));

        let mut atlas = Self::new();
        for (key, path) in files {
            let drawable = match decode_png(&path) {
                Ok(drawable) => drawable,
                Err(reason) => {
                    warn!(
                        sprite_key = key.as_str(),
                        path = %path.display(),
                        reason = reason.as_str(),
                        "atlas_sprite_decode_failed"
                    );
                    continue;
                }
            };
            if let Err(error) = atlas.insert(&key, drawable) {
                warn!(
                    sprite_key = key.as_str(),
                    error = %error,
                    "atlas_sprite_skipped"
                );
            }
        }
        debug!(root = %root.display(), sprite_count = atlas.len(), "atlas_loaded");
        Ok(atlas)
    }
}

impl AssetProvider for SpriteAtlas {
    fn lookup(&self, key: &str) -> Option<DrawableId> {
        self.keys.get(key).copied()
    }

    fn drawable(&self, id: DrawableId) -> Option<&Drawable> {
        self.drawables.get(id.0 as usize)
    }
}

fn collect_png_files(
    root: &Path,
    current: &Path,
    files: &mut Vec<(String, PathBuf)>,
) -> Result<(), AtlasError> {
    let entries = fs::read_dir(current).map_err(|source| AtlasError::ReadDir {
        path: current.to_path_buf(),
        source,
    })?;

    for entry in entries {
        let entry = entry.map_err(|source| AtlasError::ReadDir {
            path: current.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_dir() {
            collect_png_files(root, &path, files)?;
            continue;
        }
        let is_png = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
        if !is_png {
            continue;
        }
        let Ok(rel) = path.with_extension("").strip_prefix(root).map(Path::to_path_buf) else {
            continue;
        };
        let key = rel
            .components()
            .map(|component| component.as_os_str().to_string_lossy().to_string())
            .collect::<Vec<_>>()
            .join("/");
        files.push((key, path));
    }
    Ok(())
}

fn decode_png(path: &Path) -> Result<Drawable, String> {
    let reader = ImageReader::open(path).map_err(|error| format!("file_open_failed:{error}"))?;
    let decoded = reader
        .decode()
        .map_err(|error| format!("decode_failed:{error}"))?;
    let image = decoded.to_rgba8();
    Ok(Drawable {
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    })
}
