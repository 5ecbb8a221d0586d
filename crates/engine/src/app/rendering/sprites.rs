use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use image::ImageReader;
use tracing::warn;

use super::raster::Sprite;

/// Images keyed by their content-relative path. Failed loads are cached as
/// `None` and warned about once; callers draw a placeholder instead.
pub struct SpriteCache {
    content_root: PathBuf,
    sprites: HashMap<String, Option<Sprite>>,
    warned_keys: HashSet<String>,
}

impl SpriteCache {
    pub fn new(content_root: impl Into<PathBuf>) -> Self {
        Self {
            content_root: content_root.into(),
            sprites: HashMap::new(),
            warned_keys: HashSet::new(),
        }
    }

    pub fn get(&mut self, key: &str) -> Option<&Sprite> {
        if !self.sprites.contains_key(key) {
            let path = self.content_root.join(key);
            let sprite = match load_sprite_rgba(&path) {
                Ok(sprite) => Some(sprite),
                Err(reason) => {
                    self.warn_once(key, &path, &reason);
                    None
                }
            };
            self.sprites.insert(key.to_string(), sprite);
        }
        self.sprites.get(key).and_then(Option::as_ref)
    }

    pub fn loaded_count(&self) -> usize {
        self.sprites.values().filter(|sprite| sprite.is_some()).count()
    }

    fn warn_once(&mut self, key: &str, path: &Path, reason: &str) {
        if !self.warned_keys.insert(key.to_string()) {
            return;
        }
        warn!(
            sprite_key = key,
            path = %path.display(),
            reason,
            "renderer_sprite_load_failed_using_placeholder"
        );
    }
}

fn load_sprite_rgba(path: &Path) -> Result<Sprite, String> {
    let reader = ImageReader::open(path).map_err(|error| format!("file_open_failed:{error}"))?;
    let decoded = reader
        .decode()
        .map_err(|error| format!("decode_failed:{error}"))?;
    let image = decoded.to_rgba8();
    Ok(Sprite {
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    })
}
