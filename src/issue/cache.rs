use hyper::StatusCode;
use image::DynamicImage;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    sync::atomic::{AtomicBool, Ordering},
};

pub static INSTANCE: Lazy<CacheManager> = Lazy::new(CacheManager::new);

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("image error: {0}")]
    Image(image::ImageError),
    #[error("image too large: {0} bytes, max 10MB")]
    ImgTooLarge(usize),
    #[error("media not found")]
    NotFound,
}

impl crate::AsResCode for Error {
    fn response_code(&self) -> StatusCode {
        match self {
            Error::Image(_) => StatusCode::BAD_REQUEST,
            Error::ImgTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Error::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

/// One uploaded attachment, identified by the hash of its bytes.
#[derive(Serialize, Deserialize)]
pub struct MediaCache {
    pub hash: u64,
    /// Email of the uploading student, or the mess username.
    pub uploader: String,
    /// Indicates if this cache is referenced by an issue or update.
    pub blocked: AtomicBool,

    /// Decoded image, only held until the cache is persisted.
    #[serde(skip)]
    pub img: RwLock<Option<DynamicImage>>,
}

impl MediaCache {
    /// Create a new cache and its hash from uploaded image bytes.
    pub fn new(bytes: &[u8], uploader: String) -> Result<Self, Error> {
        {
            let len = bytes.len();
            if len > 10_000_000 {
                return Err(Error::ImgTooLarge(len));
            }
        }

        let image = image::load_from_memory(bytes).map_err(Error::Image)?;

        let hash = {
            let mut hasher = DefaultHasher::new();
            bytes.hash(&mut hasher);
            hasher.finish()
        };

        Ok(Self {
            hash,
            uploader,
            blocked: AtomicBool::new(false),
            img: RwLock::new(Some(image)),
        })
    }

    fn save(&self) {
        #[cfg(not(test))]
        {
            let this = Self {
                hash: self.hash,
                uploader: self.uploader.clone(),
                blocked: AtomicBool::new(false),
                img: RwLock::new(self.img.write().take()),
            };

            tokio::spawn(async move {
                if let Err(err) = tokio::fs::create_dir_all("./data/media").await {
                    tracing::error!("failed to create media dir: {err}");
                    return;
                }

                let img = this.img.write().take();
                if let Some(img) = img {
                    if let Err(err) = img.save_with_format(
                        format!("./data/media/{}.png", this.hash),
                        image::ImageFormat::Png,
                    ) {
                        tracing::error!("failed to save media {}: {err}", this.hash);
                        return;
                    }
                }

                match serde_json::to_vec(&this) {
                    Ok(raw) => {
                        if let Err(err) =
                            tokio::fs::write(format!("./data/media/{}.json", this.hash), raw).await
                        {
                            tracing::error!("failed to save media meta {}: {err}", this.hash);
                        }
                    }
                    Err(err) => tracing::error!("failed to encode media meta: {err}"),
                }
            });
        }

        #[cfg(test)]
        {
            *self.img.write() = None;
        }
    }
}

pub struct CacheManager {
    pub caches: RwLock<Vec<MediaCache>>,
}

impl CacheManager {
    /// Unreferenced uploads kept around before the oldest is evicted.
    const MAX_UNBLOCKED_CACHE: usize = 64;

    /// Read and create a cache manager from the media sidecar files.
    pub fn new() -> Self {
        #[cfg(not(test))]
        {
            let mut vec = Vec::new();
            if let Ok(dir) = std::fs::read_dir("./data/media") {
                for f in dir.flatten() {
                    if f.path().extension().map_or(true, |e| e != "json") {
                        continue;
                    }
                    if let Ok(cache) = std::fs::read_to_string(f.path())
                        .map_err(|_| ())
                        .and_then(|raw| serde_json::from_str::<MediaCache>(&raw).map_err(|_| ()))
                    {
                        vec.push(cache)
                    }
                }
            }
            return Self {
                caches: RwLock::new(vec),
            };
        }

        #[cfg(test)]
        Self {
            caches: RwLock::new(Vec::new()),
        }
    }

    /// Push and save a cache, evicting the oldest unreferenced one when
    /// the cap is hit.
    pub fn push(&self, cache: MediaCache) {
        let cr = self.caches.read();

        if cr.iter().any(|e| e.hash == cache.hash) {
            return;
        }

        if Self::MAX_UNBLOCKED_CACHE
            <= cr
                .iter()
                .filter(|c| !c.blocked.load(Ordering::Acquire))
                .count()
        {
            let mut i = 0;
            for e in cr.iter().enumerate() {
                if !e.1.blocked.load(Ordering::Acquire) {
                    let _ = std::fs::remove_file(format!("./data/media/{}.png", e.1.hash));
                    let _ = std::fs::remove_file(format!("./data/media/{}.json", e.1.hash));
                    i = e.0;
                    break;
                }
            }
            drop(cr);
            self.caches.write().remove(i);
        } else {
            drop(cr)
        }

        cache.save();
        self.caches.write().push(cache);
    }

    #[cfg(test)]
    pub fn reset(&self) {
        self.caches.write().clear();
    }
}
