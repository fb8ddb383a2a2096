/// Media storage for recipe images and user avatars
///
/// Images arrive as base64 data URLs (`data:image/png;base64,iVBOR...`).
/// This module decodes them and hands the bytes to a [`MediaStore`], which
/// persists them under a relative media name (e.g. `recipes/images/<uuid>.png`)
/// and turns that name into a public URL.
///
/// The database stores media names, never URLs, so the public URL prefix
/// can change without a migration.
///
/// # Example
///
/// ```no_run
/// use recipebook_shared::media::{decode_data_url, LocalMediaStore, MediaStore, recipe_image_name};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = LocalMediaStore::new("./media", "/media/");
/// let image = decode_data_url("data:image/png;base64,iVBORw0KGgo=")?;
/// let name = recipe_image_name(image.extension);
/// store.save(&name, &image.bytes).await?;
/// println!("stored at {}", store.url(&name));
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// Error type for media operations
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    /// Payload is not a decodable image
    #[error("Invalid image payload: {0}")]
    InvalidPayload(String),

    /// Media name escapes the media root or is empty
    #[error("Invalid media name: {0}")]
    InvalidName(String),

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A decoded image ready to be stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// Raw image bytes
    pub bytes: Vec<u8>,

    /// File extension derived from the declared or sniffed type
    pub extension: &'static str,
}

/// Storage backend for media files
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Writes `bytes` under `name`, replacing any existing file
    async fn save(&self, name: &str, bytes: &[u8]) -> Result<(), MediaError>;

    /// Removes the file stored under `name`; a missing file is not an error
    async fn delete(&self, name: &str) -> Result<(), MediaError>;

    /// Public URL for a stored media name
    fn url(&self, name: &str) -> String;
}

/// Filesystem-backed media store
#[derive(Debug, Clone)]
pub struct LocalMediaStore {
    root: PathBuf,
    base_url: String,
}

impl LocalMediaStore {
    /// Creates a store rooted at `root`, publishing files under `base_url`
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Self {
            root: root.into(),
            base_url,
        }
    }

    /// Directory files are written to
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, name: &str) -> Result<PathBuf, MediaError> {
        let relative = Path::new(name);
        let is_plain = !name.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));

        if !is_plain {
            return Err(MediaError::InvalidName(name.to_string()));
        }

        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn save(&self, name: &str, bytes: &[u8]) -> Result<(), MediaError> {
        let path = self.resolve(name)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;

        debug!(media = name, size = bytes.len(), "Stored media file");
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<(), MediaError> {
        let path = self.resolve(name)?;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(media = name, "Deleted media file");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(media = name, "Media file already absent");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn url(&self, name: &str) -> String {
        format!("{}{}", self.base_url, name)
    }
}

/// Decodes a base64 image payload
///
/// Accepts a data URL (`data:image/jpeg;base64,...`) or bare base64. For
/// data URLs the extension follows the declared MIME type; bare payloads are
/// identified by their magic bytes.
///
/// # Errors
///
/// Returns `MediaError::InvalidPayload` if the payload is empty, not base64,
/// or not a PNG, JPEG, GIF or WebP image.
pub fn decode_data_url(payload: &str) -> Result<DecodedImage, MediaError> {
    let payload = payload.trim();
    if payload.is_empty() {
        return Err(MediaError::InvalidPayload("empty payload".to_string()));
    }

    let (declared, data) = match payload.strip_prefix("data:") {
        Some(rest) => {
            let (header, data) = rest
                .split_once(',')
                .ok_or_else(|| MediaError::InvalidPayload("missing data separator".to_string()))?;

            let mut parts = header.split(';');
            let mime = parts.next().unwrap_or_default();
            if !parts.any(|p| p == "base64") {
                return Err(MediaError::InvalidPayload(
                    "only base64 data URLs are supported".to_string(),
                ));
            }

            let extension = extension_for_mime(mime).ok_or_else(|| {
                MediaError::InvalidPayload(format!("unsupported image type '{}'", mime))
            })?;
            (Some(extension), data)
        }
        None => (None, payload),
    };

    let bytes = STANDARD
        .decode(data.trim())
        .map_err(|e| MediaError::InvalidPayload(format!("bad base64: {}", e)))?;

    if bytes.is_empty() {
        return Err(MediaError::InvalidPayload("empty image".to_string()));
    }

    let extension = match declared {
        Some(extension) => extension,
        None => sniff_extension(&bytes)
            .ok_or_else(|| MediaError::InvalidPayload("unrecognized image format".to_string()))?,
    };

    Ok(DecodedImage { bytes, extension })
}

fn extension_for_mime(mime: &str) -> Option<&'static str> {
    match mime.to_ascii_lowercase().as_str() {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

fn sniff_extension(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG") {
        Some("png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("jpg")
    } else if bytes.starts_with(b"GIF8") {
        Some("gif")
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("webp")
    } else {
        None
    }
}

/// Media name for a newly uploaded recipe image
pub fn recipe_image_name(extension: &str) -> String {
    format!("recipes/images/{}.{}", Uuid::new_v4(), extension)
}

/// Media name for a user's avatar; one file per user
pub fn avatar_name(user_id: i64, extension: &str) -> String {
    format!("users/images/avatar{}.{}", user_id, extension)
}
