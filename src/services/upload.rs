//! Image upload pipeline: throttle, authorize, validate, resize, store.
//!
//! Every rejection happens before the asset store is touched.

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use regex::Regex;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::UploadConfig;
use crate::models::User;
use crate::services::rate_limit::RateLimiter;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Too many uploads, try again later")]
    RateLimited,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Not allowed to upload this kind of image")]
    Forbidden,

    #[error("File and type are required")]
    MissingFields,

    #[error("Unknown upload type: {0}")]
    UnknownCategory(String),

    #[error("File is not valid base64")]
    InvalidEncoding,

    #[error("File too large. Maximum: {max_mib}MB")]
    TooLarge { max_mib: usize },

    #[error("File type not allowed. Only JPG, PNG and WebP are accepted")]
    InvalidSignature,

    #[error("Image could not be decoded")]
    InvalidImage,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for UploadError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

/// What an uploaded image is for; decides its box, directory and who may upload it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageCategory {
    Cover,
    Volume,
    UserLogo,
}

impl ImageCategory {
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "cover" => Some(Self::Cover),
            "tome" => Some(Self::Volume),
            "user" => Some(Self::UserLogo),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cover => "cover",
            Self::Volume => "tome",
            Self::UserLogo => "user",
        }
    }

    /// Target (width, height) in pixels.
    #[must_use]
    pub const fn dimensions(self) -> (u32, u32) {
        match self {
            Self::Cover => (300, 400),
            Self::Volume => (200, 300),
            Self::UserLogo => (150, 150),
        }
    }

    #[must_use]
    pub const fn directory(self) -> &'static str {
        match self {
            Self::Cover => "mangas/covers",
            Self::Volume => "mangas/tomes",
            Self::UserLogo => "users/logos",
        }
    }

    #[must_use]
    pub const fn requires_admin(self) -> bool {
        matches!(self, Self::Cover | Self::Volume)
    }
}

/// Formats recognised from the payload's leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSignature {
    Jpeg,
    Png,
    Webp,
}

impl ImageSignature {
    #[must_use]
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            Some(Self::Png)
        } else if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
            Some(Self::Webp)
        } else {
            None
        }
    }

    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Webp => "webp",
        }
    }
}

/// Where processed images end up. Paths are relative to the uploads root.
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn write(&self, relative_path: &str, bytes: &[u8]) -> Result<()>;
}

pub struct FsAssetStore {
    root: PathBuf,
}

impl FsAssetStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl AssetStore for FsAssetStore {
    async fn write(&self, relative_path: &str, bytes: &[u8]) -> Result<()> {
        let path = self.root.join(relative_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write image to {}", path.display()))
    }
}

pub struct UploadRequest<'a> {
    /// Base64 payload, optionally wrapped in a `data:image/<x>;base64,` URI.
    pub file: &'a str,
    pub category: &'a str,
    pub caller: Option<&'a User>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub url: String,
    pub file_name: String,
}

pub struct UploadService {
    limiter: RateLimiter,
    assets: Arc<dyn AssetStore>,
    config: UploadConfig,
}

impl UploadService {
    #[must_use]
    pub fn new(limiter: RateLimiter, assets: Arc<dyn AssetStore>, config: UploadConfig) -> Self {
        Self {
            limiter,
            assets,
            config,
        }
    }

    /// Counts one attempt for `client_key`. Must run before the caller or the
    /// body is looked at, so rejected and malformed requests use up quota too.
    pub async fn admit(&self, client_key: &str) -> Result<(), UploadError> {
        if self.limiter.check(client_key).await {
            Ok(())
        } else {
            metrics::counter!("uploads_total", "outcome" => "throttled").increment(1);
            Err(UploadError::RateLimited)
        }
    }

    /// Runs the pipeline for an admitted request.
    pub async fn upload(&self, request: UploadRequest<'_>) -> Result<StoredImage, UploadError> {
        let result = self.run(request).await;

        let outcome = match &result {
            Ok(_) => "stored",
            Err(UploadError::Internal(_)) => "failed",
            Err(_) => "rejected",
        };
        metrics::counter!("uploads_total", "outcome" => outcome).increment(1);

        result
    }

    async fn run(&self, request: UploadRequest<'_>) -> Result<StoredImage, UploadError> {
        let caller = request.caller.ok_or(UploadError::Unauthenticated)?;

        if request.file.is_empty() || request.category.is_empty() {
            return Err(UploadError::MissingFields);
        }

        let category = ImageCategory::parse(request.category)
            .ok_or_else(|| UploadError::UnknownCategory(request.category.to_string()))?;

        if category.requires_admin() && !caller.isadmin {
            return Err(UploadError::Forbidden);
        }

        let bytes = decode_payload(request.file)?;

        if bytes.len() > self.config.max_bytes {
            return Err(UploadError::TooLarge {
                max_mib: self.config.max_bytes / (1024 * 1024),
            });
        }

        let signature = ImageSignature::detect(&bytes).ok_or(UploadError::InvalidSignature)?;

        let quality = self.config.jpeg_quality;
        let (width, height) = category.dimensions();
        let encoded =
            tokio::task::spawn_blocking(move || resize_to_jpeg(&bytes, width, height, quality))
                .await
                .map_err(|e| UploadError::Internal(format!("Resize task panicked: {e}")))??;

        // Named after the submitted format although the bytes are now JPEG;
        // `/uploads` is served with the content type of that extension.
        let file_name = format!("{}.{}", Uuid::new_v4(), signature.extension());
        let relative_path = format!("{}/{}", category.directory(), file_name);

        self.assets.write(&relative_path, &encoded).await?;

        info!(
            category = category.as_str(),
            user_id = caller.id,
            file = %relative_path,
            "Stored uploaded image"
        );

        Ok(StoredImage {
            url: format!("/uploads/{relative_path}"),
            file_name,
        })
    }
}

fn decode_payload(file: &str) -> Result<Vec<u8>, UploadError> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let prefix = RE.get_or_init(|| Regex::new(r"^data:image/[a-z]+;base64,").expect("Invalid regex"));

    let data = prefix.replace(file, "");
    let compact: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    STANDARD
        .decode(compact.as_bytes())
        .map_err(|_| UploadError::InvalidEncoding)
}

/// Scales to cover the box, crops the overflow, and re-encodes as JPEG.
fn resize_to_jpeg(
    bytes: &[u8],
    width: u32,
    height: u32,
    quality: u8,
) -> Result<Vec<u8>, UploadError> {
    let source = image::load_from_memory(bytes).map_err(|e| {
        debug!(error = %e, "Failed to decode uploaded image");
        UploadError::InvalidImage
    })?;

    let rgb = source
        .resize_to_fill(width, height, FilterType::Lanczos3)
        .to_rgb8();

    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality)
        .encode_image(&rgb)
        .map_err(|e| UploadError::Internal(format!("Failed to encode JPEG: {e}")))?;

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RateLimitRule;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct RecordingStore {
        writes: Mutex<Vec<(String, Vec<u8>)>>,
    }

    #[async_trait]
    impl AssetStore for RecordingStore {
        async fn write(&self, relative_path: &str, bytes: &[u8]) -> Result<()> {
            self.writes
                .lock()
                .await
                .push((relative_path.to_string(), bytes.to_vec()));
            Ok(())
        }
    }

    fn png_base64(width: u32, height: u32) -> String {
        let img = RgbImage::from_pixel(width, height, Rgb([200, 40, 40]));
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        STANDARD.encode(buf)
    }

    fn admin() -> User {
        User {
            id: 1,
            username: "admin".to_string(),
            isadmin: true,
            userlogo: None,
        }
    }

    fn reader() -> User {
        User {
            id: 2,
            username: "reader".to_string(),
            isadmin: false,
            userlogo: None,
        }
    }

    fn service(max_requests: u32, store: Arc<RecordingStore>) -> UploadService {
        let limiter = RateLimiter::in_memory(
            RateLimitRule {
                max_requests,
                window_seconds: 60,
            },
            "uploads",
        );
        UploadService::new(limiter, store, UploadConfig::default())
    }

    fn request<'a>(
        file: &'a str,
        category: &'a str,
        caller: Option<&'a User>,
    ) -> UploadRequest<'a> {
        UploadRequest {
            file,
            category,
            caller,
        }
    }

    #[test]
    fn test_signature_detection() {
        assert_eq!(
            ImageSignature::detect(&[0xFF, 0xD8, 0xFF, 0xE0]),
            Some(ImageSignature::Jpeg)
        );
        assert_eq!(
            ImageSignature::detect(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A]),
            Some(ImageSignature::Png)
        );
        assert_eq!(
            ImageSignature::detect(b"RIFF\x10\x00\x00\x00WEBPVP8 "),
            Some(ImageSignature::Webp)
        );
        assert_eq!(ImageSignature::detect(b"RIFF\x10\x00\x00\x00WAVEfmt "), None);
        assert_eq!(ImageSignature::detect(b"GIF89a"), None);
        assert_eq!(ImageSignature::detect(&[]), None);
    }

    #[test]
    fn test_category_parse_and_targets() {
        assert_eq!(ImageCategory::parse("cover"), Some(ImageCategory::Cover));
        assert_eq!(ImageCategory::parse("tome"), Some(ImageCategory::Volume));
        assert_eq!(ImageCategory::parse("user"), Some(ImageCategory::UserLogo));
        assert_eq!(ImageCategory::parse("banner"), None);

        assert_eq!(ImageCategory::Cover.dimensions(), (300, 400));
        assert_eq!(ImageCategory::Volume.directory(), "mangas/tomes");
        assert!(!ImageCategory::UserLogo.requires_admin());
    }

    #[test]
    fn test_decode_strips_data_uri() {
        let decoded = decode_payload("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(decoded, b"hello");
        assert!(matches!(
            decode_payload("not base64!!"),
            Err(UploadError::InvalidEncoding)
        ));
    }

    #[tokio::test]
    async fn test_cover_is_resized_and_stored() {
        let store = Arc::new(RecordingStore::default());
        let svc = service(10, store.clone());
        let payload = format!("data:image/png;base64,{}", png_base64(64, 48));
        let caller = admin();

        let stored = svc.upload(request(&payload, "cover", Some(&caller))).await.unwrap();

        assert!(stored.url.starts_with("/uploads/mangas/covers/"));
        assert!(stored.file_name.ends_with(".png"));
        assert_eq!(stored.url, format!("/uploads/mangas/covers/{}", stored.file_name));

        let writes = store.writes.lock().await;
        assert_eq!(writes.len(), 1);
        let written = image::load_from_memory(&writes[0].1).unwrap();
        assert_eq!((written.width(), written.height()), (300, 400));
        assert_eq!(ImageSignature::detect(&writes[0].1), Some(ImageSignature::Jpeg));
    }

    #[tokio::test]
    async fn test_user_logo_allowed_for_non_admin() {
        let store = Arc::new(RecordingStore::default());
        let svc = service(10, store.clone());
        let payload = png_base64(20, 20);
        let caller = reader();

        let stored = svc.upload(request(&payload, "user", Some(&caller))).await.unwrap();
        assert!(stored.url.starts_with("/uploads/users/logos/"));

        let writes = store.writes.lock().await;
        let written = image::load_from_memory(&writes[0].1).unwrap();
        assert_eq!((written.width(), written.height()), (150, 150));
    }

    #[tokio::test]
    async fn test_non_admin_cannot_upload_volume_art() {
        let store = Arc::new(RecordingStore::default());
        let svc = service(10, store.clone());
        let payload = png_base64(20, 20);
        let caller = reader();

        let result = svc.upload(request(&payload, "tome", Some(&caller))).await;
        assert!(matches!(result, Err(UploadError::Forbidden)));
        assert!(store.writes.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_anonymous_is_rejected() {
        let store = Arc::new(RecordingStore::default());
        let svc = service(10, store.clone());
        let payload = png_base64(20, 20);

        let result = svc.upload(request(&payload, "user", None)).await;
        assert!(matches!(result, Err(UploadError::Unauthenticated)));
        assert!(store.writes.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_admission_is_counted_per_client() {
        let store = Arc::new(RecordingStore::default());
        let svc = service(1, store.clone());

        assert!(svc.admit("10.0.0.1").await.is_ok());
        assert!(matches!(
            svc.admit("10.0.0.1").await,
            Err(UploadError::RateLimited)
        ));
        assert!(svc.admit("10.0.0.2").await.is_ok());
        assert!(store.writes.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_bad_signature_and_size_rejected() {
        let store = Arc::new(RecordingStore::default());
        let svc = service_with_max_bytes(16, store.clone());
        let caller = admin();

        let gif = STANDARD.encode(b"GIF89a....");
        let result = svc.upload(request(&gif, "cover", Some(&caller))).await;
        assert!(matches!(result, Err(UploadError::InvalidSignature)));

        let big = png_base64(64, 64);
        let result = svc.upload(request(&big, "cover", Some(&caller))).await;
        assert!(matches!(result, Err(UploadError::TooLarge { .. })));

        assert!(store.writes.lock().await.is_empty());
    }

    fn service_with_max_bytes(max_bytes: usize, store: Arc<RecordingStore>) -> UploadService {
        let limiter = RateLimiter::in_memory(
            RateLimitRule {
                max_requests: 10,
                window_seconds: 60,
            },
            "uploads",
        );
        let config = UploadConfig {
            max_bytes,
            ..UploadConfig::default()
        };
        UploadService::new(limiter, store, config)
    }

    #[tokio::test]
    async fn test_size_limit_is_inclusive() {
        let store = Arc::new(RecordingStore::default());
        let caller = admin();

        // Exactly at the limit passes the size check and fails on the signature.
        let svc = service_with_max_bytes(16, store.clone());
        let sixteen = STANDARD.encode(b"0123456789abcdef");
        let result = svc.upload(request(&sixteen, "cover", Some(&caller))).await;
        assert!(matches!(result, Err(UploadError::InvalidSignature)));

        let seventeen = STANDARD.encode(b"0123456789abcdefg");
        let result = svc.upload(request(&seventeen, "cover", Some(&caller))).await;
        assert!(matches!(result, Err(UploadError::TooLarge { .. })));

        let payload = png_base64(20, 20);
        let exact = STANDARD.decode(&payload).unwrap().len();
        let svc = service_with_max_bytes(exact, store.clone());
        let stored = svc.upload(request(&payload, "cover", Some(&caller))).await;
        assert!(stored.is_ok());

        assert_eq!(store.writes.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_image_with_valid_signature() {
        let store = Arc::new(RecordingStore::default());
        let svc = service(10, store.clone());
        let caller = admin();
        let payload = STANDARD.encode([0xFF, 0xD8, 0xFF, 0x00, 0x01, 0x02]);

        let result = svc.upload(request(&payload, "cover", Some(&caller))).await;
        assert!(matches!(result, Err(UploadError::InvalidImage)));
        assert!(store.writes.lock().await.is_empty());
    }
}
