//! ============================================================================
//! Media Library - App-private storage for clothing photos
//! ============================================================================
//! Every stored photo gets two files:
//! - images/img_{millis}_{suffix}.{ext}   display-sized image
//! - thumbs/thumb_{millis}_{suffix}.{ext} grid thumbnail
//!
//! Resizing is delegated to an `ImageTransformer`. The default
//! `ResizeTransformer` shrinks photos to 1200px wide (thumbnails to 300px)
//! and re-encodes them as JPEG. When a transform fails the library keeps
//! going with the untransformed bytes rather than rejecting the photo.
//! ============================================================================

use anyhow::{anyhow, bail, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::types::ClothingItem;

/// File extensions recognised as photos (compared lowercase)
pub const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "gif"];

/// Display width of stored photos
pub const MAX_IMAGE_WIDTH: u32 = 1200;
/// Width of grid thumbnails
pub const THUMBNAIL_WIDTH: u32 = 300;

const IMAGES_DIR: &str = "images";
const THUMBS_DIR: &str = "thumbs";
const SUFFIX_LEN: usize = 9;

/// Produces the stored variants of a photo
pub trait ImageTransformer {
    /// Write the display-sized image for `source` to `dest`
    fn compress(&self, source: &Path, dest: &Path) -> Result<()>;

    /// Write the thumbnail for `source` to `dest`
    fn thumbnail(&self, source: &Path, dest: &Path) -> Result<()>;

    /// File extension for the stored files of `source`
    fn extension(&self, source: &Path) -> String {
        source_extension(source)
    }
}

/// Stores photos byte-for-byte
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyTransformer;

impl ImageTransformer for CopyTransformer {
    fn compress(&self, source: &Path, dest: &Path) -> Result<()> {
        copy_file(source, dest)
    }

    fn thumbnail(&self, source: &Path, dest: &Path) -> Result<()> {
        copy_file(source, dest)
    }
}

/// Scales photos down to a maximum width and stores them as JPEG.
/// Narrower photos keep their size; aspect ratio is always preserved.
#[derive(Debug, Clone, Copy)]
pub struct ResizeTransformer {
    pub max_width: u32,
    pub thumbnail_width: u32,
    pub quality: u8,
    pub thumbnail_quality: u8,
}

impl Default for ResizeTransformer {
    fn default() -> Self {
        Self {
            max_width: MAX_IMAGE_WIDTH,
            thumbnail_width: THUMBNAIL_WIDTH,
            quality: 80,
            thumbnail_quality: 70,
        }
    }
}

impl ResizeTransformer {
    fn resize_to_jpeg(&self, source: &Path, dest: &Path, width: u32, quality: u8) -> Result<()> {
        let img = image::open(source)
            .map_err(|e| anyhow!("Failed to decode {}: {}", source.display(), e))?;
        let img = fit_width(img, width);

        let file = std::fs::File::create(dest)
            .map_err(|e| anyhow!("Failed to create {}: {}", dest.display(), e))?;
        let mut writer = BufWriter::new(file);
        JpegEncoder::new_with_quality(&mut writer, quality)
            .encode_image(&img.to_rgb8())
            .map_err(|e| anyhow!("Failed to encode {}: {}", dest.display(), e))?;
        writer
            .flush()
            .map_err(|e| anyhow!("Failed to write {}: {}", dest.display(), e))?;
        Ok(())
    }
}

impl ImageTransformer for ResizeTransformer {
    fn compress(&self, source: &Path, dest: &Path) -> Result<()> {
        self.resize_to_jpeg(source, dest, self.max_width, self.quality)
    }

    fn thumbnail(&self, source: &Path, dest: &Path) -> Result<()> {
        self.resize_to_jpeg(source, dest, self.thumbnail_width, self.thumbnail_quality)
    }

    fn extension(&self, _source: &Path) -> String {
        "jpg".to_string()
    }
}

fn fit_width(img: DynamicImage, width: u32) -> DynamicImage {
    if img.width() <= width {
        return img;
    }
    let height = (u64::from(img.height()) * u64::from(width) / u64::from(img.width())).max(1);
    img.resize_exact(width, height as u32, FilterType::Triangle)
}

/// Locations of a stored photo, as recorded on a `ClothingItem`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredImage {
    pub image_uri: String,
    pub thumbnail_uri: String,
}

pub struct MediaLibrary<T: ImageTransformer = ResizeTransformer> {
    root: PathBuf,
    transformer: T,
}

impl MediaLibrary<ResizeTransformer> {
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        Self::with_transformer(root, ResizeTransformer::default())
    }
}

impl<T: ImageTransformer> MediaLibrary<T> {
    /// Open the library at `root`, creating its directories if needed
    pub fn with_transformer(root: impl AsRef<Path>, transformer: T) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        for dir in [root.join(IMAGES_DIR), root.join(THUMBS_DIR)] {
            std::fs::create_dir_all(&dir)
                .map_err(|e| anyhow!("Failed to create {}: {}", dir.display(), e))?;
        }
        Ok(Self { root, transformer })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Copy a photo into the library, producing its image and thumbnail
    pub fn store(&self, source: &Path) -> Result<StoredImage> {
        if !source.is_file() {
            bail!("Image not found: {}", source.display());
        }

        let name = unique_name();
        let ext = self.transformer.extension(source);
        let image_path = self.root.join(IMAGES_DIR).join(format!("img_{}.{}", name, ext));
        let thumb_path = self.root.join(THUMBS_DIR).join(format!("thumb_{}.{}", name, ext));

        if let Err(e) = self.transformer.compress(source, &image_path) {
            warn!("Failed to compress {}: {} - storing original", source.display(), e);
            copy_file(source, &image_path)?;
        }
        if let Err(e) = self.transformer.thumbnail(&image_path, &thumb_path) {
            warn!("Failed to generate thumbnail for {}: {} - using full image", source.display(), e);
            copy_file(&image_path, &thumb_path)?;
        }

        debug!("Stored {} as {}", source.display(), image_path.display());
        Ok(StoredImage {
            image_uri: image_path.to_string_lossy().into_owned(),
            thumbnail_uri: thumb_path.to_string_lossy().into_owned(),
        })
    }

    /// Remove an item's image and thumbnail. Files outside the library or
    /// already gone are skipped. Returns how many files were removed.
    pub fn delete(&self, item: &ClothingItem) -> usize {
        let root = match self.root.canonicalize() {
            Ok(root) => root,
            Err(e) => {
                warn!("Failed to resolve media library {}: {}", self.root.display(), e);
                return 0;
            }
        };

        let mut removed = 0;
        for uri in [&item.image_uri, &item.thumbnail_uri] {
            let path = match Path::new(uri).canonicalize() {
                Ok(path) => path,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    warn!("Failed to resolve {}: {}", uri, e);
                    continue;
                }
            };
            if !path.starts_with(&root) {
                warn!("Not deleting {}: outside media library", path.display());
                continue;
            }
            match std::fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to delete {}: {}", path.display(), e),
            }
        }
        debug!("Removed {} media files for item {}", removed, item.id);
        removed
    }
}

/// Whether a path names a photo by extension
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn source_extension(source: &Path) -> String {
    if is_image_file(source) {
        source
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .unwrap_or_else(|| "jpg".to_string())
    } else {
        "jpg".to_string()
    }
}

fn unique_name() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(|b| (b as char).to_ascii_lowercase())
        .collect();
    format!("{}_{}", chrono::Utc::now().timestamp_millis(), suffix)
}

fn copy_file(source: &Path, dest: &Path) -> Result<()> {
    std::fs::copy(source, dest)
        .map_err(|e| anyhow!("Failed to copy {} to {}: {}", source.display(), dest.display(), e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ClothingCategory;
    use tempfile::tempdir;

    struct FailingTransformer;

    impl ImageTransformer for FailingTransformer {
        fn compress(&self, _source: &Path, _dest: &Path) -> Result<()> {
            bail!("codec unavailable")
        }

        fn thumbnail(&self, _source: &Path, _dest: &Path) -> Result<()> {
            bail!("codec unavailable")
        }
    }

    #[test]
    fn test_is_image_file() {
        assert!(is_image_file(Path::new("a/b/shirt.JPG")));
        assert!(is_image_file(Path::new("boots.jpeg")));
        assert!(is_image_file(Path::new("scarf.gif")));
        assert!(!is_image_file(Path::new("notes.txt")));
        assert!(!is_image_file(Path::new("README")));
    }

    #[test]
    fn test_store_writes_image_and_thumbnail() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("Shirt.PNG");
        std::fs::write(&source, b"png-bytes").unwrap();
        let library = MediaLibrary::with_transformer(dir.path().join("media"), CopyTransformer).unwrap();

        let stored = library.store(&source).unwrap();
        let image = Path::new(&stored.image_uri);
        let thumb = Path::new(&stored.thumbnail_uri);

        assert!(image.starts_with(library.root().join("images")));
        assert!(thumb.starts_with(library.root().join("thumbs")));
        let image_name = image.file_name().unwrap().to_str().unwrap();
        assert!(image_name.starts_with("img_"));
        assert!(image_name.ends_with(".png"));
        assert_eq!(std::fs::read(image).unwrap(), b"png-bytes");
        assert_eq!(std::fs::read(thumb).unwrap(), b"png-bytes");

        let again = library.store(&source).unwrap();
        assert_ne!(again.image_uri, stored.image_uri);
    }

    #[test]
    fn test_failed_transforms_fall_back_to_original() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("coat.jpg");
        std::fs::write(&source, b"jpeg-bytes").unwrap();
        let library = MediaLibrary::with_transformer(dir.path().join("media"), FailingTransformer).unwrap();

        let stored = library.store(&source).unwrap();
        assert_eq!(std::fs::read(&stored.image_uri).unwrap(), b"jpeg-bytes");
        assert_eq!(std::fs::read(&stored.thumbnail_uri).unwrap(), b"jpeg-bytes");
    }

    #[test]
    fn test_resize_scales_down_wide_photos() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("coat.png");
        image::RgbImage::new(2400, 1200).save(&source).unwrap();
        let library = MediaLibrary::open(dir.path().join("media")).unwrap();

        let stored = library.store(&source).unwrap();
        assert!(stored.image_uri.ends_with(".jpg"));
        assert!(stored.thumbnail_uri.ends_with(".jpg"));
        assert_eq!(image::image_dimensions(&stored.image_uri).unwrap(), (1200, 600));
        assert_eq!(image::image_dimensions(&stored.thumbnail_uri).unwrap(), (300, 150));
    }

    #[test]
    fn test_resize_keeps_narrow_photos() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("sock.png");
        image::RgbImage::new(200, 100).save(&source).unwrap();
        let library = MediaLibrary::open(dir.path().join("media")).unwrap();

        let stored = library.store(&source).unwrap();
        assert_eq!(image::image_dimensions(&stored.image_uri).unwrap(), (200, 100));
        assert_eq!(image::image_dimensions(&stored.thumbnail_uri).unwrap(), (200, 100));
    }

    #[test]
    fn test_resize_undecodable_photo_stores_original_bytes() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("scan.jpg");
        std::fs::write(&source, b"not really a jpeg").unwrap();
        let library = MediaLibrary::open(dir.path().join("media")).unwrap();

        let stored = library.store(&source).unwrap();
        assert_eq!(std::fs::read(&stored.image_uri).unwrap(), b"not really a jpeg");
        assert_eq!(std::fs::read(&stored.thumbnail_uri).unwrap(), b"not really a jpeg");
    }

    #[test]
    fn test_store_missing_source_fails() {
        let dir = tempdir().unwrap();
        let library = MediaLibrary::open(dir.path().join("media")).unwrap();
        assert!(library.store(&dir.path().join("nope.jpg")).is_err());
    }

    #[test]
    fn test_delete_removes_library_files_only() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("hat.jpg");
        std::fs::write(&source, b"hat").unwrap();
        let library = MediaLibrary::open(dir.path().join("media")).unwrap();

        let stored = library.store(&source).unwrap();
        let item = ClothingItem::new(stored.image_uri.clone(), stored.thumbnail_uri.clone(), ClothingCategory::Accessory);
        assert_eq!(library.delete(&item), 2);
        assert!(!Path::new(&stored.image_uri).exists());
        assert_eq!(library.delete(&item), 0);

        let outside = ClothingItem::new(
            source.to_string_lossy().into_owned(),
            source.to_string_lossy().into_owned(),
            ClothingCategory::Accessory,
        );
        assert_eq!(library.delete(&outside), 0);
        assert!(source.exists());
    }

    #[test]
    fn test_delete_ignores_paths_escaping_library() {
        let dir = tempdir().unwrap();
        let victim = dir.path().join("keep.jpg");
        std::fs::write(&victim, b"keep").unwrap();
        let library = MediaLibrary::open(dir.path().join("media")).unwrap();

        let sneaky = library
            .root()
            .join("images")
            .join("..")
            .join("..")
            .join("keep.jpg")
            .to_string_lossy()
            .into_owned();
        let item = ClothingItem::new(sneaky.clone(), sneaky, ClothingCategory::Shoes);

        assert_eq!(library.delete(&item), 0);
        assert!(victim.exists());
    }
}
