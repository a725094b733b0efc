//! ============================================================================
//! Folder Import - Bulk-add photos sorted into category folders
//! ============================================================================
//! Expected layout, one subfolder per category (see `folder_name`):
//!
//! ```text
//! base/
//!   大衣/  外套/  上衣/  裤子/  长裙/  短裙/  鞋子/  配饰/
//! ```
//!
//! Import is sequential and keeps going past bad files; the report counts
//! successes and failures separately.
//! ============================================================================

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::db::CatalogStore;
use crate::media::{is_image_file, ImageTransformer, MediaLibrary};
use crate::types::{ClothingCategory, ClothingItem};

/// Photos found for one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: ClothingCategory,
    pub folder: String,
    pub count: usize,
}

/// A photo that could not be imported
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Outcome of `import_folder`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportReport {
    pub imported: Vec<ClothingItem>,
    pub failed: Vec<ImportFailure>,
}

impl ImportReport {
    pub fn imported_count(&self) -> usize {
        self.imported.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }
}

/// Create `base` and any missing category subfolders. Returns how many
/// subfolders were created.
pub fn create_category_folders(base: &Path) -> Result<usize> {
    std::fs::create_dir_all(base)
        .map_err(|e| anyhow!("Failed to create {}: {}", base.display(), e))?;

    let mut created = 0;
    for category in ClothingCategory::ALL {
        let folder = base.join(category.folder_name());
        if folder.is_dir() {
            continue;
        }
        std::fs::create_dir_all(&folder)
            .map_err(|e| anyhow!("Failed to create {}: {}", folder.display(), e))?;
        debug!("Created folder: {}", folder.display());
        created += 1;
    }

    info!("Category folders ready under {} ({} created)", base.display(), created);
    Ok(created)
}

/// List photos in each category subfolder, sorted by path. Categories
/// without photos are left out; unreadable subfolders are skipped.
pub fn scan_category_folders(base: &Path) -> Result<BTreeMap<ClothingCategory, Vec<PathBuf>>> {
    if !base.is_dir() {
        bail!("Folder not found: {}", base.display());
    }

    let mut found = BTreeMap::new();
    for category in ClothingCategory::ALL {
        let folder = base.join(category.folder_name());
        if !folder.is_dir() {
            continue;
        }

        let entries = match std::fs::read_dir(&folder) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to read folder {}: {}", folder.display(), e);
                continue;
            }
        };

        let mut images: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && is_image_file(path))
            .collect();
        images.sort();

        if !images.is_empty() {
            debug!("Found {} images in {}", images.len(), category.folder_name());
            found.insert(category, images);
        }
    }

    Ok(found)
}

/// Photo counts per category folder
pub fn folder_stats(base: &Path) -> Result<Vec<CategoryCount>> {
    Ok(scan_category_folders(base)?
        .into_iter()
        .map(|(category, images)| CategoryCount {
            category,
            folder: category.folder_name().to_string(),
            count: images.len(),
        })
        .collect())
}

/// Store every photo under `base` in the media library and add it to the
/// catalog under its folder's category.
pub fn import_folder<S: CatalogStore + ?Sized, T: ImageTransformer>(
    db: &S,
    media: &MediaLibrary<T>,
    base: &Path,
) -> Result<ImportReport> {
    let found = scan_category_folders(base)?;
    let mut report = ImportReport::default();

    for (category, images) in found {
        for path in images {
            match import_one(db, media, &path, category) {
                Ok(item) => report.imported.push(item),
                Err(e) => {
                    warn!("Failed to import {}: {}", path.display(), e);
                    report.failed.push(ImportFailure {
                        path,
                        error: e.to_string(),
                    });
                }
            }
        }
    }

    info!(
        "Imported {} items from {} ({} failed)",
        report.imported_count(),
        base.display(),
        report.failed_count()
    );
    Ok(report)
}

/// Store a single photo and add it to the catalog. The stored files are
/// removed again if the catalog rejects the item.
pub fn import_one<S: CatalogStore + ?Sized, T: ImageTransformer>(
    db: &S,
    media: &MediaLibrary<T>,
    path: &Path,
    category: ClothingCategory,
) -> Result<ClothingItem> {
    let stored = media.store(path)?;
    let item = ClothingItem::new(stored.image_uri, stored.thumbnail_uri, category);
    if let Err(e) = db.persist_item(&item) {
        media.delete(&item);
        return Err(e);
    }
    Ok(item)
}
