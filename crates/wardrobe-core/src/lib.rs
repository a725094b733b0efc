//! ============================================================================
//! WARDROBE-CORE: Catalog and Outfit Suggestions
//! ============================================================================
//! This crate handles all backend logic for the wardrobe app:
//! - Random outfit composition with history-aware duplicate avoidance
//! - Embedded catalog store (redb) for clothing items and saved outfits
//! - App-private media library for photos and thumbnails
//! - Bulk import from category-sorted folders
//! ============================================================================

pub mod config;
pub mod db;
pub mod error;
pub mod import;
pub mod media;
pub mod outfit;
pub mod types;

// Re-export main types for convenience
pub use config::WardrobeConfig;
pub use db::{CatalogStore, DbStats, ItemUpdate, WardrobeDb};
pub use error::WardrobeError;
pub use import::{
    create_category_folders, folder_stats, import_folder, import_one, scan_category_folders,
    CategoryCount, ImportFailure, ImportReport,
};
pub use media::{CopyTransformer, ImageTransformer, MediaLibrary, ResizeTransformer, StoredImage};
pub use outfit::{compose_many, compose_outfit, replace_item, same_item_set, OutfitComposer};
pub use types::*;
