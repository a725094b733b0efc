//! ============================================================================
//! Database Types - Update and summary records for the wardrobe store
//! ============================================================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{ClothingCategory, ClothingItem};

/// Partial update for a stored clothing item. `None` fields are left as-is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemUpdate {
    pub category: Option<ClothingCategory>,
    pub image_uri: Option<String>,
    pub thumbnail_uri: Option<String>,
}

impl ItemUpdate {
    pub fn category(category: ClothingCategory) -> Self {
        Self {
            category: Some(category),
            ..Self::default()
        }
    }

    pub(crate) fn apply(self, item: &mut ClothingItem) {
        if let Some(category) = self.category {
            item.category = category;
        }
        if let Some(uri) = self.image_uri {
            item.image_uri = uri;
        }
        if let Some(uri) = self.thumbnail_uri {
            item.thumbnail_uri = uri;
        }
    }
}

/// Counts reported by `WardrobeDb::stats`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbStats {
    pub total_items: usize,
    /// Only categories with at least one item, in display order
    pub item_counts: BTreeMap<ClothingCategory, usize>,
    pub total_outfits: usize,
    pub favorite_outfits: usize,
}
