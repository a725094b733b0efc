//! ============================================================================
//! Core Types for the Wardrobe
//! ============================================================================
//! Clothing items, outfits, and the fixed category taxonomy.
//! Field names serialize in camelCase so stored JSON stays readable by the
//! mobile frontend.
//! ============================================================================

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Clothing category. Closed set; declaration order is display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClothingCategory {
    Coat,
    Jacket,
    Top,
    Pants,
    LongSkirt,
    ShortSkirt,
    Shoes,
    /// Hats, scarves, gloves and the like
    Accessory,
}

impl ClothingCategory {
    /// Every category in display order
    pub const ALL: [ClothingCategory; 8] = [
        ClothingCategory::Coat,
        ClothingCategory::Jacket,
        ClothingCategory::Top,
        ClothingCategory::Pants,
        ClothingCategory::LongSkirt,
        ClothingCategory::ShortSkirt,
        ClothingCategory::Shoes,
        ClothingCategory::Accessory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Coat => "coat",
            Self::Jacket => "jacket",
            Self::Top => "top",
            Self::Pants => "pants",
            Self::LongSkirt => "long-skirt",
            Self::ShortSkirt => "short-skirt",
            Self::Shoes => "shoes",
            Self::Accessory => "accessory",
        }
    }

    /// Display name
    pub fn label(&self) -> &'static str {
        match self {
            Self::Coat => "Coat",
            Self::Jacket => "Jacket",
            Self::Top => "Top",
            Self::Pants => "Pants",
            Self::LongSkirt => "Long skirt",
            Self::ShortSkirt => "Short skirt",
            Self::Shoes => "Shoes",
            Self::Accessory => "Accessory",
        }
    }

    /// Subfolder name used by the import folder layout
    pub fn folder_name(&self) -> &'static str {
        match self {
            Self::Coat => "大衣",
            Self::Jacket => "外套",
            Self::Top => "上衣",
            Self::Pants => "裤子",
            Self::LongSkirt => "长裙",
            Self::ShortSkirt => "短裙",
            Self::Shoes => "鞋子",
            Self::Accessory => "配饰",
        }
    }

    /// The outfit slot this category fills
    pub fn slot(&self) -> Slot {
        match self {
            Self::Top => Slot::Top,
            Self::Pants | Self::LongSkirt | Self::ShortSkirt => Slot::Bottom,
            Self::Coat | Self::Jacket => Slot::Outerwear,
            Self::Shoes | Self::Accessory => Slot::Accessory,
        }
    }
}

impl std::fmt::Display for ClothingCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ClothingCategory {
    type Err = crate::WardrobeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| crate::WardrobeError::UnknownCategory(s.to_string()))
    }
}

/// Category group an outfit position draws from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Required, exactly one
    Top,
    /// Required, exactly one of pants / long skirt / short skirt
    Bottom,
    /// Optional coat or jacket
    Outerwear,
    /// Optional shoes or accessories, up to two
    Accessory,
}

/// A photographed or imported piece of clothing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClothingItem {
    pub id: String,
    pub image_uri: String,
    pub thumbnail_uri: String,
    pub category: ClothingCategory,
    /// Epoch milliseconds
    pub added_at: i64,
}

impl ClothingItem {
    /// Create a new item with a fresh id, stamped now
    pub fn new(
        image_uri: impl Into<String>,
        thumbnail_uri: impl Into<String>,
        category: ClothingCategory,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            image_uri: image_uri.into(),
            thumbnail_uri: thumbnail_uri.into(),
            category,
            added_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// A set of items worn together.
///
/// Items are snapshots taken when the outfit was built; deleting an item from
/// the catalog later leaves saved outfits untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outfit {
    pub id: String,
    /// Top, bottom, then optional outerwear and accessories
    pub items: Vec<ClothingItem>,
    /// Epoch milliseconds
    pub created_at: i64,
    pub is_favorite: bool,
}

impl Outfit {
    pub fn item_ids(&self) -> Vec<&str> {
        self.items.iter().map(|item| item.id.as_str()).collect()
    }

    pub fn contains_item(&self, item_id: &str) -> bool {
        self.items.iter().any(|item| item.id == item_id)
    }

    /// Number of items filling the given slot
    pub fn count_in(&self, slot: Slot) -> usize {
        self.items
            .iter()
            .filter(|item| item.category.slot() == slot)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse() {
        assert_eq!("long-skirt".parse::<ClothingCategory>().unwrap(), ClothingCategory::LongSkirt);
        assert_eq!("Short_Skirt".parse::<ClothingCategory>().unwrap(), ClothingCategory::ShortSkirt);
        assert!("hat".parse::<ClothingCategory>().is_err());
    }

    #[test]
    fn test_category_slots() {
        assert_eq!(ClothingCategory::Top.slot(), Slot::Top);
        for c in [ClothingCategory::Pants, ClothingCategory::LongSkirt, ClothingCategory::ShortSkirt] {
            assert_eq!(c.slot(), Slot::Bottom);
        }
        assert_eq!(ClothingCategory::Jacket.slot(), Slot::Outerwear);
        assert_eq!(ClothingCategory::Shoes.slot(), Slot::Accessory);
    }

    #[test]
    fn test_item_json_shape() {
        let item = ClothingItem {
            id: "item_1".into(),
            image_uri: "file:///img.jpg".into(),
            thumbnail_uri: "file:///thumb.jpg".into(),
            category: ClothingCategory::LongSkirt,
            added_at: 1_700_000_000_000,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["imageUri"], "file:///img.jpg");
        assert_eq!(json["category"], "long-skirt");
        assert_eq!(json["addedAt"], 1_700_000_000_000i64);
    }

    #[test]
    fn test_outfit_reads_frontend_json() {
        let raw = r#"{
            "id": "outfit_1",
            "items": [
                {"id": "a", "imageUri": "i", "thumbnailUri": "t", "category": "top", "addedAt": 1},
                {"id": "b", "imageUri": "i", "thumbnailUri": "t", "category": "pants", "addedAt": 2}
            ],
            "createdAt": 3,
            "isFavorite": true
        }"#;
        let outfit: Outfit = serde_json::from_str(raw).unwrap();
        assert!(outfit.is_favorite);
        assert_eq!(outfit.item_ids(), vec!["a", "b"]);
        assert_eq!(outfit.count_in(Slot::Bottom), 1);
        assert!(outfit.contains_item("a"));
    }
}
