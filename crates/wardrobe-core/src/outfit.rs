//! ============================================================================
//! Outfit Composer - Random outfit suggestions from the catalog
//! ============================================================================
//! Builds outfits as: one top + one bottom + optional outerwear + up to two
//! accessories, retrying to avoid repeating an outfit already in history.
//!
//! ```text
//! catalog ──partition──> tops | bottoms | outerwear | accessories
//!                                  │
//!                     draw candidate (≤ 20 attempts)
//!                                  │
//!               same id set as a history outfit? ── no ──> Outfit
//!                                  │ yes, every attempt
//!                                  ▼
//!                        fresh top + bottom only
//! ```
//!
//! Nothing here touches storage; callers load the catalog and history first.
//! ============================================================================

use rand::rngs::ThreadRng;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::types::{ClothingItem, Outfit, Slot};

/// Candidates drawn before giving up on avoiding history
pub const MAX_ATTEMPTS: usize = 20;
/// Chance of adding a coat or jacket when one exists
pub const OUTERWEAR_PROBABILITY: f64 = 0.5;
/// Chance of adding accessories when any exist
pub const ACCESSORY_PROBABILITY: f64 = 0.7;
/// Chance of wanting a second accessory once accessories are added
pub const SECOND_ACCESSORY_PROBABILITY: f64 = 0.5;
pub const MAX_ACCESSORIES: usize = 2;

/// Catalog split by slot
struct Partitions<'a> {
    tops: Vec<&'a ClothingItem>,
    bottoms: Vec<&'a ClothingItem>,
    outerwear: Vec<&'a ClothingItem>,
    accessories: Vec<&'a ClothingItem>,
}

impl<'a> Partitions<'a> {
    fn of(catalog: &'a [ClothingItem]) -> Self {
        let mut partitions = Self {
            tops: Vec::new(),
            bottoms: Vec::new(),
            outerwear: Vec::new(),
            accessories: Vec::new(),
        };
        for item in catalog {
            match item.category.slot() {
                Slot::Top => partitions.tops.push(item),
                Slot::Bottom => partitions.bottoms.push(item),
                Slot::Outerwear => partitions.outerwear.push(item),
                Slot::Accessory => partitions.accessories.push(item),
            }
        }
        partitions
    }

    fn can_dress(&self) -> bool {
        !self.tops.is_empty() && !self.bottoms.is_empty()
    }
}

/// Outfit generator over a pluggable random source.
///
/// Use [`OutfitComposer::new`] for everyday suggestions and
/// [`OutfitComposer::with_rng`] with a seeded RNG when results must be
/// reproducible.
pub struct OutfitComposer<R: Rng = ThreadRng> {
    rng: R,
}

impl OutfitComposer<ThreadRng> {
    pub fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }
}

impl Default for OutfitComposer<ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> OutfitComposer<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Compose one outfit that preferably differs from everything in `history`.
    ///
    /// Returns `None` when the catalog lacks a top or a bottom. If every
    /// attempt repeats a history outfit, a plain top + bottom pair is returned
    /// without checking history again, so that result may be a repeat.
    pub fn compose(&mut self, catalog: &[ClothingItem], history: &[Outfit]) -> Option<Outfit> {
        let seen: Vec<&Outfit> = history.iter().collect();
        self.compose_against(catalog, &seen)
    }

    /// Swap `target` for a different item of the same category.
    ///
    /// The replacement keeps the target's position; the new outfit gets a
    /// fresh id and timestamp and keeps the favorite flag. Returns `None` when
    /// the catalog has no other item in that category, or when `target` is
    /// not part of the outfit.
    pub fn replace(
        &mut self,
        outfit: &Outfit,
        target: &ClothingItem,
        catalog: &[ClothingItem],
    ) -> Option<Outfit> {
        if !outfit.contains_item(&target.id) {
            debug!("Item {} is not part of outfit {}", target.id, outfit.id);
            return None;
        }

        let candidates: Vec<&ClothingItem> = catalog
            .iter()
            .filter(|item| item.category == target.category && item.id != target.id)
            .collect();

        let Some(replacement) = candidates.choose(&mut self.rng).copied() else {
            debug!("No alternative {} to swap for {}", target.category, target.id);
            return None;
        };

        let items = outfit
            .items
            .iter()
            .map(|item| {
                if item.id == target.id {
                    replacement.clone()
                } else {
                    item.clone()
                }
            })
            .collect();

        debug!("Replaced {} with {} in outfit {}", target.id, replacement.id, outfit.id);
        Some(self.finish(items, outfit.is_favorite))
    }

    /// Compose up to `count` outfits, each avoiding `history` and the ones
    /// composed before it. Stops early when the catalog cannot dress anyone.
    pub fn compose_many(
        &mut self,
        catalog: &[ClothingItem],
        count: usize,
        history: &[Outfit],
    ) -> Vec<Outfit> {
        if !Partitions::of(catalog).can_dress() {
            debug!("Cannot compose outfits: catalog lacks a top or a bottom");
            return Vec::new();
        }

        let mut produced: Vec<Outfit> = Vec::new();
        while produced.len() < count {
            let next = {
                let seen: Vec<&Outfit> = history.iter().chain(produced.iter()).collect();
                self.compose_against(catalog, &seen)
            };
            match next {
                Some(outfit) => produced.push(outfit),
                None => break,
            }
        }

        produced
    }

    fn compose_against(&mut self, catalog: &[ClothingItem], history: &[&Outfit]) -> Option<Outfit> {
        let wardrobe = Partitions::of(catalog);
        if !wardrobe.can_dress() {
            debug!(
                "Cannot compose outfit: {} tops, {} bottoms",
                wardrobe.tops.len(),
                wardrobe.bottoms.len()
            );
            return None;
        }

        for attempt in 1..=MAX_ATTEMPTS {
            let candidate = self.draw(&wardrobe)?;
            let repeated = history
                .iter()
                .any(|outfit| same_item_set(&outfit.items, &candidate));
            if !repeated {
                debug!("Composed {}-piece outfit on attempt {}", candidate.len(), attempt);
                return Some(self.finish(candidate, false));
            }
        }

        debug!(
            "All {} attempts repeated history, falling back to top + bottom",
            MAX_ATTEMPTS
        );
        let fallback = self.draw_required(&wardrobe)?;
        Some(self.finish(fallback, false))
    }

    fn draw_required(&mut self, wardrobe: &Partitions<'_>) -> Option<Vec<ClothingItem>> {
        let top = wardrobe.tops.choose(&mut self.rng)?;
        let bottom = wardrobe.bottoms.choose(&mut self.rng)?;
        Some(vec![(*top).clone(), (*bottom).clone()])
    }

    fn draw(&mut self, wardrobe: &Partitions<'_>) -> Option<Vec<ClothingItem>> {
        let mut items = self.draw_required(wardrobe)?;

        if !wardrobe.outerwear.is_empty() && self.rng.gen_bool(OUTERWEAR_PROBABILITY) {
            if let Some(outer) = wardrobe.outerwear.choose(&mut self.rng) {
                items.push((*outer).clone());
            }
        }

        if !wardrobe.accessories.is_empty() && self.rng.gen_bool(ACCESSORY_PROBABILITY) {
            let wanted = if self.rng.gen_bool(SECOND_ACCESSORY_PROBABILITY) {
                MAX_ACCESSORIES
            } else {
                1
            };
            let count = wanted.min(wardrobe.accessories.len());
            items.extend(
                wardrobe
                    .accessories
                    .choose_multiple(&mut self.rng, count)
                    .map(|item| (*item).clone()),
            );
        }

        Some(items)
    }

    fn finish(&mut self, items: Vec<ClothingItem>, is_favorite: bool) -> Outfit {
        Outfit {
            id: self.next_id(),
            items,
            created_at: chrono::Utc::now().timestamp_millis(),
            is_favorite,
        }
    }

    fn next_id(&mut self) -> String {
        uuid::Builder::from_random_bytes(self.rng.gen())
            .into_uuid()
            .to_string()
    }
}

/// Order-independent comparison of two item lists by id
pub fn same_item_set(a: &[ClothingItem], b: &[ClothingItem]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut left: Vec<&str> = a.iter().map(|item| item.id.as_str()).collect();
    let mut right: Vec<&str> = b.iter().map(|item| item.id.as_str()).collect();
    left.sort_unstable();
    right.sort_unstable();
    left == right
}

/// Compose one outfit using the thread RNG
pub fn compose_outfit(catalog: &[ClothingItem], history: &[Outfit]) -> Option<Outfit> {
    OutfitComposer::new().compose(catalog, history)
}

/// Replace one item of an outfit using the thread RNG
pub fn replace_item(
    outfit: &Outfit,
    target: &ClothingItem,
    catalog: &[ClothingItem],
) -> Option<Outfit> {
    OutfitComposer::new().replace(outfit, target, catalog)
}

/// Compose a batch of outfits using the thread RNG
pub fn compose_many(catalog: &[ClothingItem], count: usize, history: &[Outfit]) -> Vec<Outfit> {
    OutfitComposer::new().compose_many(catalog, count, history)
}
