/// Typed failures surfaced by the wardrobe store and CLI.
///
/// The outfit engine never returns these: an empty wardrobe or a missing
/// alternative is reported as `None`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WardrobeError {
    #[error("Clothing item not found: {0}")]
    ItemNotFound(String),

    #[error("Outfit not found: {0}")]
    OutfitNotFound(String),

    #[error(
        "Unknown category '{0}'. Valid values: coat, jacket, top, pants, long-skirt, short-skirt, shoes, accessory"
    )]
    UnknownCategory(String),
}
