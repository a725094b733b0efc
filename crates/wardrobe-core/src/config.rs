//! ============================================================================
//! Wardrobe Configuration - Where the database and media live
//! ============================================================================
//! Resolution order for each path: explicit value, then environment, then the
//! default under ~/.wardrobe.
//!
//! | Variable             | Effect                                  |
//! |----------------------|-----------------------------------------|
//! | `WARDROBE_DB_PATH`   | Database file                           |
//! | `WARDROBE_MEDIA_DIR` | Stored images and thumbnails            |
//! | `WARDROBE_HOME`      | Base directory for both defaults        |
//! ============================================================================

use anyhow::{anyhow, Result};
use std::path::PathBuf;
use tracing::debug;

pub const DB_PATH_ENV: &str = "WARDROBE_DB_PATH";
pub const MEDIA_DIR_ENV: &str = "WARDROBE_MEDIA_DIR";
pub const HOME_ENV: &str = "WARDROBE_HOME";

const DEFAULT_DIR_NAME: &str = ".wardrobe";
const DB_FILE_NAME: &str = "wardrobe.redb";
const MEDIA_DIR_NAME: &str = "media";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WardrobeConfig {
    pub db_path: PathBuf,
    pub media_dir: PathBuf,
}

impl WardrobeConfig {
    /// Resolve paths from explicit overrides and the process environment
    pub fn resolve(db_path: Option<&str>, media_dir: Option<&str>) -> Result<Self> {
        Self::resolve_with(db_path, media_dir, |key| std::env::var(key).ok())
    }

    /// Same as `resolve`, reading variables through `env`
    pub fn resolve_with<F>(db_path: Option<&str>, media_dir: Option<&str>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let home = || -> Result<PathBuf> {
            if let Some(dir) = env(HOME_ENV) {
                return Ok(PathBuf::from(dir));
            }
            let home = dirs::home_dir().ok_or_else(|| anyhow!("Cannot determine home directory"))?;
            Ok(home.join(DEFAULT_DIR_NAME))
        };

        let db_path = match db_path.map(str::to_string).or_else(|| env(DB_PATH_ENV)) {
            Some(path) => PathBuf::from(path),
            None => home()?.join(DB_FILE_NAME),
        };
        let media_dir = match media_dir.map(str::to_string).or_else(|| env(MEDIA_DIR_ENV)) {
            Some(path) => PathBuf::from(path),
            None => home()?.join(MEDIA_DIR_NAME),
        };

        debug!("Database path: {}, media dir: {}", db_path.display(), media_dir.display());
        Ok(Self { db_path, media_dir })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_explicit_paths_win() {
        let env = env_of(&[(DB_PATH_ENV, "/env/db.redb"), (MEDIA_DIR_ENV, "/env/media")]);
        let config = WardrobeConfig::resolve_with(Some("/cli/db.redb"), Some("/cli/media"), env).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/cli/db.redb"));
        assert_eq!(config.media_dir, PathBuf::from("/cli/media"));
    }

    #[test]
    fn test_env_overrides_defaults() {
        let env = env_of(&[(DB_PATH_ENV, "/env/db.redb"), (HOME_ENV, "/srv/wardrobe")]);
        let config = WardrobeConfig::resolve_with(None, None, env).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/env/db.redb"));
        assert_eq!(config.media_dir, PathBuf::from("/srv/wardrobe/media"));
    }

    #[test]
    fn test_home_env_sets_both_defaults() {
        let env = env_of(&[(HOME_ENV, "/srv/wardrobe")]);
        let config = WardrobeConfig::resolve_with(None, None, env).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/srv/wardrobe/wardrobe.redb"));
        assert_eq!(config.media_dir, PathBuf::from("/srv/wardrobe/media"));
    }
}
