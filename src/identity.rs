//! Rotating client identities (user-agent strings).

use std::fs;
use std::path::Path;

use rand::seq::SliceRandom;
use tracing::debug;

use crate::app::{Result, SkimmerError};

/// An opaque client identity presented to the target site.
pub type Identity = String;

const BUNDLED_USER_AGENTS: &str = include_str!("../assets/user-agents.txt");

/// Immutable pool of identities, picked from uniformly at random.
///
/// Shared read-only across all tasks of a crawl.
#[derive(Debug, Clone, Default)]
pub struct IdentityPool {
    identities: Vec<Identity>,
}

impl IdentityPool {
    pub fn new(identities: Vec<Identity>) -> Self {
        Self { identities }
    }

    /// Parse one identity per line, ignoring blank lines and `#` comments.
    pub fn from_lines(text: &str) -> Self {
        let identities = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(String::from)
            .collect();
        Self { identities }
    }

    /// The user-agent list compiled into the binary.
    pub fn bundled() -> Self {
        Self::from_lines(BUNDLED_USER_AGENTS)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let pool = Self::from_lines(&text);
        debug!("Loaded {} identities from {}", pool.len(), path.display());
        Ok(pool)
    }

    /// Pick one identity. The same identity may be handed to concurrent callers.
    pub fn pick(&self) -> Result<Identity> {
        self.identities
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or_else(Self::empty_error)
    }

    /// Fail with a configuration error if no identity can ever be picked.
    pub fn ensure_non_empty(&self) -> Result<()> {
        if self.identities.is_empty() {
            Err(Self::empty_error())
        } else {
            Ok(())
        }
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    fn empty_error() -> SkimmerError {
        SkimmerError::Config("identity pool is empty".to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tokio_test::{assert_err, assert_ok};

    use super::*;

    #[test]
    fn test_from_lines_skips_blanks_and_comments() {
        let pool = IdentityPool::from_lines("# agents\nAgent/1\n\n   \n  Agent/2  \n");
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.identities, vec!["Agent/1", "Agent/2"]);
    }

    #[test]
    fn test_pick_returns_member() {
        let pool = IdentityPool::new(vec!["A".into(), "B".into(), "C".into()]);
        for _ in 0..50 {
            let picked = assert_ok!(pool.pick());
            assert!(pool.identities.contains(&picked));
        }
    }

    #[test]
    fn test_single_identity_is_reused() {
        let pool = IdentityPool::new(vec!["Only/1.0".into()]);
        assert_eq!(pool.pick().unwrap(), "Only/1.0");
        assert_eq!(pool.pick().unwrap(), "Only/1.0");
    }

    #[test]
    fn test_empty_pool_is_configuration_error() {
        let pool = IdentityPool::from_lines("\n# nothing here\n");
        assert!(pool.is_empty());
        let err = assert_err!(pool.pick());
        assert!(matches!(err, SkimmerError::Config(_)));
        assert_err!(pool.ensure_non_empty());
    }

    #[test]
    fn test_bundled_pool_is_usable() {
        let pool = IdentityPool::bundled();
        assert!(pool.len() >= 5);
        assert!(pool.pick().unwrap().starts_with("Mozilla/5.0"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Custom/1.0").unwrap();
        writeln!(file, "Custom/2.0").unwrap();

        let pool = IdentityPool::load(file.path()).unwrap();
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = IdentityPool::load(&dir.path().join("missing.txt")).unwrap_err();
        assert!(matches!(err, SkimmerError::Io(_)));
    }
}
