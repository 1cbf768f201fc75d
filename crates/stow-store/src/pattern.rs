use std::fmt;

use globset::{Glob, GlobMatcher};
use stow_types::ObjectId;

use crate::error::{StoreError, StoreResult};

/// Glob-style filter over object ids (`*`, `?`, `[...]`, `{a,b}`).
///
/// Every shipped backend uses the same dialect so that `get_ids` behaves
/// identically whether records live in memory or on disk.
#[derive(Clone)]
pub struct IdPattern {
    source: String,
    matcher: GlobMatcher,
}

impl IdPattern {
    /// Compile a glob pattern.
    pub fn new(pattern: &str) -> StoreResult<Self> {
        let glob = Glob::new(pattern).map_err(|e| StoreError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            source: pattern.to_string(),
            matcher: glob.compile_matcher(),
        })
    }

    /// Pattern matching every conventional id minted with `prefix`,
    /// i.e. `<prefix>_*` with the prefix taken literally.
    pub fn with_prefix(prefix: &str) -> StoreResult<Self> {
        Self::new(&format!("{}_*", globset::escape(prefix)))
    }

    /// Whether `id` matches.
    pub fn matches(&self, id: &ObjectId) -> bool {
        self.matcher.is_match(id.as_str())
    }

    /// The original pattern text.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Debug for IdPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdPattern({:?})", self.source)
    }
}

impl fmt::Display for IdPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Apply an optional pattern, keeping everything when it is `None`.
pub(crate) fn keep(pattern: Option<&IdPattern>, id: &ObjectId) -> bool {
    pattern.map_or(true, |p| p.matches(id))
}
