//! Entity asset names.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::AssetKind;

/// Entity asset name: the `"<kind>:<id>"` join key for edges between assets.
///
/// Two assets built from the same kind (or refined type) and id always get the
/// same `Ean`, so an edge written by one collector resolves against an asset
/// emitted by another.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ean(String);

impl Ean {
    /// Build an EAN from a kind or refined type string and a raw id.
    pub fn new(kind: &str, id: &str) -> Self {
        Self(format!("{}:{}", kind, id))
    }

    /// Build an EAN for one of the known asset kinds.
    pub fn of(kind: AssetKind, id: &str) -> Self {
        Self::new(kind.as_str(), id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Ean {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Ean {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
