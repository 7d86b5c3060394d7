//! The forest manifest: which trees make up the current forest.
//!
//! The manifest is a small JSON document naming, in order, the forest's
//! subtrees by `(height, id)` — the id being the tree's root digest in hex,
//! which is also its file name — plus the cached forest root. Together with
//! the referenced tree files it is the complete persisted state.
//!
//! Updates are atomic: the new manifest is written to a temporary path in
//! the same directory and renamed over the old one.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use canopy_core::{Element, Error, Hash, HashAlgorithm, Result};
use canopy_forest::Forest;

/// Current manifest format version.
pub const MANIFEST_VERSION: u32 = 1;

/// Manifest file name within a store directory.
pub const MANIFEST_FILE: &str = "MANIFEST.json";

/// One subtree reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Subtree height.
    pub height: u32,
    /// Root digest in hex; also the tree's file stem.
    pub id: String,
}

/// The persisted description of a forest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestManifest {
    /// Manifest format version.
    pub version: u32,
    /// Hash primitive of the committed forest.
    pub algorithm: HashAlgorithm,
    /// Total element count.
    pub cardinality: u64,
    /// Cached forest root in hex.
    pub root: String,
    /// Subtrees, tallest first.
    pub trees: Vec<ManifestEntry>,
}

impl ForestManifest {
    /// Describe a forest.
    pub fn describe<E: Element>(forest: &Forest<E>) -> Self {
        Self {
            version: MANIFEST_VERSION,
            algorithm: HashAlgorithm::Sha256,
            cardinality: forest.cardinality(),
            root: forest.root().to_hex(),
            trees: forest
                .trees()
                .iter()
                .map(|t| ManifestEntry {
                    height: t.height(),
                    id: t.root().to_hex(),
                })
                .collect(),
        }
    }

    /// The cached forest root.
    pub fn root_hash(&self) -> Result<Hash> {
        Hash::from_hex(&self.root)
    }

    /// Check version and the canonical height ordering.
    pub fn validate(&self) -> Result<()> {
        if self.version != MANIFEST_VERSION {
            return Err(Error::invalid_input(format!(
                "unsupported manifest version {}",
                self.version
            )));
        }
        for pair in self.trees.windows(2) {
            if pair[0].height <= pair[1].height {
                return Err(Error::corruption(format!(
                    "manifest heights not strictly decreasing: {} then {}",
                    pair[0].height, pair[1].height
                )));
            }
        }
        Ok(())
    }

    /// Load the manifest from a store directory.
    pub fn load(dir: &Path) -> Result<Self> {
        let bytes = fs::read(dir.join(MANIFEST_FILE))?;
        let manifest: Self = serde_json::from_slice(&bytes)?;
        Ok(manifest)
    }

    /// Atomically write the manifest into a store directory.
    pub fn save(&self, dir: &Path) -> Result<()> {
        let tmp = dir.join(format!("{}.tmp", MANIFEST_FILE));
        let json = serde_json::to_vec_pretty(self)?;
        fs::write(&tmp, json)?;
        fs::rename(&tmp, dir.join(MANIFEST_FILE))?;
        Ok(())
    }
}
