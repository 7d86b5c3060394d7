//! Storage layer for Canopy.
//!
//! Persists a forest as flat, content-addressed tree files plus a JSON
//! manifest:
//!
//! ```text
//! <dir>/
//!   MANIFEST.json          - (height, id) list + cached forest root
//!   <root-hex>.tree        - one file per perfect tree, post-order digests
//! ```
//!
//! Tree files are immutable once written; saving a new forest version only
//! adds files and atomically swings the manifest, so a crash mid-save
//! leaves the previous version intact.
//!
//! # Example
//!
//! ```no_run
//! use canopy_forest::Forest;
//! use canopy_storage::ForestStore;
//!
//! # fn main() -> canopy_core::Result<()> {
//! let store = ForestStore::open("./forest-data")?;
//!
//! let mut forest: Forest<u64> = Forest::empty();
//! forest.insert(42);
//! store.save(&forest)?;
//!
//! let reloaded: Forest<u64> = store.load()?;
//! assert_eq!(reloaded.root(), forest.root());
//! store.prune()?;
//! # Ok(())
//! # }
//! ```

mod codec;
mod manifest;
mod store;

pub use codec::{read_tree, write_tree, TREE_FORMAT_VERSION, TREE_MAGIC};
pub use manifest::{ForestManifest, ManifestEntry, MANIFEST_FILE, MANIFEST_VERSION};
pub use store::ForestStore;
