//! Directory-backed forest persistence.
//!
//! A store directory holds one file per perfect tree, named by the tree's
//! root digest (`<hex>.tree`), plus the manifest. Tree files are
//! content-addressed and never rewritten; a save only adds files the
//! directory is missing, then swings the manifest. Old forest versions
//! keep working until [`ForestStore::prune`] removes trees the current
//! manifest no longer references.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use canopy_core::{Element, Error, Result};
use canopy_forest::Forest;

use crate::codec;
use crate::manifest::ForestManifest;

/// File extension for serialized trees.
const TREE_EXT: &str = "tree";

/// A forest store rooted at a directory.
pub struct ForestStore {
    dir: PathBuf,
}

impl ForestStore {
    /// Open (creating if needed) a store directory.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// The store directory.
    pub fn path(&self) -> &Path {
        &self.dir
    }

    fn tree_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", id, TREE_EXT))
    }

    /// Persist a forest: write any tree files the directory lacks, then
    /// atomically replace the manifest.
    ///
    /// If anything fails before the manifest rename, the previously saved
    /// forest remains the authoritative state; stray tree files are
    /// harmless and reclaimed by [`ForestStore::prune`].
    pub fn save<E: Element>(&self, forest: &Forest<E>) -> Result<()> {
        for tree in forest.trees() {
            let id = tree.root().to_hex();
            let path = self.tree_path(&id);
            if path.exists() {
                continue;
            }
            let tmp = self.dir.join(format!("{}.{}.tmp", id, TREE_EXT));
            let file = File::create(&tmp)?;
            let mut writer = BufWriter::new(file);
            codec::write_tree(tree, &mut writer)?;
            let file = writer
                .into_inner()
                .map_err(|e| Error::storage(e.to_string()))?;
            file.sync_all()?;
            fs::rename(&tmp, &path)?;
            debug!(id = %id, height = tree.height(), "wrote tree file");
        }

        ForestManifest::describe(forest).save(&self.dir)?;
        info!(
            root = %forest.root(),
            trees = forest.trees().len(),
            cardinality = forest.cardinality(),
            "saved forest"
        );
        Ok(())
    }

    /// Load the forest the manifest points at, verifying every tree file
    /// and the cached root on the way in.
    pub fn load<E: Element>(&self) -> Result<Forest<E>> {
        let manifest = ForestManifest::load(&self.dir)?;
        manifest.validate()?;

        let mut trees = Vec::with_capacity(manifest.trees.len());
        for entry in &manifest.trees {
            let path = self.tree_path(&entry.id);
            let file = File::open(&path).map_err(|_| {
                Error::not_found(format!("missing tree file for {}", entry.id))
            })?;
            let tree = codec::read_tree::<E, _>(&mut BufReader::new(file))?;
            if tree.root().to_hex() != entry.id {
                return Err(Error::corruption(format!(
                    "tree file {} has root {}",
                    entry.id,
                    tree.root()
                )));
            }
            if tree.height() != entry.height {
                return Err(Error::corruption(format!(
                    "tree {} has height {}, manifest says {}",
                    entry.id,
                    tree.height(),
                    entry.height
                )));
            }
            trees.push(tree);
        }

        let forest = Forest::from_trees(trees)?;
        if forest.root() != manifest.root_hash()? {
            return Err(Error::corruption("recomputed forest root differs from manifest"));
        }
        if forest.cardinality() != manifest.cardinality {
            return Err(Error::corruption(format!(
                "recomputed cardinality {} differs from manifest {}",
                forest.cardinality(),
                manifest.cardinality
            )));
        }
        debug!(root = %forest.root(), trees = forest.trees().len(), "loaded forest");
        Ok(forest)
    }

    /// Delete tree files the current manifest does not reference.
    ///
    /// Returns how many files were removed. Leftover `.tmp` files from
    /// interrupted saves are removed as well.
    pub fn prune(&self) -> Result<usize> {
        let manifest = ForestManifest::load(&self.dir)?;
        let referenced: HashSet<&str> = manifest.trees.iter().map(|e| e.id.as_str()).collect();

        let mut removed = 0usize;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let stale_tmp = name.ends_with(".tmp");
            let unreferenced = path.extension().and_then(|e| e.to_str()) == Some(TREE_EXT)
                && path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .map(|stem| !referenced.contains(stem))
                    .unwrap_or(false);
            if stale_tmp || unreferenced {
                fs::remove_file(&path)?;
                debug!(file = name, "pruned");
                removed += 1;
            }
        }
        info!(removed, "pruned unreferenced tree files");
        Ok(removed)
    }
}
