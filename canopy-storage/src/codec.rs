//! On-disk tree serialization.
//!
//! A tree file is a fixed header followed by the tree's digests in
//! post-order (each leaf before its parent, each subtree before its right
//! sibling; the root is the last digest) and a bincode payload of the
//! sorted elements. The digest body needs no per-node framing: every
//! digest is the hash primitive's fixed width.
//!
//! ```text
//! magic(8) version(2 LE) algo(1) width(1) height(4 LE)
//! digest[0] … digest[2^(k+1)-2]
//! payload_len(8 LE) payload
//! ```
//!
//! Reading is verifying: the tree is rebuilt from the element payload and
//! every stored digest is checked against the rebuilt one, so a flipped
//! bit anywhere in the file surfaces as [`ErrorCode::StorageCorruption`].
//!
//! [`ErrorCode::StorageCorruption`]: canopy_core::ErrorCode::StorageCorruption

use std::io::{Read, Write};

use canopy_core::{Element, Error, Hash, HashAlgorithm, Result};
use canopy_forest::PerfectTree;

/// Magic bytes opening every tree file.
pub const TREE_MAGIC: &[u8; 8] = b"CNPTREE1";

/// Current tree file format version.
pub const TREE_FORMAT_VERSION: u16 = 1;

/// Upper bound on persisted tree heights; a height-40 tree already holds
/// a trillion leaves, so anything larger is a corrupt header.
const MAX_TREE_HEIGHT: u32 = 40;

/// Upper bound on the element payload length accepted from a header.
const MAX_PAYLOAD_LEN: u64 = 1 << 32;

/// Serialize a tree.
pub fn write_tree<E, W>(tree: &PerfectTree<E>, writer: &mut W) -> Result<()>
where
    E: Element,
    W: Write,
{
    writer.write_all(TREE_MAGIC)?;
    writer.write_all(&TREE_FORMAT_VERSION.to_le_bytes())?;
    writer.write_all(&[HashAlgorithm::Sha256.id()])?;
    writer.write_all(&[Hash::WIDTH as u8])?;
    writer.write_all(&tree.height().to_le_bytes())?;
    for digest in tree.nodes() {
        writer.write_all(digest.as_bytes())?;
    }
    let payload = bincode::serialize(tree.elements())?;
    writer.write_all(&(payload.len() as u64).to_le_bytes())?;
    writer.write_all(&payload)?;
    Ok(())
}

/// Deserialize and verify a tree.
pub fn read_tree<E, R>(reader: &mut R) -> Result<PerfectTree<E>>
where
    E: Element,
    R: Read,
{
    let mut magic = [0u8; 8];
    reader.read_exact(&mut magic)?;
    if &magic != TREE_MAGIC {
        return Err(Error::corruption("bad tree file magic"));
    }

    let mut version = [0u8; 2];
    reader.read_exact(&mut version)?;
    let version = u16::from_le_bytes(version);
    if version != TREE_FORMAT_VERSION {
        return Err(Error::invalid_input(format!(
            "unsupported tree format version {}",
            version
        )));
    }

    let mut algo = [0u8; 1];
    reader.read_exact(&mut algo)?;
    let algorithm = HashAlgorithm::from_id(algo[0])?;

    let mut width = [0u8; 1];
    reader.read_exact(&mut width)?;
    if usize::from(width[0]) != algorithm.width() {
        return Err(Error::corruption(format!(
            "hash width {} does not match algorithm",
            width[0]
        )));
    }

    let mut height = [0u8; 4];
    reader.read_exact(&mut height)?;
    let height = u32::from_le_bytes(height);
    if height > MAX_TREE_HEIGHT {
        return Err(Error::corruption(format!(
            "implausible tree height {}",
            height
        )));
    }

    let node_count = (1u64 << (height + 1)) - 1;
    let mut digests = Vec::with_capacity(node_count as usize);
    let mut buf = [0u8; Hash::WIDTH];
    for _ in 0..node_count {
        reader.read_exact(&mut buf)?;
        digests.push(Hash::from_bytes(buf));
    }

    let mut len = [0u8; 8];
    reader.read_exact(&mut len)?;
    let len = u64::from_le_bytes(len);
    if len > MAX_PAYLOAD_LEN {
        return Err(Error::corruption(format!(
            "implausible element payload length {}",
            len
        )));
    }
    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload)?;
    let elements: Vec<E> = bincode::deserialize(&payload)?;
    if elements.len() as u64 != 1u64 << height {
        return Err(Error::corruption(format!(
            "element count {} does not match height {}",
            elements.len(),
            height
        )));
    }

    // Rebuild from the elements and insist the stored digests agree; this
    // catches any bit flip in either section.
    let rebuilt =
        PerfectTree::from_sorted(elements).map_err(|e| Error::corruption(e.to_string()))?;
    if rebuilt.nodes() != digests.as_slice() {
        return Err(Error::corruption("stored digests do not match elements"));
    }
    Ok(rebuilt)
}
