use rs_merkle::{Hasher, MerkleProof, MerkleTree};

use crate::error::PartNetError;

/// Blake3 powered hasher compatible with `rs_merkle`.
#[derive(Debug, Clone, Copy)]
pub struct Blake3;

impl Hasher for Blake3 {
    type Hash = [u8; 32];

    fn hash(data: &[u8]) -> Self::Hash {
        *blake3::hash(data).as_bytes()
    }
}

/// Digest of one chunk's raw bytes, the unit committed into the tree.
pub fn leaf_digest(bytes: &[u8]) -> [u8; 32] {
    Blake3::hash(bytes)
}

/// Build a tree over `leaves`, returning the root and one leaf-to-root
/// sibling path per leaf.
///
/// Identical leaf sequences always produce the identical root and paths.
/// Unpaired nodes at odd-sized levels are promoted unchanged; the same
/// rule applies on the verify side via [`verify_leaf`].
pub fn build_tree(
    leaves: &[[u8; 32]],
) -> Result<([u8; 32], Vec<Vec<[u8; 32]>>), PartNetError> {
    let tree = MerkleTree::<Blake3>::from_leaves(leaves);
    let root = tree
        .root()
        .ok_or_else(|| PartNetError::Merkle("cannot commit to an empty leaf set".into()))?;
    let paths = (0..leaves.len())
        .map(|index| tree.proof(&[index]).proof_hashes().to_vec())
        .collect();
    Ok((root, paths))
}

/// Recompute a candidate root from a single leaf and its sibling path and
/// compare it against `root`.
pub fn verify_leaf(
    root: [u8; 32],
    index: usize,
    total: usize,
    leaf: [u8; 32],
    siblings: &[[u8; 32]],
) -> bool {
    MerkleProof::<Blake3>::new(siblings.to_vec()).verify(root, &[index], &[leaf], total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_and_verifies_every_leaf() {
        // Five leaves so the tree has an unpaired node on two levels.
        let chunks: [&[u8]; 5] = [b"alpha", b"beta", b"gamma", b"delta", b"epsilon"];
        let leaves: Vec<[u8; 32]> = chunks.iter().map(|chunk| leaf_digest(chunk)).collect();
        let (root, paths) = build_tree(&leaves).expect("tree");
        assert_eq!(paths.len(), leaves.len());
        for (index, path) in paths.iter().enumerate() {
            assert!(verify_leaf(root, index, leaves.len(), leaves[index], path));
        }
    }

    #[test]
    fn rejects_mismatched_root_index_and_path() {
        let chunks: [&[u8]; 4] = [b"one", b"two", b"three", b"four"];
        let leaves: Vec<[u8; 32]> = chunks.iter().map(|chunk| leaf_digest(chunk)).collect();
        let (root, paths) = build_tree(&leaves).expect("tree");

        let mut tampered_root = root;
        tampered_root[0] ^= 0xff;
        assert!(!verify_leaf(tampered_root, 0, leaves.len(), leaves[0], &paths[0]));

        // A proof is bound to its leaf position.
        assert!(!verify_leaf(root, 1, leaves.len(), leaves[0], &paths[0]));

        let mut tampered_path = paths[0].clone();
        tampered_path[0][0] ^= 0x01;
        assert!(!verify_leaf(root, 0, leaves.len(), leaves[0], &tampered_path));
    }

    #[test]
    fn empty_leaf_set_is_an_error() {
        assert!(build_tree(&[]).is_err());
    }
}
