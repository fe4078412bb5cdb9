use std::io::{self, Read};
use std::sync::Mutex;

use hex::ToHex;
use serde::{Deserialize, Serialize};

use crate::error::PartNetError;
use crate::merkle;

/// Compact, shareable identity of one partitioning of one payload.
///
/// Two headers describe the same partitioning iff their `(total, root)`
/// pairs are equal.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PartSetHeader {
    pub total: usize,
    pub root: [u8; 32],
}

impl PartSetHeader {
    /// Render the committed root as a hex encoded string.
    pub fn root_hex(&self) -> String {
        self.root.encode_hex::<String>()
    }
}

/// Membership proof carried alongside a part: the ordered sibling digests
/// from the leaf up to the root, plus the leaf position they apply to.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PartProof {
    pub index: usize,
    pub total: usize,
    pub siblings: Vec<[u8; 32]>,
}

/// One chunk of a partitioned payload, independently verifiable against a
/// [`PartSetHeader`]. A part is a plain value; it is never self-certifying.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Part {
    pub index: usize,
    pub bytes: Vec<u8>,
    pub proof: PartProof,
}

/// Aggregate of verified parts for one partitioned payload.
///
/// A set is created either complete, from raw data, or empty, from a
/// header shared out of band, and then filled one verified part at a time
/// by [`PartSet::add_part`]. Slot occupancy is monotonic: a stored part is
/// never replaced or removed. All mutation goes through `add_part`, so the
/// set can be shared across concurrently delivering sources.
#[derive(Debug)]
pub struct PartSet {
    header: PartSetHeader,
    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    parts: Vec<Option<Part>>,
    count: usize,
}

impl PartSet {
    /// Partition `data` into `chunk_size` sized parts and commit to them.
    ///
    /// Every part except the last has exactly `chunk_size` bytes; the last
    /// carries the remainder. The resulting set is complete and carries a
    /// membership proof for every part. Empty payloads cannot be
    /// partitioned: a header's part count must be positive and a tail part
    /// may not be empty.
    pub fn from_data(data: &[u8], chunk_size: usize) -> Result<Self, PartNetError> {
        if chunk_size == 0 {
            return Err(PartNetError::Partition(
                "chunk size must be greater than zero",
            ));
        }
        if data.is_empty() {
            return Err(PartNetError::Partition("cannot partition an empty payload"));
        }

        let chunks: Vec<&[u8]> = data.chunks(chunk_size).collect();
        let total = chunks.len();
        let leaves: Vec<[u8; 32]> = chunks
            .iter()
            .map(|chunk| merkle::leaf_digest(chunk))
            .collect();
        let (root, paths) = merkle::build_tree(&leaves)?;

        let parts = chunks
            .into_iter()
            .zip(paths)
            .enumerate()
            .map(|(index, (chunk, siblings))| {
                Some(Part {
                    index,
                    bytes: chunk.to_vec(),
                    proof: PartProof {
                        index,
                        total,
                        siblings,
                    },
                })
            })
            .collect();

        Ok(Self {
            header: PartSetHeader { total, root },
            inner: Mutex::new(Inner {
                parts,
                count: total,
            }),
        })
    }

    /// Start an empty set that accepts parts matching `header`.
    pub fn from_header(header: PartSetHeader) -> Self {
        let parts = vec![None; header.total];
        Self {
            header,
            inner: Mutex::new(Inner { parts, count: 0 }),
        }
    }

    /// Validate `part` against the committed root and store it.
    ///
    /// Returns `Ok(true)` when the part was stored and `Ok(false)` when its
    /// slot was already filled — duplicate delivery is not an error. A part
    /// that fails validation leaves the set untouched; tampered sibling
    /// digests and tampered bytes are rejected identically.
    pub fn add_part(&self, part: Part) -> Result<bool, PartNetError> {
        let total = self.header.total;
        if part.index >= total {
            return Err(PartNetError::InvalidIndex {
                index: part.index,
                total,
            });
        }
        if self.inner.lock().unwrap().parts[part.index].is_some() {
            return Ok(false);
        }

        let leaf = merkle::leaf_digest(&part.bytes);
        let proof_ok = part.proof.index == part.index
            && part.proof.total == total
            && merkle::verify_leaf(self.header.root, part.index, total, leaf, &part.proof.siblings);
        if !proof_ok {
            tracing::warn!(
                index = part.index,
                "rejected part: proof does not match the committed root"
            );
            return Err(PartNetError::InvalidProof { index: part.index });
        }

        let mut inner = self.inner.lock().unwrap();
        if inner.parts[part.index].is_some() {
            // Lost the race against another source delivering the same index.
            return Ok(false);
        }
        tracing::debug!(index = part.index, "accepted part");
        let idx = part.index;
        inner.parts[idx] = Some(part);
        inner.count += 1;
        Ok(true)
    }

    /// Number of parts the payload was split into.
    pub fn total(&self) -> usize {
        self.header.total
    }

    /// The committed Merkle root.
    pub fn root(&self) -> [u8; 32] {
        self.header.root
    }

    /// Hex rendering of the committed root.
    pub fn root_hex(&self) -> String {
        self.header.root_hex()
    }

    /// The header identifying this partitioning.
    pub fn header(&self) -> &PartSetHeader {
        &self.header
    }

    /// Number of slots currently filled.
    pub fn count(&self) -> usize {
        self.inner.lock().unwrap().count
    }

    /// Whether every slot is filled.
    pub fn is_complete(&self) -> bool {
        self.count() == self.header.total
    }

    /// The stored part at `index`, or `None` while its slot is empty.
    pub fn part(&self, index: usize) -> Result<Option<Part>, PartNetError> {
        if index >= self.header.total {
            return Err(PartNetError::InvalidIndex {
                index,
                total: self.header.total,
            });
        }
        Ok(self.inner.lock().unwrap().parts[index].clone())
    }

    /// Indices of the filled slots, for reconciling with peers.
    pub fn present_indices(&self) -> Vec<usize> {
        self.inner
            .lock()
            .unwrap()
            .parts
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|_| index))
            .collect()
    }

    /// Stream the reassembled payload in strict index order.
    ///
    /// Defined only once the set is complete. The reader is forward-only
    /// and read-once; reconstructing again requires a fresh reader.
    pub fn reader(&self) -> Result<PartSetReader, PartNetError> {
        let inner = self.inner.lock().unwrap();
        if inner.count != self.header.total {
            return Err(PartNetError::NotComplete {
                count: inner.count,
                total: self.header.total,
            });
        }
        let chunks = inner
            .parts
            .iter()
            .flatten()
            .map(|part| part.bytes.clone())
            .collect();
        Ok(PartSetReader {
            chunks,
            part: 0,
            offset: 0,
        })
    }
}

/// Forward-only reader over the reassembled payload of a complete
/// [`PartSet`]. Yields the concatenation of part bytes in index order,
/// byte-identical to the original payload.
#[derive(Debug)]
pub struct PartSetReader {
    chunks: Vec<Vec<u8>>,
    part: usize,
    offset: usize,
}

impl Read for PartSetReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut written = 0;
        while written < buf.len() && self.part < self.chunks.len() {
            let chunk = &self.chunks[self.part];
            let remaining = &chunk[self.offset..];
            let n = remaining.len().min(buf.len() - written);
            buf[written..written + n].copy_from_slice(&remaining[..n]);
            written += n;
            self.offset += n;
            if self.offset == chunk.len() {
                self.part += 1;
                self.offset = 0;
            }
        }
        Ok(written)
    }
}
