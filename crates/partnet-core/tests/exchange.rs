//! End-to-end exchange scenarios: unreliable sources deliver parts of one
//! payload into receiving sets out of order, with duplicates, corrupted
//! copies, and several sources racing for the same slots.

use std::io::Read;
use std::sync::Arc;
use std::thread;

use partnet_core::part_set::PartSet;
use partnet_core::PartNetError;
use rand::seq::SliceRandom;
use rand::{thread_rng, Rng};

const CHUNK: usize = 256;

fn random_payload(len: usize) -> Vec<u8> {
    let mut data = vec![0u8; len];
    thread_rng().fill(&mut data[..]);
    data
}

#[test]
fn lossy_exchange_converges() {
    let data = random_payload(CHUNK * 37 + 19);
    let origin = PartSet::from_data(&data, CHUNK).expect("partition");
    let receiving = PartSet::from_header(origin.header().clone());

    // Delivery schedule: every part twice, shuffled.
    let mut schedule: Vec<usize> = (0..origin.total()).chain(0..origin.total()).collect();
    schedule.shuffle(&mut thread_rng());

    let mut accepted = 0;
    for index in schedule {
        let part = origin.part(index).expect("in range").expect("present");
        if receiving.add_part(part).expect("valid part") {
            accepted += 1;
        }
    }
    assert_eq!(accepted, origin.total());
    assert!(receiving.is_complete());
    assert_eq!(receiving.root(), origin.root());

    // A corrupted copy never lands, regardless of which field was touched.
    let fresh = PartSet::from_header(origin.header().clone());
    let mut bad_bytes = origin.part(3).expect("in range").expect("present");
    bad_bytes.bytes[7] ^= 0x80;
    assert!(matches!(
        fresh.add_part(bad_bytes),
        Err(PartNetError::InvalidProof { index: 3 })
    ));
    let mut bad_proof = origin.part(5).expect("in range").expect("present");
    bad_proof.proof.siblings[0][31] ^= 0x80;
    assert!(matches!(
        fresh.add_part(bad_proof),
        Err(PartNetError::InvalidProof { index: 5 })
    ));
    assert_eq!(fresh.count(), 0);

    let mut reassembled = Vec::new();
    receiving
        .reader()
        .expect("complete")
        .read_to_end(&mut reassembled)
        .expect("read");
    assert_eq!(reassembled, data);
}

#[test]
fn concurrent_sources_fill_one_set() {
    let data = random_payload(CHUNK * 64);
    let origin = Arc::new(PartSet::from_data(&data, CHUNK).expect("partition"));
    let receiving = Arc::new(PartSet::from_header(origin.header().clone()));

    let sources = 4;
    let mut handles = Vec::new();
    for source in 0..sources {
        let origin = Arc::clone(&origin);
        let receiving = Arc::clone(&receiving);
        handles.push(thread::spawn(move || {
            // Every source delivers every part; only the first arrival of
            // each index is stored.
            let mut indices: Vec<usize> = (0..origin.total()).collect();
            indices.rotate_left(source * origin.total() / sources);
            let mut stored = 0;
            for index in indices {
                let part = origin.part(index).expect("in range").expect("present");
                if receiving.add_part(part).expect("valid part") {
                    stored += 1;
                }
            }
            stored
        }));
    }

    let stored_total: usize = handles
        .into_iter()
        .map(|handle| handle.join().expect("join"))
        .sum();
    assert_eq!(stored_total, origin.total());
    assert!(receiving.is_complete());
    assert_eq!(receiving.present_indices().len(), origin.total());

    let mut reassembled = Vec::new();
    receiving
        .reader()
        .expect("complete")
        .read_to_end(&mut reassembled)
        .expect("read");
    assert_eq!(reassembled, data);
}
