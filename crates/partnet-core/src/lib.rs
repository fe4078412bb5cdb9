//! Core primitives for the PartNet stack.
//!
//! This crate exposes the building blocks used to gossip a large binary
//! payload one verifiable piece at a time:
//!
//! * [`merkle`] — Blake3 backed Merkle commitments over chunk digests.
//! * [`part_set`] — payload partitioning, per-part membership proofs, and
//!   the [`part_set::PartSet`] aggregate that assembles verified parts
//!   delivered in any order by untrusted sources.
//!
//! The modules are intentionally small and focused so that higher level
//! crates (gossip, consensus, CLI tooling, …) can combine them without
//! bespoke plumbing in each consumer.

pub mod merkle;
pub mod part_set;

mod error;

pub use error::PartNetError;
