// Copyright (c) Kanari Network
// SPDX-License-Identifier: Apache-2.0

//! An in-memory sparse Merkle tree with batch-insertion consistency proofs.
//!
//! Keys address leaves of a fixed-depth binary tree; values are opaque
//! 256-bit digests. Besides per-key inclusion and non-inclusion proofs, the
//! tree proves for a whole batch, with one compact witness, that every
//! inserted slot was previously unset and that the new root is exactly the
//! result of inserting the batch. See [`sparse_merkle`] for the tree and
//! [`sparse_merkle::proof`] for the verifiers.

pub(crate) mod insert_batch;
pub mod sparse_merkle;
pub mod witness;

pub use insert_batch::InsertBatch;
pub use primitive_types::{H256, U256};
pub use sparse_merkle::bit_path::BitPath;
pub use sparse_merkle::hash::{EMPTY_DIGEST, combine};
pub use sparse_merkle::proof::{NonDeletionProof, SparseMerkleProof};
pub use sparse_merkle::{SmtError, SparseMerkleTree};
pub use witness::BatchWitness;
