// Copyright (c) Kanari Network
// SPDX-License-Identifier: Apache-2.0

//! JSON witness emitted once per batch insertion.
//!
//! The encoding follows the downstream consumers' convention: every digest
//! and key is a decimal integer (arbitrary precision, not a hex string), and
//! the proof is bucketed by path length so that index `i` of the `proof`
//! array holds the subtree roots addressed by paths of length `i + 1`, keyed
//! by the numeric value of the path bits.

use crate::sparse_merkle::SmtError;
use crate::sparse_merkle::proof::NonDeletionProof;
use anyhow::{Result, ensure};
use primitive_types::{H256, U256};
use serde_json::{Map, Value};

/// Everything a third-party verifier needs to check one batch insertion.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BatchWitness {
    pub old_root: H256,
    pub new_root: H256,
    /// Inserted keys, sorted ascending.
    pub keys: Vec<U256>,
    /// Inserted values, aligned with `keys`.
    pub values: Vec<H256>,
    pub proof: NonDeletionProof,
    pub depth: usize,
}

impl BatchWitness {
    /// Builds a witness, sorting the batch by key.
    pub fn new(
        old_root: H256,
        new_root: H256,
        batch: &[(U256, H256)],
        proof: NonDeletionProof,
        depth: usize,
    ) -> Self {
        let mut sorted = batch.to_vec();
        sorted.sort_by_key(|(key, _)| *key);
        let (keys, values) = sorted.into_iter().unzip();
        Self {
            old_root,
            new_root,
            keys,
            values,
            proof,
            depth,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        let mut levels: Vec<Map<String, Value>> = vec![Map::new(); self.depth];
        for (path, digest) in self.proof.iter() {
            ensure!(
                !path.is_empty() && path.len() <= self.depth,
                SmtError::ProofShape(format!(
                    "subtree root '{}' is outside levels 1..={}",
                    path, self.depth
                ))
            );
            levels[path.len() - 1].insert(path.to_u256().to_string(), digest_number(*digest)?);
        }

        let mut witness = Map::new();
        witness.insert("old_root".to_string(), digest_number(self.old_root)?);
        witness.insert("new_root".to_string(), digest_number(self.new_root)?);
        witness.insert(
            "keys".to_string(),
            Value::Array(
                self.keys
                    .iter()
                    .map(|key| decimal_number(&key.to_string()))
                    .collect::<Result<_>>()?,
            ),
        );
        witness.insert(
            "values".to_string(),
            Value::Array(
                self.values
                    .iter()
                    .map(|value| digest_number(*value))
                    .collect::<Result<_>>()?,
            ),
        );
        witness.insert(
            "proof".to_string(),
            Value::Array(levels.into_iter().map(Value::Object).collect()),
        );
        witness.insert("depth".to_string(), Value::from(self.depth as u64));

        Ok(serde_json::to_string_pretty(&Value::Object(witness))?)
    }
}

fn digest_number(digest: H256) -> Result<Value> {
    decimal_number(&U256::from_big_endian(digest.as_bytes()).to_string())
}

// Digests exceed u64, so numbers are parsed from their decimal
// representation; serde_json keeps the full precision.
fn decimal_number(decimal: &str) -> Result<Value> {
    Ok(Value::Number(serde_json::from_str(decimal)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insert_batch::InsertBatch;
    use crate::sparse_merkle::SparseMerkleTree;
    use crate::sparse_merkle::hash::EMPTY_DIGEST;

    fn digest(value: u64) -> H256 {
        H256::from_low_u64_be(value)
    }

    #[test]
    fn test_witness_shape() {
        let mut tree = SparseMerkleTree::new(4).unwrap();
        let first: Vec<(U256, H256)> = vec![
            (U256::from(0u64), digest(1)),
            (U256::from(15u64), digest(2)),
        ];
        tree.batch_insert(InsertBatch::from(first)).unwrap();
        let old_root = tree.get_root();

        let batch: Vec<(U256, H256)> = vec![(U256::from(1u64), digest(3))];
        let proof = tree.batch_insert(InsertBatch::from(batch.clone())).unwrap();
        let new_root = tree.get_root();

        let witness = BatchWitness::new(old_root, new_root, &batch, proof, 4);
        let json: Value = serde_json::from_str(&witness.to_json().unwrap()).unwrap();

        assert_eq!(json["depth"], Value::from(4u64));
        assert_eq!(json["keys"], serde_json::json!([1]));
        assert_eq!(json["values"], serde_json::json!([3]));
        let proof_levels = json["proof"].as_array().unwrap();
        assert_eq!(proof_levels.len(), 4);
        // The sibling leaf "0000" has path length 4, the untouched right
        // half "1" has path length 1.
        assert_eq!(proof_levels[3]["0"], serde_json::json!(1));
        assert_eq!(proof_levels[0]["1"], serde_json::json!(2));
        assert_eq!(proof_levels[1].as_object().unwrap().len(), 0);
        assert_eq!(proof_levels[2].as_object().unwrap().len(), 0);
    }

    #[test]
    fn test_witness_sorts_batch() {
        let batch: Vec<(U256, H256)> = vec![
            (U256::from(9u64), digest(90)),
            (U256::from(3u64), digest(30)),
        ];
        let witness = BatchWitness::new(
            EMPTY_DIGEST,
            EMPTY_DIGEST,
            &batch,
            NonDeletionProof::default(),
            4,
        );
        assert_eq!(witness.keys, vec![U256::from(3u64), U256::from(9u64)]);
        assert_eq!(witness.values, vec![digest(30), digest(90)]);
    }

    #[test]
    fn test_witness_keeps_digest_precision() {
        let big = H256::repeat_byte(0xab);
        let witness = BatchWitness::new(
            big,
            EMPTY_DIGEST,
            &[(U256::from(1u64), digest(1))],
            NonDeletionProof::default(),
            256,
        );
        let json: Value = serde_json::from_str(&witness.to_json().unwrap()).unwrap();
        assert_eq!(
            json["old_root"].to_string(),
            U256::from_big_endian(big.as_bytes()).to_string()
        );
    }
}
