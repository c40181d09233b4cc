//! Merkle commitment over a block's ordered transaction ids.
//!
//! Nodes are hex strings; a parent is `hash_hex(left ++ right)` over the text of
//! its two children. A level with an odd count pairs its last node with itself,
//! so every internal node has exactly two children. A non-empty sequence is
//! always reduced at least once: a single id `a` commits to `hash(a ++ a)`.

use crate::config::EMPTY_MERKLE_SENTINEL;
use crate::crypto::hash_hex;
use serde::{Deserialize, Serialize};

/// Side on which a proof sibling sits relative to the running hash.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Left,
    Right,
}

/// One level of an inclusion proof.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProofStep {
    pub hash: String,
    pub position: Position,
}

fn hash_pair(left: &str, right: &str) -> String {
    let mut concat = String::with_capacity(left.len() + right.len());
    concat.push_str(left);
    concat.push_str(right);
    hash_hex(concat.as_bytes())
}

fn next_level(level: &[String]) -> Vec<String> {
    level
        .chunks(2)
        .map(|pair| {
            let left = &pair[0];
            let right = pair.get(1).unwrap_or(left);
            hash_pair(left, right)
        })
        .collect()
}

/// Root committed by a block with no transactions.
pub fn empty_root() -> String {
    hash_hex(EMPTY_MERKLE_SENTINEL.as_bytes())
}

/// Compute the Merkle root over `ids` in the given order.
pub fn compute_root<S: AsRef<str>>(ids: &[S]) -> String {
    if ids.is_empty() {
        return empty_root();
    }

    let mut level: Vec<String> = ids.iter().map(|id| id.as_ref().to_string()).collect();
    loop {
        level = next_level(&level);
        if level.len() == 1 {
            break;
        }
    }

    level.swap_remove(0)
}

/// Sibling path (leaf to root) proving that `target` is one of `ids`.
///
/// Returns an empty vector when `target` is not present. A duplicated id is
/// proven at its first occurrence.
pub fn build_proof<S: AsRef<str>>(ids: &[S], target: &str) -> Vec<ProofStep> {
    let Some(mut index) = ids.iter().position(|id| id.as_ref() == target) else {
        return Vec::new();
    };

    let mut level: Vec<String> = ids.iter().map(|id| id.as_ref().to_string()).collect();
    let mut proof = Vec::new();
    loop {
        let step = if index % 2 == 0 {
            // unpaired last node is its own sibling
            let sibling = level.get(index + 1).unwrap_or(&level[index]);
            ProofStep {
                hash: sibling.clone(),
                position: Position::Right,
            }
        } else {
            ProofStep {
                hash: level[index - 1].clone(),
                position: Position::Left,
            }
        };
        proof.push(step);

        level = next_level(&level);
        index /= 2;
        if level.len() == 1 {
            break;
        }
    }

    proof
}

/// Every value produced while folding `proof` into `leaf`: the leaf first, the
/// computed root last.
pub fn fold_path(leaf: &str, proof: &[ProofStep]) -> Vec<String> {
    let mut path = Vec::with_capacity(proof.len() + 1);
    let mut current = leaf.to_string();
    path.push(current.clone());

    for step in proof {
        current = match step.position {
            Position::Right => hash_pair(&current, &step.hash),
            Position::Left => hash_pair(&step.hash, &current),
        };
        path.push(current.clone());
    }

    path
}

/// True iff folding `proof` into `leaf` yields exactly `root`.
pub fn verify_proof(leaf: &str, proof: &[ProofStep], root: &str) -> bool {
    fold_path(leaf, proof)
        .last()
        .is_some_and(|computed| computed == root)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| hash_hex(format!("tx-{}", i).as_bytes())).collect()
    }

    fn flip_char(s: &str, at: usize) -> String {
        let mut chars: Vec<char> = s.chars().collect();
        chars[at] = if chars[at] == '0' { '1' } else { '0' };
        chars.into_iter().collect()
    }

    #[test]
    fn empty_root_uses_sentinel() {
        let root = compute_root::<String>(&[]);
        assert_eq!(root, hash_hex(EMPTY_MERKLE_SENTINEL.as_bytes()));
        assert_ne!(root, hash_hex(b""));
        assert_eq!(root, empty_root());
    }

    #[test]
    fn single_leaf_pairs_with_itself() {
        let leaves = ids(1);
        let root = compute_root(&leaves);
        assert_eq!(root, hash_pair(&leaves[0], &leaves[0]));

        let proof = build_proof(&leaves, &leaves[0]);
        assert_eq!(
            proof,
            vec![ProofStep {
                hash: leaves[0].clone(),
                position: Position::Right,
            }]
        );
        assert!(verify_proof(&leaves[0], &proof, &root));
    }

    #[test]
    fn merkle_two() {
        let root = compute_root(&["aa", "bb"]);
        assert_eq!(root, hash_hex(b"aabb"));
    }

    #[test]
    fn odd_level_duplicates_last() {
        let (a, b, c) = ("a1", "b2", "c3");
        let l0 = hash_hex(b"a1b2");
        let l1 = hash_hex(b"c3c3");
        let expected = hash_hex(format!("{}{}", l0, l1).as_bytes());
        assert_eq!(compute_root(&[a, b, c]), expected);
    }

    #[test]
    fn root_is_deterministic_and_order_sensitive() {
        let leaves = ids(5);
        assert_eq!(compute_root(&leaves), compute_root(&leaves.clone()));

        let mut reversed = leaves.clone();
        reversed.reverse();
        assert_ne!(compute_root(&leaves), compute_root(&reversed));
    }

    #[test]
    fn every_leaf_proves_for_many_sizes() {
        for n in 1..=9 {
            let leaves = ids(n);
            let root = compute_root(&leaves);
            for leaf in &leaves {
                let proof = build_proof(&leaves, leaf);
                assert!(!proof.is_empty());
                assert!(
                    verify_proof(leaf, &proof, &root),
                    "proof for {} of {} leaves failed",
                    leaf,
                    n
                );
            }
        }
    }

    #[test]
    fn proof_positions_follow_index_parity() {
        let leaves = ids(4);
        let proof = build_proof(&leaves, &leaves[3]);
        assert_eq!(proof.len(), 2);
        assert_eq!(proof[0].hash, leaves[2]);
        assert_eq!(proof[0].position, Position::Left);
        assert_eq!(proof[1].hash, hash_pair(&leaves[0], &leaves[1]));
        assert_eq!(proof[1].position, Position::Left);

        let proof = build_proof(&leaves, &leaves[0]);
        assert_eq!(proof[0].position, Position::Right);
        assert_eq!(proof[1].position, Position::Right);
    }

    #[test]
    fn any_mutated_step_fails() {
        let leaves = ids(6);
        let root = compute_root(&leaves);
        let proof = build_proof(&leaves, &leaves[4]);

        for (i, step) in proof.iter().enumerate() {
            for at in [0, step.hash.len() / 2, step.hash.len() - 1] {
                let mut bad = proof.clone();
                bad[i].hash = flip_char(&step.hash, at);
                assert!(!verify_proof(&leaves[4], &bad, &root));
            }
        }
    }

    #[test]
    fn wrong_leaf_root_or_side_fails() {
        let leaves = ids(3);
        let root = compute_root(&leaves);
        let proof = build_proof(&leaves, &leaves[1]);

        assert!(!verify_proof(&leaves[0], &proof, &root));
        assert!(!verify_proof(&leaves[1], &proof, &root.to_uppercase()));

        let mut swapped = proof.clone();
        swapped[0].position = Position::Right;
        assert!(!verify_proof(&leaves[1], &swapped, &root));
    }

    #[test]
    fn absent_target_gives_empty_proof() {
        let leaves = ids(3);
        assert!(build_proof(&leaves, "missing").is_empty());
        assert!(build_proof::<String>(&[], "missing").is_empty());
    }

    #[test]
    fn fold_path_ends_at_root() {
        let leaves = ids(5);
        let root = compute_root(&leaves);
        let proof = build_proof(&leaves, &leaves[2]);
        let path = fold_path(&leaves[2], &proof);

        assert_eq!(path.len(), proof.len() + 1);
        assert_eq!(path.first(), Some(&leaves[2]));
        assert_eq!(path.last(), Some(&root));
    }

    #[test]
    fn position_serializes_lowercase() {
        let step = ProofStep {
            hash: "ab".into(),
            position: Position::Left,
        };
        let json = serde_json::to_string(&step).unwrap();
        assert_eq!(json, r#"{"hash":"ab","position":"left"}"#);
    }
}
