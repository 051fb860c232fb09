//! Memoization of function-pair verdicts.
//!
//! Comparators are pure functions of their inputs, so a verdict computed once
//! for a (left function, right function) pair stays valid for the lifetime
//! of the compared modules. Pairs proven equal are the ones worth keeping
//! between runs.
use std::{cmp::Ordering, collections::BTreeMap};

use log::info;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use strum::EnumIs;

/// Outcome of comparing one pair of functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIs)]
#[serde(rename_all = "kebab-case")]
pub enum FunctionVerdict {
    Equal,
    Less,
    Greater,
}

impl FunctionVerdict {
    pub fn ordering(self) -> Ordering {
        match self {
            FunctionVerdict::Equal => Ordering::Equal,
            FunctionVerdict::Less => Ordering::Less,
            FunctionVerdict::Greater => Ordering::Greater,
        }
    }

    /// The verdict of the same pair seen from the other side.
    pub fn reverse(self) -> Self {
        Self::from(self.ordering().reverse())
    }
}

impl From<Ordering> for FunctionVerdict {
    fn from(value: Ordering) -> Self {
        match value {
            Ordering::Equal => FunctionVerdict::Equal,
            Ordering::Less => FunctionVerdict::Less,
            Ordering::Greater => FunctionVerdict::Greater,
        }
    }
}

/// A cached verdict together with the names of the compared functions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionResult {
    pub left: String,
    pub right: String,
    pub verdict: FunctionVerdict,
}

/// Thread-safe verdict cache keyed by (left function, right function).
#[derive(Debug, Default)]
pub struct ComparisonCache {
    entries: RwLock<BTreeMap<(String, String), FunctionVerdict>>,
}

impl ComparisonCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached verdict for the pair, also answering from the reversed pair.
    pub fn get(&self, left: &str, right: &str) -> Option<FunctionVerdict> {
        let entries = self.entries.read();
        if let Some(verdict) = entries.get(&(left.to_string(), right.to_string())) {
            return Some(*verdict);
        }
        entries
            .get(&(right.to_string(), left.to_string()))
            .map(|verdict| verdict.reverse())
    }

    pub fn insert(
        &self,
        left: &str,
        right: &str,
        verdict: FunctionVerdict,
    ) -> Option<FunctionVerdict> {
        if verdict.is_equal() {
            info!("Functions `{}` and `{}` are equal.", left, right);
        }
        self.entries
            .write()
            .insert((left.to_string(), right.to_string()), verdict)
    }

    /// Return the cached verdict or run `compare` and cache its outcome.
    ///
    /// The lock is not held while `compare` runs; two threads racing on the
    /// same pair both compare and store the same verdict.
    pub fn get_or_compare(
        &self,
        left: &str,
        right: &str,
        compare: impl FnOnce() -> Ordering,
    ) -> FunctionVerdict {
        if let Some(verdict) = self.get(left, right) {
            return verdict;
        }
        let verdict = FunctionVerdict::from(compare());
        self.insert(left, right, verdict);
        verdict
    }

    /// Pairs proven equal, in (left, right) order.
    pub fn equal_pairs(&self) -> Vec<(String, String)> {
        self.entries
            .read()
            .iter()
            .filter(|(_, verdict)| verdict.is_equal())
            .map(|(pair, _)| pair.clone())
            .collect()
    }

    pub fn results(&self) -> Vec<FunctionResult> {
        self.entries
            .read()
            .iter()
            .map(|((left, right), verdict)| FunctionResult {
                left: left.clone(),
                right: right.clone(),
                verdict: *verdict,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}
