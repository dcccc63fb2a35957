//! Perfect matchings over the 8 tile endpoints.
//!
//! A matching pairs every endpoint label with exactly one other. The set is
//! generated once, in a fixed order, and that order is the identifier space used
//! for sampling and export numbering.

use crate::errors::{TileError, TileResult};
use hashbrown::HashSet;
use std::fmt;

/// Number of endpoints on a tile.
pub const ENDPOINT_COUNT: usize = 8;

/// Number of pairs in one matching.
pub const PAIR_COUNT: usize = ENDPOINT_COUNT / 2;

/// `(2n - 1)!!` for `n = 4`.
pub const MATCHING_COUNT: usize = 105;

/// An unordered pair of endpoint labels, stored with `a < b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pair {
    a: u8,
    b: u8,
}

impl Pair {
    /// Builds a pair from two distinct labels in `0..8`, in either order.
    pub fn new(x: u8, y: u8) -> TileResult<Self> {
        if x == y {
            return Err(TileError::invalid_config(format!(
                "endpoint {x} cannot be paired with itself"
            )));
        }
        if x as usize >= ENDPOINT_COUNT || y as usize >= ENDPOINT_COUNT {
            return Err(TileError::invalid_config(format!(
                "pair ({x}, {y}) references an endpoint outside 0..{ENDPOINT_COUNT}"
            )));
        }
        Ok(Self::ordered(x, y))
    }

    fn ordered(x: u8, y: u8) -> Self {
        Pair {
            a: x.min(y),
            b: x.max(y),
        }
    }

    pub fn first(&self) -> u8 {
        self.a
    }

    pub fn second(&self) -> u8 {
        self.b
    }

    pub fn contains(&self, label: u8) -> bool {
        self.a == label || self.b == label
    }

    /// True when the two endpoints are neighbours around the tile boundary.
    pub fn is_adjacent(&self) -> bool {
        let gap = (self.b - self.a) as usize;
        gap == 1 || gap == ENDPOINT_COUNT - 1
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.a, self.b)
    }
}

/// Four disjoint pairs covering every endpoint label once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Matching {
    pairs: [Pair; PAIR_COUNT],
}

impl Matching {
    /// Builds a matching from any four pairs, rejecting overlaps or missing labels.
    pub fn from_pairs(pairs: &[Pair]) -> TileResult<Self> {
        if pairs.len() != PAIR_COUNT {
            return Err(TileError::invalid_config(format!(
                "a matching needs {PAIR_COUNT} pairs, got {}",
                pairs.len()
            )));
        }
        let mut sorted = [pairs[0]; PAIR_COUNT];
        sorted.copy_from_slice(pairs);
        sorted.sort();

        let matching = Matching { pairs: sorted };
        if !matching.covers_all_labels() {
            return Err(TileError::invalid_config(format!(
                "pairs {matching} do not cover every endpoint exactly once"
            )));
        }
        Ok(matching)
    }

    pub fn pairs(&self) -> &[Pair; PAIR_COUNT] {
        &self.pairs
    }

    /// The label each endpoint is paired with.
    pub fn partner(&self, label: u8) -> Option<u8> {
        self.pairs.iter().find(|p| p.contains(label)).map(|p| {
            if p.a == label {
                p.b
            } else {
                p.a
            }
        })
    }

    fn covers_all_labels(&self) -> bool {
        let mut seen = [0u8; ENDPOINT_COUNT];
        for p in &self.pairs {
            seen[p.a as usize] += 1;
            seen[p.b as usize] += 1;
        }
        seen.iter().all(|&n| n == 1)
    }
}

impl fmt::Display for Matching {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, p) in self.pairs.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{p}")?;
        }
        f.write_str("]")
    }
}

/// Recursively enumerate every perfect pairing of `labels`.
///
/// The smallest remaining label is paired with each other label in turn, so the
/// output order is stable. An even-length input of `2n` labels yields `(2n-1)!!`
/// pairings; an empty input yields one empty pairing and an odd input none.
pub fn enumerate_pairings(labels: &[u8]) -> Vec<Vec<Pair>> {
    if labels.is_empty() {
        return vec![Vec::new()];
    }
    if labels.len() % 2 == 1 {
        return Vec::new();
    }

    let first = labels[0];
    let mut out = Vec::new();
    for i in 1..labels.len() {
        let pair = Pair::ordered(first, labels[i]);
        let rest: Vec<u8> = labels[1..i]
            .iter()
            .chain(labels[i + 1..].iter())
            .copied()
            .collect();
        for mut tail in enumerate_pairings(&rest) {
            tail.insert(0, pair);
            out.push(tail);
        }
    }
    out
}

/// All 105 perfect matchings of the tile endpoints, in enumeration order.
pub fn enumerate() -> Vec<Matching> {
    let labels: Vec<u8> = (0..ENDPOINT_COUNT as u8).collect();
    enumerate_pairings(&labels)
        .into_iter()
        .map(|pairs| {
            let mut arr = [pairs[0]; PAIR_COUNT];
            arr.copy_from_slice(&pairs);
            Matching { pairs: arr }
        })
        .collect()
}

/// Check the enumeration invariants: the right count, full coverage and no duplicates.
pub fn verify(matchings: &[Matching]) -> TileResult<()> {
    if matchings.len() != MATCHING_COUNT {
        return Err(TileError::invariant(format!(
            "expected {MATCHING_COUNT} matchings, enumerated {}",
            matchings.len()
        )));
    }
    let mut seen = HashSet::with_capacity(matchings.len());
    for (idx, m) in matchings.iter().enumerate() {
        if !m.covers_all_labels() {
            return Err(TileError::invariant(format!(
                "matching #{idx} {m} does not cover every label exactly once"
            )));
        }
        if !seen.insert(*m) {
            return Err(TileError::invariant(format!(
                "matching #{idx} {m} appears more than once"
            )));
        }
    }
    Ok(())
}

/// `n!!` for the odd case used by pairing counts; `(-1)!! = 0!! = 1`.
pub fn double_factorial(n: i64) -> u64 {
    let mut acc = 1u64;
    let mut k = n;
    while k > 1 {
        acc *= k as u64;
        k -= 2;
    }
    acc
}
