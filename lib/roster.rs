//! The fixed, ordered slate of candidates for a single run.

use std::fmt;
use itertools::Itertools;
use rustc_hash::FxHashMap;
use crate::error::{ VoteError, VoteResult };

/// An ordered set of unique candidate names whose size is a power of two.
///
/// Candidate `k` corresponds to basis state ∣*k*⟩ of a voter's qubit block,
/// so a roster of 2<sup>*n*</sup> candidates occupies *n* qubits per voter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Roster {
    names: Vec<String>,
    index: FxHashMap<String, usize>,
}

impl Roster {
    /// Create a new roster from a sequence of candidate names.
    ///
    /// Fails if the roster is empty, has fewer than two candidates, has a size
    /// that is not a power of two, contains a duplicate, or contains a name
    /// that could not be written in a ranking string.
    pub fn new<I, S>(names: I) -> VoteResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let n = names.len();
        if n == 0 { return Err(VoteError::EmptyRoster); }
        if !n.is_power_of_two() { return Err(VoteError::RosterNotPowerOfTwo(n)); }
        if n < 2 { return Err(VoteError::RosterTooSmall(n)); }
        let mut index: FxHashMap<String, usize> = FxHashMap::default();
        index.reserve(n);
        for (k, name) in names.iter().enumerate() {
            if !is_valid_name(name) {
                return Err(VoteError::BadCandidateName(name.clone()));
            }
            if index.insert(name.clone(), k).is_some() {
                return Err(VoteError::DuplicateCandidate(name.clone()));
            }
        }
        Ok(Self { names, index })
    }

    /// Return the number of candidates.
    pub fn len(&self) -> usize { self.names.len() }

    /// Return `true` if the roster has no candidates. [`Roster::new`] requires
    /// at least two, so this is `false` for every constructed roster.
    pub fn is_empty(&self) -> bool { self.names.is_empty() }

    /// Return the number of qubits needed to hold one voter's state,
    /// log<sub>2</sub> of the number of candidates.
    pub fn qubits_per_voter(&self) -> usize {
        self.names.len().trailing_zeros() as usize
    }

    /// Return the position of a candidate in roster order.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool { self.index.contains_key(name) }

    pub fn names(&self) -> &[String] { &self.names }

    pub fn iter(&self) -> std::slice::Iter<'_, String> { self.names.iter() }
}

impl<'a> IntoIterator for &'a Roster {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter { self.names.iter() }
}

impl fmt::Display for Roster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.names.iter().join(", "))
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && !name.chars().any(|c| c.is_whitespace() || c == '>' || c == '=')
}
