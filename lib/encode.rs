//! Conversion of a voter's ranked preferences into a normalized amplitude
//! vector.
//!
//! A ranking is written as a sequence of rank groups separated by `>`, most
//! preferred first, where candidates tied within a group are separated by `=`;
//! e.g. `a>b=c>d`. Whitespace is ignored. For a ranking with *R* groups, every
//! candidate in the group at position *i* (counting from 0) receives the raw
//! coefficient √(*R* − *i*), and candidates never mentioned receive 0. The raw
//! coefficients, taken in roster order, are then scaled to unit norm so that
//! they can be written onto a register as the amplitudes of a quantum state.
//!
//! # Example
//! ```
//! use quantum_voting::{ encode::{ normalize, rank_to_coefficients }, roster::Roster };
//!
//! let roster = Roster::new(["a", "b", "c", "d"]).unwrap();
//! let coeffs = rank_to_coefficients("a=b > c", &roster).unwrap();
//! assert_eq!(coeffs.get("a"), Some(2.0_f64.sqrt()));
//! assert_eq!(coeffs.get("b"), Some(2.0_f64.sqrt()));
//! assert_eq!(coeffs.get("c"), Some(1.0));
//! assert_eq!(coeffs.get("d"), Some(0.0));
//!
//! let amps = normalize(coeffs.values()).unwrap();
//! assert!((amps.norm() - 1.0).abs() < 1e-12);
//! ```

use std::fmt;
use itertools::Itertools;
use nalgebra as na;
use tracing::{ debug, warn };
use crate::{
    config::{ DuplicatePolicy, EmptyPolicy, EncodeConfig, GapPolicy, UnknownPolicy },
    error::{ VoteError, VoteResult },
    roster::Roster,
};

/// Separator between rank groups.
pub const RANK_SEP: char = '>';

/// Separator between tied candidates within a rank group.
pub const TIE_SEP: char = '=';

/// Tolerance on the norm of an amplitude vector.
pub const NORM_TOL: f64 = 1e-9;

/// A parsed ranking: an ordered list of rank groups, most preferred first.
///
/// Empty names within a group (as in `a=>b`) are discarded while parsing. An
/// empty group (as in `a>>b` or a trailing `>`) is kept as a gap: it names no
/// one but still occupies a rank position, so `a>>b` scores like `a>z>b` with
/// `z` unknown. [`GapPolicy`] controls how gaps are treated when encoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ranking {
    groups: Vec<Vec<String>>,
}

impl Ranking {
    /// Parse a ranking string. Parsing never fails; candidate names are not
    /// checked against any roster here.
    pub fn parse(s: &str) -> Self {
        let stripped: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        let groups: Vec<Vec<String>>
            = stripped.split(RANK_SEP)
            .map(|group| {
                group.split(TIE_SEP)
                    .filter(|name| !name.is_empty())
                    .map(String::from)
                    .collect::<Vec<String>>()
            })
            .collect();
        Self { groups }
    }

    /// Return the number of rank groups, gaps included.
    pub fn num_ranks(&self) -> usize { self.groups.len() }

    /// Return the number of empty rank groups.
    pub fn num_gaps(&self) -> usize {
        self.groups.iter().filter(|group| group.is_empty()).count()
    }

    /// Return the position of the first empty rank group, if any.
    pub fn first_gap(&self) -> Option<usize> {
        self.groups.iter().position(|group| group.is_empty())
    }

    /// Return a copy with every empty rank group removed, so that the
    /// remaining groups close ranks.
    pub fn without_gaps(&self) -> Self {
        let groups
            = self.groups.iter()
            .filter(|group| !group.is_empty())
            .cloned()
            .collect();
        Self { groups }
    }

    /// Return `true` if the ranking names no candidates.
    pub fn is_empty(&self) -> bool { self.groups.iter().all(|group| group.is_empty()) }

    pub fn groups(&self) -> &[Vec<String>] { &self.groups }

    /// Iterate over `(rank, candidate)` pairs, where rank 0 is most preferred.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> + '_ {
        self.groups.iter()
            .enumerate()
            .flat_map(|(i, group)| group.iter().map(move |name| (i, name.as_str())))
    }
}

impl fmt::Display for Ranking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.groups.iter()
            .map(|group| group.iter().join(&TIE_SEP.to_string()))
            .join(&RANK_SEP.to_string());
        write!(f, "{}", s)
    }
}

/// Raw (unnormalized) preference scores, one per roster candidate.
#[derive(Clone, Debug, PartialEq)]
pub struct CoefficientMap<'r> {
    roster: &'r Roster,
    values: Vec<f64>,
}

impl<'r> CoefficientMap<'r> {
    fn zeros(roster: &'r Roster) -> Self {
        Self { roster, values: vec![0.0; roster.len()] }
    }

    /// Return the coefficient for a candidate, or `None` if it is not on the
    /// roster.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.roster.index_of(name).map(|k| self.values[k])
    }

    /// Return all coefficients in roster order.
    pub fn values(&self) -> &[f64] { &self.values }

    pub fn roster(&self) -> &'r Roster { self.roster }

    /// Iterate over `(candidate, coefficient)` pairs in roster order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.roster.iter().map(String::as_str).zip(self.values.iter().copied())
    }

    pub fn into_values(self) -> Vec<f64> { self.values }
}

/// Compute raw coefficients for a ranking under the default (permissive)
/// [`EncodeConfig`].
///
/// Unknown candidate names are ignored, empty rank groups still count toward
/// the number of ranks, and a repeated candidate keeps its last assigned score.
/// A ranking naming no candidates at all is rejected with
/// [`VoteError::EmptyRanking`].
pub fn rank_to_coefficients<'r>(ranking: &str, roster: &'r Roster)
    -> VoteResult<CoefficientMap<'r>>
{
    rank_to_coefficients_with(ranking, roster, &EncodeConfig::default())
}

/// Compute raw coefficients for a ranking under a given set of parse policies.
pub fn rank_to_coefficients_with<'r>(
    ranking: &str,
    roster: &'r Roster,
    config: &EncodeConfig,
) -> VoteResult<CoefficientMap<'r>>
{
    let parsed = Ranking::parse(ranking);
    let mut coeffs = CoefficientMap::zeros(roster);
    if parsed.is_empty() {
        return match config.empty {
            EmptyPolicy::Reject => Err(VoteError::EmptyRanking),
            EmptyPolicy::Uniform => {
                coeffs.values.iter_mut().for_each(|c| { *c = 1.0; });
                Ok(coeffs)
            },
        };
    }
    let parsed
        = match (parsed.first_gap(), config.gaps) {
            (None, _) => parsed,
            (Some(_), GapPolicy::Count) => {
                warn!(ranking = %parsed, gaps = parsed.num_gaps(), "empty rank groups hold a rank");
                parsed
            },
            (Some(_), GapPolicy::Skip) => {
                warn!(ranking = %parsed, gaps = parsed.num_gaps(), "dropping empty rank groups");
                parsed.without_gaps()
            },
            (Some(pos), GapPolicy::Reject) => {
                return Err(VoteError::EmptyRankGroup(pos));
            },
        };
    let num_ranks = parsed.num_ranks();
    let mut seen: Vec<bool> = vec![false; roster.len()];
    for (i, name) in parsed.iter() {
        let Some(k) = roster.index_of(name) else {
            match config.unknown {
                UnknownPolicy::Ignore => {
                    warn!(candidate = name, "ignoring unknown candidate in ranking");
                    continue;
                },
                UnknownPolicy::Reject => {
                    return Err(VoteError::UnknownCandidate(name.to_string()));
                },
            }
        };
        if seen[k] && config.duplicates == DuplicatePolicy::Reject {
            return Err(VoteError::RepeatedCandidate(name.to_string()));
        }
        seen[k] = true;
        coeffs.values[k] = ((num_ranks - i) as f64).sqrt();
    }
    Ok(coeffs)
}

/// A unit-norm vector of real amplitudes, one per candidate in roster order.
#[derive(Clone, Debug, PartialEq)]
pub struct Amplitudes(Vec<f64>);

impl Amplitudes {
    /// Wrap a vector without checking its norm.
    ///
    /// Vectors built this way are checked against the roster and the norm
    /// before being assembled into a circuit by
    /// [`Election::assemble`][crate::config::Election::assemble].
    pub fn from_vec_unchecked(amps: Vec<f64>) -> Self { Self(amps) }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn as_slice(&self) -> &[f64] { &self.0 }

    /// Return the Euclidean norm.
    pub fn norm(&self) -> f64 {
        na::DVector::from_column_slice(&self.0).norm()
    }

    /// Return `true` if the sum of squares is 1 to within [`NORM_TOL`].
    pub fn is_normalized(&self) -> bool {
        (self.0.iter().map(|a| a * a).sum::<f64>() - 1.0).abs() < NORM_TOL
    }

    /// Return the probability of each candidate's basis state.
    pub fn probabilities(&self) -> Vec<f64> {
        self.0.iter().map(|a| a * a).collect()
    }

    pub fn into_vec(self) -> Vec<f64> { self.0 }
}

impl AsRef<[f64]> for Amplitudes {
    fn as_ref(&self) -> &[f64] { &self.0 }
}

impl fmt::Display for Amplitudes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.iter().map(|a| format!("{:.6}", a)).join(", "))
    }
}

/// Scale a coefficient vector to unit norm.
///
/// Fails with [`VoteError::ZeroVector`] if every coefficient is zero.
pub fn normalize(coeffs: &[f64]) -> VoteResult<Amplitudes> {
    let v = na::DVector::from_column_slice(coeffs);
    let norm = v.norm();
    if norm == 0.0 { return Err(VoteError::ZeroVector); }
    let amps = Amplitudes((v / norm).iter().copied().collect());
    debug!(norm, amplitudes = %amps, "normalized coefficients");
    Ok(amps)
}
