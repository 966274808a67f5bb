//! The immutable context for a single election run.
//!
//! An [`Election`] bundles the candidate roster with the policies governing how
//! loosely ranking strings are interpreted, and is threaded through encoding
//! and assembly in place of any global state.
//!
//! # Example
//! ```
//! use quantum_voting::{ config::Election, roster::Roster };
//!
//! let roster = Roster::new(["a", "b", "c", "d"]).unwrap();
//! let election = Election::new(roster);
//! let circuit = election.circuit_from_rankings(["a>b>c>d", "d>c>b>a"]).unwrap();
//! assert_eq!(circuit.num_qubits(), 4);
//! ```

use tracing::debug;
use crate::{
    circuit::{ build_circuit, Circuit },
    encode::{ normalize, rank_to_coefficients_with, Amplitudes },
    error::{ VoteError, VoteResult },
    roster::Roster,
};

/// Handling of ranked names that are not on the roster.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum UnknownPolicy {
    /// Skip the name. Its rank group still counts toward the number of ranks.
    #[default]
    Ignore,
    /// Fail with [`VoteError::UnknownCandidate`].
    Reject,
}

/// Handling of rankings that name no candidates at all.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum EmptyPolicy {
    /// Fail with [`VoteError::EmptyRanking`].
    #[default]
    Reject,
    /// Treat the ranking as a single rank group holding every candidate.
    Uniform,
}

/// Handling of empty rank groups, as in `a>>b` or a trailing `>`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum GapPolicy {
    /// The empty group occupies a rank position, so `a>>b` scores like `a>z>b`.
    #[default]
    Count,
    /// Drop empty groups before scoring, so `a>>b` scores like `a>b`.
    Skip,
    /// Fail with [`VoteError::EmptyRankGroup`].
    Reject,
}

/// Handling of candidates named more than once in a single ranking.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum DuplicatePolicy {
    /// Keep the score from the last mention.
    #[default]
    LastWins,
    /// Fail with [`VoteError::RepeatedCandidate`].
    Reject,
}

/// Parse policies applied when converting a ranking string to coefficients.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct EncodeConfig {
    pub unknown: UnknownPolicy,
    pub empty: EmptyPolicy,
    pub gaps: GapPolicy,
    pub duplicates: DuplicatePolicy,
}

impl EncodeConfig {
    /// Reject every malformed ranking.
    pub fn strict() -> Self {
        Self {
            unknown: UnknownPolicy::Reject,
            empty: EmptyPolicy::Reject,
            gaps: GapPolicy::Reject,
            duplicates: DuplicatePolicy::Reject,
        }
    }
}

/// A candidate roster together with the encoding policies for one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Election {
    roster: Roster,
    config: EncodeConfig,
}

impl Election {
    /// Create a new election using the default (permissive) policies.
    pub fn new(roster: Roster) -> Self {
        Self { roster, config: EncodeConfig::default() }
    }

    pub fn with_config(roster: Roster, config: EncodeConfig) -> Self {
        Self { roster, config }
    }

    pub fn roster(&self) -> &Roster { &self.roster }

    pub fn config(&self) -> &EncodeConfig { &self.config }

    /// Encode a single ranking string as a normalized amplitude vector.
    pub fn encode(&self, ranking: &str) -> VoteResult<Amplitudes> {
        let coeffs = rank_to_coefficients_with(ranking, &self.roster, &self.config)?;
        normalize(coeffs.values())
    }

    /// Encode every ranking in order, stopping at the first failure.
    pub fn encode_all<I, S>(&self, rankings: I) -> VoteResult<Vec<Amplitudes>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        rankings.into_iter()
            .enumerate()
            .map(|(voter, ranking)| -> VoteResult<Amplitudes> {
                let amps = self.encode(ranking.as_ref())?;
                debug!(voter, ranking = ranking.as_ref(), amplitudes = %amps, "encoded voter");
                Ok(amps)
            })
            .collect()
    }

    /// Check that a set of amplitude vectors can be assembled into a circuit
    /// over this roster.
    pub fn validate(&self, voters: &[Amplitudes]) -> VoteResult<()> {
        if voters.is_empty() { return Err(VoteError::NoVoters); }
        let expected = self.roster.len();
        for (voter, amps) in voters.iter().enumerate() {
            if amps.len() != expected {
                return Err(VoteError::AmplitudeLength {
                    voter,
                    expected,
                    found: amps.len(),
                });
            }
            if !amps.is_normalized() {
                return Err(VoteError::NotNormalized { voter, norm: amps.norm() });
            }
        }
        Ok(())
    }

    /// Validate and assemble a circuit from already-encoded voters.
    pub fn assemble(&self, voters: &[Amplitudes]) -> VoteResult<Circuit> {
        self.validate(voters)?;
        Ok(build_circuit(voters, &self.roster))
    }

    /// Encode every ranking and assemble the result into a circuit. Any
    /// failure aborts before a circuit is built.
    pub fn circuit_from_rankings<I, S>(&self, rankings: I) -> VoteResult<Circuit>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let voters = self.encode_all(rankings)?;
        self.assemble(&voters)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn election() -> Election {
        Election::new(Roster::new(["a", "b", "c", "d"]).unwrap())
    }

    #[test]
    fn encode_normalizes() {
        let amps = election().encode("a>b>c>d").unwrap();
        assert!(amps.is_normalized());
        let probs = amps.probabilities();
        assert!((probs[0] - 0.4).abs() < 1e-12);
        assert!((probs[1] - 0.3).abs() < 1e-12);
        assert!((probs[2] - 0.2).abs() < 1e-12);
        assert!((probs[3] - 0.1).abs() < 1e-12);
    }

    #[test]
    fn encode_all_stops_at_first_error() {
        let res = election().encode_all(["a>b", "", "c"]);
        assert!(matches!(res, Err(VoteError::EmptyRanking)));
        let res = election().encode_all(["a>b", "x>y"]);
        assert!(matches!(res, Err(VoteError::ZeroVector)));
    }

    #[test]
    fn strict_policies() {
        let strict = Election::with_config(
            Roster::new(["a", "b", "c", "d"]).unwrap(),
            EncodeConfig::strict(),
        );
        assert!(matches!(strict.encode("a>e"), Err(VoteError::UnknownCandidate(_))));
        assert!(matches!(strict.encode("a>a"), Err(VoteError::RepeatedCandidate(_))));
        assert!(matches!(strict.encode(""), Err(VoteError::EmptyRanking)));
        assert!(matches!(strict.encode("a>>b"), Err(VoteError::EmptyRankGroup(1))));
        assert!(strict.encode("a=b>c").is_ok());
    }

    #[test]
    fn gaps_count_by_default() {
        let election = election();
        assert_eq!(election.encode("a>>b").unwrap(), election.encode("a>z>b").unwrap());
        assert_ne!(election.encode("a>>b").unwrap(), election.encode("a>b").unwrap());
    }

    #[test]
    fn uniform_empty_ranking() {
        let election = Election::with_config(
            Roster::new(["a", "b", "c", "d"]).unwrap(),
            EncodeConfig { empty: EmptyPolicy::Uniform, ..Default::default() },
        );
        let amps = election.encode(" ").unwrap();
        assert_eq!(amps.as_slice(), &[0.5; 4]);
    }

    #[test]
    fn validate_rejects_bad_voters() {
        let election = election();
        assert!(matches!(election.assemble(&[]), Err(VoteError::NoVoters)));

        let short = Amplitudes::from_vec_unchecked(vec![1.0, 0.0]);
        assert!(matches!(
            election.assemble(&[short]),
            Err(VoteError::AmplitudeLength { voter: 0, expected: 4, found: 2 }),
        ));

        let good = election.encode("a").unwrap();
        let unnormed = Amplitudes::from_vec_unchecked(vec![1.0, 1.0, 0.0, 0.0]);
        assert!(matches!(
            election.assemble(&[good, unnormed]),
            Err(VoteError::NotNormalized { voter: 1, .. }),
        ));
    }

    #[test]
    fn circuit_from_rankings() {
        let circuit = election()
            .circuit_from_rankings(["a>b>c>d", "d>c>b>a", "b=c"])
            .unwrap();
        assert_eq!(circuit.num_qubits(), 6);
        assert_eq!(circuit.num_clbits(), 6);
        assert_eq!(circuit.entangling_pairs().count(), 2);
    }
}
