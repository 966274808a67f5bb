//! Error types for preference encoding, circuit assembly, and simulation.

use thiserror::Error;

/// Errors raised while encoding ballots or assembling a voting circuit.
#[derive(Debug, Error)]
pub enum VoteError {
    /// A coefficient vector with zero norm cannot be made into a state.
    #[error("cannot normalize a zero vector: voter expressed no preference")]
    ZeroVector,

    #[error("candidate roster is empty")]
    EmptyRoster,

    /// The number of candidates must be an exact power of two so that it maps
    /// onto a whole number of qubits.
    #[error("candidate roster size {0} is not a power of two")]
    RosterNotPowerOfTwo(usize),

    /// A single candidate maps onto zero qubits, leaving nothing to encode.
    #[error("candidate roster needs at least 2 candidates, found {0}")]
    RosterTooSmall(usize),

    #[error("candidate '{0}' appears more than once in the roster")]
    DuplicateCandidate(String),

    #[error("bad candidate name '{0}': names must be non-empty with no whitespace, '>', or '='")]
    BadCandidateName(String),

    #[error("ranking names no candidates")]
    EmptyRanking,

    /// An empty rank group, as in `a>>b`, under a policy that rejects gaps.
    #[error("ranking has an empty rank group at position {0}")]
    EmptyRankGroup(usize),

    #[error("ranking names unknown candidate '{0}'")]
    UnknownCandidate(String),

    #[error("ranking names candidate '{0}' more than once")]
    RepeatedCandidate(String),

    #[error("cannot assemble a circuit with no voters")]
    NoVoters,

    #[error("voter {voter}: expected {expected} amplitudes, found {found}")]
    AmplitudeLength { voter: usize, expected: usize, found: usize },

    #[error("voter {voter}: amplitude vector has norm {norm}, expected 1")]
    NotNormalized { voter: usize, norm: f64 },

    #[error("simulation error: {0}")]
    Sim(#[from] SimError),
}

/// Errors raised by a simulation backend while executing a circuit.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("circuit needs {0} qubits; the state-vector backend supports at most {1}")]
    TooManyQubits(usize, usize),

    #[error("qubit index {0} out of range for a register of {1} qubits")]
    QubitOutOfRange(usize, usize),

    #[error("classical bit index {0} out of range for a register of {1} bits")]
    ClbitOutOfRange(usize, usize),

    #[error("CNOT control and target are both qubit {0}")]
    CxSameQubit(usize),

    #[error("initialize on qubits {0}..{1} which are not in the ∣0...0⟩ state")]
    InitOnDirtyQubits(usize, usize),

    #[error("initialize on {qubits} qubits needs {expected} amplitudes, found {found}")]
    InitLength { qubits: usize, expected: usize, found: usize },

    #[error("operation follows the terminal measurement")]
    OpAfterMeasure,
}

pub type VoteResult<T> = Result<T, VoteError>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn messages_carry_context() {
        let err = VoteError::AmplitudeLength { voter: 2, expected: 4, found: 3 };
        let msg = err.to_string();
        assert!(msg.contains("voter 2"));
        assert!(msg.contains('4'));
        assert!(msg.contains('3'));

        let err = VoteError::RosterNotPowerOfTwo(6);
        assert!(err.to_string().contains('6'));
    }

    #[test]
    fn sim_errors_convert() {
        let err: VoteError = SimError::OpAfterMeasure.into();
        assert!(matches!(err, VoteError::Sim(SimError::OpAfterMeasure)));
    }
}
