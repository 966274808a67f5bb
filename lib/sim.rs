//! Execution of voting circuits on a dense state-vector simulator.
//!
//! Basis states are indexed little-endian: qubit *q* is bit *q* of the basis
//! index, and classical bit 0 is the rightmost character of an outcome string.
//! All unitary evolution is performed once, after which the terminal
//! measurement is sampled `shots` times from the final distribution.
//!
//! # Example
//! ```
//! use quantum_voting::{
//!     config::Election,
//!     roster::Roster,
//!     sim::{ Backend, StateVectorBackend },
//! };
//!
//! let election = Election::new(Roster::new(["a", "b", "c", "d"]).unwrap());
//! let circuit = election.circuit_from_rankings(["a", "b"]).unwrap();
//! let result = StateVectorBackend::new(Some(10546)).run(circuit, 100).unwrap();
//! // voter 0 is certainly ∣00⟩ and voter 1 is certainly ∣01⟩; the CNOT on
//! // voter 0's block does nothing since its control is ∣0⟩
//! assert_eq!(result.counts.get("0100"), 100);
//! ```

use std::{ collections::BTreeMap, fmt, ops::Range };
use num_complex::Complex64 as C64;
use rand::{ rngs::StdRng, Rng, SeedableRng };
use tracing::debug;
use crate::{
    circuit::{ Circuit, Instruction },
    error::SimError,
};

/// Largest register the state-vector backend will allocate: 2<sup>24</sup>
/// complex amplitudes, or 256 MiB.
pub const MAX_QUBITS: usize = 24;

/// Probability mass below which a block is considered to be in ∣0...0⟩.
const DIRTY_TOL: f64 = 1e-12;

/// Anything that can execute a circuit and report measurement statistics.
///
/// Circuits are taken by value; a backend owns the circuit it runs.
pub trait Backend {
    fn run(&mut self, circuit: Circuit, shots: usize) -> Result<RunResult, SimError>;
}

/// Frequencies of classical register outcomes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Counts(BTreeMap<String, usize>);

impl Counts {
    /// Return the number of times an outcome was observed.
    pub fn get(&self, outcome: &str) -> usize {
        self.0.get(outcome).copied().unwrap_or(0)
    }

    /// Return the total number of recorded shots.
    pub fn total(&self) -> usize { self.0.values().sum() }

    /// Return the number of distinct outcomes.
    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// Return the most frequent outcome, preferring the lexicographically
    /// smallest among ties.
    pub fn most_frequent(&self) -> Option<(&str, usize)> {
        self.0.iter()
            .max_by(|(sa, na), (sb, nb)| na.cmp(nb).then_with(|| sb.cmp(sa)))
            .map(|(s, n)| (s.as_str(), *n))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.0.iter().map(|(s, n)| (s.as_str(), *n))
    }

    fn record(&mut self, outcome: String) {
        *self.0.entry(outcome).or_insert(0) += 1;
    }
}

impl fmt::Display for Counts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.0.len();
        for (k, (outcome, count)) in self.0.iter().enumerate() {
            write!(f, "{}: {}", outcome, count)?;
            if k + 1 < n { writeln!(f)?; }
        }
        Ok(())
    }
}

/// Output of a single backend run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunResult {
    /// Sampled outcomes of the classical register.
    pub counts: Counts,
    /// The quantum state immediately before measurement.
    pub statevector: Vec<C64>,
    pub shots: usize,
}

/// Check that a register of `n` qubits fits in the state-vector backend
/// without allocating it.
pub fn check_num_qubits(n: usize) -> Result<(), SimError> {
    (n <= MAX_QUBITS).then_some(()).ok_or(SimError::TooManyQubits(n, MAX_QUBITS))
}

/// A dense vector of 2<sup>*n*</sup> complex amplitudes.
#[derive(Clone, Debug, PartialEq)]
pub struct StateVector {
    n: usize,
    amps: Vec<C64>,
}

impl StateVector {
    /// Create a new state of `n` qubits initialized to ∣0...0⟩.
    pub fn new(n: usize) -> Result<Self, SimError> {
        check_num_qubits(n)?;
        let mut amps: Vec<C64> = vec![C64::from(0.0); 1 << n];
        amps[0] = C64::from(1.0);
        Ok(Self { n, amps })
    }

    pub fn num_qubits(&self) -> usize { self.n }

    pub fn amplitudes(&self) -> &[C64] { &self.amps }

    pub fn into_amplitudes(self) -> Vec<C64> { self.amps }

    /// Return the probability of each basis state.
    pub fn probabilities(&self) -> Vec<f64> {
        self.amps.iter().map(|a| a.norm_sqr()).collect()
    }

    fn check_qubit(&self, q: usize) -> Result<(), SimError> {
        (q < self.n).then_some(()).ok_or(SimError::QubitOutOfRange(q, self.n))
    }

    /// Prepare a block of qubits currently in ∣0...0⟩ in the state with real
    /// amplitudes `state`, whose basis index has the first qubit of the block
    /// as its least significant bit.
    pub fn initialize(&mut self, qubits: Range<usize>, state: &[f64])
        -> Result<&mut Self, SimError>
    {
        if qubits.end > self.n {
            return Err(SimError::QubitOutOfRange(qubits.end - 1, self.n));
        }
        let k = qubits.len();
        if state.len() != 1 << k {
            return Err(SimError::InitLength {
                qubits: k,
                expected: 1 << k,
                found: state.len(),
            });
        }
        let s = qubits.start;
        let mask: usize = ((1 << k) - 1) << s;
        let dirty: f64
            = self.amps.iter().enumerate()
            .filter(|(i, _)| i & mask != 0)
            .map(|(_, a)| a.norm_sqr())
            .sum();
        if dirty > DIRTY_TOL {
            return Err(SimError::InitOnDirtyQubits(qubits.start, qubits.end));
        }
        let mut new: Vec<C64> = vec![C64::from(0.0); self.amps.len()];
        for (i, a) in self.amps.iter().enumerate() {
            if i & mask != 0 || a.norm_sqr() == 0.0 { continue; }
            for (j, c) in state.iter().enumerate() {
                new[i | (j << s)] = *a * *c;
            }
        }
        self.amps = new;
        Ok(self)
    }

    /// Apply a CNOT with control qubit `control` and target qubit `target`.
    pub fn apply_cx(&mut self, control: usize, target: usize)
        -> Result<&mut Self, SimError>
    {
        self.check_qubit(control)?;
        self.check_qubit(target)?;
        if control == target { return Err(SimError::CxSameQubit(control)); }
        let cbit = 1 << control;
        let tbit = 1 << target;
        for i in (0..self.amps.len()).filter(|i| i & cbit != 0 && i & tbit == 0) {
            self.amps.swap(i, i | tbit);
        }
        Ok(self)
    }

    fn cumulative(&self) -> Vec<f64> {
        let mut acc: f64 = 0.0;
        self.amps.iter()
            .map(|a| { acc += a.norm_sqr(); acc })
            .collect()
    }

    /// Draw a basis state index according to the Born rule.
    pub fn sample<R>(&self, rng: &mut R) -> usize
    where R: Rng + ?Sized
    {
        sample_cumulative(&self.cumulative(), rng)
    }
}

fn sample_cumulative<R>(cumulative: &[f64], rng: &mut R) -> usize
where R: Rng + ?Sized
{
    let total = cumulative.last().copied().unwrap_or(0.0);
    let r = rng.gen::<f64>() * total;
    cumulative.partition_point(|&p| p <= r).min(cumulative.len() - 1)
}

/// A backend that evolves the full state vector.
#[derive(Clone, Debug)]
pub struct StateVectorBackend {
    rng: StdRng,
}

impl StateVectorBackend {
    /// Create a new backend, optionally seeding the internal random number
    /// generator for reproducible sampling.
    pub fn new(seed: Option<u64>) -> Self {
        let rng
            = seed.map(StdRng::seed_from_u64)
            .unwrap_or_else(StdRng::from_entropy);
        Self { rng }
    }

    /// Run all unitary operations of `circuit` and return the final state
    /// together with the (qubit, classical bit) pairs to be read out.
    fn evolve(circuit: &Circuit)
        -> Result<(StateVector, Vec<(usize, usize)>), SimError>
    {
        let mut state = StateVector::new(circuit.num_qubits())?;
        let mut readout: Vec<(usize, usize)> = Vec::new();
        for op in circuit.instructions() {
            if !readout.is_empty() && !op.is_measure() {
                return Err(SimError::OpAfterMeasure);
            }
            match op {
                Instruction::Initialize { qubits, amplitudes, .. } => {
                    state.initialize(qubits.clone(), amplitudes.as_slice())?;
                },
                Instruction::Cx { control, target } => {
                    state.apply_cx(*control, *target)?;
                },
                Instruction::Measure { qubits, clbits } => {
                    if qubits.end > circuit.num_qubits() {
                        return Err(SimError::QubitOutOfRange(
                            qubits.end - 1, circuit.num_qubits()));
                    }
                    if clbits.end > circuit.num_clbits() {
                        return Err(SimError::ClbitOutOfRange(
                            clbits.end - 1, circuit.num_clbits()));
                    }
                    readout.extend(qubits.clone().zip(clbits.clone()));
                },
            }
        }
        Ok((state, readout))
    }
}

impl Backend for StateVectorBackend {
    fn run(&mut self, circuit: Circuit, shots: usize) -> Result<RunResult, SimError> {
        let (state, readout) = Self::evolve(&circuit)?;
        let num_clbits = circuit.num_clbits();
        let mut counts = Counts::default();
        if !readout.is_empty() {
            let cumulative = state.cumulative();
            for _ in 0..shots {
                let b = sample_cumulative(&cumulative, &mut self.rng);
                let mut bits: Vec<u8> = vec![b'0'; num_clbits];
                for &(q, c) in readout.iter() {
                    if (b >> q) & 1 == 1 { bits[num_clbits - 1 - c] = b'1'; }
                }
                counts.record(bits.into_iter().map(char::from).collect());
            }
        }
        debug!(
            qubits = circuit.num_qubits(),
            shots,
            outcomes = counts.len(),
            "sampled circuit",
        );
        Ok(RunResult { counts, statevector: state.into_amplitudes(), shots })
    }
}
