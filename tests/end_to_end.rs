use quantum_voting::{
    circuit::{ build_circuit, Instruction },
    config::{ EncodeConfig, Election },
    encode::{ normalize, rank_to_coefficients },
    roster::Roster,
    sim::{ check_num_qubits, Backend, StateVectorBackend, MAX_QUBITS },
    SimError,
    VoteError,
};

fn abcd() -> Roster { Roster::new(["a", "b", "c", "d"]).unwrap() }

#[test]
fn two_voters_four_candidates() {
    let roster = abcd();
    let voters: Vec<_>
        = ["a>b>c>d", "d>c>b>a"].iter()
        .map(|r| normalize(rank_to_coefficients(r, &roster).unwrap().values()).unwrap())
        .collect();
    let circuit = build_circuit(&voters, &roster);

    assert_eq!(circuit.num_qubits(), 4);
    assert_eq!(circuit.num_clbits(), 4);
    let ops = circuit.instructions();
    assert_eq!(ops.iter().filter(|op| op.is_initialize()).count(), 2);
    assert_eq!(ops.iter().filter(|op| op.is_cx()).count(), 1);
    assert_eq!(ops.iter().filter(|op| op.is_measure()).count(), 1);
    assert_eq!(ops.last(), Some(&Instruction::Measure { qubits: 0..4, clbits: 0..4 }));
    assert_eq!(ops[2], Instruction::Cx { control: 0, target: 1 });

    // the checked path produces the same circuit
    let checked = Election::new(abcd())
        .circuit_from_rankings(["a>b>c>d", "d>c>b>a"])
        .unwrap();
    assert_eq!(checked, circuit);

    let result = StateVectorBackend::new(Some(2024)).run(circuit, 2000).unwrap();
    assert_eq!(result.counts.total(), 2000);
    let norm: f64 = result.statevector.iter().map(|a| a.norm_sqr()).sum();
    assert!((norm - 1.0).abs() < 1e-9);
}

#[test]
fn voter_two_prefers_d() {
    // voter 1's block is measured in qubits 2..4 (classical bits 2, 3 are the
    // leftmost two characters); with "d>c>b>a" outcome ∣11⟩ has probability 0.4
    let election = Election::new(abcd());
    let circuit = election.circuit_from_rankings(["a", "d>c>b>a"]).unwrap();
    let shots = 8000;
    let result = StateVectorBackend::new(Some(99)).run(circuit, shots).unwrap();
    let d: usize
        = result.counts.iter()
        .filter(|(s, _)| s.starts_with("11"))
        .map(|(_, n)| n)
        .sum();
    let frac = d as f64 / shots as f64;
    assert!((frac - 0.4).abs() < 0.03, "{}", frac);
}

#[test]
fn errors_abort_before_assembly() {
    let election = Election::with_config(abcd(), EncodeConfig::strict());
    assert!(matches!(
        election.circuit_from_rankings(["a>b", "a>q"]),
        Err(VoteError::UnknownCandidate(_)),
    ));
    assert!(matches!(
        Election::new(abcd()).circuit_from_rankings(Vec::<String>::new()),
        Err(VoteError::NoVoters),
    ));
    assert!(matches!(
        Roster::new(["a", "b", "c", "d", "e", "f"]),
        Err(VoteError::RosterNotPowerOfTwo(6)),
    ));
}

#[test]
fn oversized_circuit_is_refused_by_backend() {
    let election = Election::new(abcd());
    // 13 voters * 2 qubits exceeds the backend limit
    let circuit = election.circuit_from_rankings(vec!["a>b"; 13]).unwrap();
    assert_eq!(circuit.num_qubits(), 26);
    assert!(matches!(
        StateVectorBackend::new(Some(0)).run(circuit, 1),
        Err(SimError::TooManyQubits(26, 24)),
    ));
}

#[test]
fn twelve_voters_fit_the_backend() {
    let election = Election::new(abcd());
    // 12 voters * 2 qubits sits exactly on the backend limit
    let circuit = election.circuit_from_rankings(vec!["a>b"; 12]).unwrap();
    assert_eq!(circuit.num_qubits(), 24);
    assert_eq!(circuit.num_qubits(), MAX_QUBITS);
    assert!(check_num_qubits(circuit.num_qubits()).is_ok());
}
