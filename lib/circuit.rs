//! Assembly of per-voter amplitude vectors into a single measurable circuit.
//!
//! Each voter owns a contiguous block of log<sub>2</sub>(*C*) qubits for *C*
//! candidates, in input order. A circuit for *V* voters consists of
//! 1. a quantum register of *V* log<sub>2</sub>(*C*) qubits and a classical
//! register of the same size;
//! 1. one initialization per voter, writing that voter's amplitudes onto its
//! block;
//! 1. one CNOT per voter except the last, with control on the first qubit of
//! voter *i*'s block (`i * k`) and target on the qubit following it
//! (`i * k + 1`);
//! 1. a single terminal measurement of every qubit into the classical bit of
//! the same index.
//!
//! For rosters of four or more candidates, the CNOT target lies inside the same
//! voter's block. For a two-candidate roster (one qubit per voter), the target
//! is the first qubit of the next voter.

use std::{
    collections::BTreeMap,
    fmt,
    fs,
    io::{ self, Write },
    ops::Range,
    path::Path,
};
use itertools::Itertools;
use tracing::debug;
use crate::{
    encode::Amplitudes,
    roster::Roster,
};

/// Name of the quantum register holding all voter blocks.
pub const QREG_NAME: &str = "voters";

/// Name of the classical register holding measurement outcomes.
pub const CREG_NAME: &str = "classical";

/// A named register of qubits or classical bits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Register {
    pub name: &'static str,
    pub size: usize,
}

/// The range of qubits owned by a single voter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoterBlock {
    pub voter: usize,
    pub qubits: Range<usize>,
}

impl VoterBlock {
    /// Return the first qubit of the block, which acts as the control for the
    /// entangling step.
    pub fn index_qubit(&self) -> usize { self.qubits.start }

    pub fn len(&self) -> usize { self.qubits.len() }

    pub fn is_empty(&self) -> bool { self.qubits.is_empty() }

    /// Return `true` if `self` and `other` share no qubits.
    pub fn is_disjoint(&self, other: &Self) -> bool {
        self.qubits.end <= other.qubits.start
            || other.qubits.end <= self.qubits.start
    }
}

/// A single circuit operation.
#[derive(Clone, Debug, PartialEq)]
pub enum Instruction {
    /// Prepare `qubits`, assumed to be in ∣0...0⟩, in the state whose
    /// amplitude on basis state ∣*j*⟩ is `amplitudes[j]`. The first qubit of
    /// the range is the least significant bit of *j*.
    Initialize {
        voter: usize,
        qubits: Range<usize>,
        amplitudes: Amplitudes,
    },
    /// CNOT: flip `target` if `control` is ∣1⟩.
    Cx { control: usize, target: usize },
    /// Measure each qubit of `qubits` in the Z basis into the classical bit at
    /// the same offset of `clbits`.
    Measure {
        qubits: Range<usize>,
        clbits: Range<usize>,
    },
}

impl Instruction {
    /// Return a short name for the kind of operation.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Initialize { .. } => "initialize",
            Self::Cx { .. } => "cx",
            Self::Measure { .. } => "measure",
        }
    }

    pub fn is_initialize(&self) -> bool { matches!(self, Self::Initialize { .. }) }

    pub fn is_cx(&self) -> bool { matches!(self, Self::Cx { .. }) }

    pub fn is_measure(&self) -> bool { matches!(self, Self::Measure { .. }) }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initialize { voter, qubits, amplitudes } => write!(
                f,
                "initialize{} q[{}..{}]  # voter {}",
                amplitudes, qubits.start, qubits.end, voter,
            ),
            Self::Cx { control, target } => write!(
                f,
                "cx q[{}], q[{}]",
                control, target,
            ),
            Self::Measure { qubits, clbits } => write!(
                f,
                "measure q[{}..{}] -> c[{}..{}]",
                qubits.start, qubits.end, clbits.start, clbits.end,
            ),
        }
    }
}

/// A complete voting circuit: registers, voter blocks, and the ordered list
/// of operations to perform.
#[derive(Clone, Debug, PartialEq)]
pub struct Circuit {
    qreg: Register,
    creg: Register,
    blocks: Vec<VoterBlock>,
    instructions: Vec<Instruction>,
}

impl Circuit {
    pub fn qreg(&self) -> &Register { &self.qreg }

    pub fn creg(&self) -> &Register { &self.creg }

    /// Return the total number of qubits.
    pub fn num_qubits(&self) -> usize { self.qreg.size }

    /// Return the total number of classical bits.
    pub fn num_clbits(&self) -> usize { self.creg.size }

    pub fn num_voters(&self) -> usize { self.blocks.len() }

    /// Return the qubit blocks of all voters, in input order.
    pub fn blocks(&self) -> &[VoterBlock] { &self.blocks }

    /// Return the qubit block of a single voter.
    pub fn block(&self, voter: usize) -> Option<&VoterBlock> {
        self.blocks.get(voter)
    }

    pub fn instructions(&self) -> &[Instruction] { &self.instructions }

    pub fn len(&self) -> usize { self.instructions.len() }

    pub fn is_empty(&self) -> bool { self.instructions.is_empty() }

    /// Iterate over the `(control, target)` pairs of the entangling CNOTs in
    /// application order.
    pub fn entangling_pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.instructions.iter()
            .filter_map(|op| match op {
                Instruction::Cx { control, target } => Some((*control, *target)),
                _ => None,
            })
    }

    /// Count operations by kind.
    pub fn count_ops(&self) -> BTreeMap<&'static str, usize> {
        self.instructions.iter().map(Instruction::name).counts().into_iter().collect()
    }

    /// Return an object containing an encoding of `self`'s qubit coupling
    /// structure in the [dot language][dot-lang]: one node per qubit, shaded
    /// by voter, and one edge per CNOT.
    ///
    /// Rendering this object using the default formatter will result in a full
    /// dot string representation of the diagram.
    ///
    /// [dot-lang]: https://en.wikipedia.org/wiki/DOT_(graph_description_language)
    pub fn to_graphviz(&self, name: &str) -> tabbycat::Graph {
        use tabbycat::*;
        use tabbycat::attributes::*;

        const FONT: &str = "DejaVu Sans";
        const FONTSIZE: f64 = 10.0; // pt
        const NODE_MARGIN: f64 = 0.025; // in
        const NODE_HEIGHT: f64 = 0.200; // in
        const NODE_COLOR_EVEN: Color = Color::Rgb(115, 150, 250);
        const NODE_COLOR_ODD: Color = Color::Rgb(250, 180, 115);

        let mut statements
            = StmtList::new()
            .add_attr(
                AttrType::Graph,
                AttrList::new().add_pair(rankdir(RankDir::LR)),
            )
            .add_attr(
                AttrType::Node,
                AttrList::new()
                    .add_pair(fontname(FONT))
                    .add_pair(fontsize(FONTSIZE))
                    .add_pair(margin(NODE_MARGIN))
                    ,
            );
        for block in self.blocks.iter() {
            for (j, q) in block.qubits.clone().enumerate() {
                let attrs
                    = AttrList::new()
                    .add_pair(label(format!("v{}:{}", block.voter, j)))
                    .add_pair(shape(Shape::Circle))
                    .add_pair(height(NODE_HEIGHT))
                    .add_pair(style(Style::Filled))
                    .add_pair(
                        if block.voter % 2 == 0 {
                            fillcolor(NODE_COLOR_EVEN)
                        } else {
                            fillcolor(NODE_COLOR_ODD)
                        }
                    );
                statements = statements.add_node(q.into(), None, Some(attrs));
            }
        }
        for (control, target) in self.entangling_pairs() {
            statements
                = statements.add_edge(
                    Edge::head_node(control.into(), None)
                        .line_to_node(target.into(), None)
                );
        }
        GraphBuilder::default()
            .graph_type(GraphType::Graph)
            .strict(false)
            .id(Identity::quoted(name))
            .stmts(statements)
            .build()
            .expect("error building graphviz")
    }

    /// Like [`to_graphviz`][Self::to_graphviz], but render directly to a string
    /// and write it to `path`.
    pub fn save_graphviz<P>(&self, name: &str, path: P)
        -> Result<&Self, io::Error>
    where P: AsRef<Path>
    {
        let graphviz = self.to_graphviz(name);
        fs::OpenOptions::new()
            .write(true)
            .append(false)
            .create(true)
            .truncate(true)
            .open(path)?
            .write_all(format!("{}", graphviz).as_bytes())?;
        Ok(self)
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "qreg {}[{}]  // q", self.qreg.name, self.qreg.size)?;
        writeln!(f, "creg {}[{}]  // c", self.creg.name, self.creg.size)?;
        let n = self.instructions.len();
        for (k, op) in self.instructions.iter().enumerate() {
            write!(f, "{}", op)?;
            if k + 1 < n { writeln!(f)?; }
        }
        Ok(())
    }
}

/// Assemble a circuit from the amplitude vectors of all voters, in order.
///
/// The roster determines the number of qubits per voter. Inputs are trusted:
/// every vector must have one entry per candidate and unit norm, and the
/// roster size must be a power of two. Use
/// [`Election::assemble`][crate::config::Election::assemble] to check these
/// first.
pub fn build_circuit(voters: &[Amplitudes], roster: &Roster) -> Circuit {
    let k = roster.qubits_per_voter();
    let n = voters.len();
    let size = n * k;
    debug_assert!(voters.iter().all(|amps| amps.len() == roster.len()));

    let blocks: Vec<VoterBlock>
        = (0..n)
        .map(|i| VoterBlock { voter: i, qubits: i * k..(i + 1) * k })
        .collect();

    let mut instructions: Vec<Instruction>
        = Vec::with_capacity(2 * n + usize::from(n > 0));
    for (block, amps) in blocks.iter().zip(voters) {
        instructions.push(Instruction::Initialize {
            voter: block.voter,
            qubits: block.qubits.clone(),
            amplitudes: amps.clone(),
        });
    }
    for i in 0..n.saturating_sub(1) {
        instructions.push(Instruction::Cx { control: i * k, target: i * k + 1 });
    }
    instructions.push(Instruction::Measure { qubits: 0..size, clbits: 0..size });

    debug!(voters = n, qubits = size, ops = instructions.len(), "assembled circuit");
    Circuit {
        qreg: Register { name: QREG_NAME, size },
        creg: Register { name: CREG_NAME, size },
        blocks,
        instructions,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::encode::{ normalize, rank_to_coefficients };

    fn encode(ranking: &str, roster: &Roster) -> Amplitudes {
        normalize(rank_to_coefficients(ranking, roster).unwrap().values()).unwrap()
    }

    #[test]
    fn two_voter_scenario() {
        let roster = Roster::new(["a", "b", "c", "d"]).unwrap();
        let voters = vec![encode("a>b>c>d", &roster), encode("d>c>b>a", &roster)];
        let circuit = build_circuit(&voters, &roster);

        assert_eq!(circuit.num_qubits(), 4);
        assert_eq!(circuit.num_clbits(), 4);
        assert_eq!(circuit.num_voters(), 2);
        let counts = circuit.count_ops();
        assert_eq!(counts.get("initialize"), Some(&2));
        assert_eq!(counts.get("cx"), Some(&1));
        assert_eq!(counts.get("measure"), Some(&1));
        assert_eq!(circuit.len(), 4);

        assert_eq!(
            circuit.instructions()[1],
            Instruction::Initialize {
                voter: 1,
                qubits: 2..4,
                amplitudes: voters[1].clone(),
            },
        );
        assert_eq!(circuit.instructions()[2], Instruction::Cx { control: 0, target: 1 });
        assert_eq!(
            circuit.instructions()[3],
            Instruction::Measure { qubits: 0..4, clbits: 0..4 },
        );
    }

    #[test]
    fn entangling_chain() {
        let roster = Roster::new(["a", "b", "c", "d", "e", "f", "g", "h"]).unwrap();
        let voters = vec![encode("a>b", &roster); 4];
        let circuit = build_circuit(&voters, &roster);
        let pairs: Vec<(usize, usize)> = circuit.entangling_pairs().collect();
        assert_eq!(pairs, vec![(0, 1), (3, 4), (6, 7)]);
        for (i, (control, _)) in pairs.iter().enumerate() {
            assert_eq!(*control, circuit.block(i).unwrap().index_qubit());
        }
        assert!(circuit.instructions().iter().all(|op| op.is_initialize() || op.is_cx() || op.is_measure()));
    }

    #[test]
    fn two_candidate_roster_links_next_voter() {
        let roster = Roster::new(["yes", "no"]).unwrap();
        let voters = vec![encode("yes", &roster), encode("no>yes", &roster)];
        let circuit = build_circuit(&voters, &roster);
        assert_eq!(circuit.num_qubits(), 2);
        let pairs: Vec<(usize, usize)> = circuit.entangling_pairs().collect();
        assert_eq!(pairs, vec![(0, 1)]);
        assert_eq!(circuit.block(1).unwrap().index_qubit(), 1);
    }

    #[test]
    fn single_voter_has_no_entangler() {
        let roster = Roster::new(["a", "b", "c", "d"]).unwrap();
        let circuit = build_circuit(&[encode("b", &roster)], &roster);
        assert_eq!(circuit.entangling_pairs().count(), 0);
        assert_eq!(circuit.len(), 2);
    }

    #[test]
    fn blocks_are_disjoint_and_contiguous() {
        let roster = Roster::new(["a", "b", "c", "d"]).unwrap();
        let voters = vec![encode("a", &roster); 5];
        let circuit = build_circuit(&voters, &roster);
        let blocks = circuit.blocks();
        for (i, bi) in blocks.iter().enumerate() {
            assert_eq!(bi.len(), 2);
            for bj in blocks.iter().skip(i + 1) {
                assert!(bi.is_disjoint(bj));
            }
        }
        assert_eq!(blocks.first().unwrap().qubits.start, 0);
        assert_eq!(blocks.last().unwrap().qubits.end, circuit.num_qubits());
    }

    #[test]
    fn display_lists_every_op() {
        let roster = Roster::new(["a", "b"]).unwrap();
        let voters = vec![encode("a", &roster), encode("b", &roster)];
        let text = build_circuit(&voters, &roster).to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "qreg voters[2]  // q");
        assert_eq!(lines[1], "creg classical[2]  // c");
        assert!(lines[2].starts_with("initialize[1.000000, 0.000000]"));
        assert_eq!(lines[4], "cx q[0], q[1]");
        assert_eq!(lines[5], "measure q[0..2] -> c[0..2]");
    }

    #[test]
    fn graphviz_has_qubit_nodes() {
        let roster = Roster::new(["a", "b", "c", "d"]).unwrap();
        let voters = vec![encode("a", &roster), encode("b", &roster)];
        let dot = build_circuit(&voters, &roster).to_graphviz("vote").to_string();
        assert!(dot.contains("vote"));
        assert!(dot.contains("v1:1"));
        assert!(dot.contains("--"));
    }
}
