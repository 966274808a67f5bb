//! Tools for encoding ranked voter preferences as quantum states and
//! assembling them into a single measurable circuit.
//!
//! Each voter's ranking over a roster of 2<sup>*k*</sup> candidates is turned
//! into a unit vector of 2<sup>*k*</sup> real amplitudes (see [`encode`]), which
//! is written onto that voter's own block of *k* qubits. Voter blocks are then
//! chained together with CNOTs and measured (see [`circuit`]), and the
//! resulting circuit can be sampled on the state-vector backend in [`sim`].
//!
//! This is an illustrative encoding-and-sampling pipeline, not a secure or
//! auditable voting system.

pub mod error;
pub mod roster;
pub mod config;
pub mod encode;
pub mod circuit;
pub mod sim;

pub use error::{ SimError, VoteError, VoteResult };
