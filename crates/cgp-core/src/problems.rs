//! Benchmark problems and their function sets.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CgpError, Result};
use crate::functions::{Function, BINARY_OPERATORS};
use crate::individual::Individual;

/// Anything that can score an individual.
pub trait FitnessFunction {
    /// Fitness of `individual`, higher is better.
    fn fitness(&self, individual: &Individual) -> f64;
}

// ── ProblemKind ───────────────────────────────────────────────────────────────

/// The benchmark circuits available to experiments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemKind {
    /// Single output, set when an even number of inputs are set.
    EvenParity,
    /// Product of the two input halves, as many output bits as input bits.
    BinaryMultiply,
    /// Index of the one set input, `log2(n)` output bits.
    BinaryEncode,
    /// One-hot line selected by the inputs, `2^n` output bits.
    BinaryDecode,
}

impl ProblemKind {
    /// Number of outputs the problem has for `input_length` inputs.
    pub fn output_length(self, input_length: usize) -> Result<usize> {
        match self {
            ProblemKind::EvenParity => Ok(1),
            ProblemKind::BinaryMultiply => {
                if input_length < 2 {
                    return Err(CgpError::InvalidProblem(
                        "binary_multiply needs at least 2 inputs".into(),
                    ));
                }
                Ok(input_length)
            }
            ProblemKind::BinaryEncode => {
                if input_length < 2 || !input_length.is_power_of_two() {
                    return Err(CgpError::InvalidProblem(format!(
                        "binary_encode needs a power of two inputs, got {input_length}"
                    )));
                }
                Ok(input_length.trailing_zeros() as usize)
            }
            ProblemKind::BinaryDecode => {
                if input_length > 10 {
                    return Err(CgpError::InvalidProblem(format!(
                        "binary_decode with {input_length} inputs is too large"
                    )));
                }
                Ok(1 << input_length)
            }
        }
    }

    /// Functions nodes may use on this problem.
    pub fn functions(self) -> &'static [Function] {
        &BINARY_OPERATORS
    }

    /// Training inputs for `input_length` inputs.
    pub fn training_inputs(self, input_length: usize) -> Vec<Vec<bool>> {
        match self {
            ProblemKind::BinaryEncode => single_bit_set(input_length),
            _ => binary_range(input_length),
        }
    }

    /// The correct outputs for `inputs`.
    pub fn truth(self, inputs: &[bool]) -> Vec<bool> {
        match self {
            ProblemKind::EvenParity => even_parity(inputs),
            ProblemKind::BinaryMultiply => binary_multiply(inputs),
            ProblemKind::BinaryEncode => binary_encode(inputs),
            ProblemKind::BinaryDecode => binary_decode(inputs),
        }
    }
}

impl fmt::Display for ProblemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProblemKind::EvenParity => "even_parity",
            ProblemKind::BinaryMultiply => "binary_multiply",
            ProblemKind::BinaryEncode => "binary_encode",
            ProblemKind::BinaryDecode => "binary_decode",
        };
        f.write_str(name)
    }
}

// ── Input ranges ──────────────────────────────────────────────────────────────

/// Every bit vector of `length` bits, counting up with the first bit most
/// significant.
pub fn binary_range(length: usize) -> Vec<Vec<bool>> {
    (0u64..1 << length).map(|value| to_bits(value, length)).collect()
}

/// The `length` bit vectors with exactly one set bit; vector `i` sets bit `i`.
pub fn single_bit_set(length: usize) -> Vec<Vec<bool>> {
    (0..length)
        .map(|set| (0..length).map(|bit| bit == set).collect())
        .collect()
}

fn to_bits(value: u64, width: usize) -> Vec<bool> {
    (0..width)
        .rev()
        .map(|shift| shift < 64 && (value >> shift) & 1 == 1)
        .collect()
}

fn from_bits(bits: &[bool]) -> u64 {
    bits.iter().fold(0, |acc, &bit| (acc << 1) | u64::from(bit))
}

// ── Truth functions ───────────────────────────────────────────────────────────

fn even_parity(inputs: &[bool]) -> Vec<bool> {
    let set = inputs.iter().filter(|&&b| b).count();
    vec![set % 2 == 0]
}

fn binary_multiply(inputs: &[bool]) -> Vec<bool> {
    let (a, b) = inputs.split_at(inputs.len() / 2);
    let product = from_bits(a) * from_bits(b);
    to_bits(product, inputs.len())
}

fn binary_encode(inputs: &[bool]) -> Vec<bool> {
    let index = inputs.iter().position(|&b| b).unwrap_or(0);
    let width = inputs.len().max(1).ilog2() as usize;
    to_bits(index as u64, width)
}

fn binary_decode(inputs: &[bool]) -> Vec<bool> {
    let index = from_bits(inputs) as usize;
    let mut lines = vec![false; 1 << inputs.len()];
    lines[index] = true;
    lines
}

// ── Problem ───────────────────────────────────────────────────────────────────

/// A training table of input vectors and expected outputs.
#[derive(Debug, Clone)]
pub struct Problem {
    kind: ProblemKind,
    training: Vec<(Vec<bool>, Vec<bool>)>,
}

impl Problem {
    /// Build the full training table for `kind` with `input_length` inputs.
    pub fn new(kind: ProblemKind, input_length: usize) -> Result<Self> {
        if input_length == 0 {
            return Err(CgpError::InvalidProblem("input_length must be at least 1".into()));
        }
        if input_length > 20 {
            return Err(CgpError::InvalidProblem(format!(
                "{input_length} inputs is too many to enumerate"
            )));
        }
        // Validates the input count for the problem.
        kind.output_length(input_length)?;

        let training = kind
            .training_inputs(input_length)
            .into_iter()
            .map(|inputs| {
                let outputs = kind.truth(&inputs);
                (inputs, outputs)
            })
            .collect();
        Ok(Self { kind, training })
    }

    pub fn kind(&self) -> ProblemKind {
        self.kind
    }

    /// The `(inputs, expected outputs)` pairs.
    pub fn training(&self) -> &[(Vec<bool>, Vec<bool>)] {
        &self.training
    }
}

impl FitnessFunction for Problem {
    /// One minus the mean, over training cases, of the fraction of wrong
    /// outputs.
    fn fitness(&self, individual: &Individual) -> f64 {
        if self.training.is_empty() {
            return 0.0;
        }
        let score: f64 = self
            .training
            .iter()
            .map(|(inputs, expected)| {
                let answers = individual.evaluate(inputs);
                let wrong = answers
                    .iter()
                    .zip(expected)
                    .filter(|(answer, want)| answer != want)
                    .count();
                wrong as f64 / expected.len() as f64
            })
            .sum();
        1.0 - score / self.training.len() as f64
    }
}
