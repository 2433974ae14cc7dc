//! Node functions available to CGP graphs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A boolean gate a CGP node can compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Function {
    Or,
    And,
    Nand,
    Nor,
}

/// The standard function set used by every binary benchmark.
pub const BINARY_OPERATORS: [Function; 4] =
    [Function::Or, Function::And, Function::Nand, Function::Nor];

impl Function {
    /// Number of arguments this function consumes.
    pub fn arity(self) -> usize {
        2
    }

    /// Apply the function to `args`.
    ///
    /// Only the first [`Function::arity`] arguments are read; missing ones
    /// are treated as `false`.
    pub fn apply(self, args: &[bool]) -> bool {
        let x = args.first().copied().unwrap_or(false);
        let y = args.get(1).copied().unwrap_or(false);
        match self {
            Function::Or => x || y,
            Function::And => x && y,
            Function::Nand => !(x && y),
            Function::Nor => !(x || y),
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Function::Or => "or",
            Function::And => "and",
            Function::Nand => "nand",
            Function::Nor => "nor",
        };
        f.write_str(name)
    }
}

/// Largest arity of any function in `functions` (0 for an empty set).
pub fn max_arity(functions: &[Function]) -> usize {
    functions.iter().map(|f| f.arity()).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(function: Function) -> [bool; 4] {
        [
            function.apply(&[false, false]),
            function.apply(&[false, true]),
            function.apply(&[true, false]),
            function.apply(&[true, true]),
        ]
    }

    #[test]
    fn test_truth_tables() {
        assert_eq!(table(Function::Or), [false, true, true, true]);
        assert_eq!(table(Function::And), [false, false, false, true]);
        assert_eq!(table(Function::Nand), [true, true, true, false]);
        assert_eq!(table(Function::Nor), [true, false, false, false]);
    }

    #[test]
    fn test_binary_operators_arity() {
        assert_eq!(max_arity(&BINARY_OPERATORS), 2);
        assert_eq!(max_arity(&[]), 0);
    }

    #[test]
    fn test_display_and_serde_names() {
        assert_eq!(Function::Nand.to_string(), "nand");
        let json = serde_json::to_string(&Function::Nor).unwrap();
        assert_eq!(json, "\"nor\"");
    }
}
