// ============================================================
// Layer 3 — Exercise Domain Types
// ============================================================
// An Exercise is one arithmetic drill: two single-digit operands,
// an operation, and the result the child must write. Every
// result fits in one handwritten digit (0..=9), since the canvas
// recognizes exactly one digit per answer.
//
// Feedback is what the child sees after pressing "check".

use std::fmt;
use std::str::FromStr;

/// Largest value a single handwritten digit can express.
pub const MAX_RESULT: i32 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Add,
    Subtract,
    Multiply,
}

impl OperationKind {
    pub const ALL: [OperationKind; 3] = [Self::Add, Self::Subtract, Self::Multiply];

    pub fn symbol(&self) -> char {
        match self {
            Self::Add      => '+',
            Self::Subtract => '-',
            Self::Multiply => 'x',
        }
    }

    pub fn apply(&self, a: i32, b: i32) -> i32 {
        match self {
            Self::Add      => a + b,
            Self::Subtract => a - b,
            Self::Multiply => a * b,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Add      => "add",
            Self::Subtract => "subtract",
            Self::Multiply => "multiply",
        };
        f.write_str(name)
    }
}

impl FromStr for OperationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "add" | "addition" | "+"                => Ok(Self::Add),
            "subtract" | "subtraction" | "sub" | "-" => Ok(Self::Subtract),
            "multiply" | "multiplication" | "mul" | "x" | "*" => Ok(Self::Multiply),
            other => Err(format!("unknown operation '{other}'")),
        }
    }
}

/// One arithmetic drill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exercise {
    pub operand_a:      i32,
    pub operand_b:      i32,
    pub operation:      OperationKind,
    pub correct_result: i32,
}

impl Exercise {
    pub fn new(operand_a: i32, operand_b: i32, operation: OperationKind) -> Self {
        Self {
            operand_a,
            operand_b,
            operation,
            correct_result: operation.apply(operand_a, operand_b),
        }
    }

    /// Whether the exercise respects the per-operation bounds:
    /// operands in 0..=9, sum and product at most 9, subtraction
    /// never negative.
    pub fn is_well_formed(&self) -> bool {
        let digit = |v: i32| (0..=MAX_RESULT).contains(&v);
        digit(self.operand_a)
            && digit(self.operand_b)
            && digit(self.correct_result)
            && self.correct_result == self.operation.apply(self.operand_a, self.operand_b)
    }

    /// Vertical layout, the way it is written on paper.
    pub fn render_vertical(&self) -> String {
        format!(
            "    {}\n  {} {}\n  ---\n",
            self.operand_a,
            self.operation.symbol(),
            self.operand_b,
        )
    }
}

impl fmt::Display for Exercise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.operand_a, self.operation.symbol(), self.operand_b)
    }
}

/// Outcome of checking an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    Correct(i32),
    Incorrect { given: i32, expected: i32 },
    /// Nothing recognized yet.
    Empty,
    /// Something was recognized but it isn't a base-10 integer.
    Unparseable(String),
}

impl Feedback {
    pub fn is_correct(&self) -> bool {
        matches!(self, Self::Correct(_))
    }
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Correct(v) => write!(f, "Correct: {v}"),
            Self::Incorrect { given, expected } => {
                write!(f, "Incorrect: you wrote {given}, the answer was {expected}")
            }
            Self::Empty => f.write_str("Write an answer and recognize it first"),
            Self::Unparseable(raw) => write!(f, "I could not understand the number: {raw}"),
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correct_result_is_derived() {
        assert_eq!(Exercise::new(2, 2, OperationKind::Add).correct_result,      4);
        assert_eq!(Exercise::new(5, 3, OperationKind::Subtract).correct_result, 2);
        assert_eq!(Exercise::new(4, 2, OperationKind::Multiply).correct_result, 8);
    }

    #[test]
    fn test_well_formed_bounds() {
        assert!(Exercise::new(4, 5, OperationKind::Add).is_well_formed());
        assert!(!Exercise::new(5, 5, OperationKind::Add).is_well_formed());
        assert!(!Exercise::new(3, 5, OperationKind::Subtract).is_well_formed());
        assert!(!Exercise::new(4, 3, OperationKind::Multiply).is_well_formed());
    }

    #[test]
    fn test_operation_parsing() {
        assert_eq!("add".parse::<OperationKind>().unwrap(),        OperationKind::Add);
        assert_eq!(" Sub ".parse::<OperationKind>().unwrap(),      OperationKind::Subtract);
        assert_eq!("*".parse::<OperationKind>().unwrap(),          OperationKind::Multiply);
        assert!("divide".parse::<OperationKind>().is_err());
    }

    #[test]
    fn test_vertical_render() {
        let text = Exercise::new(7, 1, OperationKind::Add).render_vertical();
        assert!(text.contains("7"));
        assert!(text.contains("+ 1"));
    }
}
