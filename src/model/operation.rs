//! Universal operations applied to both sides of the scale

use std::fmt;

use serde::{Deserialize, Serialize};

use super::fraction::Fraction;
use super::variable::VariableId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    Plus,
    Minus,
    Times,
    Divide,
}

impl Operator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Times => "×",
            Operator::Divide => "÷",
        }
    }
}

/// Right-hand side of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operand {
    Constant(Fraction),
    Variable {
        coefficient: Fraction,
        variable: VariableId,
    },
}

/// An operation such as "+ 3" or "÷ 2" applied to every term creator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniversalOperation {
    pub operator: Operator,
    pub operand: Operand,
}

impl UniversalOperation {
    pub fn new(operator: Operator, operand: Operand) -> Self {
        Self { operator, operand }
    }

    pub fn constant(operator: Operator, value: i64) -> Self {
        Self::new(operator, Operand::Constant(Fraction::from_integer(value)))
    }

    pub fn variable(operator: Operator, coefficient: i64, variable: VariableId) -> Self {
        Self::new(
            operator,
            Operand::Variable {
                coefficient: Fraction::from_integer(coefficient),
                variable,
            },
        )
    }
}

impl fmt::Display for UniversalOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operand {
            Operand::Constant(value) => write!(f, "{} {}", self.operator.symbol(), value),
            Operand::Variable {
                coefficient,
                variable,
            } => write!(f, "{} {}{}", self.operator.symbol(), coefficient, variable),
        }
    }
}
