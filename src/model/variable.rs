//! Variables referenced by variable and object terms

use std::fmt;

use serde::{Deserialize, Serialize};

use super::fraction::Fraction;

/// Index into a scene's variable list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VariableId(pub usize);

impl fmt::Display for VariableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// A named unknown with a user-adjustable integer value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variable {
    pub symbol: String,
    value: i64,
    /// Inclusive range the value is kept in
    pub min: i64,
    pub max: i64,
}

impl Variable {
    pub fn new(symbol: impl Into<String>, value: i64, min: i64, max: i64) -> Self {
        let (min, max) = (min.min(max), min.max(max));
        Self {
            symbol: symbol.into(),
            value: value.clamp(min, max),
            min,
            max,
        }
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn value_fraction(&self) -> Fraction {
        Fraction::from_integer(self.value)
    }

    /// Set the value, clamped to the range. Returns the value actually used.
    pub fn set_value(&mut self, value: i64) -> i64 {
        let clamped = value.clamp(self.min, self.max);
        if clamped != value {
            log::debug!(
                "variable {} clamped {} to [{}, {}]",
                self.symbol,
                value,
                self.min,
                self.max
            );
        }
        self.value = clamped;
        clamped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_is_clamped_to_range() {
        let mut x = Variable::new("x", 50, -10, 10);
        assert_eq!(x.value(), 10);
        assert_eq!(x.set_value(-3), -3);
        assert_eq!(x.set_value(-40), -10);
        assert_eq!(x.value_fraction(), Fraction::from(-10));
    }
}
