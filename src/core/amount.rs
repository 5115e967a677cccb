//! Amount validation for the base currency input

use std::fmt::Display;
use std::str::FromStr;

use super::error::ValidationError;

pub const MIN_AMOUNT: u32 = 3;
pub const MAX_AMOUNT: u32 = 999;

/// A base amount known to be within `MIN_AMOUNT..=MAX_AMOUNT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Amount(u32);

impl Amount {
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if value < i64::from(MIN_AMOUNT) || value > i64::from(MAX_AMOUNT) {
            return Err(ValidationError::OutOfRange(value));
        }
        Ok(Amount(value as u32))
    }

    /// Parses raw keystroke text. Surrounding whitespace is ignored.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let value = raw
            .trim()
            .parse::<i64>()
            .map_err(|_| ValidationError::NotANumber(raw.to_string()))?;
        Self::new(value)
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl Default for Amount {
    fn default() -> Self {
        Amount(10)
    }
}

impl FromStr for Amount {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
