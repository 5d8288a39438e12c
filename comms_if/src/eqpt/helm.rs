//! # Helm Equipment Commands
//!
//! The helm accepts and reports its state in the same ASCII format, `<throttle,rudder>`, with both
//! values written as floating point numbers.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{fmt, str::FromStr};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Character marking the start of a helm command
pub const START_MESSAGE_CHAR: char = '<';

/// Character marking the end of a helm command
pub const END_MESSAGE_CHAR: char = '>';

/// Separator between the throttle and rudder values
const SEPARATOR: char = ',';

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Throttle and rudder values, either demanded of or reported by the helm.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HelmCmd {
    /// Throttle setpoint
    pub throttle: f64,

    /// Rudder setpoint
    pub rudder: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum HelmParseError {
    #[error("Helm command {0:?} is not enclosed in '<' and '>'")]
    MissingDelimiters(String),

    #[error("Helm command {0:?} must contain exactly two comma separated values")]
    WrongFieldCount(String),

    #[error("Helm command field {0:?} is not a finite number")]
    InvalidNumber(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl HelmCmd {
    pub fn new(throttle: f64, rudder: f64) -> Self {
        Self { throttle, rudder }
    }

    /// Neutral command, no throttle and centred rudder.
    pub fn neutral() -> Self {
        Self::default()
    }
}

impl fmt::Display for HelmCmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}{}",
            START_MESSAGE_CHAR, self.throttle, SEPARATOR, self.rudder, END_MESSAGE_CHAR
        )
    }
}

impl FromStr for HelmCmd {
    type Err = HelmParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let inner = s
            .trim()
            .strip_prefix(START_MESSAGE_CHAR)
            .and_then(|s| s.strip_suffix(END_MESSAGE_CHAR))
            .ok_or_else(|| HelmParseError::MissingDelimiters(s.to_string()))?;

        let fields: Vec<&str> = inner.split(SEPARATOR).map(str::trim).collect();
        if fields.len() != 2 {
            return Err(HelmParseError::WrongFieldCount(s.to_string()));
        }

        let parse = |field: &str| -> Result<f64, HelmParseError> {
            match field.parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(v),
                _ => Err(HelmParseError::InvalidNumber(field.to_string())),
            }
        };

        Ok(Self {
            throttle: parse(fields[0])?,
            rudder: parse(fields[1])?,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_format() {
        assert_eq!(HelmCmd::new(50.0, -0.25).to_string(), "<50,-0.25>");
        assert_eq!(HelmCmd::neutral().to_string(), "<0,0>");
    }

    #[test]
    fn test_parse() {
        assert_eq!("<50.0,-0.25>".parse(), Ok(HelmCmd::new(50.0, -0.25)));
        assert_eq!(" < 12 , 0.5 > ".parse(), Ok(HelmCmd::new(12.0, 0.5)));

        assert!(matches!(
            "50,0".parse::<HelmCmd>(),
            Err(HelmParseError::MissingDelimiters(_))
        ));
        assert!(matches!(
            "<50,0,1>".parse::<HelmCmd>(),
            Err(HelmParseError::WrongFieldCount(_))
        ));
        assert!(matches!(
            "<fast,0>".parse::<HelmCmd>(),
            Err(HelmParseError::InvalidNumber(_))
        ));
        assert!(matches!(
            "<NaN,0>".parse::<HelmCmd>(),
            Err(HelmParseError::InvalidNumber(_))
        ));
    }
}
