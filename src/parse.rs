// src/parse.rs
// Parsing of the weight/reps text typed on the `log` and `edit` commands.
use std::str::FromStr;
use thiserror::Error;

pub const MAX_RIR: u8 = 10;
/// Upper bound on the set count of an `NxR` entry.
pub const MAX_SETS: u32 = 100;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid weight '{0}'. Use a number (135, 22.5) or a change (+5, -10).")]
    InvalidWeight(String),
    #[error("Relative weight '{0}' needs a previous set of this exercise to build on.")]
    NoBaseWeight(String),
    #[error("Invalid reps '{0}'. Use a list (8,8,7) or sets x reps (3x8).")]
    InvalidReps(String),
    #[error("RIR must be between 0 and {MAX_RIR}, got {0}")]
    InvalidRir(u8),
}

/// A weight as typed: absolute, or a change relative to the last set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WeightSpec {
    Absolute(f64),
    /// `+N`: always relative.
    Increase(f64),
    /// `-N`: relative if there is a previous set, otherwise a negative
    /// absolute weight (assisted movements).
    Decrease(f64),
}

impl WeightSpec {
    /// # Errors
    /// `NoBaseWeight` for an increase without a previous weight.
    pub fn resolve(self, base: Option<f64>) -> Result<f64, Error> {
        match self {
            Self::Absolute(w) => Ok(w),
            Self::Increase(delta) => base
                .map(|b| b + delta)
                .ok_or_else(|| Error::NoBaseWeight(format!("+{delta}"))),
            Self::Decrease(delta) => Ok(base.map_or(-delta, |b| b - delta)),
        }
    }

    pub const fn is_relative(self) -> bool {
        !matches!(self, Self::Absolute(_))
    }
}

impl FromStr for WeightSpec {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let lowered = trimmed.to_ascii_lowercase();
        let number = ["lbs", "lb", "kg"]
            .iter()
            .find_map(|unit| lowered.strip_suffix(unit))
            .unwrap_or(lowered.as_str())
            .trim();

        let invalid = || Error::InvalidWeight(trimmed.to_string());
        let parse_magnitude = |s: &str| -> Result<f64, Error> {
            let value: f64 = s.trim().parse().map_err(|_| invalid())?;
            if value.is_finite() && value >= 0.0 {
                Ok(value)
            } else {
                Err(invalid())
            }
        };

        if let Some(rest) = number.strip_prefix('+') {
            Ok(Self::Increase(parse_magnitude(rest)?))
        } else if let Some(rest) = number.strip_prefix('-') {
            Ok(Self::Decrease(parse_magnitude(rest)?))
        } else {
            Ok(Self::Absolute(parse_magnitude(number)?))
        }
    }
}

/// Parses `8,8,7` (one set per entry) or `3x8` (three sets of eight).
/// # Errors
/// `InvalidReps` for empty, zero or non-numeric entries, or more than
/// [`MAX_SETS`] sets.
pub fn parse_reps(input: &str) -> Result<Vec<u32>, Error> {
    let trimmed = input.trim();
    let invalid = || Error::InvalidReps(trimmed.to_string());
    let positive = |s: &str| -> Result<u32, Error> {
        match s.trim().parse::<u32>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(invalid()),
        }
    };

    if let Some((sets, reps)) = trimmed.to_ascii_lowercase().split_once('x') {
        let sets = positive(sets)?;
        let reps = positive(reps)?;
        if sets > MAX_SETS {
            return Err(invalid());
        }
        return Ok(vec![reps; sets as usize]);
    }

    trimmed.split(',').map(positive).collect()
}

/// # Errors
/// `InvalidRir` above 10.
pub fn validate_rir(rir: Option<u8>) -> Result<Option<u8>, Error> {
    match rir {
        Some(r) if r > MAX_RIR => Err(Error::InvalidRir(r)),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_parsing() {
        assert_eq!("135".parse::<WeightSpec>(), Ok(WeightSpec::Absolute(135.0)));
        assert_eq!(" 22.5kg ".parse::<WeightSpec>(), Ok(WeightSpec::Absolute(22.5)));
        assert_eq!("225LBS".parse::<WeightSpec>(), Ok(WeightSpec::Absolute(225.0)));
        assert_eq!("+5".parse::<WeightSpec>(), Ok(WeightSpec::Increase(5.0)));
        assert_eq!("-10lb".parse::<WeightSpec>(), Ok(WeightSpec::Decrease(10.0)));
    }

    #[test]
    fn test_weight_parsing_invalid() {
        for input in ["", "heavy", "+", "--5", "nan", "inf", "12kgs"] {
            assert!(
                matches!(input.parse::<WeightSpec>(), Err(Error::InvalidWeight(_))),
                "'{input}' should be rejected"
            );
        }
    }

    #[test]
    fn test_weight_resolution() {
        assert_eq!(WeightSpec::Absolute(100.0).resolve(Some(80.0)), Ok(100.0));
        assert_eq!(WeightSpec::Increase(5.0).resolve(Some(100.0)), Ok(105.0));
        assert_eq!(WeightSpec::Decrease(10.0).resolve(Some(100.0)), Ok(90.0));
        assert_eq!(WeightSpec::Decrease(20.0).resolve(None), Ok(-20.0));
        assert!(matches!(
            WeightSpec::Increase(5.0).resolve(None),
            Err(Error::NoBaseWeight(_))
        ));
    }

    #[test]
    fn test_reps_parsing() {
        assert_eq!(parse_reps("8,8,7"), Ok(vec![8, 8, 7]));
        assert_eq!(parse_reps("3x5"), Ok(vec![5, 5, 5]));
        assert_eq!(parse_reps("2X10"), Ok(vec![10, 10]));
        assert_eq!(parse_reps(" 12 "), Ok(vec![12]));
        assert_eq!(parse_reps("8, 6"), Ok(vec![8, 6]));
        assert_eq!(parse_reps("100x1").map(|r| r.len()), Ok(100));
    }

    #[test]
    fn test_reps_parsing_invalid() {
        let inputs = [
            "", "0", "8,,7", "3x0", "0x5", "x5", "eight", "3x5x2", "-3", "101x5", "4000000000x5",
        ];
        for input in inputs {
            assert!(parse_reps(input).is_err(), "'{input}' should be rejected");
        }
    }

    #[test]
    fn test_rir_range() {
        assert_eq!(validate_rir(None), Ok(None));
        assert_eq!(validate_rir(Some(0)), Ok(Some(0)));
        assert_eq!(validate_rir(Some(10)), Ok(Some(10)));
        assert_eq!(validate_rir(Some(11)), Err(Error::InvalidRir(11)));
    }
}
