//! Dotted numeric API versions
//!
//! Versions compare component by component as integers, with missing
//! trailing components treated as zero: `1.9 == 1.9.0 < 1.10`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::VersionError;

/// Oldest device API that accepts user EQ parameters
pub const USER_EQ_MIN_VERSION: [u32; 2] = [1, 9];

/// A parsed device API version
#[derive(Debug, Clone)]
pub struct ApiVersion {
    parts: Vec<u32>,
}

impl ApiVersion {
    /// Build a version from its numeric components
    pub fn from_parts(parts: impl Into<Vec<u32>>) -> Self {
        Self {
            parts: parts.into(),
        }
    }

    /// Oldest version supporting user EQ
    pub fn user_eq_minimum() -> Self {
        Self::from_parts(USER_EQ_MIN_VERSION)
    }

    /// Numeric components, most significant first
    pub fn parts(&self) -> &[u32] {
        &self.parts
    }

    /// Returns whether this device API accepts user EQ parameters
    pub fn supports_user_eq(&self) -> bool {
        *self >= Self::user_eq_minimum()
    }
}

impl FromStr for ApiVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| VersionError {
            input: s.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix(['v', 'V'])
            .unwrap_or(trimmed);
        if digits.is_empty() {
            return Err(invalid("empty version"));
        }

        let parts = digits
            .split('.')
            .map(|part| {
                if part.is_empty() {
                    return Err(invalid("empty component"));
                }
                if !part.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(invalid("non-numeric component"));
                }
                part.parse::<u32>()
                    .map_err(|_| invalid("component out of range"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { parts })
    }
}

impl Ord for ApiVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.parts.len().max(other.parts.len());
        (0..len)
            .map(|i| {
                let a = self.parts.get(i).copied().unwrap_or(0);
                let b = other.parts.get(i).copied().unwrap_or(0);
                a.cmp(&b)
            })
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for ApiVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ApiVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for ApiVersion {}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for part in &self.parts {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{}", part)?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> ApiVersion {
        s.parse().unwrap()
    }

    #[test]
    fn test_numeric_not_lexical() {
        assert!(v("1.10") > v("1.9"));
        assert!(v("2.0") > v("1.99"));
        assert!(v("1.8.5") < v("1.9"));
    }

    #[test]
    fn test_trailing_zeros_are_equal() {
        assert_eq!(v("1.9"), v("1.9.0"));
        assert_eq!(v("1.9.0.0"), ApiVersion::user_eq_minimum());
        assert!(v("1.9.1") > v("1.9"));
    }

    #[test]
    fn test_user_eq_gate() {
        assert!(v("1.9").supports_user_eq());
        assert!(v("1.10").supports_user_eq());
        assert!(v("2").supports_user_eq());
        assert!(!v("1.8.5").supports_user_eq());
        assert!(!v("1").supports_user_eq());
    }

    #[test]
    fn test_accepts_prefix_and_whitespace() {
        assert_eq!(v(" v1.9 "), v("1.9"));
        assert_eq!(v("V2.1").parts(), &[2, 1]);
    }

    #[test]
    fn test_rejects_malformed() {
        for input in ["", "  ", "v", "1..9", "1.9.", ".9", "1.9b", "one", "1.-9", "99999999999"] {
            let err = input.parse::<ApiVersion>().unwrap_err();
            assert_eq!(err.input, input);
        }
    }

    #[test]
    fn test_pre_release_is_not_comparable() {
        for input in ["1.9b1", "1.9rc1", "1.9.dev0", "1.9-beta"] {
            let err = input.parse::<ApiVersion>().unwrap_err();
            assert_eq!(err.input, input);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(v("1.10.0").to_string(), "1.10.0");
        assert_eq!(v("v01.9").to_string(), "1.9");
    }
}
