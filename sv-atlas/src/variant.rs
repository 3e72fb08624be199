use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Player model shape. Only the arm width differs between the two.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyVariant {
    #[default]
    Classic,
    Slim,
}

impl BodyVariant {
    /// Arm width in source pixels (and model pixels).
    pub const fn arm_width(self) -> u32 {
        match self {
            Self::Classic => 4,
            Self::Slim => 3,
        }
    }
}

impl fmt::Display for BodyVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Classic => write!(f, "classic"),
            Self::Slim => write!(f, "slim"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid body variant: {0} (expected 'classic' or 'slim')")]
pub struct ParseVariantError(pub String);

impl FromStr for BodyVariant {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "classic" | "steve" | "default" => Ok(Self::Classic),
            "slim" | "alex" => Ok(Self::Slim),
            _ => Err(ParseVariantError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aliases() {
        assert_eq!("Steve".parse::<BodyVariant>(), Ok(BodyVariant::Classic));
        assert_eq!("ALEX".parse::<BodyVariant>(), Ok(BodyVariant::Slim));
        assert!("wide".parse::<BodyVariant>().is_err());
    }

    #[test]
    fn arm_width_ratio() {
        assert_eq!(BodyVariant::Classic.arm_width() * 3, BodyVariant::Slim.arm_width() * 4);
    }
}
