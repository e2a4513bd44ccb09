use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// A plant's health classification at some instant.
///
/// `Unknown` is what a plant reports before any status-relevant event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlantStatus {
    #[default]
    Unknown,
    Healthy,
    NeedsAttention,
    Sick,
    Recovering,
    Dormant,
    Dead,
}

impl PlantStatus {
    pub const ALL: [Self; 7] = [
        Self::Unknown,
        Self::Healthy,
        Self::NeedsAttention,
        Self::Sick,
        Self::Recovering,
        Self::Dormant,
        Self::Dead,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Healthy => "healthy",
            Self::NeedsAttention => "needs_attention",
            Self::Sick => "sick",
            Self::Recovering => "recovering",
            Self::Dormant => "dormant",
            Self::Dead => "dead",
        }
    }
}

impl fmt::Display for PlantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus {
    pub raw: String,
}

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown plant status '{}': expected one of unknown, healthy, \
             needs_attention, sick, recovering, dormant, dead",
            self.raw
        )
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for PlantStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unknown" => Ok(Self::Unknown),
            "healthy" => Ok(Self::Healthy),
            "needs_attention" | "needs-attention" => Ok(Self::NeedsAttention),
            "sick" | "diseased" => Ok(Self::Sick),
            "recovering" => Ok(Self::Recovering),
            "dormant" => Ok(Self::Dormant),
            "dead" => Ok(Self::Dead),
            _ => Err(UnknownStatus { raw: s.to_string() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_fromstr_roundtrip() {
        for status in PlantStatus::ALL {
            let parsed: PlantStatus = status.as_str().parse().expect("should parse");
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn accepts_aliases() {
        assert_eq!(
            "Needs-Attention".parse::<PlantStatus>().expect("alias"),
            PlantStatus::NeedsAttention
        );
        assert_eq!("diseased".parse::<PlantStatus>().expect("alias"), PlantStatus::Sick);
    }

    #[test]
    fn rejects_unknown_value() {
        let err = "thriving".parse::<PlantStatus>().expect_err("should fail");
        assert_eq!(err.raw, "thriving");
        assert!(err.to_string().contains("needs_attention"));
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&PlantStatus::NeedsAttention).expect("serialize");
        assert_eq!(json, "\"needs_attention\"");
    }

    #[test]
    fn default_is_unknown() {
        assert_eq!(PlantStatus::default(), PlantStatus::Unknown);
    }
}
