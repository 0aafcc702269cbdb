//! Metric labels as the single source of truth for raw log label strings.

use std::fmt;
use std::str::FromStr;

/// Monitor counters the aggregator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    TotalDistance,
    StrokeRate,
    TotalStrokes,
    Watts,
    Calories,
    HeartRate,
    Speed,
}

impl Metric {
    /// Label used for this metric in the raw log.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TotalDistance => "total_distance_m",
            Self::StrokeRate => "stroke_rate",
            Self::TotalStrokes => "total_strokes",
            Self::Watts => "watts",
            Self::Calories => "total_kcal",
            Self::HeartRate => "heart_rate",
            Self::Speed => "avg_distance_cmps",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Metric {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "total_distance_m" => Ok(Self::TotalDistance),
            "stroke_rate" => Ok(Self::StrokeRate),
            "total_strokes" => Ok(Self::TotalStrokes),
            "watts" => Ok(Self::Watts),
            "total_kcal" => Ok(Self::Calories),
            "heart_rate" => Ok(Self::HeartRate),
            "avg_distance_cmps" => Ok(Self::Speed),
            _ => Err(UnknownMetric(s.to_string())),
        }
    }
}

/// Error type for unknown metric labels.
#[derive(Debug, Clone)]
pub struct UnknownMetric(String);

impl fmt::Display for UnknownMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown metric: {}", self.0)
    }
}

impl std::error::Error for UnknownMetric {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_all_variants() {
        let variants = [
            Metric::TotalDistance,
            Metric::StrokeRate,
            Metric::TotalStrokes,
            Metric::Watts,
            Metric::Calories,
            Metric::HeartRate,
            Metric::Speed,
        ];

        for variant in &variants {
            let s = variant.to_string();
            let parsed: Metric = s.parse().expect("should parse");
            assert_eq!(parsed, *variant, "roundtrip failed for {variant:?}");
        }
    }

    #[test]
    fn unknown_label_errors() {
        let err = "tank_volume".parse::<Metric>().unwrap_err();
        assert_eq!(err.to_string(), "unknown metric: tank_volume");
    }
}
