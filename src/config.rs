//! Scoring configuration

use serde::Serialize;
use std::str::FromStr;

/// What a per-sentence ratio becomes when its denominator is zero
///
/// A sentence with no label nodes (for example a single `(NN word)`) has no
/// brackets to recall or to be precise about.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum ZeroDivision {
    /// Always 0.0
    Zero,
    /// Always 1.0
    One,
    /// 1.0 when the numerator is zero as well, 0.0 otherwise
    #[default]
    OneIfBothEmpty,
}

impl ZeroDivision {
    /// `numerator / denominator`, with this policy applied at zero
    pub fn ratio(self, numerator: usize, denominator: usize) -> f64 {
        if denominator > 0 {
            return numerator as f64 / denominator as f64;
        }
        match self {
            ZeroDivision::Zero => 0.0,
            ZeroDivision::One => 1.0,
            ZeroDivision::OneIfBothEmpty if numerator == 0 => 1.0,
            ZeroDivision::OneIfBothEmpty => 0.0,
        }
    }
}

impl FromStr for ZeroDivision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "zero" => Ok(ZeroDivision::Zero),
            "one" => Ok(ZeroDivision::One),
            "both-empty" => Ok(ZeroDivision::OneIfBothEmpty),
            _ => Err(format!(
                "unknown zero-division policy '{}' (expected zero, one or both-empty)",
                s
            )),
        }
    }
}

/// Settings shared by every sentence of a scoring run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScorerConfig {
    pub zero_division: ZeroDivision,
    /// Sentences with more gold words than this are marked `skip`
    pub max_length: Option<usize>,
}

impl ScorerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_zero_division(mut self, zero_division: ZeroDivision) -> Self {
        self.zero_division = zero_division;
        self
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// True if a sentence of `length` words falls outside the cut-off
    pub fn skips(&self, length: usize) -> bool {
        self.max_length.is_some_and(|max| length > max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_policies() {
        assert_eq!(ZeroDivision::Zero.ratio(1, 4), 0.25);
        assert_eq!(ZeroDivision::Zero.ratio(0, 0), 0.0);
        assert_eq!(ZeroDivision::One.ratio(0, 0), 1.0);
        assert_eq!(ZeroDivision::OneIfBothEmpty.ratio(0, 0), 1.0);
        assert_eq!(ZeroDivision::OneIfBothEmpty.ratio(2, 0), 0.0);
    }

    #[test]
    fn test_parse_policy() {
        assert_eq!("zero".parse::<ZeroDivision>(), Ok(ZeroDivision::Zero));
        assert_eq!("both-empty".parse::<ZeroDivision>(), Ok(ZeroDivision::OneIfBothEmpty));
        assert!("half".parse::<ZeroDivision>().is_err());
    }

    #[test]
    fn test_length_cutoff() {
        let config = ScorerConfig::new();
        assert!(!config.skips(1000));

        let config = config.with_max_length(40);
        assert!(!config.skips(40));
        assert!(config.skips(41));
    }
}
