use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ScoreTally {
    pub passed: usize,
    pub failed: usize,
}

impl ScoreTally {
    pub fn record(&mut self, compliant: bool) {
        if compliant {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
    }

    pub fn score(&self) -> f64 {
        compliance_score(self.passed, self.failed)
    }
}

/// Percentage of passing rules rounded to two decimals; `0` when nothing ran.
pub fn compliance_score(passed: usize, failed: usize) -> f64 {
    let total = passed + failed;
    if total == 0 {
        return 0.0;
    }

    let ratio = passed as f64 / total as f64 * 100.0;
    (ratio * 100.0).round() / 100.0
}

/// Coarse reading of a score used by summaries and exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    UrgentGaps,
    NeedsImprovement,
    Strong,
}

impl ScoreBand {
    pub fn from_score(score: f64) -> Self {
        if score < 50.0 {
            Self::UrgentGaps
        } else if score < 75.0 {
            Self::NeedsImprovement
        } else {
            Self::Strong
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::UrgentGaps => "Urgent Gaps",
            Self::NeedsImprovement => "Needs Improvement",
            Self::Strong => "Strong",
        }
    }

    pub const fn message(self) -> &'static str {
        match self {
            Self::UrgentGaps => "Score below 50%: urgent compliance gaps.",
            Self::NeedsImprovement => "Score between 50% and 75%: room for improvement.",
            Self::Strong => "Strong compliance.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_rounds_to_two_decimals() {
        assert_eq!(compliance_score(1, 1), 50.0);
        assert_eq!(compliance_score(1, 2), 33.33);
        assert_eq!(compliance_score(2, 1), 66.67);
        assert_eq!(compliance_score(3, 0), 100.0);
    }

    #[test]
    fn score_is_zero_without_rules() {
        let score = compliance_score(0, 0);
        assert_eq!(score, 0.0);
        assert!(!score.is_nan());
    }

    #[test]
    fn bands_follow_dashboard_thresholds() {
        assert_eq!(ScoreBand::from_score(0.0), ScoreBand::UrgentGaps);
        assert_eq!(ScoreBand::from_score(49.99), ScoreBand::UrgentGaps);
        assert_eq!(ScoreBand::from_score(50.0), ScoreBand::NeedsImprovement);
        assert_eq!(ScoreBand::from_score(74.99), ScoreBand::NeedsImprovement);
        assert_eq!(ScoreBand::from_score(75.0), ScoreBand::Strong);
    }

    #[test]
    fn tally_counts_every_verdict() {
        let mut tally = ScoreTally::default();
        tally.record(true);
        tally.record(false);
        tally.record(true);
        assert_eq!(tally.passed, 2);
        assert_eq!(tally.failed, 1);
        assert_eq!(tally.score(), 66.67);
    }
}
