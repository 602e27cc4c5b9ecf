// Keyword Urgency Estimator

use crate::analyzers::Analyzer;
use crate::config::UrgencyKeywords;
use crate::types::*;

/// Scores urgency from keyword hits in three severity tiers.
///
/// Matching is a case-insensitive substring test and each keyword counts once,
/// however often it appears. The ladder is evaluated top to bottom:
///
/// | hits            | score |
/// |-----------------|-------|
/// | 2+ high         | 9     |
/// | 1 high          | 8     |
/// | 3+ medium       | 7     |
/// | 2 medium        | 6     |
/// | 1 medium        | 5     |
/// | 1+ low          | 3     |
/// | none            | 4     |
#[derive(Debug, Clone)]
pub struct UrgencyEstimator {
    high: Vec<String>,
    medium: Vec<String>,
    low: Vec<String>,
}

/// Keyword hits per tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TierHits {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl UrgencyEstimator {
    pub fn new(keywords: &UrgencyKeywords) -> Self {
        Self {
            high: lowercase(&keywords.high),
            medium: lowercase(&keywords.medium),
            low: lowercase(&keywords.low),
        }
    }

    pub fn hits(&self, text: &str) -> TierHits {
        let text = text.to_lowercase();
        TierHits {
            high: count_hits(&text, &self.high),
            medium: count_hits(&text, &self.medium),
            low: count_hits(&text, &self.low),
        }
    }

    pub fn score(&self, text: &str) -> UrgencyScore {
        let score = Self::score_hits(self.hits(text));
        tracing::debug!(score = score.value(), "urgency estimated");
        score
    }

    /// The scoring ladder, separated from matching
    pub fn score_hits(hits: TierHits) -> UrgencyScore {
        let value = match hits {
            TierHits { high, .. } if high >= 2 => 9,
            TierHits { high, .. } if high >= 1 => 8,
            TierHits { medium, .. } if medium >= 3 => 7,
            TierHits { medium, .. } if medium >= 2 => 6,
            TierHits { medium, .. } if medium >= 1 => 5,
            TierHits { low, .. } if low >= 1 => 3,
            _ => 4,
        };
        UrgencyScore::new(value)
    }
}

impl Default for UrgencyEstimator {
    fn default() -> Self {
        Self::new(&UrgencyKeywords::default())
    }
}

impl Analyzer for UrgencyEstimator {
    fn name(&self) -> &str {
        "urgency"
    }
}

fn lowercase(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

fn count_hits(text: &str, keywords: &[String]) -> usize {
    keywords.iter().filter(|k| text.contains(k.as_str())).count()
}
