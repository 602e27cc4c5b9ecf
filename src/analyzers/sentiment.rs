// Similarity Sentiment Classifier

use crate::analyzers::{base::BaseAnalyzer, Analyzer};
use crate::config::ReferenceSentences;
use crate::services::SimilarityService;
use crate::types::*;
use crate::utils::round_to;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

pub const NOT_CONFIGURED: &str = "similarity service not configured";
pub const UNDETERMINED: &str = "Could not determine sentiment";

/// Classifies text by its average similarity to three reference sets.
pub struct SentimentClassifier {
    base: BaseAnalyzer,
    service: Option<Arc<dyn SimilarityService>>,
    references: Arc<ReferenceSentences>,
}

impl SentimentClassifier {
    pub fn new(
        service: Option<Arc<dyn SimilarityService>>,
        references: Arc<ReferenceSentences>,
        timeout: Duration,
    ) -> Self {
        Self {
            base: BaseAnalyzer::new("sentiment", timeout),
            service,
            references,
        }
    }

    /// Classify `text`; never fails.
    ///
    /// One similarity call is issued per label. A failed call scores that
    /// label 0.0 rather than aborting.
    pub async fn classify(&self, text: &str) -> SentimentResult {
        let Some(service) = &self.service else {
            tracing::warn!("sentiment skipped: {}", NOT_CONFIGURED);
            return SentimentResult::undetermined(BTreeMap::new(), NOT_CONFIGURED);
        };

        let calls = SentimentLabel::ALL.iter().map(|&label| {
            let service = service.clone();
            async move { (label, self.label_score(service.as_ref(), label, text).await) }
        });
        let scores: BTreeMap<SentimentLabel, f64> = join_all(calls).await.into_iter().collect();

        fuse_scores(scores)
    }

    async fn label_score(
        &self,
        service: &dyn SimilarityService,
        label: SentimentLabel,
        text: &str,
    ) -> f64 {
        let candidates = self.references.for_label(label);
        match self.base.guarded(service.similarity(text, candidates)).await {
            Ok(scores) => average(&scores),
            Err(e) => {
                tracing::warn!(%label, error = %e, "similarity call failed, scoring label as 0");
                0.0
            }
        }
    }
}

impl Analyzer for SentimentClassifier {
    fn name(&self) -> &str {
        self.base.name()
    }
}

/// Turn per-label averages into a label and confidence.
///
/// Ties go to the label that comes first in [`SentimentLabel::ALL`].
pub fn fuse_scores(scores: BTreeMap<SentimentLabel, f64>) -> SentimentResult {
    let score_of = |label: SentimentLabel| scores.get(&label).copied().unwrap_or(0.0);

    if SentimentLabel::ALL.iter().all(|&label| score_of(label) == 0.0) {
        return SentimentResult::undetermined(scores, UNDETERMINED);
    }

    let mut winner = SentimentLabel::ALL[0];
    for &label in &SentimentLabel::ALL[1..] {
        if score_of(label) > score_of(winner) {
            winner = label;
        }
    }

    let total: f64 = SentimentLabel::ALL.iter().map(|&label| score_of(label)).sum();
    let confidence = if total > 0.0 {
        (score_of(winner) / total).clamp(0.0, 1.0)
    } else {
        0.0
    };

    SentimentResult {
        label: winner,
        confidence: round_to(confidence, 3),
        similarity_scores: scores
            .into_iter()
            .map(|(label, score)| (label, round_to(score, 4)))
            .collect(),
        error: None,
    }
}

fn average(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    }
}
