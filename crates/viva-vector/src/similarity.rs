//! Semantic similarity between answers and reference answers.

use tracing::debug;

use crate::embedder::Embedder;
use crate::normalize::cosine_similarity;

/// Semantic similarity between a candidate answer and an ideal answer.
///
/// Returns `None` when embedding either text fails — similarity is a
/// supplementary scoring signal, so failure degrades rather than aborts.
pub async fn answer_similarity(
    embedder: &dyn Embedder,
    ideal_answer: &str,
    answer: &str,
) -> Option<f64> {
    let ideal = match embedder.embed(ideal_answer).await {
        Ok(v) => v,
        Err(err) => {
            debug!(error = %err, "ideal answer embedding failed, skipping similarity");
            return None;
        }
    };
    let given = match embedder.embed(answer).await {
        Ok(v) => v,
        Err(err) => {
            debug!(error = %err, "answer embedding failed, skipping similarity");
            return None;
        }
    };
    Some(f64::from(cosine_similarity(&ideal, &given)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::HashingEmbedder;

    #[tokio::test]
    async fn identical_texts_score_one() {
        let embedder = HashingEmbedder::default();
        let sim = answer_similarity(&embedder, "a pool reuses connections", "a pool reuses connections")
            .await
            .unwrap();
        assert!((sim - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn related_text_scores_higher_than_unrelated() {
        let embedder = HashingEmbedder::default();
        let ideal = "indexes let the database skip scanning every row";
        let related = answer_similarity(&embedder, ideal, "an index avoids scanning every row")
            .await
            .unwrap();
        let unrelated = answer_similarity(&embedder, ideal, "my favorite color is green")
            .await
            .unwrap();
        assert!(related > unrelated);
    }

    #[tokio::test]
    async fn unembeddable_text_yields_none() {
        let embedder = HashingEmbedder::default();
        let sim = answer_similarity(&embedder, "?!", "a real answer").await;
        assert!(sim.is_none());
    }
}
