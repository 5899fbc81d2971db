//! Request orchestration: fetch → normalize → classify → aggregate →
//! render → respond.
//!
//! The handler owns its collaborators and runs each request as one
//! linear pass with no state carried between requests. Every external
//! call is wrapped individually so a failure maps to exactly one
//! [`AnalyzeError`] kind.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::{debug, info};

use crate::aggregate::aggregate;
use crate::error::AnalyzeError;
use crate::normalize::TextNormalizer;
use crate::types::{AnalysisResponse, LabelDistribution, Prediction};

/// Maximum number of flattened comment bodies fetched per submission.
pub const COMMENT_LIMIT: usize = 500;

/// URL prefixes accepted before any external call is made.
pub const ACCEPTED_URL_PREFIXES: &[&str] = &["https://www.reddit.com/", "https://reddit.com/"];

/// Resolves a submission URL to its flattened comment bodies.
#[async_trait]
pub trait CommentSource {
    async fn fetch_comments(&self, url: &str, limit: usize) -> anyhow::Result<Vec<String>>;
}

/// Batch text classifier returning one prediction per input, aligned by
/// index. Invocation is blocking and may take noticeable wall-clock
/// time for large batches.
pub trait Classifier {
    fn classify(&mut self, batch: &[String]) -> anyhow::Result<Vec<Prediction>>;
}

/// Renders a label distribution as PNG image bytes.
pub trait ChartRenderer {
    fn render_sentiment(&self, dist: &LabelDistribution) -> anyhow::Result<Vec<u8>>;
    fn render_emotion(&self, dist: &LabelDistribution) -> anyhow::Result<Vec<u8>>;
}

/// Per-request pipeline over injected collaborators.
///
/// Collaborators are constructed once at process start and passed in;
/// the handler never builds its own, which keeps the orchestration
/// testable with substituted implementations.
pub struct RequestHandler<S, C, R> {
    source: S,
    sentiment: C,
    emotion: C,
    renderer: R,
    normalizer: TextNormalizer,
}

impl<S, C, R> RequestHandler<S, C, R>
where
    S: CommentSource,
    C: Classifier,
    R: ChartRenderer,
{
    pub fn new(source: S, sentiment: C, emotion: C, renderer: R) -> Self {
        Self {
            source,
            sentiment,
            emotion,
            renderer,
            normalizer: TextNormalizer::new(),
        }
    }

    /// Run one analysis request end to end.
    pub async fn handle(&mut self, url: &str) -> Result<AnalysisResponse, AnalyzeError> {
        let url = url.trim();
        if !ACCEPTED_URL_PREFIXES.iter().any(|p| url.starts_with(p)) {
            return Err(AnalyzeError::InvalidInput(format!(
                "expected a URL starting with https://www.reddit.com/ or https://reddit.com/, got {url:?}"
            )));
        }

        info!(url, "fetching submission comments");
        let comments = self
            .source
            .fetch_comments(url, COMMENT_LIMIT)
            .await
            .map_err(|e| AnalyzeError::SourceUnavailable(e.to_string()))?;
        if comments.is_empty() {
            return Err(AnalyzeError::NoContent(
                "no comments found in this submission".into(),
            ));
        }

        let cleaned = self.normalizer.normalize_all(&comments);
        debug!(
            fetched = comments.len(),
            kept = cleaned.len(),
            "normalized comment batch"
        );
        // Classifiers may reject an empty batch, so this is a guarded
        // transition rather than a pass-through.
        if cleaned.is_empty() {
            return Err(AnalyzeError::NoContent(
                "no English comments survived filtering".into(),
            ));
        }

        let sentiment = self
            .sentiment
            .classify(&cleaned)
            .map_err(|e| AnalyzeError::AnalysisFailed(e.to_string()))?;
        let emotion = self
            .emotion
            .classify(&cleaned)
            .map_err(|e| AnalyzeError::AnalysisFailed(e.to_string()))?;

        let sentiment_dist = aggregate(&labels(sentiment));
        let emotion_dist = aggregate(&labels(emotion));

        let sentiment_png = self
            .renderer
            .render_sentiment(&sentiment_dist)
            .map_err(|e| AnalyzeError::AnalysisFailed(e.to_string()))?;
        let emotion_png = self
            .renderer
            .render_emotion(&emotion_dist)
            .map_err(|e| AnalyzeError::AnalysisFailed(e.to_string()))?;

        info!(comments = cleaned.len(), "analysis complete");
        Ok(AnalysisResponse {
            sentiment: sentiment_dist,
            emotion: emotion_dist,
            sentiment_chart: BASE64.encode(&sentiment_png),
            emotion_chart: BASE64.encode(&emotion_png),
        })
    }
}

fn labels(predictions: Vec<Prediction>) -> Vec<String> {
    predictions.into_iter().map(|p| p.label).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticSource {
        comments: Vec<String>,
        fail: bool,
        calls: Arc<AtomicUsize>,
    }

    impl StaticSource {
        fn new(comments: &[&str]) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    comments: comments.iter().map(|s| s.to_string()).collect(),
                    fail: false,
                    calls: calls.clone(),
                },
                calls,
            )
        }

        fn failing() -> Self {
            Self {
                comments: vec![],
                fail: true,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl CommentSource for StaticSource {
        async fn fetch_comments(&self, _url: &str, limit: usize) -> anyhow::Result<Vec<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("received 404 Not Found");
            }
            Ok(self.comments.iter().take(limit).cloned().collect())
        }
    }

    /// Assigns labels round-robin from a fixed vocabulary.
    struct RoundRobin {
        vocab: Vec<&'static str>,
        fail: bool,
        calls: Arc<AtomicUsize>,
    }

    impl RoundRobin {
        fn new(vocab: &[&'static str]) -> Self {
            Self {
                vocab: vocab.to_vec(),
                fail: false,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn failing() -> Self {
            Self {
                vocab: vec!["LABEL_0"],
                fail: true,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl Classifier for RoundRobin {
        fn classify(&mut self, batch: &[String]) -> anyhow::Result<Vec<Prediction>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("model session crashed");
            }
            Ok(batch
                .iter()
                .enumerate()
                .map(|(i, _)| Prediction {
                    label: self.vocab[i % self.vocab.len()].to_string(),
                    score: 0.9,
                })
                .collect())
        }
    }

    struct StubRenderer {
        fail: bool,
    }

    impl ChartRenderer for StubRenderer {
        fn render_sentiment(&self, _dist: &LabelDistribution) -> anyhow::Result<Vec<u8>> {
            if self.fail {
                anyhow::bail!("no drawing backend");
            }
            Ok(vec![0x89, b'P', b'N', b'G'])
        }

        fn render_emotion(&self, _dist: &LabelDistribution) -> anyhow::Result<Vec<u8>> {
            self.render_sentiment(_dist)
        }
    }

    const ENGLISH: &[&str] = &[
        "this is a really insightful comment about the topic",
        "completely disagree with the premise of this post",
        "what a great discussion, learned a lot from this thread",
        "the article misses the point entirely in my opinion",
        "thanks for sharing, this was a genuinely useful read",
        "i am not sure the numbers in this post hold up",
        "fantastic explanation, clear and easy to follow",
        "this take is pretty bad and the sources are weak",
        "love seeing this kind of deep dive on here",
        "somebody already posted this last week by the way",
    ];

    fn handler(
        source: StaticSource,
        sentiment: RoundRobin,
        emotion: RoundRobin,
        fail_render: bool,
    ) -> RequestHandler<StaticSource, RoundRobin, StubRenderer> {
        RequestHandler::new(
            source,
            sentiment,
            emotion,
            StubRenderer { fail: fail_render },
        )
    }

    #[tokio::test]
    async fn rejects_foreign_urls_without_fetching() {
        let (source, calls) = StaticSource::new(ENGLISH);
        let mut h = handler(
            source,
            RoundRobin::new(&["LABEL_0"]),
            RoundRobin::new(&["joy"]),
            false,
        );

        let err = h.handle("https://example.com/r/rust").await.unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
        assert_eq!(calls.load(Ordering::SeqCst), 0, "no fetch may be attempted");
    }

    #[tokio::test]
    async fn accepts_both_reddit_prefixes() {
        for url in [
            "https://www.reddit.com/r/rust/comments/abc123/title/",
            "https://reddit.com/r/rust/comments/abc123/title/",
        ] {
            let (source, _) = StaticSource::new(ENGLISH);
            let mut h = handler(
                source,
                RoundRobin::new(&["LABEL_0", "LABEL_1", "LABEL_2"]),
                RoundRobin::new(&["joy", "anger"]),
                false,
            );
            assert!(h.handle(url).await.is_ok(), "rejected {url}");
        }
    }

    #[tokio::test]
    async fn fetch_failure_maps_to_source_unavailable() {
        let mut h = handler(
            StaticSource::failing(),
            RoundRobin::new(&["LABEL_0"]),
            RoundRobin::new(&["joy"]),
            false,
        );

        let err = h
            .handle("https://www.reddit.com/r/rust/comments/abc123/")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "source_unavailable");
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn zero_fetched_comments_is_no_content() {
        let (source, _) = StaticSource::new(&[]);
        let mut h = handler(
            source,
            RoundRobin::new(&["LABEL_0"]),
            RoundRobin::new(&["joy"]),
            false,
        );

        let err = h
            .handle("https://www.reddit.com/r/rust/comments/abc123/")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "no_content");
    }

    #[tokio::test]
    async fn all_filtered_out_is_no_content_and_skips_classifiers() {
        // French comments: fetched fine, but nothing survives the
        // language filter.
        let (source, _) = StaticSource::new(&[
            "Bonjour le monde, comment allez vous aujourd'hui",
            "je ne suis pas d'accord avec cet article du tout",
        ]);
        let sentiment = RoundRobin::new(&["LABEL_0"]);
        let sentiment_calls = sentiment.calls.clone();
        let mut h = handler(source, sentiment, RoundRobin::new(&["joy"]), false);

        let err = h
            .handle("https://www.reddit.com/r/france/comments/abc123/")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "no_content");
        assert_eq!(
            sentiment_calls.load(Ordering::SeqCst),
            0,
            "classifier must not see an empty batch"
        );
    }

    #[tokio::test]
    async fn classifier_failure_maps_to_analysis_failed() {
        let (source, _) = StaticSource::new(ENGLISH);
        let mut h = handler(
            source,
            RoundRobin::failing(),
            RoundRobin::new(&["joy"]),
            false,
        );

        let err = h
            .handle("https://www.reddit.com/r/rust/comments/abc123/")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "analysis_failed");
    }

    #[tokio::test]
    async fn renderer_failure_maps_to_analysis_failed() {
        let (source, _) = StaticSource::new(ENGLISH);
        let mut h = handler(
            source,
            RoundRobin::new(&["LABEL_0", "LABEL_2"]),
            RoundRobin::new(&["joy"]),
            true,
        );

        let err = h
            .handle("https://www.reddit.com/r/rust/comments/abc123/")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "analysis_failed");
    }

    #[tokio::test]
    async fn happy_path_distributions_sum_to_one_with_charts() {
        let (source, _) = StaticSource::new(ENGLISH);
        let mut h = handler(
            source,
            RoundRobin::new(&["LABEL_0", "LABEL_1", "LABEL_2"]),
            RoundRobin::new(&["joy", "anger", "fear", "neutral"]),
            false,
        );

        let response = h
            .handle("https://www.reddit.com/r/rust/comments/abc123/title/")
            .await
            .unwrap();

        let sentiment_sum: f64 = response.sentiment.values().sum();
        let emotion_sum: f64 = response.emotion.values().sum();
        assert!((sentiment_sum - 1.0).abs() < 1e-9);
        assert!((emotion_sum - 1.0).abs() < 1e-9);
        assert!(!response.sentiment_chart.is_empty());
        assert!(!response.emotion_chart.is_empty());

        // Charts are transport-safe base64.
        assert!(
            BASE64.decode(&response.sentiment_chart).is_ok(),
            "sentiment chart is not valid base64"
        );
    }

    #[tokio::test]
    async fn comment_limit_is_passed_to_the_source() {
        // The static source truncates at the limit it receives; with
        // more comments than the cap, only the cap's worth contribute.
        let many: Vec<String> = (0..600)
            .map(|i| format!("perfectly ordinary english comment number {i} in this thread"))
            .collect();
        let calls = Arc::new(AtomicUsize::new(0));
        let source = StaticSource {
            comments: many,
            fail: false,
            calls,
        };
        let mut h = handler(
            source,
            RoundRobin::new(&["LABEL_1"]),
            RoundRobin::new(&["neutral"]),
            false,
        );

        let response = h
            .handle("https://www.reddit.com/r/rust/comments/abc123/")
            .await
            .unwrap();
        assert_eq!(response.sentiment["LABEL_1"], 1.0);
    }
}
