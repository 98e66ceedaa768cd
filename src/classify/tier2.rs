//! Pluggable semantic ("tier 2") classification.
//!
//! No concrete model is assumed: anything that can return the same ranked
//! `Classification` shape as tier 1 can slot in. Tier 2 is consulted only
//! when tier-1 confidence is low or the top candidates are too close to
//! call.

use crate::classify::tier1::{classify_segment_sync, Classification};
use crate::defaults;
use crate::error::{CallguideError, Result};

/// Trait for semantic segment classification.
///
/// This trait allows swapping implementations (remote model vs mock).
#[async_trait::async_trait]
pub trait SemanticClassifier: Send + Sync {
    /// Classify transcript text into ranked segment candidates.
    async fn classify(&self, text: &str) -> Result<Classification>;

    /// Get the name of the backing model, for logging.
    fn name(&self) -> &str;
}

/// Whether a tier-1 result is weak or ambiguous enough to warrant tier 2.
pub fn needs_tier2(tier1: &Classification) -> bool {
    match &tier1.primary {
        None => true,
        Some(primary) => {
            if primary.confidence < defaults::TIER2_TRIGGER_CONFIDENCE {
                return true;
            }
            match tier1.alternates.first() {
                Some(runner_up) => {
                    primary.confidence - runner_up.confidence < defaults::TIER2_AMBIGUITY_MARGIN
                }
                None => false,
            }
        }
    }
}

/// Classify `text`, consulting `tier2` when the tier-1 result is weak or
/// ambiguous.
///
/// A tier-2 failure falls back to the tier-1 result; classification is
/// best-effort guidance and must never fail the call.
pub async fn classify_segment(
    text: &str,
    tier2: Option<&dyn SemanticClassifier>,
) -> Classification {
    let tier1 = classify_segment_sync(text);

    let Some(tier2) = tier2 else {
        return tier1;
    };
    if !needs_tier2(&tier1) {
        return tier1;
    }

    match tier2.classify(text).await {
        Ok(semantic) if semantic.primary.is_some() => semantic,
        Ok(_) => tier1,
        Err(e) => {
            log::warn!("tier-2 classifier '{}' failed: {}", tier2.name(), e);
            tier1
        }
    }
}

/// Mock semantic classifier for testing
#[derive(Debug, Clone, Default)]
pub struct MockSemanticClassifier {
    name: String,
    result: Classification,
    should_fail: bool,
}

impl MockSemanticClassifier {
    /// Create a new mock classifier with default settings
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            result: Classification::default(),
            should_fail: false,
        }
    }

    /// Configure the mock to return a specific classification
    pub fn with_result(mut self, result: Classification) -> Self {
        self.result = result;
        self
    }

    /// Configure the mock to fail on classify
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }
}

#[async_trait::async_trait]
impl SemanticClassifier for MockSemanticClassifier {
    async fn classify(&self, _text: &str) -> Result<Classification> {
        if self.should_fail {
            Err(CallguideError::Other(
                "mock semantic classification failure".to_string(),
            ))
        } else {
            Ok(self.result.clone())
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
