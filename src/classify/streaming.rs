//! Debounced streaming classification of an accumulating transcript.
//!
//! Chunks arrive in rapid bursts during speech. Each chunk appends to the
//! transcript buffer and (re)arms a single cancelable timer; only after the
//! configured quiet period does the whole accumulated text get re-classified
//! and the update callback fired. Callers that need the latest partial
//! result without waiting use the synchronous `current_classification`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::classify::tier1::Classification;
use crate::classify::tier2::{classify_segment, SemanticClassifier};
use crate::defaults;

/// Callback invoked with the fresh result after each debounced run.
pub type ClassificationUpdateFn = Arc<dyn Fn(&Classification) + Send + Sync>;

/// Tuning for a `StreamingClassifier`.
#[derive(Clone)]
pub struct StreamingClassifierOptions {
    /// Quiet period before re-classification runs.
    pub debounce: Duration,
    /// Whether to consult the semantic fallback at all. Off by default so
    /// operators can disable tier 2 without unplugging the backend.
    pub use_tier2: bool,
    /// Optional semantic fallback consulted on weak or ambiguous tier-1
    /// results, when `use_tier2` is set.
    pub tier2: Option<Arc<dyn SemanticClassifier>>,
}

impl Default for StreamingClassifierOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(defaults::CLASSIFY_DEBOUNCE_MS),
            use_tier2: false,
            tier2: None,
        }
    }
}

#[derive(Default)]
struct Inner {
    transcript: String,
    current: Option<Classification>,
}

/// Accumulates transcript chunks and re-classifies after quiet periods.
///
/// Must be used from within a tokio runtime; the debounce timer is an owned,
/// cancelable task, so paused-clock tests can advance virtual time.
pub struct StreamingClassifier {
    inner: Arc<Mutex<Inner>>,
    on_update: Option<ClassificationUpdateFn>,
    options: StreamingClassifierOptions,
    pending: Option<JoinHandle<()>>,
}

impl StreamingClassifier {
    /// Creates a classifier with no update callback.
    pub fn new(options: StreamingClassifierOptions) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            on_update: None,
            options,
            pending: None,
        }
    }

    /// Creates a classifier that fires `on_update` after each debounced run.
    pub fn with_callback(options: StreamingClassifierOptions, on_update: ClassificationUpdateFn) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            on_update: Some(on_update),
            options,
            pending: None,
        }
    }

    /// Appends a chunk to the transcript buffer and (re)arms the debounce
    /// timer. The eventual run classifies the entire accumulated text, not
    /// just this chunk.
    pub fn add_chunk(&mut self, chunk: &str) {
        let snapshot = {
            let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            if !inner.transcript.is_empty() {
                inner.transcript.push(' ');
            }
            inner.transcript.push_str(chunk);
            inner.transcript.clone()
        };

        // A newer chunk supersedes any armed timer
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }

        let debounce = self.options.debounce;
        let tier2 = if self.options.use_tier2 {
            self.options.tier2.clone()
        } else {
            None
        };
        let inner = Arc::clone(&self.inner);
        let on_update = self.on_update.clone();

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            let result = classify_segment(&snapshot, tier2.as_deref()).await;
            {
                let mut inner = inner.lock().unwrap_or_else(|e| e.into_inner());
                inner.current = Some(result.clone());
            }
            if let Some(callback) = on_update {
                callback(&result);
            }
        }));
    }

    /// Returns the last computed result without forcing a new run.
    pub fn current_classification(&self) -> Option<Classification> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .current
            .clone()
    }

    /// Classifies the accumulated transcript immediately (tier 1 only),
    /// bypassing the debounce window. The result is cached like a debounced
    /// run's would be.
    pub fn classify_now(&self) -> Classification {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let result = crate::classify::tier1::classify_segment_sync(&inner.transcript);
        inner.current = Some(result.clone());
        result
    }

    /// The accumulated transcript so far.
    pub fn transcript(&self) -> String {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .transcript
            .clone()
    }

    /// Clears the buffer and cached result, canceling any armed timer.
    pub fn reset(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        *inner = Inner::default();
    }
}

impl Drop for StreamingClassifier {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}
