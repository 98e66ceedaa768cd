//! Streaming accumulator for captured-info extraction.
//!
//! Each transcript chunk is re-extracted and merged into a running
//! `CapturedInfo` with first-writer-wins semantics: once a field has been
//! determined, later chunks cannot overwrite it.

use crate::extract::info::{extract_info, CapturedInfo};

/// Callback invoked with a snapshot after every chunk.
pub type InfoUpdateFn = Box<dyn Fn(&CapturedInfo) + Send + Sync>;

/// Accumulates structured facts from transcript chunks as they arrive.
pub struct StreamingInfoExtractor {
    current: CapturedInfo,
    on_update: Option<InfoUpdateFn>,
}

impl StreamingInfoExtractor {
    /// Creates an extractor with no update callback.
    pub fn new() -> Self {
        Self {
            current: CapturedInfo::default(),
            on_update: None,
        }
    }

    /// Creates an extractor that invokes `on_update` with a snapshot after
    /// each chunk.
    pub fn with_callback(on_update: InfoUpdateFn) -> Self {
        Self {
            current: CapturedInfo::default(),
            on_update: Some(on_update),
        }
    }

    /// Extracts facts from `chunk` and merges them into the accumulator,
    /// keeping previously determined fields unchanged.
    pub fn add_chunk(&mut self, chunk: &str) -> &CapturedInfo {
        let extracted = extract_info(chunk);
        self.current.merge_keep_first(&extracted);
        if let Some(callback) = &self.on_update {
            callback(&self.current);
        }
        &self.current
    }

    /// Returns the current snapshot without processing anything.
    pub fn current_info(&self) -> &CapturedInfo {
        &self.current
    }

    /// Clears all accumulated fields back to unknown.
    pub fn reset(&mut self) {
        self.current = CapturedInfo::default();
    }
}

impl Default for StreamingInfoExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::info::TriState;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_first_postcode_wins() {
        let mut extractor = StreamingInfoExtractor::new();
        extractor.add_chunk("I'm at SW11 2AB");
        extractor.add_chunk("sorry, I meant N1 7AA");

        assert_eq!(
            extractor.current_info().postcode,
            Some("SW11 2AB".to_string())
        );
    }

    #[test]
    fn test_fields_accumulate_across_chunks() {
        let mut extractor = StreamingInfoExtractor::new();
        extractor.add_chunk("my boiler is broken");
        extractor.add_chunk("the postcode is SW11 2AB");
        extractor.add_chunk("my tenant is there");

        let info = extractor.current_info();
        assert_eq!(info.job, Some("boiler is broken".to_string()));
        assert_eq!(info.postcode, Some("SW11 2AB".to_string()));
        assert_eq!(info.has_tenant, TriState::Yes);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut extractor = StreamingInfoExtractor::new();
        extractor.add_chunk("leaking tap at SW11 2AB");
        assert!(extractor.current_info().postcode.is_some());

        extractor.reset();
        assert_eq!(extractor.current_info().postcode, None);
        assert_eq!(extractor.current_info().job, None);
        assert_eq!(extractor.current_info().has_tenant, TriState::Unknown);
    }

    #[test]
    fn test_callback_fires_per_chunk_with_snapshot() {
        let seen: Arc<Mutex<Vec<Option<String>>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);

        let mut extractor = StreamingInfoExtractor::with_callback(Box::new(move |info| {
            seen_clone.lock().unwrap().push(info.postcode.clone());
        }));

        extractor.add_chunk("hello there");
        extractor.add_chunk("I'm at SW11 2AB");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], None);
        assert_eq!(seen[1], Some("SW11 2AB".to_string()));
    }

    #[test]
    fn test_chunk_with_no_signal_changes_nothing() {
        let mut extractor = StreamingInfoExtractor::new();
        extractor.add_chunk("boiler");
        let before = extractor.current_info().clone();

        extractor.add_chunk("umm let me think");
        assert_eq!(extractor.current_info(), &before);
    }
}
