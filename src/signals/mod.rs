//! Signal detection: turns a student utterance into numeric deltas,
//! behavioral pattern tags and EQ categories.
//!
//! - [`categories`] — the twelve-category enumeration and its keyword table
//! - [`extractor`] — keyword and hybrid extraction strategies

pub mod categories;
pub mod extractor;

pub use categories::{classify_keywords, has_conflicting_signals, EqSignal, Polarity};
pub use extractor::{
    extract_batch, extract_keyword_signals, ExtractionStrategy, HybridSignalExtractor,
    KeywordSignalExtractor, PatternTag, SignalDelta, SignalExtractor, MAX_DELTA,
};
