//! Running estimate of what a run costs in API fees.

use serde::Serialize;

/// Published list prices, in US dollars per million billable units
pub mod pricing {
    /// `gpt-4o-mini`, per million tokens
    pub const GPT_4O_MINI_PER_MILLION_TOKENS: f64 = 0.15;
    /// OpenAI `tts-1`, per million characters
    pub const OPENAI_TTS_PER_MILLION_CHARS: f64 = 15.0;
    /// ElevenLabs, per million characters
    pub const ELEVENLABS_PER_MILLION_CHARS: f64 = 300.0;
    /// Unreal Speech, per million characters
    pub const UNREAL_SPEECH_PER_MILLION_CHARS: f64 = 16.0;
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CostError {
    #[error("Price for {label} must be a finite, non-negative number, got {price}")]
    InvalidPrice { label: String, price: f64 },
}

/// One billable call: how many units were used and what a million of them cost
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostEntry {
    pub label: String,
    pub units: u64,
    pub price_per_million: f64,
}

impl CostEntry {
    pub fn new(label: impl Into<String>, units: u64, price_per_million: f64) -> Self {
        Self {
            label: label.into(),
            units,
            price_per_million,
        }
    }

    pub fn cost(&self) -> f64 {
        self.units as f64 / 1_000_000.0 * self.price_per_million
    }
}

/// Accumulates cost entries for a single run.
///
/// There is no way to subtract, so `total` never decreases.
#[derive(Debug, Default, Clone, Serialize)]
pub struct CostTracker {
    entries: Vec<CostEntry>,
    total: f64,
}

impl CostTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `units` at `price_per_million` and returns the increment
    pub fn record(&mut self, units: u64, price_per_million: f64) -> Result<f64, CostError> {
        self.record_entry(CostEntry::new("unlabelled", units, price_per_million))
    }

    pub fn record_entry(&mut self, entry: CostEntry) -> Result<f64, CostError> {
        if !entry.price_per_million.is_finite() || entry.price_per_million < 0.0 {
            return Err(CostError::InvalidPrice {
                label: entry.label,
                price: entry.price_per_million,
            });
        }

        let increment = entry.cost();
        tracing::debug!(
            label = %entry.label,
            units = entry.units,
            increment,
            "Recorded cost entry"
        );

        self.total += increment;
        self.entries.push(entry);
        Ok(increment)
    }

    /// Moves every entry of `other` into this tracker
    pub fn absorb(&mut self, other: CostTracker) {
        self.total += other.total;
        self.entries.extend(other.entries);
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn entries(&self) -> &[CostEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_returns_increment() {
        let mut tracker = CostTracker::new();
        let increment = tracker
            .record(2_000, pricing::GPT_4O_MINI_PER_MILLION_TOKENS)
            .unwrap();
        assert!((increment - 0.0003).abs() < 1e-12);
        assert_eq!(tracker.total(), increment);
    }

    #[test]
    fn test_total_is_sum_of_increments_and_monotonic() {
        let mut tracker = CostTracker::new();
        let calls = [
            (1_234, 0.15),
            (4_096, 15.0),
            (0, 300.0),
            (950, 16.0),
            (77_000, 0.15),
        ];

        let mut expected = 0.0;
        let mut previous = 0.0;
        for (units, price) in calls {
            expected += tracker.record(units, price).unwrap();
            assert!(tracker.total() >= previous);
            previous = tracker.total();
        }

        assert_eq!(tracker.total(), expected);
        assert_eq!(tracker.entries().len(), calls.len());
    }

    #[test]
    fn test_invalid_prices_are_rejected_without_recording() {
        let mut tracker = CostTracker::new();
        tracker.record(10, 1.0).unwrap();
        let before = tracker.total();

        assert!(tracker.record(10, -1.0).is_err());
        assert!(tracker.record(10, f64::NAN).is_err());
        assert!(tracker.record(10, f64::INFINITY).is_err());

        assert_eq!(tracker.total(), before);
        assert_eq!(tracker.entries().len(), 1);
    }

    #[test]
    fn test_absorb_keeps_entries_and_total() {
        let mut summaries = CostTracker::new();
        summaries
            .record_entry(CostEntry::new("summary", 1_000_000, 0.15))
            .unwrap();

        let mut speech = CostTracker::new();
        speech
            .record_entry(CostEntry::new("speech", 1_000_000, 15.0))
            .unwrap();

        speech.absorb(summaries);
        assert_eq!(speech.entries().len(), 2);
        assert!((speech.total() - 15.15).abs() < 1e-9);
    }
}
