//! Physical-layer symbols and cluster labeling
//!
//! Once the high and low durations of a burst have been grouped into
//! timing classes, each class is assigned a semantic symbol: a short
//! or long pulse, or the end-of-transmission marker. The encoding
//! this crate understands uses exactly two high classes and three low
//! classes; anything else means the capture was too noisy to label.

use thiserror::Error;

use crate::burst::Burst;
use crate::cluster::{ClusterDescription, ClusterSet};

/// A classified pulse segment
///
/// The `Display` form matches the trace notation used in diagnostic
/// logs: `-`/`--` for highs, `_`/`__` for lows, `.` for the end
/// marker, and `?` for an unassigned class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum Symbol {
    /// Default label; a lookup miss or an unclassified timing class
    #[default]
    #[strum(serialize = "?")]
    Spurious,

    /// Short high pulse
    #[strum(serialize = "-")]
    HighShort,

    /// Long high pulse
    #[strum(serialize = "--")]
    HighLong,

    /// Short low gap
    #[strum(serialize = "_")]
    LowShort,

    /// Long low gap
    #[strum(serialize = "__")]
    LowLong,

    /// End-of-transmission marker
    #[strum(serialize = ".")]
    EndOfTransmission,
}

/// Error labeling clusters or building a symbol stream
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SymbolError {
    /// Cluster counts do not match the 2-high/3-low encoding shape
    ///
    /// The capture was probably too noisy to recover distinct timing
    /// classes. This is reported rather than silently decoding with
    /// unlabeled clusters.
    #[error("cluster shape does not match encoding: {highs} high and {lows} low timing classes")]
    UnclassifiedClusters { highs: usize, lows: usize },

    /// A pulse duration fell outside every timing class
    ///
    /// The cluster partition invariant guarantees this cannot happen
    /// for durations that built the set; treat it as a hard decode
    /// failure for the burst.
    #[error("duration {0} is outside every timing class")]
    DurationNotInAnyCluster(u32),
}

/// Labeled timing classes for one burst
///
/// `SymbolTable` is the construct-then-freeze product of
/// [`assign()`](SymbolTable::assign): the unlabeled cluster sets stay
/// untouched, and the table pairs each cluster with its symbol.
#[derive(Clone, Debug, PartialEq)]
pub struct SymbolTable {
    highs: Vec<(ClusterDescription, Symbol)>,
    lows: Vec<(ClusterDescription, Symbol)>,
}

impl SymbolTable {
    /// Label high and low timing classes
    ///
    /// Requires exactly two high clusters and exactly three low
    /// clusters. The high clusters become [`Symbol::HighShort`] and
    /// [`Symbol::HighLong`] by ascending duration; the low clusters
    /// become [`Symbol::LowShort`], [`Symbol::LowLong`], and, only if
    /// it absorbed a single duration, [`Symbol::EndOfTransmission`].
    /// A third low cluster with more than one member stays
    /// [`Symbol::Spurious`] and will fail decoding later.
    pub fn assign(high: &ClusterSet, low: &ClusterSet) -> Result<Self, SymbolError> {
        if high.len() != 2 || low.len() != 3 {
            return Err(SymbolError::UnclassifiedClusters {
                highs: high.len(),
                lows: low.len(),
            });
        }

        let high_symbols = [Symbol::HighShort, Symbol::HighLong];
        let highs = high
            .iter()
            .zip(high_symbols)
            .map(|(c, s)| (*c, s))
            .collect();

        let lows = low
            .iter()
            .enumerate()
            .map(|(n, c)| match n {
                0 => (*c, Symbol::LowShort),
                1 => (*c, Symbol::LowLong),
                _ if c.count() == 1 => (*c, Symbol::EndOfTransmission),
                _ => (*c, Symbol::Spurious),
            })
            .collect();

        Ok(Self { highs, lows })
    }

    /// Symbol for a high-segment duration
    pub fn high_symbol(&self, duration: u32) -> Result<Symbol, SymbolError> {
        Self::lookup(&self.highs, duration)
    }

    /// Symbol for a low-segment duration
    pub fn low_symbol(&self, duration: u32) -> Result<Symbol, SymbolError> {
        Self::lookup(&self.lows, duration)
    }

    /// Translate a burst into its linear symbol sequence
    ///
    /// Each pulse contributes two symbols: one for its high segment,
    /// then one for its low segment. A duration that no timing class
    /// covers fails the whole burst.
    pub fn symbolize(&self, burst: &Burst) -> Result<Vec<Symbol>, SymbolError> {
        let mut symbols = Vec::with_capacity(burst.pulses().len() * 2);
        for pulse in burst.pulses() {
            symbols.push(self.high_symbol(pulse.high)?);
            symbols.push(self.low_symbol(pulse.low)?);
        }
        Ok(symbols)
    }

    fn lookup(labeled: &[(ClusterDescription, Symbol)], duration: u32) -> Result<Symbol, SymbolError> {
        labeled
            .iter()
            .find(|(c, _)| c.contains(duration))
            .map(|(_, s)| *s)
            .ok_or(SymbolError::DurationNotInAnyCluster(duration))
    }
}

/// Render a symbol sequence in trace notation
pub(crate) fn symbols_to_string(symbols: &[Symbol]) -> String {
    symbols.iter().map(ToString::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use crate::burst::Pulse;

    const TOLERANCE: f64 = 0.2;

    fn clusters(durations: &[u32]) -> ClusterSet {
        ClusterSet::guess_and_grow(durations, TOLERANCE).expect("non-empty durations")
    }

    #[test]
    fn test_assignment_labels_all_five() {
        let high = clusters(&[100, 102, 200, 202]);
        let low = clusters(&[100, 102, 200, 202, 1000]);
        assert_eq!(high.len(), 2);
        assert_eq!(low.len(), 3);

        let table = SymbolTable::assign(&high, &low).unwrap();
        assert_eq!(table.high_symbol(101), Ok(Symbol::HighShort));
        assert_eq!(table.high_symbol(201), Ok(Symbol::HighLong));
        assert_eq!(table.low_symbol(100), Ok(Symbol::LowShort));
        assert_eq!(table.low_symbol(202), Ok(Symbol::LowLong));
        assert_eq!(table.low_symbol(1000), Ok(Symbol::EndOfTransmission));
    }

    #[test]
    fn test_assignment_rejects_bad_cardinality() {
        // four high classes: the shape check reports how many of each
        let high = clusters(&[100, 200, 400, 800]);
        let low = clusters(&[100, 200, 1000]);
        assert_eq!(
            SymbolTable::assign(&high, &low),
            Err(SymbolError::UnclassifiedClusters { highs: 4, lows: 3 })
        );

        let high = clusters(&[100, 200]);
        let low = clusters(&[100, 200]);
        assert_eq!(
            SymbolTable::assign(&high, &low),
            Err(SymbolError::UnclassifiedClusters { highs: 2, lows: 2 })
        );
    }

    #[test]
    fn test_third_low_cluster_must_be_singleton() {
        // the end marker appears once per burst; a repeated third
        // class is left spurious rather than trusted as an end marker
        let high = clusters(&[100, 200]);
        let low = clusters(&[100, 200, 1000, 1001]);
        let table = SymbolTable::assign(&high, &low).unwrap();
        assert_eq!(table.low_symbol(1000), Ok(Symbol::Spurious));
    }

    #[test]
    fn test_lookup_miss_is_fatal() {
        let high = clusters(&[100, 200]);
        let low = clusters(&[100, 200, 1000]);
        let table = SymbolTable::assign(&high, &low).unwrap();
        assert_eq!(
            table.high_symbol(5000),
            Err(SymbolError::DurationNotInAnyCluster(5000))
        );
    }

    #[test]
    fn test_symbolize_emits_two_symbols_per_pulse() {
        let high = clusters(&[100, 200]);
        let low = clusters(&[100, 200, 1000]);
        let table = SymbolTable::assign(&high, &low).unwrap();

        let burst = Burst::new(
            Duration::from_millis(1),
            vec![
                Pulse {
                    high: 100,
                    low: 200,
                    frequency_offset: 0,
                },
                Pulse {
                    high: 200,
                    low: 1000,
                    frequency_offset: -12,
                },
            ],
        )
        .unwrap();

        let symbols = table.symbolize(&burst).unwrap();
        assert_eq!(
            symbols,
            vec![
                Symbol::HighShort,
                Symbol::LowLong,
                Symbol::HighLong,
                Symbol::EndOfTransmission,
            ]
        );
        assert_eq!(symbols_to_string(&symbols), "-__--.");
    }

    #[test]
    fn test_symbol_display() {
        assert_eq!(Symbol::HighShort.to_string(), "-");
        assert_eq!(Symbol::LowLong.to_string(), "__");
        assert_eq!(Symbol::EndOfTransmission.to_string(), ".");
        assert_eq!(Symbol::Spurious.to_string(), "?");
    }
}
