//! The pluggable transform contract
//!
//! Two transform styles share one contract: *selection-style* modifiers
//! implement [`SampleSelector`] and get their slices concatenated by a
//! blanket [`SampleModifier`] impl; *resynthesis-style* modifiers (the WSOLA
//! stretcher, pattern reversal) implement [`SampleModifier`] directly and
//! produce an already-assembled buffer of independent length.

use crate::batch::SampleSelection;
use crate::stretch::StretchError;
use thiserror::Error;

/// Errors raised while transforming a batch.
///
/// These are internal invariant violations, not user input errors; user
/// input is validated when the modifier is constructed.
#[derive(Error, Debug)]
pub enum ModifyError {
    #[error(transparent)]
    Stretch(#[from] StretchError),
    #[error("selection [{low}, {high}) exceeds batch length {len}")]
    SelectionOutOfBounds { low: usize, high: usize, len: usize },
}

/// A transformation applied independently to each channel of each batch.
///
/// Implementations must be safe to invoke from multiple worker threads at
/// once: any per-call decision is keyed by the explicit `batch_index`, never
/// by an internally incremented cursor.
pub trait SampleModifier: Send + Sync {
    /// Human-readable description of this modifier and its options
    fn describe(&self) -> String;

    /// Length of the analysis window this modifier wants, in milliseconds.
    ///
    /// The framer derives the batch size in frames from this and the
    /// stream's sample rate.
    fn requested_time_ms(&self) -> i64;

    /// Transform one channel of one batch, identified by its stream position
    fn modify(&self, samples: &[i16], batch_index: u64) -> Result<Vec<i16>, ModifyError>;
}

impl std::fmt::Debug for dyn SampleModifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Selection-style modifiers: decide which ranges of a batch to keep, in
/// what order. Slicing and concatenation is handled by the blanket
/// [`SampleModifier`] impl.
pub trait SampleSelector: Send + Sync {
    /// Human-readable description of this selector and its options
    fn describe(&self) -> String;

    /// Length of the analysis window this selector wants, in milliseconds
    fn requested_time_ms(&self) -> i64;

    /// Ordered ranges of `[0, batch_len)` to keep for this batch
    fn select(&self, batch_len: usize, batch_index: u64) -> Vec<SampleSelection>;
}

impl<T: SampleSelector> SampleModifier for T {
    fn describe(&self) -> String {
        SampleSelector::describe(self)
    }

    fn requested_time_ms(&self) -> i64 {
        SampleSelector::requested_time_ms(self)
    }

    fn modify(&self, samples: &[i16], batch_index: u64) -> Result<Vec<i16>, ModifyError> {
        extract_selection(samples, &self.select(samples.len(), batch_index))
    }
}

/// Concatenate the selected ranges of `samples` in order
pub fn extract_selection(
    samples: &[i16],
    selections: &[SampleSelection],
) -> Result<Vec<i16>, ModifyError> {
    let total: usize = selections.iter().map(SampleSelection::len).sum();
    let mut out = Vec::with_capacity(total);
    for sel in selections {
        if sel.high() > samples.len() {
            return Err(ModifyError::SelectionOutOfBounds {
                low: sel.low(),
                high: sel.high(),
                len: samples.len(),
            });
        }
        out.extend_from_slice(&samples[sel.low()..sel.high()]);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_concatenates_in_order() {
        let samples = [10i16, 11, 12, 13, 14, 15];
        let selections = [
            SampleSelection::new(4, 6),
            SampleSelection::new(0, 2),
            SampleSelection::new(2, 3),
        ];
        let out = extract_selection(&samples, &selections).unwrap();
        assert_eq!(out, vec![14, 15, 10, 11, 12]);
    }

    #[test]
    fn test_extract_empty_selection_list_drops_everything() {
        let out = extract_selection(&[1i16, 2, 3], &[]).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_extract_rejects_out_of_bounds() {
        let err = extract_selection(&[1i16, 2], &[SampleSelection::new(0, 3)]).unwrap_err();
        assert!(matches!(
            err,
            ModifyError::SelectionOutOfBounds { high: 3, len: 2, .. }
        ));
    }

    struct KeepAll;

    impl SampleSelector for KeepAll {
        fn describe(&self) -> String {
            "KeepAll".into()
        }

        fn requested_time_ms(&self) -> i64 {
            100
        }

        fn select(&self, batch_len: usize, _batch_index: u64) -> Vec<SampleSelection> {
            vec![SampleSelection::new(0, batch_len)]
        }
    }

    #[test]
    fn test_selector_gets_modifier_impl_for_free() {
        let modifier: Box<dyn SampleModifier> = Box::new(KeepAll);
        let out = modifier.modify(&[5, 6, 7], 0).unwrap();
        assert_eq!(out, vec![5, 6, 7]);
        assert_eq!(modifier.requested_time_ms(), 100);
    }
}
