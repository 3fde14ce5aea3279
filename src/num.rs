//! Utilities related to numbers.

use ieee754;
use num;
use std::{cmp, fmt};

/// Floating point marker trait for easier control over trait bounds.
pub trait BFloat:
    Sync + Send + num::Float + num::cast::FromPrimitive + ieee754::Ieee754 + fmt::Debug
{
}

impl BFloat for f32 {}
impl BFloat for f64 {}

/// Converts the given `f64` constant to the floating point type `F`.
pub fn from_f64<F: BFloat>(value: f64) -> F {
    F::from_f64(value).expect("Conversion failed")
}

/// Integer-float pair that can be ordered based on the float.
pub struct OrderableIndexValuePair<I: num::Integer, F: BFloat>(pub I, pub F);

impl<I: num::Integer, F: BFloat> PartialEq for OrderableIndexValuePair<I, F> {
    fn eq(&self, other: &Self) -> bool {
        self.1 == other.1
    }
}

impl<I: num::Integer, F: BFloat> PartialOrd for OrderableIndexValuePair<I, F> {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<I: num::Integer, F: BFloat> Eq for OrderableIndexValuePair<I, F> {}

impl<I: num::Integer, F: BFloat> Ord for OrderableIndexValuePair<I, F> {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        // NaN compares below every number so a corrupt value never panics a sort
        match (num::Float::is_nan(self.1), num::Float::is_nan(other.1)) {
            (false, false) => self
                .1
                .partial_cmp(&other.1)
                .unwrap_or(cmp::Ordering::Equal),
            (true, false) => cmp::Ordering::Less,
            (false, true) => cmp::Ordering::Greater,
            (true, true) => cmp::Ordering::Equal,
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn index_value_pairs_sort_by_value() {
        let mut pairs = vec![
            OrderableIndexValuePair(0_usize, 0.3),
            OrderableIndexValuePair(1, -2.0),
            OrderableIndexValuePair(2, 7.5),
        ];
        pairs.sort();
        let indices: Vec<_> = pairs.iter().map(|pair| pair.0).collect();
        assert_eq!(indices, vec![1, 0, 2]);
    }

    #[test]
    fn nan_values_sort_below_everything_else() {
        let mut pairs = vec![
            OrderableIndexValuePair(0_usize, 1.0),
            OrderableIndexValuePair(1, f64::NAN),
            OrderableIndexValuePair(2, -1.0),
        ];
        pairs.sort();
        assert_eq!(pairs[0].0, 1);
        assert_eq!(pairs[2].0, 0);
    }
}
