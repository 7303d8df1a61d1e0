//! Merge reducer for run statistics.
//!
//! Merge is field-wise checked addition over integers (the energy sum is
//! fixed-point), so it is associative and commutative with
//! [`RunStatistics::ZERO`] as identity. Any fold or tree reduction over worker
//! snapshots gives the same result regardless of order or grouping.

use types::{Counter, RunStatistics};

use crate::error::{Result, TallyError};

/// Combine two snapshots.
pub fn merge(a: &RunStatistics, b: &RunStatistics) -> Result<RunStatistics> {
    let mut out = RunStatistics::ZERO;
    for counter in Counter::all() {
        *out.counter_mut(counter) = a
            .counter(counter)
            .checked_add(b.counter(counter))
            .ok_or(TallyError::CounterOverflow { counter })?;
    }
    out.energy = a
        .energy
        .checked_add(b.energy)
        .ok_or(TallyError::EnergyOverflow)?;
    Ok(out)
}

/// Fold any number of snapshots, starting from the identity.
pub fn merge_all<I>(snapshots: I) -> Result<RunStatistics>
where
    I: IntoIterator<Item = RunStatistics>,
{
    snapshots
        .into_iter()
        .try_fold(RunStatistics::ZERO, |acc, s| merge(&acc, &s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{BoundaryStatus, Energy};

    fn sample(seed: u64) -> RunStatistics {
        let mut stats = RunStatistics::ZERO;
        for (i, counter) in Counter::all().enumerate() {
            *stats.counter_mut(counter) = seed * 31 + i as u64 * seed % 7;
        }
        stats.energy = Energy(seed * 1_234_567);
        stats
    }

    #[test]
    fn test_identity() {
        let x = sample(5);
        assert_eq!(merge(&x, &RunStatistics::ZERO).unwrap(), x);
        assert_eq!(merge(&RunStatistics::ZERO, &x).unwrap(), x);
        assert_eq!(merge_all(Vec::<RunStatistics>::new()).unwrap(), RunStatistics::ZERO);
    }

    #[test]
    fn test_associative_and_commutative() {
        let (a, b, c) = (sample(1), sample(2), sample(3));

        let left = merge(&merge(&a, &b).unwrap(), &c).unwrap();
        let right = merge(&a, &merge(&b, &c).unwrap()).unwrap();
        let swapped = merge(&merge(&c, &a).unwrap(), &b).unwrap();
        let folded = merge_all([b, c, a]).unwrap();

        assert_eq!(left, right);
        assert_eq!(left, swapped);
        assert_eq!(left, folded);
    }

    #[test]
    fn test_field_wise_sum() {
        let mut a = RunStatistics::ZERO;
        let mut b = RunStatistics::ZERO;
        a.detected = 2;
        b.detected = 3;
        *a.boundary.get_mut(BoundaryStatus::Absorption) = 1;
        *b.boundary.get_mut(BoundaryStatus::Absorption) = 4;

        let merged = merge(&a, &b).unwrap();
        assert_eq!(merged.detected, 5);
        assert_eq!(merged.boundary.get(BoundaryStatus::Absorption), 5);
    }

    #[test]
    fn test_overflow_names_counter() {
        let mut a = RunStatistics::ZERO;
        a.escaped_exit_face = u64::MAX;
        let mut b = RunStatistics::ZERO;
        b.escaped_exit_face = 1;

        assert_eq!(
            merge(&a, &b),
            Err(TallyError::CounterOverflow {
                counter: Counter::EscapedExitFace
            })
        );
    }
}
