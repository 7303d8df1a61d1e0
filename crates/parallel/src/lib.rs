//! Declarative parallel/sequential execution utilities.
//!
//! This crate provides helpers that abstract over parallel vs sequential execution
//! based on the `parallel` feature flag. The `cfg` logic lives here in ONE place,
//! keeping call sites clean.
//!
//! # Design
//!
//! Each helper takes a closure and applies it over a collection. When `parallel` is
//! enabled, uses rayon's parallel iterators; otherwise uses standard iterators.
//! Returning from a helper is a join point: every closure invocation has finished.
//!
//! # Runtime Override
//!
//! All functions accept a `force_sequential` parameter. When `true`, execution
//! is sequential even if the `parallel` feature is enabled. This allows runtime
//! profiling and reproducing a run on a single thread.
//!
//! # Example
//!
//! ```ignore
//! // Drain every worker's stream, one thread per worker:
//! let finished = parallel::map_vec(workers, |w| w.drain(), false);
//!
//! // Reduce their snapshots with an associative operation:
//! let total = parallel::try_reduce_vec(snapshots, || Stats::ZERO, |a, b| a.merge(&b), false)?;
//! ```

#[cfg(feature = "parallel")]
use rayon::prelude::*;

// =============================================================================
// Vec Operations (owned iteration)
// =============================================================================

/// Map over a Vec, consuming it, potentially in parallel.
///
/// Returns results in input order.
///
/// # Parameters
/// - `force_sequential`: When true, forces sequential execution even if parallel feature is enabled
#[inline]
pub fn map_vec<T, F, R>(vec: Vec<T>, f: F, force_sequential: bool) -> Vec<R>
where
    T: Send,
    F: Fn(T) -> R + Sync + Send,
    R: Send,
{
    #[cfg(feature = "parallel")]
    {
        if force_sequential {
            vec.into_iter().map(f).collect()
        } else {
            vec.into_par_iter().map(f).collect()
        }
    }

    #[cfg(not(feature = "parallel"))]
    {
        let _ = force_sequential;
        vec.into_iter().map(f).collect()
    }
}

// =============================================================================
// Reductions
// =============================================================================

/// Reduce a Vec with a fallible operation, potentially as a parallel tree.
///
/// `op` must be associative and `identity()` its identity element; rayon is
/// free to group and split the input, so a non-associative `op` would give
/// scheduling-dependent results. Stops at the first error.
///
/// # Parameters
/// - `force_sequential`: When true, forces a left fold even if parallel feature is enabled
#[inline]
pub fn try_reduce_vec<T, E, ID, OP>(
    vec: Vec<T>,
    identity: ID,
    op: OP,
    force_sequential: bool,
) -> Result<T, E>
where
    T: Send,
    E: Send,
    ID: Fn() -> T + Sync + Send,
    OP: Fn(T, T) -> Result<T, E> + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        if force_sequential {
            vec.into_iter().try_fold(identity(), op)
        } else {
            vec.into_par_iter().map(Ok).try_reduce(identity, op)
        }
    }

    #[cfg(not(feature = "parallel"))]
    {
        let _ = force_sequential;
        vec.into_iter().try_fold(identity(), op)
    }
}
