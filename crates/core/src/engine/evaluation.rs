//! The sync-or-pending evaluation primitive.
//!
//! Every evaluate/resolve entry point returns an [`Evaluation`]: an immediate
//! value or a deferred computation scheduled on a cooperative, single-threaded
//! executor. Callers treat both uniformly through [`Evaluation::settle`]; an
//! immediate value is trivially already settled.

use futures::future::{join_all, FutureExt, LocalBoxFuture};
use std::future::Future;

pub enum Evaluation<'a, T> {
    Ready(T),
    Deferred(LocalBoxFuture<'a, T>),
}

impl<'a, T: 'a> Evaluation<'a, T> {
    pub fn ready(value: T) -> Self {
        Evaluation::Ready(value)
    }

    pub fn deferred<F>(future: F) -> Self
    where
        F: Future<Output = T> + 'a,
    {
        Evaluation::Deferred(future.boxed_local())
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Evaluation::Ready(_))
    }

    /// Awaits the value; immediate for the `Ready` variant.
    pub async fn settle(self) -> T {
        match self {
            Evaluation::Ready(value) => value,
            Evaluation::Deferred(future) => future.await,
        }
    }

    pub fn map<U, F>(self, f: F) -> Evaluation<'a, U>
    where
        U: 'a,
        F: FnOnce(T) -> U + 'a,
    {
        match self {
            Evaluation::Ready(value) => Evaluation::Ready(f(value)),
            Evaluation::Deferred(future) => Evaluation::Deferred(future.map(f).boxed_local()),
        }
    }
}

/// Combines per-child evaluations into one, preserving input order in the
/// output sequence.
///
/// Ready when every input is ready; the first error in input order wins.
/// Otherwise the whole evaluation defers: all pending inputs are driven
/// together (fire all, then await all), each settled result landing in its
/// own slot.
pub fn join_evaluations<'a, T: 'a, E: 'a>(
    evaluations: Vec<Evaluation<'a, Result<T, E>>>,
) -> Evaluation<'a, Result<Vec<T>, E>> {
    if evaluations.iter().all(Evaluation::is_ready) {
        let mut results = Vec::with_capacity(evaluations.len());
        for evaluation in evaluations {
            match evaluation {
                Evaluation::Ready(Ok(value)) => results.push(value),
                Evaluation::Ready(Err(err)) => return Evaluation::Ready(Err(err)),
                Evaluation::Deferred(_) => {}
            }
        }
        return Evaluation::Ready(Ok(results));
    }
    Evaluation::deferred(async move {
        let settled = join_all(evaluations.into_iter().map(|evaluation| evaluation.settle())).await;
        settled.into_iter().collect()
    })
}
