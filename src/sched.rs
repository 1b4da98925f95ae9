// SPDX-License-Identifier: MPL-2.0

//! The scheduler collaborator.
//!
//! Section 6 of the design this crate implements treats the scheduler as an
//! external collaborator with exactly four operations: `wait`, `timed_wait`,
//! `signal`, `broadcast`. The process/thread subsystem that would normally
//! provide those primitives (PCB/TCB lifecycle, `Exec`, `WaitChild`,
//! preemption) is out of scope here — but a crate that never blocks on
//! anything isn't testable as the blocking pipe/socket core the rest of this
//! crate implements, so [`CondVar`] is the concrete, `std`-backed
//! implementation of that collaborator contract.
//!
//! Every wait site in this crate re-validates its predicate after waking up,
//! as required by the design: spurious wakeups and racing signals are
//! expected, not bugs.

use std::sync::{Condvar, MutexGuard};
use std::time::{Duration, Instant};

/// A condition variable in the vocabulary the stream I/O core expects from
/// its scheduler: `wait`, `timed_wait`, `signal`, `broadcast`.
#[derive(Default)]
pub(crate) struct CondVar(Condvar);

impl CondVar {
    pub(crate) fn new() -> Self {
        Self(Condvar::new())
    }

    /// Blocks until signalled. The caller is responsible for re-checking its
    /// predicate once this returns — wakeups may be spurious.
    pub(crate) fn wait<'a, T>(&self, guard: MutexGuard<'a, T>) -> MutexGuard<'a, T> {
        self.0
            .wait(guard)
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Blocks until signalled or `timeout` elapses, whichever comes first.
    /// Returns the reacquired guard and whether the wait actually timed out
    /// (as opposed to being woken).
    pub(crate) fn timed_wait<'a, T>(
        &self,
        guard: MutexGuard<'a, T>,
        timeout: Duration,
    ) -> (MutexGuard<'a, T>, bool) {
        match self.0.wait_timeout(guard, timeout) {
            Ok((guard, result)) => (guard, result.timed_out()),
            Err(poisoned) => {
                let (guard, result) = poisoned.into_inner();
                (guard, result.timed_out())
            }
        }
    }

    pub(crate) fn signal(&self) {
        self.0.notify_one();
    }

    pub(crate) fn broadcast(&self) {
        self.0.notify_all();
    }
}

/// Tracks a wall-clock deadline across repeated `timed_wait` calls, the way
/// `connect`'s bounded wait needs to: each wakeup re-checks the predicate and
/// must wait only for whatever time remains, not the full timeout again.
pub(crate) struct Deadline {
    at: Instant,
}

impl Deadline {
    pub(crate) fn after(timeout: Duration) -> Self {
        Self {
            at: Instant::now() + timeout,
        }
    }

    /// Time left before the deadline, or `None` if it has already passed.
    pub(crate) fn remaining(&self) -> Option<Duration> {
        self.at.checked_duration_since(Instant::now())
    }
}
