//! Bounded wait loops for tasks that poll an external resource.
//!
//! The orchestrator imposes no deadline of its own; a task that waits for a
//! resource to reach a state tracks its own wall-clock budget here.

use std::{
    thread,
    time::{Duration, Instant},
};

use tracing::debug;

use super::TaskError;

/// Calls `check` every `interval` until it yields a value or `timeout` elapses.
///
/// `check` returns `Ok(Some(value))` when the awaited condition holds,
/// `Ok(None)` to keep waiting, and `Err` to abort immediately. Once the
/// deadline passes a [`TaskError::Timeout`] naming `what` is returned.
///
/// The built-in tasks are all local and never wait; this is for registered
/// tasks that wait on a remote resource.
///
/// ```rust
/// use std::time::Duration;
/// use opsblade_engine::poll_until;
///
/// let mut checks = 0;
/// let state = poll_until("instance running", Duration::from_secs(5), Duration::from_millis(1), || {
///     checks += 1;
///     Ok((checks == 3).then_some("running"))
/// })?;
/// assert_eq!(state, "running");
/// assert_eq!(checks, 3);
/// # Ok::<(), opsblade_engine::TaskError>(())
/// ```
pub fn poll_until<T, F>(what: &str, timeout: Duration, interval: Duration, mut check: F) -> Result<T, TaskError>
where
    F: FnMut() -> Result<Option<T>, TaskError>,
{
    let started = Instant::now();
    let mut attempts = 0_u32;
    loop {
        attempts += 1;
        if let Some(value) = check()? {
            debug!(what, attempts, "poll condition satisfied");
            return Ok(value);
        }
        let waited = started.elapsed();
        if waited >= timeout {
            return Err(TaskError::Timeout {
                what: what.to_string(),
                waited,
            });
        }
        thread::sleep(interval.min(timeout - waited));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_once_the_check_succeeds() {
        let mut calls = 0;
        let value = poll_until("counter", Duration::from_secs(5), Duration::from_millis(1), || {
            calls += 1;
            Ok((calls == 3).then_some(calls))
        })
        .expect("poll");
        assert_eq!(value, 3);
    }

    #[test]
    fn times_out_after_the_deadline() {
        let error = poll_until::<(), _>("instance to stop", Duration::from_millis(20), Duration::from_millis(5), || Ok(None))
            .expect_err("timeout");
        assert!(matches!(error, TaskError::Timeout { ref what, waited } if what == "instance to stop" && waited >= Duration::from_millis(20)));
    }

    #[test]
    fn check_errors_abort_immediately() {
        let error = poll_until::<(), _>("anything", Duration::from_secs(5), Duration::from_millis(1), || {
            Err(TaskError::configuration("bad state"))
        })
        .expect_err("check error");
        assert_eq!(error.to_string(), "bad state");
    }
}
