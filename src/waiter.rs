// Copyright 2018 Dmitry Tantsur <divius.inside@gmail.com>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Waiting for asynchronous operations to finish.
//!
//! Most OpenStack resources are created, updated and deleted asynchronously:
//! the API returns immediately and the resource moves through a series of
//! statuses afterwards. The primitives here turn this into a blocking call
//! with a bounded timeout.
//!
//! Every wait polls immediately, then sleeps for the polling interval between
//! subsequent polls. A sleep never extends past the deadline, and once the
//! deadline is reached the wait fails without issuing another poll.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//!
//! use tempest::waiter::{wait_for_status, StatusRequest, WaitPolicy};
//!
//! let mut statuses = vec!["available", "creating"];
//! let request = StatusRequest::new("volume", "4b2f1d3a", "available")
//!     .with_policy(WaitPolicy::new(Duration::from_millis(1), Duration::from_secs(5)));
//! let status = wait_for_status(request, || Ok(statuses.pop().unwrap().to_string()))
//!     .expect("Volume did not become available");
//! assert_eq!(status, "available");
//! ```

use std::cmp;
use std::fmt::{self, Debug};
use std::thread;
use std::time::{Duration, Instant};

use super::common::Resource;
use super::error::WaitContext;
use super::{Error, ErrorKind, Result};

/// Source of time for waiting loops.
pub trait Clock {
    /// Time elapsed since the clock was started.
    fn elapsed(&self) -> Duration;

    /// Block for the given duration.
    fn sleep(&mut self, duration: Duration);
}

/// Wall clock started at construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    started: Instant,
}

/// Simulated clock: sleeping only advances the counter.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    elapsed: Duration,
    sleeps: Vec<Duration>,
}

/// Polling interval and timeout of a wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Delay between two consecutive polls.
    pub interval: Duration,
    /// Maximum time to wait.
    pub timeout: Duration,
}

/// Something that can be waited for.
///
/// Only `poll` does the actual work, the rest of the trait describes the
/// polling schedule and how a timeout is reported.
pub trait Waiter<T> {
    /// Default timeout for this operation.
    fn default_wait_timeout(&self) -> Duration;

    /// Default delay between two retries.
    fn default_delay(&self) -> Duration;

    /// Error to return on timeout.
    fn timeout_error(&self, elapsed: Duration) -> Error;

    /// Check the current state.
    ///
    /// Returns `Some` when the operation has finished, `None` to continue
    /// polling. Errors abort the wait and are returned as they are.
    fn poll(&mut self) -> Result<Option<T>>;

    /// Wait for the default amount of time.
    fn wait(self) -> Result<T>
    where
        Self: Sized,
    {
        let timeout = self.default_wait_timeout();
        self.wait_for(timeout)
    }

    /// Wait for the given amount of time.
    fn wait_for(self, timeout: Duration) -> Result<T>
    where
        Self: Sized,
    {
        self.wait_for_with_clock(timeout, &mut SystemClock::new())
    }

    /// Wait for the default amount of time using the provided clock.
    fn wait_with_clock<C: Clock>(self, clock: &mut C) -> Result<T>
    where
        Self: Sized,
    {
        let timeout = self.default_wait_timeout();
        self.wait_for_with_clock(timeout, clock)
    }

    /// Wait for the given amount of time using the provided clock.
    fn wait_for_with_clock<C: Clock>(mut self, timeout: Duration, clock: &mut C) -> Result<T>
    where
        Self: Sized,
    {
        let delay = self.default_delay();
        loop {
            if let Some(result) = self.poll()? {
                return Ok(result);
            }

            if let Some(elapsed) = sleep_before_next_poll(clock, delay, timeout) {
                return Err(self.timeout_error(elapsed));
            }
        }
    }
}

/// What a status wait is waiting for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRequest {
    resource_type: String,
    resource_id: String,
    target: String,
    failure_statuses: Vec<String>,
    policy: WaitPolicy,
}

/// Wait for a resource to reach a status.
///
/// Created from a `StatusRequest` and a closure returning the current status.
pub struct StatusWaiter<F> {
    request: StatusRequest,
    fetch: F,
    last_status: Option<String>,
}

/// Wait for resource deletion.
#[derive(Debug)]
pub struct DeletionWaiter<T> {
    inner: T,
    policy: WaitPolicy,
    failure_statuses: Vec<String>,
    last_status: Option<String>,
}

/// Sleep until the next poll; returns the elapsed time if the deadline is reached.
fn sleep_before_next_poll<C: Clock>(
    clock: &mut C,
    delay: Duration,
    timeout: Duration,
) -> Option<Duration> {
    let elapsed = clock.elapsed();
    if elapsed >= timeout {
        return Some(elapsed);
    }

    clock.sleep(cmp::min(delay, timeout - elapsed));

    let elapsed = clock.elapsed();
    if elapsed >= timeout {
        Some(elapsed)
    } else {
        None
    }
}

impl SystemClock {
    /// Start a new clock.
    pub fn new() -> SystemClock {
        SystemClock {
            started: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> SystemClock {
        SystemClock::new()
    }
}

impl Clock for SystemClock {
    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    fn sleep(&mut self, duration: Duration) {
        thread::sleep(duration)
    }
}

impl ManualClock {
    /// Create a clock at zero.
    pub fn new() -> ManualClock {
        ManualClock::default()
    }

    /// Move the clock forward without recording a sleep.
    ///
    /// Useful for simulating slow operations.
    pub fn advance(&mut self, duration: Duration) {
        self.elapsed += duration;
    }

    /// All sleeps requested so far.
    pub fn sleeps(&self) -> &[Duration] {
        &self.sleeps
    }
}

impl Clock for ManualClock {
    fn elapsed(&self) -> Duration {
        self.elapsed
    }

    fn sleep(&mut self, duration: Duration) {
        self.sleeps.push(duration);
        self.elapsed += duration;
    }
}

impl WaitPolicy {
    /// Default interval between polls.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

    /// Default timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

    /// Create a policy with the given interval and timeout.
    pub fn new(interval: Duration, timeout: Duration) -> WaitPolicy {
        WaitPolicy { interval, timeout }
    }
}

impl Default for WaitPolicy {
    fn default() -> WaitPolicy {
        WaitPolicy::new(WaitPolicy::DEFAULT_INTERVAL, WaitPolicy::DEFAULT_TIMEOUT)
    }
}

impl StatusRequest {
    /// Request waiting for `resource_id` of `resource_type` to reach `target`.
    ///
    /// The failure statuses default to `error`.
    pub fn new<T, I, S>(resource_type: T, resource_id: I, target: S) -> StatusRequest
    where
        T: Into<String>,
        I: Into<String>,
        S: Into<String>,
    {
        StatusRequest {
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
            target: target.into(),
            failure_statuses: vec!["error".to_string()],
            policy: WaitPolicy::default(),
        }
    }

    /// Replace the statuses that fail the wait immediately.
    pub fn with_failure_statuses<I, S>(mut self, statuses: I) -> StatusRequest
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.failure_statuses = statuses.into_iter().map(Into::into).collect();
        self
    }

    /// Use the given polling interval and timeout.
    pub fn with_policy(mut self, policy: WaitPolicy) -> StatusRequest {
        self.policy = policy;
        self
    }

    /// Type of the resource.
    #[inline]
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Identifier of the resource.
    #[inline]
    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    /// Status to wait for.
    #[inline]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Statuses that fail the wait.
    #[inline]
    pub fn failure_statuses(&self) -> &[String] {
        &self.failure_statuses
    }

    /// Polling interval and timeout.
    #[inline]
    pub fn policy(&self) -> WaitPolicy {
        self.policy
    }

    fn is_failure(&self, status: &str) -> bool {
        self.failure_statuses.iter().any(|s| s == status)
    }
}

impl<F> StatusWaiter<F>
where
    F: FnMut() -> Result<String>,
{
    /// Create a waiter from a request and a status fetcher.
    pub fn new(request: StatusRequest, fetch: F) -> StatusWaiter<F> {
        StatusWaiter {
            request,
            fetch,
            last_status: None,
        }
    }

    /// Override the polling interval and timeout.
    pub fn with_policy(mut self, policy: WaitPolicy) -> StatusWaiter<F> {
        self.request.policy = policy;
        self
    }

    /// The request this waiter serves.
    #[inline]
    pub fn request(&self) -> &StatusRequest {
        &self.request
    }

    /// Last status seen (if any).
    #[inline]
    pub fn last_status(&self) -> Option<&str> {
        self.last_status.as_deref()
    }
}

impl<F> Debug for StatusWaiter<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusWaiter")
            .field("request", &self.request)
            .field("last_status", &self.last_status)
            .finish()
    }
}

impl<F> Waiter<String> for StatusWaiter<F>
where
    F: FnMut() -> Result<String>,
{
    fn default_wait_timeout(&self) -> Duration {
        self.request.policy.timeout
    }

    fn default_delay(&self) -> Duration {
        self.request.policy.interval
    }

    fn timeout_error(&self, elapsed: Duration) -> Error {
        Error::timed_out(WaitContext {
            resource_type: self.request.resource_type.clone(),
            resource_id: self.request.resource_id.clone(),
            target: Some(self.request.target.clone()),
            last_status: self.last_status.clone(),
            elapsed: Some(elapsed),
        })
    }

    fn poll(&mut self) -> Result<Option<String>> {
        let status = (self.fetch)()?;
        if let Some(ref old) = self.last_status {
            if *old != status {
                info!(
                    "{} {} changed status from {} to {}",
                    self.request.resource_type, self.request.resource_id, old, status
                );
            }
        }
        self.last_status = Some(status.clone());

        if status == self.request.target {
            debug!(
                "{} {} reached status {}",
                self.request.resource_type, self.request.resource_id, status
            );
            Ok(Some(status))
        } else if self.request.is_failure(&status) {
            debug!(
                "Failed to move {} {} to {} - status is {}",
                self.request.resource_type,
                self.request.resource_id,
                self.request.target,
                status
            );
            Err(Error::operation_failed(WaitContext {
                resource_type: self.request.resource_type.clone(),
                resource_id: self.request.resource_id.clone(),
                target: Some(self.request.target.clone()),
                last_status: Some(status),
                elapsed: None,
            }))
        } else {
            trace!(
                "Still waiting for {} {} to get to status {}, current is {}",
                self.request.resource_type,
                self.request.resource_id,
                self.request.target,
                status
            );
            Ok(None)
        }
    }
}

impl<T> DeletionWaiter<T> {
    pub(crate) fn new(inner: T, policy: WaitPolicy) -> DeletionWaiter<T> {
        DeletionWaiter {
            inner,
            policy,
            failure_statuses: Vec::new(),
            last_status: None,
        }
    }

    /// Fail immediately if the resource reports one of these statuses.
    pub fn with_failure_statuses<I, S>(mut self, statuses: I) -> DeletionWaiter<T>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.failure_statuses = statuses.into_iter().map(Into::into).collect();
        self
    }

    /// Current state of the resource being deleted.
    #[inline]
    pub fn current_state(&self) -> &T {
        &self.inner
    }
}

impl<T: Resource + Debug> Waiter<()> for DeletionWaiter<T> {
    fn default_wait_timeout(&self) -> Duration {
        self.policy.timeout
    }

    fn default_delay(&self) -> Duration {
        self.policy.interval
    }

    fn timeout_error(&self, elapsed: Duration) -> Error {
        Error::timed_out(WaitContext {
            resource_type: self.inner.resource_type().to_string(),
            resource_id: self.inner.resource_id().to_string(),
            target: None,
            last_status: self.last_status.clone(),
            elapsed: Some(elapsed),
        })
    }

    fn poll(&mut self) -> Result<Option<()>> {
        match self.inner.refresh() {
            Ok(()) => {
                self.last_status = self.inner.current_status().map(String::from);
                if let Some(ref status) = self.last_status {
                    if self.failure_statuses.iter().any(|s| s == status) {
                        debug!(
                            "Failed to delete {} {} - status is {}",
                            self.inner.resource_type(),
                            self.inner.resource_id(),
                            status
                        );
                        return Err(Error::operation_failed(WaitContext {
                            resource_type: self.inner.resource_type().to_string(),
                            resource_id: self.inner.resource_id().to_string(),
                            target: None,
                            last_status: Some(status.clone()),
                            elapsed: None,
                        }));
                    }
                }
                trace!("Still waiting for resource {:?} to be deleted", self.inner);
                Ok(None)
            }
            Err(ref e) if e.kind() == ErrorKind::ResourceNotFound => {
                debug!(
                    "{} {} was deleted",
                    self.inner.resource_type(),
                    self.inner.resource_id()
                );
                Ok(Some(()))
            }
            Err(e) => {
                debug!("Failed to delete resource {:?} - {}", self.inner, e);
                Err(e)
            }
        }
    }
}

/// Wait for a resource to reach the requested status.
///
/// `fetch` is called immediately and then every `interval` until it returns
/// the target status (which is returned), one of the failure statuses
/// (`OperationFailed`) or the timeout expires (`OperationTimedOut`). Errors
/// from `fetch` are returned unchanged.
pub fn wait_for_status<F>(request: StatusRequest, fetch: F) -> Result<String>
where
    F: FnMut() -> Result<String>,
{
    StatusWaiter::new(request, fetch).wait()
}

/// Wait for a resource handle to reach the requested status.
///
/// The handle is refreshed on every poll, so after a successful wait it holds
/// the final representation of the resource.
pub fn resource_waiter<'r, R>(
    resource: &'r mut R,
    target: &str,
    failure_statuses: &[&str],
    policy: WaitPolicy,
) -> StatusWaiter<impl FnMut() -> Result<String> + 'r>
where
    R: Resource,
{
    let request = StatusRequest::new(resource.resource_type(), resource.resource_id(), target)
        .with_failure_statuses(failure_statuses.iter().copied())
        .with_policy(policy);
    StatusWaiter::new(request, move || {
        resource.refresh()?;
        resource.current_status().map(String::from).ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidResponse,
                format!(
                    "{} {} does not report a status",
                    resource.resource_type(),
                    resource.resource_id()
                ),
            )
        })
    })
}

/// Call `predicate` until it returns `true` or the timeout expires.
///
/// Returns whether the predicate succeeded.
pub fn call_until_true<F>(policy: WaitPolicy, predicate: F) -> bool
where
    F: FnMut() -> bool,
{
    call_until_true_with_clock(policy, &mut SystemClock::new(), predicate)
}

/// Same as `call_until_true`, but with an explicit clock.
pub fn call_until_true_with_clock<F, C>(policy: WaitPolicy, clock: &mut C, mut predicate: F) -> bool
where
    F: FnMut() -> bool,
    C: Clock,
{
    loop {
        if predicate() {
            return true;
        }

        if let Some(elapsed) = sleep_before_next_poll(clock, policy.interval, policy.timeout) {
            debug!("Condition was not met in {:?}", elapsed);
            return false;
        }
    }
}

#[cfg(test)]
pub mod test {
    #![allow(missing_docs)]

    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::time::Duration;

    use super::super::common::{Refresh, Resource};
    use super::super::{Error, ErrorKind, Result};
    use super::*;

    fn fetcher(
        statuses: &[&str],
    ) -> (RefCell<VecDeque<String>>, RefCell<usize>) {
        (
            RefCell::new(statuses.iter().map(|s| s.to_string()).collect()),
            RefCell::new(0),
        )
    }

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    fn request(target: &str, interval: Duration, timeout: Duration) -> StatusRequest {
        StatusRequest::new("volume", "vol-1", target)
            .with_policy(WaitPolicy::new(interval, timeout))
    }

    #[test]
    fn test_reaches_target_after_polling() {
        let (queue, calls) = fetcher(&["creating", "creating", "available"]);
        let mut clock = ManualClock::new();
        let result = StatusWaiter::new(request("available", secs(1), secs(10)), || {
            *calls.borrow_mut() += 1;
            Ok(queue.borrow_mut().pop_front().expect("no more statuses"))
        })
        .wait_with_clock(&mut clock)
        .unwrap();

        assert_eq!(result, "available");
        assert_eq!(*calls.borrow(), 3);
        assert_eq!(clock.elapsed(), secs(2));
    }

    #[test]
    fn test_already_at_target_does_not_sleep() {
        let mut calls = 0;
        let mut clock = ManualClock::new();
        let result = StatusWaiter::new(request("available", secs(1), secs(10)), || {
            calls += 1;
            Ok("available".to_string())
        })
        .wait_with_clock(&mut clock)
        .unwrap();

        assert_eq!(result, "available");
        assert_eq!(calls, 1);
        assert!(clock.sleeps().is_empty());
    }

    #[test]
    fn test_idempotent_when_ready() {
        for _ in 0..2 {
            let mut clock = ManualClock::new();
            let result = StatusWaiter::new(request("in-use", secs(1), secs(10)), || {
                Ok("in-use".to_string())
            })
            .wait_with_clock(&mut clock)
            .unwrap();
            assert_eq!(result, "in-use");
            assert!(clock.sleeps().is_empty());
        }
    }

    #[test]
    fn test_error_status_fails_fast() {
        let (queue, calls) = fetcher(&["creating", "error", "available"]);
        let mut clock = ManualClock::new();
        let err = StatusWaiter::new(request("available", secs(1), secs(10)), || {
            *calls.borrow_mut() += 1;
            Ok(queue.borrow_mut().pop_front().expect("no more statuses"))
        })
        .wait_with_clock(&mut clock)
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::OperationFailed);
        let ctx = err.wait_context().unwrap();
        assert_eq!(ctx.resource_id, "vol-1");
        assert_eq!(ctx.last_status.as_deref(), Some("error"));
        assert_eq!(*calls.borrow(), 2);
        assert_eq!(queue.borrow().len(), 1);
    }

    #[test]
    fn test_custom_failure_statuses() {
        let mut clock = ManualClock::new();
        let req = StatusRequest::new("server", "srv-1", "ACTIVE")
            .with_failure_statuses(vec!["ERROR", "SHELVED"]);
        let err = StatusWaiter::new(req, || Ok("SHELVED".to_string()))
            .wait_with_clock(&mut clock)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OperationFailed);
        assert_eq!(err.wait_context().unwrap().resource_type, "server");
    }

    #[test]
    fn test_comparison_is_case_sensitive() {
        let mut calls = 0;
        let mut clock = ManualClock::new();
        let err = StatusWaiter::new(request("active", secs(1), secs(3)), || {
            calls += 1;
            Ok("ACTIVE".to_string())
        })
        .wait_with_clock(&mut clock)
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OperationTimedOut);
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_timeout_on_sleep_boundary() {
        let mut calls = 0;
        let mut clock = ManualClock::new();
        let err = StatusWaiter::new(
            StatusRequest::new("server", "srv-1", "ACTIVE")
                .with_policy(WaitPolicy::new(secs(1), Duration::from_millis(500))),
            || {
                calls += 1;
                Ok("BUILD".to_string())
            },
        )
        .wait_with_clock(&mut clock)
        .unwrap_err();

        assert_eq!(calls, 1);
        assert_eq!(clock.sleeps(), &[Duration::from_millis(500)]);
        assert_eq!(err.kind(), ErrorKind::OperationTimedOut);
        let ctx = err.wait_context().unwrap();
        assert_eq!(ctx.resource_id, "srv-1");
        assert_eq!(ctx.target.as_deref(), Some("ACTIVE"));
        assert_eq!(ctx.last_status.as_deref(), Some("BUILD"));
        assert_eq!(ctx.elapsed, Some(Duration::from_millis(500)));
    }

    #[test]
    fn test_timeout_reports_last_status() {
        let (queue, _) = fetcher(&["creating", "creating", "downloading", "downloading"]);
        let mut clock = ManualClock::new();
        let err = StatusWaiter::new(request("available", secs(1), secs(3)), || {
            Ok(queue.borrow_mut().pop_front().expect("no more statuses"))
        })
        .wait_with_clock(&mut clock)
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OperationTimedOut);
        assert_eq!(
            err.wait_context().unwrap().last_status.as_deref(),
            Some("downloading")
        );
        assert_eq!(clock.elapsed(), secs(3));
    }

    #[test]
    fn test_slow_fetch_counts_towards_timeout() {
        let clock = RefCell::new(ManualClock::new());
        let mut calls = 0;
        let mut waiter = StatusWaiter::new(request("available", secs(1), secs(5)), || {
            calls += 1;
            clock.borrow_mut().advance(secs(3));
            Ok("creating".to_string())
        });
        // The fetcher moves the clock itself, so drive the loop by hand.
        assert!(waiter.poll().unwrap().is_none());
        assert!(sleep_before_next_poll(&mut *clock.borrow_mut(), secs(1), secs(5)).is_none());
        assert!(waiter.poll().unwrap().is_none());
        let elapsed = sleep_before_next_poll(&mut *clock.borrow_mut(), secs(1), secs(5));
        assert_eq!(elapsed, Some(secs(7)));
        drop(waiter);
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_fetch_errors_propagate() {
        let mut calls = 0;
        let mut clock = ManualClock::new();
        let err = StatusWaiter::new(request("available", secs(1), secs(10)), || {
            calls += 1;
            Err(Error::new(ErrorKind::ProtocolError, "connection refused"))
        })
        .wait_with_clock(&mut clock)
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProtocolError);
        assert!(err.wait_context().is_none());
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_wait_for_status_real_clock() {
        let (queue, _) = fetcher(&["creating", "available"]);
        let result = wait_for_status(
            request("available", Duration::from_millis(1), secs(5)),
            || Ok(queue.borrow_mut().pop_front().expect("no more statuses")),
        )
        .unwrap();
        assert_eq!(result, "available");
    }

    #[test]
    fn test_call_until_true() {
        let mut clock = ManualClock::new();
        let mut calls = 0;
        assert!(call_until_true_with_clock(
            WaitPolicy::new(secs(1), secs(10)),
            &mut clock,
            || {
                calls += 1;
                calls == 4
            }
        ));
        assert_eq!(clock.elapsed(), secs(3));

        let mut clock = ManualClock::new();
        assert!(!call_until_true_with_clock(
            WaitPolicy::new(secs(2), secs(5)),
            &mut clock,
            || false
        ));
        assert_eq!(clock.sleeps(), &[secs(2), secs(2), secs(1)]);
    }

    #[derive(Debug)]
    struct FakeResource {
        states: VecDeque<Option<&'static str>>,
        status: Option<&'static str>,
    }

    impl Refresh for FakeResource {
        fn refresh(&mut self) -> Result<()> {
            match self.states.pop_front().expect("no more states") {
                Some(status) => {
                    self.status = Some(status);
                    Ok(())
                }
                None => Err(Error::new(ErrorKind::ResourceNotFound, "gone")),
            }
        }
    }

    impl Resource for FakeResource {
        fn resource_type(&self) -> &'static str {
            "server"
        }

        fn resource_id(&self) -> &str {
            "srv-1"
        }

        fn current_status(&self) -> Option<&str> {
            self.status
        }
    }

    fn fake(states: Vec<Option<&'static str>>) -> FakeResource {
        FakeResource {
            states: states.into(),
            status: None,
        }
    }

    #[test]
    fn test_deletion_waiter() {
        let mut clock = ManualClock::new();
        let waiter = DeletionWaiter::new(
            fake(vec![Some("ACTIVE"), Some("DELETING"), None]),
            WaitPolicy::new(secs(1), secs(10)),
        );
        waiter.wait_with_clock(&mut clock).unwrap();
        assert_eq!(clock.elapsed(), secs(2));
    }

    #[test]
    fn test_deletion_waiter_failure_status() {
        let mut clock = ManualClock::new();
        let err = DeletionWaiter::new(
            fake(vec![Some("DELETING"), Some("ERROR"), None]),
            WaitPolicy::new(secs(1), secs(10)),
        )
        .with_failure_statuses(vec!["ERROR"])
        .wait_with_clock(&mut clock)
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OperationFailed);
        assert_eq!(err.wait_context().unwrap().resource_id, "srv-1");
    }

    #[test]
    fn test_resource_waiter() {
        let mut clock = ManualClock::new();
        let mut resource = fake(vec![Some("BUILD"), Some("BUILD"), Some("ACTIVE")]);
        let status = resource_waiter(
            &mut resource,
            "ACTIVE",
            &["ERROR"],
            WaitPolicy::new(secs(1), secs(10)),
        )
        .wait_with_clock(&mut clock)
        .unwrap();
        assert_eq!(status, "ACTIVE");
        assert_eq!(resource.current_status(), Some("ACTIVE"));
        assert!(resource.states.is_empty());
        assert_eq!(clock.elapsed(), secs(2));
    }

    #[test]
    fn test_resource_waiter_failure() {
        let mut clock = ManualClock::new();
        let mut resource = fake(vec![Some("BUILD"), Some("ERROR"), Some("ACTIVE")]);
        let err = resource_waiter(
            &mut resource,
            "ACTIVE",
            &["ERROR"],
            WaitPolicy::new(secs(1), secs(10)),
        )
        .wait_with_clock(&mut clock)
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OperationFailed);
        let ctx = err.wait_context().unwrap();
        assert_eq!(ctx.resource_type, "server");
        assert_eq!(ctx.resource_id, "srv-1");
        assert_eq!(resource.states.len(), 1);
    }

    #[test]
    fn test_deletion_waiter_timeout() {
        let mut clock = ManualClock::new();
        let err = DeletionWaiter::new(
            fake(vec![Some("DELETING"); 3]),
            WaitPolicy::new(secs(1), secs(2)),
        )
        .wait_with_clock(&mut clock)
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OperationTimedOut);
        let ctx = err.wait_context().unwrap();
        assert_eq!(ctx.target, None);
        assert_eq!(ctx.last_status.as_deref(), Some("DELETING"));
    }
}
