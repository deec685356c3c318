/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use flume::RecvTimeoutError;
use log::{debug, warn};

use crate::{ReadTimeoutConfig, ReadTimeoutError, ReadTimeoutResult};

/// Runs blocking operations on a shared inner value, each bounded by the
/// same relative timeout.
///
/// A timed out operation is not cancelled. Its worker thread keeps the inner
/// value locked until the operation returns, and the result is dropped.
pub(crate) struct TimeoutWorker<S> {
    inner: Arc<Mutex<S>>,
    timeout: Duration,
    thread_name: String,
    alive: Arc<AtomicUsize>,
}

struct AliveGuard(Arc<AtomicUsize>);

impl AliveGuard {
    fn new(alive: &Arc<AtomicUsize>) -> Self {
        alive.fetch_add(1, Ordering::AcqRel);
        AliveGuard(Arc::clone(alive))
    }
}

impl Drop for AliveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

fn lock<S>(inner: &Mutex<S>) -> MutexGuard<'_, S> {
    // panics are caught before the guard is dropped, so this is not expected
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

fn panic_message(p: Box<dyn Any + Send>) -> String {
    if let Some(s) = p.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Ok(s) = p.downcast::<String>() {
        *s
    } else {
        "unknown panic payload".to_string()
    }
}

impl<S: Send + 'static> TimeoutWorker<S> {
    pub(crate) fn new(inner: S, config: &ReadTimeoutConfig) -> Self {
        TimeoutWorker {
            inner: Arc::new(Mutex::new(inner)),
            timeout: config.timeout(),
            thread_name: config.thread_name().to_string(),
            alive: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn timeout(&self) -> Duration {
        self.timeout
    }

    pub(crate) fn pending_workers(&self) -> usize {
        self.alive.load(Ordering::Acquire)
    }

    pub(crate) fn into_inner(self) -> Result<S, Self> {
        match Arc::try_unwrap(self.inner) {
            Ok(m) => Ok(m.into_inner().unwrap_or_else(PoisonError::into_inner)),
            Err(inner) => Err(TimeoutWorker {
                inner,
                timeout: self.timeout,
                thread_name: self.thread_name,
                alive: self.alive,
            }),
        }
    }

    pub(crate) fn run<T, F>(&self, op: F) -> ReadTimeoutResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut S) -> T + Send + 'static,
    {
        if self.timeout.is_zero() {
            // no deadline, run on the caller thread
            let mut guard = lock(&self.inner);
            return panic::catch_unwind(AssertUnwindSafe(|| op(&mut *guard))).map_err(|p| {
                let msg = panic_message(p);
                warn!("read operation panicked: {msg}");
                ReadTimeoutError::WorkerPanicked(msg)
            });
        }

        let deadline = Instant::now() + self.timeout;
        // capacity 1, so the worker never blocks on send even if nobody listens
        let (sender, receiver) = flume::bounded(1);
        let inner = Arc::clone(&self.inner);
        let alive = AliveGuard::new(&self.alive);

        let spawned = std::thread::Builder::new()
            .name(self.thread_name.clone())
            .spawn(move || {
                let _alive = alive;
                let r = {
                    let mut guard = lock(&inner);
                    panic::catch_unwind(AssertUnwindSafe(|| op(&mut *guard)))
                };
                // release the shared reader before we are counted as done
                drop(inner);
                let r = r.map_err(|p| {
                    let msg = panic_message(p);
                    warn!("read worker panicked: {msg}");
                    msg
                });
                if sender.send(r).is_err() {
                    debug!("read worker finished after its caller gave up, result dropped");
                }
            });
        if let Err(e) = spawned {
            warn!("failed to spawn read worker: {e}");
            return Err(ReadTimeoutError::SpawnFailed(e));
        }

        match receiver.recv_deadline(deadline) {
            Ok(Ok(v)) => Ok(v),
            Ok(Err(msg)) => Err(ReadTimeoutError::WorkerPanicked(msg)),
            Err(RecvTimeoutError::Timeout) => Err(ReadTimeoutError::Timeout),
            Err(RecvTimeoutError::Disconnected) => Err(ReadTimeoutError::WorkerPanicked(
                "worker exited without result".to_string(),
            )),
        }
    }
}
