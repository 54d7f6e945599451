//! Retrying decorator for flaky stores

use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::JobsafeResult;

use super::KeyValueStore;

/// How often and how patiently to retry transient store failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts per operation, including the first
    pub attempts: u32,
    /// Delay before retry `n` is `n * backoff_ms`
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff_ms: 50,
        }
    }
}

impl RetryPolicy {
    /// Run `op`, retrying transient failures
    pub fn run<T>(&self, what: &str, mut op: impl FnMut() -> JobsafeResult<T>) -> JobsafeResult<T> {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < attempts => {
                    warn!(operation = what, attempt, error = %e, "store operation failed, retrying");
                    thread::sleep(Duration::from_millis(self.backoff_ms * u64::from(attempt)));
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Wraps a store and retries its I/O failures
#[derive(Debug)]
pub struct RetryingStore<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: KeyValueStore> RetryingStore<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: KeyValueStore> KeyValueStore for RetryingStore<S> {
    fn get(&self, key: &str) -> JobsafeResult<Option<Vec<u8>>> {
        self.policy.run("get", || self.inner.get(key))
    }

    fn set(&self, key: &str, value: &[u8]) -> JobsafeResult<()> {
        self.policy.run("set", || self.inner.set(key, value))
    }

    fn remove(&self, key: &str) -> JobsafeResult<()> {
        self.policy.run("remove", || self.inner.remove(key))
    }

    fn keys(&self) -> JobsafeResult<Vec<String>> {
        self.policy.run("keys", || self.inner.keys())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JobsafeError;
    use crate::storage::MemoryStore;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures` writes with the given error
    struct Flaky {
        inner: MemoryStore,
        failures: AtomicU32,
        transient: bool,
        calls: AtomicU32,
    }

    impl Flaky {
        fn new(failures: u32, transient: bool) -> Self {
            Self {
                inner: MemoryStore::new(),
                failures: AtomicU32::new(failures),
                transient,
                calls: AtomicU32::new(0),
            }
        }
    }

    impl KeyValueStore for Flaky {
        fn get(&self, key: &str) -> JobsafeResult<Option<Vec<u8>>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &[u8]) -> JobsafeResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failures.load(Ordering::SeqCst) > 0 {
                self.failures.fetch_sub(1, Ordering::SeqCst);
                return Err(if self.transient {
                    JobsafeError::Io("disk busy".into())
                } else {
                    JobsafeError::Storage("bad key".into())
                });
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> JobsafeResult<()> {
            self.inner.remove(key)
        }

        fn keys(&self) -> JobsafeResult<Vec<String>> {
            self.inner.keys()
        }
    }

    fn fast(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            attempts,
            backoff_ms: 0,
        }
    }

    #[test]
    fn test_recovers_from_transient_failures() {
        let store = RetryingStore::new(Flaky::new(2, true), fast(3));
        store.set("k", b"v").unwrap();
        assert_eq!(store.get("k").unwrap(), Some(b"v".to_vec()));
        assert_eq!(store.inner().calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_gives_up_after_attempts() {
        let store = RetryingStore::new(Flaky::new(5, true), fast(2));
        assert!(matches!(store.set("k", b"v"), Err(JobsafeError::Io(_))));
        assert_eq!(store.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_does_not_retry_permanent_errors() {
        let store = RetryingStore::new(Flaky::new(1, false), fast(3));
        assert!(store.set("k", b"v").is_err());
        assert_eq!(store.inner().calls.load(Ordering::SeqCst), 1);
    }
}
