// src/core/onboarding/dedup.rs
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Admits at most one in-flight onboarding attempt per target address.
/// The check-and-set runs under one lock acquisition, so two concurrent
/// callers can never both win. Losing callers fail immediately; there is
/// no queue and no retry.
#[derive(Clone)]
pub struct ActiveRequests {
    inner: Arc<Mutex<HashSet<String>>>,
}

impl ActiveRequests {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Returns a guard iff no attempt is currently in flight for
    /// `address`. Dropping the guard releases the address on every exit
    /// path, panic unwinding included.
    pub fn try_acquire(&self, address: &str) -> Option<InFlightGuard> {
        let mut active = self.inner.lock();
        if !active.insert(address.to_string()) {
            return None;
        }
        debug!("Acquired onboarding guard for {}", address);
        Some(InFlightGuard {
            address: address.to_string(),
            active: Arc::clone(&self.inner),
        })
    }

    pub fn is_active(&self, address: &str) -> bool {
        self.inner.lock().contains(address)
    }
}

impl Default for ActiveRequests {
    fn default() -> Self {
        Self::new()
    }
}

pub struct InFlightGuard {
    address: String,
    active: Arc<Mutex<HashSet<String>>>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.active.lock().remove(&self.address);
        debug!("Released onboarding guard for {}", self.address);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_while_held() {
        let active = ActiveRequests::new();
        let guard = active.try_acquire("localhost:9091");
        assert!(guard.is_some());
        assert!(active.try_acquire("localhost:9091").is_none());
    }

    #[test]
    fn distinct_addresses_are_independent() {
        let active = ActiveRequests::new();
        let _a = active.try_acquire("localhost:9091").unwrap();
        assert!(active.try_acquire("localhost:9092").is_some());
    }

    #[test]
    fn drop_releases() {
        let active = ActiveRequests::new();
        drop(active.try_acquire("localhost:9091").unwrap());
        assert!(!active.is_active("localhost:9091"));
        assert!(active.try_acquire("localhost:9091").is_some());
    }

    #[test]
    fn panic_releases() {
        let active = ActiveRequests::new();
        let cloned = active.clone();
        let worker = std::thread::spawn(move || {
            let _guard = cloned.try_acquire("localhost:9091").unwrap();
            panic!("worker died");
        });
        assert!(worker.join().is_err());
        assert!(!active.is_active("localhost:9091"));
    }

    #[test]
    fn concurrent_acquire_has_one_winner() {
        let active = ActiveRequests::new();
        let mut handles = Vec::new();
        for _ in 0..16 {
            let active = active.clone();
            handles.push(std::thread::spawn(move || {
                // Hold any won guard until every thread has tried.
                let guard = active.try_acquire("localhost:9091");
                std::thread::sleep(std::time::Duration::from_millis(50));
                guard.is_some()
            }));
        }

        let winners: usize = handles
            .into_iter()
            .map(|h| h.join().unwrap() as usize)
            .sum();
        assert_eq!(winners, 1);
    }
}
