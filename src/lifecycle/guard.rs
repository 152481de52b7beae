//! One-shot registration guard.
//!
//! Context refresh signals may arrive any number of times and from any thread.
//! The guard makes sure exactly one of them performs the full-context
//! registration.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, Ordering};

/// Registration state of the service instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegistrationState {
    NotRegistered = 0,
    Registered = 1,
}

impl From<u8> for RegistrationState {
    fn from(value: u8) -> Self {
        match value {
            0 => RegistrationState::NotRegistered,
            _ => RegistrationState::Registered,
        }
    }
}

/// `NotRegistered -> Registered`, transitioned at most once
#[derive(Debug)]
pub struct RegistrationGuard {
    state: AtomicU8,
}

impl Default for RegistrationGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistrationGuard {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(RegistrationState::NotRegistered as u8),
        }
    }

    /// Returns true for exactly one caller over the guard's lifetime
    pub fn try_register(&self) -> bool {
        self.state
            .compare_exchange(
                RegistrationState::NotRegistered as u8,
                RegistrationState::Registered as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    pub fn state(&self) -> RegistrationState {
        RegistrationState::from(self.state.load(Ordering::Acquire))
    }

    pub fn is_registered(&self) -> bool {
        self.state() == RegistrationState::Registered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn test_single_transition() {
        let guard = RegistrationGuard::new();
        assert_eq!(guard.state(), RegistrationState::NotRegistered);
        assert!(guard.try_register());
        assert!(!guard.try_register());
        assert!(guard.is_registered());
    }

    #[test]
    fn test_concurrent_callers_single_winner() {
        let guard = Arc::new(RegistrationGuard::new());
        let winners = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let guard = Arc::clone(&guard);
                let winners = Arc::clone(&winners);
                std::thread::spawn(move || {
                    if guard.try_register() {
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(winners.load(Ordering::SeqCst), 1);
    }
}
