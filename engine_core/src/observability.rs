//! Sticky record of the last fatal error, for hosts that poll instead of logging.

use std::sync::{Mutex, OnceLock};

use crate::logging;

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn sticky_cell() -> &'static Mutex<Option<StickyError>> {
    static STICKY: OnceLock<Mutex<Option<StickyError>>> = OnceLock::new();
    STICKY.get_or_init(|| Mutex::new(None))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StickyError {
    pub source: String,
    pub message: String,
}

/// Records `message` as the current fatal error and logs it once.
pub fn set_sticky_error(source: &str, message: impl Into<String>) {
    let message = message.into();
    logging::error(source, &message);
    let mut guard = lock_unpoisoned(sticky_cell());
    *guard = Some(StickyError {
        source: source.to_string(),
        message,
    });
}

pub fn clear_sticky_error() {
    let mut guard = lock_unpoisoned(sticky_cell());
    *guard = None;
}

pub fn sticky_error() -> Option<StickyError> {
    let guard = lock_unpoisoned(sticky_cell());
    guard.clone()
}
