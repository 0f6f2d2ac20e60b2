//! crates/lens_core/src/quota.rs
//!
//! The guest upload counter: a per-calendar-day allowance for users without a
//! session, kept in local storage. It is a hint for the UI only; the backend
//! enforces the real limit and answers HTTP 429 when it is hit.

use crate::ports::{KeyValueStore, PortResult};
use chrono::{Local, NaiveDate};
use std::sync::{Arc, Mutex};

/// Uploads a guest may make per calendar day.
pub const DAILY_GUEST_UPLOADS: u32 = 2;

pub const REMAINING_KEY: &str = "lens.guestUploadsRemaining";
pub const DATE_KEY: &str = "lens.guestUploadsDate";

/// Formats a date the way the counter stores it (`M/D/YYYY`).
pub fn date_key(date: NaiveDate) -> String {
    date.format("%-m/%-d/%Y").to_string()
}

/// The remaining allowance given what storage holds and what day it is.
///
/// A stored date other than `today` means the counter belongs to an earlier
/// day and resets to the full allowance. Missing or garbled counts also reset.
pub fn resolve_remaining(stored_count: Option<&str>, stored_date: Option<&str>, today: &str) -> u32 {
    match (stored_count, stored_date) {
        (Some(count), Some(date)) if date == today => count
            .trim()
            .parse::<u32>()
            .unwrap_or(DAILY_GUEST_UPLOADS),
        _ => DAILY_GUEST_UPLOADS,
    }
}

/// Read-modify-write access to the persisted guest counter.
///
/// All access goes through one lock, so callers sharing a tracker never
/// interleave. Separate processes sharing the same storage are not coordinated.
pub struct GuestQuotaTracker {
    store: Arc<dyn KeyValueStore>,
    lock: Mutex<()>,
}

impl GuestQuotaTracker {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
        }
    }

    fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    pub fn remaining(&self) -> PortResult<u32> {
        self.remaining_on(Self::today())
    }

    pub fn remaining_on(&self, today: NaiveDate) -> PortResult<u32> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        self.read(today)
    }

    /// Uses one upload. Never goes below zero. Returns the new count.
    pub fn consume_one(&self) -> PortResult<u32> {
        self.consume_one_on(Self::today())
    }

    pub fn consume_one_on(&self, today: NaiveDate) -> PortResult<u32> {
        self.update(today, |remaining| remaining.saturating_sub(1))
    }

    /// Forces the counter to zero, e.g. after the backend reported the cap.
    pub fn exhaust(&self) -> PortResult<u32> {
        self.exhaust_on(Self::today())
    }

    pub fn exhaust_on(&self, today: NaiveDate) -> PortResult<u32> {
        self.update(today, |_| 0)
    }

    fn update(&self, today: NaiveDate, f: impl FnOnce(u32) -> u32) -> PortResult<u32> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let next = f(self.read(today)?);
        self.store.set_many(&[
            (REMAINING_KEY, next.to_string().as_str()),
            (DATE_KEY, date_key(today).as_str()),
        ])?;
        Ok(next)
    }

    fn read(&self, today: NaiveDate) -> PortResult<u32> {
        let count = self.store.get(REMAINING_KEY)?;
        let date = self.store.get(DATE_KEY)?;
        Ok(resolve_remaining(
            count.as_deref(),
            date.as_deref(),
            &date_key(today),
        ))
    }
}
