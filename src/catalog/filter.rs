// src/catalog/filter.rs
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound for text-input debounce; keeps perceived latency at or below
/// the fastest poll tick.
pub const MAX_DEBOUNCE: Duration = Duration::from_millis(1000);

/// Current catalog query. Empty string means "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub supplier: String,
}

fn assign(slot: &mut String, value: &str) -> bool {
    let v = value.trim();
    if slot == v {
        return false;
    }
    *slot = v.to_string();
    true
}

impl FilterState {
    pub fn new(q: &str, brand: &str, supplier: &str) -> Self {
        let mut f = Self::default();
        f.set_query(q);
        f.set_brand(brand);
        f.set_supplier(supplier);
        f
    }

    /// Returns true when the value actually changed.
    pub fn set_query(&mut self, q: &str) -> bool {
        assign(&mut self.q, q)
    }

    pub fn set_brand(&mut self, brand: &str) -> bool {
        assign(&mut self.brand, brand)
    }

    pub fn set_supplier(&mut self, supplier: &str) -> bool {
        assign(&mut self.supplier, supplier)
    }

    /// Replaces all three fields; true if any of them changed.
    pub fn replace(&mut self, other: &FilterState) -> bool {
        let a = self.set_query(&other.q);
        let b = self.set_brand(&other.brand);
        let c = self.set_supplier(&other.supplier);
        a | b | c
    }

    pub fn is_empty(&self) -> bool {
        self.q.is_empty() && self.brand.is_empty() && self.supplier.is_empty()
    }
}

/// Clamp a configured debounce window to `min(MAX_DEBOUNCE, poll_interval)`.
pub fn clamp_debounce(window: Duration, poll_interval: Duration) -> Duration {
    window.min(MAX_DEBOUNCE).min(poll_interval)
}

/// Keystroke debouncer: each `push` supersedes the previous one; only a value
/// that survives a full quiet window is returned.
#[derive(Debug)]
pub struct QueryDebouncer {
    window: Duration,
    seq: std::sync::atomic::AtomicU64,
}

impl QueryDebouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window: window.min(MAX_DEBOUNCE),
            seq: std::sync::atomic::AtomicU64::new(0),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Waits out the window and yields `text` only if no newer push arrived.
    pub async fn push(&self, text: String) -> Option<String> {
        use std::sync::atomic::Ordering;
        let mine = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.window.is_zero() {
            tokio::time::sleep(self.window).await;
        }
        (self.seq.load(Ordering::SeqCst) == mine).then_some(text)
    }
}
