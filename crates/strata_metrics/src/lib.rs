//! Strata Metrics - event counters for the store
//!
//! Counting compiles to nothing unless the `metrics` feature is enabled.
//!
//! # Feature Flags
//!
//! - `metrics` - Enable metrics collection (default: disabled)
//!
//! # Usage
//!
//! ```ignore
//! use strata_metrics::Counter;
//!
//! let mut counter = Counter::new();
//! counter.increment("entities_created", 1);
//! assert_eq!(counter.get("entities_created"), 1);
//! ```

#[cfg(feature = "metrics")]
mod counter;

#[cfg(feature = "metrics")]
pub use counter::Counter;

// ============================================================================
// No-op stub when metrics disabled
// ============================================================================

#[cfg(not(feature = "metrics"))]
#[derive(Debug, Default)]
pub struct Counter;

#[cfg(not(feature = "metrics"))]
impl Counter {
    pub fn new() -> Self { Self }
    #[inline(always)]
    pub fn increment(&mut self, _name: &'static str, _value: usize) {}
    pub fn get(&self, _name: &str) -> usize { 0 }
    pub fn reset_all(&mut self) {}
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, usize)> { std::iter::empty() }
}

#[cfg(test)]
mod tests {
    use super::Counter;

    #[test]
    fn test_counter_api_is_available() {
        let mut counter = Counter::new();
        counter.increment("events", 2);
        counter.increment("events", 3);
        #[cfg(feature = "metrics")]
        assert_eq!(counter.get("events"), 5);
        #[cfg(not(feature = "metrics"))]
        assert_eq!(counter.get("events"), 0);
    }
}
