//! Named counters for tracking events

use std::collections::HashMap;

#[derive(Debug)]
pub struct Counter {
    counters: HashMap<&'static str, usize>,
}

impl Counter {
    pub fn new() -> Self {
        Self {
            counters: HashMap::new(),
        }
    }

    pub fn increment(&mut self, name: &'static str, value: usize) {
        *self.counters.entry(name).or_insert(0) += value;
    }

    pub fn get(&self, name: &str) -> usize {
        self.counters.get(name).copied().unwrap_or(0)
    }

    pub fn reset_all(&mut self) {
        self.counters.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, usize)> + '_ {
        self.counters.iter().map(|(&name, &value)| (name, value))
    }
}

impl Default for Counter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_and_reset() {
        let mut counter = Counter::new();
        counter.increment("a", 1);
        counter.increment("a", 4);
        counter.increment("b", 2);
        assert_eq!(counter.get("a"), 5);
        assert_eq!(counter.get("missing"), 0);
        assert_eq!(counter.iter().count(), 2);

        counter.reset_all();
        assert_eq!(counter.get("a"), 0);
    }
}
