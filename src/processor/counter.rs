use std::collections::BTreeMap;

/// Occurrence count per name. Names iterate in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamedCounter {
    counts: BTreeMap<String, usize>,
}

impl NamedCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, name: &str) {
        *self.counts.entry(name.to_string()).or_insert(0) += 1;
    }

    pub fn has(&self, name: &str) -> bool {
        self.counts.contains_key(name)
    }

    pub fn count(&self, name: &str) -> usize {
        self.counts.get(name).copied().unwrap_or(0)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }

    /// Names counted here that `other` has never seen, sorted.
    pub fn missing_from(&self, other: &NamedCounter) -> Vec<String> {
        self.names()
            .filter(|n| !other.has(n))
            .map(String::from)
            .collect()
    }

    pub fn remove(&mut self, name: &str) {
        self.counts.remove(name);
    }

    pub fn clear(&mut self) {
        self.counts.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}
