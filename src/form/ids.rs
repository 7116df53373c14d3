//! Identifier allocation

use std::collections::HashMap;

/// Allocates `name_N` identifiers with one counter per name.
///
/// An allocator lives for exactly one synthesis run.
#[derive(Debug, Clone, Default)]
pub struct IdentifierAllocator {
    counters: HashMap<String, u64>,
}

impl IdentifierAllocator {
    /// Create an allocator with every counter at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Next identifier for `name`: `name_0`, `name_1`, ...
    pub fn allocate(&mut self, name: &str) -> String {
        let counter = self.counters.entry(name.to_string()).or_insert(0);
        let id = format!("{}_{}", name, counter);
        *counter += 1;
        id
    }

    /// Use `explicit` when given, else allocate for `name`
    pub fn assign(&mut self, name: &str, explicit: Option<&str>) -> String {
        match explicit {
            Some(id) => id.to_string(),
            None => self.allocate(name),
        }
    }

    /// Number of identifiers allocated so far for `name`
    pub fn count(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_are_per_name() {
        let mut ids = IdentifierAllocator::new();
        assert_eq!(ids.allocate("bind"), "bind_0");
        assert_eq!(ids.allocate("bind"), "bind_1");
        assert_eq!(ids.allocate("input"), "input_0");
        assert_eq!(ids.allocate("bind"), "bind_2");
        assert_eq!(ids.count("bind"), 3);
        assert_eq!(ids.count("group"), 0);
    }

    #[test]
    fn test_explicit_identifier_bypasses_counter() {
        let mut ids = IdentifierAllocator::new();
        assert_eq!(ids.assign("trigger", Some("repeat_0-delete")), "repeat_0-delete");
        assert_eq!(ids.count("trigger"), 0);
        assert_eq!(ids.assign("trigger", None), "trigger_0");
    }
}
