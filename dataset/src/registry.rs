use std::collections::HashMap;

/// Ordered set of speaker names; a speaker's index is its class label.
///
/// Names are appended the first time they are seen and never removed, so
/// indices are assigned in first-seen order and stay stable.
#[derive(Debug, Clone, Default)]
pub struct SpeakerRegistry {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl SpeakerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the index of `name`, registering it if it is new.
    pub fn intern(&mut self, name: &str) -> usize {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.names.len();
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), idx);
        idx
    }

    /// Returns the index of `name` without registering it.
    pub fn get(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Returns the name registered at `idx`.
    pub fn name(&self, idx: usize) -> Option<&str> {
        self.names.get(idx).map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_seen_order() {
        let mut reg = SpeakerRegistry::new();
        assert_eq!(reg.intern("erik"), 0);
        assert_eq!(reg.intern("caitlyn"), 1);
        assert_eq!(reg.intern("erik"), 0);
        assert_eq!(reg.intern("dana"), 2);
        assert_eq!(reg.names(), &["erik", "caitlyn", "dana"]);
        assert_eq!(reg.len(), 3);
    }

    #[test]
    fn lookup_does_not_register() {
        let mut reg = SpeakerRegistry::new();
        assert_eq!(reg.get("erik"), None);
        assert!(reg.is_empty());
        reg.intern("erik");
        assert_eq!(reg.get("erik"), Some(0));
        assert_eq!(reg.name(0), Some("erik"));
        assert_eq!(reg.name(1), None);
    }
}
