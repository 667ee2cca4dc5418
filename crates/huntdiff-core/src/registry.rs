use serde::{Deserialize, Serialize};

use crate::model::Hunt;

/// Ordered collection of hunts.
///
/// Registry order is insertion order and is significant: label reassignment
/// always picks the first containing hunt in this order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HuntRegistry {
    hunts: Vec<Hunt>,
}

impl HuntRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, hunt_id: &str) -> bool {
        self.position(hunt_id).is_some()
    }

    #[must_use]
    pub fn position(&self, hunt_id: &str) -> Option<usize> {
        self.hunts.iter().position(|h| h.id == hunt_id)
    }

    #[must_use]
    pub fn get(&self, hunt_id: &str) -> Option<&Hunt> {
        self.hunts.iter().find(|h| h.id == hunt_id)
    }

    pub fn get_mut(&mut self, hunt_id: &str) -> Option<&mut Hunt> {
        self.hunts.iter_mut().find(|h| h.id == hunt_id)
    }

    /// Display name for a hunt id, if registered.
    #[must_use]
    pub fn name_of(&self, hunt_id: &str) -> Option<&str> {
        self.get(hunt_id).map(|h| h.name.as_str())
    }

    pub fn push(&mut self, hunt: Hunt) {
        self.hunts.push(hunt);
    }

    /// Remove a hunt, preserving the order of the rest.
    pub fn remove(&mut self, hunt_id: &str) -> Option<Hunt> {
        let index = self.position(hunt_id)?;
        Some(self.hunts.remove(index))
    }

    /// Hunt ids in registry order.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.hunts.iter().map(|h| h.id.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Hunt> {
        self.hunts.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Hunt> {
        self.hunts.iter_mut()
    }

    pub fn clear(&mut self) {
        self.hunts.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.hunts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hunts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn registry(ids: &[&str]) -> HuntRegistry {
        let mut reg = HuntRegistry::new();
        for id in ids {
            reg.push(Hunt::new(*id, format!("hunt {id}"), Utc::now()));
        }
        reg
    }

    #[test]
    fn remove_preserves_order() {
        let mut reg = registry(&["a", "b", "c"]);
        let removed = reg.remove("b").unwrap();
        assert_eq!(removed.id, "b");
        assert_eq!(reg.ids(), vec!["a", "c"]);
        assert!(reg.remove("b").is_none());
    }

    #[test]
    fn lookup_by_id() {
        let mut reg = registry(&["a", "b"]);
        assert_eq!(reg.position("b"), Some(1));
        assert_eq!(reg.name_of("a"), Some("hunt a"));
        assert!(!reg.contains("z"));
        reg.get_mut("a").unwrap().name = "renamed".to_string();
        assert_eq!(reg.name_of("a"), Some("renamed"));
    }
}
