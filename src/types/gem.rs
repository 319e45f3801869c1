//! Gems: reusable system prompts.

use serde::Serialize;
use serde_json::Value;
use crate::protocol::{get_non_empty_str, get_str};

/// A gem, either predefined by the service or created by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Gem {
    /// Gem id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Description; has no effect on replies.
    pub description: Option<String>,
    /// System prompt.
    pub prompt: Option<String>,
    /// True for gems shipped by the service.
    pub predefined: bool,
}

impl Gem {
    /// Parses a listing entry: `[id, [name, description], [prompt]]`.
    pub(crate) fn from_listing(value: &Value, predefined: bool) -> Option<Self> {
        Some(Self {
            id: get_non_empty_str(value, &[0])?.to_string(),
            name: get_str(value, &[1, 0])?.to_string(),
            description: get_non_empty_str(value, &[1, 1]).map(str::to_string),
            prompt: get_non_empty_str(value, &[2, 0]).map(str::to_string),
            predefined,
        })
    }
}

impl std::fmt::Display for Gem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Gem(id='{}', name='{}', predefined={})",
            self.id, self.name, self.predefined
        )
    }
}

/// A collection of gems keyed by id, in listing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GemJar {
    gems: Vec<Gem>,
}

impl GemJar {
    /// Creates a jar; a later gem with a duplicate id replaces the earlier one.
    pub fn new(gems: impl IntoIterator<Item = Gem>) -> Self {
        let mut jar = Self::default();
        for gem in gems {
            jar.insert(gem);
        }
        jar
    }

    /// Inserts or replaces a gem.
    pub fn insert(&mut self, gem: Gem) {
        match self.gems.iter_mut().find(|g| g.id == gem.id) {
            Some(existing) => *existing = gem,
            None => self.gems.push(gem),
        }
    }

    /// Removes a gem by id.
    pub fn remove(&mut self, id: &str) -> Option<Gem> {
        let index = self.gems.iter().position(|g| g.id == id)?;
        Some(self.gems.remove(index))
    }

    /// Looks a gem up by id and/or name; both must match when both are given.
    ///
    /// Returns `None` when neither is given.
    pub fn get(&self, id: Option<&str>, name: Option<&str>) -> Option<&Gem> {
        match (id, name) {
            (None, None) => None,
            (Some(id), name) => self
                .gems
                .iter()
                .find(|g| g.id == id)
                .filter(|g| name.map_or(true, |n| g.name == n)),
            (None, Some(name)) => self.gems.iter().find(|g| g.name == name),
        }
    }

    /// Returns the gems matching every given filter.
    pub fn filter(&self, predefined: Option<bool>, name: Option<&str>) -> GemJar {
        GemJar {
            gems: self
                .gems
                .iter()
                .filter(|g| predefined.map_or(true, |p| g.predefined == p))
                .filter(|g| name.map_or(true, |n| g.name == n))
                .cloned()
                .collect(),
        }
    }

    /// Iterates over the gems.
    pub fn iter(&self) -> std::slice::Iter<'_, Gem> {
        self.gems.iter()
    }

    /// Number of gems.
    pub fn len(&self) -> usize {
        self.gems.len()
    }

    /// Returns true when the jar holds no gem.
    pub fn is_empty(&self) -> bool {
        self.gems.is_empty()
    }
}

impl<'a> IntoIterator for &'a GemJar {
    type Item = &'a Gem;
    type IntoIter = std::slice::Iter<'a, Gem>;

    fn into_iter(self) -> Self::IntoIter {
        self.gems.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn gem(id: &str, name: &str, predefined: bool) -> Gem {
        Gem {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            prompt: None,
            predefined,
        }
    }

    fn jar() -> GemJar {
        GemJar::new([
            gem("coding-partner", "Coding partner", true),
            gem("brainstormer", "Brainstormer", true),
            gem("abc123", "My gem", false),
        ])
    }

    #[test]
    fn test_from_listing() {
        let value = json!(["abc123", ["My gem", "Helps"], ["Be terse."]]);
        let parsed = Gem::from_listing(&value, false).unwrap();
        assert_eq!(parsed.id, "abc123");
        assert_eq!(parsed.name, "My gem");
        assert_eq!(parsed.description.as_deref(), Some("Helps"));
        assert_eq!(parsed.prompt.as_deref(), Some("Be terse."));
        assert!(!parsed.predefined);
    }

    #[test]
    fn test_from_listing_without_prompt() {
        let value = json!(["coding-partner", ["Coding partner", ""], null]);
        let parsed = Gem::from_listing(&value, true).unwrap();
        assert!(parsed.description.is_none());
        assert!(parsed.prompt.is_none());
    }

    #[test]
    fn test_get_by_id_and_name() {
        let jar = jar();
        assert_eq!(jar.get(Some("abc123"), None).unwrap().name, "My gem");
        assert_eq!(jar.get(None, Some("Brainstormer")).unwrap().id, "brainstormer");
        assert!(jar.get(Some("abc123"), Some("Brainstormer")).is_none());
        assert!(jar.get(Some("abc123"), Some("My gem")).is_some());
        assert!(jar.get(None, None).is_none());
    }

    #[test]
    fn test_filter() {
        let jar = jar();
        assert_eq!(jar.filter(Some(true), None).len(), 2);
        assert_eq!(jar.filter(Some(false), None).len(), 1);
        assert_eq!(jar.filter(None, Some("Brainstormer")).len(), 1);
        assert!(jar.filter(Some(false), Some("Brainstormer")).is_empty());
    }

    #[test]
    fn test_insert_replaces_duplicate_id() {
        let mut jar = jar();
        jar.insert(gem("abc123", "Renamed", false));
        assert_eq!(jar.len(), 3);
        assert_eq!(jar.get(Some("abc123"), None).unwrap().name, "Renamed");
        assert!(jar.remove("abc123").is_some());
        assert_eq!(jar.len(), 2);
    }
}
