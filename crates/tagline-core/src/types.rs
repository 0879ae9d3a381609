//! Core data types produced by the tagger.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Top tags per category, in taxonomy order.
///
/// Serializes as a JSON object keyed by category name, preserving order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Prediction {
    entries: Vec<(String, Vec<String>)>,
}

impl Prediction {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Append a category's tags; category order is insertion order.
    pub fn insert(&mut self, category: String, tags: Vec<String>) {
        self.entries.push((category, tags));
    }

    /// Tags for a category, if present.
    pub fn get(&self, category: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, tags)| tags.as_slice())
    }

    /// Category names in order.
    pub fn categories(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, tags)| (name.as_str(), tags.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for Prediction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (category, tags) in &self.entries {
            map.serialize_entry(category, tags)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_ordered_object() {
        let mut prediction = Prediction::default();
        prediction.insert("skills".into(), vec!["Teamwork".into()]);
        prediction.insert("interests".into(), vec!["Youth".into(), "Sports".into()]);

        let json = serde_json::to_string(&prediction).unwrap();
        assert_eq!(
            json,
            r#"{"skills":["Teamwork"],"interests":["Youth","Sports"]}"#
        );
    }

    #[test]
    fn test_get_and_categories() {
        let mut prediction = Prediction::with_capacity(1);
        prediction.insert("skills".into(), vec!["Empathy".into()]);
        assert_eq!(prediction.get("skills").unwrap(), &["Empathy"]);
        assert!(prediction.get("interests").is_none());
        assert_eq!(prediction.categories(), vec!["skills"]);
        assert_eq!(prediction.len(), 1);
    }
}
