//! Static tag taxonomy: category names mapped to ordered candidate tags.
//!
//! The taxonomy is checked once when it is built and is read-only afterwards.
//! Category order and tag order are significant: predictions list categories
//! in this order, and equal scores fall back to the tag order.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// One category of candidate tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Category name (e.g. "interests")
    pub name: String,
    /// Candidate tag labels, in taxonomy order
    pub tags: Vec<String>,
}

impl Category {
    pub fn new(name: impl Into<String>, tags: &[&str]) -> Self {
        Self {
            name: name.into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// A checked, immutable set of categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagTaxonomy {
    categories: Vec<Category>,
}

const INTERESTS: &[&str] = &[
    "Childcare",
    "Event Support",
    "Community Engagement",
    "Administrative Work",
    "Education",
    "Environmental Work",
    "Healthcare",
    "Animal Welfare",
    "Arts",
    "Digital",
    "Drug Awareness",
    "Eldercare",
    "Families",
    "Health",
    "Heritage",
    "Humanitarian",
    "Mental Health",
    "Migrant Workers",
    "Rehabilitation and Reintegration",
    "Social Services",
    "Special Needs",
    "Sports",
    "Youth",
];

const SKILLS: &[&str] = &[
    "Communication",
    "Teamwork",
    "Empathy",
    "Leadership",
    "Crowd Management",
    "Creativity",
    "Organizing",
    "Outdoor work",
    "Mentoring",
    "Pet Care",
];

impl TagTaxonomy {
    /// Build a taxonomy, rejecting empty or duplicated names and labels.
    pub fn new(categories: Vec<Category>) -> Result<Self, ConfigError> {
        if categories.is_empty() {
            return Err(ConfigError::ValidationError(
                "taxonomy must contain at least one category".into(),
            ));
        }

        let mut names = HashSet::new();
        for category in &categories {
            if category.name.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "taxonomy category names must not be empty".into(),
                ));
            }
            if !names.insert(category.name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate taxonomy category '{}'",
                    category.name
                )));
            }
            if category.tags.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "taxonomy category '{}' has no tags",
                    category.name
                )));
            }

            let mut labels = HashSet::new();
            for tag in &category.tags {
                if tag.trim().is_empty() {
                    return Err(ConfigError::ValidationError(format!(
                        "taxonomy category '{}' contains an empty tag",
                        category.name
                    )));
                }
                if !labels.insert(tag.as_str()) {
                    return Err(ConfigError::ValidationError(format!(
                        "duplicate tag '{}' in taxonomy category '{}'",
                        tag, category.name
                    )));
                }
            }
        }

        Ok(Self { categories })
    }

    /// The built-in volunteer-opportunity taxonomy (interests and skills).
    pub fn volunteer() -> Self {
        Self {
            categories: vec![
                Category::new("interests", INTERESTS),
                Category::new("skills", SKILLS),
            ],
        }
    }

    /// Look up a category by name.
    pub fn get(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// All categories in taxonomy order.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Category names in taxonomy order.
    pub fn category_names(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.name.as_str()).collect()
    }

    /// Total number of tags across all categories.
    pub fn tag_count(&self) -> usize {
        self.categories.iter().map(|c| c.tags.len()).sum()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl Default for TagTaxonomy {
    fn default() -> Self {
        Self::volunteer()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volunteer_taxonomy_shape() {
        let taxonomy = TagTaxonomy::volunteer();
        assert_eq!(taxonomy.category_names(), vec!["interests", "skills"]);
        assert_eq!(taxonomy.get("interests").unwrap().tags.len(), 23);
        assert_eq!(taxonomy.get("skills").unwrap().tags.len(), 10);
        assert_eq!(taxonomy.tag_count(), 33);
    }

    #[test]
    fn test_volunteer_taxonomy_passes_validation() {
        let taxonomy = TagTaxonomy::volunteer();
        let rebuilt = TagTaxonomy::new(taxonomy.categories().to_vec()).unwrap();
        assert_eq!(rebuilt, taxonomy);
    }

    #[test]
    fn test_get_unknown_category() {
        assert!(TagTaxonomy::volunteer().get("hobbies").is_none());
    }

    #[test]
    fn test_rejects_empty_taxonomy() {
        let err = TagTaxonomy::new(vec![]).unwrap_err();
        assert!(err.to_string().contains("at least one category"));
    }

    #[test]
    fn test_rejects_empty_category() {
        let err = TagTaxonomy::new(vec![Category::new("skills", &[])]).unwrap_err();
        assert!(err.to_string().contains("has no tags"));
    }

    #[test]
    fn test_rejects_duplicate_tag() {
        let err =
            TagTaxonomy::new(vec![Category::new("skills", &["Teamwork", "Teamwork"])]).unwrap_err();
        assert!(err.to_string().contains("duplicate tag 'Teamwork'"));
    }

    #[test]
    fn test_same_tag_in_different_categories_is_allowed() {
        let taxonomy = TagTaxonomy::new(vec![
            Category::new("interests", &["Health"]),
            Category::new("skills", &["Health"]),
        ]);
        assert!(taxonomy.is_ok());
    }

    #[test]
    fn test_rejects_duplicate_category() {
        let err = TagTaxonomy::new(vec![
            Category::new("skills", &["A"]),
            Category::new("skills", &["B"]),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("duplicate taxonomy category"));
    }

    #[test]
    fn test_rejects_blank_names() {
        assert!(TagTaxonomy::new(vec![Category::new(" ", &["A"])]).is_err());
        assert!(TagTaxonomy::new(vec![Category::new("skills", &[""])]).is_err());
    }
}
