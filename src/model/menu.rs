//! Menu tree: categories, sections, items.
//!
//! Order matters everywhere (it is the display order), so the tree is made of `Vec`s and
//! lookups walk it. Menus are small enough for that.

use super::i18n::{normalize_language_tag, LocalizedText};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Upper bound on items in one menu.
pub const MAX_MENU_ITEMS: usize = 500;

/// Upper bound on a single price (1,000,000.00 in the restaurant's currency).
pub const MAX_PRICE_CENTS: u64 = 100_000_000;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum MenuError {
    #[error("{0} id must not be empty")]
    EmptyId(&'static str),
    #[error("duplicate category id: {0}")]
    DuplicateCategory(String),
    #[error("duplicate section id: {0}")]
    DuplicateSection(String),
    #[error("duplicate item id: {0}")]
    DuplicateItem(String),
    #[error("{0} has no label in any language")]
    MissingLabel(String),
    #[error("invalid language tag {tag:?} in {id}")]
    InvalidLanguage { id: String, tag: String },
    #[error("menu has {count} items, at most {max} allowed")]
    TooManyItems { count: usize, max: usize },
    #[error("price of {item} is {price_cents}, at most {max} allowed")]
    PriceTooHigh {
        item: String,
        price_cents: u64,
        max: u64,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Menu {
    #[serde(default)]
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub label: LocalizedText,
    #[serde(default)]
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub label: LocalizedText,
    #[serde(default)]
    pub items: Vec<MenuItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: String,
    pub label: LocalizedText,
    #[serde(default)]
    pub description: LocalizedText,
    pub price_cents: u64,
    #[serde(default = "default_available")]
    pub available: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

fn default_available() -> bool {
    true
}

impl Menu {
    /// Checks the structural rules a menu must satisfy before it is stored.
    pub fn validate(&self) -> Result<(), MenuError> {
        let count = self.item_count();
        if count > MAX_MENU_ITEMS {
            return Err(MenuError::TooManyItems {
                count,
                max: MAX_MENU_ITEMS,
            });
        }

        let mut categories = HashSet::new();
        let mut sections = HashSet::new();
        let mut items = HashSet::new();

        for category in &self.categories {
            check_node("category", &category.id, &category.label)?;
            if !categories.insert(category.id.as_str()) {
                return Err(MenuError::DuplicateCategory(category.id.clone()));
            }
            for section in &category.sections {
                check_node("section", &section.id, &section.label)?;
                if !sections.insert(section.id.as_str()) {
                    return Err(MenuError::DuplicateSection(section.id.clone()));
                }
                for item in &section.items {
                    check_node("item", &item.id, &item.label)?;
                    check_languages(&item.id, &item.description)?;
                    if !items.insert(item.id.as_str()) {
                        return Err(MenuError::DuplicateItem(item.id.clone()));
                    }
                    if item.price_cents > MAX_PRICE_CENTS {
                        return Err(MenuError::PriceTooHigh {
                            item: item.id.clone(),
                            price_cents: item.price_cents,
                            max: MAX_PRICE_CENTS,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Every item, in display order.
    pub fn items(&self) -> impl Iterator<Item = &MenuItem> {
        self.categories
            .iter()
            .flat_map(|c| c.sections.iter())
            .flat_map(|s| s.items.iter())
    }

    pub fn item_count(&self) -> usize {
        self.items().count()
    }

    pub fn find_item(&self, item_id: &str) -> Option<&MenuItem> {
        self.items().find(|item| item.id == item_id)
    }

    pub fn find_item_mut(&mut self, item_id: &str) -> Option<&mut MenuItem> {
        self.categories
            .iter_mut()
            .flat_map(|c| c.sections.iter_mut())
            .flat_map(|s| s.items.iter_mut())
            .find(|item| item.id == item_id)
    }

    /// The menu as one language, display order preserved.
    pub fn localize(&self, lang: &str, fallback: &str) -> LocalizedMenu {
        LocalizedMenu {
            lang: lang.to_string(),
            categories: self
                .categories
                .iter()
                .map(|c| LocalizedCategory {
                    id: c.id.clone(),
                    label: c.label.resolve(lang, fallback).to_string(),
                    sections: c
                        .sections
                        .iter()
                        .map(|s| LocalizedSection {
                            id: s.id.clone(),
                            label: s.label.resolve(lang, fallback).to_string(),
                            items: s
                                .items
                                .iter()
                                .map(|i| LocalizedItem {
                                    id: i.id.clone(),
                                    label: i.label.resolve(lang, fallback).to_string(),
                                    description: i.description.resolve(lang, fallback).to_string(),
                                    price_cents: i.price_cents,
                                    available: i.available,
                                    tags: i.tags.clone(),
                                    image_url: i.image_url.clone(),
                                })
                                .collect(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

fn check_node(kind: &'static str, id: &str, label: &LocalizedText) -> Result<(), MenuError> {
    if id.trim().is_empty() {
        return Err(MenuError::EmptyId(kind));
    }
    if label.is_blank() {
        return Err(MenuError::MissingLabel(format!("{kind} {id}")));
    }
    check_languages(id, label)
}

fn check_languages(id: &str, text: &LocalizedText) -> Result<(), MenuError> {
    match text
        .languages()
        .find(|tag| normalize_language_tag(tag).as_deref() != Some(*tag))
    {
        Some(tag) => Err(MenuError::InvalidLanguage {
            id: id.to_string(),
            tag: tag.to_string(),
        }),
        None => Ok(()),
    }
}

/// A menu rendered in one language, as served to customers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalizedMenu {
    pub lang: String,
    pub categories: Vec<LocalizedCategory>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalizedCategory {
    pub id: String,
    pub label: String,
    pub sections: Vec<LocalizedSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalizedSection {
    pub id: String,
    pub label: String,
    pub items: Vec<LocalizedItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalizedItem {
    pub id: String,
    pub label: String,
    pub description: String,
    pub price_cents: u64,
    pub available: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn item(id: &str, price_cents: u64) -> MenuItem {
        MenuItem {
            id: id.to_string(),
            label: LocalizedText::single("en", id.to_uppercase()),
            description: LocalizedText::new(),
            price_cents,
            available: true,
            tags: Vec::new(),
            image_url: None,
        }
    }

    pub(crate) fn sample_menu() -> Menu {
        Menu {
            categories: vec![Category {
                id: "food".into(),
                label: LocalizedText::single("en", "Food").with("fr", "Plats"),
                sections: vec![
                    Section {
                        id: "starters".into(),
                        label: LocalizedText::single("en", "Starters"),
                        items: vec![item("soup", 650), item("salad", 800)],
                    },
                    Section {
                        id: "mains".into(),
                        label: LocalizedText::single("en", "Mains"),
                        items: vec![item("steak", 2400)],
                    },
                ],
            }],
        }
    }

    #[test]
    fn sample_menu_is_valid() {
        let menu = sample_menu();
        assert_eq!(menu.validate(), Ok(()));
        assert_eq!(menu.item_count(), 3);
        assert_eq!(menu.find_item("steak").unwrap().price_cents, 2400);
        assert!(menu.find_item("pie").is_none());
    }

    #[test]
    fn duplicate_items_across_sections_are_rejected() {
        let mut menu = sample_menu();
        menu.categories[0].sections[1].items.push(item("soup", 100));
        assert_eq!(
            menu.validate(),
            Err(MenuError::DuplicateItem("soup".into()))
        );
    }

    #[test]
    fn labels_and_prices_are_checked() {
        let mut menu = sample_menu();
        menu.categories[0].sections[0].label = LocalizedText::single("en", " ");
        assert!(matches!(menu.validate(), Err(MenuError::MissingLabel(_))));

        let mut menu = sample_menu();
        menu.find_item_mut("soup").unwrap().price_cents = MAX_PRICE_CENTS + 1;
        assert!(matches!(menu.validate(), Err(MenuError::PriceTooHigh { .. })));

        let mut menu = sample_menu();
        menu.find_item_mut("soup").unwrap().label = LocalizedText::single("EN", "Soup");
        assert!(matches!(
            menu.validate(),
            Err(MenuError::InvalidLanguage { .. })
        ));
    }

    #[test]
    fn localize_keeps_order_and_falls_back() {
        let localized = sample_menu().localize("fr", "en");
        assert_eq!(localized.categories[0].label, "Plats");
        let sections: Vec<&str> = localized.categories[0]
            .sections
            .iter()
            .map(|s| s.label.as_str())
            .collect();
        assert_eq!(sections, vec!["Starters", "Mains"]);
        assert_eq!(localized.categories[0].sections[0].items[1].label, "SALAD");
    }

    #[test]
    fn items_default_to_available() {
        let json = r#"{"id":"tea","label":{"en":"Tea"},"price_cents":300}"#;
        let parsed: MenuItem = serde_json::from_str(json).unwrap();
        assert!(parsed.available);
        assert!(parsed.description.is_blank());
    }
}
