//! Restaurant (tenant) records.
//!
//! A restaurant is addressed by its [`Slug`] and carries everything the customer surface
//! renders: info, theme, menu and the current promotion. Field validation lives here; the
//! actor only decides *when* to validate.

use super::i18n::{normalize_language_tag, LocalizedText};
use super::menu::Menu;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// URL-safe restaurant identifier: 3 to 48 characters of `[a-z0-9-]`, no leading, trailing
/// or doubled hyphen.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let valid_chars = raw
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if !(3..=48).contains(&raw.len())
            || !valid_chars
            || raw.starts_with('-')
            || raw.ends_with('-')
            || raw.contains("--")
        {
            return Err(format!(
                "invalid slug {raw:?}: use 3-48 lowercase letters, digits or single hyphens"
            ));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Slug {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Slug::parse(&value)
    }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self {
        slug.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Branding of the customer pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub primary_color: String,
    pub accent_color: String,
    pub background_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub dark_mode: bool,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_color: "#1f2937".into(),
            accent_color: "#f59e0b".into(),
            background_color: "#ffffff".into(),
            font_family: None,
            logo_url: None,
            dark_mode: false,
        }
    }
}

impl Theme {
    pub fn validate(&self) -> Result<(), String> {
        for (field, value) in [
            ("primary_color", &self.primary_color),
            ("accent_color", &self.accent_color),
            ("background_color", &self.background_color),
        ] {
            if !is_hex_color(value) {
                return Err(format!("{field} must look like #rrggbb, got {value:?}"));
            }
        }
        if let Some(font) = &self.font_family {
            if font.trim().is_empty() || font.len() > 64 {
                return Err("font_family must be 1-64 characters".into());
            }
        }
        Ok(())
    }
}

fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Contact and locale information shown on the landing page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantInfo {
    pub name: String,
    #[serde(default)]
    pub description: LocalizedText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub opening_hours: LocalizedText,
    pub languages: Vec<String>,
    pub default_language: String,
    pub currency: String,
}

impl RestaurantInfo {
    /// Canonicalizes language tags and checks every field.
    pub fn validated(mut self) -> Result<Self, String> {
        let name = self.name.trim();
        if name.is_empty() || name.chars().count() > 120 {
            return Err("name must be 1-120 characters".into());
        }
        self.name = name.to_string();

        if self.languages.is_empty() {
            return Err("at least one language is required".into());
        }
        let mut languages: Vec<String> = Vec::with_capacity(self.languages.len());
        for tag in &self.languages {
            let canonical =
                normalize_language_tag(tag).ok_or_else(|| format!("invalid language {tag:?}"))?;
            if languages.contains(&canonical) {
                return Err(format!("language {canonical} listed twice"));
            }
            languages.push(canonical);
        }
        self.languages = languages;
        self.default_language = normalize_language_tag(&self.default_language)
            .filter(|tag| self.languages.contains(tag))
            .ok_or_else(|| {
                format!(
                    "default_language {:?} must be one of the languages",
                    self.default_language
                )
            })?;

        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(format!(
                "currency must be a 3-letter ISO code, got {:?}",
                self.currency
            ));
        }
        if let Some(email) = &self.email {
            if !email.contains('@') {
                return Err(format!("invalid email {email:?}"));
            }
        }
        self.description = self
            .description
            .normalized()
            .map_err(|tag| format!("invalid language {tag:?} in description"))?;
        self.opening_hours = self
            .opening_hours
            .normalized()
            .map_err(|tag| format!("invalid language {tag:?} in opening_hours"))?;
        Ok(self)
    }

    /// Language to serve when the request names none (or one the restaurant lacks).
    pub fn pick_language(&self, requested: Option<&str>) -> String {
        requested
            .and_then(normalize_language_tag)
            .filter(|tag| self.languages.contains(tag))
            .unwrap_or_else(|| self.default_language.clone())
    }
}

/// A time-boxed announcement shown above the menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Promotion {
    pub title: LocalizedText,
    #[serde(default)]
    pub body: LocalizedText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
}

impl Promotion {
    pub fn validate(&self) -> Result<(), String> {
        if self.title.is_blank() {
            return Err("promotion title must not be empty".into());
        }
        if let (Some(start), Some(end)) = (self.starts_at, self.ends_at) {
            if start >= end {
                return Err("promotion must start before it ends".into());
            }
        }
        Ok(())
    }

    /// Inside `[starts_at, ends_at)`, open ends unbounded.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.starts_at.is_none_or(|start| start <= now) && self.ends_at.is_none_or(|end| now < end)
    }
}

/// The stored tenant record. Never serialized to clients directly: use
/// [`Restaurant::admin_view`] or [`Restaurant::public_view`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    pub slug: Slug,
    pub info: RestaurantInfo,
    pub theme: Theme,
    pub menu: Menu,
    #[serde(default)]
    pub promotion: Option<Promotion>,
    pub ordering_enabled: bool,
    pub admin_password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Restaurant {
    pub fn public_view(&self, now: DateTime<Utc>) -> PublicRestaurant {
        PublicRestaurant {
            slug: self.slug.clone(),
            info: self.info.clone(),
            theme: self.theme.clone(),
            promotion: self
                .promotion
                .clone()
                .filter(|promo| promo.is_active_at(now)),
            ordering_enabled: self.ordering_enabled,
        }
    }

    pub fn admin_view(&self) -> RestaurantView {
        RestaurantView {
            slug: self.slug.clone(),
            info: self.info.clone(),
            theme: self.theme.clone(),
            menu: self.menu.clone(),
            promotion: self.promotion.clone(),
            ordering_enabled: self.ordering_enabled,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// What customers see.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicRestaurant {
    pub slug: Slug,
    pub info: RestaurantInfo,
    pub theme: Theme,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promotion: Option<Promotion>,
    pub ordering_enabled: bool,
}

/// What the owner sees: the whole record minus the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantView {
    pub slug: Slug,
    pub info: RestaurantInfo,
    pub theme: Theme,
    pub menu: Menu,
    pub promotion: Option<Promotion>,
    pub ordering_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registration payload, as received from the platform operator or a seed file.
#[derive(Clone, Deserialize)]
pub struct NewRestaurant {
    pub slug: String,
    pub info: RestaurantInfo,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub menu: Menu,
    #[serde(default)]
    pub ordering_enabled: bool,
    pub admin_password: String,
}

impl fmt::Debug for NewRestaurant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewRestaurant")
            .field("slug", &self.slug)
            .field("info", &self.info.name)
            .field("items", &self.menu.item_count())
            .field("admin_password", &"<redacted>")
            .finish()
    }
}

/// DTO for restaurant creation. The password arrives already hashed.
#[derive(Clone)]
pub struct RestaurantCreate {
    pub slug: Slug,
    pub info: RestaurantInfo,
    pub theme: Theme,
    pub menu: Menu,
    pub ordering_enabled: bool,
    pub password_hash: String,
}

impl fmt::Debug for RestaurantCreate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestaurantCreate")
            .field("slug", &self.slug)
            .field("info", &self.info.name)
            .field("items", &self.menu.item_count())
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

/// DTO for restaurant updates; absent fields are left alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RestaurantUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<RestaurantInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ordering_enabled: Option<bool>,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Duration;

    pub(crate) fn sample_info() -> RestaurantInfo {
        RestaurantInfo {
            name: "Chez Test".into(),
            description: LocalizedText::single("en", "Bistro"),
            address: Some("1 Main St".into()),
            phone: None,
            email: Some("owner@example.com".into()),
            opening_hours: LocalizedText::single("en", "Tue-Sun 12-22"),
            languages: vec!["en".into(), "fr".into()],
            default_language: "en".into(),
            currency: "EUR".into(),
        }
    }

    #[test]
    fn slug_rules() {
        assert!(Slug::parse("chez-test").is_ok());
        assert!(Slug::parse("a1b").is_ok());
        for bad in ["ab", "Chez", "-abc", "abc-", "a--b", "caf\u{e9}", "a".repeat(49).as_str()] {
            assert!(Slug::parse(bad).is_err(), "{bad} should be rejected");
        }
        assert!(serde_json::from_str::<Slug>("\"NOPE\"").is_err());
    }

    #[test]
    fn info_is_normalized() {
        let mut info = sample_info();
        info.languages = vec!["EN".into(), "pt_br".into()];
        info.default_language = "PT-br".into();
        let info = info.validated().unwrap();
        assert_eq!(info.languages, vec!["en", "pt-BR"]);
        assert_eq!(info.default_language, "pt-BR");
        assert_eq!(info.pick_language(Some("de")), "pt-BR");
        assert_eq!(info.pick_language(Some("EN")), "en");
    }

    #[test]
    fn info_rejects_bad_fields() {
        let mut info = sample_info();
        info.default_language = "de".into();
        assert!(info.validated().is_err());

        let mut info = sample_info();
        info.currency = "eur".into();
        assert!(info.validated().is_err());

        let mut info = sample_info();
        info.languages = vec!["en".into(), "EN".into()];
        assert!(info.validated().is_err());
    }

    #[test]
    fn theme_colors_are_checked() {
        assert!(Theme::default().validate().is_ok());
        let theme = Theme {
            accent_color: "orange".into(),
            ..Theme::default()
        };
        assert!(theme.validate().is_err());
    }

    #[test]
    fn promotion_window() {
        let now = Utc::now();
        let promo = Promotion {
            title: LocalizedText::single("en", "Happy hour"),
            body: LocalizedText::new(),
            image_url: None,
            starts_at: Some(now - Duration::hours(1)),
            ends_at: Some(now + Duration::hours(1)),
        };
        assert!(promo.validate().is_ok());
        assert!(promo.is_active_at(now));
        assert!(!promo.is_active_at(now + Duration::hours(2)));

        let backwards = Promotion {
            starts_at: promo.ends_at,
            ends_at: promo.starts_at,
            ..promo.clone()
        };
        assert!(backwards.validate().is_err());
    }

    #[test]
    fn secrets_stay_out_of_debug_output() {
        let create = RestaurantCreate {
            slug: Slug::parse("chez-test").unwrap(),
            info: sample_info(),
            theme: Theme::default(),
            menu: Menu::default(),
            ordering_enabled: true,
            password_hash: "$argon2id$secret".into(),
        };
        assert!(!format!("{create:?}").contains("secret"));
    }
}
