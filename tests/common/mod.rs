//! Fixtures shared by the integration tests.
#![allow(dead_code)]

use menu_platform::config::Settings;
use menu_platform::model::{CartLine, NewRestaurant, PlaceOrderRequest};
use serde_json::{json, Value};

pub const PLATFORM_KEY: &str = "platform-test-key";
pub const ADMIN_PASSWORD: &str = "correct-horse";

/// Soup 6.50, salad 8.00, steak 24.00. Labels in English and French.
pub fn menu_json() -> Value {
    json!({
        "categories": [{
            "id": "food",
            "label": { "en": "Food", "fr": "Plats" },
            "sections": [
                {
                    "id": "starters",
                    "label": { "en": "Starters", "fr": "Entrées" },
                    "items": [
                        { "id": "soup", "label": { "en": "Soup", "fr": "Soupe" }, "price_cents": 650 },
                        { "id": "salad", "label": { "en": "Salad" }, "price_cents": 800 }
                    ]
                },
                {
                    "id": "mains",
                    "label": { "en": "Mains", "fr": "Plats principaux" },
                    "items": [
                        { "id": "steak", "label": { "en": "Steak" }, "price_cents": 2400 }
                    ]
                }
            ]
        }]
    })
}

pub fn restaurant_json(slug: &str) -> Value {
    json!({
        "slug": slug,
        "info": {
            "name": "Chez Test",
            "languages": ["en", "fr"],
            "default_language": "en",
            "currency": "EUR"
        },
        "menu": menu_json(),
        "ordering_enabled": true,
        "admin_password": ADMIN_PASSWORD
    })
}

pub fn new_restaurant(slug: &str) -> NewRestaurant {
    serde_json::from_value(restaurant_json(slug)).unwrap()
}

pub fn cart(lines: &[(&str, u32)]) -> PlaceOrderRequest {
    PlaceOrderRequest {
        lines: lines
            .iter()
            .map(|(item_id, quantity)| CartLine {
                item_id: item_id.to_string(),
                quantity: *quantity,
            })
            .collect(),
        ..Default::default()
    }
}

/// In-memory settings with registration enabled.
pub fn memory_settings() -> Settings {
    let mut settings = Settings::default();
    settings.admin.platform_key = Some(PLATFORM_KEY.into());
    settings
}
