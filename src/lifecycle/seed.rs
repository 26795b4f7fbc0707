//! Startup seeding from a JSON file.
//!
//! The file holds an array of restaurant registrations (the `POST /api/restaurants` body).
//! Restaurants that already exist are left alone, so seeding is safe on every start.

use crate::clients::RestaurantClient;
use crate::model::{NewRestaurant, Slug};
use crate::restaurant_actor::RestaurantError;
use resource_actor::ActorClient;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid seed file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Restaurant {slug}: {source}")]
    Restaurant {
        slug: String,
        source: RestaurantError,
    },
}

/// Creates every restaurant of the seed file that does not exist yet. Returns how many were
/// created.
pub async fn seed_restaurants(
    restaurants: &RestaurantClient,
    path: &Path,
) -> Result<usize, SeedError> {
    let raw = tokio::fs::read(path).await.map_err(|source| SeedError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let entries: Vec<NewRestaurant> = serde_json::from_slice(&raw)?;

    let mut created = 0;
    for entry in entries {
        let slug = entry.slug.clone();
        let fail = |source| SeedError::Restaurant {
            slug: slug.clone(),
            source,
        };

        let parsed = Slug::parse(&slug).map_err(|e| fail(RestaurantError::ValidationError(e)))?;
        if restaurants.get(parsed).await.map_err(fail)?.is_some() {
            debug!(%slug, "Seed restaurant already present");
            continue;
        }
        match restaurants.create_restaurant(entry).await {
            Ok(_) => created += 1,
            Err(RestaurantError::AlreadyExists(_)) => {}
            Err(e) => return Err(fail(e)),
        }
    }
    info!(created, file = %path.display(), "Seeded restaurants");
    Ok(created)
}
