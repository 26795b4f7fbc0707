//! # Restaurant Client
//!
//! High-level API over the `Restaurant` actor. Password hashing and verification run here,
//! on the blocking pool, so the actor loop never stalls on Argon2.
use crate::auth::{hash_password, verify_password};
use crate::model::{
    CartLine, CartQuote, Menu, NewRestaurant, Promotion, Restaurant, RestaurantCreate,
    RestaurantUpdate, Slug,
};
use crate::restaurant_actor::{RestaurantAction, RestaurantActionResult, RestaurantError};
use async_trait::async_trait;
use resource_actor::{ActorClient, FrameworkError, ResourceClient, ResourceEvent};
use tokio::sync::broadcast;
use tracing::{debug, info, instrument};

/// Client for interacting with the Restaurant actor.
#[derive(Clone)]
pub struct RestaurantClient {
    inner: ResourceClient<Restaurant>,
}

impl RestaurantClient {
    pub fn new(inner: ResourceClient<Restaurant>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ActorClient<Restaurant> for RestaurantClient {
    type Error = RestaurantError;

    fn inner(&self) -> &ResourceClient<Restaurant> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        match e.into_entity_error::<RestaurantError>() {
            Ok(typed) => typed,
            Err(FrameworkError::NotFound(slug)) => RestaurantError::NotFound(slug),
            Err(FrameworkError::AlreadyExists(slug)) => RestaurantError::AlreadyExists(slug),
            Err(FrameworkError::Storage(e)) => RestaurantError::StorageError(e.to_string()),
            Err(other) => RestaurantError::ActorCommunicationError(other.to_string()),
        }
    }
}

impl RestaurantClient {
    /// Registers a new tenant. The slug must be free.
    #[instrument(skip(self, params), fields(slug = %params.slug))]
    pub async fn create_restaurant(&self, params: NewRestaurant) -> Result<Slug, RestaurantError> {
        let slug = Slug::parse(&params.slug).map_err(RestaurantError::ValidationError)?;
        let password_hash = hash_off_loop(params.admin_password).await?;

        debug!("Sending request");
        let slug = self
            .inner
            .create(RestaurantCreate {
                slug,
                info: params.info,
                theme: params.theme,
                menu: params.menu,
                ordering_enabled: params.ordering_enabled,
                password_hash,
            })
            .await
            .map_err(Self::map_error)?;
        info!(%slug, "Restaurant registered");
        Ok(slug)
    }

    /// Fetches a restaurant, turning a missing one into `NotFound`.
    pub async fn fetch(&self, slug: &Slug) -> Result<Restaurant, RestaurantError> {
        self.get(slug.clone())
            .await?
            .ok_or_else(|| RestaurantError::NotFound(slug.to_string()))
    }

    #[instrument(skip(self, update))]
    pub async fn update_restaurant(
        &self,
        slug: Slug,
        update: RestaurantUpdate,
    ) -> Result<Restaurant, RestaurantError> {
        debug!("Sending request");
        self.inner
            .update(slug, update)
            .await
            .map_err(Self::map_error)
    }

    #[instrument(skip(self, menu), fields(items = menu.item_count()))]
    pub async fn replace_menu(&self, slug: Slug, menu: Menu) -> Result<(), RestaurantError> {
        match self.act(slug, RestaurantAction::ReplaceMenu(menu)).await? {
            RestaurantActionResult::ReplaceMenu(()) => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    #[instrument(skip(self))]
    pub async fn set_item_availability(
        &self,
        slug: Slug,
        item_id: String,
        available: bool,
    ) -> Result<(), RestaurantError> {
        let action = RestaurantAction::SetItemAvailability { item_id, available };
        match self.act(slug, action).await? {
            RestaurantActionResult::SetItemAvailability(()) => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    /// Sets the promotion, or clears it with `None`.
    #[instrument(skip(self, promotion))]
    pub async fn set_promotion(
        &self,
        slug: Slug,
        promotion: Option<Promotion>,
    ) -> Result<(), RestaurantError> {
        match self.act(slug, RestaurantAction::SetPromotion(promotion)).await? {
            RestaurantActionResult::SetPromotion(()) => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    #[instrument(skip(self, new_password))]
    pub async fn change_password(
        &self,
        slug: Slug,
        new_password: String,
    ) -> Result<(), RestaurantError> {
        let hash = hash_off_loop(new_password).await?;
        match self.act(slug, RestaurantAction::SetPasswordHash(hash)).await? {
            RestaurantActionResult::SetPasswordHash(()) => {
                info!("Admin password changed");
                Ok(())
            }
            other => Err(unexpected(other)),
        }
    }

    /// Checks an admin password. A wrong password is `Unauthorized`.
    #[instrument(skip(self, password))]
    pub async fn verify_admin(&self, slug: Slug, password: String) -> Result<(), RestaurantError> {
        let restaurant = self.fetch(&slug).await?;
        let hash = restaurant.admin_password_hash;
        let valid = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| RestaurantError::PasswordHash(e.to_string()))??;
        if valid {
            Ok(())
        } else {
            Err(RestaurantError::Unauthorized)
        }
    }

    /// Prices a cart against the current menu without changing anything.
    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn quote_cart(
        &self,
        slug: Slug,
        lines: Vec<CartLine>,
    ) -> Result<CartQuote, RestaurantError> {
        match self.act(slug, RestaurantAction::QuoteCart(lines)).await? {
            RestaurantActionResult::QuoteCart(quote) => Ok(quote),
            other => Err(unexpected(other)),
        }
    }

    /// Committed restaurant changes, from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ResourceEvent<Restaurant>> {
        self.inner.subscribe()
    }

    async fn act(
        &self,
        slug: Slug,
        action: RestaurantAction,
    ) -> Result<RestaurantActionResult, RestaurantError> {
        debug!("Sending request");
        self.inner
            .perform_action(slug, action)
            .await
            .map_err(Self::map_error)
    }
}

async fn hash_off_loop(password: String) -> Result<String, RestaurantError> {
    let hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| RestaurantError::PasswordHash(e.to_string()))??;
    Ok(hash)
}

fn unexpected(result: RestaurantActionResult) -> RestaurantError {
    RestaurantError::ActorCommunicationError(format!("unexpected action result: {result:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::menu::tests::sample_menu;
    use crate::model::restaurant::tests::sample_info;
    use crate::model::Theme;
    use chrono::Utc;
    use resource_actor::mock::{create_mock_client, expect_action, expect_create, MockClient};

    fn slug() -> Slug {
        Slug::parse("chez-test").unwrap()
    }

    fn stored(password: &str) -> Restaurant {
        Restaurant {
            slug: slug(),
            info: sample_info(),
            theme: Theme::default(),
            menu: sample_menu(),
            promotion: None,
            ordering_enabled: true,
            admin_password_hash: hash_password(password).unwrap(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn create_hashes_the_password_before_sending() {
        let (client, mut receiver) = create_mock_client::<Restaurant>(10);
        let restaurants = RestaurantClient::new(client);

        let task = tokio::spawn(async move {
            restaurants
                .create_restaurant(NewRestaurant {
                    slug: "chez-test".into(),
                    info: sample_info(),
                    theme: Theme::default(),
                    menu: Menu::default(),
                    ordering_enabled: true,
                    admin_password: "open sesame".into(),
                })
                .await
        });

        let (params, responder) = expect_create(&mut receiver)
            .await
            .expect("Expected Create request");
        assert_eq!(params.slug, slug());
        assert!(verify_password("open sesame", &params.password_hash).unwrap());
        responder.send(Ok(params.slug.clone())).unwrap();

        assert_eq!(task.await.unwrap().unwrap(), slug());
    }

    #[tokio::test]
    async fn create_rejects_bad_input_without_calling_the_actor() {
        let mock = MockClient::<Restaurant>::new();
        let restaurants = RestaurantClient::new(mock.client());

        let mut params = NewRestaurant {
            slug: "Not A Slug".into(),
            info: sample_info(),
            theme: Theme::default(),
            menu: Menu::default(),
            ordering_enabled: false,
            admin_password: "open sesame".into(),
        };
        assert!(matches!(
            restaurants.create_restaurant(params.clone()).await,
            Err(RestaurantError::ValidationError(_))
        ));

        params.slug = "chez-test".into();
        params.admin_password = "short".into();
        assert!(matches!(
            restaurants.create_restaurant(params).await,
            Err(RestaurantError::ValidationError(_))
        ));
        mock.verify();
    }

    #[tokio::test]
    async fn verify_admin_checks_the_stored_hash() {
        let mut mock = MockClient::<Restaurant>::new();
        mock.expect_get(slug()).return_ok(Some(stored("open sesame")));
        mock.expect_get(slug()).return_ok(Some(stored("open sesame")));
        mock.expect_get(slug()).return_ok(None);
        let restaurants = RestaurantClient::new(mock.client());

        assert!(restaurants
            .verify_admin(slug(), "open sesame".into())
            .await
            .is_ok());
        assert_eq!(
            restaurants.verify_admin(slug(), "guess".into()).await,
            Err(RestaurantError::Unauthorized)
        );
        assert_eq!(
            restaurants.verify_admin(slug(), "open sesame".into()).await,
            Err(RestaurantError::NotFound("chez-test".into()))
        );
        mock.verify();
    }

    #[tokio::test]
    async fn quote_cart_unwraps_the_quote() {
        let (client, mut receiver) = create_mock_client::<Restaurant>(10);
        let restaurants = RestaurantClient::new(client);

        let lines = vec![CartLine {
            item_id: "soup".into(),
            quantity: 2,
        }];
        let task = tokio::spawn(async move { restaurants.quote_cart(slug(), lines).await });

        let (id, action, responder) = expect_action(&mut receiver)
            .await
            .expect("Expected Action request");
        assert_eq!(id, slug());
        let RestaurantAction::QuoteCart(lines) = action else {
            panic!("Expected QuoteCart action");
        };
        let quote = stored("open sesame").quote(&lines).unwrap();
        responder
            .send(Ok(RestaurantActionResult::QuoteCart(quote)))
            .unwrap();

        assert_eq!(task.await.unwrap().unwrap().total_cents, 1300);
    }

    #[tokio::test]
    async fn entity_and_framework_errors_are_typed() {
        let mut mock = MockClient::<Restaurant>::new();
        mock.expect_action(slug()).return_err(FrameworkError::EntityError(Box::new(
            RestaurantError::ItemUnavailable("soup".into()),
        )));
        mock.expect_action(slug())
            .return_err(FrameworkError::NotFound("chez-test".into()));
        let restaurants = RestaurantClient::new(mock.client());

        assert_eq!(
            restaurants.quote_cart(slug(), Vec::new()).await,
            Err(RestaurantError::ItemUnavailable("soup".into()))
        );
        assert_eq!(
            restaurants
                .set_item_availability(slug(), "soup".into(), true)
                .await,
            Err(RestaurantError::NotFound("chez-test".into()))
        );
        mock.verify();
    }
}
