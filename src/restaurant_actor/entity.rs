//! ActorEntity implementation for the Restaurant domain type.

use super::actions::{RestaurantAction, RestaurantActionResult};
use super::error::RestaurantError;
use crate::model::{
    CartLine, CartQuote, OrderLine, Restaurant, RestaurantCreate, RestaurantUpdate, Slug,
    MAX_CART_LINES, MAX_LINE_QUANTITY,
};
use async_trait::async_trait;
use chrono::Utc;
use resource_actor::ActorEntity;

/// Filter for listing restaurants.
#[derive(Debug, Clone, Copy, Default)]
pub enum RestaurantQuery {
    #[default]
    All,
    OrderingEnabled,
}

#[async_trait]
impl ActorEntity for Restaurant {
    type Id = Slug;
    type Create = RestaurantCreate;
    type Update = RestaurantUpdate;
    type Action = RestaurantAction;
    type ActionResult = RestaurantActionResult;
    type Query = RestaurantQuery;
    type Context = ();
    type Error = RestaurantError;

    fn id(&self) -> &Slug {
        &self.slug
    }

    // Restaurants are addressed by their slug.
    fn assign_id(_seq: u64, params: &RestaurantCreate) -> Slug {
        params.slug.clone()
    }

    fn from_create_params(slug: Slug, params: RestaurantCreate) -> Result<Self, Self::Error> {
        let info = params
            .info
            .validated()
            .map_err(RestaurantError::ValidationError)?;
        params
            .theme
            .validate()
            .map_err(RestaurantError::ValidationError)?;
        params.menu.validate()?;
        if params.password_hash.is_empty() {
            return Err(RestaurantError::ValidationError(
                "admin password is required".into(),
            ));
        }

        let now = Utc::now();
        Ok(Self {
            slug,
            info,
            theme: params.theme,
            menu: params.menu,
            promotion: None,
            ordering_enabled: params.ordering_enabled,
            admin_password_hash: params.password_hash,
            created_at: now,
            updated_at: now,
        })
    }

    fn matches(&self, query: &RestaurantQuery) -> bool {
        match query {
            RestaurantQuery::All => true,
            RestaurantQuery::OrderingEnabled => self.ordering_enabled,
        }
    }

    fn action_mutates(action: &RestaurantAction) -> bool {
        !action.is_read_only()
    }

    /// Applies the present fields. Info and theme are validated as a whole.
    async fn on_update(
        &mut self,
        update: RestaurantUpdate,
        _ctx: &Self::Context,
    ) -> Result<(), Self::Error> {
        if let Some(info) = update.info {
            self.info = info.validated().map_err(RestaurantError::ValidationError)?;
        }
        if let Some(theme) = update.theme {
            theme.validate().map_err(RestaurantError::ValidationError)?;
            self.theme = theme;
        }
        if let Some(enabled) = update.ordering_enabled {
            self.ordering_enabled = enabled;
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    async fn handle_action(
        &mut self,
        action: RestaurantAction,
        _ctx: &Self::Context,
    ) -> Result<RestaurantActionResult, Self::Error> {
        match action {
            RestaurantAction::ReplaceMenu(menu) => {
                menu.validate()?;
                self.menu = menu;
                self.updated_at = Utc::now();
                Ok(RestaurantActionResult::ReplaceMenu(()))
            }
            RestaurantAction::SetItemAvailability { item_id, available } => {
                let item = self
                    .menu
                    .find_item_mut(&item_id)
                    .ok_or(RestaurantError::UnknownItem(item_id))?;
                item.available = available;
                self.updated_at = Utc::now();
                Ok(RestaurantActionResult::SetItemAvailability(()))
            }
            RestaurantAction::SetPromotion(promotion) => {
                if let Some(promo) = &promotion {
                    promo.validate().map_err(RestaurantError::ValidationError)?;
                }
                self.promotion = promotion;
                self.updated_at = Utc::now();
                Ok(RestaurantActionResult::SetPromotion(()))
            }
            RestaurantAction::SetPasswordHash(hash) => {
                if hash.is_empty() {
                    return Err(RestaurantError::ValidationError(
                        "admin password is required".into(),
                    ));
                }
                self.admin_password_hash = hash;
                self.updated_at = Utc::now();
                Ok(RestaurantActionResult::SetPasswordHash(()))
            }
            RestaurantAction::QuoteCart(lines) => {
                self.quote(&lines).map(RestaurantActionResult::QuoteCart)
            }
        }
    }
}

impl Restaurant {
    /// Prices `lines` against the current menu.
    ///
    /// Lines naming the same item are kept separate; each is checked on its own.
    pub fn quote(&self, lines: &[CartLine]) -> Result<CartQuote, RestaurantError> {
        if !self.ordering_enabled {
            return Err(RestaurantError::OrderingClosed(self.slug.to_string()));
        }
        if lines.is_empty() {
            return Err(RestaurantError::EmptyCart);
        }
        if lines.len() > MAX_CART_LINES {
            return Err(RestaurantError::TooManyLines {
                count: lines.len(),
                max: MAX_CART_LINES,
            });
        }

        let mut priced = Vec::with_capacity(lines.len());
        let mut total_cents: u64 = 0;
        for line in lines {
            if !(1..=MAX_LINE_QUANTITY).contains(&line.quantity) {
                return Err(RestaurantError::InvalidQuantity {
                    item: line.item_id.clone(),
                    quantity: line.quantity,
                });
            }
            let item = self
                .menu
                .find_item(&line.item_id)
                .ok_or_else(|| RestaurantError::UnknownItem(line.item_id.clone()))?;
            if !item.available {
                return Err(RestaurantError::ItemUnavailable(line.item_id.clone()));
            }
            let line_total_cents = item.price_cents * u64::from(line.quantity);
            total_cents += line_total_cents;
            priced.push(OrderLine {
                item_id: item.id.clone(),
                label: item.label.clone(),
                quantity: line.quantity,
                unit_price_cents: item.price_cents,
                line_total_cents,
            });
        }

        Ok(CartQuote {
            lines: priced,
            total_cents,
            currency: self.info.currency.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::menu::tests::sample_menu;
    use crate::model::restaurant::tests::sample_info;
    use crate::model::Theme;

    fn create(slug: &str) -> RestaurantCreate {
        RestaurantCreate {
            slug: Slug::parse(slug).unwrap(),
            info: sample_info(),
            theme: Theme::default(),
            menu: sample_menu(),
            ordering_enabled: true,
            password_hash: "$argon2id$v=19$fake".into(),
        }
    }

    fn restaurant() -> Restaurant {
        let params = create("chez-test");
        Restaurant::from_create_params(Restaurant::assign_id(1, &params), params).unwrap()
    }

    fn cart(lines: &[(&str, u32)]) -> Vec<CartLine> {
        lines
            .iter()
            .map(|(id, quantity)| CartLine {
                item_id: id.to_string(),
                quantity: *quantity,
            })
            .collect()
    }

    #[test]
    fn create_validates_every_part() {
        let mut params = create("chez-test");
        params.info.currency = "euro".into();
        assert!(matches!(
            Restaurant::from_create_params(Restaurant::assign_id(1, &params), params),
            Err(RestaurantError::ValidationError(_))
        ));

        let mut params = create("chez-test");
        params.password_hash.clear();
        assert!(Restaurant::from_create_params(Restaurant::assign_id(1, &params), params).is_err());
    }

    #[test]
    fn quote_prices_every_line() {
        let quote = restaurant()
            .quote(&cart(&[("soup", 2), ("steak", 1)]))
            .unwrap();
        assert_eq!(quote.total_cents, 2 * 650 + 2400);
        assert_eq!(quote.currency, "EUR");
        assert_eq!(quote.lines[0].line_total_cents, 1300);
        assert_eq!(quote.lines[1].label.get("en"), Some("STEAK"));
    }

    #[test]
    fn quote_rejects_bad_carts() {
        let r = restaurant();
        assert_eq!(r.quote(&[]), Err(RestaurantError::EmptyCart));
        assert!(matches!(
            r.quote(&cart(&[("soup", 0)])),
            Err(RestaurantError::InvalidQuantity { .. })
        ));
        assert!(matches!(
            r.quote(&cart(&[("soup", MAX_LINE_QUANTITY + 1)])),
            Err(RestaurantError::InvalidQuantity { .. })
        ));
        assert_eq!(
            r.quote(&cart(&[("pie", 1)])),
            Err(RestaurantError::UnknownItem("pie".into()))
        );
        let too_many: Vec<(&str, u32)> = vec![("soup", 1); MAX_CART_LINES + 1];
        assert!(matches!(
            r.quote(&cart(&too_many)),
            Err(RestaurantError::TooManyLines { .. })
        ));
    }

    #[tokio::test]
    async fn availability_and_closing_affect_quotes() {
        let mut r = restaurant();
        r.handle_action(
            RestaurantAction::SetItemAvailability {
                item_id: "soup".into(),
                available: false,
            },
            &(),
        )
        .await
        .unwrap();
        assert_eq!(
            r.quote(&cart(&[("soup", 1)])),
            Err(RestaurantError::ItemUnavailable("soup".into()))
        );

        r.on_update(
            RestaurantUpdate {
                ordering_enabled: Some(false),
                ..Default::default()
            },
            &(),
        )
        .await
        .unwrap();
        assert!(matches!(
            r.quote(&cart(&[("steak", 1)])),
            Err(RestaurantError::OrderingClosed(_))
        ));
    }

    #[tokio::test]
    async fn replacing_with_an_invalid_menu_fails() {
        let mut r = restaurant();
        let mut menu = sample_menu();
        menu.categories.push(menu.categories[0].clone());
        let err = r
            .handle_action(RestaurantAction::ReplaceMenu(menu), &())
            .await
            .unwrap_err();
        assert!(matches!(err, RestaurantError::InvalidMenu(_)));
    }
}
