use std::collections::{BTreeSet, HashMap};

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::schema::restaurant_menu_items;

/// Which restaurants currently sell each product.
#[derive(Default, Debug, Clone)]
pub struct MenuAvailabilityIndex {
    by_product: HashMap<Uuid, BTreeSet<Uuid>>,
}

impl MenuAvailabilityIndex {
    /// Builds the index from `(product_id, restaurant_id)` pairs of available
    /// menu items.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Uuid, Uuid)>) -> Self {
        let mut by_product: HashMap<Uuid, BTreeSet<Uuid>> = HashMap::new();
        for (product_id, restaurant_id) in pairs {
            by_product.entry(product_id).or_default().insert(restaurant_id);
        }
        Self { by_product }
    }

    pub async fn load(conn: &mut AsyncPgConnection) -> Result<Self, diesel::result::Error> {
        let pairs = restaurant_menu_items::table
            .filter(restaurant_menu_items::availability.eq(true))
            .select((
                restaurant_menu_items::product_id,
                restaurant_menu_items::restaurant_id,
            ))
            .load::<(Uuid, Uuid)>(conn)
            .await?;
        Ok(Self::from_pairs(pairs))
    }

    pub fn restaurants_for(&self, product_id: &Uuid) -> Option<&BTreeSet<Uuid>> {
        self.by_product.get(product_id)
    }

    /// Restaurants selling every one of `product_ids`. An empty order has no
    /// eligible restaurants.
    pub fn eligible_restaurants<'a>(
        &self,
        product_ids: impl IntoIterator<Item = &'a Uuid>,
    ) -> BTreeSet<Uuid> {
        let mut product_ids = product_ids.into_iter();
        let Some(first) = product_ids.next() else {
            return BTreeSet::new();
        };

        let mut eligible = self.restaurants_for(first).cloned().unwrap_or_default();
        for product_id in product_ids {
            if eligible.is_empty() {
                break;
            }
            match self.restaurants_for(product_id) {
                Some(sellers) => eligible.retain(|r| sellers.contains(r)),
                None => eligible.clear(),
            }
        }
        eligible
    }
}
