use std::collections::HashMap;

use bigdecimal::BigDecimal;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use starburger_distances::{
    geocoder::Geocoder,
    store::{PgPlaceStore, PlaceStore, PlaceStoreError},
    CoordinateResolver,
};
use thiserror::Error;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::{
    availability::MenuAvailabilityIndex,
    catalog::{list_restaurants, order_amount},
    models::{ItemInOrder, Order, OrderStatus, Restaurant},
    ranking::{rank, RankedCandidates},
    schema::orders,
};

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Unexpected internal error")]
    Internal(#[from] diesel::result::Error),
    #[error(transparent)]
    PlaceStore(#[from] PlaceStoreError),
}

/// One row of the manager dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderCard {
    pub order: Order,
    pub amount: BigDecimal,
    pub cooking_restaurant: Option<Restaurant>,
    /// Restaurants able to cook the whole order, by name.
    pub eligible_restaurants: Vec<Restaurant>,
    pub ranking: RankedCandidates,
}

/// Orders not yet processed with their lines, by status and then
/// registration time.
pub async fn load_active_orders(
    conn: &mut AsyncPgConnection,
) -> Result<Vec<(Order, Vec<ItemInOrder>)>, diesel::result::Error> {
    let active = orders::table
        .filter(orders::status.eq_any(OrderStatus::ACTIVE))
        .order((
            orders::status.asc(),
            orders::registered_at.asc(),
            orders::id.asc(),
        ))
        .select(Order::as_select())
        .load(conn)
        .await?;

    let items = ItemInOrder::belonging_to(&active)
        .select(ItemInOrder::as_select())
        .load(conn)
        .await?;

    Ok(items
        .grouped_by(&active)
        .into_iter()
        .zip(active)
        .map(|(items, order)| (order, items))
        .collect())
}

/// Matches and ranks every order. Cached coordinates for all addresses
/// involved are fetched up front.
pub async fn assemble<S: PlaceStore, G: Geocoder>(
    resolver: &mut CoordinateResolver<S, G>,
    orders: Vec<(Order, Vec<ItemInOrder>)>,
    restaurants: &[Restaurant],
    index: &MenuAvailabilityIndex,
) -> Result<Vec<OrderCard>, PlaceStoreError> {
    let by_id = restaurants
        .iter()
        .map(|restaurant| (restaurant.id, restaurant))
        .collect::<HashMap<Uuid, &Restaurant>>();

    let matched = orders
        .into_iter()
        .map(|(order, items)| {
            let mut eligible = index
                .eligible_restaurants(items.iter().map(|item| &item.product_id))
                .into_iter()
                .filter_map(|id| by_id.get(&id).copied())
                .collect::<Vec<_>>();
            eligible.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
            (order, items, eligible)
        })
        .collect::<Vec<_>>();

    let addresses = matched.iter().flat_map(|(order, _, eligible)| {
        std::iter::once(order.address.as_str())
            .chain(eligible.iter().map(|restaurant| restaurant.address.as_str()))
    });
    let cached = resolver.preload(addresses).await?;
    debug!(orders = matched.len(), cached, "assembling dashboard");

    let mut cards = Vec::with_capacity(matched.len());
    for (order, items, eligible) in matched {
        let ranking = rank(resolver, &order.address, &eligible).await?;
        cards.push(OrderCard {
            amount: order_amount(&items),
            cooking_restaurant: order
                .cooking_restaurant_id
                .and_then(|id| by_id.get(&id).map(|restaurant| (*restaurant).clone())),
            eligible_restaurants: eligible.into_iter().cloned().collect(),
            ranking,
            order,
        });
    }
    Ok(cards)
}

#[instrument(skip(conn, geocoder))]
pub async fn render_dashboard<G: Geocoder>(
    conn: &mut AsyncPgConnection,
    geocoder: G,
) -> Result<Vec<OrderCard>, DashboardError> {
    let orders = load_active_orders(conn).await?;
    let restaurants = list_restaurants(conn).await?;
    let index = MenuAvailabilityIndex::load(conn).await?;

    let mut resolver = CoordinateResolver::new(PgPlaceStore::new(conn), geocoder);
    let cards = assemble(&mut resolver, orders, &restaurants, &index).await?;
    Ok(cards)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::{Duration, Utc};
    use starburger_distances::{
        geocoder::StaticGeocoder, store::MemoryPlaceStore, Coordinates, Place,
    };

    use super::*;
    use crate::models::PaymentMethod;

    fn coordinates(lat: &str, lon: &str) -> Coordinates {
        Coordinates::new(
            BigDecimal::from_str(lat).unwrap(),
            BigDecimal::from_str(lon).unwrap(),
        )
        .unwrap()
    }

    fn restaurant(name: &str, address: &str) -> Restaurant {
        Restaurant {
            id: Uuid::new_v4(),
            name: name.to_string(),
            address: address.to_string(),
            contact_phone: String::new(),
        }
    }

    fn order(address: &str, lines: &[(Uuid, i32, &str)]) -> (Order, Vec<ItemInOrder>) {
        let order = Order {
            id: Uuid::new_v4(),
            status: OrderStatus::NotProcessed,
            payment_method: PaymentMethod::Cash,
            cooking_restaurant_id: None,
            firstname: "Ivan".to_string(),
            lastname: "Petrov".to_string(),
            phonenumber: "+79123456789".to_string(),
            address: address.to_string(),
            comment: String::new(),
            registered_at: Utc::now() - Duration::minutes(10),
            called_at: None,
            delivered_at: None,
        };
        let items = lines
            .iter()
            .map(|(product_id, quantity, price)| ItemInOrder {
                id: Uuid::new_v4(),
                order_id: order.id,
                product_id: *product_id,
                quantity: *quantity,
                price: BigDecimal::from_str(price).unwrap(),
            })
            .collect();
        (order, items)
    }

    #[tokio::test]
    async fn test_assemble_matches_and_ranks() {
        let burger = Uuid::new_v4();
        let fries = Uuid::new_v4();
        let near = restaurant("Near", "Tverskaya 7");
        let far = restaurant("Far", "Khimki");
        let burgers_only = restaurant("Burgers only", "Arbat 1");
        let restaurants = vec![near.clone(), far.clone(), burgers_only.clone()];
        let index = MenuAvailabilityIndex::from_pairs([
            (burger, near.id),
            (burger, far.id),
            (burger, burgers_only.id),
            (fries, near.id),
            (fries, far.id),
        ]);

        let store = MemoryPlaceStore::with_places([Place::new(
            "Red Square",
            Some(coordinates("55.753930", "37.620795")),
        )]);
        let geocoder = StaticGeocoder::new()
            .with_answer("Tverskaya 7", coordinates("55.759306", "37.611523"))
            .with_answer("Khimki", coordinates("55.897038", "37.429810"))
            .with_answer("Arbat 1", coordinates("55.752004", "37.599858"));
        let mut resolver = CoordinateResolver::new(store, &geocoder);

        let orders = vec![
            order("Red Square", &[(burger, 2, "100.00"), (fries, 1, "50.00")]),
            order("Atlantis", &[(burger, 1, "100.00")]),
            order("Red Square", &[]),
        ];
        let cards = assemble(&mut resolver, orders, &restaurants, &index)
            .await
            .unwrap();
        assert_eq!(cards.len(), 3);

        let first = &cards[0];
        assert_eq!(first.amount, BigDecimal::from_str("250.00").unwrap());
        let eligible = first
            .eligible_restaurants
            .iter()
            .map(|r| r.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(eligible, vec!["Far", "Near"]);
        assert!(first.ranking.address_valid);
        let ranked = first
            .ranking
            .candidates
            .iter()
            .map(|c| c.restaurant_id)
            .collect::<Vec<_>>();
        assert_eq!(ranked, vec![near.id, far.id]);

        let second = &cards[1];
        assert_eq!(second.eligible_restaurants.len(), 3);
        assert!(!second.ranking.address_valid);
        assert!(second.ranking.candidates.is_empty());

        let third = &cards[2];
        assert!(third.eligible_restaurants.is_empty());
        assert!(third.ranking.candidates.is_empty());

        // Tverskaya 7, Khimki and Atlantis; Arbat 1 is never ranked against a
        // valid address and Red Square is cached.
        assert_eq!(geocoder.calls(), 3);
    }

    #[tokio::test]
    async fn test_assigned_restaurant_is_reported() {
        let burger = Uuid::new_v4();
        let cook = restaurant("Cook", "Tverskaya 7");
        let index = MenuAvailabilityIndex::from_pairs([(burger, cook.id)]);
        let (mut pending, items) = order("Red Square", &[(burger, 1, "100.00")]);
        pending.status = OrderStatus::InProcess;
        pending.cooking_restaurant_id = Some(cook.id);

        let geocoder = StaticGeocoder::new();
        let mut resolver = CoordinateResolver::new(MemoryPlaceStore::new(), &geocoder);
        let cards = assemble(
            &mut resolver,
            vec![(pending, items)],
            std::slice::from_ref(&cook),
            &index,
        )
        .await
        .unwrap();

        assert_eq!(cards[0].cooking_restaurant, Some(cook));
        assert!(!cards[0].ranking.address_valid);
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL pointing at a migrated database"]
    async fn test_active_orders_skip_processed_and_follow_status() {
        use diesel_async::AsyncConnection;

        use crate::schema::{items_in_order, restaurants};

        let database_url = std::env::var("DATABASE_URL").unwrap();
        let mut conn = AsyncPgConnection::establish(&database_url).await.unwrap();
        conn.begin_test_transaction().await.unwrap();
        diesel::delete(items_in_order::table)
            .execute(&mut conn)
            .await
            .unwrap();
        diesel::delete(orders::table).execute(&mut conn).await.unwrap();

        let cook = restaurant("Cook", "Tverskaya 7");
        diesel::insert_into(restaurants::table)
            .values(&cook)
            .execute(&mut conn)
            .await
            .unwrap();

        let placed = |status: OrderStatus, minutes_ago: i64| {
            let (mut placed, _) = order("Red Square", &[]);
            placed.status = status;
            placed.registered_at = Utc::now() - Duration::minutes(minutes_ago);
            if status != OrderStatus::NotProcessed {
                placed.cooking_restaurant_id = Some(cook.id);
            }
            placed
        };
        let done = placed(OrderStatus::Processed, 60);
        let delivering = placed(OrderStatus::InDelivery, 50);
        let newer = placed(OrderStatus::NotProcessed, 10);
        let older = placed(OrderStatus::NotProcessed, 30);
        let cooking = placed(OrderStatus::InProcess, 40);
        diesel::insert_into(orders::table)
            .values(&vec![
                done.clone(),
                delivering.clone(),
                newer.clone(),
                older.clone(),
                cooking.clone(),
            ])
            .execute(&mut conn)
            .await
            .unwrap();

        let active = load_active_orders(&mut conn).await.unwrap();
        let ids = active.iter().map(|(order, _)| order.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![older.id, newer.id, cooking.id, delivering.id]);
        assert!(!ids.contains(&done.id));
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL pointing at a migrated database"]
    async fn test_render_dashboard_on_empty_database() {
        use diesel_async::AsyncConnection;

        let database_url = std::env::var("DATABASE_URL").unwrap();
        let mut conn = AsyncPgConnection::establish(&database_url).await.unwrap();
        conn.begin_test_transaction().await.unwrap();
        diesel::delete(orders::table).execute(&mut conn).await.unwrap();

        let geocoder = StaticGeocoder::new();
        let cards = render_dashboard(&mut conn, &geocoder).await.unwrap();
        assert!(cards.is_empty());
        assert_eq!(geocoder.calls(), 0);
    }
}
