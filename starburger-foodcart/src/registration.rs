use std::{
    collections::{BTreeMap, HashMap},
    sync::LazyLock,
};

use bigdecimal::BigDecimal;
use chrono::Utc;
use diesel::{insert_into, prelude::*};
use diesel_async::{
    scoped_futures::ScopedFutureExt, AsyncConnection, AsyncPgConnection, RunQueryDsl,
};
use regex::Regex;
use thiserror::Error;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    models::{ItemInOrder, Order, OrderStatus, PaymentMethod},
    schema::{items_in_order, orders, products},
};

/// Compact phone forms accepted on input: a Russian number starting with
/// 7 or 8, or any international number with a leading `+`.
/// Only ASCII digits are accepted.
static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\+([0-9]{11,15})|[78]([0-9]{10}))$").expect("phone pattern compiles")
});

#[derive(Debug, Clone, PartialEq)]
pub struct OrderLine {
    pub product: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegisterOrder {
    pub products: Vec<OrderLine>,
    pub firstname: String,
    pub lastname: String,
    pub phonenumber: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredOrder {
    pub id: Uuid,
    pub products: Vec<OrderLine>,
    pub firstname: String,
    pub lastname: String,
    pub phonenumber: String,
    pub address: String,
}

/// Validation messages keyed by payload field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn into_inner(self) -> BTreeMap<String, Vec<String>> {
        self.0
    }
}

#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("Invalid order payload")]
    Invalid(FieldErrors),
    #[error("Unexpected internal error")]
    Internal(#[from] diesel::result::Error),
}

/// Normalizes to E.164. Returns `None` for anything that is not a phone
/// number.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let compact = raw
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '(' | ')'))
        .collect::<String>();
    let captures = PHONE_PATTERN.captures(&compact)?;

    if let Some(international) = captures.get(1) {
        return Some(format!("+{}", international.as_str()));
    }
    captures
        .get(2)
        .map(|subscriber| format!("+7{}", subscriber.as_str()))
}

/// Checks the payload against the current product prices. On success, the
/// payload comes back with its phone number normalized.
pub fn validate(
    payload: &RegisterOrder,
    prices: &HashMap<Uuid, BigDecimal>,
) -> Result<RegisterOrder, FieldErrors> {
    let mut errors = FieldErrors::default();

    if payload.products.is_empty() {
        errors.add("products", "This list may not be empty.");
    }
    for line in &payload.products {
        if !prices.contains_key(&line.product) {
            errors.add("products", format!("Invalid product id {}.", line.product));
        }
        if line.quantity < 1 {
            errors.add(
                "products",
                format!("Quantity of product {} must be at least 1.", line.product),
            );
        }
    }

    for (field, value) in [
        ("firstname", &payload.firstname),
        ("lastname", &payload.lastname),
        ("address", &payload.address),
    ] {
        if value.trim().is_empty() {
            errors.add(field, "This field may not be blank.");
        }
    }

    let phonenumber = if payload.phonenumber.trim().is_empty() {
        errors.add("phonenumber", "This field may not be blank.");
        None
    } else {
        let normalized = normalize_phone(&payload.phonenumber);
        if normalized.is_none() {
            errors.add("phonenumber", "Enter a valid phone number.");
        }
        normalized
    };

    match phonenumber {
        Some(phonenumber) if errors.is_empty() => Ok(RegisterOrder {
            products: payload.products.clone(),
            firstname: payload.firstname.trim().to_string(),
            lastname: payload.lastname.trim().to_string(),
            phonenumber,
            address: payload.address.trim().to_string(),
        }),
        _ => Err(errors),
    }
}

/// Creates a new order together with its lines, snapshotting product prices.
#[instrument(skip(conn, payload), fields(lines = payload.products.len()))]
pub async fn register_order(
    conn: &mut AsyncPgConnection,
    payload: RegisterOrder,
) -> Result<RegisteredOrder, RegistrationError> {
    conn.transaction::<_, RegistrationError, _>(|conn| {
        async move {
            let product_ids = payload
                .products
                .iter()
                .map(|line| line.product)
                .collect::<Vec<_>>();
            let prices = products::table
                .filter(products::id.eq_any(&product_ids))
                .select((products::id, products::price))
                .load::<(Uuid, BigDecimal)>(conn)
                .await?
                .into_iter()
                .collect::<HashMap<_, _>>();

            let accepted = validate(&payload, &prices).map_err(RegistrationError::Invalid)?;

            let order = Order {
                id: Uuid::new_v4(),
                status: OrderStatus::NotProcessed,
                payment_method: PaymentMethod::Cash,
                cooking_restaurant_id: None,
                firstname: accepted.firstname.clone(),
                lastname: accepted.lastname.clone(),
                phonenumber: accepted.phonenumber.clone(),
                address: accepted.address.clone(),
                comment: String::new(),
                registered_at: Utc::now(),
                called_at: None,
                delivered_at: None,
            };
            insert_into(orders::table)
                .values(&order)
                .execute(conn)
                .await?;

            let items = accepted
                .products
                .iter()
                .filter_map(|line| {
                    prices.get(&line.product).map(|price| ItemInOrder {
                        id: Uuid::new_v4(),
                        order_id: order.id,
                        product_id: line.product,
                        quantity: line.quantity,
                        price: price.clone(),
                    })
                })
                .collect::<Vec<_>>();
            insert_into(items_in_order::table)
                .values(&items)
                .execute(conn)
                .await?;

            info!(order_id = %order.id, "order registered");
            Ok(RegisteredOrder {
                id: order.id,
                products: accepted.products,
                firstname: accepted.firstname,
                lastname: accepted.lastname,
                phonenumber: accepted.phonenumber,
                address: accepted.address,
            })
        }
        .scope_boxed()
    })
    .await
}
