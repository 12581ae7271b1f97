use std::io::Write;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::{
    deserialize::{self, FromSql, FromSqlRow},
    expression::AsExpression,
    pg::{Pg, PgValue},
    prelude::*,
    serialize::{self, IsNull, Output, ToSql},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::{
    items_in_order, orders, product_categories, products, restaurant_menu_items, restaurants,
};

/// Declaration order is the lifecycle order; statuses only move forward.
#[derive(
    FromSqlRow,
    AsExpression,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Copy,
    Clone,
    Debug,
)]
#[diesel(sql_type = crate::schema::sql_types::OrderStatus)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    NotProcessed,
    InProcess,
    InDelivery,
    Processed,
}

impl OrderStatus {
    /// Statuses shown on the manager dashboard.
    pub const ACTIVE: [OrderStatus; 3] = [
        OrderStatus::NotProcessed,
        OrderStatus::InProcess,
        OrderStatus::InDelivery,
    ];
}

impl ToSql<crate::schema::sql_types::OrderStatus, Pg> for OrderStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        match *self {
            OrderStatus::NotProcessed => out.write_all(b"NOT_PROCESSED")?,
            OrderStatus::InProcess => out.write_all(b"IN_PROCESS")?,
            OrderStatus::InDelivery => out.write_all(b"IN_DELIVERY")?,
            OrderStatus::Processed => out.write_all(b"PROCESSED")?,
        }
        Ok(IsNull::No)
    }
}

impl FromSql<crate::schema::sql_types::OrderStatus, Pg> for OrderStatus {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        match bytes.as_bytes() {
            b"NOT_PROCESSED" => Ok(OrderStatus::NotProcessed),
            b"IN_PROCESS" => Ok(OrderStatus::InProcess),
            b"IN_DELIVERY" => Ok(OrderStatus::InDelivery),
            b"PROCESSED" => Ok(OrderStatus::Processed),
            _ => Err("Unrecognized enum variant".into()),
        }
    }
}

#[derive(
    FromSqlRow, AsExpression, Serialize, Deserialize, PartialEq, Eq, Copy, Clone, Debug,
)]
#[diesel(sql_type = crate::schema::sql_types::PaymentMethod)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Card,
}

impl ToSql<crate::schema::sql_types::PaymentMethod, Pg> for PaymentMethod {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        match *self {
            PaymentMethod::Cash => out.write_all(b"CASH")?,
            PaymentMethod::Card => out.write_all(b"CARD")?,
        }
        Ok(IsNull::No)
    }
}

impl FromSql<crate::schema::sql_types::PaymentMethod, Pg> for PaymentMethod {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        match bytes.as_bytes() {
            b"CASH" => Ok(PaymentMethod::Cash),
            b"CARD" => Ok(PaymentMethod::Card),
            _ => Err("Unrecognized enum variant".into()),
        }
    }
}

#[derive(Queryable, Selectable, Identifiable, Insertable, Clone, Debug, PartialEq)]
#[diesel(table_name = restaurants)]
pub struct Restaurant {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub contact_phone: String,
}

#[derive(Queryable, Selectable, Identifiable, Insertable, Clone, Debug, PartialEq)]
#[diesel(table_name = product_categories)]
pub struct ProductCategory {
    pub id: Uuid,
    pub name: String,
}

#[derive(
    Queryable, Selectable, Identifiable, Associations, Insertable, Clone, Debug, PartialEq,
)]
#[diesel(belongs_to(ProductCategory, foreign_key = category_id))]
#[diesel(table_name = products)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub category_id: Option<Uuid>,
    pub price: BigDecimal,
    pub image: String,
    pub special_status: bool,
    pub description: String,
}

#[derive(Queryable, Selectable, Identifiable, Associations, Insertable, Debug, PartialEq)]
#[diesel(belongs_to(Restaurant))]
#[diesel(belongs_to(Product))]
#[diesel(table_name = restaurant_menu_items)]
pub struct RestaurantMenuItem {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub product_id: Uuid,
    pub availability: bool,
}

#[derive(Queryable, Selectable, Identifiable, Insertable, Clone, Debug, PartialEq)]
#[diesel(table_name = orders)]
pub struct Order {
    pub id: Uuid,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub cooking_restaurant_id: Option<Uuid>,
    pub firstname: String,
    pub lastname: String,
    pub phonenumber: String,
    pub address: String,
    pub comment: String,
    pub registered_at: DateTime<Utc>,
    pub called_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
}

/// An order line. `price` is the product price at registration time.
#[derive(
    Queryable, Selectable, Identifiable, Associations, Insertable, Clone, Debug, PartialEq,
)]
#[diesel(belongs_to(Order))]
#[diesel(belongs_to(Product))]
#[diesel(table_name = items_in_order)]
pub struct ItemInOrder {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: BigDecimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_order_follows_lifecycle() {
        assert!(OrderStatus::NotProcessed < OrderStatus::InProcess);
        assert!(OrderStatus::InProcess < OrderStatus::InDelivery);
        assert!(OrderStatus::InDelivery < OrderStatus::Processed);
        assert!(!OrderStatus::ACTIVE.contains(&OrderStatus::Processed));
    }
}
