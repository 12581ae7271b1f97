use chrono::{DateTime, Utc};
use diesel::{dsl::exists, prelude::*, select, update};
use diesel_async::{
    scoped_futures::ScopedFutureExt, AsyncConnection, AsyncPgConnection, RunQueryDsl,
};
use thiserror::Error;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    models::{Order, OrderStatus, PaymentMethod},
    schema::{orders, restaurants},
};

/// Manager edits to an order. Unset fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateOrder {
    pub status: Option<OrderStatus>,
    pub payment_method: Option<PaymentMethod>,
    pub cooking_restaurant_id: Option<Uuid>,
    pub comment: Option<String>,
}

#[derive(Error, Debug)]
pub enum CommandHandlerError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: Uuid },
    #[error("Invalid transition from {current:?} to {requested:?}")]
    InvalidTransition {
        current: OrderStatus,
        requested: OrderStatus,
    },
    #[error("Order in status {status:?} needs a cooking restaurant")]
    RestaurantRequired { status: OrderStatus },
    #[error("Unexpected internal error")]
    Internal(#[from] diesel::result::Error),
}

/// Computes the order that results from `command`.
///
/// Assigning a restaurant to a fresh order starts cooking it. Statuses never
/// move backwards, and `called_at`/`delivered_at` are stamped once, on the
/// first entry into cooking and into processed respectively.
pub fn apply_update(
    order: &Order,
    command: &UpdateOrder,
    now: DateTime<Utc>,
) -> Result<Order, CommandHandlerError> {
    let cooking_restaurant_id = command
        .cooking_restaurant_id
        .or(order.cooking_restaurant_id);

    let status = match command.status {
        Some(requested) => requested,
        None if order.status == OrderStatus::NotProcessed
            && command.cooking_restaurant_id.is_some() =>
        {
            OrderStatus::InProcess
        }
        None => order.status,
    };
    if status < order.status {
        return Err(CommandHandlerError::InvalidTransition {
            current: order.status,
            requested: status,
        });
    }
    if status >= OrderStatus::InProcess && cooking_restaurant_id.is_none() {
        return Err(CommandHandlerError::RestaurantRequired { status });
    }

    let mut updated = order.clone();
    updated.status = status;
    updated.cooking_restaurant_id = cooking_restaurant_id;
    if let Some(payment_method) = command.payment_method {
        updated.payment_method = payment_method;
    }
    if let Some(comment) = &command.comment {
        updated.comment = comment.clone();
    }
    if status >= OrderStatus::InProcess && updated.called_at.is_none() {
        updated.called_at = Some(now);
    }
    if status == OrderStatus::Processed && updated.delivered_at.is_none() {
        updated.delivered_at = Some(now);
    }
    Ok(updated)
}

#[instrument(skip(conn))]
pub async fn update_order(
    conn: &mut AsyncPgConnection,
    order_id: Uuid,
    command: UpdateOrder,
) -> Result<Order, CommandHandlerError> {
    conn.transaction::<_, CommandHandlerError, _>(|conn| {
        async move {
            let order = orders::table
                .find(order_id)
                .select(Order::as_select())
                .for_update()
                .get_result(conn)
                .await
                .optional()?
                .ok_or(CommandHandlerError::NotFound {
                    kind: "Order",
                    id: order_id,
                })?;

            if let Some(restaurant_id) = command.cooking_restaurant_id {
                let known = select(exists(restaurants::table.find(restaurant_id)))
                    .get_result::<bool>(conn)
                    .await?;
                if !known {
                    return Err(CommandHandlerError::NotFound {
                        kind: "Restaurant",
                        id: restaurant_id,
                    });
                }
            }

            let updated = apply_update(&order, &command, Utc::now())?;
            update(orders::table)
                .set((
                    orders::status.eq(updated.status),
                    orders::payment_method.eq(updated.payment_method),
                    orders::cooking_restaurant_id.eq(updated.cooking_restaurant_id),
                    orders::comment.eq(&updated.comment),
                    orders::called_at.eq(updated.called_at),
                    orders::delivered_at.eq(updated.delivered_at),
                ))
                .filter(orders::id.eq(order_id))
                .execute(conn)
                .await?;

            info!(from = ?order.status, to = ?updated.status, "order updated");
            Ok(updated)
        }
        .scope_boxed()
    })
    .await
}
