use axum::{
    Router,
    extract::{Path, State, rejection::JsonRejection},
    http::HeaderMap,
    response::Json,
    routing::{get, patch},
};
use starburger_foodcart::{catalog, command_handlers, dashboard};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::*;

use super::{AppState, connect, verify_manager_access};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/manager/orders", get(list_orders))
        .route("/manager/orders/{id}", patch(update_order))
        .route("/manager/products", get(list_products))
        .route("/manager/restaurants", get(list_restaurants))
}

#[utoipa::path(
    get,
    path = "/manager/orders",
    responses(
        (status = 200, description = "Active orders with matching restaurants by distance", body = Vec<DashboardOrderResponse>),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 503, description = "Service unavailable", body = ApiErrorResponse),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "manager"
)]
#[instrument(skip(state))]
pub async fn list_orders(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<DashboardOrderResponse>>, ApiError> {
    verify_manager_access(&headers, &state)?;

    let mut conn = connect(&state).await?;
    let cards = dashboard::render_dashboard(&mut conn, &state.geocoder).await?;
    info!(orders = cards.len(), "dashboard rendered");

    Ok(Json(cards.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    patch,
    path = "/manager/orders/{id}",
    request_body = UpdateOrderRequest,
    responses(
        (status = 200, description = "Updated order", body = OrderResponse),
        (status = 400, description = "Undecodable payload", body = ValidationErrorResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 404, description = "Order or restaurant not found", body = ApiErrorResponse),
        (status = 409, description = "Transition not allowed", body = ApiErrorResponse),
        (status = 503, description = "Service unavailable", body = ApiErrorResponse),
    ),
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    security(
        ("bearer" = [])
    ),
    tag = "manager"
)]
#[instrument(skip(state))]
pub async fn update_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateOrderRequest>, JsonRejection>,
) -> Result<Json<OrderResponse>, ApiError> {
    verify_manager_access(&headers, &state)?;
    let Json(payload) = payload?;

    let command = command_handlers::UpdateOrder {
        status: payload.status.map(Into::into),
        payment_method: payload.payment_method.map(Into::into),
        cooking_restaurant_id: payload.cooking_restaurant_id,
        comment: payload.comment,
    };

    let mut conn = connect(&state).await?;
    let order = command_handlers::update_order(&mut conn, id, command).await?;
    Ok(Json(order.into()))
}

#[utoipa::path(
    get,
    path = "/manager/products",
    responses(
        (status = 200, description = "Product availability per restaurant", body = AvailabilityMatrixResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 503, description = "Service unavailable", body = ApiErrorResponse),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "manager"
)]
#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<AvailabilityMatrixResponse>, ApiError> {
    verify_manager_access(&headers, &state)?;

    let mut conn = connect(&state).await?;
    let matrix = catalog::availability_matrix(&mut conn).await?;
    Ok(Json(matrix.into()))
}

#[utoipa::path(
    get,
    path = "/manager/restaurants",
    responses(
        (status = 200, description = "All restaurants by name", body = Vec<RestaurantResponse>),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 503, description = "Service unavailable", body = ApiErrorResponse),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "manager"
)]
#[instrument(skip(state))]
pub async fn list_restaurants(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<RestaurantResponse>>, ApiError> {
    verify_manager_access(&headers, &state)?;

    let mut conn = connect(&state).await?;
    let restaurants = catalog::list_restaurants(&mut conn).await?;
    Ok(Json(restaurants.into_iter().map(Into::into).collect()))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };

    use crate::handlers::tests::{TOKEN, send};

    fn get(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::get(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_manager_endpoints_require_token() {
        for uri in ["/manager/orders", "/manager/products", "/manager/restaurants"] {
            let (status, body) = send(get(uri, None)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
            assert_eq!(body["error"], "Authentication failed");

            let (status, _) = send(get(uri, Some("wrong"))).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_valid_token_reaches_database() {
        for uri in ["/manager/orders", "/manager/products", "/manager/restaurants"] {
            let (status, _) = send(get(uri, Some(TOKEN))).await;
            assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_update_order_checks_token_first() {
        let request = Request::patch("/manager/orders/00000000-0000-0000-0000-000000000000")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"status":"IN_PROCESS"}"#))
            .unwrap();
        let (status, _) = send(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let request = Request::patch("/manager/orders/00000000-0000-0000-0000-000000000000")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
            .body(Body::from(r#"{"status":"IN_PROCESS"}"#))
            .unwrap();
        let (status, _) = send(request).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_update_order_rejects_unknown_status() {
        let request = Request::patch("/manager/orders/00000000-0000-0000-0000-000000000000")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
            .body(Body::from(r#"{"status":"COOKED"}"#))
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid request");
    }
}
