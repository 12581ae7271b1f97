use axum::{
    Router,
    extract::{State, rejection::JsonRejection},
    response::Json,
    routing::{get, post},
};
use starburger_foodcart::{catalog, registration};
use tracing::instrument;

use crate::error::ApiError;
use crate::models::*;

use super::{AppState, connect};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/banners", get(list_banners))
        .route("/api/products", get(list_products))
        .route("/api/order", post(register_order))
}

#[utoipa::path(
    get,
    path = "/api/banners",
    responses(
        (status = 200, description = "Promotional banners", body = Vec<BannerResponse>),
    ),
    tag = "foodcart"
)]
#[instrument(skip(state))]
pub async fn list_banners(State(state): State<AppState>) -> Json<Vec<BannerResponse>> {
    Json(
        catalog::banners(&state.static_url)
            .into_iter()
            .map(Into::into)
            .collect(),
    )
}

#[utoipa::path(
    get,
    path = "/api/products",
    responses(
        (status = 200, description = "Products available in at least one restaurant", body = Vec<ProductResponse>),
        (status = 503, description = "Service unavailable", body = ApiErrorResponse),
    ),
    tag = "foodcart"
)]
#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let mut conn = connect(&state).await?;
    let products = catalog::available_products(&mut conn).await?;
    Ok(Json(products.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/api/order",
    request_body = RegisterOrderRequest,
    responses(
        (status = 200, description = "Order registered", body = RegisterOrderResponse),
        (status = 400, description = "Invalid order", body = ValidationErrorResponse),
        (status = 503, description = "Service unavailable", body = ApiErrorResponse),
    ),
    tag = "foodcart"
)]
#[instrument(skip(state))]
pub async fn register_order(
    State(state): State<AppState>,
    payload: Result<Json<RegisterOrderRequest>, JsonRejection>,
) -> Result<Json<RegisterOrderResponse>, ApiError> {
    let Json(payload) = payload?;
    let mut conn = connect(&state).await?;
    let registered = registration::register_order(&mut conn, payload.into()).await?;
    Ok(Json(registered.into()))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };

    use crate::handlers::tests::send;

    #[tokio::test]
    async fn test_banners() {
        let request = Request::get("/api/banners").body(Body::empty()).unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::OK);
        let banners = body.as_array().unwrap();
        assert_eq!(banners.len(), 3);
        assert_eq!(banners[0]["title"], "Burger");
        assert_eq!(banners[0]["src"], "/static/burger.jpg");
    }

    #[tokio::test]
    async fn test_products_without_database() {
        let request = Request::get("/api/products").body(Body::empty()).unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_register_order_rejects_malformed_json() {
        let request = Request::post("/api/order")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid request");
        assert!(body["fields"]["non_field_errors"][0].is_string());
    }

    #[tokio::test]
    async fn test_register_order_rejects_mistyped_fields() {
        for payload in [
            r#"{"products":[{"product":"burger","quantity":1}],"firstname":"Ivan","lastname":"Petrov","phonenumber":"+79123456789","address":"Red Square"}"#,
            r#"{"products":null,"firstname":"Ivan","lastname":"Petrov","phonenumber":"+79123456789","address":"Red Square"}"#,
        ] {
            let request = Request::post("/api/order")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload))
                .unwrap();
            let (status, body) = send(request).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{payload}");
            assert_eq!(body["error"], "Invalid request");
            assert!(body["fields"]["non_field_errors"].is_array());
        }
    }
}
