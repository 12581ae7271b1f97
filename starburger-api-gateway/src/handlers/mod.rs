pub mod foodcart;
pub mod manager;

pub use foodcart::router as foodcart_router;
pub use manager::router as manager_router;

use std::sync::Arc;

use axum::{Router, http::HeaderMap};
use diesel_async::AsyncPgConnection;
use starburger_distances::geocoder::YandexGeocoder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub database_url: Arc<str>,
    pub geocoder: YandexGeocoder,
    pub manager_token: Arc<str>,
    pub static_url: Arc<str>,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(foodcart_router())
        .merge(manager_router())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn connect(state: &AppState) -> Result<AsyncPgConnection, ApiError> {
    Ok(starburger_foodcart::establish_connection(&state.database_url).await?)
}

fn verify_manager_access(headers: &HeaderMap, state: &AppState) -> Result<(), ApiError> {
    let auth_header = headers
        .get("authorization")
        .ok_or(ApiError::AuthenticationFailed)?
        .to_str()
        .map_err(|_| ApiError::InvalidToken)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::InvalidToken)?;

    if token == &*state.manager_token {
        Ok(())
    } else {
        Err(ApiError::InvalidToken)
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        foodcart::list_banners,
        foodcart::list_products,
        foodcart::register_order,
        manager::list_orders,
        manager::update_order,
        manager::list_products,
        manager::list_restaurants,
    ),
    components(
        schemas(
            crate::models::BannerResponse,
            crate::models::CategoryResponse,
            crate::models::ProductResponse,
            crate::models::OrderLineRequest,
            crate::models::RegisterOrderRequest,
            crate::models::RegisterOrderResponse,
            crate::models::OrderStatusDto,
            crate::models::PaymentMethodDto,
            crate::models::UpdateOrderRequest,
            crate::models::OrderResponse,
            crate::models::RestaurantResponse,
            crate::models::RestaurantRef,
            crate::models::CandidateResponse,
            crate::models::DashboardOrderResponse,
            crate::models::ProductSummary,
            crate::models::ProductAvailabilityResponse,
            crate::models::AvailabilityMatrixResponse,
            crate::models::ApiErrorResponse,
            crate::models::ValidationErrorResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "foodcart", description = "Public storefront endpoints"),
        (name = "manager", description = "Order dashboard and back office endpoints")
    ),
    info(
        title = "Star Burger API",
        description = "Storefront and manager API for Star Burger",
        version = "1.0.0"
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            use utoipa::openapi::security::*;
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::time::Duration;

    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
        response::Response,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;

    pub(crate) const TOKEN: &str = "manager-secret";

    /// Nothing listens on port 1, so any handler that reaches the database
    /// fails with 503.
    pub(crate) fn state() -> AppState {
        AppState {
            database_url: "postgres://starburger@127.0.0.1:1/starburger".into(),
            geocoder: YandexGeocoder::new("http://127.0.0.1:1", "key", Duration::from_secs(1))
                .unwrap(),
            manager_token: TOKEN.into(),
            static_url: "/static/".into(),
        }
    }

    pub(crate) async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let response: Response = app(state()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    #[test]
    fn test_manager_token_checks() {
        let state = state();
        let mut headers = HeaderMap::new();
        assert!(matches!(
            verify_manager_access(&headers, &state),
            Err(ApiError::AuthenticationFailed)
        ));

        headers.insert("authorization", "Token abc".parse().unwrap());
        assert!(matches!(
            verify_manager_access(&headers, &state),
            Err(ApiError::InvalidToken)
        ));

        headers.insert("authorization", "Bearer wrong".parse().unwrap());
        assert!(matches!(
            verify_manager_access(&headers, &state),
            Err(ApiError::InvalidToken)
        ));

        headers.insert("authorization", format!("Bearer {TOKEN}").parse().unwrap());
        assert!(verify_manager_access(&headers, &state).is_ok());
    }

    #[tokio::test]
    async fn test_openapi_document_is_served() {
        let request = Request::get("/api-docs/openapi.json")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]["/manager/orders"].is_object());
        assert!(body["paths"]["/api/order"].is_object());
    }
}
