use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use starburger_foodcart::{
    catalog::{AvailabilityMatrix, AvailableProduct, Banner},
    dashboard::OrderCard,
    models::{Order, OrderStatus, PaymentMethod, Product, Restaurant},
    ranking::Candidate,
    registration::{OrderLine, RegisterOrder, RegisteredOrder},
};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct BannerResponse {
    pub title: String,
    /// Image URL
    pub src: String,
    pub text: String,
}

impl From<Banner> for BannerResponse {
    fn from(banner: Banner) -> Self {
        Self {
            title: banner.title,
            src: banner.src,
            text: banner.text,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    /// Price (as string)
    pub price: String,
    pub special_status: bool,
    pub description: String,
    pub category: Option<CategoryResponse>,
    pub image: String,
}

impl From<AvailableProduct> for ProductResponse {
    fn from(available: AvailableProduct) -> Self {
        let product = available.product;
        Self {
            id: product.id,
            name: product.name,
            price: product.price.to_string(),
            special_status: product.special_status,
            description: product.description,
            category: available.category.map(|category| CategoryResponse {
                id: category.id,
                name: category.name,
            }),
            image: product.image,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderLineRequest {
    /// Product ID
    pub product: Uuid,
    pub quantity: i32,
}

/// Missing fields are reported together with the other validation errors.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct RegisterOrderRequest {
    pub products: Vec<OrderLineRequest>,
    pub firstname: String,
    pub lastname: String,
    /// Phone number, normalized to E.164 on success
    pub phonenumber: String,
    pub address: String,
}

impl From<RegisterOrderRequest> for RegisterOrder {
    fn from(request: RegisterOrderRequest) -> Self {
        Self {
            products: request
                .products
                .into_iter()
                .map(|line| OrderLine {
                    product: line.product,
                    quantity: line.quantity,
                })
                .collect(),
            firstname: request.firstname,
            lastname: request.lastname,
            phonenumber: request.phonenumber,
            address: request.address,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterOrderResponse {
    /// Unique identifier of the new order
    pub id: Uuid,
    pub products: Vec<OrderLineRequest>,
    pub firstname: String,
    pub lastname: String,
    pub phonenumber: String,
    pub address: String,
}

impl From<RegisteredOrder> for RegisterOrderResponse {
    fn from(order: RegisteredOrder) -> Self {
        Self {
            id: order.id,
            products: order
                .products
                .into_iter()
                .map(|line| OrderLineRequest {
                    product: line.product,
                    quantity: line.quantity,
                })
                .collect(),
            firstname: order.firstname,
            lastname: order.lastname,
            phonenumber: order.phonenumber,
            address: order.address,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatusDto {
    NotProcessed,
    InProcess,
    InDelivery,
    Processed,
}

impl From<OrderStatus> for OrderStatusDto {
    fn from(s: OrderStatus) -> Self {
        match s {
            OrderStatus::NotProcessed => OrderStatusDto::NotProcessed,
            OrderStatus::InProcess => OrderStatusDto::InProcess,
            OrderStatus::InDelivery => OrderStatusDto::InDelivery,
            OrderStatus::Processed => OrderStatusDto::Processed,
        }
    }
}

impl From<OrderStatusDto> for OrderStatus {
    fn from(s: OrderStatusDto) -> Self {
        match s {
            OrderStatusDto::NotProcessed => OrderStatus::NotProcessed,
            OrderStatusDto::InProcess => OrderStatus::InProcess,
            OrderStatusDto::InDelivery => OrderStatus::InDelivery,
            OrderStatusDto::Processed => OrderStatus::Processed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethodDto {
    Cash,
    Card,
}

impl From<PaymentMethod> for PaymentMethodDto {
    fn from(p: PaymentMethod) -> Self {
        match p {
            PaymentMethod::Cash => PaymentMethodDto::Cash,
            PaymentMethod::Card => PaymentMethodDto::Card,
        }
    }
}

impl From<PaymentMethodDto> for PaymentMethod {
    fn from(p: PaymentMethodDto) -> Self {
        match p {
            PaymentMethodDto::Cash => PaymentMethod::Cash,
            PaymentMethodDto::Card => PaymentMethod::Card,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateOrderRequest {
    pub status: Option<OrderStatusDto>,
    pub payment_method: Option<PaymentMethodDto>,
    /// Restaurant chosen to cook the order
    pub cooking_restaurant_id: Option<Uuid>,
    pub comment: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub status: OrderStatusDto,
    pub payment_method: PaymentMethodDto,
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

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            status: order.status.into(),
            payment_method: order.payment_method.into(),
            cooking_restaurant_id: order.cooking_restaurant_id,
            firstname: order.firstname,
            lastname: order.lastname,
            phonenumber: order.phonenumber,
            address: order.address,
            comment: order.comment,
            registered_at: order.registered_at,
            called_at: order.called_at,
            delivered_at: order.delivered_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RestaurantResponse {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub contact_phone: String,
}

impl From<Restaurant> for RestaurantResponse {
    fn from(restaurant: Restaurant) -> Self {
        Self {
            id: restaurant.id,
            name: restaurant.name,
            address: restaurant.address,
            contact_phone: restaurant.contact_phone,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RestaurantRef {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CandidateResponse {
    pub restaurant: RestaurantRef,
    /// Geodesic distance to the delivery address, rounded to 2 decimals
    pub distance_km: f64,
}

impl From<Candidate> for CandidateResponse {
    fn from(candidate: Candidate) -> Self {
        Self {
            restaurant: RestaurantRef {
                id: candidate.restaurant_id,
                name: candidate.restaurant_name,
            },
            distance_km: candidate.distance_km,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardOrderResponse {
    pub id: Uuid,
    pub status: OrderStatusDto,
    pub payment_method: PaymentMethodDto,
    /// Order total at snapshot prices (as string)
    pub amount: String,
    pub firstname: String,
    pub lastname: String,
    pub phonenumber: String,
    pub address: String,
    pub comment: String,
    pub cooking_restaurant: Option<RestaurantResponse>,
    /// False when the delivery address could not be geocoded
    pub address_valid: bool,
    /// Restaurants able to cook the whole order, by name
    pub eligible_restaurants: Vec<RestaurantResponse>,
    /// Eligible restaurants by distance, nearest first
    pub candidates: Vec<CandidateResponse>,
}

impl From<OrderCard> for DashboardOrderResponse {
    fn from(card: OrderCard) -> Self {
        let order = card.order;
        Self {
            id: order.id,
            status: order.status.into(),
            payment_method: order.payment_method.into(),
            amount: card.amount.to_string(),
            firstname: order.firstname,
            lastname: order.lastname,
            phonenumber: order.phonenumber,
            address: order.address,
            comment: order.comment,
            cooking_restaurant: card.cooking_restaurant.map(Into::into),
            address_valid: card.ranking.address_valid,
            eligible_restaurants: card
                .eligible_restaurants
                .into_iter()
                .map(Into::into)
                .collect(),
            candidates: card.ranking.candidates.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductSummary {
    pub id: Uuid,
    pub name: String,
    pub price: String,
    pub image: String,
}

impl From<Product> for ProductSummary {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            price: product.price.to_string(),
            image: product.image,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductAvailabilityResponse {
    pub product: ProductSummary,
    /// One flag per restaurant, in the order of `restaurants`
    pub availability: Vec<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AvailabilityMatrixResponse {
    pub restaurants: Vec<RestaurantResponse>,
    pub products: Vec<ProductAvailabilityResponse>,
}

impl From<AvailabilityMatrix> for AvailabilityMatrixResponse {
    fn from(matrix: AvailabilityMatrix) -> Self {
        Self {
            restaurants: matrix.restaurants.into_iter().map(Into::into).collect(),
            products: matrix
                .products
                .into_iter()
                .map(|row| ProductAvailabilityResponse {
                    product: row.product.into(),
                    availability: row.availability,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiErrorResponse {
    /// Error message
    pub error: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ValidationErrorResponse {
    /// Error message
    pub error: String,
    /// Messages per invalid field
    pub fields: BTreeMap<String, Vec<String>>,
}
