use std::collections::HashSet;

use bigdecimal::{BigDecimal, Zero};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::{
    models::{ItemInOrder, Product, ProductCategory, Restaurant, RestaurantMenuItem},
    schema::{product_categories, products, restaurant_menu_items, restaurants},
};

#[derive(Debug, Clone, PartialEq)]
pub struct AvailableProduct {
    pub product: Product,
    pub category: Option<ProductCategory>,
}

/// Products sold by at least one restaurant, by name.
pub async fn available_products(
    conn: &mut AsyncPgConnection,
) -> Result<Vec<AvailableProduct>, diesel::result::Error> {
    let sold = restaurant_menu_items::table
        .filter(restaurant_menu_items::availability.eq(true))
        .select(restaurant_menu_items::product_id);

    let rows = products::table
        .left_join(product_categories::table)
        .filter(products::id.eq_any(sold))
        .order((products::name.asc(), products::id.asc()))
        .select((
            Product::as_select(),
            Option::<ProductCategory>::as_select(),
        ))
        .load::<(Product, Option<ProductCategory>)>(conn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(product, category)| AvailableProduct { product, category })
        .collect())
}

pub async fn list_restaurants(
    conn: &mut AsyncPgConnection,
) -> Result<Vec<Restaurant>, diesel::result::Error> {
    restaurants::table
        .order((restaurants::name.asc(), restaurants::id.asc()))
        .select(Restaurant::as_select())
        .load(conn)
        .await
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductAvailability {
    pub product: Product,
    /// Aligned with [`AvailabilityMatrix::restaurants`].
    pub availability: Vec<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AvailabilityMatrix {
    pub restaurants: Vec<Restaurant>,
    pub products: Vec<ProductAvailability>,
}

impl AvailabilityMatrix {
    /// A restaurant without a menu item for a product does not sell it.
    pub fn build(
        restaurants: Vec<Restaurant>,
        products: Vec<Product>,
        menu_items: &[RestaurantMenuItem],
    ) -> Self {
        let available = menu_items
            .iter()
            .filter(|item| item.availability)
            .map(|item| (item.product_id, item.restaurant_id))
            .collect::<HashSet<(Uuid, Uuid)>>();

        let products = products
            .into_iter()
            .map(|product| {
                let availability = restaurants
                    .iter()
                    .map(|restaurant| available.contains(&(product.id, restaurant.id)))
                    .collect();
                ProductAvailability {
                    product,
                    availability,
                }
            })
            .collect();

        Self {
            restaurants,
            products,
        }
    }
}

pub async fn availability_matrix(
    conn: &mut AsyncPgConnection,
) -> Result<AvailabilityMatrix, diesel::result::Error> {
    let restaurants = list_restaurants(conn).await?;
    let products = products::table
        .order((products::name.asc(), products::id.asc()))
        .select(Product::as_select())
        .load(conn)
        .await?;
    let menu_items = restaurant_menu_items::table
        .select(RestaurantMenuItem::as_select())
        .load(conn)
        .await?;
    Ok(AvailabilityMatrix::build(restaurants, products, &menu_items))
}

#[derive(Debug, Clone, PartialEq)]
pub struct Banner {
    pub title: String,
    pub src: String,
    pub text: String,
}

const BANNERS: [(&str, &str, &str); 3] = [
    ("Burger", "burger.jpg", "Tasty Burger at your door step"),
    ("Spices", "food.jpg", "All Cuisines"),
    (
        "New York",
        "tasty.jpg",
        "Food is incomplete without a tasty dessert",
    ),
];

pub fn banners(static_url: &str) -> Vec<Banner> {
    let prefix = static_url.trim_end_matches('/');
    BANNERS
        .iter()
        .map(|(title, file, text)| Banner {
            title: title.to_string(),
            src: format!("{prefix}/{file}"),
            text: text.to_string(),
        })
        .collect()
}

/// Total of an order at its snapshot prices.
pub fn order_amount<'a>(items: impl IntoIterator<Item = &'a ItemInOrder>) -> BigDecimal {
    items
        .into_iter()
        .fold(BigDecimal::zero(), |total, item| {
            total + &item.price * BigDecimal::from(item.quantity)
        })
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn restaurant(name: &str) -> Restaurant {
        Restaurant {
            id: Uuid::new_v4(),
            name: name.to_string(),
            address: String::new(),
            contact_phone: String::new(),
        }
    }

    fn product(name: &str, price: &str) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: name.to_string(),
            category_id: None,
            price: BigDecimal::from_str(price).unwrap(),
            image: format!("{name}.png"),
            special_status: false,
            description: String::new(),
        }
    }

    fn menu_item(restaurant: &Restaurant, product: &Product, availability: bool) -> RestaurantMenuItem {
        RestaurantMenuItem {
            id: Uuid::new_v4(),
            restaurant_id: restaurant.id,
            product_id: product.id,
            availability,
        }
    }

    #[test]
    fn test_matrix_rows_align_with_restaurants() {
        let first = restaurant("A");
        let second = restaurant("B");
        let burger = product("Burger", "300");
        let fries = product("Fries", "120");
        let items = vec![
            menu_item(&first, &burger, true),
            menu_item(&second, &burger, false),
            menu_item(&second, &fries, true),
        ];

        let matrix = AvailabilityMatrix::build(
            vec![first, second],
            vec![burger.clone(), fries.clone()],
            &items,
        );

        assert_eq!(matrix.products[0].product, burger);
        assert_eq!(matrix.products[0].availability, vec![true, false]);
        assert_eq!(matrix.products[1].product, fries);
        assert_eq!(matrix.products[1].availability, vec![false, true]);
    }

    #[test]
    fn test_banners_use_static_prefix() {
        let list = banners("/static/");
        assert_eq!(list.len(), 3);
        assert_eq!(list[0].title, "Burger");
        assert_eq!(list[0].src, "/static/burger.jpg");

        let list = banners("https://cdn.example.com/assets");
        assert_eq!(list[2].src, "https://cdn.example.com/assets/tasty.jpg");
    }

    #[test]
    fn test_order_amount_uses_snapshot_prices() {
        let order_id = Uuid::new_v4();
        let line = |quantity: i32, price: &str| ItemInOrder {
            id: Uuid::new_v4(),
            order_id,
            product_id: Uuid::new_v4(),
            quantity,
            price: BigDecimal::from_str(price).unwrap(),
        };
        let items = vec![line(2, "150.50"), line(1, "99.00")];

        assert_eq!(order_amount(&items), BigDecimal::from_str("400.00").unwrap());
        assert_eq!(order_amount(&[]), BigDecimal::zero());
    }
}
