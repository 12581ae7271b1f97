//! Address geocoding with a persistent coordinate cache, and geodesic
//! distances between cached coordinates.

use diesel_migrations::{embed_migrations, EmbeddedMigrations};

pub mod distance;
pub mod geocoder;
pub mod models;
pub mod resolver;
pub mod schema;
pub mod store;

pub use models::{Coordinates, Place};
pub use resolver::{CoordinateResolver, ResolveError};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");
