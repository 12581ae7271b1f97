use diesel::result::ConnectionResult;
use diesel_async::{AsyncConnection, AsyncPgConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations};

pub mod availability;
pub mod catalog;
pub mod command_handlers;
pub mod dashboard;
pub mod models;
pub mod ranking;
pub mod registration;
pub mod schema;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");

pub async fn establish_connection(database_url: &str) -> ConnectionResult<AsyncPgConnection> {
    AsyncPgConnection::establish(database_url).await
}
