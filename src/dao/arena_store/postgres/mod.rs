mod config;
mod connection;
mod error;
mod schema;
mod store;

pub use config::PostgresConfig;
pub use error::PostgresDaoError;
pub use store::PostgresArenaStore;
