/// Database layer
///
/// - `pool`: PostgreSQL connection pool with a startup health check
/// - `migrations`: embedded sqlx migrations
///
/// Models live in the `models` module at crate root.

pub mod migrations;
pub mod pool;
