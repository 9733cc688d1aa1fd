//! Helpers for tests that run against a real SQLite database.
mod catalog;
mod fake_gateway;
mod prepare_env;

pub use catalog::{age_order, deactivate_variant, seed_item, seed_product, seed_variant, set_stock, stock_of};
pub use fake_gateway::FakeGateway;
pub use prepare_env::{create_database, fresh_database, prepare_test_env, random_db_path, run_migrations};
