//! Cookbook: recipe, ingredient, step and technique CRUD over SQLite with a
//! mirrored search index, shared by the `cookbook` CLI and `cookbook-server`.

pub mod config;
pub mod db;
pub mod search;
pub mod server;
pub mod service;

pub use config::Config;
pub use service::{EntityService, ServiceError, Services};
