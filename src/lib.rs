pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod docs;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod models;
pub mod notify;
pub mod policy;
pub mod routes;
pub mod store;
pub mod utils;
