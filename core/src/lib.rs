mod auth;
mod entries;
pub mod error;
mod foods;
pub mod models;
mod nutrition;
pub mod service;
pub mod store;

pub use error::{Error, Result, StoreError};
pub use service::Tracker;
