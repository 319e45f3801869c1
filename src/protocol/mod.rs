//! Protocol table for the web frontend: constants, index paths and models.

pub mod constants;
mod models;
mod path;

pub use models::Model;
pub use path::{get_array, get_i64, get_nested, get_non_empty_str, get_str};
