pub mod db;

pub mod coins;
pub mod holdings;
pub mod providers;
pub mod sync;

pub mod constants;
pub mod errors;
pub mod schema;

pub use errors::{Error, Result};
