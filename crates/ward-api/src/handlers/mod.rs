//! API request handlers.

pub mod health;
pub mod sessions;
pub mod speech;

pub use health::*;
pub use sessions::*;
pub use speech::*;
