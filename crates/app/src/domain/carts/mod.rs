//! Carts

pub mod errors;
mod storage;
pub mod service;

pub use errors::CartsServiceError;
pub use service::*;
pub use storage::{CartStorage, InMemoryCartStorage, MockCartStorage};
