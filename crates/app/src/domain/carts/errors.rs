//! Carts service errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CartsServiceError {
    #[error("cart not found")]
    NotFound,
}
