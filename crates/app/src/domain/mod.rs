//! Vitrine Domain Concerns

pub mod carts;
pub mod drafts;
pub mod products;
