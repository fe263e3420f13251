//! Vitrine application services: product store and media host seams, draft
//! editing sessions and cart rendering.

pub mod config;
pub mod context;
pub mod domain;
pub mod media_host;
pub mod observability;
pub mod store;

#[cfg(test)]
mod test;
