//! HTTP API: read-only catalog endpoints over the shop's categories,
//! products and articles.

pub mod app;
pub mod middleware;
