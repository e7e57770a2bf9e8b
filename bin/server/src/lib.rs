//! carnaval marketplace web server.
//!
//! This crate provides the HTTP surface of the marketplace: the
//! authorization gate in front of every route, the auth endpoints, the
//! vendor application endpoints, and the page-context fallback.

pub mod app;
pub mod auth;
pub mod config;
pub mod pages;
pub mod vendor;
