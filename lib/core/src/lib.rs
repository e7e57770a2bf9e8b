//! Core types and utilities for the carnaval access gate.
//!
//! This crate provides the error-handling foundation and the identifier
//! types shared by the platform-access library and the server.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ApplicationId, ParseIdError, UserId};
