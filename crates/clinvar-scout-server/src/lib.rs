//! Serving layer for `clinvar-scout`: configuration, input validation,
//! and the axum REST router.

pub mod config;
pub mod rest;
pub mod validate;
