// src/lib.rs

//! Headless storefront order gateway.
//!
//! Initiates checkouts against the commerce platform, reconciles order
//! status from provider webhooks, and answers order status queries. The
//! binary in `main.rs` wires this up behind an Actix server; integration
//! tests build the same `App` directly.

pub mod config;
pub mod errors;
pub mod models;
pub mod services;
pub mod signature;
pub mod state;
pub mod store;
pub mod web;
