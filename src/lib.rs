//! Agrimart - storefront and admin back-office server for an agricultural
//! goods retailer
//!
//! This library provides the public storefront API, the admin API, and the
//! bridge to the external AI content-generation Engine Hub.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod engine;
pub mod models;
pub mod services;
