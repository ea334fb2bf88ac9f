//! AI Engine Hub bridge
//!
//! The storefront never talks to a model directly; an external Engine Hub
//! does the generation and this module is the HTTP bridge to it, plus the
//! product-generation pipeline built on top.

pub mod client;
pub mod product_gen;

pub use client::{EngineClient, EngineError, GeneratedContent, GeneratedImage};
pub use product_gen::{GeneratedProduct, ProductGenerator, QcReport, QcStatus};
