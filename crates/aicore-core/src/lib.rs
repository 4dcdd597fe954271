//! AI-Core Types and Traits
//!
//! This crate provides the fundamental types and traits shared by every
//! AI-Core crate:
//! - Normalised request/response types
//! - Provider trait abstraction and API-key handling
//! - Response normaliser for each vendor's wire format
//! - Model registry with capabilities and pricing
//! - Persisted settings and usage statistics types
//! - Key-value persistence port
//! - Core error types

pub mod error;
pub mod kv_store;
pub mod normalized;
pub mod normaliser;
pub mod provider;
pub mod registry;
pub mod settings;
pub mod stats;

pub use error::{Error, ErrorKind, Result};
