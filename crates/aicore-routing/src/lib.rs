//! AI-Core routing and facade
//!
//! This crate ties the adapters, the model registry and the settings store
//! together:
//! - Provider kinds and endpoint configuration
//! - Provider registry built once at startup
//! - Model-to-provider resolution (registry first, then id prefix)
//! - The `AiCore` facade consumed by applications

pub mod facade;
pub mod provider_config;
pub mod provider_registry;

// Re-export commonly used types
pub use facade::{AiCore, DEFAULT_APP_ID};
pub use provider_config::{EndpointConfig, ProviderKind};
pub use provider_registry::{ProviderRegistry, infer_provider};
