//! Model registry
//!
//! Single source of truth mapping a model id to its provider, capabilities and
//! pricing. The registry is seeded with a static catalogue at construction and
//! accepts runtime registrations (last write wins).

mod seed;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

/// Kind of model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelType {
    Chat,
    Completion,
    Image,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelCapabilities {
    pub max_tokens: u32,
    pub supports_images: bool,
    pub supports_functions: bool,
    pub supports_streaming: bool,
    pub context_window: u32,
}

/// Linear per-1000-token pricing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelPricing {
    pub input_cost_per_1k_tokens: f64,
    pub output_cost_per_1k_tokens: f64,
    pub currency: String,
}

impl ModelPricing {
    pub fn usd(input_cost_per_1k_tokens: f64, output_cost_per_1k_tokens: f64) -> Self {
        Self {
            input_cost_per_1k_tokens,
            output_cost_per_1k_tokens,
            currency: "USD".to_string(),
        }
    }
}

/// Catalogue entry for one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    /// Unique model id
    pub id: String,

    /// Owning provider name
    pub provider: String,

    /// Human-readable name
    pub name: String,

    pub description: String,

    #[serde(rename = "type")]
    pub model_type: ModelType,

    pub capabilities: ModelCapabilities,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricing: Option<ModelPricing>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<NaiveDate>,
}

/// Thread-safe model catalogue
#[derive(Debug)]
pub struct ModelRegistry {
    models: RwLock<BTreeMap<String, ModelInfo>>,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelRegistry {
    /// Registry seeded with the built-in catalogue
    pub fn new() -> Self {
        let registry = Self::empty();
        for model in seed::catalogue() {
            registry.register_model(model);
        }
        registry
    }

    /// Registry with no models
    pub fn empty() -> Self {
        Self {
            models: RwLock::new(BTreeMap::new()),
        }
    }

    /// Insert or replace a model by id
    pub fn register_model(&self, info: ModelInfo) {
        self.models
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(info.id.clone(), info);
    }

    pub fn get_model(&self, model_id: &str) -> Option<ModelInfo> {
        self.read(|models| models.get(model_id).cloned())
    }

    pub fn model_exists(&self, model_id: &str) -> bool {
        self.read(|models| models.contains_key(model_id))
    }

    /// Provider recorded for a model id
    pub fn get_provider(&self, model_id: &str) -> Option<String> {
        self.read(|models| models.get(model_id).map(|m| m.provider.clone()))
    }

    /// Every registered model, ordered by id
    pub fn get_all_models(&self) -> Vec<ModelInfo> {
        self.read(|models| models.values().cloned().collect())
    }

    /// Models of one provider, newest release first
    pub fn get_models_by_provider(&self, provider: &str) -> Vec<ModelInfo> {
        self.filtered(|m| m.provider == provider)
    }

    /// Models of one type, newest release first
    pub fn get_models_by_type(&self, model_type: ModelType) -> Vec<ModelInfo> {
        self.filtered(|m| m.model_type == model_type)
    }

    pub fn get_capabilities(&self, model_id: &str) -> Option<ModelCapabilities> {
        self.read(|models| models.get(model_id).map(|m| m.capabilities.clone()))
    }

    pub fn is_image_model(&self, model_id: &str) -> bool {
        self.read(|models| {
            models
                .get(model_id)
                .is_some_and(|m| m.model_type == ModelType::Image)
        })
    }

    /// Cost of a request in the model's pricing currency.
    ///
    /// Returns 0 for unregistered models and models without pricing.
    pub fn calculate_cost(&self, model_id: &str, input_tokens: u32, output_tokens: u32) -> f64 {
        self.read(|models| {
            models
                .get(model_id)
                .and_then(|m| m.pricing.as_ref())
                .map(|p| {
                    (f64::from(input_tokens) / 1000.0) * p.input_cost_per_1k_tokens
                        + (f64::from(output_tokens) / 1000.0) * p.output_cost_per_1k_tokens
                })
                .unwrap_or(0.0)
        })
    }

    pub fn len(&self) -> usize {
        self.read(BTreeMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read<T>(&self, f: impl FnOnce(&BTreeMap<String, ModelInfo>) -> T) -> T {
        f(&self.models.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn filtered(&self, predicate: impl Fn(&ModelInfo) -> bool) -> Vec<ModelInfo> {
        let mut models: Vec<ModelInfo> = self.read(|models| {
            models
                .values()
                .filter(|m| predicate(m))
                .cloned()
                .collect()
        });
        models.sort_by(by_release_date);
        models
    }
}

/// Dated models first (newest to oldest), then undated models by name
fn by_release_date(a: &ModelInfo, b: &ModelInfo) -> Ordering {
    match (a.release_date, b.release_date) {
        (Some(a_date), Some(b_date)) => b_date.cmp(&a_date),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.name.cmp(&b.name),
    }
}
