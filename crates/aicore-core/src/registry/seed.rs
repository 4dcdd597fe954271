//! Built-in model catalogue. Prices are hand-entered and go stale as vendors
//! ship new models; the live fetch path in the egress crate covers the gap.

use super::{ModelCapabilities, ModelInfo, ModelPricing, ModelType};
use chrono::NaiveDate;

struct Seed {
    id: &'static str,
    provider: &'static str,
    name: &'static str,
    description: &'static str,
    model_type: ModelType,
    // max_tokens, images, functions, streaming, context_window
    caps: (u32, bool, bool, bool, u32),
    // input, output per 1k tokens (USD)
    price: (f64, f64),
    released: (i32, u32, u32),
}

const CHAT: ModelType = ModelType::Chat;
const IMAGE: ModelType = ModelType::Image;

#[rustfmt::skip]
const SEEDS: &[Seed] = &[
    // OpenAI GPT-5
    Seed { id: "gpt-5", provider: "openai", name: "GPT-5", description: "Latest GPT-5 model with advanced reasoning", model_type: CHAT, caps: (16384, true, true, true, 256_000), price: (0.01, 0.03), released: (2025, 8, 7) },
    Seed { id: "gpt-5-pro", provider: "openai", name: "GPT-5 Pro", description: "Most capable GPT-5 model", model_type: CHAT, caps: (32768, true, true, true, 512_000), price: (0.02, 0.06), released: (2025, 10, 6) },
    Seed { id: "gpt-5-mini", provider: "openai", name: "GPT-5 Mini", description: "Efficient GPT-5 model", model_type: CHAT, caps: (16384, true, true, true, 256_000), price: (0.002, 0.008), released: (2025, 8, 7) },
    Seed { id: "gpt-5-nano", provider: "openai", name: "GPT-5 Nano", description: "Smallest GPT-5 model", model_type: CHAT, caps: (8192, false, true, true, 128_000), price: (0.001, 0.004), released: (2025, 8, 7) },
    // OpenAI o-series
    Seed { id: "o3", provider: "openai", name: "O3", description: "Advanced reasoning model", model_type: CHAT, caps: (100_000, false, false, true, 200_000), price: (0.015, 0.06), released: (2025, 4, 16) },
    Seed { id: "o3-pro", provider: "openai", name: "O3 Pro", description: "Most capable O3 reasoning model", model_type: CHAT, caps: (100_000, false, false, true, 200_000), price: (0.03, 0.12), released: (2025, 4, 16) },
    Seed { id: "o3-mini", provider: "openai", name: "O3 Mini", description: "Efficient reasoning model", model_type: CHAT, caps: (65536, false, false, true, 200_000), price: (0.003, 0.012), released: (2025, 1, 31) },
    Seed { id: "o4-mini", provider: "openai", name: "O4 Mini", description: "Next-gen efficient reasoning model", model_type: CHAT, caps: (65536, false, false, true, 200_000), price: (0.003, 0.012), released: (2025, 6, 1) },
    // OpenAI GPT-4.x
    Seed { id: "gpt-4.1", provider: "openai", name: "GPT-4.1", description: "Enhanced GPT-4 model", model_type: CHAT, caps: (16384, true, true, true, 256_000), price: (0.008, 0.024), released: (2025, 4, 14) },
    Seed { id: "gpt-4.1-mini", provider: "openai", name: "GPT-4.1 Mini", description: "Efficient GPT-4.1 model", model_type: CHAT, caps: (16384, true, true, true, 128_000), price: (0.004, 0.012), released: (2025, 4, 14) },
    Seed { id: "gpt-4o", provider: "openai", name: "GPT-4o", description: "Most capable GPT-4 model with vision", model_type: CHAT, caps: (16384, true, true, true, 128_000), price: (0.005, 0.015), released: (2024, 5, 13) },
    Seed { id: "gpt-4o-mini", provider: "openai", name: "GPT-4o Mini", description: "Affordable and intelligent small model", model_type: CHAT, caps: (16384, true, true, true, 128_000), price: (0.00015, 0.0006), released: (2024, 7, 18) },
    Seed { id: "chatgpt-4o-latest", provider: "openai", name: "ChatGPT-4o Latest", description: "Latest ChatGPT-4o model", model_type: CHAT, caps: (16384, true, true, true, 128_000), price: (0.005, 0.015), released: (2024, 11, 20) },
    Seed { id: "o1", provider: "openai", name: "O1", description: "Reasoning model with extended thinking", model_type: CHAT, caps: (100_000, false, false, true, 200_000), price: (0.015, 0.06), released: (2024, 12, 17) },
    Seed { id: "o1-mini", provider: "openai", name: "O1 Mini", description: "Efficient reasoning model", model_type: CHAT, caps: (65536, false, false, true, 128_000), price: (0.003, 0.012), released: (2024, 9, 12) },
    Seed { id: "gpt-3.5-turbo", provider: "openai", name: "GPT-3.5 Turbo", description: "Fast and affordable model", model_type: CHAT, caps: (4096, false, true, true, 16385), price: (0.0005, 0.0015), released: (2023, 3, 1) },
    // Anthropic
    Seed { id: "claude-sonnet-4-5-20250929", provider: "anthropic", name: "Claude Sonnet 4.5", description: "Latest Claude model with enhanced capabilities", model_type: CHAT, caps: (8192, true, true, true, 200_000), price: (0.003, 0.015), released: (2025, 9, 29) },
    Seed { id: "claude-sonnet-4-20250514", provider: "anthropic", name: "Claude Sonnet 4", description: "Advanced Claude model", model_type: CHAT, caps: (8192, true, true, true, 200_000), price: (0.003, 0.015), released: (2024, 10, 22) },
    Seed { id: "claude-opus-4-20250514", provider: "anthropic", name: "Claude Opus 4", description: "Powerful Claude model", model_type: CHAT, caps: (8192, true, true, true, 200_000), price: (0.015, 0.075), released: (2024, 10, 22) },
    Seed { id: "claude-opus-4-1-20250805", provider: "anthropic", name: "Claude Opus 4.1", description: "Enhanced Claude Opus model", model_type: CHAT, caps: (8192, true, true, true, 200_000), price: (0.015, 0.075), released: (2025, 8, 5) },
    Seed { id: "claude-3-7-sonnet-20250219", provider: "anthropic", name: "Claude 3.7 Sonnet", description: "Advanced Claude 3.7 model", model_type: CHAT, caps: (8192, true, true, true, 200_000), price: (0.003, 0.015), released: (2025, 2, 19) },
    Seed { id: "claude-3-5-haiku-20241022", provider: "anthropic", name: "Claude 3.5 Haiku", description: "Fast and efficient Claude model", model_type: CHAT, caps: (8192, false, true, true, 200_000), price: (0.001, 0.005), released: (2024, 10, 22) },
    Seed { id: "claude-3-haiku-20240307", provider: "anthropic", name: "Claude 3 Haiku", description: "Fastest Claude 3 model", model_type: CHAT, caps: (4096, false, true, true, 200_000), price: (0.00025, 0.00125), released: (2024, 3, 7) },
    // Gemini 2.5
    Seed { id: "gemini-2.5-flash", provider: "gemini", name: "Gemini 2.5 Flash", description: "Latest Gemini text model", model_type: CHAT, caps: (8192, true, true, true, 1_000_000), price: (0.0, 0.0), released: (2025, 9, 1) },
    Seed { id: "gemini-2.5-pro", provider: "gemini", name: "Gemini 2.5 Pro", description: "Most capable Gemini 2.5 model", model_type: CHAT, caps: (8192, true, true, true, 2_000_000), price: (0.00125, 0.005), released: (2025, 9, 1) },
    Seed { id: "gemini-2.5-flash-lite", provider: "gemini", name: "Gemini 2.5 Flash Lite", description: "Lightweight Gemini 2.5 model", model_type: CHAT, caps: (8192, false, true, true, 1_000_000), price: (0.0, 0.0), released: (2025, 9, 1) },
    // Image models
    Seed { id: "gpt-image-1", provider: "openai", name: "GPT Image 1", description: "Primary OpenAI multimodal image model for generation, editing, and variations", model_type: IMAGE, caps: (0, true, false, false, 0), price: (0.04, 0.0), released: (2025, 1, 1) },
    Seed { id: "dall-e-3", provider: "openai", name: "DALL-E 3", description: "Advanced OpenAI image generation model (legacy)", model_type: IMAGE, caps: (0, false, false, false, 0), price: (0.04, 0.0), released: (2023, 11, 1) },
    Seed { id: "dall-e-2", provider: "openai", name: "DALL-E 2", description: "OpenAI image generation model (legacy)", model_type: IMAGE, caps: (0, false, false, false, 0), price: (0.02, 0.0), released: (2022, 11, 1) },
    Seed { id: "gemini-2.5-flash-image", provider: "gemini", name: "Gemini 2.5 Flash Image", description: "Gemini model for image generation", model_type: IMAGE, caps: (8192, true, false, false, 1_000_000), price: (0.0, 0.0), released: (2025, 9, 1) },
    Seed { id: "gemini-2.5-flash-image-preview", provider: "gemini", name: "Gemini 2.5 Flash Image (Preview)", description: "Preview version of Gemini image generation", model_type: IMAGE, caps: (8192, true, false, false, 1_000_000), price: (0.0, 0.0), released: (2025, 9, 1) },
    // Gemini 2.0 / 1.5
    Seed { id: "gemini-2.0-flash-exp", provider: "gemini", name: "Gemini 2.0 Flash", description: "Fast and efficient Gemini model", model_type: CHAT, caps: (8192, true, true, true, 1_000_000), price: (0.0, 0.0), released: (2024, 12, 11) },
    Seed { id: "gemini-1.5-pro", provider: "gemini", name: "Gemini 1.5 Pro", description: "Advanced Gemini model with 2M context", model_type: CHAT, caps: (8192, true, true, true, 2_000_000), price: (0.00125, 0.005), released: (2024, 5, 14) },
    Seed { id: "gemini-1.5-flash", provider: "gemini", name: "Gemini 1.5 Flash", description: "Fast and efficient Gemini model", model_type: CHAT, caps: (8192, true, true, true, 1_000_000), price: (0.000075, 0.0003), released: (2024, 5, 14) },
];

pub(super) fn catalogue() -> impl Iterator<Item = ModelInfo> {
    SEEDS.iter().map(|seed| {
        let (max_tokens, supports_images, supports_functions, supports_streaming, context_window) =
            seed.caps;
        let (year, month, day) = seed.released;

        ModelInfo {
            id: seed.id.to_string(),
            provider: seed.provider.to_string(),
            name: seed.name.to_string(),
            description: seed.description.to_string(),
            model_type: seed.model_type,
            capabilities: ModelCapabilities {
                max_tokens,
                supports_images,
                supports_functions,
                supports_streaming,
                context_window,
            },
            pricing: Some(ModelPricing::usd(seed.price.0, seed.price.1)),
            deprecated: None,
            release_date: NaiveDate::from_ymd_opt(year, month, day),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalogue_ids_unique_and_dated() {
        let models: Vec<ModelInfo> = catalogue().collect();
        let ids: HashSet<&str> = models.iter().map(|m| m.id.as_str()).collect();

        assert_eq!(ids.len(), models.len());
        assert!(models.iter().all(|m| m.release_date.is_some()));
    }

    #[test]
    fn test_catalogue_covers_every_provider() {
        let providers: HashSet<String> = catalogue().map(|m| m.provider).collect();
        for provider in ["openai", "anthropic", "gemini"] {
            assert!(providers.contains(provider), "missing {provider}");
        }
    }
}
