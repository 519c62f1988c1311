use serde::Serialize;

/// BPE encodings the estimator knows how to load.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    Cl100kBase,
    O200kBase,
}

impl Encoding {
    pub fn name(self) -> &'static str {
        match self {
            Self::Cl100kBase => "cl100k_base",
            Self::O200kBase => "o200k_base",
        }
    }
}

/// Information about a model's tokenizer and context limits.
#[derive(Clone, Debug, Serialize)]
pub struct ModelInfo {
    pub name: &'static str,
    pub display_name: &'static str,
    pub context_window: usize,
    pub max_output: usize,
    pub encoding: Encoding,
}

pub static GPT_3_5_TURBO: ModelInfo = ModelInfo {
    name: "gpt-3.5-turbo",
    display_name: "GPT-3.5 Turbo",
    context_window: 16_385,
    max_output: 4_096,
    encoding: Encoding::Cl100kBase,
};

pub static GPT_3_5_TURBO_16K: ModelInfo = ModelInfo {
    name: "gpt-3.5-turbo-16k",
    display_name: "GPT-3.5 Turbo 16k",
    context_window: 16_385,
    max_output: 4_096,
    encoding: Encoding::Cl100kBase,
};

pub static GPT_4: ModelInfo = ModelInfo {
    name: "gpt-4",
    display_name: "GPT-4",
    context_window: 8_192,
    max_output: 8_192,
    encoding: Encoding::Cl100kBase,
};

pub static GPT_4_32K: ModelInfo = ModelInfo {
    name: "gpt-4-32k",
    display_name: "GPT-4 32k",
    context_window: 32_768,
    max_output: 8_192,
    encoding: Encoding::Cl100kBase,
};

pub static GPT_4_TURBO: ModelInfo = ModelInfo {
    name: "gpt-4-turbo",
    display_name: "GPT-4 Turbo",
    context_window: 128_000,
    max_output: 4_096,
    encoding: Encoding::Cl100kBase,
};

pub static GPT_4O: ModelInfo = ModelInfo {
    name: "gpt-4o",
    display_name: "GPT-4o",
    context_window: 128_000,
    max_output: 16_384,
    encoding: Encoding::O200kBase,
};

pub static GPT_4O_MINI: ModelInfo = ModelInfo {
    name: "gpt-4o-mini",
    display_name: "GPT-4o mini",
    context_window: 128_000,
    max_output: 16_384,
    encoding: Encoding::O200kBase,
};

pub static GPT_4_1: ModelInfo = ModelInfo {
    name: "gpt-4.1",
    display_name: "GPT-4.1",
    context_window: 1_047_576,
    max_output: 32_768,
    encoding: Encoding::O200kBase,
};

pub static GPT_4_1_MINI: ModelInfo = ModelInfo {
    name: "gpt-4.1-mini",
    display_name: "GPT-4.1 mini",
    context_window: 1_047_576,
    max_output: 32_768,
    encoding: Encoding::O200kBase,
};

static ALL_MODELS: &[&ModelInfo] = &[
    &GPT_3_5_TURBO,
    &GPT_3_5_TURBO_16K,
    &GPT_4,
    &GPT_4_32K,
    &GPT_4_TURBO,
    &GPT_4O,
    &GPT_4O_MINI,
    &GPT_4_1,
    &GPT_4_1_MINI,
];

/// Look up a model by id.
///
/// Dated snapshot ids (`gpt-4o-2024-08-06`) resolve to the registered model
/// with the longest name that prefixes the id at a `-` boundary.
pub fn find_model(name: &str) -> Option<&'static ModelInfo> {
    if let Some(exact) = ALL_MODELS.iter().find(|m| m.name == name) {
        return Some(exact);
    }

    ALL_MODELS
        .iter()
        .filter(|m| {
            name.strip_prefix(m.name)
                .is_some_and(|rest| rest.starts_with('-'))
        })
        .max_by_key(|m| m.name.len())
        .copied()
}

pub fn default_model() -> &'static ModelInfo {
    &GPT_4O_MINI
}

pub fn all_models() -> &'static [&'static ModelInfo] {
    ALL_MODELS
}
