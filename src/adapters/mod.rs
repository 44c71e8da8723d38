// Adapters layer: concrete implementations of the domain ports (generation backends, storage)

pub mod llm;
pub mod storage;

pub use llm::{ChatCompletionsBackend, OllamaBackend, ProviderPreset};
pub use storage::LocalStorage;
