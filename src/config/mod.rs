//! Configuration module for Pensum.
//!
//! Handles loading and managing application settings.

mod settings;

pub use settings::{
    EmbeddingSettings, GeneralSettings, GenerationSettings, SearchSettings, SessionSettings,
    Settings, VectorStoreSettings,
};
