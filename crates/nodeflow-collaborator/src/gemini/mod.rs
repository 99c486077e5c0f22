//! Google Gemini / Imagen collaborator.

mod client;
mod types;

pub use client::{GeminiClient, GeminiConfig};
