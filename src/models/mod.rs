//! Data models
//!
//! Wire types for the OpenAI-compatible llama.cpp API, inference types
//! exchanged with the extraction framework, and extraction examples.

pub mod extraction;
pub mod inference;
pub mod openai;
