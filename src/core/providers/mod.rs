//! Provider implementations

pub mod llamacpp;

pub use llamacpp::LlamaCppProvider;
