//! Constants for roles, environment variables, and provider defaults

/// Message role constants
pub mod role {
    /// User role identifier
    pub const USER: &str = "user";

    /// System role identifier
    pub const SYSTEM: &str = "system";
}

/// Environment variable names
pub mod env {
    /// Bearer token presented to the llama.cpp server
    pub const API_KEY: &str = "LLAMACPP_API_KEY";

    /// Base URL of the llama.cpp OpenAI-compatible API
    pub const API_BASE: &str = "LLAMACPP_API_BASE";

    /// Path to the TOML configuration file
    pub const CONFIG_PATH: &str = "CONFIG_PATH";

    /// Log level override
    pub const LOG_LEVEL: &str = "LOG_LEVEL";
}

/// Provider defaults
pub mod defaults {
    /// llama.cpp ignores the key unless started with `--api-key`
    pub const API_KEY: &str = "EMPTY";

    /// llama-server default listen address
    pub const BASE_URL: &str = "http://127.0.0.1:8080";

    pub const TEMPERATURE: f32 = 0.6;

    pub const MAX_TOKENS: u32 = 32768;

    /// Request timeout in seconds
    pub const REQUEST_TIMEOUT: u64 = 120;

    pub const MAX_WORKERS: usize = 1;

    pub const CONFIG_FILE: &str = "config.toml";

    pub const LOG_LEVEL: &str = "info";

    pub const ATTRIBUTE_SUFFIX: &str = "_attributes";
}

/// Registry identity of the built-in provider
pub mod provider {
    pub const NAME: &str = "llamacpp";

    pub const ALIAS: &str = "llama.cpp";

    /// Display name used in errors and logs
    pub const DISPLAY_NAME: &str = "llama.cpp";

    /// Model IDs routed to llama.cpp
    pub const MODEL_PATTERN: &str = "^llama";

    pub const PRIORITY: i32 = 10;
}
