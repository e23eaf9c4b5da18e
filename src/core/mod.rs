//! Core library modules
//!
//! This module contains configuration, constants, logging, the llama.cpp
//! client, the provider registry, and provider implementations.

pub mod client;
pub mod config;
pub mod constants;
pub mod logging;
pub mod provider;
pub mod providers;
pub mod registry;
pub mod schema;
