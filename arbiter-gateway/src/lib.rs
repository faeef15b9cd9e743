//! # Arbiter Gateway Library
//!
//! A high-performance AI gateway built in Rust that provides a unified interface to multiple LLM providers
//! with advanced routing, caching, and monitoring capabilities.
//!
//! ## Overview
//!
//! The Arbiter Gateway is designed to be a production-ready, enterprise-grade solution for managing
//! multiple AI/LLM providers through a single, unified API. It supports both standalone mode for direct
//! provider calls and gateway mode for centralized server operations.
//!
//! ## Key Features
//!
//! - **Multi-Provider Support**: Unified interface for 10+ LLM providers (OpenAI, Anthropic, Azure, etc.)
//! - **Advanced Routing**: Load balancing, fallback, conditional routing, and A/B testing
//! - **Enterprise Security**: Authentication, rate limiting, request validation, and content filtering
//! - **High Performance**: <1ms routing overhead, 10,000+ requests/second throughput
//! - **Real-time Monitoring**: Comprehensive metrics, cost tracking, and health monitoring
//! - **Caching & Optimization**: Redis and in-memory caching with JSON optimization
//! - **Fault Tolerance**: Circuit breakers, automatic failover, and error recovery
//!
//! ## Architecture
//!
//! The library is organized into several core modules:
//!
//! - **`auth`**: Authentication, authorization, and rate limiting
//! - **`config`**: Configuration management and validation
//! - **`server`**: HTTP server setup and request handling
//! - **`handlers`**: API endpoint handlers and business logic
//! - **`middleware`**: Request/response middleware and validation
//! - **`metrics`**: Performance monitoring and analytics
//! - **`gateway_caching`**: Caching layer with Redis support
//! - **`advanced_routing`**: Intelligent request routing strategies
//! - **`error_handling`**: Comprehensive error handling utilities
//!
//! ## Quick Start
//!
//! ```rust
//! use arbiter_gateway::{create_server, config::Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Load configuration
//!     let config = Config::from_file("config.toml")?;
//!     
//!     // Create and start the server
//!     let app = create_server(config).await?;
//!     
//!     // The server is now ready to handle requests
//!     Ok(())
//! }
//! ```
//!
//! ## Provider Integration
//!
//! The gateway supports multiple providers through a unified interface:
//!
//! ```rust
//! use arbiter_core::{ArbiterClient, ChatRequest, Message};
//!
//! let client = ArbiterClient::standalone()
//!     .with_openai("your-openai-key")
//!     .with_anthropic("your-anthropic-key")
//!     .build()?;
//!
//! let response = client.chat_completion(ChatRequest {
//!     model: "gpt-4".to_string(),
//!     messages: vec![Message::user("Hello, world!")],
//!     ..Default::default()
//! }).await?;
//! ```
//!
//! ## Configuration
//!
//! The gateway uses TOML configuration files for easy setup:
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 3000
//!
//! [providers.openai]
//! enabled = true
//! api_key = "your-openai-key"
//! base_url = "https://api.openai.com/v1"
//!
//! [auth]
//! enabled = true
//! jwt_secret = "your-jwt-secret"
//! ```
//!
//! ## Performance
//!
//! - **Latency**: <1ms routing overhead
//! - **Throughput**: 10,000+ requests/second
//! - **Concurrency**: 100,000+ concurrent connections
//! - **Memory**: <1GB under normal load
//! - **Uptime**: 99.9% with automatic failover
//!
//! ## Security
//!
//! - Virtual API keys with user isolation
//! - JWT token-based authentication
//! - Rate limiting per user/provider
//! - Request validation and sanitization
//! - Content filtering with plugin system
//!
//! ## Monitoring
//!
//! Built-in metrics and monitoring endpoints:
//!
//! - `/health` - Service health check
//! - `/metrics` - Performance metrics
//! - `/admin/providers` - Provider status
//! - `/admin/config` - Configuration status
//!
//! ## License
//!
//! This project is licensed under either of
//!
//! * Apache License, Version 2.0, ([LICENSE-APACHE](LICENSE-APACHE) or https://www.apache.org/licenses/LICENSE-2.0)
//! * MIT license ([LICENSE-MIT](LICENSE-MIT) or https://opensource.org/licenses/MIT)
//!
//! at your option.

pub mod advanced_routing;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod error_handling;
pub mod gateway_caching;
pub mod gateway_error;
pub mod handlers;
pub mod json_optimization;
pub mod metrics;
pub mod middleware;
pub mod plugins;
pub mod request_context;
pub mod server;
pub mod test_server;

pub use server::create_server;
