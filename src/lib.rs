/*!
 * # wintrans - Sliding-window document translation with a language model
 *
 * A Rust library for translating long plain-text documents line by line
 * through an OpenAI-compatible chat endpoint.
 *
 * ## Features
 *
 * - Character-budgeted windows that never split a line
 * - Preceding translated pairs and following source lines as context
 * - A growing glossary of names and terms fed back into every prompt
 * - Line-aligned output with a fallback merge when counts disagree
 * - Checkpointing after every window; an interrupted run resumes in place
 * - Prompt-keyed response cache on disk
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `translation`: The translation engine:
 *   - `translation::chunk`: Window extraction
 *   - `translation::context`: Context assembly
 *   - `translation::glossary`: Term store
 *   - `translation::prompts`: Prompt construction
 *   - `translation::response`: Reply parsing
 *   - `translation::checkpoint`: Run state and artifacts
 *   - `translation::driver`: The window loop
 *   - `translation::cache`: Response caching
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `providers`: Language-model clients:
 *   - `providers::openai`: OpenAI-compatible API client
 *   - `providers::mock`: Scripted provider for tests
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod file_utils;
pub mod translation;
pub mod app_controller;
pub mod providers;
pub mod errors;

// Re-export main types for easier usage
pub use app_config::{Config, EmptyTranslationPolicy, TranslationConfig};
pub use translation::{CheckpointManager, RunState, RunSummary, TranslationDriver};
pub use providers::Provider;
pub use errors::{AppError, CheckpointError, ProviderError, TranslationError};
