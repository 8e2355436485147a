/*!
 * Sliding-window translation engine.
 *
 * The engine turns a list of source lines into translated pairs, one window
 * at a time, keeping terminology consistent through a growing term store.
 * It is split into several submodules:
 *
 * - `chunk`: Window extraction under a character budget
 * - `context`: Preceding and following context around a window
 * - `glossary`: Terms and the insertion-ordered term store
 * - `prompts`: Prompt construction
 * - `response`: Parsing of the model's structured reply
 * - `checkpoint`: Run state and its JSON artifacts
 * - `driver`: The window loop tying everything together
 * - `cache`: Prompt-keyed response cache for any provider
 */

// Re-export main types for easier usage
pub use self::cache::{CacheStats, CachedProvider};
pub use self::checkpoint::{CheckpointManager, Pairing, RunState, TranslatedPair};
pub use self::chunk::extract_chunk;
pub use self::context::{ContextAssembler, WindowContext};
pub use self::driver::{RunSummary, TranslationDriver, WindowOutcome, WindowStage};
pub use self::glossary::{SubstringMatcher, Term, TermMatcher, TermStore};
pub use self::prompts::TranslationPromptBuilder;
pub use self::response::ParsedResponse;

// Submodules
pub mod cache;
pub mod checkpoint;
pub mod chunk;
pub mod context;
pub mod driver;
pub mod glossary;
pub mod prompts;
pub mod response;
