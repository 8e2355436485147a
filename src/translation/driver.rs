/*!
 * The window-by-window translation loop.
 *
 * Each iteration takes the next window, builds its context and prompt,
 * asks the provider, parses the reply, merges new terms, pairs the lines,
 * and persists the full state before moving on. Windows are strictly
 * sequential: every prompt depends on the pairs and terms produced by the
 * windows before it.
 */

use indicatif::ProgressBar;
use log::{debug, info, trace, warn};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::app_config::{EmptyTranslationPolicy, TranslationConfig};
use crate::errors::TranslationError;
use crate::providers::Provider;
use crate::translation::checkpoint::{CheckpointManager, Pairing, RunState};
use crate::translation::chunk::extract_chunk;
use crate::translation::context::ContextAssembler;
use crate::translation::prompts::TranslationPromptBuilder;
use crate::translation::response::ParsedResponse;

/// Progress of a single window through the loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowStage {
    Pending,
    Windowed,
    Contexted,
    Prompted,
    Responded,
    Parsed,
    Merged,
    Persisted,
}

impl fmt::Display for WindowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Windowed => "windowed",
            Self::Contexted => "contexted",
            Self::Prompted => "prompted",
            Self::Responded => "responded",
            Self::Parsed => "parsed",
            Self::Merged => "merged",
            Self::Persisted => "persisted",
        };
        f.write_str(name)
    }
}

/// Result of translating one window
#[derive(Debug, Clone, PartialEq)]
pub struct WindowOutcome {
    /// First line of the window
    pub start_idx: usize,
    /// Line just past the window
    pub next_idx: usize,
    /// How the reply was paired with the source
    pub pairing: Pairing,
    /// Terms newly added to the store
    pub terms_added: usize,
    /// Provider requests made for this window
    pub attempts: u32,
    /// Whether the window was committed without any translated text
    pub empty: bool,
}

/// What a call to `run` accomplished
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub total_lines: usize,
    pub resumed_from: usize,
    pub windows: usize,
    pub lines_translated: usize,
    pub fallback_merges: usize,
    pub empty_windows: usize,
    pub terms_added: usize,
}

/// Drives a whole document through the provider, one window at a time
#[derive(Debug)]
pub struct TranslationDriver<P> {
    config: TranslationConfig,
    provider: P,
    checkpoint: CheckpointManager,
    assembler: ContextAssembler,
    empty_policy: EmptyTranslationPolicy,
    max_attempts: u32,
    cancel: Option<Arc<AtomicBool>>,
    progress: ProgressBar,
}

impl<P: Provider> TranslationDriver<P> {
    pub fn new(config: TranslationConfig, provider: P, checkpoint: CheckpointManager) -> Self {
        let assembler = ContextAssembler::new(config.context_before, config.context_after);
        Self {
            config,
            provider,
            checkpoint,
            assembler,
            empty_policy: EmptyTranslationPolicy::default(),
            max_attempts: 3,
            cancel: None,
            progress: ProgressBar::hidden(),
        }
    }

    /// Set how replies without a translation are handled
    pub fn with_empty_translation_policy(mut self, policy: EmptyTranslationPolicy, max_attempts: u32) -> Self {
        self.empty_policy = policy;
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Stop between windows once the flag is raised
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Report progress in source lines
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Translate `lines`, resuming from whatever the checkpoint artifacts hold
    pub async fn run(&self, lines: &[String]) -> Result<RunSummary, TranslationError> {
        let mut state = self.checkpoint.load()?;
        let resumed_from = state.validate_against(lines)?;

        if resumed_from > 0 {
            info!(
                "Resuming at line {} of {} ({} pairs, {} terms on record)",
                resumed_from + 1,
                lines.len(),
                state.pairs.len(),
                state.terms.len()
            );
        }

        self.run_with_state(lines, &mut state).await
    }

    /// Translate the lines not yet covered by `state`
    pub async fn run_with_state(&self, lines: &[String], state: &mut RunState) -> Result<RunSummary, TranslationError> {
        let mut current_idx = state.resume_index();
        let mut summary = RunSummary {
            total_lines: lines.len(),
            resumed_from: current_idx,
            ..Default::default()
        };

        self.progress.set_length(lines.len() as u64);
        self.progress.set_position(current_idx.min(lines.len()) as u64);

        while current_idx < lines.len() {
            if self.is_cancelled() {
                self.progress.abandon();
                return Err(TranslationError::Cancelled(current_idx));
            }

            let outcome = self.translate_window(lines, state, current_idx).await?;

            summary.windows += 1;
            summary.lines_translated += outcome.next_idx - outcome.start_idx;
            summary.terms_added += outcome.terms_added;
            if outcome.pairing == Pairing::Merged {
                summary.fallback_merges += 1;
            }
            if outcome.empty {
                summary.empty_windows += 1;
            }

            current_idx = outcome.next_idx;
            self.progress.set_position(current_idx as u64);
        }

        self.progress.finish_and_clear();
        Ok(summary)
    }

    /// Translate the window starting at `current_idx` and persist the result
    pub async fn translate_window(
        &self,
        lines: &[String],
        state: &mut RunState,
        current_idx: usize,
    ) -> Result<WindowOutcome, TranslationError> {
        let mut stage = WindowStage::Pending;
        trace!("Window at line {}: {}", current_idx, stage);

        let (next_idx, window) = extract_chunk(lines, self.config.window_size, current_idx);
        stage = WindowStage::Windowed;
        trace!("Window at line {}: {} ({} lines)", current_idx, stage, window.len());

        // Blank lines have nothing to translate
        if window.iter().all(|line| line.is_empty()) {
            let pairing = state.commit_window(window, window);
            self.checkpoint.save(state)?;
            trace!("Window at line {}: {} (blank)", current_idx, WindowStage::Persisted);
            return Ok(WindowOutcome {
                start_idx: current_idx,
                next_idx,
                pairing,
                terms_added: 0,
                attempts: 0,
                empty: false,
            });
        }

        let prompt = {
            let context = self.assembler.assemble(lines, &state.pairs, current_idx, window);
            stage = WindowStage::Contexted;
            trace!("Window at line {}: {}", current_idx, stage);

            TranslationPromptBuilder::new(&self.config.source_language, &self.config.target_language)
                .with_glossary(state.terms.lookup(window))
                .with_context(&context)
                .with_window(window)
                .build()
        };
        stage = WindowStage::Prompted;
        trace!("Window at line {}: {}", current_idx, stage);
        debug!("Prompt for lines {}-{}:\n{}", current_idx + 1, next_idx, prompt);

        let (parsed, attempts) = self.request_translation(&prompt, current_idx).await?;
        let empty = parsed.lines.is_empty();

        let terms_added = state.terms.merge(parsed.terms);
        let pairing = state.commit_window(window, &parsed.lines);
        stage = WindowStage::Merged;
        trace!("Window at line {}: {}", current_idx, stage);

        if pairing == Pairing::Merged {
            warn!(
                "Lines {}-{}: {} source lines but {} translated, storing the window as one pair",
                current_idx + 1,
                next_idx,
                window.len(),
                parsed.lines.len()
            );
        }

        self.checkpoint.save(state)?;
        stage = WindowStage::Persisted;
        trace!("Window at line {}: {}", current_idx, stage);

        info!(
            "Translated lines {}-{} of {}{}",
            current_idx + 1,
            next_idx,
            lines.len(),
            if terms_added > 0 {
                format!(", {} new term(s)", terms_added)
            } else {
                String::new()
            }
        );

        Ok(WindowOutcome {
            start_idx: current_idx,
            next_idx,
            pairing,
            terms_added,
            attempts,
            empty,
        })
    }

    /// Ask for a translation, applying the empty-translation policy
    async fn request_translation(&self, prompt: &str, start_line: usize) -> Result<(ParsedResponse, u32), TranslationError> {
        let mut attempts = 0;

        loop {
            attempts += 1;
            let reply = self.provider.generate(prompt).await?;
            trace!("Window at line {}: {}", start_line, WindowStage::Responded);
            debug!("Reply for window at line {}:\n{}", start_line + 1, reply);

            let parsed = ParsedResponse::parse(&reply);
            trace!("Window at line {}: {}", start_line, WindowStage::Parsed);
            if !parsed.lines.is_empty() {
                return Ok((parsed, attempts));
            }

            match self.empty_policy {
                EmptyTranslationPolicy::CommitEmpty => {
                    warn!(
                        "Reply for window at line {} has no translation, committing it with an empty target",
                        start_line + 1
                    );
                    return Ok((parsed, attempts));
                }
                EmptyTranslationPolicy::Retry if attempts < self.max_attempts => {
                    warn!(
                        "Reply for window at line {} has no translation, retrying ({}/{})",
                        start_line + 1,
                        attempts + 1,
                        self.max_attempts
                    );
                    self.provider.invalidate(prompt).await;
                }
                EmptyTranslationPolicy::Retry | EmptyTranslationPolicy::Abort => {
                    // Keep a rerun from replaying the same cached reply
                    self.provider.invalidate(prompt).await;
                    return Err(TranslationError::EmptyTranslation { start_line, attempts });
                }
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }
}
