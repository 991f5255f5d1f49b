//! Excerpt derivation state machine.

use std::path::Path;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::metrics;

use super::config::ExcerptConfig;
use super::error::ExcerptError;
use super::traits::MediaTool;
use super::types::{
    classify_duration, Excerpt, ExcerptOutcome, ExcerptReport, ExcerptState, ExcerptWindow,
};

/// Probes a source and, when it is long enough, cuts an excerpt from it.
pub struct ExcerptEngine {
    tool: Arc<dyn MediaTool>,
    window: ExcerptWindow,
    min_source_secs: u64,
}

impl ExcerptEngine {
    pub fn new(tool: Arc<dyn MediaTool>, config: &ExcerptConfig) -> Self {
        Self {
            tool,
            window: ExcerptWindow::new(config.start_offset_secs, config.duration_secs),
            min_source_secs: config.min_source_secs,
        }
    }

    pub fn window(&self) -> ExcerptWindow {
        self.window
    }

    /// Run the state machine for `source`, writing the excerpt to `output`.
    ///
    /// Never fails: every problem ends in a terminal state whose outcome is
    /// carried in the report.
    pub async fn derive(&self, source: &Path, output: &Path) -> ExcerptReport {
        let mut state = ExcerptState::Probing;
        info!(source = %source.display(), "Probing source duration");

        let duration = match self.tool.probe_duration(source).await {
            Ok(d) => d,
            Err(e) => {
                state = advance(state, ExcerptState::ProbeFailed);
                error!(source = %source.display(), kind = %e.kind(), "Probe failed: {}", e);
                return finish(state, None, None, Some(e));
            }
        };

        state = advance(state, classify_duration(duration, self.min_source_secs));
        if state == ExcerptState::TooShort {
            warn!(
                source = %source.display(),
                duration_secs = duration as u64,
                min_secs = self.min_source_secs,
                "Source too short for an excerpt, ignoring"
            );
            return finish(state, Some(duration), None, None);
        }

        info!(
            source = %source.display(),
            duration_secs = duration as u64,
            start_secs = self.window.start_offset_secs,
            length_secs = self.window.duration_secs,
            "Source eligible, trimming"
        );

        match self.tool.trim(source, output, self.window).await {
            Ok(()) => {
                state = advance(state, ExcerptState::Trimmed);
                let excerpt = Excerpt {
                    path: output.to_path_buf(),
                    start_offset_secs: self.window.start_offset_secs,
                    duration_secs: self.window.duration_secs,
                };
                finish(state, Some(duration), Some(excerpt), None)
            }
            Err(e) => {
                state = advance(state, ExcerptState::TrimFailed);
                error!(
                    source = %source.display(),
                    kind = %e.kind(),
                    stderr = e.stderr().unwrap_or(""),
                    "Trim failed: {}",
                    e
                );
                finish(state, Some(duration), None, Some(e))
            }
        }
    }
}

fn advance(from: ExcerptState, to: ExcerptState) -> ExcerptState {
    debug_assert!(from.can_transition_to(to), "invalid transition {} -> {}", from, to);
    to
}

fn finish(
    state: ExcerptState,
    source_duration_secs: Option<f64>,
    excerpt: Option<Excerpt>,
    err: Option<ExcerptError>,
) -> ExcerptReport {
    // Only terminal states reach here.
    let outcome = state.outcome().unwrap_or(ExcerptOutcome::Error);
    metrics::EXCERPTS.with_label_values(&[outcome.as_str()]).inc();

    ExcerptReport {
        state,
        outcome,
        source_duration_secs,
        excerpt,
        error_kind: err.as_ref().map(|e| e.kind()),
        error: err.map(|e| e.to_string()),
    }
}
