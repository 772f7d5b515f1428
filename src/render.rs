//! Render glue between the engine, the evaluator and a host's display.
//!
//! Hosts consume exactly one [`RenderAction`] per scheduler tick instead of
//! juggling replace/append flags from many call sites.

use crate::pattern::Verdict;
use crate::tail::PollResult;

/// What the host should do with its rendered view this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderAction {
    NoAction,
    /// Feed only the newly appended lines through the filter and append
    /// the matches (`iterate_lines(restart=false)`).
    AppendLines,
    /// Discard the rendered view and counters and re-derive everything
    /// (`iterate_lines(restart=true)`).
    FullReplace,
}

/// View state that outlives a single tick: the root-pattern activity latch
/// and the "lines shown / lines total" counters.
#[derive(Debug)]
pub struct ViewState {
    root_active: bool,
    shown: usize,
    total: usize,
}

impl ViewState {
    pub fn new(root_active: bool) -> Self {
        Self {
            root_active,
            shown: 0,
            total: 0,
        }
    }

    /// Map a poll outcome to the action for this tick.
    pub fn on_poll_result(&mut self, result: PollResult) -> RenderAction {
        match result {
            PollResult::NoChange => RenderAction::NoAction,
            PollResult::Grow => RenderAction::AppendLines,
            PollResult::Replaced => RenderAction::FullReplace,
        }
    }

    /// Called after any pattern-tree edit with the root's enabled flag.
    ///
    /// While the root is inactive every line is visible regardless, so
    /// edits that leave it inactive trigger no re-filtering. The latch
    /// flips only on the root's enabled-state transition, never per line.
    pub fn on_pattern_toggled(&mut self, is_root_active: bool) -> RenderAction {
        let was_active = self.root_active;
        self.root_active = is_root_active;
        if !was_active && !is_root_active {
            RenderAction::NoAction
        } else {
            RenderAction::FullReplace
        }
    }

    /// Count one evaluated line; returns whether it is displayed.
    pub fn record(&mut self, verdict: Verdict) -> bool {
        self.total += 1;
        let visible = verdict.is_visible();
        if visible {
            self.shown += 1;
        }
        visible
    }

    /// Reset the counters before a full re-derivation.
    pub fn reset_counts(&mut self) {
        self.shown = 0;
        self.total = 0;
    }

    pub fn counts(&self) -> (usize, usize) {
        (self.shown, self.total)
    }

    /// Status-bar text: "shown / total lines".
    pub fn status(&self) -> String {
        format!("{} / {} lines", self.shown, self.total)
    }
}

/// Display row → source line index mapping.
///
/// Rebuilt from scratch on `FullReplace`, extended on `AppendLines`; lets a
/// host resolve a rendered row back to its line in the store.
#[derive(Debug, Default)]
pub struct DisplayMap {
    indices: Vec<usize>,
}

impl DisplayMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.indices.clear();
    }

    pub fn push(&mut self, source_index: usize) {
        self.indices.push(source_index);
    }

    /// Source line index for a display row.
    pub fn source_line(&self, row: usize) -> Option<usize> {
        self.indices.get(row).copied()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}
