//! Keyboard navigation for the file-tree panel.
//!
//! [`KeyNav`] is the listener the host feeds key events to. It decides
//! capture synchronously, queues captured keystrokes and dispatches them
//! one at a time from [`KeyNav::run_pending`].

pub mod actions;
pub mod dispatcher;
pub mod error;
pub mod gatekeeper;
pub mod help;
pub mod host;
pub mod scheduler;

#[cfg(test)]
pub mod fake;

use std::collections::VecDeque;
use std::time::Instant;

use crate::config::Settings;
use crate::keybindings::{parse_excluded_keys, CommandTable, KeyPress, Keystroke, BINDINGS};
use crate::utils::log::debug_log;

use dispatcher::{dispatch, DispatchContext};
use error::Result;
use host::{TreeHost, ViewType};
use scheduler::Scheduler;

/// Whether the host should still run its own handling for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Captured,
    Passed,
}

pub struct KeyNav {
    attached: bool,
    excluded: Vec<Keystroke>,
    table: CommandTable,
    settings: Settings,
    pending: VecDeque<Keystroke>,
    scheduler: Scheduler,
    last_error: Option<String>,
}

impl KeyNav {
    pub fn new(settings: Settings) -> Result<Self> {
        let excluded = parse_excluded_keys(&settings.excluded_keys)?;
        Ok(Self {
            attached: false,
            excluded,
            table: CommandTable::build(BINDINGS)?,
            settings,
            pending: VecDeque::new(),
            scheduler: Scheduler::new(),
            last_error: None,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[cfg(test)]
    pub fn excluded(&self) -> &[Keystroke] {
        &self.excluded
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Swap in new settings. On an unmappable excluded key the previous
    /// settings stay in effect.
    pub fn apply_settings(&mut self, settings: Settings) -> Result<()> {
        let excluded = parse_excluded_keys(&settings.excluded_keys)?;
        self.excluded = excluded;
        self.settings = settings;
        Ok(())
    }

    /// Attach while the panel is the active view, detach otherwise.
    pub fn on_active_view_changed(&mut self, view: Option<ViewType>) {
        let attach = view == Some(ViewType::FileExplorer);
        if attach != self.attached {
            debug_log(if attach { "listener attached" } else { "listener detached" });
        }
        self.attached = attach;
    }

    /// Decide capture. A captured keystroke is queued for
    /// [`KeyNav::run_pending`] and the host must skip its own handling.
    pub fn on_key_down<H: TreeHost>(&mut self, press: &KeyPress, host: &H) -> KeyOutcome {
        if !self.attached {
            return KeyOutcome::Passed;
        }
        if !gatekeeper::should_handle(press, &host.ambient_state(), &self.excluded) {
            return KeyOutcome::Passed;
        }
        self.pending.push_back(press.keystroke);
        KeyOutcome::Captured
    }

    #[cfg(test)]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Dispatch queued keystrokes in arrival order. Failures are logged and
    /// never stop the next keystroke.
    pub fn run_pending<H: TreeHost>(&mut self, host: &mut H, now: Instant) {
        while let Some(keystroke) = self.pending.pop_front() {
            let ctx = DispatchContext {
                table: &self.table,
                settings: &self.settings,
                excluded: &self.excluded,
                scheduler: &mut self.scheduler,
                now,
            };
            if let Err(e) = dispatch(keystroke, host, ctx) {
                debug_log(&format!("dispatch {} failed: {}", keystroke, e));
                self.last_error = Some(format!("{}: {}", keystroke, e));
            }
        }
    }

    pub fn tick<H: TreeHost>(&mut self, now: Instant, host: &mut H) {
        self.scheduler.tick(now, host);
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    pub fn take_last_error(&mut self) -> Option<String> {
        self.last_error.take()
    }
}
