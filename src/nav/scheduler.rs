//! Fixed-delay follow-ups that the event loop fires on its next tick.
//!
//! Tasks cannot be cancelled; each one re-checks the host state when it
//! fires instead.

use std::time::{Duration, Instant};

use crate::utils::log::debug_log;

use super::host::{LeafId, NodeId, TreeHost, ViewType};

/// Delay before refocusing after a delete, so the host has applied it.
pub const REFOCUS_DELAY: Duration = Duration::from_millis(70);

/// How long an already-open tab header stays highlighted.
pub const TAB_FLASH_DURATION: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeferredTask {
    Refocus(NodeId),
    ClearTabHighlight(LeafId),
}

#[derive(Debug, Default)]
pub struct Scheduler {
    queue: Vec<(Instant, DeferredTask)>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, now: Instant, delay: Duration, task: DeferredTask) {
        self.queue.push((now + delay, task));
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue.iter().map(|(at, _)| *at).min()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Run every task due at `now`, earliest first.
    pub fn tick<H: TreeHost>(&mut self, now: Instant, host: &mut H) {
        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.queue.drain(..).partition(|(at, _)| *at <= now);
        self.queue = pending;
        due.sort_by_key(|(at, _)| *at);

        for (_, task) in due {
            run_task(task, host);
        }
    }
}

fn run_task<H: TreeHost>(task: DeferredTask, host: &mut H) {
    match task {
        DeferredTask::Refocus(target) => {
            // Focus may have moved into an editor while the delete settled.
            if host.active_view_type() != Some(ViewType::FileExplorer) {
                debug_log(&format!("refocus skipped, panel lost focus: {}", target.path().display()));
                return;
            }
            if host.node(&target).is_none() {
                debug_log(&format!("refocus skipped, node gone: {}", target.path().display()));
                return;
            }
            host.set_focused_node(Some(target));
        }
        DeferredTask::ClearTabHighlight(leaf) => host.set_tab_highlight(leaf, false),
    }
}
