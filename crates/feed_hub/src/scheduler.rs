//! Broadcast timer state machine.
//!
//! The scheduler does not know what a tick does; the hub hands it a closure
//! that spawns the ticker task. It only guarantees that at most one such
//! task exists at a time.

use tokio::task::JoinHandle;

/// Timer state
#[derive(Debug, Default)]
pub enum SchedulerState {
    /// No timer
    #[default]
    Stopped,
    /// Timer task alive
    Running {
        /// Handle of the ticker task
        handle: JoinHandle<()>,
    },
}

/// `{Stopped, Running}` machine guarding the ticker task.
#[derive(Debug, Default)]
pub struct Scheduler {
    state: SchedulerState,
    starts: u64,
}

impl Scheduler {
    /// Stopped scheduler
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the ticker if it is not already running.
    ///
    /// Returns `true` when a new task was spawned.
    pub fn start<F>(&mut self, spawn: F) -> bool
    where
        F: FnOnce() -> JoinHandle<()>,
    {
        if let SchedulerState::Running { handle } = &self.state {
            if !handle.is_finished() {
                return false;
            }
        }
        self.state = SchedulerState::Running { handle: spawn() };
        self.starts += 1;
        true
    }

    /// Stop the ticker. Returns `true` if it was running.
    pub fn stop(&mut self) -> bool {
        match std::mem::take(&mut self.state) {
            SchedulerState::Running { handle } => {
                handle.abort();
                true
            }
            SchedulerState::Stopped => false,
        }
    }

    /// Stop when nothing is subscribed any more.
    pub fn maybe_stop(&mut self, index_is_empty: bool) -> bool {
        index_is_empty && self.stop()
    }

    /// Whether a ticker task is alive
    pub fn is_running(&self) -> bool {
        matches!(&self.state, SchedulerState::Running { handle } if !handle.is_finished())
    }

    /// Number of times a ticker task has been spawned
    pub fn starts(&self) -> u64 {
        self.starts
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
