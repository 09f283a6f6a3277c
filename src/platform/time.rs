//! Scheduled tasks
//!
//! The game has two kinds of timed work: the one-second elapsed-time tick and
//! the one-shot "hide mines again" after a reveal. Both are requested through
//! `Scheduler` and come back as `Fired` records that the session dispatches,
//! so the session never holds a callback into itself.

/// Identifies one scheduled task. Handles are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(u64);

/// What a scheduled task does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Add one second to the run's elapsed time
    TimerTick,
    /// End a reveal
    HideHazards,
}

/// A task that came due
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    pub handle: TaskHandle,
    pub task: Task,
}

/// Source of repeating and one-shot tasks
pub trait Scheduler {
    /// Fire `task` every `period_ms` until cancelled
    fn every(&mut self, period_ms: u32, task: Task) -> TaskHandle;

    /// Fire `task` once after `delay_ms`
    fn after(&mut self, delay_ms: u32, task: Task) -> TaskHandle;

    /// Stop a task. Unknown or already-finished handles are ignored.
    fn cancel(&mut self, handle: TaskHandle);

    /// Take everything that fired since the last call, in firing order
    fn drain_fired(&mut self) -> Vec<Fired>;
}

#[derive(Debug, Clone)]
struct ManualEntry {
    handle: TaskHandle,
    task: Task,
    due_ms: u64,
    period_ms: Option<u64>,
}

/// Deterministic scheduler driven by explicit `advance` calls
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    now_ms: u64,
    next_id: u64,
    entries: Vec<ManualEntry>,
    fired: Vec<Fired>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of scheduled tasks (repeating or pending one-shot)
    pub fn active(&self) -> usize {
        self.entries.len()
    }

    /// Number of scheduled tasks of one kind
    pub fn active_of(&self, task: Task) -> usize {
        self.entries.iter().filter(|e| e.task == task).count()
    }

    /// Move the clock forward, firing everything that comes due in order
    pub fn advance(&mut self, ms: u64) {
        let target = self.now_ms + ms;
        loop {
            let next = self
                .entries
                .iter()
                .enumerate()
                .filter(|(_, e)| e.due_ms <= target)
                .min_by_key(|(_, e)| (e.due_ms, e.handle))
                .map(|(i, _)| i);
            let Some(i) = next else { break };

            let entry = &mut self.entries[i];
            self.now_ms = entry.due_ms;
            self.fired.push(Fired {
                handle: entry.handle,
                task: entry.task,
            });
            let period = entry.period_ms;
            match period {
                Some(period) => self.entries[i].due_ms += period,
                None => {
                    self.entries.remove(i);
                }
            }
        }
        self.now_ms = target;
    }

    fn push(&mut self, delay_ms: u32, period_ms: Option<u64>, task: Task) -> TaskHandle {
        self.next_id += 1;
        let handle = TaskHandle(self.next_id);
        self.entries.push(ManualEntry {
            handle,
            task,
            due_ms: self.now_ms + delay_ms as u64,
            period_ms,
        });
        handle
    }
}

impl Scheduler for ManualScheduler {
    fn every(&mut self, period_ms: u32, task: Task) -> TaskHandle {
        let period = period_ms.max(1);
        self.push(period, Some(period as u64), task)
    }

    fn after(&mut self, delay_ms: u32, task: Task) -> TaskHandle {
        self.push(delay_ms, None, task)
    }

    fn cancel(&mut self, handle: TaskHandle) {
        self.entries.retain(|e| e.handle != handle);
    }

    fn drain_fired(&mut self) -> Vec<Fired> {
        std::mem::take(&mut self.fired)
    }
}

#[cfg(target_arch = "wasm32")]
mod browser {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    use wasm_bindgen::JsCast;
    use wasm_bindgen::closure::Closure;

    use super::{Fired, Scheduler, Task, TaskHandle};

    struct LiveTask {
        browser_id: i32,
        repeating: bool,
        // Keeps the JS callback alive for as long as the task is scheduled
        _callback: Closure<dyn FnMut()>,
    }

    /// `setInterval`/`setTimeout` backed scheduler.
    ///
    /// Callbacks only queue a `Fired` record; the frame loop drains the queue.
    #[derive(Default)]
    pub struct BrowserScheduler {
        next_id: u64,
        queue: Rc<RefCell<Vec<Fired>>>,
        live: HashMap<TaskHandle, LiveTask>,
    }

    impl BrowserScheduler {
        pub fn new() -> Self {
            Self::default()
        }

        fn schedule(&mut self, ms: u32, task: Task, repeating: bool) -> TaskHandle {
            self.next_id += 1;
            let handle = TaskHandle(self.next_id);

            let queue = self.queue.clone();
            let callback = Closure::<dyn FnMut()>::new(move || {
                queue.borrow_mut().push(Fired { handle, task });
            });

            let Some(window) = web_sys::window() else {
                log::warn!("No window; {:?} will never fire", task);
                return handle;
            };
            let f = callback.as_ref().unchecked_ref();
            let id = if repeating {
                window.set_interval_with_callback_and_timeout_and_arguments_0(f, ms as i32)
            } else {
                window.set_timeout_with_callback_and_timeout_and_arguments_0(f, ms as i32)
            };

            match id {
                Ok(browser_id) => {
                    self.live.insert(
                        handle,
                        LiveTask {
                            browser_id,
                            repeating,
                            _callback: callback,
                        },
                    );
                }
                Err(e) => log::warn!("Failed to schedule {:?}: {:?}", task, e),
            }
            handle
        }
    }

    impl Scheduler for BrowserScheduler {
        fn every(&mut self, period_ms: u32, task: Task) -> TaskHandle {
            self.schedule(period_ms, task, true)
        }

        fn after(&mut self, delay_ms: u32, task: Task) -> TaskHandle {
            self.schedule(delay_ms, task, false)
        }

        fn cancel(&mut self, handle: TaskHandle) {
            let Some(live) = self.live.remove(&handle) else {
                return;
            };
            if let Some(window) = web_sys::window() {
                if live.repeating {
                    window.clear_interval_with_handle(live.browser_id);
                } else {
                    window.clear_timeout_with_handle(live.browser_id);
                }
            }
        }

        fn drain_fired(&mut self) -> Vec<Fired> {
            let fired = std::mem::take(&mut *self.queue.borrow_mut());
            // One-shot callbacks are done once they have fired
            for f in &fired {
                if self.live.get(&f.handle).is_some_and(|t| !t.repeating) {
                    self.live.remove(&f.handle);
                }
            }
            fired
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use browser::BrowserScheduler;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeating_fires_each_period() {
        let mut sched = ManualScheduler::new();
        let h = sched.every(1000, Task::TimerTick);
        sched.advance(999);
        assert!(sched.drain_fired().is_empty());
        sched.advance(1);
        assert_eq!(
            sched.drain_fired(),
            vec![Fired {
                handle: h,
                task: Task::TimerTick
            }]
        );
        sched.advance(3000);
        assert_eq!(sched.drain_fired().len(), 3);
    }

    #[test]
    fn test_one_shot_fires_once() {
        let mut sched = ManualScheduler::new();
        sched.after(1000, Task::HideHazards);
        sched.advance(5000);
        assert_eq!(sched.drain_fired().len(), 1);
        assert_eq!(sched.active(), 0);
    }

    #[test]
    fn test_cancel_stops_task() {
        let mut sched = ManualScheduler::new();
        let h = sched.every(1000, Task::TimerTick);
        sched.advance(1000);
        sched.cancel(h);
        sched.advance(5000);
        assert_eq!(sched.drain_fired().len(), 1);
        assert_eq!(sched.active_of(Task::TimerTick), 0);
    }

    #[test]
    fn test_fires_in_time_order() {
        let mut sched = ManualScheduler::new();
        let tick = sched.every(1000, Task::TimerTick);
        sched.advance(500);
        let hide = sched.after(1000, Task::HideHazards);
        sched.advance(1500);
        let order: Vec<TaskHandle> = sched.drain_fired().iter().map(|f| f.handle).collect();
        // tick@1000, hide@1500, tick@2000
        assert_eq!(order, vec![tick, hide, tick]);
    }
}
