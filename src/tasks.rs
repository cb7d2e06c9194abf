//! Cross-thread command channel into the frame thread.
//!
//! Producers append one-shot tasks or register named repeating tasks under
//! a short mutex; the frame thread drains once per tick. The accumulated
//! one-shot batch is swapped out under the lock and executed lock-free, so
//! a running task can enqueue more work (it lands in the next frame) and
//! producers are never blocked behind task execution.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::error;

use crate::registry::WindowRegistry;
use crate::toolkit::Toolkit;

pub type OnceTask = Box<dyn FnOnce(&mut WindowRegistry, &mut dyn Toolkit) + Send>;
pub type RepeatingTask = Arc<dyn Fn(&mut WindowRegistry, &mut dyn Toolkit) + Send + Sync>;

#[derive(Default)]
struct Inner {
    once: Vec<OnceTask>,
    /// Insertion order of first registration; at most one entry per name.
    repeating: Vec<(String, RepeatingTask)>,
}

#[derive(Default)]
pub struct DeferredTaskQueue {
    inner: Mutex<Inner>,
}

impl DeferredTaskQueue {
    pub fn new() -> Self { Self::default() }

    /// Any thread. Runs once during the next drain, in FIFO order.
    pub fn enqueue_once(
        &self,
        task: impl FnOnce(&mut WindowRegistry, &mut dyn Toolkit) + Send + 'static,
    ) {
        self.inner.lock().once.push(Box::new(task));
    }

    /// Any thread. `Some` replaces the task registered under `name`
    /// (keeping its slot in the execution order); `None` removes it. An
    /// execution already snapshot for the current frame still runs.
    pub fn set_repeating(&self, name: &str, task: Option<RepeatingTask>) {
        let mut inner = self.inner.lock();
        let existing = inner.repeating.iter().position(|(n, _)| n == name);
        match (existing, task) {
            (Some(pos), Some(task)) => inner.repeating[pos].1 = task,
            (Some(pos), None) => {
                inner.repeating.remove(pos);
            }
            (None, Some(task)) => inner.repeating.push((name.to_owned(), task)),
            (None, None) => {}
        }
    }

    pub fn repeating_count(&self) -> usize { self.inner.lock().repeating.len() }

    /// Frame thread, once per tick, before anything is rendered. Runs all
    /// pending one-shots in FIFO order, then the repeating tasks in
    /// registration order. A panicking task is logged and skipped without
    /// affecting the rest of the batch.
    pub fn drain_and_run(&self, registry: &mut WindowRegistry, ui: &mut dyn Toolkit) {
        let (once, repeating) = {
            let mut inner = self.inner.lock();
            (std::mem::take(&mut inner.once), inner.repeating.clone())
        };

        for task in once {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| task(registry, ui)));
            if let Err(payload) = outcome {
                error!("one-shot frame task panicked: {}", panic_message(&payload));
            }
        }
        for (name, task) in repeating {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| task(registry, ui)));
            if let Err(payload) = outcome {
                error!("per-frame task '{name}' panicked: {}", panic_message(&payload));
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;
    use crate::model::geometry::Vec2;
    use crate::registry::ConcurrentIndex;
    use crate::toolkit::HeadlessToolkit;

    fn fixture() -> (WindowRegistry, HeadlessToolkit) {
        (
            WindowRegistry::new(Arc::new(ConcurrentIndex::default())),
            HeadlessToolkit::new(Vec2::new(1280.0, 720.0)),
        )
    }

    #[test]
    fn one_shots_run_in_fifo_order_and_only_once() {
        let queue = DeferredTaskQueue::new();
        let (mut registry, mut ui) = fixture();
        let log = Arc::new(Mutex::new(Vec::new()));

        for i in 0..3 {
            let log = Arc::clone(&log);
            queue.enqueue_once(move |_, _| log.lock().push(i));
        }
        queue.drain_and_run(&mut registry, &mut ui);
        assert_eq!(*log.lock(), vec![0, 1, 2]);

        queue.drain_and_run(&mut registry, &mut ui);
        assert_eq!(*log.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn repeating_task_is_unique_per_name() {
        let queue = DeferredTaskQueue::new();
        let (mut registry, mut ui) = fixture();
        let hits = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let hits = Arc::clone(&hits);
            queue.set_repeating(
                "X",
                Some(Arc::new(move |_: &mut WindowRegistry, _: &mut dyn Toolkit| {
                    hits.fetch_add(1, Ordering::SeqCst);
                })),
            );
        }
        assert_eq!(queue.repeating_count(), 1);

        queue.drain_and_run(&mut registry, &mut ui);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        queue.set_repeating("X", None);
        queue.drain_and_run(&mut registry, &mut ui);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(queue.repeating_count(), 0);
    }

    #[test]
    fn one_shots_run_before_repeating_tasks() {
        let queue = DeferredTaskQueue::new();
        let (mut registry, mut ui) = fixture();
        let log: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

        {
            let log = Arc::clone(&log);
            queue.set_repeating(
                "tick",
                Some(Arc::new(move |_: &mut WindowRegistry, _: &mut dyn Toolkit| {
                    log.lock().push("repeating");
                })),
            );
        }
        {
            let log = Arc::clone(&log);
            queue.enqueue_once(move |_, _| log.lock().push("once"));
        }

        queue.drain_and_run(&mut registry, &mut ui);
        assert_eq!(*log.lock(), vec!["once", "repeating"]);
    }

    #[test]
    fn task_enqueued_during_drain_lands_in_next_frame() {
        let queue = Arc::new(DeferredTaskQueue::new());
        let (mut registry, mut ui) = fixture();
        let log = Arc::new(Mutex::new(Vec::new()));

        {
            let queue = Arc::clone(&queue);
            let log = Arc::clone(&log);
            queue.clone().enqueue_once(move |_, _| {
                log.lock().push("outer");
                let log = Arc::clone(&log);
                queue.enqueue_once(move |_, _| log.lock().push("inner"));
            });
        }

        queue.drain_and_run(&mut registry, &mut ui);
        assert_eq!(*log.lock(), vec!["outer"]);

        queue.drain_and_run(&mut registry, &mut ui);
        assert_eq!(*log.lock(), vec!["outer", "inner"]);
    }

    #[test]
    fn panicking_task_does_not_take_down_the_batch() {
        let queue = DeferredTaskQueue::new();
        let (mut registry, mut ui) = fixture();
        let ran = Arc::new(AtomicUsize::new(0));

        queue.enqueue_once(|_, _| panic!("task blew up"));
        {
            let ran = Arc::clone(&ran);
            queue.enqueue_once(move |_, _| {
                ran.fetch_add(1, Ordering::SeqCst);
            });
        }

        queue.drain_and_run(&mut registry, &mut ui);
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }
}
