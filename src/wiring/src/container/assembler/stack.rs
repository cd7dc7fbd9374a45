use std::collections::HashMap;
use std::thread::{self, ThreadId};

use parking_lot::Mutex;

/// The consumers currently being constructed, kept separately for every
/// thread resolving through the same injector.
#[derive(Debug, Default)]
pub struct ConstructionStack {
    frames: Mutex<HashMap<ThreadId, Vec<String>>>,
}

impl ConstructionStack {
    pub fn new() -> Self {
        Default::default()
    }

    /// Pushes `consumer` for the current thread. It's popped when the
    /// returned guard is dropped.
    pub fn enter(&self, consumer: impl Into<String>) -> StackGuard<'_> {
        let thread = thread::current().id();
        self.frames
            .lock()
            .entry(thread)
            .or_default()
            .push(consumer.into());
        StackGuard {
            stack: self,
            thread,
        }
    }

    pub fn top(&self) -> Option<String> {
        self.with_frames(|frames| frames.last().cloned())
    }

    pub fn contains(&self, consumer: &str) -> bool {
        self.with_frames(|frames| frames.iter().any(|frame| frame == consumer))
    }

    pub fn path(&self) -> Vec<String> {
        self.with_frames(<[String]>::to_vec)
    }

    pub fn depth(&self) -> usize {
        self.with_frames(<[String]>::len)
    }

    fn with_frames<R>(&self, f: impl FnOnce(&[String]) -> R) -> R {
        let frames = self.frames.lock();
        let current = frames
            .get(&thread::current().id())
            .map(Vec::as_slice)
            .unwrap_or_default();
        f(current)
    }

    fn leave(&self, thread: ThreadId) {
        let mut frames = self.frames.lock();
        if let Some(stack) = frames.get_mut(&thread) {
            stack.pop();
            if stack.is_empty() {
                frames.remove(&thread);
            }
        }
    }
}

#[must_use = "the consumer is popped as soon as the guard is dropped"]
pub struct StackGuard<'a> {
    stack: &'a ConstructionStack,
    thread: ThreadId,
}

impl Drop for StackGuard<'_> {
    fn drop(&mut self) {
        self.stack.leave(self.thread);
    }
}
