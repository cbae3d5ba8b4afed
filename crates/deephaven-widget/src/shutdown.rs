//! Process shutdown notification.
//!
//! The host delivers a single shutdown notification when the process exits.
//! Every live widget registered here is told exactly once; widgets dropped
//! earlier are skipped.

use std::sync::{Mutex, PoisonError, Weak};

use log::debug;

/// Something to notify when the hosting process shuts down.
pub trait ShutdownListener: Send + Sync {
    /// Must not block or fail.
    fn on_shutdown(&self);
}

/// Registered shutdown listeners.
pub struct ShutdownHooks {
    listeners: Mutex<Vec<Weak<dyn ShutdownListener>>>,
}

impl ShutdownHooks {
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn register(&self, listener: Weak<dyn ShutdownListener>) {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        // Forget listeners that are already gone
        listeners.retain(|l| l.strong_count() > 0);
        listeners.push(listener);
    }

    /// Number of registered listeners still alive.
    pub fn len(&self) -> usize {
        let listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        listeners.iter().filter(|l| l.strong_count() > 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Notify and unregister every live listener. Returns how many were told.
    pub fn notify_all(&self) -> usize {
        let drained: Vec<_> = {
            let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
            listeners.drain(..).collect()
        };

        let mut notified = 0;
        for listener in drained.iter().filter_map(Weak::upgrade) {
            listener.on_shutdown();
            notified += 1;
        }
        debug!("[shutdown] Notified {} listener(s)", notified);
        notified
    }
}

impl Default for ShutdownHooks {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct Counter(AtomicUsize);

    impl ShutdownListener for Counter {
        fn on_shutdown(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn listener(counter: &Arc<Counter>) -> Weak<dyn ShutdownListener> {
        let weak: Weak<Counter> = Arc::downgrade(counter);
        weak
    }

    #[test]
    fn test_notifies_each_listener_once() {
        let hooks = ShutdownHooks::new();
        let a = Arc::new(Counter::default());
        let b = Arc::new(Counter::default());
        hooks.register(listener(&a));
        hooks.register(listener(&b));

        assert_eq!(hooks.notify_all(), 2);
        assert_eq!(hooks.notify_all(), 0);
        assert_eq!(a.0.load(Ordering::SeqCst), 1);
        assert_eq!(b.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dropped_listeners_are_skipped() {
        let hooks = ShutdownHooks::new();
        let kept = Arc::new(Counter::default());
        let dropped = Arc::new(Counter::default());
        hooks.register(listener(&kept));
        hooks.register(listener(&dropped));
        drop(dropped);

        assert_eq!(hooks.len(), 1);
        assert_eq!(hooks.notify_all(), 1);
        assert_eq!(kept.0.load(Ordering::SeqCst), 1);
        assert!(hooks.is_empty());
    }
}
