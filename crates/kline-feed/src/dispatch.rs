/*
[INPUT]:  Values emitted by a producer (feed events, resize events)
[OUTPUT]: Per-subscriber queues with guard-based deregistration
[POS]:    Event layer - explicit handler registration
[UPDATE]: When changing subscription ownership or delivery rules
*/

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tokio::sync::mpsc;

#[derive(Debug)]
struct Registry<T> {
    next_id: u64,
    senders: BTreeMap<u64, mpsc::UnboundedSender<T>>,
}

/// Fan-out of values to every live [`Subscription`].
///
/// Cloning shares the same subscriber set.
#[derive(Debug)]
pub struct Dispatcher<T> {
    registry: Arc<Mutex<Registry<T>>>,
}

impl<T> Clone for Dispatcher<T> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
        }
    }
}

impl<T: Clone> Dispatcher<T> {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                senders: BTreeMap::new(),
            })),
        }
    }

    /// Register a new subscriber. Dropping the returned guard deregisters it.
    pub fn subscribe(&self) -> Subscription<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = {
            let mut registry = lock(&self.registry);
            let id = registry.next_id;
            registry.next_id += 1;
            registry.senders.insert(id, tx);
            id
        };
        Subscription {
            id,
            rx,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Deliver `value` to every subscriber; returns how many received it.
    pub fn emit(&self, value: T) -> usize {
        let mut registry = lock(&self.registry);
        registry
            .senders
            .retain(|_, sender| sender.send(value.clone()).is_ok());
        registry.senders.len()
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.registry).senders.len()
    }
}

impl<T: Clone> Default for Dispatcher<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Registration handle returned by [`Dispatcher::subscribe`]
#[derive(Debug)]
pub struct Subscription<T> {
    id: u64,
    rx: mpsc::UnboundedReceiver<T>,
    registry: Weak<Mutex<Registry<T>>>,
}

impl<T> Subscription<T> {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Wait for the next value; `None` once the dispatcher is gone.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Next queued value without waiting.
    pub fn try_recv(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).senders.remove(&self.id);
        }
    }
}

fn lock<T>(registry: &Mutex<Registry<T>>) -> MutexGuard<'_, Registry<T>> {
    registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
