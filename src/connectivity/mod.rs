//! Connectivity monitoring.
//!
//! [`ConnectivityMonitor`] holds the last known network state, fans state
//! changes out to subscribers and kicks off exactly one queue drain whenever
//! the device goes from offline to online. Platform signals reach it through
//! [`ConnectivityMonitor::set_online`], a watch channel ([`ConnectivityMonitor::listen`])
//! or the polling [`probe`].

pub mod probe;

use async_trait::async_trait;
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::constants::{STATUS_OFFLINE, STATUS_ONLINE};

/// Identifier returned by [`ConnectivityMonitor::subscribe`].
pub type SubscriptionId = u64;

type Handler = Arc<dyn Fn(bool) + Send + Sync>;

/// Receives the offline → online transition.
#[async_trait]
pub trait ReconnectHandler: Send + Sync {
    async fn on_reconnect(&self);
}

/// Tracks whether the device is online and notifies interested parties.
pub struct ConnectivityMonitor {
    online: AtomicBool,
    next_subscription: AtomicU64,
    subscribers: Mutex<HashMap<SubscriptionId, Handler>>,
    reconnect_handler: Mutex<Option<Weak<dyn ReconnectHandler>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectivityMonitor {
    /// Creates a monitor that assumes the device is online until told otherwise.
    pub fn new() -> Self {
        Self::with_initial_state(true)
    }

    pub fn with_initial_state(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
            next_subscription: AtomicU64::new(1),
            subscribers: Mutex::new(HashMap::new()),
            reconnect_handler: Mutex::new(None),
        }
    }

    /// Last known state. Never blocks.
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Registers `handler` for every state transition.
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let id = self.next_subscription.fetch_add(1, Ordering::Relaxed);
        lock(&self.subscribers).insert(id, Arc::new(handler));
        id
    }

    /// Removes a subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        lock(&self.subscribers).remove(&id).is_some()
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.subscribers).len()
    }

    /// Wires the drain entry point that runs on reconnect.
    ///
    /// Only a weak reference is kept; the handler usually owns the monitor.
    pub fn attach_reconnect_handler<H>(&self, handler: &Arc<H>)
    where
        H: ReconnectHandler + 'static,
    {
        let weak = Arc::downgrade(handler);
        let weak: Weak<dyn ReconnectHandler> = weak;
        *lock(&self.reconnect_handler) = Some(weak);
    }

    pub fn detach_reconnect_handler(&self) {
        *lock(&self.reconnect_handler) = None;
    }

    /// Applies a platform signal.
    ///
    /// Repeated signals with the same value are ignored. Subscribers are
    /// notified on every real transition; on offline → online the reconnect
    /// handler is spawned once and its join handle returned.
    pub fn set_online(&self, online: bool) -> Option<JoinHandle<()>> {
        let was_online = self.online.swap(online, Ordering::SeqCst);
        if was_online == online {
            debug!("Connectivity unchanged (online={online})");
            return None;
        }

        info!("{}", if online { STATUS_ONLINE } else { STATUS_OFFLINE });
        self.notify_subscribers(online);

        if online {
            self.trigger_reconnect()
        } else {
            None
        }
    }

    fn notify_subscribers(&self, online: bool) {
        // Snapshot so handlers may subscribe/unsubscribe without deadlocking.
        let handlers: Vec<(SubscriptionId, Handler)> = lock(&self.subscribers)
            .iter()
            .map(|(id, handler)| (*id, Arc::clone(handler)))
            .collect();

        for (id, handler) in handlers {
            if catch_unwind(AssertUnwindSafe(|| handler(online))).is_err() {
                error!("❌ Connectivity subscriber {id} panicked");
            }
        }
    }

    fn trigger_reconnect(&self) -> Option<JoinHandle<()>> {
        let handler = lock(&self.reconnect_handler).as_ref().and_then(Weak::upgrade)?;

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => Some(runtime.spawn(async move { handler.on_reconnect().await })),
            Err(_) => {
                warn!("⚠️  Reconnected outside of an async runtime, sync not triggered");
                None
            }
        }
    }

    /// Follows a platform watch channel until its sender goes away.
    pub fn listen(self: &Arc<Self>, mut signal: watch::Receiver<bool>) -> JoinHandle<()> {
        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            let initial = *signal.borrow_and_update();
            monitor.set_online(initial);

            while signal.changed().await.is_ok() {
                let online = *signal.borrow_and_update();
                monitor.set_online(online);
            }
            debug!("Connectivity signal closed, keeping last known state");
        })
    }
}
