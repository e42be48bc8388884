use std::collections::{BTreeMap, HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{ready, Context, Poll};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::{host, SyncMutex, Uuid};

use super::session::Session;
use super::*;

/// Controller configuration.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct Config {
    /// Number of [`ServiceEvent`]s buffered for each subscriber before the
    /// oldest ones are dropped.
    pub event_capacity: usize,
}

impl Default for Config {
    #[inline]
    fn default() -> Self {
        Self { event_capacity: 32 }
    }
}

/// GATT client controller for one peripheral.
///
/// The controller owns all service sessions of the peripheral and serializes
/// every mutation of them. Transport callbacks are applied by
/// [`Self::handle_event`], either directly or through the mailbox returned by
/// [`Self::events`].
#[derive(Clone, Debug)]
pub struct Controller {
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    transport: Arc<dyn host::Transport>,
    cfg: Config,
    inner: SyncMutex<Inner>,
    tx: mpsc::UnboundedSender<Event>,
    rx: SyncMutex<Option<mpsc::UnboundedReceiver<Event>>>,
}

/// Session arena and connection state.
#[derive(Debug, Default)]
struct Inner {
    connected: bool,
    next_id: u64,
    /// Live sessions and invalid sessions that are still referenced.
    sessions: BTreeMap<SessionId, Session>,
    /// Sessions of the current connection.
    live: HashMap<Uuid, SessionId>,
    /// Services reported as included by another service of the current
    /// connection.
    included: HashSet<Uuid>,
}

impl Controller {
    /// Creates a controller using transport `t` and the default
    /// configuration. The transport is assumed to be disconnected until
    /// [`Event::Connected`] is received.
    #[inline]
    #[must_use]
    pub fn new(t: Arc<dyn host::Transport>) -> Self {
        Self::with_config(t, Config::default())
    }

    /// Creates a controller using transport `t` and configuration `cfg`.
    #[must_use]
    pub fn with_config(t: Arc<dyn host::Transport>, cfg: Config) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            shared: Arc::new(Shared {
                transport: t,
                cfg,
                inner: SyncMutex::new(Inner::default()),
                tx,
                rx: SyncMutex::new(Some(rx)),
            }),
        }
    }

    /// Returns the controller configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.cfg
    }

    /// Returns the underlying transport.
    #[inline]
    #[must_use]
    pub fn transport(&self) -> &Arc<dyn host::Transport> {
        &self.shared.transport
    }

    /// Returns whether the peripheral is connected.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.shared.inner.lock().connected
    }

    /// Returns a handle to service `uuid`. All handles returned for the same
    /// UUID while the peripheral stays connected share one session. A new
    /// session is created after a reconnect.
    pub fn service(&self, uuid: Uuid) -> Result<Service> {
        let mut g = self.shared.inner.lock();
        let inner = &mut *g;
        if !inner.connected {
            return Err(Error::NotConnected);
        }
        let id = match inner.live.get(&uuid) {
            Some(&id) => id,
            None => {
                inner.prune();
                let id = SessionId(inner.next_id);
                inner.next_id += 1;
                let mut typ = ServiceType::PRIMARY;
                if inner.included.contains(&uuid) {
                    typ |= ServiceType::INCLUDED;
                }
                let s = Session::new(id, uuid, typ, self.shared.cfg.event_capacity);
                debug!("{id} <{uuid}>: created for {}", s.name());
                inner.sessions.insert(id, s);
                inner.live.insert(uuid, id);
                id
            }
        };
        Ok(Service::new(self.clone(), &inner.sessions[&id]))
    }

    /// Returns handles to all services of the current connection in creation
    /// order.
    #[must_use]
    pub fn services(&self) -> Vec<Service> {
        let inner = self.shared.inner.lock();
        let mut v: Vec<SessionId> = inner.live.values().copied().collect();
        v.sort_unstable();
        (v.iter())
            .map(|id| Service::new(self.clone(), &inner.sessions[id]))
            .collect()
    }

    /// Returns the sending half of the controller mailbox.
    #[inline]
    #[must_use]
    pub fn events(&self) -> EventSender {
        EventSender(self.shared.tx.clone())
    }

    /// Applies one transport callback. This is the only entry point that
    /// mutates sessions on behalf of the transport. Events for services
    /// without a session on the current connection are dropped.
    pub fn handle_event(&self, e: Event) {
        trace!("Event: {e:?}");
        let mut g = self.shared.inner.lock();
        let inner = &mut *g;
        match e {
            Event::Connected => {
                if !inner.connected {
                    debug!("Connected");
                    inner.connected = true;
                }
            }
            Event::Disconnected => inner.disconnect(),
            Event::Included { svc, uuid } => {
                let Some(s) = inner.live_session(svc) else { return };
                if s.on_included(uuid) {
                    inner.included.insert(uuid);
                    let inc = inner.live.get(&uuid).and_then(|id| inner.sessions.get_mut(id));
                    if let Some(s) = inc {
                        s.typ |= ServiceType::INCLUDED;
                    }
                }
            }
            Event::Characteristic {
                svc,
                hdl,
                uuid,
                props,
            } => {
                if let Some(s) = inner.live_session(svc) {
                    s.on_characteristic(hdl, uuid, props);
                }
            }
            Event::Descriptor {
                svc,
                char_hdl,
                hdl,
                uuid,
            } => {
                if let Some(s) = inner.live_session(svc) {
                    s.on_descriptor(char_hdl, hdl, uuid);
                }
            }
            Event::EnumerationComplete { svc } => {
                if let Some(s) = inner.live_session(svc) {
                    s.on_enumeration_complete();
                }
            }
            Event::WriteConfirmed { svc, attr, val } => {
                if let Some(s) = inner.live_session(svc) {
                    s.on_write_confirmed(attr, &val);
                }
            }
            Event::WriteFailed { svc, attr } => {
                if let Some(s) = inner.live_session(svc) {
                    s.on_write_failed(attr);
                }
            }
            Event::ValueChanged { svc, hdl, val } => {
                if let Some(s) = inner.live_session(svc) {
                    s.on_value_changed(hdl, &val);
                }
            }
        }
    }

    /// Applies all queued mailbox events without blocking and returns the
    /// number of events processed. Returns 0 while an [`EventLoop`] owns the
    /// mailbox.
    pub fn poll_events(&self) -> usize {
        let mut n = 0;
        loop {
            let e = {
                let mut rx = self.shared.rx.lock();
                match rx.as_mut().map(mpsc::UnboundedReceiver::try_recv) {
                    Some(Ok(e)) => e,
                    _ => return n,
                }
            };
            self.handle_event(e);
            n += 1;
        }
    }

    /// Spawns a task that applies mailbox events until it is stopped, the
    /// returned [`EventLoop`] is dropped, or the controller is dropped. Only
    /// one event loop may run at a time.
    pub fn event_loop(&self) -> Result<EventLoop> {
        let Some(rx) = self.shared.rx.lock().take() else {
            return Err(Error::EventLoopRunning);
        };
        let c = CancellationToken::new();
        Ok(EventLoop {
            h: tokio::spawn(EventLoop::run(Arc::downgrade(&self.shared), rx, c.clone())),
            c: c.clone(),
            _g: c.drop_guard(),
        })
    }

    /// Returns the number of sessions kept by the controller.
    #[cfg(test)]
    pub(super) fn session_count(&self) -> usize {
        self.shared.inner.lock().sessions.len()
    }

    /// Returns whether two handles refer to the same controller.
    #[inline]
    pub(super) fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    /// Calls `f` with the specified session.
    pub(super) fn with_session<R>(&self, id: SessionId, f: impl FnOnce(&Session) -> R) -> R {
        let inner = self.shared.inner.lock();
        // Sessions with a live Service are never pruned
        f(&inner.sessions[&id])
    }

    /// Starts detail discovery of a session.
    pub(super) fn discover(&self, id: SessionId) {
        let uuid = {
            let mut inner = self.shared.inner.lock();
            let Some(s) = inner.sessions.get_mut(&id) else { return };
            if !s.begin_discovery() {
                return;
            }
            s.uuid
        };
        debug!("{id} <{uuid}>: requesting attribute enumeration");
        self.shared.transport.enumerate(uuid);
    }

    /// Validates and submits a write. The transport is called without holding
    /// the session lock.
    pub(super) fn write(&self, id: SessionId, attr: Attr, val: &[u8]) {
        let uuid = {
            let mut inner = self.shared.inner.lock();
            let Some(s) = inner.sessions.get_mut(&id) else { return };
            if !s.prepare_write(attr, val) {
                return;
            }
            s.uuid
        };
        self.shared.transport.write(uuid, attr, val);
    }
}

impl Inner {
    /// Returns the session of service `uuid` on the current connection.
    fn live_session(&mut self, uuid: Uuid) -> Option<&mut Session> {
        let s = (self.live.get(&uuid)).and_then(|id| self.sessions.get_mut(id));
        if s.is_none() {
            debug!("Event for service <{uuid}> without a session");
        }
        s
    }

    /// Invalidates all sessions of the current connection.
    fn disconnect(&mut self) {
        if !self.connected {
            return;
        }
        debug!("Disconnected");
        self.connected = false;
        for (_, id) in self.live.drain() {
            if let Some(s) = self.sessions.get_mut(&id) {
                s.invalidate();
            }
        }
        self.included.clear();
        self.prune();
    }

    /// Removes invalid sessions that are no longer referenced.
    fn prune(&mut self) {
        let n = self.sessions.len();
        self.sessions.retain(|_, s| !s.is_unused());
        if n != self.sessions.len() {
            trace!("Pruned {} invalid session(s)", n - self.sessions.len());
        }
    }
}

/// Future that continuously applies mailbox events.
#[derive(Debug)]
pub struct EventLoop {
    h: tokio::task::JoinHandle<()>,
    c: CancellationToken,
    _g: tokio_util::sync::DropGuard,
}

impl EventLoop {
    /// Stops event processing. Queued events that were not yet applied remain
    /// in the mailbox.
    pub async fn stop(self) -> Result<()> {
        self.c.cancel();
        join(self.h.await)
    }

    /// Receives events until cancellation. The mailbox is returned to the
    /// controller when the loop terminates.
    async fn run(
        ctlr: Weak<Shared>,
        mut rx: mpsc::UnboundedReceiver<Event>,
        c: CancellationToken,
    ) {
        debug!("Event loop started");
        loop {
            let e = tokio::select! {
                biased;
                _ = c.cancelled() => break,
                e = rx.recv() => e,
            };
            let (Some(e), Some(shared)) = (e, ctlr.upgrade()) else { break };
            Controller { shared }.handle_event(e);
        }
        debug!("Event loop terminating");
        if let Some(shared) = ctlr.upgrade() {
            *shared.rx.lock() = Some(rx);
        }
    }
}

impl Future for EventLoop {
    type Output = Result<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Poll::Ready(join(ready!(Pin::new(&mut self.h).poll(cx))))
    }
}

/// Converts the event loop task result, propagating panics.
fn join(r: std::result::Result<(), tokio::task::JoinError>) -> Result<()> {
    match r {
        Ok(()) => Ok(()),
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(_) => Err(Error::EventLoopAborted),
    }
}
