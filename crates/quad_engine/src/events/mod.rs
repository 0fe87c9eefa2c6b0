//! Signal bus
//!
//! Typed observer registry. Handlers are connected for one [`SignalKind`],
//! optionally filtered on the sending node, and stay connected until
//! [`SignalBus::disconnect`] is called with the returned [`SubscriptionId`].
//!
//! Signals are delivered either immediately ([`SignalBus::emit`]) or queued
//! and delivered on the next [`SignalBus::dispatch`] ([`SignalBus::post`]).

use std::collections::HashMap;
use std::fmt;

use crate::render::drawable::DrawableId;

/// Signal type identification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    /// A node joined the scene
    NodeAdded,
    /// A node left the scene
    NodeRemoved,
    /// A node's global bounds changed
    NodeRelocated,
    /// A node was shown or hidden
    VisibilityChanged,
    /// Application defined signal
    Custom(u32),
}

/// Signal payload
#[derive(Debug, Clone, PartialEq)]
pub enum SignalArg {
    /// No payload
    None,
    /// Boolean flag
    Flag(bool),
    /// Integer value
    Int(i64),
    /// Float value
    Float(f32),
    /// Text
    Text(String),
}

/// Signal with its sender and payload
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    /// Type of signal
    pub kind: SignalKind,
    /// Node that sent the signal, if any
    pub sender: Option<DrawableId>,
    /// Payload
    pub payload: SignalArg,
}

impl Signal {
    /// Create a signal without sender or payload
    pub fn new(kind: SignalKind) -> Self {
        Self {
            kind,
            sender: None,
            payload: SignalArg::None,
        }
    }

    /// Set the sender (builder pattern)
    pub fn from_sender(mut self, sender: DrawableId) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Set the payload (builder pattern)
    pub fn with_payload(mut self, payload: SignalArg) -> Self {
        self.payload = payload;
        self
    }
}

/// Handle identifying a connected handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Signal handler
pub type SignalHandler = Box<dyn FnMut(&Signal)>;

struct Subscription {
    id: SubscriptionId,
    sender: Option<DrawableId>,
    handler: SignalHandler,
}

/// Signal bus with registration and queuing
#[derive(Default)]
pub struct SignalBus {
    handlers: HashMap<SignalKind, Vec<Subscription>>,
    queue: Vec<Signal>,
    next_id: u64,
}

impl fmt::Debug for SignalBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalBus")
            .field("subscriptions", &self.subscription_count())
            .field("queued", &self.queue.len())
            .finish()
    }
}

impl SignalBus {
    /// Create an empty bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect a handler for `kind`.
    ///
    /// With a `sender` filter the handler only sees signals from that node.
    pub fn connect<F>(
        &mut self,
        kind: SignalKind,
        sender: Option<DrawableId>,
        handler: F,
    ) -> SubscriptionId
    where
        F: FnMut(&Signal) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.handlers.entry(kind).or_default().push(Subscription {
            id,
            sender,
            handler: Box::new(handler),
        });
        id
    }

    /// Disconnect a handler. Returns false if it was not connected.
    pub fn disconnect(&mut self, id: SubscriptionId) -> bool {
        for subscriptions in self.handlers.values_mut() {
            if let Some(index) = subscriptions.iter().position(|s| s.id == id) {
                subscriptions.remove(index);
                return true;
            }
        }
        false
    }

    /// Disconnect every handler filtering on `sender`, used when a node goes
    /// away
    pub fn disconnect_sender(&mut self, sender: DrawableId) -> usize {
        let mut removed = 0;
        for subscriptions in self.handlers.values_mut() {
            let before = subscriptions.len();
            subscriptions.retain(|s| s.sender != Some(sender));
            removed += before - subscriptions.len();
        }
        removed
    }

    /// Number of connected handlers
    pub fn subscription_count(&self) -> usize {
        self.handlers.values().map(Vec::len).sum()
    }

    /// Deliver a signal right away, in connection order
    pub fn emit(&mut self, signal: &Signal) {
        let Some(subscriptions) = self.handlers.get_mut(&signal.kind) else {
            return;
        };
        for subscription in subscriptions.iter_mut() {
            let accepts = subscription
                .sender
                .map_or(true, |sender| signal.sender == Some(sender));
            if accepts {
                (subscription.handler)(signal);
            }
        }
    }

    /// Queue a signal for the next dispatch
    pub fn post(&mut self, signal: Signal) {
        self.queue.push(signal);
    }

    /// Number of queued signals
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Deliver all queued signals in posting order
    pub fn dispatch(&mut self) {
        let queued = std::mem::take(&mut self.queue);
        for signal in &queued {
            self.emit(signal);
        }
    }

    /// Drop queued signals (useful for state transitions)
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn ids(n: usize) -> Vec<DrawableId> {
        let mut map: SlotMap<DrawableId, ()> = SlotMap::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    fn recorder() -> (Rc<RefCell<Vec<Signal>>>, impl FnMut(&Signal) + 'static) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        (log, move |signal: &Signal| sink.borrow_mut().push(signal.clone()))
    }

    #[test]
    fn test_immediate_emit_by_kind() {
        let mut bus = SignalBus::new();
        let (log, handler) = recorder();
        bus.connect(SignalKind::NodeAdded, None, handler);

        bus.emit(&Signal::new(SignalKind::NodeAdded));
        bus.emit(&Signal::new(SignalKind::NodeRemoved));

        assert_eq!(log.borrow().len(), 1);
        assert_eq!(log.borrow()[0].kind, SignalKind::NodeAdded);
    }

    #[test]
    fn test_sender_filter() {
        let nodes = ids(2);
        let mut bus = SignalBus::new();
        let (log, handler) = recorder();
        bus.connect(SignalKind::VisibilityChanged, Some(nodes[0]), handler);

        bus.emit(&Signal::new(SignalKind::VisibilityChanged).from_sender(nodes[1]));
        bus.emit(&Signal::new(SignalKind::VisibilityChanged));
        bus.emit(
            &Signal::new(SignalKind::VisibilityChanged)
                .from_sender(nodes[0])
                .with_payload(SignalArg::Flag(false)),
        );

        assert_eq!(log.borrow().len(), 1);
        assert_eq!(log.borrow()[0].payload, SignalArg::Flag(false));
    }

    #[test]
    fn test_deferred_dispatch() {
        let mut bus = SignalBus::new();
        let (log, handler) = recorder();
        bus.connect(SignalKind::Custom(3), None, handler);

        bus.post(Signal::new(SignalKind::Custom(3)).with_payload(SignalArg::Int(1)));
        bus.post(Signal::new(SignalKind::Custom(3)).with_payload(SignalArg::Int(2)));
        assert_eq!(bus.pending(), 2);
        assert!(log.borrow().is_empty());

        bus.dispatch();
        assert_eq!(bus.pending(), 0);
        let payloads: Vec<_> = log.borrow().iter().map(|s| s.payload.clone()).collect();
        assert_eq!(payloads, vec![SignalArg::Int(1), SignalArg::Int(2)]);
    }

    #[test]
    fn test_disconnect() {
        let nodes = ids(1);
        let mut bus = SignalBus::new();
        let (log, handler) = recorder();
        let id = bus.connect(SignalKind::NodeRelocated, None, handler);
        let (_, other) = recorder();
        bus.connect(SignalKind::NodeRelocated, Some(nodes[0]), other);

        assert!(bus.disconnect(id));
        assert!(!bus.disconnect(id));
        bus.emit(&Signal::new(SignalKind::NodeRelocated));
        assert!(log.borrow().is_empty());

        assert_eq!(bus.disconnect_sender(nodes[0]), 1);
        assert_eq!(bus.subscription_count(), 0);
    }

    #[test]
    fn test_clear_drops_queue() {
        let mut bus = SignalBus::new();
        bus.post(Signal::new(SignalKind::NodeAdded));
        bus.clear();
        assert_eq!(bus.pending(), 0);
    }
}
