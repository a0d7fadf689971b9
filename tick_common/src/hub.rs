//! Subscriber fan-out shared by the broadcaster and the consumer.
//!
//! A `SubscriberHub` owns the set of live subscribers. Each subscriber is a bounded
//! `crossbeam_channel` drained by its own writer thread, which forwards every message to
//! one TCP connection. Publishing never blocks:
//!
//! - `try_send` fails with `Disconnected` once the writer thread has exited (the peer
//!   went away and a write failed), and the subscriber is pruned.
//! - `try_send` fails with `Full` when a subscriber has fallen `capacity` messages
//!   behind; it is considered unresponsive and pruned as well.
//!
//! Pruning happens inside `Vec::retain`, so a failed subscriber never interrupts delivery
//! to the others in the same round. The latest published message is replayed to every
//! new subscriber under the same lock that registers it, so a subscriber sees each
//! message exactly once and in production order.
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use log::{debug, error, info, warn};

use crate::net::write_line;
use crate::result::Result;

/// Identifier assigned to each subscriber.
pub type SubscriberId = u64;

/// Default number of messages a subscriber may lag behind before it is dropped.
pub const DEFAULT_SUBSCRIBER_CAPACITY: usize = 64;

/// Default socket write timeout for subscriber connections.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

struct Subscriber {
    id: SubscriberId,
    peer: String,
    tx: Sender<Arc<str>>,
}

#[derive(Default)]
struct HubState {
    subscribers: Vec<Subscriber>,
    latest: Option<Arc<str>>,
    next_id: SubscriberId,
}

/// Live subscriber set with non-blocking fan-out.
#[derive(Clone)]
pub struct SubscriberHub {
    state: Arc<Mutex<HubState>>,
    capacity: usize,
}

impl SubscriberHub {
    /// Create an empty hub; each subscriber may buffer up to `capacity` messages.
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(HubState::default())),
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        // Hub state stays consistent across a panicking holder: every mutation is a
        // single push, retain or assignment.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a subscriber and return the channel its writer should drain.
    ///
    /// The most recently published message, if any, is already queued on the returned
    /// receiver.
    pub fn subscribe(&self, peer: &str) -> (SubscriberId, Receiver<Arc<str>>) {
        let (tx, rx) = bounded(self.capacity);
        let mut state = self.lock();
        if let Some(latest) = &state.latest {
            let _ = tx.try_send(Arc::clone(latest));
        }
        let id = state.next_id;
        state.next_id += 1;
        state.subscribers.push(Subscriber {
            id,
            peer: peer.to_string(),
            tx,
        });
        info!("Subscriber {} ({}) joined. Total subscribers: {}", id, peer, state.subscribers.len());
        (id, rx)
    }

    /// Remove a subscriber. Returns `false` if it was already pruned.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut state = self.lock();
        let before = state.subscribers.len();
        state.subscribers.retain(|subscriber| subscriber.id != id);
        before != state.subscribers.len()
    }

    /// Deliver `message` to every subscriber, pruning those that cannot take it.
    ///
    /// Returns the number of subscribers that received the message.
    pub fn publish(&self, message: Arc<str>) -> usize {
        let mut state = self.lock();
        state.latest = Some(Arc::clone(&message));
        state.subscribers.retain(|subscriber| {
            match subscriber.tx.try_send(Arc::clone(&message)) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    warn!(
                        "Subscriber {} ({}) is not keeping up, dropping it",
                        subscriber.id, subscriber.peer
                    );
                    false
                }
                Err(TrySendError::Disconnected(_)) => {
                    info!("Subscriber {} ({}) disconnected", subscriber.id, subscriber.peer);
                    false
                }
            }
        });
        state.subscribers.len()
    }

    /// Number of live subscribers.
    pub fn len(&self) -> usize {
        self.lock().subscribers.len()
    }

    /// `true` when nobody is subscribed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Writer loop for a single subscriber connection.
///
/// Forwards every message from `rx` to `stream` until the hub drops the subscriber or a
/// write fails. A failed write ends the loop; dropping `rx` then lets the next `publish`
/// prune the subscriber.
pub fn stream_to_subscriber(mut stream: TcpStream, rx: Receiver<Arc<str>>) -> Result<()> {
    for message in rx.iter() {
        write_line(&mut stream, message.as_bytes())?;
    }
    Ok(())
}

/// Accept loop: every incoming connection becomes a hub subscriber served by its own
/// writer thread.
pub fn accept_subscribers(listener: TcpListener, hub: SubscriberHub, write_timeout: Duration) {
    match listener.local_addr() {
        Ok(local) => info!("Accepting subscribers on {}", local),
        Err(e) => warn!("Accepting subscribers on an unknown address: {}", e),
    }
    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                if let Err(e) = attach(stream, &hub, write_timeout) {
                    error!("Failed to attach subscriber: {}", e);
                }
            }
            Err(e) => error!("TCP connection error: {}", e),
        }
    }
}

fn attach(stream: TcpStream, hub: &SubscriberHub, write_timeout: Duration) -> Result<()> {
    let peer = stream
        .peer_addr()
        .map(|addr: SocketAddr| addr.to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    stream.set_write_timeout(Some(write_timeout))?;
    stream.set_nodelay(true)?;
    let (id, rx) = hub.subscribe(&peer);
    let hub = hub.clone();
    thread::spawn(move || {
        if let Err(e) = stream_to_subscriber(stream, rx) {
            debug!("Subscriber {} ({}) stream ended: {}", id, peer, e);
        }
        hub.unsubscribe(id);
    });
    Ok(())
}
