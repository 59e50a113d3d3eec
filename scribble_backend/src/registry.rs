use std::collections::HashMap;

use axum::extract::ws::Utf8Bytes;
use tokio::sync::{Mutex, mpsc};

/// How many relayed frames may queue per client before further frames are
/// dropped for that client.
pub const OUTBOUND_BUFFER: usize = 256;

/// One registered client: its server-assigned id plus the sending half of
/// its outbound queue. The queue is drained into the socket by the
/// connection's write task.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    id: String,
    tx: mpsc::Sender<Utf8Bytes>,
}

impl ClientHandle {
    pub fn new(id: String, tx: mpsc::Sender<Utf8Bytes>) -> Self {
        Self { id, tx }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Queue one payload for this client. Returns false when the queue is
    /// full or the client's write task is gone; the caller treats that as a
    /// delivery failure for this client only.
    pub fn deliver(&self, payload: Utf8Bytes) -> bool {
        self.tx.try_send(payload).is_ok()
    }
}

/// The set of currently connected clients.
///
/// Mutated only on connect/disconnect, read via [`Registry::snapshot`]
/// during fan-out. A client that disconnects between a snapshot and the
/// write may or may not receive that broadcast.
#[derive(Debug, Default)]
pub struct Registry {
    clients: Mutex<HashMap<String, ClientHandle>>,
}

impl Registry {
    /// Add a newly established connection. From this point on the client is
    /// eligible to receive every future broadcast.
    pub async fn register(&self, client: ClientHandle) {
        let mut clients = self.clients.lock().await;
        clients.insert(client.id.clone(), client);
    }

    /// Remove a connection. Removing an id that was never registered, or was
    /// already removed, is a no-op.
    pub async fn unregister(&self, id: &str) {
        let mut clients = self.clients.lock().await;
        clients.remove(id);
    }

    /// Current membership, cloned so fan-out iterates outside the lock.
    pub async fn snapshot(&self) -> Vec<ClientHandle> {
        let clients = self.clients.lock().await;
        clients.values().cloned().collect()
    }
}
