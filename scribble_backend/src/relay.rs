use axum::extract::ws::Utf8Bytes;
use tracing::{debug, warn};

use crate::registry::Registry;

/// Fans one inbound drawing event out to the full registry membership.
///
/// The relay is schema-agnostic: whatever text frame a client sends is
/// forwarded byte-for-byte to every connected client, the sender included.
/// It keeps no copy of any message, so a client that joins later never sees
/// earlier events.
#[derive(Debug, Default)]
pub struct Relay {
    registry: Registry,
}

impl Relay {
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Deliver `payload` unchanged to every client in the current snapshot,
    /// `sender_id` included.
    ///
    /// Fire-and-forget: a recipient whose outbound queue is full or whose
    /// write task is gone loses this frame, and delivery to the remaining
    /// recipients continues. Nothing is ever reported back to the sender.
    pub async fn dispatch(&self, sender_id: &str, payload: Utf8Bytes) {
        let recipients = self.registry.snapshot().await;
        let mut delivered = 0usize;
        for client in &recipients {
            if client.deliver(payload.clone()) {
                delivered += 1;
            } else {
                warn!(
                    client = client.id(),
                    "dropping drawing event for unreachable client"
                );
            }
        }
        debug!(
            sender = sender_id,
            recipients = recipients.len(),
            delivered,
            "relayed drawing event"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ClientHandle;
    use crate::shared_types::DrawingMessage;
    use tokio::sync::mpsc;
    use tokio::sync::mpsc::error::TryRecvError;

    fn make_client_with_rx(id: &str) -> (ClientHandle, mpsc::Receiver<Utf8Bytes>) {
        let (tx, rx) = mpsc::channel(32);
        (ClientHandle::new(id.into(), tx), rx)
    }

    #[tokio::test]
    async fn echo_delivers_one_copy_to_every_client_including_sender() {
        let relay = Relay::default();
        let (sender, mut sender_rx) = make_client_with_rx("sender");
        let (r1, mut rx1) = make_client_with_rx("r1");
        let (r2, mut rx2) = make_client_with_rx("r2");
        let (r3, mut rx3) = make_client_with_rx("r3");
        relay.registry().register(sender).await;
        relay.registry().register(r1).await;
        relay.registry().register(r2).await;
        relay.registry().register(r3).await;

        relay.dispatch("sender", Utf8Bytes::from("segment")).await;

        for rx in [&mut sender_rx, &mut rx1, &mut rx2, &mut rx3] {
            assert_eq!(rx.try_recv().unwrap().as_str(), "segment");
            // exactly one copy each
            assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
        }
    }

    #[tokio::test]
    async fn single_sender_messages_arrive_in_order() {
        let relay = Relay::default();
        let (sender, mut sender_rx) = make_client_with_rx("sender");
        let (receiver, mut receiver_rx) = make_client_with_rx("receiver");
        relay.registry().register(sender).await;
        relay.registry().register(receiver).await;

        relay.dispatch("sender", Utf8Bytes::from("m1")).await;
        relay.dispatch("sender", Utf8Bytes::from("m2")).await;

        for rx in [&mut sender_rx, &mut receiver_rx] {
            assert_eq!(rx.try_recv().unwrap().as_str(), "m1");
            assert_eq!(rx.try_recv().unwrap().as_str(), "m2");
        }
    }

    #[tokio::test]
    async fn failed_recipient_does_not_block_the_rest() {
        let relay = Relay::default();
        // A recipient whose queue is already full.
        let (slow_tx, _slow_rx) = mpsc::channel(1);
        let slow = ClientHandle::new("slow".into(), slow_tx);
        assert!(slow.deliver(Utf8Bytes::from("backlog")));
        let (ok1, mut ok1_rx) = make_client_with_rx("ok1");
        let (ok2, mut ok2_rx) = make_client_with_rx("ok2");
        relay.registry().register(slow).await;
        relay.registry().register(ok1).await;
        relay.registry().register(ok2).await;

        relay.dispatch("ok1", Utf8Bytes::from("segment")).await;

        assert_eq!(ok1_rx.try_recv().unwrap().as_str(), "segment");
        assert_eq!(ok2_rx.try_recv().unwrap().as_str(), "segment");
    }

    #[tokio::test]
    async fn recipient_gone_mid_broadcast_does_not_abort_fanout() {
        let relay = Relay::default();
        let (alive, mut alive_rx) = make_client_with_rx("alive");
        let (gone, gone_rx) = make_client_with_rx("gone");
        relay.registry().register(gone).await;
        relay.registry().register(alive).await;

        // The client's write task died but it is still in the membership,
        // as happens when a disconnect races a broadcast.
        drop(gone_rx);

        relay.dispatch("alive", Utf8Bytes::from("segment")).await;
        assert_eq!(alive_rx.try_recv().unwrap().as_str(), "segment");
    }

    #[tokio::test]
    async fn payload_is_passed_through_untouched() {
        let relay = Relay::default();
        let (sender, mut sender_rx) = make_client_with_rx("sender");
        let (receiver, mut receiver_rx) = make_client_with_rx("receiver");
        relay.registry().register(sender).await;
        relay.registry().register(receiver).await;

        let original = DrawingMessage {
            x0: 0.1,
            y0: 0.2,
            x1: 0.3,
            y1: 0.4,
            color: "#ff00ff".to_string(),
            width: Some(5.0),
        };
        let wire = serde_json::to_string(&original).unwrap();
        relay.dispatch("sender", Utf8Bytes::from(wire.clone())).await;

        for rx in [&mut sender_rx, &mut receiver_rx] {
            let received = rx.try_recv().unwrap();
            assert_eq!(received.as_str(), wire);
            let parsed: DrawingMessage = serde_json::from_str(received.as_str()).unwrap();
            assert_eq!(parsed, original);
        }
    }

    #[tokio::test]
    async fn malformed_payload_is_still_relayed() {
        // The relay has no schema authority over the drawing protocol:
        // anything a client sends is forwarded, valid JSON or not.
        let relay = Relay::default();
        let (receiver, mut rx) = make_client_with_rx("receiver");
        relay.registry().register(receiver).await;

        relay.dispatch("sender", Utf8Bytes::from("not even json {")).await;
        assert_eq!(rx.try_recv().unwrap().as_str(), "not even json {");
    }

    #[tokio::test]
    async fn new_joiner_receives_no_backlog() {
        let relay = Relay::default();
        let (early, mut early_rx) = make_client_with_rx("early");
        relay.registry().register(early).await;
        relay.dispatch("early", Utf8Bytes::from("m1")).await;
        relay.dispatch("early", Utf8Bytes::from("m2")).await;

        let (late, mut late_rx) = make_client_with_rx("late");
        relay.registry().register(late).await;
        assert!(matches!(late_rx.try_recv(), Err(TryRecvError::Empty)));

        relay.dispatch("early", Utf8Bytes::from("m3")).await;
        assert_eq!(late_rx.try_recv().unwrap().as_str(), "m3");

        assert_eq!(early_rx.try_recv().unwrap().as_str(), "m1");
        assert_eq!(early_rx.try_recv().unwrap().as_str(), "m2");
        assert_eq!(early_rx.try_recv().unwrap().as_str(), "m3");
    }

    #[tokio::test]
    async fn dispatch_with_no_clients_is_a_no_op() {
        let relay = Relay::default();
        relay.dispatch("nobody", Utf8Bytes::from("segment")).await;
    }
}
