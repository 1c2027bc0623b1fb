//! Transport contract and in-process transports.

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use log::{trace, warn};
use wire::{encode_rpc_frame, Limits, NetId, RpcFrame, RpcId, RpcType};

/// An RPC handed to the transport for remote delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcMessage {
    pub entity: NetId,
    pub rpc_id: RpcId,
    pub rpc_type: RpcType,
    pub payload: Vec<u8>,
    /// Hash of the sender's layout for the entity.
    pub layout_hash: u64,
}

/// What replication needs from the session transport.
///
/// Delivery is best-effort and ordered per entity. Failures are the
/// transport's concern and are not reported to the caller.
pub trait RpcTransport {
    /// Returns `true` if this process is the authoritative host of the session.
    fn is_authority(&self) -> bool;

    /// Queues an RPC for the entity's remote counterpart.
    fn send_remote_rpc(&mut self, message: RpcMessage);
}

/// Source of inbound frames, polled on the simulation thread.
pub trait FrameSource {
    /// Returns the next buffered frame, in arrival order.
    fn poll_frame(&mut self) -> Option<Vec<u8>>;
}

/// Sink for outbound encoded frames.
pub trait FrameSink {
    /// Queues an encoded frame for delivery.
    fn send_frame(&mut self, frame: Vec<u8>);
}

/// Transport that records outbound RPCs instead of sending them.
#[derive(Debug, Default, Clone)]
pub struct LoopbackTransport {
    authority: bool,
    sent: Vec<RpcMessage>,
}

impl LoopbackTransport {
    /// Creates a transport acting as the authoritative host.
    #[must_use]
    pub fn authority() -> Self {
        Self {
            authority: true,
            sent: Vec::new(),
        }
    }

    /// Creates a transport acting as a remote peer.
    #[must_use]
    pub fn remote() -> Self {
        Self::default()
    }

    /// Messages sent so far.
    #[must_use]
    pub fn sent(&self) -> &[RpcMessage] {
        &self.sent
    }

    /// Removes and returns the messages sent so far.
    pub fn take_sent(&mut self) -> Vec<RpcMessage> {
        std::mem::take(&mut self.sent)
    }
}

impl RpcTransport for LoopbackTransport {
    fn is_authority(&self) -> bool {
        self.authority
    }

    fn send_remote_rpc(&mut self, message: RpcMessage) {
        self.sent.push(message);
    }
}

/// One end of an in-process framed connection.
///
/// Outbound RPCs are encoded as wire frames and pushed onto a channel. The
/// other end buffers them until its simulation thread drains them, so the
/// two ends may live on different threads.
#[derive(Debug)]
pub struct ChannelTransport {
    authority: bool,
    limits: Limits,
    tx: Sender<Vec<u8>>,
    rx: Receiver<Vec<u8>>,
    dropped: u64,
}

impl ChannelTransport {
    /// Creates a connected pair: the authoritative host first, then the remote peer.
    #[must_use]
    pub fn pair(limits: Limits) -> (Self, Self) {
        let (host_tx, peer_rx) = crossbeam_channel::unbounded();
        let (peer_tx, host_rx) = crossbeam_channel::unbounded();
        let host = Self {
            authority: true,
            limits: limits.clone(),
            tx: host_tx,
            rx: host_rx,
            dropped: 0,
        };
        let peer = Self {
            authority: false,
            limits,
            tx: peer_tx,
            rx: peer_rx,
            dropped: 0,
        };
        (host, peer)
    }

    /// Number of outbound frames dropped (encode failure or closed peer).
    #[must_use]
    pub const fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Number of inbound frames waiting to be drained.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

impl RpcTransport for ChannelTransport {
    fn is_authority(&self) -> bool {
        self.authority
    }

    fn send_remote_rpc(&mut self, message: RpcMessage) {
        let frame = RpcFrame {
            layout_hash: message.layout_hash,
            entity: message.entity,
            rpc_id: message.rpc_id,
            rpc_type: message.rpc_type,
            payload: &message.payload,
        };
        match encode_rpc_frame(&frame, &self.limits) {
            Ok(bytes) => self.send_frame(bytes),
            Err(err) => {
                warn!(
                    "dropping {} rpc {} for {}: {err}",
                    message.rpc_type, message.rpc_id, message.entity
                );
                self.dropped += 1;
            }
        }
    }
}

impl FrameSink for ChannelTransport {
    fn send_frame(&mut self, frame: Vec<u8>) {
        trace!("send frame of {} bytes", frame.len());
        if self.tx.send(frame).is_err() {
            warn!("peer disconnected, dropping frame");
            self.dropped += 1;
        }
    }
}

impl FrameSource for ChannelTransport {
    fn poll_frame(&mut self) -> Option<Vec<u8>> {
        match self.rx.try_recv() {
            Ok(frame) => Some(frame),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }
}
