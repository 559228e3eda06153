//! Transport layer for the peer link.
//!
//! Provides:
//! - Wire protocol (pipe-delimited text frames)
//! - Frame buffering over arbitrary reads
//! - Byte-stream transports: in-memory pairs and TCP (feature: tcp)
//! - Service identity and discovered-peer descriptions

pub mod channel;
pub mod framing;
pub mod protocol;
pub mod service;

pub use channel::{
    Acceptor, BoxedStream, Connector, Discovery, Duplex, MemoryAcceptor, MemoryNetwork,
    StaticDirectory,
};
#[cfg(feature = "tcp")]
pub use channel::{TcpAcceptor, TcpConnector};
pub use framing::{DEFAULT_MAX_FRAME_LEN, FrameDecoder};
pub use protocol::{DecodeError, Heartbeat, MessageType, WireMessage};
pub use service::{PeerInfo, SERVICE_ID, SERVICE_PREFIX, advertised_name, dedup_peers};
