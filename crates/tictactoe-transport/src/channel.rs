//! Byte-stream transports.
//!
//! The session layer only needs an ordered, reliable duplex stream plus a
//! way to obtain one by listening or connecting. These traits are that
//! seam; [`MemoryNetwork`] backs tests and single-process play, the TCP
//! types back a two-process game.

use std::{
    collections::BTreeMap,
    io,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use tokio::{
    io::{AsyncRead, AsyncWrite, DuplexStream},
    sync::mpsc,
};

use crate::service::{PeerInfo, dedup_peers};

/// Buffer size of each direction of an in-memory pipe.
const MEMORY_PIPE_CAPACITY: usize = 4096;

/// An ordered, reliable, bidirectional byte stream.
pub trait Duplex: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> Duplex for T {}

/// Type-erased stream handed to the session.
pub type BoxedStream = Box<dyn Duplex>;

/// Accepts one incoming connection.
#[async_trait]
pub trait Acceptor: Send {
    /// Address peers should connect to.
    fn local_address(&self) -> String;

    /// Waits for the next incoming connection.
    async fn accept(&mut self) -> io::Result<BoxedStream>;
}

/// Opens a connection to a discovered peer.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, peer: &PeerInfo) -> io::Result<BoxedStream>;
}

/// Lists reachable peers.
#[async_trait]
pub trait Discovery: Send + Sync {
    async fn discover(&self) -> io::Result<Vec<PeerInfo>>;
}

type Registry = Arc<Mutex<BTreeMap<String, Listing>>>;

#[derive(Debug)]
struct Listing {
    name: String,
    incoming: mpsc::UnboundedSender<DuplexStream>,
}

fn poisoned(e: impl ToString) -> io::Error {
    io::Error::other(e.to_string())
}

/// In-process network. Acceptors advertise themselves under a generated
/// address and disappear when dropped.
#[derive(Debug, Clone, Default)]
pub struct MemoryNetwork {
    listings: Registry,
    next_id: Arc<std::sync::atomic::AtomicU64>,
}

impl MemoryNetwork {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener advertised as `name`.
    ///
    /// # Errors
    /// Returns an error if the registry lock is poisoned.
    pub fn advertise(&self, name: impl Into<String>) -> io::Result<MemoryAcceptor> {
        let id = self
            .next_id
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let address = format!("mem:{id}");
        let (tx, rx) = mpsc::unbounded_channel();
        self.listings.lock().map_err(poisoned)?.insert(
            address.clone(),
            Listing {
                name: name.into(),
                incoming: tx,
            },
        );
        tracing::debug!(%address, "memory listener registered");
        Ok(MemoryAcceptor {
            address,
            incoming: rx,
            listings: Arc::clone(&self.listings),
        })
    }
}

#[async_trait]
impl Connector for MemoryNetwork {
    async fn connect(&self, peer: &PeerInfo) -> io::Result<BoxedStream> {
        let listings = self.listings.lock().map_err(poisoned)?;
        let listing = listings.get(&peer.address).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::ConnectionRefused,
                format!("no listener at {}", peer.address),
            )
        })?;
        let (local, remote) = tokio::io::duplex(MEMORY_PIPE_CAPACITY);
        listing
            .incoming
            .send(remote)
            .map_err(|_| io::Error::from(io::ErrorKind::ConnectionRefused))?;
        Ok(Box::new(local))
    }
}

#[async_trait]
impl Discovery for MemoryNetwork {
    async fn discover(&self) -> io::Result<Vec<PeerInfo>> {
        let listings = self.listings.lock().map_err(poisoned)?;
        Ok(listings
            .iter()
            .map(|(address, listing)| PeerInfo::new(listing.name.clone(), address.clone()))
            .collect())
    }
}

/// Listening end registered on a [`MemoryNetwork`].
#[derive(Debug)]
pub struct MemoryAcceptor {
    address: String,
    incoming: mpsc::UnboundedReceiver<DuplexStream>,
    listings: Registry,
}

#[async_trait]
impl Acceptor for MemoryAcceptor {
    fn local_address(&self) -> String {
        self.address.clone()
    }

    async fn accept(&mut self) -> io::Result<BoxedStream> {
        match self.incoming.recv().await {
            Some(stream) => Ok(Box::new(stream)),
            None => Err(io::Error::from(io::ErrorKind::BrokenPipe)),
        }
    }
}

impl Drop for MemoryAcceptor {
    fn drop(&mut self) {
        if let Ok(mut listings) = self.listings.lock() {
            listings.remove(&self.address);
        }
    }
}

/// Fixed list of peers, e.g. from the command line.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    peers: Vec<PeerInfo>,
}

impl StaticDirectory {
    #[must_use]
    pub const fn new(peers: Vec<PeerInfo>) -> Self {
        Self { peers }
    }
}

#[async_trait]
impl Discovery for StaticDirectory {
    async fn discover(&self) -> io::Result<Vec<PeerInfo>> {
        Ok(dedup_peers(self.peers.clone()))
    }
}

#[cfg(feature = "tcp")]
mod tcp {
    use std::io;

    use async_trait::async_trait;
    use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};

    use super::{Acceptor, BoxedStream, Connector};
    use crate::service::PeerInfo;

    /// TCP listener accepting game connections.
    #[derive(Debug)]
    pub struct TcpAcceptor {
        listener: TcpListener,
    }

    impl TcpAcceptor {
        /// Binds the listening socket.
        ///
        /// # Errors
        /// Returns the bind error.
        pub async fn bind(addr: impl ToSocketAddrs) -> io::Result<Self> {
            Ok(Self {
                listener: TcpListener::bind(addr).await?,
            })
        }
    }

    #[async_trait]
    impl Acceptor for TcpAcceptor {
        fn local_address(&self) -> String {
            self.listener
                .local_addr()
                .map(|addr| addr.to_string())
                .unwrap_or_default()
        }

        async fn accept(&mut self) -> io::Result<BoxedStream> {
            let (stream, addr) = self.listener.accept().await?;
            stream.set_nodelay(true)?;
            tracing::debug!(%addr, "accepted tcp connection");
            Ok(Box::new(stream))
        }
    }

    /// Connects to `PeerInfo::address` as a socket address.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct TcpConnector;

    #[async_trait]
    impl Connector for TcpConnector {
        async fn connect(&self, peer: &PeerInfo) -> io::Result<BoxedStream> {
            let stream = TcpStream::connect(peer.address.as_str()).await?;
            stream.set_nodelay(true)?;
            Ok(Box::new(stream))
        }
    }
}

#[cfg(feature = "tcp")]
pub use tcp::{TcpAcceptor, TcpConnector};
