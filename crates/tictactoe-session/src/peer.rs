//! Peer session: one link to one opponent at a time.
//!
//! While connected, three tasks run per link: the reader, the heartbeat
//! emitter and the liveness monitor. Every way the link can fail ends in
//! the same teardown, which stops all three and reports once.

use std::{
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use tictactoe_transport::{
    Acceptor, BoxedStream, Connector, FrameDecoder, Heartbeat, PeerInfo, WireMessage,
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt, ReadHalf, WriteHalf},
    sync::{mpsc, watch},
    task::AbortHandle,
    time::{Instant, MissedTickBehavior},
};

use crate::{
    config::{ConfigError, SessionConfig},
    error::{DisconnectReason, SessionError},
    state::{ConnectionState, Role},
};

/// Notification from the session. Each is delivered exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Link is up. Always precedes the link's first message.
    Connected { role: Role },
    /// A game message from the peer. Heartbeats never show up here.
    Message(WireMessage),
    /// Link went down on its own.
    PeerLost(DisconnectReason),
    /// A listen or connect attempt failed.
    ConnectionFailed(String),
    /// Local disconnect finished.
    Closed,
}

/// Handle to the session. Clones share the same link.
#[derive(Clone)]
pub struct PeerSession {
    inner: Arc<Inner>,
}

struct Inner {
    config: SessionConfig,
    state: watch::Sender<ConnectionState>,
    events: mpsc::UnboundedSender<SessionEvent>,
    slot: Mutex<Slot>,
}

#[derive(Default)]
struct Slot {
    pending: Option<AbortHandle>,
    link: Option<Arc<Link>>,
}

struct Link {
    role: Role,
    writer: tokio::sync::Mutex<WriteHalf<BoxedStream>>,
    opened: Instant,
    /// Milliseconds after `opened` of the last decoded frame.
    last_received_ms: AtomicU64,
    closed: AtomicBool,
    tasks: Mutex<Vec<AbortHandle>>,
}

impl Link {
    fn new(role: Role, writer: WriteHalf<BoxedStream>) -> Self {
        Self {
            role,
            writer: tokio::sync::Mutex::new(writer),
            opened: Instant::now(),
            last_received_ms: AtomicU64::new(0),
            closed: AtomicBool::new(false),
            tasks: Mutex::new(Vec::new()),
        }
    }

    fn touch(&self) {
        let elapsed = u64::try_from(self.opened.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.last_received_ms.store(elapsed, Ordering::Relaxed);
    }

    fn idle(&self) -> Duration {
        let last = Duration::from_millis(self.last_received_ms.load(Ordering::Relaxed));
        self.opened.elapsed().saturating_sub(last)
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Registers a task to stop on teardown; stops it now if already torn down.
    fn track(&self, handle: AbortHandle) {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        if self.is_closed() {
            handle.abort();
        } else {
            tasks.push(handle);
        }
    }

    async fn write_frame(&self, frame: &[u8]) -> std::io::Result<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(frame).await?;
        writer.flush().await
    }
}

impl PeerSession {
    /// Creates an idle session and the receiver for its events.
    ///
    /// # Errors
    /// Returns an error if `config` fails [`SessionConfig::validate`].
    pub fn new(
        config: SessionConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<SessionEvent>), ConfigError> {
        config.validate()?;
        let (events, events_rx) = mpsc::unbounded_channel();
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        let session = Self {
            inner: Arc::new(Inner {
                config,
                state,
                events,
                slot: Mutex::new(Slot::default()),
            }),
        };
        Ok((session, events_rx))
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.inner.state.borrow()
    }

    /// Watches connection state changes.
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    /// Role of the current link, if connected.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.inner.slot().link.as_ref().map(|link| link.role)
    }

    /// Waits for one incoming connection and becomes the host.
    ///
    /// # Errors
    /// Returns [`SessionError::Busy`] unless disconnected.
    pub fn listen(&self, mut acceptor: Box<dyn Acceptor>) -> Result<(), SessionError> {
        let mut slot = self.inner.slot();
        self.inner.begin(ConnectionState::Listening)?;
        tracing::info!(address = %acceptor.local_address(), "listening for a peer");

        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            match acceptor.accept().await {
                Ok(stream) => Inner::establish(&inner, stream, Role::Host),
                Err(e) => inner.fail(format!("Accept failed: {e}")),
            }
        });
        slot.pending = Some(task.abort_handle());
        Ok(())
    }

    /// Dials `peer` and becomes the joiner.
    ///
    /// # Errors
    /// Returns [`SessionError::Busy`] unless disconnected.
    pub fn connect(
        &self,
        connector: Arc<dyn Connector>,
        peer: PeerInfo,
    ) -> Result<(), SessionError> {
        let mut slot = self.inner.slot();
        self.inner.begin(ConnectionState::Connecting)?;
        tracing::info!(peer = %peer.display_name(), address = %peer.address, "connecting");

        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            match connector.connect(&peer).await {
                Ok(stream) => Inner::establish(&inner, stream, Role::Joiner),
                Err(e) => inner.fail(format!("Could not connect to {}: {e}", peer.display_name())),
            }
        });
        slot.pending = Some(task.abort_handle());
        Ok(())
    }

    /// Sends one message, bounded by the send timeout. A failed or timed
    /// out send tears the link down.
    ///
    /// # Errors
    /// Returns an error if not connected or the send fails.
    pub async fn send(&self, msg: &WireMessage) -> Result<(), SessionError> {
        let link = self.inner.current_link().ok_or(SessionError::NotConnected)?;
        self.inner.send_on(&link, msg).await
    }

    /// Closes the session from this side.
    ///
    /// A pending listen or connect is abandoned. An established link gets a
    /// best-effort disconnect notice and a short flush delay before closing;
    /// emits [`SessionEvent::Closed`] rather than a loss.
    pub async fn disconnect(&self) {
        let (cancelled, link) = {
            let mut slot = self.inner.slot();
            let state = self.state();
            let cancelled = slot.pending.take().is_some_and(|pending| {
                pending.abort();
                matches!(
                    state,
                    ConnectionState::Listening | ConnectionState::Connecting
                )
            });
            if cancelled {
                self.inner.state.send_replace(ConnectionState::Disconnected);
            }
            (cancelled.then_some(state), slot.link.clone())
        };

        if let Some(state) = cancelled {
            tracing::info!(%state, "connection attempt cancelled");
            self.inner.emit(SessionEvent::Closed);
        }

        if let Some(link) = link {
            let notice = WireMessage::OpponentDisconnected.to_frame();
            match tokio::time::timeout(self.inner.config.send_timeout(), link.write_frame(&notice))
                .await
            {
                Ok(Ok(())) => tracing::debug!("disconnect notice sent"),
                Ok(Err(e)) => tracing::debug!(error = %e, "disconnect notice failed"),
                Err(_) => tracing::debug!("disconnect notice timed out"),
            }
            tokio::time::sleep(self.inner.config.flush_delay()).await;
            self.inner.close_link(&link, None);
        }
    }
}

impl Inner {
    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            tracing::trace!("session event dropped, no receiver");
        }
    }

    fn current_link(&self) -> Option<Arc<Link>> {
        self.slot().link.clone()
    }

    /// Moves from Disconnected to `next`. Caller holds the slot lock.
    fn begin(&self, next: ConnectionState) -> Result<(), SessionError> {
        let current = *self.state.borrow();
        if !current.is_idle() {
            return Err(SessionError::Busy(current));
        }
        self.state.send_replace(next);
        Ok(())
    }

    fn fail(&self, reason: String) {
        let mut slot = self.slot();
        slot.pending = None;
        let state = *self.state.borrow();
        if matches!(
            state,
            ConnectionState::Listening | ConnectionState::Connecting
        ) {
            self.state.send_replace(ConnectionState::Disconnected);
            drop(slot);
            tracing::warn!(%reason, "connection attempt failed");
            self.emit(SessionEvent::ConnectionFailed(reason));
        }
    }

    fn establish(inner: &Arc<Self>, stream: BoxedStream, role: Role) {
        let mut slot = inner.slot();
        let state = *inner.state.borrow();
        if !matches!(
            state,
            ConnectionState::Listening | ConnectionState::Connecting
        ) {
            tracing::debug!(%state, "dropping stream for a cancelled attempt");
            return;
        }
        slot.pending = None;

        let (reader, writer) = tokio::io::split(stream);
        let link = Arc::new(Link::new(role, writer));
        slot.link = Some(Arc::clone(&link));
        inner.state.send_replace(ConnectionState::Connected);
        tracing::info!(?role, "peer connected");
        inner.emit(SessionEvent::Connected { role });

        let read = tokio::spawn(Self::read_loop(
            Arc::clone(inner),
            Arc::clone(&link),
            reader,
        ));
        link.track(read.abort_handle());
        let heartbeat = tokio::spawn(Self::heartbeat_loop(Arc::clone(inner), Arc::clone(&link)));
        link.track(heartbeat.abort_handle());
        let liveness = tokio::spawn(Self::liveness_loop(Arc::clone(inner), Arc::clone(&link)));
        link.track(liveness.abort_handle());
    }

    async fn send_on(&self, link: &Arc<Link>, msg: &WireMessage) -> Result<(), SessionError> {
        if link.is_closed() {
            return Err(SessionError::NotConnected);
        }
        let frame = msg.to_frame();
        match tokio::time::timeout(self.config.send_timeout(), link.write_frame(&frame)).await {
            Ok(Ok(())) => {
                tracing::trace!(message = %msg, "frame sent");
                Ok(())
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "send failed");
                self.close_link(link, Some(DisconnectReason::WriteFailed(e.to_string())));
                Err(SessionError::Io(e))
            }
            Err(_) => {
                tracing::warn!(timeout_ms = self.config.send_timeout_ms, "send timed out");
                self.close_link(link, Some(DisconnectReason::SendTimedOut));
                Err(SessionError::SendTimeout)
            }
        }
    }

    /// Single teardown path. Only the first call for a link has any effect.
    /// `None` means a local disconnect.
    fn close_link(&self, link: &Arc<Link>, reason: Option<DisconnectReason>) {
        if link.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        for task in link
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
        {
            task.abort();
        }

        {
            let mut slot = self.slot();
            if slot.link.as_ref().is_some_and(|l| Arc::ptr_eq(l, link)) {
                slot.link = None;
                self.state.send_replace(ConnectionState::Disconnected);
            }
        }

        match reason {
            Some(reason) => {
                tracing::info!(%reason, "peer lost");
                self.emit(SessionEvent::PeerLost(reason));
            }
            None => {
                tracing::info!("disconnected");
                self.emit(SessionEvent::Closed);
            }
        }
    }

    async fn read_loop(inner: Arc<Self>, link: Arc<Link>, mut reader: ReadHalf<BoxedStream>) {
        let mut decoder = FrameDecoder::new(inner.config.max_frame_len);
        let mut chunk = vec![0u8; inner.config.read_buffer_len];
        let mut malformed = 0u32;

        let reason = 'read: loop {
            let n = match reader.read(&mut chunk).await {
                Ok(0) => break DisconnectReason::PeerClosed,
                Ok(n) => n,
                Err(e) => break DisconnectReason::ReadFailed(e.to_string()),
            };
            decoder.extend(&chunk[..n]);

            while let Some(frame) = decoder.next_message() {
                match frame {
                    Ok(msg) => {
                        malformed = 0;
                        link.touch();
                        match msg {
                            WireMessage::Heartbeat(Heartbeat::Ping) => {
                                let pong = WireMessage::Heartbeat(Heartbeat::Pong);
                                if inner.send_on(&link, &pong).await.is_err() {
                                    return;
                                }
                            }
                            WireMessage::Heartbeat(Heartbeat::Pong) => {}
                            msg => {
                                tracing::debug!(message = %msg, "message received");
                                inner.emit(SessionEvent::Message(msg));
                            }
                        }
                    }
                    Err(e) => {
                        malformed += 1;
                        tracing::warn!(
                            error = %e,
                            consecutive = malformed,
                            "dropping malformed frame"
                        );
                        if inner
                            .config
                            .max_consecutive_malformed
                            .is_some_and(|max| malformed >= max)
                        {
                            break 'read DisconnectReason::ProtocolViolation;
                        }
                    }
                }
            }
        };
        inner.close_link(&link, Some(reason));
    }

    async fn heartbeat_loop(inner: Arc<Self>, link: Arc<Link>) {
        let period = inner.config.heartbeat_interval();
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let ping = WireMessage::Heartbeat(Heartbeat::Ping);
        loop {
            ticker.tick().await;
            if inner.send_on(&link, &ping).await.is_err() {
                break;
            }
        }
    }

    async fn liveness_loop(inner: Arc<Self>, link: Arc<Link>) {
        let timeout = inner.config.liveness_timeout();
        let period = inner.config.liveness_check_interval();
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let idle = link.idle();
            if idle > timeout {
                tracing::warn!(idle_ms = idle.as_millis(), "peer silent too long");
                inner.close_link(&link, Some(DisconnectReason::HeartbeatTimeout));
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use tictactoe_core::Player;
    use tictactoe_transport::MemoryNetwork;
    use tokio::io::DuplexStream;
    use tokio_test::{assert_err, assert_ok};

    use super::*;

    /// Hands out one prepared stream.
    struct OneShot(Option<BoxedStream>);

    #[async_trait]
    impl Acceptor for OneShot {
        fn local_address(&self) -> String {
            "test".to_string()
        }

        async fn accept(&mut self) -> std::io::Result<BoxedStream> {
            self.0
                .take()
                .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::BrokenPipe))
        }
    }

    async fn next(rx: &mut mpsc::UnboundedReceiver<SessionEvent>) -> SessionEvent {
        rx.recv().await.expect("event channel open")
    }

    /// Host session over one end of an in-memory pipe; the test drives the
    /// other end by hand.
    async fn host_with_raw_peer(
        config: SessionConfig,
        capacity: usize,
    ) -> (
        PeerSession,
        mpsc::UnboundedReceiver<SessionEvent>,
        DuplexStream,
    ) {
        let (ours, theirs) = tokio::io::duplex(capacity);
        let (session, mut rx) = PeerSession::new(config).unwrap();
        session.listen(Box::new(OneShot(Some(Box::new(ours))))).unwrap();
        assert_eq!(next(&mut rx).await, SessionEvent::Connected { role: Role::Host });
        (session, rx, theirs)
    }

    async fn connected_pair() -> (
        (PeerSession, mpsc::UnboundedReceiver<SessionEvent>),
        (PeerSession, mpsc::UnboundedReceiver<SessionEvent>),
    ) {
        let network = MemoryNetwork::new();
        let acceptor = network.advertise("TicTacToe_Game_7").unwrap();
        let peer = PeerInfo::new("TicTacToe_Game_7", acceptor.local_address());

        let (host, mut host_rx) = PeerSession::new(SessionConfig::default()).unwrap();
        let (joiner, mut joiner_rx) = PeerSession::new(SessionConfig::default()).unwrap();
        host.listen(Box::new(acceptor)).unwrap();
        assert_eq!(host.state(), ConnectionState::Listening);
        joiner.connect(Arc::new(network), peer).unwrap();

        assert_eq!(
            next(&mut host_rx).await,
            SessionEvent::Connected { role: Role::Host }
        );
        assert_eq!(
            next(&mut joiner_rx).await,
            SessionEvent::Connected { role: Role::Joiner }
        );
        ((host, host_rx), (joiner, joiner_rx))
    }

    #[tokio::test]
    async fn test_connect_and_exchange() {
        let ((host, _host_rx), (joiner, mut joiner_rx)) = connected_pair().await;
        assert_eq!(host.state(), ConnectionState::Connected);
        assert_eq!(joiner.state(), ConnectionState::Connected);
        assert_eq!(host.role(), Some(Role::Host));
        assert_eq!(joiner.role().map(Role::player), Some(Player::O));

        let info = WireMessage::PlayerInfo {
            name: "Ana".to_string(),
            role: Player::O,
        };
        assert_ok!(host.send(&info).await);
        assert_eq!(next(&mut joiner_rx).await, SessionEvent::Message(info));
    }

    #[tokio::test]
    async fn test_second_listen_is_busy() {
        let network = MemoryNetwork::new();
        let (session, _rx) = PeerSession::new(SessionConfig::default()).unwrap();
        session
            .listen(Box::new(network.advertise("a").unwrap()))
            .unwrap();
        let err = assert_err!(session.listen(Box::new(network.advertise("b").unwrap())));
        assert!(matches!(err, SessionError::Busy(ConnectionState::Listening)));
        let err = assert_err!(session.send(&WireMessage::GameStart).await);
        assert!(matches!(err, SessionError::NotConnected));
    }

    #[tokio::test]
    async fn test_connect_failure() {
        let network = MemoryNetwork::new();
        let (session, mut rx) = PeerSession::new(SessionConfig::default()).unwrap();
        session
            .connect(Arc::new(network), PeerInfo::new("gone", "mem:99"))
            .unwrap();
        assert!(matches!(
            next(&mut rx).await,
            SessionEvent::ConnectionFailed(_)
        ));
        assert_eq!(session.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_ping_is_answered_and_hidden() {
        let (_session, mut rx, mut peer) =
            host_with_raw_peer(SessionConfig::default(), 1024).await;
        peer.write_all(b"HEARTBEAT|ping\nGAME_START|start\n")
            .await
            .unwrap();

        let mut buf = [0u8; 15];
        peer.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"HEARTBEAT|pong\n");
        assert_eq!(
            next(&mut rx).await,
            SessionEvent::Message(WireMessage::GameStart)
        );
    }

    #[tokio::test]
    async fn test_mock_stream_eof() {
        let mock = tokio_test::io::Builder::new()
            .read(b"GAME_START|start\nHEARTBEAT|ping\n")
            .write(b"HEARTBEAT|pong\n")
            .build();
        let (session, mut rx) = PeerSession::new(SessionConfig::default()).unwrap();
        session
            .listen(Box::new(OneShot(Some(Box::new(mock)))))
            .unwrap();

        assert_eq!(
            next(&mut rx).await,
            SessionEvent::Connected { role: Role::Host }
        );
        assert_eq!(
            next(&mut rx).await,
            SessionEvent::Message(WireMessage::GameStart)
        );
        assert_eq!(
            next(&mut rx).await,
            SessionEvent::PeerLost(DisconnectReason::PeerClosed)
        );
        assert_eq!(session.state(), ConnectionState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeats_keep_link_alive() {
        let ((host, mut host_rx), (joiner, mut joiner_rx)) = connected_pair().await;
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(host.state(), ConnectionState::Connected);
        assert_eq!(joiner.state(), ConnectionState::Connected);
        assert!(host_rx.try_recv().is_err());
        assert!(joiner_rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_peer_times_out_once() {
        let start = Instant::now();
        let (session, mut rx, _peer) = host_with_raw_peer(SessionConfig::default(), 1024).await;

        assert_eq!(
            next(&mut rx).await,
            SessionEvent::PeerLost(DisconnectReason::HeartbeatTimeout)
        );
        assert!(start.elapsed() > Duration::from_secs(15));
        assert_eq!(session.state(), ConnectionState::Disconnected);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_eof_at_liveness_deadline_reports_once() {
        let start = Instant::now();
        let (session, mut rx, peer) = host_with_raw_peer(SessionConfig::default(), 1024).await;

        // the fourth liveness check trips; EOF and a failing ping land with it
        tokio::time::sleep_until(start + Duration::from_secs(20)).await;
        drop(peer);

        assert!(matches!(next(&mut rx).await, SessionEvent::PeerLost(_)));
        assert_eq!(session.state(), ConnectionState::Disconnected);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_send_and_eof_report_once() {
        let (session, mut rx, peer) = host_with_raw_peer(SessionConfig::default(), 1024).await;
        drop(peer);
        assert_err!(session.send(&WireMessage::GameStart).await);

        assert!(matches!(next(&mut rx).await, SessionEvent::PeerLost(_)));
        assert_eq!(session.state(), ConnectionState::Disconnected);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_unusable_config_is_rejected() {
        let config: SessionConfig = serde_json::from_str(r#"{"liveness_timeout_ms": 2}"#).unwrap();
        let Err(err) = PeerSession::new(config) else {
            panic!("liveness period of zero accepted");
        };
        assert_eq!(err, ConfigError::Zero("liveness_timeout_ms"));

        let config = SessionConfig {
            heartbeat_interval_ms: 0,
            ..SessionConfig::default()
        };
        let Err(err) = PeerSession::new(config) else {
            panic!("heartbeat period of zero accepted");
        };
        assert_eq!(err, ConfigError::Zero("heartbeat_interval_ms"));
    }

    #[tokio::test]
    async fn test_graceful_disconnect_notifies_peer() {
        let ((host, mut host_rx), (joiner, mut joiner_rx)) = connected_pair().await;
        host.disconnect().await;

        assert_eq!(next(&mut host_rx).await, SessionEvent::Closed);
        assert_eq!(host.state(), ConnectionState::Disconnected);
        assert_eq!(
            next(&mut joiner_rx).await,
            SessionEvent::Message(WireMessage::OpponentDisconnected)
        );
        assert_eq!(
            next(&mut joiner_rx).await,
            SessionEvent::PeerLost(DisconnectReason::PeerClosed)
        );
        assert_eq!(joiner.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_disconnect_while_listening() {
        let network = MemoryNetwork::new();
        let (session, mut rx) = PeerSession::new(SessionConfig::default()).unwrap();
        session
            .listen(Box::new(network.advertise("a").unwrap()))
            .unwrap();
        session.disconnect().await;
        assert_eq!(session.state(), ConnectionState::Disconnected);
        assert_eq!(next(&mut rx).await, SessionEvent::Closed);
        assert_ok!(session.listen(Box::new(network.advertise("b").unwrap())));
    }

    #[tokio::test]
    async fn test_malformed_frames_tolerated_until_limit() {
        let config = SessionConfig {
            max_consecutive_malformed: Some(3),
            ..SessionConfig::default()
        };
        let (session, mut rx, mut peer) = host_with_raw_peer(config, 1024).await;

        peer.write_all(b"JUNK\nMOVE|x|1|X\nGAME_QUIT|quit\n")
            .await
            .unwrap();
        assert_eq!(
            next(&mut rx).await,
            SessionEvent::Message(WireMessage::GameQuit)
        );
        assert_eq!(session.state(), ConnectionState::Connected);

        peer.write_all(b"JUNK\nJUNK\nJUNK\n").await.unwrap();
        assert_eq!(
            next(&mut rx).await,
            SessionEvent::PeerLost(DisconnectReason::ProtocolViolation)
        );
        assert_eq!(session.state(), ConnectionState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_timeout_drops_link() {
        // the raw peer never reads, so a large frame cannot be written
        let (session, mut rx, _peer) = host_with_raw_peer(SessionConfig::default(), 16).await;
        let info = WireMessage::PlayerInfo {
            name: "a rather long player name".to_string(),
            role: Player::O,
        };

        let err = assert_err!(session.send(&info).await);
        assert!(matches!(err, SessionError::SendTimeout));
        assert_eq!(
            next(&mut rx).await,
            SessionEvent::PeerLost(DisconnectReason::SendTimedOut)
        );
        assert_eq!(session.state(), ConnectionState::Disconnected);
    }
}
