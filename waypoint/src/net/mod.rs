use std::{
    net::SocketAddr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicI32, Ordering},
    },
};

use bytes::Bytes;
use crossbeam::atomic::AtomicCell;
use tokio::{
    io::{AsyncRead, BufReader, BufWriter},
    net::{
        TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
    sync::{
        Notify,
        mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel},
    },
    task::JoinHandle,
};
use tokio_util::task::TaskTracker;

use waypoint_config::ProxyConfiguration;
use waypoint_protocol::{
    ClientPacket, ConnectionState, ProtocolVersion, RawPacket, ServerPacket,
    client::{login::CLoginDisconnect, play::CPlayDisconnect},
    packet_decoder::{NetworkDecoder, PacketDecodeError},
    packet_encoder::NetworkEncoder,
    ser::{ReadingError, packet::Packet},
    server::{
        handshake::SHandShake,
        login::SLoginStart,
        status::{SStatusPingRequest, SStatusRequest},
    },
};
use waypoint_util::text::TextComponent;

pub mod forwarding;
mod packet;
pub mod tablist;

/// One client connection to the proxy. Packets are serialized by the caller
/// and drained onto the socket by a writer task, so enqueueing never blocks.
pub struct Connection {
    /// The connection id, only used for logging
    pub id: usize,
    /// The address the client connected from
    pub address: SocketAddr,
    /// The minecraft protocol version negotiated in the handshake
    pub protocol_version: AtomicI32,
    /// The virtual host the client asked for in the handshake
    pub server_address: Mutex<String>,
    /// The current connection state (e.g., Handshaking, Status, Play)
    pub connection_state: AtomicCell<ConnectionState>,
    /// Indicates if the connection is closed
    pub closed: AtomicBool,
    /// A collection of tasks associated with this connection, awaited on teardown
    tasks: TaskTracker,
    /// A notifier that is triggered when this connection is closed
    close_interrupt: Notify,
    /// Serialized packets waiting for the writer task
    outgoing: UnboundedSender<Bytes>,
}

impl Connection {
    /// Wraps an accepted socket. The read half is returned to the caller,
    /// which drives the packet loop; the write half is owned by a writer task.
    pub fn new(
        stream: TcpStream,
        address: SocketAddr,
        id: usize,
    ) -> (Arc<Self>, NetworkDecoder<BufReader<OwnedReadHalf>>) {
        let (read, write) = stream.into_split();
        let (connection, outgoing) = Self::channel(address, id);
        connection.spawn_writer(outgoing, NetworkEncoder::new(BufWriter::new(write)));
        (connection, NetworkDecoder::new(BufReader::new(read)))
    }

    /// Builds a connection around a bare outgoing queue. [`Self::new`] attaches
    /// the queue to a socket; tests attach it to nothing and read the frames
    /// back out.
    pub fn channel(address: SocketAddr, id: usize) -> (Arc<Self>, UnboundedReceiver<Bytes>) {
        let (send, recv) = unbounded_channel();
        let connection = Arc::new(Self {
            id,
            address,
            protocol_version: AtomicI32::new(0),
            server_address: Mutex::new(String::new()),
            connection_state: AtomicCell::new(ConnectionState::HandShake),
            closed: AtomicBool::new(false),
            tasks: TaskTracker::new(),
            close_interrupt: Notify::new(),
            outgoing: send,
        });
        (connection, recv)
    }

    fn spawn_writer(
        self: &Arc<Self>,
        mut outgoing: UnboundedReceiver<Bytes>,
        mut encoder: NetworkEncoder<BufWriter<OwnedWriteHalf>>,
    ) {
        let connection = self.clone();
        self.spawn_task(async move {
            loop {
                let packet_data = tokio::select! {
                    () = connection.await_close_interrupt() => break,
                    packet_data = outgoing.recv() => {
                        let Some(packet_data) = packet_data else { return };
                        packet_data
                    }
                };

                if let Err(err) = encoder.write_packet(packet_data).await {
                    // It is expected that the packet will fail if we are closed
                    if !connection.closed.load(Ordering::Relaxed) {
                        log::warn!("Failed to send packet to client {}: {}", connection.id, err);
                        connection.close();
                    }
                    return;
                }
            }

            // Deliver what was queued before the close, the disconnect packet
            // in particular
            while let Ok(packet_data) = outgoing.try_recv() {
                if encoder.write_packet(packet_data).await.is_err() {
                    break;
                }
            }
        });
    }

    pub async fn await_close_interrupt(&self) {
        self.close_interrupt.notified().await;
    }

    pub async fn await_tasks(&self) {
        self.tasks.close();
        self.tasks.wait().await;
    }

    /// Spawns a task associated with this connection. All tasks spawned with
    /// this method are awaited when the connection closes. This means tasks
    /// should complete in a reasonable amount of time or select on
    /// `Self::await_close_interrupt` to cancel when the connection is closed.
    ///
    /// Returns `None` if the connection is already closed.
    pub fn spawn_task<F>(&self, task: F) -> Option<JoinHandle<F::Output>>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        if self.closed.load(Ordering::Relaxed) {
            None
        } else {
            Some(self.tasks.spawn(task))
        }
    }

    pub fn protocol_version(&self) -> ProtocolVersion {
        ProtocolVersion(self.protocol_version.load(Ordering::Relaxed))
    }

    /// Queues a clientbound packet. The queue is unbounded, so this never
    /// blocks; packets queued after [`Self::close`] are silently dropped.
    pub fn enqueue_packet<P: ClientPacket>(&self, packet: &P) {
        let mut packet_buf = Vec::new();
        if let Err(err) = packet.write(&mut packet_buf) {
            log::error!("Failed to serialize packet {}: {}", P::PACKET_ID, err);
            return;
        }
        self.enqueue_packet_data(packet_buf.into());
    }

    pub fn enqueue_packet_data(&self, packet_data: Bytes) {
        if self.closed.load(Ordering::Relaxed) {
            return;
        }
        // The receiver only goes away once the writer task exits on close
        let _ = self.outgoing.send(packet_data);
    }

    /// Gets the next packet from the network or `None` if the connection has
    /// closed.
    pub async fn get_packet(
        &self,
        decoder: &mut NetworkDecoder<impl AsyncRead + Unpin>,
    ) -> Option<RawPacket> {
        tokio::select! {
            () = self.await_close_interrupt() => {
                log::debug!("Canceling packet processing for {}", self.id);
                None
            },
            packet_result = decoder.get_raw_packet() => {
                match packet_result {
                    Ok(packet) => Some(packet),
                    Err(err) => {
                        if !matches!(err, PacketDecodeError::ConnectionClosed) {
                            log::warn!("Failed to decode packet from client {}: {}", self.id, err);
                        }
                        None
                    }
                }
            }
        }
    }

    /// Routes an incoming packet to the handler for the current connection
    /// state.
    pub fn handle_packet(
        &self,
        config: &ProxyConfiguration,
        packet: &RawPacket,
    ) -> Result<(), ReadingError> {
        let payload = &packet.payload[..];
        match self.connection_state.load() {
            ConnectionState::HandShake => match packet.id {
                SHandShake::PACKET_ID => self.handle_handshake(SHandShake::read(payload)?),
                _ => log::error!("Failed to handle packet id {} in Handshake state", packet.id),
            },
            ConnectionState::Status => match packet.id {
                SStatusRequest::PACKET_ID => self.handle_status_request(config),
                SStatusPingRequest::PACKET_ID => {
                    self.handle_ping_request(SStatusPingRequest::read(payload)?);
                }
                _ => log::error!("Failed to handle packet id {} in Status state", packet.id),
            },
            ConnectionState::Login | ConnectionState::Transfer => match packet.id {
                SLoginStart::PACKET_ID => {
                    self.handle_login_start(config, SLoginStart::read(payload)?);
                }
                _ => log::error!("Failed to handle packet id {} in Login state", packet.id),
            },
            state => log::error!("Invalid connection state {state:?}"),
        }
        Ok(())
    }

    /// Disconnects the client with a reason. The appropriate disconnect packet
    /// is chosen based on the current connection state.
    pub fn kick(&self, reason: TextComponent) {
        match self.connection_state.load() {
            ConnectionState::Login | ConnectionState::Transfer => {
                let json = serde_json::to_string(&reason).unwrap_or_else(|_| String::new());
                self.enqueue_packet(&CLoginDisconnect::new(&json));
            }
            ConnectionState::Play => self.enqueue_packet(&CPlayDisconnect::new(reason)),
            state => {
                log::warn!("Can't kick in {state:?} state");
                return;
            }
        }
        log::debug!("Closing connection for {}", self.id);
        self.close();
    }

    /// Closes the connection.
    ///
    /// This only marks the connection as closed and wakes its tasks; no
    /// disconnect packet is sent. Use [`Self::kick`] to tell the client why.
    pub fn close(&self) {
        self.close_interrupt.notify_waiters();
        self.closed.store(true, Ordering::Relaxed);
        log::debug!("Closed connection for {}", self.id);
    }
}
