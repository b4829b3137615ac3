//! Server network layer: UDP transport around the grid session
//!
//! One loop owns the [`GridSession`] and applies every inbound event in
//! arrival order. Socket reads, outbound sends and timeout sweeps run as
//! separate tasks that talk to the loop over channels.

use crate::registry::ConnectionRegistry;
use crate::session::{GridSession, SessionEvent};
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::{Packet, GRID_COLS, GRID_ROWS, MAX_GRID_DIM, MAX_PACKET_SIZE, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;

type SendError = Box<dyn std::error::Error + Send + Sync>;

/// Messages sent from network tasks to the server loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived { packet: Packet, addr: SocketAddr },
    ClientTimeout { client_id: u32 },
    Shutdown,
}

/// Messages sent from the server loop to the sender task
#[derive(Debug)]
pub enum OutboundMessage {
    SendPacket {
        packet: Packet,
        addr: SocketAddr,
    },
    BroadcastPacket {
        packet: Packet,
        addrs: Vec<SocketAddr>,
    },
}

/// Runtime settings for a session
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub rows: usize,
    pub cols: usize,
    pub max_clients: usize,
    pub client_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            rows: GRID_ROWS,
            cols: GRID_COLS,
            max_clients: 64,
            client_timeout: Duration::from_secs(5),
        }
    }
}

/// Main server coordinating networking and the grid session
pub struct Server {
    socket: Arc<UdpSocket>,
    registry: Arc<RwLock<ConnectionRegistry>>,
    session: GridSession,
    client_timeout: Duration,

    // Communication channels
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    outbound_tx: mpsc::UnboundedSender<OutboundMessage>,
    outbound_rx: Option<mpsc::UnboundedReceiver<OutboundMessage>>,

    // Background tasks started by `run`
    tasks: Vec<JoinHandle<()>>,
}

impl Server {
    pub async fn new(
        addr: &str,
        config: ServerConfig,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        for (name, value) in [("rows", config.rows), ("cols", config.cols)] {
            if value == 0 || value > MAX_GRID_DIM {
                return Err(format!(
                    "{} must be between 1 and {}, got {}",
                    name, MAX_GRID_DIM, value
                )
                .into());
            }
        }

        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!(
            "Server listening on {} ({}x{} grid)",
            socket.local_addr()?,
            config.rows,
            config.cols
        );

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            registry: Arc::new(RwLock::new(ConnectionRegistry::new(
                config.max_clients,
                config.client_timeout,
            ))),
            session: GridSession::new(config.rows, config.cols),
            client_timeout: config.client_timeout,
            server_tx,
            server_rx,
            outbound_tx,
            outbound_rx: Some(outbound_rx),
            tasks: Vec::new(),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Sender that stops [`Server::run`] when given [`ServerMessage::Shutdown`]
    pub fn shutdown_handle(&self) -> mpsc::UnboundedSender<ServerMessage> {
        self.server_tx.clone()
    }

    /// Spawns task that continuously listens for incoming packets
    fn spawn_network_receiver(&self) -> JoinHandle<()> {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = vec![0u8; MAX_PACKET_SIZE];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        if let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) {
                            debug!("Received {:?} from {}", packet, addr);
                            if let Err(e) =
                                server_tx.send(ServerMessage::PacketReceived { packet, addr })
                            {
                                error!("Failed to send packet to main loop: {}", e);
                                break;
                            }
                        } else {
                            warn!("Failed to deserialize packet from {}", addr);
                        }
                    }
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        })
    }

    /// Spawns task that drains the outbound queue
    fn spawn_network_sender(&mut self) -> Option<JoinHandle<()>> {
        let socket = Arc::clone(&self.socket);
        let mut outbound_rx = self.outbound_rx.take()?;

        Some(tokio::spawn(async move {
            while let Some(message) = outbound_rx.recv().await {
                match message {
                    OutboundMessage::SendPacket { packet, addr } => {
                        if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                            error!("Failed to send packet to {}: {}", addr, e);
                        }
                    }
                    OutboundMessage::BroadcastPacket { packet, addrs } => {
                        let data = match encode(&packet) {
                            Ok(data) => data,
                            Err(e) => {
                                error!("Failed to encode broadcast: {}", e);
                                continue;
                            }
                        };

                        for addr in addrs {
                            if let Err(e) = socket.send_to(&data, addr).await {
                                error!("Failed to send to {}: {}", addr, e);
                            }
                        }
                    }
                }
            }
        }))
    }

    /// Spawns task that monitors client timeouts
    fn spawn_timeout_checker(&self) -> JoinHandle<()> {
        let registry = Arc::clone(&self.registry);
        let server_tx = self.server_tx.clone();
        let period =
            (self.client_timeout / 2).clamp(Duration::from_millis(10), Duration::from_secs(1));

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);

            loop {
                interval.tick().await;

                let timed_out = registry.write().await.expire_silent();

                for client_id in timed_out {
                    if let Err(e) = server_tx.send(ServerMessage::ClientTimeout { client_id }) {
                        error!("Failed to send timeout message: {}", e);
                        return;
                    }
                }
            }
        })
    }

    async fn send_packet_impl(
        socket: &UdpSocket,
        packet: &Packet,
        addr: SocketAddr,
    ) -> Result<(), SendError> {
        let data = encode(packet)?;
        socket.send_to(&data, addr).await?;
        Ok(())
    }

    fn send_packet(&self, packet: Packet, addr: SocketAddr) {
        if let Err(e) = self
            .outbound_tx
            .send(OutboundMessage::SendPacket { packet, addr })
        {
            error!("Failed to queue packet for sending: {}", e);
        }
    }

    /// Resolves session events to addresses and queues them for sending.
    /// Recipients are fixed here, so a broadcast reaches exactly the
    /// connections that were registered when it was produced.
    async fn dispatch(&self, events: Vec<SessionEvent>) {
        if events.is_empty() {
            return;
        }

        let registry = self.registry.read().await;
        for event in events {
            let message = match event {
                SessionEvent::SendTo { client_id, packet } => match registry.addr_of(client_id) {
                    Some(addr) => OutboundMessage::SendPacket { packet, addr },
                    None => {
                        debug!("Dropping packet for departed client {}", client_id);
                        continue;
                    }
                },
                SessionEvent::Broadcast { packet } => OutboundMessage::BroadcastPacket {
                    packet,
                    addrs: registry.addrs(),
                },
            };

            if let Err(e) = self.outbound_tx.send(message) {
                error!("Failed to queue outbound packet: {}", e);
            }
        }
    }

    async fn handle_connect(&mut self, client_version: u32, addr: SocketAddr) {
        info!(
            "Client connecting from {} (version: {})",
            addr, client_version
        );

        if client_version != PROTOCOL_VERSION {
            self.send_packet(
                Packet::Disconnected {
                    reason: "Protocol version mismatch".to_string(),
                },
                addr,
            );
            return;
        }

        // A second Connect from the same address ends the old connection,
        // and its count update must go out before the new one is registered
        let replaced = self.registry.write().await.release_addr(addr);
        if let Some(old_id) = replaced {
            info!("Client {} at {} reconnected", old_id, addr);
            let events = self.session.on_disconnect(old_id);
            self.dispatch(events).await;
        }

        let client_id = self.registry.write().await.admit(addr);

        match client_id {
            Some(client_id) => {
                let events = self.session.on_connect(client_id);
                self.dispatch(events).await;
            }
            None => {
                warn!("Refusing {}: server full", addr);
                self.send_packet(
                    Packet::Disconnected {
                        reason: "Server full".to_string(),
                    },
                    addr,
                );
            }
        }
    }

    /// Processes one inbound packet against the session
    async fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) {
        match packet {
            Packet::Connect { client_version } => {
                self.handle_connect(client_version, addr).await;
                return;
            }
            // Read-only, so any peer may ask without joining the session
            Packet::RequestHistory => {
                let events = self.session.history().to_vec();
                self.send_packet(Packet::History { events }, addr);
                return;
            }
            _ => {}
        }

        let client_id = self.registry.write().await.heard_from(addr);
        let Some(client_id) = client_id else {
            warn!("Ignoring packet from unknown peer {}", addr);
            return;
        };

        match packet {
            Packet::UpdateCell { row, col, ch } => {
                let events = self.session.on_update_request(client_id, row, col, &ch);
                self.dispatch(events).await;
            }

            Packet::Heartbeat => {
                debug!("Heartbeat from client {}", client_id);
            }

            Packet::Disconnect => {
                self.registry.write().await.release(client_id);
                let events = self.session.on_disconnect(client_id);
                self.dispatch(events).await;
            }

            _ => {
                warn!(
                    "Unexpected packet type from client {} at {}",
                    client_id, addr
                );
            }
        }
    }

    /// Tells every connected client the session is over
    async fn notify_shutdown(&self) {
        let packet = Packet::Disconnected {
            reason: "Server shutting down".to_string(),
        };
        let addrs = self.registry.read().await.addrs();

        for addr in addrs {
            if let Err(e) = Self::send_packet_impl(&self.socket, &packet, addr).await {
                error!("Failed to notify {} of shutdown: {}", addr, e);
            }
        }
    }

    /// Applies one message from the network tasks. Returns false on shutdown.
    async fn handle_message(&mut self, message: ServerMessage) -> bool {
        match message {
            ServerMessage::PacketReceived { packet, addr } => {
                self.handle_packet(packet, addr).await;
            }
            ServerMessage::ClientTimeout { client_id } => {
                let events = self.session.on_disconnect(client_id);
                self.dispatch(events).await;
            }
            ServerMessage::Shutdown => {
                info!("Server shutting down");
                return false;
            }
        }
        true
    }

    /// Main server loop. Returns after a [`ServerMessage::Shutdown`], once
    /// clients have been told and the background tasks are stopped.
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let sender = self.spawn_network_sender();
        let receiver = self.spawn_network_receiver();
        let checker = self.spawn_timeout_checker();
        self.tasks.extend(sender);
        self.tasks.extend([receiver, checker]);

        info!("Server started successfully");

        while let Some(message) = self.server_rx.recv().await {
            if !self.handle_message(message).await {
                break;
            }
        }

        self.notify_shutdown().await;

        // Packets still queued for the sender at this point are dropped
        for task in self.tasks.drain(..) {
            task.abort();
            let _ = task.await;
        }
        Ok(())
    }
}

/// Serializes a packet, refusing anything that would not fit in one datagram
fn encode(packet: &Packet) -> Result<Vec<u8>, SendError> {
    let data = serialize(packet)?;
    if data.len() > MAX_PACKET_SIZE {
        return Err(format!("packet of {} bytes exceeds datagram limit", data.len()).into());
    }
    Ok(data)
}
