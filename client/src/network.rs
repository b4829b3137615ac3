use crate::grid_state::{ClientGridState, Notice};
use crate::input::{parse_command, Command, HELP};
use crate::rendering::{render, render_history};
use bincode::{deserialize, serialize};
use log::{error, info, warn};
use shared::{Packet, MAX_PACKET_SIZE, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::UdpSocket;
use tokio::time::{interval, timeout};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(1);
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(3);

pub struct Client {
    socket: UdpSocket,
    server_addr: SocketAddr,
    state: ClientGridState,
    buffer: Vec<u8>,
}

impl Client {
    pub async fn new(server_addr: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        let server_addr = server_addr.parse()?;

        Ok(Client {
            socket,
            server_addr,
            state: ClientGridState::new(),
            buffer: vec![0u8; MAX_PACKET_SIZE],
        })
    }

    pub fn state(&self) -> &ClientGridState {
        &self.state
    }

    async fn send_packet(&self, packet: &Packet) -> Result<(), Box<dyn std::error::Error>> {
        let data = serialize(packet)?;
        self.socket.send_to(&data, self.server_addr).await?;
        Ok(())
    }

    async fn recv_packet(&mut self) -> Result<Packet, Box<dyn std::error::Error>> {
        loop {
            let (len, addr) = self.socket.recv_from(&mut self.buffer).await?;
            if addr != self.server_addr {
                warn!("Ignoring datagram from unexpected peer {}", addr);
                continue;
            }
            match deserialize::<Packet>(&self.buffer[..len]) {
                Ok(packet) => return Ok(packet),
                Err(e) => warn!("Failed to deserialize packet: {}", e),
            }
        }
    }

    /// Sends `Connect` and waits for the initial state
    pub async fn connect(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        info!("Connecting to {}...", self.server_addr);
        self.send_packet(&Packet::Connect {
            client_version: PROTOCOL_VERSION,
        })
        .await?;

        timeout(RESPONSE_TIMEOUT, async {
            while !self.state.is_initialized() {
                let packet = self.recv_packet().await?;
                if let Notice::Disconnected(reason) = self.state.apply_packet(packet) {
                    return Err(format!("Connection refused: {}", reason).into());
                }
            }
            Ok::<(), Box<dyn std::error::Error>>(())
        })
        .await
        .map_err(|_| "Timed out waiting for the server")??;

        info!("Connected! Client ID: {:?}", self.state.you_id);
        Ok(())
    }

    /// Asks the server for its history log and waits for the answer.
    /// Works with or without a prior `connect`.
    pub async fn fetch_history(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.send_packet(&Packet::RequestHistory).await?;

        timeout(RESPONSE_TIMEOUT, async {
            loop {
                let packet = self.recv_packet().await?;
                if self.state.apply_packet(packet) == Notice::History {
                    return Ok::<(), Box<dyn std::error::Error>>(());
                }
            }
        })
        .await
        .map_err(|_| "Timed out waiting for history")??;

        Ok(())
    }

    pub async fn disconnect(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if self.state.is_initialized() {
            self.send_packet(&Packet::Disconnect).await?;
            self.state.you_id = None;
        }
        Ok(())
    }

    /// Prints the history log without joining the session
    pub async fn print_history(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.fetch_history().await?;
        print!("{}", render_history(&self.state.history));
        Ok(())
    }

    /// Returns false once the user asked to quit
    async fn handle_command(
        &mut self,
        command: Command,
    ) -> Result<bool, Box<dyn std::error::Error>> {
        match command {
            Command::Set { row, col, ch } => {
                if self.state.submitted {
                    println!("You already submitted and cannot edit again.");
                } else {
                    self.send_packet(&Packet::UpdateCell { row, col, ch }).await?;
                }
            }
            Command::History => self.send_packet(&Packet::RequestHistory).await?,
            Command::Show => print!("{}", render(&self.state)),
            Command::Help => println!("{}", HELP),
            Command::Quit => return Ok(false),
        }
        Ok(true)
    }

    fn handle_notice(&self, notice: Notice) -> bool {
        match notice {
            Notice::Redraw => print!("{}", render(&self.state)),
            Notice::History => print!("{}", render_history(&self.state.history)),
            Notice::Error(message) => println!("Error: {}", message),
            Notice::Disconnected(reason) => {
                warn!("Disconnected: {}", reason);
                println!("Disconnected: {}", reason);
                return false;
            }
            Notice::Ignored => {}
        }
        true
    }

    /// Interactive session: reads commands from stdin until `quit` or EOF
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.connect().await?;
        print!("{}", render(&self.state));
        println!("{}", HELP);

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut heartbeat = interval(HEARTBEAT_INTERVAL);

        loop {
            tokio::select! {
                result = self.socket.recv_from(&mut self.buffer) => {
                    match result {
                        Ok((len, addr)) if addr == self.server_addr => {
                            match deserialize::<Packet>(&self.buffer[..len]) {
                                Ok(packet) => {
                                    let notice = self.state.apply_packet(packet);
                                    if !self.handle_notice(notice) {
                                        return Ok(());
                                    }
                                }
                                Err(e) => warn!("Failed to deserialize packet: {}", e),
                            }
                        }
                        Ok((_, addr)) => warn!("Ignoring datagram from unexpected peer {}", addr),
                        Err(e) => error!("Error receiving packet: {}", e),
                    }
                },

                line = lines.next_line() => {
                    let Some(line) = line? else {
                        break;
                    };
                    match parse_command(&line) {
                        Ok(command) => {
                            if !self.handle_command(command).await? {
                                break;
                            }
                        }
                        Err(message) => println!("{}", message),
                    }
                },

                _ = heartbeat.tick() => {
                    if let Err(e) = self.send_packet(&Packet::Heartbeat).await {
                        error!("Error sending heartbeat: {}", e);
                    }
                },
            }
        }

        self.disconnect().await
    }
}
