//! Connection registry for the grid server
//!
//! Maps UDP peer addresses to the connection ids the session knows about.
//! Ids start at 1, go up by one per admitted connection and are never handed
//! out twice in the lifetime of a server, so a peer that comes back always
//! looks like a brand-new participant to the session.
//!
//! The registry has no idea what a grid is; it only answers "who is at
//! which address".

use log::info;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Liveness record for one address
#[derive(Debug, Clone, Copy)]
struct Connection {
    client_id: u32,
    last_heard: Instant,
}

pub struct ConnectionRegistry {
    by_addr: HashMap<SocketAddr, Connection>,
    next_id: u32,
    capacity: usize,
    silence_limit: Duration,
}

impl ConnectionRegistry {
    pub fn new(capacity: usize, silence_limit: Duration) -> Self {
        Self {
            by_addr: HashMap::new(),
            next_id: 1,
            capacity,
            silence_limit,
        }
    }

    /// Gives `addr` a fresh id, or `None` when the registry is full.
    /// An address that is still registered is refused as well; release it
    /// first with [`ConnectionRegistry::release_addr`].
    pub fn admit(&mut self, addr: SocketAddr) -> Option<u32> {
        if self.by_addr.contains_key(&addr) {
            return None;
        }
        if self.by_addr.len() >= self.capacity {
            info!("Registry full ({}), refusing {}", self.capacity, addr);
            return None;
        }

        let client_id = self.next_id;
        self.next_id += 1;
        self.by_addr.insert(
            addr,
            Connection {
                client_id,
                last_heard: Instant::now(),
            },
        );
        info!("Connection {} admitted from {}", client_id, addr);

        Some(client_id)
    }

    /// Drops the connection with `client_id`, returning its address
    pub fn release(&mut self, client_id: u32) -> Option<SocketAddr> {
        let addr = self.addr_of(client_id)?;
        self.by_addr.remove(&addr);
        info!("Connection {} at {} released", client_id, addr);
        Some(addr)
    }

    /// Drops whatever connection is registered at `addr`, returning its id
    pub fn release_addr(&mut self, addr: SocketAddr) -> Option<u32> {
        let connection = self.by_addr.remove(&addr)?;
        info!("Connection {} at {} released", connection.client_id, addr);
        Some(connection.client_id)
    }

    /// Marks `addr` as alive and returns the id registered there
    pub fn heard_from(&mut self, addr: SocketAddr) -> Option<u32> {
        let connection = self.by_addr.get_mut(&addr)?;
        connection.last_heard = Instant::now();
        Some(connection.client_id)
    }

    pub fn addr_of(&self, client_id: u32) -> Option<SocketAddr> {
        self.by_addr
            .iter()
            .find_map(|(addr, c)| (c.client_id == client_id).then_some(*addr))
    }

    /// Releases every connection silent for longer than the limit and
    /// returns their ids in ascending order.
    pub fn expire_silent(&mut self) -> Vec<u32> {
        let limit = self.silence_limit;
        let mut expired = Vec::new();
        self.by_addr.retain(|addr, c| {
            let alive = c.last_heard.elapsed() <= limit;
            if !alive {
                info!("Connection {} at {} went silent", c.client_id, addr);
                expired.push(c.client_id);
            }
            alive
        });
        expired.sort_unstable();
        expired
    }

    /// Every registered address
    pub fn addrs(&self) -> Vec<SocketAddr> {
        self.by_addr.keys().copied().collect()
    }
}
