//! Grid session coordinator
//!
//! [`GridSession`] is the single owner of everything a session mutates: the
//! grid, the ordered update history, the set of clients that have used their
//! one submission, and the set of live connections. It never touches a socket.
//! Each operation returns the [`SessionEvent`]s that the transport must deliver,
//! so the caller decides how to fan them out.
//!
//! The type takes `&mut self` for every mutation. Whoever owns it (the server
//! loop) therefore applies requests strictly one after another, which is what
//! makes the occupied/submitted checks and the commit a single atomic step.

use crate::error::UpdateRejection;
use crate::grid::Grid;
use log::{info, warn};
use shared::{get_timestamp, normalize_char, Packet, UpdateEvent};
use std::collections::HashSet;

/// Outbound notification produced by the coordinator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Deliver to one client only
    SendTo { client_id: u32, packet: Packet },
    /// Deliver to every client connected when the event was produced
    Broadcast { packet: Packet },
}

#[derive(Debug)]
pub struct GridSession {
    grid: Grid,
    history: Vec<UpdateEvent>,
    submitted: HashSet<u32>,
    active: HashSet<u32>,
}

impl GridSession {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            grid: Grid::new(rows, cols),
            history: Vec::new(),
            submitted: HashSet::new(),
            active: HashSet::new(),
        }
    }

    /// Registers a new connection. The new client gets the full state, then
    /// everyone (the new client included) gets the updated online count.
    pub fn on_connect(&mut self, client_id: u32) -> Vec<SessionEvent> {
        self.active.insert(client_id);
        info!(
            "Client {} joined session ({} online)",
            client_id,
            self.active.len()
        );

        vec![
            SessionEvent::SendTo {
                client_id,
                packet: Packet::InitState {
                    grid: self.grid.snapshot(),
                    history: self.history.clone(),
                    you_id: client_id,
                },
            },
            self.online_count_event(),
        ]
    }

    /// Handles an `update-cell` request. On success every client receives
    /// `CellUpdated`; on rejection only the requester receives `ErrorMsg`.
    pub fn on_update_request(
        &mut self,
        client_id: u32,
        row: i32,
        col: i32,
        ch: &str,
    ) -> Vec<SessionEvent> {
        if !self.active.contains(&client_id) {
            warn!("Ignoring update from inactive client {}", client_id);
            return Vec::new();
        }

        match self.try_commit(client_id, row, col, ch, get_timestamp()) {
            Ok(event) => vec![SessionEvent::Broadcast {
                packet: Packet::CellUpdated {
                    row: event.row,
                    col: event.col,
                    ch: event.ch,
                    by: event.client_id,
                },
            }],
            Err(rejection) => {
                warn!(
                    "Rejected update from client {} at ({}, {}): {}",
                    client_id, row, col, rejection
                );
                vec![SessionEvent::SendTo {
                    client_id,
                    packet: Packet::ErrorMsg {
                        message: rejection.to_string(),
                    },
                }]
            }
        }
    }

    /// Validates and applies one update. Either the grid write, the history
    /// append and the submission record all happen, or none of them do.
    pub fn try_commit(
        &mut self,
        client_id: u32,
        row: i32,
        col: i32,
        ch: &str,
        timestamp: u64,
    ) -> Result<UpdateEvent, UpdateRejection> {
        if self.submitted.contains(&client_id) {
            return Err(UpdateRejection::AlreadySubmitted);
        }

        let (r, c) = self
            .grid
            .checked_position(row.into(), col.into())
            .ok_or(UpdateRejection::InvalidCoordinate { row, col })?;

        let ch = normalize_char(ch).ok_or(UpdateRejection::InvalidInput)?;

        if !self.grid.fill(r, c, ch, client_id, timestamp) {
            return Err(UpdateRejection::CellOccupied);
        }

        let event = UpdateEvent {
            row: r as u32,
            col: c as u32,
            ch: ch.to_string(),
            client_id,
            timestamp,
        };
        self.history.push(event.clone());
        self.submitted.insert(client_id);

        info!("Client {} filled ({}, {}) with {:?}", client_id, r, c, ch);
        Ok(event)
    }

    /// Drops a connection. Submission status and filled cells are kept.
    pub fn on_disconnect(&mut self, client_id: u32) -> Vec<SessionEvent> {
        if !self.active.remove(&client_id) {
            return Vec::new();
        }
        info!(
            "Client {} left session ({} online)",
            client_id,
            self.active.len()
        );
        vec![self.online_count_event()]
    }

    /// Full history in commit order
    pub fn history(&self) -> &[UpdateEvent] {
        &self.history
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn online_count(&self) -> usize {
        self.active.len()
    }

    pub fn is_active(&self, client_id: u32) -> bool {
        self.active.contains(&client_id)
    }

    pub fn has_submitted(&self, client_id: u32) -> bool {
        self.submitted.contains(&client_id)
    }

    fn online_count_event(&self) -> SessionEvent {
        SessionEvent::Broadcast {
            packet: Packet::OnlineCount {
                count: self.active.len() as u32,
            },
        }
    }
}
