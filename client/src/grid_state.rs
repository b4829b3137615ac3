//! Client-side projection of the shared grid
//!
//! The projection only changes in response to server packets. Clicking (or
//! typing) a cell never writes locally; the cell appears once the server
//! echoes it back as `CellUpdated`.
//!
//! `history` is always the server's record with commit timestamps. It is
//! filled by `InitState` and `History` only, never by cell echoes.

use log::{debug, warn};
use shared::{CellView, Packet, UpdateEvent};

/// What the UI should do after a packet has been applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Grid, count or identity changed
    Redraw,
    /// A fresh history log arrived
    History,
    /// The server rejected our request
    Error(String),
    /// The server ended our connection
    Disconnected(String),
    /// Nothing to show
    Ignored,
}

#[derive(Debug, Clone, Default)]
pub struct ClientGridState {
    pub grid: Vec<Vec<CellView>>,
    pub history: Vec<UpdateEvent>,
    pub you_id: Option<u32>,
    pub online_count: u32,
    pub submitted: bool,
    pub last_error: Option<String>,
}

impl ClientGridState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> usize {
        self.grid.len()
    }

    pub fn cols(&self) -> usize {
        self.grid.first().map_or(0, Vec::len)
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&CellView> {
        self.grid.get(row).and_then(|r| r.get(col))
    }

    pub fn is_initialized(&self) -> bool {
        self.you_id.is_some()
    }

    /// Applies one server packet to the projection
    pub fn apply_packet(&mut self, packet: Packet) -> Notice {
        match packet {
            Packet::InitState {
                grid,
                history,
                you_id,
            } => {
                self.submitted = history.iter().any(|e| e.client_id == you_id);
                self.grid = grid;
                self.history = history;
                self.you_id = Some(you_id);
                Notice::Redraw
            }

            Packet::CellUpdated { row, col, ch, by } => {
                self.apply_cell_update(row, col, ch, by);
                Notice::Redraw
            }

            Packet::OnlineCount { count } => {
                self.online_count = count;
                Notice::Redraw
            }

            Packet::History { events } => {
                self.history = events;
                Notice::History
            }

            Packet::ErrorMsg { message } => {
                self.last_error = Some(message.clone());
                Notice::Error(message)
            }

            Packet::Disconnected { reason } => {
                self.you_id = None;
                Notice::Disconnected(reason)
            }

            other => {
                warn!("Unexpected packet from server: {:?}", other);
                Notice::Ignored
            }
        }
    }

    fn apply_cell_update(&mut self, row: u32, col: u32, ch: String, by: u32) {
        let Some(cell) = self
            .grid
            .get_mut(row as usize)
            .and_then(|r| r.get_mut(col as usize))
        else {
            debug!("Update for ({}, {}) arrived before the grid", row, col);
            return;
        };

        // A late InitState may already contain this write
        if cell.is_filled() {
            return;
        }

        cell.ch = Some(ch);
        cell.filled_by = Some(by);

        if Some(by) == self.you_id {
            self.submitted = true;
        }
    }
}
