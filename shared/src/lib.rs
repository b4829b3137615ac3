use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use unicode_segmentation::UnicodeSegmentation;

pub const GRID_ROWS: usize = 10;
pub const GRID_COLS: usize = 10;
/// Largest row or column count a session may be started with. Keeps a full
/// `InitState` inside a single datagram.
pub const MAX_GRID_DIM: usize = 20;
pub const PROTOCOL_VERSION: u32 = 1;
/// Largest UDP payload over IPv4.
pub const MAX_PACKET_SIZE: usize = 65_507;
/// Upper bound on the UTF-8 length of one submitted grapheme.
pub const MAX_CHAR_BYTES: usize = 32;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum Packet {
    Connect {
        client_version: u32,
    },
    UpdateCell {
        row: i32,
        col: i32,
        ch: String,
    },
    RequestHistory,
    Heartbeat,
    Disconnect,

    InitState {
        grid: Vec<Vec<CellView>>,
        history: Vec<UpdateEvent>,
        you_id: u32,
    },
    OnlineCount {
        count: u32,
    },
    CellUpdated {
        row: u32,
        col: u32,
        ch: String,
        by: u32,
    },
    History {
        events: Vec<UpdateEvent>,
    },
    ErrorMsg {
        message: String,
    },
    Disconnected {
        reason: String,
    },
}

/// Client-facing view of one cell. The fill timestamp stays on the server.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct CellView {
    pub ch: Option<String>,
    pub filled_by: Option<u32>,
}

impl CellView {
    pub fn is_filled(&self) -> bool {
        self.ch.is_some()
    }
}

/// One committed cell write. History is an append-only log of these.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct UpdateEvent {
    pub row: u32,
    pub col: u32,
    pub ch: String,
    pub client_id: u32,
    pub timestamp: u64,
}

/// Trims `input` and returns it if what remains is exactly one grapheme
/// no longer than [`MAX_CHAR_BYTES`].
pub fn normalize_char(input: &str) -> Option<&str> {
    let trimmed = input.trim();
    let mut graphemes = trimmed.graphemes(true);
    let first = graphemes.next()?;
    if graphemes.next().is_some() || first.len() > MAX_CHAR_BYTES {
        return None;
    }
    Some(first)
}

/// Trims `input` and returns its first grapheme, discarding the rest.
pub fn first_grapheme(input: &str) -> Option<&str> {
    input.trim().graphemes(true).next()
}

/// Milliseconds since the Unix epoch, or 0 if the clock is before it.
pub fn get_timestamp() -> u64 {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_millis();
    (millis.min(u64::MAX as u128)) as u64
}
