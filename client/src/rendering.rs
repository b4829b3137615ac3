//! Plain-text rendering of the client projection

use crate::grid_state::ClientGridState;
use shared::UpdateEvent;
use std::fmt::Write;

const EMPTY_CELL: &str = ".";

/// Status line, grid with row/column indices, and submission state
pub fn render(state: &ClientGridState) -> String {
    let mut out = String::new();

    let you = state
        .you_id
        .map_or_else(|| "-".to_string(), |id| id.to_string());
    let _ = writeln!(
        out,
        "Players online: {}   Your id: {}",
        state.online_count, you
    );

    out.push_str("    ");
    for col in 0..state.cols() {
        let _ = write!(out, "{:>2} ", col);
    }
    out.push('\n');

    for (row, cells) in state.grid.iter().enumerate() {
        let _ = write!(out, "{:>2}  ", row);
        for cell in cells {
            let ch = cell.ch.as_deref().unwrap_or(EMPTY_CELL);
            let _ = write!(out, " {} ", ch);
        }
        out.push('\n');
    }

    out.push_str(if state.submitted {
        "You've submitted\n"
    } else {
        "You haven't submitted yet\n"
    });
    out
}

/// History log, one line per committed update
pub fn render_history(history: &[UpdateEvent]) -> String {
    let mut out = format!("History ({})\n", history.len());
    for event in history {
        let _ = writeln!(
            out,
            "  [{}] cell ({},{}) = {} by {}",
            event.timestamp, event.row, event.col, event.ch, event.client_id
        );
    }
    out
}
