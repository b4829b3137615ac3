//! Authoritative grid storage
//!
//! A fixed `rows x cols` array of cells. A cell may be written exactly once;
//! after that it stays as it is for the rest of the session.

use shared::{CellView, UpdateEvent};

/// One grid position as the server stores it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cell {
    pub ch: Option<String>,
    pub filled_by: Option<u32>,
    pub filled_at: Option<u64>,
}

impl Cell {
    pub fn is_filled(&self) -> bool {
        self.ch.is_some()
    }

    fn view(&self) -> CellView {
        CellView {
            ch: self.ch.clone(),
            filled_by: self.filled_by,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Vec<Cell>>,
}

impl Grid {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![vec![Cell::default(); cols]; rows],
        }
    }

    /// Rebuilds a grid by applying `history` in order onto an empty one.
    /// Events that fall outside the grid or target a filled cell are skipped.
    pub fn replay(rows: usize, cols: usize, history: &[UpdateEvent]) -> Self {
        let mut grid = Self::new(rows, cols);
        for event in history {
            let position = grid.checked_position(event.row.into(), event.col.into());
            if let Some((row, col)) = position {
                grid.fill(row, col, &event.ch, event.client_id, event.timestamp);
            }
        }
        grid
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Converts signed wire coordinates into indices, or `None` when out of range.
    pub fn checked_position(&self, row: i64, col: i64) -> Option<(usize, usize)> {
        let row = usize::try_from(row).ok().filter(|r| *r < self.rows)?;
        let col = usize::try_from(col).ok().filter(|c| *c < self.cols)?;
        Some((row, col))
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.cells.get(row).and_then(|r| r.get(col))
    }

    pub fn is_filled(&self, row: usize, col: usize) -> bool {
        self.cell(row, col).is_some_and(Cell::is_filled)
    }

    /// Writes `ch` into an empty cell. Returns false, leaving the grid
    /// untouched, if the cell is already filled or out of range.
    pub fn fill(
        &mut self,
        row: usize,
        col: usize,
        ch: &str,
        client_id: u32,
        timestamp: u64,
    ) -> bool {
        match self.cells.get_mut(row).and_then(|r| r.get_mut(col)) {
            Some(cell) if !cell.is_filled() => {
                *cell = Cell {
                    ch: Some(ch.to_string()),
                    filled_by: Some(client_id),
                    filled_at: Some(timestamp),
                };
                true
            }
            _ => false,
        }
    }

    /// Client-facing copy of every cell, without fill timestamps
    pub fn snapshot(&self) -> Vec<Vec<CellView>> {
        self.cells
            .iter()
            .map(|row| row.iter().map(Cell::view).collect())
            .collect()
    }

    pub fn filled_count(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|cell| cell.is_filled())
            .count()
    }
}
