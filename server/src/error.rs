//! Reasons an update request can be turned down
//!
//! Every variant is local to the requesting client: it is reported back as an
//! `ErrorMsg` packet and never changes shared state. The `Display` text is
//! exactly what goes over the wire.

/// A rejected `update-cell` request
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpdateRejection {
    /// The client already committed its one cell.
    #[error("You already submitted!")]
    AlreadySubmitted,

    /// Another client got to the cell first.
    #[error("Cell already filled!")]
    CellOccupied,

    /// The character was empty after trimming, more than one grapheme, or too long.
    #[error("Invalid character: enter exactly one character")]
    InvalidInput,

    /// Row or column falls outside the grid.
    #[error("Invalid coordinate: ({row}, {col}) is outside the grid")]
    InvalidCoordinate { row: i32, col: i32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_messages() {
        assert_eq!(
            UpdateRejection::AlreadySubmitted.to_string(),
            "You already submitted!"
        );
        assert_eq!(
            UpdateRejection::CellOccupied.to_string(),
            "Cell already filled!"
        );
        assert_eq!(
            UpdateRejection::InvalidInput.to_string(),
            "Invalid character: enter exactly one character"
        );
        assert_eq!(
            UpdateRejection::InvalidCoordinate { row: -1, col: 12 }.to_string(),
            "Invalid coordinate: (-1, 12) is outside the grid"
        );
    }
}
