//! # Grid Client Library
//!
//! Terminal client for the shared character grid. It connects to the server
//! over UDP, keeps a local projection of the grid, and lets the user claim
//! one cell by typing a command.
//!
//! ## Design
//!
//! ### Server Echo Only
//! The local grid is never edited by user input. A `set` command only sends
//! a request; the cell appears when the server broadcasts `CellUpdated`, which
//! keeps every client's view identical to the server's.
//!
//! ### Keep-Alive
//! The client sends a heartbeat every second so the server can tell a silent
//! peer from a dropped one.
//!
//! ## Module Organization
//!
//! - `grid_state`: local projection and packet application
//! - `input`: command parsing
//! - `rendering`: text output for the grid and the history log
//! - `network`: socket handling and the interactive loop
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = Client::new("127.0.0.1:8080").await?;
//!     client.run().await
//! }
//! ```

pub mod grid_state;
pub mod input;
pub mod network;
pub mod rendering;
