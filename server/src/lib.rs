//! # Grid Session Server Library
//!
//! This library provides the authoritative server for the shared character
//! grid. Clients connect over UDP, each may fill exactly one empty cell, and
//! every connected client sees each fill and the live player count as they
//! happen.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative State
//! The server holds the only mutable copy of the grid, the append-only update
//! history, the set of clients that have used their submission, and the set
//! of live connections. Clients never write to their own view of the grid
//! directly; they apply the `CellUpdated` echo the server broadcasts.
//!
//! ### First Writer Wins
//! A cell is written at most once. The occupied and already-submitted checks
//! and the resulting write happen as one step, so two requests for the same
//! empty cell can never both succeed.
//!
//! ### Connection Lifecycle
//! Connects, explicit disconnects and heartbeat timeouts all update the
//! online count. A client's filled cell and submission status outlive its
//! connection.
//!
//! ## Architecture Design
//!
//! ### Single Writer
//! The server loop is the only owner of the session. Socket reads, outbound
//! sends and timeout sweeps run in their own tasks and reach the loop through
//! channels, so requests are applied strictly one at a time regardless of how
//! many worker threads the runtime has.
//!
//! ### Events Instead of Sockets
//! The session returns `SessionEvent`s (send to one client, or broadcast)
//! rather than writing to the network. The loop resolves recipients and hands
//! them to the sender task. This keeps the session testable without a socket.
//!
//! ## Module Organization
//!
//! ### Grid Module (`grid`)
//! Fixed-size cell storage with fill-once semantics, bounds checking,
//! client snapshots and history replay.
//!
//! ### Session Module (`session`)
//! The coordinator: connect, update and disconnect handling, the history log
//! and submission tracking.
//!
//! ### Error Module (`error`)
//! The rejection reasons reported back to a requester.
//!
//! ### Network Module (`network`)
//! Socket handling, packet encoding and the server loop.
//!
//! ### Registry Module (`registry`)
//! Address book for UDP peers. Assigns ids, tracks when each peer was last
//! heard from and enforces the connection limit.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::{Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server = Server::new("127.0.0.1:8080", ServerConfig::default()).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod grid;
pub mod network;
pub mod registry;
pub mod session;
