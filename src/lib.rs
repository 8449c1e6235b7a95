// Allow large error types - the Error enum includes OIDs inline for debugging
// convenience. Boxing them would add allocations for a marginal size reduction.
#![allow(clippy::result_large_err)]

//! # trapsink
//!
//! Async SNMP trap receiver for Rust.
//!
//! Listens for SNMPv1/v2c/v3 notifications on a UDP socket, normalizes
//! every varbind into a small set of host-side value shapes, and
//! buffers the results for non-blocking batch consumption.
//!
//! ## Features
//!
//! - Traps and informs for SNMPv1, v2c, and v3 (noAuthNoPriv)
//! - Async listener built on Tokio, synchronous non-blocking reads
//! - Bounded FIFO buffering that keeps the oldest traps under load
//! - Zero-copy BER decoding
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use trapsink::{Session, TrapParams};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), trapsink::Error> {
//!     let session = Session::new("0.0.0.0", 162, TrapParams::new());
//!     session.connect().await?;
//!
//!     loop {
//!         if let Ok(traps) = session.get_no_wait() {
//!             for trap in traps {
//!                 println!("{} sent {} varbinds", trap.source, trap.results.len());
//!                 for result in &trap.results {
//!                     println!("  {}", result);
//!                 }
//!             }
//!         }
//!         tokio::time::sleep(std::time::Duration::from_millis(200)).await;
//!     }
//! }
//! ```

pub mod ber;
pub mod buffer;
pub mod error;
pub mod listener;
pub mod message;
pub mod normalize;
pub mod oid;
pub mod pdu;
pub mod prelude;
pub mod session;
pub mod value;
pub mod varbind;
pub mod version;

mod util;

pub use buffer::TrapBuffer;
pub use error::{Error, Result};
pub use listener::{TrapListener, TrapPacket, TrapParams};
pub use normalize::{MultiResult, NormalizedValue};
pub use oid::Oid;
pub use session::{ReceivedTrap, Session};
pub use value::Value;
pub use varbind::VarBind;
pub use version::Version;
