//! Prelude module for convenient imports.
//!
//! ```rust,no_run
//! use trapsink::prelude::*;
//! ```
//!
//! This imports:
//! - Session types: [`Session`], [`ReceivedTrap`], [`TrapParams`]
//! - Normalized results: [`MultiResult`], [`NormalizedValue`]
//! - Core types: [`Oid`], [`Value`], [`VarBind`], [`Version`]
//! - Error handling: [`Error`], [`Result`]
//! - The [`oid!`] macro for compile-time OID construction

pub use crate::error::{Error, Result};
pub use crate::listener::{TrapPacket, TrapParams};
pub use crate::normalize::{MultiResult, NormalizedValue};
pub use crate::oid::Oid;
pub use crate::session::{ReceivedTrap, Session};
pub use crate::value::Value;
pub use crate::varbind::VarBind;
pub use crate::version::Version;

#[doc(no_inline)]
pub use crate::oid;
