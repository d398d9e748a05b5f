//! Allocation and reversal engine for waste transfers.
//!
//! The crate exposes:
//! - [`TransferController`]: distributes a shipment across an organization's
//!   reachable warehouses (nearest first) and reverses prior reservations.
//! - [`TransferReceipt`] / [`TransferLine`]: the committed allocation plan.
//!
//! Every operation runs as one store transaction: an allocation either
//! commits every capacity decrement plus one reservation row per warehouse
//! touched, or commits nothing.

pub mod controller;
pub mod error;
pub mod receipt;

pub use controller::{ReversalOutcome, TransferController};
pub use error::{Result, TransferError};
pub use receipt::{TransferLine, TransferReceipt};
