//! Message contracts and the in-process outcome bus.
//!
//! This crate defines the shapes that cross the core's boundaries:
//!
//! - [`NormalizedEvent`] — the inbound contract produced by the (external)
//!   ingestion layer.
//! - [`RuleEvaluated`] / [`AlertTrigger`] — the two outbound contracts,
//!   consumed by the Stage Aggregator and Alert Manager and observable by
//!   external consumers via the [`OutcomeBus`].
//! - [`SyntheticMissed`] — the scheduler→engine miss signal.
//!
//! The contract is the message shape, not the transport: the bus here is an
//! in-process `tokio::sync::broadcast` fan-out, but the same structs can be
//! carried over a message bus unchanged.

pub mod bus;
pub mod normalized;
pub mod outcome;

pub use bus::OutcomeBus;
pub use normalized::NormalizedEvent;
pub use outcome::{AlertTrigger, RuleEvaluated, SyntheticMissed};
