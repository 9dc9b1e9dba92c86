//! Field history of recently modified catalog records

pub mod collector;
pub mod naming;

pub use collector::{HistoryCollector, HistoryReport};
