//! Process initialization for the gate binary.
//!
//! Currently this is only the logger; the gate itself is built from
//! [`GateConfig`](crate::config::GateConfig) by [`GeoGate::new`](crate::GeoGate::new).

mod logger;

pub use logger::init_logger_with;
