//! Domain layer: models, ports, errors, and control-surface contract types.
//! No I/O happens here; adapters implement the ports against real systems.

pub mod control;
pub mod errors;
pub mod models;
pub mod ports;
