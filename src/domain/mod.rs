//! Domain Layer
//!
//! Entities, ports and pure services. Nothing here talks to the outside world.

pub mod entities;
pub mod ports;
pub mod services;
