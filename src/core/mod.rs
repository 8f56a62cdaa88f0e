//! Core Module
//!
//! Infraestrutura comum do núcleo (logging).

pub mod logging;
