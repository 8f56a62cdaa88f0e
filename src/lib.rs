//! Mali Core Library.
//!
//! Núcleo de topologia do driver Mali-400/450: descoberta de recursos,
//! caches L2, grupos (GP/PP + MMU), domínios de energia e o bring-up
//! ordenado e reversível do subsistema.
//!
//! O host fornece o `Platform` (recursos, energia, mapeamento de
//! registradores) e o `ObjectHeap`; o núcleo não tem estado global além do
//! sink de log.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod core; // Logging
pub mod drivers; // Núcleo Mali
pub mod klib; // Autoteste
pub mod mm; // Heap de objetos, validação de memória

pub use crate::drivers::mali::{
    CoreConfig, MaliError, MaliResult, Platform, ProductId, Resource, ResourceRegistry,
    SubsystemContext,
};
pub use crate::mm::ObjectHeap;
