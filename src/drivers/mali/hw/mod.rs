//! # Blocos de Hardware
//!
//! Modelos dos cores da GPU. Cada core possui sua janela de registradores
//! (`RegisterBank`) e seu footprint no heap de objetos; ambos são liberados
//! por `delete`, que precisa do host para desfazer o mapeamento.

pub mod bcast;
pub mod dlbu;
pub mod gp;
pub mod l2;
pub mod mmu;
pub mod pmu;
pub mod pp;

pub use bcast::{BcastUnit, BroadcastMask};
pub use dlbu::DlbuCore;
pub use gp::GpCore;
pub use l2::L2CacheCore;
pub use mmu::MmuCore;
pub use pmu::{PmuCore, PmuMask};
pub use pp::PpCore;
