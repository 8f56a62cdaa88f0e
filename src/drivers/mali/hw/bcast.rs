//! Unidade de Broadcast (Mali-450).
//!
//! Replica escritas de registradores do PP virtual para os PPs físicos
//! selecionados em `BroadcastMask`.

use crate::drivers::mali::error::{MaliError, MaliResult};
use crate::drivers::mali::platform::Platform;
use crate::drivers::mali::regs::RegisterBank;
use crate::drivers::mali::resource::Resource;
use crate::mm::{Allocation, ObjectHeap};
use bitflags::bitflags;

pub const BCAST_REG_SIZE: usize = 0x10;

pub const REG_BROADCAST_MASK: u32 = 0x00;
pub const REG_INTERRUPT_MASK: u32 = 0x04;

bitflags! {
    /// Um bit por PP físico.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct BroadcastMask: u32 {
        const PP0 = 1 << 0;
        const PP1 = 1 << 1;
        const PP2 = 1 << 2;
        const PP3 = 1 << 3;
        const PP4 = 1 << 4;
        const PP5 = 1 << 5;
        const PP6 = 1 << 6;
        const PP7 = 1 << 7;
    }
}

#[derive(Debug)]
pub struct BcastUnit {
    regs: RegisterBank,
    mask: BroadcastMask,
    _footprint: Allocation,
}

impl BcastUnit {
    pub fn create<P: Platform + ?Sized>(
        platform: &mut P,
        heap: &ObjectHeap,
        resource: &Resource,
    ) -> MaliResult<Self> {
        let footprint = heap
            .reserve_for::<Self>()
            .map_err(|_| MaliError::CoreCreateFailed)?;
        let regs = RegisterBank::map(platform, resource, BCAST_REG_SIZE)
            .map_err(|_| MaliError::CoreCreateFailed)?;

        let mut unit = Self {
            regs,
            mask: BroadcastMask::empty(),
            _footprint: footprint,
        };
        unit.reset();
        crate::ktrace!("(Bcast) Unidade de broadcast criada, base=", resource.base);
        Ok(unit)
    }

    pub fn add(&mut self, mask: BroadcastMask) {
        self.mask |= mask;
    }

    pub fn remove(&mut self, mask: BroadcastMask) {
        self.mask &= !mask;
    }

    pub fn mask(&self) -> BroadcastMask {
        self.mask
    }

    /// Programa a máscara atual no hardware.
    pub fn reset(&mut self) {
        self.regs.write(REG_BROADCAST_MASK, self.mask.bits() << 16);
        self.regs.write(REG_INTERRUPT_MASK, self.mask.bits());
    }

    pub fn delete<P: Platform + ?Sized>(self, platform: &mut P) {
        self.regs.unmap(platform);
    }
}
