//! Power Management Unit.
//!
//! Presente apenas em parte das placas. Cada bit de `PmuMask` é uma ilha de
//! energia; o significado dos bits depende da variante da GPU.

use crate::drivers::mali::error::{MaliError, MaliResult};
use crate::drivers::mali::platform::Platform;
use crate::drivers::mali::regs::RegisterBank;
use crate::drivers::mali::resource::Resource;
use crate::mm::{Allocation, ObjectHeap};
use bitflags::bitflags;

pub const PMU_REG_SIZE: usize = 0x20;

pub const REG_POWER_UP: u32 = 0x00;
pub const REG_POWER_DOWN: u32 = 0x04;
pub const REG_STATUS: u32 = 0x08;
pub const REG_INT_MASK: u32 = 0x0C;
pub const REG_INT_RAWSTAT: u32 = 0x10;
pub const REG_INT_CLEAR: u32 = 0x18;
pub const REG_SW_DELAY: u32 = 0x1C;

pub const INT_CMD_DONE: u32 = 0x01;
pub const DEFAULT_SW_DELAY: u32 = 0xFF;

bitflags! {
    /// Ilhas de energia controladas pelo PMU.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct PmuMask: u32 {
        const ISLAND0 = 1 << 0;
        const ISLAND1 = 1 << 1;
        const ISLAND2 = 1 << 2;
        const ISLAND3 = 1 << 3;
        const ISLAND4 = 1 << 4;
        const ISLAND5 = 1 << 5;
        const ISLAND6 = 1 << 6;
        const ISLAND7 = 1 << 7;
    }
}

#[derive(Debug)]
pub struct PmuCore {
    regs: RegisterBank,
    pp_cores: u32,
    l2_caches: u32,
    powered_down: PmuMask,
    _footprint: Allocation,
}

impl PmuCore {
    pub fn create<P: Platform + ?Sized>(
        platform: &mut P,
        heap: &ObjectHeap,
        resource: &Resource,
        pp_cores: u32,
        l2_caches: u32,
    ) -> MaliResult<Self> {
        let footprint = heap.reserve_for::<Self>()?;
        let regs = RegisterBank::map(platform, resource, PMU_REG_SIZE).map_err(|_| {
            crate::kerror!("(PMU) Falha ao mapear registradores, base=", resource.base);
            MaliError::Fault
        })?;

        crate::kinfo!("(PMU) Criado, PP cores=", pp_cores);
        Ok(Self {
            regs,
            pp_cores,
            l2_caches,
            powered_down: PmuMask::empty(),
            _footprint: footprint,
        })
    }

    /// Reset do PMU: interrupções mascaradas e todas as ilhas ligadas.
    pub fn reset(&mut self) -> MaliResult<()> {
        self.regs.write(REG_INT_MASK, 0);
        self.regs.write(REG_INT_CLEAR, INT_CMD_DONE);
        self.regs.write(REG_SW_DELAY, DEFAULT_SW_DELAY);
        self.power_up(PmuMask::all());
        Ok(())
    }

    pub fn power_up(&mut self, mask: PmuMask) {
        self.regs.write(REG_POWER_UP, mask.bits());
        self.powered_down &= !mask;
    }

    pub fn power_down(&mut self, mask: PmuMask) {
        self.regs.write(REG_POWER_DOWN, mask.bits());
        self.powered_down |= mask;
    }

    /// Ilhas atualmente desligadas.
    pub fn powered_down(&self) -> PmuMask {
        self.powered_down
    }

    pub fn pp_cores(&self) -> u32 {
        self.pp_cores
    }

    pub fn l2_caches(&self) -> u32 {
        self.l2_caches
    }

    pub fn base(&self) -> u32 {
        self.regs.phys()
    }

    pub fn delete<P: Platform + ?Sized>(self, platform: &mut P) {
        self.regs.unmap(platform);
    }
}
