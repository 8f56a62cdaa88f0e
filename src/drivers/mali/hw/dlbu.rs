//! Dynamic Load Balancing Unit (Mali-450).
//!
//! Distribui os tiles de um job do grupo virtual entre os PPs habilitados.

use super::bcast::BroadcastMask;
use crate::drivers::mali::error::{MaliError, MaliResult};
use crate::drivers::mali::platform::Platform;
use crate::drivers::mali::regs::RegisterBank;
use crate::drivers::mali::resource::Resource;
use crate::mm::{Allocation, ObjectHeap};

pub const DLBU_REG_SIZE: usize = 0x40;

pub const REG_MASTER_TLLIST_PHYS_ADDR: u32 = 0x00;
pub const REG_MASTER_TLLIST_VADDR: u32 = 0x04;
pub const REG_TLLIST_VBASEADDR: u32 = 0x08;
pub const REG_FB_DIM: u32 = 0x0C;
pub const REG_TLLIST_CONF: u32 = 0x10;
pub const REG_START_TILE_POS: u32 = 0x28;
pub const REG_PP_ENABLE_MASK: u32 = 0x2C;

/// Endereço virtual fixo do tile list mestre
pub const MASTER_TLLIST_VADDR: u32 = 0xCFFF_0000;

#[derive(Debug)]
pub struct DlbuCore {
    regs: RegisterBank,
    pp_mask: BroadcastMask,
    _footprint: Allocation,
}

impl DlbuCore {
    pub fn create<P: Platform + ?Sized>(
        platform: &mut P,
        heap: &ObjectHeap,
        resource: &Resource,
    ) -> MaliResult<Self> {
        let footprint = heap
            .reserve_for::<Self>()
            .map_err(|_| MaliError::CoreCreateFailed)?;
        let regs = RegisterBank::map(platform, resource, DLBU_REG_SIZE)
            .map_err(|_| MaliError::CoreCreateFailed)?;

        let mut dlbu = Self {
            regs,
            pp_mask: BroadcastMask::empty(),
            _footprint: footprint,
        };
        dlbu.reset();
        crate::ktrace!("(DLBU) Criado, base=", resource.base);
        Ok(dlbu)
    }

    pub fn reset(&mut self) {
        self.regs.write(REG_MASTER_TLLIST_VADDR, MASTER_TLLIST_VADDR);
        self.regs.write(REG_TLLIST_VBASEADDR, 0);
        self.regs.write(REG_FB_DIM, 0);
        self.regs.write(REG_TLLIST_CONF, 0);
        self.regs.write(REG_START_TILE_POS, 0);
        self.regs.write(REG_PP_ENABLE_MASK, self.pp_mask.bits());
    }

    pub fn add_pp(&mut self, mask: BroadcastMask) {
        self.pp_mask |= mask;
        self.regs.write(REG_PP_ENABLE_MASK, self.pp_mask.bits());
    }

    pub fn remove_pp(&mut self, mask: BroadcastMask) {
        self.pp_mask &= !mask;
        self.regs.write(REG_PP_ENABLE_MASK, self.pp_mask.bits());
    }

    pub fn pp_mask(&self) -> BroadcastMask {
        self.pp_mask
    }

    pub fn delete<P: Platform + ?Sized>(self, platform: &mut P) {
        self.regs.unmap(platform);
    }
}
