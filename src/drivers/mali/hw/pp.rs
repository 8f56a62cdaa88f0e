//! Pixel Processor.

use super::bcast::BroadcastMask;
use crate::drivers::mali::error::{MaliError, MaliResult};
use crate::drivers::mali::platform::Platform;
use crate::drivers::mali::regs::RegisterBank;
use crate::drivers::mali::resource::Resource;
use crate::mm::{Allocation, ObjectHeap};

/// Janela do PP (registradores de frame + bloco de gerenciamento em 0x1000)
pub const PP_REG_SIZE: usize = 0x1100;

pub const REG_VERSION: u32 = 0x1000;
pub const REG_STATUS: u32 = 0x1008;
pub const REG_CTRL_MGMT: u32 = 0x100C;
pub const REG_INT_RAWSTAT: u32 = 0x1020;
pub const REG_INT_CLEAR: u32 = 0x1024;
pub const REG_INT_MASK: u32 = 0x1028;

pub const CTRL_MGMT_SOFT_RESET: u32 = 1 << 7;
pub const INT_ALL: u32 = 0x0FFF;

/// Id de broadcast a partir do offset do PP na GPU.
///
/// Os PPs do cluster 0 também aparecem no alias 0x20000.
pub fn broadcast_id_for(offset: u32) -> BroadcastMask {
    match offset {
        0x0_8000 | 0x2_0000 => BroadcastMask::PP0,
        0x0_A000 | 0x2_2000 => BroadcastMask::PP1,
        0x0_C000 | 0x2_4000 => BroadcastMask::PP2,
        0x0_E000 | 0x2_6000 => BroadcastMask::PP3,
        0x2_8000 => BroadcastMask::PP4,
        0x2_A000 => BroadcastMask::PP5,
        0x2_C000 => BroadcastMask::PP6,
        0x2_E000 => BroadcastMask::PP7,
        _ => BroadcastMask::empty(),
    }
}

#[derive(Debug)]
pub struct PpCore {
    regs: RegisterBank,
    irq: Option<i32>,
    description: &'static str,
    is_virtual: bool,
    bcast_id: BroadcastMask,
    version: u32,
    _footprint: Allocation,
}

impl PpCore {
    pub fn create<P: Platform + ?Sized>(
        platform: &mut P,
        heap: &ObjectHeap,
        resource: &Resource,
        is_virtual: bool,
        bcast_id: BroadcastMask,
    ) -> MaliResult<Self> {
        let footprint = heap.reserve_for::<Self>().map_err(|_| {
            crate::kerror!("(PP) Sem memória para o PP, base=", resource.base);
            MaliError::CoreCreateFailed
        })?;

        let regs = RegisterBank::map(platform, resource, PP_REG_SIZE).map_err(|_| {
            crate::kerror!("(PP) Falha ao mapear registradores, base=", resource.base);
            MaliError::CoreCreateFailed
        })?;

        let version = regs.read(REG_VERSION);
        crate::ktrace!("(PP) Criado, base=", resource.base);

        Ok(Self {
            regs,
            irq: resource.irq,
            description: resource.description,
            is_virtual,
            bcast_id,
            version,
            _footprint: footprint,
        })
    }

    pub fn reset(&mut self) {
        self.regs.write(REG_INT_MASK, 0);
        self.regs.write(REG_CTRL_MGMT, CTRL_MGMT_SOFT_RESET);
        self.regs.write(REG_INT_CLEAR, INT_ALL);
        self.regs.write(REG_INT_MASK, INT_ALL);
    }

    pub fn base(&self) -> u32 {
        self.regs.phys()
    }

    pub fn irq(&self) -> Option<i32> {
        self.irq
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    pub fn is_virtual(&self) -> bool {
        self.is_virtual
    }

    pub fn bcast_id(&self) -> BroadcastMask {
        self.bcast_id
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn delete<P: Platform + ?Sized>(self, platform: &mut P) {
        self.regs.unmap(platform);
    }
}
