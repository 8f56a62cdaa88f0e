//! Geometry Processor.

use crate::drivers::mali::error::{MaliError, MaliResult};
use crate::drivers::mali::platform::Platform;
use crate::drivers::mali::regs::RegisterBank;
use crate::drivers::mali::resource::Resource;
use crate::mm::{Allocation, ObjectHeap};

pub const GP_REG_SIZE: usize = 0x100;

pub const REG_CMD: u32 = 0x20;
pub const REG_INT_RAWSTAT: u32 = 0x24;
pub const REG_INT_CLEAR: u32 = 0x28;
pub const REG_INT_MASK: u32 = 0x2C;
pub const REG_VERSION: u32 = 0x6C;

pub const CMD_SOFT_RESET: u32 = 1 << 10;
pub const INT_ALL: u32 = 0x07FF;

#[derive(Debug)]
pub struct GpCore {
    regs: RegisterBank,
    irq: Option<i32>,
    description: &'static str,
    version: u32,
    _footprint: Allocation,
}

impl GpCore {
    pub fn create<P: Platform + ?Sized>(
        platform: &mut P,
        heap: &ObjectHeap,
        resource: &Resource,
    ) -> MaliResult<Self> {
        let footprint = heap.reserve_for::<Self>().map_err(|_| {
            crate::kerror!("(GP) Sem memória para o GP, base=", resource.base);
            MaliError::CoreCreateFailed
        })?;

        let regs = RegisterBank::map(platform, resource, GP_REG_SIZE).map_err(|_| {
            crate::kerror!("(GP) Falha ao mapear registradores, base=", resource.base);
            MaliError::CoreCreateFailed
        })?;

        let version = regs.read(REG_VERSION);
        crate::ktrace!("(GP) Criado, versão=", version);

        Ok(Self {
            regs,
            irq: resource.irq,
            description: resource.description,
            version,
            _footprint: footprint,
        })
    }

    pub fn reset(&mut self) {
        self.regs.write(REG_INT_MASK, 0);
        self.regs.write(REG_CMD, CMD_SOFT_RESET);
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

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn delete<P: Platform + ?Sized>(self, platform: &mut P) {
        self.regs.unmap(platform);
    }
}
