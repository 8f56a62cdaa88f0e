//! MMU de um grupo (GP, PP ou broadcast).

use crate::drivers::mali::error::{MaliError, MaliResult};
use crate::drivers::mali::platform::Platform;
use crate::drivers::mali::regs::RegisterBank;
use crate::drivers::mali::resource::Resource;
use crate::mm::{Allocation, ObjectHeap};

/// Tamanho da janela de registradores da MMU
pub const MMU_REG_SIZE: usize = 0x100;

pub const REG_DTE_ADDR: u32 = 0x00;
pub const REG_STATUS: u32 = 0x04;
pub const REG_COMMAND: u32 = 0x08;
pub const REG_PAGE_FAULT_ADDR: u32 = 0x0C;
pub const REG_INT_RAWSTAT: u32 = 0x14;
pub const REG_INT_CLEAR: u32 = 0x18;
pub const REG_INT_MASK: u32 = 0x1C;

pub const CMD_ENABLE_PAGING: u32 = 0x00;
pub const CMD_HARD_RESET: u32 = 0x06;

pub const INT_PAGE_FAULT: u32 = 0x01;
pub const INT_READ_BUS_ERROR: u32 = 0x02;
pub const INT_ALL: u32 = INT_PAGE_FAULT | INT_READ_BUS_ERROR;

#[derive(Debug)]
pub struct MmuCore {
    regs: RegisterBank,
    irq: Option<i32>,
    description: &'static str,
    is_virtual: bool,
    _footprint: Allocation,
}

impl MmuCore {
    pub fn create<P: Platform + ?Sized>(
        platform: &mut P,
        heap: &ObjectHeap,
        resource: &Resource,
        is_virtual: bool,
    ) -> MaliResult<Self> {
        let footprint = heap.reserve_for::<Self>().map_err(|_| {
            crate::kerror!("(MMU) Sem memória para a MMU, base=", resource.base);
            MaliError::MmuCreateFailed
        })?;

        let regs = RegisterBank::map(platform, resource, MMU_REG_SIZE).map_err(|_| {
            crate::kerror!("(MMU) Falha ao mapear registradores, base=", resource.base);
            MaliError::MmuCreateFailed
        })?;

        crate::ktrace!("(MMU) Criada, base=", resource.base);
        Ok(Self {
            regs,
            irq: resource.irq,
            description: resource.description,
            is_virtual,
            _footprint: footprint,
        })
    }

    /// Hard reset: sem page directory, interrupções limpas e habilitadas.
    pub fn reset(&mut self) {
        self.regs.write(REG_COMMAND, CMD_HARD_RESET);
        self.regs.write(REG_DTE_ADDR, 0);
        self.regs.write(REG_INT_CLEAR, INT_ALL);
        self.regs.write(REG_INT_MASK, INT_ALL);
        self.regs.write(REG_COMMAND, CMD_ENABLE_PAGING);
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

    pub fn delete<P: Platform + ?Sized>(self, platform: &mut P) {
        self.regs.unmap(platform);
    }
}
