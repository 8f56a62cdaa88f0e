//! Cache L2 compartilhada entre grupos.

use crate::drivers::mali::error::{MaliError, MaliResult};
use crate::drivers::mali::platform::Platform;
use crate::drivers::mali::regs::RegisterBank;
use crate::drivers::mali::resource::Resource;
use crate::mm::{Allocation, ObjectHeap};

pub const L2_REG_SIZE: usize = 0x80;

pub const REG_VERSION: u32 = 0x00;
pub const REG_SIZE: u32 = 0x04;
pub const REG_STATUS: u32 = 0x08;
pub const REG_COMMAND: u32 = 0x10;
pub const REG_MAX_READS: u32 = 0x18;
pub const REG_ENABLE: u32 = 0x1C;

pub const CMD_CLEAR_ALL: u32 = 0x01;
pub const ENABLE_ACCESS: u32 = 0x01;
pub const ENABLE_READ_ALLOCATE: u32 = 0x02;

/// Limite padrão de leituras pendentes
pub const DEFAULT_MAX_READS: u32 = 0x1C;

#[derive(Debug)]
pub struct L2CacheCore {
    id: u32,
    regs: RegisterBank,
    description: &'static str,
    attached_groups: u32,
    _footprint: Allocation,
}

impl L2CacheCore {
    /// Cria a cache. Qualquer falha aqui é falta de recurso do host.
    pub fn create<P: Platform + ?Sized>(
        platform: &mut P,
        heap: &ObjectHeap,
        resource: &Resource,
        id: u32,
    ) -> MaliResult<Self> {
        let footprint = heap
            .reserve_for::<Self>()
            .map_err(|_| MaliError::AllocationFailed)?;
        let regs = RegisterBank::map(platform, resource, L2_REG_SIZE)
            .map_err(|_| MaliError::AllocationFailed)?;

        Ok(Self {
            id,
            regs,
            description: resource.description,
            attached_groups: 0,
            _footprint: footprint,
        })
    }

    /// Invalida todo o conteúdo e habilita a cache.
    pub fn reset(&mut self) {
        self.regs.write(REG_COMMAND, CMD_CLEAR_ALL);
        self.regs.write(REG_ENABLE, ENABLE_ACCESS | ENABLE_READ_ALLOCATE);
        self.regs.write(REG_MAX_READS, DEFAULT_MAX_READS);
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn base(&self) -> u32 {
        self.regs.phys()
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    pub fn attached_groups(&self) -> u32 {
        self.attached_groups
    }

    pub(crate) fn attach(&mut self) {
        self.attached_groups += 1;
    }

    pub(crate) fn detach(&mut self) {
        debug_assert!(self.attached_groups > 0);
        self.attached_groups = self.attached_groups.saturating_sub(1);
    }

    pub fn delete<P: Platform + ?Sized>(self, platform: &mut P) {
        self.regs.unmap(platform);
    }
}
