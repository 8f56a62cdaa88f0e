//! # Banco de Registradores
//!
//! Acesso volátil de 32 bits a uma janela MMIO mapeada pelo host.

use super::error::MaliResult;
use super::platform::{IoRegion, Platform};
use super::resource::Resource;
use core::ptr::NonNull;
use volatile::VolatilePtr;

/// Registradores de um bloco de hardware.
#[derive(Debug)]
pub struct RegisterBank {
    region: IoRegion,
}

impl RegisterBank {
    /// Mapeia `size` bytes de registradores do recurso.
    pub fn map<P: Platform + ?Sized>(
        platform: &mut P,
        resource: &Resource,
        size: usize,
    ) -> MaliResult<Self> {
        let region = platform.map_io_region(resource, size)?;
        Ok(Self { region })
    }

    /// Devolve o mapeamento ao host.
    pub fn unmap<P: Platform + ?Sized>(self, platform: &mut P) {
        platform.unmap_io_region(self.region);
    }

    pub fn phys(&self) -> u32 {
        self.region.phys()
    }

    fn reg(&self, offset: u32) -> Option<VolatilePtr<'_, u32>> {
        let index = (offset / 4) as usize;
        if offset % 4 != 0 || index >= self.region.words() {
            return None;
        }

        // SAFETY: index < words, e o host garante a janela até o unmap
        Some(unsafe {
            VolatilePtr::new(NonNull::new_unchecked(
                self.region.base().as_ptr().add(index),
            ))
        })
    }

    /// Lê o registrador em `offset` (bytes).
    pub fn read(&self, offset: u32) -> u32 {
        match self.reg(offset) {
            Some(reg) => reg.read(),
            None => {
                crate::kerror!("(Regs) Leitura fora da janela, offset=", offset);
                0
            }
        }
    }

    /// Escreve o registrador em `offset` (bytes).
    pub fn write(&mut self, offset: u32, value: u32) {
        match self.reg(offset) {
            Some(reg) => reg.write(value),
            None => {
                crate::kerror!("(Regs) Escrita fora da janela, offset=", offset);
            }
        }
    }
}
