//! # Interface com o Host
//!
//! Tudo que o núcleo precisa do host (driver model do kernel hospedeiro):
//! descoberta de recursos, base da GPU, referências de energia do device e
//! mapeamento das janelas de registradores.

use super::error::MaliResult;
use super::resource::{Resource, ResourceRegistry};
use crate::mm::config::{FramebufferSettings, MemorySettings};
use core::ptr::NonNull;

/// Dados específicos da placa (fallback dos parâmetros de memória).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceData {
    pub memory: MemorySettings,
    pub framebuffer: FramebufferSettings,
}

/// Janela de registradores mapeada pelo host.
///
/// A posse de um `IoRegion` é a posse do mapeamento: ele volta ao host por
/// `Platform::unmap_io_region`.
#[derive(Debug)]
pub struct IoRegion {
    phys: u32,
    base: NonNull<u32>,
    words: usize,
}

impl IoRegion {
    /// Cria a janela.
    ///
    /// # Safety
    /// `base` deve apontar para `words` registradores de 32 bits válidos
    /// para leitura e escrita até a região ser devolvida ao host.
    pub unsafe fn new(phys: u32, base: NonNull<u32>, words: usize) -> Self {
        Self { phys, base, words }
    }

    /// Endereço físico da janela.
    pub fn phys(&self) -> u32 {
        self.phys
    }

    /// Número de registradores de 32 bits.
    pub fn words(&self) -> usize {
        self.words
    }

    pub fn base(&self) -> NonNull<u32> {
        self.base
    }
}

/// Serviços do host consumidos pelo núcleo.
pub trait Platform: ResourceRegistry {
    /// Base dos registradores da GPU (0 = GPU não descrita).
    fn resource_base_address(&self) -> u32;

    /// O host usa linhas de IRQ compartilhadas?
    fn shared_interrupts(&self) -> bool {
        false
    }

    /// Dados de memória da placa, se houver.
    fn device_data(&self) -> Option<DeviceData> {
        None
    }

    /// Mantém a GPU energizada (chamada bloqueante, sem cancelamento).
    fn pm_dev_ref_add(&mut self) -> MaliResult<()>;

    /// Libera a referência de energia.
    fn pm_dev_ref_dec(&mut self);

    /// Mapeia `size` bytes de registradores do recurso.
    fn map_io_region(&mut self, resource: &Resource, size: usize) -> MaliResult<IoRegion>;

    /// Desfaz o mapeamento.
    fn unmap_io_region(&mut self, region: IoRegion);
}
