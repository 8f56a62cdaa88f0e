//! # Configuração do Núcleo
//!
//! Parâmetros que o host passa na criação do contexto. Valores zerados de
//! memória caem nos dados da placa (`DeviceData`) e, por fim, no padrão de
//! 256 MiB de memória compartilhada.

use crate::mm::config::{FramebufferSettings, MemorySettings};

/// Sem limite de PPs por cluster
pub const PP_CORES_UNLIMITED: u32 = 0xFF;

/// Entradas do ring de profiling
pub const DEFAULT_PROFILING_ENTRIES: u32 = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreConfig {
    pub memory: MemorySettings,
    pub framebuffer: FramebufferSettings,
    /// Limite de PPs no cluster 0
    pub max_pp_cores_group_1: u32,
    /// Limite de PPs no cluster 1
    pub max_pp_cores_group_2: u32,
    /// Inicia a captura de profiling já no boot
    pub boot_profiling: bool,
    /// Cria o ring de profiling
    pub profiling: bool,
    pub profiling_entries: u32,
    /// Driver compilado com suporte a IRQs compartilhadas
    pub shared_interrupts_supported: bool,
}

impl CoreConfig {
    pub const fn new() -> Self {
        Self {
            memory: MemorySettings::new(),
            framebuffer: FramebufferSettings::new(),
            max_pp_cores_group_1: PP_CORES_UNLIMITED,
            max_pp_cores_group_2: PP_CORES_UNLIMITED,
            boot_profiling: false,
            profiling: false,
            profiling_entries: DEFAULT_PROFILING_ENTRIES,
            shared_interrupts_supported: false,
        }
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::new()
    }
}
