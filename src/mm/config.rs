//! # Configuração do Módulo de Memória
//!
//! Constantes e parâmetros de memória da GPU (dedicada, compartilhada, framebuffer).

// =============================================================================
// CONSTANTES DE TAMANHO
// =============================================================================

/// Tamanho de uma página de CPU (4 KiB)
pub const PAGE_SIZE: u32 = 4096;

/// Máscara para alinhar endereços a página
pub const PAGE_MASK: u32 = !(PAGE_SIZE - 1);

/// Tamanho padrão da memória compartilhada quando nada foi configurado (256 MiB)
pub const DEFAULT_SHARED_MEM_SIZE: u32 = 0x1000_0000;

/// Páginas reservadas pelo módulo de MMU (page directory vazio + flush de fault)
pub const MMU_RESERVED_PAGES: usize = 3;

/// Tamanho do tile list mestre do DLBU
pub const DLBU_PAGE_SIZE: usize = PAGE_SIZE as usize;

/// Endereço virtual onde o tile list do DLBU aparece em cada sessão
pub const DLBU_VIRT_ADDR: u32 = 0xFFF0_0000;

/// Verifica alinhamento a página
#[inline]
pub const fn is_page_aligned(value: u32) -> bool {
    value & !PAGE_MASK == 0
}

// =============================================================================
// PARÂMETROS DE MEMÓRIA
// =============================================================================

/// Parâmetros de memória da GPU.
///
/// Todos zerados significa "não definido": o orquestrador recorre aos dados
/// do dispositivo e, por fim, ao padrão de 256 MiB compartilhados.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemorySettings {
    pub dedicated_mem_start: u32,
    pub dedicated_mem_size: u32,
    pub shared_mem_size: u32,
}

impl MemorySettings {
    pub const fn new() -> Self {
        Self {
            dedicated_mem_start: 0,
            dedicated_mem_size: 0,
            shared_mem_size: 0,
        }
    }

    pub const fn is_unset(&self) -> bool {
        self.dedicated_mem_start == 0 && self.dedicated_mem_size == 0 && self.shared_mem_size == 0
    }
}

/// Região do framebuffer acessível pela GPU.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FramebufferSettings {
    pub fb_start: u32,
    pub fb_size: u32,
}

impl FramebufferSettings {
    pub const fn new() -> Self {
        Self {
            fb_start: 0,
            fb_size: 0,
        }
    }

    pub const fn is_unset(&self) -> bool {
        self.fb_start == 0 && self.fb_size == 0
    }
}
