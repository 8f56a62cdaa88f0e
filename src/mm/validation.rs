//! # Validador de Memória Física
//!
//! Mantém a única faixa física (normalmente o framebuffer) que processos
//! podem mapear diretamente na GPU. Qualquer faixa fora dela é recusada.

use super::config::is_page_aligned;
use super::error::{MmError, MmResult};

/// Marcador de faixa não configurada
const INVALID_MEM_ADDR: u32 = 0xFFFF_FFFF;

/// Faixa física validada.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemValidator {
    phys_base: u32,
    size: u32,
}

impl Default for MemValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl MemValidator {
    pub const fn new() -> Self {
        Self {
            phys_base: INVALID_MEM_ADDR,
            size: INVALID_MEM_ADDR,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.phys_base != INVALID_MEM_ADDR
    }

    /// Registra a faixa. Apenas uma faixa pode existir.
    pub fn add_range(&mut self, start: u32, size: u32) -> MmResult<()> {
        if self.is_configured() {
            crate::kerror!("(Mem) Faixa de validação já existe, base=", self.phys_base);
            return Err(MmError::AlreadyMapped);
        }

        if !is_page_aligned(start) || !is_page_aligned(size) {
            crate::kerror!("(Mem) Faixa de framebuffer desalinhada, start=", start);
            return Err(MmError::NotAligned);
        }

        self.phys_base = start;
        self.size = size;
        crate::kdebug!("(Mem) Validador instalado, base=", start);
        Ok(())
    }

    /// Verifica se `[phys_addr, phys_addr + size)` cabe na faixa validada.
    pub fn check(&self, phys_addr: u32, size: u32) -> MmResult<()> {
        let end = match phys_addr.checked_add(size) {
            Some(end) if end > phys_addr => end,
            _ => {
                crate::kerror!("(Mem) Faixa vazia ou com overflow, addr=", phys_addr);
                return Err(MmError::InvalidSize);
            }
        };

        if !is_page_aligned(phys_addr) || !is_page_aligned(size) {
            crate::kerror!("(Mem) Faixa desalinhada, addr=", phys_addr);
            return Err(MmError::NotAligned);
        }

        if !self.is_configured() || self.size == 0 {
            crate::kerror!("(Mem) Nenhuma faixa validada, addr=", phys_addr);
            return Err(MmError::OutOfBounds);
        }

        let last = end - 1;
        let range_last = self.phys_base as u64 + self.size as u64 - 1;
        if phys_addr >= self.phys_base && (last as u64) <= range_last {
            crate::ktrace!("(Mem) Faixa aceita, addr=", phys_addr);
            return Ok(());
        }

        crate::kerror!("(Mem) ERRO DE VALIDAÇÃO DE FAIXA FÍSICA, addr=", phys_addr);
        Err(MmError::OutOfBounds)
    }

    /// Remove a faixa (teardown do subsistema de memória).
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_range_only() {
        let mut v = MemValidator::new();
        v.add_range(0x5000_0000, 0x0080_0000).unwrap();
        assert_eq!(v.add_range(0x6000_0000, 0x1000), Err(MmError::AlreadyMapped));
    }

    #[test]
    fn misaligned_range_rejected() {
        let mut v = MemValidator::new();
        assert_eq!(v.add_range(0x5000_0010, 0x1000), Err(MmError::NotAligned));
        assert_eq!(v.add_range(0x5000_0000, 0x0fff), Err(MmError::NotAligned));
        assert!(!v.is_configured());
    }

    #[test]
    fn check_bounds() {
        let mut v = MemValidator::new();
        v.add_range(0x5000_0000, 0x0010_0000).unwrap();

        assert!(v.check(0x5000_0000, 0x1000).is_ok());
        assert!(v.check(0x500F_F000, 0x1000).is_ok());
        assert_eq!(v.check(0x500F_F000, 0x2000), Err(MmError::OutOfBounds));
        assert_eq!(v.check(0x4FFF_F000, 0x1000), Err(MmError::OutOfBounds));
        assert_eq!(v.check(0x5000_0000, 0), Err(MmError::InvalidSize));
        assert_eq!(v.check(0xFFFF_F000, 0x2000), Err(MmError::InvalidSize));
        assert_eq!(v.check(0x5000_0800, 0x1000), Err(MmError::NotAligned));
    }

    #[test]
    fn unconfigured_rejects_everything() {
        let v = MemValidator::new();
        assert_eq!(v.check(0x1000, 0x1000), Err(MmError::OutOfBounds));
    }
}
