//! # Memory Management da GPU (MM)
//!
//! O módulo `mm` concentra tudo que o núcleo Mali sabe sobre memória:
//!
//! | Módulo       | Responsabilidade |
//! |--------------|------------------|
//! | `heap`       | Heap de objetos fornecido pelo host (OOM sinalizado, nunca aborta). |
//! | `validation` | Faixa física única (framebuffer) que pode ser mapeada na GPU. |
//! | `config`     | Constantes de página e parâmetros de memória. |
//!
//! O `MemoryManager` registra os backends de memória (dedicada e/ou
//! compartilhada do SO) e é criado/destruído pelo orquestrador nos passos
//! `MemoryReady` e `MemoryConfigParsed`.

pub mod config;
pub mod error;
pub mod heap;
pub mod validation;

pub use error::{MmError, MmResult};
pub use heap::{Allocation, ObjectHeap};
pub use validation::MemValidator;

use alloc::vec::Vec;
use config::is_page_aligned;

/// Origem de memória que a GPU pode usar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryBackendKind {
    /// Faixa física reservada para a GPU.
    Dedicated { start: u32, size: u32 },
    /// Memória do SO compartilhada, limitada a `size` bytes.
    Os { size: u32 },
}

struct MemoryBackend {
    kind: MemoryBackendKind,
    _footprint: Allocation,
}

/// Gerenciador de memória da GPU.
pub struct MemoryManager {
    heap: ObjectHeap,
    backends: Vec<MemoryBackend>,
    validator: MemValidator,
    _state: Allocation,
}

impl MemoryManager {
    /// Inicializa o gerenciador (estado de sessões de memória).
    pub fn initialize(heap: &ObjectHeap) -> MmResult<Self> {
        let state = heap.reserve_for::<Self>()?;
        crate::ktrace!("(Mem) Gerenciador de memória inicializado");

        Ok(Self {
            heap: heap.clone(),
            backends: Vec::new(),
            validator: MemValidator::new(),
            _state: state,
        })
    }

    /// Registra memória dedicada `[start, start + size)`.
    pub fn register_dedicated(&mut self, start: u32, size: u32) -> MmResult<()> {
        if size == 0 || start.checked_add(size).is_none() {
            return Err(MmError::InvalidSize);
        }
        if !is_page_aligned(start) || !is_page_aligned(size) {
            crate::kerror!("(Mem) Memória dedicada desalinhada, start=", start);
            return Err(MmError::NotAligned);
        }

        let footprint = self.heap.reserve_for::<MemoryBackendKind>()?;
        self.backends.push(MemoryBackend {
            kind: MemoryBackendKind::Dedicated { start, size },
            _footprint: footprint,
        });
        crate::kinfo!("(Mem) Memória dedicada registrada, size=", size);
        Ok(())
    }

    /// Registra memória compartilhada do SO (até `size` bytes).
    pub fn register_os_memory(&mut self, size: u32) -> MmResult<()> {
        if size == 0 {
            return Err(MmError::InvalidSize);
        }

        let footprint = self.heap.reserve_for::<MemoryBackendKind>()?;
        self.backends.push(MemoryBackend {
            kind: MemoryBackendKind::Os { size },
            _footprint: footprint,
        });
        crate::kinfo!("(Mem) Memória do SO registrada, size=", size);
        Ok(())
    }

    /// Backends registrados, em ordem de registro.
    pub fn backends(&self) -> impl Iterator<Item = MemoryBackendKind> + '_ {
        self.backends.iter().map(|b| b.kind)
    }

    pub fn validator(&self) -> &MemValidator {
        &self.validator
    }

    pub fn validator_mut(&mut self) -> &mut MemValidator {
        &mut self.validator
    }

    /// Desfaz a configuração (backends + faixa validada), mantendo o gerenciador.
    pub fn release_config(&mut self) {
        self.backends.clear();
        self.validator.reset();
    }
}

impl Drop for MemoryManager {
    fn drop(&mut self) {
        self.release_config();
        crate::ktrace!("(Mem) Gerenciador de memória terminado");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::heap::test_heap;

    #[test]
    fn backends_are_released_with_the_manager() {
        let heap = test_heap(8 * 1024);
        let mut mm = MemoryManager::initialize(&heap).unwrap();
        mm.register_dedicated(0x4000_0000, 0x0100_0000).unwrap();
        mm.register_os_memory(config::DEFAULT_SHARED_MEM_SIZE).unwrap();
        assert_eq!(mm.backends().count(), 2);

        drop(mm);
        assert_eq!(heap.used(), 0);
    }

    #[test]
    fn dedicated_memory_must_be_aligned() {
        let heap = test_heap(8 * 1024);
        let mut mm = MemoryManager::initialize(&heap).unwrap();
        assert_eq!(mm.register_dedicated(0x4000_0100, 0x1000), Err(MmError::NotAligned));
        assert_eq!(mm.register_dedicated(0x4000_0000, 0), Err(MmError::InvalidSize));
        assert_eq!(mm.backends().count(), 0);
    }
}
