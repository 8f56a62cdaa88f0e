//! # Heap de Objetos
//!
//! Todo objeto criado pelo núcleo Mali (grupos, cores, caches L2, domínios,
//! páginas da MMU, ...) reserva sua área neste heap. A memória vem do host
//! (uma região `'static`) e é gerenciada por `linked_list_allocator::Heap`.
//!
//! ## Contrato
//! - Falta de espaço é sinalizada com `MmError::OutOfMemory`, nunca aborta.
//! - `Allocation` devolve o bloco ao heap no `Drop`.
//! - `used() == 0` depois de um teardown completo (detector de vazamento).

use super::error::{MmError, MmResult};
use alloc::sync::Arc;
use core::alloc::Layout;
use core::mem::MaybeUninit;
use core::ptr::NonNull;
use linked_list_allocator::Heap;
use spin::Mutex;

/// Heap de objetos compartilhado pelos subsistemas.
#[derive(Clone)]
pub struct ObjectHeap {
    inner: Arc<Mutex<Heap>>,
}

impl ObjectHeap {
    /// Cria o heap sobre uma região fornecida pelo host.
    pub fn new(region: &'static mut [MaybeUninit<u8>]) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Heap::from_slice(region))),
        }
    }

    /// Reserva um bloco com o layout pedido.
    pub fn reserve(&self, layout: Layout) -> MmResult<Allocation> {
        let ptr = self
            .inner
            .lock()
            .allocate_first_fit(layout)
            .map_err(|_| MmError::OutOfMemory)?;

        Ok(Allocation {
            heap: self.clone(),
            ptr,
            layout,
        })
    }

    /// Reserva o footprint de um objeto do tipo `T`.
    pub fn reserve_for<T>(&self) -> MmResult<Allocation> {
        self.reserve(Layout::new::<T>())
    }

    /// Reserva `len` bytes alinhados a `align`.
    pub fn reserve_bytes(&self, len: usize, align: usize) -> MmResult<Allocation> {
        let layout = Layout::from_size_align(len, align).map_err(|_| MmError::InvalidParameter)?;
        self.reserve(layout)
    }

    /// Bytes em uso.
    pub fn used(&self) -> usize {
        self.inner.lock().used()
    }

    /// Bytes livres.
    pub fn free(&self) -> usize {
        self.inner.lock().free()
    }

    /// Tamanho total do heap.
    pub fn size(&self) -> usize {
        self.inner.lock().size()
    }
}

/// Bloco reservado no heap de objetos (liberado no Drop).
pub struct Allocation {
    heap: ObjectHeap,
    ptr: NonNull<u8>,
    layout: Layout,
}

impl Allocation {
    pub fn size(&self) -> usize {
        self.layout.size()
    }

    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    /// Zera o conteúdo do bloco.
    pub fn zero(&mut self) {
        // SAFETY: o bloco tem `layout.size()` bytes e pertence exclusivamente a nós
        unsafe { core::ptr::write_bytes(self.ptr.as_ptr(), 0, self.layout.size()) };
    }
}

impl Drop for Allocation {
    fn drop(&mut self) {
        // SAFETY: ptr/layout vieram de allocate_first_fit deste mesmo heap
        unsafe { self.heap.inner.lock().deallocate(self.ptr, self.layout) };
    }
}

impl core::fmt::Debug for Allocation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Allocation")
            .field("ptr", &self.ptr)
            .field("size", &self.layout.size())
            .finish()
    }
}

#[cfg(test)]
pub(crate) fn test_heap(size: usize) -> ObjectHeap {
    use alloc::vec;

    let region = vec![MaybeUninit::<u8>::uninit(); size].into_boxed_slice();
    ObjectHeap::new(alloc::boxed::Box::leak(region))
}
