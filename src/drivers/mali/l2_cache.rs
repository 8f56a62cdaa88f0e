//! # Pool de Caches L2
//!
//! Caches são criadas durante a leitura da configuração e só saem todas de
//! uma vez (`delete_all_caches`). Grupos guardam um `CacheHandle`, nunca a
//! cache; o contador de grupos anexados permite conferir, no teardown, que
//! nenhum grupo sobreviveu à sua cache.

use super::error::{MaliError, MaliResult};
use super::hw::L2CacheCore;
use super::platform::Platform;
use super::resource::Resource;
use crate::mm::ObjectHeap;
use alloc::vec::Vec;

/// Índice estável de uma cache na pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheHandle(pub u32);

pub struct L2CachePool {
    heap: ObjectHeap,
    caches: Vec<L2CacheCore>,
}

impl L2CachePool {
    pub fn new(heap: &ObjectHeap) -> Self {
        Self {
            heap: heap.clone(),
            caches: Vec::new(),
        }
    }

    /// Cria uma cache L2 e invalida seu conteúdo.
    pub fn create_cache<P: Platform + ?Sized>(
        &mut self,
        platform: &mut P,
        resource: &Resource,
    ) -> MaliResult<CacheHandle> {
        self.caches
            .try_reserve(1)
            .map_err(|_| MaliError::AllocationFailed)?;

        let id = self.caches.len() as u32;
        let mut cache = L2CacheCore::create(platform, &self.heap, resource, id)?;
        cache.reset();

        crate::kinfo!("(L2) Cache criada, base=", resource.base);
        self.caches.push(cache);
        Ok(CacheHandle(id))
    }

    /// Remove todas as caches. Idempotente.
    pub fn delete_all_caches<P: Platform + ?Sized>(&mut self, platform: &mut P) {
        if self.caches.is_empty() {
            return;
        }

        while let Some(cache) = self.caches.pop() {
            if cache.attached_groups() != 0 {
                crate::kerror!("(L2) Cache removida com grupos anexados, base=", cache.base());
            }
            cache.delete(platform);
        }
        crate::ktrace!("(L2) Pool esvaziada");
    }

    pub fn count(&self) -> u32 {
        self.caches.len() as u32
    }

    /// N-ésima cache viva.
    pub fn get(&self, index: usize) -> Option<CacheHandle> {
        (index < self.caches.len()).then(|| CacheHandle(index as u32))
    }

    pub fn cache(&self, handle: CacheHandle) -> Option<&L2CacheCore> {
        self.caches.get(handle.0 as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &L2CacheCore> {
        self.caches.iter()
    }

    pub(crate) fn attach(&mut self, handle: CacheHandle) {
        if let Some(cache) = self.caches.get_mut(handle.0 as usize) {
            cache.attach();
        }
    }

    pub(crate) fn detach(&mut self, handle: CacheHandle) {
        if let Some(cache) = self.caches.get_mut(handle.0 as usize) {
            cache.detach();
        }
    }
}
