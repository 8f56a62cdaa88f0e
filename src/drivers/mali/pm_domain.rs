// Arquivo: drivers/mali/pm_domain.rs
//
// Propósito: Domínios de energia da GPU.
//
// Detalhes de Implementação:
// - Cada domínio é um conjunto de ilhas do PMU (`PmuMask`) com os grupos e
//   caches L2 alimentados por elas.
// - Domínios só existem quando há PMU; adicionar membro a um domínio
//   inexistente não faz nada.
// - O layout é fixo por variante (`HardwareVariant::domain_layout`).

//! Gerenciador de Domínios de Energia

use super::error::{MaliError, MaliResult};
use super::group::GroupHandle;
use super::hw::{PmuCore, PmuMask};
use super::l2_cache::CacheHandle;
use super::product::DomainId;
use crate::mm::{Allocation, ObjectHeap};
use alloc::vec::Vec;

#[derive(Debug)]
pub struct PmDomain {
    id: DomainId,
    mask: PmuMask,
    name: &'static str,
    groups: Vec<GroupHandle>,
    caches: Vec<CacheHandle>,
    powered: bool,
    _footprint: Allocation,
}

impl PmDomain {
    pub fn id(&self) -> DomainId {
        self.id
    }

    pub fn mask(&self) -> PmuMask {
        self.mask
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn groups(&self) -> &[GroupHandle] {
        &self.groups
    }

    pub fn caches(&self) -> &[CacheHandle] {
        &self.caches
    }

    pub fn is_powered(&self) -> bool {
        self.powered
    }
}

pub struct PmDomainManager {
    heap: ObjectHeap,
    domains: Vec<PmDomain>,
}

impl PmDomainManager {
    pub fn new(heap: &ObjectHeap) -> Self {
        Self {
            heap: heap.clone(),
            domains: Vec::new(),
        }
    }

    /// Cria o domínio `id`. Domínios nascem energizados (PMU resetado).
    pub fn create_domain(&mut self, id: DomainId, mask: PmuMask, name: &'static str) -> MaliResult<()> {
        if self.domain(id).is_some() {
            crate::kerror!("(PmDomain) Domínio duplicado, id=", id);
            return Err(MaliError::Fault);
        }

        self.domains
            .try_reserve(1)
            .map_err(|_| MaliError::AllocationFailed)?;
        let footprint = self.heap.reserve_for::<PmDomain>()?;

        self.domains.push(PmDomain {
            id,
            mask,
            name,
            groups: Vec::new(),
            caches: Vec::new(),
            powered: true,
            _footprint: footprint,
        });
        crate::kdebug!("(PmDomain) Domínio criado, máscara=", mask.bits());
        Ok(())
    }

    pub fn add_group(&mut self, id: DomainId, group: GroupHandle) {
        if let Some(domain) = self.domain_mut(id) {
            domain.groups.push(group);
        }
    }

    pub fn add_cache(&mut self, id: DomainId, cache: CacheHandle) {
        if let Some(domain) = self.domain_mut(id) {
            domain.caches.push(cache);
        }
    }

    /// Remove `group` de qualquer domínio (grupo destruído).
    pub fn forget_group(&mut self, group: GroupHandle) {
        for domain in &mut self.domains {
            domain.groups.retain(|g| *g != group);
        }
    }

    /// Remove todas as caches de qualquer domínio (pool esvaziada).
    pub fn forget_caches(&mut self) {
        for domain in &mut self.domains {
            domain.caches.clear();
        }
    }

    /// Destrói todos os domínios. Idempotente.
    pub fn terminate_all(&mut self) {
        if !self.domains.is_empty() {
            crate::ktrace!("(PmDomain) Domínios destruídos, total=", self.domains.len());
        }
        self.domains.clear();
    }

    pub fn count(&self) -> u32 {
        self.domains.len() as u32
    }

    pub fn domain(&self, id: DomainId) -> Option<&PmDomain> {
        self.domains.iter().find(|d| d.id == id)
    }

    fn domain_mut(&mut self, id: DomainId) -> Option<&mut PmDomain> {
        self.domains.iter_mut().find(|d| d.id == id)
    }

    /// Domínios em ordem de criação.
    pub fn iter(&self) -> impl Iterator<Item = &PmDomain> {
        self.domains.iter()
    }

    pub fn domain_of_group(&self, group: GroupHandle) -> Option<DomainId> {
        self.domains
            .iter()
            .find(|d| d.groups.contains(&group))
            .map(|d| d.id)
    }

    fn union_mask(&self) -> PmuMask {
        self.domains
            .iter()
            .fold(PmuMask::empty(), |acc, d| acc | d.mask)
    }

    /// Liga todos os domínios com um único comando ao PMU.
    pub fn power_up_all(&mut self, pmu: &mut PmuCore) {
        let mask = self.union_mask();
        if mask.is_empty() {
            return;
        }
        pmu.power_up(mask);
        for domain in &mut self.domains {
            domain.powered = true;
        }
        crate::kdebug!("(PmDomain) Domínios ligados, máscara=", mask.bits());
    }

    /// Desliga todos os domínios com um único comando ao PMU.
    pub fn power_down_all(&mut self, pmu: &mut PmuCore) {
        let mask = self.union_mask();
        if mask.is_empty() {
            return;
        }
        pmu.power_down(mask);
        for domain in &mut self.domains {
            domain.powered = false;
        }
        crate::kdebug!("(PmDomain) Domínios desligados, máscara=", mask.bits());
    }
}
