//! # Grupos
//!
//! Um grupo junta uma MMU, no máximo um core de processamento (GP ou PP) e,
//! opcionalmente, uma cache L2 compartilhada. MMU e core pertencem ao grupo;
//! a cache é só referenciada por `CacheHandle` e contada na pool.
//!
//! O grupo virtual (Mali-450) troca o core físico pelo PP de broadcast e
//! carrega a DLBU e a unidade de broadcast. PPs físicos entram nele por
//! `add_to_virtual`.
//!
//! ## Ordem de construção
//!
//! ```text
//! físico:  shell -> MMU -> core -> reset
//! virtual: DLBU -> broadcast -> shell -> MMU -> PP broadcast -> reset
//! ```
//!
//! Qualquer falha desfaz o que já foi criado, na ordem inversa.

use super::error::{MaliError, MaliResult};
use super::hw::{BcastUnit, BroadcastMask, DlbuCore, GpCore, MmuCore, PpCore};
use super::l2_cache::{CacheHandle, L2CachePool};
use super::platform::Platform;
use super::resource::Resource;
use crate::mm::{Allocation, ObjectHeap};
use alloc::vec::Vec;

/// Índice estável de um grupo no registro.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupHandle(pub u32);

/// Core de processamento de um grupo.
#[derive(Debug)]
pub enum GroupCore {
    Gp(GpCore),
    Pp(PpCore),
}

impl GroupCore {
    fn reset(&mut self) {
        match self {
            Self::Gp(gp) => gp.reset(),
            Self::Pp(pp) => pp.reset(),
        }
    }

    fn delete<P: Platform + ?Sized>(self, platform: &mut P) {
        match self {
            Self::Gp(gp) => gp.delete(platform),
            Self::Pp(pp) => pp.delete(platform),
        }
    }
}

/// Recurso do core a criar dentro do grupo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compute {
    Gp(Resource),
    Pp {
        resource: Resource,
        bcast_id: BroadcastMask,
    },
}

/// Recursos do grupo virtual.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualResources {
    pub mmu_bcast: Resource,
    pub pp_bcast: Resource,
    pub dlbu: Resource,
    pub bcast: Resource,
}

#[derive(Debug)]
pub struct Group {
    cache: Option<CacheHandle>,
    mmu: MmuCore,
    core: Option<GroupCore>,
    dlbu: Option<DlbuCore>,
    bcast: Option<BcastUnit>,
    parent: Option<GroupHandle>,
    members: Vec<GroupHandle>,
    _shell: Allocation,
}

impl Group {
    fn reset(&mut self) {
        self.mmu.reset();
        if let Some(core) = self.core.as_mut() {
            core.reset();
        }
        if let Some(bcast) = self.bcast.as_mut() {
            bcast.reset();
        }
        if let Some(dlbu) = self.dlbu.as_mut() {
            dlbu.reset();
        }
    }

    fn delete<P: Platform + ?Sized>(self, platform: &mut P) {
        if let Some(core) = self.core {
            core.delete(platform);
        }
        self.mmu.delete(platform);
        if let Some(bcast) = self.bcast {
            bcast.delete(platform);
        }
        if let Some(dlbu) = self.dlbu {
            dlbu.delete(platform);
        }
    }

    pub fn cache(&self) -> Option<CacheHandle> {
        self.cache
    }

    pub fn mmu(&self) -> &MmuCore {
        &self.mmu
    }

    pub fn core(&self) -> Option<&GroupCore> {
        self.core.as_ref()
    }

    pub fn gp(&self) -> Option<&GpCore> {
        match &self.core {
            Some(GroupCore::Gp(gp)) => Some(gp),
            _ => None,
        }
    }

    pub fn pp(&self) -> Option<&PpCore> {
        match &self.core {
            Some(GroupCore::Pp(pp)) => Some(pp),
            _ => None,
        }
    }

    pub fn is_virtual(&self) -> bool {
        self.dlbu.is_some()
    }

    pub fn dlbu(&self) -> Option<&DlbuCore> {
        self.dlbu.as_ref()
    }

    pub fn bcast(&self) -> Option<&BcastUnit> {
        self.bcast.as_ref()
    }

    /// Grupo virtual do qual este PP faz parte.
    pub fn parent(&self) -> Option<GroupHandle> {
        self.parent
    }

    /// PPs físicos de um grupo virtual.
    pub fn members(&self) -> &[GroupHandle] {
        &self.members
    }
}

/// Registro global de grupos, em ordem de criação.
pub struct GroupRegistry {
    heap: ObjectHeap,
    slots: Vec<Option<Group>>,
    virtual_group: Option<GroupHandle>,
}

impl GroupRegistry {
    pub fn new(heap: &ObjectHeap) -> Self {
        Self {
            heap: heap.clone(),
            slots: Vec::new(),
            virtual_group: None,
        }
    }

    fn insert(&mut self, group: Group) -> GroupHandle {
        let handle = GroupHandle(self.slots.len() as u32);
        self.slots.push(Some(group));
        handle
    }

    /// Cria um grupo físico.
    pub fn create_group<P: Platform + ?Sized>(
        &mut self,
        platform: &mut P,
        caches: &mut L2CachePool,
        cache: Option<CacheHandle>,
        mmu_resource: &Resource,
        compute: Option<Compute>,
    ) -> MaliResult<GroupHandle> {
        crate::ktrace!("(Group) Novo grupo para a MMU, base=", mmu_resource.base);

        self.slots
            .try_reserve(1)
            .map_err(|_| MaliError::AllocationFailed)?;
        let shell = self.heap.reserve_for::<Group>().map_err(|_| {
            crate::kerror!("(Group) Sem memória para o grupo, MMU=", mmu_resource.base);
            MaliError::AllocationFailed
        })?;

        let mmu = MmuCore::create(platform, &self.heap, mmu_resource, false)?;

        let core = match compute {
            None => None,
            Some(Compute::Gp(resource)) => match GpCore::create(platform, &self.heap, &resource) {
                Ok(gp) => Some(GroupCore::Gp(gp)),
                Err(err) => {
                    mmu.delete(platform);
                    return Err(err);
                }
            },
            Some(Compute::Pp { resource, bcast_id }) => {
                match PpCore::create(platform, &self.heap, &resource, false, bcast_id) {
                    Ok(pp) => Some(GroupCore::Pp(pp)),
                    Err(err) => {
                        mmu.delete(platform);
                        return Err(err);
                    }
                }
            }
        };

        if let Some(handle) = cache {
            caches.attach(handle);
        }

        let mut group = Group {
            cache,
            mmu,
            core,
            dlbu: None,
            bcast: None,
            parent: None,
            members: Vec::new(),
            _shell: shell,
        };
        group.reset();

        Ok(self.insert(group))
    }

    /// Cria o grupo virtual (broadcast para vários PPs).
    pub fn create_virtual_group<P: Platform + ?Sized>(
        &mut self,
        platform: &mut P,
        resources: &VirtualResources,
    ) -> MaliResult<GroupHandle> {
        crate::ktrace!("(Group) Novo grupo virtual, MMU=", resources.mmu_bcast.base);

        self.slots
            .try_reserve(1)
            .map_err(|_| MaliError::AllocationFailed)?;

        let dlbu = DlbuCore::create(platform, &self.heap, &resources.dlbu).map_err(|err| {
            crate::kerror!("(Group) Falha ao criar a DLBU");
            err
        })?;

        let bcast = match BcastUnit::create(platform, &self.heap, &resources.bcast) {
            Ok(bcast) => bcast,
            Err(err) => {
                crate::kerror!("(Group) Falha ao criar a unidade de broadcast");
                dlbu.delete(platform);
                return Err(err);
            }
        };

        let shell = match self.heap.reserve_for::<Group>() {
            Ok(shell) => shell,
            Err(_) => {
                bcast.delete(platform);
                dlbu.delete(platform);
                return Err(MaliError::AllocationFailed);
            }
        };

        let mmu = match MmuCore::create(platform, &self.heap, &resources.mmu_bcast, true) {
            Ok(mmu) => mmu,
            Err(err) => {
                drop(shell);
                bcast.delete(platform);
                dlbu.delete(platform);
                return Err(err);
            }
        };

        let pp = match PpCore::create(
            platform,
            &self.heap,
            &resources.pp_bcast,
            true,
            BroadcastMask::empty(),
        ) {
            Ok(pp) => pp,
            Err(err) => {
                mmu.delete(platform);
                drop(shell);
                bcast.delete(platform);
                dlbu.delete(platform);
                return Err(err);
            }
        };

        let mut group = Group {
            cache: None,
            mmu,
            core: Some(GroupCore::Pp(pp)),
            dlbu: Some(dlbu),
            bcast: Some(bcast),
            parent: None,
            members: Vec::new(),
            _shell: shell,
        };
        group.reset();

        let handle = self.insert(group);
        self.virtual_group = Some(handle);
        crate::kinfo!("(Group) Grupo virtual criado, handle=", handle.0);
        Ok(handle)
    }

    /// Remove um grupo. A cache referenciada continua na pool.
    pub fn delete_group<P: Platform + ?Sized>(
        &mut self,
        platform: &mut P,
        caches: &mut L2CachePool,
        handle: GroupHandle,
    ) -> MaliResult<()> {
        let is_live = self
            .slots
            .get(handle.0 as usize)
            .is_some_and(|slot| slot.is_some());
        if !is_live {
            return Err(MaliError::Fault);
        }

        let members = self
            .group(handle)
            .map(|g| g.members.clone())
            .unwrap_or_default();
        for member in members {
            self.remove_from_virtual(member)?;
        }
        if self.group(handle).and_then(|g| g.parent).is_some() {
            self.remove_from_virtual(handle)?;
        }

        let group = self
            .slots
            .get_mut(handle.0 as usize)
            .and_then(Option::take)
            .ok_or(MaliError::Fault)?;

        if self.virtual_group == Some(handle) {
            self.virtual_group = None;
        }
        if let Some(cache) = group.cache {
            caches.detach(cache);
        }
        group.delete(platform);
        Ok(())
    }

    /// Remove todos os grupos. Idempotente.
    pub fn delete_all_groups<P: Platform + ?Sized>(
        &mut self,
        platform: &mut P,
        caches: &mut L2CachePool,
    ) {
        for index in (0..self.slots.len()).rev() {
            let handle = GroupHandle(index as u32);
            if self.group(handle).is_some() {
                if let Err(err) = self.delete_group(platform, caches, handle) {
                    crate::kwarn!("(Group) Falha ao remover grupo=", handle.0);
                    crate::kwarn!(err.as_str());
                }
            }
        }
        self.slots.clear();
        self.virtual_group = None;
    }

    /// Reset de todos os grupos (retorno de suspend).
    pub fn reset_all(&mut self) {
        for group in self.slots.iter_mut().flatten() {
            group.reset();
        }
    }

    /// Liga um PP físico ao grupo virtual.
    pub fn add_to_virtual(&mut self, member: GroupHandle) -> MaliResult<()> {
        let vhandle = self.virtual_group.ok_or(MaliError::Fault)?;
        let bcast_id = match self.group(member) {
            Some(g) if !g.is_virtual() && g.parent.is_none() => {
                g.pp().map(PpCore::bcast_id).ok_or(MaliError::Fault)?
            }
            _ => return Err(MaliError::Fault),
        };

        let virt = self.group_mut(vhandle).ok_or(MaliError::Fault)?;
        if let Some(bcast) = virt.bcast.as_mut() {
            bcast.add(bcast_id);
        }
        if let Some(dlbu) = virt.dlbu.as_mut() {
            dlbu.add_pp(bcast_id);
        }
        virt.members.push(member);

        if let Some(group) = self.group_mut(member) {
            group.parent = Some(vhandle);
        }
        Ok(())
    }

    /// Devolve um PP do grupo virtual ao estado físico.
    pub fn remove_from_virtual(&mut self, member: GroupHandle) -> MaliResult<()> {
        let (vhandle, bcast_id) = match self.group(member) {
            Some(g) => (
                g.parent.ok_or(MaliError::Fault)?,
                g.pp().map(PpCore::bcast_id).unwrap_or(BroadcastMask::empty()),
            ),
            None => return Err(MaliError::Fault),
        };

        if let Some(virt) = self.group_mut(vhandle) {
            if let Some(bcast) = virt.bcast.as_mut() {
                bcast.remove(bcast_id);
            }
            if let Some(dlbu) = virt.dlbu.as_mut() {
                dlbu.remove_pp(bcast_id);
            }
            virt.members.retain(|h| *h != member);
        }
        if let Some(group) = self.group_mut(member) {
            group.parent = None;
        }
        Ok(())
    }

    pub fn group(&self, handle: GroupHandle) -> Option<&Group> {
        self.slots.get(handle.0 as usize)?.as_ref()
    }

    fn group_mut(&mut self, handle: GroupHandle) -> Option<&mut Group> {
        self.slots.get_mut(handle.0 as usize)?.as_mut()
    }

    /// Grupos vivos, em ordem de criação.
    pub fn iter(&self) -> impl Iterator<Item = (GroupHandle, &Group)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|g| (GroupHandle(i as u32), g)))
    }

    pub fn count(&self) -> u32 {
        self.iter().count() as u32
    }

    pub fn gp_group(&self) -> Option<GroupHandle> {
        self.iter().find(|(_, g)| g.gp().is_some()).map(|(h, _)| h)
    }

    /// PPs físicos, em ordem de criação.
    pub fn pp_groups(&self) -> impl Iterator<Item = GroupHandle> + '_ {
        self.iter()
            .filter(|(_, g)| !g.is_virtual() && g.pp().is_some())
            .map(|(h, _)| h)
    }

    pub fn virtual_group(&self) -> Option<GroupHandle> {
        self.virtual_group
    }
}
