//! # Escalonadores
//!
//! Só o estado que o bring-up precisa: o escalonador global (ids de job), o
//! do GP (amarrado ao único grupo GP) e o dos PPs (lista de grupos PP e, no
//! Mali-450, a ligação deles ao grupo virtual). O escalonamento de jobs em
//! si fica fora deste núcleo.

use super::error::{MaliError, MaliResult};
use super::group::{GroupHandle, GroupRegistry};
use crate::mm::{Allocation, ObjectHeap};
use alloc::vec::Vec;

pub struct Scheduler {
    next_job_id: u32,
    _state: Allocation,
}

impl Scheduler {
    pub fn initialize(heap: &ObjectHeap) -> MaliResult<Self> {
        let state = heap.reserve_for::<Self>()?;
        Ok(Self {
            next_job_id: 1,
            _state: state,
        })
    }

    /// Próximo id de job (0 nunca é usado).
    pub fn next_job_id(&mut self) -> u32 {
        let id = self.next_job_id;
        self.next_job_id = self.next_job_id.wrapping_add(1).max(1);
        id
    }
}

pub struct GpScheduler {
    group: GroupHandle,
    _state: Allocation,
}

impl GpScheduler {
    pub fn initialize(heap: &ObjectHeap, groups: &GroupRegistry) -> MaliResult<Self> {
        let group = groups.gp_group().ok_or_else(|| {
            crate::kerror!("(Sched) Nenhum grupo GP encontrado");
            MaliError::ConfigurationInvalid
        })?;
        let state = heap.reserve_for::<Self>()?;
        Ok(Self {
            group,
            _state: state,
        })
    }

    pub fn group(&self) -> GroupHandle {
        self.group
    }
}

pub struct PpScheduler {
    groups: Vec<GroupHandle>,
    virtual_group: Option<GroupHandle>,
    _state: Allocation,
}

impl PpScheduler {
    pub fn initialize(heap: &ObjectHeap) -> MaliResult<Self> {
        let state = heap.reserve_for::<Self>()?;
        Ok(Self {
            groups: Vec::new(),
            virtual_group: None,
            _state: state,
        })
    }

    /// Recolhe os grupos PP; com grupo virtual, todos passam a fazer parte dele.
    pub fn populate(&mut self, registry: &mut GroupRegistry) -> MaliResult<()> {
        let handles: Vec<GroupHandle> = registry.pp_groups().collect();
        if handles.is_empty() {
            crate::kerror!("(Sched) Nenhum grupo PP encontrado");
            return Err(MaliError::ConfigurationInvalid);
        }

        if let Some(virt) = registry.virtual_group() {
            for (joined, handle) in handles.iter().enumerate() {
                if let Err(err) = registry.add_to_virtual(*handle) {
                    for added in &handles[..joined] {
                        leave_virtual(registry, *added);
                    }
                    return Err(err);
                }
            }
            self.virtual_group = Some(virt);
        }

        crate::kinfo!("(Sched) PPs no escalonador=", handles.len());
        self.groups = handles;
        Ok(())
    }

    pub fn depopulate(&mut self, registry: &mut GroupRegistry) {
        if self.virtual_group.take().is_some() {
            for handle in &self.groups {
                leave_virtual(registry, *handle);
            }
        }
        self.groups.clear();
    }

    pub fn groups(&self) -> &[GroupHandle] {
        &self.groups
    }

    pub fn virtual_group(&self) -> Option<GroupHandle> {
        self.virtual_group
    }
}

fn leave_virtual(registry: &mut GroupRegistry, handle: GroupHandle) {
    if let Err(err) = registry.remove_from_virtual(handle) {
        crate::kwarn!("(Sched) Grupo fora do grupo virtual=", handle.0);
        crate::kwarn!(err.as_str());
    }
}
