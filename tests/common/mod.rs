//! Host falso para os testes de cenário.

#![allow(dead_code)]

use mali_core::drivers::mali::platform::{DeviceData, IoRegion};
use mali_core::drivers::mali::resource::offsets;
use mali_core::mm::ObjectHeap;
use mali_core::{MaliError, MaliResult, Platform, Resource, ResourceRegistry};
use mali_core::drivers::mali::StaticResourceTable;
use std::mem::MaybeUninit;
use std::ptr::NonNull;

pub const BASE: u32 = 0x1300_0000;
pub const MALI200_VERSION: u32 = 0xC807_0000;
pub const MALI400_VERSION: u32 = 0xCD07_0101;
pub const MALI450_VERSION: u32 = 0xCF07_0200;

/// Heap de objetos para um teste.
pub fn heap(size: usize) -> ObjectHeap {
    let region = vec![MaybeUninit::<u8>::uninit(); size].into_boxed_slice();
    ObjectHeap::new(Box::leak(region))
}

pub struct FakePlatform {
    table: StaticResourceTable,
    windows: Vec<(u32, Box<[u32]>)>,
    seeds: Vec<(u32, u32, u32)>,
    fail_map: Vec<u32>,
    pub dev_refs: i32,
    pub shared_irqs: bool,
    pub device_data: Option<DeviceData>,
}

impl FakePlatform {
    pub fn empty() -> Self {
        Self {
            table: StaticResourceTable::new(),
            windows: Vec::new(),
            seeds: Vec::new(),
            fail_map: Vec::new(),
            dev_refs: 0,
            shared_irqs: false,
            device_data: None,
        }
    }

    /// Mali-400 MP`pp`: GP, L2 e `pp` pares PP/MMU.
    pub fn mali400(pp: usize, pmu: bool) -> Self {
        let mut p = Self::empty()
            .with(offsets::GP, "Mali_GP")
            .with(offsets::GP_MMU, "Mali_GP_MMU")
            .with(offsets::L2_PP_GROUP0, "Mali_L2");
        for slot in 0..pp {
            p = p
                .with(offsets::PP[slot], "Mali_PP")
                .with(offsets::PP_MMU[slot], "Mali_PP_MMU");
        }
        if pmu {
            p = p.with(offsets::PMU, "Mali_PMU");
        }
        p.seed(offsets::PP[0], 0x1000, MALI400_VERSION)
    }

    /// Mali-450 MP`pp`: L2 por cluster e grupo virtual.
    pub fn mali450(pp: usize, pmu: bool) -> Self {
        let mut p = Self::empty()
            .with(offsets::GP, "Mali_GP")
            .with(offsets::GP_MMU, "Mali_GP_MMU")
            .with(offsets::L2_GP, "Mali_L2_GP")
            .with(offsets::L2_PP_GROUP0, "Mali_L2_PP0")
            .with(offsets::DLBU, "Mali_DLBU")
            .with(offsets::BCAST, "Mali_Broadcast")
            .with(offsets::PP_MMU_BCAST, "Mali_PP_MMU_Broadcast")
            .with(offsets::PP_BCAST, "Mali_PP_Broadcast");
        if pp > 4 {
            p = p.with(offsets::L2_PP_GROUP1, "Mali_L2_PP1");
        }
        for slot in 0..pp {
            p = p
                .with(offsets::PP[slot], "Mali_PP")
                .with(offsets::PP_MMU[slot], "Mali_PP_MMU");
        }
        if pmu {
            p = p.with(offsets::PMU, "Mali_PMU");
        }
        p.seed(offsets::PP[0], 0x1000, MALI450_VERSION)
    }

    pub fn with(mut self, offset: u32, description: &'static str) -> Self {
        self.table
            .insert(Resource::new(BASE + offset, Some(100 + (offset >> 12) as i32), description));
        self
    }

    pub fn without(mut self, offset: u32) -> Self {
        self.table.remove(BASE + offset);
        self
    }

    pub fn seed(mut self, offset: u32, reg: u32, value: u32) -> Self {
        self.seeds.retain(|(phys, r, _)| !(*phys == BASE + offset && *r == reg));
        self.seeds.push((BASE + offset, reg, value));
        self
    }

    /// O próximo mapeamento deste recurso falha.
    pub fn fail_map_at(mut self, offset: u32) -> Self {
        self.fail_map.push(BASE + offset);
        self
    }

    pub fn clear_failures(&mut self) {
        self.fail_map.clear();
    }

    pub fn live_mappings(&self) -> usize {
        self.windows.len()
    }

    /// Registrador `reg` da janela mapeada em `offset`.
    pub fn register(&self, offset: u32, reg: u32) -> Option<u32> {
        self.windows
            .iter()
            .find(|(phys, _)| *phys == BASE + offset)
            .map(|(_, words)| words[(reg / 4) as usize])
    }
}

impl ResourceRegistry for FakePlatform {
    fn find_resource(&self, address: u32) -> MaliResult<Resource> {
        self.table.find_resource(address)
    }
}

impl Platform for FakePlatform {
    fn resource_base_address(&self) -> u32 {
        if self.table.is_empty() {
            0
        } else {
            BASE
        }
    }

    fn shared_interrupts(&self) -> bool {
        self.shared_irqs
    }

    fn device_data(&self) -> Option<DeviceData> {
        self.device_data
    }

    fn pm_dev_ref_add(&mut self) -> MaliResult<()> {
        self.dev_refs += 1;
        Ok(())
    }

    fn pm_dev_ref_dec(&mut self) {
        self.dev_refs -= 1;
    }

    fn map_io_region(&mut self, resource: &Resource, size: usize) -> MaliResult<IoRegion> {
        if self.fail_map.contains(&resource.base) {
            return Err(MaliError::Fault);
        }

        let mut words = vec![0u32; size / 4].into_boxed_slice();
        for (phys, reg, value) in &self.seeds {
            let index = (*reg / 4) as usize;
            if *phys == resource.base && index < words.len() {
                words[index] = *value;
            }
        }

        let ptr = NonNull::new(words.as_mut_ptr()).ok_or(MaliError::Fault)?;
        // SAFETY: a janela vive em `windows` até o unmap
        let region = unsafe { IoRegion::new(resource.base, ptr, words.len()) };
        self.windows.push((resource.base, words));
        Ok(region)
    }

    fn unmap_io_region(&mut self, region: IoRegion) {
        let ptr = region.base().as_ptr() as *const u32;
        self.windows.retain(|(_, words)| words.as_ptr() != ptr);
    }
}
