//! Host falso para os testes unitários.

use super::error::{MaliError, MaliResult};
use super::platform::{IoRegion, Platform};
use super::resource::{offsets, Resource, ResourceRegistry, StaticResourceTable};
use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;
use core::ptr::NonNull;

pub const BASE: u32 = 0x1300_0000;
pub const MALI400_VERSION: u32 = 0xCD07_0101;
pub const MALI450_VERSION: u32 = 0xCF07_0000;

pub struct MockPlatform {
    pub table: StaticResourceTable,
    pub windows: Vec<(u32, Box<[u32]>)>,
    pub seeds: Vec<(u32, u32, u32)>,
    pub fail_map: Vec<u32>,
    pub dev_refs: i32,
    pub shared_irqs: bool,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self {
            table: StaticResourceTable::new(),
            windows: Vec::new(),
            seeds: Vec::new(),
            fail_map: Vec::new(),
            dev_refs: 0,
            shared_irqs: false,
        }
    }

    pub fn with(mut self, offset: u32, description: &'static str) -> Self {
        self.table.insert(Resource::new(BASE + offset, Some(100), description));
        self
    }

    /// GP + MMU e `pp` pares PP/MMU.
    pub fn mali400(pp: usize) -> Self {
        let mut p = Self::new()
            .with(offsets::GP, "GP")
            .with(offsets::GP_MMU, "GP_MMU")
            .with(offsets::L2_PP_GROUP0, "L2");
        for i in 0..pp {
            p = p.with(offsets::PP[i], "PP").with(offsets::PP_MMU[i], "PP_MMU");
        }
        p.seed(offsets::PP[0], 0x1000, MALI400_VERSION);
        p
    }

    pub fn seed(&mut self, offset: u32, reg: u32, value: u32) {
        self.seeds.push((BASE + offset, reg, value));
    }

    pub fn live_mappings(&self) -> usize {
        self.windows.len()
    }
}

impl ResourceRegistry for MockPlatform {
    fn find_resource(&self, address: u32) -> MaliResult<Resource> {
        self.table.find_resource(address)
    }
}

impl Platform for MockPlatform {
    fn resource_base_address(&self) -> u32 {
        self.table.lowest_base().unwrap_or(0)
    }

    fn shared_interrupts(&self) -> bool {
        self.shared_irqs
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
        let region = unsafe { IoRegion::new(resource.base, ptr, words.len()) };
        self.windows.push((resource.base, words));
        Ok(region)
    }

    fn unmap_io_region(&mut self, region: IoRegion) {
        let ptr = region.base().as_ptr() as *const u32;
        self.windows.retain(|(_, w)| w.as_ptr() != ptr);
    }
}
