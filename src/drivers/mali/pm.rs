//! Estado de energia do device (visão do host).

use super::error::MaliResult;
use super::platform::Platform;
use crate::mm::{Allocation, ObjectHeap};

pub struct PowerManager {
    power_is_on: bool,
    dev_refs: u32,
    _state: Allocation,
}

impl PowerManager {
    pub fn initialize(heap: &ObjectHeap) -> MaliResult<Self> {
        let state = heap.reserve_for::<Self>()?;
        Ok(Self {
            power_is_on: false,
            dev_refs: 0,
            _state: state,
        })
    }

    pub fn power_is_on(&self) -> bool {
        self.power_is_on
    }

    pub fn set_power_is_on(&mut self, on: bool) {
        self.power_is_on = on;
    }

    /// Referências de energia mantidas pelo núcleo.
    pub fn dev_refs(&self) -> u32 {
        self.dev_refs
    }

    /// Segura o device ligado.
    pub fn dev_ref_add<P: Platform + ?Sized>(&mut self, platform: &mut P) -> MaliResult<()> {
        platform.pm_dev_ref_add()?;
        self.dev_refs += 1;
        self.power_is_on = true;
        Ok(())
    }

    pub fn dev_ref_dec<P: Platform + ?Sized>(&mut self, platform: &mut P) {
        if self.dev_refs == 0 {
            crate::kwarn!("(PM) Liberação sem referência de energia");
            return;
        }
        platform.pm_dev_ref_dec();
        self.dev_refs -= 1;
    }
}
