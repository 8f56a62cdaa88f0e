//! Utilização de GP e PP na janela corrente (0..=256).

use super::error::MaliResult;
use crate::mm::{Allocation, ObjectHeap};

/// Escala de utilização (256 = 100%)
pub const UTILIZATION_SCALE: u32 = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Utilization {
    pub gp: u32,
    pub pp: u32,
}

pub struct UtilizationTracker {
    window_ns: u64,
    gp_busy_ns: u64,
    pp_busy_ns: u64,
    _state: Allocation,
}

impl UtilizationTracker {
    pub fn initialize(heap: &ObjectHeap) -> MaliResult<Self> {
        let state = heap.reserve_for::<Self>()?;
        Ok(Self {
            window_ns: 0,
            gp_busy_ns: 0,
            pp_busy_ns: 0,
            _state: state,
        })
    }

    pub fn record_gp(&mut self, busy_ns: u64) {
        self.gp_busy_ns = self.gp_busy_ns.saturating_add(busy_ns);
    }

    pub fn record_pp(&mut self, busy_ns: u64) {
        self.pp_busy_ns = self.pp_busy_ns.saturating_add(busy_ns);
    }

    pub fn advance(&mut self, elapsed_ns: u64) {
        self.window_ns = self.window_ns.saturating_add(elapsed_ns);
    }

    /// Fecha a janela e retorna a utilização medida.
    pub fn sample(&mut self) -> Utilization {
        let scale = |busy: u64| -> u32 {
            if self.window_ns == 0 {
                return 0;
            }
            let busy = busy.min(self.window_ns);
            ((busy * UTILIZATION_SCALE as u64) / self.window_ns) as u32
        };
        let result = Utilization {
            gp: scale(self.gp_busy_ns),
            pp: scale(self.pp_busy_ns),
        };

        self.window_ns = 0;
        self.gp_busy_ns = 0;
        self.pp_busy_ns = 0;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mm::heap::test_heap;

    #[test]
    fn busy_time_is_scaled_to_window() {
        let heap = test_heap(4096);
        let mut util = UtilizationTracker::initialize(&heap).unwrap();
        util.advance(1000);
        util.record_gp(500);
        util.record_pp(2000);
        assert_eq!(util.sample(), Utilization { gp: 128, pp: 256 });
        assert_eq!(util.sample(), Utilization::default());
    }
}
