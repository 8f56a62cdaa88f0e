//! # Profiling
//!
//! Ring de eventos de tamanho fixo, reservado do heap de objetos. A ausência
//! do ring nunca impede o bring-up: o orquestrador só registra o problema.

use super::error::{MaliError, MaliResult};
use crate::mm::{Allocation, ObjectHeap};
use alloc::vec::Vec;

/// Evento registrado.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProfilingEvent {
    pub timestamp: u64,
    pub event_id: u32,
    pub data: [u32; 5],
}

pub struct ProfilingRing {
    events: Vec<ProfilingEvent>,
    capacity: usize,
    next: usize,
    recording: bool,
    _buffer: Allocation,
}

impl ProfilingRing {
    /// Reserva o ring. `boot_start` começa a gravar imediatamente.
    pub fn initialize(heap: &ObjectHeap, entries: u32, boot_start: bool) -> MaliResult<Self> {
        let capacity = entries as usize;
        if capacity == 0 || !capacity.is_power_of_two() {
            crate::kwarn!("(Profiling) Tamanho de ring inválido=", entries);
            return Err(MaliError::ProfilingUnavailable);
        }

        let bytes = capacity
            .checked_mul(core::mem::size_of::<ProfilingEvent>())
            .ok_or(MaliError::ProfilingUnavailable)?;
        let buffer = heap
            .reserve_bytes(bytes, core::mem::align_of::<ProfilingEvent>())
            .map_err(|_| MaliError::ProfilingUnavailable)?;

        let mut events = Vec::new();
        events
            .try_reserve_exact(capacity)
            .map_err(|_| MaliError::ProfilingUnavailable)?;

        crate::kinfo!("(Profiling) Ring criado, entradas=", entries);
        Ok(Self {
            events,
            capacity,
            next: 0,
            recording: boot_start,
            _buffer: buffer,
        })
    }

    pub fn start(&mut self) {
        self.clear();
        self.recording = true;
    }

    /// Para a gravação e retorna o número de eventos guardados.
    pub fn stop(&mut self) -> usize {
        self.recording = false;
        self.events.len()
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn add_event(&mut self, timestamp: u64, event_id: u32, data: [u32; 5]) {
        if !self.recording {
            return;
        }

        let event = ProfilingEvent {
            timestamp,
            event_id,
            data,
        };
        if self.events.len() < self.capacity {
            self.events.push(event);
        } else {
            self.events[self.next] = event;
        }
        self.next = (self.next + 1) & (self.capacity - 1);
    }

    /// Evento `index`, do mais antigo ao mais recente.
    pub fn event(&self, index: usize) -> Option<&ProfilingEvent> {
        if index >= self.events.len() {
            return None;
        }
        let start = if self.events.len() < self.capacity { 0 } else { self.next };
        self.events.get((start + index) & (self.capacity - 1))
    }

    pub fn count(&self) -> usize {
        self.events.len()
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.next = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mm::heap::test_heap;

    #[test]
    fn ring_wraps_around() {
        let heap = test_heap(8 * 1024);
        let mut ring = ProfilingRing::initialize(&heap, 4, true).unwrap();
        for i in 0..6 {
            ring.add_event(i, i as u32, [0; 5]);
        }
        assert_eq!(ring.count(), 4);
        assert_eq!(ring.event(0).unwrap().event_id, 2);
        assert_eq!(ring.event(3).unwrap().event_id, 5);
        assert_eq!(ring.stop(), 4);

        ring.add_event(9, 9, [0; 5]);
        assert_eq!(ring.count(), 4);
    }

    #[test]
    fn oversized_ring_is_unavailable() {
        let heap = test_heap(1024);
        assert!(matches!(
            ProfilingRing::initialize(&heap, 1024, false),
            Err(MaliError::ProfilingUnavailable)
        ));
        assert!(matches!(
            ProfilingRing::initialize(&heap, 3, false),
            Err(MaliError::ProfilingUnavailable)
        ));
        assert_eq!(heap.used(), 0);
    }
}
