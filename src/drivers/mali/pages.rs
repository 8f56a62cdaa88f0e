//! Páginas fixas do módulo de MMU e do DLBU, e page directory das sessões.

use super::error::{MaliError, MaliResult};
use crate::mm::config::{is_page_aligned, DLBU_PAGE_SIZE, MMU_RESERVED_PAGES, PAGE_SIZE};
use crate::mm::{Allocation, ObjectHeap};
use alloc::vec::Vec;

/// Page directory vazio e páginas usadas para descartar page faults.
pub struct MmuPages {
    pages: Allocation,
}

impl MmuPages {
    pub fn initialize(heap: &ObjectHeap) -> MaliResult<Self> {
        let size = MMU_RESERVED_PAGES * PAGE_SIZE as usize;
        let mut pages = heap.reserve_bytes(size, PAGE_SIZE as usize)?;
        pages.zero();
        crate::ktrace!("(MMU) Páginas reservadas=", MMU_RESERVED_PAGES);
        Ok(Self { pages })
    }

    /// Endereço do page directory vazio.
    pub fn empty_page_directory(&self) -> *mut u8 {
        self.pages.as_ptr()
    }
}

/// Tile list mestre do DLBU.
pub struct DlbuPage {
    page: Allocation,
}

impl DlbuPage {
    pub fn initialize(heap: &ObjectHeap) -> MaliResult<Self> {
        let mut page = heap.reserve_bytes(DLBU_PAGE_SIZE, PAGE_SIZE as usize)?;
        page.zero();
        Ok(Self { page })
    }

    pub fn as_ptr(&self) -> *mut u8 {
        self.page.as_ptr()
    }
}

impl DlbuPage {
    /// Endereço que o page directory das sessões aponta.
    pub fn phys(&self) -> usize {
        self.page.as_ptr() as usize
    }
}

/// Uma entrada reservada no page directory de uma sessão.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMapping {
    pub virt: u32,
    pub size: u32,
    /// Página física apontada, `None` enquanto só reservada.
    pub phys: Option<usize>,
}

/// Page directory de uma sessão.
pub struct PageDirectory {
    mappings: Vec<PageMapping>,
    _page: Allocation,
}

impl PageDirectory {
    pub fn alloc(heap: &ObjectHeap) -> MaliResult<Self> {
        let mut page = heap.reserve_bytes(PAGE_SIZE as usize, PAGE_SIZE as usize)?;
        page.zero();
        Ok(Self {
            mappings: Vec::new(),
            _page: page,
        })
    }

    /// Reserva `[virt, virt + size)` sem página física.
    pub fn map(&mut self, virt: u32, size: u32) -> MaliResult<()> {
        if size == 0 || !is_page_aligned(virt) || !is_page_aligned(size) {
            return Err(MaliError::InvalidRange);
        }
        let end = virt.checked_add(size - 1).ok_or(MaliError::InvalidRange)?;
        let overlaps = self
            .mappings
            .iter()
            .any(|m| virt <= m.virt + (m.size - 1) && m.virt <= end);
        if overlaps {
            return Err(MaliError::InvalidRange);
        }

        self.mappings.push(PageMapping {
            virt,
            size,
            phys: None,
        });
        Ok(())
    }

    /// Aponta a entrada reservada em `virt` para `phys`.
    pub fn update(&mut self, virt: u32, phys: usize) -> MaliResult<()> {
        let mapping = self
            .mappings
            .iter_mut()
            .find(|m| m.virt == virt)
            .ok_or(MaliError::InvalidRange)?;
        mapping.phys = Some(phys);
        Ok(())
    }

    pub fn lookup(&self, virt: u32) -> Option<&PageMapping> {
        self.mappings
            .iter()
            .find(|m| virt >= m.virt && virt - m.virt < m.size)
    }

    pub fn mappings(&self) -> &[PageMapping] {
        &self.mappings
    }
}
