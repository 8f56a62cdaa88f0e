//! # Registro de Recursos
//!
//! Responde "existe um recurso neste endereço?". A enumeração real vem do
//! host (device tree, tabela da placa); o núcleo só consulta.
//!
//! O mapa de endereços é fixo em relação à base da GPU:
//!
//! ```text
//! 0x00000 GP            0x10000 L2 (GP, Mali-450)
//! 0x01000 L2 (PP grp 0) 0x11000 L2 (PP grp 1, opcional)
//! 0x02000 PMU           0x13000 Broadcast
//! 0x03000 GP MMU        0x14000 DLBU
//! 0x04000.. PP MMU 0-3  0x15000 PP broadcast MMU
//! 0x08000.. PP 0-3      0x16000 PP broadcast
//! 0x1C000.. PP MMU 4-7  0x28000.. PP 4-7
//! ```

use super::error::{MaliError, MaliResult};
use alloc::vec::Vec;

/// Descritor imutável de um recurso de hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resource {
    pub base: u32,
    pub irq: Option<i32>,
    pub description: &'static str,
}

impl Resource {
    pub const fn new(base: u32, irq: Option<i32>, description: &'static str) -> Self {
        Self {
            base,
            irq,
            description,
        }
    }
}

/// Colaborador externo: descoberta de recursos.
pub trait ResourceRegistry {
    /// Procura o recurso em `address`. `Err(ResourceNotFound)` se não existir.
    fn find_resource(&self, address: u32) -> MaliResult<Resource>;
}

/// Offsets dos blocos de hardware relativos à base da GPU.
pub mod offsets {
    pub const GP: u32 = 0x0_0000;
    pub const L2_PP_GROUP0: u32 = 0x0_1000;
    pub const PMU: u32 = 0x0_2000;
    pub const GP_MMU: u32 = 0x0_3000;
    pub const L2_GP: u32 = 0x1_0000;
    pub const L2_PP_GROUP1: u32 = 0x1_1000;
    pub const BCAST: u32 = 0x1_3000;
    pub const DLBU: u32 = 0x1_4000;
    pub const PP_MMU_BCAST: u32 = 0x1_5000;
    pub const PP_BCAST: u32 = 0x1_6000;

    /// PP 0-3 (cluster 0) e 4-7 (cluster 1)
    pub const PP: [u32; 8] = [
        0x0_8000, 0x0_A000, 0x0_C000, 0x0_E000, 0x2_8000, 0x2_A000, 0x2_C000, 0x2_E000,
    ];

    /// MMU de cada PP, mesma indexação de `PP`
    pub const PP_MMU: [u32; 8] = [
        0x0_4000, 0x0_5000, 0x0_6000, 0x0_7000, 0x1_C000, 0x1_D000, 0x1_E000, 0x1_F000,
    ];

    /// Caches L2 contadas por `resource_count`
    pub const L2: [u32; 3] = [L2_PP_GROUP0, L2_GP, L2_PP_GROUP1];
}

/// Número máximo de PPs físicos
pub const MAX_PP_CORES: usize = 8;

/// PPs por cluster
pub const PP_CORES_PER_CLUSTER: usize = 4;

/// Resultado da sondagem de recursos.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceCount {
    pub pp: u32,
    pub l2: u32,
}

/// Conta PPs e caches L2 presentes, sem criar nada.
pub fn resource_count<R: ResourceRegistry + ?Sized>(registry: &R, base: u32) -> ResourceCount {
    let present = |offset: u32| registry.find_resource(base.wrapping_add(offset)).is_ok();

    ResourceCount {
        pp: offsets::PP.iter().filter(|o| present(**o)).count() as u32,
        l2: offsets::L2.iter().filter(|o| present(**o)).count() as u32,
    }
}

/// Tabela estática de recursos, no formato dos arquivos de placa.
#[derive(Debug, Clone, Default)]
pub struct StaticResourceTable {
    entries: Vec<Resource>,
}

impl StaticResourceTable {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn from_slice(resources: &[Resource]) -> Self {
        Self {
            entries: resources.to_vec(),
        }
    }

    pub fn insert(&mut self, resource: Resource) {
        self.entries.retain(|r| r.base != resource.base);
        self.entries.push(resource);
    }

    pub fn remove(&mut self, base: u32) -> Option<Resource> {
        let index = self.entries.iter().position(|r| r.base == base)?;
        Some(self.entries.remove(index))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Menor endereço da tabela (base da GPU nas placas Mali).
    pub fn lowest_base(&self) -> Option<u32> {
        self.entries.iter().map(|r| r.base).min()
    }
}

impl ResourceRegistry for StaticResourceTable {
    fn find_resource(&self, address: u32) -> MaliResult<Resource> {
        self.entries
            .iter()
            .find(|r| r.base == address)
            .copied()
            .ok_or(MaliError::ResourceNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: u32 = 0x1300_0000;

    #[test]
    fn lookup_by_exact_address() {
        let table = StaticResourceTable::from_slice(&[
            Resource::new(BASE, Some(191), "Mali_GP"),
            Resource::new(BASE + offsets::GP_MMU, Some(186), "Mali_GP_MMU"),
        ]);

        assert_eq!(table.find_resource(BASE).unwrap().description, "Mali_GP");
        assert_eq!(
            table.find_resource(BASE + 0x10),
            Err(MaliError::ResourceNotFound)
        );
        assert_eq!(table.lowest_base(), Some(BASE));
    }

    #[test]
    fn insert_replaces_same_address() {
        let mut table = StaticResourceTable::new();
        table.insert(Resource::new(BASE, None, "a"));
        table.insert(Resource::new(BASE, Some(1), "b"));
        assert_eq!(table.len(), 1);
        assert_eq!(table.find_resource(BASE).unwrap().description, "b");
        assert!(table.remove(BASE).is_some());
        assert!(table.is_empty());
    }

    #[test]
    fn count_pp_and_l2() {
        let mut table = StaticResourceTable::new();
        for offset in offsets::PP.iter().take(6) {
            table.insert(Resource::new(BASE + offset, None, "PP"));
        }
        table.insert(Resource::new(BASE + offsets::L2_PP_GROUP0, None, "L2"));
        table.insert(Resource::new(BASE + offsets::L2_GP, None, "L2"));

        let count = resource_count(&table, BASE);
        assert_eq!(count, ResourceCount { pp: 6, l2: 2 });
    }
}
