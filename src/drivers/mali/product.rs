//! # Identificação do Produto
//!
//! O registrador de versão do PP0 diz qual GPU está presente. Cada produto
//! suportado mapeia para uma `HardwareVariant`, que concentra as tabelas
//! fixas da topologia (caches L2, domínios de energia, pertinência de grupos).

use super::error::{MaliError, MaliResult};
use super::hw::PmuMask;
use super::resource::{offsets, PP_CORES_PER_CLUSTER};
use alloc::vec::Vec;

/// Código de produto (16 bits altos do registrador de versão)
pub const PRODUCT_CODE_MALI200: u32 = 0xC807;
pub const PRODUCT_CODE_MALI300: u32 = 0xCE07;
pub const PRODUCT_CODE_MALI400: u32 = 0xCD07;
pub const PRODUCT_CODE_MALI450: u32 = 0xCF07;

/// GPU detectada.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductId {
    #[default]
    Unknown,
    Mali200,
    Mali300,
    Mali400,
    Mali450,
}

impl ProductId {
    pub fn from_product_code(code: u32) -> Self {
        match code {
            PRODUCT_CODE_MALI200 => Self::Mali200,
            PRODUCT_CODE_MALI300 => Self::Mali300,
            PRODUCT_CODE_MALI400 => Self::Mali400,
            PRODUCT_CODE_MALI450 => Self::Mali450,
            _ => Self::Unknown,
        }
    }

    /// Variante de hardware; `None` para produtos não suportados.
    pub fn variant(self) -> Option<HardwareVariant> {
        match self {
            Self::Mali300 | Self::Mali400 => Some(HardwareVariant::Baseline),
            Self::Mali450 => Some(HardwareVariant::MultiCluster),
            Self::Mali200 | Self::Unknown => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "desconhecido",
            Self::Mali200 => "Mali-200",
            Self::Mali300 => "Mali-300",
            Self::Mali400 => "Mali-400",
            Self::Mali450 => "Mali-450",
        }
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conteúdo decodificado do registrador de versão.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GpuVersion {
    pub product: ProductId,
    pub major: u32,
    pub minor: u32,
}

impl GpuVersion {
    /// `[31:16]` produto, `[15:8]` major, `[7:0]` minor.
    pub fn decode(raw: u32) -> Self {
        Self {
            product: ProductId::from_product_code(raw >> 16),
            major: (raw >> 8) & 0xFF,
            minor: raw & 0xFF,
        }
    }
}

/// Id de domínio de energia.
pub type DomainId = u32;

/// Domínios do Mali-450
pub const DOM1: DomainId = 0;
pub const DOM2: DomainId = 1;
pub const DOM3: DomainId = 2;

/// Máscara do PP0 no Mali-400 (ilhas 0 e 1 são GP e L2)
pub const M400_PP0_MASK: PmuMask = PmuMask::ISLAND2;
pub const M450_DOM1_MASK: PmuMask = PmuMask::ISLAND1;
pub const M450_DOM2_MASK: PmuMask = PmuMask::ISLAND2;
pub const M450_DOM3_MASK: PmuMask = PmuMask::ISLAND3;

/// Domínio a ser criado.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainSpec {
    pub id: DomainId,
    pub mask: PmuMask,
    pub name: &'static str,
}

/// Posição de uma cache L2 na tabela da variante.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct L2Slot {
    pub offset: u32,
    pub required: bool,
    pub domain: Option<DomainId>,
    pub name: &'static str,
}

const BASELINE_L2: [L2Slot; 1] = [L2Slot {
    offset: offsets::L2_PP_GROUP0,
    required: false,
    domain: None,
    name: "L2",
}];

const MULTI_CLUSTER_L2: [L2Slot; 3] = [
    L2Slot {
        offset: offsets::L2_GP,
        required: true,
        domain: None,
        name: "L2 GP",
    },
    L2Slot {
        offset: offsets::L2_PP_GROUP0,
        required: true,
        domain: Some(DOM1),
        name: "L2 PP grupo 0",
    },
    L2Slot {
        offset: offsets::L2_PP_GROUP1,
        required: false,
        domain: Some(DOM3),
        name: "L2 PP grupo 1",
    },
];

/// Estratégia de topologia, escolhida uma vez no bring-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareVariant {
    /// Mali-300/400: um cluster, 1 a 4 PPs, uma L2
    Baseline,
    /// Mali-450: até 2 clusters de 4 PPs, L2 por cluster, grupo virtual
    MultiCluster,
}

impl HardwareVariant {
    pub fn l2_layout(self) -> &'static [L2Slot] {
        match self {
            Self::Baseline => &BASELINE_L2,
            Self::MultiCluster => &MULTI_CLUSTER_L2,
        }
    }

    /// Índice (na pool de caches) da L2 do GP.
    pub fn gp_cluster(self) -> usize {
        0
    }

    /// Índice da L2 do cluster de PP `cluster` (0 ou 1).
    pub fn pp_cluster(self, cluster: usize) -> usize {
        match self {
            Self::Baseline => 0,
            Self::MultiCluster => 1 + cluster,
        }
    }

    /// Número de clusters de PP que a variante pode ter.
    pub fn pp_clusters(self) -> usize {
        match self {
            Self::Baseline => 1,
            Self::MultiCluster => 2,
        }
    }

    pub fn has_virtual_group(self) -> bool {
        matches!(self, Self::MultiCluster)
    }

    /// Domínios a criar para `pp_count` PPs sondados.
    pub fn domain_layout(self, pp_count: u32) -> MaliResult<Vec<DomainSpec>> {
        let mut layout = Vec::new();

        match self {
            Self::MultiCluster => {
                if matches!(pp_count, 8 | 6) {
                    layout.push(DomainSpec {
                        id: DOM3,
                        mask: M450_DOM3_MASK,
                        name: "DOM3",
                    });
                }
                if matches!(pp_count, 8 | 6 | 4 | 3 | 2) {
                    layout.push(DomainSpec {
                        id: DOM2,
                        mask: M450_DOM2_MASK,
                        name: "DOM2",
                    });
                    layout.push(DomainSpec {
                        id: DOM1,
                        mask: M450_DOM1_MASK,
                        name: "DOM1",
                    });
                } else {
                    crate::kerror!("(Mali) Configuração de cores não suportada, PP=", pp_count);
                    return Err(MaliError::ConfigurationInvalid);
                }
            }
            Self::Baseline => {
                for i in 0..pp_count.min(PP_CORES_PER_CLUSTER as u32) {
                    layout.push(DomainSpec {
                        id: i,
                        mask: PmuMask::from_bits_retain(M400_PP0_MASK.bits() << i),
                        name: "PP",
                    });
                }
            }
        }

        Ok(layout)
    }

    /// Domínio do grupo GP.
    pub fn gp_domain(self) -> Option<DomainId> {
        match self {
            Self::Baseline => None,
            Self::MultiCluster => Some(DOM1),
        }
    }

    /// Domínio do grupo PP no slot físico `slot` (0..8).
    pub fn pp_domain(self, slot: usize) -> Option<DomainId> {
        match self {
            Self::Baseline => Some(slot as DomainId),
            Self::MultiCluster if slot < PP_CORES_PER_CLUSTER => Some(DOM2),
            Self::MultiCluster => Some(DOM3),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_register_decoding() {
        let v = GpuVersion::decode(0xCD07_0101);
        assert_eq!(v.product, ProductId::Mali400);
        assert_eq!((v.major, v.minor), (1, 1));

        let v = GpuVersion::decode(0xCF07_0302);
        assert_eq!(v.product, ProductId::Mali450);
        assert_eq!((v.major, v.minor), (3, 2));

        assert_eq!(GpuVersion::decode(0).product, ProductId::Unknown);
    }

    #[test]
    fn unsupported_products_have_no_variant() {
        assert_eq!(ProductId::Mali200.variant(), None);
        assert_eq!(ProductId::Unknown.variant(), None);
        assert_eq!(ProductId::Mali300.variant(), Some(HardwareVariant::Baseline));
    }

    #[test]
    fn multi_cluster_domains_fall_through() {
        let ids = |n| {
            HardwareVariant::MultiCluster
                .domain_layout(n)
                .unwrap()
                .iter()
                .map(|d| d.id)
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(8), [DOM3, DOM2, DOM1]);
        assert_eq!(ids(6), [DOM3, DOM2, DOM1]);
        assert_eq!(ids(4), [DOM2, DOM1]);
        assert_eq!(ids(2), [DOM2, DOM1]);
        assert_eq!(
            HardwareVariant::MultiCluster.domain_layout(5),
            Err(MaliError::ConfigurationInvalid)
        );
    }

    #[test]
    fn baseline_domain_masks_shift_per_core() {
        let layout = HardwareVariant::Baseline.domain_layout(3).unwrap();
        assert_eq!(layout.len(), 3);
        assert_eq!(layout[0].mask, PmuMask::ISLAND2);
        assert_eq!(layout[1].mask, PmuMask::ISLAND3);
        assert_eq!(layout[2].mask, PmuMask::ISLAND4);
        assert!(HardwareVariant::Baseline.domain_layout(0).unwrap().is_empty());
    }
}
