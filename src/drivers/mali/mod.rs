//! # Driver Mali
//!
//! ```text
//! Platform (host) ── ResourceRegistry
//!        │
//!        ▼
//! L2CachePool ── GroupRegistry ── PmDomainManager
//!        └────────────┬────────────────┘
//!                     ▼
//!             SubsystemContext (bring-up / teardown)
//! ```
//!
//! | Módulo        | Responsabilidade |
//! |---------------|------------------|
//! | `resource`    | Mapa de endereços e consulta de recursos |
//! | `hw`          | Modelos dos cores (GP, PP, MMU, L2, PMU, DLBU, broadcast) |
//! | `l2_cache`    | Pool de caches L2 |
//! | `group`       | Fábrica e registro de grupos |
//! | `pm_domain`   | Domínios de energia |
//! | `product`     | Identificação do produto e tabelas por variante |
//! | `kernel_core` | Orquestração do bring-up |

pub mod config;
pub mod dump;
pub mod error;
pub mod group;
pub mod hw;
pub mod kernel_core;
pub mod l2_cache;
pub mod pages;
pub mod platform;
pub mod pm;
pub mod pm_domain;
pub mod product;
pub mod profiling;
pub mod regs;
pub mod resource;
pub mod scheduler;
pub mod session;
pub mod utilization;

#[cfg(feature = "self_test")]
pub mod test;

#[cfg(test)]
pub(crate) mod mock;

pub use config::CoreConfig;
pub use error::{MaliError, MaliResult};
pub use group::{GroupHandle, GroupRegistry};
pub use kernel_core::{check_api_version, ApiVersionCheck, InitStep, SubsystemContext};
pub use l2_cache::{CacheHandle, L2CachePool};
pub use platform::{DeviceData, IoRegion, Platform};
pub use pm_domain::PmDomainManager;
pub use product::{HardwareVariant, ProductId};
pub use resource::{Resource, ResourceRegistry, StaticResourceTable};
pub use session::{NotificationType, SessionId};
