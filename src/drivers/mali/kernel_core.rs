//! Arquivo: drivers/mali/kernel_core.rs
//!
//! Propósito: Bring-up e teardown ordenados do núcleo Mali.
//!
//! Detalhes de Implementação:
//! - `SubsystemContext` concentra todo o estado (não há globais).
//! - O bring-up é uma tabela de passos. Cada passo concluído empilha sua
//!   função de desfazer; uma falha desempilha tudo em ordem inversa.
//! - `terminate_subsystems` desempilha a pilha inteira. O passo final
//!   (`PowerReleased`) ao ser desfeito volta a segurar a energia, e o
//!   `PowerHeld` a libera.
//! - Passos condicionais (profiling, PMU, domínios, DLBU) que não se
//!   aplicam não empilham nada.
//!
//! Ordem
//!
//! ```text
//! Sessions -> Profiling? -> Memory -> MemoryConfig -> BaseAddress -> SharedIrq
//! -> PpScheduler -> Pm -> PmuConfig -> PowerHeld -> PmuReset -> Product
//! -> PmDomains? -> Mmu -> Dlbu? -> L2Config -> GroupsConfig -> Schedulers
//! -> GpScheduler -> PpPopulated -> Utilization -> PowerReleased
//! ```

use super::config::CoreConfig;
use super::error::{MaliError, MaliResult};
use super::group::{Compute, GroupHandle, GroupRegistry, VirtualResources};
use super::hw::pp::{broadcast_id_for, PP_REG_SIZE, REG_VERSION};
use super::hw::PmuCore;
use super::l2_cache::L2CachePool;
use super::pages::{DlbuPage, MmuPages};
use super::platform::Platform;
use super::pm::PowerManager;
use super::pm_domain::PmDomainManager;
use super::product::{GpuVersion, HardwareVariant, ProductId};
use super::profiling::ProfilingRing;
use super::regs::RegisterBank;
use super::resource::{
    offsets, resource_count, Resource, ResourceCount, MAX_PP_CORES, PP_CORES_PER_CLUSTER,
};
use super::scheduler::{GpScheduler, PpScheduler, Scheduler};
use super::session::{NotificationType, SessionId, SessionManager};
use super::utilization::UtilizationTracker;
use crate::mm::config::{FramebufferSettings, MemorySettings, DEFAULT_SHARED_MEM_SIZE};
use crate::mm::{MemoryManager, MmResult, ObjectHeap};
use alloc::vec::Vec;

// =============================================================================
// VERSÃO DA API
// =============================================================================

/// Versão da API usuário/kernel
pub const API_VERSION_NUMBER: u32 = 23;

/// Codifica a versão como o userspace envia (`v << 16 | v`).
pub const fn make_api_version(v: u32) -> u32 {
    (v << 16) | v
}

pub const API_VERSION: u32 = make_api_version(API_VERSION_NUMBER);

/// Resposta do handshake de versão.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiVersionCheck {
    pub compatible: bool,
    pub kernel_version: u32,
}

/// Compara a versão enviada pelo userspace com a do núcleo.
pub fn check_api_version(user_version: u32) -> ApiVersionCheck {
    let compatible = user_version == API_VERSION;
    if !compatible {
        crate::kwarn!("(Mali) Versão de API incompatível=", user_version);
    }
    ApiVersionCheck {
        compatible,
        kernel_version: API_VERSION,
    }
}

// =============================================================================
// PASSOS
// =============================================================================

/// Passos do bring-up, na ordem de execução.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStep {
    SessionSubsystemReady,
    ProfilingReady,
    MemoryReady,
    MemoryConfigParsed,
    BaseAddressResolved,
    SharedIrqChecked,
    PpSchedulerReady,
    PmReady,
    PmuConfigParsed,
    PowerHeld,
    PmuReset,
    ProductIdentified,
    PmDomainsCreated,
    MmuReady,
    DlbuReady,
    L2CacheConfigParsed,
    GroupsConfigParsed,
    SchedulersReady,
    GpSchedulerReady,
    PpPopulated,
    UtilizationReady,
    PowerReleased,
}

impl InitStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SessionSubsystemReady => "sessões",
            Self::ProfilingReady => "profiling",
            Self::MemoryReady => "memória",
            Self::MemoryConfigParsed => "configuração de memória",
            Self::BaseAddressResolved => "endereço base",
            Self::SharedIrqChecked => "IRQs compartilhadas",
            Self::PpSchedulerReady => "escalonador PP",
            Self::PmReady => "PM",
            Self::PmuConfigParsed => "PMU",
            Self::PowerHeld => "energia retida",
            Self::PmuReset => "reset do PMU",
            Self::ProductIdentified => "produto",
            Self::PmDomainsCreated => "domínios de energia",
            Self::MmuReady => "MMU",
            Self::DlbuReady => "DLBU",
            Self::L2CacheConfigParsed => "caches L2",
            Self::GroupsConfigParsed => "grupos",
            Self::SchedulersReady => "escalonadores",
            Self::GpSchedulerReady => "escalonador GP",
            Self::PpPopulated => "PPs populados",
            Self::UtilizationReady => "utilização",
            Self::PowerReleased => "energia liberada",
        }
    }
}

/// Resultado de um passo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepOutcome {
    /// Concluído; a função de desfazer é empilhada
    Done,
    /// Não se aplica a este hardware (ou falhou sem ser fatal)
    Skipped,
}

type StepFn<P> = fn(&mut SubsystemContext<P>) -> MaliResult<StepOutcome>;
type UndoFn<P> = fn(&mut SubsystemContext<P>);

struct Step<P: Platform> {
    id: InitStep,
    run: StepFn<P>,
    undo: UndoFn<P>,
}

struct Committed<P: Platform> {
    id: InitStep,
    undo: UndoFn<P>,
}

// =============================================================================
// CONTEXTO
// =============================================================================

/// Estado completo do núcleo Mali.
pub struct SubsystemContext<P: Platform> {
    platform: P,
    heap: ObjectHeap,
    config: CoreConfig,

    initialized: bool,
    suspended: bool,
    base_address: u32,
    resources: ResourceCount,
    version: GpuVersion,
    variant: Option<HardwareVariant>,
    memory_settings: MemorySettings,
    framebuffer: FramebufferSettings,
    max_pp_cores_group_1: u32,
    max_pp_cores_group_2: u32,

    sessions: Option<SessionManager>,
    profiling: Option<ProfilingRing>,
    memory: Option<MemoryManager>,
    pp_scheduler: Option<PpScheduler>,
    pm: Option<PowerManager>,
    pmu: Option<PmuCore>,
    domains: PmDomainManager,
    mmu_pages: Option<MmuPages>,
    dlbu_page: Option<DlbuPage>,
    caches: L2CachePool,
    groups: GroupRegistry,
    scheduler: Option<Scheduler>,
    gp_scheduler: Option<GpScheduler>,
    utilization: Option<UtilizationTracker>,

    committed: Vec<Committed<P>>,
}

impl<P: Platform> SubsystemContext<P> {
    pub fn new(platform: P, heap: ObjectHeap, config: CoreConfig) -> Self {
        let domains = PmDomainManager::new(&heap);
        let caches = L2CachePool::new(&heap);
        let groups = GroupRegistry::new(&heap);

        Self {
            platform,
            heap,
            max_pp_cores_group_1: config.max_pp_cores_group_1,
            max_pp_cores_group_2: config.max_pp_cores_group_2,
            config,
            initialized: false,
            suspended: false,
            base_address: 0,
            resources: ResourceCount::default(),
            version: GpuVersion::default(),
            variant: None,
            memory_settings: MemorySettings::new(),
            framebuffer: FramebufferSettings::new(),
            sessions: None,
            profiling: None,
            memory: None,
            pp_scheduler: None,
            pm: None,
            pmu: None,
            domains,
            mmu_pages: None,
            dlbu_page: None,
            caches,
            groups,
            scheduler: None,
            gp_scheduler: None,
            utilization: None,
            committed: Vec::new(),
        }
    }

    fn steps() -> [Step<P>; 22] {
        [
            Step { id: InitStep::SessionSubsystemReady, run: Self::init_sessions, undo: Self::undo_sessions },
            Step { id: InitStep::ProfilingReady, run: Self::init_profiling, undo: Self::undo_profiling },
            Step { id: InitStep::MemoryReady, run: Self::init_memory, undo: Self::undo_memory },
            Step { id: InitStep::MemoryConfigParsed, run: Self::parse_config_memory, undo: Self::undo_memory_config },
            Step { id: InitStep::BaseAddressResolved, run: Self::resolve_base_address, undo: Self::undo_base_address },
            Step { id: InitStep::SharedIrqChecked, run: Self::check_shared_interrupts, undo: Self::undo_nothing },
            Step { id: InitStep::PpSchedulerReady, run: Self::init_pp_scheduler, undo: Self::undo_pp_scheduler },
            Step { id: InitStep::PmReady, run: Self::init_pm, undo: Self::undo_pm },
            Step { id: InitStep::PmuConfigParsed, run: Self::parse_config_pmu, undo: Self::undo_pmu },
            Step { id: InitStep::PowerHeld, run: Self::hold_power, undo: Self::undo_hold_power },
            Step { id: InitStep::PmuReset, run: Self::reset_pmu, undo: Self::undo_nothing },
            Step { id: InitStep::ProductIdentified, run: Self::parse_product_info, undo: Self::undo_product_info },
            Step { id: InitStep::PmDomainsCreated, run: Self::create_pm_domains, undo: Self::undo_pm_domains },
            Step { id: InitStep::MmuReady, run: Self::init_mmu, undo: Self::undo_mmu },
            Step { id: InitStep::DlbuReady, run: Self::init_dlbu, undo: Self::undo_dlbu },
            Step { id: InitStep::L2CacheConfigParsed, run: Self::parse_config_l2_cache, undo: Self::undo_l2_cache },
            Step { id: InitStep::GroupsConfigParsed, run: Self::parse_config_groups, undo: Self::undo_groups },
            Step { id: InitStep::SchedulersReady, run: Self::init_schedulers, undo: Self::undo_schedulers },
            Step { id: InitStep::GpSchedulerReady, run: Self::init_gp_scheduler, undo: Self::undo_gp_scheduler },
            Step { id: InitStep::PpPopulated, run: Self::populate_pp, undo: Self::undo_populate_pp },
            Step { id: InitStep::UtilizationReady, run: Self::init_utilization, undo: Self::undo_utilization },
            Step { id: InitStep::PowerReleased, run: Self::release_power, undo: Self::undo_release_power },
        ]
    }

    /// Executa o bring-up completo. Em caso de falha nada fica alocado.
    pub fn initialize_subsystems(&mut self) -> MaliResult<()> {
        if self.initialized {
            crate::kwarn!("(Mali) Bring-up repetido ignorado");
            return Err(MaliError::AlreadyInitialized);
        }

        crate::kinfo!("(Mali) Inicializando subsistemas");

        for step in Self::steps() {
            match (step.run)(self) {
                Ok(StepOutcome::Done) => {
                    crate::ktrace!("(Mali) Passo concluído");
                    crate::ktrace!(step.id.as_str());
                    self.committed.push(Committed {
                        id: step.id,
                        undo: step.undo,
                    });
                }
                Ok(StepOutcome::Skipped) => {
                    crate::kdebug!("(Mali) Passo não aplicável");
                    crate::kdebug!(step.id.as_str());
                }
                Err(err) => {
                    crate::kerror!("(Mali) Falha no bring-up, passo:");
                    crate::kerror!(step.id.as_str());
                    crate::kerror!(err.as_str());
                    self.unwind();
                    return Err(err);
                }
            }
        }

        self.initialized = true;
        crate::kok!("(Mali) Subsistemas inicializados");
        Ok(())
    }

    /// Teardown completo. Sem efeito se o bring-up não terminou.
    pub fn terminate_subsystems(&mut self) {
        if !self.initialized {
            return;
        }

        crate::kinfo!("(Mali) Terminando subsistemas");
        self.unwind();
        self.initialized = false;
        self.suspended = false;
    }

    fn unwind(&mut self) {
        while let Some(step) = self.committed.pop() {
            crate::ktrace!("(Mali) Desfazendo passo:");
            crate::ktrace!(step.id.as_str());
            (step.undo)(self);
        }
    }

    // =========================================================================
    // SESSÕES, PROFILING E MEMÓRIA
    // =========================================================================

    fn init_sessions(&mut self) -> MaliResult<StepOutcome> {
        self.sessions = Some(SessionManager::initialize(&self.heap)?);
        Ok(StepOutcome::Done)
    }

    fn undo_sessions(&mut self) {
        self.sessions = None;
    }

    fn init_profiling(&mut self) -> MaliResult<StepOutcome> {
        if !self.config.profiling {
            return Ok(StepOutcome::Skipped);
        }

        match ProfilingRing::initialize(
            &self.heap,
            self.config.profiling_entries,
            self.config.boot_profiling,
        ) {
            Ok(ring) => {
                self.profiling = Some(ring);
                Ok(StepOutcome::Done)
            }
            Err(err) => {
                crate::kwarn!("(Mali) Seguindo sem profiling:");
                crate::kwarn!(err.as_str());
                Ok(StepOutcome::Skipped)
            }
        }
    }

    fn undo_profiling(&mut self) {
        self.profiling = None;
    }

    fn init_memory(&mut self) -> MaliResult<StepOutcome> {
        self.memory = Some(MemoryManager::initialize(&self.heap)?);
        Ok(StepOutcome::Done)
    }

    fn undo_memory(&mut self) {
        self.memory = None;
    }

    fn parse_config_memory(&mut self) -> MaliResult<StepOutcome> {
        let mut memory = self.config.memory;
        let mut framebuffer = self.config.framebuffer;

        let device_data = self.platform.device_data();

        if memory.is_unset() {
            if let Some(data) = device_data {
                crate::kdebug!("(Mem) Usando memória dos dados da placa");
                memory = data.memory;
            }
            if memory.is_unset() {
                crate::kdebug!("(Mem) Usando memória compartilhada padrão");
                memory.shared_mem_size = DEFAULT_SHARED_MEM_SIZE;
            }
        }

        if framebuffer.is_unset() {
            if let Some(data) = device_data {
                crate::kdebug!("(Mem) Usando framebuffer dos dados da placa");
                framebuffer = data.framebuffer;
            }
        }

        let mm = self.memory.as_mut().ok_or(MaliError::NotInitialized)?;
        if let Err(err) = register_memory(mm, &memory, &framebuffer) {
            mm.release_config();
            return Err(err.into());
        }

        self.memory_settings = memory;
        self.framebuffer = framebuffer;
        Ok(StepOutcome::Done)
    }

    fn undo_memory_config(&mut self) {
        if let Some(mm) = self.memory.as_mut() {
            mm.release_config();
        }
        self.memory_settings = MemorySettings::new();
        self.framebuffer = FramebufferSettings::new();
    }

    // =========================================================================
    // DESCOBERTA
    // =========================================================================

    fn resolve_base_address(&mut self) -> MaliResult<StepOutcome> {
        let base = self.platform.resource_base_address();
        if base == 0 {
            crate::kerror!("(Mali) Host não descreveu a GPU");
            return Err(MaliError::ConfigurationInvalid);
        }

        self.base_address = base;
        self.resources = resource_count(&self.platform, base);
        crate::klog!("(Mali) Base=", base, " PPs=", self.resources.pp);
        crate::knl!();
        Ok(StepOutcome::Done)
    }

    fn undo_base_address(&mut self) {
        self.base_address = 0;
        self.resources = ResourceCount::default();
    }

    fn check_shared_interrupts(&mut self) -> MaliResult<StepOutcome> {
        if self.platform.shared_interrupts() && !self.config.shared_interrupts_supported {
            crate::kerror!("(Mali) IRQs compartilhadas sem suporte no driver");
            return Err(MaliError::Fault);
        }
        Ok(StepOutcome::Done)
    }

    fn undo_nothing(&mut self) {}

    fn find(&self, offset: u32) -> Option<Resource> {
        self.platform
            .find_resource(self.base_address.wrapping_add(offset))
            .ok()
    }

    // =========================================================================
    // ENERGIA
    // =========================================================================

    fn init_pp_scheduler(&mut self) -> MaliResult<StepOutcome> {
        self.pp_scheduler = Some(PpScheduler::initialize(&self.heap)?);
        Ok(StepOutcome::Done)
    }

    fn undo_pp_scheduler(&mut self) {
        self.pp_scheduler = None;
    }

    fn init_pm(&mut self) -> MaliResult<StepOutcome> {
        self.pm = Some(PowerManager::initialize(&self.heap)?);
        Ok(StepOutcome::Done)
    }

    fn undo_pm(&mut self) {
        self.pm = None;
    }

    fn parse_config_pmu(&mut self) -> MaliResult<StepOutcome> {
        let Some(resource) = self.find(offsets::PMU) else {
            crate::kinfo!("(PMU) Recurso ausente, GPU sem domínios de energia");
            return Ok(StepOutcome::Skipped);
        };

        let pmu = PmuCore::create(
            &mut self.platform,
            &self.heap,
            &resource,
            self.resources.pp,
            self.resources.l2,
        )?;
        self.pmu = Some(pmu);
        Ok(StepOutcome::Done)
    }

    fn undo_pmu(&mut self) {
        if let Some(pmu) = self.pmu.take() {
            pmu.delete(&mut self.platform);
        }
    }

    fn hold_power(&mut self) -> MaliResult<StepOutcome> {
        let pm = self.pm.as_mut().ok_or(MaliError::NotInitialized)?;
        pm.dev_ref_add(&mut self.platform)?;
        Ok(StepOutcome::Done)
    }

    fn undo_hold_power(&mut self) {
        if let Some(pm) = self.pm.as_mut() {
            pm.dev_ref_dec(&mut self.platform);
            pm.set_power_is_on(false);
        }
    }

    fn reset_pmu(&mut self) -> MaliResult<StepOutcome> {
        match self.pmu.as_mut() {
            Some(pmu) => {
                pmu.reset()?;
                Ok(StepOutcome::Done)
            }
            None => Ok(StepOutcome::Skipped),
        }
    }

    fn release_power(&mut self) -> MaliResult<StepOutcome> {
        let pm = self.pm.as_mut().ok_or(MaliError::NotInitialized)?;
        pm.dev_ref_dec(&mut self.platform);
        Ok(StepOutcome::Done)
    }

    fn undo_release_power(&mut self) {
        if let Some(pm) = self.pm.as_mut() {
            if pm.dev_ref_add(&mut self.platform).is_err() {
                crate::kerror!("(PM) Não foi possível reter a energia para o teardown");
            }
        }
    }

    // =========================================================================
    // PRODUTO E DOMÍNIOS
    // =========================================================================

    fn parse_product_info(&mut self) -> MaliResult<StepOutcome> {
        let resource = self.find(offsets::PP[0]).ok_or_else(|| {
            crate::kerror!("(Mali) PP0 ausente, produto não identificado");
            MaliError::ConfigurationInvalid
        })?;

        let regs = RegisterBank::map(&mut self.platform, &resource, PP_REG_SIZE)?;
        let raw = regs.read(REG_VERSION);
        regs.unmap(&mut self.platform);

        let version = GpuVersion::decode(raw);
        let variant = version.product.variant().ok_or_else(|| {
            crate::kerror!("(Mali) Produto não suportado, versão=", raw);
            MaliError::ConfigurationInvalid
        })?;

        crate::klog!("(Mali) GPU r", version.major, "p", version.minor);
        crate::knl!();
        crate::kinfo!(version.product.as_str());
        self.version = version;
        self.variant = Some(variant);
        Ok(StepOutcome::Done)
    }

    fn undo_product_info(&mut self) {
        self.version = GpuVersion::default();
        self.variant = None;
    }

    fn create_pm_domains(&mut self) -> MaliResult<StepOutcome> {
        if self.pmu.is_none() {
            return Ok(StepOutcome::Skipped);
        }
        let variant = self.variant.ok_or(MaliError::NotInitialized)?;

        crate::kinfo!("(PmDomain) Criando domínios, PPs=", self.resources.pp);
        let layout = variant.domain_layout(self.resources.pp)?;
        for spec in layout {
            if let Err(err) = self.domains.create_domain(spec.id, spec.mask, spec.name) {
                self.domains.terminate_all();
                return Err(err);
            }
        }
        Ok(StepOutcome::Done)
    }

    fn undo_pm_domains(&mut self) {
        self.domains.terminate_all();
    }

    fn init_mmu(&mut self) -> MaliResult<StepOutcome> {
        self.mmu_pages = Some(MmuPages::initialize(&self.heap)?);
        Ok(StepOutcome::Done)
    }

    fn undo_mmu(&mut self) {
        self.mmu_pages = None;
    }

    fn init_dlbu(&mut self) -> MaliResult<StepOutcome> {
        match self.variant {
            Some(variant) if variant.has_virtual_group() => {
                self.dlbu_page = Some(DlbuPage::initialize(&self.heap)?);
                Ok(StepOutcome::Done)
            }
            _ => Ok(StepOutcome::Skipped),
        }
    }

    fn undo_dlbu(&mut self) {
        self.dlbu_page = None;
    }

    // =========================================================================
    // CACHES L2 E GRUPOS
    // =========================================================================

    fn parse_config_l2_cache(&mut self) -> MaliResult<StepOutcome> {
        let variant = self.variant.ok_or(MaliError::NotInitialized)?;

        for slot in variant.l2_layout() {
            let Some(resource) = self.find(slot.offset) else {
                if slot.required {
                    crate::kerror!("(L2) Cache obrigatória ausente, offset=", slot.offset);
                    self.undo_l2_cache();
                    return Err(MaliError::ConfigurationInvalid);
                }
                crate::kinfo!("(L2) Cache opcional ausente, offset=", slot.offset);
                continue;
            };

            crate::kinfo!(slot.name);
            let handle = match self.caches.create_cache(&mut self.platform, &resource) {
                Ok(handle) => handle,
                Err(err) => {
                    self.undo_l2_cache();
                    return Err(err);
                }
            };
            if let Some(domain) = slot.domain {
                self.domains.add_cache(domain, handle);
            }
        }

        Ok(StepOutcome::Done)
    }

    fn undo_l2_cache(&mut self) {
        self.domains.forget_caches();
        self.caches.delete_all_caches(&mut self.platform);
    }

    fn parse_config_groups(&mut self) -> MaliResult<StepOutcome> {
        let variant = self.variant.ok_or(MaliError::NotInitialized)?;

        let gp = self.find(offsets::GP);
        let gp_mmu = self.find(offsets::GP_MMU);
        let mut pp = [None; MAX_PP_CORES];
        let mut pp_mmu = [None; MAX_PP_CORES];
        for slot in 0..MAX_PP_CORES {
            pp[slot] = self.find(offsets::PP[slot]);
            pp_mmu[slot] = self.find(offsets::PP_MMU[slot]);
        }

        let (Some(gp), Some(gp_mmu), Some(_), Some(_)) = (gp, gp_mmu, pp[0], pp_mmu[0]) else {
            crate::kerror!("(Group) Recurso obrigatório ausente: GP e PP0, cada um com MMU");
            return Err(MaliError::ConfigurationInvalid);
        };

        let mut created = Vec::new();
        match self.build_groups(variant, gp, gp_mmu, &pp, &pp_mmu, &mut created) {
            Ok(()) => Ok(StepOutcome::Done),
            Err(err) => {
                for handle in created.into_iter().rev() {
                    self.domains.forget_group(handle);
                }
                self.groups
                    .delete_all_groups(&mut self.platform, &mut self.caches);
                self.max_pp_cores_group_1 = self.config.max_pp_cores_group_1;
                self.max_pp_cores_group_2 = self.config.max_pp_cores_group_2;
                Err(err)
            }
        }
    }

    fn build_groups(
        &mut self,
        variant: HardwareVariant,
        gp: Resource,
        gp_mmu: Resource,
        pp: &[Option<Resource>; MAX_PP_CORES],
        pp_mmu: &[Option<Resource>; MAX_PP_CORES],
        created: &mut Vec<GroupHandle>,
    ) -> MaliResult<()> {
        let cache = self.caches.get(variant.gp_cluster());
        if cache.is_none() {
            crate::kwarn!("(Group) GP sem cache L2");
        }
        let handle = self
            .groups
            .create_group(
                &mut self.platform,
                &mut self.caches,
                cache,
                &gp_mmu,
                Some(Compute::Gp(gp)),
            )
            .map_err(group_error)?;
        created.push(handle);
        if let Some(domain) = variant.gp_domain() {
            self.domains.add_group(domain, handle);
        }

        let mut inited = [0u32; 2];
        for cluster in 0..variant.pp_clusters() {
            let limit = match cluster {
                0 => self.max_pp_cores_group_1,
                _ => self.max_pp_cores_group_2,
            };
            let cache = self.caches.get(variant.pp_cluster(cluster));

            for slot in cluster * PP_CORES_PER_CLUSTER..(cluster + 1) * PP_CORES_PER_CLUSTER {
                if slot != 0 && inited[cluster] >= limit {
                    continue;
                }
                let (Some(pp_res), Some(mmu_res)) = (pp[slot], pp_mmu[slot]) else {
                    continue;
                };

                let compute = Compute::Pp {
                    resource: pp_res,
                    bcast_id: broadcast_id_for(pp_res.base.wrapping_sub(self.base_address)),
                };
                let handle = self
                    .groups
                    .create_group(
                        &mut self.platform,
                        &mut self.caches,
                        cache,
                        &mmu_res,
                        Some(compute),
                    )
                    .map_err(group_error)?;
                created.push(handle);
                if let Some(domain) = variant.pp_domain(slot) {
                    self.domains.add_group(domain, handle);
                }
                inited[cluster] += 1;
            }
        }

        if variant.has_virtual_group() {
            let resources = match (
                self.find(offsets::PP_MMU_BCAST),
                self.find(offsets::PP_BCAST),
                self.find(offsets::DLBU),
                self.find(offsets::BCAST),
            ) {
                (Some(mmu_bcast), Some(pp_bcast), Some(dlbu), Some(bcast)) => VirtualResources {
                    mmu_bcast,
                    pp_bcast,
                    dlbu,
                    bcast,
                },
                _ => {
                    crate::kerror!("(Group) Recursos do grupo virtual ausentes");
                    return Err(MaliError::ConfigurationInvalid);
                }
            };

            let handle = self
                .groups
                .create_virtual_group(&mut self.platform, &resources)
                .map_err(group_error)?;
            created.push(handle);
        }

        self.max_pp_cores_group_1 = inited[0];
        self.max_pp_cores_group_2 = inited[1];
        crate::klog!("(Group) PPs inicializados: ", inited[0], " + ", inited[1]);
        crate::knl!();
        Ok(())
    }

    fn undo_groups(&mut self) {
        let handles: Vec<GroupHandle> = self.groups.iter().map(|(h, _)| h).collect();
        for handle in handles {
            self.domains.forget_group(handle);
        }
        self.groups
            .delete_all_groups(&mut self.platform, &mut self.caches);
        self.max_pp_cores_group_1 = self.config.max_pp_cores_group_1;
        self.max_pp_cores_group_2 = self.config.max_pp_cores_group_2;
    }

    // =========================================================================
    // ESCALONADORES
    // =========================================================================

    fn init_schedulers(&mut self) -> MaliResult<StepOutcome> {
        self.scheduler = Some(Scheduler::initialize(&self.heap)?);
        Ok(StepOutcome::Done)
    }

    fn undo_schedulers(&mut self) {
        self.scheduler = None;
    }

    fn init_gp_scheduler(&mut self) -> MaliResult<StepOutcome> {
        self.gp_scheduler = Some(GpScheduler::initialize(&self.heap, &self.groups)?);
        Ok(StepOutcome::Done)
    }

    fn undo_gp_scheduler(&mut self) {
        self.gp_scheduler = None;
    }

    fn populate_pp(&mut self) -> MaliResult<StepOutcome> {
        let sched = self.pp_scheduler.as_mut().ok_or(MaliError::NotInitialized)?;
        sched.populate(&mut self.groups)?;
        Ok(StepOutcome::Done)
    }

    fn undo_populate_pp(&mut self) {
        if let Some(sched) = self.pp_scheduler.as_mut() {
            sched.depopulate(&mut self.groups);
        }
    }

    fn init_utilization(&mut self) -> MaliResult<StepOutcome> {
        self.utilization = Some(UtilizationTracker::initialize(&self.heap)?);
        Ok(StepOutcome::Done)
    }

    fn undo_utilization(&mut self) {
        self.utilization = None;
    }

    // =========================================================================
    // SUSPEND / RESUME
    // =========================================================================

    /// Desliga todos os domínios.
    pub fn suspend(&mut self) -> MaliResult<()> {
        if !self.initialized {
            return Err(MaliError::NotInitialized);
        }
        if self.suspended {
            return Ok(());
        }

        if let Some(pmu) = self.pmu.as_mut() {
            self.domains.power_down_all(pmu);
        }
        if let Some(pm) = self.pm.as_mut() {
            pm.set_power_is_on(false);
        }
        self.suspended = true;
        crate::kinfo!("(Mali) GPU suspensa");
        Ok(())
    }

    /// Religa os domínios e reseta os grupos.
    pub fn resume(&mut self) -> MaliResult<()> {
        if !self.initialized {
            return Err(MaliError::NotInitialized);
        }
        if !self.suspended {
            return Ok(());
        }

        let pm = self.pm.as_mut().ok_or(MaliError::NotInitialized)?;
        pm.dev_ref_add(&mut self.platform)?;

        if let Some(pmu) = self.pmu.as_mut() {
            let result = pmu.reset();
            self.domains.power_up_all(pmu);
            if let Err(err) = result {
                if let Some(pm) = self.pm.as_mut() {
                    pm.dev_ref_dec(&mut self.platform);
                }
                return Err(err);
            }
        }
        self.groups.reset_all();

        if let Some(pm) = self.pm.as_mut() {
            pm.dev_ref_dec(&mut self.platform);
            pm.set_power_is_on(true);
        }
        self.suspended = false;
        crate::kinfo!("(Mali) GPU retomada");
        Ok(())
    }

    // =========================================================================
    // SESSÕES
    // =========================================================================

    /// Abre uma sessão; em Mali-450 o tile list do DLBU entra no seu page directory.
    pub fn open_session(&mut self) -> MaliResult<SessionId> {
        if !self.initialized {
            return Err(MaliError::NotInitialized);
        }
        let dlbu_phys = self.dlbu_page.as_ref().map(DlbuPage::phys);
        let sessions = self.sessions.as_mut().ok_or(MaliError::NotInitialized)?;
        sessions.open(dlbu_phys)
    }

    pub fn close_session(&mut self, id: SessionId) -> MaliResult<()> {
        let sessions = self.sessions.as_mut().ok_or(MaliError::NotInitialized)?;
        sessions.close(id)
    }

    /// Sem subsistema de sessões (teardown em curso) a notificação é descartada.
    pub fn post_notification(&mut self, id: SessionId, kind: NotificationType) -> MaliResult<()> {
        match self.sessions.as_mut() {
            Some(sessions) => sessions.post_notification(id, kind),
            None => {
                crate::kwarn!("(Session) Sem fila de notificações, descartada=", kind.raw());
                Ok(())
            }
        }
    }

    /// Não bloqueia: `None` com a fila vazia. Sem subsistema de sessões
    /// responde `CoreShutdownInProgress` para o usuário parar de consultar.
    pub fn wait_for_notification(&mut self, id: SessionId) -> MaliResult<Option<NotificationType>> {
        match self.sessions.as_mut() {
            Some(sessions) => sessions.wait_for_notification(id),
            None => Ok(Some(NotificationType::CoreShutdownInProgress)),
        }
    }

    // =========================================================================
    // CONSULTAS
    // =========================================================================

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub fn get_product_id(&self) -> ProductId {
        self.version.product
    }

    pub fn get_gpu_major_version(&self) -> u32 {
        self.version.major
    }

    pub fn get_gpu_minor_version(&self) -> u32 {
        self.version.minor
    }

    pub fn variant(&self) -> Option<HardwareVariant> {
        self.variant
    }

    pub fn base_address(&self) -> u32 {
        self.base_address
    }

    /// PPs e caches L2 sondados.
    pub fn resource_count(&self) -> ResourceCount {
        self.resources
    }

    pub fn max_pp_cores_group_1(&self) -> u32 {
        self.max_pp_cores_group_1
    }

    pub fn max_pp_cores_group_2(&self) -> u32 {
        self.max_pp_cores_group_2
    }

    /// PPs físicos em uso (após o bring-up, soma dos dois clusters).
    pub fn max_pp_cores(&self) -> u32 {
        self.max_pp_cores_group_1
            .saturating_add(self.max_pp_cores_group_2)
    }

    pub fn group_count(&self) -> u32 {
        self.groups.count()
    }

    pub fn cache_count(&self) -> u32 {
        self.caches.count()
    }

    pub fn domain_count(&self) -> u32 {
        self.domains.count()
    }

    pub fn groups(&self) -> &GroupRegistry {
        &self.groups
    }

    pub fn caches(&self) -> &L2CachePool {
        &self.caches
    }

    pub fn domains(&self) -> &PmDomainManager {
        &self.domains
    }

    pub fn pmu(&self) -> Option<&PmuCore> {
        self.pmu.as_ref()
    }

    pub fn memory(&self) -> Option<&MemoryManager> {
        self.memory.as_ref()
    }

    /// Parâmetros de memória efetivamente aplicados.
    pub fn memory_settings(&self) -> (MemorySettings, FramebufferSettings) {
        (self.memory_settings, self.framebuffer)
    }

    pub fn sessions_mut(&mut self) -> Option<&mut SessionManager> {
        self.sessions.as_mut()
    }

    pub fn profiling_mut(&mut self) -> Option<&mut ProfilingRing> {
        self.profiling.as_mut()
    }

    pub fn scheduler_mut(&mut self) -> Option<&mut Scheduler> {
        self.scheduler.as_mut()
    }

    pub fn gp_scheduler(&self) -> Option<&GpScheduler> {
        self.gp_scheduler.as_ref()
    }

    pub fn pp_scheduler(&self) -> Option<&PpScheduler> {
        self.pp_scheduler.as_ref()
    }

    pub fn utilization_mut(&mut self) -> Option<&mut UtilizationTracker> {
        self.utilization.as_mut()
    }

    pub fn power_manager(&self) -> Option<&PowerManager> {
        self.pm.as_ref()
    }

    /// Passos concluídos, na ordem em que foram executados.
    pub fn committed_steps(&self) -> impl Iterator<Item = InitStep> + '_ {
        self.committed.iter().map(|c| c.id)
    }

    pub fn heap(&self) -> &ObjectHeap {
        &self.heap
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }
}

impl<P: Platform> Drop for SubsystemContext<P> {
    fn drop(&mut self) {
        self.terminate_subsystems();
    }
}

fn register_memory(
    mm: &mut MemoryManager,
    memory: &MemorySettings,
    framebuffer: &FramebufferSettings,
) -> MmResult<()> {
    if memory.dedicated_mem_size > 0 && memory.dedicated_mem_start != 0 {
        mm.register_dedicated(memory.dedicated_mem_start, memory.dedicated_mem_size)?;
    } else if memory.dedicated_mem_size > 0 {
        crate::kwarn!("(Mem) Memória dedicada sem endereço ignorada, tamanho=", memory.dedicated_mem_size);
    }
    if memory.shared_mem_size > 0 {
        mm.register_os_memory(memory.shared_mem_size)?;
    }
    if framebuffer.fb_size > 0 {
        mm.validator_mut()
            .add_range(framebuffer.fb_start, framebuffer.fb_size)?;
    }
    Ok(())
}

/// Falha de grupo durante a leitura da configuração.
fn group_error(err: MaliError) -> MaliError {
    match err {
        MaliError::AllocationFailed => err,
        other => {
            crate::kerror!("(Group) Falha ao criar grupo:");
            crate::kerror!(other.as_str());
            MaliError::ConfigurationInvalid
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::mali::mock::MockPlatform;
    use crate::mm::heap::test_heap;

    fn context(platform: MockPlatform) -> SubsystemContext<MockPlatform> {
        SubsystemContext::new(platform, test_heap(256 * 1024), CoreConfig::default())
    }

    #[test]
    fn steps_commit_in_table_order() {
        let mut ctx = context(MockPlatform::mali400(1));
        ctx.initialize_subsystems().unwrap();

        let steps: Vec<InitStep> = ctx.committed_steps().collect();
        assert_eq!(steps.first(), Some(&InitStep::SessionSubsystemReady));
        assert_eq!(steps.last(), Some(&InitStep::PowerReleased));
        assert!(!steps.contains(&InitStep::ProfilingReady));
        assert!(!steps.contains(&InitStep::PmuConfigParsed));
        assert!(!steps.contains(&InitStep::PmDomainsCreated));
        assert!(!steps.contains(&InitStep::DlbuReady));

        let order = |s: InitStep| steps.iter().position(|x| *x == s).unwrap();
        assert!(order(InitStep::PowerHeld) < order(InitStep::ProductIdentified));
        assert!(order(InitStep::L2CacheConfigParsed) < order(InitStep::GroupsConfigParsed));
    }

    #[test]
    fn double_initialize_is_rejected() {
        let mut ctx = context(MockPlatform::mali400(1));
        ctx.initialize_subsystems().unwrap();
        assert_eq!(ctx.initialize_subsystems(), Err(MaliError::AlreadyInitialized));
        assert_eq!(ctx.group_count(), 2);
    }

    #[test]
    fn terminate_without_initialize_is_a_no_op() {
        let mut ctx = context(MockPlatform::mali400(1));
        ctx.terminate_subsystems();
        assert!(!ctx.is_initialized());
        assert_eq!(ctx.platform().dev_refs, 0);
    }

    #[test]
    fn power_reference_is_balanced() {
        let mut ctx = context(MockPlatform::mali400(2));
        ctx.initialize_subsystems().unwrap();
        assert_eq!(ctx.platform().dev_refs, 0);
        assert_eq!(ctx.power_manager().map(|pm| pm.dev_refs()), Some(0));

        ctx.terminate_subsystems();
        assert_eq!(ctx.platform().dev_refs, 0);
        assert_eq!(ctx.platform().live_mappings(), 0);
        assert_eq!(ctx.heap().used(), 0);
    }

    #[test]
    fn api_version_handshake() {
        assert!(check_api_version(API_VERSION).compatible);
        let old = check_api_version(make_api_version(API_VERSION_NUMBER - 1));
        assert!(!old.compatible);
        assert_eq!(old.kernel_version, API_VERSION);
    }
}
