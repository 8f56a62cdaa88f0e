//! Bring-up, rollback e teardown do subsistema.

mod common;

use common::{heap, FakePlatform, MALI200_VERSION};
use mali_core::drivers::mali::resource::offsets;
use mali_core::drivers::mali::InitStep;
use mali_core::{CoreConfig, MaliError, ProductId, SubsystemContext};

const HEAP_SIZE: usize = 256 * 1024;

fn context(platform: FakePlatform) -> SubsystemContext<FakePlatform> {
    context_with(platform, CoreConfig::default())
}

fn context_with(platform: FakePlatform, config: CoreConfig) -> SubsystemContext<FakePlatform> {
    SubsystemContext::new(platform, heap(HEAP_SIZE), config)
}

/// Nada do que o bring-up criou pode sobrar.
fn assert_nothing_left(ctx: &SubsystemContext<FakePlatform>) {
    assert_eq!(ctx.group_count(), 0);
    assert_eq!(ctx.cache_count(), 0);
    assert_eq!(ctx.domain_count(), 0);
    assert_eq!(ctx.heap().used(), 0);
    assert_eq!(ctx.platform().live_mappings(), 0);
    assert_eq!(ctx.platform().dev_refs, 0);
    assert_eq!(ctx.committed_steps().count(), 0);
    assert!(!ctx.is_initialized());
}

#[test]
fn missing_gp_is_a_configuration_error() {
    let mut ctx = context(FakePlatform::mali400(2, true).without(offsets::GP));
    assert_eq!(ctx.initialize_subsystems(), Err(MaliError::ConfigurationInvalid));
    assert_nothing_left(&ctx);
}

#[test]
fn missing_gp_mmu_is_a_configuration_error() {
    let mut ctx = context(FakePlatform::mali450(8, true).without(offsets::GP_MMU));
    assert_eq!(ctx.initialize_subsystems(), Err(MaliError::ConfigurationInvalid));
    assert_nothing_left(&ctx);
}

#[test]
fn missing_pp0_mmu_is_a_configuration_error() {
    let mut ctx = context(FakePlatform::mali400(2, false).without(offsets::PP_MMU[0]));
    assert_eq!(ctx.initialize_subsystems(), Err(MaliError::ConfigurationInvalid));
    assert_nothing_left(&ctx);
}

#[test]
fn single_core_without_pmu_comes_up() {
    let mut ctx = context(FakePlatform::mali400(1, false));
    ctx.initialize_subsystems().unwrap();

    assert!(ctx.is_initialized());
    assert_eq!(ctx.get_product_id(), ProductId::Mali400);
    assert_eq!(ctx.get_gpu_major_version(), 1);
    assert_eq!(ctx.get_gpu_minor_version(), 1);
    assert_eq!(ctx.domain_count(), 0);
    assert!(ctx.pmu().is_none());
    assert_eq!(ctx.group_count(), 2);
    assert_eq!(ctx.cache_count(), 1);
    assert_eq!(ctx.max_pp_cores(), 1);
    assert_eq!(ctx.platform().dev_refs, 0);
}

#[test]
fn core_failure_on_third_pp_rolls_back_siblings() {
    let platform = FakePlatform::mali400(4, true).fail_map_at(offsets::PP[2]);
    let mut ctx = context(platform);

    assert_eq!(ctx.initialize_subsystems(), Err(MaliError::ConfigurationInvalid));
    assert_nothing_left(&ctx);
}

#[test]
fn virtual_group_failure_rolls_back_every_cluster() {
    let platform = FakePlatform::mali450(8, true).fail_map_at(offsets::PP_BCAST);
    let mut ctx = context(platform);

    assert_eq!(ctx.initialize_subsystems(), Err(MaliError::ConfigurationInvalid));
    assert_nothing_left(&ctx);

    ctx.platform_mut().clear_failures();
    ctx.initialize_subsystems().unwrap();
    assert_eq!(ctx.group_count(), 10);
}

#[test]
fn mmu_failure_is_reported_as_configuration_error() {
    let platform = FakePlatform::mali400(2, false).fail_map_at(offsets::PP_MMU[1]);
    let mut ctx = context(platform);

    assert_eq!(ctx.initialize_subsystems(), Err(MaliError::ConfigurationInvalid));
    assert_nothing_left(&ctx);
}

#[test]
fn retry_after_failure_succeeds() {
    let platform = FakePlatform::mali400(4, true).fail_map_at(offsets::PP[2]);
    let mut ctx = context(platform);
    assert!(ctx.initialize_subsystems().is_err());

    ctx.platform_mut().clear_failures();
    ctx.initialize_subsystems().unwrap();
    assert_eq!(ctx.group_count(), 5);
    assert_eq!(ctx.domain_count(), 4);
}

#[test]
fn teardown_releases_everything() {
    let mut ctx = context(FakePlatform::mali450(8, true));
    ctx.initialize_subsystems().unwrap();
    assert!(ctx.heap().used() > 0);
    assert!(ctx.platform().live_mappings() > 0);

    ctx.terminate_subsystems();
    assert_nothing_left(&ctx);
    assert_eq!(ctx.get_product_id(), ProductId::Unknown);

    // segundo teardown não faz nada
    ctx.terminate_subsystems();
    assert_nothing_left(&ctx);
}

#[test]
fn initialize_twice_is_rejected() {
    let mut ctx = context(FakePlatform::mali400(2, true));
    ctx.initialize_subsystems().unwrap();
    let groups = ctx.group_count();

    assert_eq!(ctx.initialize_subsystems(), Err(MaliError::AlreadyInitialized));
    assert_eq!(ctx.group_count(), groups);
    assert!(ctx.is_initialized());
}

#[test]
fn unsupported_product_is_rejected() {
    let platform = FakePlatform::mali400(1, false).seed(offsets::PP[0], 0x1000, MALI200_VERSION);
    let mut ctx = context(platform);
    assert_eq!(ctx.initialize_subsystems(), Err(MaliError::ConfigurationInvalid));
    assert_nothing_left(&ctx);

    let platform = FakePlatform::mali400(1, false).seed(offsets::PP[0], 0x1000, 0);
    let mut ctx = context(platform);
    assert_eq!(ctx.initialize_subsystems(), Err(MaliError::ConfigurationInvalid));
    assert_nothing_left(&ctx);
}

#[test]
fn empty_host_has_no_gpu() {
    let mut ctx = context(FakePlatform::empty());
    assert_eq!(ctx.initialize_subsystems(), Err(MaliError::ConfigurationInvalid));
    assert_nothing_left(&ctx);
}

#[test]
fn shared_interrupts_need_driver_support() {
    let mut platform = FakePlatform::mali400(1, false);
    platform.shared_irqs = true;
    let mut ctx = context(platform);
    assert_eq!(ctx.initialize_subsystems(), Err(MaliError::Fault));
    assert_nothing_left(&ctx);

    let mut platform = FakePlatform::mali400(1, false);
    platform.shared_irqs = true;
    let config = CoreConfig {
        shared_interrupts_supported: true,
        ..CoreConfig::default()
    };
    let mut ctx = context_with(platform, config);
    ctx.initialize_subsystems().unwrap();
}

#[test]
fn heap_exhaustion_unwinds_cleanly() {
    let mut ctx = SubsystemContext::new(
        FakePlatform::mali450(8, true),
        heap(8 * 1024),
        CoreConfig::default(),
    );
    assert_eq!(ctx.initialize_subsystems(), Err(MaliError::AllocationFailed));
    assert_nothing_left(&ctx);
}

#[test]
fn profiling_failure_is_not_fatal() {
    let config = CoreConfig {
        profiling: true,
        profiling_entries: 1 << 20,
        ..CoreConfig::default()
    };
    let mut ctx = context_with(FakePlatform::mali400(1, false), config);
    ctx.initialize_subsystems().unwrap();
    assert!(ctx.profiling_mut().is_none());
    assert!(!ctx.committed_steps().any(|s| s == InitStep::ProfilingReady));
}

#[test]
fn profiling_ring_records_from_boot() {
    let config = CoreConfig {
        profiling: true,
        boot_profiling: true,
        profiling_entries: 64,
        ..CoreConfig::default()
    };
    let mut ctx = context_with(FakePlatform::mali400(1, false), config);
    ctx.initialize_subsystems().unwrap();
    assert!(ctx.committed_steps().any(|s| s == InitStep::ProfilingReady));

    let ring = ctx.profiling_mut().unwrap();
    assert!(ring.is_recording());
    ring.add_event(10, 0x0100_0001, [1, 2, 3, 4, 5]);
    assert_eq!(ring.count(), 1);

    ctx.terminate_subsystems();
    assert_eq!(ctx.heap().used(), 0);
}
