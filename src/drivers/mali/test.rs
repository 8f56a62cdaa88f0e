//! Autoteste do núcleo Mali (feature `self_test`).
//!
//! Cobre as tabelas fixas e as regras que não dependem de hardware; o host
//! pode rodar no boot, antes de `initialize_subsystems`.

use super::dump::BoundedWriter;
use super::kernel_core::{check_api_version, make_api_version, API_VERSION_NUMBER};
use super::product::{DomainId, GpuVersion, HardwareVariant, ProductId, DOM1, DOM2, DOM3};
use super::hw::pp::broadcast_id_for;
use super::hw::BroadcastMask;
use super::resource::offsets;
use crate::klib::test_framework::{run_test_suite, SuiteSummary, TestCase, TestResult};
use crate::mm::{MemValidator, MmError};
use alloc::vec::Vec;
use core::fmt::Write;

const SUITE: &[TestCase] = &[
    TestCase::new("versao do produto", test_product_decode),
    TestCase::new("dominios Mali-450", test_multi_cluster_domains),
    TestCase::new("dominios Mali-400", test_baseline_domains),
    TestCase::new("broadcast id", test_broadcast_ids),
    TestCase::new("validador de memoria", test_validator),
    TestCase::new("versao da API", test_api_version),
    TestCase::new("dump limitado", test_bounded_writer),
];

/// Executa a suite do núcleo Mali.
pub fn run_self_tests() -> SuiteSummary {
    run_test_suite("mali", SUITE)
}

fn test_product_decode() -> TestResult {
    let v = GpuVersion::decode(0xCF07_0100);
    TestResult::check(
        v.product == ProductId::Mali450
            && v.major == 1
            && v.minor == 0
            && v.product.variant() == Some(HardwareVariant::MultiCluster),
    )
}

fn test_multi_cluster_domains() -> TestResult {
    let Ok(layout) = HardwareVariant::MultiCluster.domain_layout(8) else {
        return TestResult::Failed;
    };
    let ids: Vec<DomainId> = layout.iter().map(|d| d.id).collect();
    TestResult::check(ids == [DOM3, DOM2, DOM1])
}

fn test_baseline_domains() -> TestResult {
    match HardwareVariant::Baseline.domain_layout(4) {
        Ok(layout) => TestResult::check(layout.len() == 4 && layout[3].id == 3),
        Err(_) => TestResult::Failed,
    }
}

fn test_broadcast_ids() -> TestResult {
    TestResult::check(
        broadcast_id_for(offsets::PP[0]) == BroadcastMask::PP0
            && broadcast_id_for(offsets::PP[7]) == BroadcastMask::PP7
            && broadcast_id_for(offsets::GP).is_empty(),
    )
}

fn test_validator() -> TestResult {
    let mut v = MemValidator::new();
    if v.add_range(0x8000_0000, 0x0010_0000).is_err() {
        return TestResult::Failed;
    }
    TestResult::check(
        v.check(0x8000_0000, 0x1000).is_ok()
            && v.check(0x8010_0000, 0x1000) == Err(MmError::OutOfBounds),
    )
}

fn test_api_version() -> TestResult {
    let ok = check_api_version(make_api_version(API_VERSION_NUMBER));
    let old = check_api_version(make_api_version(API_VERSION_NUMBER - 1));
    TestResult::check(ok.compatible && !old.compatible)
}

fn test_bounded_writer() -> TestResult {
    let mut buf = [0u8; 4];
    let mut w = BoundedWriter::new(&mut buf);
    let truncated = write!(w, "mali-core").is_err();
    TestResult::check(truncated && w.len() == 4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_test_suite_passes() {
        let summary = run_self_tests();
        assert!(summary.is_ok());
        assert_eq!(summary.passed, SUITE.len());
    }
}
