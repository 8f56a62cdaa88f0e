//! Framework de autoteste
//!
//! Suites simples de funções `fn() -> TestResult`, executáveis no boot do
//! host quando a feature `self_test` está ligada.

/// Resultado de teste
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestResult {
    Passed,
    Failed,
    Skipped,
}

impl TestResult {
    /// `Passed` se `cond`, senão `Failed`.
    pub fn check(cond: bool) -> Self {
        if cond {
            Self::Passed
        } else {
            Self::Failed
        }
    }
}

/// Um caso de teste
pub struct TestCase {
    pub name: &'static str,
    pub func: fn() -> TestResult,
}

impl TestCase {
    pub const fn new(name: &'static str, func: fn() -> TestResult) -> Self {
        Self { name, func }
    }
}

/// Contagem de uma suite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SuiteSummary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl SuiteSummary {
    pub fn is_ok(&self) -> bool {
        self.failed == 0
    }
}

/// Executa suite de testes
pub fn run_test_suite(name: &str, tests: &[TestCase]) -> SuiteSummary {
    crate::kinfo!("=== Executando suite:");
    crate::kinfo!(name);

    let mut summary = SuiteSummary::default();

    for test in tests {
        match (test.func)() {
            TestResult::Passed => {
                crate::kok!(test.name);
                summary.passed += 1;
            }
            TestResult::Failed => {
                crate::kfail!(test.name);
                summary.failed += 1;
            }
            TestResult::Skipped => {
                crate::kwarn!("[SKIP]");
                crate::kwarn!(test.name);
                summary.skipped += 1;
            }
        }
    }

    crate::kinfo!("Resultados: passed=", summary.passed);
    if summary.failed > 0 {
        crate::kerror!("Resultados: failed=", summary.failed);
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok() -> TestResult {
        TestResult::Passed
    }

    fn bad() -> TestResult {
        TestResult::check(1 + 1 == 3)
    }

    fn later() -> TestResult {
        TestResult::Skipped
    }

    #[test]
    fn suite_counts_every_outcome() {
        let suite = [
            TestCase::new("ok", ok),
            TestCase::new("bad", bad),
            TestCase::new("later", later),
        ];
        let summary = run_test_suite("framework", &suite);
        assert_eq!(
            summary,
            SuiteSummary {
                passed: 1,
                failed: 1,
                skipped: 1
            }
        );
        assert!(!summary.is_ok());
    }
}
