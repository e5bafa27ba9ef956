// Test harness module
// Seeded edit simulation and certification across seeds

pub mod simulator;

pub use simulator::*;

/// Test harness for running stress tests and certification
pub struct TestHarness;

impl TestHarness {
    /// Run a long single-seed simulation with a large tree ceiling
    #[must_use]
    pub fn run_stress_test(max_instructions: usize, operations: u64) -> StressTestReport {
        tracing::info!(
            "Running stress test with {} instructions and {} operations",
            max_instructions,
            operations
        );

        let config = SimulatorConfig {
            seed: 12345,
            total_operations: operations,
            max_instructions,
            ..Default::default()
        };

        let report = run_simulator(config);

        StressTestReport {
            max_instructions,
            operations,
            peak_instructions: report.stats.peak_instructions,
            violations: report.violations.len(),
            success: report.passed(),
        }
    }

    /// Run the simulator across a range of seeds
    #[must_use]
    pub fn run_certification(seeds: u64, operations: u64) -> CertificationReport {
        tracing::info!("Running certification across {} seeds", seeds);

        let mut total_violations = 0;
        let mut failed_seeds = Vec::new();

        for seed in 0..seeds {
            let config = SimulatorConfig {
                seed,
                total_operations: operations,
                ..Default::default()
            };

            let report = run_simulator(config);
            if !report.passed() {
                failed_seeds.push(seed);
            }
            total_violations += report.violations.len();
        }

        CertificationReport {
            passed: failed_seeds.is_empty(),
            total_violations,
            seeds_tested: seeds,
            failed_seeds,
        }
    }
}

/// Report from a stress test
#[derive(Debug, Clone)]
pub struct StressTestReport {
    /// Tree size ceiling
    pub max_instructions: usize,
    /// Edits applied
    pub operations: u64,
    /// Largest tree reached
    pub peak_instructions: usize,
    /// Violations found
    pub violations: usize,
    /// Whether the run was clean
    pub success: bool,
}

/// Report from certification
#[derive(Debug, Clone)]
pub struct CertificationReport {
    /// Whether every seed passed
    pub passed: bool,
    /// Violations across all seeds
    pub total_violations: usize,
    /// Number of seeds run
    pub seeds_tested: u64,
    /// Seeds with violations
    pub failed_seeds: Vec<u64>,
}
