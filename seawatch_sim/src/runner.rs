//! Scenario runner - executes presets headlessly and checks invariants.

use crate::config::SimulationConfig;
use crate::context::SimContext;
use crate::controller::{SimulationController, SimulationPhase};
use crate::driver::SimulationDriver;
use crate::error::SimError;
use crate::exporter::{SimExport, SimFrame};
use crate::scenarios::ScenarioId;

use seawatch_core::vessel::{MAX_SPEED_KNOTS, MIN_SPEED_KNOTS};
use seawatch_core::{Severity, SimulationReport, Vessel};
use seawatch_env::TokioContext;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Results from running a scenario.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether the run completed with every invariant intact
    pub passed: bool,

    /// Timer ticks fired, the completing tick included
    pub total_ticks: u64,

    /// Final simulation time in seconds
    pub final_time_secs: f64,

    pub final_phase: SimulationPhase,

    pub event_count: usize,

    pub high_severity_events: usize,

    /// Failure message if any
    pub failure_reason: Option<String>,

    pub report: Option<SimulationReport>,
}

/// Runs scenario presets.
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    /// Base configuration; presets are applied on top
    base: SimulationConfig,
}

impl ScenarioRunner {
    /// Creates a new scenario runner with reference timing.
    pub fn new(seed: u64, vessel_count: usize) -> Self {
        Self::from_config(SimulationConfig {
            seed,
            vessel_count,
            ..SimulationConfig::default()
        })
    }

    /// Creates a runner from a full base configuration.
    pub fn from_config(base: SimulationConfig) -> Self {
        Self { base }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.base.seed = seed;
        self
    }

    /// Sets the simulated duration.
    pub fn with_duration(mut self, secs: f64) -> Self {
        self.base.duration_secs = secs;
        self
    }

    /// Sets the tick interval.
    pub fn with_interval(mut self, ms: u64) -> Self {
        self.base.tick_interval_ms = ms;
        self
    }

    pub fn seed(&self) -> u64 {
        self.base.seed
    }

    /// The configuration a preset runs with.
    pub fn config_for(&self, scenario: ScenarioId) -> SimulationConfig {
        let mut config = self.base.clone();
        scenario.apply(&mut config);
        config
    }

    /// Runs a scenario on a virtual clock and returns the result.
    pub fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        self.execute(scenario, None)
    }

    /// Runs a scenario and records one frame per tick.
    pub fn run_with_export(&self, scenario: ScenarioId) -> (ScenarioResult, SimExport) {
        let mut export = SimExport::new(scenario.name(), self.base.seed, Default::default());
        let result = self.execute(scenario, Some(&mut export));
        (result, export)
    }

    /// Runs a scenario against the wall clock through the interval driver.
    ///
    /// Random streams still derive from the seed; only time is real.
    pub async fn run_realtime(&self, scenario: ScenarioId) -> Result<ScenarioResult, SimError> {
        let config = self.config_for(scenario);
        info!(
            "Starting scenario: {} (seed={}, realtime)",
            scenario.name(),
            config.seed
        );

        let mut controller = SimulationController::seeded(config.clone())?;
        controller.start();

        let controller = Arc::new(Mutex::new(controller));
        let driver = SimulationDriver::new(Arc::clone(&controller), TokioContext::shared());
        let mut violation = None;
        driver
            .run_observed(|previous, controller| {
                if violation.is_none() {
                    if let Err(reason) = check_step(previous, controller.vessels()) {
                        warn!("t={:.1}s invariant violated: {}", controller.elapsed_secs(), reason);
                        violation = Some(reason);
                    }
                }
            })
            .await?;

        let controller = controller.lock().map_err(|_| SimError::LockPoisoned)?;
        Ok(self.finish(scenario, &config, &controller, violation))
    }

    fn execute(&self, scenario: ScenarioId, mut export: Option<&mut SimExport>) -> ScenarioResult {
        let config = self.config_for(scenario);
        info!("Starting scenario: {} (seed={})", scenario.name(), config.seed);

        let ctx = SimContext::new(config.seed);
        let mut controller = match SimulationController::new(config.clone(), &ctx) {
            Ok(c) => c,
            Err(e) => {
                warn!("Scenario {} rejected its configuration: {}", scenario.name(), e);
                return ScenarioResult {
                    scenario,
                    seed: config.seed,
                    passed: false,
                    total_ticks: 0,
                    final_time_secs: 0.0,
                    final_phase: SimulationPhase::Idle,
                    event_count: 0,
                    high_severity_events: 0,
                    failure_reason: Some(e.to_string()),
                    report: None,
                };
            }
        };

        controller.start();
        if let Some(export) = export.as_deref_mut() {
            export.infrastructure = controller.state().infrastructure.clone();
            export.add_frame(SimFrame::capture(0.0, controller.vessels(), &[]));
        }

        let mut violation = None;
        while controller.is_running() {
            let previous = controller.vessels().to_vec();
            let logged = controller.events().len();

            ctx.advance_time(config.tick_interval());
            let outcome = controller.tick();

            if violation.is_none() {
                if let Err(reason) = check_step(&previous, controller.vessels()) {
                    warn!("t={:.1}s invariant violated: {}", controller.elapsed_secs(), reason);
                    violation = Some(reason);
                }
            }

            if let Some(export) = export.as_deref_mut() {
                export.add_frame(SimFrame::capture(
                    controller.elapsed_secs(),
                    controller.vessels(),
                    &controller.events()[logged..],
                ));
            }

            debug!("  t={:.1}s | {:?} | events={}", controller.elapsed_secs(), outcome, controller.events().len());
        }

        if let Some(export) = export {
            export.finalize(controller.events(), controller.report());
        }

        self.finish(scenario, &config, &controller, violation)
    }

    fn finish(
        &self,
        scenario: ScenarioId,
        config: &SimulationConfig,
        controller: &SimulationController,
        violation: Option<String>,
    ) -> ScenarioResult {
        let events = controller.events();
        let expected_ticks = config.expected_ticks();

        let failure_reason = if let Some(reason) = violation {
            Some(reason)
        } else if !controller.is_complete() {
            Some(format!("run ended in {:?} instead of COMPLETE", controller.phase()))
        } else if controller.ticks_fired() != expected_ticks {
            Some(format!(
                "{} ticks fired, expected {}",
                controller.ticks_fired(),
                expected_ticks
            ))
        } else if scenario.expects_silence() && !events.is_empty() {
            Some(format!("{} false-positive events on normal traffic", events.len()))
        } else {
            None
        };

        ScenarioResult {
            scenario,
            seed: config.seed,
            passed: failure_reason.is_none(),
            total_ticks: controller.ticks_fired(),
            final_time_secs: controller.elapsed_secs(),
            final_phase: controller.phase(),
            event_count: events.len(),
            high_severity_events: events
                .iter()
                .filter(|e| e.anomaly.severity == Severity::High)
                .count(),
            failure_reason,
            report: Some(controller.report()),
        }
    }
}

/// Checks the per-vessel invariants across one step.
///
/// Speeds stay in the envelope, headings in [0, 360), and time near a cable
/// never decreases.
pub fn check_step(previous: &[Vessel], current: &[Vessel]) -> Result<(), String> {
    for vessel in current {
        if !(MIN_SPEED_KNOTS..=MAX_SPEED_KNOTS).contains(&vessel.speed) {
            return Err(format!("{} speed {} outside envelope", vessel.id, vessel.speed));
        }
        if !(0.0..360.0).contains(&vessel.heading) {
            return Err(format!("{} heading {} not normalized", vessel.id, vessel.heading));
        }
    }

    for (before, after) in previous.iter().zip(current) {
        if after.time_near_cable < before.time_near_cable {
            return Err(format!(
                "{} time near cable fell from {} to {}",
                after.id, before.time_near_cable, after.time_near_cable
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use seawatch_core::{Behavior, LatLng, VesselType};

    #[test]
    fn test_baseline_scenario() {
        let result = ScenarioRunner::new(42, 15).run(ScenarioId::Baseline);

        assert!(result.passed, "{:?}", result.failure_reason);
        assert_eq!(result.total_ticks, 15);
        assert_eq!(result.final_time_secs, 30.0);
        assert_eq!(result.final_phase, SimulationPhase::Complete);
    }

    #[test]
    fn test_all_presets_pass() {
        let runner = ScenarioRunner::new(7, 20);
        for scenario in ScenarioId::all() {
            let result = runner.run(scenario);
            assert!(result.passed, "{}: {:?}", scenario, result.failure_reason);
        }
    }

    #[test]
    fn test_quiet_scenario_is_silent() {
        let result = ScenarioRunner::new(42, 25).run(ScenarioId::Quiet);
        assert!(result.passed);
        assert_eq!(result.event_count, 0);
    }

    #[test]
    fn test_high_threat_raises_events() {
        let result = ScenarioRunner::new(42, 30).run(ScenarioId::HighThreat);
        assert!(result.passed);
        assert!(result.event_count > 0);
        let report = result.report.unwrap();
        assert_eq!(report.total_anomalies, result.event_count);
    }

    #[test]
    fn test_same_seed_is_deterministic() {
        let a = ScenarioRunner::new(1234, 15).run(ScenarioId::HighThreat);
        let b = ScenarioRunner::new(1234, 15).run(ScenarioId::HighThreat);
        assert_eq!(a.event_count, b.event_count);
        assert_eq!(a.report, b.report);
    }

    #[test]
    fn test_custom_timing() {
        let result = ScenarioRunner::new(5, 5)
            .with_duration(4.0)
            .with_interval(500)
            .run(ScenarioId::Baseline);
        assert!(result.passed);
        assert_eq!(result.total_ticks, 8);
    }

    #[test]
    fn test_invalid_config_fails_the_run() {
        let result = ScenarioRunner::new(5, 0).run(ScenarioId::Baseline);
        assert!(!result.passed);
        assert_eq!(result.total_ticks, 0);
        assert!(result.failure_reason.is_some());
    }

    #[test]
    fn test_export_has_one_frame_per_tick() {
        let runner = ScenarioRunner::new(42, 10);
        let (result, export) = runner.run_with_export(ScenarioId::HighThreat);

        // Initial frame plus one per tick
        assert_eq!(export.frames.len() as u64, result.total_ticks + 1);
        assert_eq!(export.duration_secs, 30.0);
        assert_eq!(export.events.len(), result.event_count);
        assert_eq!(export.infrastructure.cables.len(), 3);

        let framed: usize = export.frames.iter().map(|f| f.new_event_ids.len()).sum();
        assert_eq!(framed, result.event_count);
        assert!(export.report.is_some());
    }

    #[test]
    fn test_check_step_flags_violations() {
        let v = Vessel::new("vessel-0", "A", VesselType::Cargo, Behavior::Normal, LatLng::default(), 0.0, 5.0);
        assert!(check_step(&[v.clone()], &[v.clone()]).is_ok());

        let mut fast = v.clone();
        fast.speed = 11.0;
        assert!(check_step(&[v.clone()], &[fast]).is_err());

        let mut before = v.clone();
        before.time_near_cable = 4.0;
        assert!(check_step(&[before], &[v]).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_realtime_run_matches_virtual_run() {
        let runner = ScenarioRunner::new(42, 10).with_duration(10.0);
        let realtime = runner.run_realtime(ScenarioId::HighThreat).await.unwrap();
        let virtual_run = runner.run(ScenarioId::HighThreat);

        assert!(realtime.passed, "{:?}", realtime.failure_reason);
        assert_eq!(realtime.total_ticks, 5);
        assert_eq!(realtime.event_count, virtual_run.event_count);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_invariants_hold_for_any_seed(seed in any::<u64>(), vessels in 1usize..25) {
            for scenario in [ScenarioId::Baseline, ScenarioId::HighThreat] {
                let result = ScenarioRunner::new(seed, vessels).run(scenario);
                prop_assert!(result.passed, "{} seed={}: {:?}", scenario, seed, result.failure_reason);
                prop_assert_eq!(result.total_ticks, 15);
            }
        }
    }
}
