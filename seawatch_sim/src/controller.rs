//! The simulation controller - single owner of the world state.
//!
//! # State machine
//!
//! ```text
//!            generate_new_scenario (any state)
//!   IDLE ───────────────────────────────▶ READY ◀──── reset (any state)
//!                                          │ ▲
//!                                    start │ │
//!                                          ▼ │
//!                       ┌── pause ── RUNNING ── tick: elapsed >= duration ──▶ COMPLETE
//!                       ▼              ▲
//!                    PAUSED ── start ──┘
//! ```
//!
//! `start` recovers instead of failing: with no vessels it generates a
//! scenario first, and from COMPLETE it resets first.
//!
//! Each tick runs two separate stages: the classifier recomputes every
//! anomaly that currently holds, then the dedup stage decides which of them
//! become new events.

use crate::config::{DedupPolicy, SimulationConfig};
use crate::context::SimContext;
use crate::state::{SimulationEvent, SimulationState};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use seawatch_core::{
    Anomaly, AnomalyClassifier, AnomalyKey, ConfigError, DetectionClock, SimulationReport, TickEngine, Vessel,
    VesselId, WorldGenerator,
};
use seawatch_env::SeaWatchContext;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Context stream feeding scenario generation.
const WORLD_STREAM: u64 = 1;

/// Lifecycle phase of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SimulationPhase {
    /// No scenario generated yet
    Idle,
    /// Scenario present, timer stopped
    Ready,
    Running,
    Paused,
    /// Elapsed time reached the configured duration
    Complete,
}

/// What a single timer tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Controller was not running; nothing changed
    Skipped,
    /// Vessels advanced and were classified
    Advanced { new_events: usize },
    /// Elapsed time hit the duration; the run is over
    Completed,
}

/// Per-scenario random streams, restored on reset so a run replays exactly.
#[derive(Debug, Clone)]
struct TickStreams {
    kinematics: ChaCha8Rng,
    detection: ChaCha8Rng,
    events: ChaCha8Rng,
}

impl TickStreams {
    fn derive(world: &mut ChaCha8Rng) -> Self {
        Self {
            kinematics: ChaCha8Rng::seed_from_u64(world.gen()),
            detection: ChaCha8Rng::seed_from_u64(world.gen()),
            events: ChaCha8Rng::seed_from_u64(world.gen()),
        }
    }
}

pub struct SimulationController {
    config: SimulationConfig,
    generator: WorldGenerator,
    engine: TickEngine,
    classifier: AnomalyClassifier,

    phase: SimulationPhase,
    state: SimulationState,
    /// Anomalies that produced an event, in detection order
    anomalies: Vec<Anomaly>,
    /// Keys that have produced an event since the last reset
    seen: HashSet<AnomalyKey>,
    /// Keys present in the previous tick's classification
    open: HashSet<AnomalyKey>,
    selected: Option<VesselId>,

    /// Timer ticks fired since the last reset
    ticks: u64,
    elapsed_ms: u64,
    scenarios_generated: u64,

    world_rng: ChaCha8Rng,
    streams: TickStreams,
    streams_at_start: TickStreams,
}

impl SimulationController {
    /// Creates a controller in IDLE with the fixed infrastructure loaded.
    ///
    /// # Arguments
    /// * `config` - Validated before anything is built
    /// * `ctx` - Source of the scenario random stream
    pub fn new<C: SeaWatchContext>(config: SimulationConfig, ctx: &C) -> Result<Self, ConfigError> {
        config.validate()?;

        let generator = WorldGenerator::new(config.behavior_weights)?;
        let engine = TickEngine::new(config.kinematics);
        let classifier = AnomalyClassifier::new(config.profile, config.thresholds);

        let mut world_rng = ctx.derive_rng(WORLD_STREAM);
        let streams = TickStreams::derive(&mut world_rng);

        let state = SimulationState {
            infrastructure: generator.generate_infrastructure(),
            ..SimulationState::default()
        };

        info!(
            seed = ctx.seed(),
            vessels = config.vessel_count,
            profile = ?config.profile,
            dedup = ?config.dedup,
            "Simulation controller created"
        );

        Ok(Self {
            config,
            generator,
            engine,
            classifier,
            phase: SimulationPhase::Idle,
            state,
            anomalies: Vec::new(),
            seen: HashSet::new(),
            open: HashSet::new(),
            selected: None,
            ticks: 0,
            elapsed_ms: 0,
            scenarios_generated: 0,
            world_rng,
            streams: streams.clone(),
            streams_at_start: streams,
        })
    }

    /// Creates a controller whose streams derive from `config.seed`.
    pub fn seeded(config: SimulationConfig) -> Result<Self, ConfigError> {
        let ctx = SimContext::new(config.seed);
        Self::new(config, &ctx)
    }

    // ========================================================================
    // COMMANDS
    // ========================================================================

    /// Discards the current scenario and generates a fresh vessel population.
    ///
    /// Infrastructure stays fixed. Always ends in READY.
    pub fn generate_new_scenario(&mut self) {
        self.state.vessels = self
            .generator
            .generate_vessels(self.config.vessel_count, &mut self.world_rng);
        self.streams = TickStreams::derive(&mut self.world_rng);
        self.streams_at_start = self.streams.clone();
        self.scenarios_generated += 1;
        self.selected = None;
        self.clear_run();
        self.phase = SimulationPhase::Ready;

        info!(
            scenario = self.scenarios_generated,
            vessels = self.state.vessels.len(),
            "New scenario generated"
        );
    }

    pub fn start(&mut self) {
        match self.phase {
            SimulationPhase::Running => {
                debug!("start ignored: already running");
                return;
            }
            SimulationPhase::Complete => {
                warn!("start requested after completion, resetting first");
                self.reset();
            }
            _ => {}
        }

        if self.state.vessels.is_empty() {
            warn!("start requested without vessels, generating a scenario first");
            self.generate_new_scenario();
        }

        self.phase = SimulationPhase::Running;
        info!(elapsed_secs = self.state.elapsed_secs, "Simulation running");
    }

    pub fn pause(&mut self) {
        if self.phase != SimulationPhase::Running {
            debug!(phase = ?self.phase, "pause ignored: not running");
            return;
        }
        self.phase = SimulationPhase::Paused;
        info!(elapsed_secs = self.state.elapsed_secs, "Simulation paused");
    }

    /// Restores every vessel to its initial snapshot and clears all logs.
    ///
    /// Vessel identities, behaviors and infrastructure are kept, and the
    /// scenario's random streams rewind, so the next run replays the last one.
    pub fn reset(&mut self) {
        for vessel in &mut self.state.vessels {
            vessel.reset_to_initial();
        }
        self.streams = self.streams_at_start.clone();
        self.clear_run();
        self.phase = SimulationPhase::Ready;
        info!("Simulation reset");
    }

    /// Sets the UI selection. Unknown ids clear it.
    pub fn select_vessel(&mut self, id: Option<VesselId>) {
        self.selected = id.filter(|id| {
            let known = self.state.vessel(id).is_some();
            if !known {
                debug!(vessel = %id, "selection of unknown vessel cleared");
            }
            known
        });
    }

    /// Fires one timer interval.
    ///
    /// Only acts while RUNNING. Advances elapsed time first; the tick that
    /// reaches the duration clamps the clock and completes the run without
    /// stepping the world.
    pub fn tick(&mut self) -> TickOutcome {
        if self.phase != SimulationPhase::Running {
            debug!(phase = ?self.phase, "tick ignored");
            return TickOutcome::Skipped;
        }

        self.ticks += 1;
        self.elapsed_ms += self.config.tick_interval_ms;

        let duration_ms = self.config.duration_ms();
        if self.elapsed_ms >= duration_ms {
            self.elapsed_ms = duration_ms;
            self.sync_elapsed();
            self.phase = SimulationPhase::Complete;
            info!(
                ticks = self.ticks,
                events = self.state.events.len(),
                "Simulation complete"
            );
            return TickOutcome::Completed;
        }
        self.sync_elapsed();

        // Stage 1: kinematics
        self.state.vessels = self.engine.advance(
            &self.state.vessels,
            &self.state.infrastructure,
            self.config.dt_secs(),
            &mut self.streams.kinematics,
        );

        // Stage 2: classification
        let clock = DetectionClock::new(self.ticks, self.state.elapsed_secs);
        let found = self.classifier.classify(
            &self.state.vessels,
            &self.state.infrastructure,
            clock,
            &mut self.streams.detection,
        );
        let detected = found.len();

        // Stage 3: dedup into events
        let fresh = self.dedup(found);
        let new_events = fresh.len();
        for anomaly in fresh {
            self.log_event(anomaly);
        }

        debug!(
            tick = self.ticks,
            t = self.state.elapsed_secs,
            detected,
            new_events,
            "tick"
        );

        TickOutcome::Advanced { new_events }
    }

    // ========================================================================
    // READ ACCESSORS
    // ========================================================================

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn phase(&self) -> SimulationPhase {
        self.phase
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn vessels(&self) -> &[Vessel] {
        &self.state.vessels
    }

    pub fn events(&self) -> &[SimulationEvent] {
        &self.state.events
    }

    /// Anomalies that produced an event, in detection order.
    pub fn anomalies(&self) -> &[Anomaly] {
        &self.anomalies
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.state.elapsed_secs
    }

    pub fn ticks_fired(&self) -> u64 {
        self.ticks
    }

    pub fn is_running(&self) -> bool {
        self.phase == SimulationPhase::Running
    }

    pub fn is_complete(&self) -> bool {
        self.phase == SimulationPhase::Complete
    }

    pub fn selected_vessel_id(&self) -> Option<&VesselId> {
        self.selected.as_ref()
    }

    pub fn selected_vessel(&self) -> Option<&Vessel> {
        self.selected.as_ref().and_then(|id| self.state.vessel(id))
    }

    /// Risk report over the anomalies logged so far.
    pub fn report(&self) -> SimulationReport {
        SimulationReport::build(
            &self.state.vessels,
            &self.state.infrastructure,
            &self.anomalies,
            self.config.thresholds.near,
        )
    }

    // ========================================================================
    // INTERNALS
    // ========================================================================

    /// Filters one tick's classification down to the anomalies that are new.
    ///
    /// Within a tick the first anomaly for a key wins.
    fn dedup(&mut self, found: Vec<Anomaly>) -> Vec<Anomaly> {
        let mut present = HashSet::new();
        let mut fresh = Vec::new();

        for anomaly in found {
            let key = anomaly.key();
            if !present.insert(key.clone()) {
                continue;
            }

            let was_open = self.open.contains(&key);
            let first_time = self.seen.insert(key);
            let is_new = match self.config.dedup {
                DedupPolicy::OncePerRun => first_time,
                DedupPolicy::PerEpisode => !was_open,
            };
            if is_new {
                fresh.push(anomaly);
            }
        }

        self.open = present;
        fresh
    }

    fn log_event(&mut self, anomaly: Anomaly) {
        let id = uuid::Builder::from_random_bytes(self.streams.events.gen()).into_uuid();
        debug!(
            event = %id,
            kind = %anomaly.anomaly_type,
            vessel = %anomaly.vessel_id,
            severity = ?anomaly.severity,
            "new anomaly"
        );

        self.state.events.push(SimulationEvent {
            id,
            time_secs: self.state.elapsed_secs,
            anomaly: anomaly.clone(),
        });
        self.anomalies.push(anomaly);
    }

    fn clear_run(&mut self) {
        self.state.events.clear();
        self.anomalies.clear();
        self.seen.clear();
        self.open.clear();
        self.ticks = 0;
        self.elapsed_ms = 0;
        self.sync_elapsed();
    }

    fn sync_elapsed(&mut self) {
        self.state.elapsed_secs = self.elapsed_ms as f64 / 1000.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seawatch_core::{AnomalyType, BehaviorWeights, LatLng, Severity};

    fn controller(config: SimulationConfig) -> SimulationController {
        SimulationController::seeded(config).unwrap()
    }

    fn hostile_config() -> SimulationConfig {
        SimulationConfig {
            vessel_count: 30,
            behavior_weights: BehaviorWeights::all_anomalous(),
            ..SimulationConfig::default()
        }
    }

    fn run_to_completion(c: &mut SimulationController) {
        c.start();
        while c.is_running() {
            c.tick();
        }
    }

    fn anomaly(vessel: &str, anomaly_type: AnomalyType, tick: u64) -> Anomaly {
        let vessel_id = VesselId::from(vessel);
        Anomaly {
            id: Anomaly::make_id(anomaly_type, &vessel_id, tick),
            anomaly_type,
            vessel_id,
            vessel_name: "Test".to_string(),
            description: String::new(),
            severity: Severity::Medium,
            timestamp_secs: tick as f64,
            position: LatLng::default(),
            nearest_infrastructure: None,
            distance_to_infrastructure: None,
            duration_secs: None,
        }
    }

    #[test]
    fn test_starts_idle_with_infrastructure() {
        let c = controller(SimulationConfig::default());
        assert_eq!(c.phase(), SimulationPhase::Idle);
        assert!(c.vessels().is_empty());
        assert_eq!(c.state().infrastructure.cables.len(), 3);
        assert_eq!(c.state().infrastructure.platforms.len(), 3);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = SimulationConfig {
            vessel_count: 0,
            ..SimulationConfig::default()
        };
        assert!(matches!(SimulationController::seeded(config), Err(ConfigError::NoVessels)));
    }

    #[test]
    fn test_completes_after_exactly_fifteen_ticks() {
        let mut c = controller(SimulationConfig::default());
        c.start();
        assert_eq!(c.phase(), SimulationPhase::Running);
        assert_eq!(c.vessels().len(), 15);

        for i in 1..15 {
            assert!(matches!(c.tick(), TickOutcome::Advanced { .. }), "tick {}", i);
            assert!(c.is_running());
        }
        assert_eq!(c.tick(), TickOutcome::Completed);
        assert!(c.is_complete());
        assert_eq!(c.elapsed_secs(), 30.0);
        assert_eq!(c.ticks_fired(), 15);

        // A 16th tick must not fire
        assert_eq!(c.tick(), TickOutcome::Skipped);
        assert_eq!(c.ticks_fired(), 15);
        assert_eq!(c.elapsed_secs(), 30.0);
    }

    #[test]
    fn test_elapsed_clamps_to_duration() {
        let mut c = controller(SimulationConfig {
            duration_secs: 5.0,
            ..SimulationConfig::default()
        });
        run_to_completion(&mut c);
        assert_eq!(c.ticks_fired(), 3);
        assert_eq!(c.elapsed_secs(), 5.0);
    }

    #[test]
    fn test_reset_restores_exactly() {
        let mut c = controller(hostile_config());
        c.start();
        for _ in 0..8 {
            c.tick();
        }
        assert!(!c.events().is_empty());

        c.reset();

        assert_eq!(c.phase(), SimulationPhase::Ready);
        assert!(c.events().is_empty());
        assert!(c.anomalies().is_empty());
        assert_eq!(c.elapsed_secs(), 0.0);
        assert_eq!(c.ticks_fired(), 0);
        for v in c.vessels() {
            assert_eq!(v.snapshot(), v.initial);
            assert_eq!(v.time_near_cable, 0.0);
            assert!(v.is_ais_active());
        }
    }

    #[test]
    fn test_reset_replays_the_same_run() {
        let mut c = controller(hostile_config());
        let ids_before: Vec<_> = {
            c.generate_new_scenario();
            c.vessels().iter().map(|v| v.id.clone()).collect()
        };

        run_to_completion(&mut c);
        let first = c.events().to_vec();
        let first_vessels = c.vessels().to_vec();

        c.reset();
        run_to_completion(&mut c);

        let ids_after: Vec<_> = c.vessels().iter().map(|v| v.id.clone()).collect();
        assert_eq!(ids_before, ids_after);
        assert_eq!(first, c.events());
        assert_eq!(first_vessels, c.vessels());
    }

    #[test]
    fn test_start_after_complete_resets_implicitly() {
        let mut c = controller(SimulationConfig::default());
        run_to_completion(&mut c);
        assert!(c.is_complete());

        c.start();
        assert!(c.is_running());
        assert_eq!(c.elapsed_secs(), 0.0);
        assert!(c.events().is_empty());
    }

    #[test]
    fn test_pause_stops_ticks() {
        let mut c = controller(SimulationConfig::default());
        c.start();
        c.tick();
        c.pause();
        assert_eq!(c.phase(), SimulationPhase::Paused);

        let snapshot = c.state().clone();
        assert_eq!(c.tick(), TickOutcome::Skipped);
        assert_eq!(c.state(), &snapshot);

        // Pause while paused is a no-op
        c.pause();
        assert_eq!(c.phase(), SimulationPhase::Paused);

        c.start();
        assert!(c.is_running());
        assert_eq!(c.elapsed_secs(), 2.0);
    }

    #[test]
    fn test_new_scenario_discards_state() {
        let mut c = controller(hostile_config());
        c.start();
        for _ in 0..5 {
            c.tick();
        }
        let before: Vec<_> = c.vessels().iter().map(|v| v.initial).collect();
        c.select_vessel(Some(VesselId::from_index(0)));

        c.generate_new_scenario();

        assert_eq!(c.phase(), SimulationPhase::Ready);
        assert!(c.events().is_empty());
        assert_eq!(c.elapsed_secs(), 0.0);
        assert!(c.selected_vessel_id().is_none());
        let after: Vec<_> = c.vessels().iter().map(|v| v.initial).collect();
        assert_ne!(before, after);
        assert_eq!(c.state().infrastructure, seawatch_core::Infrastructure::reference());
    }

    #[test]
    fn test_select_vessel() {
        let mut c = controller(SimulationConfig::default());
        c.generate_new_scenario();

        c.select_vessel(Some(VesselId::from_index(3)));
        assert_eq!(c.selected_vessel().map(|v| v.id.as_str()), Some("vessel-3"));

        c.select_vessel(Some(VesselId::from("vessel-999")));
        assert!(c.selected_vessel_id().is_none());

        c.select_vessel(Some(VesselId::from_index(1)));
        c.select_vessel(None);
        assert!(c.selected_vessel().is_none());
    }

    #[test]
    fn test_once_per_run_never_repeats_a_key() {
        let mut c = controller(hostile_config());
        run_to_completion(&mut c);

        let keys: Vec<_> = c.anomalies().iter().map(|a| a.key()).collect();
        let unique: HashSet<_> = keys.iter().cloned().collect();
        assert!(!keys.is_empty());
        assert_eq!(keys.len(), unique.len());
        assert_eq!(c.events().len(), c.anomalies().len());
    }

    #[test]
    fn test_dedup_policies() {
        let found = |tick| vec![anomaly("vessel-1", AnomalyType::AisLoss, tick)];

        let mut once = controller(SimulationConfig::default());
        assert_eq!(once.dedup(found(1)).len(), 1);
        assert_eq!(once.dedup(found(2)).len(), 0);
        assert_eq!(once.dedup(vec![]).len(), 0);
        assert_eq!(once.dedup(found(4)).len(), 0);

        let mut episodes = controller(SimulationConfig {
            dedup: DedupPolicy::PerEpisode,
            ..SimulationConfig::default()
        });
        assert_eq!(episodes.dedup(found(1)).len(), 1);
        assert_eq!(episodes.dedup(found(2)).len(), 0);
        assert_eq!(episodes.dedup(vec![]).len(), 0);
        let recurrence = episodes.dedup(found(4));
        assert_eq!(recurrence.len(), 1);
        assert_eq!(recurrence[0].id, "anomaly-ais-vessel-1-4");
    }

    #[test]
    fn test_dedup_first_anomaly_per_key_wins() {
        let mut c = controller(SimulationConfig::default());
        let mut zigzag = anomaly("vessel-2", AnomalyType::RouteDeviation, 1);
        zigzag.description = "zigzag".to_string();
        let mut loiter = anomaly("vessel-2", AnomalyType::RouteDeviation, 1);
        loiter.description = "loiter".to_string();
        let other = anomaly("vessel-2", AnomalyType::AisLoss, 1);

        let fresh = c.dedup(vec![zigzag, loiter, other]);
        assert_eq!(fresh.len(), 2);
        assert_eq!(fresh[0].description, "zigzag");
    }

    #[test]
    fn test_events_carry_clock_and_unique_ids() {
        let mut c = controller(hostile_config());
        run_to_completion(&mut c);

        let ids: HashSet<_> = c.events().iter().map(|e| e.id).collect();
        assert_eq!(ids.len(), c.events().len());
        for e in c.events() {
            assert_eq!(e.time_secs, e.anomaly.timestamp_secs);
            assert!(e.time_secs > 0.0 && e.time_secs < 30.0);
        }
    }

    #[test]
    fn test_quiet_traffic_raises_nothing() {
        let mut c = controller(SimulationConfig {
            behavior_weights: BehaviorWeights::all_normal(),
            ..SimulationConfig::default()
        });
        run_to_completion(&mut c);
        assert!(c.events().is_empty());
        assert_eq!(c.report().total_anomalies, 0);
    }

    #[test]
    fn test_same_seed_same_run() {
        let mut a = controller(hostile_config());
        let mut b = controller(hostile_config());
        run_to_completion(&mut a);
        run_to_completion(&mut b);
        assert_eq!(a.state(), b.state());
        assert_eq!(a.anomalies(), b.anomalies());
    }
}
