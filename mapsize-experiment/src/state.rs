use super::config::ExperimentConfig;
use super::error::ExperimentError;
use super::export::Exporter;
use super::input::Key;
use super::trial::Trial;
use mapsize_core::{DisplayState, PercentDifference, Phase, Response, Screen, TrialRecord};
use mapsize_timing::{OneShot, Timer};
use rand::Rng;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub enum ExperimentEvent {
    PhaseChanged(Phase),
    DisplayChanged(DisplayState),
    ResponseRecorded {
        trial_index: usize,
        response: Response,
        reaction_time_s: f64,
    },
    Finished,
}

/// Drives one session: text screens, then `max_trials` flash/reference/altered
/// sequences, then export.
///
/// Time only moves through `T`, so the controller is advanced by calling
/// [`update`](Self::update) once per displayed frame and [`handle_key`](Self::handle_key)
/// for every key press. At most one deadline is pending at any time.
pub struct TrialController<T, R, E>
where
    T: Timer<Timestamp = u64>,
    R: Rng,
    E: Exporter,
{
    phase: Phase,
    display: Option<DisplayState>,
    timer: T,
    rng: R,
    exporter: E,
    config: ExperimentConfig,
    current: Option<Trial<u64>>,
    pending: OneShot,
    results: Vec<TrialRecord>,
    exported: bool,
}

impl<T, R, E> TrialController<T, R, E>
where
    T: Timer<Timestamp = u64>,
    R: Rng,
    E: Exporter,
{
    /// `config` is expected to have passed [`ExperimentConfig::validate`].
    pub fn new(config: ExperimentConfig, timer: T, rng: R, exporter: E) -> Self {
        Self {
            phase: Phase::default(),
            display: None,
            timer,
            rng,
            exporter,
            config,
            current: None,
            pending: OneShot::default(),
            results: Vec::new(),
            exported: false,
        }
    }

    /// Routes a key press according to the current phase. Keys that mean nothing in the
    /// current state are dropped and produce no events.
    pub fn handle_key(&mut self, key: Key) -> Result<Vec<ExperimentEvent>, ExperimentError> {
        match self.phase {
            phase if phase.advances_on_any_key() => Ok(self.advance_phase()),
            Phase::Trial => self.record_response(key),
            _ => Ok(Vec::new()),
        }
    }

    /// Moves past a text screen. Entering `Trial` starts the first presentation sequence.
    /// Leaving `Trial` only happens through [`finalize`](Self::finalize).
    pub fn advance_phase(&mut self) -> Vec<ExperimentEvent> {
        let mut events = Vec::new();
        if !self.phase.advances_on_any_key() {
            return events;
        }
        let Some(next) = self.phase.next() else {
            return events;
        };

        self.phase = next;
        info!(phase = ?next, "phase advanced");
        events.push(ExperimentEvent::PhaseChanged(next));

        if next.is_trial() {
            events.push(self.present_sequence());
        }
        events
    }

    /// Starts a trial on the white flash and arms the flash deadline.
    pub fn present_sequence(&mut self) -> ExperimentEvent {
        let now_ns = self.timer.now();
        let index = self.results.len() + 1;

        self.current = Some(Trial::new(index, self.config.reference_size_px, now_ns));
        self.display = Some(DisplayState::WhiteFlash);
        self.pending.arm(now_ns, self.config.flash_duration());

        debug!(trial = index, at_ns = now_ns, "white flash");
        ExperimentEvent::DisplayChanged(DisplayState::WhiteFlash)
    }

    /// Uniform over `reference ± jitter`, inclusive.
    pub fn randomize_size(&mut self) -> u32 {
        self.rng.random_range(self.config.size_range())
    }

    /// Fires the pending deadline if it is due. Call once per frame.
    pub fn update(&mut self) -> Vec<ExperimentEvent> {
        let mut events = Vec::new();
        if !self.phase.is_trial() {
            return events;
        }

        let now_ns = self.timer.now();
        if !self.pending.poll(now_ns) {
            return events;
        }

        match self.display {
            Some(DisplayState::WhiteFlash) => {
                let size = self.randomize_size();
                if let Some(trial) = &mut self.current {
                    trial.presented_size_px = size;
                    trial.timestamps.reference_start = Some(now_ns);
                }
                self.display = Some(DisplayState::ReferenceMap);
                self.pending.arm(now_ns, self.config.reference_duration());
                debug!(size_px = size, at_ns = now_ns, "reference map shown");
                events.push(ExperimentEvent::DisplayChanged(DisplayState::ReferenceMap));
            }
            Some(DisplayState::ReferenceMap) => {
                if let Some(trial) = &mut self.current {
                    trial.timestamps.altered_start = Some(now_ns);
                    info!(
                        trial = trial.index,
                        size_px = trial.presented_size_px,
                        at_ns = now_ns,
                        "altered map shown"
                    );
                }
                self.display = Some(DisplayState::AlteredMap);
                events.push(ExperimentEvent::DisplayChanged(DisplayState::AlteredMap));
            }
            Some(DisplayState::AlteredMap) | None => {}
        }
        events
    }

    /// Records the judgment for the trial on screen. Only the configured bigger/smaller
    /// keys count, and only while the altered map is showing.
    pub fn record_response(&mut self, key: Key) -> Result<Vec<ExperimentEvent>, ExperimentError> {
        let mut events = Vec::new();
        if !self.display.is_some_and(|d| d.accepts_response()) {
            return Ok(events);
        }
        let Some(response) = self.response_for(key) else {
            return Ok(events);
        };
        let Some(trial) = self.current.take() else {
            return Ok(events);
        };

        let now_ns = self.timer.now();
        let shown_at = trial.timestamps.altered_start.unwrap_or(now_ns);
        let reaction_time_s = Duration::from_nanos(now_ns.saturating_sub(shown_at)).as_secs_f64();

        let record = TrialRecord {
            trial_index: trial.index,
            response,
            reaction_time_s,
            presented_size_px: trial.presented_size_px,
            percent_difference: PercentDifference::between(
                self.config.reference_size_px,
                trial.presented_size_px,
            ),
        };
        info!(
            trial = record.trial_index,
            response = %record.response,
            rt_s = record.reaction_time_s,
            difference = %record.percent_difference,
            "response recorded"
        );
        self.results.push(record);
        events.push(ExperimentEvent::ResponseRecorded {
            trial_index: trial.index,
            response,
            reaction_time_s,
        });

        if self.results.len() >= self.config.max_trials {
            events.extend(self.finalize()?);
        } else {
            events.push(self.present_sequence());
        }
        Ok(events)
    }

    /// Ends the session once every trial is complete and hands the records to the
    /// exporter. Subsequent calls do nothing.
    pub fn finalize(&mut self) -> Result<Vec<ExperimentEvent>, ExperimentError> {
        let mut events = Vec::new();
        if self.exported || self.results.len() < self.config.max_trials {
            return Ok(events);
        }

        self.phase = Phase::Done;
        self.display = None;
        self.current = None;
        self.pending.cancel();
        self.exported = true;
        info!(trials = self.results.len(), "experiment finished");
        events.push(ExperimentEvent::PhaseChanged(Phase::Done));

        self.exporter.export(&self.results)?;
        events.push(ExperimentEvent::Finished);
        Ok(events)
    }

    fn response_for(&self, key: Key) -> Option<Response> {
        if key.is_char(self.config.bigger_key) {
            Some(Response::Bigger)
        } else if key.is_char(self.config.smaller_key) {
            Some(Response::Smaller)
        } else {
            None
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn display_state(&self) -> Option<DisplayState> {
        self.display
    }

    /// What the surface should show right now.
    pub fn screen(&self) -> Screen {
        let presented = self
            .current
            .as_ref()
            .map_or(self.config.reference_size_px, |t| t.presented_size_px);
        Screen::resolve(
            self.phase,
            self.display,
            self.config.reference_size_px,
            presented,
        )
        .unwrap_or_else(|| {
            unreachable!(
                "controller paired {:?} with {:?}",
                self.phase, self.display
            )
        })
    }

    pub fn current_trial(&self) -> Option<&Trial<u64>> {
        self.current.as_ref()
    }

    pub fn presented_size_px(&self) -> Option<u32> {
        self.current.as_ref().map(|t| t.presented_size_px)
    }

    pub fn results(&self) -> &[TrialRecord] {
        &self.results
    }

    pub fn completed_trials(&self) -> usize {
        self.results.len()
    }

    /// `(current, total)` while trials are running.
    pub fn trial_progress(&self) -> Option<(usize, usize)> {
        self.phase
            .is_trial()
            .then(|| (self.results.len() + 1, self.config.max_trials))
    }

    pub fn is_finished(&self) -> bool {
        self.phase.is_done()
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    pub fn exporter(&self) -> &E {
        &self.exporter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExportError;
    use mapsize_timing::ManualTimer;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[derive(Default)]
    struct NullExporter;

    impl Exporter for NullExporter {
        fn export(&mut self, _records: &[TrialRecord]) -> Result<(), ExportError> {
            Ok(())
        }
    }

    fn controller() -> (
        TrialController<ManualTimer, StdRng, NullExporter>,
        ManualTimer,
    ) {
        let clock = ManualTimer::new();
        let ctrl = TrialController::new(
            ExperimentConfig::default(),
            clock.clone(),
            StdRng::seed_from_u64(7),
            NullExporter,
        );
        (ctrl, clock)
    }

    #[test]
    fn randomized_sizes_stay_in_range() {
        let (mut ctrl, _) = controller();
        let mut seen_low = false;
        let mut seen_high = false;
        for _ in 0..20_000 {
            let size = ctrl.randomize_size();
            assert!((250..=350).contains(&size), "size {size} out of range");
            seen_low |= size == 250;
            seen_high |= size == 350;
        }
        assert!(seen_low && seen_high, "both bounds are reachable");
    }

    #[test]
    fn starts_on_intro_without_display() {
        let (ctrl, _) = controller();
        assert_eq!(ctrl.phase(), Phase::Intro);
        assert_eq!(ctrl.display_state(), None);
        assert_eq!(ctrl.screen(), Screen::Intro);
        assert_eq!(ctrl.trial_progress(), None);
    }

    #[test]
    fn entering_trial_starts_on_white_flash() {
        let (mut ctrl, _) = controller();
        ctrl.advance_phase();
        let events = ctrl.advance_phase();
        assert_eq!(
            events,
            vec![
                ExperimentEvent::PhaseChanged(Phase::Trial),
                ExperimentEvent::DisplayChanged(DisplayState::WhiteFlash),
            ]
        );
        assert_eq!(ctrl.screen(), Screen::WhiteFlash);
        assert_eq!(ctrl.trial_progress(), Some((1, 5)));
    }

    #[test]
    fn advance_phase_never_leaves_trial() {
        let (mut ctrl, _) = controller();
        ctrl.advance_phase();
        ctrl.advance_phase();
        assert!(ctrl.advance_phase().is_empty());
        assert_eq!(ctrl.phase(), Phase::Trial);
    }

    #[test]
    fn finalize_before_last_trial_is_a_no_op() {
        let (mut ctrl, _) = controller();
        assert!(ctrl.finalize().unwrap().is_empty());
        assert_eq!(ctrl.phase(), Phase::Intro);
    }

    #[test]
    fn reference_map_is_shown_at_reference_height() {
        let (mut ctrl, clock) = controller();
        ctrl.advance_phase();
        ctrl.advance_phase();
        clock.advance(Duration::from_millis(300));
        ctrl.update();
        assert_eq!(ctrl.screen(), Screen::Map { height_px: 300 });
        let presented = ctrl.presented_size_px().unwrap();
        assert!((250..=350).contains(&presented));
    }
}
