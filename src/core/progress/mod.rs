//! # Progress Module
//!
//! Maps both phases onto one 0-100 scale and throttles emission.
//!
//! | Phase          | Slice      |
//! |----------------|------------|
//! | Fingerprinting | [0, 50)    |
//! | Clustering     | [50, 100]  |
//!
//! A phase reports `completed / total` of its own work; the reporter
//! scales that into the phase's slice and only emits when the overall
//! percentage has moved by at least one point since the last emission.

use crate::events::{Event, EventSender, Phase, ProgressUpdate};

/// Start and end of a phase's slice of the overall scale
pub fn phase_slice(phase: Phase) -> (u8, u8) {
    match phase {
        Phase::Fingerprinting => (0, 50),
        Phase::Clustering => (50, 100),
    }
}

/// Last percentage a phase may report.
///
/// Fingerprinting stops one short of its slice end so the first value
/// of the clustering slice is always emitted by clustering itself.
pub fn phase_ceiling(phase: Phase) -> u8 {
    let (_, end) = phase_slice(phase);
    match phase {
        Phase::Fingerprinting => end - 1,
        Phase::Clustering => end,
    }
}

/// Overall percentage for `completed` of `total` units within `phase`.
///
/// An empty phase (`total == 0`) counts as finished.
pub fn overall_percent(phase: Phase, completed: usize, total: usize) -> u8 {
    let (start, end) = phase_slice(phase);
    let ceiling = phase_ceiling(phase);
    if total == 0 {
        return ceiling;
    }
    let width = (end - start) as usize;
    let scaled = completed.min(total) * width / total;
    (start + scaled as u8).min(ceiling)
}

/// Throttles progress for a single run.
///
/// Holds only the last emitted percentage. Create one per run.
#[derive(Debug, Default)]
pub struct ProgressReporter {
    last_percent: Option<u8>,
}

impl ProgressReporter {
    /// Create a reporter that has emitted nothing yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the last emitted value
    pub fn reset(&mut self) {
        self.last_percent = None;
    }

    /// Last emitted percentage, if any
    pub fn last_percent(&self) -> Option<u8> {
        self.last_percent
    }

    /// Compute the update for this position, or `None` if it would not
    /// advance the overall percentage.
    pub fn update(
        &mut self,
        phase: Phase,
        completed: usize,
        total: usize,
    ) -> Option<ProgressUpdate> {
        let percent = overall_percent(phase, completed, total);
        if matches!(self.last_percent, Some(last) if percent <= last) {
            return None;
        }
        self.last_percent = Some(percent);
        Some(ProgressUpdate { percent, phase })
    }

    /// Like [`update`](Self::update), sending the result as an event
    pub fn report(&mut self, phase: Phase, completed: usize, total: usize, events: &EventSender) {
        if let Some(update) = self.update(phase, completed, total) {
            events.send(Event::Progress(update));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventChannel;

    #[test]
    fn fingerprinting_maps_to_lower_half() {
        assert_eq!(overall_percent(Phase::Fingerprinting, 0, 10), 0);
        assert_eq!(overall_percent(Phase::Fingerprinting, 5, 10), 25);
        assert_eq!(overall_percent(Phase::Fingerprinting, 9, 10), 45);
        assert_eq!(overall_percent(Phase::Fingerprinting, 10, 10), 49);
    }

    #[test]
    fn clustering_maps_to_upper_half() {
        assert_eq!(overall_percent(Phase::Clustering, 0, 4), 50);
        assert_eq!(overall_percent(Phase::Clustering, 2, 4), 75);
        assert_eq!(overall_percent(Phase::Clustering, 4, 4), 100);
    }

    #[test]
    fn empty_phase_is_complete() {
        assert_eq!(overall_percent(Phase::Fingerprinting, 0, 0), 49);
        assert_eq!(overall_percent(Phase::Clustering, 0, 0), 100);
    }

    #[test]
    fn clustering_opens_its_own_slice() {
        let mut reporter = ProgressReporter::new();
        let finished = reporter.update(Phase::Fingerprinting, 3, 3).unwrap();
        assert_eq!(finished.percent, 49);

        let opened = reporter.update(Phase::Clustering, 0, 2).unwrap();
        assert_eq!(
            opened,
            ProgressUpdate {
                percent: 50,
                phase: Phase::Clustering
            }
        );
    }

    #[test]
    fn updates_are_throttled_to_whole_percent_steps() {
        let mut reporter = ProgressReporter::new();
        let emitted: Vec<u8> = (0..=1000)
            .filter_map(|i| reporter.update(Phase::Fingerprinting, i, 1000))
            .map(|u| u.percent)
            .collect();

        // 0..=49, one event per distinct value
        assert_eq!(emitted.len(), 50);
        assert!(emitted.windows(2).all(|w| w[1] == w[0] + 1));
    }

    #[test]
    fn never_moves_backwards() {
        let mut reporter = ProgressReporter::new();
        assert!(reporter.update(Phase::Clustering, 1, 2).is_some());
        assert!(reporter.update(Phase::Fingerprinting, 1, 2).is_none());
        assert_eq!(reporter.last_percent(), Some(75));
    }

    #[test]
    fn reset_allows_reemission() {
        let mut reporter = ProgressReporter::new();
        reporter.update(Phase::Fingerprinting, 1, 2);
        reporter.reset();
        assert!(reporter.update(Phase::Fingerprinting, 1, 2).is_some());
    }

    #[test]
    fn report_sends_progress_event() {
        let (sender, receiver) = EventChannel::new();
        let mut reporter = ProgressReporter::new();

        reporter.report(Phase::Clustering, 1, 1, &sender);
        reporter.report(Phase::Clustering, 1, 1, &sender);
        drop(sender);

        let events: Vec<_> = receiver.iter().collect();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            Event::Progress(ProgressUpdate { percent: 100, phase: Phase::Clustering })
        ));
    }
}
