//! Decides when the assisting classifier should be refreshed.

/// Fires at most once per history length that is a multiple of the frequency.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RetrainScheduler {
    last_triggered: Option<usize>,
}

impl RetrainScheduler {
    /// Observe a history length after it changed.
    ///
    /// Returns true when a retrain request should be issued now. Repeated
    /// calls for the same length never fire twice. A frequency of zero is
    /// treated as one.
    pub fn on_history_changed(
        &mut self,
        length: usize,
        frequency: usize,
        has_existing_model: bool,
    ) -> bool {
        let frequency = frequency.max(1);
        if length % frequency != 0 {
            self.last_triggered = None;
            return false;
        }
        if !has_existing_model || length == 0 || self.last_triggered == Some(length) {
            return false;
        }
        self.last_triggered = Some(length);
        true
    }

    /// Re-arm after history shrank without ever issuing a request.
    pub fn on_history_shrunk(&mut self, length: usize, frequency: usize) {
        if length % frequency.max(1) != 0 {
            self.last_triggered = None;
        }
    }

    /// Length at which the last request was issued, while still armed against it.
    pub fn last_triggered(&self) -> Option<usize> {
        self.last_triggered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_per_threshold_crossing() {
        let mut scheduler = RetrainScheduler::default();
        let fired: Vec<usize> = (1..=25)
            .filter(|len| scheduler.on_history_changed(*len, 10, true))
            .collect();
        assert_eq!(fired, vec![10, 20]);
    }

    #[test]
    fn repeated_observation_of_same_length_does_not_refire() {
        let mut scheduler = RetrainScheduler::default();
        assert!(!scheduler.on_history_changed(9, 10, true));
        assert!(scheduler.on_history_changed(10, 10, true));
        assert!(!scheduler.on_history_changed(10, 10, true));
        assert!(!scheduler.on_history_changed(10, 10, true));
        assert_eq!(scheduler.last_triggered(), Some(10));
    }

    #[test]
    fn never_fires_without_existing_model() {
        let mut scheduler = RetrainScheduler::default();
        assert!((1..=30).all(|len| !scheduler.on_history_changed(len, 5, false)));
    }

    #[test]
    fn empty_history_never_fires() {
        let mut scheduler = RetrainScheduler::default();
        assert!(!scheduler.on_history_changed(0, 10, true));
    }

    #[test]
    fn zero_frequency_acts_as_every_change() {
        let mut scheduler = RetrainScheduler::default();
        assert!(scheduler.on_history_changed(1, 0, true));
        assert!(scheduler.on_history_changed(2, 0, true));
    }

    #[test]
    fn shrinking_below_threshold_rearms() {
        let mut scheduler = RetrainScheduler::default();
        assert!(scheduler.on_history_changed(10, 10, true));
        scheduler.on_history_shrunk(9, 10);
        assert!(scheduler.on_history_changed(10, 10, true));
    }
}
