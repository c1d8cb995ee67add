use super::StreamEntry;
use rand::Rng;

/// Decides whether a claimed entry is processed or left pending
///
/// Rejected entries are neither written nor acknowledged and thus remain in the
/// pending entries list, which makes this a hook for exercising recovery paths.
pub trait Admission: Send + Sync {
    /// Returns `true` if the entry should be processed
    fn admit(&self, entry: &StreamEntry) -> bool;
}

/// Processes every entry
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysAdmit;

impl Admission for AlwaysAdmit {
    fn admit(&self, _entry: &StreamEntry) -> bool {
        true
    }
}

/// Randomly rejects a fraction of all entries
#[derive(Debug, Clone, Copy)]
pub struct RandomRejection {
    rate: f64,
}

impl RandomRejection {
    /// Creates a new instance rejecting entries with the given probability (clamped to `0.0..=1.0`)
    pub fn new(rate: f64) -> Self {
        let rate = if rate.is_nan() { 0.0 } else { rate.clamp(0.0, 1.0) };
        Self { rate }
    }

    /// Probability with which entries are rejected
    pub fn rate(&self) -> f64 {
        self.rate
    }
}

impl Admission for RandomRejection {
    fn admit(&self, _entry: &StreamEntry) -> bool {
        !rand::thread_rng().gen_bool(self.rate)
    }
}

/// Admits entries for which a predicate holds
pub struct AdmissionPredicate<F>(pub F);

impl<F> Admission for AdmissionPredicate<F>
where
    F: Fn(&StreamEntry) -> bool + Send + Sync,
{
    fn admit(&self, entry: &StreamEntry) -> bool {
        (self.0)(entry)
    }
}
