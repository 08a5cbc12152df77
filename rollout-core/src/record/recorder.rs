use super::Record;

/// Writes a record to an output destination with [`Recorder::write`].
///
/// [`Rollout`](crate::Rollout) writes a record at the end of every episode and,
/// optionally, at every decision.
pub trait Recorder {
    /// Write a record to the [`Recorder`].
    fn write(&mut self, record: Record);
}
