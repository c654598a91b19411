use crate::recording::Recording;
use crate::sample::Trajectory;
use crate::stream::SampleBatch;
use crate::traits::BatchSource;

/// Samples per batch when replaying, matching the device simulator.
pub const DEFAULT_CHUNK: usize = 5;

/// Replays a stored trajectory in fixed-size batches.
#[derive(Debug, Clone)]
pub struct PlaybackSource {
    data: Trajectory,
    cursor: usize,
    chunk: usize,
}

impl PlaybackSource {
    pub fn new(data: Trajectory, chunk: usize) -> Self {
        Self {
            data,
            cursor: 0,
            chunk: chunk.max(1),
        }
    }

    pub fn from_recording(recording: &Recording) -> Self {
        Self::new(recording.data.clone(), DEFAULT_CHUNK)
    }

    /// Moves the cursor; positions past the end exhaust the source.
    pub fn seek(&mut self, index: usize) {
        self.cursor = index.min(self.data.len());
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.cursor
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.data.len()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl BatchSource for PlaybackSource {
    fn next_batch(&mut self) -> Option<SampleBatch> {
        if self.is_finished() {
            return None;
        }
        let end = (self.cursor + self.chunk).min(self.data.len());
        let samples = self.data[self.cursor..end].to_vec();
        self.cursor = end;
        Some(SampleBatch::new(samples))
    }
}
