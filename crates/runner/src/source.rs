//! Step sources: where a worker's observations come from.
//!
//! The transport engine itself is out of scope; a [`StepSource`] is the seam
//! it plugs into. [`ReplaySource`] replays in-memory observations and
//! [`TraceSource`] reads recorded JSONL traces (one [`RawStep`] per line).
//!
//! Both honor termination requests: once `terminate(track)` is called, no
//! further steps of that track are produced, which is what the engine does
//! when the classifier asks it to kill a track.

use std::collections::{HashSet, VecDeque};
use std::io::BufRead;

use tally_core::StepMapper;
use types::{RawStep, StepObservation, TrackId};

use crate::error::SourceError;

/// A stream of step observations for one worker.
pub trait StepSource {
    /// Next observation, or `None` once the stream is exhausted.
    fn next_step(&mut self) -> Result<Option<StepObservation>, SourceError>;

    /// Stop producing steps for `track`.
    fn terminate(&mut self, track: TrackId);
}

impl<S: StepSource + ?Sized> StepSource for Box<S> {
    fn next_step(&mut self) -> Result<Option<StepObservation>, SourceError> {
        (**self).next_step()
    }

    fn terminate(&mut self, track: TrackId) {
        (**self).terminate(track)
    }
}

// =============================================================================
// ReplaySource
// =============================================================================

/// Replays a fixed list of observations in order.
#[derive(Debug, Clone, Default)]
pub struct ReplaySource {
    steps: VecDeque<StepObservation>,
    terminated: HashSet<TrackId>,
}

impl ReplaySource {
    pub fn new(steps: impl IntoIterator<Item = StepObservation>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            terminated: HashSet::new(),
        }
    }
}

impl StepSource for ReplaySource {
    fn next_step(&mut self) -> Result<Option<StepObservation>, SourceError> {
        while let Some(step) = self.steps.pop_front() {
            if !self.terminated.contains(&step.track) {
                return Ok(Some(step));
            }
        }
        Ok(None)
    }

    fn terminate(&mut self, track: TrackId) {
        self.terminated.insert(track);
    }
}

// =============================================================================
// TraceSource
// =============================================================================

/// Reads a JSONL step trace, mapping engine names as it goes.
///
/// Blank lines are skipped. Line numbers in errors are 1-based.
pub struct TraceSource<R> {
    reader: R,
    mapper: StepMapper,
    terminated: HashSet<TrackId>,
    line: usize,
    buf: String,
}

impl<R: BufRead> TraceSource<R> {
    pub fn new(reader: R, mapper: StepMapper) -> Self {
        Self {
            reader,
            mapper,
            terminated: HashSet::new(),
            line: 0,
            buf: String::new(),
        }
    }

    /// Number of lines consumed so far.
    pub fn lines_read(&self) -> usize {
        self.line
    }
}

impl<R: BufRead> StepSource for TraceSource<R> {
    fn next_step(&mut self) -> Result<Option<StepObservation>, SourceError> {
        loop {
            self.buf.clear();
            if self.reader.read_line(&mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line += 1;

            let text = self.buf.trim();
            if text.is_empty() {
                continue;
            }

            let raw: RawStep = serde_json::from_str(text).map_err(|source| {
                SourceError::Decode {
                    line: self.line,
                    source,
                }
            })?;
            if self.terminated.contains(&TrackId(raw.track_id)) {
                continue;
            }

            let obs = self.mapper.map(&raw).map_err(|source| SourceError::Mapping {
                line: self.line,
                source,
            })?;
            return Ok(Some(obs));
        }
    }

    fn terminate(&mut self, track: TrackId) {
        self.terminated.insert(track);
    }
}

impl<R> std::fmt::Debug for TraceSource<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraceSource")
            .field("line", &self.line)
            .field("terminated", &self.terminated.len())
            .finish()
    }
}
