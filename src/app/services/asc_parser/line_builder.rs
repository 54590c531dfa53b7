//! Sentinel-delimited vertex run assembly
//!
//! Explicit two-state machine (`Idle`, `Collecting`) over the record stream
//! of a line category file. Transitions: Idle→Collecting on a start
//! sentinel (discarding any stray buffer), Collecting→Idle on an end
//! sentinel (flushing runs of two or more vertices), Collecting→Collecting
//! on a vertex. A malformed record abandons the current run back to Idle
//! without flushing, so a line is never emitted with a silently missing
//! vertex.

use crate::app::models::{AxisFlag, ExtentTracker, Vertex};

use super::record::AscRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Collecting,
}

/// Outcome of feeding one record into the builder
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// Nothing to report
    None,
    /// A completed run of two or more vertices, with its extent class
    Flushed {
        vertices: Vec<Vertex>,
        axis_flag: AxisFlag,
    },
    /// A start sentinel discarded an unterminated in-progress run
    DiscardedUnterminated { vertices: usize },
    /// An end sentinel closed a run of fewer than two vertices
    DiscardedShort { vertices: usize },
    /// A malformed record abandoned the current run
    AbandonedRun { vertices: usize },
    /// A vertex arrived outside any run
    StrayVertex,
    /// An end sentinel arrived outside any run
    StrayEnd,
}

/// Assembles vertex runs from the record stream of one line file
#[derive(Debug)]
pub struct LineBuilder {
    state: State,
    buffer: Vec<Vertex>,
    run_extent: ExtentTracker,
    epsilon: f64,
}

impl LineBuilder {
    pub fn new(epsilon: f64) -> Self {
        Self {
            state: State::Idle,
            buffer: Vec::new(),
            run_extent: ExtentTracker::new(),
            epsilon,
        }
    }

    /// Advance the state machine with one record
    pub fn feed(&mut self, record: &AscRecord) -> FeedEvent {
        match (self.state, record) {
            (_, AscRecord::Blank) => FeedEvent::None,

            (State::Idle, AscRecord::SentinelStart) => {
                self.begin_run();
                FeedEvent::None
            }
            (State::Collecting, AscRecord::SentinelStart) => {
                let dropped = self.buffer.len();
                self.begin_run();
                if dropped > 0 {
                    FeedEvent::DiscardedUnterminated { vertices: dropped }
                } else {
                    FeedEvent::None
                }
            }

            (State::Collecting, AscRecord::Vertex(vertex)) => {
                self.run_extent.update(vertex.x, vertex.y);
                self.buffer.push(*vertex);
                FeedEvent::None
            }
            (State::Idle, AscRecord::Vertex(_)) => FeedEvent::StrayVertex,

            (State::Collecting, AscRecord::SentinelEnd) => {
                let vertices = std::mem::take(&mut self.buffer);
                let axis_flag = self.run_extent.classify(self.epsilon);
                self.end_run();
                if vertices.len() < 2 {
                    FeedEvent::DiscardedShort {
                        vertices: vertices.len(),
                    }
                } else {
                    FeedEvent::Flushed { vertices, axis_flag }
                }
            }
            (State::Idle, AscRecord::SentinelEnd) => FeedEvent::StrayEnd,

            (State::Collecting, AscRecord::Malformed(_)) => {
                let dropped = self.buffer.len();
                self.end_run();
                FeedEvent::AbandonedRun { vertices: dropped }
            }
            (State::Idle, AscRecord::Malformed(_)) => FeedEvent::None,
        }
    }

    /// Close the stream at end of file
    ///
    /// An unterminated run still buffered at EOF is dropped, never flushed.
    pub fn finish(&mut self) -> FeedEvent {
        let dropped = self.buffer.len();
        let was_collecting = self.state == State::Collecting;
        self.end_run();
        if was_collecting && dropped > 0 {
            FeedEvent::DiscardedUnterminated { vertices: dropped }
        } else {
            FeedEvent::None
        }
    }

    fn begin_run(&mut self) {
        self.state = State::Collecting;
        self.buffer.clear();
        self.run_extent.reset();
    }

    fn end_run(&mut self) {
        self.state = State::Idle;
        self.buffer.clear();
        self.run_extent.reset();
    }
}
