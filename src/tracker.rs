use crate::adjust::ManualAdjustment;
use crate::error::Error;
use crate::frame::Frame;
use crate::history::StateHistory;
use crate::joint::{ArmStates, Joint};
use crate::skeleton::Skeleton;

use log::debug;

/// Tracking session over a recording of known length.
///
/// Owns the live skeleton and the history. Frames already in the calculated
/// prefix are replayed from history instead of being fitted again.
pub struct ArmTracker {
    skeleton: Skeleton,
    history: StateHistory,
    current: usize,
}

impl ArmTracker {
    pub fn new(skeleton: Skeleton, frame_count: usize) -> Result<Self, Error> {
        Self::with_history(skeleton, StateHistory::new(frame_count))
    }

    /// Resumes a session from a previously saved history.
    pub fn with_history(skeleton: Skeleton, history: StateHistory) -> Result<Self, Error> {
        if !skeleton.is_initialized() {
            return Err(Error::Uninitialized);
        }

        Ok(Self {
            skeleton,
            history,
            current: 0,
        })
    }

    #[inline]
    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    #[inline]
    pub fn history(&self) -> &StateHistory {
        &self.history
    }

    #[inline]
    pub fn current_frame(&self) -> usize {
        self.current
    }

    #[inline]
    pub fn frame_count(&self) -> usize {
        self.history.len()
    }

    /// States for `frame_index`: replayed when already calculated, fitted
    /// and recorded otherwise.
    ///
    /// A new frame is always fitted from the recorded states of the frame
    /// before it, whatever the skeleton was showing last.
    pub fn process(&mut self, frame_index: usize, frame: &Frame) -> Result<ArmStates, Error> {
        let states = if self.history.is_calculated(frame_index) {
            let states = self.restore(frame_index)?;

            debug!(target: "armtrack::tracker", "frame {} replayed from history", frame_index);

            states
        } else {
            // fitting past the prefix would leave a hole in history
            let calculated = self.history.calculated();
            if frame_index > calculated {
                return Err(Error::HistoryGap {
                    frame: frame_index,
                    calculated,
                });
            }

            if let Some(prev) = frame_index.checked_sub(1) {
                self.restore(prev)?;
            }

            let states = self.skeleton.fit(frame)?;
            self.history.record_frame(frame_index, states)?;

            states
        };

        self.current = frame_index;

        Ok(states)
    }

    /// Loads the recorded states of `frame` into the skeleton.
    fn restore(&mut self, frame: usize) -> Result<ArmStates, Error> {
        let states = *self.history.get(frame)?;

        for (joint, state) in states.iter() {
            self.skeleton.set_state(joint, *state)?;
        }

        Ok(states)
    }

    /// Moves to `frame`, clamped to the first frame not yet calculated.
    pub fn seek(&mut self, frame: usize) -> usize {
        let limit = self
            .history
            .calculated()
            .min(self.history.len().saturating_sub(1));

        self.current = frame.min(limit);
        self.current
    }

    /// Tracked joint under a click at `(px, py)`.
    #[inline]
    pub fn joint_at(&self, px: i64, py: i64) -> Option<Joint> {
        self.skeleton.joint_at(px, py)
    }

    /// Starts correcting `joint` at the recorded `frame`.
    ///
    /// Every frame after `frame` is dropped from history. The skeleton is
    /// restored to the recorded states of `frame`, except the corrected joint,
    /// which gets its state from the frame before so the correction is
    /// filtered against the last accepted motion.
    pub fn begin_adjustment(
        &mut self,
        frame: usize,
        joint: Joint,
    ) -> Result<ManualAdjustment<'_>, Error> {
        if joint.segment().is_none() {
            return Err(Error::NotAdjustable(joint));
        }

        self.history.get(frame)?;
        let previous = match frame.checked_sub(1) {
            Some(prev) => self.history.state(prev, joint)?.copied(),
            None => None,
        };

        self.restore(frame)?;
        self.history.truncate_after(frame);

        if let Some(state) = previous {
            self.skeleton.set_state(joint, state)?;
        }

        self.current = frame;

        ManualAdjustment::new(&mut self.skeleton, &mut self.history, frame, joint)
    }
}
