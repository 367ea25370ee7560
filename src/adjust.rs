use crate::error::Error;
use crate::history::StateHistory;
use crate::joint::{Joint, JointState, Segment, Side};
use crate::skeleton::Skeleton;

use log::{info, warn};

/// Operator correction of one elbow or wrist at a paused frame.
///
/// The dragged position goes through the joint's own motion filter, so a
/// correction is clamped and smoothed exactly like an automatic fit. Moving
/// an elbow carries the wrist along rigidly.
pub struct ManualAdjustment<'a> {
    skeleton: &'a mut Skeleton,
    history: &'a mut StateHistory,
    frame: usize,
    joint: Joint,
    side: Side,
    segment: Segment,
}

impl<'a> ManualAdjustment<'a> {
    pub fn new(
        skeleton: &'a mut Skeleton,
        history: &'a mut StateHistory,
        frame: usize,
        joint: Joint,
    ) -> Result<Self, Error> {
        if !skeleton.is_initialized() {
            return Err(Error::Uninitialized);
        }

        let (side, segment) = match (joint.side(), joint.segment()) {
            (Some(side), Some(segment)) => (side, segment),
            _ => return Err(Error::NotAdjustable(joint)),
        };

        Ok(Self {
            skeleton,
            history,
            frame,
            joint,
            side,
            segment,
        })
    }

    #[inline]
    pub fn joint(&self) -> Joint {
        self.joint
    }

    #[inline]
    pub fn side(&self) -> Side {
        self.side
    }

    #[inline]
    pub fn frame(&self) -> usize {
        self.frame
    }

    #[inline]
    pub fn skeleton(&self) -> &Skeleton {
        &*self.skeleton
    }

    /// Moves the joint toward the cursor at `(px, py)` with hovered `depth`.
    ///
    /// A cursor over a pixel without depth leaves the joint where it is.
    pub fn update_position(&mut self, px: f64, py: f64, depth: f64) -> Result<JointState, Error> {
        if depth <= 0.0 {
            warn!(
                target: "armtrack::adjust",
                "no depth under cursor at ({:.0}, {:.0}), {} not moved",
                px,
                py,
                self.joint
            );

            return self
                .skeleton
                .state(self.joint)
                .copied()
                .ok_or(Error::Uninitialized);
        }

        let target = self.skeleton.transform().image_to_world(px, py, depth);
        let anchor = self.skeleton.position(self.segment.anchor());
        let dependent = self
            .segment
            .dependent()
            .map(|dep| (dep, self.skeleton.position(dep)));

        let filter = self.skeleton.filter_mut(self.segment)?;
        let position = filter.update(target, anchor);
        let state = JointState::new(position, filter.angles(), filter.velocity());
        let carried = dependent.map(|(dep, pt)| (dep, filter.project(pt, anchor)));

        self.skeleton.place(self.joint, state)?;

        if let Some((dep, pt)) = carried {
            self.skeleton.carry(dep, pt)?;
        }

        Ok(state)
    }

    /// Commits the corrected skeleton at this frame and invalidates every
    /// later frame, which depended on the replaced states.
    pub fn finish(self) -> Result<(), Error> {
        let states = *self.skeleton.states()?;

        self.history.record_edit(self.frame, states)?;

        info!(
            target: "armtrack::adjust",
            "{} corrected at frame {}",
            self.joint,
            self.frame
        );

        Ok(())
    }
}
