use crate::error::Error;
use crate::joint::{ArmStates, Joint, JointState};

use log::info;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

const LEGEND: &str = "pt, angle, v";

/// Per-frame snapshots of the tracked joints over a recording.
///
/// Frames are calculated as a prefix: once a frame is absent every later
/// frame is absent too. Snapshots are copies, so editing the live skeleton
/// never alters recorded frames.
#[derive(Debug, Clone)]
pub struct StateHistory {
    frames: Vec<Option<ArmStates>>,
}

impl StateHistory {
    pub fn new(frame_count: usize) -> Self {
        Self {
            frames: vec![None; frame_count],
        }
    }

    /// Number of frames in the recording.
    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Length of the calculated prefix.
    #[inline]
    pub fn calculated(&self) -> usize {
        self.frames
            .iter()
            .position(Option::is_none)
            .unwrap_or(self.frames.len())
    }

    #[inline]
    pub fn is_calculated(&self, frame: usize) -> bool {
        frame < self.calculated()
    }

    /// Recorded states of `frame`.
    ///
    /// Frames past the calculated prefix are reported as `HistoryGap`, even
    /// if a stale entry exists there.
    pub fn get(&self, frame: usize) -> Result<&ArmStates, Error> {
        if frame >= self.frames.len() {
            return Err(Error::FrameOutOfRange {
                frame,
                len: self.frames.len(),
            });
        }

        let calculated = self.calculated();

        match &self.frames[frame] {
            Some(states) if frame < calculated => Ok(states),
            _ => Err(Error::HistoryGap { frame, calculated }),
        }
    }

    #[inline]
    pub fn state(&self, frame: usize, joint: Joint) -> Result<Option<&JointState>, Error> {
        Ok(self.get(frame)?.get(joint))
    }

    /// Appends `states` at `frame` unless that frame is already recorded.
    ///
    /// Returns whether the frame was written. Only the frame right after the
    /// calculated prefix can be appended.
    pub fn record_frame(&mut self, frame: usize, states: ArmStates) -> Result<bool, Error> {
        let calculated = self.check_frame(frame)?;

        if frame < calculated {
            return Ok(false);
        }

        self.frames[frame] = Some(states);

        Ok(true)
    }

    /// Replaces `frame` with edited states and invalidates every later frame.
    pub fn record_edit(&mut self, frame: usize, states: ArmStates) -> Result<(), Error> {
        self.check_frame(frame)?;
        self.frames[frame] = Some(states);
        self.truncate_after(frame);

        Ok(())
    }

    /// Drops every frame after `frame`.
    pub fn truncate_after(&mut self, frame: usize) {
        let from = (frame + 1).min(self.frames.len());
        let dropped = self.frames[from..].iter().filter(|f| f.is_some()).count();

        self.frames[from..].iter_mut().for_each(|f| *f = None);

        if dropped > 0 {
            info!(
                target: "armtrack::history",
                "invalidated {} frame(s) after frame {}",
                dropped,
                frame
            );
        }
    }

    fn check_frame(&self, frame: usize) -> Result<usize, Error> {
        if frame >= self.frames.len() {
            return Err(Error::FrameOutOfRange {
                frame,
                len: self.frames.len(),
            });
        }

        let calculated = self.calculated();

        if frame > calculated {
            return Err(Error::HistoryGap { frame, calculated });
        }

        Ok(calculated)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ArmStates> {
        self.frames.iter().map_while(Option::as_ref)
    }

    /// One line per calculated frame: for each tracked joint its position,
    /// angles and velocity.
    pub fn dump(&self) -> String {
        self.iter()
            .map(|states| {
                let mut line: String = states
                    .iter()
                    .flat_map(|(_, state)| state.to_row())
                    .map(|v| format!("{:.6} ", v))
                    .collect();

                line.push('\n');
                line
            })
            .collect()
    }

    pub fn write_to<W: Write>(&self, mut w: W) -> io::Result<()> {
        let names: Vec<_> = Joint::TRACKED.iter().map(Joint::name).collect();

        writeln!(w, "{}", names.join(" "))?;
        writeln!(w, "{}", LEGEND)?;
        w.write_all(self.dump().as_bytes())?;
        w.flush()
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let file = File::create(path)?;

        self.write_to(BufWriter::new(file))?;

        Ok(())
    }

    /// Parses what `write_to` produced into a history of `frame_count` frames.
    pub fn read_from<R: BufRead>(reader: R, frame_count: usize) -> Result<Self, Error> {
        let mut lines = reader.lines();

        let header = lines.next().transpose()?.ok_or_else(|| Error::Parse {
            line: 1,
            message: "missing header".into(),
        })?;

        for (idx, name) in header.split_whitespace().enumerate() {
            if Joint::TRACKED.get(idx).map(Joint::name) != Some(name) {
                return Err(Error::Parse {
                    line: 1,
                    message: format!("unexpected joint column `{}`", name),
                });
            }
        }

        if header.split_whitespace().count() != Joint::TRACKED.len() {
            return Err(Error::Parse {
                line: 1,
                message: "wrong number of joint columns".into(),
            });
        }

        lines.next().transpose()?;

        let mut history = Self::new(frame_count);
        let mut frame = 0;

        for (idx, line) in lines.enumerate() {
            let line = line?;
            let lineno = idx + 3;

            if line.trim().is_empty() {
                continue;
            }

            let values = line
                .split_whitespace()
                .map(str::parse::<f64>)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| Error::Parse {
                    line: lineno,
                    message: e.to_string(),
                })?;

            let rows: Vec<_> = values
                .chunks_exact(7)
                .map(|chunk| {
                    let mut row = [0.0; 7];
                    row.copy_from_slice(chunk);
                    JointState::from_row(&row)
                })
                .collect();

            let states = <[JointState; 4]>::try_from(rows)
                .ok()
                .filter(|_| values.len() == 7 * Joint::TRACKED.len())
                .ok_or_else(|| Error::Parse {
                    line: lineno,
                    message: format!(
                        "expected {} values, got {}",
                        7 * Joint::TRACKED.len(),
                        values.len()
                    ),
                })?;

            history.record_frame(frame, ArmStates::new(states))?;
            frame += 1;
        }

        Ok(history)
    }

    pub fn load<P: AsRef<Path>>(path: P, frame_count: usize) -> Result<Self, Error> {
        let file = File::open(path)?;

        Self::read_from(BufReader::new(file), frame_count)
    }
}
