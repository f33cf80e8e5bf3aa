use crate::animation::values::Interpolatable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpolationMode {
    Linear,
    Step,
    CubicSpline,
}

/// Maximum number of keyframes scanned linearly from the cursor before
/// falling back to a binary search.
const MAX_SCAN_OFFSET: usize = 3;

/// Per-consumer sampling cursor.
///
/// Remembers the last hit keyframe so sequential playback resolves the next
/// sample in O(1); scrub jumps fall back to a global binary search.
#[derive(Debug, Clone, Default)]
pub struct KeyframeCursor {
    pub last_index: usize,
}

#[derive(Debug, Clone)]
pub struct KeyframeTrack<T: Interpolatable> {
    pub times: Vec<f32>,
    /// For `CubicSpline`, length is `times.len() * 3` and each keyframe is
    /// packed as `[in-tangent, value, out-tangent]`.
    pub values: Vec<T>,
    pub interpolation: InterpolationMode,
}

impl<T: Interpolatable> KeyframeTrack<T> {
    #[must_use]
    pub fn new(times: Vec<f32>, values: Vec<T>, interpolation: InterpolationMode) -> Self {
        Self {
            times,
            values,
            interpolation,
        }
    }

    /// Returns the time of the last keyframe, or 0 for a static track.
    #[must_use]
    pub fn end_time(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }

    /// Stateless sampling via binary search.
    #[must_use]
    pub fn sample(&self, time: f32) -> T {
        assert!(!self.times.is_empty(), "empty keyframe track");
        self.sample_at_frame(self.locate(time), time)
    }

    /// Sampling with cursor reuse; the cursor is updated in place.
    pub fn sample_with_cursor(&self, time: f32, cursor: &mut KeyframeCursor) -> T {
        if self.times.is_empty() {
            if let Some(val) = self.values.first() {
                return val.clone();
            }
            panic!("empty keyframe track");
        }
        // Fast path: static data (single keyframe)
        if self.times.len() == 1 {
            return self.get_value_at(0).clone();
        }

        let index = self
            .scan_near_cursor(time, cursor.last_index)
            .unwrap_or_else(|| self.locate(time));
        cursor.last_index = index;

        self.sample_at_frame(index, time)
    }

    /// Global binary search for the keyframe at or before `time`.
    /// `partition_point` yields the first index with t > time.
    fn locate(&self, time: f32) -> usize {
        self.times.partition_point(|&t| t <= time).saturating_sub(1)
    }

    /// Resolves `time` by scanning at most `MAX_SCAN_OFFSET` intervals out
    /// from the cursor. `None` means the jump was too large for a local
    /// scan and the caller should fall back to [`Self::locate`].
    fn scan_near_cursor(&self, time: f32, start: usize) -> Option<usize> {
        let len = self.times.len();
        // A stale cursor (track swapped underneath it) clamps into range
        let start = start.min(len - 1);

        if time >= self.times[start] {
            // Sequential playback: walk intervals to the right.
            for offset in 0..=MAX_SCAN_OFFSET {
                let idx = start + offset;
                if idx >= len - 1 {
                    return (time >= self.times[len - 1]).then_some(len - 1);
                }
                if time < self.times[idx + 1] {
                    return Some(idx);
                }
            }
        } else {
            // Rewind: walk intervals to the left.
            for offset in 0..=MAX_SCAN_OFFSET {
                let idx = start.checked_sub(offset)?;
                if time >= self.times[idx] {
                    return Some(idx);
                }
            }
        }
        None
    }

    /// Unified value accessor. For Linear/Step the index maps directly; for
    /// CubicSpline the value sits at `index * 3 + 1`.
    fn get_value_at(&self, index: usize) -> &T {
        match self.interpolation {
            InterpolationMode::CubicSpline => &self.values[index * 3 + 1],
            _ => &self.values[index],
        }
    }

    /// Interpolates within the interval starting at `index`. An `index` at
    /// or past the final keyframe clamps to the last value.
    fn sample_at_frame(&self, index: usize, time: f32) -> T {
        let len = self.times.len();
        if index >= len - 1 {
            return self.get_value_at(len - 1).clone();
        }

        let next = index + 1;
        let span = self.times[next] - self.times[index];
        let t = if span > 1e-6 {
            ((time - self.times[index]) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };

        match self.interpolation {
            InterpolationMode::Step => self.get_value_at(index).clone(),
            InterpolationMode::Linear => {
                T::interpolate_linear(self.get_value_at(index), self.get_value_at(next), t)
            }
            InterpolationMode::CubicSpline => {
                // Packed triplets: [in-tangent, value, out-tangent] per key
                let from = index * 3;
                let to = next * 3;
                T::interpolate_cubic(
                    &self.values[from + 1],
                    &self.values[from + 2],
                    &self.values[to],
                    &self.values[to + 1],
                    t,
                    span,
                )
            }
        }
    }
}
