//! Bezier motion paths owned by items.
//!
//! [`Path`] keeps the control points, editing operations that preserve the
//! anchor/tangent layout, and the baked (arc-length resampled) cache.

pub mod bezier;

use serde::{Deserialize, Serialize};

use crate::error::TransitionError;
use crate::math::{self, Quat, Vec3};

pub const DEFAULT_SAMPLING: usize = 25;

/// How positions along the path are computed at runtime.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathLerpMode {
    /// Lerp along the cached evenly spaced polyline.
    #[default]
    Baked,
    /// Evaluate the cubic chain every call.
    Dynamic,
}

/// Alignment axis used as "up" when orienting along the path.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathNormal {
    #[default]
    Up,
    Down,
    Left,
    Right,
    Forward,
    Back,
}

impl PathNormal {
    pub fn vector(self) -> Vec3 {
        match self {
            PathNormal::Up => [0.0, 1.0, 0.0],
            PathNormal::Down => [0.0, -1.0, 0.0],
            PathNormal::Left => [-1.0, 0.0, 0.0],
            PathNormal::Right => [1.0, 0.0, 0.0],
            PathNormal::Forward => [0.0, 0.0, 1.0],
            PathNormal::Back => [0.0, 0.0, -1.0],
        }
    }
}

/// Space the control points are expressed in, relative to the host's world
/// (usually the item's parent transform).
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathFrame {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for PathFrame {
    fn default() -> Self {
        Self {
            position: math::ZERO,
            rotation: math::IDENTITY,
        }
    }
}

impl PathFrame {
    pub fn to_world(&self, local: Vec3) -> Vec3 {
        math::add(math::rotate(self.rotation, local), self.position)
    }

    pub fn to_local(&self, world: Vec3) -> Vec3 {
        math::rotate(math::quat_conjugate(self.rotation), math::sub(world, self.position))
    }

    pub fn rotation_to_world(&self, local: Quat) -> Quat {
        math::quat_mul(self.rotation, local)
    }

    pub fn rotation_to_local(&self, world: Quat) -> Quat {
        math::quat_mul(math::quat_conjugate(self.rotation), world)
    }
}

/// Control points are validated on load; see [`Path::from_points`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PathRepr")]
pub struct Path {
    pub enabled: bool,
    points: Vec<Vec3>,
    looped: bool,
    auto_control: bool,
    smooth_factor: f32,
    resolution: u32,
    spacing: u32,
    lerp_mode: PathLerpMode,
    pub normal: PathNormal,
    pub frame: PathFrame,
    sampling: usize,
    #[serde(skip)]
    spaced: Vec<Vec3>,
}

impl Default for Path {
    fn default() -> Self {
        Path::with_points(vec![
            [-200.0, 0.0, 0.0],
            [-150.0, 0.0, 0.0],
            [150.0, 0.0, 0.0],
            [200.0, 0.0, 0.0],
        ])
    }
}

/// Serialized form of [`Path`], checked before it becomes one.
#[derive(Deserialize)]
#[serde(default)]
struct PathRepr {
    enabled: bool,
    points: Vec<Vec3>,
    looped: bool,
    auto_control: bool,
    smooth_factor: f32,
    resolution: u32,
    spacing: u32,
    lerp_mode: PathLerpMode,
    normal: PathNormal,
    frame: PathFrame,
    sampling: usize,
}

impl Default for PathRepr {
    fn default() -> Self {
        let path = Path::default();
        Self {
            enabled: path.enabled,
            points: path.points,
            looped: path.looped,
            auto_control: path.auto_control,
            smooth_factor: path.smooth_factor,
            resolution: path.resolution,
            spacing: path.spacing,
            lerp_mode: path.lerp_mode,
            normal: path.normal,
            frame: path.frame,
            sampling: path.sampling,
        }
    }
}

impl TryFrom<PathRepr> for Path {
    type Error = TransitionError;

    fn try_from(repr: PathRepr) -> Result<Self, Self::Error> {
        check_layout(repr.points.len(), repr.looped)?;
        let mut path = Path::with_points(repr.points);
        path.enabled = repr.enabled;
        path.looped = repr.looped;
        path.auto_control = repr.auto_control;
        path.smooth_factor = repr.smooth_factor;
        path.resolution = repr.resolution.clamp(1, 10);
        path.spacing = repr.spacing.clamp(1, 100);
        path.lerp_mode = repr.lerp_mode;
        path.normal = repr.normal;
        path.frame = repr.frame;
        path.sampling = repr.sampling.max(1);
        path.update_spaced_points();
        Ok(path)
    }
}

/// Open chains hold `3k+1` points and looped ones `3k`, with `k >= 1`
/// open and `k >= 2` looped.
fn check_layout(count: usize, looped: bool) -> Result<(), TransitionError> {
    let valid = if looped {
        count >= 6 && count % 3 == 0
    } else {
        count >= 4 && count % 3 == 1
    };
    if valid {
        Ok(())
    } else {
        Err(TransitionError::InvalidPathPoints { count, looped })
    }
}

impl Path {
    /// The default single-segment path along X.
    pub fn new() -> Self {
        Self::default()
    }

    /// Single segment from `from` to `to` with tangents at 20% of the span.
    pub fn between(from: Vec3, to: Vec3) -> Self {
        let span = math::sub(to, from);
        Path::with_points(vec![
            from,
            math::add(from, math::scale(span, 0.2)),
            math::sub(to, math::scale(span, 0.2)),
            to,
        ])
    }

    /// Build from raw points, validating the anchor/tangent layout.
    pub fn from_points(points: Vec<Vec3>, looped: bool) -> Result<Self, TransitionError> {
        check_layout(points.len(), looped)?;
        let mut path = Path::with_points(points);
        path.looped = looped;
        path.update_spaced_points();
        Ok(path)
    }

    fn with_points(points: Vec<Vec3>) -> Self {
        let mut path = Self {
            enabled: true,
            points,
            looped: false,
            auto_control: true,
            smooth_factor: 0.5,
            resolution: 1,
            spacing: 10,
            lerp_mode: PathLerpMode::Baked,
            normal: PathNormal::Up,
            frame: PathFrame::default(),
            sampling: DEFAULT_SAMPLING,
            spaced: Vec::new(),
        };
        path.update_spaced_points();
        path
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn point(&self, index: usize) -> Option<Vec3> {
        self.points.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Vec3 {
        self.points.first().copied().unwrap_or(math::ZERO)
    }

    pub fn last(&self) -> Vec3 {
        self.points.last().copied().unwrap_or(math::ZERO)
    }

    pub fn segment_count(&self) -> usize {
        bezier::segment_count(&self.points)
    }

    pub fn segment(&self, index: usize) -> Option<bezier::SegmentPoints> {
        (index < self.segment_count()).then(|| bezier::segment_points(&self.points, index))
    }

    pub fn spaced_points(&self) -> &[Vec3] {
        &self.spaced
    }

    pub fn looped(&self) -> bool {
        self.looped
    }

    pub fn auto_control(&self) -> bool {
        self.auto_control
    }

    pub fn smooth_factor(&self) -> f32 {
        self.smooth_factor
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn spacing(&self) -> u32 {
        self.spacing
    }

    pub fn lerp_mode(&self) -> PathLerpMode {
        self.lerp_mode
    }

    pub fn sampling(&self) -> usize {
        self.sampling
    }

    /// Approximate arc length of the chain.
    pub fn length(&self) -> f32 {
        bezier::path_length(&self.points, self.sampling)
    }

    pub fn set_sampling(&mut self, samples: usize) {
        self.sampling = samples.max(1);
        self.update_spaced_points();
    }

    pub fn set_lerp_mode(&mut self, mode: PathLerpMode) {
        self.lerp_mode = mode;
        self.update_spaced_points();
    }

    /// Points per segment in the baked cache, clamped to 1..=100.
    pub fn set_spacing(&mut self, spacing: u32) {
        self.spacing = spacing.clamp(1, 100);
        self.update_spaced_points();
    }

    /// Baking walk density, clamped to 1..=10.
    pub fn set_resolution(&mut self, resolution: u32) {
        self.resolution = resolution.clamp(1, 10);
        self.update_spaced_points();
    }

    pub fn set_smooth_factor(&mut self, factor: f32) {
        self.smooth_factor = factor;
        self.auto_set_all_controls();
    }

    pub fn set_auto_control(&mut self, auto: bool) {
        if self.auto_control == auto {
            return;
        }
        self.auto_control = auto;
        if auto && self.has_inner_anchors() {
            self.auto_set_all_controls();
        }
    }

    /// Close or open the chain. Closing appends two tangents mirrored from
    /// the end and start anchors; opening drops them.
    pub fn set_looped(&mut self, looped: bool) {
        if self.looped == looped || self.points.len() < 4 {
            return;
        }
        self.looped = looped;
        if !looped {
            let n = self.points.len();
            self.points.truncate(n - 2);
            if self.auto_control {
                self.auto_set_loop_ends();
            }
        } else {
            let n = self.points.len();
            let last = self.points[n - 1];
            let before_last = self.points[n - 2];
            self.points.push(math::sub(math::scale(last, 2.0), before_last));
            let (p0, p1) = (self.points[0], self.points[1]);
            self.points.push(math::sub(math::scale(p0, 2.0), p1));
            if self.auto_control {
                self.auto_set_control(0);
                let n = self.points.len();
                self.auto_set_control(n - 3);
            }
        }
        self.update_spaced_points();
    }

    /// Append a segment ending at `pos`, or prepend one starting there.
    pub fn add_segment(&mut self, pos: Vec3, to_start: bool) {
        let relooped = self.looped;
        if relooped {
            self.set_looped(false);
        }
        let anchor = if to_start {
            let (p0, p1) = (self.points[0], self.points[1]);
            self.points.insert(0, math::sub(math::scale(p0, 2.0), p1));
            let mid = math::scale(math::add(self.points[0], pos), 0.5);
            self.points.insert(0, mid);
            self.points.insert(0, pos);
            self.set_point(0, pos, true);
            0
        } else {
            let n = self.points.len();
            let (last, before_last) = (self.points[n - 1], self.points[n - 2]);
            self.points.push(math::sub(math::scale(last, 2.0), before_last));
            let mid = math::scale(math::add(self.last(), pos), 0.5);
            self.points.push(mid);
            self.points.push(pos);
            let n = self.points.len();
            self.set_point(n - 1, pos, true);
            n - 1
        };
        if self.auto_control {
            self.auto_set_affected_controls(anchor);
        }
        if relooped {
            self.set_looped(true);
        }
        self.update_spaced_points();
    }

    /// Insert a new anchor at `pos` inside `segment`.
    pub fn split_segment(&mut self, pos: Vec3, segment: usize) {
        if segment >= self.segment_count() {
            log::warn!("split_segment: segment {segment} out of range");
            return;
        }
        let at = segment * 3 + 2;
        self.points.splice(at..at, [math::ZERO, pos, math::ZERO]);
        if self.auto_control {
            self.auto_set_affected_controls(segment * 3 + 3);
        } else {
            self.auto_set_control(segment * 3 + 3);
        }
        self.update_spaced_points();
    }

    /// Remove the anchor at point index `anchor` with its tangents. Refuses
    /// to leave fewer than one segment (two when looped).
    pub fn delete_segment(&mut self, anchor: usize) -> bool {
        let segments = self.segment_count();
        let n = self.points.len();
        if segments <= 1 || (self.looped && segments <= 2) || anchor % 3 != 0 || anchor >= n {
            return false;
        }
        if anchor == 0 {
            if self.looped {
                self.points[n - 1] = self.points[2];
            }
            self.points.drain(0..3);
        } else if anchor == n - 1 && !self.looped {
            self.points.drain(anchor - 2..=anchor);
        } else {
            self.points.drain(anchor - 1..anchor + 2);
        }
        if self.auto_control {
            let anchor = anchor.min(self.points.len() - 1) / 3 * 3;
            self.auto_set_affected_controls(anchor);
        }
        self.update_spaced_points();
        true
    }

    /// Move one point. With `update_others`, moving an anchor drags its
    /// tangents along and moving a tangent mirrors the opposite tangent
    /// around the shared anchor (keeping that tangent's length). In auto
    /// mode tangents cannot be moved directly.
    pub fn set_point(&mut self, index: usize, pos: Vec3, update_others: bool) {
        let n = self.points.len();
        if index >= n || (self.auto_control && index % 3 != 0) {
            return;
        }
        let delta = math::sub(pos, self.points[index]);
        self.points[index] = pos;
        if !update_others {
            return;
        }

        if index % 3 == 0 {
            if index + 1 < n || self.looped {
                let i = self.wrap(index as isize + 1);
                self.points[i] = math::add(self.points[i], delta);
            }
            if index >= 1 || self.looped {
                let i = self.wrap(index as isize - 1);
                self.points[i] = math::add(self.points[i], delta);
            }
            if self.auto_control && self.has_inner_anchors() {
                self.auto_set_affected_controls(index);
            }
            return;
        }

        let next_is_anchor = (index + 1) % 3 == 0;
        let (opposite, anchor) = if next_is_anchor {
            (index as isize + 2, index as isize + 1)
        } else {
            (index as isize - 2, index as isize - 1)
        };
        if (opposite >= 0 && (opposite as usize) < n) || self.looped {
            let opposite = self.wrap(opposite);
            let anchor = self.wrap(anchor);
            let a = self.points[anchor];
            let distance = math::distance(a, self.points[opposite]);
            let direction = math::normalize(math::sub(a, pos));
            self.points[opposite] = math::add(a, math::scale(direction, distance));
        }
    }

    /// Move an anchor (by anchor number, not point index) the way an
    /// attached host object would drag it.
    pub fn move_anchor(&mut self, anchor: usize, pos: Vec3) {
        let index = anchor * 3;
        if index >= self.points.len() || self.points[index] == pos {
            return;
        }
        self.points[index] = pos;
        if self.auto_control {
            self.auto_set_affected_controls(index);
        }
        self.update_spaced_points();
    }

    /// Multiply every point componentwise by `mask` (flatten onto a plane
    /// or axis).
    pub fn project(&mut self, mask: Vec3) {
        for p in &mut self.points {
            *p = [p[0] * mask[0], p[1] * mask[1], p[2] * mask[2]];
        }
        self.update_spaced_points();
    }

    /// Rebuild the baked cache. No-op in dynamic mode.
    pub fn update_spaced_points(&mut self) {
        if self.lerp_mode != PathLerpMode::Baked {
            self.spaced.clear();
            return;
        }
        self.spaced = bezier::spaced_points(
            &self.points,
            self.spacing as usize,
            self.resolution as f32,
            self.sampling,
        );
    }

    /// Position at `t` (clamped to [0, 1]) in world space.
    pub fn evaluate_position(&self, t: f32) -> Vec3 {
        let t = t.clamp(0.0, 1.0);
        let local = match self.lerp_mode {
            PathLerpMode::Baked if !self.spaced.is_empty() => bezier::evaluate_spaced_path(&self.spaced, t),
            _ => bezier::evaluate_cubic_path(&self.points, t, self.sampling),
        };
        self.frame.to_world(local)
    }

    /// Orientation at `t` in world space, aligned to [`Path::normal`].
    pub fn evaluate_rotation(&self, t: f32) -> Quat {
        self.evaluate_rotation_aligned(t, self.normal.vector())
    }

    pub fn evaluate_rotation_aligned(&self, t: f32, up: Vec3) -> Quat {
        let t = t.clamp(0.0, 1.0);
        let up = math::normalize(up);
        let local = match self.lerp_mode {
            PathLerpMode::Baked if self.spaced.len() >= 2 => {
                bezier::evaluate_spaced_rotation(&self.spaced, self.looped, up, t)
            }
            _ => bezier::evaluate_cubic_rotation(&self.points, up, t, self.sampling),
        };
        self.frame.rotation_to_world(local)
    }

    fn wrap(&self, index: isize) -> usize {
        index.rem_euclid(self.points.len() as isize) as usize
    }

    fn has_inner_anchors(&self) -> bool {
        let segments = self.segment_count();
        (self.looped && segments > 2) || (!self.looped && segments > 1)
    }

    /// Recompute both tangents of `anchor` from its neighbouring anchors.
    fn auto_set_control(&mut self, anchor: usize) {
        let n = self.points.len();
        if anchor >= n {
            return;
        }
        let pos = self.points[anchor];
        let mut direction = math::ZERO;
        let mut distances = [0.0f32; 2];

        if anchor >= 3 || self.looped {
            let offset = math::sub(self.points[self.wrap(anchor as isize - 3)], pos);
            direction = math::add(direction, math::normalize(offset));
            distances[0] = math::length(offset);
        }
        if anchor + 3 < n || self.looped {
            let offset = math::sub(self.points[self.wrap(anchor as isize + 3)], pos);
            direction = math::sub(direction, math::normalize(offset));
            distances[1] = -math::length(offset);
        }
        let direction = math::normalize(direction);

        for (i, distance) in distances.iter().enumerate() {
            let index = anchor as isize + i as isize * 2 - 1;
            if (index >= 0 && (index as usize) < n) || self.looped {
                let index = self.wrap(index);
                self.points[index] = math::add(pos, math::scale(direction, distance * self.smooth_factor));
            }
        }
    }

    fn auto_set_affected_controls(&mut self, anchor: usize) {
        let n = self.points.len() as isize;
        let mut i = anchor as isize - 3;
        while i <= anchor as isize + 3 {
            if (i >= 0 && i < n) || self.looped {
                let index = self.wrap(i);
                self.auto_set_control(index);
            }
            i += 3;
        }
        self.auto_set_loop_ends();
    }

    fn auto_set_all_controls(&mut self) {
        for anchor in (0..self.points.len()).step_by(3) {
            self.auto_set_control(anchor);
        }
        self.auto_set_loop_ends();
        self.update_spaced_points();
    }

    /// Open chains have no neighbour past their ends; park the end tangents
    /// halfway to the adjacent tangent.
    fn auto_set_loop_ends(&mut self) {
        let n = self.points.len();
        if self.looped || n < 4 {
            return;
        }
        self.points[1] = math::scale(math::add(self.points[0], self.points[2]), 0.5);
        self.points[n - 2] = math::scale(math::add(self.points[n - 1], self.points[n - 3]), 0.5);
    }
}
