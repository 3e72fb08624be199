use std::f32::consts::PI;
use std::f64::consts::PI as PI_F64;
use std::fmt;
use std::str::FromStr;

use bevy::math::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Radians of phase per second at speed 1 for the idle cycle.
const IDLE_RATE: f32 = 2.0;
/// Radians of phase per second at speed 1 for the walk cycle.
const WALK_RATE: f32 = 8.0;

const IDLE_ARM_REST: f32 = 0.02 * PI;
const IDLE_ARM_AMPLITUDE: f32 = 0.03;
const IDLE_ARM_DRIFT: f32 = 0.04;

/// Arm swing at speed 1, in radians. Legs swing a bit further.
const WALK_SWING: f32 = 0.5;
const WALK_LEG_GAIN: f32 = 1.4;
/// Speed beyond which the stride stops widening and only the cadence rises.
const WALK_MAX_STRIDE_SPEED: f32 = 2.0;

/// How quickly a kind or speed change fades in, per second.
const BLEND_RATE: f32 = 8.0;

/// Cape hang angle at rest, in radians away from the back.
pub const CAPE_REST_ANGLE: f32 = 0.1;
/// How much of the torso lean the cape picks up.
const CAPE_LEAN_GAIN: f32 = 1.2;
/// Low-pass rate for the cape follow. Purely aesthetic.
pub const CAPE_FOLLOW_RATE: f32 = 6.0;

/// Shortest phase span after which every waveform below repeats exactly. Sampling happens on
/// the phase wrapped to this span so `f32` trig keeps full precision however long it runs.
const PHASE_PERIOD: f64 = 20.0 * PI_F64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationKind {
    #[default]
    Idle,
    Walk,
}

impl fmt::Display for AnimationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Walk => "walk",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown animation `{0}` (expected idle or walk)")]
pub struct ParseAnimationError(pub String);

impl FromStr for AnimationKind {
    type Err = ParseAnimationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "idle" => Ok(Self::Idle),
            "walk" | "walking" => Ok(Self::Walk),
            _ => Err(ParseAnimationError(s.to_string())),
        }
    }
}

/// Joint rotations for one frame. Limb values are XYZ euler angles in radians.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct JointPose {
    pub head: Vec3,
    pub right_arm: Vec3,
    pub left_arm: Vec3,
    pub right_leg: Vec3,
    pub left_leg: Vec3,
    /// Implied forward lean of the torso while walking.
    pub lean: f32,
    /// Cape swing away from the back.
    pub cape: f32,
}

/// Procedural idle/walk state.
///
/// `phase` only ever moves forward. Changing the kind or speed retargets the blend weights
/// and leaves the phase alone, so the pose changes smoothly instead of restarting the cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationState {
    kind: AnimationKind,
    speed: f32,
    phase: f64,
    walk_weight: f32,
    stride: f32,
    cape: f32,
}

impl AnimationState {
    pub fn new(kind: AnimationKind, speed: f32) -> Self {
        let speed = sanitize_speed(speed);
        let mut state = Self {
            kind,
            speed,
            phase: 0.0,
            walk_weight: 0.0,
            stride: 0.0,
            cape: CAPE_REST_ANGLE,
        };
        state.walk_weight = state.target_walk_weight();
        state.stride = state.target_stride();
        state.cape = state.target_cape();
        state
    }

    pub fn kind(&self) -> AnimationKind {
        self.kind
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Total phase travelled since creation.
    pub fn phase(&self) -> f64 {
        self.phase
    }

    pub fn set_kind(&mut self, kind: AnimationKind) {
        self.kind = kind;
    }

    /// Negative and non-finite speeds are clamped to zero.
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = sanitize_speed(speed);
    }

    /// Moves the cycle forward by `dt` seconds and returns the new pose.
    pub fn advance(&mut self, dt: f32) -> JointPose {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.phase += f64::from(dt * self.speed);

        let blend = 1.0 - (-BLEND_RATE * dt).exp();
        self.walk_weight += (self.target_walk_weight() - self.walk_weight) * blend;
        self.stride += (self.target_stride() - self.stride) * blend;

        let follow = 1.0 - (-CAPE_FOLLOW_RATE * dt).exp();
        self.cape += (self.target_cape() - self.cape) * follow;

        self.pose()
    }

    /// Samples the current pose without advancing time.
    pub fn pose(&self) -> JointPose {
        let cycle = self.cycle();
        let idle = idle_pose(cycle);
        let walk = walk_pose(cycle, self.stride);
        let w = self.walk_weight;
        JointPose {
            head: idle.head.lerp(walk.head, w),
            right_arm: idle.right_arm.lerp(walk.right_arm, w),
            left_arm: idle.left_arm.lerp(walk.left_arm, w),
            right_leg: idle.right_leg.lerp(walk.right_leg, w),
            left_leg: idle.left_leg.lerp(walk.left_leg, w),
            lean: self.lean(),
            cape: self.cape,
        }
    }

    fn cycle(&self) -> f32 {
        self.phase.rem_euclid(PHASE_PERIOD) as f32
    }

    fn target_walk_weight(&self) -> f32 {
        match self.kind {
            AnimationKind::Idle => 0.0,
            AnimationKind::Walk => 1.0,
        }
    }

    fn target_stride(&self) -> f32 {
        WALK_SWING * self.speed.min(WALK_MAX_STRIDE_SPEED)
    }

    fn lean(&self) -> f32 {
        self.walk_weight * self.stride * 0.35
    }

    fn target_cape(&self) -> f32 {
        let cycle = self.cycle();
        let flutter = (cycle * WALK_RATE * 2.0).sin() * 0.04 * self.walk_weight
            + (cycle * IDLE_RATE).sin() * 0.01;
        CAPE_REST_ANGLE + self.lean() * CAPE_LEAN_GAIN + flutter
    }
}

impl Default for AnimationState {
    fn default() -> Self {
        Self::new(AnimationKind::Idle, 1.0)
    }
}

fn sanitize_speed(speed: f32) -> f32 {
    if speed.is_finite() { speed.max(0.0) } else { 0.0 }
}

fn idle_pose(phase: f32) -> JointPose {
    let t = phase * IDLE_RATE;
    let spread = IDLE_ARM_REST + t.sin() * IDLE_ARM_AMPLITUDE;
    let drift = (t * 0.75).sin() * IDLE_ARM_DRIFT;
    JointPose {
        head: Vec3::new((t * 0.5).sin() * 0.03, 0.0, 0.0),
        // Right arm hangs on -X: spreading outward is a negative Z roll.
        right_arm: Vec3::new(drift, 0.0, -spread),
        left_arm: Vec3::new(-drift, 0.0, spread),
        ..Default::default()
    }
}

fn walk_pose(phase: f32, stride: f32) -> JointPose {
    let t = phase * WALK_RATE;
    let s = t.sin() * stride;
    JointPose {
        head: Vec3::new((t / 5.0).sin() * 0.1, (t / 4.0).sin() * 0.2, 0.0),
        right_arm: Vec3::new(s, 0.0, -IDLE_ARM_REST),
        left_arm: Vec3::new(-s, 0.0, IDLE_ARM_REST),
        right_leg: Vec3::new(-s * WALK_LEG_GAIN, 0.0, 0.0),
        left_leg: Vec3::new(s * WALK_LEG_GAIN, 0.0, 0.0),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settle(state: &mut AnimationState, seconds: f32) -> JointPose {
        let mut pose = state.pose();
        for _ in 0..(seconds * 60.0) as usize {
            pose = state.advance(1.0 / 60.0);
        }
        pose
    }

    #[test]
    fn parses_kinds_case_insensitively() {
        assert_eq!("Walk".parse::<AnimationKind>(), Ok(AnimationKind::Walk));
        assert_eq!(" IDLE ".parse::<AnimationKind>(), Ok(AnimationKind::Idle));
        assert!("run".parse::<AnimationKind>().is_err());
    }

    #[test]
    fn speed_change_keeps_pose_continuous() {
        let mut state = AnimationState::new(AnimationKind::Walk, 1.0);
        settle(&mut state, 0.7);
        let before = state.pose();
        let phase = state.phase();
        state.set_speed(2.5);
        assert_eq!(state.phase(), phase);
        assert_eq!(state.advance(0.0), before);
    }

    #[test]
    fn kind_change_keeps_phase() {
        let mut state = AnimationState::new(AnimationKind::Idle, 1.0);
        settle(&mut state, 1.3);
        let before = state.pose();
        let phase = state.phase();
        state.set_kind(AnimationKind::Walk);
        assert_eq!(state.phase(), phase);
        assert_eq!(state.advance(0.0), before);
    }

    #[test]
    fn walk_swings_diagonal_pairs_together() {
        let mut state = AnimationState::new(AnimationKind::Walk, 1.0);
        // Quarter cycle: sin(t) = 1.
        let pose = state.advance(PI / 2.0 / WALK_RATE);
        assert!(pose.right_arm.x > 0.1);
        assert!((pose.right_arm.x + pose.left_arm.x).abs() < 1e-5);
        assert!(pose.left_leg.x > 0.0 && pose.right_leg.x < 0.0);
        assert!((pose.left_leg.x / pose.right_arm.x - WALK_LEG_GAIN).abs() < 1e-4);
    }

    #[test]
    fn faster_walk_swings_wider() {
        let quarter = |speed: f32| {
            let mut state = AnimationState::new(AnimationKind::Walk, speed);
            state.advance(PI / 2.0 / WALK_RATE / speed).right_arm.x
        };
        assert!(quarter(1.5) > quarter(0.5));
    }

    #[test]
    fn cape_follows_lean_without_snapping() {
        let mut state = AnimationState::new(AnimationKind::Idle, 1.0);
        settle(&mut state, 1.0);
        let rest = state.pose().cape;
        state.set_kind(AnimationKind::Walk);

        let first = state.advance(1.0 / 60.0).cape;
        let settled = settle(&mut state, 3.0);
        assert!(settled.lean > 0.0);
        // One frame only covers part of the distance to the walking hang angle.
        assert!((first - rest).abs() < (settled.cape - rest).abs());
        assert!(settled.cape > rest);
    }

    #[test]
    fn idle_ignores_stride() {
        let mut state = AnimationState::new(AnimationKind::Idle, 1.0);
        let pose = settle(&mut state, 2.0);
        assert!(pose.right_leg.x.abs() < 1e-4);
        assert!(pose.right_arm.z < 0.0 && pose.left_arm.z > 0.0);
    }

    #[test]
    fn keeps_moving_after_days_of_phase() {
        let mut state = AnimationState::new(AnimationKind::Walk, 1.0);
        state.phase = 1.0e6;
        let start = state.phase();
        let mut prev = state.pose();
        for _ in 0..600 {
            let pose = state.advance(1.0 / 60.0);
            assert_ne!(pose.right_arm, prev.right_arm);
            prev = pose;
        }
        assert!((state.phase() - start - 10.0).abs() < 1e-3);
    }

    #[test]
    fn waveforms_repeat_over_the_wrap_span() {
        let mut a = AnimationState::new(AnimationKind::Walk, 1.0);
        let mut b = a.clone();
        a.phase = 1.25;
        b.phase = 1.25 + PHASE_PERIOD * 3.0;
        let (a, b) = (a.pose(), b.pose());
        assert!((a.right_arm - b.right_arm).length() < 1e-4);
        assert!((a.head - b.head).length() < 1e-4);
        assert!((a.cape - b.cape).abs() < 1e-4);
    }

    #[test]
    fn bogus_inputs_are_clamped() {
        let mut state = AnimationState::new(AnimationKind::Walk, f32::NAN);
        assert_eq!(state.speed(), 0.0);
        state.set_speed(-3.0);
        assert_eq!(state.speed(), 0.0);
        state.set_speed(1.0);
        state.advance(-1.0);
        state.advance(f32::INFINITY);
        assert_eq!(state.phase(), 0.0);
    }
}
