//! Binds a skill (motion set) to a skeleton and advances it over time,
//! applying interpolated translations/rotations to bound bones under a
//! repeat regime.
use std::rc::Rc;

use glam::{Quat, Vec3};
use log::warn;

use vitaboy_format::record::SkillDescription;

use crate::skeleton::Skeleton;

/// How a `Practice`'s normalized `elapsed` behaves once it leaves `[0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatMode {
    /// Clamp to `[0, 1]` and stop (`scale` becomes 0).
    Hold,
    /// Wrap back into `[0, 1)`.
    Loop,
    /// Reverse direction at each boundary, then wrap.
    PingPong,
    /// Same as `Hold`.
    Fade,
}

struct Binding {
    motion_index: usize,
    bone_index: usize,
}

/// A runtime binding of a `SkillDescription` to a `Skeleton`.
///
/// Holds an `Rc` to the skill rather than borrowing it: multiple Practices
/// commonly share one Skill's keyframe buffers, and a borrow can't
/// outlive the per-frame update loop that owns the Practice. The engine
/// never mutates through this handle.
pub struct Practice {
    skill: Rc<SkillDescription>,
    bindings: Vec<Binding>,
    elapsed: f32,
    scale: f32,
    duration_ms: f32,
    repeat_mode: RepeatMode,
    last_ticks: Option<f64>,
    ready: bool,
}

fn wrap01(x: f32) -> f32 {
    let wrapped = x - x.floor();
    if wrapped >= 1.0 {
        0.0
    } else {
        wrapped
    }
}

fn normalize_quat(q: Quat) -> Quat {
    if q.length() < 1e-4 {
        Quat::IDENTITY
    } else {
        q.normalize()
    }
}

/// Fetch `buffer[offset + frame]`, tolerating a malformed (negative or
/// out-of-range) `offset`/`frame` by returning `None` instead of panicking,
/// matching the teacher's `.get(idx).copied()` pattern for frame-indexed
/// keyframe lookups rather than bare indexing.
fn keyframe_at<T: Copy>(buffer: &[T], offset: i32, frame: i32) -> Option<T> {
    let index = offset.checked_add(frame)?;
    let index = usize::try_from(index).ok()?;
    buffer.get(index).copied()
}

fn slerp_shortest(a: Quat, mut b: Quat, t: f32) -> Quat {
    let mut dot = a.dot(b);
    if dot < 0.0 {
        b = -b;
        dot = -dot;
    }
    if (1.0 - dot) < 0.0005 {
        return normalize_quat(a + (b - a) * t);
    }
    let theta = dot.clamp(-1.0, 1.0).acos();
    let sin_theta = theta.sin();
    let wa = ((1.0 - t) * theta).sin() / sin_theta;
    let wb = (t * theta).sin() / sin_theta;
    normalize_quat(a * wa + b * wb)
}

impl Practice {
    /// Match each motion's `bone_name` to a bone in `skeleton` by name.
    /// Motions with no matching bone are dropped.
    pub fn bind(skill: Rc<SkillDescription>, skeleton: &Skeleton, repeat_mode: RepeatMode) -> Self {
        let mut bindings = Vec::new();
        let mut dropped = 0usize;
        for (motion_index, motion) in skill.motions.iter().enumerate() {
            match skeleton.find_bone(&motion.bone_name) {
                Some(bone_index) => bindings.push(Binding {
                    motion_index,
                    bone_index,
                }),
                None => dropped += 1,
            }
        }
        if dropped > 0 {
            warn!(
                "skill {:?}: {} motion(s) dropped (no matching bone in {:?})",
                skill.name, dropped, skeleton.name
            );
        }

        let ready = !skill.translations.is_empty() || !skill.rotations.is_empty();
        if !ready && (skill.num_translations > 0 || skill.num_rotations > 0) {
            warn!(
                "skill {:?}: keyframe buffers not loaded; practice starts not ready",
                skill.name
            );
        }

        Practice {
            duration_ms: skill.duration_ms,
            skill,
            bindings,
            elapsed: 0.0,
            scale: 1.0,
            repeat_mode,
            last_ticks: None,
            ready,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Advance playback to the external time `ticks` (milliseconds,
    /// monotonically non-decreasing) and apply the resulting bone locals
    /// to `skeleton`. The first call after construction only records
    /// `ticks` and returns; no motion is applied.
    pub fn tick(&mut self, ticks: f64, skeleton: &mut Skeleton) {
        let Some(last) = self.last_ticks else {
            self.last_ticks = Some(ticks);
            return;
        };
        self.last_ticks = Some(ticks);

        if !self.ready || self.duration_ms <= 0.0 {
            return;
        }

        let delta = ticks - last;
        self.elapsed += (delta as f32 / self.duration_ms) * self.scale;

        self.apply_repeat();
        self.apply_motions(skeleton);
    }

    fn apply_repeat(&mut self) {
        if self.elapsed >= 0.0 && self.elapsed < 1.0 {
            return;
        }
        match self.repeat_mode {
            RepeatMode::Hold | RepeatMode::Fade => {
                self.elapsed = self.elapsed.clamp(0.0, 1.0);
                self.scale = 0.0;
            }
            RepeatMode::Loop => {
                self.elapsed = wrap01(self.elapsed);
            }
            RepeatMode::PingPong => {
                self.scale = -self.scale;
                self.elapsed = wrap01(self.elapsed);
            }
        }
    }

    fn apply_motions(&self, skeleton: &mut Skeleton) {
        for binding in &self.bindings {
            let motion = &self.skill.motions[binding.motion_index];
            if motion.frames <= 0 {
                continue;
            }

            let frames = motion.frames as f32;
            let frame_real = (frames * self.elapsed).clamp(0.0, frames - 0.001);
            let frame = frame_real.floor() as i32;
            let tween = frame_real - frame as f32;

            let next_frame = if frame + 1 >= motion.frames {
                if self.repeat_mode == RepeatMode::Loop {
                    0
                } else {
                    frame
                }
            } else {
                frame + 1
            };

            let is_root = skeleton.bones[binding.bone_index].parent.is_none();

            if motion.has_translation && !self.skill.translations.is_empty() {
                let a = keyframe_at(&self.skill.translations, motion.translations_offset, frame);
                let b = keyframe_at(&self.skill.translations, motion.translations_offset, next_frame);
                if let (Some(a), Some(b)) = (a, b) {
                    let value: Vec3 = if tween > 0.001 { a.lerp(b, tween) } else { a };
                    if !(is_root && !self.skill.is_moving) {
                        skeleton.bones[binding.bone_index].local_position = value;
                    }
                }
            }

            if motion.has_rotation && !self.skill.rotations.is_empty() {
                let a = keyframe_at(&self.skill.rotations, motion.rotations_offset, frame);
                let b = keyframe_at(&self.skill.rotations, motion.rotations_offset, next_frame);
                if let (Some(a), Some(b)) = (a, b) {
                    let value = if tween > 0.001 { slerp_shortest(a, b, tween) } else { a };
                    skeleton.bones[binding.bone_index].local_rotation = value;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitaboy_format::record::{BoneDescription, MotionDescription, PropertyBag, SkeletonDescription};

    fn head_skeleton() -> Skeleton {
        let description = SkeletonDescription {
            name: "s".into(),
            bones: vec![BoneDescription {
                name: "HEAD".into(),
                parent_name: "".into(),
                position: Vec3::ZERO,
                rotation: Quat::IDENTITY,
                can_translate: true,
                can_rotate: true,
                can_blend: false,
                can_wiggle: false,
                wiggle_power: 0.0,
                properties: PropertyBag::new(),
            }],
        };
        Skeleton::build(&description)
    }

    fn head_skill() -> SkillDescription {
        SkillDescription {
            name: "nod".into(),
            animation_file: "nod.cfp".into(),
            duration_ms: 1000.0,
            distance: 0.0,
            is_moving: false,
            num_translations: 0,
            num_rotations: 2,
            motions: vec![MotionDescription {
                bone_name: "HEAD".into(),
                frames: 2,
                duration_ms: 1000.0,
                has_translation: false,
                has_rotation: true,
                translations_offset: 0,
                rotations_offset: 0,
                properties: PropertyBag::new(),
                time_properties: Default::default(),
            }],
            translations: Vec::new(),
            rotations: vec![Quat::IDENTITY, Quat::IDENTITY],
        }
    }

    #[test]
    fn halfway_tick_leaves_identity_rotation_on_identity_keyframes() {
        let mut skeleton = head_skeleton();
        let skill = Rc::new(head_skill());
        let mut practice = Practice::bind(skill, &skeleton, RepeatMode::Hold);
        assert!(practice.is_ready());

        practice.tick(0.0, &mut skeleton);
        practice.tick(500.0, &mut skeleton);

        approx::assert_relative_eq!(practice.elapsed(), 0.5, epsilon = 1e-4);
        let bone = &skeleton.bones[skeleton.find_bone("HEAD").unwrap()];
        approx::assert_relative_eq!(bone.local_rotation.length(), 1.0, epsilon = 1e-5);
        assert!(bone.local_rotation.dot(Quat::IDENTITY).abs() > 0.9999);
    }

    #[test]
    fn repeated_tick_at_same_time_is_idempotent() {
        let mut skeleton = head_skeleton();
        let skill = Rc::new(head_skill());
        let mut practice = Practice::bind(skill, &skeleton, RepeatMode::Loop);

        practice.tick(0.0, &mut skeleton);
        practice.tick(100.0, &mut skeleton);
        let elapsed_once = practice.elapsed();
        practice.tick(100.0, &mut skeleton);
        assert_eq!(practice.elapsed(), elapsed_once);
    }

    #[test]
    fn loop_mode_keeps_elapsed_in_unit_range() {
        let mut skeleton = head_skeleton();
        let skill = Rc::new(head_skill());
        let mut practice = Practice::bind(skill, &skeleton, RepeatMode::Loop);

        practice.tick(0.0, &mut skeleton);
        for t in 1..20 {
            practice.tick(t as f64 * 300.0, &mut skeleton);
            assert!(practice.elapsed() >= 0.0 && practice.elapsed() < 1.0);
        }
    }

    #[test]
    fn hold_mode_stops_after_reaching_the_end() {
        let mut skeleton = head_skeleton();
        let skill = Rc::new(head_skill());
        let mut practice = Practice::bind(skill, &skeleton, RepeatMode::Hold);

        practice.tick(0.0, &mut skeleton);
        practice.tick(5000.0, &mut skeleton);
        assert_eq!(practice.elapsed(), 1.0);
        assert_eq!(practice.scale(), 0.0);

        practice.tick(6000.0, &mut skeleton);
        assert_eq!(practice.elapsed(), 1.0);
    }

    #[test]
    fn non_moving_skill_suppresses_root_translation_but_not_rotation() {
        let mut skeleton = head_skeleton();
        let mut skill = head_skill();
        skill.is_moving = false;
        skill.num_translations = 2;
        skill.motions[0].has_translation = true;
        skill.translations = vec![Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0)];
        let skill = Rc::new(skill);
        let mut practice = Practice::bind(skill, &skeleton, RepeatMode::Hold);
        practice.tick(0.0, &mut skeleton);
        practice.tick(500.0, &mut skeleton);

        let bone = &skeleton.bones[skeleton.find_bone("HEAD").unwrap()];
        // Root bone keeps its rest-pose translation since `is_moving` is false.
        assert_eq!(bone.local_position, Vec3::ZERO);
    }

    #[test]
    fn unready_skill_makes_tick_a_no_op() {
        let mut skeleton = head_skeleton();
        let mut skill = head_skill();
        skill.rotations = Vec::new(); // translations empty too -> not ready
        let skill = Rc::new(skill);
        let mut practice = Practice::bind(skill, &skeleton, RepeatMode::Loop);
        assert!(!practice.is_ready());

        practice.tick(0.0, &mut skeleton);
        practice.tick(500.0, &mut skeleton);
        assert_eq!(practice.elapsed(), 0.0);
    }

    #[test]
    fn negative_frame_count_is_skipped_instead_of_panicking() {
        let mut skeleton = head_skeleton();
        let mut skill = head_skill();
        skill.motions[0].frames = -5;
        let skill = Rc::new(skill);
        let mut practice = Practice::bind(skill, &skeleton, RepeatMode::Loop);

        practice.tick(0.0, &mut skeleton);
        practice.tick(500.0, &mut skeleton);

        let bone = &skeleton.bones[skeleton.find_bone("HEAD").unwrap()];
        assert_eq!(bone.local_rotation, Quat::IDENTITY);
    }

    #[test]
    fn out_of_range_offset_is_skipped_instead_of_panicking() {
        let mut skeleton = head_skeleton();
        let mut skill = head_skill();
        skill.motions[0].rotations_offset = -1;
        let skill = Rc::new(skill);
        let mut practice = Practice::bind(skill, &skeleton, RepeatMode::Loop);

        practice.tick(0.0, &mut skeleton);
        practice.tick(500.0, &mut skeleton);

        let bone = &skeleton.bones[skeleton.find_bone("HEAD").unwrap()];
        assert_eq!(bone.local_rotation, Quat::IDENTITY);
    }
}
