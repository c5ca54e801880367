//! Particle formation engine.
//!
//! Tree particles blend between their formation and scattered positions with
//! either exponential smoothing or a damped spring. Dust particles always use
//! the spring and pick up a tangential swirl while the tree is assembled.

use std::collections::HashMap;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::models::scene::{DustDescriptor, ParticleDescriptor, ParticleKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormationPolicy {
    #[default]
    Smooth,
    Spring,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormationConfig {
    pub policy: FormationPolicy,
    pub lerp_factor: f32,
    /// Squared distance below which a settled particle is left alone.
    pub settle_threshold: f32,
    /// Organic float applied on top of the scattered position.
    pub float_amplitude: f32,
    pub float_speed: f32,
    pub spring_stiffness: f32,
    pub spring_damping: f32,
    pub swirl_strength: f32,
    pub leaf_yaw_step: f32,
    pub dust_bob_amplitude: f32,
    pub dust_bob_speed: f32,
    pub dust_base_scale: f32,
    pub dust_pulse: f32,
    pub dust_pulse_speed: f32,
}

impl Default for FormationConfig {
    fn default() -> Self {
        Self {
            policy: FormationPolicy::Smooth,
            lerp_factor: 0.08,
            settle_threshold: 0.001,
            float_amplitude: 0.25,
            float_speed: 0.8,
            spring_stiffness: 0.03,
            spring_damping: 0.82,
            swirl_strength: 0.015,
            leaf_yaw_step: 0.1,
            dust_bob_amplitude: 0.05,
            dust_bob_speed: 1.5,
            dust_base_scale: 0.03,
            dust_pulse: 0.015,
            dust_pulse_speed: 2.0,
        }
    }
}

/// Per-frame spring: the force pulls toward the target, velocity is damped
/// geometrically, then integrated into position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spring {
    pub position: Vec3,
    pub velocity: Vec3,
}

impl Spring {
    pub fn at_rest(position: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
        }
    }

    pub fn tick(&mut self, target: Vec3, extra_force: Vec3, stiffness: f32, damping: f32) -> Vec3 {
        let force = (target - self.position) * stiffness + extra_force;
        self.velocity = (self.velocity + force) * damping;
        self.position += self.velocity;
        self.position
    }
}

/// Transform handed to the renderer for one instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleTransform {
    pub id: u32,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderBatch {
    pub kind: ParticleKind,
    pub transforms: Vec<ParticleTransform>,
}

#[derive(Debug, Clone)]
pub struct ParticleField {
    config: FormationConfig,
    descriptors: Vec<ParticleDescriptor>,
    springs: Vec<Spring>,
    index_by_id: HashMap<u32, usize>,
}

impl ParticleField {
    pub fn new(descriptors: Vec<ParticleDescriptor>, config: FormationConfig) -> Self {
        let springs = descriptors
            .iter()
            .map(|descriptor| Spring::at_rest(descriptor.formation))
            .collect();
        let index_by_id = index_ids(&descriptors);
        Self {
            config,
            descriptors,
            springs,
            index_by_id,
        }
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn policy(&self) -> FormationPolicy {
        self.config.policy
    }

    pub fn set_policy(&mut self, policy: FormationPolicy) {
        self.config.policy = policy;
        for spring in &mut self.springs {
            spring.velocity = Vec3::ZERO;
        }
    }

    pub fn descriptors(&self) -> &[ParticleDescriptor] {
        &self.descriptors
    }

    pub fn descriptor(&self, id: u32) -> Option<&ParticleDescriptor> {
        self.index_by_id
            .get(&id)
            .and_then(|&index| self.descriptors.get(index))
    }

    pub fn position_of(&self, id: u32) -> Option<Vec3> {
        self.index_by_id
            .get(&id)
            .and_then(|&index| self.springs.get(index))
            .map(|spring| spring.position)
    }

    /// Swaps in a regenerated descriptor set. Particles whose id survives keep
    /// their current position; new ones start at their formation position.
    pub fn replace_descriptors(&mut self, descriptors: Vec<ParticleDescriptor>) {
        let springs = descriptors
            .iter()
            .map(|descriptor| {
                self.index_by_id
                    .get(&descriptor.id)
                    .and_then(|&index| self.springs.get(index))
                    .copied()
                    .unwrap_or_else(|| Spring::at_rest(descriptor.formation))
            })
            .collect();
        self.index_by_id = index_ids(&descriptors);
        self.descriptors = descriptors;
        self.springs = springs;
    }

    /// Advances every particle one frame. Returns whether anything moved.
    pub fn update(&mut self, elapsed: f32, exploded: bool, selected: Option<u32>) -> bool {
        let config = &self.config;
        let mut moved = false;

        for (descriptor, spring) in self.descriptors.iter().zip(self.springs.iter_mut()) {
            let mut target = descriptor.target(exploded);
            if exploded {
                target += float_offset(descriptor.id, elapsed, config);
            }

            match config.policy {
                FormationPolicy::Smooth => {
                    let is_selected = selected == Some(descriptor.id);
                    if spring.position.distance_squared(target) > config.settle_threshold
                        || is_selected
                    {
                        spring.position = spring.position.lerp(target, config.lerp_factor);
                        moved = true;
                    }
                }
                FormationPolicy::Spring => {
                    let before = spring.position;
                    spring.tick(
                        target,
                        Vec3::ZERO,
                        config.spring_stiffness,
                        config.spring_damping,
                    );
                    moved |= before != spring.position;
                }
            }
        }

        moved
    }

    /// Instance transforms grouped by kind, in `ParticleKind::ALL` order.
    pub fn batches(&self, selected: Option<u32>) -> Vec<RenderBatch> {
        let mut batches: Vec<RenderBatch> = ParticleKind::ALL
            .iter()
            .map(|&kind| RenderBatch {
                kind,
                transforms: Vec::new(),
            })
            .collect();

        for (descriptor, spring) in self.descriptors.iter().zip(&self.springs) {
            let slot = ParticleKind::ALL
                .iter()
                .position(|&kind| kind == descriptor.kind)
                .unwrap_or(0);
            batches[slot].transforms.push(ParticleTransform {
                id: descriptor.id,
                position: spring.position,
                rotation: Quat::from_rotation_y(self.yaw(descriptor, spring.position)),
                scale: if selected == Some(descriptor.id) {
                    0.0
                } else {
                    descriptor.scale
                },
            });
        }

        batches
    }

    fn yaw(&self, descriptor: &ParticleDescriptor, position: Vec3) -> f32 {
        match descriptor.kind {
            ParticleKind::Photo => position.x.atan2(position.z),
            ParticleKind::Leaf => (descriptor.id % 10) as f32 * self.config.leaf_yaw_step,
            _ => 0.0,
        }
    }
}

fn index_ids(descriptors: &[ParticleDescriptor]) -> HashMap<u32, usize> {
    descriptors
        .iter()
        .enumerate()
        .map(|(index, descriptor)| (descriptor.id, index))
        .collect()
}

fn float_offset(id: u32, elapsed: f32, config: &FormationConfig) -> Vec3 {
    if config.float_amplitude == 0.0 {
        return Vec3::ZERO;
    }
    let seed = id as f32;
    let t = elapsed * config.float_speed;
    Vec3::new(
        (t + seed * 0.37).sin(),
        (t * 0.8 + seed * 0.53).cos(),
        (t * 0.6 + seed * 0.71).sin(),
    ) * config.float_amplitude
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DustTransform {
    pub position: Vec3,
    pub scale: f32,
}

/// Ambient gold dust driven entirely by springs.
#[derive(Debug, Clone)]
pub struct DustField {
    config: FormationConfig,
    descriptors: Vec<DustDescriptor>,
    springs: Vec<Spring>,
}

impl DustField {
    pub fn new(descriptors: Vec<DustDescriptor>, config: FormationConfig) -> Self {
        let springs = descriptors
            .iter()
            .map(|descriptor| Spring::at_rest(descriptor.scattered))
            .collect();
        Self {
            config,
            descriptors,
            springs,
        }
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn update(&mut self, exploded: bool) {
        let config = &self.config;
        for (descriptor, spring) in self.descriptors.iter().zip(self.springs.iter_mut()) {
            let target = if exploded {
                descriptor.scattered
            } else {
                descriptor.formation
            };
            let swirl = if exploded {
                Vec3::ZERO
            } else {
                let p = spring.position;
                Vec3::new(-p.z, 0.0, p.x).normalize_or_zero() * config.swirl_strength
            };
            spring.tick(target, swirl, config.spring_stiffness, config.spring_damping);
        }
    }

    pub fn transforms(&self, elapsed: f32) -> Vec<DustTransform> {
        let config = &self.config;
        self.descriptors
            .iter()
            .zip(&self.springs)
            .map(|(descriptor, spring)| {
                let bob = (elapsed * config.dust_bob_speed + descriptor.phase).sin()
                    * config.dust_bob_amplitude;
                let pulse = (elapsed * config.dust_pulse_speed + descriptor.phase).sin()
                    * config.dust_pulse;
                DustTransform {
                    position: spring.position + Vec3::new(0.0, bob, 0.0),
                    scale: config.dust_base_scale + pulse,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(id: u32, kind: ParticleKind, formation: Vec3, scattered: Vec3) -> ParticleDescriptor {
        ParticleDescriptor {
            id,
            kind,
            formation,
            scattered,
            color: "#228B22".to_string(),
            scale: 1.0,
            image_ref: None,
        }
    }

    fn still_config(policy: FormationPolicy) -> FormationConfig {
        FormationConfig {
            policy,
            float_amplitude: 0.0,
            ..FormationConfig::default()
        }
    }

    #[test]
    fn spring_at_target_with_zero_velocity_stays_put() {
        let start = Vec3::new(1.0, 2.0, 3.0);
        let mut field = ParticleField::new(
            vec![descriptor(0, ParticleKind::Leaf, start, Vec3::new(9.0, 9.0, 9.0))],
            still_config(FormationPolicy::Spring),
        );

        for frame in 0..120 {
            assert!(!field.update(frame as f32 / 60.0, false, None));
        }
        assert_eq!(field.position_of(0), Some(start));
    }

    #[test]
    fn smooth_policy_converges_and_then_idles() {
        let mut field = ParticleField::new(
            vec![descriptor(
                0,
                ParticleKind::Light,
                Vec3::ZERO,
                Vec3::new(10.0, 0.0, 0.0),
            )],
            still_config(FormationPolicy::Smooth),
        );

        assert!(field.update(0.0, true, None));
        let first = field.position_of(0).expect("particle");
        assert!((first.x - 0.8).abs() < 1e-5);

        for _ in 0..200 {
            field.update(0.0, true, None);
        }
        let settled = field.position_of(0).expect("particle");
        assert!(settled.distance_squared(Vec3::new(10.0, 0.0, 0.0)) <= 0.001);
        assert!(!field.update(0.0, true, None));
    }

    #[test]
    fn spring_policy_reaches_scattered_target() {
        let target = Vec3::new(4.0, -2.0, 1.0);
        let mut field = ParticleField::new(
            vec![descriptor(0, ParticleKind::Leaf, Vec3::ZERO, target)],
            still_config(FormationPolicy::Spring),
        );
        for _ in 0..600 {
            field.update(0.0, true, None);
        }
        assert!(field.position_of(0).expect("particle").distance(target) < 1e-2);
    }

    #[test]
    fn float_offset_only_applies_when_scattered() {
        let mut field = ParticleField::new(
            vec![descriptor(7, ParticleKind::Light, Vec3::ZERO, Vec3::ZERO)],
            FormationConfig::default(),
        );
        assert!(!field.update(1.0, false, None));
        assert!(field.update(1.0, true, None));
    }

    #[test]
    fn batches_derive_orientation_and_hide_selection() {
        let photo_pos = Vec3::new(1.0, 5.0, 1.0);
        let field = ParticleField::new(
            vec![
                descriptor(13, ParticleKind::Leaf, Vec3::ZERO, Vec3::ZERO),
                descriptor(20, ParticleKind::Photo, photo_pos, Vec3::ZERO),
            ],
            FormationConfig::default(),
        );

        let batches = field.batches(Some(20));
        assert_eq!(batches.len(), ParticleKind::ALL.len());

        let leaf = &batches[0].transforms[0];
        assert_eq!(batches[0].kind, ParticleKind::Leaf);
        let expected = Quat::from_rotation_y(0.3);
        assert!(leaf.rotation.abs_diff_eq(expected, 1e-5));

        let photo_batch = batches
            .iter()
            .find(|batch| batch.kind == ParticleKind::Photo)
            .expect("photo batch");
        let photo = &photo_batch.transforms[0];
        assert_eq!(photo.scale, 0.0);
        let facing = Quat::from_rotation_y(std::f32::consts::FRAC_PI_4);
        assert!(photo.rotation.abs_diff_eq(facing, 1e-5));
    }

    #[test]
    fn replacing_descriptors_keeps_positions_by_id() {
        let mut field = ParticleField::new(
            vec![descriptor(
                1,
                ParticleKind::Photo,
                Vec3::ZERO,
                Vec3::new(5.0, 0.0, 0.0),
            )],
            still_config(FormationPolicy::Smooth),
        );
        for _ in 0..10 {
            field.update(0.0, true, None);
        }
        let moved = field.position_of(1).expect("particle");

        let mut swapped = field.descriptors().to_vec();
        swapped[0].image_ref = Some("new.jpg".to_string());
        swapped.push(descriptor(2, ParticleKind::Leaf, Vec3::ONE, Vec3::ZERO));
        field.replace_descriptors(swapped);

        assert_eq!(field.position_of(1), Some(moved));
        assert_eq!(field.position_of(2), Some(Vec3::ONE));
        assert_eq!(
            field.descriptor(1).and_then(|d| d.image_ref.as_deref()),
            Some("new.jpg")
        );
    }

    #[test]
    fn dust_swirls_only_while_assembled() {
        let dust = DustDescriptor {
            formation: Vec3::new(3.0, 1.0, 0.0),
            scattered: Vec3::new(3.0, 1.0, 0.0),
            phase: 0.0,
        };
        let mut scattered = DustField::new(vec![dust], FormationConfig::default());
        scattered.update(true);
        assert_eq!(scattered.transforms(0.0)[0].position, Vec3::new(3.0, 1.0, 0.0));

        let mut assembled = DustField::new(vec![dust], FormationConfig::default());
        assembled.update(false);
        let position = assembled.transforms(0.0)[0].position;
        assert!(position.z > 0.0);
        assert!((assembled.transforms(0.0)[0].scale - 0.03).abs() < 1e-6);
    }
}
