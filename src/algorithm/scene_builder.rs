//! Descriptor generation for the tree and the ambient dust.

use std::f32::consts::{PI, TAU};

use glam::Vec3;
use rand::Rng;

use crate::models::scene::{DustDescriptor, ParticleDescriptor, ParticleKind};

pub const TREE_HEIGHT: f32 = 15.0;
pub const TREE_RADIUS: f32 = 5.0;
const SCATTER_EXTENT: f32 = 40.0;
const DUST_HEIGHT: f32 = 15.5;
const PHOTO_BAND: (f32, f32) = (0.1, 0.85);

const LEAF_COLOR: &str = "#003318";
const ORNAMENT_COLORS: [&str; 2] = ["#FFD700", "#8a0a0a"];
const LIGHT_COLORS: [&str; 4] = ["#00FFFF", "#FF69B4", "#FFA500", "#FFFFFF"];
const PHOTO_COLOR: &str = "#ffffff";

fn golden_angle() -> f32 {
    PI * (3.0 - 5.0_f32.sqrt())
}

/// Builds `count` tree particles on a golden-angle spiral cone.
///
/// Photo particles take their image from `photo_refs` in rotation; with an
/// empty list they are still created and render as placeholders.
pub fn generate_tree<R: Rng>(
    count: usize,
    photo_refs: &[String],
    rng: &mut R,
) -> Vec<ParticleDescriptor> {
    let mut descriptors = Vec::with_capacity(count);
    let mut photo_ordinal = 0usize;

    for i in 0..count {
        let t = i as f32 / count as f32;
        let y = t * TREE_HEIGHT;
        let angle = i as f32 * golden_angle();
        let base_radius = (1.0 - t) * TREE_RADIUS;
        let layer_wave = (t * 25.0).sin() * 0.8 * (1.0 - t);

        let roll: f32 = rng.gen();
        let in_photo_band = t > PHOTO_BAND.0 && t < PHOTO_BAND.1;

        let (kind, color, scale, radius_offset, image_ref) = if roll < 0.6 {
            (
                ParticleKind::Leaf,
                LEAF_COLOR,
                0.6 + rng.gen::<f32>() * 0.4,
                rng.gen::<f32>() * 0.2,
                None,
            )
        } else if roll < 0.75 {
            let kind = match rng.gen_range(0..4) {
                0 => ParticleKind::OrnamentSphere,
                1 => ParticleKind::OrnamentBox,
                2 => ParticleKind::OrnamentGem,
                _ => ParticleKind::OrnamentHeptagram,
            };
            let color = ORNAMENT_COLORS[rng.gen_range(0..ORNAMENT_COLORS.len())];
            (
                kind,
                color,
                1.0 + rng.gen::<f32>() * 0.5,
                0.4 + rng.gen::<f32>() * 0.2,
                None,
            )
        } else if roll < 0.85 && in_photo_band {
            let image_ref = cycle_ref(photo_refs, photo_ordinal);
            photo_ordinal += 1;
            (ParticleKind::Photo, PHOTO_COLOR, 2.0, 0.8, image_ref)
        } else {
            (
                ParticleKind::Light,
                LIGHT_COLORS[rng.gen_range(0..LIGHT_COLORS.len())],
                0.7,
                0.25 + rng.gen::<f32>() * 0.2,
                None,
            )
        };

        let radius = base_radius + layer_wave + radius_offset;
        descriptors.push(ParticleDescriptor {
            id: i as u32,
            kind,
            formation: Vec3::new(angle.cos() * radius, y, angle.sin() * radius),
            scattered: random_in_box(rng, Vec3::splat(SCATTER_EXTENT)),
            color: color.to_string(),
            scale,
            image_ref,
        });
    }

    descriptors
}

pub fn generate_dust<R: Rng>(count: usize, rng: &mut R) -> Vec<DustDescriptor> {
    (0..count)
        .map(|_| {
            let t: f32 = rng.gen();
            let angle = rng.gen::<f32>() * TAU;
            let radius = (1.0 - t) * 5.5 + 0.5;
            DustDescriptor {
                formation: Vec3::new(angle.cos() * radius, t * DUST_HEIGHT, angle.sin() * radius),
                scattered: random_in_box(rng, Vec3::new(60.0, 60.0, 40.0)),
                phase: rng.gen::<f32>() * TAU,
            }
        })
        .collect()
}

/// Re-points photo particles at `photo_refs` in rotation, leaving every
/// position untouched. Returns the number of photos updated.
pub fn assign_photos(descriptors: &mut [ParticleDescriptor], photo_refs: &[String]) -> usize {
    let mut ordinal = 0;
    for descriptor in descriptors
        .iter_mut()
        .filter(|descriptor| descriptor.kind == ParticleKind::Photo)
    {
        descriptor.image_ref = cycle_ref(photo_refs, ordinal);
        ordinal += 1;
    }
    ordinal
}

fn cycle_ref(photo_refs: &[String], ordinal: usize) -> Option<String> {
    if photo_refs.is_empty() {
        return None;
    }
    Some(photo_refs[ordinal % photo_refs.len()].clone())
}

fn random_in_box<R: Rng>(rng: &mut R, extent: Vec3) -> Vec3 {
    Vec3::new(
        (rng.gen::<f32>() - 0.5) * extent.x,
        (rng.gen::<f32>() - 0.5) * extent.y,
        (rng.gen::<f32>() - 0.5) * extent.z,
    )
}
