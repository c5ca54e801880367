//! Scene data model: particle descriptors, device classes, media lists.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Particle category; also the render batch key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParticleKind {
    Leaf,
    Light,
    OrnamentSphere,
    OrnamentBox,
    OrnamentGem,
    OrnamentHeptagram,
    Photo,
}

impl ParticleKind {
    pub const ALL: [ParticleKind; 7] = [
        ParticleKind::Leaf,
        ParticleKind::Light,
        ParticleKind::OrnamentSphere,
        ParticleKind::OrnamentBox,
        ParticleKind::OrnamentGem,
        ParticleKind::OrnamentHeptagram,
        ParticleKind::Photo,
    ];

    pub fn is_focusable(self) -> bool {
        self == ParticleKind::Photo
    }
}

/// Immutable per-particle record created at scene build time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticleDescriptor {
    pub id: u32,
    pub kind: ParticleKind,
    /// Position inside the assembled tree.
    pub formation: Vec3,
    /// Position after the tree has been exploded.
    pub scattered: Vec3,
    /// Hex color, e.g. `#FFD700`.
    pub color: String,
    pub scale: f32,
    /// Image reference for photo particles.
    #[serde(default)]
    pub image_ref: Option<String>,
}

impl ParticleDescriptor {
    pub fn target(&self, exploded: bool) -> Vec3 {
        if exploded {
            self.scattered
        } else {
            self.formation
        }
    }
}

/// Ambient "dust" particle driven by spring dynamics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DustDescriptor {
    pub formation: Vec3,
    pub scattered: Vec3,
    /// Phase offset for the bob and pulse animation (radians).
    pub phase: f32,
}

/// Device class used to pick population sizes and detection cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceClass {
    #[default]
    Desktop,
    Constrained,
}

/// Population sizes for one device class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulationProfile {
    pub tree_count: usize,
    pub dust_count: usize,
    /// Run hand detection on every n-th render frame.
    pub detection_frame_skip: u32,
}

impl PopulationProfile {
    pub fn for_class(class: DeviceClass) -> Self {
        match class {
            DeviceClass::Desktop => Self {
                tree_count: 2_500,
                dust_count: 1_500,
                detection_frame_skip: 1,
            },
            DeviceClass::Constrained => Self {
                tree_count: 1_200,
                dust_count: 600,
                detection_frame_skip: 2,
            },
        }
    }
}

/// One entry of the ambient music playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: u32,
    pub name: String,
    pub url: String,
}

/// One timed subtitle line of the cinematic message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtitleCue {
    /// Milliseconds since the message started.
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_target_follows_explosion_flag() {
        let descriptor = ParticleDescriptor {
            id: 3,
            kind: ParticleKind::Photo,
            formation: Vec3::new(1.0, 2.0, 3.0),
            scattered: Vec3::new(-4.0, 5.0, -6.0),
            color: "#ffffff".to_string(),
            scale: 2.0,
            image_ref: Some("memories/a.jpg".to_string()),
        };

        assert_eq!(descriptor.target(false), descriptor.formation);
        assert_eq!(descriptor.target(true), descriptor.scattered);
        assert!(descriptor.kind.is_focusable());
    }

    #[test]
    fn particle_kind_uses_kebab_case() {
        let json = serde_json::to_string(&ParticleKind::OrnamentHeptagram).expect("serialize kind");
        assert_eq!(json, "\"ornament-heptagram\"");
    }

    #[test]
    fn constrained_profile_is_smaller_and_skips_detection_frames() {
        let desktop = PopulationProfile::for_class(DeviceClass::Desktop);
        let constrained = PopulationProfile::for_class(DeviceClass::Constrained);
        assert!(constrained.tree_count < desktop.tree_count);
        assert!(constrained.dust_count < desktop.dust_count);
        assert_eq!(constrained.detection_frame_skip, 2);
    }
}
