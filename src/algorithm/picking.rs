//! Pointer raycast against focusable particles.

use glam::Vec3;

use crate::algorithm::camera_engine::CameraPose;
use crate::models::events::CursorPos;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Ray through a normalized cursor (0..1, y down) of a perspective camera.
    pub fn from_cursor(pose: &CameraPose, cursor: CursorPos, fov_deg: f32, aspect: f32) -> Self {
        let ndc_x = cursor.x * 2.0 - 1.0;
        let ndc_y = 1.0 - cursor.y * 2.0;
        let half_height = (fov_deg.to_radians() * 0.5).tan();
        let local = Vec3::new(ndc_x * half_height * aspect.max(1e-3), ndc_y * half_height, -1.0);
        Self {
            origin: pose.position,
            direction: (pose.orientation() * local).normalize(),
        }
    }

    /// Distance along the ray to the first intersection with the sphere.
    pub fn hit_sphere(&self, center: Vec3, radius: f32) -> Option<f32> {
        let to_center = center - self.origin;
        let along = to_center.dot(self.direction);
        let miss_sq = to_center.length_squared() - along * along;
        let radius_sq = radius * radius;
        if miss_sq > radius_sq {
            return None;
        }
        let half_chord = (radius_sq - miss_sq).sqrt();
        let near = along - half_chord;
        let far = along + half_chord;
        if far < 0.0 {
            None
        } else if near >= 0.0 {
            Some(near)
        } else {
            Some(far)
        }
    }
}

/// Nearest candidate whose bounding sphere the ray hits.
pub fn pick_nearest<I>(ray: &Ray, candidates: I, radius: f32) -> Option<u32>
where
    I: IntoIterator<Item = (u32, Vec3)>,
{
    candidates
        .into_iter()
        .filter_map(|(id, center)| ray.hit_sphere(center, radius).map(|distance| (id, distance)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn front_camera() -> CameraPose {
        CameraPose::new(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO)
    }

    #[test]
    fn centre_cursor_points_along_view_direction() {
        let ray = Ray::from_cursor(&front_camera(), CursorPos { x: 0.5, y: 0.5 }, 45.0, 16.0 / 9.0);
        assert!(ray.direction.distance(Vec3::NEG_Z) < 1e-5);
    }

    #[test]
    fn upper_left_cursor_tilts_up_and_left() {
        let ray = Ray::from_cursor(&front_camera(), CursorPos { x: 0.1, y: 0.1 }, 45.0, 1.0);
        assert!(ray.direction.x < 0.0);
        assert!(ray.direction.y > 0.0);
    }

    #[test]
    fn nearest_hit_wins_and_misses_are_ignored() {
        let ray = Ray::from_cursor(&front_camera(), CursorPos { x: 0.5, y: 0.5 }, 45.0, 1.0);
        let candidates = vec![
            (1, Vec3::new(0.0, 0.0, -5.0)),
            (2, Vec3::new(0.0, 0.2, 2.0)),
            (3, Vec3::new(4.0, 0.0, 0.0)),
            (4, Vec3::new(0.0, 0.0, 20.0)),
        ];
        assert_eq!(pick_nearest(&ray, candidates, 0.65), Some(2));
        assert_eq!(pick_nearest(&ray, vec![(3, Vec3::new(4.0, 0.0, 0.0))], 0.65), None);
    }
}
