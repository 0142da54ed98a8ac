use bytemuck::{Pod, Zeroable};
use glam::{DMat4, DVec3, Mat4, Vec3, Vec4};

use crate::error::ShadowError;

pub const CASCADE_COUNT: usize = 3;
pub const DEFAULT_SPLIT_LAMBDA: f32 = 0.95;

/// Bounding radii are rounded up to a multiple of `1 / RADIUS_SNAP`.
const RADIUS_SNAP: f32 = 16.0;
/// Above this |cos| between light direction and up, the up vector is swapped.
const PARALLEL_UP_THRESHOLD: f32 = 0.95;

/// NDC corners of the camera's near face. Depth is `[0, 1]`, so z = 0.
const NEAR_NDC_CORNERS: [DVec3; 4] = [
    DVec3::new(-1.0, 1.0, 0.0),
    DVec3::new(1.0, 1.0, 0.0),
    DVec3::new(1.0, -1.0, 0.0),
    DVec3::new(-1.0, -1.0, 0.0),
];

/// Camera state the cascades are fitted against.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraFrustum {
    pub view: Mat4,
    pub projection: Mat4,
    pub near: f32,
    pub far: f32,
}

fn validate_clip_range(near: f32, far: f32) -> Result<(), ShadowError> {
    if near > 0.0 && far > near && far.is_finite() {
        Ok(())
    } else {
        Err(ShadowError::InvalidClipRange { near, far })
    }
}

/// Normalised depth fraction of each cascade's far boundary.
///
/// Blends a logarithmic and a uniform split by `lambda`. Fractions are
/// strictly increasing for a valid clip range and the last one is exactly 1.
pub fn cascade_splits(near: f32, far: f32, lambda: f32) -> Result<[f32; CASCADE_COUNT], ShadowError> {
    validate_clip_range(near, far)?;

    let range = far - near;
    let ratio = far / near;
    let mut splits = [0.0; CASCADE_COUNT];

    for (i, split) in splits.iter_mut().enumerate() {
        if i + 1 == CASCADE_COUNT {
            *split = 1.0;
            continue;
        }
        let p = (i + 1) as f32 / CASCADE_COUNT as f32;
        let log = near * ratio.powf(p);
        let uniform = near + range * p;
        let d = lambda * (log - uniform) + uniform;
        *split = ((d - near) / range).clamp(0.0, 1.0);
    }

    Ok(splits)
}

/// Up vector for the light view. `preferred` is used unless the light runs
/// nearly parallel to it, then the first other axis that is not is used.
pub fn shadow_up_vector(light_direction: Vec3, preferred: Vec3) -> Vec3 {
    let direction = light_direction.normalize_or_zero();
    let candidates = [preferred.normalize_or_zero(), Vec3::Y, Vec3::Z, Vec3::X];

    for up in candidates {
        if up != Vec3::ZERO && direction.dot(up).abs() <= PARALLEL_UP_THRESHOLD {
            return up;
        }
    }

    // Unreachable for a unit direction: it cannot be near-parallel to all axes.
    Vec3::Y
}

/// World-space corners of the full perspective frustum, near face first.
///
/// Only the near face is unprojected, in f64. Far corners are the near
/// corners scaled along their eye rays by `far / near`, so the far face sits
/// at exactly `far` even when the f32 projection cannot resolve it.
pub fn frustum_corners_world(frustum: &CameraFrustum) -> Result<[Vec3; 8], ShadowError> {
    validate_clip_range(frustum.near, frustum.far)?;

    let inverse_projection = invert(frustum.projection.as_dmat4())?;
    let inverse_view = invert(frustum.view.as_dmat4())?;
    let depth_scale = f64::from(frustum.far) / f64::from(frustum.near);

    let mut corners = [Vec3::ZERO; 8];
    for (i, ndc) in NEAR_NDC_CORNERS.iter().enumerate() {
        let near = inverse_projection.project_point3(*ndc);
        corners[i] = inverse_view.transform_point3(near).as_vec3();
        corners[i + 4] = inverse_view.transform_point3(near * depth_scale).as_vec3();
    }

    if corners.iter().any(|corner| !corner.is_finite()) {
        return Err(ShadowError::DegenerateFrustum);
    }

    Ok(corners)
}

fn invert(matrix: DMat4) -> Result<DMat4, ShadowError> {
    let determinant = matrix.determinant();
    if !determinant.is_finite() || determinant == 0.0 {
        return Err(ShadowError::DegenerateFrustum);
    }
    Ok(matrix.inverse())
}

/// Result of fitting one cascade.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CascadeFit {
    pub light_space: Mat4,
    pub split_depth: f32,
    pub center: Vec3,
    pub radius: f32,
}

/// Fits an orthographic light projection around the frustum slab between the
/// normalised depths `split_start` and `split_end`.
///
/// The slab is bounded by a sphere around its centroid whose radius is
/// rounded up to 1/16 unit, so the projection does not shimmer as the camera
/// moves. `split_depth` is the camera-space depth of the slab's far plane
/// (negative forward).
pub fn fit_cascade(
    frustum: &CameraFrustum,
    light_direction: Vec3,
    up: Vec3,
    split_start: f32,
    split_end: f32,
) -> Result<CascadeFit, ShadowError> {
    validate_clip_range(frustum.near, frustum.far)?;
    if !(0.0..=1.0).contains(&split_start) || !(split_start..=1.0).contains(&split_end) {
        return Err(ShadowError::InvalidSplitRange {
            start: split_start,
            end: split_end,
        });
    }

    let light_direction = light_direction.normalize_or_zero();
    if light_direction == Vec3::ZERO {
        return Err(ShadowError::ZeroLightDirection);
    }

    let mut corners = frustum_corners_world(frustum)?;
    for i in 0..4 {
        let edge = corners[i + 4] - corners[i];
        corners[i + 4] = corners[i] + edge * split_end;
        corners[i] += edge * split_start;
    }

    let center = corners.iter().copied().sum::<Vec3>() / 8.0;
    let radius = corners
        .iter()
        .map(|corner| corner.distance(center))
        .fold(0.0f32, f32::max);
    let radius = (radius * RADIUS_SNAP).ceil() / RADIUS_SNAP;

    let eye = center - light_direction * radius;
    let up = shadow_up_vector(light_direction, up);
    let light_view = Mat4::look_at_rh(eye, center, up);
    let light_projection = Mat4::orthographic_rh(-radius, radius, -radius, radius, 0.0, 2.0 * radius);

    Ok(CascadeFit {
        light_space: light_projection * light_view,
        split_depth: -(frustum.near + split_end * (frustum.far - frustum.near)),
        center,
        radius,
    })
}

/// Shadow state of one cascade for the current frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CascadeShadow {
    pub light_space: Mat4,
    pub split_depth: f32,
}

impl Default for CascadeShadow {
    fn default() -> Self {
        Self {
            light_space: Mat4::IDENTITY,
            split_depth: 0.0,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct CascadeShadowRaw {
    pub light_space: [[f32; 4]; 4],
    /// x holds the split depth; yzw pad to 16 bytes.
    pub split_depth: [f32; 4],
}

impl From<&CascadeShadow> for CascadeShadowRaw {
    fn from(cascade: &CascadeShadow) -> Self {
        Self {
            light_space: cascade.light_space.to_cols_array_2d(),
            split_depth: Vec4::new(cascade.split_depth, 0.0, 0.0, 0.0).to_array(),
        }
    }
}

/// The fixed set of cascades, allocated once and overwritten every frame.
#[derive(Clone, Debug)]
pub struct ShadowCascades {
    cascades: [CascadeShadow; CASCADE_COUNT],
    split_lambda: f32,
}

impl Default for ShadowCascades {
    fn default() -> Self {
        Self::new(DEFAULT_SPLIT_LAMBDA)
    }
}

impl ShadowCascades {
    pub fn new(split_lambda: f32) -> Self {
        Self {
            cascades: [CascadeShadow::default(); CASCADE_COUNT],
            split_lambda,
        }
    }

    pub fn split_lambda(&self) -> f32 {
        self.split_lambda
    }

    /// Recomputes every cascade. On error the previous frame's values are
    /// left untouched.
    pub fn update(
        &mut self,
        frustum: &CameraFrustum,
        light_direction: Vec3,
        up: Vec3,
    ) -> Result<(), ShadowError> {
        let splits = cascade_splits(frustum.near, frustum.far, self.split_lambda)?;

        let mut next = [CascadeShadow::default(); CASCADE_COUNT];
        let mut split_start = 0.0;
        for (cascade, &split_end) in next.iter_mut().zip(splits.iter()) {
            let fit = fit_cascade(frustum, light_direction, up, split_start, split_end)?;
            *cascade = CascadeShadow {
                light_space: fit.light_space,
                split_depth: fit.split_depth,
            };
            split_start = split_end;
        }

        self.cascades = next;
        Ok(())
    }

    pub fn cascades(&self) -> &[CascadeShadow; CASCADE_COUNT] {
        &self.cascades
    }

    pub fn to_raw(&self) -> [CascadeShadowRaw; CASCADE_COUNT] {
        self.cascades.each_ref().map(CascadeShadowRaw::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frustum() -> CameraFrustum {
        let near = 0.1;
        let far = 50.0;
        CameraFrustum {
            view: Mat4::look_at_rh(Vec3::new(0.0, 2.0, 5.0), Vec3::ZERO, Vec3::Y),
            projection: Mat4::perspective_rh(60f32.to_radians(), 16.0 / 9.0, near, far),
            near,
            far,
        }
    }

    #[test]
    fn splits_reject_invalid_clip_range() {
        assert!(matches!(
            cascade_splits(0.0, 10.0, 0.95),
            Err(ShadowError::InvalidClipRange { .. })
        ));
        assert!(matches!(
            cascade_splits(5.0, 5.0, 0.95),
            Err(ShadowError::InvalidClipRange { .. })
        ));
    }

    #[test]
    fn uniform_lambda_gives_even_splits() {
        let splits = cascade_splits(1.0, 4.0, 0.0).unwrap();
        assert!((splits[0] - 1.0 / 3.0).abs() < 1e-6);
        assert!((splits[1] - 2.0 / 3.0).abs() < 1e-6);
        assert_eq!(splits[2], 1.0);
    }

    #[test]
    fn up_vector_swaps_when_light_is_vertical() {
        assert_eq!(shadow_up_vector(Vec3::new(0.3, -1.0, 0.2), Vec3::Y), Vec3::Y);
        assert_eq!(shadow_up_vector(-Vec3::Y, Vec3::Y), Vec3::Z);
        assert_eq!(shadow_up_vector(Vec3::Z, Vec3::Z), Vec3::Y);
    }

    #[test]
    fn frustum_corners_lie_on_clip_planes() {
        let frustum = frustum();
        let corners = frustum_corners_world(&frustum).unwrap();
        for (i, corner) in corners.iter().enumerate() {
            let view_depth = -frustum.view.transform_point3(*corner).z;
            let expected = if i < 4 { frustum.near } else { frustum.far };
            assert!(
                (view_depth - expected).abs() < 1e-4 * expected.max(1.0),
                "corner {i}: depth {view_depth} expected {expected}"
            );
        }
    }

    #[test]
    fn far_corners_reach_far_plane_with_default_clip_range() {
        let near = 0.01;
        let far = 1000.0;
        let frustum = CameraFrustum {
            view: Mat4::look_at_rh(Vec3::new(3.0, 2.0, 5.0), Vec3::ZERO, Vec3::Y),
            projection: Mat4::perspective_rh(60f32.to_radians(), 16.0 / 9.0, near, far),
            near,
            far,
        };

        let corners = frustum_corners_world(&frustum).unwrap();
        for corner in &corners[4..] {
            let view_depth = -frustum.view.transform_point3(*corner).z;
            assert!((view_depth - far).abs() < 0.05, "far depth {view_depth}");
        }
    }

    #[test]
    fn singular_camera_is_rejected() {
        let singular = CameraFrustum {
            view: Mat4::ZERO,
            ..frustum()
        };
        assert_eq!(
            frustum_corners_world(&singular),
            Err(ShadowError::DegenerateFrustum)
        );
    }

    #[test]
    fn radius_is_snapped_to_sixteenths() {
        let fit = fit_cascade(&frustum(), Vec3::new(0.4, -1.0, 0.2), Vec3::Y, 0.0, 0.3).unwrap();
        let scaled = fit.radius * 16.0;
        assert!((scaled - scaled.round()).abs() < 1e-3);
        assert!(fit.radius > 0.0);
    }

    #[test]
    fn fitted_slab_lands_inside_light_clip_volume() {
        let frustum = frustum();
        let fit = fit_cascade(&frustum, Vec3::new(0.4, -1.0, 0.2), Vec3::Y, 0.0, 0.25).unwrap();

        let center = fit.light_space.project_point3(fit.center);
        assert!(center.truncate().abs_diff_eq(glam::Vec2::ZERO, 1e-4));
        assert!((center.z - 0.5).abs() < 1e-4);
    }

    #[test]
    fn split_depth_is_negative_far_plane_distance() {
        let frustum = frustum();
        let fit = fit_cascade(&frustum, -Vec3::Y, Vec3::Y, 0.2, 0.5).unwrap();
        let expected = -(frustum.near + 0.5 * (frustum.far - frustum.near));
        assert!((fit.split_depth - expected).abs() < 1e-5);
    }

    #[test]
    fn invalid_split_range_is_rejected() {
        assert!(matches!(
            fit_cascade(&frustum(), -Vec3::Y, Vec3::Y, 0.6, 0.4),
            Err(ShadowError::InvalidSplitRange { .. })
        ));
        assert_eq!(
            fit_cascade(&frustum(), Vec3::ZERO, Vec3::Y, 0.0, 0.4),
            Err(ShadowError::ZeroLightDirection)
        );
    }

    #[test]
    fn failed_update_keeps_previous_cascades() {
        let mut cascades = ShadowCascades::default();
        cascades.update(&frustum(), Vec3::new(0.4, -1.0, 0.2), Vec3::Y).unwrap();
        let before = *cascades.cascades();

        let result = cascades.update(&frustum(), Vec3::ZERO, Vec3::Y);
        assert_eq!(result, Err(ShadowError::ZeroLightDirection));
        assert_eq!(*cascades.cascades(), before);
    }

    #[test]
    fn raw_layout_is_gpu_friendly() {
        assert_eq!(std::mem::size_of::<CascadeShadowRaw>(), 80);

        let mut cascades = ShadowCascades::default();
        cascades.update(&frustum(), Vec3::new(0.4, -1.0, 0.2), Vec3::Y).unwrap();
        let raw = cascades.to_raw();
        let bytes: &[u8] = bytemuck::cast_slice(&raw);
        assert_eq!(bytes.len(), 80 * CASCADE_COUNT);
        assert_eq!(raw[2].split_depth[0], cascades.cascades()[2].split_depth);
    }
}
