use nalgebra::{Matrix3, Vector3};

/// Below this whole-chain RMSD (in Å) the conformational change is small
/// enough that a Motion Tree mostly decomposes noise. Shells surface this as
/// the advisory `LowMotion` warning; the engine itself does not care.
pub const LOW_MOTION_RMSD: f64 = 1.0;

/// A rigid-body superposition of one point set onto another, with the RMSD
/// of the fit.
#[derive(Clone, Debug)]
pub struct Superposition {
    /// The rotation part of the transform.
    pub rotation: Matrix3<f64>,
    /// The translation applied after rotating.
    pub translation: Vector3<f64>,
    /// Root-mean-square deviation of the transformed points from their
    /// targets, in Å.
    pub rmsd: f64,
}

impl Superposition {
    /// Apply the transform to a point.
    pub fn apply(&self, p: [f64; 3]) -> [f64; 3] {
        let q = self.rotation * Vector3::from(p) + self.translation;
        [q.x, q.y, q.z]
    }
}

/// Compute the least-squares rigid superposition of `moving` onto `fixed`
/// with the Kabsch algorithm, pairing points by index.
///
/// Reflections are excluded: the determinant correction keeps the result a
/// proper rotation even for degenerate (e.g. planar) point sets.
///
/// # Panics
///
/// Panics if the two slices differ in length.
pub fn superpose(moving: &[[f64; 3]], fixed: &[[f64; 3]]) -> Superposition {
    assert_eq!(moving.len(), fixed.len(), "point sets must pair up one to one");
    let n = moving.len();
    if n == 0 {
        return Superposition {
            rotation: Matrix3::identity(),
            translation: Vector3::zeros(),
            rmsd: 0.0,
        };
    }

    let scale = 1.0 / n as f64;
    let centroid = |pts: &[[f64; 3]]| {
        pts.iter().fold(Vector3::zeros(), |acc, p| acc + Vector3::from(*p)) * scale
    };
    let c_moving = centroid(moving);
    let c_fixed = centroid(fixed);

    let mut covariance = Matrix3::zeros();
    for (m, f) in moving.iter().zip(fixed) {
        let m = Vector3::from(*m) - c_moving;
        let f = Vector3::from(*f) - c_fixed;
        covariance += m * f.transpose();
    }

    let svd = covariance.svd(true, true);
    let (u, v_t) = match (svd.u, svd.v_t) {
        (Some(u), Some(v_t)) => (u, v_t),
        _ => unreachable!("svd was computed with both factors"),
    };
    let mut correction = Matrix3::identity();
    if (v_t.transpose() * u.transpose()).determinant() < 0.0 {
        correction[(2, 2)] = -1.0;
    }
    let rotation = v_t.transpose() * correction * u.transpose();
    let translation = c_fixed - rotation * c_moving;

    let mut sum_sq = 0.0;
    for (m, f) in moving.iter().zip(fixed) {
        let residual = rotation * Vector3::from(*m) + translation - Vector3::from(*f);
        sum_sq += residual.norm_squared();
    }
    let rmsd = (sum_sq * scale).sqrt();

    Superposition { rotation, translation, rmsd }
}
