use nalgebra::{Matrix3, Matrix4, Point3, Rotation3, SVD, Vector3};

/// Rigid-body transformation minimizing the RMSD between two corresponding
/// coordinate sets, together with that minimal RMSD.
#[derive(Debug, Clone, PartialEq)]
pub struct Superposition {
    pub rotation: Rotation3<f64>,
    pub translation: Vector3<f64>,
    pub rmsd: f64,
}

impl Superposition {
    /// The distinguished neutral transformation.
    pub fn identity() -> Self {
        Self {
            rotation: Rotation3::identity(),
            translation: Vector3::zeros(),
            rmsd: 0.0,
        }
    }

    pub fn transform_point(&self, point: &Point3<f64>) -> Point3<f64> {
        self.rotation * point + self.translation
    }

    /// 4x4 homogeneous matrix applying rotation then translation.
    pub fn to_homogeneous(&self) -> Matrix4<f64> {
        let mut matrix = self.rotation.to_homogeneous();
        matrix.fixed_view_mut::<3, 1>(0, 3).copy_from(&self.translation);
        matrix
    }
}

/// Optimal superposition of `mobile` onto `reference` via singular-value
/// decomposition of the cross-covariance matrix, with a reflection-correction
/// step guaranteeing a proper rotation (determinant +1).
///
/// Returns `None` for empty or length-mismatched inputs and when the
/// decomposition fails numerically; callers treat such candidates as unscored
/// rather than failing the pipeline.
pub fn superpose(reference: &[Point3<f64>], mobile: &[Point3<f64>]) -> Option<Superposition> {
    if reference.len() != mobile.len() || reference.is_empty() {
        return None;
    }
    let n = reference.len() as f64;

    let centroid_ref = reference
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords)
        / n;
    let centroid_mob = mobile
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords)
        / n;

    let mut covariance = Matrix3::zeros();
    for (r, m) in reference.iter().zip(mobile.iter()) {
        covariance += (m.coords - centroid_mob) * (r.coords - centroid_ref).transpose();
    }

    let svd = SVD::try_new(covariance, true, true, 1.0e-12, 256)?;
    let u = svd.u?;
    let v_t = svd.v_t?;
    let v = v_t.transpose();

    let mut correction = Matrix3::identity();
    if (v * u.transpose()).determinant() < 0.0 {
        correction[(2, 2)] = -1.0;
    }
    let rotation_matrix = v * correction * u.transpose();
    let rotation = Rotation3::from_matrix_unchecked(rotation_matrix);
    let translation = centroid_ref - rotation_matrix * centroid_mob;

    let transformed: Vec<Point3<f64>> = mobile
        .iter()
        .map(|m| Point3::from(rotation_matrix * m.coords + translation))
        .collect();
    let rmsd = calculate_rmsd(reference, &transformed)?;

    Some(Superposition {
        rotation,
        translation,
        rmsd,
    })
}

/// Root-mean-square deviation between two already-aligned coordinate sets.
pub fn calculate_rmsd(coords1: &[Point3<f64>], coords2: &[Point3<f64>]) -> Option<f64> {
    if coords1.len() != coords2.len() || coords1.is_empty() {
        return None;
    }
    let n = coords1.len() as f64;
    let squared_dist_sum: f64 = coords1
        .iter()
        .zip(coords2.iter())
        .map(|(p1, p2)| (p1 - p2).norm_squared())
        .sum();
    Some((squared_dist_sum / n).sqrt())
}
