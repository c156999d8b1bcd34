use std::f64::consts::{E, PI};

use nalgebra::linalg::SVD;

use crate::constants::ParamMatrix;

/// Iteration cap of the singular value decomposition
const MAX_SVD_ITERATIONS: usize = 10_000;

/// Entropy of the Gaussian whose precision matrix is `m`.
///
/// With `σᵢ` the singular values of `m`:
///
/// ```text
/// H = ½ · ln( ∏_{σᵢ ≠ 0} 1/σᵢ ) + k · √(ln(2πe))
/// ```
///
/// where `k` is the number of singular values, zero ones included.
///
/// Return
/// ----------
/// * `None` if `m` has a non-finite entry or the decomposition does not converge.
pub fn entropy(m: &ParamMatrix) -> Option<f64> {
    if !m.iter().all(|x| x.is_finite()) {
        return None;
    }
    let svd = SVD::try_new(*m, false, false, f64::EPSILON, MAX_SVD_ITERATIONS)?;
    let singular_values = svd.singular_values;

    let reciprocal_product: f64 = singular_values
        .iter()
        .filter(|&&s| s != 0.0)
        .map(|s| 1.0 / s)
        .product();
    let k = singular_values.len() as f64;
    Some(0.5 * reciprocal_product.ln() + k * (2.0 * PI * E).ln().sqrt())
}
