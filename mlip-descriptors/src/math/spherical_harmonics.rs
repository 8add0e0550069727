//! Real spherical harmonics of neighbor vectors, and their derivatives with
//! respect to the Cartesian components of the vector.
//!
//! The normalized associated Legendre polynomials are computed with the
//! recurrence from <https://arxiv.org/abs/1410.1748>. The real harmonics follow
//! the convention from
//! <https://en.wikipedia.org/wiki/Spherical_harmonics#Real_form>, without the
//! Condon-Shortley phase.

use std::f64::consts::SQRT_2;

use crate::Vector3D;

/// `\sqrt{\frac{1}{2 \pi}}`
const SQRT_1_OVER_2PI: f64 = 0.3989422804014327;
/// `\sqrt{3}`
const SQRT_3: f64 = 1.7320508075688772;
/// `\sqrt{3 / 2}`
const SQRT_3_OVER_2: f64 = 1.224744871391589;

/// Position of the `(l, m)` spherical harmonic in the arrays returned by
/// [`SphericalHarmonics::values`] and [`SphericalHarmonics::gradients`], for
/// `-l <= m <= l`.
#[inline]
pub fn lm_index(l: usize, m: isize) -> usize {
    debug_assert!(m.unsigned_abs() <= l);
    ((l * l + l) as isize + m) as usize
}

/// Position of `P_l^m` in the triangular storage used for Legendre
/// polynomials, for `0 <= m <= l`.
#[inline]
fn legendre_index(l: usize, m: usize) -> usize {
    debug_assert!(m <= l);
    l * (l + 1) / 2 + m
}

/// Real spherical harmonics `Y_l^m(v / |v|)` for all `0 <= l <= max_angular`,
/// together with their gradients with respect to `v`.
///
/// Results are stored in flat arrays of size `(max_angular + 1)^2`, see
/// [`lm_index`]. The arrays are re-used from one call to `compute` to the next.
#[derive(Debug, Clone)]
pub struct SphericalHarmonics {
    max_angular: usize,
    /// `(a, b)` coefficients of the `P_l^m` recurrence, for `l >= 2` and
    /// `m < l - 1`
    recurrence: Vec<(f64, f64)>,
    /// `P_l^m(cos θ)`
    legendre: Vec<f64>,
    /// `sqrt((l + m) (l - m + 1)) P_l^{m - 1} - sqrt((l - m) (l + m + 1)) P_l^{m + 1}`
    legendre_delta: Vec<f64>,
    /// `m P_l^m / sin θ`
    legendre_over_sin: Vec<f64>,
    values: Vec<f64>,
    gradients: [Vec<f64>; 3],
}

impl SphericalHarmonics {
    /// Create a new `SphericalHarmonics` up to `max_angular`, pre-computing
    /// the recurrence coefficients
    pub fn new(max_angular: usize) -> SphericalHarmonics {
        let n_legendre = (max_angular + 1) * (max_angular + 2) / 2;
        let n_lm = (max_angular + 1) * (max_angular + 1);

        let mut recurrence = vec![(0.0, 0.0); n_legendre];
        for l in 2..=max_angular {
            let l2 = (l * l) as f64;
            let lm1_2 = ((l - 1) * (l - 1)) as f64;
            for m in 0..(l - 1) {
                let m2 = (m * m) as f64;
                recurrence[legendre_index(l, m)] = (
                    f64::sqrt((4.0 * l2 - 1.0) / (l2 - m2)),
                    -f64::sqrt((lm1_2 - m2) / (4.0 * lm1_2 - 1.0)),
                );
            }
        }

        SphericalHarmonics {
            max_angular,
            recurrence,
            legendre: vec![0.0; n_legendre],
            legendre_delta: vec![0.0; n_legendre],
            legendre_over_sin: vec![0.0; n_legendre],
            values: vec![0.0; n_lm],
            gradients: [vec![0.0; n_lm], vec![0.0; n_lm], vec![0.0; n_lm]],
        }
    }

    /// Values computed by the last call to `compute`
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Gradients with respect to the x, y and z components of the vector
    /// given to the last call to `compute`
    pub fn gradients(&self) -> [&[f64]; 3] {
        [&self.gradients[0], &self.gradients[1], &self.gradients[2]]
    }

    fn compute_legendre(&mut self, cos_theta: f64, sin_theta: f64) {
        let p = &mut self.legendre;

        // P_l^l, updated as l grows
        let mut diagonal = SQRT_1_OVER_2PI;
        p[legendre_index(0, 0)] = diagonal;
        if self.max_angular == 0 {
            return;
        }

        p[legendre_index(1, 0)] = SQRT_3 * cos_theta * diagonal;
        diagonal *= -SQRT_3_OVER_2 * sin_theta;
        p[legendre_index(1, 1)] = diagonal;

        for l in 2..=self.max_angular {
            for m in 0..(l - 1) {
                let (a, b) = self.recurrence[legendre_index(l, m)];
                p[legendre_index(l, m)] = a * (cos_theta * p[legendre_index(l - 1, m)] + b * p[legendre_index(l - 2, m)]);
            }

            p[legendre_index(l, l - 1)] = cos_theta * f64::sqrt(2.0 * l as f64 + 1.0) * diagonal;
            diagonal *= -f64::sqrt(1.0 + 0.5 / l as f64) * sin_theta;
            p[legendre_index(l, l)] = diagonal;
        }
    }

    fn compute_legendre_derivatives(&mut self, cos_theta: f64, sin_theta: f64) {
        let p = &self.legendre;
        let delta = &mut self.legendre_delta;

        delta[legendre_index(0, 0)] = 0.0;
        for l in 1..=self.max_angular {
            for m in 0..=l {
                let below = if m == 0 {
                    // P_l^{-1} = -P_l^1 / (l (l + 1))
                    -p[legendre_index(l, 1)] / ((l * l + l) as f64)
                } else {
                    p[legendre_index(l, m - 1)]
                };
                let above = if m == l { 0.0 } else { p[legendre_index(l, m + 1)] };

                delta[legendre_index(l, m)] = f64::sqrt(((l + m) * (l - m + 1)) as f64) * below
                    - f64::sqrt(((l - m) * (l + m + 1)) as f64) * above;
            }
        }

        // m P_l^m / sin θ is singular at the poles, where we use the equal
        // -∆P_l^m / (2 cos θ) instead
        let over_sin = &mut self.legendre_over_sin;
        for l in 0..=self.max_angular {
            for m in 0..=l {
                let i = legendre_index(l, m);
                over_sin[i] = if sin_theta > 0.1 {
                    m as f64 / sin_theta * p[i]
                } else {
                    -0.5 / cos_theta * delta[i]
                };
            }
        }
    }

    /// Compute all spherical harmonics of `vector / |vector|` and their
    /// gradients with respect to `vector`.
    ///
    /// # Panics
    ///
    /// If `vector` is zero.
    #[time_graph::instrument(name = "SphericalHarmonics::compute")]
    pub fn compute(&mut self, vector: Vector3D) {
        let r = vector.norm();
        assert!(r > 0.0, "can not compute spherical harmonics of a zero vector");
        let inv_r = 1.0 / r;
        let direction = vector * inv_r;

        let cos_theta = direction[2];
        let sin_theta = f64::hypot(direction[0], direction[1]);
        let (cos_phi, sin_phi) = if sin_theta > f64::EPSILON {
            (direction[0] / sin_theta, direction[1] / sin_theta)
        } else {
            (1.0, 0.0)
        };

        self.compute_legendre(cos_theta, sin_theta);
        self.compute_legendre_derivatives(cos_theta, sin_theta);

        let p = &self.legendre;
        let values = &mut self.values;
        let [grad_x, grad_y, grad_z] = &mut self.gradients;

        for l in 0..=self.max_angular {
            let i = lm_index(l, 0);
            values[i] = p[legendre_index(l, 0)] / SQRT_2;

            if l == 0 {
                grad_x[i] = 0.0;
                grad_y[i] = 0.0;
                grad_z[i] = 0.0;
            } else {
                // dY_l^0/dθ, divided by r
                let d_theta = inv_r * f64::sqrt(0.5 * (l * (l + 1)) as f64) * p[legendre_index(l, 1)];
                grad_x[i] = cos_phi * cos_theta * d_theta;
                grad_y[i] = sin_phi * cos_theta * d_theta;
                grad_z[i] = -sin_theta * d_theta;
            }
        }

        let mut cos_m_phi = 1.0;
        let mut sin_m_phi = 0.0;
        let mut phase = 1.0;
        for m in 1..=self.max_angular {
            (cos_m_phi, sin_m_phi) = (
                cos_m_phi * cos_phi - sin_m_phi * sin_phi,
                sin_m_phi * cos_phi + cos_m_phi * sin_phi,
            );
            // cancels the Condon-Shortley phase carried by P_l^m
            phase = -phase;
            let cos_m = phase * cos_m_phi;
            let sin_m = phase * sin_m_phi;

            for l in m..=self.max_angular {
                let k = legendre_index(l, m);
                let positive = lm_index(l, m as isize);
                let negative = lm_index(l, -(m as isize));

                values[positive] = p[k] * cos_m;
                values[negative] = p[k] * sin_m;

                let delta = inv_r * self.legendre_delta[k];
                let over_sin = inv_r * self.legendre_over_sin[k];

                grad_x[positive] = sin_phi * over_sin * sin_m - 0.5 * cos_theta * cos_phi * cos_m * delta;
                grad_x[negative] = -sin_phi * over_sin * cos_m - 0.5 * cos_theta * cos_phi * sin_m * delta;

                grad_y[positive] = -cos_phi * over_sin * sin_m - 0.5 * cos_theta * sin_phi * cos_m * delta;
                grad_y[negative] = cos_phi * over_sin * cos_m - 0.5 * cos_theta * sin_phi * sin_m * delta;

                grad_z[positive] = 0.5 * sin_theta * cos_m * delta;
                grad_z[negative] = 0.5 * sin_theta * sin_m * delta;
            }
        }
    }
}
