use crate::Error;

use super::cutoff::expect_hyperparameters;

/// Radial basis families used to expand the distance between a central atom
/// and its neighbors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RadialBasis {
    /// Chebyshev polynomials of the first kind, evaluated on the distance
    /// rescaled from `[lower, upper]` to `[0, 1]`. The basis is zero outside
    /// of `[lower, upper]`.
    Chebyshev {
        lower: f64,
        upper: f64,
    },
    /// Gaussian functions `exp(-(r - r_n)^2 / (2 sigma^2))`, with centers
    /// `r_n` equally spaced between `first` and `last`.
    EquispacedGaussians {
        sigma: f64,
        first: f64,
        last: f64,
    },
}

impl RadialBasis {
    /// Get the radial basis family called `name`, using the given
    /// `hyperparameters`.
    ///
    /// - `"chebyshev"` takes `[lower, upper]`;
    /// - `"equispaced_gaussians"` takes `[sigma, first, last]`.
    pub fn from_name(name: &str, hyperparameters: &[f64]) -> Result<RadialBasis, Error> {
        let basis = match name {
            "chebyshev" => {
                expect_hyperparameters(name, hyperparameters, 2)?;
                RadialBasis::Chebyshev {
                    lower: hyperparameters[0],
                    upper: hyperparameters[1],
                }
            }
            "equispaced_gaussians" => {
                expect_hyperparameters(name, hyperparameters, 3)?;
                RadialBasis::EquispacedGaussians {
                    sigma: hyperparameters[0],
                    first: hyperparameters[1],
                    last: hyperparameters[2],
                }
            }
            _ => {
                return Err(Error::UnknownFamily {
                    kind: "radial basis",
                    name: name.into(),
                });
            }
        };

        basis.validate()?;
        return Ok(basis);
    }

    pub fn validate(&self) -> Result<(), Error> {
        match *self {
            RadialBasis::Chebyshev { lower, upper } => {
                if lower < 0.0 || upper <= lower {
                    return Err(Error::InvalidParameter(format!(
                        "expected 0 <= lower < upper for chebyshev radial basis, got lower={} and upper={}",
                        lower, upper
                    )));
                }
            }
            RadialBasis::EquispacedGaussians { sigma, first, last } => {
                if sigma <= 0.0 {
                    return Err(Error::InvalidParameter(format!(
                        "expected positive sigma for gaussian radial basis, got {}", sigma
                    )));
                }

                if last < first {
                    return Err(Error::InvalidParameter(format!(
                        "expected first <= last for gaussian radial basis, got first={} and last={}",
                        first, last
                    )));
                }
            }
        }
        return Ok(());
    }

    /// Evaluate all the radial basis functions at distance `r`, storing the
    /// values in `values` and the derivatives with respect to `r` in
    /// `derivatives`. The number of basis functions is given by the length of
    /// the slices.
    pub fn compute(&self, r: f64, values: &mut [f64], derivatives: &mut [f64]) {
        assert_eq!(
            values.len(), derivatives.len(),
            "values and derivatives must have the same size"
        );

        match *self {
            RadialBasis::Chebyshev { lower, upper } => {
                values.fill(0.0);
                derivatives.fill(0.0);
                if r < lower || r > upper {
                    return;
                }

                let c = 1.0 / (upper - lower);
                let x = (r - lower) * c;
                for n in 0..values.len() {
                    if n == 0 {
                        values[0] = 1.0;
                        derivatives[0] = 0.0;
                    } else if n == 1 {
                        values[1] = x;
                        derivatives[1] = c;
                    } else {
                        values[n] = 2.0 * x * values[n - 1] - values[n - 2];
                        derivatives[n] = 2.0 * c * values[n - 1]
                            + 2.0 * x * derivatives[n - 1]
                            - derivatives[n - 2];
                    }
                }
            }
            RadialBasis::EquispacedGaussians { sigma, first, last } => {
                let n_basis = values.len();
                let spacing = if n_basis > 1 {
                    (last - first) / (n_basis - 1) as f64
                } else {
                    0.0
                };

                let inv_sigma2 = 1.0 / (sigma * sigma);
                for n in 0..n_basis {
                    let center = first + n as f64 * spacing;
                    let delta = r - center;
                    let value = f64::exp(-0.5 * delta * delta * inv_sigma2);
                    values[n] = value;
                    derivatives[n] = -delta * inv_sigma2 * value;
                }
            }
        }
    }
}
