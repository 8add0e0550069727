use crate::Error;

/// Smooth cutoff functions, windowing the radial basis so that values and
/// derivatives go to zero at the cutoff radius.
///
/// All cutoff functions are 1 with a vanishing derivative at `r = 0`, and
/// exactly 0 (with a vanishing derivative) for `r >= cutoff`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CutoffFunction {
    /// Cosine switching over the whole cutoff sphere
    /// `f(r) = 1/2 * (1 + cos(π r / cutoff))`
    Cosine,
    /// Shifted cosine switching function, 1 up to `cutoff - width`:
    /// `f(r) = 1/2 * (1 + cos(π (r - cutoff + width) / width ))`
    ShiftedCosine {
        width: f64,
    },
}

impl CutoffFunction {
    /// Get the cutoff function family called `name`, using the given
    /// `hyperparameters`.
    ///
    /// - `"cosine"` takes no hyperparameters;
    /// - `"shifted_cosine"` takes a single hyperparameter, the width of the
    ///   switching region.
    pub fn from_name(name: &str, hyperparameters: &[f64]) -> Result<CutoffFunction, Error> {
        let function = match name {
            "cosine" => {
                expect_hyperparameters(name, hyperparameters, 0)?;
                CutoffFunction::Cosine
            }
            "shifted_cosine" => {
                expect_hyperparameters(name, hyperparameters, 1)?;
                CutoffFunction::ShiftedCosine { width: hyperparameters[0] }
            }
            _ => {
                return Err(Error::UnknownFamily {
                    kind: "cutoff function",
                    name: name.into(),
                });
            }
        };

        function.validate()?;
        return Ok(function);
    }

    pub fn validate(&self) -> Result<(), Error> {
        match self {
            CutoffFunction::Cosine => {},
            CutoffFunction::ShiftedCosine { width } => {
                if *width <= 0.0 || !width.is_finite() {
                    return Err(Error::InvalidParameter(format!(
                        "expected positive width for shifted cosine cutoff function, got {}",
                        width
                    )));
                }
            }
        }
        return Ok(());
    }

    /// Evaluate the cutoff function at the distance `r` for the given `cutoff`
    pub fn compute(&self, r: f64, cutoff: f64) -> f64 {
        if r >= cutoff {
            return 0.0;
        }

        match self {
            CutoffFunction::Cosine => {
                0.5 * (1.0 + f64::cos(std::f64::consts::PI * r / cutoff))
            }
            CutoffFunction::ShiftedCosine { width } => {
                if r <= (cutoff - width) {
                    1.0
                } else {
                    let s = std::f64::consts::PI * (r - cutoff + width) / width;
                    0.5 * (1. + f64::cos(s))
                }
            }
        }
    }

    /// Evaluate the derivative of the cutoff function at the distance `r` for
    /// the given `cutoff`
    pub fn derivative(&self, r: f64, cutoff: f64) -> f64 {
        if r >= cutoff {
            return 0.0;
        }

        match self {
            CutoffFunction::Cosine => {
                let factor = std::f64::consts::PI / cutoff;
                -0.5 * factor * f64::sin(factor * r)
            }
            CutoffFunction::ShiftedCosine { width } => {
                if r <= (cutoff - width) {
                    0.0
                } else {
                    let s = std::f64::consts::PI * (r - cutoff + width) / width;
                    -0.5 * std::f64::consts::PI * f64::sin(s) / width
                }
            }
        }
    }
}

/// Check that the family `name` got exactly `count` hyperparameters
pub(crate) fn expect_hyperparameters(name: &str, hyperparameters: &[f64], count: usize) -> Result<(), Error> {
    if hyperparameters.len() != count {
        return Err(Error::InvalidParameter(format!(
            "'{}' expects {} hyperparameter(s), got {}",
            name, count, hyperparameters.len()
        )));
    }

    if let Some(value) = hyperparameters.iter().find(|v| !v.is_finite()) {
        return Err(Error::InvalidParameter(format!(
            "'{}' hyperparameters must be finite, got {}", name, value
        )));
    }

    return Ok(());
}
