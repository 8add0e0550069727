use std::cell::RefCell;

use log::warn;
use ndarray::{s, Array1, Array2, Axis};
use rayon::prelude::*;
use thread_local::ThreadLocal;

use crate::math::{CutoffFunction, RadialBasis, SphericalHarmonics};
use crate::systems::{LocalEnvironment, Neighbor, Structure};
use crate::Error;

/// Neighbors closer than this distance to the central atom do not define a
/// direction, and can not be used to compute single-bond descriptors
const MIN_NEIGHBOR_DISTANCE: f64 = 1e-6;

/// Parameters for single-bond descriptors.
///
/// Single-bond descriptors expand the density of neighbors of each species
/// around a central atom on a radial basis times real spherical harmonics.
/// The contribution of each neighbor is smoothly switched off at the cutoff.
#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SingleBondParameters {
    /// Spherical cutoff to use for atomic environments
    pub cutoff: f64,
    /// Number of radial basis functions to use in the expansion
    pub max_radial: usize,
    /// Maximal angular momentum of the spherical harmonics to use in the
    /// expansion
    pub max_angular: usize,
    /// Number of species in the structures. Species are labeled from 0 to
    /// `n_species - 1`
    pub n_species: usize,
    /// Name of the radial basis family (`chebyshev` or `equispaced_gaussians`)
    pub radial_basis: String,
    /// Hyperparameters of the radial basis
    pub radial_hyperparameters: Vec<f64>,
    /// Name of the cutoff function family (`cosine` or `shifted_cosine`)
    pub cutoff_function: String,
    /// Hyperparameters of the cutoff function
    #[serde(default)]
    pub cutoff_hyperparameters: Vec<f64>,
}

/// Single-bond descriptor of one central atom, together with its gradients.
#[derive(Debug, Clone, PartialEq)]
pub struct SingleBond {
    /// Values of the descriptor, the feature for species `s`, radial basis
    /// function `n` and spherical harmonic `(l, m)` is at index
    /// `s * max_radial * (max_angular + 1)^2 + n * (max_angular + 1)^2 + l^2 + l + m`
    pub values: Array1<f64>,
    /// Gradients of the values with respect to the position of each neighbor,
    /// the row `3 * k + α` contains the derivative with respect to the
    /// `α` Cartesian component of the vector between the central atom and
    /// neighbor `k`
    pub force_gradients: Array2<f64>,
    /// Derivative of the values with respect to strain, the 6 rows
    /// correspond to `xx, xy, xz, yy, yz, zz`
    pub stress_gradients: Array2<f64>,
    center: usize,
    neighbors: Vec<usize>,
}

impl SingleBond {
    /// Create a new descriptor with all values and gradients set to zero, for
    /// the `center` atom and a list of neighbor `atoms`.
    pub fn new(center: usize, neighbors: Vec<usize>, n_features: usize) -> SingleBond {
        SingleBond {
            values: Array1::zeros(n_features),
            force_gradients: Array2::zeros((3 * neighbors.len(), n_features)),
            stress_gradients: Array2::zeros((6, n_features)),
            center: center,
            neighbors: neighbors,
        }
    }

    /// Index of the central atom
    pub fn center(&self) -> usize {
        self.center
    }

    /// Index of the atom corresponding to each neighbor
    pub fn neighbor_atoms(&self) -> &[usize] {
        &self.neighbors
    }

    /// Number of neighbors in this descriptor
    pub fn n_neighbors(&self) -> usize {
        self.neighbors.len()
    }

    /// Number of features in this descriptor
    pub fn n_features(&self) -> usize {
        self.values.len()
    }

    /// Gradients of the values with respect to the position of the central
    /// atom, as a `3 x n_features` array. Moving the central atom moves all
    /// neighbor vectors in the opposite direction.
    pub fn central_force_gradients(&self) -> Array2<f64> {
        let mut gradients = Array2::zeros((3, self.n_features()));
        for (row, gradient) in self.force_gradients.axis_iter(Axis(0)).enumerate() {
            let mut central = gradients.index_axis_mut(Axis(0), row % 3);
            central -= &gradient;
        }
        return gradients;
    }

    /// Gradients of the values with respect to the positions of all atoms in
    /// a structure containing `n_atoms`, as a `3 n_atoms x n_features` array.
    ///
    /// Periodic images of the same atom are summed together, including
    /// images of the central atom.
    pub fn atom_force_gradients(&self, n_atoms: usize) -> Result<Array2<f64>, Error> {
        if self.center >= n_atoms {
            return Err(Error::InvalidParameter(format!(
                "central atom {} is out of bounds for a structure with {} atoms",
                self.center, n_atoms
            )));
        }

        if let Some(atom) = self.neighbors.iter().find(|&&atom| atom >= n_atoms) {
            return Err(Error::InvalidParameter(format!(
                "neighbor atom {} is out of bounds for a structure with {} atoms",
                atom, n_atoms
            )));
        }

        let mut gradients = Array2::zeros((3 * n_atoms, self.n_features()));
        for (k, &atom) in self.neighbors.iter().enumerate() {
            for xyz in 0..3 {
                let gradient = self.force_gradients.index_axis(Axis(0), 3 * k + xyz);

                let mut neighbor = gradients.index_axis_mut(Axis(0), 3 * atom + xyz);
                neighbor += &gradient;

                let mut central = gradients.index_axis_mut(Axis(0), 3 * self.center + xyz);
                central -= &gradient;
            }
        }

        return Ok(gradients);
    }
}

/// Scratch memory used to evaluate the basis functions for one neighbor
#[derive(Debug, Clone)]
struct BasisCache {
    radial: Vec<f64>,
    radial_derivatives: Vec<f64>,
    spherical_harmonics: SphericalHarmonics,
}

impl BasisCache {
    fn new(parameters: &SingleBondParameters) -> BasisCache {
        BasisCache {
            radial: vec![0.0; parameters.max_radial],
            radial_derivatives: vec![0.0; parameters.max_radial],
            spherical_harmonics: SphericalHarmonics::new(parameters.max_angular),
        }
    }
}

/// Calculator for single-bond descriptors and their gradients.
///
/// The calculator only needs a shared reference to compute descriptors, and
/// can be used from multiple threads at the same time.
pub struct SingleBondCalculator {
    parameters: SingleBondParameters,
    radial_basis: RadialBasis,
    cutoff_function: CutoffFunction,
    cache: ThreadLocal<RefCell<BasisCache>>,
}

impl std::fmt::Debug for SingleBondCalculator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.parameters)
    }
}

impl SingleBondCalculator {
    /// Create a new calculator with the given parameters
    pub fn new(parameters: SingleBondParameters) -> Result<SingleBondCalculator, Error> {
        if !(parameters.cutoff > 0.0 && parameters.cutoff.is_finite()) {
            return Err(Error::InvalidParameter(format!(
                "cutoff must be a finite positive number, got {}", parameters.cutoff
            )));
        }

        if parameters.max_radial == 0 {
            return Err(Error::InvalidParameter(
                "max_radial must be at least 1".into()
            ));
        }

        if parameters.n_species == 0 {
            return Err(Error::InvalidParameter(
                "n_species must be at least 1".into()
            ));
        }

        let radial_basis = RadialBasis::from_name(
            &parameters.radial_basis,
            &parameters.radial_hyperparameters,
        )?;

        let cutoff_function = CutoffFunction::from_name(
            &parameters.cutoff_function,
            &parameters.cutoff_hyperparameters,
        )?;

        if let CutoffFunction::ShiftedCosine { width } = cutoff_function {
            if width > parameters.cutoff {
                return Err(Error::InvalidParameter(format!(
                    "shifted cosine width ({}) must be smaller than the cutoff ({})",
                    width, parameters.cutoff
                )));
            }
        }

        return Ok(SingleBondCalculator {
            parameters,
            radial_basis,
            cutoff_function,
            cache: ThreadLocal::new(),
        });
    }

    /// Create a new calculator from parameters serialized as JSON
    pub fn from_json(json: &str) -> Result<SingleBondCalculator, Error> {
        let parameters = serde_json::from_str::<SingleBondParameters>(json)?;
        return SingleBondCalculator::new(parameters);
    }

    /// Get the parameters used to create this calculator
    pub fn parameters(&self) -> &SingleBondParameters {
        &self.parameters
    }

    /// Get the parameters used to create this calculator, serialized as JSON
    pub fn get_parameters(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(&self.parameters)?)
    }

    /// Get the JSON schema of the parameters
    pub fn json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(SingleBondParameters)
    }

    /// Number of features in the descriptors produced by this calculator
    pub fn n_features(&self) -> usize {
        let n_lm = (self.parameters.max_angular + 1) * (self.parameters.max_angular + 1);
        return self.parameters.n_species * self.parameters.max_radial * n_lm;
    }

    /// Add the contribution of a single `neighbor` to the values and
    /// gradients in `output`. The force gradients are stored in the rows
    /// corresponding to `neighbor_index`.
    pub fn single_bond_update_env(
        &self,
        neighbor: &Neighbor,
        neighbor_index: usize,
        output: &mut SingleBond,
    ) -> Result<(), Error> {
        let n_species = self.parameters.n_species;
        if neighbor.species < 0 || neighbor.species as usize >= n_species {
            return Err(Error::InvalidParameter(format!(
                "neighbor species must be between 0 and {}, got {}",
                n_species - 1, neighbor.species
            )));
        }

        if output.n_features() != self.n_features() {
            return Err(Error::ShapeMismatch(format!(
                "expected a descriptor with {} features, got {}",
                self.n_features(), output.n_features()
            )));
        }

        if neighbor_index >= output.n_neighbors() {
            return Err(Error::InvalidParameter(format!(
                "neighbor index {} is out of bounds for a descriptor with {} neighbors",
                neighbor_index, output.n_neighbors()
            )));
        }

        let vector = neighbor.vector;
        let r = vector.norm();
        if r < MIN_NEIGHBOR_DISTANCE {
            return Err(Error::DegenerateGeometry(format!(
                "atom {} is at distance {} of the central atom {}",
                neighbor.atom, r, output.center
            )));
        }

        let cutoff = self.parameters.cutoff;
        if r >= cutoff {
            return Ok(());
        }

        let mut cache = self.cache.get_or(|| {
            RefCell::new(BasisCache::new(&self.parameters))
        }).borrow_mut();
        let cache = &mut *cache;

        self.radial_basis.compute(r, &mut cache.radial, &mut cache.radial_derivatives);
        let f_cut = self.cutoff_function.compute(r, cutoff);
        let f_cut_derivative = self.cutoff_function.derivative(r, cutoff);

        let direction = vector / r;
        cache.spherical_harmonics.compute(vector);
        let sph_values = cache.spherical_harmonics.values();
        let sph_gradients = cache.spherical_harmonics.gradients();

        let n_lm = sph_values.len();
        let max_radial = self.parameters.max_radial;
        let species_start = neighbor.species as usize * max_radial * n_lm;

        let values = &mut output.values;
        let mut force_gradients = output.force_gradients.slice_mut(s![3 * neighbor_index..3 * neighbor_index + 3, ..]);
        let stress_gradients = &mut output.stress_gradients;

        for n in 0..max_radial {
            let g = cache.radial[n] * f_cut;
            let g_derivative = cache.radial_derivatives[n] * f_cut + cache.radial[n] * f_cut_derivative;

            let start = species_start + n * n_lm;
            for lm in 0..n_lm {
                let y = sph_values[lm];
                let feature = start + lm;

                values[feature] += g * y;

                let mut gradient = [0.0; 3];
                for xyz in 0..3 {
                    gradient[xyz] = g_derivative * direction[xyz] * y + g * sph_gradients[xyz][lm];
                    force_gradients[[xyz, feature]] += gradient[xyz];
                }

                stress_gradients[[0, feature]] += gradient[0] * vector[0];
                stress_gradients[[1, feature]] += gradient[0] * vector[1];
                stress_gradients[[2, feature]] += gradient[0] * vector[2];
                stress_gradients[[3, feature]] += gradient[1] * vector[1];
                stress_gradients[[4, feature]] += gradient[1] * vector[2];
                stress_gradients[[5, feature]] += gradient[2] * vector[2];
            }
        }

        return Ok(());
    }

    /// Compute the single-bond descriptor of the central atom of
    /// `environment`, summing over all its neighbors
    pub fn single_bond_sum_env(&self, environment: &LocalEnvironment) -> Result<SingleBond, Error> {
        if environment.cutoff() < self.parameters.cutoff {
            warn!(
                "the environment of atom {} was built with a cutoff of {}, smaller than the calculator cutoff ({})",
                environment.center(), environment.cutoff(), self.parameters.cutoff
            );
        }

        return self.single_bond_sum_neighbors(environment.center(), environment.neighbors());
    }

    /// Compute the single-bond descriptor of atom `center` from a list of
    /// `neighbors`. The force gradients follow the order of `neighbors`.
    #[time_graph::instrument(name = "SingleBondCalculator::sum_neighbors")]
    pub fn single_bond_sum_neighbors(&self, center: usize, neighbors: &[Neighbor]) -> Result<SingleBond, Error> {
        let atoms = neighbors.iter().map(|neighbor| neighbor.atom).collect();
        let mut output = SingleBond::new(center, atoms, self.n_features());

        for (neighbor_index, neighbor) in neighbors.iter().enumerate() {
            self.single_bond_update_env(neighbor, neighbor_index, &mut output)?;
        }

        return Ok(output);
    }

    /// Compute the single-bond descriptors of all atoms in the `structure`.
    ///
    /// Central atoms are distributed over the threads of the current rayon
    /// thread pool.
    #[time_graph::instrument(name = "SingleBondCalculator::compute")]
    pub fn compute(&self, structure: &Structure) -> Result<Vec<SingleBond>, Error> {
        let cutoff = self.parameters.cutoff;
        return (0..structure.size())
            .into_par_iter()
            .map(|center| {
                let environment = LocalEnvironment::new(structure, center, cutoff)?;
                self.single_bond_sum_env(&environment)
            })
            .collect();
    }
}
