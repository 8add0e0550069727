use log::{debug, warn};

use crate::{Error, Vector3D};
use super::Structure;

/// Squared distance below which two atoms are considered suspiciously close
const CLOSE_ATOMS_DISTANCE2: f64 = 1e-3;

/// A single neighbor of a central atom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// index of the neighbor atom in the structure
    pub atom: usize,
    /// species of the neighbor atom
    pub species: i32,
    /// vector going from the central atom to this periodic image of the
    /// neighbor atom
    pub vector: Vector3D,
    /// norm of `vector`
    pub distance: f64,
    /// number of lattice translations applied to the wrapped position of the
    /// neighbor atom to get this image
    pub cell_shift: [i32; 3],
}

/// The environment of a central atom: all the periodic images of all atoms
/// within a spherical cutoff around it.
///
/// Neighbors are sorted by atom index, and then by cell shift in
/// lexicographic order.
#[derive(Debug, Clone)]
pub struct LocalEnvironment {
    center: usize,
    species: i32,
    cutoff: f64,
    neighbors: Vec<Neighbor>,
}

impl LocalEnvironment {
    /// Find all neighbors of atom `center` in the `structure`, up to `cutoff`
    /// (included).
    ///
    /// The periodic images of the central atom are part of its environment,
    /// the atom itself is not.
    #[time_graph::instrument(name = "LocalEnvironment::new")]
    pub fn new(structure: &Structure, center: usize, cutoff: f64) -> Result<LocalEnvironment, Error> {
        if center >= structure.size() {
            return Err(Error::InvalidParameter(format!(
                "central atom index is out of bounds: got {}, but the structure contains {} atoms",
                center, structure.size()
            )));
        }

        if !(cutoff > 0.0 && cutoff.is_finite()) {
            return Err(Error::InvalidParameter(format!(
                "cutoff must be a finite positive number, got {}", cutoff
            )));
        }

        let cell = structure.cell();
        let species = structure.species();
        let positions = structure.wrapped_positions();

        let extent = cell.search_extent(cutoff)?;
        let cutoff2 = cutoff * cutoff;
        let center_position = positions[center];

        let mut neighbors = Vec::new();
        for (atom, &position) in positions.iter().enumerate() {
            let direct = position - center_position;
            for a in -extent[0]..=extent[0] {
                for b in -extent[1]..=extent[1] {
                    for c in -extent[2]..=extent[2] {
                        let cell_shift = [a, b, c];
                        if atom == center && cell_shift == [0, 0, 0] {
                            continue;
                        }

                        let vector = direct + cell.shift_vector(cell_shift);
                        let distance2 = vector.norm2();
                        if distance2 > cutoff2 {
                            continue;
                        }

                        if distance2 < CLOSE_ATOMS_DISTANCE2 {
                            warn!(
                                "atoms {} and {} are very close to one another ({} A)",
                                center, atom, distance2.sqrt()
                            );
                        }

                        neighbors.push(Neighbor {
                            atom: atom,
                            species: species[atom],
                            vector: vector,
                            distance: distance2.sqrt(),
                            cell_shift: cell_shift,
                        });
                    }
                }
            }
        }

        debug!(
            "found {} neighbors around atom {} within {} A (searched {:?} cell shifts)",
            neighbors.len(), center, cutoff, extent
        );

        return Ok(LocalEnvironment {
            center: center,
            species: species[center],
            cutoff: cutoff,
            neighbors: neighbors,
        });
    }

    /// Create an environment from an already computed list of `neighbors`
    pub fn from_neighbors(center: usize, species: i32, cutoff: f64, neighbors: Vec<Neighbor>) -> LocalEnvironment {
        LocalEnvironment { center, species, cutoff, neighbors }
    }

    /// Index of the central atom in the structure
    pub fn center(&self) -> usize {
        self.center
    }

    /// Species of the central atom
    pub fn species(&self) -> i32 {
        self.species
    }

    /// Cutoff radius used to find the neighbors
    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// All the neighbors of the central atom
    pub fn neighbors(&self) -> &[Neighbor] {
        &self.neighbors
    }

    /// Number of neighbors of the central atom
    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }
}
