use crate::{Matrix3, Vector3D};
use super::{UnitCell, Structure};

/// Get the test structure with the given `name`. Species are numbered from 0
/// in all test structures.
pub fn test_structure(name: &str) -> Structure {
    match name {
        "triclinic" => get_triclinic(),
        "methane" => get_methane(),
        "water" => get_water(),
        "NaCl" => get_nacl(),
        "wurtzite" => get_wurtzite(),
        _ => panic!("unknown test structure {}", name)
    }
}

fn build(cell: UnitCell, atoms: &[(i32, Vector3D)]) -> Structure {
    let species = atoms.iter().map(|atom| atom.0).collect();
    let positions = atoms.iter().map(|atom| atom.1).collect();
    return Structure::new(cell, species, positions).expect("invalid test structure");
}

/// Skewed cell with atoms far outside of the cell, and one species per atom
fn get_triclinic() -> Structure {
    let cell = Matrix3::new([
        [4.0, 0.5, 0.8],
        [-1.2, 3.9, 0.73],
        [-0.8, 0.1, 4.1],
    ]);
    let cell = UnitCell::new(cell).expect("invalid cell");
    return build(cell, &[
        (0, Vector3D::new(1.2, 0.7, 2.3)),
        (1, Vector3D::new(3.1, 2.5, 8.9)),
        (2, Vector3D::new(-1.8, -5.8, 3.0)),
        (3, Vector3D::new(0.2, 1.1, 2.1)),
        (4, Vector3D::new(3.2, 1.1, 3.3)),
    ]);
}

fn get_methane() -> Structure {
    let cell = UnitCell::cubic(5.0).expect("invalid cell");
    return build(cell, &[
        (0, Vector3D::new(5.0000, 5.0000, 5.0000)),
        (1, Vector3D::new(5.5288, 5.1610, 5.9359)),
        (1, Vector3D::new(5.2051, 5.8240, 4.3214)),
        (1, Vector3D::new(5.3345, 4.0686, 4.5504)),
        (1, Vector3D::new(3.9315, 4.9463, 5.1921)),
    ]);
}

fn get_water() -> Structure {
    let cell = UnitCell::cubic(10.0).expect("invalid cell");
    return build(cell, &[
        (0, Vector3D::new(0.0, 0.0, 0.0)),
        (1, Vector3D::new(0.0, 0.75545, -0.58895)),
        (1, Vector3D::new(0.0, -0.75545, -0.58895)),
    ]);
}

/// NaCl structure
/// Using a primitive unit cell, the distance between the
/// closest Na-Cl pair is exactly 1.
fn get_nacl() -> Structure {
    let cell = Matrix3::new([[0.0, 1.0, 1.0], [1.0, 0.0, 1.0], [1.0, 1.0, 0.0]]);
    let cell = UnitCell::new(cell).expect("invalid cell");
    return build(cell, &[
        (0, Vector3D::new(0.0, 0.0, 0.0)),
        (1, Vector3D::new(1.0, 0.0, 0.0)),
    ]);
}

/// ZnS in wurtzite structure (hexagonal cell)
fn get_wurtzite() -> Structure {
    let u = 3. / 8.;
    let c = f64::sqrt(1. / u);
    let cell = Matrix3::new([[0.5, -0.5 * f64::sqrt(3.0), 0.0], [0.5, 0.5 * f64::sqrt(3.0), 0.0], [0.0, 0.0, c]]);
    let cell = UnitCell::new(cell).expect("invalid cell");
    return build(cell, &[
        (0, Vector3D::new(0.5, 0.5 / f64::sqrt(3.0), 0.0)),
        (1, Vector3D::new(0.5, 0.5 / f64::sqrt(3.0), u * c)),
        (0, Vector3D::new(0.5, -0.5 / f64::sqrt(3.0), 0.5 * c)),
        (1, Vector3D::new(0.5, -0.5 / f64::sqrt(3.0), (0.5 + u) * c)),
    ]);
}
