#[non_exhaustive]
#[derive(Debug)]
pub enum Error {
    /// Got an invalid parameter value in a function
    InvalidParameter(String),
    /// Arrays with inconsistent shapes, e.g. a different number of species
    /// and positions in a structure
    ShapeMismatch(String),
    /// Two atoms (or an atom and one of its periodic images) are too close to
    /// define a direction between them
    DegenerateGeometry(String),
    /// The unit cell matrix can not be inverted
    SingularCell(f64),
    /// A radial basis or cutoff function family was requested by a name we
    /// don't know about
    UnknownFamily {
        /// which kind of family was requested (radial basis, cutoff function)
        kind: &'static str,
        /// the name that was not recognized
        name: String,
    },
    /// Error while serializing/deserializing data
    Json(serde_json::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidParameter(e) => write!(f, "invalid parameter: {}", e),
            Error::ShapeMismatch(e) => write!(f, "shape mismatch: {}", e),
            Error::DegenerateGeometry(e) => write!(f, "degenerate geometry: {}", e),
            Error::SingularCell(determinant) => write!(
                f, "the unit cell matrix is not invertible (determinant = {})", determinant
            ),
            Error::UnknownFamily { kind, name } => write!(f, "unknown {} '{}'", kind, name),
            Error::Json(e) => write!(f, "json error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidParameter(_) |
            Error::ShapeMismatch(_) |
            Error::DegenerateGeometry(_) |
            Error::SingularCell(_) |
            Error::UnknownFamily { .. } => None,
            Error::Json(e) => Some(e),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Error {
        Error::Json(error)
    }
}
