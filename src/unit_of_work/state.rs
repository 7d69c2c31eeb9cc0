use std::fmt;

/// Tracking state of an object inside one unit of work.
///
/// ```text
/// New ──persist/load──> Managed
///
/// (counterpart scheduled or loaded) ──> Referenced
/// ```
///
/// Nothing moves back to `New` except `clear()`, which forgets every object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectState {
    /// Never persisted, removed or loaded through this unit of work.
    New,

    /// Persisted, removed or loaded as a root object.
    Managed,

    /// Only known as the counterpart of another object.
    Referenced,
}

impl ObjectState {
    pub fn is_tracked(&self) -> bool {
        !matches!(self, ObjectState::New)
    }
}

impl fmt::Display for ObjectState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectState::New => write!(f, "NEW"),
            ObjectState::Managed => write!(f, "MANAGED"),
            ObjectState::Referenced => write!(f, "REFERENCED"),
        }
    }
}
