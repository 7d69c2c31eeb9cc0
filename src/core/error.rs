use std::cell::{BorrowError, BorrowMutError};
use thiserror::Error;

/// Static mapping problems: bad or missing attributes, unknown classes or fields.
#[derive(Error, Debug)]
pub enum MappingError {
    #[error("Mapping '{mapping}' in '{class}' requires the attribute '{attribute}'")]
    MissingAttribute {
        class: String,
        mapping: String,
        attribute: String,
    },

    #[error("Unknown reference kind '{0}'")]
    UnknownReferenceKind(String),

    #[error("Unknown sync type '{0}'")]
    UnknownSyncType(String),

    #[error("Wrong mapping type in '{class}': expected '{expected}', found '{found}'")]
    WrongMappingType {
        class: String,
        expected: String,
        found: String,
    },

    #[error("Class '{0}' is not mapped as an object adapter")]
    ClassNotMapped(String),

    #[error("Invalid mapping: the class '{class}' does not have a field named '{field}'")]
    ClassHasNoField { class: String, field: String },

    #[error("The class '{class}' does not have a field mapping for '{field}'")]
    FieldNotFound { class: String, field: String },

    #[error("No reference mapping on {class} for field '{field}'")]
    NoReferenceMapping { class: String, field: String },

    #[error("Property '{field}' in '{class}' was already declared, but it must be declared only once")]
    DuplicateFieldMapping { class: String, field: String },

    #[error("Common field '{field}' in '{class}' targets '{target}', which is not a reference mapping")]
    InvalidCommonFieldTarget {
        class: String,
        field: String,
        target: String,
    },

    #[error("Reference '{field}' in '{class}' targets '{target}', which is not a known type")]
    UnknownTargetType {
        class: String,
        field: String,
        target: String,
    },

    #[error("{0} is not a valid lifecycle callback event")]
    InvalidLifecycleEvent(String),

    #[error("Class '{0}' has no prototype registered and cannot be instantiated")]
    NotInstantiable(String),

    #[error("Invalid mapping document: {0}")]
    InvalidMappingDocument(String),
}

/// Runtime coordination problems raised by the unit of work.
#[derive(Error, Debug)]
pub enum UnitOfWorkError {
    #[error("No object found on {class} with mapped reference object field {field}")]
    MissingReferencedObject { class: String, field: String },

    #[error("Reference {class}::{field} is already scheduled for {existing}, cannot schedule it for {requested}")]
    DuplicateSchedule {
        class: String,
        field: String,
        existing: String,
        requested: String,
    },
}

/// Manager registry problems.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("No manager found for type {kind} and manager name {name}.")]
    ManagerNotFound { kind: String, name: String },

    #[error("Unknown reference type '{0}'")]
    UnknownReferenceType(String),
}

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Mapping error: {0}")]
    Mapping(#[from] MappingError),

    #[error("Unit of work error: {0}")]
    UnitOfWork(#[from] UnitOfWorkError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Borrow error: {0}")]
    Borrow(String),

    #[error("Backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AdapterError>;

impl From<BorrowError> for AdapterError {
    fn from(err: BorrowError) -> Self {
        Self::Borrow(err.to_string())
    }
}

impl From<BorrowMutError> for AdapterError {
    fn from(err: BorrowMutError) -> Self {
        Self::Borrow(err.to_string())
    }
}
