//! Errors
//!
//! [`TreeError`] is what operations return and propagate with `?`.
//! [`ExError`] is its reporting form: a stable kind and code plus the
//! operation and entity involved, used by the logging macros and the CLI.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TreeError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TreeError {
    /// A subtree query referenced a parent key that no node carries
    #[error("Parent not found: {key}")]
    ParentNotFound { key: String },

    /// No document with this identity exists
    #[error("Node not found: {id}")]
    NodeNotFound { id: String },

    #[error("Store unavailable during {op}: {message}")]
    StoreUnavailable { op: String, message: String },

    /// Stored coordinates violate a nested-set invariant
    #[error("Inconsistent tree state: {reason}")]
    InconsistentState { reason: String },

    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("Primary key already in use: {key}")]
    DuplicateKey { key: String },

    /// Reparenting would put a node underneath itself
    #[error("Cycle detected: node {key} cannot be placed under {parent}")]
    CycleDetected { key: String, parent: String },

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// A writer panicked while holding the tree lock
    #[error("Tree lock poisoned")]
    LockPoisoned,
}

impl TreeError {
    /// Store failure in the named operation
    pub fn store(op: impl Into<String>, message: impl std::fmt::Display) -> Self {
        TreeError::StoreUnavailable {
            op: op.into(),
            message: message.to_string(),
        }
    }

    pub fn inconsistent(reason: impl Into<String>) -> Self {
        TreeError::InconsistentState {
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ExErrorKind {
        match self {
            TreeError::ParentNotFound { .. } => ExErrorKind::ParentNotFound,
            TreeError::NodeNotFound { .. } => ExErrorKind::NotFound,
            TreeError::StoreUnavailable { .. } => ExErrorKind::StoreUnavailable,
            TreeError::InconsistentState { .. } => ExErrorKind::InconsistentState,
            TreeError::InvalidInput { .. } => ExErrorKind::InvalidInput,
            TreeError::DuplicateKey { .. } => ExErrorKind::AlreadyExists,
            TreeError::CycleDetected { .. } => ExErrorKind::CycleDetected,
            TreeError::Config { .. } => ExErrorKind::Config,
            TreeError::Serialization { .. } => ExErrorKind::Serialization,
            TreeError::LockPoisoned => ExErrorKind::Concurrency,
        }
    }
}

impl From<serde_json::Error> for TreeError {
    fn from(err: serde_json::Error) -> Self {
        TreeError::Serialization {
            message: err.to_string(),
        }
    }
}

macro_rules! error_kinds {
    ($($(#[$doc:meta])* $kind:ident => $code:literal,)+) => {
        /// Error classification with a stable code per kind
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ExErrorKind {
            $($(#[$doc])* $kind,)+
        }

        impl ExErrorKind {
            pub const ALL: &'static [ExErrorKind] = &[$(ExErrorKind::$kind,)+];

            pub fn code(&self) -> &'static str {
                match self {
                    $(ExErrorKind::$kind => $code,)+
                }
            }
        }
    };
}

error_kinds! {
    InvalidInput => "ERR_INVALID_INPUT",
    /// Unknown document identity
    NotFound => "ERR_NOT_FOUND",
    ParentNotFound => "ERR_PARENT_NOT_FOUND",
    AlreadyExists => "ERR_ALREADY_EXISTS",
    CycleDetected => "ERR_CYCLE_DETECTED",
    InconsistentState => "ERR_INCONSISTENT_STATE",
    StoreUnavailable => "ERR_STORE_UNAVAILABLE",
    Serialization => "ERR_SERIALIZATION",
    Config => "ERR_CONFIG",
    /// Shared tree lock poisoned
    Concurrency => "ERR_CONCURRENCY",
}

/// Reporting form of a [`TreeError`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    message: String,
}

impl ExError {
    fn new(kind: ExErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            message: message.into(),
        }
    }

    fn in_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    fn about(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Operation that failed, when known
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Document identity or primary key the error is about
    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())?;
        if let Some(op) = &self.op {
            write!(f, " ({})", op)?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(entity_id) = &self.entity_id {
            write!(f, " [{}]", entity_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

impl From<TreeError> for ExError {
    fn from(err: TreeError) -> Self {
        let kind = err.kind();
        match err {
            TreeError::ParentNotFound { key } => ExError::new(kind, "parent not found")
                .in_op("get_tree")
                .about(key),
            TreeError::NodeNotFound { id } => ExError::new(kind, "node not found").about(id),
            TreeError::StoreUnavailable { op, message } => ExError::new(kind, message).in_op(op),
            TreeError::DuplicateKey { key } => {
                ExError::new(kind, "primary key already in use").about(key)
            }
            TreeError::CycleDetected { key, parent } => {
                ExError::new(kind, format!("cannot be placed under {}", parent))
                    .in_op("update")
                    .about(key)
            }
            other => ExError::new(kind, other.to_string()),
        }
    }
}
