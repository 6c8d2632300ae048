//! Central error types for the scenario codec.
//!
//! Every fatal condition aborts the whole decode/encode call. Non-fatal findings are
//! reported through [`crate::diagnostic::Diagnostic`] instead.

use core::fmt;
use std::borrow::Cow;

/// All fatal errors raised by the parameter table, the resolver and both codec directions.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// Malformed or missing mandatory XML content.
    SchemaViolation {
        /// Tag-Pfad des fehlerhaften Elements (z.B. `/OpenSCENARIO/Entities/ScenarioObject[2]`).
        path: Cow<'static, str>,
        /// Was nicht gepasst hat.
        reason: Cow<'static, str>,
    },
    /// A `$name` reference names a parameter that was never declared.
    UnknownParameter { name: String },
    /// A parameter with this name already exists in the global namespace.
    DuplicateParameter { name: String },
    /// The declared parameter type cannot be used where the reference appears.
    TypeMismatch {
        name: String,
        declared: Cow<'static, str>,
        expected: Cow<'static, str>,
    },
    /// The declared literal does not parse as the declared type.
    InvalidParameterValue {
        name: String,
        declared: Cow<'static, str>,
        value: String,
    },
    /// An entity reference does not resolve.
    UnknownEntity {
        id: String,
        /// Referenzierendes Manoever / Condition (leer wenn nicht verfügbar).
        context: Cow<'static, str>,
    },
    /// A storyboard-element reference does not resolve.
    UnknownElement { name: String, context: Cow<'static, str> },
    /// A traffic-signal or controller identifier is empty or malformed.
    UnknownSignal { id: String, context: Cow<'static, str> },
    /// The input is not well-formed XML.
    XmlParseError(String),
    /// Writing the XML output failed.
    IoError(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SchemaViolation { path, reason } => {
                if path.is_empty() {
                    write!(f, "schema violation: {reason}")
                } else {
                    write!(f, "schema violation at {path}: {reason}")
                }
            }
            Self::UnknownParameter { name } => write!(f, "unknown parameter '{name}'"),
            Self::DuplicateParameter { name } => {
                write!(f, "duplicate parameter declaration '{name}'")
            }
            Self::TypeMismatch { name, declared, expected } => write!(
                f,
                "type mismatch: parameter '{name}' is declared as {declared}, expected {expected}"
            ),
            Self::InvalidParameterValue { name, declared, value } => write!(
                f,
                "invalid value '{value}' for parameter '{name}' of type {declared}"
            ),
            Self::UnknownEntity { id, context } => with_context(f, "unknown entity", id, context),
            Self::UnknownElement { name, context } => {
                with_context(f, "unknown storyboard element", name, context)
            }
            Self::UnknownSignal { id, context } => {
                with_context(f, "unknown traffic signal", id, context)
            }
            Self::XmlParseError(msg) => write!(f, "XML parse error: {msg}"),
            Self::IoError(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

fn with_context(f: &mut fmt::Formatter<'_>, what: &str, id: &str, context: &str) -> fmt::Result {
    if context.is_empty() {
        write!(f, "{what} '{id}'")
    } else {
        write!(f, "{what} '{id}' referenced by {context}")
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Erstellt einen `SchemaViolation` Fehler mit Pfad und Grund.
    pub fn schema_violation(
        path: impl Into<Cow<'static, str>>,
        reason: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::SchemaViolation {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Erstellt einen `UnknownEntity` Fehler mit Kontext.
    pub fn unknown_entity(id: impl fmt::Display, context: impl Into<Cow<'static, str>>) -> Self {
        Self::UnknownEntity {
            id: id.to_string(),
            context: context.into(),
        }
    }

    /// Erstellt einen `UnknownElement` Fehler mit Kontext.
    pub fn unknown_element(name: impl Into<String>, context: impl Into<Cow<'static, str>>) -> Self {
        Self::UnknownElement {
            name: name.into(),
            context: context.into(),
        }
    }

    /// Erstellt einen `UnknownSignal` Fehler mit Kontext.
    pub fn unknown_signal(id: impl Into<String>, context: impl Into<Cow<'static, str>>) -> Self {
        Self::UnknownSignal {
            id: id.into(),
            context: context.into(),
        }
    }

    /// Ersetzt einen leeren Kontext bei Referenzfehlern.
    ///
    /// Der Resolver kennt nur die Referenz; die Position des Manoevers
    /// kennt erst der Aufrufer.
    pub(crate) fn or_context(self, context: impl FnOnce() -> String) -> Self {
        match self {
            Self::UnknownEntity { id, context: c } if c.is_empty() => Self::UnknownEntity {
                id,
                context: context().into(),
            },
            Self::UnknownElement { name, context: c } if c.is_empty() => Self::UnknownElement {
                name,
                context: context().into(),
            },
            Self::UnknownSignal { id, context: c } if c.is_empty() => Self::UnknownSignal {
                id,
                context: context().into(),
            },
            other => other,
        }
    }
}

/// A convenience `Result` type alias using [`Error`].
pub type Result<T> = core::result::Result<T, Error>;

/// Error returned by [`crate::decode`].
pub type DecodeError = Error;

/// Error returned by [`crate::encode`].
pub type EncodeError = Error;
