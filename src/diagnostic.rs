//! Non-fatal decode findings.
//!
//! Diagnostics are purely additive: they never abort a decode and are returned
//! alongside the successfully decoded document, in document order.

use core::fmt;

use serde::Serialize;

/// What happened to the element a diagnostic refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticKind {
    /// An `Unsupported` tag was skipped together with its subtree.
    ElementSkipped,
    /// An `ExportConstant` tag was accepted but its (non-canonical) content was discarded.
    ContentDiscarded,
    /// Mandatory-for-the-model content was missing and a default was substituted.
    Defaulted,
    /// A storyboard-element reference points at an element that was not imported.
    ReferenceNotImported,
}

impl DiagnosticKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ElementSkipped => "element skipped",
            Self::ContentDiscarded => "accepted, content discarded",
            Self::Defaulted => "defaulted",
            Self::ReferenceNotImported => "reference not imported",
        }
    }
}

/// A single non-fatal finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Tag-Pfad im Quelldokument.
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            message: message.into(),
        }
    }

    /// Local name of the element the diagnostic refers to (last path segment, no index).
    pub fn tag(&self) -> &str {
        let last = self.path.rsplit('/').next().unwrap_or("");
        last.split('[').next().unwrap_or(last)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.path, self.kind.as_str(), self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_strips_index() {
        let d = Diagnostic::new(
            DiagnosticKind::ElementSkipped,
            "/OpenSCENARIO/Storyboard/Init/Actions/Private[2]/PrivateAction/VisibilityAction",
            "unsupported",
        );
        assert_eq!(d.tag(), "VisibilityAction");

        let d = Diagnostic::new(DiagnosticKind::Defaulted, "/OpenSCENARIO/Entities/ScenarioObject[3]", "");
        assert_eq!(d.tag(), "ScenarioObject");
    }

    #[test]
    fn display_contains_kind() {
        let d = Diagnostic::new(DiagnosticKind::ContentDiscarded, "/a/BoundingBox", "differs");
        let msg = d.to_string();
        assert!(msg.contains("accepted, content discarded"), "{msg}");
        assert!(msg.contains("/a/BoundingBox"), "{msg}");
    }
}
