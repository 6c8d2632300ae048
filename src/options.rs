//! Encoder and decoder options.
//!
//! # Beispiel
//!
//! ```
//! use chrono::NaiveDate;
//! use xosc::options::EncodeOptions;
//!
//! let ts = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap().and_hms_opt(3, 4, 5).unwrap();
//! let opts = EncodeOptions::default()
//!     .with_timestamp(ts)
//!     .with_indent(2)
//!     .with_inline_parameters();
//!
//! assert_eq!(opts.timestamp(), Some(ts));
//! assert_eq!(opts.indent(), 2);
//! assert!(opts.inline_parameters());
//! ```

use chrono::NaiveDateTime;

use crate::model::WorldPosition;

/// Injected pure map between map coordinates and scenario world coordinates.
pub type CoordinateTransform = fn(WorldPosition) -> WorldPosition;

/// Options for [`encode_with_options`](crate::encode_with_options).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodeOptions {
    /// `FileHeader@date`; `None` = local time at export.
    pub(crate) timestamp: Option<NaiveDateTime>,
    /// Spaces per nesting level (0 = compact single line).
    pub(crate) indent: usize,
    /// Substitute declared values instead of writing `$name` references.
    pub(crate) inline_parameters: bool,
    pub(crate) coordinate_transform: Option<CoordinateTransform>,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            timestamp: None,
            indent: 4,
            inline_parameters: false,
            coordinate_transform: None,
        }
    }
}

impl EncodeOptions {
    pub fn timestamp(&self) -> Option<NaiveDateTime> { self.timestamp }
    pub fn indent(&self) -> usize { self.indent }
    pub fn inline_parameters(&self) -> bool { self.inline_parameters }
    pub fn coordinate_transform(&self) -> Option<CoordinateTransform> { self.coordinate_transform }

    /// Fixed header date (snapshot tests, reproducible builds).
    pub fn with_timestamp(mut self, timestamp: NaiveDateTime) -> Self { self.timestamp = Some(timestamp); self }
    pub fn with_indent(mut self, indent: usize) -> Self { self.indent = indent; self }
    pub fn with_inline_parameters(mut self) -> Self { self.inline_parameters = true; self }
    /// Map → world transform applied to every exported position.
    pub fn with_coordinate_transform(mut self, f: CoordinateTransform) -> Self { self.coordinate_transform = Some(f); self }

    pub fn set_timestamp(&mut self, timestamp: Option<NaiveDateTime>) { self.timestamp = timestamp; }
    pub fn set_indent(&mut self, indent: usize) { self.indent = indent; }

    pub(crate) fn transform(&self, p: WorldPosition) -> WorldPosition {
        self.coordinate_transform.map_or(p, |f| f(p))
    }
}

/// Options for [`decode_with_options`](crate::decode_with_options).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodeOptions {
    pub(crate) coordinate_transform: Option<CoordinateTransform>,
    /// Report `ExportConstant` elements that differ from their canonical template.
    pub(crate) strict_templates: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            coordinate_transform: None,
            strict_templates: true,
        }
    }
}

impl DecodeOptions {
    pub fn coordinate_transform(&self) -> Option<CoordinateTransform> { self.coordinate_transform }
    pub fn strict_templates(&self) -> bool { self.strict_templates }

    /// World → map transform applied to every imported position.
    pub fn with_coordinate_transform(mut self, f: CoordinateTransform) -> Self { self.coordinate_transform = Some(f); self }
    /// Accept differing `ExportConstant` content without a diagnostic.
    pub fn with_lenient_templates(mut self) -> Self { self.strict_templates = false; self }

    pub(crate) fn transform(&self, p: WorldPosition) -> WorldPosition {
        self.coordinate_transform.map_or(p, |f| f(p))
    }
}
