//! Global parameter declarations (`ParameterDeclarations`) and parameter references.
//!
//! The table is a plain value passed to every encode/decode call; there is no process-wide
//! namespace. Declaration order is preserved because it is observable in the exported document.
//!
//! # Beispiel
//!
//! ```
//! use xosc::parameter::{ParameterTable, ParameterType, Value, ValueKind};
//!
//! let mut params = ParameterTable::new();
//! params.declare("speed_limit", ParameterType::Double, "30.0").unwrap();
//! assert!(params.declare("speed_limit", ParameterType::Double, "30.0").is_err());
//!
//! let decl = params.resolve("$speed_limit", ValueKind::Numeric).unwrap();
//! assert_eq!(decl.value, "30.0");
//!
//! let v: Value<f64> = Value::param("speed_limit");
//! assert_eq!(v.resolve(&params).unwrap(), 30.0);
//! ```

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::{Error, FastIndexMap, Result};

/// Declared parameter type (`ParameterType` enumeration of the standard).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterType {
    String,
    Integer,
    Double,
    Boolean,
    DateTime,
    UnsignedInt,
    UnsignedShort,
}

impl ParameterType {
    pub fn from_xml(s: &str) -> Option<Self> {
        Some(match s {
            "string" => Self::String,
            "integer" => Self::Integer,
            "double" => Self::Double,
            "boolean" => Self::Boolean,
            "dateTime" => Self::DateTime,
            "unsignedInt" => Self::UnsignedInt,
            "unsignedShort" => Self::UnsignedShort,
            _ => return None,
        })
    }

    pub fn as_xml(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Double => "double",
            Self::Boolean => "boolean",
            Self::DateTime => "dateTime",
            Self::UnsignedInt => "unsignedInt",
            Self::UnsignedShort => "unsignedShort",
        }
    }

    /// Whether a parameter of this type may be referenced where `expected` is required.
    pub fn satisfies(self, expected: ValueKind) -> bool {
        match expected {
            ValueKind::String => true,
            ValueKind::Numeric => matches!(
                self,
                Self::Integer | Self::Double | Self::UnsignedInt | Self::UnsignedShort
            ),
            ValueKind::Integer => {
                matches!(self, Self::Integer | Self::UnsignedInt | Self::UnsignedShort)
            }
            ValueKind::Boolean => self == Self::Boolean,
            ValueKind::DateTime => self == Self::DateTime,
        }
    }

    fn accepts_literal(self, value: &str) -> bool {
        let v = value.trim();
        match self {
            Self::String => true,
            Self::Integer => v.parse::<i64>().is_ok(),
            Self::Double => f64::parse_literal(v).is_some(),
            Self::Boolean => bool::parse_literal(v).is_some(),
            Self::DateTime => parse_datetime(v).is_some(),
            Self::UnsignedInt => v.parse::<u32>().is_ok(),
            Self::UnsignedShort => v.parse::<u16>().is_ok(),
        }
    }
}

/// What a reference site expects from the parameter it names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Numeric,
    Integer,
    Boolean,
    DateTime,
    String,
}

impl ValueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::DateTime => "dateTime",
            Self::String => "string",
        }
    }
}

/// One global parameter declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDeclaration {
    pub name: String,
    #[serde(rename = "type")]
    pub parameter_type: ParameterType,
    pub value: String,
}

/// Ordered namespace of global parameter declarations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<ParameterDeclaration>", into = "Vec<ParameterDeclaration>")]
pub struct ParameterTable {
    decls: FastIndexMap<String, ParameterDeclaration>,
}

impl ParameterTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a new parameter.
    ///
    /// Fails with `DuplicateParameter` if the name exists and with
    /// `InvalidParameterValue` if `value` does not parse as `parameter_type`.
    pub fn declare(
        &mut self,
        name: impl Into<String>,
        parameter_type: ParameterType,
        value: impl Into<String>,
    ) -> Result<()> {
        let decl = checked_declaration(name.into(), parameter_type, value.into())?;
        if self.decls.contains_key(&decl.name) {
            return Err(Error::DuplicateParameter { name: decl.name });
        }
        self.decls.insert(decl.name.clone(), decl);
        Ok(())
    }

    /// Declares or overwrites a parameter, keeping the original position if it existed.
    ///
    /// Returns the previous declaration.
    pub fn replace(
        &mut self,
        name: impl Into<String>,
        parameter_type: ParameterType,
        value: impl Into<String>,
    ) -> Result<Option<ParameterDeclaration>> {
        let decl = checked_declaration(name.into(), parameter_type, value.into())?;
        Ok(self.decls.insert(decl.name.clone(), decl))
    }

    /// Removes a declaration, preserving the order of the remaining ones.
    pub fn remove(&mut self, name: &str) -> Option<ParameterDeclaration> {
        self.decls.shift_remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&ParameterDeclaration> {
        self.decls.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.decls.contains_key(name)
    }

    /// Resolves a reference (`$name`, `${name}` or a bare name) for a site expecting `expected`.
    pub fn resolve(&self, reference: &str, expected: ValueKind) -> Result<&ParameterDeclaration> {
        let name = parameter_reference(reference).unwrap_or(reference);
        let decl = self.decls.get(name).ok_or_else(|| Error::UnknownParameter {
            name: name.to_string(),
        })?;
        if !decl.parameter_type.satisfies(expected) {
            return Err(Error::TypeMismatch {
                name: decl.name.clone(),
                declared: decl.parameter_type.as_xml().into(),
                expected: expected.as_str().into(),
            });
        }
        Ok(decl)
    }

    /// All declarations in insertion order.
    pub fn all(&self) -> impl Iterator<Item = &ParameterDeclaration> {
        self.decls.values()
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }
}

impl PartialEq for ParameterTable {
    /// Gleichheit inklusive Reihenfolge (die Reihenfolge ist im Export sichtbar).
    fn eq(&self, other: &Self) -> bool {
        self.decls.len() == other.decls.len() && self.all().eq(other.all())
    }
}

impl TryFrom<Vec<ParameterDeclaration>> for ParameterTable {
    type Error = Error;

    fn try_from(decls: Vec<ParameterDeclaration>) -> Result<Self> {
        let mut table = Self::new();
        for d in decls {
            table.declare(d.name, d.parameter_type, d.value)?;
        }
        Ok(table)
    }
}

impl From<ParameterTable> for Vec<ParameterDeclaration> {
    fn from(table: ParameterTable) -> Self {
        table.decls.into_values().collect()
    }
}

fn checked_declaration(
    name: String,
    parameter_type: ParameterType,
    value: String,
) -> Result<ParameterDeclaration> {
    if !is_parameter_name(&name) {
        return Err(Error::schema_violation(
            "ParameterDeclaration",
            format!("invalid parameter name '{name}'"),
        ));
    }
    if !parameter_type.accepts_literal(&value) {
        return Err(Error::InvalidParameterValue {
            name,
            declared: parameter_type.as_xml().into(),
            value,
        });
    }
    Ok(ParameterDeclaration {
        name,
        parameter_type,
        value,
    })
}

fn is_parameter_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Extracts the parameter name from `$name` or `${name}`.
///
/// Returns `None` if `raw` is not a syntactically valid reference.
pub fn parameter_reference(raw: &str) -> Option<&str> {
    let rest = raw.trim().strip_prefix('$')?;
    let name = match rest.strip_prefix('{') {
        Some(braced) => braced.strip_suffix('}')?,
        None => rest,
    };
    is_parameter_name(name).then_some(name)
}

// ============================================================================
// Literal-or-reference field values
// ============================================================================

/// A scalar type that can appear in an attribute, either literally or via a parameter.
pub trait Scalar: Sized + Clone + PartialEq {
    const KIND: ValueKind;

    fn parse_literal(raw: &str) -> Option<Self>;

    fn to_literal(&self) -> String;
}

impl Scalar for f64 {
    const KIND: ValueKind = ValueKind::Numeric;

    fn parse_literal(raw: &str) -> Option<Self> {
        raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
    }

    fn to_literal(&self) -> String {
        format_double(*self)
    }
}

impl Scalar for i32 {
    const KIND: ValueKind = ValueKind::Integer;

    fn parse_literal(raw: &str) -> Option<Self> {
        raw.trim().parse().ok()
    }

    fn to_literal(&self) -> String {
        self.to_string()
    }
}

impl Scalar for bool {
    const KIND: ValueKind = ValueKind::Boolean;

    fn parse_literal(raw: &str) -> Option<Self> {
        // xsd:boolean plus die Python-Schreibweise ("True") des Altwerkzeugs
        match raw.trim() {
            "true" | "1" | "True" | "TRUE" => Some(true),
            "false" | "0" | "False" | "FALSE" => Some(false),
            _ => None,
        }
    }

    fn to_literal(&self) -> String {
        if *self { "true" } else { "false" }.to_string()
    }
}

impl Scalar for NaiveDateTime {
    const KIND: ValueKind = ValueKind::DateTime;

    fn parse_literal(raw: &str) -> Option<Self> {
        parse_datetime(raw)
    }

    fn to_literal(&self) -> String {
        format_datetime(self)
    }
}

impl Scalar for String {
    const KIND: ValueKind = ValueKind::String;

    fn parse_literal(raw: &str) -> Option<Self> {
        Some(raw.to_string())
    }

    fn to_literal(&self) -> String {
        self.clone()
    }
}

/// A field value that is either a literal or a reference to a global parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value<T> {
    Literal(T),
    Parameter(String),
}

impl<T: Scalar> Value<T> {
    pub fn literal(v: T) -> Self {
        Self::Literal(v)
    }

    pub fn param(name: impl Into<String>) -> Self {
        Self::Parameter(name.into())
    }

    pub fn as_literal(&self) -> Option<&T> {
        match self {
            Self::Literal(v) => Some(v),
            Self::Parameter(_) => None,
        }
    }

    pub fn parameter(&self) -> Option<&str> {
        match self {
            Self::Literal(_) => None,
            Self::Parameter(name) => Some(name),
        }
    }

    /// Parses an attribute value.
    ///
    /// Parameter references are checked against `table` (unknown or incompatible
    /// references fail). Returns `Ok(None)` for a malformed literal so the caller
    /// can report it with its tag path.
    pub fn parse(raw: &str, table: &ParameterTable) -> Result<Option<Self>> {
        if T::KIND != ValueKind::String || raw.trim_start().starts_with('$') {
            if let Some(name) = parameter_reference(raw) {
                table.resolve(name, T::KIND)?;
                return Ok(Some(Self::Parameter(name.to_string())));
            }
        }
        Ok(T::parse_literal(raw).map(Self::Literal))
    }

    /// Checks that a parameter reference resolves with a compatible type.
    pub fn check(&self, table: &ParameterTable) -> Result<()> {
        if let Self::Parameter(name) = self {
            table.resolve(name, T::KIND)?;
        }
        Ok(())
    }

    /// Resolves the effective value.
    pub fn resolve(&self, table: &ParameterTable) -> Result<T> {
        match self {
            Self::Literal(v) => Ok(v.clone()),
            Self::Parameter(name) => {
                let decl = table.resolve(name, T::KIND)?;
                T::parse_literal(&decl.value).ok_or_else(|| Error::InvalidParameterValue {
                    name: decl.name.clone(),
                    declared: decl.parameter_type.as_xml().into(),
                    value: decl.value.clone(),
                })
            }
        }
    }

    /// Attribute text: the literal, or `$name`.
    pub fn to_xml(&self) -> String {
        match self {
            Self::Literal(v) => v.to_literal(),
            Self::Parameter(name) => format!("${name}"),
        }
    }
}

impl<T: Scalar + Default> Default for Value<T> {
    fn default() -> Self {
        Self::Literal(T::default())
    }
}

impl From<f64> for Value<f64> {
    fn from(v: f64) -> Self {
        Self::Literal(v)
    }
}

impl From<i32> for Value<i32> {
    fn from(v: i32) -> Self {
        Self::Literal(v)
    }
}

impl From<bool> for Value<bool> {
    fn from(v: bool) -> Self {
        Self::Literal(v)
    }
}

/// Formats a double so that integral values keep a trailing `.0`.
pub(crate) fn format_double(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

pub(crate) fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_local()))
}

pub(crate) fn format_datetime(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declare_twice_fails_with_duplicate() {
        let mut t = ParameterTable::new();
        t.declare("speed_limit", ParameterType::Double, "30.0").unwrap();
        let err = t.declare("speed_limit", ParameterType::Double, "30.0").unwrap_err();
        assert_eq!(err, Error::DuplicateParameter { name: "speed_limit".into() });
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn declare_rejects_bad_literal() {
        let mut t = ParameterTable::new();
        let err = t.declare("n", ParameterType::Integer, "1.5").unwrap_err();
        assert!(matches!(err, Error::InvalidParameterValue { .. }), "{err}");
        assert!(t.declare("d", ParameterType::DateTime, "2020-10-23T06:00:00").is_ok());
        assert!(t.declare("u", ParameterType::UnsignedShort, "70000").is_err());
    }

    #[test]
    fn declare_rejects_bad_name() {
        let mut t = ParameterTable::new();
        assert!(t.declare("1abc", ParameterType::String, "x").is_err());
        assert!(t.declare("", ParameterType::String, "x").is_err());
    }

    #[test]
    fn insertion_order_preserved() {
        let mut t = ParameterTable::new();
        for name in ["zeta", "alpha", "mid"] {
            t.declare(name, ParameterType::String, "v").unwrap();
        }
        let names: Vec<_> = t.all().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn replace_keeps_position() {
        let mut t = ParameterTable::new();
        t.declare("a", ParameterType::Double, "1").unwrap();
        t.declare("b", ParameterType::Double, "2").unwrap();
        let prev = t.replace("a", ParameterType::Integer, "5").unwrap();
        assert_eq!(prev.unwrap().value, "1");
        let first = t.all().next().unwrap();
        assert_eq!(first.name, "a");
        assert_eq!(first.parameter_type, ParameterType::Integer);
    }

    #[test]
    fn resolve_unknown_and_mismatch() {
        let mut t = ParameterTable::new();
        t.declare("flag", ParameterType::Boolean, "true").unwrap();
        assert_eq!(
            t.resolve("$missing", ValueKind::Numeric).unwrap_err(),
            Error::UnknownParameter { name: "missing".into() }
        );
        assert!(matches!(
            t.resolve("${flag}", ValueKind::Numeric).unwrap_err(),
            Error::TypeMismatch { .. }
        ));
        assert!(t.resolve("flag", ValueKind::String).is_ok());
    }

    #[test]
    fn resolve_is_deterministic() {
        let mut t = ParameterTable::new();
        t.declare("v", ParameterType::Double, "12.5").unwrap();
        let v: Value<f64> = Value::param("v");
        assert_eq!(v.resolve(&t).unwrap(), v.resolve(&t).unwrap());
        assert_eq!(v.resolve(&t).unwrap(), 12.5);
    }

    #[test]
    fn reference_syntax() {
        assert_eq!(parameter_reference("$speed"), Some("speed"));
        assert_eq!(parameter_reference("${speed}"), Some("speed"));
        assert_eq!(parameter_reference("${speed"), None);
        assert_eq!(parameter_reference("speed"), None);
        assert_eq!(parameter_reference("$"), None);
    }

    #[test]
    fn value_parse_literal_and_reference() {
        let mut t = ParameterTable::new();
        t.declare("s", ParameterType::Double, "3").unwrap();
        assert_eq!(Value::<f64>::parse("4.5", &t).unwrap(), Some(Value::Literal(4.5)));
        assert_eq!(
            Value::<f64>::parse("$s", &t).unwrap(),
            Some(Value::Parameter("s".into()))
        );
        assert_eq!(Value::<f64>::parse("fast", &t).unwrap(), None);
        assert!(Value::<f64>::parse("$nope", &t).is_err());
    }

    #[test]
    fn string_value_keeps_plain_text() {
        let t = ParameterTable::new();
        assert_eq!(
            Value::<String>::parse("green", &t).unwrap(),
            Some(Value::Literal("green".to_string()))
        );
    }

    #[test]
    fn double_formatting() {
        assert_eq!(format_double(5.0), "5.0");
        assert_eq!(format_double(0.85), "0.85");
        assert_eq!(format_double(-3.25), "-3.25");
        assert_eq!(f64::parse_literal(&format_double(69.444)), Some(69.444));
    }

    #[test]
    fn value_to_xml() {
        assert_eq!(Value::Literal(5.0).to_xml(), "5.0");
        assert_eq!(Value::<f64>::param("x").to_xml(), "$x");
        assert_eq!(Value::Literal(true).to_xml(), "true");
    }

    #[test]
    fn serde_table_rejects_duplicates() {
        let json = r#"[{"name":"a","type":"double","value":"1"},{"name":"a","type":"double","value":"2"}]"#;
        assert!(serde_json::from_str::<ParameterTable>(json).is_err());
        let json = r#"[{"name":"a","type":"double","value":"1"}]"#;
        let t: ParameterTable = serde_json::from_str(json).unwrap();
        assert_eq!(t.get("a").unwrap().parameter_type, ParameterType::Double);
    }
}
