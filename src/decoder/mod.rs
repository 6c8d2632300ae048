//! XML decoder (importer).
//!
//! Parses an OpenSCENARIO document with `roxmltree` and fills a [`ScenarioDocument`].
//! Every child element is admitted through [`Tag::child`] and [`Tag::policy`]:
//! unknown and `Unsupported` elements are skipped with a diagnostic, `ExportConstant`
//! elements are compared against their template and otherwise ignored.
//!
//! Fatal problems (malformed XML, missing mandatory content, unresolved parameter or entity
//! references) abort the decode; everything else ends up in [`Decoded::diagnostics`].
//!
//! # Beispiel
//!
//! ```
//! use xosc::decoder::decode;
//! use xosc::DiagnosticKind;
//!
//! let xml = r#"<OpenSCENARIO>
//!   <FileHeader revMajor="1" revMinor="0" date="2021-01-01T00:00:00" description="d" author="a"/>
//!   <RoadNetwork><LogicFile filepath="Town01"/></RoadNetwork>
//!   <Entities>
//!     <ScenarioObject name="hero"><CatalogReference catalogName="c" entryName="e"/></ScenarioObject>
//!   </Entities>
//!   <Storyboard><Init><Actions/></Init><StopTrigger/></Storyboard>
//! </OpenSCENARIO>"#;
//!
//! let decoded = decode(xml).unwrap();
//! assert_eq!(decoded.metadata.logic_file, "Town01");
//! assert!(decoded.document.entities.is_empty());
//! assert!(decoded
//!     .diagnostics
//!     .iter()
//!     .any(|d| d.kind == DiagnosticKind::ElementSkipped && d.tag() == "CatalogReference"));
//! ```

mod condition;
mod entities;
mod storyboard;

use log::{debug, warn};
use roxmltree::{Document, Node};
use serde::Serialize;

use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::model::{ScenarioDocument, StoryboardElementType, WorldPosition};
use crate::options::DecodeOptions;
use crate::parameter::{parameter_reference, ParameterTable, ParameterType, Scalar, Value, ValueKind};
use crate::policy::{same_literal, Constant, Support, Tag};
use crate::{EntityId, Error, FastHashSet, FastIndexMap, Result};

/// Out-of-band data that is not part of the scenario semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    /// `RoadNetwork/LogicFile@filepath`.
    pub logic_file: String,
    /// Source `ScenarioObject@name` per imported entity (import-only, never re-exported).
    pub entity_names: Vec<(EntityId, String)>,
    /// Source storyboard-element names and the synthesized name they were imported as.
    pub storyboard_names: Vec<(String, String)>,
}

/// Result of a successful decode.
#[derive(Debug, Clone, Serialize)]
pub struct Decoded {
    pub document: ScenarioDocument,
    pub parameters: ParameterTable,
    pub metadata: Metadata,
    /// Non-fatal findings in document order.
    pub diagnostics: Vec<Diagnostic>,
}

impl Decoded {
    pub fn into_parts(self) -> (ScenarioDocument, ParameterTable, Metadata, Vec<Diagnostic>) {
        (self.document, self.parameters, self.metadata, self.diagnostics)
    }
}

pub fn decode(xml: &str) -> Result<Decoded> {
    decode_with_options(xml, &DecodeOptions::default())
}

pub fn decode_with_options(xml: &str, options: &DecodeOptions) -> Result<Decoded> {
    let xml_doc = Document::parse(xml).map_err(|e| Error::XmlParseError(e.to_string()))?;
    let root = xml_doc.root_element();
    if root.tag_name().name() != Tag::ROOT.name() {
        return Err(Error::schema_violation(
            format!("/{}", root.tag_name().name()),
            "root element must be OpenSCENARIO",
        ));
    }

    let mut decoder = Decoder::new(options);
    let document = decoder.document(root).map_err(|f| f.into_error(root))?;
    debug!(
        "decode: {} entities, {} maneuvers, {} parameters, {} diagnostics",
        document.entities.len(),
        document.maneuvers.len(),
        decoder.params.len(),
        decoder.diagnostics.len()
    );
    Ok(Decoded {
        document,
        parameters: decoder.params,
        metadata: decoder.metadata,
        diagnostics: decoder.diagnostics,
    })
}

// ============================================================================
// Interner Kontrollfluss
// ============================================================================

/// Abbruch eines Teilbaums: fatal, oder "umschliessendes Element verwerfen"
/// (die Diagnose wurde dann bereits erzeugt).
#[derive(Debug)]
pub(crate) enum Failure {
    Fatal(Error),
    Dropped,
}

impl From<Error> for Failure {
    fn from(e: Error) -> Self {
        Self::Fatal(e)
    }
}

impl Failure {
    fn into_error(self, root: Node<'_, '_>) -> Error {
        match self {
            Self::Fatal(e) => e,
            Self::Dropped => Error::schema_violation(
                node_path(root),
                "mandatory content uses only unsupported elements",
            ),
        }
    }
}

pub(crate) type DResult<T> = core::result::Result<T, Failure>;

/// Source storyboard element → synthesized name of the first maneuver imported from it.
type ElementNames = FastIndexMap<(StoryboardElementType, String), Option<String>>;

pub(crate) struct Decoder<'o> {
    options: &'o DecodeOptions,
    params: ParameterTable,
    diagnostics: Vec<Diagnostic>,
    metadata: Metadata,
    /// Source entity name → id.
    entity_ids: FastIndexMap<String, EntityId>,
    /// Entities whose definition was skipped; references to them drop the referrer.
    skipped_entities: FastHashSet<String>,
    element_names: ElementNames,
}

impl<'o> Decoder<'o> {
    fn new(options: &'o DecodeOptions) -> Self {
        Self {
            options,
            params: ParameterTable::new(),
            diagnostics: Vec::new(),
            metadata: Metadata::default(),
            entity_ids: FastIndexMap::default(),
            skipped_entities: FastHashSet::default(),
            element_names: ElementNames::default(),
        }
    }

    // ------------------------------------------------------------------------
    // Diagnosen und Policy
    // ------------------------------------------------------------------------

    fn diag(&mut self, kind: DiagnosticKind, path: String, message: impl Into<String>) {
        let d = Diagnostic::new(kind, path, message);
        warn!("{d}");
        self.diagnostics.push(d);
    }

    /// Admitted children of `node` (`Full` and `ImportOnly` tags) in document order.
    fn children<'a, 'i>(&mut self, node: Node<'a, 'i>, parent: Tag) -> Vec<(Tag, Node<'a, 'i>)> {
        let mut admitted = Vec::new();
        for child in node.children().filter(Node::is_element) {
            let name = child.tag_name().name();
            let Some(tag) = parent.child(name) else {
                self.diag(
                    DiagnosticKind::ElementSkipped,
                    node_path(child),
                    format!("unknown element {name} in {}", parent.name()),
                );
                continue;
            };
            match tag.policy() {
                Support::Full | Support::ImportOnly => admitted.push((tag, child)),
                Support::Unsupported => self.diag(
                    DiagnosticKind::ElementSkipped,
                    node_path(child),
                    format!("unsupported element {name}"),
                ),
                Support::ExportConstant(Constant::Element(template)) => {
                    if self.options.strict_templates() && !template.matches(child) {
                        self.diag(
                            DiagnosticKind::ContentDiscarded,
                            node_path(child),
                            format!("{name} differs from the canonical constant; content discarded"),
                        );
                    }
                }
                Support::ExportConstant(Constant::Attribute(_)) => {}
            }
        }
        admitted
    }

    /// Exactly one admitted child is expected (an XSD choice).
    ///
    /// `Dropped` when the only candidates were skipped, fatal when there were none at all.
    fn choice<'a, 'i>(&mut self, node: Node<'a, 'i>, tag: Tag) -> DResult<(Tag, Node<'a, 'i>)> {
        let has_elements = node.children().any(|n| n.is_element());
        match self.children(node, tag).into_iter().next() {
            Some(first) => Ok(first),
            None if has_elements => Err(Failure::Dropped),
            None => Err(Error::schema_violation(
                node_path(node),
                format!("{} has no content", tag.name()),
            )
            .into()),
        }
    }

    /// Checks an attribute that is always exported as a constant.
    fn attr_constant(&mut self, node: Node<'_, '_>, tag: Tag) {
        let Support::ExportConstant(Constant::Attribute(expected)) = tag.policy() else {
            return;
        };
        if let Some(actual) = node.attribute(tag.name()) {
            if self.options.strict_templates() && !same_literal(actual, expected) {
                self.diag(
                    DiagnosticKind::ContentDiscarded,
                    attr_path(node, tag.name()),
                    format!("'{actual}' replaced by the constant '{expected}'"),
                );
            }
        }
    }

    // ------------------------------------------------------------------------
    // Attribute
    // ------------------------------------------------------------------------

    /// Literal-or-reference attribute.
    fn value<T: Scalar>(&self, node: Node<'_, '_>, name: &str) -> Result<Value<T>> {
        let raw = required(node, name)?;
        self.parse_value(node, name, raw)
    }

    fn opt_value<T: Scalar>(&self, node: Node<'_, '_>, name: &str) -> Result<Option<Value<T>>> {
        node.attribute(name)
            .map(|raw| self.parse_value(node, name, raw))
            .transpose()
    }

    fn parse_value<T: Scalar>(&self, node: Node<'_, '_>, name: &str, raw: &str) -> Result<Value<T>> {
        Value::parse(raw, &self.params)?.ok_or_else(|| {
            Error::schema_violation(
                attr_path(node, name),
                format!("malformed {} '{raw}'", T::KIND.as_str()),
            )
        })
    }

    /// Plain number; a parameter reference is substituted by its value.
    fn number(&self, node: Node<'_, '_>, name: &str) -> Result<f64> {
        self.value::<f64>(node, name)?.resolve(&self.params)
    }

    fn flag(&self, node: Node<'_, '_>, name: &str) -> Result<bool> {
        self.value::<bool>(node, name)?.resolve(&self.params)
    }

    /// String attribute; `$name` is substituted by the declared value.
    fn text(&self, node: Node<'_, '_>, name: &str) -> Result<String> {
        let raw = required(node, name)?;
        match parameter_reference(raw) {
            Some(param) => Ok(self.params.resolve(param, ValueKind::String)?.value.clone()),
            None => Ok(raw.to_string()),
        }
    }

    fn enumeration<E>(&self, node: Node<'_, '_>, name: &str, from_xml: fn(&str) -> Option<E>) -> Result<E> {
        let raw = self.text(node, name)?;
        from_xml(&raw).ok_or_else(|| {
            Error::schema_violation(attr_path(node, name), format!("unknown value '{raw}'"))
        })
    }

    /// Entity reference attribute.
    ///
    /// References to an entity that was skipped drop the referrer.
    fn entity_ref(&mut self, node: Node<'_, '_>, name: &str) -> DResult<EntityId> {
        let entity = self.text(node, name)?;
        if let Some(id) = self.entity_ids.get(&entity) {
            return Ok(*id);
        }
        if self.skipped_entities.contains(&entity) {
            self.diag(
                DiagnosticKind::ReferenceNotImported,
                attr_path(node, name),
                format!("entity '{entity}' was not imported"),
            );
            return Err(Failure::Dropped);
        }
        Err(Error::unknown_entity(entity, node_path(node)).into())
    }

    /// `Position` element holding a `WorldPosition`.
    fn position(&mut self, node: Node<'_, '_>) -> DResult<WorldPosition> {
        let (_, world) = self.choice(node, Tag::Position)?;
        let p = WorldPosition {
            x: self.number(world, "x")?,
            y: self.number(world, "y")?,
            z: optional_number(self, world, "z")?,
            h: optional_number(self, world, "h")?,
        };
        Ok(self.options.transform(p))
    }

    // ------------------------------------------------------------------------
    // Dokument
    // ------------------------------------------------------------------------

    fn document(&mut self, root: Node<'_, '_>) -> DResult<ScenarioDocument> {
        for mandatory in [Tag::FileHeader, Tag::RoadNetwork, Tag::Entities, Tag::Storyboard] {
            if first_child(root, mandatory.name()).is_none() {
                return Err(Error::schema_violation(
                    node_path(root),
                    format!("missing {}", mandatory.name()),
                )
                .into());
            }
        }

        let children = self.children(root, Tag::OpenScenario);
        // Parameter zuerst: alle anderen Elemente duerfen sie referenzieren.
        for (tag, node) in &children {
            if *tag == Tag::ParameterDeclarations {
                self.parameter_declarations(*node)?;
            }
        }

        let mut doc = ScenarioDocument::default();
        for (tag, node) in &children {
            match tag {
                Tag::RoadNetwork => self.road_network(*node)?,
                Tag::Entities => doc.entities = self.entities(*node)?,
                _ => {}
            }
        }
        doc.road_network.logic_file = self.metadata.logic_file.clone();
        for (tag, node) in &children {
            if *tag == Tag::Storyboard {
                self.storyboard(*node, &mut doc)?;
            }
        }
        self.translate_element_references(&mut doc)?;
        Ok(doc)
    }

    fn parameter_declarations(&mut self, node: Node<'_, '_>) -> Result<()> {
        for (_, decl) in self.children(node, Tag::ParameterDeclarations) {
            let name = required(decl, "name")?;
            let raw_type = required(decl, "parameterType")?;
            let parameter_type = ParameterType::from_xml(raw_type).ok_or_else(|| {
                Error::schema_violation(
                    attr_path(decl, "parameterType"),
                    format!("unknown parameter type '{raw_type}'"),
                )
            })?;
            let value = required(decl, "value")?;
            self.params.declare(name, parameter_type, value)?;
        }
        Ok(())
    }

    fn road_network(&mut self, node: Node<'_, '_>) -> Result<()> {
        let logic = self
            .children(node, Tag::RoadNetwork)
            .into_iter()
            .find(|(tag, _)| *tag == Tag::LogicFile);
        match logic {
            Some((_, file)) => self.metadata.logic_file = self.text(file, "filepath")?,
            None => self.diag(
                DiagnosticKind::Defaulted,
                node_path(node),
                "no LogicFile; using an empty path",
            ),
        }
        Ok(())
    }
}

// ============================================================================
// Freie Hilfsfunktionen
// ============================================================================

fn required<'a>(node: Node<'a, '_>, name: &str) -> Result<&'a str> {
    node.attribute(name).ok_or_else(|| {
        Error::schema_violation(node_path(node), format!("missing attribute '{name}'"))
    })
}

fn optional_number(decoder: &Decoder<'_>, node: Node<'_, '_>, name: &str) -> Result<f64> {
    match node.attribute(name) {
        Some(_) => decoder.number(node, name),
        None => Ok(0.0),
    }
}

fn first_child<'a, 'i>(node: Node<'a, 'i>, name: &str) -> Option<Node<'a, 'i>> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == name)
}

/// Tag path like `/OpenSCENARIO/Entities/ScenarioObject[2]/Vehicle`.
///
/// The 1-based index is added only where siblings share the name.
pub(crate) fn node_path(node: Node<'_, '_>) -> String {
    let mut segments: Vec<String> = node
        .ancestors()
        .filter(Node::is_element)
        .map(|n| {
            let name = n.tag_name().name();
            let same = |s: &Node<'_, '_>| s.tag_name().name() == name;
            let mut index = 1;
            let mut prev = n.prev_sibling_element();
            while let Some(p) = prev {
                if same(&p) {
                    index += 1;
                }
                prev = p.prev_sibling_element();
            }
            let mut next = n.next_sibling_element();
            let mut repeated = index > 1;
            while let (false, Some(s)) = (repeated, next) {
                repeated = same(&s);
                next = s.next_sibling_element();
            }
            if repeated {
                format!("{name}[{index}]")
            } else {
                name.to_string()
            }
        })
        .collect();
    segments.reverse();
    format!("/{}", segments.join("/"))
}

fn attr_path(node: Node<'_, '_>, attr: &str) -> String {
    format!("{}/@{attr}", node_path(node))
}

#[cfg(test)]
mod tests;
