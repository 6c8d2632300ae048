//! XML encoder (exporter).
//!
//! Walks a [`ScenarioDocument`] and its [`ParameterTable`] and writes an OpenSCENARIO 1.0
//! document. Element emission is driven by [`Tag::policy`]: `Full` tags carry model content,
//! `ExportConstant` tags always write their fixed template, `ImportOnly` and `Unsupported`
//! tags are never written.
//!
//! # Beispiel
//!
//! ```
//! use chrono::NaiveDate;
//! use xosc::encoder::encode_with_options;
//! use xosc::model::{EntityKind, ScenarioDocument, ScenarioEntity, WorldPosition};
//! use xosc::{EncodeOptions, EntityId, ParameterTable};
//!
//! let mut doc = ScenarioDocument::new("Town01");
//! doc.entities.push(ScenarioEntity::new(
//!     EntityId(1),
//!     EntityKind::Pedestrian { model: "walker.pedestrian.0001".into() },
//!     WorldPosition::new(3.0, 4.0, 0.0, 0.0),
//! ));
//! let ts = NaiveDate::from_ymd_opt(2021, 5, 1).unwrap().and_hms_opt(12, 0, 0).unwrap();
//! let xml = encode_with_options(&doc, &ParameterTable::new(), &EncodeOptions::default().with_timestamp(ts)).unwrap();
//!
//! assert!(xml.contains(r#"<ScenarioObject name="Pedestrian_1">"#));
//! assert!(xml.contains(r#"date="2021-05-01T12:00:00""#));
//! ```

mod condition;
mod storyboard;
mod writer;

use chrono::Local;
use log::debug;

use crate::model::{
    Controller, EntityKind, Environment, ScenarioDocument, ScenarioEntity, WorldPosition,
};
use crate::naming::EntityNames;
use crate::options::EncodeOptions;
use crate::parameter::{
    format_datetime, format_double, parameter_reference, ParameterTable, Scalar, Value, ValueKind,
};
use crate::policy::{Constant, Slot, Support, Tag, Template};
use crate::resolver::ReferenceResolver;
use crate::{EntityId, Error, Result};

use writer::PrettyXmlWriter;

/// Encodes with [`EncodeOptions::default`] (4-space indent, `$name` references, current time).
pub fn encode(doc: &ScenarioDocument, params: &ParameterTable) -> Result<String> {
    encode_with_options(doc, params, &EncodeOptions::default())
}

/// Validates every reference, then writes the document.
///
/// Nothing is written when validation fails.
pub fn encode_with_options(
    doc: &ScenarioDocument,
    params: &ParameterTable,
    options: &EncodeOptions,
) -> Result<String> {
    ReferenceResolver::new(doc).validate_document(params)?;

    let names = EntityNames::assign(doc);
    debug!(
        "encode: {} entities, {} maneuvers, {} parameters",
        names.len(),
        doc.maneuvers.len(),
        params.len()
    );
    let timestamp = options
        .timestamp()
        .unwrap_or_else(|| Local::now().naive_local());

    let mut enc = Encoder {
        w: PrettyXmlWriter::new(Vec::new(), options.indent()),
        params,
        options,
        names,
        timestamp: format_datetime(&timestamp),
    };
    enc.document(doc)?;
    let bytes = enc.w.finish()?;
    String::from_utf8(bytes).map_err(|e| Error::IoError(e.to_string()))
}

pub(crate) struct Encoder<'a> {
    w: PrettyXmlWriter<Vec<u8>>,
    params: &'a ParameterTable,
    options: &'a EncodeOptions,
    names: EntityNames,
    timestamp: String,
}

impl Encoder<'_> {
    // ------------------------------------------------------------------------
    // Policy-gesteuerte Grundoperationen
    // ------------------------------------------------------------------------

    /// Opens a `Full` element.
    fn open(&mut self, tag: Tag) -> Result<()> {
        debug_assert_eq!(tag.policy(), Support::Full, "{tag:?} is not exported");
        self.w.start(tag.name())
    }

    fn close(&mut self) -> Result<()> {
        self.w.end()
    }

    /// Writes the constant of an `ExportConstant` tag; other policies write nothing.
    fn constant(&mut self, tag: Tag) -> Result<()> {
        match tag.policy() {
            Support::ExportConstant(Constant::Element(t)) => self.template(t),
            Support::ExportConstant(Constant::Attribute(v)) => self.w.attr(tag.name(), v),
            Support::Full | Support::ImportOnly | Support::Unsupported => Ok(()),
        }
    }

    fn template(&mut self, t: &Template) -> Result<()> {
        self.w.start(t.name)?;
        for (name, slot) in t.attrs {
            match slot {
                Slot::Fixed(v) => self.w.attr(name, v)?,
                Slot::Timestamp => self.w.attr(name, &self.timestamp)?,
            }
        }
        for child in t.children {
            self.template(child)?;
        }
        self.w.end()
    }

    fn attr(&mut self, name: &str, value: &str) -> Result<()> {
        self.w.attr(name, value)
    }

    /// Free-text attribute; a `$name` value is a reference like any other field.
    fn text(&mut self, name: &str, value: &str) -> Result<()> {
        match parameter_reference(value) {
            Some(param) if self.options.inline_parameters() => {
                let decl = self.params.resolve(param, ValueKind::String)?;
                self.w.attr(name, &decl.value)
            }
            _ => self.w.attr(name, value),
        }
    }

    fn f64_attr(&mut self, name: &str, value: f64) -> Result<()> {
        self.w.attr(name, &format_double(value))
    }

    fn bool_attr(&mut self, name: &str, value: bool) -> Result<()> {
        self.w.attr(name, if value { "true" } else { "false" })
    }

    /// `$name`, or the resolved literal with `inline_parameters`.
    fn value<T: Scalar>(&mut self, name: &str, value: &Value<T>) -> Result<()> {
        let text = if self.options.inline_parameters() {
            value.resolve(self.params)?.to_literal()
        } else {
            value.to_xml()
        };
        self.w.attr(name, &text)
    }

    fn entity_name(&self, id: EntityId) -> Result<String> {
        self.names
            .entity(id)
            .map(str::to_owned)
            .ok_or_else(|| Error::unknown_entity(id, ""))
    }

    fn entity_ref(&mut self, name: &str, id: EntityId) -> Result<()> {
        let entity = self.entity_name(id)?;
        self.w.attr(name, &entity)
    }

    // ------------------------------------------------------------------------
    // Dokument
    // ------------------------------------------------------------------------

    fn document(&mut self, doc: &ScenarioDocument) -> Result<()> {
        self.w.declaration()?;
        self.open(Tag::OpenScenario)?;
        self.constant(Tag::FileHeader)?;
        self.parameter_declarations()?;
        self.constant(Tag::CatalogLocations)?;

        self.open(Tag::RoadNetwork)?;
        self.open(Tag::LogicFile)?;
        self.text("filepath", &doc.road_network.logic_file)?;
        self.close()?;
        self.constant(Tag::SceneGraphFile)?;
        self.close()?;

        self.open(Tag::Entities)?;
        for entity in &doc.entities {
            self.scenario_object(entity)?;
        }
        self.close()?;

        self.open(Tag::Storyboard)?;
        self.init(doc)?;
        self.story(doc)?;
        self.constant(Tag::StoryboardStopTrigger)?;
        self.close()?;

        self.close()
    }

    fn parameter_declarations(&mut self) -> Result<()> {
        self.open(Tag::ParameterDeclarations)?;
        let params = self.params;
        for decl in params.all() {
            self.open(Tag::ParameterDeclaration)?;
            self.attr("name", &decl.name)?;
            self.attr("parameterType", decl.parameter_type.as_xml())?;
            self.attr("value", &decl.value)?;
            self.close()?;
        }
        self.close()
    }

    // ------------------------------------------------------------------------
    // Entities
    // ------------------------------------------------------------------------

    fn scenario_object(&mut self, entity: &ScenarioEntity) -> Result<()> {
        self.open(Tag::ScenarioObject)?;
        self.entity_ref("name", entity.id)?;
        match &entity.kind {
            EntityKind::Vehicle { model, ego } => {
                self.open(Tag::Vehicle)?;
                self.text("name", model)?;
                self.constant(Tag::VehicleCategory)?;
                self.constant(Tag::EntityParameterDeclarations)?;
                self.constant(Tag::Performance)?;
                self.constant(Tag::VehicleBoundingBox)?;
                self.constant(Tag::Axles)?;
                if *ego {
                    self.open(Tag::VehicleProperties)?;
                    self.property("type", "ego_vehicle")?;
                    self.close()?;
                }
                self.close()?;
            }
            EntityKind::Pedestrian { model } => {
                self.open(Tag::Pedestrian)?;
                self.text("model", model)?;
                self.constant(Tag::PedestrianMass)?;
                self.text("name", model)?;
                self.constant(Tag::PedestrianCategory)?;
                self.constant(Tag::EntityParameterDeclarations)?;
                self.constant(Tag::PedestrianBoundingBox)?;
                self.constant(Tag::PedestrianProperties)?;
                self.close()?;
            }
            EntityKind::MiscObject {
                model,
                category,
                mass,
                physics,
            } => {
                self.open(Tag::MiscObject)?;
                self.attr("miscObjectCategory", category.as_xml())?;
                self.value("mass", mass)?;
                self.text("name", model)?;
                self.constant(Tag::EntityParameterDeclarations)?;
                self.constant(Tag::MiscObjectBoundingBox)?;
                self.open(Tag::MiscObjectProperties)?;
                self.property("physics", if *physics { "on" } else { "off" })?;
                self.close()?;
                self.close()?;
            }
        }
        self.close()
    }

    fn property(&mut self, name: &str, value: &str) -> Result<()> {
        self.open(Tag::Property)?;
        self.text("name", name)?;
        self.text("value", value)?;
        self.close()
    }

    // ------------------------------------------------------------------------
    // Init
    // ------------------------------------------------------------------------

    fn init(&mut self, doc: &ScenarioDocument) -> Result<()> {
        self.open(Tag::Init)?;
        self.open(Tag::InitActions)?;

        self.open(Tag::InitGlobalAction)?;
        self.environment_action(&doc.environment)?;
        self.close()?;

        for entity in &doc.entities {
            self.open(Tag::InitPrivate)?;
            self.entity_ref("entityRef", entity.id)?;

            self.open(Tag::InitPrivateAction)?;
            self.teleport(entity.position)?;
            self.close()?;

            if let Some(controller) = &entity.controller {
                let name = self
                    .names
                    .controller(entity.id)
                    .map(str::to_owned)
                    .ok_or_else(|| Error::unknown_entity(entity.id, "init"))?;
                self.open(Tag::InitPrivateAction)?;
                self.controller_action(&name, Some(controller))?;
                self.close()?;
            }

            if let Some(speed) = &entity.initial_speed {
                self.open(Tag::InitPrivateAction)?;
                self.open(Tag::InitLongitudinalAction)?;
                self.open(Tag::InitSpeedAction)?;
                self.constant(Tag::InitSpeedActionDynamics)?;
                self.open(Tag::InitSpeedActionTarget)?;
                self.open(Tag::AbsoluteTargetSpeed)?;
                self.value("value", speed)?;
                self.close()?;
                self.close()?;
                self.close()?;
                self.close()?;
                self.close()?;
            }
            self.close()?;
        }

        self.close()?;
        self.close()
    }

    fn environment_action(&mut self, env: &Environment) -> Result<()> {
        self.open(Tag::EnvironmentAction)?;
        self.open(Tag::Environment)?;
        self.constant(Tag::EnvironmentName)?;

        self.open(Tag::TimeOfDay)?;
        self.bool_attr("animation", env.animation)?;
        self.attr("dateTime", &format_datetime(&env.time_of_day))?;
        self.close()?;

        self.open(Tag::Weather)?;
        self.attr("cloudState", env.cloud_state.as_xml())?;
        self.open(Tag::Sun)?;
        self.f64_attr("intensity", env.sun.intensity)?;
        self.f64_attr("azimuth", env.sun.azimuth)?;
        self.f64_attr("elevation", env.sun.elevation)?;
        self.close()?;
        self.open(Tag::Fog)?;
        self.f64_attr("visualRange", env.fog_visual_range)?;
        self.close()?;
        self.open(Tag::Precipitation)?;
        self.attr("precipitationType", env.precipitation.kind.as_xml())?;
        self.f64_attr("intensity", env.precipitation.intensity)?;
        self.close()?;
        self.close()?;

        self.constant(Tag::RoadCondition)?;
        self.close()?;
        self.close()
    }

    /// `TeleportAction/Position/WorldPosition`.
    fn teleport(&mut self, position: WorldPosition) -> Result<()> {
        self.open(Tag::TeleportAction)?;
        self.position(position)?;
        self.close()
    }

    fn position(&mut self, position: WorldPosition) -> Result<()> {
        let p = self.options.transform(position);
        self.open(Tag::Position)?;
        self.open(Tag::WorldPosition)?;
        self.f64_attr("x", p.x)?;
        self.f64_attr("y", p.y)?;
        self.f64_attr("z", p.z)?;
        self.f64_attr("h", p.h)?;
        self.close()?;
        self.close()
    }

    /// `ControllerAction` with an optional assignment and the constant override block.
    fn controller_action(&mut self, name: &str, controller: Option<&Controller>) -> Result<()> {
        self.open(Tag::ControllerAction)?;
        if let Some(controller) = controller {
            self.open(Tag::AssignControllerAction)?;
            self.open(Tag::Controller)?;
            self.attr("name", name)?;
            self.open(Tag::ControllerProperties)?;
            for p in &controller.properties {
                self.property(&p.name, &p.value)?;
            }
            self.close()?;
            self.close()?;
            self.close()?;
        }
        self.constant(Tag::OverrideControllerValueAction)?;
        self.close()
    }
}

/// Attribute text of a traffic-signal id (`id=<id>`).
fn signal_name(id: &str) -> String {
    format!("id={id}")
}
