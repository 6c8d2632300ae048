//! Entities, Init section and environment.

use chrono::NaiveDateTime;
use roxmltree::Node;

use super::{first_child, node_path, DResult, Decoder, Failure};
use crate::diagnostic::DiagnosticKind;
use crate::model::{
    CloudState, Controller, EntityKind, Environment, MiscObjectCategory, PrecipitationType,
    Property, ScenarioDocument, ScenarioEntity, Sun, WorldPosition,
};
use crate::parameter::Value;
use crate::policy::Tag;
use crate::{EntityId, Error, FastHashSet};

/// Decoded `ControllerAction`.
pub(super) enum ControllerChoice {
    Assign(Controller),
    Override,
}

impl Decoder<'_> {
    pub(super) fn entities(&mut self, node: Node<'_, '_>) -> DResult<Vec<ScenarioEntity>> {
        let mut entities = Vec::new();
        for (_, object) in self.children(node, Tag::Entities) {
            let name = self.text(object, "name")?;
            if self.entity_ids.contains_key(&name) || self.skipped_entities.contains(&name) {
                return Err(Error::schema_violation(
                    node_path(object),
                    format!("duplicate entity name '{name}'"),
                )
                .into());
            }
            match self.scenario_object(object) {
                Ok(kind) => {
                    let id = EntityId(entities.len() as u32 + 1);
                    self.entity_ids.insert(name.clone(), id);
                    self.metadata.entity_names.push((id, name));
                    entities.push(ScenarioEntity::new(id, kind, WorldPosition::default()));
                }
                Err(Failure::Dropped) => {
                    self.diag(
                        DiagnosticKind::ElementSkipped,
                        node_path(object),
                        format!("entity '{name}' has no supported definition"),
                    );
                    self.skipped_entities.insert(name);
                }
                Err(fatal) => return Err(fatal),
            }
        }
        Ok(entities)
    }

    fn scenario_object(&mut self, node: Node<'_, '_>) -> DResult<EntityKind> {
        let (tag, def) = self.choice(node, Tag::ScenarioObject)?;
        match tag {
            Tag::Vehicle => self.vehicle(def),
            Tag::Pedestrian => {
                let model = self.text(def, "model")?;
                self.attr_constant(def, Tag::PedestrianMass);
                self.attr_constant(def, Tag::PedestrianCategory);
                self.children(def, Tag::Pedestrian);
                Ok(EntityKind::Pedestrian { model })
            }
            Tag::MiscObject => self.misc_object(def),
            other => Err(unexpected(def, other)),
        }
    }

    fn vehicle(&mut self, node: Node<'_, '_>) -> DResult<EntityKind> {
        let model = self.text(node, "name")?;
        self.attr_constant(node, Tag::VehicleCategory);
        let mut ego = false;
        for (tag, child) in self.children(node, Tag::Vehicle) {
            if tag != Tag::VehicleProperties {
                continue;
            }
            for (_, property) in self.children(child, Tag::VehicleProperties) {
                let (name, value) = (self.text(property, "name")?, self.text(property, "value")?);
                if name == "type" && value == "ego_vehicle" {
                    ego = true;
                } else {
                    self.diag(
                        DiagnosticKind::ContentDiscarded,
                        node_path(property),
                        format!("vehicle property {name}={value} is not kept"),
                    );
                }
            }
        }
        Ok(EntityKind::Vehicle { model, ego })
    }

    fn misc_object(&mut self, node: Node<'_, '_>) -> DResult<EntityKind> {
        let category = self.enumeration(node, "miscObjectCategory", MiscObjectCategory::from_xml)?;
        let mass = self.value::<f64>(node, "mass")?;
        let model = self.text(node, "name")?;
        let mut physics = None;
        for (tag, child) in self.children(node, Tag::MiscObject) {
            if tag != Tag::MiscObjectProperties {
                continue;
            }
            for (_, property) in self.children(child, Tag::MiscObjectProperties) {
                let (name, value) = (self.text(property, "name")?, self.text(property, "value")?);
                match (name.as_str(), value.as_str()) {
                    ("physics", "on" | "true") => physics = Some(true),
                    ("physics", "off" | "false") => physics = Some(false),
                    _ => self.diag(
                        DiagnosticKind::ContentDiscarded,
                        node_path(property),
                        format!("property {name}={value} is not kept"),
                    ),
                }
            }
        }
        let physics = physics.unwrap_or_else(|| {
            self.diag(
                DiagnosticKind::Defaulted,
                node_path(node),
                "no physics property; physics off",
            );
            false
        });
        Ok(EntityKind::MiscObject {
            model,
            category,
            mass,
            physics,
        })
    }

    // ------------------------------------------------------------------------
    // Init
    // ------------------------------------------------------------------------

    /// Reads `Init/Actions`; entities without a supported teleport keep the origin.
    pub(super) fn init(
        &mut self,
        storyboard: Node<'_, '_>,
        init: Option<Node<'_, '_>>,
        doc: &mut ScenarioDocument,
    ) -> DResult<()> {
        let mut environment = None;
        let mut positioned = FastHashSet::default();

        let actions = init.and_then(|n| {
            self.children(n, Tag::Init)
                .into_iter()
                .find(|(tag, _)| *tag == Tag::InitActions)
        });
        if let Some((_, actions)) = actions {
            for (tag, child) in self.children(actions, Tag::InitActions) {
                match tag {
                    Tag::InitGlobalAction => match self.init_global_action(child) {
                        Ok(env) => environment = Some(env),
                        Err(Failure::Dropped) => {}
                        Err(fatal) => return Err(fatal),
                    },
                    Tag::InitPrivate => {
                        let id = match self.entity_ref(child, "entityRef") {
                            Ok(id) => id,
                            Err(Failure::Dropped) => continue,
                            Err(fatal) => return Err(fatal),
                        };
                        if self.init_private(child, id, doc)? {
                            positioned.insert(id);
                        }
                    }
                    _ => {}
                }
            }
        }

        let init_path = match init {
            Some(n) => node_path(n),
            None => format!("{}/Init", node_path(storyboard)),
        };
        match environment {
            Some(env) => doc.environment = env,
            None => self.diag(
                DiagnosticKind::Defaulted,
                init_path.clone(),
                "no EnvironmentAction; using the default environment",
            ),
        }
        for (id, name) in self.metadata.entity_names.clone() {
            if !positioned.contains(&id) {
                self.diag(
                    DiagnosticKind::Defaulted,
                    init_path.clone(),
                    format!("no world position for entity '{name}'; using the origin"),
                );
            }
        }
        Ok(())
    }

    fn init_global_action(&mut self, node: Node<'_, '_>) -> DResult<Environment> {
        let (tag, action) = self.choice(node, Tag::InitGlobalAction)?;
        match tag {
            Tag::EnvironmentAction => self.environment_action(action),
            other => Err(unexpected(action, other)),
        }
    }

    /// One `Private` block; returns whether a position was set.
    fn init_private(
        &mut self,
        node: Node<'_, '_>,
        id: EntityId,
        doc: &mut ScenarioDocument,
    ) -> DResult<bool> {
        let mut position = None;
        let mut controller = None;
        let mut speed = None;
        for (_, private_action) in self.children(node, Tag::InitPrivate) {
            let (tag, action) = match self.choice(private_action, Tag::InitPrivateAction) {
                Ok(admitted) => admitted,
                Err(Failure::Dropped) => continue,
                Err(fatal) => return Err(fatal),
            };
            let outcome = match tag {
                Tag::TeleportAction => self.teleport(action).map(|p| position = Some(p)),
                Tag::ControllerAction => self.controller_action(action).map(|c| {
                    if let ControllerChoice::Assign(c) = c {
                        controller = Some(c);
                    }
                }),
                Tag::InitLongitudinalAction => self.init_speed(action).map(|v| speed = Some(v)),
                other => Err(unexpected(action, other)),
            };
            match outcome {
                Ok(()) | Err(Failure::Dropped) => {}
                Err(fatal) => return Err(fatal),
            }
        }

        let Some(entity) = doc.entities.iter_mut().find(|e| e.id == id) else {
            return Ok(false);
        };
        if controller.is_some() {
            entity.controller = controller;
        }
        if speed.is_some() {
            entity.initial_speed = speed;
        }
        Ok(match position {
            Some(p) => {
                entity.position = p;
                true
            }
            None => false,
        })
    }

    /// `LongitudinalAction/SpeedAction` with an absolute target.
    fn init_speed(&mut self, node: Node<'_, '_>) -> DResult<Value<f64>> {
        let (_, speed) = self.choice(node, Tag::InitLongitudinalAction)?;
        let target = self
            .children(speed, Tag::InitSpeedAction)
            .into_iter()
            .find(|(tag, _)| *tag == Tag::InitSpeedActionTarget)
            .ok_or_else(|| missing(speed, Tag::InitSpeedActionTarget))?;
        let (_, absolute) = self.choice(target.1, Tag::InitSpeedActionTarget)?;
        Ok(self.value(absolute, "value")?)
    }

    pub(super) fn teleport(&mut self, node: Node<'_, '_>) -> DResult<WorldPosition> {
        let (_, position) = self.choice(node, Tag::TeleportAction)?;
        self.position(position)
    }

    pub(super) fn controller_action(&mut self, node: Node<'_, '_>) -> DResult<ControllerChoice> {
        let mut assigned = None;
        for (tag, child) in self.children(node, Tag::ControllerAction) {
            if tag == Tag::AssignControllerAction {
                let (_, controller) = self.choice(child, Tag::AssignControllerAction)?;
                assigned = Some(self.controller(controller)?);
            }
        }
        match assigned {
            Some(controller) => Ok(ControllerChoice::Assign(controller)),
            None if first_child(node, "OverrideControllerValueAction").is_some() => {
                Ok(ControllerChoice::Override)
            }
            None => Err(Error::schema_violation(
                node_path(node),
                "ControllerAction without assignment or override",
            )
            .into()),
        }
    }

    fn controller(&mut self, node: Node<'_, '_>) -> DResult<Controller> {
        let mut controller = Controller::default();
        for (tag, child) in self.children(node, Tag::Controller) {
            if tag != Tag::ControllerProperties {
                continue;
            }
            for (_, property) in self.children(child, Tag::ControllerProperties) {
                controller.properties.push(Property::new(
                    self.text(property, "name")?,
                    self.text(property, "value")?,
                ));
            }
        }
        Ok(controller)
    }

    // ------------------------------------------------------------------------
    // Environment
    // ------------------------------------------------------------------------

    pub(super) fn environment_action(&mut self, node: Node<'_, '_>) -> DResult<Environment> {
        let (_, env) = self.choice(node, Tag::EnvironmentAction)?;
        self.attr_constant(env, Tag::EnvironmentName);

        let children = self.children(env, Tag::Environment);
        let find = |tag: Tag| {
            children
                .iter()
                .find(|(t, _)| *t == tag)
                .map(|(_, n)| *n)
                .ok_or_else(|| missing(env, tag))
        };
        let (time, weather) = (find(Tag::TimeOfDay)?, find(Tag::Weather)?);

        let mut environment = Environment {
            time_of_day: self
                .value::<NaiveDateTime>(time, "dateTime")?
                .resolve(&self.params)?,
            animation: self.flag(time, "animation")?,
            cloud_state: self.enumeration(weather, "cloudState", CloudState::from_xml)?,
            ..Environment::default()
        };
        for (tag, child) in self.children(weather, Tag::Weather) {
            match tag {
                Tag::Sun => {
                    environment.sun = Sun {
                        intensity: self.number(child, "intensity")?,
                        azimuth: self.number(child, "azimuth")?,
                        elevation: self.number(child, "elevation")?,
                    }
                }
                Tag::Fog => environment.fog_visual_range = self.number(child, "visualRange")?,
                Tag::Precipitation => {
                    environment.precipitation.kind =
                        self.enumeration(child, "precipitationType", PrecipitationType::from_xml)?;
                    environment.precipitation.intensity = self.number(child, "intensity")?;
                }
                _ => {}
            }
        }
        Ok(environment)
    }
}

pub(super) fn missing(node: Node<'_, '_>, tag: Tag) -> Failure {
    Failure::Fatal(Error::schema_violation(
        node_path(node),
        format!("missing {}", tag.name()),
    ))
}

/// Admitted child that the caller has no branch for.
pub(super) fn unexpected(node: Node<'_, '_>, tag: Tag) -> Failure {
    Failure::Fatal(Error::schema_violation(
        node_path(node),
        format!("unexpected {}", tag.name()),
    ))
}
