//! Construction of a [`ScenarioDocument`] from external placement records.
//!
//! The builder hands out sequential [`EntityId`]s and runs the [`ReferenceResolver`] in
//! [`build`](ScenarioBuilder::build), so a broken reference fails at construction time and
//! not only at export.

use crate::model::{
    Controller, Environment, EntityKind, Maneuver, MiscObjectCategory, ScenarioDocument,
    ScenarioEntity, WorldPosition,
};
use crate::parameter::{ParameterTable, Value};
use crate::resolver::ReferenceResolver;
use crate::{EntityId, Error, Result};

#[derive(Debug, Clone)]
pub struct ScenarioBuilder {
    doc: ScenarioDocument,
    next_id: u32,
}

impl ScenarioBuilder {
    pub fn new(logic_file: impl Into<String>) -> Self {
        Self {
            doc: ScenarioDocument::new(logic_file),
            next_id: 1,
        }
    }

    fn add(&mut self, kind: EntityKind, position: WorldPosition) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.doc.entities.push(ScenarioEntity::new(id, kind, position));
        id
    }

    pub fn add_vehicle(&mut self, model: impl Into<String>, ego: bool, position: WorldPosition) -> EntityId {
        self.add(
            EntityKind::Vehicle {
                model: model.into(),
                ego,
            },
            position,
        )
    }

    pub fn add_pedestrian(&mut self, model: impl Into<String>, position: WorldPosition) -> EntityId {
        self.add(EntityKind::Pedestrian { model: model.into() }, position)
    }

    pub fn add_misc_object(
        &mut self,
        model: impl Into<String>,
        category: MiscObjectCategory,
        mass: impl Into<Value<f64>>,
        physics: bool,
        position: WorldPosition,
    ) -> EntityId {
        self.add(
            EntityKind::MiscObject {
                model: model.into(),
                category,
                mass: mass.into(),
                physics,
            },
            position,
        )
    }

    fn entity_mut(&mut self, id: EntityId) -> Result<&mut ScenarioEntity> {
        self.doc
            .entities
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| Error::unknown_entity(id, "initial state"))
    }

    pub fn set_initial_speed(&mut self, id: EntityId, speed: impl Into<Value<f64>>) -> Result<()> {
        self.entity_mut(id)?.initial_speed = Some(speed.into());
        Ok(())
    }

    pub fn set_controller(&mut self, id: EntityId, controller: Controller) -> Result<()> {
        self.entity_mut(id)?.controller = Some(controller);
        Ok(())
    }

    pub fn set_environment(&mut self, environment: Environment) {
        self.doc.environment = environment;
    }

    /// Appends a maneuver; returns its 1-based number (`Maneuver ID n` on export).
    pub fn add_maneuver(&mut self, maneuver: Maneuver) -> usize {
        self.doc.maneuvers.push(maneuver);
        self.doc.maneuvers.len()
    }

    /// Validates all references against `params` and returns the document.
    pub fn build(self, params: &ParameterTable) -> Result<ScenarioDocument> {
        ReferenceResolver::new(&self.doc).validate_document(params)?;
        Ok(self.doc)
    }
}
