use serde::{Deserialize, Serialize};

use super::{EntityId, MiscObjectCategory, WorldPosition};
use crate::parameter::Value;

/// A placed scenario participant.
///
/// Bounding box, performance and axle blocks are not modeled; the encoder always writes
/// the canonical constants for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioEntity {
    pub id: EntityId,
    pub kind: EntityKind,
    /// Initial position (`Init` teleport action).
    pub position: WorldPosition,
    /// Initial absolute speed in m/s; omitted from `Init` when `None`.
    #[serde(default)]
    pub initial_speed: Option<Value<f64>>,
    /// Initially assigned controller.
    #[serde(default)]
    pub controller: Option<Controller>,
}

impl ScenarioEntity {
    pub fn new(id: EntityId, kind: EntityKind, position: WorldPosition) -> Self {
        Self {
            id,
            kind,
            position,
            initial_speed: None,
            controller: None,
        }
    }

    pub fn is_ego(&self) -> bool {
        matches!(self.kind, EntityKind::Vehicle { ego: true, .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Vehicle {
        /// Blueprint / model name (`Vehicle@name`).
        model: String,
        /// Emits `Properties/Property[type=ego_vehicle]`.
        ego: bool,
    },
    Pedestrian {
        model: String,
    },
    MiscObject {
        model: String,
        category: MiscObjectCategory,
        mass: Value<f64>,
        /// `physics` property (`on`/`off`).
        physics: bool,
    },
}

impl EntityKind {
    pub fn model(&self) -> &str {
        match self {
            Self::Vehicle { model, .. }
            | Self::Pedestrian { model }
            | Self::MiscObject { model, .. } => model,
        }
    }
}

/// A controller with its ordered property list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Controller {
    pub properties: Vec<Property>,
}

impl Controller {
    /// Controller running the given simulator module (`module` property).
    pub fn module(name: impl Into<String>) -> Self {
        Self {
            properties: vec![Property::new("module", name)],
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.push(Property::new(name, value));
        self
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub value: String,
}

impl Property {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}
