//! Deterministic export names.
//!
//! The model keeps no external names, so every `name` attribute is derived from the entity class
//! and ordinal or from the maneuver position. The storyboard element names derived here form the
//! namespace that `StoryboardElementStateCondition`s may reference.

use crate::model::{EntityKind, ScenarioDocument, StoryboardElementType};
use crate::{EntityId, FastHashSet, FastIndexMap};

pub const STORY: &str = "OSC Generated Story";
pub const ACT: &str = "OSC Generated Act";
pub const ROUTE: &str = "OSC Generated Route";
pub const ENVIRONMENT: &str = "Environment1";
pub const ACT_START_CONDITION: &str = "StartTime";
pub const ACT_STOP_CONDITION: &str = "EndCondition";

/// Naming class of an entity; each class counts its own ordinals from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityClass {
    Ego,
    Vehicle,
    Pedestrian,
    Prop,
}

impl EntityClass {
    pub fn of(kind: &EntityKind) -> Self {
        match kind {
            EntityKind::Vehicle { ego: true, .. } => Self::Ego,
            EntityKind::Vehicle { ego: false, .. } => Self::Vehicle,
            EntityKind::Pedestrian { .. } => Self::Pedestrian,
            EntityKind::MiscObject { .. } => Self::Prop,
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            Self::Ego => "Ego",
            Self::Vehicle => "Vehicle",
            Self::Pedestrian => "Pedestrian",
            Self::Prop => "Prop",
        }
    }

    fn controller_prefix(self) -> &'static str {
        match self {
            Self::Ego => "HeroAgent",
            Self::Vehicle => "VehicleAgent",
            Self::Pedestrian => "PedestrianAgent",
            Self::Prop => "PropAgent",
        }
    }
}

/// Synthesized names of all entities of one document.
#[derive(Debug, Clone, Default)]
pub struct EntityNames {
    names: FastIndexMap<EntityId, (String, String)>,
}

impl EntityNames {
    /// Assigns `<Class>_<n>` in document order; `n` counts per class.
    pub fn assign(doc: &ScenarioDocument) -> Self {
        let mut counters = [0u32; 4];
        let mut names = FastIndexMap::default();
        for entity in &doc.entities {
            let class = EntityClass::of(&entity.kind);
            let slot = &mut counters[class as usize];
            *slot += 1;
            let ordinal = *slot;
            names.entry(entity.id).or_insert_with(|| {
                (
                    format!("{}_{ordinal}", class.prefix()),
                    format!("{}_{ordinal}", class.controller_prefix()),
                )
            });
        }
        Self { names }
    }

    pub fn entity(&self, id: EntityId) -> Option<&str> {
        self.names.get(&id).map(|(n, _)| n.as_str())
    }

    pub fn controller(&self, id: EntityId) -> Option<&str> {
        self.names.get(&id).map(|(_, c)| c.as_str())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Storyboard element names of the maneuver at 1-based position `number`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManeuverNames {
    pub group: String,
    pub maneuver: String,
    pub event: String,
    pub action: String,
    pub condition: String,
    pub controller: String,
}

impl ManeuverNames {
    pub fn new(number: usize) -> Self {
        Self {
            group: format!("Maneuver group for Maneuver ID {number}"),
            maneuver: format!("Maneuver ID {number}"),
            event: format!("Event Maneuver ID {number}"),
            action: format!("Action for Maneuver ID {number}"),
            condition: format!("Condition for Maneuver ID {number}"),
            controller: format!("Agent for Maneuver ID {number}"),
        }
    }
}

/// All storyboard elements a document exports, keyed by element type (story, act, and per
/// maneuver group, maneuver, event and action).
pub fn storyboard_element_names(doc: &ScenarioDocument) -> FastHashSet<(StoryboardElementType, String)> {
    let mut names = FastHashSet::default();
    names.insert((StoryboardElementType::Story, STORY.to_string()));
    names.insert((StoryboardElementType::Act, ACT.to_string()));
    for number in 1..=doc.maneuvers.len() {
        let n = ManeuverNames::new(number);
        names.insert((StoryboardElementType::ManeuverGroup, n.group));
        names.insert((StoryboardElementType::Maneuver, n.maneuver));
        names.insert((StoryboardElementType::Event, n.event));
        names.insert((StoryboardElementType::Action, n.action));
    }
    names
}
