use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{
    ConditionEdge, EntityId, ObjectType, RelativeDistanceType, Rule, StoryboardElementState,
    StoryboardElementType, TriggeringEntitiesRule, WorldPosition,
};
use crate::parameter::Value;

/// Conditions are AND-ed within a group, groups are OR-ed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Trigger {
    pub groups: Vec<ConditionGroup>,
}

impl Trigger {
    /// Trigger with a single group holding one condition.
    pub fn single(condition: Condition) -> Self {
        Self {
            groups: vec![ConditionGroup {
                conditions: vec![condition],
            }],
        }
    }

    /// Adds an alternative (OR) group.
    pub fn or(mut self, group: ConditionGroup) -> Self {
        self.groups.push(group);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|g| g.conditions.is_empty())
    }

    pub fn conditions(&self) -> impl Iterator<Item = &Condition> {
        self.groups.iter().flat_map(|g| g.conditions.iter())
    }

    pub(crate) fn conditions_mut(&mut self) -> impl Iterator<Item = &mut Condition> {
        self.groups.iter_mut().flat_map(|g| g.conditions.iter_mut())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConditionGroup {
    pub conditions: Vec<Condition>,
}

impl ConditionGroup {
    pub fn all(conditions: Vec<Condition>) -> Self {
        Self { conditions }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Seconds between the condition becoming true and the trigger firing.
    pub delay: Value<f64>,
    pub edge: ConditionEdge,
    pub scope: ConditionScope,
}

impl Condition {
    pub fn by_value(condition: ValueCondition) -> Self {
        Self {
            delay: Value::Literal(0.0),
            edge: ConditionEdge::Rising,
            scope: ConditionScope::ByValue(condition),
        }
    }

    pub fn by_entity(
        entities: Vec<EntityId>,
        rule: TriggeringEntitiesRule,
        condition: EntityCondition,
    ) -> Self {
        Self {
            delay: Value::Literal(0.0),
            edge: ConditionEdge::Rising,
            scope: ConditionScope::ByEntity {
                triggering: TriggeringEntities { rule, entities },
                condition,
            },
        }
    }

    pub fn with_delay(mut self, delay: impl Into<Value<f64>>) -> Self {
        self.delay = delay.into();
        self
    }

    pub fn with_edge(mut self, edge: ConditionEdge) -> Self {
        self.edge = edge;
        self
    }

    /// Every entity this condition refers to (triggering entities first).
    pub fn referenced_entities(&self) -> Vec<EntityId> {
        match &self.scope {
            ConditionScope::ByEntity {
                triggering,
                condition,
            } => {
                let mut ids = triggering.entities.clone();
                ids.extend(condition.referenced_entity());
                ids
            }
            ConditionScope::ByValue(_) => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConditionScope {
    ByEntity {
        triggering: TriggeringEntities,
        condition: EntityCondition,
    },
    ByValue(ValueCondition),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggeringEntities {
    pub rule: TriggeringEntitiesRule,
    pub entities: Vec<EntityId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CollisionTarget {
    Entity(EntityId),
    ByType(ObjectType),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityCondition {
    EndOfRoad {
        duration: Value<f64>,
    },
    Collision(CollisionTarget),
    Offroad {
        duration: Value<f64>,
    },
    TimeHeadway {
        entity: EntityId,
        value: Value<f64>,
        freespace: bool,
        along_route: bool,
        rule: Rule,
    },
    Acceleration {
        value: Value<f64>,
        rule: Rule,
    },
    StandStill {
        duration: Value<f64>,
    },
    Speed {
        value: Value<f64>,
        rule: Rule,
    },
    RelativeSpeed {
        entity: EntityId,
        value: Value<f64>,
        rule: Rule,
    },
    TraveledDistance {
        value: Value<f64>,
    },
    ReachPosition {
        position: WorldPosition,
        tolerance: Value<f64>,
    },
    Distance {
        position: WorldPosition,
        value: Value<f64>,
        freespace: bool,
        along_route: bool,
        rule: Rule,
    },
    RelativeDistance {
        entity: EntityId,
        distance_type: RelativeDistanceType,
        value: Value<f64>,
        freespace: bool,
        rule: Rule,
    },
}

impl EntityCondition {
    /// Reference entity of relative conditions.
    pub fn referenced_entity(&self) -> Option<EntityId> {
        match self {
            Self::Collision(CollisionTarget::Entity(entity))
            | Self::TimeHeadway { entity, .. }
            | Self::RelativeSpeed { entity, .. }
            | Self::RelativeDistance { entity, .. } => Some(*entity),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::EndOfRoad { .. } => "EndOfRoadCondition",
            Self::Collision(_) => "CollisionCondition",
            Self::Offroad { .. } => "OffroadCondition",
            Self::TimeHeadway { .. } => "TimeHeadwayCondition",
            Self::Acceleration { .. } => "AccelerationCondition",
            Self::StandStill { .. } => "StandStillCondition",
            Self::Speed { .. } => "SpeedCondition",
            Self::RelativeSpeed { .. } => "RelativeSpeedCondition",
            Self::TraveledDistance { .. } => "TraveledDistanceCondition",
            Self::ReachPosition { .. } => "ReachPositionCondition",
            Self::Distance { .. } => "DistanceCondition",
            Self::RelativeDistance { .. } => "RelativeDistanceCondition",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueCondition {
    /// Compares a declared global parameter against `value`.
    Parameter {
        parameter: String,
        value: String,
        rule: Rule,
    },
    TimeOfDay {
        date_time: Value<NaiveDateTime>,
        rule: Rule,
    },
    SimulationTime {
        value: Value<f64>,
        rule: Rule,
    },
    /// The element name is user supplied and must name a storyboard element of the document.
    StoryboardElementState {
        element_type: StoryboardElementType,
        element: String,
        state: StoryboardElementState,
    },
    UserDefinedValue {
        name: String,
        value: String,
        rule: Rule,
    },
    TrafficSignal {
        signal_id: String,
        state: String,
    },
    TrafficSignalController {
        controller: String,
        phase: String,
    },
}

impl ValueCondition {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Parameter { .. } => "ParameterCondition",
            Self::TimeOfDay { .. } => "TimeOfDayCondition",
            Self::SimulationTime { .. } => "SimulationTimeCondition",
            Self::StoryboardElementState { .. } => "StoryboardElementStateCondition",
            Self::UserDefinedValue { .. } => "UserDefinedValueCondition",
            Self::TrafficSignal { .. } => "TrafficSignalCondition",
            Self::TrafficSignalController { .. } => "TrafficSignalControllerCondition",
        }
    }
}
