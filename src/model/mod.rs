//! Scenario document model.
//!
//! The document exclusively owns its entities and maneuvers. Cross-references between them are
//! plain [`EntityId`] copies, so they have to be re-validated by the
//! [`ReferenceResolver`](crate::ReferenceResolver) before every export.

use core::fmt;

use serde::{Deserialize, Serialize};

mod action;
mod condition;
mod entity;

pub use action::{
    DynamicConstraints, Environment, LaneChangeAction, LaneChangeTarget, LaneOffsetAction,
    LaneOffsetTarget, LateralDistanceAction, LongitudinalDistanceAction, LongitudinalGap,
    Maneuver, ManeuverKind, Precipitation, Route, SpeedAction, SpeedTarget, Sun,
    TrafficSignalState, TransitionDynamics, Waypoint,
};
pub use condition::{
    CollisionTarget, Condition, ConditionGroup, ConditionScope, EntityCondition, Trigger,
    TriggeringEntities, ValueCondition,
};
pub use entity::{Controller, EntityKind, Property, ScenarioEntity};

/// Defines a closed enumeration of an OpenSCENARIO attribute with its XML spelling.
macro_rules! xml_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $xml:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            pub fn from_xml(s: &str) -> Option<Self> {
                match s {
                    $($xml => Some(Self::$variant),)+
                    _ => None,
                }
            }

            pub fn as_xml(self) -> &'static str {
                match self {
                    $(Self::$variant => $xml),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_xml())
            }
        }
    };
}
pub(crate) use xml_enum;

xml_enum! {
    /// Comparison operator of a condition.
    ///
    /// The last three values come from OpenSCENARIO 1.1 and are accepted in 1.0 documents too.
    Rule {
        GreaterThan => "greaterThan",
        LessThan => "lessThan",
        EqualTo => "equalTo",
        GreaterOrEqual => "greaterOrEqual",
        LessOrEqual => "lessOrEqual",
        NotEqualTo => "notEqualTo",
    }
}

xml_enum! {
    DynamicsShape {
        Linear => "linear",
        Cubic => "cubic",
        Sinusoidal => "sinusoidal",
        Step => "step",
    }
}

xml_enum! {
    DynamicsDimension {
        Rate => "rate",
        Time => "time",
        Distance => "distance",
    }
}

xml_enum! {
    SpeedTargetValueType {
        Delta => "delta",
        Factor => "factor",
    }
}

xml_enum! {
    RouteStrategy {
        Fastest => "fastest",
        Shortest => "shortest",
        LeastIntersections => "leastIntersections",
        Random => "random",
    }
}

xml_enum! {
    ConditionEdge {
        Rising => "rising",
        Falling => "falling",
        RisingOrFalling => "risingOrFalling",
        None => "none",
    }
}

xml_enum! {
    TriggeringEntitiesRule {
        Any => "any",
        All => "all",
    }
}

xml_enum! {
    StoryboardElementType {
        Story => "story",
        Act => "act",
        ManeuverGroup => "maneuverGroup",
        Maneuver => "maneuver",
        Event => "event",
        Action => "action",
    }
}

xml_enum! {
    StoryboardElementState {
        StartTransition => "startTransition",
        EndTransition => "endTransition",
        StopTransition => "stopTransition",
        SkipTransition => "skipTransition",
        CompleteState => "completeState",
        RunningState => "runningState",
        StandbyState => "standbyState",
    }
}

xml_enum! {
    RelativeDistanceType {
        Longitudinal => "longitudinal",
        Lateral => "lateral",
        CartesianDistance => "cartesianDistance",
    }
}

xml_enum! {
    ObjectType {
        Pedestrian => "pedestrian",
        Vehicle => "vehicle",
        Miscellaneous => "miscellaneous",
    }
}

xml_enum! {
    CloudState {
        SkyOff => "skyOff",
        Free => "free",
        Cloudy => "cloudy",
        Overcast => "overcast",
        Rainy => "rainy",
    }
}

xml_enum! {
    PrecipitationType {
        Dry => "dry",
        Rain => "rain",
        Snow => "snow",
    }
}

xml_enum! {
    MiscObjectCategory {
        None => "none",
        Obstacle => "obstacle",
        Pole => "pole",
        Tree => "tree",
        Vegetation => "vegetation",
        Barrier => "barrier",
        Building => "building",
        ParkingSpace => "parkingSpace",
        Patch => "patch",
        Railing => "railing",
        TrafficIsland => "trafficIsland",
        Crosswalk => "crosswalk",
        StreetLamp => "streetLamp",
        Gantry => "gantry",
        SoundBarrier => "soundBarrier",
        Wind => "wind",
        RoadMark => "roadMark",
    }
}

/// Opaque internal handle of a [`ScenarioEntity`].
///
/// Not the exported XML `name`; names are synthesized on export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// World coordinates (meters, heading in radians), already transformed by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldPosition {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub h: f64,
}

impl WorldPosition {
    pub fn new(x: f64, y: f64, z: f64, h: f64) -> Self {
        Self { x, y, z, h }
    }
}

/// Road network reference.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoadNetwork {
    /// Pfad der OpenDRIVE-Datei (`LogicFile@filepath`), wird unverändert exportiert.
    pub logic_file: String,
}

/// In-memory scenario: road network, entities, maneuvers and the initial environment.
///
/// Global parameters are not part of the document; they travel in a separate
/// [`ParameterTable`](crate::ParameterTable) handed to every codec call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScenarioDocument {
    pub road_network: RoadNetwork,
    pub entities: Vec<ScenarioEntity>,
    /// Executed in declaration order.
    pub maneuvers: Vec<Maneuver>,
    #[serde(default)]
    pub environment: Environment,
}

impl ScenarioDocument {
    pub fn new(logic_file: impl Into<String>) -> Self {
        Self {
            road_network: RoadNetwork {
                logic_file: logic_file.into(),
            },
            ..Self::default()
        }
    }

    pub fn entity(&self, id: EntityId) -> Option<&ScenarioEntity> {
        self.entities.iter().find(|e| e.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xml_enum_roundtrip() {
        for rule in Rule::ALL {
            assert_eq!(Rule::from_xml(rule.as_xml()), Some(*rule));
        }
        assert_eq!(Rule::from_xml("greaterOrEqual"), Some(Rule::GreaterOrEqual));
        assert_eq!(Rule::from_xml("GreaterThan"), None);
        assert_eq!(MiscObjectCategory::from_xml("streetLamp"), Some(MiscObjectCategory::StreetLamp));
    }

    #[test]
    fn entity_id_display() {
        assert_eq!(EntityId(7).to_string(), "#7");
    }

    #[test]
    fn document_entity_lookup() {
        let mut doc = ScenarioDocument::new("Town01");
        doc.entities.push(ScenarioEntity::new(
            EntityId(3),
            EntityKind::Pedestrian { model: "walker.0001".into() },
            WorldPosition::default(),
        ));
        assert!(doc.entity(EntityId(3)).is_some());
        assert!(doc.entity(EntityId(1)).is_none());
        assert_eq!(doc.road_network.logic_file, "Town01");
    }
}
