use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::{
    CloudState, Controller, DynamicsDimension, DynamicsShape, EntityId, PrecipitationType,
    RouteStrategy, SpeedTargetValueType, Trigger, WorldPosition,
};
use crate::parameter::Value;

/// An action applied to an entity (or globally) together with its triggers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Maneuver {
    /// Acting entity; `None` is only valid for global actions.
    pub target: Option<EntityId>,
    pub kind: ManeuverKind,
    pub start: Trigger,
    #[serde(default)]
    pub stop: Option<Trigger>,
}

impl Maneuver {
    pub fn new(target: Option<EntityId>, kind: ManeuverKind, start: Trigger) -> Self {
        Self {
            target,
            kind,
            start,
            stop: None,
        }
    }

    /// An empty trigger means "no stop trigger".
    pub fn with_stop(mut self, stop: Trigger) -> Self {
        self.stop = Some(stop).filter(|t| !t.is_empty());
        self
    }
}

/// Supported actions with their payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ManeuverKind {
    Speed(SpeedAction),
    LongitudinalDistance(LongitudinalDistanceAction),
    LaneChange(LaneChangeAction),
    LaneOffset(LaneOffsetAction),
    LateralDistance(LateralDistanceAction),
    ControllerAssign(Controller),
    /// Override with the fixed all-inactive placeholder values.
    ControllerOverride,
    TeleportWorldPosition(WorldPosition),
    RouteAssign(Route),
    Environment(Environment),
    TrafficSignalState(TrafficSignalState),
}

impl ManeuverKind {
    /// Global actions need no acting entity.
    pub fn is_global(&self) -> bool {
        matches!(self, Self::Environment(_) | Self::TrafficSignalState(_))
    }

    /// Entities referenced from inside the payload.
    pub fn referenced_entities(&self) -> Vec<EntityId> {
        match self {
            Self::Speed(SpeedAction {
                target: SpeedTarget::Relative { entity, .. },
                ..
            })
            | Self::LongitudinalDistance(LongitudinalDistanceAction { entity, .. })
            | Self::LaneChange(LaneChangeAction {
                target: LaneChangeTarget::Relative { entity, .. },
                ..
            })
            | Self::LaneOffset(LaneOffsetAction {
                target: LaneOffsetTarget::Relative { entity, .. },
                ..
            })
            | Self::LateralDistance(LateralDistanceAction { entity, .. }) => vec![*entity],
            _ => Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Speed(_) => "SpeedAction",
            Self::LongitudinalDistance(_) => "LongitudinalDistanceAction",
            Self::LaneChange(_) => "LaneChangeAction",
            Self::LaneOffset(_) => "LaneOffsetAction",
            Self::LateralDistance(_) => "LateralDistanceAction",
            Self::ControllerAssign(_) => "AssignControllerAction",
            Self::ControllerOverride => "OverrideControllerValueAction",
            Self::TeleportWorldPosition(_) => "TeleportAction",
            Self::RouteAssign(_) => "AssignRouteAction",
            Self::Environment(_) => "EnvironmentAction",
            Self::TrafficSignalState(_) => "TrafficSignalStateAction",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionDynamics {
    pub shape: DynamicsShape,
    pub value: Value<f64>,
    pub dimension: DynamicsDimension,
}

impl TransitionDynamics {
    pub fn step() -> Self {
        Self {
            shape: DynamicsShape::Step,
            value: Value::Literal(0.0),
            dimension: DynamicsDimension::Time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedAction {
    pub dynamics: TransitionDynamics,
    pub target: SpeedTarget,
}

impl SpeedAction {
    /// Step change to an absolute speed.
    pub fn absolute(speed: impl Into<Value<f64>>) -> Self {
        Self {
            dynamics: TransitionDynamics::step(),
            target: SpeedTarget::Absolute {
                value: speed.into(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SpeedTarget {
    Absolute {
        value: Value<f64>,
    },
    Relative {
        entity: EntityId,
        value: Value<f64>,
        value_type: SpeedTargetValueType,
        continuous: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicConstraints {
    pub max_acceleration: Value<f64>,
    pub max_deceleration: Value<f64>,
    pub max_speed: Value<f64>,
}

/// `distance` and `timeGap` are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LongitudinalGap {
    Distance(Value<f64>),
    TimeGap(Value<f64>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongitudinalDistanceAction {
    pub entity: EntityId,
    #[serde(default)]
    pub gap: Option<LongitudinalGap>,
    pub freespace: bool,
    pub continuous: bool,
    #[serde(default)]
    pub constraints: Option<DynamicConstraints>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneChangeAction {
    pub dynamics: TransitionDynamics,
    pub target: LaneChangeTarget,
    #[serde(default)]
    pub target_lane_offset: Option<Value<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LaneChangeTarget {
    Absolute { lane: Value<i32> },
    Relative { entity: EntityId, lanes: Value<i32> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneOffsetAction {
    #[serde(default)]
    pub max_lateral_acc: Option<Value<f64>>,
    pub shape: DynamicsShape,
    pub target: LaneOffsetTarget,
    pub continuous: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LaneOffsetTarget {
    Absolute { offset: Value<f64> },
    Relative { entity: EntityId, offset: Value<f64> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LateralDistanceAction {
    pub entity: EntityId,
    #[serde(default)]
    pub distance: Option<Value<f64>>,
    pub freespace: bool,
    pub continuous: bool,
    #[serde(default)]
    pub constraints: Option<DynamicConstraints>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub position: WorldPosition,
    pub strategy: RouteStrategy,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Route {
    pub closed: bool,
    pub waypoints: Vec<Waypoint>,
}

/// Target state of one traffic signal (infrastructure action).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficSignalState {
    /// Opaque signal id, exported as `name="id=<id>"`.
    pub signal_id: String,
    pub state: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sun {
    pub intensity: f64,
    pub azimuth: f64,
    pub elevation: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Precipitation {
    pub kind: PrecipitationType,
    pub intensity: f64,
}

/// Time of day and weather.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    pub time_of_day: NaiveDateTime,
    pub animation: bool,
    pub cloud_state: CloudState,
    pub sun: Sun,
    pub fog_visual_range: f64,
    pub precipitation: Precipitation,
}

impl Default for Environment {
    /// Clear morning: 2020-10-23T06:00:00, no clouds, dry.
    fn default() -> Self {
        let time_of_day = NaiveDate::from_ymd_opt(2020, 10, 23)
            .and_then(|d| d.and_hms_opt(6, 0, 0))
            .unwrap_or_default();
        Self {
            time_of_day,
            animation: false,
            cloud_state: CloudState::Free,
            sun: Sun {
                intensity: 0.85,
                azimuth: 0.0,
                elevation: 1.31,
            },
            fog_visual_range: 100_000.0,
            precipitation: Precipitation {
                kind: PrecipitationType::Dry,
                intensity: 0.0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::format_datetime;

    #[test]
    fn environment_defaults() {
        let env = Environment::default();
        assert_eq!(format_datetime(&env.time_of_day), "2020-10-23T06:00:00");
        assert_eq!(env.cloud_state, CloudState::Free);
        assert_eq!(env.fog_visual_range, 100_000.0);
        assert_eq!(env.sun.elevation, 1.31);
    }

    #[test]
    fn global_kinds() {
        let signal = ManeuverKind::TrafficSignalState(TrafficSignalState {
            signal_id: "12".into(),
            state: "green".into(),
        });
        assert!(signal.is_global());
        assert!(ManeuverKind::Environment(Environment::default()).is_global());
        assert!(!ManeuverKind::ControllerOverride.is_global());
    }

    #[test]
    fn referenced_entities_of_relative_targets() {
        let kind = ManeuverKind::Speed(SpeedAction {
            dynamics: TransitionDynamics::step(),
            target: SpeedTarget::Relative {
                entity: EntityId(4),
                value: Value::Literal(2.0),
                value_type: SpeedTargetValueType::Delta,
                continuous: true,
            },
        });
        assert_eq!(kind.referenced_entities(), vec![EntityId(4)]);
        assert!(ManeuverKind::Speed(SpeedAction::absolute(3.0))
            .referenced_entities()
            .is_empty());
    }
}
