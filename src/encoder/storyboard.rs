//! Story, act and one maneuver group per model maneuver.

use super::{signal_name, Encoder};
use crate::model::{
    DynamicConstraints, LaneChangeTarget, LaneOffsetTarget, LongitudinalGap, Maneuver,
    ManeuverKind, Route, ScenarioDocument, SpeedTarget, TransitionDynamics,
};
use crate::naming::{self, ManeuverNames};
use crate::policy::Tag;
use crate::Result;

impl Encoder<'_> {
    pub(super) fn story(&mut self, doc: &ScenarioDocument) -> Result<()> {
        self.open(Tag::Story)?;
        self.attr("name", naming::STORY)?;
        self.open(Tag::Act)?;
        self.attr("name", naming::ACT)?;
        for (i, maneuver) in doc.maneuvers.iter().enumerate() {
            self.maneuver_group(maneuver, &ManeuverNames::new(i + 1))?;
        }
        self.constant(Tag::ActStartTrigger)?;
        self.constant(Tag::ActStopTrigger)?;
        self.close()?;
        self.close()
    }

    fn maneuver_group(&mut self, maneuver: &Maneuver, names: &ManeuverNames) -> Result<()> {
        self.open(Tag::ManeuverGroup)?;
        self.constant(Tag::MaximumExecutionCount)?;
        self.attr("name", &names.group)?;

        self.open(Tag::Actors)?;
        self.constant(Tag::SelectTriggeringEntities)?;
        if let Some(target) = maneuver.target {
            self.open(Tag::EntityRef)?;
            self.entity_ref("entityRef", target)?;
            self.close()?;
        }
        self.close()?;

        self.open(Tag::Maneuver)?;
        self.attr("name", &names.maneuver)?;
        self.open(Tag::Event)?;
        self.attr("name", &names.event)?;
        self.constant(Tag::Priority)?;

        self.open(Tag::Action)?;
        self.attr("name", &names.action)?;
        self.action(&maneuver.kind, names)?;
        self.close()?;

        self.trigger(Tag::StartTrigger, &maneuver.start, &names.condition)?;
        if let Some(stop) = &maneuver.stop {
            self.trigger(Tag::StopTrigger, stop, &names.condition)?;
        }

        self.close()?;
        self.close()?;
        self.close()
    }

    fn action(&mut self, kind: &ManeuverKind, names: &ManeuverNames) -> Result<()> {
        if kind.is_global() {
            self.open(Tag::GlobalAction)?;
            match kind {
                ManeuverKind::Environment(env) => self.environment_action(env)?,
                ManeuverKind::TrafficSignalState(s) => {
                    self.open(Tag::InfrastructureAction)?;
                    self.open(Tag::TrafficSignalAction)?;
                    self.open(Tag::TrafficSignalStateAction)?;
                    self.attr("name", &signal_name(&s.signal_id))?;
                    self.text("state", &s.state)?;
                    self.close()?;
                    self.close()?;
                    self.close()?;
                }
                _ => {}
            }
            return self.close();
        }

        self.open(Tag::PrivateAction)?;
        match kind {
            ManeuverKind::Speed(a) => {
                self.open(Tag::LongitudinalAction)?;
                self.open(Tag::SpeedAction)?;
                self.dynamics(Tag::SpeedActionDynamics, &a.dynamics)?;
                self.open(Tag::SpeedActionTarget)?;
                match &a.target {
                    SpeedTarget::Absolute { value } => {
                        self.open(Tag::AbsoluteTargetSpeed)?;
                        self.value("value", value)?;
                    }
                    SpeedTarget::Relative {
                        entity,
                        value,
                        value_type,
                        continuous,
                    } => {
                        self.open(Tag::RelativeTargetSpeed)?;
                        self.entity_ref("entityRef", *entity)?;
                        self.value("value", value)?;
                        self.attr("speedTargetValueType", value_type.as_xml())?;
                        self.bool_attr("continuous", *continuous)?;
                    }
                }
                self.close()?;
                self.close()?;
                self.close()?;
                self.close()?;
            }
            ManeuverKind::LongitudinalDistance(a) => {
                self.open(Tag::LongitudinalAction)?;
                self.open(Tag::LongitudinalDistanceAction)?;
                self.entity_ref("entityRef", a.entity)?;
                match &a.gap {
                    Some(LongitudinalGap::Distance(v)) => self.value("distance", v)?,
                    Some(LongitudinalGap::TimeGap(v)) => self.value("timeGap", v)?,
                    None => {}
                }
                self.bool_attr("freespace", a.freespace)?;
                self.bool_attr("continuous", a.continuous)?;
                self.constraints(a.constraints.as_ref())?;
                self.close()?;
                self.close()?;
            }
            ManeuverKind::LaneChange(a) => {
                self.open(Tag::LateralAction)?;
                self.open(Tag::LaneChangeAction)?;
                if let Some(offset) = &a.target_lane_offset {
                    self.value("targetLaneOffset", offset)?;
                }
                self.dynamics(Tag::LaneChangeActionDynamics, &a.dynamics)?;
                self.open(Tag::LaneChangeTarget)?;
                match &a.target {
                    LaneChangeTarget::Relative { entity, lanes } => {
                        self.open(Tag::RelativeTargetLane)?;
                        self.entity_ref("entityRef", *entity)?;
                        self.value("value", lanes)?;
                    }
                    LaneChangeTarget::Absolute { lane } => {
                        self.open(Tag::AbsoluteTargetLane)?;
                        self.value("value", lane)?;
                    }
                }
                self.close()?;
                self.close()?;
                self.close()?;
                self.close()?;
            }
            ManeuverKind::LaneOffset(a) => {
                self.open(Tag::LateralAction)?;
                self.open(Tag::LaneOffsetAction)?;
                self.bool_attr("continuous", a.continuous)?;
                self.open(Tag::LaneOffsetActionDynamics)?;
                if let Some(acc) = &a.max_lateral_acc {
                    self.value("maxLateralAcc", acc)?;
                }
                self.attr("dynamicsShape", a.shape.as_xml())?;
                self.close()?;
                self.open(Tag::LaneOffsetTarget)?;
                match &a.target {
                    LaneOffsetTarget::Relative { entity, offset } => {
                        self.open(Tag::RelativeTargetLaneOffset)?;
                        self.entity_ref("entityRef", *entity)?;
                        self.value("value", offset)?;
                    }
                    LaneOffsetTarget::Absolute { offset } => {
                        self.open(Tag::AbsoluteTargetLaneOffset)?;
                        self.value("value", offset)?;
                    }
                }
                self.close()?;
                self.close()?;
                self.close()?;
                self.close()?;
            }
            ManeuverKind::LateralDistance(a) => {
                self.open(Tag::LateralAction)?;
                self.open(Tag::LateralDistanceAction)?;
                self.entity_ref("entityRef", a.entity)?;
                if let Some(d) = &a.distance {
                    self.value("distance", d)?;
                }
                self.bool_attr("freespace", a.freespace)?;
                self.bool_attr("continuous", a.continuous)?;
                self.constraints(a.constraints.as_ref())?;
                self.close()?;
                self.close()?;
            }
            ManeuverKind::ControllerAssign(controller) => {
                self.controller_action(&names.controller, Some(controller))?;
            }
            ManeuverKind::ControllerOverride => {
                self.controller_action(&names.controller, None)?;
            }
            ManeuverKind::TeleportWorldPosition(position) => self.teleport(*position)?,
            ManeuverKind::RouteAssign(route) => self.route(route)?,
            ManeuverKind::Environment(_) | ManeuverKind::TrafficSignalState(_) => {}
        }
        self.close()
    }

    fn dynamics(&mut self, tag: Tag, d: &TransitionDynamics) -> Result<()> {
        self.open(tag)?;
        self.attr("dynamicsShape", d.shape.as_xml())?;
        self.value("value", &d.value)?;
        self.attr("dynamicsDimension", d.dimension.as_xml())?;
        self.close()
    }

    fn constraints(&mut self, c: Option<&DynamicConstraints>) -> Result<()> {
        let Some(c) = c else {
            return Ok(());
        };
        self.open(Tag::DynamicConstraints)?;
        self.value("maxAcceleration", &c.max_acceleration)?;
        self.value("maxDeceleration", &c.max_deceleration)?;
        self.value("maxSpeed", &c.max_speed)?;
        self.close()
    }

    fn route(&mut self, route: &Route) -> Result<()> {
        self.open(Tag::RoutingAction)?;
        self.open(Tag::AssignRouteAction)?;
        self.open(Tag::Route)?;
        self.constant(Tag::RouteName)?;
        self.bool_attr("closed", route.closed)?;
        for wp in &route.waypoints {
            self.open(Tag::Waypoint)?;
            self.attr("routeStrategy", wp.strategy.as_xml())?;
            self.position(wp.position)?;
            self.close()?;
        }
        self.close()?;
        self.close()?;
        self.close()
    }
}
