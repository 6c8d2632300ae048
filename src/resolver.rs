//! Cross-reference validation.
//!
//! Entities are referenced by [`EntityId`] copies, storyboard elements by their synthesized
//! names and traffic signals by opaque ids. Nothing keeps these in sync while a document is
//! edited, so the resolver re-checks the whole document before every export (and at the end
//! of [`ScenarioBuilder::build`](crate::ScenarioBuilder::build)).

use crate::model::{
    CollisionTarget, Condition, ConditionScope, Controller, DynamicConstraints, EntityCondition,
    EntityKind,
    LaneChangeTarget, LaneOffsetTarget, LongitudinalGap, ManeuverKind, ScenarioDocument,
    SpeedTarget, StoryboardElementType, Trigger, ValueCondition,
};
use crate::naming::storyboard_element_names;
use crate::parameter::{parameter_reference, ParameterTable, ValueKind};
use crate::{EntityId, Error, FastHashSet, Result};

/// Read-only view of one document for reference checks.
#[derive(Debug)]
pub struct ReferenceResolver<'a> {
    doc: &'a ScenarioDocument,
    entities: FastHashSet<EntityId>,
    elements: FastHashSet<(StoryboardElementType, String)>,
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(doc: &'a ScenarioDocument) -> Self {
        Self {
            doc,
            entities: doc.entities.iter().map(|e| e.id).collect(),
            elements: storyboard_element_names(doc),
        }
    }

    pub fn validate_entity_reference(&self, id: EntityId) -> Result<()> {
        if self.entities.contains(&id) {
            Ok(())
        } else {
            Err(Error::unknown_entity(id, ""))
        }
    }

    /// Forward references are fine: the namespace covers every maneuver of the document.
    /// The element type is part of the key; `Maneuver ID 1` is no event.
    pub fn validate_storyboard_element_reference(
        &self,
        element_type: StoryboardElementType,
        name: &str,
    ) -> Result<()> {
        if self.elements.contains(&(element_type, name.to_string())) {
            Ok(())
        } else {
            Err(Error::unknown_element(name, ""))
        }
    }

    /// Signal ids are opaque; only an empty id is rejected.
    pub fn validate_signal_reference(&self, id: &str) -> Result<()> {
        if id.trim().is_empty() {
            Err(Error::unknown_signal(id, ""))
        } else {
            Ok(())
        }
    }

    /// Checks every reference of the document; reports the first failure with its owner.
    pub fn validate_document(&self, params: &ParameterTable) -> Result<()> {
        check_text(&self.doc.road_network.logic_file, params)
            .map_err(|e| e.or_context(|| "LogicFile".to_string()))?;
        let mut seen = FastHashSet::default();
        for entity in &self.doc.entities {
            if !seen.insert(entity.id) {
                return Err(Error::schema_violation(
                    "Entities",
                    format!("duplicate entity id {}", entity.id),
                ));
            }
            let ctx = || format!("entity {}", entity.id);
            check_text(entity.kind.model(), params).map_err(|e| e.or_context(ctx))?;
            if let Some(controller) = &entity.controller {
                check_controller(controller, params).map_err(|e| e.or_context(ctx))?;
            }
            if let EntityKind::MiscObject { mass, .. } = &entity.kind {
                mass.check(params).map_err(|e| e.or_context(ctx))?;
            }
            if let Some(speed) = &entity.initial_speed {
                speed.check(params).map_err(|e| e.or_context(ctx))?;
            }
        }

        for (i, maneuver) in self.doc.maneuvers.iter().enumerate() {
            let number = i + 1;
            let ctx = || format!("maneuver #{number}");
            match maneuver.target {
                Some(_) if maneuver.kind.is_global() => {
                    return Err(Error::schema_violation(
                        format!("maneuver #{number}"),
                        format!("{} is global and takes no target entity", maneuver.kind.name()),
                    ));
                }
                Some(id) => self.validate_entity_reference(id).map_err(|e| e.or_context(ctx))?,
                None if !maneuver.kind.is_global() => {
                    return Err(Error::schema_violation(
                        format!("maneuver #{number}"),
                        format!("{} needs a target entity", maneuver.kind.name()),
                    ));
                }
                None => {}
            }
            self.validate_kind(&maneuver.kind, params)
                .map_err(|e| e.or_context(ctx))?;

            let start_ctx = || format!("maneuver #{number} start trigger");
            check_trigger_shape(&maneuver.start, start_ctx)?;
            self.validate_trigger(&maneuver.start, params)
                .map_err(|e| e.or_context(start_ctx))?;
            if let Some(stop) = &maneuver.stop {
                let stop_ctx = || format!("maneuver #{number} stop trigger");
                check_trigger_shape(stop, stop_ctx)?;
                self.validate_trigger(stop, params)
                    .map_err(|e| e.or_context(stop_ctx))?;
            }
        }
        Ok(())
    }

    fn validate_kind(&self, kind: &ManeuverKind, params: &ParameterTable) -> Result<()> {
        for id in kind.referenced_entities() {
            self.validate_entity_reference(id)?;
        }
        match kind {
            ManeuverKind::Speed(a) => {
                a.dynamics.value.check(params)?;
                match &a.target {
                    SpeedTarget::Absolute { value } | SpeedTarget::Relative { value, .. } => {
                        value.check(params)
                    }
                }
            }
            ManeuverKind::LongitudinalDistance(a) => {
                match &a.gap {
                    Some(LongitudinalGap::Distance(v) | LongitudinalGap::TimeGap(v)) => {
                        v.check(params)?
                    }
                    None => {}
                }
                check_constraints(a.constraints.as_ref(), params)
            }
            ManeuverKind::LaneChange(a) => {
                a.dynamics.value.check(params)?;
                if let Some(offset) = &a.target_lane_offset {
                    offset.check(params)?;
                }
                match &a.target {
                    LaneChangeTarget::Absolute { lane } => lane.check(params),
                    LaneChangeTarget::Relative { lanes, .. } => lanes.check(params),
                }
            }
            ManeuverKind::LaneOffset(a) => {
                if let Some(acc) = &a.max_lateral_acc {
                    acc.check(params)?;
                }
                match &a.target {
                    LaneOffsetTarget::Absolute { offset }
                    | LaneOffsetTarget::Relative { offset, .. } => offset.check(params),
                }
            }
            ManeuverKind::LateralDistance(a) => {
                if let Some(d) = &a.distance {
                    d.check(params)?;
                }
                check_constraints(a.constraints.as_ref(), params)
            }
            ManeuverKind::RouteAssign(route) if route.waypoints.len() < 2 => Err(
                Error::schema_violation("Route", "a route needs at least two waypoints"),
            ),
            ManeuverKind::TrafficSignalState(s) => {
                self.validate_signal_reference(&s.signal_id)?;
                check_text(&s.state, params)
            }
            ManeuverKind::ControllerAssign(c) => check_controller(c, params),
            ManeuverKind::ControllerOverride
            | ManeuverKind::TeleportWorldPosition(_)
            | ManeuverKind::RouteAssign(_)
            | ManeuverKind::Environment(_) => Ok(()),
        }
    }

    fn validate_trigger(&self, trigger: &Trigger, params: &ParameterTable) -> Result<()> {
        trigger
            .conditions()
            .try_for_each(|c| self.validate_condition(c, params))
    }

    fn validate_condition(&self, condition: &Condition, params: &ParameterTable) -> Result<()> {
        condition.delay.check(params)?;
        match &condition.scope {
            ConditionScope::ByEntity { triggering, condition: cond } => {
                if triggering.entities.is_empty() {
                    return Err(Error::schema_violation(
                        "TriggeringEntities",
                        format!("{} has no triggering entity", cond.name()),
                    ));
                }
                for id in condition.referenced_entities() {
                    self.validate_entity_reference(id)?;
                }
                check_entity_condition(cond, params)
            }
            ConditionScope::ByValue(cond) => self.validate_value_condition(cond, params),
        }
    }

    fn validate_value_condition(&self, cond: &ValueCondition, params: &ParameterTable) -> Result<()> {
        match cond {
            ValueCondition::Parameter { parameter, .. } => {
                if params.contains(parameter) {
                    Ok(())
                } else {
                    Err(Error::UnknownParameter {
                        name: parameter.clone(),
                    })
                }
            }
            ValueCondition::TimeOfDay { date_time, .. } => date_time.check(params),
            ValueCondition::SimulationTime { value, .. } => value.check(params),
            ValueCondition::StoryboardElementState {
                element_type,
                element,
                ..
            } => self.validate_storyboard_element_reference(*element_type, element),
            ValueCondition::UserDefinedValue { name, value, .. } => {
                check_text(name, params)?;
                check_text(value, params)
            }
            ValueCondition::TrafficSignal { signal_id, state } => {
                self.validate_signal_reference(signal_id)?;
                check_text(state, params)
            }
            ValueCondition::TrafficSignalController { controller, phase } => {
                self.validate_signal_reference(controller)?;
                check_text(controller, params)?;
                check_text(phase, params)
            }
        }
    }
}

/// Empty triggers and empty condition groups have no XML form that reads back.
fn check_trigger_shape(trigger: &Trigger, ctx: impl Fn() -> String) -> Result<()> {
    if trigger.is_empty() {
        return Err(Error::schema_violation(ctx(), "trigger has no conditions"));
    }
    if trigger.groups.iter().any(|g| g.conditions.is_empty()) {
        return Err(Error::schema_violation(ctx(), "empty condition group"));
    }
    Ok(())
}

/// Free text starting with `$name` is read back as a reference, so it must be declared.
fn check_text(text: &str, params: &ParameterTable) -> Result<()> {
    match parameter_reference(text) {
        Some(name) => params.resolve(name, ValueKind::String).map(|_| ()),
        None => Ok(()),
    }
}

fn check_controller(controller: &Controller, params: &ParameterTable) -> Result<()> {
    controller.properties.iter().try_for_each(|p| {
        check_text(&p.name, params)?;
        check_text(&p.value, params)
    })
}

fn check_constraints(c: Option<&DynamicConstraints>, params: &ParameterTable) -> Result<()> {
    match c {
        Some(c) => {
            c.max_acceleration.check(params)?;
            c.max_deceleration.check(params)?;
            c.max_speed.check(params)
        }
        None => Ok(()),
    }
}

fn check_entity_condition(cond: &EntityCondition, params: &ParameterTable) -> Result<()> {
    match cond {
        EntityCondition::EndOfRoad { duration }
        | EntityCondition::Offroad { duration }
        | EntityCondition::StandStill { duration } => duration.check(params),
        EntityCondition::Collision(CollisionTarget::Entity(_) | CollisionTarget::ByType(_)) => {
            Ok(())
        }
        EntityCondition::TimeHeadway { value, .. }
        | EntityCondition::Acceleration { value, .. }
        | EntityCondition::Speed { value, .. }
        | EntityCondition::RelativeSpeed { value, .. }
        | EntityCondition::TraveledDistance { value }
        | EntityCondition::Distance { value, .. }
        | EntityCondition::RelativeDistance { value, .. } => value.check(params),
        EntityCondition::ReachPosition { tolerance, .. } => tolerance.check(params),
    }
}
