use super::{signal_name, Encoder};
use crate::model::{
    CollisionTarget, Condition, ConditionScope, EntityCondition, Trigger, ValueCondition,
};
use crate::policy::Tag;
use crate::Result;

impl Encoder<'_> {
    /// `StartTrigger`/`StopTrigger` with one `ConditionGroup` per OR branch.
    pub(super) fn trigger(&mut self, tag: Tag, trigger: &Trigger, condition_name: &str) -> Result<()> {
        self.open(tag)?;
        for group in &trigger.groups {
            if group.conditions.is_empty() {
                continue;
            }
            self.open(Tag::ConditionGroup)?;
            for condition in &group.conditions {
                self.condition(condition, condition_name)?;
            }
            self.close()?;
        }
        self.close()
    }

    fn condition(&mut self, condition: &Condition, name: &str) -> Result<()> {
        self.open(Tag::Condition)?;
        self.attr("name", name)?;
        self.value("delay", &condition.delay)?;
        self.attr("conditionEdge", condition.edge.as_xml())?;
        match &condition.scope {
            ConditionScope::ByEntity { triggering, condition } => {
                self.open(Tag::ByEntityCondition)?;
                self.open(Tag::TriggeringEntities)?;
                self.attr("triggeringEntitiesRule", triggering.rule.as_xml())?;
                for id in &triggering.entities {
                    self.open(Tag::EntityRef)?;
                    self.entity_ref("entityRef", *id)?;
                    self.close()?;
                }
                self.close()?;
                self.open(Tag::EntityCondition)?;
                self.entity_condition(condition)?;
                self.close()?;
                self.close()?;
            }
            ConditionScope::ByValue(condition) => {
                self.open(Tag::ByValueCondition)?;
                self.value_condition(condition)?;
                self.close()?;
            }
        }
        self.close()
    }

    fn entity_condition(&mut self, condition: &EntityCondition) -> Result<()> {
        match condition {
            EntityCondition::EndOfRoad { duration } => {
                self.open(Tag::EndOfRoadCondition)?;
                self.value("duration", duration)?;
            }
            EntityCondition::Collision(target) => {
                self.open(Tag::CollisionCondition)?;
                match target {
                    CollisionTarget::Entity(id) => {
                        self.open(Tag::EntityRef)?;
                        self.entity_ref("entityRef", *id)?;
                    }
                    CollisionTarget::ByType(t) => {
                        self.open(Tag::ByType)?;
                        self.attr("type", t.as_xml())?;
                    }
                }
                self.close()?;
            }
            EntityCondition::Offroad { duration } => {
                self.open(Tag::OffroadCondition)?;
                self.value("duration", duration)?;
            }
            EntityCondition::TimeHeadway {
                entity,
                value,
                freespace,
                along_route,
                rule,
            } => {
                self.open(Tag::TimeHeadwayCondition)?;
                self.entity_ref("entityRef", *entity)?;
                self.value("value", value)?;
                self.bool_attr("freespace", *freespace)?;
                self.bool_attr("alongRoute", *along_route)?;
                self.attr("rule", rule.as_xml())?;
            }
            EntityCondition::Acceleration { value, rule } => {
                self.open(Tag::AccelerationCondition)?;
                self.value("value", value)?;
                self.attr("rule", rule.as_xml())?;
            }
            EntityCondition::StandStill { duration } => {
                self.open(Tag::StandStillCondition)?;
                self.value("duration", duration)?;
            }
            EntityCondition::Speed { value, rule } => {
                self.open(Tag::SpeedCondition)?;
                self.value("value", value)?;
                self.attr("rule", rule.as_xml())?;
            }
            EntityCondition::RelativeSpeed { entity, value, rule } => {
                self.open(Tag::RelativeSpeedCondition)?;
                self.entity_ref("entityRef", *entity)?;
                self.value("value", value)?;
                self.attr("rule", rule.as_xml())?;
            }
            EntityCondition::TraveledDistance { value } => {
                self.open(Tag::TraveledDistanceCondition)?;
                self.value("value", value)?;
            }
            EntityCondition::ReachPosition { position, tolerance } => {
                self.open(Tag::ReachPositionCondition)?;
                self.value("tolerance", tolerance)?;
                self.position(*position)?;
            }
            EntityCondition::Distance {
                position,
                value,
                freespace,
                along_route,
                rule,
            } => {
                self.open(Tag::DistanceCondition)?;
                self.value("value", value)?;
                self.bool_attr("freespace", *freespace)?;
                self.bool_attr("alongRoute", *along_route)?;
                self.attr("rule", rule.as_xml())?;
                self.position(*position)?;
            }
            EntityCondition::RelativeDistance {
                entity,
                distance_type,
                value,
                freespace,
                rule,
            } => {
                self.open(Tag::RelativeDistanceCondition)?;
                self.entity_ref("entityRef", *entity)?;
                self.attr("relativeDistanceType", distance_type.as_xml())?;
                self.value("value", value)?;
                self.bool_attr("freespace", *freespace)?;
                self.attr("rule", rule.as_xml())?;
            }
        }
        self.close()
    }

    fn value_condition(&mut self, condition: &ValueCondition) -> Result<()> {
        match condition {
            ValueCondition::Parameter { parameter, value, rule } => {
                self.open(Tag::ParameterCondition)?;
                self.attr("parameterRef", parameter)?;
                self.attr("value", value)?;
                self.attr("rule", rule.as_xml())?;
            }
            ValueCondition::TimeOfDay { date_time, rule } => {
                self.open(Tag::TimeOfDayCondition)?;
                self.value("dateTime", date_time)?;
                self.attr("rule", rule.as_xml())?;
            }
            ValueCondition::SimulationTime { value, rule } => {
                self.open(Tag::SimulationTimeCondition)?;
                self.value("value", value)?;
                self.attr("rule", rule.as_xml())?;
            }
            ValueCondition::StoryboardElementState {
                element_type,
                element,
                state,
            } => {
                self.open(Tag::StoryboardElementStateCondition)?;
                self.attr("storyboardElementType", element_type.as_xml())?;
                self.attr("storyboardElementRef", element)?;
                self.attr("state", state.as_xml())?;
            }
            ValueCondition::UserDefinedValue { name, value, rule } => {
                self.open(Tag::UserDefinedValueCondition)?;
                self.text("name", name)?;
                self.text("value", value)?;
                self.attr("rule", rule.as_xml())?;
            }
            ValueCondition::TrafficSignal { signal_id, state } => {
                self.open(Tag::TrafficSignalCondition)?;
                self.attr("name", &signal_name(signal_id))?;
                self.text("state", state)?;
            }
            ValueCondition::TrafficSignalController { controller, phase } => {
                self.open(Tag::TrafficSignalControllerCondition)?;
                self.text("trafficSignalControllerRef", controller)?;
                self.text("phase", phase)?;
            }
        }
        self.close()
    }
}
