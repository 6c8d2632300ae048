//! Triggers and conditions.
//!
//! A condition that uses unsupported content is dropped with its diagnostic; a group that
//! loses all of its conditions is dropped as well.

use chrono::NaiveDateTime;
use roxmltree::Node;

use super::entities::{missing, unexpected};
use super::storyboard::strip_signal_prefix;
use super::{required, DResult, Decoder, Failure};
use crate::model::{
    CollisionTarget, Condition, ConditionEdge, ConditionGroup, ConditionScope, EntityCondition,
    ObjectType, RelativeDistanceType, Rule, StoryboardElementState, StoryboardElementType,
    Trigger, TriggeringEntities, TriggeringEntitiesRule, ValueCondition, WorldPosition,
};
use crate::policy::Tag;
use crate::Error;

impl Decoder<'_> {
    /// `StartTrigger` or `StopTrigger` of an event.
    pub(super) fn trigger(&mut self, node: Node<'_, '_>, tag: Tag) -> DResult<Trigger> {
        let mut trigger = Trigger::default();
        for (_, group) in self.children(node, tag) {
            let mut conditions = Vec::new();
            for (_, condition) in self.children(group, Tag::ConditionGroup) {
                match self.condition(condition) {
                    Ok(c) => conditions.push(c),
                    Err(Failure::Dropped) => {}
                    Err(fatal) => return Err(fatal),
                }
            }
            if !conditions.is_empty() {
                trigger.groups.push(ConditionGroup { conditions });
            }
        }
        Ok(trigger)
    }

    fn condition(&mut self, node: Node<'_, '_>) -> DResult<Condition> {
        let delay = self.value(node, "delay")?;
        let edge = self.enumeration(node, "conditionEdge", ConditionEdge::from_xml)?;
        let (tag, inner) = self.choice(node, Tag::Condition)?;
        let scope = match tag {
            Tag::ByEntityCondition => self.by_entity(inner)?,
            Tag::ByValueCondition => {
                let (tag, value) = self.choice(inner, Tag::ByValueCondition)?;
                ConditionScope::ByValue(self.value_condition(tag, value)?)
            }
            other => return Err(unexpected(inner, other)),
        };
        Ok(Condition { delay, edge, scope })
    }

    fn rule(&self, node: Node<'_, '_>) -> crate::Result<Rule> {
        self.enumeration(node, "rule", Rule::from_xml)
    }

    fn by_entity(&mut self, node: Node<'_, '_>) -> DResult<ConditionScope> {
        let children = self.children(node, Tag::ByEntityCondition);
        let find = |tag: Tag| {
            children
                .iter()
                .find(|(t, _)| *t == tag)
                .map(|(_, n)| *n)
                .ok_or_else(|| missing(node, tag))
        };
        let (triggering_node, condition_node) =
            (find(Tag::TriggeringEntities)?, find(Tag::EntityCondition)?);

        let rule = self.enumeration(
            triggering_node,
            "triggeringEntitiesRule",
            TriggeringEntitiesRule::from_xml,
        )?;
        let mut entities = Vec::new();
        for (_, entity_ref) in self.children(triggering_node, Tag::TriggeringEntities) {
            entities.push(self.entity_ref(entity_ref, "entityRef")?);
        }
        if entities.is_empty() {
            return Err(Error::schema_violation(
                super::node_path(triggering_node),
                "TriggeringEntities needs at least one EntityRef",
            )
            .into());
        }

        let (tag, inner) = self.choice(condition_node, Tag::EntityCondition)?;
        Ok(ConditionScope::ByEntity {
            triggering: TriggeringEntities { rule, entities },
            condition: self.entity_condition(tag, inner)?,
        })
    }

    fn entity_condition(&mut self, tag: Tag, node: Node<'_, '_>) -> DResult<EntityCondition> {
        Ok(match tag {
            Tag::EndOfRoadCondition => EntityCondition::EndOfRoad {
                duration: self.value(node, "duration")?,
            },
            Tag::CollisionCondition => {
                let (tag, target) = self.choice(node, Tag::CollisionCondition)?;
                EntityCondition::Collision(match tag {
                    Tag::EntityRef => CollisionTarget::Entity(self.entity_ref(target, "entityRef")?),
                    Tag::ByType => {
                        CollisionTarget::ByType(self.enumeration(target, "type", ObjectType::from_xml)?)
                    }
                    other => return Err(unexpected(target, other)),
                })
            }
            Tag::OffroadCondition => EntityCondition::Offroad {
                duration: self.value(node, "duration")?,
            },
            Tag::TimeHeadwayCondition => EntityCondition::TimeHeadway {
                entity: self.entity_ref(node, "entityRef")?,
                value: self.value(node, "value")?,
                freespace: self.flag(node, "freespace")?,
                along_route: self.flag(node, "alongRoute")?,
                rule: self.rule(node)?,
            },
            Tag::AccelerationCondition => EntityCondition::Acceleration {
                value: self.value(node, "value")?,
                rule: self.rule(node)?,
            },
            Tag::StandStillCondition => EntityCondition::StandStill {
                duration: self.value(node, "duration")?,
            },
            Tag::SpeedCondition => EntityCondition::Speed {
                value: self.value(node, "value")?,
                rule: self.rule(node)?,
            },
            Tag::RelativeSpeedCondition => EntityCondition::RelativeSpeed {
                entity: self.entity_ref(node, "entityRef")?,
                value: self.value(node, "value")?,
                rule: self.rule(node)?,
            },
            Tag::TraveledDistanceCondition => EntityCondition::TraveledDistance {
                value: self.value(node, "value")?,
            },
            Tag::ReachPositionCondition => EntityCondition::ReachPosition {
                tolerance: self.value(node, "tolerance")?,
                position: self.condition_position(node, tag)?,
            },
            Tag::DistanceCondition => EntityCondition::Distance {
                value: self.value(node, "value")?,
                freespace: self.flag(node, "freespace")?,
                along_route: self.flag(node, "alongRoute")?,
                rule: self.rule(node)?,
                position: self.condition_position(node, tag)?,
            },
            Tag::RelativeDistanceCondition => EntityCondition::RelativeDistance {
                entity: self.entity_ref(node, "entityRef")?,
                distance_type: self.enumeration(
                    node,
                    "relativeDistanceType",
                    RelativeDistanceType::from_xml,
                )?,
                value: self.value(node, "value")?,
                freespace: self.flag(node, "freespace")?,
                rule: self.rule(node)?,
            },
            other => return Err(unexpected(node, other)),
        })
    }

    fn condition_position(&mut self, node: Node<'_, '_>, tag: Tag) -> DResult<WorldPosition> {
        let position = self
            .children(node, tag)
            .into_iter()
            .find(|(t, _)| *t == Tag::Position)
            .map(|(_, n)| n)
            .ok_or_else(|| missing(node, Tag::Position))?;
        self.position(position)
    }

    fn value_condition(&mut self, tag: Tag, node: Node<'_, '_>) -> DResult<ValueCondition> {
        Ok(match tag {
            Tag::ParameterCondition => {
                let parameter = required(node, "parameterRef")?;
                let parameter = crate::parameter::parameter_reference(parameter).unwrap_or(parameter);
                if !self.params.contains(parameter) {
                    return Err(Error::UnknownParameter {
                        name: parameter.to_string(),
                    }
                    .into());
                }
                ValueCondition::Parameter {
                    parameter: parameter.to_string(),
                    value: required(node, "value")?.to_string(),
                    rule: self.rule(node)?,
                }
            }
            Tag::TimeOfDayCondition => ValueCondition::TimeOfDay {
                date_time: self.value::<NaiveDateTime>(node, "dateTime")?,
                rule: self.rule(node)?,
            },
            Tag::SimulationTimeCondition => ValueCondition::SimulationTime {
                value: self.value(node, "value")?,
                rule: self.rule(node)?,
            },
            Tag::StoryboardElementStateCondition => ValueCondition::StoryboardElementState {
                element_type: self.enumeration(
                    node,
                    "storyboardElementType",
                    StoryboardElementType::from_xml,
                )?,
                element: self.text(node, "storyboardElementRef")?,
                state: self.enumeration(node, "state", StoryboardElementState::from_xml)?,
            },
            Tag::UserDefinedValueCondition => ValueCondition::UserDefinedValue {
                name: self.text(node, "name")?,
                value: self.text(node, "value")?,
                rule: self.rule(node)?,
            },
            Tag::TrafficSignalCondition => ValueCondition::TrafficSignal {
                signal_id: strip_signal_prefix(self.text(node, "name")?),
                state: self.text(node, "state")?,
            },
            Tag::TrafficSignalControllerCondition => ValueCondition::TrafficSignalController {
                controller: self.text(node, "trafficSignalControllerRef")?,
                phase: self.text(node, "phase")?,
            },
            other => return Err(unexpected(node, other)),
        })
    }
}
