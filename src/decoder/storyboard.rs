//! Storyboard flattening.
//!
//! Story → Act → ManeuverGroup → Maneuver → Event → Action collapses to one model
//! [`Maneuver`] per (action, actor) pair; global actions yield a single maneuver without target.
//! Event triggers are copied onto every maneuver derived from the event.

use roxmltree::Node;

use super::entities::{missing, unexpected, ControllerChoice};
use super::{node_path, DResult, Decoder, Failure};
use crate::diagnostic::DiagnosticKind;
use crate::model::{
    ConditionScope, DynamicConstraints, DynamicsDimension, DynamicsShape, LaneChangeAction,
    LaneChangeTarget, LaneOffsetAction, LaneOffsetTarget, LateralDistanceAction,
    LongitudinalDistanceAction, LongitudinalGap, Maneuver, ManeuverKind, Route, RouteStrategy,
    ScenarioDocument, SpeedAction, SpeedTarget, SpeedTargetValueType, StoryboardElementType,
    TrafficSignalState, TransitionDynamics, ValueCondition, Waypoint,
};
use crate::naming::{self, ManeuverNames};
use crate::policy::Tag;
use crate::{EntityId, Error, Result};

type Children<'a, 'i> = [(Tag, Node<'a, 'i>)];

fn find<'a, 'i>(children: &Children<'a, 'i>, node: Node<'a, 'i>, tag: Tag) -> DResult<Node<'a, 'i>> {
    children
        .iter()
        .find(|(t, _)| *t == tag)
        .map(|(_, n)| *n)
        .ok_or_else(|| missing(node, tag))
}

/// Signal ids are written as `id=<id>`.
pub(super) fn strip_signal_prefix(name: String) -> String {
    match name.strip_prefix("id=") {
        Some(id) => id.to_string(),
        None => name,
    }
}

impl Decoder<'_> {
    pub(super) fn storyboard(&mut self, node: Node<'_, '_>, doc: &mut ScenarioDocument) -> DResult<()> {
        let children = self.children(node, Tag::Storyboard);
        let init = children
            .iter()
            .find(|(tag, _)| *tag == Tag::Init)
            .map(|(_, n)| *n);
        self.init(node, init, doc)?;

        for (tag, story) in &children {
            if *tag == Tag::Story {
                self.story(*story, doc)?;
            }
        }

        self.metadata.storyboard_names = self
            .element_names
            .iter()
            .filter_map(|((_, source), synthesized)| {
                synthesized.as_ref().map(|s| (source.clone(), s.clone()))
            })
            .collect();
        Ok(())
    }

    fn story(&mut self, node: Node<'_, '_>, doc: &mut ScenarioDocument) -> DResult<()> {
        let name = self.text(node, "name")?;
        self.element_names
            .entry((StoryboardElementType::Story, name))
            .or_insert_with(|| Some(naming::STORY.to_string()));
        for (tag, act) in self.children(node, Tag::Story) {
            if tag != Tag::Act {
                continue;
            }
            let name = self.text(act, "name")?;
            self.element_names
                .entry((StoryboardElementType::Act, name))
                .or_insert_with(|| Some(naming::ACT.to_string()));
            for (tag, group) in self.children(act, Tag::Act) {
                if tag == Tag::ManeuverGroup {
                    self.maneuver_group(group, doc)?;
                }
            }
        }
        Ok(())
    }

    /// Registers a source element name; it gets a synthesized name once a maneuver is derived.
    fn declare_element(&mut self, element_type: StoryboardElementType, name: &str) {
        self.element_names
            .entry((element_type, name.to_string()))
            .or_insert(None);
    }

    /// Binds a source element to the names of maneuver `index` (0-based) if it has none yet.
    fn bind_element(&mut self, element_type: StoryboardElementType, name: &str, index: usize) {
        let names = ManeuverNames::new(index + 1);
        let synthesized = match element_type {
            StoryboardElementType::ManeuverGroup => names.group,
            StoryboardElementType::Maneuver => names.maneuver,
            StoryboardElementType::Event => names.event,
            StoryboardElementType::Action => names.action,
            StoryboardElementType::Story | StoryboardElementType::Act => return,
        };
        let slot = self
            .element_names
            .entry((element_type, name.to_string()))
            .or_insert(None);
        if slot.is_none() {
            *slot = Some(synthesized);
        }
    }

    fn maneuver_group(&mut self, node: Node<'_, '_>, doc: &mut ScenarioDocument) -> DResult<()> {
        self.attr_constant(node, Tag::MaximumExecutionCount);
        let name = self.text(node, "name")?;
        self.declare_element(StoryboardElementType::ManeuverGroup, &name);

        let children = self.children(node, Tag::ManeuverGroup);
        let actors_node = find(&children, node, Tag::Actors)?;
        self.attr_constant(actors_node, Tag::SelectTriggeringEntities);
        let mut actors = Vec::new();
        for (_, entity_ref) in self.children(actors_node, Tag::Actors) {
            match self.entity_ref(entity_ref, "entityRef") {
                Ok(id) => actors.push(id),
                Err(Failure::Dropped) => {}
                Err(fatal) => return Err(fatal),
            }
        }

        let first = doc.maneuvers.len();
        for (tag, maneuver) in &children {
            if *tag == Tag::Maneuver {
                self.maneuver(*maneuver, &actors, doc)?;
            }
        }
        if doc.maneuvers.len() > first {
            self.bind_element(StoryboardElementType::ManeuverGroup, &name, first);
        }
        Ok(())
    }

    fn maneuver(&mut self, node: Node<'_, '_>, actors: &[EntityId], doc: &mut ScenarioDocument) -> DResult<()> {
        let name = self.text(node, "name")?;
        self.declare_element(StoryboardElementType::Maneuver, &name);
        let first = doc.maneuvers.len();
        for (tag, event) in self.children(node, Tag::Maneuver) {
            if tag == Tag::Event {
                self.event(event, actors, doc)?;
            }
        }
        if doc.maneuvers.len() > first {
            self.bind_element(StoryboardElementType::Maneuver, &name, first);
        }
        Ok(())
    }

    fn event(&mut self, node: Node<'_, '_>, actors: &[EntityId], doc: &mut ScenarioDocument) -> DResult<()> {
        self.attr_constant(node, Tag::Priority);
        let name = self.text(node, "name")?;
        self.declare_element(StoryboardElementType::Event, &name);

        let children = self.children(node, Tag::Event);
        // Action-Namen auch dann registrieren, wenn das Event verworfen wird.
        let mut actions = Vec::new();
        for (tag, action) in &children {
            if *tag == Tag::Action {
                let action_name = self.text(*action, "name")?;
                self.declare_element(StoryboardElementType::Action, &action_name);
                actions.push((action_name, *action));
            }
        }

        let start_node = find(&children, node, Tag::StartTrigger)?;
        let start = self.trigger(start_node, Tag::StartTrigger)?;
        if start.is_empty() {
            self.diag(
                DiagnosticKind::ElementSkipped,
                node_path(node),
                format!("event '{name}' has no supported start condition"),
            );
            return Ok(());
        }
        let stop = match children.iter().find(|(t, _)| *t == Tag::StopTrigger) {
            Some((_, n)) => Some(self.trigger(*n, Tag::StopTrigger)?).filter(|t| !t.is_empty()),
            None => None,
        };

        let first = doc.maneuvers.len();
        for (action_name, action) in actions {
            let kind = match self.action(action) {
                Ok(kind) => kind,
                Err(Failure::Dropped) => {
                    self.diag(
                        DiagnosticKind::ElementSkipped,
                        node_path(action),
                        format!("action '{action_name}' not imported"),
                    );
                    continue;
                }
                Err(fatal) => return Err(fatal),
            };
            let targets: Vec<Option<EntityId>> = if kind.is_global() {
                vec![None]
            } else {
                actors.iter().copied().map(Some).collect()
            };
            if targets.is_empty() {
                self.diag(
                    DiagnosticKind::ElementSkipped,
                    node_path(action),
                    format!("private action '{action_name}' has no imported actor"),
                );
                continue;
            }
            let index = doc.maneuvers.len();
            for target in targets {
                doc.maneuvers.push(Maneuver {
                    target,
                    kind: kind.clone(),
                    start: start.clone(),
                    stop: stop.clone(),
                });
            }
            self.bind_element(StoryboardElementType::Action, &action_name, index);
        }
        if doc.maneuvers.len() > first {
            self.bind_element(StoryboardElementType::Event, &name, first);
        }
        Ok(())
    }

    /// Rewrites `StoryboardElementStateCondition` references to the synthesized names.
    ///
    /// Runs after the whole storyboard is read, so forward references resolve.
    pub(super) fn translate_element_references(&mut self, doc: &mut ScenarioDocument) -> Result<()> {
        for (n, maneuver) in doc.maneuvers.iter_mut().enumerate() {
            let triggers = core::iter::once(&mut maneuver.start).chain(maneuver.stop.as_mut());
            for condition in triggers.flat_map(|t| t.conditions_mut()) {
                let ConditionScope::ByValue(ValueCondition::StoryboardElementState {
                    element_type,
                    element,
                    ..
                }) = &mut condition.scope
                else {
                    continue;
                };
                match self.element_names.get(&(*element_type, element.clone())) {
                    Some(Some(synthesized)) => *element = synthesized.clone(),
                    Some(None) => self.diag(
                        DiagnosticKind::ReferenceNotImported,
                        "/OpenSCENARIO/Storyboard".to_string(),
                        format!(
                            "{element_type} '{element}' referenced by maneuver #{} was not imported",
                            n + 1
                        ),
                    ),
                    None => {
                        return Err(Error::unknown_element(
                            element.clone(),
                            format!("maneuver #{}", n + 1),
                        ))
                    }
                }
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------------

    fn action(&mut self, node: Node<'_, '_>) -> DResult<ManeuverKind> {
        let (tag, action) = self.choice(node, Tag::Action)?;
        match tag {
            Tag::GlobalAction => self.global_action(action),
            Tag::PrivateAction => self.private_action(action),
            other => Err(unexpected(action, other)),
        }
    }

    fn global_action(&mut self, node: Node<'_, '_>) -> DResult<ManeuverKind> {
        let (tag, action) = self.choice(node, Tag::GlobalAction)?;
        match tag {
            Tag::EnvironmentAction => Ok(ManeuverKind::Environment(self.environment_action(action)?)),
            Tag::InfrastructureAction => {
                let (_, signal) = self.choice(action, Tag::InfrastructureAction)?;
                let (_, state) = self.choice(signal, Tag::TrafficSignalAction)?;
                Ok(ManeuverKind::TrafficSignalState(TrafficSignalState {
                    signal_id: strip_signal_prefix(self.text(state, "name")?),
                    state: self.text(state, "state")?,
                }))
            }
            other => Err(unexpected(action, other)),
        }
    }

    fn private_action(&mut self, node: Node<'_, '_>) -> DResult<ManeuverKind> {
        let (tag, action) = self.choice(node, Tag::PrivateAction)?;
        match tag {
            Tag::LongitudinalAction => {
                let (tag, inner) = self.choice(action, Tag::LongitudinalAction)?;
                match tag {
                    Tag::SpeedAction => Ok(ManeuverKind::Speed(self.speed_action(inner)?)),
                    Tag::LongitudinalDistanceAction => Ok(ManeuverKind::LongitudinalDistance(
                        self.longitudinal_distance(inner)?,
                    )),
                    other => Err(unexpected(inner, other)),
                }
            }
            Tag::LateralAction => {
                let (tag, inner) = self.choice(action, Tag::LateralAction)?;
                match tag {
                    Tag::LaneChangeAction => Ok(ManeuverKind::LaneChange(self.lane_change(inner)?)),
                    Tag::LaneOffsetAction => Ok(ManeuverKind::LaneOffset(self.lane_offset(inner)?)),
                    Tag::LateralDistanceAction => Ok(ManeuverKind::LateralDistance(
                        self.lateral_distance(inner)?,
                    )),
                    other => Err(unexpected(inner, other)),
                }
            }
            Tag::ControllerAction => Ok(match self.controller_action(action)? {
                ControllerChoice::Assign(c) => ManeuverKind::ControllerAssign(c),
                ControllerChoice::Override => ManeuverKind::ControllerOverride,
            }),
            Tag::TeleportAction => Ok(ManeuverKind::TeleportWorldPosition(self.teleport(action)?)),
            Tag::RoutingAction => {
                let (_, assign) = self.choice(action, Tag::RoutingAction)?;
                let (_, route) = self.choice(assign, Tag::AssignRouteAction)?;
                Ok(ManeuverKind::RouteAssign(self.route(route)?))
            }
            other => Err(unexpected(action, other)),
        }
    }

    fn dynamics(&self, node: Node<'_, '_>) -> Result<TransitionDynamics> {
        Ok(TransitionDynamics {
            shape: self.enumeration(node, "dynamicsShape", DynamicsShape::from_xml)?,
            value: self.value(node, "value")?,
            dimension: self.enumeration(node, "dynamicsDimension", DynamicsDimension::from_xml)?,
        })
    }

    fn constraints(&self, children: &Children<'_, '_>) -> Result<Option<DynamicConstraints>> {
        let Some((_, node)) = children.iter().find(|(t, _)| *t == Tag::DynamicConstraints) else {
            return Ok(None);
        };
        Ok(Some(DynamicConstraints {
            max_acceleration: self.value(*node, "maxAcceleration")?,
            max_deceleration: self.value(*node, "maxDeceleration")?,
            max_speed: self.value(*node, "maxSpeed")?,
        }))
    }

    fn speed_action(&mut self, node: Node<'_, '_>) -> DResult<SpeedAction> {
        let children = self.children(node, Tag::SpeedAction);
        let dynamics = self.dynamics(find(&children, node, Tag::SpeedActionDynamics)?)?;
        let target_node = find(&children, node, Tag::SpeedActionTarget)?;
        let (tag, t) = self.choice(target_node, Tag::SpeedActionTarget)?;
        let target = match tag {
            Tag::AbsoluteTargetSpeed => SpeedTarget::Absolute {
                value: self.value(t, "value")?,
            },
            Tag::RelativeTargetSpeed => SpeedTarget::Relative {
                entity: self.entity_ref(t, "entityRef")?,
                value: self.value(t, "value")?,
                value_type: self.enumeration(t, "speedTargetValueType", SpeedTargetValueType::from_xml)?,
                continuous: self.flag(t, "continuous")?,
            },
            other => return Err(unexpected(t, other)),
        };
        Ok(SpeedAction { dynamics, target })
    }

    fn longitudinal_distance(&mut self, node: Node<'_, '_>) -> DResult<LongitudinalDistanceAction> {
        let entity = self.entity_ref(node, "entityRef")?;
        let gap = match (
            self.opt_value(node, "distance")?,
            self.opt_value(node, "timeGap")?,
        ) {
            (Some(_), Some(_)) => {
                return Err(Error::schema_violation(
                    node_path(node),
                    "distance and timeGap are mutually exclusive",
                )
                .into())
            }
            (Some(d), None) => Some(LongitudinalGap::Distance(d)),
            (None, Some(t)) => Some(LongitudinalGap::TimeGap(t)),
            (None, None) => None,
        };
        let children = self.children(node, Tag::LongitudinalDistanceAction);
        Ok(LongitudinalDistanceAction {
            entity,
            gap,
            freespace: self.flag(node, "freespace")?,
            continuous: self.flag(node, "continuous")?,
            constraints: self.constraints(&children)?,
        })
    }

    fn lane_change(&mut self, node: Node<'_, '_>) -> DResult<LaneChangeAction> {
        let target_lane_offset = self.opt_value(node, "targetLaneOffset")?;
        let children = self.children(node, Tag::LaneChangeAction);
        let dynamics = self.dynamics(find(&children, node, Tag::LaneChangeActionDynamics)?)?;
        let target_node = find(&children, node, Tag::LaneChangeTarget)?;
        let (tag, t) = self.choice(target_node, Tag::LaneChangeTarget)?;
        let target = match tag {
            Tag::RelativeTargetLane => LaneChangeTarget::Relative {
                entity: self.entity_ref(t, "entityRef")?,
                lanes: self.value(t, "value")?,
            },
            Tag::AbsoluteTargetLane => LaneChangeTarget::Absolute {
                lane: self.value(t, "value")?,
            },
            other => return Err(unexpected(t, other)),
        };
        Ok(LaneChangeAction {
            dynamics,
            target,
            target_lane_offset,
        })
    }

    fn lane_offset(&mut self, node: Node<'_, '_>) -> DResult<LaneOffsetAction> {
        let continuous = self.flag(node, "continuous")?;
        let children = self.children(node, Tag::LaneOffsetAction);
        let dynamics = find(&children, node, Tag::LaneOffsetActionDynamics)?;
        let max_lateral_acc = self.opt_value(dynamics, "maxLateralAcc")?;
        let shape = self.enumeration(dynamics, "dynamicsShape", DynamicsShape::from_xml)?;
        let target_node = find(&children, node, Tag::LaneOffsetTarget)?;
        let (tag, t) = self.choice(target_node, Tag::LaneOffsetTarget)?;
        let target = match tag {
            Tag::RelativeTargetLaneOffset => LaneOffsetTarget::Relative {
                entity: self.entity_ref(t, "entityRef")?,
                offset: self.value(t, "value")?,
            },
            Tag::AbsoluteTargetLaneOffset => LaneOffsetTarget::Absolute {
                offset: self.value(t, "value")?,
            },
            other => return Err(unexpected(t, other)),
        };
        Ok(LaneOffsetAction {
            max_lateral_acc,
            shape,
            target,
            continuous,
        })
    }

    fn lateral_distance(&mut self, node: Node<'_, '_>) -> DResult<LateralDistanceAction> {
        let entity = self.entity_ref(node, "entityRef")?;
        let children = self.children(node, Tag::LateralDistanceAction);
        Ok(LateralDistanceAction {
            entity,
            distance: self.opt_value(node, "distance")?,
            freespace: self.flag(node, "freespace")?,
            continuous: self.flag(node, "continuous")?,
            constraints: self.constraints(&children)?,
        })
    }

    /// A route keeps only world-position waypoints and needs at least two of them.
    fn route(&mut self, node: Node<'_, '_>) -> DResult<Route> {
        self.attr_constant(node, Tag::RouteName);
        let closed = self.flag(node, "closed")?;
        let mut waypoints = Vec::new();
        for (tag, waypoint) in self.children(node, Tag::Route) {
            if tag != Tag::Waypoint {
                continue;
            }
            let strategy = self.enumeration(waypoint, "routeStrategy", RouteStrategy::from_xml)?;
            let children = self.children(waypoint, Tag::Waypoint);
            let position = match self.position(find(&children, waypoint, Tag::Position)?) {
                Ok(p) => p,
                Err(Failure::Dropped) => continue,
                Err(fatal) => return Err(fatal),
            };
            waypoints.push(Waypoint { position, strategy });
        }
        if waypoints.len() < 2 {
            self.diag(
                DiagnosticKind::ElementSkipped,
                node_path(node),
                format!("route has {} supported waypoints, needs 2", waypoints.len()),
            );
            return Err(Failure::Dropped);
        }
        Ok(Route { closed, waypoints })
    }
}
