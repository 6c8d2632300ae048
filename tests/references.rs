//! Referenzpruefung vor dem Export und Namensuebersetzung beim Import.

use xosc::model::{
    CollisionTarget, Condition, EntityCondition, Environment, LaneChangeAction, LaneChangeTarget,
    Maneuver, ManeuverKind, Rule, SpeedAction, StoryboardElementState, StoryboardElementType,
    TrafficSignalState, TransitionDynamics, Trigger, TriggeringEntitiesRule, ValueCondition,
    WorldPosition,
};
use xosc::naming::{ManeuverNames, ACT, STORY};
use xosc::{
    decode, encode, encode_with_options, EncodeOptions, EntityId, Error, ParameterTable,
    ReferenceResolver, ScenarioBuilder, ScenarioDocument,
};

include!("common/scenario.rs");

fn two_vehicles() -> (ScenarioBuilder, EntityId, EntityId) {
    let mut b = ScenarioBuilder::new("Town03");
    let ego = b.add_vehicle("vehicle.tesla.model3", true, at(0.0, 0.0));
    let npc = b.add_vehicle("vehicle.audi.tt", false, at(30.0, 0.0));
    (b, ego, npc)
}

fn state_of(element: &str) -> Trigger {
    Trigger::single(Condition::by_value(ValueCondition::StoryboardElementState {
        element_type: StoryboardElementType::Maneuver,
        element: element.into(),
        state: StoryboardElementState::EndTransition,
    }))
}

fn speed(target: EntityId, start: Trigger) -> Maneuver {
    Maneuver::new(Some(target), ManeuverKind::Speed(SpeedAction::absolute(15.0)), start)
}

// ============================================================================
// Schritt 1: Storyboard-Referenzen
// ============================================================================

#[test]
fn unresolved_storyboard_reference_fails_export() {
    let (b, ego, _) = two_vehicles();
    let mut doc = b.build(&ParameterTable::new()).unwrap();
    doc.maneuvers.push(speed(ego, state_of("Maneuver_X")));

    let err = encode(&doc, &ParameterTable::new()).unwrap_err();
    assert!(
        matches!(&err, Error::UnknownElement { name, .. } if name == "Maneuver_X"),
        "{err}"
    );
    assert!(err.to_string().contains("Maneuver_X"));
}

#[test]
fn builder_rejects_unresolved_reference() {
    let (mut b, ego, _) = two_vehicles();
    b.add_maneuver(speed(ego, state_of("Maneuver_X")));
    assert_eq!(
        b.build(&ParameterTable::new()).map(|_| ()),
        Err(Error::unknown_element("Maneuver_X", "maneuver #1 start trigger"))
    );
}

#[test]
fn synthesized_names_are_referenceable() {
    let (mut b, ego, npc) = two_vehicles();
    b.add_maneuver(speed(ego, after_seconds(1.0)));
    // Vorwaertsreferenz auf Manoever 3
    b.add_maneuver(speed(npc, state_of("Maneuver ID 3")));
    b.add_maneuver(speed(npc, state_of("Maneuver ID 1")));
    let doc = b.build(&ParameterTable::new()).unwrap();

    let resolver = ReferenceResolver::new(&doc);
    for (element_type, name) in [
        (StoryboardElementType::Story, "OSC Generated Story"),
        (StoryboardElementType::Act, "OSC Generated Act"),
        (StoryboardElementType::ManeuverGroup, "Maneuver group for Maneuver ID 2"),
        (StoryboardElementType::Maneuver, "Maneuver ID 3"),
        (StoryboardElementType::Event, "Event Maneuver ID 1"),
        (StoryboardElementType::Action, "Action for Maneuver ID 2"),
    ] {
        assert_eq!(
            resolver.validate_storyboard_element_reference(element_type, name),
            Ok(()),
            "{element_type} {name}"
        );
    }
    assert!(resolver
        .validate_storyboard_element_reference(StoryboardElementType::Maneuver, "Maneuver ID 4")
        .is_err());
    assert!(encode(&doc, &ParameterTable::new()).is_ok());
}

/// Der Name allein genuegt nicht: `Maneuver ID 1` ist ein Manoever, kein Event.
#[test]
fn element_type_is_part_of_the_reference() {
    let (mut b, ego, npc) = two_vehicles();
    b.add_maneuver(speed(ego, after_seconds(1.0)));
    b.add_maneuver(speed(
        npc,
        Trigger::single(Condition::by_value(ValueCondition::StoryboardElementState {
            element_type: StoryboardElementType::Event,
            element: "Maneuver ID 1".into(),
            state: StoryboardElementState::EndTransition,
        })),
    ));
    assert_eq!(
        b.build(&ParameterTable::new()).map(|_| ()),
        Err(Error::unknown_element("Maneuver ID 1", "maneuver #2 start trigger"))
    );

    let empty = ScenarioDocument::default();
    let resolver = ReferenceResolver::new(&empty);
    assert!(resolver
        .validate_storyboard_element_reference(StoryboardElementType::Maneuver, "OSC Generated Story")
        .is_err());
    assert!(resolver
        .validate_storyboard_element_reference(StoryboardElementType::Story, "OSC Generated Story")
        .is_ok());
}

/// Jeder Elementtyp mit seinem synthetisierten Namen uebersteht Export und Import.
#[test]
fn every_element_type_round_trips() {
    let names = ManeuverNames::new(1);
    for &element_type in StoryboardElementType::ALL {
        let element = match element_type {
            StoryboardElementType::Story => STORY.to_string(),
            StoryboardElementType::Act => ACT.to_string(),
            StoryboardElementType::ManeuverGroup => names.group.clone(),
            StoryboardElementType::Maneuver => names.maneuver.clone(),
            StoryboardElementType::Event => names.event.clone(),
            StoryboardElementType::Action => names.action.clone(),
        };
        let (mut b, ego, npc) = two_vehicles();
        b.add_maneuver(speed(ego, after_seconds(1.0)));
        b.add_maneuver(speed(
            npc,
            Trigger::single(Condition::by_value(ValueCondition::StoryboardElementState {
                element_type,
                element,
                state: StoryboardElementState::StartTransition,
            })),
        ));
        let doc = b.build(&ParameterTable::new()).unwrap();
        let xml = encode_with_options(&doc, &ParameterTable::new(), &fixed_options()).unwrap();
        let decoded = decode(&xml).unwrap();
        assert_eq!(decoded.document, doc, "{element_type}");
        assert!(decoded.diagnostics.is_empty(), "{element_type}: {:?}", decoded.diagnostics);
    }
}

/// Quellnamen werden auf die synthetisierten Namen des importierten Elements abgebildet.
#[test]
fn source_names_translated_on_import() {
    let xml = format!(
        r#"<OpenSCENARIO>
  <FileHeader revMajor="1" revMinor="0" date="2021-01-01T00:00:00" description="d" author="a"/>
  <RoadNetwork><LogicFile filepath="Town03"/></RoadNetwork>
  <Entities>
    <ScenarioObject name="hero"><Vehicle name="vehicle.tesla.model3" vehicleCategory="car"/></ScenarioObject>
  </Entities>
  <Storyboard>
    <Init><Actions/></Init>
    <Story name="S">
      <Act name="A">
        <ManeuverGroup maximumExecutionCount="1" name="G">
          <Actors selectTriggeringEntities="false"><EntityRef entityRef="hero"/></Actors>
          <Maneuver name="Overtake">
            <Event name="E1" priority="overwrite">
              <Action name="Go">{speed}</Action>
              <StartTrigger>{sim}</StartTrigger>
            </Event>
          </Maneuver>
          <Maneuver name="Brake">
            <Event name="E2" priority="overwrite">
              <Action name="Stop">{speed}</Action>
              <StartTrigger><ConditionGroup>
                <Condition name="c" delay="0" conditionEdge="rising"><ByValueCondition>
                  <StoryboardElementStateCondition storyboardElementType="maneuver" storyboardElementRef="Overtake" state="completeState"/>
                </ByValueCondition></Condition>
              </ConditionGroup></StartTrigger>
            </Event>
          </Maneuver>
        </ManeuverGroup>
      </Act>
    </Story>
  </Storyboard>
</OpenSCENARIO>"#,
        speed = r#"<PrivateAction><LongitudinalAction><SpeedAction>
            <SpeedActionDynamics dynamicsShape="step" value="0" dynamicsDimension="time"/>
            <SpeedActionTarget><AbsoluteTargetSpeed value="10"/></SpeedActionTarget>
        </SpeedAction></LongitudinalAction></PrivateAction>"#,
        sim = r#"<ConditionGroup><Condition name="t" delay="0" conditionEdge="rising"><ByValueCondition>
            <SimulationTimeCondition value="2" rule="greaterThan"/>
        </ByValueCondition></Condition></ConditionGroup>"#,
    );

    let decoded = decode(&xml).unwrap();
    assert_eq!(decoded.document.maneuvers.len(), 2);
    assert_eq!(decoded.document.maneuvers[1].start, state_of_complete("Maneuver ID 1"));
    assert!(decoded
        .metadata
        .storyboard_names
        .contains(&("Brake".to_string(), "Maneuver ID 2".to_string())));

    // Nach der Uebersetzung ist das Dokument exportierbar.
    assert!(encode(&decoded.document, &decoded.parameters).is_ok());

    let broken = xml.replace(r#"storyboardElementRef="Overtake""#, r#"storyboardElementRef="Nowhere""#);
    assert_eq!(
        decode(&broken).map(|_| ()),
        Err(Error::unknown_element("Nowhere", "maneuver #2"))
    );
}

fn state_of_complete(element: &str) -> Trigger {
    Trigger::single(Condition::by_value(ValueCondition::StoryboardElementState {
        element_type: StoryboardElementType::Maneuver,
        element: element.into(),
        state: StoryboardElementState::CompleteState,
    }))
}

// ============================================================================
// Schritt 2: Entity-Referenzen
// ============================================================================

/// Jede Stelle, die eine Entity referenziert, wird vor der Ausgabe geprueft.
#[test]
fn unknown_entity_fails_before_output() {
    let (b, ego, _) = two_vehicles();
    let base = b.build(&ParameterTable::new()).unwrap();
    let ghost = EntityId(42);

    let as_target = speed(ghost, after_seconds(1.0));
    let as_lane_reference = Maneuver::new(
        Some(ego),
        ManeuverKind::LaneChange(LaneChangeAction {
            dynamics: TransitionDynamics::step(),
            target: LaneChangeTarget::Relative {
                entity: ghost,
                lanes: 1.into(),
            },
            target_lane_offset: None,
        }),
        after_seconds(1.0),
    );
    let as_triggering = speed(
        ego,
        Trigger::single(Condition::by_entity(
            vec![ghost],
            TriggeringEntitiesRule::Any,
            EntityCondition::StandStill {
                duration: 2.0.into(),
            },
        )),
    );
    let as_collision = speed(ego, after_seconds(1.0)).with_stop(Trigger::single(
        Condition::by_entity(
            vec![ego],
            TriggeringEntitiesRule::Any,
            EntityCondition::Collision(CollisionTarget::Entity(ghost)),
        ),
    ));

    for (maneuver, context) in [
        (as_target, "maneuver #1"),
        (as_lane_reference, "maneuver #1"),
        (as_triggering, "maneuver #1 start trigger"),
        (as_collision, "maneuver #1 stop trigger"),
    ] {
        let mut doc: ScenarioDocument = base.clone();
        doc.maneuvers.push(maneuver);
        assert_eq!(
            encode_with_options(&doc, &ParameterTable::new(), &EncodeOptions::default()),
            Err(Error::unknown_entity(ghost, context))
        );
    }
}

#[test]
fn removed_entity_invalidates_maneuver() {
    let (mut b, _, npc) = two_vehicles();
    b.add_maneuver(speed(npc, after_seconds(3.0)));
    let mut doc = b.build(&ParameterTable::new()).unwrap();
    doc.entities.retain(|e| e.id != npc);
    assert!(matches!(
        encode(&doc, &ParameterTable::new()),
        Err(Error::UnknownEntity { .. })
    ));
}

// ============================================================================
// Schritt 3: Signale
// ============================================================================

#[test]
fn empty_signal_id_rejected() {
    let (mut b, _, _) = two_vehicles();
    b.add_maneuver(Maneuver::new(
        None,
        ManeuverKind::TrafficSignalState(TrafficSignalState {
            signal_id: " ".into(),
            state: "Red".into(),
        }),
        after_seconds(1.0),
    ));
    assert!(matches!(
        b.build(&ParameterTable::new()),
        Err(Error::UnknownSignal { .. })
    ));
}

#[test]
fn signal_condition_round_trips_without_prefix() {
    let (mut b, ego, _) = two_vehicles();
    b.add_maneuver(speed(
        ego,
        Trigger::single(Condition::by_value(ValueCondition::TrafficSignal {
            signal_id: "371".into(),
            state: "Green".into(),
        })),
    ));
    let doc = b.build(&ParameterTable::new()).unwrap();
    let xml = encode_with_options(&doc, &ParameterTable::new(), &fixed_options()).unwrap();
    assert!(xml.contains(r#"<TrafficSignalCondition name="id=371" state="Green"/>"#));
    assert_eq!(decode(&xml).unwrap().document, doc);
}

// ============================================================================
// Schritt 4: Form der Manoever
// ============================================================================

/// Globale Aktionen haben keine Actors; ein Ziel ginge beim Import verloren.
#[test]
fn global_maneuver_with_target_rejected() {
    let signal = ManeuverKind::TrafficSignalState(TrafficSignalState {
        signal_id: "12".into(),
        state: "Red".into(),
    });
    for kind in [ManeuverKind::Environment(Environment::default()), signal] {
        let (mut b, ego, _) = two_vehicles();
        b.add_maneuver(Maneuver::new(Some(ego), kind.clone(), after_seconds(1.0)));
        assert!(
            matches!(b.build(&ParameterTable::new()), Err(Error::SchemaViolation { .. })),
            "{kind:?}"
        );

        let (b, ego, _) = two_vehicles();
        let mut doc = b.build(&ParameterTable::new()).unwrap();
        doc.maneuvers.push(Maneuver::new(Some(ego), kind.clone(), after_seconds(1.0)));
        assert!(matches!(
            encode(&doc, &ParameterTable::new()),
            Err(Error::SchemaViolation { .. })
        ));

        doc.maneuvers[0].target = None;
        let xml = encode_with_options(&doc, &ParameterTable::new(), &fixed_options()).unwrap();
        assert_eq!(decode(&xml).unwrap().document, doc);
    }
}

#[test]
fn empty_stop_trigger_means_none() {
    let (_, ego, _) = two_vehicles();
    let maneuver = speed(ego, after_seconds(1.0)).with_stop(Trigger::default());
    assert_eq!(maneuver.stop, None);

    let (b, ego, _) = two_vehicles();
    let mut doc = b.build(&ParameterTable::new()).unwrap();
    let mut explicit = speed(ego, after_seconds(1.0));
    explicit.stop = Some(Trigger::default());
    doc.maneuvers.push(explicit);
    assert!(matches!(
        encode(&doc, &ParameterTable::new()),
        Err(Error::SchemaViolation { .. })
    ));

    doc.maneuvers[0].stop = None;
    let xml = encode_with_options(&doc, &ParameterTable::new(), &fixed_options()).unwrap();
    assert!(!xml.contains("<StopTrigger"));
    assert_eq!(decode(&xml).unwrap().document, doc);
}
