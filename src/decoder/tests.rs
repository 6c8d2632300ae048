use super::*;
use crate::model::{
    CollisionTarget, ConditionScope, EntityCondition, EntityKind, LongitudinalGap, ManeuverKind,
    MiscObjectCategory, Rule, SpeedTarget, ValueCondition,
};
use crate::parameter::Value;

// ============================================================================
// Fixtures
// ============================================================================

const HEADER: &str = r#"<FileHeader revMajor="1" revMinor="0" date="2021-03-04T10:00:00" description="Generated OpenSCENARIO File" author="xosc"/>"#;

const ENVIRONMENT: &str = r#"<GlobalAction><EnvironmentAction><Environment name="Environment1">
  <TimeOfDay animation="false" dateTime="2021-06-01T18:30:00"/>
  <Weather cloudState="overcast">
    <Sun intensity="0.5" azimuth="1" elevation="0.2"/>
    <Fog visualRange="800"/>
    <Precipitation precipitationType="rain" intensity="0.4"/>
  </Weather>
  <RoadCondition frictionScaleFactor="1.0"/>
</Environment></EnvironmentAction></GlobalAction>"#;

const SIM_TIME_5: &str = r#"<StartTrigger><ConditionGroup><Condition name="c" delay="0" conditionEdge="rising"><ByValueCondition><SimulationTimeCondition value="5" rule="greaterOrEqual"/></ByValueCondition></Condition></ConditionGroup></StartTrigger>"#;

const SPEED_10: &str = r#"<PrivateAction><LongitudinalAction><SpeedAction><SpeedActionDynamics dynamicsShape="step" value="0" dynamicsDimension="time"/><SpeedActionTarget><AbsoluteTargetSpeed value="10"/></SpeedActionTarget></SpeedAction></LongitudinalAction></PrivateAction>"#;

fn document(params: &str, entities: &str, init: &str, story: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<OpenSCENARIO>
  {HEADER}
  <ParameterDeclarations>{params}</ParameterDeclarations>
  <CatalogLocations/>
  <RoadNetwork><LogicFile filepath="Town01"/><SceneGraphFile filepath=""/></RoadNetwork>
  <Entities>{entities}</Entities>
  <Storyboard>
    <Init><Actions>{ENVIRONMENT}{init}</Actions></Init>
    {story}
    <StopTrigger/>
  </Storyboard>
</OpenSCENARIO>"#
    )
}

fn vehicle(name: &str, ego: bool) -> String {
    let properties = if ego {
        r#"<Properties><Property name="type" value="ego_vehicle"/></Properties>"#
    } else {
        ""
    };
    format!(
        r#"<ScenarioObject name="{name}"><Vehicle name="vehicle.audi.tt" vehicleCategory="car">{properties}</Vehicle></ScenarioObject>"#
    )
}

fn teleport(entity: &str, x: f64, y: f64) -> String {
    format!(
        r#"<Private entityRef="{entity}"><PrivateAction><TeleportAction><Position><WorldPosition x="{x}" y="{y}" z="0" h="0"/></Position></TeleportAction></PrivateAction></Private>"#
    )
}

/// Story mit einer ManeuverGroup und einem Event.
fn story(actors: &[&str], actions: &str, trigger: &str) -> String {
    let refs: String = actors
        .iter()
        .map(|a| format!(r#"<EntityRef entityRef="{a}"/>"#))
        .collect();
    format!(
        r#"<Story name="MyStory"><Act name="MyAct">
  <ManeuverGroup maximumExecutionCount="1" name="MyGroup">
    <Actors selectTriggeringEntities="false">{refs}</Actors>
    <Maneuver name="MyManeuver"><Event name="MyEvent" priority="overwrite">{actions}{trigger}</Event></Maneuver>
  </ManeuverGroup>
</Act></Story>"#
    )
}

fn action(name: &str, body: &str) -> String {
    format!(r#"<Action name="{name}">{body}</Action>"#)
}

fn kinds(decoded: &Decoded) -> Vec<DiagnosticKind> {
    decoded.diagnostics.iter().map(|d| d.kind).collect()
}

// ============================================================================
// Schritt 1: Grundstruktur
// ============================================================================

/// Vollstaendiges Minimaldokument ohne Diagnosen.
#[test]
fn decode_minimal_document() {
    let xml = document("", &vehicle("hero", true), &teleport("hero", 1.0, 2.0), "");
    let decoded = decode(&xml).unwrap();
    assert!(decoded.diagnostics.is_empty(), "{:?}", decoded.diagnostics);
    assert_eq!(decoded.metadata.logic_file, "Town01");
    assert_eq!(decoded.document.road_network.logic_file, "Town01");
    assert_eq!(decoded.document.entities.len(), 1);
    let hero = &decoded.document.entities[0];
    assert_eq!(hero.id, EntityId(1));
    assert!(hero.is_ego());
    assert_eq!(hero.position, WorldPosition::new(1.0, 2.0, 0.0, 0.0));
    assert_eq!(decoded.metadata.entity_names, vec![(EntityId(1), "hero".to_string())]);
}

/// Nicht wohlgeformtes XML ist ein XmlParseError.
#[test]
fn decode_malformed_xml() {
    let err = decode("<OpenSCENARIO><FileHeader></OpenSCENARIO>").unwrap_err();
    assert!(matches!(err, Error::XmlParseError(_)), "{err}");
}

#[test]
fn decode_wrong_root() {
    let err = decode("<Scenario/>").unwrap_err();
    assert!(matches!(err, Error::SchemaViolation { ref path, .. } if path == "/Scenario"), "{err}");
}

/// Fehlende Pflichtabschnitte sind fatal.
#[test]
fn decode_missing_storyboard() {
    let xml = format!(
        r#"<OpenSCENARIO>{HEADER}<RoadNetwork><LogicFile filepath="x"/></RoadNetwork><Entities/></OpenSCENARIO>"#
    );
    let err = decode(&xml).unwrap_err();
    match err {
        Error::SchemaViolation { path, reason } => {
            assert_eq!(path, "/OpenSCENARIO");
            assert!(reason.contains("Storyboard"), "{reason}");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn decode_missing_logic_file_is_defaulted() {
    let xml = document("", "", "", "").replace(r#"<LogicFile filepath="Town01"/>"#, "");
    let decoded = decode(&xml).unwrap();
    assert_eq!(decoded.metadata.logic_file, "");
    assert_eq!(kinds(&decoded), vec![DiagnosticKind::Defaulted]);
    assert_eq!(decoded.diagnostics[0].tag(), "RoadNetwork");
}

// ============================================================================
// Schritt 2: Parameter
// ============================================================================

#[test]
fn decode_parameter_declarations_in_order() {
    let params = r#"<ParameterDeclaration name="speed" parameterType="double" value="12.5"/>
                    <ParameterDeclaration name="ego_model" parameterType="string" value="vehicle.lincoln.mkz"/>"#;
    let xml = document(params, &vehicle("hero", false), "", "");
    let decoded = decode(&xml).unwrap();
    let names: Vec<&str> = decoded.parameters.all().map(|d| d.name.as_str()).collect();
    assert_eq!(names, ["speed", "ego_model"]);
}

/// Parameterreferenzen bleiben im Modell als Referenz erhalten.
#[test]
fn decode_parameter_reference_in_action() {
    let params = r#"<ParameterDeclaration name="target" parameterType="double" value="12.5"/>"#;
    let speed = SPEED_10.replace(r#"value="10""#, r#"value="$target""#);
    let xml = document(
        params,
        &vehicle("hero", true),
        &teleport("hero", 0.0, 0.0),
        &story(&["hero"], &action("A", &speed), SIM_TIME_5),
    );
    let decoded = decode(&xml).unwrap();
    let ManeuverKind::Speed(s) = &decoded.document.maneuvers[0].kind else {
        panic!("expected speed action");
    };
    assert_eq!(
        s.target,
        SpeedTarget::Absolute {
            value: Value::param("target")
        }
    );
}

/// Undeklarierte Parameter sind fatal, egal wo sie stehen.
#[test]
fn decode_unknown_parameter_is_fatal() {
    let xml = document("", &vehicle("hero", false), &teleport("hero", 0.0, 0.0), "")
        .replace(r#"x="0""#, r#"x="$nowhere""#);
    let err = decode(&xml).unwrap_err();
    assert_eq!(err, Error::UnknownParameter { name: "nowhere".into() });
}

#[test]
fn decode_duplicate_parameter_is_fatal() {
    let params = r#"<ParameterDeclaration name="speed_limit" parameterType="double" value="30.0"/>
                    <ParameterDeclaration name="speed_limit" parameterType="double" value="30.0"/>"#;
    let err = decode(&document(params, "", "", "")).unwrap_err();
    assert_eq!(err, Error::DuplicateParameter { name: "speed_limit".into() });
}

/// String-Attribute mit `$name` werden durch den deklarierten Wert ersetzt.
#[test]
fn decode_string_parameter_substituted() {
    let params = r#"<ParameterDeclaration name="model" parameterType="string" value="vehicle.nissan.micra"/>"#;
    let entities = r#"<ScenarioObject name="v"><Vehicle name="$model" vehicleCategory="car"/></ScenarioObject>"#;
    let decoded = decode(&document(params, entities, "", "")).unwrap();
    assert_eq!(decoded.document.entities[0].kind.model(), "vehicle.nissan.micra");
}

// ============================================================================
// Schritt 3: Entities und Init
// ============================================================================

#[test]
fn decode_entity_kinds() {
    let entities = format!(
        r#"{}
        <ScenarioObject name="walker"><Pedestrian model="walker.pedestrian.0001" mass="90.0" name="walker.pedestrian.0001" pedestrianCategory="pedestrian"/></ScenarioObject>
        <ScenarioObject name="bin"><MiscObject miscObjectCategory="obstacle" mass="12" name="static.prop.bin">
          <Properties><Property name="physics" value="on"/></Properties>
        </MiscObject></ScenarioObject>"#,
        vehicle("car", false)
    );
    let init = format!(
        "{}{}{}",
        teleport("car", 0.0, 0.0),
        teleport("walker", 1.0, 0.0),
        teleport("bin", 2.0, 0.0)
    );
    let decoded = decode(&document("", &entities, &init, "")).unwrap();
    assert!(decoded.diagnostics.is_empty(), "{:?}", decoded.diagnostics);

    let kinds: Vec<&EntityKind> = decoded.document.entities.iter().map(|e| &e.kind).collect();
    assert_eq!(
        kinds[0],
        &EntityKind::Vehicle {
            model: "vehicle.audi.tt".into(),
            ego: false
        }
    );
    assert_eq!(
        kinds[1],
        &EntityKind::Pedestrian {
            model: "walker.pedestrian.0001".into()
        }
    );
    assert_eq!(
        kinds[2],
        &EntityKind::MiscObject {
            model: "static.prop.bin".into(),
            category: MiscObjectCategory::Obstacle,
            mass: Value::Literal(12.0),
            physics: true,
        }
    );
    let ids: Vec<u32> = decoded.document.entities.iter().map(|e| e.id.0).collect();
    assert_eq!(ids, [1, 2, 3]);
}

#[test]
fn decode_duplicate_entity_name() {
    let entities = format!("{}{}", vehicle("twin", false), vehicle("twin", true));
    let err = decode(&document("", &entities, "", "")).unwrap_err();
    assert!(matches!(err, Error::SchemaViolation { ref reason, .. } if reason.contains("twin")), "{err}");
}

/// Entity ohne Init-Teleport bekommt den Ursprung und eine Diagnose.
#[test]
fn decode_missing_position_is_defaulted() {
    let decoded = decode(&document("", &vehicle("hero", false), "", "")).unwrap();
    assert_eq!(decoded.document.entities[0].position, WorldPosition::default());
    assert_eq!(kinds(&decoded), vec![DiagnosticKind::Defaulted]);
    assert!(decoded.diagnostics[0].message.contains("hero"));
}

/// Nicht-Welt-Positionen werden uebersprungen, die Position wird defaulted.
#[test]
fn decode_lane_position_skipped() {
    let init = r#"<Private entityRef="hero"><PrivateAction><TeleportAction><Position>
        <LanePosition roadId="1" laneId="-1" offset="0" s="10"/>
    </Position></TeleportAction></PrivateAction></Private>"#;
    let decoded = decode(&document("", &vehicle("hero", false), init, "")).unwrap();
    assert_eq!(
        kinds(&decoded),
        vec![DiagnosticKind::ElementSkipped, DiagnosticKind::Defaulted]
    );
    assert_eq!(decoded.diagnostics[0].tag(), "LanePosition");
}

#[test]
fn decode_init_controller_and_speed() {
    let init = r#"<Private entityRef="hero">
      <PrivateAction><TeleportAction><Position><WorldPosition x="5" y="6" z="0" h="1.5"/></Position></TeleportAction></PrivateAction>
      <PrivateAction><ControllerAction>
        <AssignControllerAction><Controller name="HeroAgent_1"><Properties>
          <Property name="module" value="simple_vehicle_control"/>
          <Property name="attach_camera" value="true"/>
        </Properties></Controller></AssignControllerAction>
        <OverrideControllerValueAction>
          <Throttle value="0" active="false"/><Brake value="0" active="false"/><Clutch value="0" active="false"/>
          <ParkingBrake value="0" active="false"/><SteeringWheel value="0" active="false"/><Gear number="0" active="false"/>
        </OverrideControllerValueAction>
      </ControllerAction></PrivateAction>
      <PrivateAction><LongitudinalAction><SpeedAction>
        <SpeedActionDynamics dynamicsShape="step" value="0.1" dynamicsDimension="distance"/>
        <SpeedActionTarget><AbsoluteTargetSpeed value="8.3"/></SpeedActionTarget>
      </SpeedAction></LongitudinalAction></PrivateAction>
    </Private>"#;
    let decoded = decode(&document("", &vehicle("hero", true), init, "")).unwrap();
    assert!(decoded.diagnostics.is_empty(), "{:?}", decoded.diagnostics);
    let hero = &decoded.document.entities[0];
    assert_eq!(hero.initial_speed, Some(Value::Literal(8.3)));
    let controller = hero.controller.as_ref().unwrap();
    assert_eq!(controller.property("module"), Some("simple_vehicle_control"));
    assert_eq!(controller.property("attach_camera"), Some("true"));
    assert_eq!(hero.position.h, 1.5);
}

#[test]
fn decode_environment() {
    let decoded = decode(&document("", "", "", "")).unwrap();
    let env = &decoded.document.environment;
    assert_eq!(crate::parameter::format_datetime(&env.time_of_day), "2021-06-01T18:30:00");
    assert_eq!(env.cloud_state, crate::model::CloudState::Overcast);
    assert_eq!(env.sun.intensity, 0.5);
    assert_eq!(env.fog_visual_range, 800.0);
    assert_eq!(env.precipitation.kind, crate::model::PrecipitationType::Rain);
}

/// Ohne EnvironmentAction: Defaults plus Diagnose.
#[test]
fn decode_missing_environment_is_defaulted() {
    let xml = document("", "", "", "").replace(ENVIRONMENT, "");
    let decoded = decode(&xml).unwrap();
    assert_eq!(decoded.document.environment, crate::model::Environment::default());
    assert_eq!(kinds(&decoded), vec![DiagnosticKind::Defaulted]);
}

#[test]
fn decode_unknown_entity_in_init_is_fatal() {
    let err = decode(&document("", "", &teleport("ghost", 0.0, 0.0), "")).unwrap_err();
    assert!(matches!(err, Error::UnknownEntity { ref id, .. } if id == "ghost"), "{err}");
}

// ============================================================================
// Schritt 4: Policy
// ============================================================================

/// Unsupported-Tags werden mit Diagnose uebersprungen, nie fatal.
#[test]
fn decode_unsupported_tags_are_skipped() {
    let init = format!(
        r#"{}<Private entityRef="hero"><PrivateAction><VisibilityAction graphics="true" traffic="true" sensors="true"/></PrivateAction></Private>"#,
        teleport("hero", 0.0, 0.0)
    );
    let xml = document("", &vehicle("hero", false), &init, "")
        .replace("<CatalogLocations/>", "<CatalogLocations/><Mystery/>");
    let decoded = decode(&xml).unwrap();
    let tags: Vec<&str> = decoded.diagnostics.iter().map(|d| d.tag()).collect();
    assert_eq!(tags, ["Mystery", "VisibilityAction"]);
    assert!(decoded
        .diagnostics
        .iter()
        .all(|d| d.kind == DiagnosticKind::ElementSkipped));
    assert_eq!(
        decoded.diagnostics[1].path,
        "/OpenSCENARIO/Storyboard/Init/Actions/Private[2]/PrivateAction/VisibilityAction"
    );
}

/// Lokale Parameter (Story/Maneuver) gibt es nicht; nur die globale Tabelle wird gefuellt.
#[test]
fn decode_local_parameters_skipped() {
    let local = r#"<Story name="MyStory"><ParameterDeclarations><ParameterDeclaration name="local" parameterType="double" value="1"/></ParameterDeclarations>"#;
    let xml = document(
        r#"<ParameterDeclaration name="global" parameterType="double" value="2"/>"#,
        &vehicle("hero", false),
        &teleport("hero", 0.0, 0.0),
        &story(&["hero"], &action("A", SPEED_10), SIM_TIME_5).replace(r#"<Story name="MyStory">"#, local),
    );
    let decoded = decode(&xml).unwrap();
    assert_eq!(kinds(&decoded), [DiagnosticKind::ElementSkipped]);
    assert_eq!(decoded.diagnostics[0].tag(), "ParameterDeclarations");
    assert_eq!(decoded.document.maneuvers.len(), 1);
    assert!(decoded.parameters.contains("global"));
    assert!(!decoded.parameters.contains("local"));
}

/// Catalog-Entities werden verworfen; Referenzen darauf ebenfalls.
#[test]
fn decode_catalog_entity_dropped_with_references() {
    let entities = format!(
        r#"{}<ScenarioObject name="cat"><CatalogReference catalogName="VehicleCatalog" entryName="car1"/></ScenarioObject>"#,
        vehicle("hero", false)
    );
    let init = format!("{}{}", teleport("hero", 0.0, 0.0), teleport("cat", 1.0, 1.0));
    let decoded = decode(&document("", &entities, &init, &story(&["cat"], &action("A", SPEED_10), SIM_TIME_5))).unwrap();
    assert_eq!(decoded.document.entities.len(), 1);
    assert!(decoded.document.maneuvers.is_empty());
    assert!(kinds(&decoded).contains(&DiagnosticKind::ReferenceNotImported));
    assert_eq!(decoded.diagnostics[0].tag(), "CatalogReference");
}

/// Abweichende Konstanten: Inhalt verworfen, Diagnose nur im strikten Modus.
#[test]
fn decode_export_constant_content_discarded() {
    let entities = r#"<ScenarioObject name="v"><Vehicle name="m" vehicleCategory="truck">
        <BoundingBox><Center x="1" y="0" z="1"/><Dimensions width="3" length="9" height="3"/></BoundingBox>
    </Vehicle></ScenarioObject>"#;
    let xml = document("", entities, &teleport("v", 0.0, 0.0), "");

    let strict = decode(&xml).unwrap();
    assert_eq!(
        kinds(&strict),
        vec![DiagnosticKind::ContentDiscarded, DiagnosticKind::ContentDiscarded]
    );
    assert_eq!(strict.diagnostics[0].tag(), "@vehicleCategory");
    assert_eq!(strict.diagnostics[1].tag(), "BoundingBox");

    let lenient = decode_with_options(&xml, &DecodeOptions::default().with_lenient_templates()).unwrap();
    assert!(lenient.diagnostics.is_empty());
    assert_eq!(strict.document, lenient.document);
}

/// Numerisch gleiche Konstanten gelten als kanonisch.
#[test]
fn decode_constant_numeric_equality() {
    let entities = r#"<ScenarioObject name="v"><Vehicle name="m" vehicleCategory="car">
        <Performance maxSpeed="69.444" maxAcceleration="200.0" maxDeceleration="10"/>
    </Vehicle></ScenarioObject>"#;
    let decoded = decode(&document("", entities, &teleport("v", 0.0, 0.0), "")).unwrap();
    assert!(decoded.diagnostics.is_empty(), "{:?}", decoded.diagnostics);
}

// ============================================================================
// Schritt 5: Storyboard
// ============================================================================

#[test]
fn decode_speed_maneuver() {
    let xml = document(
        "",
        &vehicle("hero", true),
        &teleport("hero", 0.0, 0.0),
        &story(&["hero"], &action("A", SPEED_10), SIM_TIME_5),
    );
    let decoded = decode(&xml).unwrap();
    assert!(decoded.diagnostics.is_empty(), "{:?}", decoded.diagnostics);
    let maneuvers = &decoded.document.maneuvers;
    assert_eq!(maneuvers.len(), 1);
    assert_eq!(maneuvers[0].target, Some(EntityId(1)));
    assert_eq!(maneuvers[0].stop, None);
    let condition = maneuvers[0].start.conditions().next().unwrap();
    assert_eq!(
        condition.scope,
        ConditionScope::ByValue(ValueCondition::SimulationTime {
            value: Value::Literal(5.0),
            rule: Rule::GreaterOrEqual,
        })
    );
}

/// Eine Action mit zwei Actors ergibt zwei Manoever.
#[test]
fn decode_flattens_actors() {
    let entities = format!("{}{}", vehicle("a", false), vehicle("b", false));
    let init = format!("{}{}", teleport("a", 0.0, 0.0), teleport("b", 0.0, 3.0));
    let decoded = decode(&document(
        "",
        &entities,
        &init,
        &story(&["a", "b"], &action("A", SPEED_10), SIM_TIME_5),
    ))
    .unwrap();
    let targets: Vec<Option<EntityId>> = decoded.document.maneuvers.iter().map(|m| m.target).collect();
    assert_eq!(targets, [Some(EntityId(1)), Some(EntityId(2))]);
}

#[test]
fn decode_global_action_without_target() {
    let signal = r#"<GlobalAction><InfrastructureAction><TrafficSignalAction>
        <TrafficSignalStateAction name="id=371" state="0;0;1"/>
    </TrafficSignalAction></InfrastructureAction></GlobalAction>"#;
    let decoded = decode(&document("", "", "", &story(&[], &action("S", signal), SIM_TIME_5))).unwrap();
    let m = &decoded.document.maneuvers[0];
    assert_eq!(m.target, None);
    let ManeuverKind::TrafficSignalState(s) = &m.kind else {
        panic!("expected traffic signal action");
    };
    assert_eq!(s.signal_id, "371");
    assert_eq!(s.state, "0;0;1");
}

/// Private Action ohne importierten Actor wird uebersprungen.
#[test]
fn decode_private_action_without_actor() {
    let decoded = decode(&document("", "", "", &story(&[], &action("A", SPEED_10), SIM_TIME_5))).unwrap();
    assert!(decoded.document.maneuvers.is_empty());
    assert_eq!(kinds(&decoded), vec![DiagnosticKind::ElementSkipped]);
    assert_eq!(decoded.diagnostics[0].tag(), "Action");
}

#[test]
fn decode_controller_override_only() {
    let body = r#"<PrivateAction><ControllerAction><OverrideControllerValueAction>
        <Throttle value="0" active="false"/><Brake value="0" active="false"/><Clutch value="0" active="false"/>
        <ParkingBrake value="0" active="false"/><SteeringWheel value="0" active="false"/><Gear number="0" active="false"/>
    </OverrideControllerValueAction></ControllerAction></PrivateAction>"#;
    let xml = document(
        "",
        &vehicle("hero", false),
        &teleport("hero", 0.0, 0.0),
        &story(&["hero"], &action("A", body), SIM_TIME_5),
    );
    let decoded = decode(&xml).unwrap();
    assert_eq!(decoded.document.maneuvers[0].kind, ManeuverKind::ControllerOverride);
}

#[test]
fn decode_longitudinal_distance_exclusive_gap() {
    let body = |attrs: &str| {
        format!(
            r#"<PrivateAction><LongitudinalAction><LongitudinalDistanceAction entityRef="lead" {attrs} freespace="true" continuous="false"/></LongitudinalAction></PrivateAction>"#
        )
    };
    let entities = format!("{}{}", vehicle("hero", false), vehicle("lead", false));
    let init = format!("{}{}", teleport("hero", 0.0, 0.0), teleport("lead", 20.0, 0.0));

    let ok = document("", &entities, &init, &story(&["hero"], &action("A", &body(r#"timeGap="1.5""#)), SIM_TIME_5));
    let decoded = decode(&ok).unwrap();
    let ManeuverKind::LongitudinalDistance(a) = &decoded.document.maneuvers[0].kind else {
        panic!("expected longitudinal distance action");
    };
    assert_eq!(a.entity, EntityId(2));
    assert_eq!(a.gap, Some(LongitudinalGap::TimeGap(Value::Literal(1.5))));

    let both = document(
        "",
        &entities,
        &init,
        &story(&["hero"], &action("A", &body(r#"distance="10" timeGap="1.5""#)), SIM_TIME_5),
    );
    assert!(matches!(decode(&both).unwrap_err(), Error::SchemaViolation { .. }));
}

/// Route mit nur einer Welt-Position wird verworfen.
#[test]
fn decode_route_needs_two_waypoints() {
    let body = r#"<PrivateAction><RoutingAction><AssignRouteAction><Route name="r" closed="false">
        <Waypoint routeStrategy="shortest"><Position><WorldPosition x="0" y="0" z="0" h="0"/></Position></Waypoint>
        <Waypoint routeStrategy="shortest"><Position><LanePosition roadId="1" laneId="1" offset="0" s="3"/></Position></Waypoint>
    </Route></AssignRouteAction></RoutingAction></PrivateAction>"#;
    let xml = document(
        "",
        &vehicle("hero", false),
        &teleport("hero", 0.0, 0.0),
        &story(&["hero"], &action("A", body), SIM_TIME_5),
    );
    let decoded = decode(&xml).unwrap();
    assert!(decoded.document.maneuvers.is_empty());
    let tags: Vec<&str> = decoded.diagnostics.iter().map(|d| d.tag()).collect();
    assert_eq!(tags, ["@name", "LanePosition", "Route", "Action"]);
}

/// Nicht unterstuetzte Conditions fallen weg; ein leerer Start-Trigger verwirft das Event.
#[test]
fn decode_unsupported_condition_drops_event() {
    let trigger = r#"<StartTrigger><ConditionGroup><Condition name="ttc" delay="0" conditionEdge="rising">
        <ByEntityCondition><TriggeringEntities triggeringEntitiesRule="any"><EntityRef entityRef="hero"/></TriggeringEntities>
        <EntityCondition><TimeToCollisionCondition value="2" freespace="false" alongRoute="false" rule="lessThan"/></EntityCondition>
        </ByEntityCondition></Condition></ConditionGroup></StartTrigger>"#;
    let xml = document(
        "",
        &vehicle("hero", false),
        &teleport("hero", 0.0, 0.0),
        &story(&["hero"], &action("A", SPEED_10), trigger),
    );
    let decoded = decode(&xml).unwrap();
    assert!(decoded.document.maneuvers.is_empty());
    let tags: Vec<&str> = decoded.diagnostics.iter().map(|d| d.tag()).collect();
    assert_eq!(tags, ["TimeToCollisionCondition", "Event"]);
}

#[test]
fn decode_entity_conditions() {
    let trigger = r#"<StartTrigger>
      <ConditionGroup>
        <Condition name="a" delay="0.5" conditionEdge="none"><ByEntityCondition>
          <TriggeringEntities triggeringEntitiesRule="all"><EntityRef entityRef="hero"/></TriggeringEntities>
          <EntityCondition><CollisionCondition><ByType type="pedestrian"/></CollisionCondition></EntityCondition>
        </ByEntityCondition></Condition>
      </ConditionGroup>
      <ConditionGroup>
        <Condition name="b" delay="0" conditionEdge="rising"><ByEntityCondition>
          <TriggeringEntities triggeringEntitiesRule="any"><EntityRef entityRef="hero"/></TriggeringEntities>
          <EntityCondition><ReachPositionCondition tolerance="2"><Position><WorldPosition x="100" y="5" z="0" h="0"/></Position></ReachPositionCondition></EntityCondition>
        </ByEntityCondition></Condition>
      </ConditionGroup>
    </StartTrigger>"#;
    let xml = document(
        "",
        &vehicle("hero", false),
        &teleport("hero", 0.0, 0.0),
        &story(&["hero"], &action("A", SPEED_10), trigger),
    );
    let decoded = decode(&xml).unwrap();
    let start = &decoded.document.maneuvers[0].start;
    assert_eq!(start.groups.len(), 2);
    let conditions: Vec<_> = start.conditions().collect();
    assert_eq!(conditions[0].delay, Value::Literal(0.5));
    assert!(matches!(
        conditions[0].scope,
        ConditionScope::ByEntity {
            condition: EntityCondition::Collision(CollisionTarget::ByType(crate::model::ObjectType::Pedestrian)),
            ..
        }
    ));
    match &conditions[1].scope {
        ConditionScope::ByEntity {
            condition: EntityCondition::ReachPosition { position, tolerance },
            triggering,
        } => {
            assert_eq!(position.x, 100.0);
            assert_eq!(*tolerance, Value::Literal(2.0));
            assert_eq!(triggering.entities, [EntityId(1)]);
        }
        other => panic!("unexpected {other:?}"),
    }
}

// ============================================================================
// Schritt 6: Storyboard-Referenzen
// ============================================================================

fn state_trigger(element_type: &str, element: &str) -> String {
    format!(
        r#"<StartTrigger><ConditionGroup><Condition name="s" delay="0" conditionEdge="rising"><ByValueCondition>
        <StoryboardElementStateCondition storyboardElementType="{element_type}" storyboardElementRef="{element}" state="endTransition"/>
        </ByValueCondition></Condition></ConditionGroup></StartTrigger>"#
    )
}

/// Referenzen auf Quellnamen werden auf die synthetisierten Namen umgeschrieben.
#[test]
fn decode_storyboard_reference_translated() {
    let xml = document(
        "",
        &vehicle("hero", false),
        &teleport("hero", 0.0, 0.0),
        &story(&["hero"], &action("A", SPEED_10), &state_trigger("maneuver", "MyManeuver")),
    );
    let decoded = decode(&xml).unwrap();
    let condition = decoded.document.maneuvers[0].start.conditions().next().unwrap();
    let ConditionScope::ByValue(ValueCondition::StoryboardElementState { element, .. }) = &condition.scope else {
        panic!("expected storyboard element state condition");
    };
    assert_eq!(element, "Maneuver ID 1");
    assert!(decoded
        .metadata
        .storyboard_names
        .contains(&("MyManeuver".to_string(), "Maneuver ID 1".to_string())));
    assert!(decoded
        .metadata
        .storyboard_names
        .contains(&("MyStory".to_string(), crate::naming::STORY.to_string())));
}

#[test]
fn decode_unknown_storyboard_reference_is_fatal() {
    let xml = document(
        "",
        &vehicle("hero", false),
        &teleport("hero", 0.0, 0.0),
        &story(&["hero"], &action("A", SPEED_10), &state_trigger("maneuver", "Maneuver_X")),
    );
    assert_eq!(
        decode(&xml).unwrap_err(),
        Error::unknown_element("Maneuver_X", "maneuver #1")
    );
}

fn unsupported_story(trigger: &str) -> String {
    format!(
        r#"<Story name="Other"><Act name="OtherAct"><ManeuverGroup maximumExecutionCount="1" name="G2">
          <Actors selectTriggeringEntities="false"><EntityRef entityRef="hero"/></Actors>
          <Maneuver name="M2"><Event name="E2" priority="overwrite">
            <Action name="Unsupported"><UserDefinedAction/></Action>{trigger}
          </Event></Maneuver>
        </ManeuverGroup></Act></Story>"#
    )
}

#[test]
fn decode_event_without_start_trigger() {
    let xml = document(
        "",
        &vehicle("hero", false),
        &teleport("hero", 0.0, 0.0),
        &unsupported_story(""),
    );
    let err = decode(&xml).unwrap_err();
    assert!(matches!(err, Error::SchemaViolation { ref reason, .. } if reason.contains("StartTrigger")), "{err}");
}

/// Referenz auf ein nicht importiertes Element behaelt den Quellnamen.
#[test]
fn decode_reference_to_dropped_element() {
    let stories = format!(
        "{}{}",
        story(&["hero"], &action("A", SPEED_10), &state_trigger("action", "Unsupported")),
        unsupported_story(SIM_TIME_5)
    );
    let xml = document("", &vehicle("hero", false), &teleport("hero", 0.0, 0.0), &stories);
    let decoded = decode(&xml).unwrap();
    assert_eq!(decoded.document.maneuvers.len(), 1);
    let condition = decoded.document.maneuvers[0].start.conditions().next().unwrap();
    let ConditionScope::ByValue(ValueCondition::StoryboardElementState { element, .. }) = &condition.scope else {
        panic!("expected storyboard element state condition");
    };
    assert_eq!(element, "Unsupported");
    assert_eq!(
        kinds(&decoded),
        vec![
            DiagnosticKind::ElementSkipped,
            DiagnosticKind::ElementSkipped,
            DiagnosticKind::ReferenceNotImported
        ]
    );
}

// ============================================================================
// Schritt 7: Attribute und Pfade
// ============================================================================

#[test]
fn decode_malformed_number_reports_path() {
    let xml = document("", &vehicle("hero", false), &teleport("hero", 0.0, 0.0), "")
        .replace(r#"y="0""#, r#"y="north""#);
    match decode(&xml).unwrap_err() {
        Error::SchemaViolation { path, .. } => assert_eq!(
            path,
            "/OpenSCENARIO/Storyboard/Init/Actions/Private/PrivateAction/TeleportAction/Position/WorldPosition/@y"
        ),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn decode_unknown_enum_value() {
    let xml = document("", "", "", "").replace(r#"cloudState="overcast""#, r#"cloudState="stormy""#);
    assert!(matches!(
        decode(&xml).unwrap_err(),
        Error::SchemaViolation { ref reason, .. } if reason.contains("stormy")
    ));
}

#[test]
fn decode_missing_attribute() {
    let entities = r#"<ScenarioObject name="p"><Pedestrian mass="90.0" name="x" pedestrianCategory="pedestrian"/></ScenarioObject>"#;
    let err = decode(&document("", entities, "", "")).unwrap_err();
    assert!(matches!(err, Error::SchemaViolation { ref reason, .. } if reason.contains("'model'")), "{err}");
}

/// Index nur bei gleichnamigen Geschwistern.
#[test]
fn node_path_indexes_repeated_siblings() {
    let xml = "<A><B/><C><D/></C><B><E/></B></A>";
    let doc = Document::parse(xml).unwrap();
    let root = doc.root_element();
    let c = root.children().find(|n| n.has_tag_name("C")).unwrap();
    let d = c.first_element_child().unwrap();
    let e = root.last_element_child().unwrap().first_element_child().unwrap();
    let first_b = root.first_element_child().unwrap();
    assert_eq!(node_path(d), "/A/C/D");
    assert_eq!(node_path(e), "/A/B[2]/E");
    assert_eq!(node_path(first_b), "/A/B[1]");
    assert_eq!(attr_path(d, "x"), "/A/C/D/@x");
}

#[test]
fn decode_coordinate_transform() {
    fn flip(p: WorldPosition) -> WorldPosition {
        WorldPosition { y: -p.y, ..p }
    }
    let xml = document("", &vehicle("hero", false), &teleport("hero", 3.0, 4.0), "");
    let decoded = decode_with_options(&xml, &DecodeOptions::default().with_coordinate_transform(flip)).unwrap();
    assert_eq!(decoded.document.entities[0].position, WorldPosition::new(3.0, -4.0, 0.0, 0.0));
}

#[test]
fn decoded_into_parts() {
    let decoded = decode(&document("", "", "", "")).unwrap();
    let (doc, params, metadata, diagnostics) = decoded.into_parts();
    assert!(doc.entities.is_empty());
    assert!(params.is_empty());
    assert_eq!(metadata.logic_file, "Town01");
    assert!(diagnostics.is_empty());
}
