//! Tag support policy.
//!
//! Every element (and the few attributes with their own rule) the codec knows is a [`Tag`].
//! Tags are qualified by context: the `BoundingBox` of a vehicle and the one of a pedestrian
//! are different tags with different constant templates. [`Tag::policy`] is the only place
//! that decides how a tag is treated; both codec directions go through it:
//!
//! | Policy           | Decoder                                   | Encoder                  |
//! |------------------|-------------------------------------------|--------------------------|
//! | `Full`           | parse into the model                      | write model content      |
//! | `ExportConstant` | ignore content (diagnostic if it differs) | write the fixed template |
//! | `ImportOnly`     | read, keep out of band                    | never write              |
//! | `Unsupported`    | skip subtree with a diagnostic            | never write              |
//!
//! Elements that are not listed at all are treated as `Unsupported`.

use roxmltree::Node;

/// Value slot of a template attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Fixed(&'static str),
    /// Export timestamp (`FileHeader@date`); any value is accepted on import.
    Timestamp,
}

/// Fixed element subtree emitted for an `ExportConstant` element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    pub name: &'static str,
    pub attrs: &'static [(&'static str, Slot)],
    pub children: &'static [Template],
}

impl Template {
    /// Structural comparison with a source element.
    ///
    /// Numeric attribute values compare by value (`"200"` equals `"200.0"`).
    pub fn matches(&self, node: Node<'_, '_>) -> bool {
        if node.tag_name().name() != self.name || node.attributes().count() != self.attrs.len() {
            return false;
        }
        let attrs_ok = self.attrs.iter().all(|(name, slot)| match (node.attribute(*name), slot) {
            (Some(_), Slot::Timestamp) => true,
            (Some(actual), Slot::Fixed(expected)) => same_literal(actual, expected),
            (None, _) => false,
        });
        if !attrs_ok {
            return false;
        }
        let mut children = node.children().filter(|n| n.is_element());
        for tpl in self.children {
            match children.next() {
                Some(child) if tpl.matches(child) => {}
                _ => return false,
            }
        }
        children.next().is_none()
    }
}

/// Whether two attribute literals denote the same value.
pub(crate) fn same_literal(actual: &str, expected: &str) -> bool {
    if actual == expected {
        return true;
    }
    match (actual.trim().parse::<f64>(), expected.parse::<f64>()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// What the encoder writes for an `ExportConstant` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constant {
    Element(&'static Template),
    /// Fixed attribute value.
    Attribute(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Support {
    Full,
    ExportConstant(Constant),
    ImportOnly,
    Unsupported,
}

use Support::{ExportConstant, Full, ImportOnly, Unsupported};

const fn element(t: &'static Template) -> Support {
    ExportConstant(Constant::Element(t))
}

const fn attribute(v: &'static str) -> Support {
    ExportConstant(Constant::Attribute(v))
}

// ============================================================================
// Templates
// ============================================================================

pub const FILE_HEADER: Template = Template {
    name: "FileHeader",
    attrs: &[
        ("revMajor", Slot::Fixed("1")),
        ("revMinor", Slot::Fixed("0")),
        ("date", Slot::Timestamp),
        ("description", Slot::Fixed("Generated OpenSCENARIO File")),
        ("author", Slot::Fixed("xosc")),
    ],
    children: &[],
};

const fn empty(name: &'static str) -> Template {
    Template {
        name,
        attrs: &[],
        children: &[],
    }
}

pub const CATALOG_LOCATIONS: Template = empty("CatalogLocations");

pub const SCENE_GRAPH_FILE: Template = Template {
    name: "SceneGraphFile",
    attrs: &[("filepath", Slot::Fixed(""))],
    children: &[],
};

pub const EMPTY_PARAMETER_DECLARATIONS: Template = empty("ParameterDeclarations");

pub const PERFORMANCE: Template = Template {
    name: "Performance",
    attrs: &[
        ("maxSpeed", Slot::Fixed("69.444")),
        ("maxAcceleration", Slot::Fixed("200")),
        ("maxDeceleration", Slot::Fixed("10.0")),
    ],
    children: &[],
};

pub const VEHICLE_BOUNDING_BOX: Template = Template {
    name: "BoundingBox",
    attrs: &[],
    children: &[
        Template {
            name: "Center",
            attrs: &[
                ("x", Slot::Fixed("1.5")),
                ("y", Slot::Fixed("0.0")),
                ("z", Slot::Fixed("0.9")),
            ],
            children: &[],
        },
        Template {
            name: "Dimensions",
            attrs: &[
                ("width", Slot::Fixed("2.1")),
                ("length", Slot::Fixed("4.5")),
                ("height", Slot::Fixed("1.8")),
            ],
            children: &[],
        },
    ],
};

pub const PEDESTRIAN_BOUNDING_BOX: Template = Template {
    name: "BoundingBox",
    attrs: &[],
    children: &[
        Template {
            name: "Center",
            attrs: &[
                ("x", Slot::Fixed("1.5")),
                ("y", Slot::Fixed("0.0")),
                ("z", Slot::Fixed("0.9")),
            ],
            children: &[],
        },
        Template {
            name: "Dimensions",
            attrs: &[
                ("width", Slot::Fixed("1.0")),
                ("length", Slot::Fixed("1.0")),
                ("height", Slot::Fixed("1.8")),
            ],
            children: &[],
        },
    ],
};

pub const MISC_OBJECT_BOUNDING_BOX: Template = Template {
    name: "BoundingBox",
    attrs: &[],
    children: &[
        Template {
            name: "Center",
            attrs: &[
                ("x", Slot::Fixed("0.4")),
                ("y", Slot::Fixed("0.4")),
                ("z", Slot::Fixed("0.2")),
            ],
            children: &[],
        },
        Template {
            name: "Dimensions",
            attrs: &[
                ("width", Slot::Fixed("0.8")),
                ("length", Slot::Fixed("0.8")),
                ("height", Slot::Fixed("1")),
            ],
            children: &[],
        },
    ],
};

pub const AXLES: Template = Template {
    name: "Axles",
    attrs: &[],
    children: &[
        Template {
            name: "FrontAxle",
            attrs: &[
                ("maxSteering", Slot::Fixed("0.5")),
                ("wheelDiameter", Slot::Fixed("0.6")),
                ("trackWidth", Slot::Fixed("1.8")),
                ("positionX", Slot::Fixed("3.1")),
                ("positionZ", Slot::Fixed("0.3")),
            ],
            children: &[],
        },
        Template {
            name: "RearAxle",
            attrs: &[
                ("maxSteering", Slot::Fixed("0.0")),
                ("wheelDiameter", Slot::Fixed("0.6")),
                ("trackWidth", Slot::Fixed("1.8")),
                ("positionX", Slot::Fixed("0.0")),
                ("positionZ", Slot::Fixed("0.3")),
            ],
            children: &[],
        },
    ],
};

pub const PEDESTRIAN_PROPERTIES: Template = Template {
    name: "Properties",
    attrs: &[],
    children: &[Template {
        name: "Property",
        attrs: &[("name", Slot::Fixed("type")), ("value", Slot::Fixed("simulation"))],
        children: &[],
    }],
};

const fn inactive(name: &'static str) -> Template {
    Template {
        name,
        attrs: &[("value", Slot::Fixed("0")), ("active", Slot::Fixed("false"))],
        children: &[],
    }
}

pub const OVERRIDE_CONTROLLER_VALUE_ACTION: Template = Template {
    name: "OverrideControllerValueAction",
    attrs: &[],
    children: &[
        inactive("Throttle"),
        inactive("Brake"),
        inactive("Clutch"),
        inactive("ParkingBrake"),
        inactive("SteeringWheel"),
        Template {
            name: "Gear",
            attrs: &[("number", Slot::Fixed("0")), ("active", Slot::Fixed("false"))],
            children: &[],
        },
    ],
};

pub const INIT_SPEED_ACTION_DYNAMICS: Template = Template {
    name: "SpeedActionDynamics",
    attrs: &[
        ("dynamicsShape", Slot::Fixed("step")),
        ("value", Slot::Fixed("0.1")),
        ("dynamicsDimension", Slot::Fixed("distance")),
    ],
    children: &[],
};

pub const ROAD_CONDITION: Template = Template {
    name: "RoadCondition",
    attrs: &[("frictionScaleFactor", Slot::Fixed("1.0"))],
    children: &[],
};

pub const ACT_START_TRIGGER: Template = Template {
    name: "StartTrigger",
    attrs: &[],
    children: &[Template {
        name: "ConditionGroup",
        attrs: &[],
        children: &[Template {
            name: "Condition",
            attrs: &[
                ("name", Slot::Fixed("StartTime")),
                ("delay", Slot::Fixed("0")),
                ("conditionEdge", Slot::Fixed("rising")),
            ],
            children: &[Template {
                name: "ByValueCondition",
                attrs: &[],
                children: &[Template {
                    name: "SimulationTimeCondition",
                    attrs: &[("rule", Slot::Fixed("equalTo")), ("value", Slot::Fixed("0"))],
                    children: &[],
                }],
            }],
        }],
    }],
};

pub const ACT_STOP_TRIGGER: Template = Template {
    name: "StopTrigger",
    attrs: &[],
    children: &[Template {
        name: "ConditionGroup",
        attrs: &[],
        children: &[Template {
            name: "Condition",
            attrs: &[
                ("name", Slot::Fixed("EndCondition")),
                ("delay", Slot::Fixed("0")),
                ("conditionEdge", Slot::Fixed("rising")),
            ],
            children: &[Template {
                name: "ByValueCondition",
                attrs: &[],
                children: &[Template {
                    name: "SimulationTimeCondition",
                    attrs: &[("rule", Slot::Fixed("equalTo")), ("value", Slot::Fixed("100"))],
                    children: &[],
                }],
            }],
        }],
    }],
};

pub const STORYBOARD_STOP_TRIGGER: Template = empty("StopTrigger");

// ============================================================================
// Tag table
// ============================================================================

macro_rules! tags {
    ($($variant:ident => $name:literal, $support:expr;)+) => {
        /// A context-qualified OpenSCENARIO element or attribute.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Tag {
            $($variant),+
        }

        impl Tag {
            pub const ALL: &'static [Tag] = &[$(Tag::$variant),+];

            /// Local XML name.
            pub fn name(self) -> &'static str {
                match self {
                    $(Tag::$variant => $name),+
                }
            }

            pub fn policy(self) -> Support {
                match self {
                    $(Tag::$variant => $support),+
                }
            }
        }
    };
}

tags! {
    OpenScenario => "OpenSCENARIO", Full;
    FileHeader => "FileHeader", element(&FILE_HEADER);
    ParameterDeclarations => "ParameterDeclarations", Full;
    ParameterDeclaration => "ParameterDeclaration", Full;
    CatalogLocations => "CatalogLocations", element(&CATALOG_LOCATIONS);
    RoadNetwork => "RoadNetwork", Full;
    LogicFile => "LogicFile", Full;
    SceneGraphFile => "SceneGraphFile", element(&SCENE_GRAPH_FILE);
    TrafficSignals => "TrafficSignals", Unsupported;

    Entities => "Entities", Full;
    EntitySelection => "EntitySelection", Unsupported;
    ScenarioObject => "ScenarioObject", Full;
    EntityName => "name", ImportOnly;
    CatalogReference => "CatalogReference", Unsupported;
    ObjectController => "ObjectController", Unsupported;
    EntityParameterDeclarations => "ParameterDeclarations", element(&EMPTY_PARAMETER_DECLARATIONS);
    Vehicle => "Vehicle", Full;
    VehicleCategory => "vehicleCategory", attribute("car");
    Performance => "Performance", element(&PERFORMANCE);
    VehicleBoundingBox => "BoundingBox", element(&VEHICLE_BOUNDING_BOX);
    Axles => "Axles", element(&AXLES);
    VehicleProperties => "Properties", Full;
    Property => "Property", Full;
    Pedestrian => "Pedestrian", Full;
    PedestrianMass => "mass", attribute("90.0");
    PedestrianCategory => "pedestrianCategory", attribute("pedestrian");
    PedestrianBoundingBox => "BoundingBox", element(&PEDESTRIAN_BOUNDING_BOX);
    PedestrianProperties => "Properties", element(&PEDESTRIAN_PROPERTIES);
    MiscObject => "MiscObject", Full;
    MiscObjectBoundingBox => "BoundingBox", element(&MISC_OBJECT_BOUNDING_BOX);
    MiscObjectProperties => "Properties", Full;

    Storyboard => "Storyboard", Full;
    Init => "Init", Full;
    InitActions => "Actions", Full;
    InitGlobalAction => "GlobalAction", Full;
    InitInfrastructureAction => "InfrastructureAction", Unsupported;
    EnvironmentAction => "EnvironmentAction", Full;
    Environment => "Environment", Full;
    EnvironmentName => "name", attribute("Environment1");
    TimeOfDay => "TimeOfDay", Full;
    Weather => "Weather", Full;
    Sun => "Sun", Full;
    Fog => "Fog", Full;
    Precipitation => "Precipitation", Full;
    RoadCondition => "RoadCondition", element(&ROAD_CONDITION);
    InitPrivate => "Private", Full;
    InitPrivateAction => "PrivateAction", Full;
    InitLongitudinalAction => "LongitudinalAction", Full;
    InitSpeedAction => "SpeedAction", Full;
    InitSpeedActionDynamics => "SpeedActionDynamics", element(&INIT_SPEED_ACTION_DYNAMICS);
    InitSpeedActionTarget => "SpeedActionTarget", Full;
    InitLateralAction => "LateralAction", Unsupported;
    InitRoutingAction => "RoutingAction", Unsupported;

    TeleportAction => "TeleportAction", Full;
    Position => "Position", Full;
    WorldPosition => "WorldPosition", Full;
    LanePosition => "LanePosition", Unsupported;
    RoadPosition => "RoadPosition", Unsupported;
    RelativeWorldPosition => "RelativeWorldPosition", Unsupported;
    RelativeObjectPosition => "RelativeObjectPosition", Unsupported;
    RelativeRoadPosition => "RelativeRoadPosition", Unsupported;
    RelativeLanePosition => "RelativeLanePosition", Unsupported;
    RoutePosition => "RoutePosition", Unsupported;
    ControllerAction => "ControllerAction", Full;
    AssignControllerAction => "AssignControllerAction", Full;
    Controller => "Controller", Full;
    ControllerProperties => "Properties", Full;
    OverrideControllerValueAction => "OverrideControllerValueAction", element(&OVERRIDE_CONTROLLER_VALUE_ACTION);
    ActivateControllerAction => "ActivateControllerAction", Unsupported;
    VisibilityAction => "VisibilityAction", Unsupported;
    SynchronizeAction => "SynchronizeAction", Unsupported;

    Story => "Story", Full;
    ElementName => "name", ImportOnly;
    LocalParameterDeclarations => "ParameterDeclarations", Unsupported;
    Act => "Act", Full;
    ActStartTrigger => "StartTrigger", element(&ACT_START_TRIGGER);
    ActStopTrigger => "StopTrigger", element(&ACT_STOP_TRIGGER);
    ManeuverGroup => "ManeuverGroup", Full;
    MaximumExecutionCount => "maximumExecutionCount", attribute("1");
    Actors => "Actors", Full;
    SelectTriggeringEntities => "selectTriggeringEntities", attribute("false");
    EntityRef => "EntityRef", Full;
    Maneuver => "Maneuver", Full;
    Event => "Event", Full;
    Priority => "priority", attribute("overwrite");
    Action => "Action", Full;
    StartTrigger => "StartTrigger", Full;
    StopTrigger => "StopTrigger", Full;
    StoryboardStopTrigger => "StopTrigger", element(&STORYBOARD_STOP_TRIGGER);

    PrivateAction => "PrivateAction", Full;
    LongitudinalAction => "LongitudinalAction", Full;
    SpeedAction => "SpeedAction", Full;
    SpeedActionDynamics => "SpeedActionDynamics", Full;
    SpeedActionTarget => "SpeedActionTarget", Full;
    AbsoluteTargetSpeed => "AbsoluteTargetSpeed", Full;
    RelativeTargetSpeed => "RelativeTargetSpeed", Full;
    LongitudinalDistanceAction => "LongitudinalDistanceAction", Full;
    DynamicConstraints => "DynamicConstraints", Full;
    LateralAction => "LateralAction", Full;
    LaneChangeAction => "LaneChangeAction", Full;
    LaneChangeActionDynamics => "LaneChangeActionDynamics", Full;
    LaneChangeTarget => "LaneChangeTarget", Full;
    RelativeTargetLane => "RelativeTargetLane", Full;
    AbsoluteTargetLane => "AbsoluteTargetLane", Full;
    LaneOffsetAction => "LaneOffsetAction", Full;
    LaneOffsetActionDynamics => "LaneOffsetActionDynamics", Full;
    LaneOffsetTarget => "LaneOffsetTarget", Full;
    RelativeTargetLaneOffset => "RelativeTargetLaneOffset", Full;
    AbsoluteTargetLaneOffset => "AbsoluteTargetLaneOffset", Full;
    LateralDistanceAction => "LateralDistanceAction", Full;
    RoutingAction => "RoutingAction", Full;
    AssignRouteAction => "AssignRouteAction", Full;
    Route => "Route", Full;
    RouteName => "name", attribute("OSC Generated Route");
    Waypoint => "Waypoint", Full;
    FollowTrajectoryAction => "FollowTrajectoryAction", Unsupported;
    AcquirePositionAction => "AcquirePositionAction", Unsupported;
    GlobalAction => "GlobalAction", Full;
    InfrastructureAction => "InfrastructureAction", Full;
    TrafficSignalAction => "TrafficSignalAction", Full;
    TrafficSignalStateAction => "TrafficSignalStateAction", Full;
    TrafficSignalControllerAction => "TrafficSignalControllerAction", Unsupported;
    EntityAction => "EntityAction", Unsupported;
    ParameterAction => "ParameterAction", Unsupported;
    TrafficAction => "TrafficAction", Unsupported;
    UserDefinedAction => "UserDefinedAction", Unsupported;

    ConditionGroup => "ConditionGroup", Full;
    Condition => "Condition", Full;
    ByEntityCondition => "ByEntityCondition", Full;
    TriggeringEntities => "TriggeringEntities", Full;
    EntityCondition => "EntityCondition", Full;
    EndOfRoadCondition => "EndOfRoadCondition", Full;
    CollisionCondition => "CollisionCondition", Full;
    ByType => "ByType", Full;
    OffroadCondition => "OffroadCondition", Full;
    TimeHeadwayCondition => "TimeHeadwayCondition", Full;
    TimeToCollisionCondition => "TimeToCollisionCondition", Unsupported;
    AccelerationCondition => "AccelerationCondition", Full;
    StandStillCondition => "StandStillCondition", Full;
    SpeedCondition => "SpeedCondition", Full;
    RelativeSpeedCondition => "RelativeSpeedCondition", Full;
    TraveledDistanceCondition => "TraveledDistanceCondition", Full;
    ReachPositionCondition => "ReachPositionCondition", Full;
    DistanceCondition => "DistanceCondition", Full;
    RelativeDistanceCondition => "RelativeDistanceCondition", Full;
    ByValueCondition => "ByValueCondition", Full;
    ParameterCondition => "ParameterCondition", Full;
    TimeOfDayCondition => "TimeOfDayCondition", Full;
    SimulationTimeCondition => "SimulationTimeCondition", Full;
    StoryboardElementStateCondition => "StoryboardElementStateCondition", Full;
    UserDefinedValueCondition => "UserDefinedValueCondition", Full;
    TrafficSignalCondition => "TrafficSignalCondition", Full;
    TrafficSignalControllerCondition => "TrafficSignalControllerCondition", Full;
}

impl Tag {
    pub const ROOT: Tag = Tag::OpenScenario;

    /// Attribute-level tags (lower camel case, like the schema's attribute names).
    pub fn is_attribute(self) -> bool {
        self.name().starts_with(|c: char| c.is_ascii_lowercase())
    }

    /// Tag of the child element `name` inside an element of this tag.
    ///
    /// `None` means the element is not known in this context (handled as unsupported).
    pub fn child(self, name: &str) -> Option<Tag> {
        use Tag::*;
        let tag = match (self, name) {
            (OpenScenario, "FileHeader") => FileHeader,
            (OpenScenario, "ParameterDeclarations") => ParameterDeclarations,
            (OpenScenario, "CatalogLocations") => CatalogLocations,
            (OpenScenario, "RoadNetwork") => RoadNetwork,
            (OpenScenario, "Entities") => Entities,
            (OpenScenario, "Storyboard") => Storyboard,
            (ParameterDeclarations, "ParameterDeclaration") => ParameterDeclaration,
            (RoadNetwork, "LogicFile") => LogicFile,
            (RoadNetwork, "SceneGraphFile") => SceneGraphFile,
            (RoadNetwork, "TrafficSignals") => TrafficSignals,

            (Entities, "ScenarioObject") => ScenarioObject,
            (Entities, "EntitySelection") => EntitySelection,
            (ScenarioObject, "Vehicle") => Vehicle,
            (ScenarioObject, "Pedestrian") => Pedestrian,
            (ScenarioObject, "MiscObject") => MiscObject,
            (ScenarioObject, "CatalogReference") => CatalogReference,
            (ScenarioObject, "ObjectController") => ObjectController,
            (Vehicle | Pedestrian | MiscObject | Controller, "ParameterDeclarations") => {
                EntityParameterDeclarations
            }
            (Vehicle, "Performance") => Performance,
            (Vehicle, "BoundingBox") => VehicleBoundingBox,
            (Vehicle, "Axles") => Axles,
            (Vehicle, "Properties") => VehicleProperties,
            (Pedestrian, "BoundingBox") => PedestrianBoundingBox,
            (Pedestrian, "Properties") => PedestrianProperties,
            (MiscObject, "BoundingBox") => MiscObjectBoundingBox,
            (MiscObject, "Properties") => MiscObjectProperties,
            (VehicleProperties | MiscObjectProperties | ControllerProperties, "Property") => {
                Property
            }

            (Storyboard, "Init") => Init,
            (Storyboard, "Story") => Story,
            (Storyboard, "StopTrigger") => StoryboardStopTrigger,
            (Init, "Actions") => InitActions,
            (InitActions, "GlobalAction") => InitGlobalAction,
            (InitActions, "Private") => InitPrivate,
            (InitActions | Action, "UserDefinedAction") => UserDefinedAction,
            (InitGlobalAction | GlobalAction, "EnvironmentAction") => EnvironmentAction,
            (InitGlobalAction | GlobalAction, "EntityAction") => EntityAction,
            (InitGlobalAction | GlobalAction, "ParameterAction") => ParameterAction,
            (InitGlobalAction | GlobalAction, "TrafficAction") => TrafficAction,
            (InitGlobalAction, "InfrastructureAction") => InitInfrastructureAction,
            (EnvironmentAction, "Environment") => Environment,
            (EnvironmentAction | AssignControllerAction | AssignRouteAction | ManeuverGroup, "CatalogReference") => {
                CatalogReference
            }
            (Environment, "TimeOfDay") => TimeOfDay,
            (Environment, "Weather") => Weather,
            (Environment, "RoadCondition") => RoadCondition,
            (Weather, "Sun") => Sun,
            (Weather, "Fog") => Fog,
            (Weather, "Precipitation") => Precipitation,
            (InitPrivate, "PrivateAction") => InitPrivateAction,
            (InitPrivateAction, "LongitudinalAction") => InitLongitudinalAction,
            (InitPrivateAction, "LateralAction") => InitLateralAction,
            (InitPrivateAction, "RoutingAction") => InitRoutingAction,
            (InitLongitudinalAction, "SpeedAction") => InitSpeedAction,
            (InitSpeedAction, "SpeedActionDynamics") => InitSpeedActionDynamics,
            (InitSpeedAction, "SpeedActionTarget") => InitSpeedActionTarget,
            (InitSpeedActionTarget | SpeedActionTarget, "AbsoluteTargetSpeed") => {
                AbsoluteTargetSpeed
            }

            (InitPrivateAction | PrivateAction, "TeleportAction") => TeleportAction,
            (InitPrivateAction | PrivateAction, "ControllerAction") => ControllerAction,
            (InitPrivateAction | PrivateAction, "ActivateControllerAction") => {
                ActivateControllerAction
            }
            (InitPrivateAction | PrivateAction, "VisibilityAction") => VisibilityAction,
            (InitPrivateAction | PrivateAction, "SynchronizeAction") => SynchronizeAction,
            (TeleportAction | Waypoint | ReachPositionCondition | DistanceCondition, "Position") => {
                Position
            }
            (Position, "WorldPosition") => WorldPosition,
            (Position, "LanePosition") => LanePosition,
            (Position, "RoadPosition") => RoadPosition,
            (Position, "RelativeWorldPosition") => RelativeWorldPosition,
            (Position, "RelativeObjectPosition") => RelativeObjectPosition,
            (Position, "RelativeRoadPosition") => RelativeRoadPosition,
            (Position, "RelativeLanePosition") => RelativeLanePosition,
            (Position, "RoutePosition") => RoutePosition,
            (ControllerAction, "AssignControllerAction") => AssignControllerAction,
            (ControllerAction, "OverrideControllerValueAction") => OverrideControllerValueAction,
            (AssignControllerAction, "Controller") => Controller,
            (Controller, "Properties") => ControllerProperties,

            (Story | Maneuver | Route, "ParameterDeclarations") => LocalParameterDeclarations,
            (Story, "Act") => Act,
            (Act, "ManeuverGroup") => ManeuverGroup,
            (Act, "StartTrigger") => ActStartTrigger,
            (Act, "StopTrigger") => ActStopTrigger,
            (ManeuverGroup, "Actors") => Actors,
            (ManeuverGroup, "Maneuver") => Maneuver,
            (Actors | TriggeringEntities | CollisionCondition, "EntityRef") => EntityRef,
            (Maneuver, "Event") => Event,
            (Event, "Action") => Action,
            (Event, "StartTrigger") => StartTrigger,
            (Event, "StopTrigger") => StopTrigger,
            (Action, "PrivateAction") => PrivateAction,
            (Action, "GlobalAction") => GlobalAction,

            (PrivateAction, "LongitudinalAction") => LongitudinalAction,
            (PrivateAction, "LateralAction") => LateralAction,
            (PrivateAction, "RoutingAction") => RoutingAction,
            (LongitudinalAction, "SpeedAction") => SpeedAction,
            (LongitudinalAction, "LongitudinalDistanceAction") => LongitudinalDistanceAction,
            (SpeedAction, "SpeedActionDynamics") => SpeedActionDynamics,
            (SpeedAction, "SpeedActionTarget") => SpeedActionTarget,
            (SpeedActionTarget, "RelativeTargetSpeed") => RelativeTargetSpeed,
            (LongitudinalDistanceAction | LateralDistanceAction, "DynamicConstraints") => {
                DynamicConstraints
            }
            (LateralAction, "LaneChangeAction") => LaneChangeAction,
            (LateralAction, "LaneOffsetAction") => LaneOffsetAction,
            (LateralAction, "LateralDistanceAction") => LateralDistanceAction,
            (LaneChangeAction, "LaneChangeActionDynamics") => LaneChangeActionDynamics,
            (LaneChangeAction, "LaneChangeTarget") => LaneChangeTarget,
            (LaneChangeTarget, "RelativeTargetLane") => RelativeTargetLane,
            (LaneChangeTarget, "AbsoluteTargetLane") => AbsoluteTargetLane,
            (LaneOffsetAction, "LaneOffsetActionDynamics") => LaneOffsetActionDynamics,
            (LaneOffsetAction, "LaneOffsetTarget") => LaneOffsetTarget,
            (LaneOffsetTarget, "RelativeTargetLaneOffset") => RelativeTargetLaneOffset,
            (LaneOffsetTarget, "AbsoluteTargetLaneOffset") => AbsoluteTargetLaneOffset,
            (RoutingAction, "AssignRouteAction") => AssignRouteAction,
            (RoutingAction, "FollowTrajectoryAction") => FollowTrajectoryAction,
            (RoutingAction, "AcquirePositionAction") => AcquirePositionAction,
            (AssignRouteAction, "Route") => Route,
            (Route, "Waypoint") => Waypoint,
            (GlobalAction, "InfrastructureAction") => InfrastructureAction,
            (InfrastructureAction, "TrafficSignalAction") => TrafficSignalAction,
            (TrafficSignalAction, "TrafficSignalStateAction") => TrafficSignalStateAction,
            (TrafficSignalAction, "TrafficSignalControllerAction") => {
                TrafficSignalControllerAction
            }

            (StartTrigger | StopTrigger, "ConditionGroup") => ConditionGroup,
            (ConditionGroup, "Condition") => Condition,
            (Condition, "ByEntityCondition") => ByEntityCondition,
            (Condition, "ByValueCondition") => ByValueCondition,
            (ByEntityCondition, "TriggeringEntities") => TriggeringEntities,
            (ByEntityCondition, "EntityCondition") => EntityCondition,
            (EntityCondition, "EndOfRoadCondition") => EndOfRoadCondition,
            (EntityCondition, "CollisionCondition") => CollisionCondition,
            (EntityCondition, "OffroadCondition") => OffroadCondition,
            (EntityCondition, "TimeHeadwayCondition") => TimeHeadwayCondition,
            (EntityCondition, "TimeToCollisionCondition") => TimeToCollisionCondition,
            (EntityCondition, "AccelerationCondition") => AccelerationCondition,
            (EntityCondition, "StandStillCondition") => StandStillCondition,
            (EntityCondition, "SpeedCondition") => SpeedCondition,
            (EntityCondition, "RelativeSpeedCondition") => RelativeSpeedCondition,
            (EntityCondition, "TraveledDistanceCondition") => TraveledDistanceCondition,
            (EntityCondition, "ReachPositionCondition") => ReachPositionCondition,
            (EntityCondition, "DistanceCondition") => DistanceCondition,
            (EntityCondition, "RelativeDistanceCondition") => RelativeDistanceCondition,
            (CollisionCondition, "ByType") => ByType,
            (ByValueCondition, "ParameterCondition") => ParameterCondition,
            (ByValueCondition, "TimeOfDayCondition") => TimeOfDayCondition,
            (ByValueCondition, "SimulationTimeCondition") => SimulationTimeCondition,
            (ByValueCondition, "StoryboardElementStateCondition") => {
                StoryboardElementStateCondition
            }
            (ByValueCondition, "UserDefinedValueCondition") => UserDefinedValueCondition,
            (ByValueCondition, "TrafficSignalCondition") => TrafficSignalCondition,
            (ByValueCondition, "TrafficSignalControllerCondition") => {
                TrafficSignalControllerCondition
            }
            _ => return None,
        };
        Some(tag)
    }

    /// Attribute-level tag `name` on an element of this tag.
    pub fn attribute(self, name: &str) -> Option<Tag> {
        use Tag::*;
        let tag = match (self, name) {
            (ScenarioObject, "name") => EntityName,
            (Vehicle, "vehicleCategory") => VehicleCategory,
            (Pedestrian, "mass") => PedestrianMass,
            (Pedestrian, "pedestrianCategory") => PedestrianCategory,
            (Environment, "name") => EnvironmentName,
            (Story | Act | ManeuverGroup | Maneuver | Event | Action, "name") => ElementName,
            (ManeuverGroup, "maximumExecutionCount") => MaximumExecutionCount,
            (Actors, "selectTriggeringEntities") => SelectTriggeringEntities,
            (Event, "priority") => Priority,
            (Route, "name") => RouteName,
            _ => return None,
        };
        Some(tag)
    }
}
