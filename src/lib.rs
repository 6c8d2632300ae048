//! xosc – OpenSCENARIO 1.0 scenario document model with a policy-driven XML codec
//!
//! A [`ScenarioDocument`] is built from placement data (or decoded from XML), validated by the
//! [`ReferenceResolver`] and encoded back to XML. Which tags are round-tripped, emitted as
//! constants, read only on import or skipped is decided by the table in [`policy`].
//!
//! # Beispiel
//!
//! ```
//! use xosc::model::{
//!     Condition, Maneuver, ManeuverKind, Rule, SpeedAction, Trigger, ValueCondition,
//!     WorldPosition,
//! };
//! use xosc::{decode, encode, ParameterTable, ScenarioBuilder};
//!
//! let params = ParameterTable::new();
//! let mut builder = ScenarioBuilder::new("Town04");
//! let ego = builder.add_vehicle("vehicle.tesla.model3", true, WorldPosition::new(10.0, 2.0, 0.0, 0.0));
//! builder.add_maneuver(Maneuver::new(
//!     Some(ego),
//!     ManeuverKind::Speed(SpeedAction::absolute(10.0)),
//!     Trigger::single(Condition::by_value(ValueCondition::SimulationTime {
//!         value: 5.0.into(),
//!         rule: Rule::GreaterOrEqual,
//!     })),
//! ));
//! let doc = builder.build(&params).unwrap();
//!
//! let xml = encode(&doc, &params).unwrap();
//! let decoded = decode(&xml).unwrap();
//! assert_eq!(decoded.document.entities.len(), 1);
//! assert!(decoded.diagnostics.is_empty());
//! ```

pub mod builder;
pub mod decoder;
pub mod diagnostic;
pub mod encoder;
pub mod error;
pub mod model;
pub mod naming;
pub mod options;
pub mod parameter;
pub mod policy;
pub mod resolver;

pub use error::{DecodeError, EncodeError, Error, Result};

/// HashSet mit ahash (schneller, nicht DoS-resistent, für interne Datenstrukturen).
pub(crate) type FastHashSet<K> = std::collections::HashSet<K, ahash::RandomState>;

/// IndexMap mit ahash (deterministische Iteration + schnelles Hashing).
pub(crate) type FastIndexMap<K, V> = indexmap::IndexMap<K, V, ahash::RandomState>;

// Public API: Model
pub use model::{EntityId, Maneuver, ScenarioDocument, ScenarioEntity};
pub use builder::ScenarioBuilder;

// Public API: Parameters
pub use parameter::{ParameterDeclaration, ParameterTable, ParameterType, Value};

// Public API: Policy / Resolver
pub use policy::{Constant, Support, Tag, Template};
pub use resolver::ReferenceResolver;

// Public API: Options
pub use options::{DecodeOptions, EncodeOptions};

// Public API: Encoder/Decoder
pub use decoder::{decode, decode_with_options, Decoded, Metadata};
pub use encoder::{encode, encode_with_options};

// Public API: Diagnostics
pub use diagnostic::{Diagnostic, DiagnosticKind};
