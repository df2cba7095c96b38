//! Service-topology extraction engine
//!
//! Documents flow through the [`normalizer`] and the [`walker`]. The
//! [`composer`] then fills categories no document resolved from the
//! [`fuzzy`] resolver and merges everything into one [`ServiceRecord`].

pub mod additional;
pub mod composer;
pub mod flatten;
pub mod fuzzy;
pub mod infrastructure;
pub mod kind_enum_macro;
pub mod normalizer;
pub mod ordered;
pub mod types;
pub mod value;
pub mod walker;

pub use composer::ServiceExtractor;
pub use flatten::{FlatField, FlattenedView};
pub use fuzzy::{FieldCategory, FuzzyResolver, KeyMatch, PortResolution};
pub use infrastructure::{InfrastructureCategory, InfrastructureKind};
pub use normalizer::normalize;
pub use ordered::OrderedSet;
pub use types::{
    AdditionalData, DependentInfrastructureEntry, DependentServiceEntry, FieldMatch, Protocol,
    ServiceRecord,
};
pub use walker::{DocumentError, DocumentFindings, StructuredWalker};
