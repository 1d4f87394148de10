//! # strux-schema
//!
//! Schema descriptors and validation for strux.
//!
//! A [`SchemaDescriptor`] is an explicit, immutable description of the shape
//! the extraction pipeline must produce: field names, kinds, nesting, and
//! ordered business rules. The rest of the pipeline borrows the descriptor
//! read-only; nothing in strux relies on runtime reflection.
//!
//! ## Example
//!
//! ```rust
//! use strux_schema::{validate, FieldSpec, SchemaDescriptor, ValidationContext, ValidationOutcome};
//!
//! let schema = SchemaDescriptor::object("Person")
//!     .field("name", FieldSpec::string().describe("The person's name"))
//!     .field("age", FieldSpec::integer().describe("Age in years"))
//!     .build();
//!
//! let value = serde_json::json!({"name": "Jason", "age": "25"});
//! let ctx = ValidationContext::empty();
//!
//! match validate(&value, &schema, &ctx) {
//!     ValidationOutcome::Valid(instance) => {
//!         // the numeric string was coerced
//!         assert_eq!(instance["age"], 25);
//!     }
//!     ValidationOutcome::Invalid(errors) => panic!("unexpected: {errors:?}"),
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod field;
pub mod render;
pub mod rules;
pub mod validate;

pub use error::{FieldError, ValidationOutcome};
pub use field::{FieldKind, FieldSpec, ObjectBuilder, ScalarType, SchemaDescriptor};
pub use render::to_json_schema;
pub use rules::{Rule, RuleScope, ValidationContext};
pub use validate::{validate, validate_spec};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        validate, FieldError, FieldKind, FieldSpec, Rule, ScalarType, SchemaDescriptor,
        ValidationContext, ValidationOutcome,
    };
}
