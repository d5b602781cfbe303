//! GraphQL query execution engine.
//!
//! `larch` is the execution core of a GraphQL runtime: given a schema, a
//! parsed and validated operation document, variable bindings and a root
//! value, it resolves fields, completes values according to their declared
//! output types, and shapes the `{data, errors}` response, or, when the
//! document uses the `@defer`/`@stream` directives, an incremental stream
//! of payloads.
//!
//! Parsing, document validation and schema validation are deliberately not
//! part of this crate; [`ast`] and [`schema`] define the shapes those
//! collaborators hand over.
//!
//! Execution is eager where it can be: as long as no resolver returns a
//! future, [`execute`] returns a ready result without allocating a single
//! task, and [`execute_sync`] can insist on that.

#[macro_use]
mod macros;
pub mod ast;
pub mod executor;
pub mod schema;
mod source;
mod span;
mod value;

#[cfg(test)]
mod executor_tests;

use derive_more::with_trait::Display;

pub use crate::{
    ast::{
        Definition, Document, InputValue, Operation, OperationType, OwnedDocument, Selection,
        Type, TypeModifier,
    },
    executor::{
        Arguments, Execution, ExecutionArgs, ExecutionContext, ExecutionError,
        ExecutionPatchResult, ExecutionResult, Eventual, FieldError, FieldResult, Fragments,
        IncrementalResult, PathSegment, ResolveInfo, Response, ResponsePath, ResponseStream,
        Variables, execute, execute_sync,
    },
    schema::{
        meta,
        model::{DirectiveLocation, DirectiveType, SchemaError, SchemaType, TypeType},
    },
    source::{
        ContextValue, FieldResolverFn, IsTypeOfFn, PropertyResolverFn, ResolvedValue,
        SourceObject, SourceProperty, SourceStream, SourceValue, SourceValueStream,
        TypeResolverFn,
    },
    span::{SourcePosition, Span, Spanning},
    value::{DefaultScalarValue, Object, ScalarValue, Value},
};

/// An error that prevented execution from completing in the requested mode.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum GraphQLError {
    /// [`execute_sync`] was used, but a resolver suspended or incremental
    /// delivery kicked in.
    #[display("GraphQL execution failed to complete synchronously.")]
    NotSynchronous,
}

impl std::error::Error for GraphQLError {}
