//! Resolve the document to values.

use std::{
    collections::HashMap,
    fmt,
    mem,
    sync::{Arc, Mutex},
};

use arcstr::ArcStr;
use fnv::FnvHashMap;
use indexmap::IndexMap;
use itertools::Itertools as _;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::{
    GraphQLError,
    ast::{Definition, Document, Field, Fragment, InputValue, Operation, OperationType},
    schema::{
        meta::MetaType,
        model::{SchemaType, TypeType},
    },
    source::{ContextValue, FieldResolverFn, SourceValue, TypeResolverFn},
    span::{SourcePosition, Spanning},
    value::{DefaultScalarValue, Object, ScalarValue, Value},
};

pub use self::{
    dispatcher::ResponseStream,
    eventual::Eventual,
    response::{ExecutionPatchResult, ExecutionResult, IncrementalResult, Response},
};
pub(crate) use self::collect::{CollectedFields, FieldNodes, Patch};

mod arguments;
mod collect;
mod complete;
mod dispatcher;
mod eventual;
mod resolvers;
mod response;

use self::dispatcher::Dispatcher;

/// The map of variables used for substitution during query execution.
pub type Variables<S = DefaultScalarValue> = HashMap<String, InputValue<S>>;

/// The named fragments of a document, indexed by name.
pub type Fragments<'a, S> = HashMap<&'a str, &'a Fragment<'a, S>>;

/// Error type for errors that occur during field resolution.
///
/// Field errors are represented by a human-readable error message and an
/// optional [`Value`] structure containing additional information.
///
/// They can be converted to from any type that implements
/// [`std::fmt::Display`], which makes error chaining with the `?` operator
/// a breeze:
///
/// ```rust
/// # use larch::FieldError;
/// fn get_string(data: Vec<u8>) -> Result<String, FieldError> {
///     let s = String::from_utf8(data)?;
///     Ok(s)
/// }
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct FieldError<S = DefaultScalarValue> {
    message: String,
    extensions: Value<S>,
}

impl<T: fmt::Display, S> From<T> for FieldError<S> {
    fn from(e: T) -> Self {
        Self {
            message: e.to_string(),
            extensions: Value::Null,
        }
    }
}

impl<S> FieldError<S> {
    /// Constructs a new [`FieldError`] with additional data.
    ///
    /// The `extensions` value is carried into the `"extensions"` member of
    /// the error in the response. If it is [`Value::Null`], no extra data is
    /// included.
    #[must_use]
    pub fn new<T: fmt::Display>(e: T, extensions: Value<S>) -> Self {
        Self {
            message: e.to_string(),
            extensions,
        }
    }

    /// Returns the `"message"` of this [`FieldError`].
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the `"extensions"` of this [`FieldError`].
    ///
    /// If there are none, [`Value::Null`] is returned.
    #[must_use]
    pub fn extensions(&self) -> &Value<S> {
        &self.extensions
    }
}

/// The result of resolving the value of a field of type `T`.
pub type FieldResult<T, S = DefaultScalarValue> = Result<T, FieldError<S>>;

/// A single segment of a response path: a response name or a list index.
#[derive(Clone, Debug, Eq, PartialEq)]
#[expect(missing_docs, reason = "self-explanatory")]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => f.write_str(name),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

impl Serialize for PathSegment {
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        match self {
            Self::Field(name) => serializer.serialize_str(name),
            Self::Index(index) => serializer.serialize_u64(*index as u64),
        }
    }
}

/// The path from the response root down to one value, built as an immutable
/// cons-list: every descent into a field or a list element allocates a new
/// node pointing back at its parent.
///
/// Field nodes optionally remember the name of the object type they were
/// selected on, purely to enrich diagnostics.
#[derive(Clone, Debug)]
#[expect(missing_docs, reason = "self-explanatory")]
pub enum ResponsePath<'a> {
    Root,
    Field {
        name: &'a str,
        type_name: Option<ArcStr>,
        parent: Arc<ResponsePath<'a>>,
    },
    Index {
        index: usize,
        parent: Arc<ResponsePath<'a>>,
    },
}

impl<'a> ResponsePath<'a> {
    pub(crate) fn append_field(self: &Arc<Self>, name: &'a str, type_name: ArcStr) -> Arc<Self> {
        Arc::new(Self::Field {
            name,
            type_name: Some(type_name),
            parent: Arc::clone(self),
        })
    }

    pub(crate) fn append_index(self: &Arc<Self>, index: usize) -> Arc<Self> {
        Arc::new(Self::Index {
            index,
            parent: Arc::clone(self),
        })
    }

    /// Flattens this path into its ordered segments, root first.
    pub fn linearize(&self) -> Vec<PathSegment> {
        let mut segments = vec![];
        self.collect_segments(&mut segments);
        segments
    }

    fn collect_segments(&self, acc: &mut Vec<PathSegment>) {
        match self {
            Self::Root => {}
            Self::Field { name, parent, .. } => {
                parent.collect_segments(acc);
                acc.push(PathSegment::Field((*name).into()));
            }
            Self::Index { index, parent } => {
                parent.collect_segments(acc);
                acc.push(PathSegment::Index(*index));
            }
        }
    }
}

/// Error type for errors that occur during query execution.
///
/// All execution errors contain the source positions of the field nodes
/// that failed to resolve, and the linearized response path of the failing
/// value.
#[derive(Clone, Debug, PartialEq)]
pub struct ExecutionError<S = DefaultScalarValue> {
    locations: Vec<SourcePosition>,
    path: Vec<PathSegment>,
    error: FieldError<S>,
}

impl<S> ExecutionError<S> {
    #[doc(hidden)]
    pub fn new(
        locations: Vec<SourcePosition>,
        path: Vec<PathSegment>,
        error: FieldError<S>,
    ) -> Self {
        Self {
            locations,
            path,
            error,
        }
    }

    /// Constructs a new [`ExecutionError`] occurring at the beginning of the
    /// document, outside any field.
    pub fn at_origin(error: FieldError<S>) -> Self {
        Self {
            locations: vec![SourcePosition::new_origin()],
            path: vec![],
            error,
        }
    }

    /// The underlying [`FieldError`].
    pub fn error(&self) -> &FieldError<S> {
        &self.error
    }

    /// The source locations in the document of the fields that failed to
    /// resolve.
    pub fn locations(&self) -> &[SourcePosition] {
        &self.locations
    }

    /// The response path leading to the value that produced this error.
    pub fn path(&self) -> &[PathSegment] {
        &self.path
    }
}

impl<S> fmt::Display for ExecutionError<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.error.message())?;
        if !self.path.is_empty() {
            write!(f, " (at {})", self.path.iter().join("."))?;
        }
        Ok(())
    }
}

impl<S: ScalarValue> Serialize for ExecutionError<S> {
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        #[derive(serde::Serialize)]
        struct Location {
            line: usize,
            column: usize,
        }

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("message", self.error.message())?;
        if !self.locations.is_empty() {
            let locations: Vec<_> = self
                .locations
                .iter()
                .map(|p| Location {
                    line: p.line() + 1,
                    column: p.column() + 1,
                })
                .collect();
            map.serialize_entry("locations", &locations)?;
        }
        if !self.path.is_empty() {
            map.serialize_entry("path", &self.path)?;
        }
        if !self.error.extensions().is_null() {
            map.serialize_entry("extensions", self.error.extensions())?;
        }
        map.end()
    }
}

/// Field arguments after coercion against the declared argument metadata
/// and the request's variable scope.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Arguments<S = DefaultScalarValue> {
    args: IndexMap<String, InputValue<S>>,
}

impl<S> Arguments<S> {
    /// Constructs an empty [`Arguments`] map.
    pub fn new() -> Self {
        Self {
            args: IndexMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, value: InputValue<S>) {
        self.args.insert(name.into(), value);
    }

    /// Returns the coerced value of the argument named `name`, if provided.
    pub fn get(&self, name: &str) -> Option<&InputValue<S>> {
        self.args.get(name)
    }

    /// Returns the number of provided arguments.
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// Indicates whether no arguments were provided.
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

impl<K: Into<String>, S> FromIterator<(K, InputValue<S>)> for Arguments<S> {
    fn from_iter<I: IntoIterator<Item = (K, InputValue<S>)>>(iter: I) -> Self {
        Self {
            args: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Everything a resolver may want to know about the field it is resolving.
///
/// The first lifetime is the borrow of the current execution frame; the
/// second is the document/schema borrow the whole request runs under.
#[expect(missing_docs, reason = "self-explanatory")]
pub struct ResolveInfo<'e, 'a, S = DefaultScalarValue> {
    pub field_name: &'a str,
    pub field_nodes: &'e [&'a Spanning<Field<'a, S>>],
    pub return_type: &'e TypeType<'a, S>,
    pub parent_type: &'a MetaType<S>,
    pub path: &'e ResponsePath<'a>,
    pub schema: &'a SchemaType<S>,
    pub fragments: &'e Fragments<'a, S>,
    pub operation: &'a Spanning<Operation<'a, S>>,
    pub variable_values: &'e Variables<S>,
    pub root_value: &'e SourceValue<S>,
}

/// The per-field slice of [`ResolveInfo`] the completer carries through its
/// recursion, owning (or `Arc`-sharing) everything so it can travel into
/// pending futures.
pub(crate) struct FieldInfo<'a, S> {
    pub(crate) field_name: &'a str,
    pub(crate) field_nodes: FieldNodes<'a, S>,
    pub(crate) parent_type: &'a MetaType<S>,
    pub(crate) return_type: TypeType<'a, S>,
}

impl<'a, S> Clone for FieldInfo<'a, S> {
    fn clone(&self) -> Self {
        Self {
            field_name: self.field_name,
            field_nodes: self.field_nodes.clone(),
            parent_type: self.parent_type,
            return_type: self.return_type.clone(),
        }
    }
}

/// Result of completing one value: either the response-shaped value, or a
/// located error travelling up to the nearest nullable ancestor.
pub(crate) type CompletionResult<S> = Result<Value<S>, ExecutionError<S>>;

/// Append-only error accumulator; the main one lives on the context, and
/// every incremental patch gets a fresh one of its own.
pub(crate) type ErrorSink<S> = Arc<Mutex<Vec<ExecutionError<S>>>>;

/// Per-request execution environment.
///
/// Built once per [`execute`] call and shared (behind an [`Arc`]) by every
/// completion frame and incremental patch the request spawns.
pub struct ExecutionContext<'a, S = DefaultScalarValue> {
    pub(crate) schema: &'a SchemaType<S>,
    pub(crate) fragments: Fragments<'a, S>,
    pub(crate) operation: &'a Spanning<Operation<'a, S>>,
    pub(crate) variables: Variables<S>,
    pub(crate) root_value: Arc<SourceValue<S>>,
    pub(crate) context_value: Option<ContextValue>,
    pub(crate) field_resolver: FieldResolverFn<S>,
    pub(crate) type_resolver: TypeResolverFn<S>,
    pub(crate) subscribe_field_resolver: FieldResolverFn<S>,
    pub(crate) errors: ErrorSink<S>,
    pub(crate) dispatcher: Dispatcher<'a, S>,
    subfield_memo: Mutex<FnvHashMap<(usize, usize), Arc<CollectedFields<'a, S>>>>,
}

impl<'a, S: ScalarValue> ExecutionContext<'a, S> {
    fn build(args: ExecutionArgs<'a, S>) -> Result<Arc<Self>, Vec<ExecutionError<S>>> {
        let mut fragments: Fragments<'a, S> = HashMap::new();
        let mut operation = None;

        for def in args.document {
            match def {
                Definition::Operation(op) => match args.operation_name {
                    None => {
                        if operation.is_some() {
                            return Err(vec![ExecutionError::at_origin(
                                "Must provide operation name if query contains multiple operations."
                                    .into(),
                            )]);
                        }
                        operation = Some(op);
                    }
                    Some(name) => {
                        if op.item.name.as_ref().map(|n| n.item) == Some(name) {
                            operation = Some(op);
                        }
                    }
                },
                Definition::Fragment(f) => {
                    fragments.insert(f.item.name.item, &f.item);
                }
            }
        }

        let operation = operation.ok_or_else(|| {
            vec![ExecutionError::at_origin(match args.operation_name {
                Some(name) => format!("Unknown operation named \"{name}\".").into(),
                None => "Must provide an operation.".into(),
            })]
        })?;

        let variables =
            arguments::coerce_variable_values(args.schema, operation, &args.variable_values)?;

        Ok(Arc::new(Self {
            schema: args.schema,
            fragments,
            operation,
            variables,
            root_value: Arc::new(args.root_value),
            context_value: args.context_value,
            field_resolver: args
                .field_resolver
                .unwrap_or_else(resolvers::default_field_resolver),
            type_resolver: args
                .type_resolver
                .unwrap_or_else(resolvers::default_type_resolver),
            subscribe_field_resolver: args
                .subscribe_field_resolver
                .unwrap_or_else(resolvers::default_field_resolver),
            errors: Arc::default(),
            dispatcher: Dispatcher::new(),
            subfield_memo: Mutex::new(FnvHashMap::default()),
        }))
    }

    /// The schema this request executes against.
    pub fn schema(&self) -> &'a SchemaType<S> {
        self.schema
    }

    /// The named fragments of the executing document.
    pub fn fragments(&self) -> &Fragments<'a, S> {
        &self.fragments
    }

    /// The operation being executed.
    pub fn operation(&self) -> &'a Spanning<Operation<'a, S>> {
        self.operation
    }

    /// The coerced variable values of this request.
    pub fn variables(&self) -> &Variables<S> {
        &self.variables
    }

    /// The root value execution started from.
    pub fn root_value(&self) -> &SourceValue<S> {
        &self.root_value
    }

    /// The opaque context value of this request, if any.
    pub fn context_value(&self) -> Option<&ContextValue> {
        self.context_value.as_ref()
    }

    pub(crate) fn memoized_subfields(
        &self,
        key: (usize, usize),
    ) -> Option<Arc<CollectedFields<'a, S>>> {
        self.subfield_memo.lock().unwrap().get(&key).cloned()
    }

    pub(crate) fn memoize_subfields(
        &self,
        key: (usize, usize),
        collected: Arc<CollectedFields<'a, S>>,
    ) {
        self.subfield_memo.lock().unwrap().insert(key, collected);
    }
}

/// Arguments of an [`execute`] call.
///
/// Only the schema and the document are mandatory; everything else has a
/// sensible absent state.
#[expect(missing_docs, reason = "self-explanatory")]
pub struct ExecutionArgs<'a, S = DefaultScalarValue> {
    pub schema: &'a SchemaType<S>,
    pub document: &'a Document<'a, S>,
    pub operation_name: Option<&'a str>,
    pub root_value: SourceValue<S>,
    pub context_value: Option<ContextValue>,
    pub variable_values: Variables<S>,
    pub field_resolver: Option<FieldResolverFn<S>>,
    pub type_resolver: Option<TypeResolverFn<S>>,
    pub subscribe_field_resolver: Option<FieldResolverFn<S>>,
}

impl<'a, S: ScalarValue> ExecutionArgs<'a, S> {
    /// Creates [`ExecutionArgs`] for the given schema and document, with no
    /// root value, context, variables or custom resolvers.
    pub fn new(schema: &'a SchemaType<S>, document: &'a Document<'a, S>) -> Self {
        Self {
            schema,
            document,
            operation_name: None,
            root_value: SourceValue::Null,
            context_value: None,
            variable_values: Variables::new(),
            field_resolver: None,
            type_resolver: None,
            subscribe_field_resolver: None,
        }
    }
}

/// The outcome of [`execute`]: the [`Response`] itself, or a future of it
/// when some resolver suspended.
pub type Execution<'a, S = DefaultScalarValue> = Eventual<'a, Response<'a, S>>;

/// Executes the operation selected by `args` against its schema.
///
/// If every resolver involved returns a ready value, the result is
/// [`Eventual::Ready`]: no future is allocated and no scheduler is needed.
/// When the document contains `@defer`/`@stream` work, the response is
/// [`Response::Incremental`] and the remaining payloads arrive over its
/// stream.
///
/// Request-level failures (no operation, unknown operation name, variable
/// coercion) come back as an immediate `errors`-only result.
pub fn execute<'a, S: ScalarValue>(args: ExecutionArgs<'a, S>) -> Execution<'a, S> {
    let ctx = match ExecutionContext::build(args) {
        Ok(ctx) => ctx,
        Err(errors) => {
            return Eventual::Ready(Response::Single(ExecutionResult::from_errors(errors)));
        }
    };
    match execute_operation(&ctx) {
        Eventual::Ready(result) => Eventual::Ready(build_response(ctx, result)),
        Eventual::Pending(fut) => {
            Eventual::pending(async move { build_response(ctx, fut.await) })
        }
    }
}

/// Executes the operation selected by `args`, requiring the whole of it to
/// finish synchronously.
///
/// # Errors
///
/// If any resolver suspends, or incremental delivery kicks in.
pub fn execute_sync<'a, S: ScalarValue>(
    args: ExecutionArgs<'a, S>,
) -> Result<ExecutionResult<S>, GraphQLError> {
    match execute(args) {
        Eventual::Ready(Response::Single(result)) => Ok(result),
        _ => Err(GraphQLError::NotSynchronous),
    }
}

fn execute_operation<'a, S: ScalarValue>(
    ctx: &Arc<ExecutionContext<'a, S>>,
) -> Eventual<'a, CompletionResult<S>> {
    let operation = ctx.operation;
    let op_type = operation.item.operation_type;

    let Some(root_type) = ctx.schema.concrete_root_type(op_type) else {
        return Eventual::Ready(Err(ExecutionError::new(
            vec![*operation.start()],
            vec![],
            format!("Schema is not configured to execute {op_type} operation.").into(),
        )));
    };

    let collected = Arc::new(collect::collect_fields(
        ctx,
        root_type,
        &operation.item.selection_set,
    ));
    let path = Arc::new(ResponsePath::Root);
    let source = ctx.root_value.clone();

    let result = match op_type {
        OperationType::Mutation => {
            execute_fields_serially(ctx, root_type, &source, &path, collected.clone())
        }
        OperationType::Query | OperationType::Subscription => {
            execute_fields(ctx, root_type, &source, &path, &collected.fields, &ctx.errors)
        }
    };
    enqueue_patches(ctx, root_type, &source, &path, &collected.patches);
    result
}

fn build_response<'a, S: ScalarValue>(
    ctx: Arc<ExecutionContext<'a, S>>,
    result: CompletionResult<S>,
) -> Response<'a, S> {
    let data = match result {
        Ok(v) => v,
        Err(e) => {
            ctx.errors.lock().unwrap().push(e);
            Value::Null
        }
    };
    let errors = mem::take(&mut *ctx.errors.lock().unwrap());
    let initial = ExecutionResult {
        data: Some(data),
        errors,
        has_next: None,
        extensions: None,
    };
    if ctx.dispatcher.has_pending() {
        Response::Incremental(ResponseStream::new(ctx, initial))
    } else {
        Response::Single(initial)
    }
}

/// Executes a grouped field map in parallel: every field's resolver is
/// invoked up front, and the object combines once all of them settle.
///
/// Response key order is the collection order of the group, regardless of
/// settle order.
pub(crate) fn execute_fields<'a, S: ScalarValue>(
    ctx: &Arc<ExecutionContext<'a, S>>,
    parent_type: &'a MetaType<S>,
    source: &Arc<SourceValue<S>>,
    path: &Arc<ResponsePath<'a>>,
    fields: &collect::FieldMap<'a, S>,
    errors: &ErrorSink<S>,
) -> Eventual<'a, CompletionResult<S>> {
    let mut names = Vec::with_capacity(fields.len());
    let mut values = Vec::with_capacity(fields.len());
    for (&response_name, nodes) in fields {
        let Some(value) =
            resolve_field(ctx, parent_type, source, path, response_name, nodes, errors)
        else {
            continue;
        };
        names.push(response_name);
        values.push(value);
    }

    Eventual::all(values).map(move |results| {
        let mut object = Object::with_capacity(names.len());
        for (name, result) in names.into_iter().zip(results) {
            object.add_field(name, result?);
        }
        Ok(Value::Object(object))
    })
}

/// Executes a grouped field map serially: each field begins only after the
/// previous one (including its whole sub-selection) has settled.
///
/// Stays synchronous until the first field that actually suspends; the
/// remainder then continues inside a single future.
fn execute_fields_serially<'a, S: ScalarValue>(
    ctx: &Arc<ExecutionContext<'a, S>>,
    parent_type: &'a MetaType<S>,
    source: &Arc<SourceValue<S>>,
    path: &Arc<ResponsePath<'a>>,
    collected: Arc<CollectedFields<'a, S>>,
) -> Eventual<'a, CompletionResult<S>> {
    let mut object = Object::with_capacity(collected.fields.len());
    let mut index = 0;

    while let Some((&response_name, nodes)) = collected.fields.get_index(index) {
        index += 1;
        let Some(value) =
            resolve_field(ctx, parent_type, source, path, response_name, nodes, &ctx.errors)
        else {
            continue;
        };
        match value {
            Eventual::Ready(Ok(v)) => {
                object.add_field(response_name, v);
            }
            Eventual::Ready(Err(e)) => return Eventual::Ready(Err(e)),
            Eventual::Pending(fut) => {
                let ctx = ctx.clone();
                let source = source.clone();
                let path = path.clone();
                return Eventual::pending(async move {
                    object.add_field(response_name, fut.await?);
                    while let Some((&response_name, nodes)) = collected.fields.get_index(index) {
                        index += 1;
                        let Some(value) = resolve_field(
                            &ctx,
                            parent_type,
                            &source,
                            &path,
                            response_name,
                            nodes,
                            &ctx.errors,
                        ) else {
                            continue;
                        };
                        object.add_field(response_name, value.resolve().await?);
                    }
                    Ok(Value::Object(object))
                });
            }
        }
    }

    Eventual::Ready(Ok(Value::Object(object)))
}

/// Registers deferred patches with the dispatcher: each one executes its
/// field group against the same source (in parallel, with its own error
/// list) and is delivered out-of-band.
pub(crate) fn enqueue_patches<'a, S: ScalarValue>(
    ctx: &Arc<ExecutionContext<'a, S>>,
    parent_type: &'a MetaType<S>,
    source: &Arc<SourceValue<S>>,
    path: &Arc<ResponsePath<'a>>,
    patches: &[Patch<'a, S>],
) {
    for patch in patches {
        let errors: ErrorSink<S> = Arc::default();
        let value = execute_fields(
            ctx,
            parent_type,
            source,
            path,
            &patch.collected.fields,
            &errors,
        );
        enqueue_patches(ctx, parent_type, source, path, &patch.collected.patches);
        ctx.dispatcher
            .add_fields(value, errors, patch.label.clone(), path.clone());
    }
}

/// Resolves one grouped field: looks up its definition, binds arguments,
/// invokes the resolver and hands the raw value to the completer.
///
/// Returns [`None`] when the field is not defined on `parent_type`
/// (validation owns that error).
fn resolve_field<'a, S: ScalarValue>(
    ctx: &Arc<ExecutionContext<'a, S>>,
    parent_type: &'a MetaType<S>,
    source: &Arc<SourceValue<S>>,
    path: &Arc<ResponsePath<'a>>,
    response_name: &'a str,
    nodes: &FieldNodes<'a, S>,
    errors: &ErrorSink<S>,
) -> Option<Eventual<'a, CompletionResult<S>>> {
    let first = *nodes.first().expect("field groups hold at least one node");
    let field_name = first.item.name.item;
    let field_def = ctx.schema.field_definition(parent_type, field_name)?;

    let finfo = FieldInfo {
        field_name,
        field_nodes: nodes.clone(),
        parent_type,
        return_type: ctx.schema.make_type(&field_def.field_type),
    };
    let field_path = path.append_field(response_name, parent_type.name().clone());

    let coerced = arguments::coerce_argument_values(field_def, first, &ctx.variables, &field_path);
    let args = match coerced {
        Ok(args) => args,
        Err(e) => {
            return Some(Eventual::Ready(complete::handle_field_error(
                e,
                &finfo.return_type,
                errors,
            )));
        }
    };

    let resolved = {
        let info = make_resolve_info(ctx, &finfo, &field_path);
        let resolver = field_def.resolver.as_ref().unwrap_or_else(|| {
            if matches!(**path, ResponsePath::Root)
                && ctx.operation.item.operation_type == OperationType::Subscription
            {
                &ctx.subscribe_field_resolver
            } else {
                &ctx.field_resolver
            }
        });
        resolver(source, &args, ctx.context_value.as_ref(), &info)
    };

    Some(match resolved {
        Eventual::Ready(Ok(raw)) => {
            let completed =
                complete::complete_value(ctx, &finfo.return_type, &finfo, &field_path, errors, raw);
            let return_type = finfo.return_type;
            let errors = errors.clone();
            completed.map(move |result| match result {
                Err(e) => complete::handle_field_error(e, &return_type, &errors),
                ok => ok,
            })
        }
        Eventual::Ready(Err(e)) => {
            let located = complete::located_error(e, &finfo.field_nodes, &field_path);
            Eventual::Ready(complete::handle_field_error(
                located,
                &finfo.return_type,
                errors,
            ))
        }
        Eventual::Pending(fut) => {
            let ctx = ctx.clone();
            let errors = errors.clone();
            Eventual::pending(async move {
                let result = match fut.await {
                    Ok(raw) => {
                        complete::complete_value(
                            &ctx,
                            &finfo.return_type,
                            &finfo,
                            &field_path,
                            &errors,
                            raw,
                        )
                        .resolve()
                        .await
                    }
                    Err(e) => Err(complete::located_error(e, &finfo.field_nodes, &field_path)),
                };
                match result {
                    Err(e) => complete::handle_field_error(e, &finfo.return_type, &errors),
                    ok => ok,
                }
            })
        }
    })
}

pub(crate) fn make_resolve_info<'e, 'a, S>(
    ctx: &'e ExecutionContext<'a, S>,
    finfo: &'e FieldInfo<'a, S>,
    path: &'e ResponsePath<'a>,
) -> ResolveInfo<'e, 'a, S> {
    ResolveInfo {
        field_name: finfo.field_name,
        field_nodes: finfo.field_nodes.as_slice(),
        return_type: &finfo.return_type,
        parent_type: finfo.parent_type,
        path,
        schema: ctx.schema,
        fragments: &ctx.fragments,
        operation: ctx.operation,
        variable_values: &ctx.variables,
        root_value: &ctx.root_value,
    }
}
