//! Incremental-payload queue and the response stream that delivers it.

use std::{
    mem,
    pin::Pin,
    sync::{Arc, Mutex},
    task::{Context, Poll},
};

use futures::{Stream, StreamExt as _, future::BoxFuture};

use crate::{
    schema::model::TypeType,
    source::{SourceValue, SourceValueStream},
    value::{ScalarValue, Value},
};

use super::{
    CompletionResult, ErrorSink, Eventual, ExecutionContext, ExecutionPatchResult,
    ExecutionResult, FieldInfo, IncrementalResult, ResponsePath, complete,
};

/// What racing the queue yields: a deliverable patch, or the signal that an
/// async sequence ran dry.
pub(crate) enum RacedItem<S> {
    Patch(ExecutionPatchResult<S>),
    Done,
}

/// The append-only queue of in-flight incremental payloads.
///
/// Entries are appended as `@defer`/`@stream` work is discovered and
/// spliced out one by one as they settle; delivery order is completion
/// order, with already-settled payloads delivered in submission order.
pub(crate) struct Dispatcher<'a, S> {
    pending: Mutex<Vec<BoxFuture<'a, RacedItem<S>>>>,
}

impl<'a, S: ScalarValue> Dispatcher<'a, S> {
    pub(crate) fn new() -> Self {
        Self {
            pending: Mutex::new(vec![]),
        }
    }

    pub(crate) fn has_pending(&self) -> bool {
        !self.pending.lock().unwrap().is_empty()
    }

    fn enqueue(&self, fut: BoxFuture<'a, RacedItem<S>>) {
        self.pending.lock().unwrap().push(fut);
    }

    /// Schedules a patch wrapping an already-launched object value.
    pub(crate) fn add_fields(
        &self,
        value: Eventual<'a, CompletionResult<S>>,
        errors: ErrorSink<S>,
        label: Option<String>,
        path: Arc<ResponsePath<'a>>,
    ) {
        self.enqueue(Box::pin(async move {
            let data = match value.resolve().await {
                Ok(v) => v,
                Err(e) => {
                    errors.lock().unwrap().push(e);
                    Value::Null
                }
            };
            RacedItem::Patch(ExecutionPatchResult {
                data: Some(data),
                path: path.linearize(),
                label,
                errors: mem::take(&mut *errors.lock().unwrap()),
                has_next: true,
                extensions: None,
            })
        }));
    }

    /// Schedules a patch that first completes one raw list element.
    pub(crate) fn add_value(
        &self,
        ctx: Arc<ExecutionContext<'a, S>>,
        item_type: TypeType<'a, S>,
        finfo: FieldInfo<'a, S>,
        item_path: Arc<ResponsePath<'a>>,
        label: Option<String>,
        item: SourceValue<S>,
    ) {
        self.enqueue(Box::pin(async move {
            let errors: ErrorSink<S> = Arc::default();
            let completed =
                complete::complete_value(&ctx, &item_type, &finfo, &item_path, &errors, item)
                    .resolve()
                    .await;
            let data = scope_to_patch(completed, &item_type, &errors);
            RacedItem::Patch(ExecutionPatchResult {
                data: Some(data),
                path: item_path.linearize(),
                label,
                errors: mem::take(&mut *errors.lock().unwrap()),
                has_next: true,
                extensions: None,
            })
        }));
    }

    /// Schedules pulling the remainder of an async sequence.
    ///
    /// Each resolved pull enqueues the next one before completing its own
    /// element, keeping the producer one element ahead of delivery; the
    /// pull that finds the sequence exhausted yields [`RacedItem::Done`]
    /// instead of a patch.
    pub(crate) fn add_async_sequence_value(
        &self,
        ctx: Arc<ExecutionContext<'a, S>>,
        index: usize,
        sequence: SourceValueStream<S>,
        item_type: TypeType<'a, S>,
        finfo: FieldInfo<'a, S>,
        list_path: Arc<ResponsePath<'a>>,
        label: Option<String>,
    ) {
        self.enqueue(sequence_pull(
            ctx, index, sequence, item_type, finfo, list_path, label,
        ));
    }

    /// Races the queue: polls every pending payload in order and splices
    /// out the first one that is ready.
    ///
    /// The queue lock is not held while polling, since a payload making
    /// progress may itself enqueue its successor.
    pub(crate) fn poll_next_payload(&self, cx: &mut Context<'_>) -> Poll<Option<RacedItem<S>>> {
        let mut local = mem::take(&mut *self.pending.lock().unwrap());
        if local.is_empty() {
            return Poll::Ready(None);
        }

        let mut result = Poll::Pending;
        for i in 0..local.len() {
            if let Poll::Ready(item) = local[i].as_mut().poll(cx) {
                local.remove(i);
                result = Poll::Ready(Some(item));
                break;
            }
        }

        let mut queue = self.pending.lock().unwrap();
        local.append(&mut queue);
        *queue = local;
        result
    }
}

/// A patch failure never escapes its patch: a bubbled error lands in the
/// patch's own error list and the patch data becomes `null`.
fn scope_to_patch<S: ScalarValue>(
    completed: CompletionResult<S>,
    item_type: &TypeType<'_, S>,
    errors: &ErrorSink<S>,
) -> Value<S> {
    match completed {
        Ok(v) => v,
        Err(e) => match complete::handle_field_error(e, item_type, errors) {
            Ok(v) => v,
            Err(e) => {
                errors.lock().unwrap().push(e);
                Value::Null
            }
        },
    }
}

fn sequence_pull<'a, S: ScalarValue>(
    ctx: Arc<ExecutionContext<'a, S>>,
    index: usize,
    mut sequence: SourceValueStream<S>,
    item_type: TypeType<'a, S>,
    finfo: FieldInfo<'a, S>,
    list_path: Arc<ResponsePath<'a>>,
    label: Option<String>,
) -> BoxFuture<'a, RacedItem<S>> {
    Box::pin(async move {
        let Some(next) = sequence.next().await else {
            return RacedItem::Done;
        };
        ctx.dispatcher.add_async_sequence_value(
            ctx.clone(),
            index + 1,
            sequence,
            item_type.clone(),
            finfo.clone(),
            list_path.clone(),
            label.clone(),
        );

        let item_path = list_path.append_index(index);
        let errors: ErrorSink<S> = Arc::default();
        let completed = match next {
            Ok(item) => {
                complete::complete_value(&ctx, &item_type, &finfo, &item_path, &errors, item)
                    .resolve()
                    .await
            }
            Err(e) => Err(complete::located_error(e, &finfo.field_nodes, &item_path)),
        };
        let data = scope_to_patch(completed, &item_type, &errors);
        RacedItem::Patch(ExecutionPatchResult {
            data: Some(data),
            path: item_path.linearize(),
            label,
            errors: mem::take(&mut *errors.lock().unwrap()),
            has_next: true,
            extensions: None,
        })
    })
}

/// The asynchronous sequence of an incremental response.
///
/// Yields the initial result first (with `hasNext: true`), then each patch
/// as it completes, and, when the last in-flight async sequence signals
/// exhaustion with nothing else pending, one bare terminal
/// `{hasNext: false}` payload.
pub struct ResponseStream<'a, S: ScalarValue = crate::DefaultScalarValue> {
    ctx: Arc<ExecutionContext<'a, S>>,
    initial: Option<ExecutionResult<S>>,
    done: bool,
}

impl<'a, S: ScalarValue> Unpin for ResponseStream<'a, S> {}

impl<'a, S: ScalarValue> ResponseStream<'a, S> {
    pub(crate) fn new(ctx: Arc<ExecutionContext<'a, S>>, initial: ExecutionResult<S>) -> Self {
        Self {
            ctx,
            initial: Some(initial),
            done: false,
        }
    }
}

impl<'a, S: ScalarValue> Stream for ResponseStream<'a, S> {
    type Item = IncrementalResult<S>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }
        if let Some(mut initial) = this.initial.take() {
            initial.has_next = Some(true);
            return Poll::Ready(Some(IncrementalResult::Result(initial)));
        }
        loop {
            match this.ctx.dispatcher.poll_next_payload(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(None) => {
                    this.done = true;
                    return Poll::Ready(None);
                }
                Poll::Ready(Some(RacedItem::Patch(mut patch))) => {
                    patch.has_next = this.ctx.dispatcher.has_pending();
                    return Poll::Ready(Some(IncrementalResult::Patch(patch)));
                }
                Poll::Ready(Some(RacedItem::Done)) => {
                    if !this.ctx.dispatcher.has_pending() {
                        this.done = true;
                        return Poll::Ready(Some(IncrementalResult::Result(ExecutionResult {
                            data: None,
                            errors: vec![],
                            has_next: Some(false),
                            extensions: None,
                        })));
                    }
                    // Other payloads are still in flight; race again.
                }
            }
        }
    }
}
