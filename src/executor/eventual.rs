//! Uniform handling of values that may still be pending.

use futures::{FutureExt as _, future, future::BoxFuture};

/// A value of `T` that is either already available or still being computed.
///
/// This is what keeps the engine synchronous when it can be: as long as no
/// resolver returns a future, every combinator below stays on the `Ready`
/// arm and no task is ever allocated or scheduled. A ready value is never
/// wrapped into an already-resolved future.
///
/// Failure travels inside `T` (usually a `Result`), not as a separate
/// rejection channel.
pub enum Eventual<'f, T> {
    /// The value is available now.
    Ready(T),

    /// The value is still being computed.
    Pending(BoxFuture<'f, T>),
}

impl<'f, T: Send + 'f> Eventual<'f, T> {
    /// Wraps the given [`Future`] as a [`Eventual::Pending`] value.
    ///
    /// [`Future`]: std::future::Future
    pub fn pending(fut: impl Future<Output = T> + Send + 'f) -> Self {
        Self::Pending(fut.boxed())
    }

    /// Indicates whether this value is still being computed.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// Applies `f` to this value once it's available.
    ///
    /// A [`Eventual::Ready`] value is transformed in place without touching
    /// any future machinery.
    pub fn map<U: Send + 'f>(self, f: impl FnOnce(T) -> U + Send + 'f) -> Eventual<'f, U> {
        match self {
            Self::Ready(v) => Eventual::Ready(f(v)),
            Self::Pending(fut) => Eventual::Pending(fut.map(f).boxed()),
        }
    }

    /// Awaits this value.
    pub async fn resolve(self) -> T {
        match self {
            Self::Ready(v) => v,
            Self::Pending(fut) => fut.await,
        }
    }

    /// Combines `values` into a single [`Eventual`] of all of them, in
    /// order.
    ///
    /// If no element is pending the result is ready immediately. Otherwise
    /// all pending elements make progress concurrently, and the combined
    /// value preserves the input order regardless of completion order.
    pub fn all(values: Vec<Self>) -> Eventual<'f, Vec<T>> {
        if values.iter().any(Self::is_pending) {
            Eventual::Pending(
                future::join_all(values.into_iter().map(Self::resolve)).boxed(),
            )
        } else {
            Eventual::Ready(
                values
                    .into_iter()
                    .map(|v| match v {
                        Self::Ready(v) => v,
                        Self::Pending(_) => unreachable!("checked by `is_pending` above"),
                    })
                    .collect(),
            )
        }
    }
}

impl<'f, T: Send + 'f> From<T> for Eventual<'f, T> {
    fn from(v: T) -> Self {
        Self::Ready(v)
    }
}
