use std::{
    cell::{Cell, RefCell},
    sync::Arc,
};

use super::{error::Error, router::Router};
use crate::server::http::{Method, Req, Res};

/// Processes one request, then either hands control onward through `next`
/// or ends the chain by dropping it.
pub trait Handler: Send + Sync {
    fn handle(&self, req: &mut Req, res: &mut Res, next: Next<'_>);
}

impl<F> Handler for F
where
    F: Fn(&mut Req, &mut Res, Next<'_>) + Send + Sync,
{
    fn handle(&self, req: &mut Req, res: &mut Res, next: Next<'_>) {
        self(req, res, next)
    }
}

pub type HandlerRef = Arc<dyn Handler>;

/// Wraps a closure as a shareable handler.
pub fn handler<F>(f: F) -> HandlerRef
where
    F: Fn(&mut Req, &mut Res, Next<'_>) + Send + Sync + 'static,
{
    Arc::new(f)
}

pub(crate) enum Signal {
    Continue,
    Fail(Error),
}

/// One-shot continuation given to every handler.
///
/// `Next` borrows the dispatch state of the current request, so it has to be
/// used (or dropped) before the handler returns. Dropping it unused stops
/// the walk for this request.
pub struct Next<'a> {
    signal: &'a Cell<Option<Signal>>,
    allowed: &'a RefCell<Vec<Method>>,
}

impl<'a> Next<'a> {
    /// Resume the walk at the next layer.
    pub fn proceed(self) {
        self.signal.set(Some(Signal::Continue));
    }

    /// Abort the walk; `err` goes straight to the terminal callback.
    pub fn fail(self, err: impl Into<Error>) {
        self.signal.set(Some(Signal::Fail(err.into())));
    }

    pub fn call(self, err: Option<Error>) {
        match err {
            Some(e) => self.fail(e),
            None => self.proceed(),
        }
    }

    pub(crate) fn allowed(&self) -> &'a RefCell<Vec<Method>> {
        self.allowed
    }
}

/// Runs `step` with a fresh continuation and reports what it did with it.
pub(crate) fn run_step<F>(allowed: &RefCell<Vec<Method>>, step: F) -> Option<Signal>
where
    F: FnOnce(Next<'_>),
{
    let signal = Cell::new(None);
    step(Next {
        signal: &signal,
        allowed,
    });
    signal.into_inner()
}

/// Something `Router::use_handlers` can stack: a plain handler or a whole router.
pub enum Mount {
    Handler(HandlerRef),
    Router(Router),
}

impl From<HandlerRef> for Mount {
    fn from(h: HandlerRef) -> Self {
        Mount::Handler(h)
    }
}

impl From<Router> for Mount {
    fn from(r: Router) -> Self {
        Mount::Router(r)
    }
}
