use std::cell::RefCell;

use super::{
    error::Error,
    handler::{handler, run_step, Handler, HandlerRef, Mount, Next, Signal},
    layer::{Layer, LayerKind},
    route::Route,
};
use crate::{
    logger::micro::*,
    server::http::{headers::*, Method, Req, Res},
};

/// An ordered stack of layers. Insertion order is dispatch order.
///
/// Registration takes `&mut self`, so a router shared between threads is
/// frozen: build it completely, then wrap it in an `Arc`.
#[derive(Default)]
pub struct Router {
    stack: Vec<Layer>,
    prefix: String,
}

/// How a walk over one router ended.
enum Exit {
    /// No layer left that matches; the caller decides what happens next.
    Exhausted,
    Failed(Error),
    /// A handler dropped its continuation.
    Stopped,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefix trimmed off request paths before this router's layers see them.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Stacks one layer per handler under `path` (`/` when empty). Layers
    /// added here run for every method.
    pub fn use_handlers(&mut self, path: &str, handlers: impl IntoIterator<Item = Mount>) -> &mut Self {
        let path = if path.is_empty() { "/" } else { path };
        for h in handlers {
            let kind = match h {
                Mount::Handler(h) => LayerKind::Middleware(h),
                Mount::Router(mut router) => {
                    router.rebase(join_prefix(&self.prefix, path));
                    LayerKind::Router(router)
                }
            };
            self.stack.push(Layer::new(path, kind));
        }
        self
    }

    pub fn use_fn<F>(&mut self, path: &str, f: F) -> &mut Self
    where
        F: Fn(&mut Req, &mut Res, Next<'_>) + Send + Sync + 'static,
    {
        self.use_handlers(path, vec![Mount::Handler(handler(f))])
    }

    pub fn use_router(&mut self, path: &str, router: Router) -> &mut Self {
        self.use_handlers(path, vec![Mount::Router(router)])
    }

    /// Appends a new route layer. Routes are never merged: calling this twice
    /// with the same path stacks two independent routes.
    pub fn route(&mut self, path: &str) -> &mut Route {
        self.stack.push(Layer::new(path, LayerKind::Route(Route::new(path))));
        match self.stack.last_mut().and_then(Layer::route_mut) {
            Some(route) => route,
            None => unreachable!("last layer was pushed as a route"),
        }
    }

    pub fn all(&mut self, path: &str, handlers: impl IntoIterator<Item = HandlerRef>) -> &mut Self {
        self.route(path).all(handlers);
        self
    }

    pub fn all_fn<F>(&mut self, path: &str, f: F) -> &mut Self
    where
        F: Fn(&mut Req, &mut Res, Next<'_>) + Send + Sync + 'static,
    {
        self.route(path).all_fn(f);
        self
    }

    pub fn add_handlers(&mut self, method: Method, path: &str, handlers: impl IntoIterator<Item = HandlerRef>) -> &mut Self {
        self.route(path).register_method(method, handlers);
        self
    }

    pub fn get(&mut self, path: &str, handlers: impl IntoIterator<Item = HandlerRef>) -> &mut Self {
        self.add_handlers(Method::GET, path, handlers)
    }

    pub fn post(&mut self, path: &str, handlers: impl IntoIterator<Item = HandlerRef>) -> &mut Self {
        self.add_handlers(Method::POST, path, handlers)
    }

    pub fn put(&mut self, path: &str, handlers: impl IntoIterator<Item = HandlerRef>) -> &mut Self {
        self.add_handlers(Method::PUT, path, handlers)
    }

    pub fn delete(&mut self, path: &str, handlers: impl IntoIterator<Item = HandlerRef>) -> &mut Self {
        self.add_handlers(Method::DELETE, path, handlers)
    }

    pub fn head(&mut self, path: &str, handlers: impl IntoIterator<Item = HandlerRef>) -> &mut Self {
        self.add_handlers(Method::HEAD, path, handlers)
    }

    pub fn get_fn<F>(&mut self, path: &str, f: F) -> &mut Self
    where
        F: Fn(&mut Req, &mut Res, Next<'_>) + Send + Sync + 'static,
    {
        self.get(path, vec![handler(f)])
    }

    pub fn post_fn<F>(&mut self, path: &str, f: F) -> &mut Self
    where
        F: Fn(&mut Req, &mut Res, Next<'_>) + Send + Sync + 'static,
    {
        self.post(path, vec![handler(f)])
    }

    pub fn put_fn<F>(&mut self, path: &str, f: F) -> &mut Self
    where
        F: Fn(&mut Req, &mut Res, Next<'_>) + Send + Sync + 'static,
    {
        self.put(path, vec![handler(f)])
    }

    pub fn delete_fn<F>(&mut self, path: &str, f: F) -> &mut Self
    where
        F: Fn(&mut Req, &mut Res, Next<'_>) + Send + Sync + 'static,
    {
        self.delete(path, vec![handler(f)])
    }

    pub fn head_fn<F>(&mut self, path: &str, f: F) -> &mut Self
    where
        F: Fn(&mut Req, &mut Res, Next<'_>) + Send + Sync + 'static,
    {
        self.head(path, vec![handler(f)])
    }

    /// Runs the request through the stack. `done` is called once, unless a
    /// handler ends the chain itself: with the handler error if one failed,
    /// with `None` if nothing matched.
    ///
    /// An `OPTIONS` request that matched routes without an `OPTIONS` chain
    /// is answered here with an `Allow` header instead of reaching `done`.
    pub fn dispatch<D>(&self, req: &mut Req, res: &mut Res, done: D)
    where
        D: FnOnce(&mut Req, &mut Res, Option<Error>),
    {
        let allowed = RefCell::new(vec![]);
        let err = match self.walk(req, res, &allowed) {
            Exit::Stopped => return,
            Exit::Exhausted => None,
            Exit::Failed(e) => {
                warn!("{} {} failed: {}", req.method(), req.path(), e);
                Some(e)
            }
        };

        let allowed = allowed.into_inner();
        if err.is_none() && *req.method() == Method::OPTIONS && !allowed.is_empty() {
            match respond_options(res, &allowed) {
                Ok(()) => debug!("OPTIONS {} answered with {:?}", req.path(), allowed),
                Err(e) => done(req, res, Some(e)),
            }
            return;
        }
        done(req, res, err)
    }

    /// Dispatch with the default outcome: 500 on error, 404 when nothing matched.
    pub fn serve(&self, req: &mut Req, res: &mut Res) {
        self.dispatch(req, res, default_done)
    }

    fn walk(&self, req: &mut Req, res: &mut Res, allowed: &RefCell<Vec<Method>>) -> Exit {
        let mut idx = 0;
        loop {
            let path = match self.strip_prefix(req.path()) {
                Some(p) => p.to_string(),
                None => return Exit::Exhausted,
            };
            let method = *req.method();

            let mut found = None;
            while idx < self.stack.len() {
                let layer = &self.stack[idx];
                idx += 1;
                let params = match layer.matches(&path) {
                    Some(p) => p,
                    None => continue,
                };
                if let Some(route) = layer.route() {
                    let handles = route.handles_method(&method);
                    if !handles && method == Method::OPTIONS {
                        allowed.borrow_mut().extend(route.options_methods());
                    }
                    if !handles && method != Method::HEAD {
                        continue;
                    }
                }
                found = Some((layer, params));
                break;
            }

            let (layer, params) = match found {
                Some(f) => f,
                None => return Exit::Exhausted,
            };
            trace!("{} {} -> layer #{} `{}`", method, path, idx - 1, layer.path());
            req.merge_params(params);

            match run_step(allowed, |next| layer.handle(req, res, next)) {
                Some(Signal::Continue) => continue,
                Some(Signal::Fail(e)) => return Exit::Failed(e),
                None => return Exit::Stopped,
            }
        }
    }

    /// Path as seen by this router's layers, or `None` when it lies outside the mount prefix.
    fn strip_prefix<'p>(&self, path: &'p str) -> Option<&'p str> {
        let rest = path.strip_prefix(self.prefix.as_str())?;
        if rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }

    /// Sets the mount prefix and re-roots every router nested below this one.
    fn rebase(&mut self, prefix: String) {
        self.prefix = prefix;
        for layer in self.stack.iter_mut() {
            let child_prefix = join_prefix(&self.prefix, layer.path());
            if let Some(child) = layer.router_mut() {
                child.rebase(child_prefix);
            }
        }
    }
}

impl Handler for Router {
    fn handle(&self, req: &mut Req, res: &mut Res, next: Next<'_>) {
        match self.walk(req, res, next.allowed()) {
            Exit::Exhausted => next.proceed(),
            Exit::Failed(e) => next.fail(e),
            Exit::Stopped => {}
        }
    }
}

fn join_prefix(parent: &str, path: &str) -> String {
    let mut joined = String::from(parent);
    if !path.starts_with('/') {
        joined.push('/');
    }
    joined.push_str(path);
    let trimmed = joined.trim_end_matches('/').len();
    joined.truncate(trimmed);
    joined
}

fn respond_options(res: &mut Res, allowed: &[Method]) -> Result<(), Error> {
    let names: Vec<&str> = allowed.iter().map(Method::as_str).collect();
    let body = serde_json::to_vec(&names)?;
    res.add_header(HTTP_HEADER_ALLOW, &names.join(","));
    res.set_header(HTTP_HEADER_CONTENT_TYPE, "application/json");
    res.respond(&body);
    Ok(())
}

fn default_done(req: &mut Req, res: &mut Res, err: Option<Error>) {
    match err {
        Some(e) => {
            error!("{} {}: {}", req.method(), req.path(), e);
            res.set_status(500, "Internal Server Error");
            res.respond(b"Something wrong");
        }
        None => {
            res.set_status(404, "Not Found");
            res.respond(b"Not Found");
        }
    }
}
