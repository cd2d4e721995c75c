use super::handler::{handler, run_step, Handler, HandlerRef, Next, Signal};
use crate::server::http::{Method, Req, Res};

/// Per-method handler chains for one path.
pub struct Route {
    path: String,
    methods: Vec<(Method, Vec<HandlerRef>)>,
}

impl Route {
    pub(crate) fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            methods: vec![],
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Appends `handlers` to the chain of `method`. Earlier registrations are kept.
    pub fn register_method(&mut self, method: Method, handlers: impl IntoIterator<Item = HandlerRef>) -> &mut Self {
        let handlers: Vec<HandlerRef> = handlers.into_iter().collect();
        if handlers.is_empty() {
            return self;
        }
        match self.methods.iter_mut().find(|(m, _)| *m == method) {
            Some((_, chain)) => chain.extend(handlers),
            None => self.methods.push((method, handlers)),
        }
        self
    }

    pub fn register_fn<F>(&mut self, method: Method, f: F) -> &mut Self
    where
        F: Fn(&mut Req, &mut Res, Next<'_>) + Send + Sync + 'static,
    {
        self.register_method(method, vec![handler(f)])
    }

    /// Registers the same chain for every method in `Method::ALL`.
    pub fn all(&mut self, handlers: impl IntoIterator<Item = HandlerRef>) -> &mut Self {
        let handlers: Vec<HandlerRef> = handlers.into_iter().collect();
        for method in Method::ALL.iter() {
            self.register_method(*method, handlers.iter().cloned());
        }
        self
    }

    pub fn all_fn<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&mut Req, &mut Res, Next<'_>) + Send + Sync + 'static,
    {
        self.all(vec![handler(f)])
    }

    pub fn get(&mut self, handlers: impl IntoIterator<Item = HandlerRef>) -> &mut Self {
        self.register_method(Method::GET, handlers)
    }

    pub fn post(&mut self, handlers: impl IntoIterator<Item = HandlerRef>) -> &mut Self {
        self.register_method(Method::POST, handlers)
    }

    pub fn put(&mut self, handlers: impl IntoIterator<Item = HandlerRef>) -> &mut Self {
        self.register_method(Method::PUT, handlers)
    }

    pub fn delete(&mut self, handlers: impl IntoIterator<Item = HandlerRef>) -> &mut Self {
        self.register_method(Method::DELETE, handlers)
    }

    pub fn head(&mut self, handlers: impl IntoIterator<Item = HandlerRef>) -> &mut Self {
        self.register_method(Method::HEAD, handlers)
    }

    pub fn get_fn<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&mut Req, &mut Res, Next<'_>) + Send + Sync + 'static,
    {
        self.register_fn(Method::GET, f)
    }

    pub fn post_fn<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&mut Req, &mut Res, Next<'_>) + Send + Sync + 'static,
    {
        self.register_fn(Method::POST, f)
    }

    pub fn put_fn<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&mut Req, &mut Res, Next<'_>) + Send + Sync + 'static,
    {
        self.register_fn(Method::PUT, f)
    }

    pub fn delete_fn<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&mut Req, &mut Res, Next<'_>) + Send + Sync + 'static,
    {
        self.register_fn(Method::DELETE, f)
    }

    pub fn head_fn<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&mut Req, &mut Res, Next<'_>) + Send + Sync + 'static,
    {
        self.register_fn(Method::HEAD, f)
    }

    /// HEAD is handled whenever GET is, even without a HEAD chain of its own.
    /// Only the HEAD chain ever runs though: a route without one runs nothing
    /// and the request falls through to later layers, usually ending in 404.
    pub fn handles_method(&self, method: &Method) -> bool {
        if !self.chain(method).is_empty() {
            return true;
        }
        *method == Method::HEAD && !self.chain(&Method::GET).is_empty()
    }

    /// Methods with a non-empty chain, in first-registration order.
    pub fn options_methods(&self) -> Vec<Method> {
        self.methods.iter()
            .filter(|(_, chain)| !chain.is_empty())
            .map(|(m, _)| *m)
            .collect()
    }

    fn chain(&self, method: &Method) -> &[HandlerRef] {
        self.methods.iter()
            .find(|(m, _)| m == method)
            .map(|(_, chain)| chain.as_slice())
            .unwrap_or(&[])
    }
}

impl Handler for Route {
    fn handle(&self, req: &mut Req, res: &mut Res, next: Next<'_>) {
        let method = *req.method();
        for h in self.chain(&method) {
            match run_step(next.allowed(), |n| h.handle(req, res, n)) {
                Some(Signal::Continue) => continue,
                Some(Signal::Fail(e)) => return next.fail(e),
                None => return,
            }
        }
        next.proceed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn noop() -> HandlerRef {
        handler(|_: &mut Req, _: &mut Res, next: Next<'_>| next.proceed())
    }

    #[test]
    fn head_falls_back_to_get() {
        let mut route = Route::new("/x");
        route.get(vec![noop()]);
        assert!(route.handles_method(&Method::GET));
        assert!(route.handles_method(&Method::HEAD));
        assert!(!route.handles_method(&Method::POST));
        assert_eq!(route.options_methods(), vec![Method::GET]);
    }

    #[test]
    fn registrations_accumulate() {
        let mut route = Route::new("/x");
        route.post_fn(|_, res, next| {
            res.add_header("X-Step", "1");
            next.proceed();
        });
        route.post_fn(|_, res, _| {
            res.add_header("X-Step", "2");
            res.respond(b"done");
        });

        let mut req = Req::from_parts(Method::POST, "/x");
        let mut res = Res::default();
        let allowed = RefCell::new(vec![]);
        let signal = run_step(&allowed, |n| route.handle(&mut req, &mut res, n));
        assert!(signal.is_none());
        assert_eq!(res.body(), b"done");
    }

    #[test]
    fn all_covers_recognized_methods_but_not_options() {
        let mut route = Route::new("/x");
        route.all(vec![noop()]);
        for m in Method::ALL.iter() {
            assert!(route.handles_method(m));
        }
        assert!(!route.handles_method(&Method::OPTIONS));
        assert_eq!(route.options_methods(), Method::ALL.to_vec());
    }

    #[test]
    fn options_methods_keep_registration_order() {
        let mut route = Route::new("/x");
        route.put(vec![noop()]).get(vec![noop()]).put(vec![noop()]);
        route.delete(Vec::<HandlerRef>::new());
        assert_eq!(route.options_methods(), vec![Method::PUT, Method::GET]);
    }

    #[test]
    fn exhausted_chain_continues_outer_walk() {
        let mut route = Route::new("/x");
        route.get(vec![noop(), noop()]);
        let mut req = Req::from_parts(Method::HEAD, "/x");
        let mut res = Res::default();
        let allowed = RefCell::new(vec![]);
        let signal = run_step(&allowed, |n| route.handle(&mut req, &mut res, n));
        assert!(matches!(signal, Some(Signal::Continue)));
    }

    #[test]
    fn chain_error_reaches_outer_continuation() {
        let mut route = Route::new("/x");
        route.get_fn(|_, _, next| next.fail(crate::router::Error::msg("boom")));
        route.get_fn(|_, res, _| res.respond(b"unreachable"));
        let mut req = Req::from_parts(Method::GET, "/x");
        let mut res = Res::default();
        let allowed = RefCell::new(vec![]);
        match run_step(&allowed, |n| route.handle(&mut req, &mut res, n)) {
            Some(Signal::Fail(e)) => assert_eq!(e.to_string(), "boom"),
            _ => panic!("expected failure"),
        }
        assert!(!res.responded());
    }
}
