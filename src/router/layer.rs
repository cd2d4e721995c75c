use super::{
    handler::{Handler, HandlerRef, Next},
    pattern::{MatchMode, Params, Pattern},
    route::Route,
    router::Router,
};
use crate::server::http::{Req, Res};

pub(crate) enum LayerKind {
    Middleware(HandlerRef),
    Router(Router),
    Route(Route),
}

/// One entry of a router's stack.
pub(crate) struct Layer {
    pattern: Pattern,
    kind: LayerKind,
}

impl Layer {
    pub(crate) fn new(path: &str, kind: LayerKind) -> Self {
        Self {
            pattern: Pattern::parse(path),
            kind,
        }
    }

    pub(crate) fn path(&self) -> &str {
        self.pattern.source()
    }

    /// Routes must match the whole path, everything else matches as a prefix.
    pub(crate) fn matches(&self, path: &str) -> Option<Params> {
        let mode = match self.kind {
            LayerKind::Route(_) => MatchMode::Exact,
            _ => MatchMode::Prefix,
        };
        self.pattern.matches(path, mode)
    }

    pub(crate) fn route(&self) -> Option<&Route> {
        match &self.kind {
            LayerKind::Route(route) => Some(route),
            _ => None,
        }
    }

    pub(crate) fn route_mut(&mut self) -> Option<&mut Route> {
        match &mut self.kind {
            LayerKind::Route(route) => Some(route),
            _ => None,
        }
    }

    pub(crate) fn router_mut(&mut self) -> Option<&mut Router> {
        match &mut self.kind {
            LayerKind::Router(router) => Some(router),
            _ => None,
        }
    }

    pub(crate) fn handle(&self, req: &mut Req, res: &mut Res, next: Next<'_>) {
        match &self.kind {
            LayerKind::Middleware(h) => h.handle(req, res, next),
            LayerKind::Router(router) => router.handle(req, res, next),
            LayerKind::Route(route) => route.handle(req, res, next),
        }
    }
}
