//! Layered request dispatch.
//!
//! A [`Router`] walks its stack of layers in registration order. Every layer
//! whose pattern matches the request path (and, for routes, whose method
//! table accepts the request method) gets the request together with a
//! [`Next`] continuation. Calling it resumes the walk; failing it jumps to
//! the terminal callback; dropping it ends the request.

mod error;
mod handler;
mod layer;
mod pattern;
mod route;
mod router;

pub use {
    error::{BoxError, Error},
    handler::{handler, Handler, HandlerRef, Mount, Next},
    pattern::{MatchMode, Params, Pattern},
    route::Route,
    router::Router,
};
