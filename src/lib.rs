//! `crabstack` is a small threaded HTTP server whose requests run through a
//! stack of layered, Express style routers.
//!
//! ```no_run
//! use crabstack::{Server, logger};
//!
//! logger::init_stdout_logger(16, logger::Level::Info).unwrap();
//! let mut server = Server::new(8080, 4).unwrap();
//! server.router()
//!     .use_fn("/", |req, _, next| {
//!         println!("{} {}", req.method(), req.path());
//!         next.proceed();
//!     })
//!     .get_fn("/users/:id", |req, res, _| {
//!         let body = format!("user {}", req.param("id").unwrap_or("?"));
//!         res.respond(body.as_bytes());
//!     });
//! server.start().unwrap();
//! ```

pub mod config;
pub mod logger;
pub mod router;
pub mod server;

pub use {
    config::Config,
    router::{Error, Handler, HandlerRef, Mount, Next, Route, Router},
    server::{Method, Req, Res, Server},
};
