pub mod http;
pub mod line;
mod server;

pub use {
    server::Server,
    http::{Req, Res, Method},
};
