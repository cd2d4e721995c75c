pub mod req;
pub mod res;
pub mod method;
pub mod headers;

pub use {
    req::Req,
    res::Res,
    method::Method,
};
