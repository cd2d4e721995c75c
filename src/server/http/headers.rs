
#![allow(dead_code)]

pub const HTTP_HEADER_CONTENT_LENGTH: &str = "Content-Length";
pub const HTTP_HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const HTTP_HEADER_HOST: &str = "Host";
pub const HTTP_HEADER_CONNECTION: &str = "Connection";
pub const HTTP_HEADER_ALLOW: &str = "Allow";
