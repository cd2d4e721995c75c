use std::{error, fmt, io};

use thiserror::Error;

pub type BoxError = Box<dyn error::Error + Send + Sync>;

/// Failure handed to a continuation, or raised by the router itself.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Handler(BoxError),
    #[error("failed to encode allowed methods: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    pub fn handler(err: impl Into<BoxError>) -> Self {
        Error::Handler(err.into())
    }

    pub fn msg(msg: impl fmt::Display) -> Self {
        Error::Handler(msg.to_string().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_user_errors() {
        let parse_err = "forty-two".parse::<u32>().unwrap_err();
        let err = Error::handler(parse_err);
        assert!(matches!(err, Error::Handler(_)));
        assert_eq!(err.to_string(), "invalid digit found in string");

        let err: Error = io::Error::new(io::ErrorKind::Other, "disk gone").into();
        assert_eq!(err.to_string(), "disk gone");
    }
}
