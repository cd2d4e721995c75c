//! Path patterns such as `/users/:id/posts/:post`.
//!
//! Patterns and paths are compared segment by segment, `/` being the only
//! delimiter. Empty segments are ignored, so `/users/` and `/users` are the
//! same path. A segment starting with `:` captures the path segment at the
//! same position under that name.

use std::vec;

const PARAM_MARKER: char = ':';

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// How much of a path a pattern has to consume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchMode {
    /// Pattern segments must cover a leading run of path segments. Used for middleware and mounted routers.
    Prefix,
    /// Pattern segments must cover the whole path. Used for routes.
    Exact,
}

#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    segments: Vec<Segment>,
}

impl Pattern {
    pub fn parse(source: &str) -> Self {
        let segments = split_segments(source)
            .map(|s| {
                let name = s.strip_prefix(PARAM_MARKER).unwrap_or("");
                if name.is_empty() {
                    Segment::Literal(s.to_string())
                } else {
                    Segment::Param(name.to_string())
                }
            })
            .collect();
        Self {
            source: source.to_string(),
            segments,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the captured parameters when `path` matches, `None` otherwise.
    pub fn matches(&self, path: &str, mode: MatchMode) -> Option<Params> {
        let mut params = Params::default();
        let mut parts = split_segments(path);
        for segment in &self.segments {
            let part = parts.next()?;
            match segment {
                Segment::Literal(literal) => {
                    if literal != part {
                        return None;
                    }
                }
                Segment::Param(name) => params.push(name.as_str(), part),
            }
        }
        match mode {
            MatchMode::Prefix => Some(params),
            MatchMode::Exact if parts.next().is_none() => Some(params),
            MatchMode::Exact => None,
        }
    }
}

fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Named values captured by one match, in pattern order. A name used twice keeps both values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    pairs: Vec<(String, String)>,
}

impl Params {
    pub fn push(&mut self, name: &str, value: &str) {
        self.pairs.push((name.to_string(), value.to_string()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs.iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.pairs.iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl IntoIterator for Params {
    type Item = (String, String);
    type IntoIter = vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.into_iter()
    }
}
