
use std::{
    io,
    io::{BufRead, Read},
    collections,
};

use super::{method, headers::HTTP_HEADER_CONTENT_LENGTH};
use crate::router::Params;

const MAX_HTTP_LINE_LENGTH: usize = 4096;
const MAX_HTTP_BODY_LENGTH: usize = 8 * 1024 * 1024;

pub struct Req {
    method: method::Method,
    path: String,
    version: String,
    headers: collections::HashMap<String, String>,
    params: collections::HashMap<String, Vec<String>>,
    body: Vec<u8>,
}

impl Req {
    pub fn new(s: &mut impl BufRead) -> io::Result<Self> {
        let mut req = Req::default();
        let first_line = read_until_new_line(s)?;
        let mut iter = first_line.split_whitespace();
        if let Some(mstr) = iter.next() {
            match method::Method::from(mstr) {
                method::Method::UNKNOWN => return Err(io::Error::new(io::ErrorKind::InvalidData, "stream doesn't have valid http method")),
                m => { req.method = m }
            }
        } else {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "stream doesn't have valid http first line"));
        }

        if let Some(target) = iter.next() {
            req.set_target(target);
        }

        if let Some(version) = iter.next() {
            req.version = version.to_string();
        }
        req.parse_headers(s)?;
        req.read_body(s)?;

        Ok(req)
    }

    /// Builds a request without a stream, e.g. `Req::from_parts(Method::GET, "/users/42?x=1")`.
    pub fn from_parts(method: method::Method, target: &str) -> Self {
        let mut req = Req::default();
        req.method = method;
        req.set_target(target);
        req
    }

    fn set_target(&mut self, target: &str) {
        let (path, query) = match target.find('?') {
            Some(idx) => (&target[..idx], &target[idx + 1..]),
            None => (target, ""),
        };
        self.path = normalize_path(path);
        self.parse_query(query);
    }

    fn parse_query(&mut self, query: &str) {
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let mut kv = pair.splitn(2, '=');
            let k = decode_component(kv.next().unwrap_or(""));
            let v = decode_component(kv.next().unwrap_or(""));
            self.add_param(k, v);
        }
    }

    fn parse_headers(&mut self, stream: &mut impl BufRead) -> io::Result<()> {
        loop {
            let line = read_until_new_line(stream)?;
            if line.is_empty() {
                return Ok(());
            }
            let (k, v) = split_header_line(line);
            self.headers.insert(k, v);
        }
    }

    fn read_body(&mut self, stream: &mut impl BufRead) -> io::Result<()> {
        let len = match self.header(HTTP_HEADER_CONTENT_LENGTH) {
            Some(v) => v.parse::<usize>().map_err(|e| {
                io::Error::new(io::ErrorKind::InvalidData, format!("invalid Content-Length: {}", e))
            })?,
            None => return Ok(()),
        };
        if len > MAX_HTTP_BODY_LENGTH {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Content-Length {} exceeds maximum({})", len, MAX_HTTP_BODY_LENGTH),
            ));
        }
        self.body = vec![0u8; len];
        stream.read_exact(&mut self.body)
    }

    pub fn method(&self) -> &method::Method {
        &self.method
    }

    pub fn path(&self) -> &String {
        &self.path
    }

    pub fn version(&self) -> &String {
        &self.version
    }

    pub fn header(&self, name: &str) -> Option<&String> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// First value stored under `name`, query string values before captured path values.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).and_then(|v| v.first()).map(|s| s.as_str())
    }

    pub fn params(&self, name: &str) -> &[String] {
        self.params.get(name).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn add_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.params.entry(name.into()).or_default().push(value.into());
    }

    /// Appends captured path parameters; existing values under the same name are kept.
    pub fn merge_params(&mut self, captured: Params) {
        for (name, value) in captured {
            self.add_param(name, value);
        }
    }
}

impl Default for Req {
    fn default()->Self {
        Self {
            method: method::Method::GET,
            path: "/".to_string(),
            version: "HTTP/1.1".to_string(),
            headers: collections::HashMap::default(),
            params: collections::HashMap::default(),
            body: vec![],
        }
    }
}

fn read_until_new_line(s: &mut impl BufRead) -> io::Result<String> {
    let mut res = String::with_capacity(256);
    let read = s.by_ref().take(MAX_HTTP_LINE_LENGTH as u64 + 2).read_line(&mut res)?;
    if read == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stream closed before end of http head"));
    }
    if !res.ends_with('\n') {
        return Err(io::Error::new(
            io::ErrorKind::Other,
            format!("HTTP header line length exceed maximum({})", MAX_HTTP_LINE_LENGTH),
        ));
    }
    let trimmed = res.trim_end_matches(|c: char| c == '\r' || c == '\n').len();
    res.truncate(trimmed);
    Ok(res)
}

fn split_header_line(line: String) -> (String, String) {
    let mut k = String::new();
    let mut v = String::new();
    for (i, x) in line.splitn(2, ':').enumerate() {
        if i == 0 { k = String::from(x.trim()); }
        else { v = String::from(x.trim()); }
    }
    (k,v)
}

/// Percent-decodes the path and collapses runs of `/`, so prefix stripping
/// and segment matching see the same path.
fn normalize_path(raw: &str) -> String {
    let decoded = match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw.to_string(),
    };
    let mut path = String::with_capacity(decoded.len());
    for c in decoded.chars() {
        if c == '/' && path.ends_with('/') {
            continue;
        }
        path.push(c);
    }
    path
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}
