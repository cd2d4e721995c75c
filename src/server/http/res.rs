use std::{
    io,
};

use super::headers::*;

pub struct Res {
    version: String,
    status_code: u16,
    status: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    responded: bool,
}

impl Default for Res {
    fn default() -> Self {
        Res {
            version: String::from("HTTP/1.1"),
            status_code: 200,
            status: String::from("OK"),
            headers: vec![],
            body: vec![],
            responded: false,
        }
    }
}

impl Res {
    pub fn set_status(&mut self, status_code: u16, status: &str) {
        self.status_code = status_code;
        self.status = status.to_string();
    }

    pub fn status(&self) -> &String {
        &self.status
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// Appends a header line; repeated names are all written.
    pub fn add_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }

    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.add_header(name, value);
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn respond(&mut self, body: &[u8]) {
        self.body.clear();
        self.body.extend_from_slice(body);
        self.responded = true;
    }

    pub fn responded(&self) -> bool {
        self.responded
    }

    pub fn write_to(&self, writer: &mut dyn io::Write, head_only: bool) -> io::Result<()> {
        writer.write_all(format!("{} {} {}\r\n", self.version, self.status_code, self.status).as_bytes())?;
        for (key, value) in self.headers.iter() {
            if key.eq_ignore_ascii_case(HTTP_HEADER_CONTENT_LENGTH) {
                continue;
            }
            writer.write_all(format!("{}: {}\r\n", key, value).as_bytes())?;
        }
        writer.write_all(format!("{}: {}\r\n", HTTP_HEADER_CONTENT_LENGTH, self.body.len()).as_bytes())?;
        writer.write_all(format!("{}: close\r\n", HTTP_HEADER_CONNECTION).as_bytes())?;
        writer.write_all(b"\r\n")?;
        if !head_only {
            writer.write_all(&self.body)?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_status_headers_and_body() {
        let mut res = Res::default();
        res.set_status(201, "Created");
        res.add_header("X-Trace", "a");
        res.add_header("X-Trace", "b");
        res.respond(b"done");

        let mut out: Vec<u8> = vec![];
        res.write_to(&mut out, false).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "HTTP/1.1 201 Created\r\nX-Trace: a\r\nX-Trace: b\r\nContent-Length: 4\r\nConnection: close\r\n\r\ndone"
        );
    }

    #[test]
    fn head_only_omits_body() {
        let mut res = Res::default();
        res.respond(b"payload");
        let mut out: Vec<u8> = vec![];
        res.write_to(&mut out, true).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with("Content-Length: 7\r\nConnection: close\r\n\r\n"));
    }

    #[test]
    fn set_header_replaces() {
        let mut res = Res::default();
        res.add_header("content-type", "text/plain");
        res.set_header(HTTP_HEADER_CONTENT_TYPE, "application/json");
        assert_eq!(res.header("Content-Type"), Some("application/json"));
        assert!(!res.responded());
    }
}
