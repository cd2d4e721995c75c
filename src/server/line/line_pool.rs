use {
    std::{net, io, sync::Arc},
    super::*,
    super::super::http,
    crate::{logger::micro::*, router::Router},
};

/// Spreads accepted streams over at most `max_line` worker lines, each
/// serving requests through the same frozen router.
pub struct LinePool {
    lines: Vec<Line>,
    max_line: usize,
    router: Arc<Router>,
}

impl LinePool {
    pub fn new(max_line: usize, router: Arc<Router>) -> Self {
        LinePool {
            lines: vec![],
            max_line,
            router,
        }
    }

    pub fn handle(&mut self, mut s: net::TcpStream) {
        let mut idx = 0;
        while idx < self.lines.len() {
            match self.lines[idx].send(s) {
                Ok(_) => return,
                Err((s_back, SendError::LineBusy)) => {
                    s = s_back;
                    idx += 1;
                },
                Err((s_back, SendError::Disconnected)) => {
                    self.lines.remove(idx);
                    debug!("line#{} removed due to disconnection", idx);
                    s = s_back;
                },
            }
        }
        if self.lines.len() < self.max_line {
            let idx = self.add_new_line();
            if let Err((s_back, e)) = self.lines[idx].send(s) {
                error!("fresh line#{} refused stream: {}", idx, e);
                reject(s_back);
            }
            return;
        }
        warn!("out of capacity to handle incoming TCP stream");
        reject(s);
    }

    fn add_new_line(&mut self) -> usize {
        self.lines.push(Line::new(stream_handler(self.router.clone())));
        debug!("new line added. line count:{}", self.lines.len());
        self.lines.len() - 1
    }
}

fn stream_handler(router: Arc<Router>) -> impl FnMut(net::TcpStream) -> io::Result<()> + Send + 'static {
    move |s: net::TcpStream| {
        let mut buf_read = io::BufReader::new(&s);
        let mut res = http::Res::default();
        let mut req = match http::Req::new(&mut buf_read) {
            Ok(req) => req,
            Err(e) => {
                res.set_status(400, "Bad Request");
                res.respond(b"Bad Request");
                res.write_to(&mut io::BufWriter::new(&s), false)?;
                s.shutdown(net::Shutdown::Both)?;
                return Err(e);
            }
        };
        info!("{} {}", req.method(), req.path());
        router.serve(&mut req, &mut res);
        if !res.responded() {
            res.set_status(500, "Empty Response");
            res.respond(b"Empty Response");
        }
        res.write_to(&mut io::BufWriter::new(&s), *req.method() == http::Method::HEAD)?;
        s.shutdown(net::Shutdown::Both)?;

        Ok(())
    }
}

fn reject(s: net::TcpStream) {
    let mut res = http::Res::default();
    res.set_status(503, "Service Unavailable");
    res.respond(b"Service Unavailable");
    let written = res.write_to(&mut io::BufWriter::new(&s), false)
        .and_then(|_| s.shutdown(net::Shutdown::Both));
    if let Err(e) = written {
        error!("failed to shut down over capacity TCP stream: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        io::{Read, Write},
        net::{TcpListener, TcpStream},
    };

    fn round_trip(pool: &mut LinePool, raw: &str) -> String {
        let server = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = server.local_addr().unwrap();
        let mut client = TcpStream::connect(addr).unwrap();
        client.write_all(raw.as_bytes()).unwrap();
        let (conn, _) = server.accept().unwrap();
        pool.handle(conn);
        let mut out = String::new();
        client.read_to_string(&mut out).unwrap();
        out
    }

    fn test_router() -> Arc<Router> {
        let mut router = Router::new();
        router.get_fn("/hello/:name", |req, res, _| {
            let body = format!("Hello {}", req.param("name").unwrap_or(""));
            res.respond(body.as_bytes());
        });
        router.get_fn("/silent", |_, _, _| {});
        Arc::new(router)
    }

    #[test]
    fn serves_matched_route() {
        let mut pool = LinePool::new(2, test_router());
        let out = round_trip(&mut pool, "GET /hello/crab HTTP/1.1\r\nHost: localhost\r\n\r\n");
        assert!(out.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(out.ends_with("\r\n\r\nHello crab"));
    }

    #[test]
    fn head_response_has_no_body() {
        let mut router = Router::new();
        router.head_fn("/doc", |_, res, _| res.respond(b"body"));
        let mut pool = LinePool::new(1, Arc::new(router));
        let out = round_trip(&mut pool, "HEAD /doc HTTP/1.1\r\n\r\n");
        assert!(out.contains("Content-Length: 4\r\n"));
        assert!(out.ends_with("\r\n\r\n"));
    }

    #[test]
    fn unmatched_path_is_not_found() {
        let mut pool = LinePool::new(2, test_router());
        let out = round_trip(&mut pool, "GET /nope HTTP/1.1\r\n\r\n");
        assert!(out.starts_with("HTTP/1.1 404 Not Found\r\n"));
    }

    #[test]
    fn silent_chain_is_empty_response() {
        let mut pool = LinePool::new(2, test_router());
        let out = round_trip(&mut pool, "GET /silent HTTP/1.1\r\n\r\n");
        assert!(out.starts_with("HTTP/1.1 500 Empty Response\r\n"));
    }

    #[test]
    fn bad_request_line_is_rejected() {
        let mut pool = LinePool::new(2, test_router());
        let out = round_trip(&mut pool, "BREW /pot HTTP/1.1\r\n\r\n");
        assert!(out.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    }

    #[test]
    fn full_pool_sheds_load() {
        let mut pool = LinePool::new(0, test_router());
        let out = round_trip(&mut pool, "GET /hello/crab HTTP/1.1\r\n\r\n");
        assert!(out.starts_with("HTTP/1.1 503 Service Unavailable\r\n"));
    }
}
