use {
    crate::{config::Config, logger::micro::*, router::Router},
    std::{
        io, mem, net,
        sync::{Arc, atomic::{AtomicBool, Ordering}},
    },
    super::line,
};

pub struct Server {
    listener: net::TcpListener,
    stop: Arc<AtomicBool>,
    max_line: usize,
    router: Router,
}

impl Server {
    pub fn new(port: u16, max_line: usize) -> io::Result<Self> {
        let addr = format!("127.0.0.1:{}", port);
        let listener = net::TcpListener::bind(&addr)?;
        info!("server created @ {}", listener.local_addr()?);
        Ok(Server{
            listener,
            stop: Arc::new(AtomicBool::new(false)),
            max_line,
            router: Router::new(),
        })
    }

    pub fn from_config(config: &Config) -> io::Result<Self> {
        Self::new(config.port, config.max_lines)
    }

    pub fn local_addr(&self) -> io::Result<net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Root router. Everything must be registered before `start`.
    pub fn router(&mut self) -> &mut Router {
        &mut self.router
    }

    /// Setting the flag stops the accept loop after the next connection.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    pub fn start(&mut self) -> io::Result<()> {
        let router = Arc::new(mem::take(&mut self.router));
        info!("server start listening with {} root layers", router.len());
        let mut pool = line::LinePool::new(self.max_line, router);
        while !self.stop.load(Ordering::SeqCst) {
            let (stream, addr) = self.listener.accept()?;
            trace!("incoming connection from {}", addr);
            pool.handle(stream);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        io::{Read, Write},
        thread,
    };

    fn request(addr: net::SocketAddr, raw: &str) -> String {
        let mut client = net::TcpStream::connect(addr).unwrap();
        client.write_all(raw.as_bytes()).unwrap();
        let mut out = String::new();
        client.read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn serves_registered_router() {
        let mut s = Server::new(0, 2).unwrap();
        let addr = s.local_addr().unwrap();
        s.router()
            .use_fn("/", |_, res, next| {
                res.add_header("X-Served-By", "crabstack");
                next.proceed();
            })
            .get_fn("/hello", |_, res, _| res.respond(b"Hello"));
        let stop = s.stop_handle();
        thread::spawn(move || s.start());

        let out = request(addr, "GET /hello HTTP/1.1\r\nHost: localhost\r\n\r\n");
        assert!(out.contains("X-Served-By: crabstack\r\n"));
        assert!(out.ends_with("Hello"));

        let out = request(addr, "OPTIONS /hello HTTP/1.1\r\n\r\n");
        assert!(out.contains("Allow: GET\r\n"));

        stop.store(true, Ordering::SeqCst);
        let out = request(addr, "GET /missing HTTP/1.1\r\n\r\n");
        assert!(out.starts_with("HTTP/1.1 404 Not Found"));
    }
}
