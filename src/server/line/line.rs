
use std::{
    net,
    sync::mpsc,
    thread,
    time,
    io,
    fmt,
};

use crate::logger::micro::*;

const LINE_STREAM_TIMEOUT_SECS: u64 = 10;
const SYNC_CHANNEL_BUFFER_SIZE: usize = 2;

#[derive(Debug, PartialEq)]
pub enum SendError {
    LineBusy,
    Disconnected,
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SendError::LineBusy => write!(f, "SendError::LineBusy"),
            SendError::Disconnected => write!(f, "SendError::Disconnected"),
        }
    }
}

/// A worker thread fed through a small bounded queue of streams.
pub struct Line {
    s: mpsc::SyncSender<Option<net::TcpStream>>,
}

impl Line {
    pub fn new(mut stream_handler: impl FnMut(net::TcpStream) -> io::Result<()> + Send + 'static) -> Self {
        let (s, r) = mpsc::sync_channel::<Option<net::TcpStream>>(SYNC_CHANNEL_BUFFER_SIZE);
        thread::spawn(move || {
            for stream in r {
                let st = match stream {
                    Some(st) => st,
                    None => break,
                };
                let t = Some(time::Duration::from_secs(LINE_STREAM_TIMEOUT_SECS));
                if let Err(e) = st.set_read_timeout(t).and_then(|_| st.set_write_timeout(t)) {
                    warn!("failed to set stream timeouts: {}", e);
                }
                if let Err(e) = stream_handler(st) {
                    warn!("stream handling failed: {}", e);
                }
            }
        });
        Self {
            s,
        }
    }

    pub fn send(&mut self, stream: net::TcpStream) -> Result<(), (net::TcpStream, SendError)> {
        self.s.try_send(Some(stream)).map_err(|e| {
            match e {
                mpsc::TrySendError::Full(Some(s)) => (s, SendError::LineBusy),
                mpsc::TrySendError::Disconnected(Some(s)) => (s, SendError::Disconnected),
                mpsc::TrySendError::Full(None) | mpsc::TrySendError::Disconnected(None) => {
                    unreachable!("only Some(stream) is sent through send")
                }
            }
        })
    }
}

impl Drop for Line {
    fn drop(&mut self) {
        self.s.send(None).unwrap_or_else(|e|{
            error!("Failed to drop a processing line. {}", e)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        io::{Read, Write},
        net::{TcpListener, TcpStream},
    };

    fn local_server() -> io::Result<(TcpListener, u16)> {
        let server = TcpListener::bind("127.0.0.1:0")?;
        let port = server.local_addr()?.port();
        Ok((server, port))
    }

    #[test]
    fn handler_can_mutate_environment() -> io::Result<()> {
        let (server, server_port) = local_server()?;

        let (done_tx, done_rx) = mpsc::channel::<Vec<u8>>();
        let mut l = Line::new(move |mut stream: net::TcpStream| {
            let mut tempbuf = [0u8;3];
            stream.read_exact(&mut tempbuf)?;
            done_tx.send(tempbuf.to_vec()).unwrap();
            Ok(())
        });

        let mut client1 = TcpStream::connect(("127.0.0.1", server_port))?;
        let (conn1, _) = server.accept()?;
        l.send(conn1).map_err(|(_, e)| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
        client1.write_all(b"abc")?;
        let got = done_rx.recv_timeout(time::Duration::from_secs(5)).unwrap();
        assert_eq!(got.as_slice(), b"abc");

        Ok(())
    }

    #[test]
    fn receive_busy_while_processing_stream() {
        let (server, server_port) = local_server().unwrap();

        let (started_tx, started_rx) = mpsc::channel::<()>();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let mut l = Line::new(move |_| {
            started_tx.send(()).unwrap();
            let _ = release_rx.recv();
            Ok(())
        });

        let mut conns = vec![];
        let mut clients = vec![];
        for _ in 0..4 {
            clients.push(TcpStream::connect(("127.0.0.1", server_port)).unwrap());
            conns.push(server.accept().unwrap().0);
        }
        let mut conns = conns.into_iter();

        // first stream is taken off the queue by the worker, which then blocks
        assert!(l.send(conns.next().unwrap()).is_ok());
        started_rx.recv_timeout(time::Duration::from_secs(5)).unwrap();
        // two more fit in the queue
        assert!(l.send(conns.next().unwrap()).is_ok());
        assert!(l.send(conns.next().unwrap()).is_ok());
        assert_eq!(l.send(conns.next().unwrap()).map_err(|(_, e)| e), Err(SendError::LineBusy));

        for _ in 0..3 {
            release_tx.send(()).unwrap();
        }
    }
}
