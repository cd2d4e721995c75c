
use std::{
    io,
    sync::mpsc,
    thread,
};

use log::{Record, Metadata};
pub use log::{
    Log,
    Level,
    SetLoggerError, LevelFilter,
    set_boxed_logger, set_max_level,
};

pub mod micro {
    pub use log::{trace, debug, error, warn, info};
}

/// Formats records on the calling thread and writes them from a dedicated
/// writer thread, so request lines never block on the destination.
pub struct Logger {
    sender: mpsc::SyncSender<Option<String>>,
    writer: Option<thread::JoinHandle<()>>,
    level: Level,
}

impl Logger {
    pub fn new<T: io::Write + Send + 'static>(buf_size: usize, mut destination: T, level: Level) -> Self {
        let (tx, rx) = mpsc::sync_channel::<Option<String>>(buf_size);
        let writer = thread::spawn(move || {
            for msg in rx {
                let line = match msg {
                    Some(line) => line,
                    None => break,
                };
                let written = destination.write_all(line.as_bytes())
                    .and_then(|_| destination.write_all(b"\n"))
                    .and_then(|_| destination.flush());
                if let Err(e) = written {
                    eprintln!("logger error: {}", e);
                }
            }
        });
        Self {
            sender: tx,
            writer: Some(writer),
            level,
        }
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!("[{}] {}: {}", record.level(), record.target(), record.args());
        if let Err(e) = self.sender.send(Some(line)) {
            eprintln!("logger error: {}", e);
        }
    }

    fn flush(&self) {
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        let _ = self.sender.send(None);
        if let Some(writer) = self.writer.take() {
            let _ = writer.join();
        }
    }
}

pub fn init_stdout_logger(msg_buffer_size: usize, level: Level) -> Result<(), SetLoggerError> {
    set_boxed_logger(Box::new(Logger::new(msg_buffer_size, io::stdout(), level))).map(|()|{
        set_max_level(level.to_level_filter());
    })
}
