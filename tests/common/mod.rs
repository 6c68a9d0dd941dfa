#![allow(dead_code)]

use std::collections::VecDeque;

use embassy_futures::yield_now;
use embedded_io::{ErrorKind, ErrorType, ReadReady};

/// Scripted stand-in for a UART.
///
/// Every flush (the end of a command) releases the next scripted reply into
/// the receive buffer. An empty receive buffer behaves like a port whose
/// per-read timeout expired: blocking reads fail with `TimedOut`, async reads
/// never complete.
#[derive(Debug, Default)]
pub struct MockSerial {
    pub written: Vec<u8>,
    incoming: VecDeque<u8>,
    replies: VecDeque<Vec<u8>>,
    stall: Option<std::time::Duration>,
}

impl MockSerial {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues bytes released by the next command.
    pub fn reply(mut self, bytes: &[u8]) -> Self {
        self.replies.push_back(bytes.to_vec());
        self
    }

    /// Bytes already waiting in the receive buffer before any command.
    pub fn pending(mut self, bytes: &[u8]) -> Self {
        self.incoming.extend(bytes);
        self
    }

    /// Makes a blocking read on an empty buffer hang for `duration` before
    /// giving up, like a port without a read timeout.
    pub fn stalling(mut self, duration: std::time::Duration) -> Self {
        self.stall = Some(duration);
        self
    }

    pub fn unread(&self) -> usize {
        self.incoming.len()
    }
}

/// Builds a frame the way the module would send it.
pub fn frame(command: u8, address: u8, data: &[u8]) -> Vec<u8> {
    egismos_nostd_rs::build_frame(command, address, data)
        .unwrap()
        .as_bytes()
        .to_vec()
}

impl ErrorType for MockSerial {
    type Error = ErrorKind;
}

impl ReadReady for MockSerial {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.incoming.is_empty())
    }
}

impl embedded_io::Read for MockSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.incoming.is_empty() {
            if let Some(stall) = self.stall {
                std::thread::sleep(stall);
            }
            return Err(ErrorKind::TimedOut);
        }
        let n = buf.len().min(self.incoming.len());
        for (slot, byte) in buf.iter_mut().zip(self.incoming.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl embedded_io::Write for MockSerial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        if let Some(reply) = self.replies.pop_front() {
            self.incoming.extend(reply);
        }
        Ok(())
    }
}

impl embedded_io_async::Read for MockSerial {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        // Suspend once per read like a real UART waiting on its interrupt
        yield_now().await;
        if self.incoming.is_empty() {
            core::future::pending::<()>().await;
        }
        embedded_io::Read::read(self, buf)
    }
}

impl embedded_io_async::Write for MockSerial {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        embedded_io::Write::write(self, buf)
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        embedded_io::Write::flush(self)
    }
}
