//! # Line transport
//!
//! The engine consumes the modem output line by line. [LineTransport] is the seam to the
//! physical link, [SerialLines] implements it for any [embedded_io] byte stream.
use alloc::string::String;
use core::fmt::Debug;
use embedded_io::{Read, ReadReady, Write};
use heapless::Vec;

/// Line terminator appended to every transmitted line
pub const LINE_TERMINATOR: &str = "\r\n";

/// Line oriented, non-blocking access to the modem
pub trait LineTransport {
    type Error: Debug;

    /// Appends the line terminator and transmits the line
    fn write_line(&mut self, line: &str) -> Result<(), Self::Error>;

    /// Returns the next complete line without its terminator.
    /// Returns [nb::Error::WouldBlock] if no complete line is buffered yet.
    fn try_read_line(&mut self) -> nb::Result<String, Self::Error>;
}

/// [LineTransport] on top of a serial byte stream
///
/// LINE_SIZE: Max. line length in bytes. Longer lines are delivered in pieces of LINE_SIZE bytes.
pub struct SerialLines<S: Read + ReadReady + Write, const LINE_SIZE: usize> {
    pub(crate) serial: S,

    /// Bytes of the line currently being received
    line: Vec<u8, LINE_SIZE>,
}

impl<S: Read + ReadReady + Write, const LINE_SIZE: usize> SerialLines<S, LINE_SIZE> {
    pub fn new(serial: S) -> Self {
        Self { serial, line: Vec::new() }
    }

    /// Returns the wrapped serial
    pub fn release(self) -> S {
        self.serial
    }

    /// Takes the buffered bytes as line. A trailing carriage return is only stripped if the line is terminated.
    fn take_line(&mut self, terminated: bool) -> String {
        if terminated && self.line.last() == Some(&b'\r') {
            self.line.pop();
        }

        let line = String::from_utf8_lossy(&self.line).into_owned();
        self.line.clear();
        line
    }

    /// The send prompt "> " is not followed by a line terminator
    fn is_prompt(&self) -> bool {
        self.line.as_slice() == b"> "
    }
}

impl<S: Read + ReadReady + Write, const LINE_SIZE: usize> LineTransport for SerialLines<S, LINE_SIZE> {
    type Error = S::Error;

    fn write_line(&mut self, line: &str) -> Result<(), Self::Error> {
        self.serial.write_all(line.as_bytes())?;
        self.serial.write_all(LINE_TERMINATOR.as_bytes())?;
        self.serial.flush()
    }

    fn try_read_line(&mut self) -> nb::Result<String, Self::Error> {
        while self.serial.read_ready()? {
            let mut byte = [0x0; 1];
            if self.serial.read(&mut byte)? == 0 {
                break;
            }

            if byte[0] == b'\n' {
                return Ok(self.take_line(true));
            }

            // Buffer is full, so the pending part is delivered as own line
            if self.line.push(byte[0]).is_err() {
                let line = self.take_line(false);
                let _ = self.line.push(byte[0]);
                return Ok(line);
            }

            if self.is_prompt() {
                self.line.clear();
                return Ok(String::from(">"));
            }
        }

        Err(nb::Error::WouldBlock)
    }
}
