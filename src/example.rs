//! Mocks for doc examples
use crate::transport::LineTransport;
use alloc::collections::VecDeque;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::convert::Infallible;
use fugit::{TimerDurationU32, TimerInstantU32};
use fugit_timer::Timer;

/// Polls of `wait()` until a started example timer expires
const EXAMPLE_TIMER_POLLS: u32 = 16;

/// Transport mock, answering like an ESP8266 in soft access point mode
#[derive(Default)]
pub struct ExampleTransport {
    /// Lines ready to be read
    lines: VecDeque<String>,

    /// All transmitted lines
    written: Vec<String>,
}

impl ExampleTransport {
    /// Simulates lines which were sent by the modem on its own
    pub fn add_unsolicited(&mut self, lines: &[&str]) {
        self.lines.extend(lines.iter().map(|line| String::from(*line)));
    }

    /// Returns all transmitted lines
    pub fn written(&self) -> &[String] {
        &self.written
    }

    fn respond(&mut self, lines: &[&str]) {
        self.add_unsolicited(lines);
    }
}

impl LineTransport for ExampleTransport {
    type Error = Infallible;

    fn write_line(&mut self, line: &str) -> Result<(), Self::Error> {
        self.written.push(String::from(line));

        match line {
            "AT+GMR" => self.respond(&["AT version:1.2.0.0(Jul  1 2016 20:04:45)", "SDK version:1.5.4.1", "OK"]),
            "AT+RST" => self.respond(&["OK", "ready"]),
            "AT+CIFSR" => self.respond(&[
                "+CIFSR:APIP,\"192.168.4.1\"",
                "+CIFSR:APMAC,\"5c:cf:7f:aa:bb:cc\"",
                "OK",
            ]),
            line if line.starts_with("AT+CIPSEND=") => self.respond(&[">"]),
            line if line.starts_with("AT+CIPCLOSE=") => {
                let closed = format!("{},CLOSED", &line[12..]);
                self.respond(&[closed.as_str(), "OK"]);
            }
            line if line.starts_with("AT") => self.respond(&["OK"]),
            _ => self.respond(&["SEND OK"]),
        }

        Ok(())
    }

    fn try_read_line(&mut self) -> nb::Result<String, Self::Error> {
        self.lines.pop_front().ok_or(nb::Error::WouldBlock)
    }
}

/// Timer mock, expiring after a fixed number of polls
#[derive(Default)]
pub struct ExampleTimer {
    /// Remaining polls until expiry
    remaining: u32,

    ticks: u32,
}

impl Timer<1_000_000> for ExampleTimer {
    type Error = Infallible;

    fn now(&mut self) -> TimerInstantU32<1000000> {
        TimerInstantU32::from_ticks(self.ticks)
    }

    fn start(&mut self, _duration: TimerDurationU32<1000000>) -> Result<(), Self::Error> {
        self.remaining = EXAMPLE_TIMER_POLLS;
        Ok(())
    }

    fn cancel(&mut self) -> Result<(), Self::Error> {
        self.remaining = 0;
        Ok(())
    }

    fn wait(&mut self) -> nb::Result<(), Self::Error> {
        self.ticks = self.ticks.wrapping_add(1);

        if self.remaining == 0 {
            return Ok(());
        }

        self.remaining -= 1;
        Err(nb::Error::WouldBlock)
    }
}
