use crate::commands::{AtCommand, CommandErrorHandler, PROMPT};
use crate::session::{ModemState, Session};
use crate::transport::LineTransport;
use crate::urc::{Event, EventOutcome};
use alloc::string::String;
use alloc::vec::Vec;
use fugit::TimerDurationU32;
use fugit_timer::Timer;

/// Token of a rejected command
const ERROR: &str = "ERROR";

/// Rejection of connection related commands, e.g. "link is not valid"
const LINK_IS_NOT: &str = "link is not";

/// Transient unavailability of the modem, e.g. "busy p..."
const BUSY: &str = "busy";

/// Central session object driving a single ESP-AT modem
///
/// Only one transaction may be in flight. All methods take `&mut self`, so concurrent use
/// requires an external mutex.
pub struct Adapter<L: LineTransport, T: Timer<TIMER_HZ>, const TIMER_HZ: u32> {
    /// Line access to the modem
    pub(crate) transport: L,

    /// Timer used for timeout measurement
    pub(crate) timer: T,

    /// Session state, updated by every received line
    pub(crate) session: Session,

    pub(crate) config: Config,
}

/// Adapter configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Substring of the version information (AT+GMR) expected by `check_firmware()`
    pub firmware_marker: &'static str,

    /// Timeout for the CIPSEND prompt in ms
    pub send_prepare_timeout_ms: u32,

    /// Timeout for the payload confirmation in ms
    pub send_data_timeout_ms: u32,

    /// Timeout of the CIFSR command in ms
    pub address_timeout_ms: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            firmware_marker: "AT version:",
            send_prepare_timeout_ms: 2_000,
            send_data_timeout_ms: 3_000,
            address_timeout_ms: 100,
        }
    }
}

/// Errors of a modem session
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// Modem did not answer the test command
    DeviceUnresponsive,

    /// Firmware version information does not contain the configured marker
    FirmwareMismatch,

    /// Modem did not acknowledge the restart
    ResetFailed,

    /// No expected response received before the deadline
    Timeout,

    /// Modem responded with ERROR or a connection related rejection
    Rejected,

    /// Unable to send data if connection is not open
    ConnectionNotOpen,

    /// Link id out of range 0-4
    InvalidLinkId,

    /// Upstream transport error
    TransportError,

    /// Upstream timer error
    TimerError,
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::DeviceUnresponsive => defmt::write!(f, "Error::DeviceUnresponsive"),
            Error::FirmwareMismatch => defmt::write!(f, "Error::FirmwareMismatch"),
            Error::ResetFailed => defmt::write!(f, "Error::ResetFailed"),
            Error::Timeout => defmt::write!(f, "Error::Timeout"),
            Error::Rejected => defmt::write!(f, "Error::Rejected"),
            Error::ConnectionNotOpen => defmt::write!(f, "Error::ConnectionNotOpen"),
            Error::InvalidLinkId => defmt::write!(f, "Error::InvalidLinkId"),
            Error::TransportError => defmt::write!(f, "Error::TransportError"),
            Error::TimerError => defmt::write!(f, "Error::TimerError"),
        }
    }
}

/// Outcome of the last operation, s. [ModemState::status]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ResultCode {
    Ok,
    NoNewData,
    NewClientConnected,
    DeviceUnresponsive,
    FirmwareMismatch,
    ResetFailed,
    Timeout,
    Rejected,
    ConnectionNotOpen,
    InvalidLinkId,
    TransportError,
    TimerError,
}

impl From<&Error> for ResultCode {
    fn from(error: &Error) -> Self {
        match error {
            Error::DeviceUnresponsive => ResultCode::DeviceUnresponsive,
            Error::FirmwareMismatch => ResultCode::FirmwareMismatch,
            Error::ResetFailed => ResultCode::ResetFailed,
            Error::Timeout => ResultCode::Timeout,
            Error::Rejected => ResultCode::Rejected,
            Error::ConnectionNotOpen => ResultCode::ConnectionNotOpen,
            Error::InvalidLinkId => ResultCode::InvalidLinkId,
            Error::TransportError => ResultCode::TransportError,
            Error::TimerError => ResultCode::TimerError,
        }
    }
}

impl From<EventOutcome> for ResultCode {
    fn from(outcome: EventOutcome) -> Self {
        match outcome {
            EventOutcome::NewClientConnected(_) => ResultCode::NewClientConnected,
            EventOutcome::NoNewData => ResultCode::NoNewData,
            EventOutcome::Ok | EventOutcome::ConnectionClosed(_) | EventOutcome::DataReceived(_) => ResultCode::Ok,
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ResultCode {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}", defmt::Debug2Format(self))
    }
}

impl<L: LineTransport, T: Timer<TIMER_HZ>, const TIMER_HZ: u32> Adapter<L, T, TIMER_HZ> {
    /// Creates a new session with default configuration. The transport must already be initialized.
    pub fn new(transport: L, timer: T) -> Self {
        Self::with_config(transport, timer, Config::default())
    }

    /// Creates a new session with the given configuration
    pub fn with_config(transport: L, timer: T, config: Config) -> Self {
        Self {
            transport,
            timer,
            session: Session::default(),
            config,
        }
    }

    /// Current modem state
    pub fn state(&self) -> &ModemState {
        &self.session.state
    }

    /// Session state including connection buffers
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Current configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Sets the timeout for payload confirmation in ms
    pub fn set_send_timeout_ms(&mut self, timeout: u32) {
        self.config.send_data_timeout_ms = timeout;
    }

    /// Sets the timeout for the CIPSEND prompt in ms
    pub fn set_send_prepare_timeout_ms(&mut self, timeout: u32) {
        self.config.send_prepare_timeout_ms = timeout;
    }

    /// Returns the transport and timer
    pub fn release(self) -> (L, T) {
        (self.transport, self.timer)
    }

    /// Processes all currently buffered lines without sending anything.
    /// Returns the most significant outcome, s. [EventOutcome::merge].
    pub fn poll(&mut self) -> Result<EventOutcome, Error> {
        let mut outcome = EventOutcome::NoNewData;

        loop {
            match self.transport.try_read_line() {
                Ok(line) => {
                    log::trace!("RX: {}", line);
                    outcome = outcome.merge(self.session.recognize(&line));
                }
                Err(nb::Error::WouldBlock) => break,
                Err(nb::Error::Other(_)) => return self.finish(Err(Error::TransportError)),
            }
        }

        self.session.state.status = outcome.into();
        Ok(outcome)
    }

    /// Sends the given line and waits until a line containing one of the expected substrings is received.
    /// The send prompt `>` is only matched by a line consisting of the prompt.
    pub fn run(&mut self, send: &str, expect: &[&str], timeout: TimerDurationU32<TIMER_HZ>) -> Result<(), Error> {
        self.run_with(send, expect, timeout, |_, _| {})
    }

    /// Like [Adapter::run], but calls `on_line` for every received line after it passed the event recognition
    pub fn run_with<F: FnMut(&mut ModemState, &str)>(
        &mut self,
        send: &str,
        expect: &[&str],
        timeout: TimerDurationU32<TIMER_HZ>,
        on_line: F,
    ) -> Result<(), Error> {
        self.transmit(send)?;
        self.await_response(send, expect, timeout, on_line)
    }

    /// Executes a typed command and maps errors by its [CommandErrorHandler]
    pub(crate) fn send_command<Cmd: AtCommand + CommandErrorHandler>(&mut self, command: Cmd) -> Result<(), Error> {
        self.send_command_with(command, |_, _| {})
    }

    /// Executes a typed command and passes every received line to `on_line`
    pub(crate) fn send_command_with<Cmd: AtCommand + CommandErrorHandler, F: FnMut(&mut ModemState, &str)>(
        &mut self,
        command: Cmd,
        on_line: F,
    ) -> Result<(), Error> {
        let encoded = command.encode();
        let expected = command.expected();
        let expected: Vec<&str> = expected.iter().map(String::as_str).collect();

        let result = self.transmit(&encoded).and_then(|_| {
            if command.settle_ms() > 0 {
                self.settle(TimerDurationU32::millis(command.settle_ms()))?;
            }

            self.await_response(&encoded, &expected, TimerDurationU32::millis(command.timeout_ms()), on_line)
        });

        result.map_err(|error| command.command_error(error))
    }

    /// Stores the result code of the operation in the session state
    pub(crate) fn finish<V>(&mut self, result: Result<V, Error>) -> Result<V, Error> {
        self.session.state.status = match &result {
            Ok(_) => ResultCode::Ok,
            Err(error) => error.into(),
        };

        result
    }

    /// The send prompt has to match the whole line, as payload may contain '>' as well
    fn is_expected(line: &str, expected: &str) -> bool {
        if expected == PROMPT {
            return line.trim_end() == PROMPT;
        }

        line.contains(expected)
    }

    fn transmit(&mut self, line: &str) -> Result<(), Error> {
        log::debug!("TX: {}", line);
        self.transport.write_line(line).map_err(|_| Error::TransportError)
    }

    /// Blocks for the given duration without reading any lines
    fn settle(&mut self, duration: TimerDurationU32<TIMER_HZ>) -> Result<(), Error> {
        self.timer.start(duration).map_err(|_| Error::TimerError)?;

        loop {
            match self.timer.wait() {
                Ok(_) => return Ok(()),
                Err(nb::Error::Other(_)) => return Err(Error::TimerError),
                Err(nb::Error::WouldBlock) => {}
            }
        }
    }

    /// Routes received lines through the event recognition until an expected or a failure line is received
    fn await_response<F: FnMut(&mut ModemState, &str)>(
        &mut self,
        send: &str,
        expect: &[&str],
        timeout: TimerDurationU32<TIMER_HZ>,
        mut on_line: F,
    ) -> Result<(), Error> {
        self.timer.start(timeout).map_err(|_| Error::TimerError)?;

        loop {
            match self.timer.wait() {
                Ok(_) => {
                    log::warn!("Timeout while waiting for response to {}", send);
                    return Err(Error::Timeout);
                }
                Err(nb::Error::Other(_)) => return Err(Error::TimerError),
                Err(nb::Error::WouldBlock) => {}
            }

            let line = match self.transport.try_read_line() {
                Ok(line) => line,
                Err(nb::Error::WouldBlock) => continue,
                Err(nb::Error::Other(_)) => return Err(Error::TransportError),
            };

            log::trace!("RX: {}", line);
            let event = Event::parse(&line);
            let is_data_header = event.is_data_header();
            self.session.apply(event);
            on_line(&mut self.session.state, &line);

            // Data headers are fully consumed by the event recognition
            if is_data_header {
                continue;
            }

            if expect.iter().any(|expected| Self::is_expected(&line, expected)) {
                return Ok(());
            }

            if line.contains(ERROR) || line.contains(LINK_IS_NOT) {
                return Err(Error::Rejected);
            }

            // Busy does not extend the deadline
            if line.contains(BUSY) {
                log::warn!("Modem busy, resending {}", send);
                self.transmit(send)?;
            }
        }
    }
}
