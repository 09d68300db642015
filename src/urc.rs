//! # Line classification
//!
//! Every line received from the modem is classified by [Event::parse] before it is applied to the session.
use crate::commands::OK;

/// Max. number of parallel connections supported by ESP-AT
pub const MAX_CONNECTIONS: usize = 5;

const DATA_HEADER_PREFIX: &str = "+IPD";

/// Classification of a single received line
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Event<'a> {
    /// Connection with the given link_id was opened, e.g. `0,CONNECT`
    Connected(usize),

    /// Connection with the given link_id was closed, e.g. `0,CLOSED`
    Closed(usize),

    /// Inbound data announcement, e.g. `+IPD,0,5:hello`
    DataHeader {
        link_id: usize,
        length: u32,
        /// Payload bytes following the header on the same line
        fragment: &'a str,
    },

    /// Plain acknowledgement
    Ok,

    /// Any other line, either payload or a solicited response
    Other(&'a str),
}

impl<'a> Event<'a> {
    /// Classifies the given line. Precedence: CONNECT, CLOSED, +IPD, OK, anything else.
    pub fn parse(line: &'a str) -> Self {
        let trimmed = line.trim_end_matches('\r');

        if let Some(link_id) = Self::parse_link_event(trimmed, ",CONNECT") {
            return Self::Connected(link_id);
        }

        if let Some(link_id) = Self::parse_link_event(trimmed, ",CLOSED") {
            return Self::Closed(link_id);
        }

        if let Some(header) = Self::parse_data_header(trimmed) {
            return header;
        }

        if trimmed.starts_with(DATA_HEADER_PREFIX) {
            log::warn!("Malformed data header: {}", trimmed);
        }

        if trimmed == OK {
            return Self::Ok;
        }

        Self::Other(line)
    }

    /// Returns true for inbound data announcements
    pub fn is_data_header(&self) -> bool {
        matches!(self, Event::DataHeader { .. })
    }

    /// Parses lines like `<link_id><suffix>`. Currently supports just link ids 0-4
    fn parse_link_event(line: &str, suffix: &str) -> Option<usize> {
        let mut chars = line.chars();
        let link_id = Self::parse_link_id(chars.next()?)?;

        if !chars.as_str().starts_with(suffix) {
            return None;
        }

        Some(link_id)
    }

    /// Parses `+IPD,<link_id>,<length>[<any header text>][:<fragment>]`, e.g. `+IPD,0,5,192.168.4.2,5000:hello`
    fn parse_data_header(line: &'a str) -> Option<Self> {
        let header = line.strip_prefix(DATA_HEADER_PREFIX)?.strip_prefix(',')?;
        let (link_id, remaining) = header.split_once(',')?;

        let mut link_id_chars = link_id.chars();
        let link_id = Self::parse_link_id(link_id_chars.next()?)?;
        if !link_id_chars.as_str().is_empty() {
            return None;
        }

        let (header_text, fragment) = remaining.split_once(':').unwrap_or((remaining, ""));
        let digits = header_text.len() - header_text.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        let length = header_text[..digits].parse::<u32>().ok()?;

        Some(Self::DataHeader {
            link_id,
            length,
            fragment,
        })
    }

    fn parse_link_id(digit: char) -> Option<usize> {
        match digit.to_digit(10)? as usize {
            link_id if link_id < MAX_CONNECTIONS => Some(link_id),
            _ => None,
        }
    }
}

/// Result of processing one or more received lines
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EventOutcome {
    /// Nothing relevant happened
    NoNewData,

    /// Plain command acknowledgement
    Ok,

    /// Connection with the given link_id was closed
    ConnectionClosed(usize),

    /// Payload was appended to the buffer of the given link_id
    DataReceived(usize),

    /// A new client connection with the given link_id was accepted
    NewClientConnected(usize),
}

impl EventOutcome {
    /// Ranking used when multiple lines are processed at once
    fn significance(&self) -> u8 {
        match self {
            EventOutcome::NoNewData => 0,
            EventOutcome::Ok => 1,
            EventOutcome::ConnectionClosed(_) => 2,
            EventOutcome::DataReceived(_) => 3,
            EventOutcome::NewClientConnected(_) => 4,
        }
    }

    /// Returns the more significant outcome. On equal rank the newer outcome wins.
    pub fn merge(self, newer: EventOutcome) -> EventOutcome {
        if newer.significance() >= self.significance() {
            return newer;
        }

        self
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for EventOutcome {
    fn format(&self, f: defmt::Formatter) {
        match self {
            EventOutcome::NoNewData => defmt::write!(f, "EventOutcome::NoNewData"),
            EventOutcome::Ok => defmt::write!(f, "EventOutcome::Ok"),
            EventOutcome::ConnectionClosed(id) => defmt::write!(f, "EventOutcome::ConnectionClosed({})", id),
            EventOutcome::DataReceived(id) => defmt::write!(f, "EventOutcome::DataReceived({})", id),
            EventOutcome::NewClientConnected(id) => defmt::write!(f, "EventOutcome::NewClientConnected({})", id),
        }
    }
}
