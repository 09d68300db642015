//! # Modem session state
//!
//! [Session] bundles the [ModemState], the per connection [ConnectionBuffer]s and the transient parser state.
//! It is mutated by [Session::recognize] for every received line and by the failure paths of
//! connection related commands.
use crate::adapter::ResultCode;
use crate::transport::LINE_TERMINATOR;
use crate::urc::{Event, EventOutcome, MAX_CONNECTIONS};
use alloc::vec::Vec;

/// Modem state of a single session
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModemState {
    /// Bit i is set if connection i is open
    pub connections: u8,

    /// True if multiple connections have been enabled
    pub multi_connection_mode: bool,

    /// Baudrate set by the last successful baudrate command, zero if never set
    pub baudrate: u32,

    /// Outcome of the last operation
    pub status: ResultCode,

    /// IPv4 address of the soft access point
    pub ap_ip: [u8; 4],

    /// IPv4 address of the station
    pub sta_ip: [u8; 4],

    /// MAC address of the soft access point
    pub ap_mac: [u8; 6],

    /// MAC address of the station
    pub sta_mac: [u8; 6],
}

impl Default for ModemState {
    fn default() -> Self {
        Self {
            connections: 0,
            multi_connection_mode: false,
            baudrate: 0,
            status: ResultCode::Ok,
            ap_ip: [0x0; 4],
            sta_ip: [0x0; 4],
            ap_mac: [0x0; 6],
            sta_mac: [0x0; 6],
        }
    }
}

impl ModemState {
    /// Returns true if the given connection is open
    pub fn is_connected(&self, link_id: usize) -> bool {
        link_id < MAX_CONNECTIONS && self.connections & (1 << link_id) != 0
    }

    pub(crate) fn set_connected(&mut self, link_id: usize) {
        self.connections |= 1 << link_id;
    }

    pub(crate) fn set_closed(&mut self, link_id: usize) {
        self.connections &= !(1 << link_id);
    }
}

/// Inbound data of a single connection
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConnectionBuffer {
    /// Byte count announced by the most recent +IPD header
    pub(crate) pending_len: u32,

    /// Payload collected so far
    pub(crate) accumulated: Vec<u8>,
}

impl ConnectionBuffer {
    /// Byte count announced by the most recent +IPD header
    pub fn pending_len(&self) -> u32 {
        self.pending_len
    }

    /// Payload collected so far
    pub fn data(&self) -> &[u8] {
        &self.accumulated
    }

    /// Returns true if no payload was collected
    pub fn is_empty(&self) -> bool {
        self.accumulated.is_empty()
    }

    /// Drops collected payload and announced length
    pub fn clear(&mut self) {
        self.pending_len = 0;
        self.accumulated.clear();
    }

    /// Appends a received payload line. The stripped line terminator is restored as long as
    /// the announced length is not reached yet.
    pub(crate) fn append_line(&mut self, line: &str) {
        self.accumulated.extend_from_slice(line.as_bytes());

        if self.accumulated.len() < self.pending_len as usize {
            self.accumulated.extend_from_slice(LINE_TERMINATOR.as_bytes());
        }
    }

    /// Returns the collected payload and clears the buffer
    pub fn take(&mut self) -> Vec<u8> {
        self.pending_len = 0;
        core::mem::take(&mut self.accumulated)
    }
}

/// State of a modem session
#[derive(Clone, Debug, Default)]
pub struct Session {
    pub state: ModemState,

    /// Inbound data, array index = link_id
    pub(crate) buffers: [ConnectionBuffer; MAX_CONNECTIONS],

    /// True between an +IPD header and the next OK/CONNECT/CLOSED line
    pub(crate) expecting_payload: bool,

    /// Connection the current payload belongs to
    pub(crate) active_link_id: Option<usize>,
}

impl Session {
    /// Classifies the line and applies it to the session state. Never blocks.
    pub fn recognize(&mut self, line: &str) -> EventOutcome {
        self.apply(Event::parse(line))
    }

    /// Applies an already classified line to the session state
    pub(crate) fn apply(&mut self, event: Event) -> EventOutcome {
        match event {
            Event::Connected(link_id) => {
                if self.is_filling(link_id) {
                    self.finish_payload();
                }

                EventOutcome::NoNewData
            }
            Event::Closed(link_id) => {
                if self.is_filling(link_id) {
                    self.finish_payload();
                }

                log::info!("Connection {} closed", link_id);
                self.state.set_closed(link_id);
                EventOutcome::ConnectionClosed(link_id)
            }
            Event::DataHeader {
                link_id,
                length,
                fragment,
            } => {
                self.expecting_payload = true;
                self.active_link_id = Some(link_id);

                let buffer = &mut self.buffers[link_id];
                buffer.pending_len = length;
                buffer.accumulated.clear();
                if !fragment.is_empty() {
                    buffer.append_line(fragment);
                }

                EventOutcome::NoNewData
            }
            Event::Ok => match self.finish_payload() {
                Some(link_id) => {
                    log::info!("New client connected on {}", link_id);
                    self.state.set_connected(link_id);
                    EventOutcome::NewClientConnected(link_id)
                }
                None => EventOutcome::Ok,
            },
            Event::Other(text) => self.append_payload(text),
        }
    }

    /// Returns the buffer of the given connection
    pub fn buffer(&self, link_id: usize) -> Option<&ConnectionBuffer> {
        self.buffers.get(link_id)
    }

    /// Returns true if payload of an +IPD announcement is currently collected
    pub fn is_expecting_payload(&self) -> bool {
        self.expecting_payload
    }

    /// Drops all connections and any partially collected payload
    pub(crate) fn reset_connections(&mut self) {
        self.state.connections = 0;
        self.state.multi_connection_mode = false;
        self.expecting_payload = false;
        self.active_link_id = None;
    }

    fn is_filling(&self, link_id: usize) -> bool {
        self.expecting_payload && self.active_link_id == Some(link_id)
    }

    /// Leaves the payload state and returns the connection which was filled
    fn finish_payload(&mut self) -> Option<usize> {
        if !self.expecting_payload {
            return None;
        }

        self.expecting_payload = false;
        self.active_link_id
    }

    fn append_payload(&mut self, text: &str) -> EventOutcome {
        if !self.expecting_payload || text.is_empty() || text == "\r" {
            return EventOutcome::NoNewData;
        }

        match self.active_link_id {
            Some(link_id) => {
                self.buffers[link_id].append_line(text);
                EventOutcome::DataReceived(link_id)
            }
            None => EventOutcome::NoNewData,
        }
    }
}
