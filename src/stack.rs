//! # Server connections
//!
//! Clients connect to the server started by `server_enable()`. Each connection is identified by its link id (0-4).
//! Inbound data is collected per connection by the event recognition and needs to be consumed by the caller,
//! either by [Adapter::take_data] or [Adapter::clear_buffer].
//!
//! ## Example
//!
//! ````
//! # use esp_at_server::example::{ExampleTimer, ExampleTransport};
//! use esp_at_server::adapter::Adapter;
//! use esp_at_server::urc::EventOutcome;
//!
//! let mut transport = ExampleTransport::default();
//! transport.add_unsolicited(&["0,CONNECT", "+IPD,0,5:hello", "OK"]);
//!
//! let mut adapter: Adapter<_, _, 1_000_000> = Adapter::new(transport, ExampleTimer::default());
//! assert_eq!(EventOutcome::NewClientConnected(0), adapter.poll().unwrap());
//! assert!(adapter.client_available());
//!
//! assert_eq!(b"hello", adapter.take_data(0).unwrap().as_slice());
//! adapter.send_line(0, "world").unwrap();
//! adapter.close_connection(0).unwrap();
//! assert!(!adapter.client_available());
//! ````
use crate::adapter::{Adapter, Error};
use crate::commands::{
    AtCommand, CloseConnectionCommand, CommandErrorHandler, TransmissionCommand, TransmissionPrepareCommand,
};
use crate::session::ConnectionBuffer;
use crate::transport::LineTransport;
use crate::urc::MAX_CONNECTIONS;
use alloc::vec::Vec;
use fugit_timer::Timer;

/// Lifecycle of a single connection as tracked by the session
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ConnectionState {
    /// Connection is closed
    Closed,
    /// Data header was received, waiting for the acknowledgement
    Opening,
    /// Connection is fully open
    Open,
}

impl<L: LineTransport, T: Timer<TIMER_HZ>, const TIMER_HZ: u32> Adapter<L, T, TIMER_HZ> {
    /// Returns true if at least one connection is open
    pub fn client_available(&self) -> bool {
        self.session.state.connections != 0
    }

    /// Returns true if the given connection is open
    pub fn is_connected(&self, link_id: usize) -> bool {
        self.session.state.is_connected(link_id)
    }

    /// Returns the lifecycle state of the given connection
    pub fn connection_state(&self, link_id: usize) -> ConnectionState {
        if self.is_connected(link_id) {
            return ConnectionState::Open;
        }

        if self.session.expecting_payload && self.session.active_link_id == Some(link_id) {
            return ConnectionState::Opening;
        }

        ConnectionState::Closed
    }

    /// Sends the given text followed by a line terminator.
    ///
    /// Fails without any transmission if the connection is not open. On timeout the connection is
    /// considered as closed.
    pub fn send_line(&mut self, link_id: usize, text: &str) -> Result<(), Error> {
        let result = self.transmit_line(link_id, text);
        self.finish(result)
    }

    /// Closes the given connection. The connection is considered as closed afterwards, even on error.
    pub fn close_connection(&mut self, link_id: usize) -> Result<(), Error> {
        if link_id >= MAX_CONNECTIONS {
            return self.finish(Err(Error::InvalidLinkId));
        }

        let result = self.send_command(CloseConnectionCommand::new(link_id));

        // Setting to closed even on error. Otherwise a stale connection would survive.
        self.session.state.set_closed(link_id);
        self.finish(result)
    }

    /// Returns the inbound data buffer of the given connection
    pub fn buffer(&self, link_id: usize) -> Option<&ConnectionBuffer> {
        self.session.buffer(link_id)
    }

    /// Returns the collected data of the given connection and clears its buffer
    pub fn take_data(&mut self, link_id: usize) -> Option<Vec<u8>> {
        self.session.buffers.get_mut(link_id).map(ConnectionBuffer::take)
    }

    /// Drops the collected data of the given connection
    pub fn clear_buffer(&mut self, link_id: usize) {
        if let Some(buffer) = self.session.buffers.get_mut(link_id) {
            buffer.clear();
        }
    }

    fn transmit_line(&mut self, link_id: usize, text: &str) -> Result<(), Error> {
        if link_id >= MAX_CONNECTIONS {
            return Err(Error::InvalidLinkId);
        }

        if !self.is_connected(link_id) {
            return Err(Error::ConnectionNotOpen);
        }

        let payload = TransmissionCommand::new(text, self.config.send_data_timeout_ms);
        let prepare = TransmissionPrepareCommand::new(
            link_id,
            payload.announced_length(),
            self.config.send_prepare_timeout_ms,
        );

        self.send_connection_command(link_id, prepare)?;
        self.send_connection_command(link_id, payload)
    }

    /// Sends a connection related command and marks the connection as closed on timeout
    fn send_connection_command<Cmd: AtCommand + CommandErrorHandler>(
        &mut self,
        link_id: usize,
        command: Cmd,
    ) -> Result<(), Error> {
        let result = self.send_command(command);

        if result == Err(Error::Timeout) {
            log::warn!("Connection {} timed out, considered as closed", link_id);
            self.session.state.set_closed(link_id);
        }

        result
    }
}
