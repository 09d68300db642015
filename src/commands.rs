use crate::adapter::Error;
use crate::wifi::{Interface, WifiMode};
use alloc::format;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

/// Acknowledgement of a successful command
pub(crate) const OK: &str = "OK";

/// Acknowledgement of a setting which was already active
pub(crate) const NO_CHANGE: &str = "no change";

/// Prompt signaling that the modem is ready to receive payload
pub(crate) const PROMPT: &str = ">";

/// Confirmation of transmitted payload
pub(crate) const SEND_OK: &str = "SEND OK";

/// Typed AT command, encoded without line terminator
pub(crate) trait AtCommand {
    /// Command string as sent to the modem
    fn encode(&self) -> String;

    /// Substrings terminating the transaction successfully
    fn expected(&self) -> Vec<String> {
        vec![String::from(OK)]
    }

    /// Max. waiting time for an expected response
    fn timeout_ms(&self) -> u32;

    /// Time to wait after transmission before any response is read
    fn settle_ms(&self) -> u32 {
        0
    }
}

/// Trait for mapping command errors
pub(crate) trait CommandErrorHandler {
    /// Maps transaction errors to command specific errors
    fn command_error(&self, error: Error) -> Error {
        error
    }
}

/// Checks if the modem is responding at all
#[derive(Clone, Default)]
pub(crate) struct TestCommand;

impl AtCommand for TestCommand {
    fn encode(&self) -> String {
        String::from("AT")
    }

    fn timeout_ms(&self) -> u32 {
        1_000
    }
}

impl CommandErrorHandler for TestCommand {
    fn command_error(&self, error: Error) -> Error {
        match error {
            Error::Timeout | Error::Rejected => Error::DeviceUnresponsive,
            other => other,
        }
    }
}

/// Queries the firmware version and expects the given marker in the version information
#[derive(Clone)]
pub(crate) struct FirmwareCommand {
    marker: &'static str,
}

impl FirmwareCommand {
    pub fn new(marker: &'static str) -> Self {
        Self { marker }
    }
}

impl AtCommand for FirmwareCommand {
    fn encode(&self) -> String {
        String::from("AT+GMR")
    }

    fn expected(&self) -> Vec<String> {
        vec![String::from(self.marker)]
    }

    fn timeout_ms(&self) -> u32 {
        10
    }
}

impl CommandErrorHandler for FirmwareCommand {
    fn command_error(&self, error: Error) -> Error {
        match error {
            Error::Timeout => Error::FirmwareMismatch,
            Error::Rejected => Error::DeviceUnresponsive,
            other => other,
        }
    }
}

/// Restarts the module
#[derive(Clone, Default)]
pub(crate) struct RestartCommand;

impl AtCommand for RestartCommand {
    fn encode(&self) -> String {
        String::from("AT+RST")
    }

    fn timeout_ms(&self) -> u32 {
        10
    }

    fn settle_ms(&self) -> u32 {
        1_500
    }
}

impl CommandErrorHandler for RestartCommand {
    fn command_error(&self, error: Error) -> Error {
        match error {
            Error::Timeout | Error::Rejected => Error::ResetFailed,
            other => other,
        }
    }
}

/// Sets the WIFI mode
#[derive(Clone)]
pub(crate) struct WifiModeCommand {
    mode: WifiMode,
}

impl WifiModeCommand {
    pub fn new(mode: WifiMode) -> Self {
        Self { mode }
    }
}

impl AtCommand for WifiModeCommand {
    fn encode(&self) -> String {
        format!("AT+CWMODE={}", self.mode as u8)
    }

    fn expected(&self) -> Vec<String> {
        vec![String::from(OK), String::from(NO_CHANGE)]
    }

    fn timeout_ms(&self) -> u32 {
        100
    }
}

impl CommandErrorHandler for WifiModeCommand {}

/// Enables multiple connections
#[derive(Clone, Default)]
pub(crate) struct SetMultipleConnectionsCommand;

impl AtCommand for SetMultipleConnectionsCommand {
    fn encode(&self) -> String {
        String::from("AT+CIPMUX=1")
    }

    fn expected(&self) -> Vec<String> {
        vec![String::from(OK), String::from(NO_CHANGE)]
    }

    fn timeout_ms(&self) -> u32 {
        100
    }
}

impl CommandErrorHandler for SetMultipleConnectionsCommand {}

/// Starts a TCP server on the given port
#[derive(Clone)]
pub(crate) struct ServerCommand {
    port: u16,
}

impl ServerCommand {
    pub fn new(port: u16) -> Self {
        Self { port }
    }
}

impl AtCommand for ServerCommand {
    fn encode(&self) -> String {
        format!("AT+CIPSERVER=1,{}", self.port)
    }

    fn expected(&self) -> Vec<String> {
        vec![String::from(OK), String::from(NO_CHANGE)]
    }

    fn timeout_ms(&self) -> u32 {
        100
    }
}

impl CommandErrorHandler for ServerCommand {}

/// Announces the length of the following payload
#[derive(Clone)]
pub(crate) struct TransmissionPrepareCommand {
    link_id: usize,
    length: usize,
    timeout_ms: u32,
}

impl TransmissionPrepareCommand {
    pub fn new(link_id: usize, length: usize, timeout_ms: u32) -> Self {
        Self {
            link_id,
            length,
            timeout_ms,
        }
    }
}

impl AtCommand for TransmissionPrepareCommand {
    fn encode(&self) -> String {
        format!("AT+CIPSEND={},{}", self.link_id, self.length)
    }

    fn expected(&self) -> Vec<String> {
        vec![String::from(PROMPT)]
    }

    fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }
}

impl CommandErrorHandler for TransmissionPrepareCommand {}

/// Payload sent after the prompt
#[derive(Clone)]
pub(crate) struct TransmissionCommand<'a> {
    text: &'a str,
    timeout_ms: u32,
}

impl<'a> TransmissionCommand<'a> {
    pub fn new(text: &'a str, timeout_ms: u32) -> Self {
        Self { text, timeout_ms }
    }

    /// Length announced by CIPSEND, including the line terminator
    pub fn announced_length(&self) -> usize {
        self.text.len() + crate::transport::LINE_TERMINATOR.len()
    }
}

impl AtCommand for TransmissionCommand<'_> {
    fn encode(&self) -> String {
        String::from(self.text)
    }

    fn expected(&self) -> Vec<String> {
        vec![String::from(SEND_OK), String::from(PROMPT)]
    }

    fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }
}

impl CommandErrorHandler for TransmissionCommand<'_> {}

/// Closes the given connection
#[derive(Clone)]
pub(crate) struct CloseConnectionCommand {
    link_id: usize,
}

impl CloseConnectionCommand {
    pub fn new(link_id: usize) -> Self {
        Self { link_id }
    }
}

impl AtCommand for CloseConnectionCommand {
    fn encode(&self) -> String {
        format!("AT+CIPCLOSE={}", self.link_id)
    }

    fn expected(&self) -> Vec<String> {
        vec![format!("{},CLOSED", self.link_id), String::from(OK)]
    }

    fn timeout_ms(&self) -> u32 {
        1_000
    }
}

impl CommandErrorHandler for CloseConnectionCommand {}

/// Sets the UART configuration of the current session: 8 data bits, 1 stop bit, no parity, no flow control
#[derive(Clone)]
pub(crate) struct SetBaudrateCommand {
    baudrate: u32,
}

impl SetBaudrateCommand {
    pub fn new(baudrate: u32) -> Self {
        Self { baudrate }
    }
}

impl AtCommand for SetBaudrateCommand {
    fn encode(&self) -> String {
        format!("AT+UART_CUR={},8,1,0,0", self.baudrate)
    }

    fn timeout_ms(&self) -> u32 {
        10
    }
}

impl CommandErrorHandler for SetBaudrateCommand {}

/// Command for receiving local IP and MAC addresses
#[derive(Clone)]
pub(crate) struct ObtainLocalAddressCommand {
    timeout_ms: u32,
}

impl ObtainLocalAddressCommand {
    pub fn new(timeout_ms: u32) -> Self {
        Self { timeout_ms }
    }
}

impl AtCommand for ObtainLocalAddressCommand {
    fn encode(&self) -> String {
        String::from("AT+CIFSR")
    }

    fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }
}

impl CommandErrorHandler for ObtainLocalAddressCommand {}

/// Enables/Disables command echo
#[derive(Clone)]
pub(crate) struct EchoCommand {
    enabled: bool,
}

impl EchoCommand {
    pub fn enable() -> Self {
        Self { enabled: true }
    }

    pub fn disable() -> Self {
        Self { enabled: false }
    }
}

impl AtCommand for EchoCommand {
    fn encode(&self) -> String {
        match self.enabled {
            true => String::from("ATE1"),
            false => String::from("ATE0"),
        }
    }

    fn timeout_ms(&self) -> u32 {
        10
    }
}

impl CommandErrorHandler for EchoCommand {}

/// Sets the IPv4 address of the given interface
#[derive(Clone)]
pub(crate) struct SetIpCommand {
    interface: Interface,
    ip: [u8; 4],
}

impl SetIpCommand {
    pub fn new(interface: Interface, ip: [u8; 4]) -> Self {
        Self { interface, ip }
    }
}

impl AtCommand for SetIpCommand {
    fn encode(&self) -> String {
        let [a, b, c, d] = self.ip;
        format!("AT+{}=\"{}.{}.{}.{}\"", self.interface.command_name(), a, b, c, d)
    }

    fn timeout_ms(&self) -> u32 {
        100
    }
}

impl CommandErrorHandler for SetIpCommand {}

/// Sets the MAC address of the given interface
#[derive(Clone)]
pub(crate) struct SetMacCommand {
    interface: Interface,
    mac: [u8; 6],
}

impl SetMacCommand {
    pub fn new(interface: Interface, mac: [u8; 6]) -> Self {
        Self { interface, mac }
    }
}

impl AtCommand for SetMacCommand {
    fn encode(&self) -> String {
        let mut encoded = String::with_capacity(17);
        for (index, byte) in self.mac.iter().enumerate() {
            if index > 0 {
                encoded.push(':');
            }

            for digit in base16::encode_byte_l(*byte) {
                encoded.push(digit as char);
            }
        }

        format!("AT+{}MAC=\"{}\"", self.interface.command_name(), encoded)
    }

    fn timeout_ms(&self) -> u32 {
        100
    }
}

impl CommandErrorHandler for SetMacCommand {}
