//! # Modem setup
//!
//! Boot sequence, WIFI mode, server start and address handling.
//!
//! ## Example
//!
//! ````
//! # use esp_at_server::example::{ExampleTimer, ExampleTransport};
//! use esp_at_server::adapter::{Adapter, ResultCode};
//! use esp_at_server::wifi::WifiMode;
//!
//! let mut adapter: Adapter<_, _, 1_000_000> = Adapter::new(ExampleTransport::default(), ExampleTimer::default());
//!
//! adapter.test().unwrap();
//! adapter.check_firmware().unwrap();
//! adapter.reset().unwrap();
//! assert_eq!(ResultCode::Ok, adapter.state().status);
//!
//! adapter.set_wifi_mode(WifiMode::SoftAccessPoint).unwrap();
//! adapter.server_enable(80).unwrap();
//! assert_eq!([192, 168, 4, 1], adapter.state().ap_ip);
//! assert_eq!([0x5c, 0xcf, 0x7f, 0xaa, 0xbb, 0xcc], adapter.state().ap_mac);
//! ````
use crate::adapter::{Adapter, Error};
use crate::commands::{
    EchoCommand, FirmwareCommand, ObtainLocalAddressCommand, RestartCommand, ServerCommand, SetBaudrateCommand,
    SetIpCommand, SetMacCommand, SetMultipleConnectionsCommand, TestCommand, WifiModeCommand,
};
use crate::responses::LocalAddressResponse;
use crate::session::ModemState;
use crate::transport::LineTransport;
use fugit_timer::Timer;

/// WIFI mode
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WifiMode {
    /// Wi-Fi RF will be disabled
    Null = 0,
    Station = 1,
    SoftAccessPoint = 2,
    SoftAccessPointAndStation = 3,
}

/// Network interface of the modem
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Interface {
    AccessPoint,
    Station,
}

impl Interface {
    /// Name of the address commands, e.g. CIPAP and CIPAPMAC
    pub(crate) fn command_name(&self) -> &'static str {
        match self {
            Interface::AccessPoint => "CIPAP",
            Interface::Station => "CIPSTA",
        }
    }
}

impl<L: LineTransport, T: Timer<TIMER_HZ>, const TIMER_HZ: u32> Adapter<L, T, TIMER_HZ> {
    /// Checks if the modem responds to AT
    pub fn test(&mut self) -> Result<(), Error> {
        let result = self.send_command(TestCommand);
        self.finish(result)
    }

    /// Checks the version information for the configured firmware marker
    pub fn check_firmware(&mut self) -> Result<(), Error> {
        let result = self.send_command(FirmwareCommand::new(self.config.firmware_marker));
        self.finish(result)
    }

    /// Restarts the modem. All connections are dropped on success.
    pub fn reset(&mut self) -> Result<(), Error> {
        let result = self.send_command(RestartCommand);
        if result.is_ok() {
            self.session.reset_connections();
        }

        self.finish(result)
    }

    pub fn set_wifi_mode(&mut self, mode: WifiMode) -> Result<(), Error> {
        let result = self.send_command(WifiModeCommand::new(mode));
        self.finish(result)
    }

    /// Enables multiple connections, starts a TCP server on the given port and fetches the local addresses
    pub fn server_enable(&mut self, port: u16) -> Result<(), Error> {
        let result = self.start_server(port);
        self.finish(result)
    }

    /// Sets the baudrate of the current session
    pub fn set_baudrate(&mut self, baudrate: u32) -> Result<(), Error> {
        let result = self.send_command(SetBaudrateCommand::new(baudrate));
        if result.is_ok() {
            self.session.state.baudrate = baudrate;
        }

        self.finish(result)
    }

    /// Reads IP and MAC addresses of both interfaces into the modem state
    pub fn get_ips_macs(&mut self) -> Result<(), Error> {
        let result = self.obtain_local_addresses();
        self.finish(result)
    }

    pub fn disable_echo(&mut self) -> Result<(), Error> {
        let result = self.send_command(EchoCommand::disable());
        self.finish(result)
    }

    pub fn enable_echo(&mut self) -> Result<(), Error> {
        let result = self.send_command(EchoCommand::enable());
        self.finish(result)
    }

    /// Sets the IPv4 address of the given interface
    pub fn set_ip(&mut self, interface: Interface, ip: [u8; 4]) -> Result<(), Error> {
        let result = self.send_command(SetIpCommand::new(interface, ip));
        if result.is_ok() {
            match interface {
                Interface::AccessPoint => self.session.state.ap_ip = ip,
                Interface::Station => self.session.state.sta_ip = ip,
            }
        }

        self.finish(result)
    }

    /// Sets the MAC address of the given interface
    pub fn set_mac(&mut self, interface: Interface, mac: [u8; 6]) -> Result<(), Error> {
        let result = self.send_command(SetMacCommand::new(interface, mac));
        if result.is_ok() {
            match interface {
                Interface::AccessPoint => self.session.state.ap_mac = mac,
                Interface::Station => self.session.state.sta_mac = mac,
            }
        }

        self.finish(result)
    }

    pub fn set_ap_ip(&mut self, ip: [u8; 4]) -> Result<(), Error> {
        self.set_ip(Interface::AccessPoint, ip)
    }

    pub fn set_sta_ip(&mut self, ip: [u8; 4]) -> Result<(), Error> {
        self.set_ip(Interface::Station, ip)
    }

    pub fn set_ap_mac(&mut self, mac: [u8; 6]) -> Result<(), Error> {
        self.set_mac(Interface::AccessPoint, mac)
    }

    pub fn set_sta_mac(&mut self, mac: [u8; 6]) -> Result<(), Error> {
        self.set_mac(Interface::Station, mac)
    }

    fn start_server(&mut self, port: u16) -> Result<(), Error> {
        self.send_command(SetMultipleConnectionsCommand)?;
        self.session.state.multi_connection_mode = true;

        self.send_command(ServerCommand::new(port))?;
        self.obtain_local_addresses()
    }

    fn obtain_local_addresses(&mut self) -> Result<(), Error> {
        let command = ObtainLocalAddressCommand::new(self.config.address_timeout_ms);
        self.send_command_with(command, Self::store_local_address)
    }

    /// Applies a single CIFSR line to the state
    fn store_local_address(state: &mut ModemState, line: &str) {
        match LocalAddressResponse::parse(line.trim_end_matches('\r')) {
            Some(LocalAddressResponse::AccessPointIp(ip)) => state.ap_ip = ip,
            Some(LocalAddressResponse::StationIp(ip)) => state.sta_ip = ip,
            Some(LocalAddressResponse::AccessPointMac(mac)) => state.ap_mac = mac,
            Some(LocalAddressResponse::StationMac(mac)) => state.sta_mac = mac,
            None => {}
        }
    }
}
