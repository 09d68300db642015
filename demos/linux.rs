//! Example that runs on Linux using a serial-USB-adapter.
//!
//! Starts a soft access point with a TCP server and answers every request with a short text line.
use std::{
    env,
    io::{self, Read as _},
    thread,
    time::Duration,
};

use esp_at_server::{
    adapter::Adapter,
    transport::SerialLines,
    urc::EventOutcome,
    wifi::WifiMode,
};
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};

// Max. length of a single received line in bytes
const LINE_SIZE: usize = 1024;

// Timer frequency in Hz
const TIMER_HZ: u32 = 1000;

fn main() {
    env_logger::init();

    // Parse args
    let args: Vec<String> = env::args().collect();
    if args.len() != 4 {
        println!("Usage: {} <path-to-serial> <baudrate> <port>", args[0]);
        println!("Example: {} /dev/ttyUSB0 115200 80", args[0]);
        println!("\nNote: To run the example with debug logging, run it like this:");
        println!("\n  RUST_LOG=trace cargo run --example linux -- /dev/ttyUSB0 115200 80");
        std::process::exit(1);
    }
    let dev = &args[1];
    let baud_rate: u32 = args[2].parse().unwrap();
    let port: u16 = args[3].parse().unwrap();

    println!("Starting (dev={}, baud={:?})...", dev, baud_rate);

    // Open serial port
    let mut serial = serialport::new(dev, baud_rate)
        .data_bits(DataBits::Eight)
        .flow_control(FlowControl::None)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .timeout(Duration::from_millis(500))
        .open()
        .expect("Could not open serial port");

    // Flush serial RX buffer, to ensure that there isn't any remaining left
    // form previous sessions.
    flush_serial(&mut serial);

    let transport: SerialLines<_, LINE_SIZE> = SerialLines::new(serial::Port::new(serial));
    let mut adapter: Adapter<_, _, TIMER_HZ> = Adapter::new(transport, timer::SysTimer::new());

    println!("Booting modem...");
    adapter.test().expect("Modem is not responding");
    adapter.check_firmware().expect("Unsupported firmware");
    adapter.reset().expect("Restart failed");
    adapter.disable_echo().expect("Could not disable echo");
    adapter.set_wifi_mode(WifiMode::SoftAccessPoint).expect("Could not set WIFI mode");

    println!("Starting server on port {}...", port);
    adapter.server_enable(port).expect("Could not start server");

    let [a, b, c, d] = adapter.state().ap_ip;
    println!("Listening on {}.{}.{}.{}:{}", a, b, c, d, port);

    loop {
        match adapter.poll() {
            Ok(EventOutcome::NewClientConnected(link_id)) => answer(&mut adapter, link_id),
            Ok(EventOutcome::ConnectionClosed(link_id)) => {
                println!("Client {} disconnected", link_id);
                adapter.clear_buffer(link_id);
            }
            Ok(_) => {}
            Err(error) => log::error!("Polling failed: {:?}", error),
        }

        thread::sleep(Duration::from_millis(10));
    }
}

/// Prints the request line and sends a fixed response
fn answer<L, T>(adapter: &mut Adapter<L, T, TIMER_HZ>, link_id: usize)
where
    L: esp_at_server::transport::LineTransport,
    T: fugit_timer::Timer<TIMER_HZ>,
{
    let request = adapter.take_data(link_id).unwrap_or_default();
    let request = String::from_utf8_lossy(&request);
    println!("Client {}: {}", link_id, request.lines().next().unwrap_or_default());

    for line in ["HTTP/1.1 200 OK", "Content-Type: text/plain", "Connection: close", "", "Hello from ESP8266"] {
        if let Err(error) = adapter.send_line(link_id, line) {
            println!("Sending to client {} failed: {:?}", link_id, error);
            break;
        }
    }

    if let Err(error) = adapter.close_connection(link_id) {
        println!("Closing client {} failed: {:?}", link_id, error);
    }
}

/// Flush the serial port receive buffer.
fn flush_serial(serial_rx: &mut Box<dyn SerialPort>) {
    let mut buf = [0; 32];
    loop {
        match serial_rx.read(&mut buf[..]) {
            Ok(0) => break,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock || e.kind() == io::ErrorKind::TimedOut => break,
            Ok(_) => continue,
            Err(e) => panic!("Error while flushing serial: {}", e),
        }
    }
}

mod serial {
    use std::io::{self, Read, Write};

    use serialport::SerialPort;

    /// Error of the wrapped serial port
    #[derive(Debug)]
    pub struct PortError(pub io::ErrorKind);

    impl embedded_io::Error for PortError {
        fn kind(&self) -> embedded_io::ErrorKind {
            match self.0 {
                io::ErrorKind::TimedOut => embedded_io::ErrorKind::TimedOut,
                io::ErrorKind::Interrupted => embedded_io::ErrorKind::Interrupted,
                _ => embedded_io::ErrorKind::Other,
            }
        }
    }

    impl From<io::Error> for PortError {
        fn from(error: io::Error) -> Self {
            Self(error.kind())
        }
    }

    impl From<serialport::Error> for PortError {
        fn from(error: serialport::Error) -> Self {
            Self(io::Error::from(error).kind())
        }
    }

    /// Exposes a serialport as [embedded_io] byte stream
    pub struct Port {
        inner: Box<dyn SerialPort>,
    }

    impl Port {
        pub fn new(inner: Box<dyn SerialPort>) -> Self {
            Self { inner }
        }
    }

    impl embedded_io::ErrorType for Port {
        type Error = PortError;
    }

    impl embedded_io::Read for Port {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
            match self.inner.read(buf) {
                Ok(count) => Ok(count),
                Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
                Err(e) => Err(e.into()),
            }
        }
    }

    impl embedded_io::ReadReady for Port {
        fn read_ready(&mut self) -> Result<bool, Self::Error> {
            Ok(self.inner.bytes_to_read()? > 0)
        }
    }

    impl embedded_io::Write for Port {
        fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            Ok(self.inner.write(buf)?)
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(self.inner.flush()?)
        }
    }
}

mod timer {
    use std::{convert::TryInto, time::Instant as StdInstant};

    use fugit::Instant;
    use fugit_timer::Timer;

    /// A timer with millisecond precision.
    pub struct SysTimer {
        start: StdInstant,
        duration_ms: u32,
        started: bool,
    }

    impl SysTimer {
        pub fn new() -> SysTimer {
            SysTimer {
                start: StdInstant::now(),
                duration_ms: 0,
                started: false,
            }
        }
    }

    impl Timer<1000> for SysTimer {
        type Error = &'static str;

        /// Return current time `Instant`
        fn now(&mut self) -> fugit::TimerInstantU32<1000> {
            let milliseconds = (StdInstant::now() - self.start).as_millis();
            let ticks: u32 = milliseconds.try_into().expect("u32 timer overflow");
            Instant::<u32, 1, 1000>::from_ticks(ticks)
        }

        /// Start timer with a `duration`
        fn start(&mut self, duration: fugit::TimerDurationU32<1000>) -> Result<(), Self::Error> {
            self.start = StdInstant::now();
            self.duration_ms = duration.ticks();
            self.started = true;

            Ok(())
        }

        /// Tries to stop this timer
        fn cancel(&mut self) -> Result<(), Self::Error> {
            if !self.started {
                Err("cannot cancel stopped timer")
            } else {
                self.started = false;
                Ok(())
            }
        }

        /// Returns `nb::Error::WouldBlock` until the duration has expired
        fn wait(&mut self) -> nb::Result<(), Self::Error> {
            if (StdInstant::now() - self.start).as_millis() >= self.duration_ms.into() {
                Ok(())
            } else {
                Err(nb::Error::WouldBlock)
            }
        }
    }
}
