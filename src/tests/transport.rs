use crate::tests::mock::FakeSerial;
use crate::transport::{LineTransport, SerialLines};
use alloc::string::String;

type Lines = SerialLines<FakeSerial, 64>;

fn lines_receiving(data: &[u8]) -> Lines {
    let mut serial = FakeSerial::default();
    serial.receive(data);
    SerialLines::new(serial)
}

#[test]
fn test_read_single_line() {
    let mut lines = lines_receiving(b"OK\r\n");

    assert_eq!(Ok(String::from("OK")), lines.try_read_line());
    assert_eq!(Err(nb::Error::WouldBlock), lines.try_read_line());
}

#[test]
fn test_read_multiple_lines() {
    let mut lines = lines_receiving(b"0,CONNECT\r\n+IPD,0,5:hello\r\nOK\r\n");

    assert_eq!(Ok(String::from("0,CONNECT")), lines.try_read_line());
    assert_eq!(Ok(String::from("+IPD,0,5:hello")), lines.try_read_line());
    assert_eq!(Ok(String::from("OK")), lines.try_read_line());
    assert_eq!(Err(nb::Error::WouldBlock), lines.try_read_line());
}

#[test]
fn test_read_partial_line() {
    let mut lines = lines_receiving(b"SEND");
    assert_eq!(Err(nb::Error::WouldBlock), lines.try_read_line());

    lines.serial.receive(b" OK\r\n");
    assert_eq!(Ok(String::from("SEND OK")), lines.try_read_line());
}

#[test]
fn test_read_empty_line() {
    let mut lines = lines_receiving(b"\r\n\nOK\r\n");

    assert_eq!(Ok(String::from("")), lines.try_read_line());
    assert_eq!(Ok(String::from("")), lines.try_read_line());
    assert_eq!(Ok(String::from("OK")), lines.try_read_line());
}

#[test]
fn test_read_line_without_carriage_return() {
    let mut lines = lines_receiving(b"Host: 192.168.4.1\n");

    assert_eq!(Ok(String::from("Host: 192.168.4.1")), lines.try_read_line());
}

#[test]
fn test_read_prompt() {
    let mut lines = lines_receiving(b"OK\r\n> ");

    assert_eq!(Ok(String::from("OK")), lines.try_read_line());
    assert_eq!(Ok(String::from(">")), lines.try_read_line());
    assert_eq!(Err(nb::Error::WouldBlock), lines.try_read_line());
}

#[test]
fn test_read_over_long_line() {
    let mut serial = FakeSerial::default();
    serial.receive(b"abcdefg\r\nOK\r\n");
    let mut lines: SerialLines<FakeSerial, 4> = SerialLines::new(serial);

    assert_eq!(Ok(String::from("abcd")), lines.try_read_line());
    assert_eq!(Ok(String::from("efg")), lines.try_read_line());
    assert_eq!(Ok(String::from("OK")), lines.try_read_line());
}

#[test]
fn test_read_over_long_line_keeps_carriage_return() {
    let mut serial = FakeSerial::default();
    serial.receive(b"abc\rdef\r\n");
    let mut lines: SerialLines<FakeSerial, 4> = SerialLines::new(serial);

    assert_eq!(Ok(String::from("abc\r")), lines.try_read_line());
    assert_eq!(Ok(String::from("def")), lines.try_read_line());
}

#[test]
fn test_read_invalid_utf8() {
    let mut lines = lines_receiving(b"\xffOK\r\n");

    assert_eq!(Ok(String::from("\u{fffd}OK")), lines.try_read_line());
}

#[test]
fn test_write_line() {
    let mut lines: Lines = SerialLines::new(FakeSerial::default());

    lines.write_line("AT+CIPMUX=1").unwrap();
    lines.write_line("hello").unwrap();

    let serial = lines.release();
    assert_eq!(b"AT+CIPMUX=1\r\nhello\r\n", serial.tx.as_slice());
    assert_eq!(2, serial.flush_count);
}
