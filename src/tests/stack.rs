use crate::adapter::{Adapter, Error, ResultCode};
use crate::stack::ConnectionState;
use crate::tests::mock::{MockTimer, MockTransport, MockedResponse};
use crate::urc::EventOutcome;
use alloc::string::ToString;
use alloc::vec;

type AdapterType = Adapter<MockTransport, MockTimer, 1_000_000>;

/// Adapter with an accepted client on the given link
fn connected_adapter(transport: MockTransport, timer: MockTimer, link_id: usize) -> AdapterType {
    let mut adapter: AdapterType = Adapter::new(transport, timer);
    adapter.session.state.set_connected(link_id);
    adapter
}

#[test]
fn test_client_available() {
    let mut transport = MockTransport::new();
    transport.add_lines(&["0,CONNECT", "+IPD,0,5:hello", "OK"]);

    let mut adapter: AdapterType = Adapter::new(transport, MockTimer::new());
    assert!(!adapter.client_available());

    adapter.poll().unwrap();
    assert!(adapter.client_available());
    assert!(adapter.is_connected(0));
    assert!(!adapter.is_connected(1));
}

#[test]
fn test_connection_state_lifecycle() {
    let mut transport = MockTransport::new();
    transport.add_lines(&["1,CONNECT", "+IPD,1,5:hello"]);

    let mut adapter: AdapterType = Adapter::new(transport, MockTimer::new());
    assert_eq!(ConnectionState::Closed, adapter.connection_state(1));

    adapter.poll().unwrap();
    assert_eq!(ConnectionState::Opening, adapter.connection_state(1));
    assert_eq!(ConnectionState::Closed, adapter.connection_state(0));

    adapter.transport.add_lines(&["OK"]);
    assert_eq!(EventOutcome::NewClientConnected(1), adapter.poll().unwrap());
    assert_eq!(ConnectionState::Open, adapter.connection_state(1));

    adapter.transport.add_lines(&["1,CLOSED"]);
    assert_eq!(EventOutcome::ConnectionClosed(1), adapter.poll().unwrap());
    assert_eq!(ConnectionState::Closed, adapter.connection_state(1));
}

#[test]
fn test_send_line() {
    let mut transport = MockTransport::new();
    transport.add_response(MockedResponse::new(Some("AT+CIPSEND=2,4"), &[">"]));
    transport.add_response(MockedResponse::new(Some("hi"), &["Recv 4 bytes", "SEND OK"]));

    let (timer, durations) = MockTimer::expiring_after(usize::MAX);
    let mut adapter = connected_adapter(transport, timer, 2);
    adapter.send_line(2, "hi").unwrap();

    assert_eq!(vec![2_000, 3_000], *durations.lock().unwrap());
    assert!(adapter.is_connected(2));
    assert_eq!(ResultCode::Ok, adapter.state().status);
    adapter.transport.assert_all_responses_used();
}

#[test]
fn test_send_line_configured_timeouts() {
    let mut transport = MockTransport::new();
    transport.add_response(MockedResponse::new(Some("AT+CIPSEND=0,7"), &[">"]));
    transport.add_response(MockedResponse::new(Some("hello"), &["SEND OK"]));

    let (timer, durations) = MockTimer::expiring_after(usize::MAX);
    let mut adapter = connected_adapter(transport, timer, 0);
    adapter.set_send_prepare_timeout_ms(500);
    adapter.set_send_timeout_ms(800);
    adapter.send_line(0, "hello").unwrap();

    assert_eq!(vec![500, 800], *durations.lock().unwrap());
}

#[test]
fn test_send_line_not_connected() {
    let mut adapter: AdapterType = Adapter::new(MockTransport::new(), MockTimer::new());

    assert_eq!(Err(Error::ConnectionNotOpen), adapter.send_line(2, "hi"));
    assert_eq!(ResultCode::ConnectionNotOpen, adapter.state().status);
    assert!(adapter.transport.get_written().is_empty());
}

#[test]
fn test_send_line_invalid_link_id() {
    let mut adapter: AdapterType = Adapter::new(MockTransport::new(), MockTimer::new());
    adapter.session.state.connections = 0xFF;

    assert_eq!(Err(Error::InvalidLinkId), adapter.send_line(5, "hi"));
    assert!(adapter.transport.get_written().is_empty());
}

#[test]
fn test_send_line_prompt_timeout() {
    let mut transport = MockTransport::new();
    transport.add_response(MockedResponse::silent("AT+CIPSEND=3,4"));

    let mut adapter = connected_adapter(transport, MockTimer::expiring_after(3).0, 3);
    adapter.session.state.set_connected(1);

    assert_eq!(Err(Error::Timeout), adapter.send_line(3, "hi"));
    assert!(!adapter.is_connected(3));
    assert!(adapter.is_connected(1));
    assert_eq!(ResultCode::Timeout, adapter.state().status);
    assert_eq!(1, adapter.transport.get_written().len());
}

#[test]
fn test_send_line_confirmation_timeout() {
    let mut transport = MockTransport::new();
    transport.add_response(MockedResponse::new(Some("AT+CIPSEND=0,4"), &[">"]));
    transport.add_response(MockedResponse::silent("hi"));

    let mut adapter = connected_adapter(transport, MockTimer::expiring_after(3).0, 0);

    assert_eq!(Err(Error::Timeout), adapter.send_line(0, "hi"));
    assert!(!adapter.is_connected(0));
}

#[test]
fn test_send_line_link_rejected() {
    let mut transport = MockTransport::new();
    transport.add_response(MockedResponse::new(Some("AT+CIPSEND=4,4"), &["link is not valid", "ERROR"]));

    let mut adapter = connected_adapter(transport, MockTimer::running(), 4);

    assert_eq!(Err(Error::Rejected), adapter.send_line(4, "hi"));
    assert!(adapter.is_connected(4));
    assert_eq!(1, adapter.transport.get_written().len());
}

#[test]
fn test_send_line_payload_is_no_prompt() {
    let mut transport = MockTransport::new();
    transport.add_response(MockedResponse::new(Some("AT+CIPSEND=1,4"), &["+IPD,0,30:POST / HTTP/1.1", "<html>", ">"]));
    transport.add_response(MockedResponse::new(Some("hi"), &["SEND OK"]));

    let mut adapter = connected_adapter(transport, MockTimer::running(), 1);
    adapter.send_line(1, "hi").unwrap();

    // Payload is written after the prompt only, so no line is left over
    assert_eq!(0, adapter.transport.pending_lines());
    adapter.transport.assert_all_responses_used();
}

#[test]
fn test_send_line_busy_retransmitted() {
    let mut transport = MockTransport::new();
    transport.add_response(MockedResponse::new(Some("AT+CIPSEND=1,4"), &[">"]));
    transport.add_response(MockedResponse::new(Some("hi"), &["busy s..."]));
    transport.add_response(MockedResponse::new(Some("hi"), &["SEND OK"]));

    let mut adapter = connected_adapter(transport, MockTimer::running(), 1);
    adapter.send_line(1, "hi").unwrap();

    assert_eq!(
        vec!["AT+CIPSEND=1,4".to_string(), "hi".to_string(), "hi".to_string()],
        adapter.transport.get_written()
    );
}

#[test]
fn test_send_line_client_closed_meanwhile() {
    let mut transport = MockTransport::new();
    transport.add_response(MockedResponse::new(Some("AT+CIPSEND=0,4"), &["0,CLOSED", "ERROR"]));

    let mut adapter = connected_adapter(transport, MockTimer::running(), 0);

    assert_eq!(Err(Error::Rejected), adapter.send_line(0, "hi"));
    assert!(!adapter.is_connected(0));
}

#[test]
fn test_close_connection_closed_urc() {
    let mut transport = MockTransport::new();
    transport.add_response(MockedResponse::new(Some("AT+CIPCLOSE=2"), &["2,CLOSED", "OK"]));

    let (timer, durations) = MockTimer::expiring_after(usize::MAX);
    let mut adapter = connected_adapter(transport, timer, 2);
    adapter.close_connection(2).unwrap();

    assert!(!adapter.is_connected(2));
    assert_eq!(vec![1_000], *durations.lock().unwrap());
}

#[test]
fn test_close_connection_ok() {
    let mut transport = MockTransport::new();
    transport.add_response(MockedResponse::ok("AT+CIPCLOSE=0"));

    let mut adapter = connected_adapter(transport, MockTimer::running(), 0);
    adapter.session.state.set_connected(3);
    adapter.close_connection(0).unwrap();

    assert_eq!(0b01000, adapter.state().connections);
}

#[test]
fn test_close_connection_timeout() {
    let mut transport = MockTransport::new();
    transport.add_response(MockedResponse::silent("AT+CIPCLOSE=1"));

    let mut adapter = connected_adapter(transport, MockTimer::expired(), 1);

    assert_eq!(Err(Error::Timeout), adapter.close_connection(1));
    assert!(!adapter.is_connected(1));
}

#[test]
fn test_close_connection_rejected() {
    let mut transport = MockTransport::new();
    transport.add_response(MockedResponse::error("AT+CIPCLOSE=4"));

    let mut adapter = connected_adapter(transport, MockTimer::running(), 4);

    assert_eq!(Err(Error::Rejected), adapter.close_connection(4));
    assert!(!adapter.is_connected(4));
    assert_eq!(ResultCode::Rejected, adapter.state().status);
}

#[test]
fn test_close_connection_invalid_link_id() {
    let mut adapter: AdapterType = Adapter::new(MockTransport::new(), MockTimer::new());

    assert_eq!(Err(Error::InvalidLinkId), adapter.close_connection(7));
    assert!(adapter.transport.get_written().is_empty());
}

#[test]
fn test_take_data() {
    let mut transport = MockTransport::new();
    transport.add_lines(&["+IPD,3,45:GET /index.html HTTP/1.1", "Host: 192.168.4.1", "OK"]);

    let mut adapter: AdapterType = Adapter::new(transport, MockTimer::new());
    adapter.poll().unwrap();

    assert_eq!(45, adapter.buffer(3).unwrap().pending_len());
    assert_eq!(
        b"GET /index.html HTTP/1.1\r\nHost: 192.168.4.1\r\n",
        adapter.take_data(3).unwrap().as_slice()
    );
    assert!(adapter.buffer(3).unwrap().is_empty());
    assert!(adapter.take_data(5).is_none());
}

#[test]
fn test_buffer_kept_until_cleared() {
    let mut transport = MockTransport::new();
    transport.add_lines(&["+IPD,0,5:hello", "OK", "0,CLOSED"]);

    let mut adapter: AdapterType = Adapter::new(transport, MockTimer::new());
    adapter.poll().unwrap();
    assert_eq!(b"hello", adapter.buffer(0).unwrap().data());

    adapter.clear_buffer(0);
    assert!(adapter.buffer(0).unwrap().is_empty());
    assert!(adapter.buffer(5).is_none());
}
