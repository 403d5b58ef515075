#![no_main]

use libfuzzer_sys::fuzz_target;
use shiguredo_http11_client::{HttpClient, ManualClock, MemoryTransport, WebSocketClient};

fuzz_target!(|data: &[u8]| {
    let mut transport = MemoryTransport::new();
    transport.push(b"HTTP/1.1 101 Switching Protocols\r\n\r\n");
    transport.push(data);
    transport.close_when_drained();

    let clock = ManualClock::new();
    let http = HttpClient::new(&mut transport, "example.com", 80).with_clock(&clock);
    let mut ws = WebSocketClient::from(http);
    if ws.begin("/").is_err() {
        return;
    }

    let mut buf = [0u8; 64];
    for _ in 0..64 {
        if ws.parse_message().is_err() || !ws.connected() {
            return;
        }
        let before = ws.available();
        let n = ws.read(&mut buf);
        assert!(n <= before);
    }
});
