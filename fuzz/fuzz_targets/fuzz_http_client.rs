#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use shiguredo_http11_client::{HttpClient, ManualClock, MemoryTransport};

#[derive(Arbitrary, Debug)]
struct FuzzResponse {
    segments: Vec<Vec<u8>>,
    stall_mask: u64,
    close_when_drained: bool,
}

fuzz_target!(|input: FuzzResponse| {
    let mut transport = MemoryTransport::new();
    for (i, segment) in input.segments.iter().take(64).enumerate() {
        transport.push(segment);
        if input.stall_mask & (1 << i) != 0 {
            transport.push_stall();
        }
    }
    if input.close_when_drained {
        transport.close_when_drained();
    }

    let clock = ManualClock::new();
    let mut client = HttpClient::new(&mut transport, "example.com", 80).with_clock(&clock);
    if client.get("/").is_err() {
        return;
    }
    if client.response_status_code().is_err() {
        return;
    }
    if let Ok(body) = client.response_body() {
        assert!(body.len() as u64 <= client.config().max_body_size);
        if let Ok(Some(length)) = client.content_length() {
            assert_eq!(body.len() as u64, length);
        }
    }
});
