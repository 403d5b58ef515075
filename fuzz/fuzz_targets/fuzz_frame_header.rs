#![no_main]

use libfuzzer_sys::fuzz_target;
use shiguredo_http11_client::Opcode;
use shiguredo_http11_client::websocket::{FrameHeader, MAX_FRAME_HEADER_LEN, encode_frame_header};

fuzz_target!(|data: &[u8]| {
    let Some(header) = FrameHeader::parse(data) else {
        return;
    };
    assert!(header.header_len <= MAX_FRAME_HEADER_LEN);
    assert!(header.header_len <= data.len());

    // 予約オペコード以外は再エンコードで同じ値に戻る
    let Some(opcode) = Opcode::from_u8(header.opcode) else {
        return;
    };
    let mask_key = header.masked.then_some(header.mask_key);
    let encoded = encode_frame_header(header.fin, opcode, header.payload_len, mask_key);
    let reparsed = FrameHeader::parse(encoded.as_bytes());
    assert_eq!(reparsed.map(|h| h.payload_len), Some(header.payload_len));
    assert_eq!(reparsed.map(|h| h.fin), Some(header.fin));
});
