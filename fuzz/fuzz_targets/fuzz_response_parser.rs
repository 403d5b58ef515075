#![no_main]

use libfuzzer_sys::fuzz_target;
use shiguredo_http11_client::{ParserState, ResponseParser, StatusLine};

fuzz_target!(|data: &[u8]| {
    let mut parser = ResponseParser::new();
    parser.begin_request();
    parser.mark_request_sent();
    if parser.begin_status_line().is_err() {
        return;
    }

    let mut rest = data;
    // ステータスライン
    while let Some((&c, tail)) = rest.split_first() {
        rest = tail;
        match parser.push_status_byte(c) {
            Ok(StatusLine::Complete(code)) => {
                assert!(code <= 999);
                assert_eq!(parser.status_code(), Some(code));
                break;
            }
            Ok(_) => {}
            Err(_) => return,
        }
    }

    // ヘッダー
    while let Some((&c, tail)) = rest.split_first() {
        if parser.end_of_headers_reached() {
            break;
        }
        rest = tail;
        parser.push_header_byte(c);
    }

    // ボディ
    while let Some((&c, tail)) = rest.split_first() {
        if parser.end_of_body_reached() {
            break;
        }
        if parser.awaiting_chunk_size() {
            parser.push_chunk_size_byte(c);
            rest = tail;
        } else {
            let available = parser.body_available(rest.len());
            assert!(available <= rest.len());
            if parser.is_chunked() {
                assert!(available as u64 <= parser.chunk_remaining());
            }
            if available == 0 {
                break;
            }
            parser.on_body_read(available);
            rest = &rest[available..];
        }
        assert!(parser.state() >= ParserState::StatusCodeRead);
    }
});
