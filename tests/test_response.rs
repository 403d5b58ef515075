//! レスポンス読み取りのテスト
//!
//! スクリプト化したトランスポートで、リクエスト送信からボディ読み取りまでの流れを確認する。

use std::time::Duration;

use shiguredo_http11_client::{
    ClientConfig, Clock, Error, HttpClient, ManualClock, MemoryTransport, ParserState,
};

/// GET / に対する Content-Length 付きレスポンス (正常系)
#[test]
fn get_with_content_length() {
    let mut transport = MemoryTransport::new();
    transport.push(b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello");

    let mut client = HttpClient::new(&mut transport, "example.com", 80);
    client.no_default_request_headers();
    client.get("/").unwrap();

    assert_eq!(client.response_status_code().unwrap(), 200);
    client.skip_response_headers().unwrap();
    assert_eq!(client.content_length().unwrap(), Some(5));
    assert!(!client.end_of_body_reached());
    assert_eq!(client.response_body().unwrap(), b"hello");
    assert!(client.end_of_body_reached());
    drop(client);

    assert_eq!(
        transport.written(),
        b"GET / HTTP/1.1\r\nConnection: close\r\n\r\n"
    );
}

/// 1 バイトずつ届くレスポンス
#[test]
fn byte_by_byte_delivery() {
    let response = b"HTTP/1.1 404 Not Found\r\nServer: test\r\nContent-Length: 9\r\n\r\nnot found";
    let mut transport = MemoryTransport::new();
    for &b in response {
        transport.push(&[b]).push_stall();
    }

    let clock = ManualClock::new();
    let mut client = HttpClient::new(&mut transport, "example.com", 80).with_clock(&clock);
    client.get("/missing").unwrap();

    assert_eq!(client.response_status_code().unwrap(), 404);
    assert_eq!(client.response_body().unwrap(), b"not found");
    // 1 バイトごとに 1 回待つが、タイムアウトは最後の受信から計測するので失敗しない
    assert!(clock.now_millis() > 30_000);
}

/// Content-Length 分のバイトを読むまで end_of_body_reached() は false
#[test]
fn end_of_body_after_exact_length() {
    let mut transport = MemoryTransport::new();
    transport.push(b"HTTP/1.1 200 OK\r\nContent-Length: 6\r\n\r\n");
    transport.push(b"abc").push_stall().push(b"def");

    let mut client = HttpClient::new(&mut transport, "example.com", 80);
    client.get("/").unwrap();
    client.response_status_code().unwrap();
    assert_eq!(client.content_length().unwrap(), Some(6));

    let mut buf = [0u8; 16];
    assert_eq!(client.read(&mut buf), 3);
    assert!(!client.end_of_body_reached());
    assert_eq!(client.read(&mut buf), 0);
    assert!(!client.end_of_body_reached());
    assert_eq!(client.read(&mut buf), 3);
    assert!(client.end_of_body_reached());
}

/// 重複した Content-Length は最後のものを採用する
#[test]
fn duplicate_content_length_last_wins() {
    let mut transport = MemoryTransport::new();
    transport.push(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\nContent-Length: 2\r\n\r\nok");

    let mut client = HttpClient::new(&mut transport, "example.com", 80);
    client.get("/").unwrap();
    client.response_status_code().unwrap();
    assert_eq!(client.content_length().unwrap(), Some(2));
    assert_eq!(client.response_body().unwrap(), b"ok");
}

/// 100 Continue と 103 Early Hints は読み飛ばす
#[test]
fn informational_responses_are_skipped() {
    let mut transport = MemoryTransport::new();
    transport.push(b"HTTP/1.1 100 Continue\r\n\r\n");
    transport.push(b"HTTP/1.1 103 Early Hints\r\nLink: </a.css>; rel=preload\r\n\r\n");
    transport.push(b"HTTP/1.1 201 Created\r\nContent-Length: 0\r\n\r\n");

    let mut client = HttpClient::new(&mut transport, "example.com", 80);
    client.post_with("/items", "text/plain", b"x").unwrap();
    assert_eq!(client.response_status_code().unwrap(), 201);
    assert_eq!(client.response_body().unwrap(), b"");
}

/// ヘッダーを 1 行ずつ取り出す
#[test]
fn header_pull_api() {
    let mut transport = MemoryTransport::new();
    transport.push(b"HTTP/1.1 200 OK\r\nDate: Mon, 01 Jan 2024 00:00:00 GMT\r\nContent-Length: 2\r\nX-Trace:  abc \r\n\r\nhi");

    let mut client = HttpClient::new(&mut transport, "example.com", 80);
    client.get("/").unwrap();
    client.response_status_code().unwrap();

    let mut headers = Vec::new();
    while client.header_available().unwrap() {
        headers.push((
            client.read_header_name().to_string(),
            client.read_header_value().to_string(),
        ));
    }
    assert_eq!(
        headers,
        [
            ("Date".to_string(), "Mon, 01 Jan 2024 00:00:00 GMT".to_string()),
            ("Content-Length".to_string(), "2".to_string()),
            ("X-Trace".to_string(), "abc ".to_string()),
        ]
    );
    assert_eq!(client.content_length().unwrap(), Some(2));
    assert_eq!(client.response_body().unwrap(), b"hi");
}

/// ヘッダーの途中で止まったらタイムアウト
#[test]
fn headers_time_out() {
    let mut transport = MemoryTransport::new();
    transport.push(b"HTTP/1.1 200 OK\r\nContent-Le");

    let clock = ManualClock::new();
    let config = ClientConfig::default()
        .response_timeout(Duration::from_secs(2))
        .wait_for_data_delay(Duration::from_millis(100));
    let mut client = HttpClient::new(&mut transport, "example.com", 80)
        .with_clock(&clock)
        .with_config(config);
    client.get("/").unwrap();
    client.response_status_code().unwrap();

    assert_eq!(client.skip_response_headers(), Err(Error::TimedOut));
    assert_eq!(clock.now_millis(), 2_000);
    assert_eq!(clock.sleeps(), 20);
}

/// レスポンスを読む前に stop() しても次のリクエストを送れる
#[test]
fn stop_allows_new_request() {
    let mut transport = MemoryTransport::new();
    transport.push(b"HTTP/1.1 500 Internal Server Error\r\n");

    let mut client = HttpClient::new(&mut transport, "example.com", 80);
    client.get("/").unwrap();
    assert_eq!(client.response_status_code().unwrap(), 500);
    client.stop();
    assert_eq!(client.state(), ParserState::Idle);

    client.get("/retry").unwrap();
    assert_eq!(client.state(), ParserState::RequestSent);
    drop(client);
    assert_eq!(transport.connect_count(), 2);
    assert_eq!(transport.stop_count(), 1);
}

/// エラーコードはすべて異なる負の値
#[test]
fn error_codes_are_distinct() {
    let errors = [
        Error::ConnectionFailed,
        Error::ApiMisuse("x"),
        Error::TimedOut,
        Error::InvalidResponse,
        Error::MessageNotStarted,
        Error::MessageAlreadyStarted,
        Error::UnexpectedStatus(404),
        Error::HeaderLineTooLong { size: 1, limit: 0 },
        Error::BodyTooLarge { size: 1, limit: 0 },
        Error::Io(std::io::ErrorKind::UnexpectedEof),
    ];
    let mut codes: Vec<i32> = errors.iter().map(Error::code).collect();
    assert!(codes.iter().all(|&code| code < 0));
    codes.sort();
    codes.dedup();
    assert_eq!(codes.len(), errors.len());
}
