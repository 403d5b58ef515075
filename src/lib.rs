//! # shiguredo_http11_client
//!
//! ノンブロッキングなバイトストリーム上で動く HTTP/1.1 クライアントと WebSocket クライアント
//!
//! ## 特徴
//!
//! - **インクリメンタル**: レスポンスを 1 バイトずつ状態機械で処理し、ヘッダー行もボディもバッファリングしない
//! - **1xx の読み飛ばし**: 101 以外の情報レスポンスは透過的に読み飛ばす
//! - **chunked 対応**: チャンク境界をまたがない読み取り
//! - **WebSocket**: ハンドシェイク、フレームのエンコード/デコード、マスク、Ping/Pong と Close の自動処理
//! - **トランスポート非依存**: [`Transport`] トレイトを実装すれば任意のバイトストリームで動く
//!
//! ## 使い方
//!
//! ### HTTP
//!
//! ```rust
//! use shiguredo_http11_client::{HttpClient, MemoryTransport};
//!
//! let mut transport = MemoryTransport::new();
//! transport.push(b"HTTP/1.1 100 Continue\r\n\r\n");
//! transport.push(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n");
//! transport.push(b"5\r\nhello\r\n3\r\nbye\r\n0\r\n\r\n");
//!
//! let mut client = HttpClient::new(&mut transport, "example.com", 80);
//! client.get("/").unwrap();
//! assert_eq!(client.response_status_code().unwrap(), 200);
//! assert_eq!(client.response_body().unwrap(), b"hellobye");
//! assert!(client.end_of_body_reached());
//! ```
//!
//! ### TCP
//!
//! ```no_run
//! use shiguredo_http11_client::{HttpClient, TcpTransport};
//!
//! let mut client = HttpClient::new(TcpTransport::new(), "example.com", 80);
//! client.get("/").unwrap();
//! let status = client.response_status_code().unwrap();
//! let body = client.response_body().unwrap();
//! println!("{} {}", status, String::from_utf8_lossy(&body));
//! ```

mod base64;
mod client;
pub mod clock;
mod config;
mod error;
mod log;
pub mod parser;
pub mod transport;
pub mod websocket;

pub use client::HttpClient;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ClientConfig, DEFAULT_USER_AGENT};
pub use error::{Error, Result};
pub use parser::{ParserState, ResponseParser, StatusLine};
pub use transport::{MemoryTransport, TcpTransport, Transport};
pub use websocket::{Opcode, TX_BUFFER_CAPACITY, WebSocketClient};
