//! WebSocket クライアント
//!
//! [`HttpClient`] でアップグレードのハンドシェイクを行い、その後のボディを
//! WebSocket フレームとして読み書きする。
//!
//! - 送信: `begin_message()` / `write()` / `end_message()` で 1 フレーム (常に FIN) を送る。
//!   ペイロードは 128 バイトの送信バッファに蓄積され、常にマスクされる
//! - 受信: `parse_message()` でフレームヘッダーを読み、`read()` などでペイロードを読む。
//!   Ping には自動で Pong を返し、Close を受信すると切断する
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_http11_client::{MemoryTransport, Opcode, WebSocketClient};
//!
//! let mut transport = MemoryTransport::new();
//! transport.push(b"HTTP/1.1 101 Switching Protocols\r\n\r\n");
//! transport.push(&[0x81, 0x02, b'h', b'i']);
//!
//! let mut ws = WebSocketClient::new(&mut transport, "example.com", 80);
//! ws.begin("/chat").unwrap();
//!
//! assert_eq!(ws.parse_message().unwrap(), 2);
//! assert_eq!(ws.message_type(), Some(Opcode::Text));
//! assert_eq!(ws.read_string().unwrap(), "hi");
//!
//! ws.begin_message(Opcode::Text).unwrap();
//! ws.write(b"hello").unwrap();
//! ws.end_message().unwrap();
//! ```

mod frame;

pub use frame::{
    FIN_BIT, FrameHeader, FrameHeaderBytes, MASK_BIT, MAX_FRAME_HEADER_LEN, Opcode, apply_mask,
    encode_frame_header,
};

use std::io;
use std::net::IpAddr;

use rand::Rng;

use crate::base64::base64_encode;
use crate::client::HttpClient;
use crate::clock::{Clock, SystemClock};
use crate::error::{Error, Result};
use crate::log::{debug, info, warning};
use crate::transport::Transport;

/// 送信バッファの容量
pub const TX_BUFFER_CAPACITY: usize = 128;

/// Sec-WebSocket-Key の元になる乱数のバイト数
const KEY_LEN: usize = 13;

/// ping() で送るペイロードのバイト数
const PING_PAYLOAD_LEN: usize = 16;

/// アップグレード成功のステータスコード
const SWITCHING_PROTOCOLS: u16 = 101;

/// WebSocket クライアント
#[derive(Debug)]
pub struct WebSocketClient<T: Transport, C: Clock = SystemClock> {
    http: HttpClient<T, C>,
    tx_started: bool,
    tx_message_type: Opcode,
    tx_buffer: [u8; TX_BUFFER_CAPACITY],
    tx_size: usize,
    /// 受信中のフレームの先頭バイト (FIN | opcode)。継続フレームでは元のオペコードを保つ
    rx_header: Option<u8>,
    /// 現在のフレームの未読ペイロード
    rx_size: u64,
    rx_masked: bool,
    rx_mask_key: [u8; 4],
    rx_mask_index: usize,
}

impl<T: Transport> WebSocketClient<T> {
    /// ホスト名を指定してクライアントを作成
    pub fn new(transport: T, host: &str, port: u16) -> Self {
        Self::from(HttpClient::new(transport, host, port))
    }

    /// IP アドレスを指定してクライアントを作成
    pub fn with_address(transport: T, addr: IpAddr, port: u16) -> Self {
        Self::from(HttpClient::with_address(transport, addr, port))
    }
}

impl<T: Transport, C: Clock> From<HttpClient<T, C>> for WebSocketClient<T, C> {
    fn from(http: HttpClient<T, C>) -> Self {
        Self {
            http,
            tx_started: false,
            tx_message_type: Opcode::Text,
            tx_buffer: [0; TX_BUFFER_CAPACITY],
            tx_size: 0,
            rx_header: None,
            rx_size: 0,
            rx_masked: false,
            rx_mask_key: [0; 4],
            rx_mask_index: 0,
        }
    }
}

impl<T: Transport, C: Clock> WebSocketClient<T, C> {
    /// 下位の HTTP クライアント
    pub fn http(&self) -> &HttpClient<T, C> {
        &self.http
    }

    /// 下位の HTTP クライアント (可変)
    pub fn http_mut(&mut self) -> &mut HttpClient<T, C> {
        &mut self.http
    }

    /// 接続中かどうか
    pub fn connected(&self) -> bool {
        self.http.connected()
    }

    /// 切断して送受信の状態を初期化
    pub fn stop(&mut self) {
        self.http.stop();
        self.reset_tx();
        self.reset_rx();
    }

    /// アップグレードのハンドシェイク
    ///
    /// 101 以外の最終ステータスは [`Error::UnexpectedStatus`] を返す。
    /// HTTP 層の状態はそのまま残るので、呼び出し元はステータスコードなどを参照できる。
    pub fn begin(&mut self, path: &str) -> Result<()> {
        if self.http.end_of_headers_reached() {
            // 前の接続は HTTP としては再利用できない
            self.http.stop();
        }
        self.reset_tx();
        self.reset_rx();

        self.http.begin_request();
        self.http.connection_keep_alive();
        self.http.get(path)?;

        let key = generate_key();
        self.http.send_header("Upgrade", "websocket")?;
        self.http.send_header("Connection", "Upgrade")?;
        self.http.send_header("Sec-WebSocket-Key", &key)?;
        self.http.send_header("Sec-WebSocket-Version", 13)?;
        self.http.end_request()?;

        let status_code = self.http.response_status_code()?;
        self.http.skip_response_headers()?;

        if status_code != SWITCHING_PROTOCOLS {
            warning!("websocket upgrade failed: status {}", status_code);
            return Err(Error::UnexpectedStatus(status_code));
        }
        info!("websocket upgraded: {}", path);
        Ok(())
    }

    // ----- 送信 -----

    /// メッセージの送信を開始
    pub fn begin_message(&mut self, message_type: Opcode) -> Result<()> {
        if self.tx_started {
            return Err(Error::MessageAlreadyStarted);
        }
        self.tx_started = true;
        self.tx_message_type = message_type;
        self.tx_size = 0;
        Ok(())
    }

    /// 蓄積したペイロードを 1 フレームとして送信
    pub fn end_message(&mut self) -> Result<()> {
        if !self.tx_started {
            return Err(Error::MessageNotStarted);
        }
        let opcode = self.tx_message_type;
        let payload = self.tx_buffer;
        let size = self.tx_size;
        self.reset_tx();
        self.send_frame(opcode, &payload[..size])
    }

    /// 書き込む
    ///
    /// アップグレード前はリクエストボディとして HTTP クライアントへ渡す。
    /// アップグレード後は送信バッファに蓄積し、受け付けたバイト数を返す。
    /// バッファの残りを超えた分は受け付けない (短い書き込みになり、満杯なら 0)。
    pub fn write(&mut self, data: &[u8]) -> Result<usize> {
        if !self.http.end_of_headers_reached() {
            return self.http.write(data);
        }
        if !self.tx_started {
            return Err(Error::MessageNotStarted);
        }

        let n = data.len().min(TX_BUFFER_CAPACITY - self.tx_size);
        if n < data.len() {
            warning!(
                "websocket tx buffer full: {} of {} bytes accepted",
                n,
                data.len()
            );
        }
        self.tx_buffer[self.tx_size..self.tx_size + n].copy_from_slice(&data[..n]);
        self.tx_size += n;
        Ok(n)
    }

    /// ランダムなペイロードの Ping を送信
    ///
    /// 送信中のメッセージには影響しない。
    pub fn ping(&mut self) -> Result<()> {
        let payload: [u8; PING_PAYLOAD_LEN] = rand::random();
        self.send_frame(Opcode::Ping, &payload)
    }

    fn send_frame(&mut self, opcode: Opcode, payload: &[u8]) -> Result<()> {
        let len = payload.len().min(TX_BUFFER_CAPACITY);
        let mask_key: [u8; 4] = rand::random();

        let mut masked = [0u8; TX_BUFFER_CAPACITY];
        masked[..len].copy_from_slice(&payload[..len]);
        apply_mask(&mut masked[..len], mask_key, 0);

        let header = encode_frame_header(true, opcode, len as u64, Some(mask_key));
        self.http.write_all(header.as_bytes())?;
        self.http.write_all(&masked[..len])?;
        self.http.flush()
    }

    // ----- 受信 -----

    /// 次のフレームヘッダーを読む
    ///
    /// 前のフレームの未読ペイロードは読み捨てる。先頭 2 バイトが届いていなければ 0 を返す。
    /// 制御フレームはここで処理して 0 を返す (Close は切断、Ping は同じペイロードの Pong を返信、
    /// Pong は読み捨て)。データフレームはペイロード長を返す。
    pub fn parse_message(&mut self) -> Result<u64> {
        self.flush_rx()?;

        if self.http.available() < 2 {
            return Ok(0);
        }
        let Some(first) = self.http.read_byte() else {
            return Ok(0);
        };

        let mut header = [0u8; MAX_FRAME_HEADER_LEN];
        header[0] = first;
        header[1] = self.read_header_byte()?;
        let header_len = 2 + FrameHeader::remaining_header_len(header[1]);
        for b in &mut header[2..header_len] {
            *b = self.read_header_byte()?;
        }
        let frame = FrameHeader::parse(&header[..header_len]).ok_or(Error::InvalidResponse)?;

        self.rx_header = Some(match self.rx_header {
            Some(previous) if frame.opcode == Opcode::Continuation.as_u8() => {
                (previous & 0x0F) | first
            }
            _ => first,
        });
        self.rx_size = frame.payload_len;
        self.rx_masked = frame.masked;
        self.rx_mask_key = frame.mask_key;
        self.rx_mask_index = 0;

        match self.message_type() {
            Some(opcode) if opcode.is_control() => {
                self.handle_control_frame(opcode)?;
                Ok(0)
            }
            _ => Ok(self.rx_size),
        }
    }

    fn handle_control_frame(&mut self, opcode: Opcode) -> Result<()> {
        match opcode {
            Opcode::Close => {
                info!("websocket close received");
                let drained = self.flush_rx();
                self.stop();
                drained
            }
            Opcode::Ping => self.reply_pong(),
            _ => self.flush_rx(),
        }
    }

    /// 受信中のメッセージの種類
    pub fn message_type(&self) -> Option<Opcode> {
        self.rx_header.and_then(Opcode::from_u8)
    }

    /// 受信中のフレームが最後のフラグメントかどうか
    pub fn is_final(&self) -> bool {
        self.rx_header.is_some_and(|header| header & FIN_BIT != 0)
    }

    /// 現在のフレームの未読バイト数
    ///
    /// アップグレード前は HTTP クライアントの available() と同じ。
    pub fn available(&mut self) -> usize {
        if !self.http.end_of_headers_reached() {
            return self.http.available();
        }
        usize::try_from(self.rx_size).unwrap_or(usize::MAX)
    }

    /// 読み取れるだけ読み取る (フレーム境界はまたがない)
    pub fn read(&mut self, buf: &mut [u8]) -> usize {
        if !self.http.end_of_headers_reached() {
            return self.http.read(buf);
        }
        let len = usize::try_from(self.rx_size).map_or(buf.len(), |size| size.min(buf.len()));
        if len == 0 {
            return 0;
        }
        let n = self.http.read(&mut buf[..len]);
        self.unmask(&mut buf[..n]);
        self.rx_size -= n as u64;
        n
    }

    /// 1 バイト読み取る
    pub fn read_byte(&mut self) -> Option<u8> {
        if !self.http.end_of_headers_reached() {
            return self.http.read_byte();
        }
        let mut b = [0u8; 1];
        (self.read(&mut b) == 1).then_some(b[0])
    }

    /// 次のバイトを消費せずに覗く (マスク解除済み)
    pub fn peek(&mut self) -> Option<u8> {
        if !self.http.end_of_headers_reached() {
            return self.http.peek();
        }
        if self.rx_size == 0 {
            return None;
        }
        let b = self.http.peek()?;
        if self.rx_masked {
            Some(b ^ self.rx_mask_key[self.rx_mask_index % 4])
        } else {
            Some(b)
        }
    }

    /// 現在のフレームの残りをすべて読み取って文字列にする
    ///
    /// 不正な UTF-8 は置換文字に変換する。
    pub fn read_string(&mut self) -> Result<String> {
        let limit = self.http.config().max_body_size;
        if self.rx_size > limit {
            return Err(Error::BodyTooLarge {
                size: self.rx_size,
                limit,
            });
        }

        let mut data = Vec::with_capacity(self.available());
        while self.rx_size > 0 {
            data.push(self.timed_read_frame_byte()?);
        }
        Ok(String::from_utf8_lossy(&data).into_owned())
    }

    fn reply_pong(&mut self) -> Result<()> {
        let mut payload = [0u8; TX_BUFFER_CAPACITY];
        let mut len = 0;
        while self.rx_size > 0 {
            let b = self.timed_read_frame_byte()?;
            if len < payload.len() {
                payload[len] = b;
                len += 1;
            }
        }
        debug!("websocket ping received, sending pong: {} bytes", len);
        self.send_frame(Opcode::Pong, &payload[..len])
    }

    fn flush_rx(&mut self) -> Result<()> {
        while self.rx_size > 0 {
            self.timed_read_frame_byte()?;
        }
        Ok(())
    }

    fn read_header_byte(&mut self) -> Result<u8> {
        self.http
            .timed_read_byte()?
            .ok_or(Error::Io(io::ErrorKind::UnexpectedEof))
    }

    fn timed_read_frame_byte(&mut self) -> Result<u8> {
        let mut b = [self.read_header_byte()?];
        self.unmask(&mut b);
        self.rx_size = self.rx_size.saturating_sub(1);
        Ok(b[0])
    }

    fn unmask(&mut self, data: &mut [u8]) {
        if self.rx_masked {
            apply_mask(data, self.rx_mask_key, self.rx_mask_index);
        }
        self.rx_mask_index = self.rx_mask_index.wrapping_add(data.len());
    }

    fn reset_tx(&mut self) {
        self.tx_started = false;
        self.tx_size = 0;
    }

    fn reset_rx(&mut self) {
        self.rx_header = None;
        self.rx_size = 0;
        self.rx_masked = false;
        self.rx_mask_key = [0; 4];
        self.rx_mask_index = 0;
    }
}

/// Sec-WebSocket-Key を生成 (1..=254 の乱数 13 バイトを Base64 エンコード)
fn generate_key() -> String {
    let mut rng = rand::thread_rng();
    let mut key = [0u8; KEY_LEN];
    for b in &mut key {
        *b = rng.gen_range(1..=254);
    }
    base64_encode(&key)
}
