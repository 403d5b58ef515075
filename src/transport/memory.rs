use std::collections::VecDeque;
use std::io;
use std::net::IpAddr;

use super::Transport;

/// メモリ上のスクリプト化されたトランスポート
///
/// 受信データはセグメント単位で順番に届く。`available()` は次のストールまでに
/// 届いているバイト数を返し、`read()` は 1 回の呼び出しで先頭セグメントの残りまでしか
/// 返さないため、任意の細かさで分割された受信を再現できる。
/// 空のセグメント (ストール) は「1 回のポーリングでは何も届かない」ことを表す。
///
/// 送信データはすべて記録され、`written()` で参照できる。
#[derive(Debug, Default)]
pub struct MemoryTransport {
    segments: VecDeque<Vec<u8>>,
    cursor: usize,
    written: Vec<u8>,
    connected: bool,
    close_when_drained: bool,
    fail_connect: bool,
    connect_count: usize,
    stop_count: usize,
    flush_count: usize,
    last_host: Option<(String, u16)>,
}

impl MemoryTransport {
    /// 空のトランスポートを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 受信セグメントを追加
    pub fn push(&mut self, data: &[u8]) -> &mut Self {
        if !data.is_empty() {
            self.segments.push_back(data.to_vec());
        }
        self
    }

    /// `size` バイトごとに分割して受信セグメントを追加
    pub fn push_split(&mut self, data: &[u8], size: usize) -> &mut Self {
        for part in data.chunks(size.max(1)) {
            self.segments.push_back(part.to_vec());
        }
        self
    }

    /// データが届かないポーリングを 1 回挟む
    pub fn push_stall(&mut self) -> &mut Self {
        self.segments.push_back(Vec::new());
        self
    }

    /// 受信データを読み切ったら切断されたものとして扱う
    pub fn close_when_drained(&mut self) -> &mut Self {
        self.close_when_drained = true;
        self
    }

    /// connect() を失敗させる
    pub fn fail_connect(&mut self) -> &mut Self {
        self.fail_connect = true;
        self
    }

    /// 既に接続済みの状態にする
    pub fn set_connected(&mut self, connected: bool) -> &mut Self {
        self.connected = connected;
        self
    }

    /// 送信されたバイト列
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    /// 送信されたバイト列を取り出す
    pub fn take_written(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.written)
    }

    /// connect() が成功した回数
    pub fn connect_count(&self) -> usize {
        self.connect_count
    }

    /// stop() が呼ばれた回数
    pub fn stop_count(&self) -> usize {
        self.stop_count
    }

    /// flush() が呼ばれた回数
    pub fn flush_count(&self) -> usize {
        self.flush_count
    }

    /// 最後に接続したホスト名とポート
    pub fn last_host(&self) -> Option<(&str, u16)> {
        self.last_host
            .as_ref()
            .map(|(host, port)| (host.as_str(), *port))
    }

    /// 未読のバイト数 (セグメントをまたいだ合計)
    pub fn pending(&self) -> usize {
        self.segments.iter().map(Vec::len).sum::<usize>() - self.cursor
    }

    /// 次のストールまでに届いているバイト数
    fn arrived(&mut self) -> usize {
        if self.segments.front().is_some_and(Vec::is_empty) {
            // ストール 1 回分
            self.segments.pop_front();
            return 0;
        }
        self.segments
            .iter()
            .take_while(|segment| !segment.is_empty())
            .map(Vec::len)
            .sum::<usize>()
            - self.cursor
    }

    fn front_remaining(&mut self) -> usize {
        if self.arrived() == 0 {
            return 0;
        }
        self.segments
            .front()
            .map_or(0, |front| front.len() - self.cursor)
    }

    fn consume(&mut self, n: usize) {
        self.cursor += n;
        if let Some(front) = self.segments.front() {
            if self.cursor >= front.len() {
                self.segments.pop_front();
                self.cursor = 0;
            }
        }
    }
}

impl Transport for MemoryTransport {
    fn connect(&mut self, host: &str, port: u16) -> io::Result<()> {
        if self.fail_connect {
            return Err(io::ErrorKind::ConnectionRefused.into());
        }
        self.connected = true;
        self.connect_count += 1;
        self.last_host = Some((host.to_string(), port));
        Ok(())
    }

    fn connect_addr(&mut self, addr: IpAddr, port: u16) -> io::Result<()> {
        self.connect(&addr.to_string(), port)
    }

    fn connected(&self) -> bool {
        if self.close_when_drained && self.segments.is_empty() {
            return false;
        }
        self.connected
    }

    fn stop(&mut self) {
        self.connected = false;
        self.stop_count += 1;
        self.segments.clear();
        self.cursor = 0;
    }

    fn available(&mut self) -> usize {
        self.arrived()
    }

    fn read_byte(&mut self) -> Option<u8> {
        if self.front_remaining() == 0 {
            return None;
        }
        let b = self.segments.front()?[self.cursor];
        self.consume(1);
        Some(b)
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        let n = self.front_remaining().min(buf.len());
        if n == 0 {
            return 0;
        }
        if let Some(front) = self.segments.front() {
            buf[..n].copy_from_slice(&front[self.cursor..self.cursor + n]);
        }
        self.consume(n);
        n
    }

    fn peek(&mut self) -> Option<u8> {
        if self.front_remaining() == 0 {
            return None;
        }
        self.segments.front().map(|front| front[self.cursor])
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.written.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_count += 1;
        Ok(())
    }
}
