use std::io::{self, Read, Write};
use std::net::{IpAddr, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use super::Transport;
use crate::log::debug;

/// 受信バッファサイズ
const RX_BUFFER_SIZE: usize = 512;

/// ノンブロッキング TCP トランスポート
///
/// std の TcpStream をノンブロッキングモードで使い、固定長の受信バッファで
/// `available()` と `peek()` を提供する。
#[derive(Debug)]
pub struct TcpTransport {
    stream: Option<TcpStream>,
    buf: [u8; RX_BUFFER_SIZE],
    start: usize,
    end: usize,
    peer_closed: bool,
    connect_timeout: Option<Duration>,
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl TcpTransport {
    /// 未接続のトランスポートを作成
    pub fn new() -> Self {
        Self {
            stream: None,
            buf: [0; RX_BUFFER_SIZE],
            start: 0,
            end: 0,
            peer_closed: false,
            connect_timeout: None,
        }
    }

    /// 接続タイムアウトを設定
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    fn open(&mut self, addrs: impl Iterator<Item = SocketAddr>) -> io::Result<()> {
        self.stop();

        let mut last_err = io::Error::from(io::ErrorKind::AddrNotAvailable);
        for addr in addrs {
            let result = match self.connect_timeout {
                Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
                None => TcpStream::connect(addr),
            };
            match result {
                Ok(stream) => {
                    stream.set_nonblocking(true)?;
                    stream.set_nodelay(true)?;
                    debug!("connected to {}", addr);
                    self.stream = Some(stream);
                    self.peer_closed = false;
                    return Ok(());
                }
                Err(e) => last_err = e,
            }
        }
        Err(last_err)
    }

    fn buffered(&self) -> usize {
        self.end - self.start
    }

    /// ソケットから読めるだけ受信バッファへ取り込む
    fn fill(&mut self) {
        if self.start == self.end {
            self.start = 0;
            self.end = 0;
        }
        if self.end == self.buf.len() || self.peer_closed {
            return;
        }
        let Some(stream) = self.stream.as_mut() else {
            return;
        };
        match stream.read(&mut self.buf[self.end..]) {
            Ok(0) => self.peer_closed = true,
            Ok(n) => self.end += n,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(_) => self.peer_closed = true,
        }
    }
}

impl Transport for TcpTransport {
    fn connect(&mut self, host: &str, port: u16) -> io::Result<()> {
        let addrs = (host, port).to_socket_addrs()?;
        self.open(addrs)
    }

    fn connect_addr(&mut self, addr: IpAddr, port: u16) -> io::Result<()> {
        self.open(std::iter::once(SocketAddr::new(addr, port)))
    }

    fn connected(&self) -> bool {
        self.stream.is_some() && (!self.peer_closed || self.buffered() > 0)
    }

    fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(std::net::Shutdown::Both);
        }
        self.start = 0;
        self.end = 0;
        self.peer_closed = false;
    }

    fn available(&mut self) -> usize {
        self.fill();
        self.buffered()
    }

    fn read_byte(&mut self) -> Option<u8> {
        if self.available() == 0 {
            return None;
        }
        let b = self.buf[self.start];
        self.start += 1;
        Some(b)
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        let n = self.available().min(buf.len());
        buf[..n].copy_from_slice(&self.buf[self.start..self.start + n]);
        self.start += n;
        n
    }

    fn peek(&mut self) -> Option<u8> {
        if self.available() == 0 {
            return None;
        }
        Some(self.buf[self.start])
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotConnected))?;

        let mut written = 0;
        while written < data.len() {
            match stream.write(&data[written..]) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => std::thread::yield_now(),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.stream.as_mut() {
            Some(stream) => stream.flush(),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn write_before_connect_fails() {
        let mut transport = TcpTransport::new();
        assert!(!transport.connected());
        assert_eq!(transport.available(), 0);
        assert_eq!(
            transport.write(b"x").unwrap_err().kind(),
            io::ErrorKind::NotConnected
        );
    }

    #[test]
    fn loopback_round_trip() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = std::thread::spawn(move || {
            let (mut conn, _) = listener.accept().unwrap();
            let mut buf = [0u8; 4];
            conn.read_exact(&mut buf).unwrap();
            conn.write_all(&buf).unwrap();
        });

        let mut transport = TcpTransport::new().connect_timeout(Duration::from_secs(5));
        transport.connect_addr(addr.ip(), addr.port()).unwrap();
        assert!(transport.connected());
        assert_eq!(transport.write(b"ping").unwrap(), 4);

        let mut received = Vec::new();
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while received.len() < 4 && std::time::Instant::now() < deadline {
            match transport.read_byte() {
                Some(b) => received.push(b),
                None => std::thread::sleep(Duration::from_millis(1)),
            }
        }
        assert_eq!(received, b"ping");

        server.join().unwrap();
        transport.stop();
        assert!(!transport.connected());
    }
}
