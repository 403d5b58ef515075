//! バイトストリームトランスポート
//!
//! HTTP クライアントと WebSocket クライアントが消費する双方向バイトストリーム。
//! すべての操作はブロックせず、その時点で準備できているデータだけを返す。
//!
//! トランスポートの寿命は呼び出し元が管理する。`&mut T` にも実装しているため、
//! 所有権を渡さずにクライアントへ貸し出せる。

use std::io;
use std::net::IpAddr;

mod memory;
mod tcp;

pub use memory::MemoryTransport;
pub use tcp::TcpTransport;

/// 双方向バイトストリーム
pub trait Transport {
    /// ホスト名で接続
    fn connect(&mut self, host: &str, port: u16) -> io::Result<()>;

    /// IP アドレスで接続
    fn connect_addr(&mut self, addr: IpAddr, port: u16) -> io::Result<()>;

    /// 接続中かどうか (未読データが残っている間は true)
    fn connected(&self) -> bool;

    /// 切断
    fn stop(&mut self);

    /// すぐに読み取れるバイト数
    fn available(&mut self) -> usize;

    /// 1 バイト読み取る。読み取れるデータがなければ `None`
    fn read_byte(&mut self) -> Option<u8>;

    /// 読み取れるだけ読み取り、読み取ったバイト数を返す
    fn read(&mut self, buf: &mut [u8]) -> usize;

    /// 次のバイトを消費せずに覗く
    fn peek(&mut self) -> Option<u8>;

    /// 書き込み、書き込んだバイト数を返す
    fn write(&mut self, data: &[u8]) -> io::Result<usize>;

    /// 送信バッファをフラッシュ
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn connect(&mut self, host: &str, port: u16) -> io::Result<()> {
        (**self).connect(host, port)
    }

    fn connect_addr(&mut self, addr: IpAddr, port: u16) -> io::Result<()> {
        (**self).connect_addr(addr, port)
    }

    fn connected(&self) -> bool {
        (**self).connected()
    }

    fn stop(&mut self) {
        (**self).stop()
    }

    fn available(&mut self) -> usize {
        (**self).available()
    }

    fn read_byte(&mut self) -> Option<u8> {
        (**self).read_byte()
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        (**self).read(buf)
    }

    fn peek(&mut self) -> Option<u8> {
        (**self).peek()
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        (**self).write(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}
