//! WebSocket エコークライアントの例
//!
//! メッセージを送信し、サーバーから返ってきたメッセージを表示する。
//!
//! 使い方:
//!   cargo run -p websocket_echo -- --host echo.example.com --path / hello world

use std::time::Duration;

use shiguredo_http11_client::{
    ClientConfig, HttpClient, Opcode, TX_BUFFER_CAPACITY, TcpTransport, WebSocketClient,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args = noargs::raw_args();
    args.metadata_mut().app_name = "websocket_echo";

    // --help フラグ
    noargs::HELP_FLAG.take_help(&mut args);

    // --host オプション
    let host: String = noargs::opt("host")
        .short('H')
        .doc("Server host name (default: localhost)")
        .default("localhost")
        .take(&mut args)
        .then(|o| Ok::<_, &str>(o.value().to_string()))
        .map_err(|e| format!("{:?}", e))?;

    // --port オプション
    let port: u16 = noargs::opt("port")
        .short('p')
        .doc("Server port (default: 80)")
        .default("80")
        .take(&mut args)
        .then(|o| o.value().parse())
        .map_err(|e| format!("{:?}", e))?;

    // --path オプション
    let path: String = noargs::opt("path")
        .doc("Request path (default: /)")
        .default("/")
        .take(&mut args)
        .then(|o| Ok::<_, &str>(o.value().to_string()))
        .map_err(|e| format!("{:?}", e))?;

    // 位置引数: 送信するメッセージ
    let mut messages = Vec::new();
    while let Some(message) = noargs::arg("[MESSAGE]...")
        .doc("Text messages to send")
        .take(&mut args)
        .present_and_then(|a| Ok::<_, &str>(a.value().to_string()))
        .map_err(|e| format!("{:?}", e))?
    {
        messages.push(message);
    }

    // 未知の引数があればエラー、ヘルプが返されたら表示
    if let Some(help) = args.finish().map_err(|e| format!("{:?}", e))? {
        print!("{}", help);
        return Ok(());
    }

    let config = ClientConfig::default().wait_for_data_delay(Duration::from_millis(10));
    let http = HttpClient::new(TcpTransport::new(), &host, port).with_config(config);
    let mut ws = WebSocketClient::from(http);
    ws.begin(&path)?;
    log::info!("connected to ws://{}:{}{}", host, port, path);

    ws.ping()?;
    for message in &messages {
        if message.len() > TX_BUFFER_CAPACITY {
            log::warn!("message truncated to {} bytes", TX_BUFFER_CAPACITY);
        }
        ws.begin_message(Opcode::Text)?;
        ws.write(message.as_bytes())?;
        ws.end_message()?;

        let reply = receive_text(&mut ws)?;
        println!("< {}", reply);
    }

    ws.stop();
    Ok(())
}

/// 次のデータフレームを待って文字列として読み取る
fn receive_text(
    ws: &mut WebSocketClient<TcpTransport>,
) -> Result<String, Box<dyn std::error::Error>> {
    loop {
        let size = ws.parse_message()?;
        if !ws.connected() {
            return Err("connection closed by server".into());
        }
        if size > 0 {
            return Ok(ws.read_string()?);
        }
        std::thread::sleep(Duration::from_millis(10));
    }
}
