//! HTTP クライアントの例
//!
//! 使い方:
//!   cargo run -p http11_get -- http://httpbin.org/get
//!   RUST_LOG=debug cargo run -p http11_get -- --headers --timeout 5 http://example.com/

use std::time::Duration;

use shiguredo_http11_client::{ClientConfig, HttpClient, TcpTransport};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args = noargs::raw_args();
    args.metadata_mut().app_name = "http11_get";

    // --help フラグ
    noargs::HELP_FLAG.take_help(&mut args);

    // --version フラグ
    let version_flag: bool = noargs::flag("version")
        .short('V')
        .doc("Show version")
        .take(&mut args)
        .is_present();
    if version_flag {
        println!("{}", env!("CARGO_PKG_VERSION"));
        std::process::exit(0);
    }

    // --headers フラグ
    let show_headers: bool = noargs::flag("headers")
        .short('i')
        .doc("Print response headers")
        .take(&mut args)
        .is_present();

    // --timeout オプション
    let timeout_secs: u64 = noargs::opt("timeout")
        .short('t')
        .doc("Response timeout in seconds (default: 30)")
        .default("30")
        .take(&mut args)
        .then(|o| o.value().parse())
        .map_err(|e| format!("{:?}", e))?;

    // 位置引数: URL
    let url: String = noargs::arg("<URL>")
        .doc("URL to fetch (e.g., http://example.com/)")
        .take(&mut args)
        .then(|a| Ok::<_, &str>(a.value().to_string()))
        .map_err(|e| format!("{:?}", e))?;

    // 未知の引数があればエラー、ヘルプが返されたら表示
    if let Some(help) = args.finish().map_err(|e| format!("{:?}", e))? {
        print!("{}", help);
        return Ok(());
    }

    let (host, port, path) = parse_url(&url)?;
    log::info!("connecting to {}:{}", host, port);

    let config = ClientConfig::default()
        .response_timeout(Duration::from_secs(timeout_secs))
        .wait_for_data_delay(Duration::from_millis(10));
    let mut client = HttpClient::new(TcpTransport::new(), &host, port).with_config(config);

    client.get(&path)?;
    let status_code = client.response_status_code()?;
    println!("Status: {}", status_code);

    if show_headers {
        while client.header_available()? {
            println!("{}: {}", client.read_header_name(), client.read_header_value());
        }
        println!();
    }

    match client.content_length()? {
        Some(length) => log::debug!("content-length: {}", length),
        None if client.is_response_chunked() => log::debug!("chunked body"),
        None => log::debug!("body until connection close"),
    }

    let body = client.response_body()?;
    println!("{}", String::from_utf8_lossy(&body));
    client.stop();

    Ok(())
}

fn parse_url(url: &str) -> Result<(String, u16, String), Box<dyn std::error::Error>> {
    let Some(rest) = url.strip_prefix("http://") else {
        return Err("URL must start with http://".into());
    };

    let (host_port, path) = match rest.find('/') {
        Some(i) => (&rest[..i], &rest[i..]),
        None => (rest, "/"),
    };

    let (host, port) = match host_port.find(':') {
        Some(i) => {
            let port: u16 = host_port[i + 1..].parse()?;
            (&host_port[..i], port)
        }
        None => (host_port, 80),
    };

    Ok((host.to_string(), port, path.to_string()))
}
