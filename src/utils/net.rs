use tokio::net::TcpStream;

/// "host:port" for a node
pub(crate) fn address_str(
    host: &str,
    port: u16,
) -> String {
    format!("{}:{}", host, port)
}

pub(crate) async fn is_server_ready(addr: &str) -> bool {
    TcpStream::connect(addr).await.is_ok()
}
