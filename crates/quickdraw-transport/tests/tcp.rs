//! Integration tests for the TCP line transport against real sockets.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use quickdraw_transport::{Connection, TcpLineTransport, Transport};

/// Binds a transport on an ephemeral port and returns it with its address.
async fn bind_transport() -> (TcpLineTransport, String) {
    let transport = TcpLineTransport::bind("127.0.0.1:0")
        .await
        .expect("should bind");
    let addr = transport
        .local_addr()
        .expect("should have local addr")
        .to_string();
    (transport, addr)
}

#[tokio::test]
async fn test_accept_assigns_unique_connection_ids() {
    let (mut transport, addr) = bind_transport().await;

    let _c1 = TcpStream::connect(&addr).await.expect("connect 1");
    let _c2 = TcpStream::connect(&addr).await.expect("connect 2");

    let a = transport.accept().await.expect("accept 1");
    let b = transport.accept().await.expect("accept 2");

    assert_ne!(a.id(), b.id());
}

#[tokio::test]
async fn test_write_line_appends_newline() {
    let (mut transport, addr) = bind_transport().await;

    let client = TcpStream::connect(&addr).await.expect("connect");
    let server_conn = transport.accept().await.expect("accept");

    server_conn.write_line("NAME:Player_1").await.expect("write");

    let mut lines = BufReader::new(client).lines();
    let line = lines.next_line().await.expect("read").expect("some line");
    assert_eq!(line, "NAME:Player_1");
}

#[tokio::test]
async fn test_read_line_strips_terminator() {
    let (mut transport, addr) = bind_transport().await;

    let mut client = TcpStream::connect(&addr).await.expect("connect");
    let server_conn = transport.accept().await.expect("accept");

    client.write_all(b"CLICK\r\n").await.expect("send");

    let line = server_conn.read_line().await.expect("read");
    assert_eq!(line.as_deref(), Some("CLICK"));
}

#[tokio::test]
async fn test_read_line_returns_none_on_eof() {
    let (mut transport, addr) = bind_transport().await;

    let client = TcpStream::connect(&addr).await.expect("connect");
    let server_conn = transport.accept().await.expect("accept");

    drop(client);

    let line = server_conn.read_line().await.expect("read");
    assert_eq!(line, None);
}

#[tokio::test]
async fn test_concurrent_write_while_read_pending() {
    // A pending read must not block writes: the reader task sits in
    // read_line while the writer task delivers a line to the client.
    let (mut transport, addr) = bind_transport().await;

    let client = TcpStream::connect(&addr).await.expect("connect");
    let server_conn =
        std::sync::Arc::new(transport.accept().await.expect("accept"));

    let reader_conn = std::sync::Arc::clone(&server_conn);
    let pending_read =
        tokio::spawn(async move { reader_conn.read_line().await });

    // Give the read a moment to park on the socket.
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;

    server_conn.write_line("GO").await.expect("write should not block");

    let mut lines = BufReader::new(client).lines();
    let line = lines.next_line().await.expect("read").expect("some line");
    assert_eq!(line, "GO");

    // Unblock and finish the pending read by dropping the client.
    drop(lines);
    let result = pending_read.await.expect("join");
    assert_eq!(result.expect("read ok"), None);
}

#[tokio::test]
async fn test_roundtrip_multiple_lines_in_order() {
    let (mut transport, addr) = bind_transport().await;

    let mut client = TcpStream::connect(&addr).await.expect("connect");
    let server_conn = transport.accept().await.expect("accept");

    client
        .write_all(b"CLICK\nCOLLECT_RESOURCE\nQUIT\n")
        .await
        .expect("send");

    assert_eq!(
        server_conn.read_line().await.expect("read").as_deref(),
        Some("CLICK")
    );
    assert_eq!(
        server_conn.read_line().await.expect("read").as_deref(),
        Some("COLLECT_RESOURCE")
    );
    assert_eq!(
        server_conn.read_line().await.expect("read").as_deref(),
        Some("QUIT")
    );
}
