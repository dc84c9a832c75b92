use bytes::Bytes;
use greenwire::net::DatagramTransport;
use greenwire::task;
use greenwire::time::{sleep, timeout};
use greenwire::transport::{Flags, OptionValue, SocketOption};
use greenwire::{GreenSocket, SocketConfig, SocketError};

use std::io;
use std::time::Duration;

fn pair(config: SocketConfig) -> (GreenSocket<DatagramTransport>, GreenSocket<DatagramTransport>) {
    let (a, b) = DatagramTransport::pair().unwrap();
    (
        GreenSocket::with_config(a, config).unwrap(),
        GreenSocket::with_config(b, config).unwrap(),
    )
}

#[greenwire::test]
async fn test_ping_pong() {
    let (client, server) = pair(SocketConfig::new());

    let echo = task::spawn(async move {
        for _ in 0..3 {
            let frame = server.recv(Flags::NONE).await?;
            server.send(frame.payload, Flags::NONE).await?;
        }
        Ok::<_, greenwire::SocketError>(())
    });

    for word in ["ping", "pong", "pang"] {
        client.send(word, Flags::NONE).await.unwrap();
        let reply = client.recv(Flags::NONE).await.unwrap();
        assert_eq!(reply.payload, word);
    }

    echo.await.unwrap();
}

#[greenwire::test]
async fn test_parked_receiver_is_woken_by_datagram() {
    let (a, b) = pair(SocketConfig::new());

    let reader = task::spawn(async move {
        let frame = b.recv(Flags::NONE).await.unwrap();
        (frame.payload, b.stats())
    });

    sleep(Duration::from_millis(20)).await;
    a.send("late", Flags::NONE).await.unwrap();

    let (payload, stats) = timeout(Duration::from_secs(2), reader).await.unwrap();
    assert_eq!(payload, "late");
    assert!(stats.edges >= 1);
    assert_eq!(stats.watchdog_expiries, 0);
}

#[greenwire::test]
async fn test_multipart_message() {
    let (a, b) = pair(SocketConfig::new());

    a.send_batch(["topic", "header", "body"]).await.unwrap();
    a.send("single", Flags::NONE).await.unwrap();

    assert_eq!(b.recv_batch().await.unwrap(), ["topic", "header", "body"]);
    assert_eq!(b.recv_batch().await.unwrap(), ["single"]);
}

#[greenwire::test]
async fn test_receive_more_option() {
    let (a, b) = pair(SocketConfig::new());

    a.send_batch(["one", "two"]).await.unwrap();

    let first = b.recv(Flags::NONE).await.unwrap();
    assert!(first.more);
    assert_eq!(b.get_option(SocketOption::ReceiveMore).unwrap(), OptionValue::Int(1));

    let second = b.recv(Flags::NONE).await.unwrap();
    assert!(!second.more);
    assert_eq!(b.get_option(SocketOption::ReceiveMore).unwrap(), OptionValue::Int(0));
}

#[greenwire::test]
async fn test_subscription_filters_messages() {
    let (publisher, subscriber) = pair(SocketConfig::new());

    subscriber
        .set_option(SocketOption::Subscribe, OptionValue::Bytes(Bytes::from_static(b"news")))
        .unwrap();

    publisher.send_batch(["sports", "goal"]).await.unwrap();
    publisher.send_batch(["news.eu", "vote"]).await.unwrap();

    assert_eq!(subscriber.recv_batch().await.unwrap(), ["news.eu", "vote"]);

    let mut cx = std::task::Context::from_waker(std::task::Waker::noop());
    let empty = std::pin::pin!(subscriber.recv(Flags::DONT_WAIT));
    assert!(matches!(
        std::future::Future::poll(empty, &mut cx),
        std::task::Poll::Ready(Err(greenwire::SocketError::WouldBlock))
    ));
}

#[greenwire::test]
async fn test_backpressure_resolves() {
    const COUNT: u32 = 2_000;

    let config = SocketConfig::new().watchdog(Some(Duration::from_millis(200)));
    let (writer, reader) = pair(config);

    let producer = task::spawn(async move {
        for i in 0..COUNT {
            writer.send(i.to_be_bytes(), Flags::NONE).await.unwrap();
        }
        writer.stats()
    });

    for expected in 0..COUNT {
        let frame = timeout(Duration::from_secs(5), reader.recv(Flags::NONE))
            .await
            .expect("reader stalled")
            .unwrap();
        assert_eq!(frame.payload, expected.to_be_bytes()[..]);
    }

    let stats = producer.await;
    assert_eq!(stats.resyncs, u64::from(COUNT));
}

#[greenwire::test]
async fn test_bound_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("greenwire.sock");

    let server = GreenSocket::new(DatagramTransport::bind(&path).unwrap()).unwrap();
    let client = GreenSocket::new(DatagramTransport::connect(&path).unwrap()).unwrap();

    client.send_batch(["hello", "world"]).await.unwrap();

    assert_eq!(server.recv_batch().await.unwrap(), ["hello", "world"]);
}

#[greenwire::test]
async fn test_oversized_frame_fails() {
    let (a, b) = DatagramTransport::pair().unwrap();
    let a = GreenSocket::with_config(a.max_frame(4), SocketConfig::new()).unwrap();
    let _b = GreenSocket::with_config(b, SocketConfig::new()).unwrap();

    let err = a.send("too long", Flags::NONE).await.unwrap_err();
    assert!(matches!(err, greenwire::SocketError::Transport(_)));
    assert!(!a.is_closed());
}

#[greenwire::test]
async fn test_long_datagram_is_rejected() {
    let (a, b) = DatagramTransport::pair().unwrap();
    let a = GreenSocket::with_config(a, SocketConfig::new()).unwrap();
    let b = GreenSocket::with_config(b.max_frame(16), SocketConfig::new()).unwrap();

    a.send([7u8; 64], Flags::NONE).await.unwrap();
    a.send("fits", Flags::NONE).await.unwrap();

    let err = b.recv(Flags::NONE).await.unwrap_err();
    assert!(matches!(err, SocketError::Transport(ref e) if e.kind() == io::ErrorKind::InvalidData));
    assert!(!b.is_closed());

    assert_eq!(b.recv(Flags::NONE).await.unwrap().payload, "fits");
}

#[greenwire::test]
async fn test_unread_datagram_does_not_spin() {
    let (a, b) = pair(SocketConfig::new());

    a.send("x", Flags::NONE).await.unwrap();
    sleep(Duration::from_millis(100)).await;

    let stats = b.stats();
    assert!(stats.edges <= 1, "idle socket saw {} edges", stats.edges);

    // The pending datagram is still there for the next reader.
    assert_eq!(b.recv(Flags::NONE).await.unwrap().payload, "x");

    let reader = task::spawn(async move {
        let frame = b.recv(Flags::NONE).await.unwrap();
        (frame.payload, b.stats().edges)
    });

    sleep(Duration::from_millis(20)).await;
    a.send("y", Flags::NONE).await.unwrap();

    let (payload, edges) = timeout(Duration::from_secs(2), reader).await.unwrap();
    assert_eq!(payload, "y");
    assert!(edges >= 1);
}

#[greenwire::test]
async fn test_close_shuts_down_transport() {
    let (a, b) = pair(SocketConfig::new());

    a.close();

    assert!(a.send("x", Flags::NONE).await.unwrap_err().is_closed());
    assert!(b.send("x", Flags::NONE).await.is_err());
}
