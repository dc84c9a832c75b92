mod common;

use common::{ScriptedTransport, Step, fast_watchdog, frame, no_watchdog, socket};

use bytes::Bytes;
use greenwire::transport::Flags;
use greenwire::{SocketError, task, yield_now};

use std::io;

fn flags(sent: &[(Bytes, bool)]) -> Vec<bool> {
    sent.iter().map(|(_, more)| *more).collect()
}

#[greenwire::test]
async fn test_send_batch_marks_all_but_last() {
    let (transport, _kicker, probe) = ScriptedTransport::new();
    let sock = socket(transport, no_watchdog());

    sock.send_batch(["topic", "a", "b"]).await.unwrap();

    let sent = probe.sent.borrow();
    assert_eq!(flags(&sent), [true, true, false]);
    assert_eq!(sent[0].0, "topic");
    assert_eq!(sock.stats().resyncs, 1, "a batch resyncs once");
}

#[greenwire::test]
async fn test_send_batch_with_retries_resyncs_once() {
    let (transport, _kicker, probe) = ScriptedTransport::new();
    let transport = transport.send_steps([
        Step::Ready(()),
        Step::WouldBlock,
        Step::Ready(()),
        Step::Ready(()),
    ]);
    let sock = socket(transport, fast_watchdog());

    sock.send_batch(["a", "b", "c"]).await.unwrap();

    assert_eq!(probe.send_attempts.get(), 4);
    assert_eq!(flags(&probe.sent.borrow()), [true, true, false]);

    let stats = sock.stats();
    assert_eq!(stats.resyncs, 1);
    assert_eq!(stats.watchdog_expiries, 1);
}

#[greenwire::test]
async fn test_send_batch_failure_resyncs_once() {
    let (transport, _kicker, probe) = ScriptedTransport::new();
    let transport =
        transport.send_steps([Step::Ready(()), Step::Fail(io::ErrorKind::BrokenPipe)]);
    let sock = socket(transport, no_watchdog());

    let err = sock.send_batch(["a", "b", "c"]).await.unwrap_err();

    assert!(matches!(err, SocketError::Transport(ref e) if e.kind() == io::ErrorKind::BrokenPipe));
    assert_eq!(probe.sent.borrow().len(), 1);
    assert_eq!(sock.stats().resyncs, 1);
}

#[greenwire::test]
async fn test_empty_batch_still_resyncs() {
    let (transport, _kicker, probe) = ScriptedTransport::new();
    let sock = socket(transport, no_watchdog());

    sock.send_batch(Vec::<Bytes>::new()).await.unwrap();

    assert_eq!(probe.send_attempts.get(), 0);
    assert_eq!(sock.stats().resyncs, 1);
}

#[greenwire::test]
async fn test_recv_batch_collects_message() {
    let (transport, _kicker, _probe) = ScriptedTransport::new();
    let transport = transport.recv_steps([
        frame("a", true),
        Step::WouldBlock,
        frame("b", true),
        frame("c", false),
        frame("next", false),
    ]);
    let sock = socket(transport, fast_watchdog());

    let frames = sock.recv_batch().await.unwrap();

    assert_eq!(frames, ["a", "b", "c"]);
    assert_eq!(sock.stats().resyncs, 1);

    // The following message is left for the next call.
    let next = sock.recv(Flags::NONE).await.unwrap();
    assert_eq!(next.payload, "next");
    assert_eq!(sock.stats().resyncs, 2);
}

#[greenwire::test]
async fn test_calls_after_batch_resync_individually() {
    let (transport, _kicker, _probe) = ScriptedTransport::new();
    let sock = socket(transport, no_watchdog());

    sock.send_batch(["a", "b"]).await.unwrap();
    sock.send("c", Flags::NONE).await.unwrap();
    sock.send("d", Flags::MORE).await.unwrap();

    assert_eq!(sock.stats().resyncs, 3);
}

#[greenwire::test]
async fn test_overlapping_batches_resync_once_each() {
    let (transport, _kicker, probe) = ScriptedTransport::new();
    let transport = transport.send_steps([Step::Ready(()), Step::WouldBlock]);
    let sock = socket(transport, fast_watchdog());

    let first = {
        let sock = sock.clone();
        task::spawn(async move { sock.send_batch(["a1", "a2"]).await })
    };

    // Let the first batch park on its second frame.
    yield_now().await;
    yield_now().await;
    assert_eq!(probe.send_attempts.get(), 2);
    assert_eq!(sock.stats().resyncs, 0);

    sock.send_batch(["b1", "b2", "b3"]).await.unwrap();
    assert_eq!(sock.stats().resyncs, 1, "the second batch resyncs on its own");

    first.await.unwrap();
    assert_eq!(sock.stats().resyncs, 2);

    let sent: Vec<Bytes> = probe.sent.borrow().iter().map(|(frame, _)| frame.clone()).collect();
    assert_eq!(sent, ["a1", "b1", "b2", "b3", "a2"]);
}
