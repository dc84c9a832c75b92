#![allow(dead_code)]

use bytes::Bytes;
use greenwire::transport::{Attempt, Events, Frame, OptionValue, SocketOption, Transport};
use greenwire::{GreenSocket, SocketConfig};

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io;
use std::os::fd::{AsRawFd, RawFd};
use std::os::unix::net::UnixDatagram;
use std::rc::Rc;
use std::time::Duration;

/// One scripted outcome of a transport call.
pub enum Step<T> {
    Ready(T),
    WouldBlock,
    Fail(io::ErrorKind),
}

pub fn frame(payload: &'static str, more: bool) -> Step<Frame> {
    Step::Ready(Frame::new(payload.as_bytes(), more))
}

/// Everything the transport observed, shared with the test.
#[derive(Default)]
pub struct Probe {
    pub sent: RefCell<Vec<(Bytes, bool)>>,
    pub send_attempts: Cell<usize>,
    pub recv_attempts: Cell<usize>,
    pub closed: Cell<usize>,
    pub linger: Cell<Option<Duration>>,
    pub options: RefCell<Vec<(SocketOption, OptionValue)>>,

    /// What `events()` reports.
    pub events: Cell<Events>,
}

/// Makes the transport descriptor readable, producing a reactor edge.
pub struct Kicker(UnixDatagram);

impl Kicker {
    pub fn kick(&self) {
        let _ = self.0.send(&[1]);
    }
}

/// A transport replaying scripted outcomes.
///
/// An exhausted receive script keeps reporting would-block; an
/// exhausted send script keeps succeeding. Its descriptor is one end
/// of a real datagram pair, drained on every attempt.
pub struct ScriptedTransport {
    recv_script: VecDeque<Step<Frame>>,
    send_script: VecDeque<Step<()>>,
    signal: UnixDatagram,
    probe: Rc<Probe>,
}

impl ScriptedTransport {
    pub fn new() -> (Self, Kicker, Rc<Probe>) {
        let (signal, peer) = UnixDatagram::pair().unwrap();
        signal.set_nonblocking(true).unwrap();
        peer.set_nonblocking(true).unwrap();

        let probe = Rc::new(Probe::default());
        let transport = Self {
            recv_script: VecDeque::new(),
            send_script: VecDeque::new(),
            signal,
            probe: probe.clone(),
        };

        (transport, Kicker(peer), probe)
    }

    pub fn recv_steps(mut self, steps: impl IntoIterator<Item = Step<Frame>>) -> Self {
        self.recv_script.extend(steps);
        self
    }

    pub fn send_steps(mut self, steps: impl IntoIterator<Item = Step<()>>) -> Self {
        self.send_script.extend(steps);
        self
    }

    fn drain(&self) {
        let mut buf = [0u8; 16];
        while self.signal.recv(&mut buf).is_ok() {}
    }
}

impl Transport for ScriptedTransport {
    fn descriptor(&self) -> RawFd {
        self.signal.as_raw_fd()
    }

    fn send(&mut self, frame: &[u8], more: bool) -> Attempt<()> {
        self.probe.send_attempts.set(self.probe.send_attempts.get() + 1);
        self.drain();

        match self.send_script.pop_front().unwrap_or(Step::Ready(())) {
            Step::Ready(()) => {
                self.probe
                    .sent
                    .borrow_mut()
                    .push((Bytes::copy_from_slice(frame), more));
                Attempt::Ready(())
            }
            Step::WouldBlock => Attempt::WouldBlock,
            Step::Fail(kind) => Attempt::Failed(io::Error::from(kind)),
        }
    }

    fn recv(&mut self) -> Attempt<Frame> {
        self.probe.recv_attempts.set(self.probe.recv_attempts.get() + 1);
        self.drain();

        match self.recv_script.pop_front() {
            Some(Step::Ready(frame)) => Attempt::Ready(frame),
            Some(Step::WouldBlock) | None => Attempt::WouldBlock,
            Some(Step::Fail(kind)) => Attempt::Failed(io::Error::from(kind)),
        }
    }

    fn events(&self) -> io::Result<Events> {
        Ok(self.probe.events.get())
    }

    fn get_option(&self, option: SocketOption) -> io::Result<OptionValue> {
        match option {
            SocketOption::Events => Ok(OptionValue::Events(self.probe.events.get())),
            _ => Ok(OptionValue::Int(0)),
        }
    }

    fn set_option(&mut self, option: SocketOption, value: OptionValue) -> io::Result<()> {
        self.probe.options.borrow_mut().push((option, value));
        Ok(())
    }

    fn close(&mut self, linger: Option<Duration>) {
        self.probe.closed.set(self.probe.closed.get() + 1);
        self.probe.linger.set(linger);
    }
}

/// Config with a short watchdog, so scripted would-blocks retry quickly.
pub fn fast_watchdog() -> SocketConfig {
    SocketConfig::new().watchdog(Some(Duration::from_millis(5)))
}

/// Config without a watchdog: waits end only on a signal.
pub fn no_watchdog() -> SocketConfig {
    SocketConfig::new().watchdog(None)
}

pub fn socket(transport: ScriptedTransport, config: SocketConfig) -> GreenSocket<ScriptedTransport> {
    GreenSocket::with_config(transport, config).unwrap()
}
