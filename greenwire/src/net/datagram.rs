use crate::reactor::poller::platform::sys_poll_events;
use crate::transport::{Attempt, Events, Frame, OptionValue, SocketOption, Transport};

use bytes::{BufMut, Bytes, BytesMut};
use std::collections::HashMap;
use std::io;
use std::net::Shutdown;
use std::os::fd::{AsRawFd, RawFd};
use std::os::unix::net::UnixDatagram;
use std::path::Path;
use std::time::Duration;

/// Largest payload accepted by default, in bytes.
pub const DEFAULT_MAX_FRAME: usize = 64 * 1024;

/// Header bit marking that more frames of the message follow.
const MORE: u8 = 0b0000_0001;

/// Prefixes a payload with its one-byte frame header.
fn encode(payload: &[u8], more: bool) -> Bytes {
    let mut buf = BytesMut::with_capacity(payload.len() + 1);
    buf.put_u8(if more { MORE } else { 0 });
    buf.put_slice(payload);
    buf.freeze()
}

/// Splits a datagram into its header and payload.
fn decode(datagram: Bytes) -> io::Result<Frame> {
    let Some(&header) = datagram.first() else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "datagram is missing its frame header",
        ));
    };

    Ok(Frame {
        payload: datagram.slice(1..),
        more: header & MORE != 0,
    })
}

/// Receives one datagram into `buf`.
///
/// Returns the number of bytes stored and whether the kernel cut the
/// datagram short to fit.
fn recv_datagram(fd: RawFd, buf: &mut [u8]) -> io::Result<(usize, bool)> {
    let mut iov = libc::iovec {
        iov_base: buf.as_mut_ptr().cast(),
        iov_len: buf.len(),
    };

    let mut msg: libc::msghdr = unsafe { std::mem::zeroed() };
    msg.msg_iov = &mut iov;
    msg.msg_iovlen = 1;

    loop {
        let n = unsafe { libc::recvmsg(fd, &mut msg, 0) };
        if n >= 0 {
            return Ok((n as usize, msg.msg_flags & libc::MSG_TRUNC != 0));
        }

        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}

/// A message transport over a non-blocking Unix datagram socket.
///
/// Every frame travels as one datagram. Multi-frame messages keep
/// their boundaries through a one-byte header.
///
/// Once any [`SocketOption::Subscribe`] is set, messages whose first
/// frame does not start with a subscribed prefix are dropped whole,
/// the way a subscriber socket filters topics.
///
/// A datagram longer than [`max_frame`](Self::max_frame) fails with
/// [`io::ErrorKind::InvalidData`], and the rest of its message is
/// skipped.
pub struct DatagramTransport {
    /// `None` once closed.
    socket: Option<UnixDatagram>,
    fd: RawFd,
    max_frame: usize,

    /// Receive buffer, sized to `max_frame` plus the header.
    buf: Vec<u8>,

    subscriptions: Vec<Bytes>,
    filtering: bool,

    /// The next datagram continues the current message.
    in_message: bool,
    /// The current message failed the subscription filter.
    discarding: bool,
    /// The last delivered frame had `more` set.
    receive_more: bool,

    /// Plain integer options, stored for the caller.
    options: HashMap<SocketOption, i64>,
}

impl DatagramTransport {
    /// Wraps an existing socket, switching it to non-blocking mode.
    pub fn from_socket(socket: UnixDatagram) -> io::Result<Self> {
        socket.set_nonblocking(true)?;

        Ok(Self {
            fd: socket.as_raw_fd(),
            socket: Some(socket),
            max_frame: DEFAULT_MAX_FRAME,
            buf: Vec::new(),
            subscriptions: Vec::new(),
            filtering: false,
            in_message: false,
            discarding: false,
            receive_more: false,
            options: HashMap::new(),
        })
    }

    /// Creates two transports connected to each other.
    pub fn pair() -> io::Result<(Self, Self)> {
        let (a, b) = UnixDatagram::pair()?;
        Ok((Self::from_socket(a)?, Self::from_socket(b)?))
    }

    /// Creates a transport bound to `path`.
    pub fn bind(path: impl AsRef<Path>) -> io::Result<Self> {
        Self::from_socket(UnixDatagram::bind(path)?)
    }

    /// Creates an unbound transport sending to `path`.
    pub fn connect(path: impl AsRef<Path>) -> io::Result<Self> {
        let socket = UnixDatagram::unbound()?;
        socket.connect(path)?;
        Self::from_socket(socket)
    }

    /// Sets the largest payload accepted by `send` and `recv`.
    pub fn max_frame(mut self, bytes: usize) -> Self {
        self.max_frame = bytes;
        self
    }

    fn socket(&self) -> io::Result<&UnixDatagram> {
        self.socket
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "transport is closed"))
    }

    fn subscribed(&self, payload: &[u8]) -> bool {
        self.subscriptions
            .iter()
            .any(|prefix| payload.starts_with(prefix))
    }

    /// Receives the next datagram, dropping filtered messages.
    fn recv_frame(&mut self) -> io::Result<Frame> {
        let fd = self.socket()?.as_raw_fd();
        self.buf.resize(self.max_frame + 1, 0);

        loop {
            let (n, truncated) = recv_datagram(fd, &mut self.buf)?;

            if truncated {
                // The header survived, so the message boundary is known.
                let more = self.buf.first().is_some_and(|&header| header & MORE != 0);
                self.in_message = more;
                self.discarding = more;

                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "datagram exceeds the maximum frame size",
                ));
            }

            let frame = decode(Bytes::copy_from_slice(&self.buf[..n]))?;

            if !self.in_message {
                self.discarding = self.filtering && !self.subscribed(&frame.payload);
            }
            self.in_message = frame.more;

            if self.discarding {
                continue;
            }

            self.receive_more = frame.more;
            return Ok(frame);
        }
    }

    fn default_option(option: SocketOption) -> i64 {
        match option {
            SocketOption::SendHighWaterMark | SocketOption::ReceiveHighWaterMark => 1000,
            _ => -1,
        }
    }
}

fn invalid(msg: &'static str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, msg)
}

impl Transport for DatagramTransport {
    fn descriptor(&self) -> RawFd {
        self.fd
    }

    fn tracks_writability(&self) -> bool {
        true
    }

    fn send(&mut self, frame: &[u8], more: bool) -> Attempt<()> {
        if frame.len() > self.max_frame {
            return Attempt::Failed(invalid("frame exceeds the maximum frame size"));
        }

        let datagram = encode(frame, more);
        self.socket()
            .and_then(|socket| socket.send(&datagram))
            .map(|_| ())
            .into()
    }

    fn recv(&mut self) -> Attempt<Frame> {
        self.recv_frame().into()
    }

    fn events(&self) -> io::Result<Events> {
        self.socket()?;
        sys_poll_events(self.fd)
    }

    fn get_option(&self, option: SocketOption) -> io::Result<OptionValue> {
        let value = match option {
            SocketOption::Events => OptionValue::Events(self.events()?),
            SocketOption::Descriptor => OptionValue::Int(i64::from(self.fd)),
            SocketOption::ReceiveMore => OptionValue::Int(i64::from(self.receive_more)),
            SocketOption::Subscribe | SocketOption::Unsubscribe => {
                return Err(invalid("option is write-only"));
            }
            other => OptionValue::Int(
                self.options
                    .get(&other)
                    .copied()
                    .unwrap_or_else(|| Self::default_option(other)),
            ),
        };

        Ok(value)
    }

    fn set_option(&mut self, option: SocketOption, value: OptionValue) -> io::Result<()> {
        match (option, value) {
            (SocketOption::Subscribe, OptionValue::Bytes(prefix)) => {
                self.subscriptions.push(prefix);
                self.filtering = true;
            }
            (SocketOption::Unsubscribe, OptionValue::Bytes(prefix)) => {
                if let Some(pos) = self.subscriptions.iter().position(|p| *p == prefix) {
                    self.subscriptions.remove(pos);
                }
            }
            (SocketOption::Events | SocketOption::Descriptor | SocketOption::ReceiveMore, _) => {
                return Err(invalid("option is read-only"));
            }
            (SocketOption::Subscribe | SocketOption::Unsubscribe, _) => {
                return Err(invalid("subscriptions take a byte prefix"));
            }
            (other, OptionValue::Int(v)) => {
                self.options.insert(other, v);
            }
            (_, _) => return Err(invalid("option takes an integer")),
        }

        Ok(())
    }

    /// Datagrams are handed to the kernel on send, so `linger` has
    /// nothing to wait for.
    fn close(&mut self, _linger: Option<Duration>) {
        if let Some(socket) = self.socket.take() {
            let _ = socket.shutdown(Shutdown::Both);
        }
    }
}
