pub mod frame;

use std::{
    io::ErrorKind,
    net::{Shutdown, SocketAddr, TcpListener, TcpStream},
    time::Duration,
};

use log::{debug, info, warn};

use crate::{
    Position,
    error::{DyadError, Result},
    role::Role,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct LinkOptions {
    /// Bound on each send/receive. `None` blocks forever, which is the
    /// historical behaviour: a hung peer hangs this side too.
    pub timeout: Option<Duration>,
}

/// The listening side of the host, before its single peer has arrived
pub struct LinkListener {
    listener: TcpListener,
}

impl LinkListener {
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr).map_err(|source| DyadError::Bind { addr, source })?;
        Ok(LinkListener { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().map_err(DyadError::Accept)
    }

    /// Block until exactly one peer connects. The listener is consumed, so no
    /// further peers can be accepted.
    pub fn accept(self, options: LinkOptions) -> Result<LinkChannel> {
        info!("Waiting for client to connect");
        let (stream, peer) = self.listener.accept().map_err(DyadError::Accept)?;
        info!("Client connected from {}", peer);
        LinkChannel::from_stream(Role::Host, stream, peer, options)
    }
}

/// One full-duplex stream between the two ends of the dyad, exchanging a
/// single position frame per tick in each direction.
pub struct LinkChannel {
    role: Role,
    stream: Option<TcpStream>,
    peer: SocketAddr,
    timeout: Option<Duration>,
}

impl LinkChannel {
    pub fn connect_as_host(bind_addr: SocketAddr, options: LinkOptions) -> Result<Self> {
        LinkListener::bind(bind_addr)?.accept(options)
    }

    pub fn connect_as_client(host_addr: SocketAddr, options: LinkOptions) -> Result<Self> {
        info!("Connecting to {}", host_addr);
        let stream = TcpStream::connect(host_addr).map_err(|source| DyadError::Connect {
            addr: host_addr,
            source,
        })?;
        info!("Connected to host at {}", host_addr);
        LinkChannel::from_stream(Role::Client, stream, host_addr, options)
    }

    fn from_stream(
        role: Role,
        stream: TcpStream,
        peer: SocketAddr,
        options: LinkOptions,
    ) -> Result<Self> {
        if let Err(e) = stream.set_nodelay(true) {
            warn!("Could not disable Nagle on link to {}: {}", peer, e);
        }
        stream
            .set_read_timeout(options.timeout)
            .and_then(|()| stream.set_write_timeout(options.timeout))
            .map_err(DyadError::LinkLost)?;
        match options.timeout {
            Some(t) => debug!("Link send/receive bounded to {:?}", t),
            None => debug!("Link send/receive will block without a timeout"),
        }
        Ok(LinkChannel {
            role,
            stream: Some(stream),
            peer,
            timeout: options.timeout,
        })
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// Send our position and receive the peer's. The host always sends
    /// first and the client always receives first; if both ends received
    /// first, neither would ever get a frame.
    ///
    /// Any failure is fatal: the channel is closed and every later call
    /// fails without touching the socket.
    pub fn exchange(&mut self, local: &Position) -> Result<Position> {
        let role = self.role;
        let timeout = self.timeout;
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| DyadError::LinkLost(ErrorKind::NotConnected.into()))?;

        let result = match role {
            Role::Host => {
                frame::write_frame(stream, local).and_then(|()| frame::read_frame(stream))
            }
            Role::Client => frame::read_frame(stream)
                .and_then(|remote| frame::write_frame(stream, local).map(|()| remote)),
        }
        .map_err(|e| classify(e, timeout));

        if result.is_err() {
            self.close();
        }
        result
    }

    /// Shut down both directions and drop the stream. Safe to call again.
    pub fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            info!("Closing link to {}", self.peer);
            if let Err(e) = stream.shutdown(Shutdown::Both) {
                debug!("Link shutdown reported {}; already gone?", e);
            }
        }
    }
}

impl Drop for LinkChannel {
    fn drop(&mut self) {
        self.close();
    }
}

/// An expired read/write timeout surfaces as WouldBlock or TimedOut,
/// depending on platform.
fn classify(e: DyadError, timeout: Option<Duration>) -> DyadError {
    match (e, timeout) {
        (DyadError::LinkLost(io), Some(t))
            if matches!(io.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
        {
            DyadError::LinkTimeout(t)
        }
        (e, _) => e,
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io::{Read, Write},
        thread,
    };

    use super::*;

    fn loopback() -> SocketAddr {
        "127.0.0.1:0".parse().unwrap()
    }

    #[test]
    fn host_sends_first_client_receives_first() {
        let listener = LinkListener::bind(loopback()).unwrap();
        let addr = listener.local_addr().unwrap();

        let client = thread::spawn(move || {
            let mut link = LinkChannel::connect_as_client(addr, LinkOptions::default()).unwrap();
            let seen = link.exchange(&Position::new(0., 0.25)).unwrap();
            let seen_again = link.exchange(&Position::new(-0.5, 0.125)).unwrap();
            (seen, seen_again)
        });

        let mut host = listener.accept(LinkOptions::default()).unwrap();
        assert_eq!(
            host.exchange(&Position::new(1., 2.)).unwrap(),
            Position::new(0., 0.25)
        );
        let second = host.exchange(&Position::new(3., 4.)).unwrap();
        assert_eq!(second, Position::new(-0.5, 0.125));

        let (seen, seen_again) = client.join().unwrap();
        assert_eq!(seen, Position::new(1., 2.));
        assert_eq!(seen_again, Position::new(3., 4.));
    }

    #[test]
    fn host_fails_when_client_vanishes_mid_tick() {
        let listener = LinkListener::bind(loopback()).unwrap();
        let addr = listener.local_addr().unwrap();

        let client = thread::spawn(move || {
            let mut stream = TcpStream::connect(addr).unwrap();
            let mut buf = [0u8; frame::FRAME_LEN];
            stream.read_exact(&mut buf).unwrap();
            // Never answer; just go away
        });

        let mut host = listener.accept(LinkOptions::default()).unwrap();
        let result = host.exchange(&Position::new(0.5, 0.5));
        client.join().unwrap();
        assert!(
            matches!(
                result,
                Err(DyadError::FrameTruncated { received: 0 }) | Err(DyadError::LinkLost(_))
            ),
            "got {:?}",
            result
        );
        assert!(!host.is_open());
        assert!(matches!(
            host.exchange(&Position::new(0.5, 0.5)),
            Err(DyadError::LinkLost(_))
        ));
    }

    #[test]
    fn half_a_frame_is_truncation() {
        let listener = LinkListener::bind(loopback()).unwrap();
        let addr = listener.local_addr().unwrap();

        let client = thread::spawn(move || {
            let mut stream = TcpStream::connect(addr).unwrap();
            let mut buf = [0u8; frame::FRAME_LEN];
            stream.read_exact(&mut buf).unwrap();
            stream.write_all(&[0u8; 3]).unwrap();
        });

        let mut host = listener.accept(LinkOptions::default()).unwrap();
        let result = host.exchange(&Position::zeros());
        client.join().unwrap();
        assert!(matches!(
            result,
            Err(DyadError::FrameTruncated { received: 3 })
        ));
    }

    #[test]
    fn silent_peer_times_out_when_bounded() {
        let listener = LinkListener::bind(loopback()).unwrap();
        let addr = listener.local_addr().unwrap();
        let bound = Duration::from_millis(50);

        let client = thread::spawn(move || {
            let stream = TcpStream::connect(addr).unwrap();
            // Hold the connection open without ever sending
            thread::sleep(Duration::from_millis(500));
            drop(stream);
        });

        let mut host = listener
            .accept(LinkOptions {
                timeout: Some(bound),
            })
            .unwrap();
        let result = host.exchange(&Position::zeros());
        assert!(
            matches!(result, Err(DyadError::LinkTimeout(t)) if t == bound),
            "got {:?}",
            result
        );
        client.join().unwrap();
    }

    #[test]
    fn connect_to_nobody_fails() {
        // Grab a free port, then release it so nothing is listening there
        let addr = {
            let l = TcpListener::bind(loopback()).unwrap();
            l.local_addr().unwrap()
        };
        assert!(matches!(
            LinkChannel::connect_as_client(addr, LinkOptions::default()),
            Err(DyadError::Connect { .. })
        ));
    }

    #[test]
    fn bind_conflict_is_reported() {
        let taken = TcpListener::bind(loopback()).unwrap();
        let addr = taken.local_addr().unwrap();
        assert!(matches!(
            LinkListener::bind(addr),
            Err(DyadError::Bind { .. })
        ));
    }

    #[test]
    fn close_is_idempotent() {
        let listener = LinkListener::bind(loopback()).unwrap();
        let addr = listener.local_addr().unwrap();
        let client =
            thread::spawn(move || LinkChannel::connect_as_client(addr, LinkOptions::default()));
        let mut host = listener.accept(LinkOptions::default()).unwrap();
        let mut client = client.join().unwrap().unwrap();

        host.close();
        host.close();
        assert!(!host.is_open());

        // The client sees the host go away
        assert!(client.exchange(&Position::zeros()).is_err());
        client.close();
    }
}
