use std::collections::VecDeque;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::{Arc, Mutex};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("socket error: {0}")]
    Io(#[from] io::Error),
    #[error("datagram of {0} bytes exceeds the maximum")]
    TooLarge(usize),
    #[error("transport closed")]
    Closed,
}

/// Raw datagram I/O under a NetIO. Both calls return immediately.
pub trait NetHandler {
    fn send(&mut self, datagram: &[u8]) -> Result<usize, TransportError>;

    /// Next pending datagram copied into `buf`, or `None` when idle.
    fn receive(&mut self, buf: &mut [u8]) -> Result<Option<usize>, TransportError>;
}

pub struct UdpHandler {
    socket: UdpSocket,
    local_addr: SocketAddr,
    destination: SocketAddr,
}

impl UdpHandler {
    /// Binds a non-blocking socket. Broadcast is enabled so `destination`
    /// may be a subnet broadcast address.
    pub fn bind<A: ToSocketAddrs>(addr: A, destination: SocketAddr) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr)?;
        socket.set_nonblocking(true)?;
        socket.set_broadcast(true)?;
        let local_addr = socket.local_addr()?;
        log::info!("dis socket bound to {local_addr}, sending to {destination}");
        Ok(Self {
            socket,
            local_addr,
            destination,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn destination(&self) -> SocketAddr {
        self.destination
    }

    pub fn set_destination(&mut self, destination: SocketAddr) {
        self.destination = destination;
    }
}

impl NetHandler for UdpHandler {
    fn send(&mut self, datagram: &[u8]) -> Result<usize, TransportError> {
        Ok(self.socket.send_to(datagram, self.destination)?)
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<Option<usize>, TransportError> {
        match self.socket.recv_from(buf) {
            Ok((size, _)) => Ok(Some(size)),
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

type Inbox = Arc<Mutex<VecDeque<Vec<u8>>>>;

/// In-process handler: every datagram sent is delivered to each peer's
/// inbox. Used by tests and by nodes wired together in one process.
#[derive(Debug, Clone, Default)]
pub struct MemoryHandler {
    inbox: Inbox,
    peers: Vec<Inbox>,
    /// Makes every send fail; for exercising retry-on-next-tick paths.
    pub fail_sends: bool,
    pub sent: usize,
}

impl MemoryHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Two handlers that deliver to each other.
    pub fn pair() -> (Self, Self) {
        let mut a = Self::new();
        let mut b = Self::new();
        a.connect(&b);
        b.connect(&a);
        (a, b)
    }

    /// Delivers our sends to `other` as well.
    pub fn connect(&mut self, other: &MemoryHandler) {
        self.peers.push(Arc::clone(&other.inbox));
    }

    /// Hears our own sends, like a UDP broadcast socket does.
    pub fn with_loopback(mut self) -> Self {
        self.peers.push(Arc::clone(&self.inbox));
        self
    }

    /// Queues a datagram as if it came off the wire.
    pub fn inject(&self, datagram: Vec<u8>) {
        if let Ok(mut inbox) = self.inbox.lock() {
            inbox.push_back(datagram);
        }
    }

    pub fn pending(&self) -> usize {
        self.inbox.lock().map(|inbox| inbox.len()).unwrap_or(0)
    }
}

impl NetHandler for MemoryHandler {
    fn send(&mut self, datagram: &[u8]) -> Result<usize, TransportError> {
        if self.fail_sends {
            return Err(TransportError::Closed);
        }
        for peer in &self.peers {
            peer.lock()
                .map_err(|_| TransportError::Closed)?
                .push_back(datagram.to_vec());
        }
        self.sent += 1;
        Ok(datagram.len())
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<Option<usize>, TransportError> {
        let Some(datagram) = self
            .inbox
            .lock()
            .map_err(|_| TransportError::Closed)?
            .pop_front()
        else {
            return Ok(None);
        };
        if datagram.len() > buf.len() {
            return Err(TransportError::TooLarge(datagram.len()));
        }
        buf[..datagram.len()].copy_from_slice(&datagram);
        Ok(Some(datagram.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_pair_delivers_both_ways() {
        let (mut a, mut b) = MemoryHandler::pair();
        let mut buf = [0u8; 16];
        a.send(&[1, 2, 3]).unwrap();
        assert_eq!(a.receive(&mut buf).unwrap(), None);
        assert_eq!(b.receive(&mut buf).unwrap(), Some(3));
        assert_eq!(&buf[..3], &[1, 2, 3]);

        b.send(&[9]).unwrap();
        assert_eq!(a.receive(&mut buf).unwrap(), Some(1));
    }

    #[test]
    fn test_loopback_and_failures() {
        let mut a = MemoryHandler::new().with_loopback();
        let mut buf = [0u8; 4];
        a.send(&[7, 7]).unwrap();
        assert_eq!(a.pending(), 1);
        assert_eq!(a.receive(&mut buf).unwrap(), Some(2));

        a.fail_sends = true;
        assert!(a.send(&[1]).is_err());
        assert_eq!(a.pending(), 0);

        a.inject(vec![0; 8]);
        assert!(matches!(a.receive(&mut buf), Err(TransportError::TooLarge(8))));
    }

    #[test]
    fn test_udp_loopback() {
        let mut receiver = UdpHandler::bind("127.0.0.1:0", "127.0.0.1:9".parse().unwrap()).unwrap();
        let mut sender = UdpHandler::bind("127.0.0.1:0", receiver.local_addr()).unwrap();
        sender.send(b"dis").unwrap();

        let mut buf = [0u8; 16];
        let mut received = None;
        for _ in 0..100 {
            if let Some(size) = receiver.receive(&mut buf).unwrap() {
                received = Some(size);
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        assert_eq!(received, Some(3));
        assert_eq!(&buf[..3], b"dis");
    }
}
