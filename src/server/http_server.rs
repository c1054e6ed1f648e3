use may::coroutine::JoinHandle;
use may_minihttp::{HttpServerWithHeaders, HttpService};
use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

/// Maximum request headers accepted per request.
pub const MAX_REQUEST_HEADERS: usize = 32;

/// Wrapper around may_minihttp's HTTP server.
pub struct HttpServer<T>(pub T);

/// Handle to a running HTTP server.
pub struct ServerHandle {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl ServerHandle {
    /// Address the server is bound to.
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Wait until the server accepts connections.
    ///
    /// # Errors
    ///
    /// Returns `TimedOut` if the server is not reachable after ~250ms.
    pub fn wait_ready(&self) -> io::Result<()> {
        for _ in 0..50 {
            if TcpStream::connect(self.addr).is_ok() {
                return Ok(());
            }
            thread::sleep(Duration::from_millis(5));
        }
        Err(io::Error::new(io::ErrorKind::TimedOut, "server not ready"))
    }

    /// Cancel the accept loop and wait for it to finish.
    pub fn stop(self) {
        info!(addr = %self.addr, "Stopping server");
        // SAFETY: cancelling a coroutine we own; nothing else holds the handle.
        unsafe {
            self.handle.coroutine().cancel();
        }
        let _ = self.handle.join();
    }

    /// Block until the accept loop exits.
    ///
    /// # Errors
    ///
    /// Returns the panic payload if the accept loop panicked.
    pub fn join(self) -> std::thread::Result<()> {
        self.handle.join()
    }
}

impl<T: HttpService + Clone + Send + Sync + 'static> HttpServer<T> {
    /// Bind `addr` and start serving.
    ///
    /// Port `0` binds an ephemeral port; [`ServerHandle::addr`] reports the
    /// one that was actually chosen.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or cannot be bound.
    pub fn start<A: ToSocketAddrs>(self, addr: A) -> io::Result<ServerHandle> {
        let addr = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "invalid address"))?;
        let service = self.0;
        let (addr, handle) = bind_with_retry(addr, EPHEMERAL_BIND_ATTEMPTS, |addr| {
            HttpServerWithHeaders::<_, MAX_REQUEST_HEADERS>(service.clone()).start(addr)
        })?;
        info!(addr = %addr, "Server listening");
        Ok(ServerHandle { addr, handle })
    }
}

/// Attempts at binding a freshly chosen port when port 0 was requested.
const EPHEMERAL_BIND_ATTEMPTS: usize = 8;

/// Bind `addr` through `start`, resolving port 0 to a concrete free port.
///
/// The transport only takes an address, so a free port is found with a
/// throwaway listener first. Another process can take it before `start`
/// binds; in that case a new port is chosen, up to `attempts` times. A fixed
/// port is tried exactly once.
fn bind_with_retry<T>(
    addr: SocketAddr,
    attempts: usize,
    mut start: impl FnMut(SocketAddr) -> io::Result<T>,
) -> io::Result<(SocketAddr, T)> {
    if addr.port() != 0 {
        return start(addr).map(|bound| (addr, bound));
    }
    let mut last_err = None;
    for attempt in 1..=attempts.max(1) {
        let candidate = std::net::TcpListener::bind(addr)?.local_addr()?;
        match start(candidate) {
            Ok(bound) => return Ok((candidate, bound)),
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
                warn!(addr = %candidate, attempt, "Ephemeral port taken before bind, retrying");
                last_err = Some(e);
            }
            Err(e) => return Err(e),
        }
    }
    Err(last_err.unwrap_or_else(|| io::Error::from(io::ErrorKind::AddrInUse)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loopback() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 0))
    }

    #[test]
    fn test_port_taken_before_bind_is_retried() {
        let mut tried = Vec::new();
        let (addr, bound) = bind_with_retry(loopback(), 4, |addr| {
            tried.push(addr);
            if tried.len() == 1 {
                Err(io::Error::from(io::ErrorKind::AddrInUse))
            } else {
                Ok("bound")
            }
        })
        .unwrap();
        assert_eq!(bound, "bound");
        assert_eq!(tried.len(), 2);
        assert_eq!(addr, tried[1]);
        assert_ne!(addr.port(), 0);
    }

    #[test]
    fn test_retries_are_bounded() {
        let mut calls = 0;
        let err = bind_with_retry(loopback(), 3, |_| -> io::Result<()> {
            calls += 1;
            Err(io::Error::from(io::ErrorKind::AddrInUse))
        })
        .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AddrInUse);
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_fixed_port_is_tried_once() {
        let fixed = SocketAddr::from(([127, 0, 0, 1], 9));
        let mut calls = 0;
        let err = bind_with_retry(fixed, 3, |addr| -> io::Result<()> {
            calls += 1;
            assert_eq!(addr, fixed);
            Err(io::Error::from(io::ErrorKind::AddrInUse))
        })
        .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AddrInUse);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_other_errors_are_not_retried() {
        let mut calls = 0;
        let err = bind_with_retry(loopback(), 3, |_| -> io::Result<()> {
            calls += 1;
            Err(io::Error::from(io::ErrorKind::PermissionDenied))
        })
        .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        assert_eq!(calls, 1);
    }
}
