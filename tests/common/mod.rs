#![allow(dead_code)]

pub mod test_server {
    use std::sync::Once;

    /// Ensures May coroutines are configured only once
    static MAY_INIT: Once = Once::new();

    pub fn setup_may_runtime() {
        MAY_INIT.call_once(|| {
            may::config().set_stack_size(0x8000);
        });
    }
}

pub mod http {
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpStream};
    use std::time::Duration;

    /// A parsed HTTP/1.1 response.
    #[derive(Debug)]
    pub struct RawResponse {
        pub status: u16,
        pub headers: Vec<(String, String)>,
        pub body: String,
    }

    impl RawResponse {
        pub fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        }

        pub fn header_values(&self, name: &str) -> Vec<&str> {
            self.headers
                .iter()
                .filter(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
                .collect()
        }
    }

    /// Send a raw request and read one response, honouring `Content-Length`.
    pub fn send_request(addr: &SocketAddr, req: &str) -> RawResponse {
        Connection::open(addr).request(req)
    }

    /// A keep-alive connection that reads responses back to back.
    ///
    /// Bytes past the end of one response stay buffered for the next, so a
    /// server that writes more than it announced corrupts the following read.
    pub struct Connection {
        stream: TcpStream,
        buf: Vec<u8>,
    }

    impl Connection {
        pub fn open(addr: &SocketAddr) -> Self {
            let stream = TcpStream::connect(addr).unwrap();
            stream
                .set_read_timeout(Some(Duration::from_millis(1000)))
                .unwrap();
            Self {
                stream,
                buf: Vec::new(),
            }
        }

        /// Send `req` and read one response that has no body, as for HEAD.
        pub fn request_head(&mut self, req: &str) -> RawResponse {
            self.send(req);
            self.read_response(true)
        }

        pub fn request(&mut self, req: &str) -> RawResponse {
            self.send(req);
            self.read_response(false)
        }

        /// Bytes received but not yet consumed by a response.
        pub fn leftover(&self) -> &[u8] {
            &self.buf
        }

        fn send(&mut self, req: &str) {
            self.stream.write_all(req.as_bytes()).unwrap();
        }

        fn read_response(&mut self, head_only: bool) -> RawResponse {
            loop {
                if let Some((resp, used)) = try_parse(&self.buf, head_only) {
                    self.buf.drain(..used);
                    return resp;
                }
                let mut tmp = [0u8; 1024];
                match self.stream.read(&mut tmp) {
                    Ok(0) => break,
                    Ok(n) => self.buf.extend_from_slice(&tmp[..n]),
                    Err(ref e)
                        if e.kind() == std::io::ErrorKind::WouldBlock
                            || e.kind() == std::io::ErrorKind::TimedOut =>
                    {
                        break
                    }
                    Err(e) => panic!("read error: {:?}", e),
                }
            }
            panic!(
                "incomplete response: {:?}",
                String::from_utf8_lossy(&self.buf)
            )
        }
    }

    fn try_parse(buf: &[u8], head_only: bool) -> Option<(RawResponse, usize)> {
        let head_end = buf.windows(4).position(|w| w == b"\r\n\r\n")? + 4;
        let head = String::from_utf8_lossy(&buf[..head_end]);
        let mut lines = head.lines();
        let status = lines
            .next()?
            .split_whitespace()
            .nth(1)?
            .parse()
            .ok()?;
        let headers: Vec<(String, String)> = lines
            .filter_map(|line| line.split_once(':'))
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .collect();
        let length = if head_only {
            0
        } else {
            headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
                .and_then(|(_, v)| v.parse::<usize>().ok())
                .unwrap_or(0)
        };
        if buf.len() < head_end + length {
            return None;
        }
        let body = String::from_utf8_lossy(&buf[head_end..head_end + length]).into_owned();
        Some((
            RawResponse {
                status,
                headers,
                body,
            },
            head_end + length,
        ))
    }
}

pub mod logs {
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing::Dispatch;
    use tracing_subscriber::fmt::MakeWriter;

    /// In-memory log sink shared between a subscriber and the test.
    #[derive(Clone, Default)]
    pub struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

    impl CaptureWriter {
        pub fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }

        /// A dispatch writing plain-text DEBUG and above into this sink.
        pub fn dispatch(&self) -> Dispatch {
            let subscriber = tracing_subscriber::fmt()
                .with_writer(self.clone())
                .with_ansi(false)
                .with_max_level(tracing::Level::DEBUG)
                .finish();
            Dispatch::new(subscriber)
        }
    }

    impl io::Write for CaptureWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CaptureWriter {
        type Writer = CaptureWriter;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }
}
