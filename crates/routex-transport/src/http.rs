//! Minimal HTTP/1.1 framing: request head parsing and response encoding.
//!
//! Only what the connection loop needs. Bodies are framed by
//! `Content-Length`; chunked transfer coding is answered with 400.

use bytes::{Bytes, BytesMut};
use routex_core::Method;

/// A parsed request. The target keeps its query string; the router strips it.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl Request {
    /// Case-insensitive header lookup; the first occurrence wins.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn query(&self) -> Option<&str> {
        self.target.split_once('?').map(|(_, q)| q)
    }
}

/// Request line and headers, before the body has been read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    pub method: Method,
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub content_length: usize,
    pub keep_alive: bool,
    /// Bytes of the buffer taken by the head, including the blank line.
    pub consumed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadParse {
    Complete(RequestHead),
    Partial,
    TooLong,
    Malformed,
}

/// Parses a request head from the front of `buf`.
///
/// `max_head` bounds the request line plus headers.
pub fn parse_head(buf: &[u8], max_head: usize) -> HeadParse {
    let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
        return if buf.len() > max_head {
            HeadParse::TooLong
        } else {
            HeadParse::Partial
        };
    };
    if end > max_head {
        return HeadParse::TooLong;
    }
    let Ok(text) = std::str::from_utf8(&buf[..end]) else {
        return HeadParse::Malformed;
    };

    let mut lines = text.split("\r\n");
    let Some(request_line) = lines.next() else {
        return HeadParse::Malformed;
    };
    let mut parts = request_line.split(' ');
    let (Some(method), Some(target), Some(version), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return HeadParse::Malformed;
    };
    let Some(minor) = version.strip_prefix("HTTP/1.") else {
        return HeadParse::Malformed;
    };
    if method.is_empty() || !target.starts_with('/') {
        return HeadParse::Malformed;
    }

    let mut headers = Vec::new();
    let mut content_length = 0;
    let mut keep_alive = minor != "0";
    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            return HeadParse::Malformed;
        };
        let (name, value) = (name.trim(), value.trim());
        if name.eq_ignore_ascii_case("content-length") {
            match value.parse() {
                Ok(n) => content_length = n,
                Err(_) => return HeadParse::Malformed,
            }
        } else if name.eq_ignore_ascii_case("transfer-encoding") {
            return HeadParse::Malformed;
        } else if name.eq_ignore_ascii_case("connection") {
            if value.eq_ignore_ascii_case("close") {
                keep_alive = false;
            } else if value.eq_ignore_ascii_case("keep-alive") {
                keep_alive = true;
            }
        }
        headers.push((name.to_string(), value.to_string()));
    }

    HeadParse::Complete(RequestHead {
        method: Method::from_bytes(method.as_bytes()),
        target: target.to_string(),
        headers,
        content_length,
        keep_alive,
        consumed: end + 4,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: u16,
    content_type: &'static str,
    body: Bytes,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            content_type: "text/plain; charset=utf-8",
            body: body.into(),
        }
    }

    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::new(200, body)
    }

    pub fn with_content_type(mut self, content_type: &'static str) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn not_found() -> Self {
        Self::new(404, "Not Found")
    }

    pub fn bad_request() -> Self {
        Self::new(400, "Bad Request")
    }

    pub fn uri_too_long() -> Self {
        Self::new(414, "URI Too Long")
    }

    pub fn payload_too_large() -> Self {
        Self::new(413, "Payload Too Large")
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn encode(&self, keep_alive: bool) -> BytesMut {
        let head = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: {}\r\n\r\n",
            self.status,
            reason(self.status),
            self.content_type,
            self.body.len(),
            if keep_alive { "keep-alive" } else { "close" },
        );
        let mut out = BytesMut::with_capacity(head.len() + self.body.len());
        out.extend_from_slice(head.as_bytes());
        out.extend_from_slice(&self.body);
        out
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        404 => "Not Found",
        413 => "Payload Too Large",
        414 => "URI Too Long",
        500 => "Internal Server Error",
        _ => "",
    }
}
