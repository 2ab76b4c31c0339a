use crate::consts::{MAX_REQUEST_BODY_BYTES, MAX_REQUEST_HEAD_BYTES};
use anyhow::{bail, ensure, Context, Result};
use serde::Serialize;
use std::io::{BufRead, Read, Write};
use tracing::error;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Other(String),
}

impl From<&str> for Method {
    fn from(method: &str) -> Method {
        match method {
            "GET" => Method::Get,
            "POST" => Method::Post,
            other => Method::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
            Method::Other(method) => write!(f, "{method}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    // Path without the query string
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Request {
    pub fn new(method: Method, path: &str) -> Request {
        Request {
            method,
            path: path.to_string(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Request {
        self.body = body.into();
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

// Longest slice of an offending line quoted back in an error
const QUOTED_LINE_CHARS: usize = 64;

fn quoted(line: &str) -> String {
    let trimmed = line.trim_end();
    if trimmed.chars().count() > QUOTED_LINE_CHARS {
        let head: String = trimmed.chars().take(QUOTED_LINE_CHARS).collect();
        format!("{head:?}...")
    } else {
        format!("{trimmed:?}")
    }
}

/// Reads one line of the request head without buffering more than what is
/// left of the head budget.
fn read_head_line<R: BufRead>(
    reader: &mut R,
    line: &mut String,
    head_bytes: &mut usize,
) -> Result<usize> {
    let remaining = MAX_REQUEST_HEAD_BYTES.saturating_sub(*head_bytes);
    ensure!(
        remaining > 0,
        "Request head exceeds {MAX_REQUEST_HEAD_BYTES} bytes"
    );
    line.clear();
    let read = reader.by_ref().take(remaining as u64).read_line(line)?;
    *head_bytes += read;
    ensure!(
        read < remaining || line.ends_with('\n'),
        "Request head exceeds {MAX_REQUEST_HEAD_BYTES} bytes"
    );
    Ok(read)
}

/// Reads one HTTP/1.x request. Returns `Ok(None)` if the peer closed the
/// connection before sending anything.
pub fn read_request<R: BufRead>(reader: &mut R) -> Result<Option<Request>> {
    let mut head_bytes = 0;
    let mut line = String::new();

    if read_head_line(reader, &mut line, &mut head_bytes)? == 0 {
        return Ok(None);
    }

    let mut parts = line.split_whitespace();
    let (Some(method), Some(target), Some(version), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        bail!("Malformed request line {}", quoted(&line));
    };
    ensure!(
        version.starts_with("HTTP/1."),
        "Unsupported protocol version {}",
        quoted(version)
    );
    let path = target.split('?').next().unwrap_or(target).to_string();
    let method = Method::from(method);

    let mut headers = Vec::new();
    loop {
        let read = read_head_line(reader, &mut line, &mut head_bytes)?;
        ensure!(read != 0, "Connection closed inside request head");

        let header_line = line.trim_end_matches(['\r', '\n']);
        if header_line.is_empty() {
            break;
        }
        let Some((name, value)) = header_line.split_once(':') else {
            bail!("Malformed header {}", quoted(header_line));
        };
        headers.push((name.trim().to_string(), value.trim().to_string()));
    }

    let mut request = Request {
        method,
        path,
        headers,
        body: Vec::new(),
    };

    if let Some(length) = request.header("Content-Length") {
        let length: usize = length
            .parse()
            .with_context(|| format!("Invalid Content-Length {}", quoted(length)))?;
        ensure!(
            length <= MAX_REQUEST_BODY_BYTES,
            "Request body of {length} bytes exceeds {MAX_REQUEST_BODY_BYTES}"
        );
        let mut body = vec![0; length];
        reader
            .read_exact(&mut body)
            .context("Connection closed inside request body")?;
        request.body = body;
    }

    Ok(Some(request))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, content_type: &'static str, body: impl Into<Vec<u8>>) -> Response {
        Response {
            status,
            content_type,
            body: body.into(),
        }
    }

    pub fn json<T: Serialize>(status: u16, value: &T) -> Response {
        match serde_json::to_vec(value) {
            Ok(body) => Response::new(status, "application/json", body),
            Err(err) => {
                error!("Couldn't serialize response body: {err}");
                Response::error(500)
            }
        }
    }

    /// Plain JSON error body carrying only the status text.
    pub fn error(status: u16) -> Response {
        let body = serde_json::json!({ "error": reason_phrase(status) });
        Response::new(status, "application/json", body.to_string())
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        write!(
            writer,
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            self.status,
            reason_phrase(self.status),
            self.content_type,
            self.body.len()
        )?;
        writer.write_all(&self.body)?;
        writer.flush()
    }
}

pub fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

/// Content type for a static asset, picked by file extension.
pub fn content_type_for(path: &std::path::Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("js") => "application/javascript",
        Some("css") => "text/css",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}
