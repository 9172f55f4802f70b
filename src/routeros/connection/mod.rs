// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Low-level RouterOS API connection handling

mod auth;
mod protocol;

use std::collections::HashMap;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::error::RouterOsError;

pub use protocol::encode_length;
use protocol::read_length;

/// One `!re` reply sentence: attribute name to value
pub type Sentence = HashMap<String, String>;

/// Read operation timeout (30 seconds)
pub(crate) const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Largest word accepted from a device (16 MiB)
const MAX_WORD_LEN: usize = 16 * 1024 * 1024;

/// Low-level RouterOS API connection
pub struct RouterOsConnection<S = TcpStream> {
    stream: S,
    read_timeout: Duration,
}

impl RouterOsConnection<TcpStream> {
    /// Resolves `host`, then opens a TCP connection to `host:port` within `connect_timeout`
    pub(crate) async fn connect(
        host: &str,
        port: u16,
        connect_timeout: Duration,
    ) -> Result<Self, RouterOsError> {
        let target = if host.contains(':') && !host.starts_with('[') {
            format!("[{host}]:{port}")
        } else {
            format!("{host}:{port}")
        };

        tracing::trace!("Resolving {}", target);
        let addrs: Vec<_> = timeout(connect_timeout, tokio::net::lookup_host(target.as_str()))
            .await
            .map_err(|_| RouterOsError::Timeout(format!("resolving {host}")))?
            .map_err(|e| RouterOsError::Resolve {
                host: host.to_string(),
                message: e.to_string(),
            })?
            .collect();
        if addrs.is_empty() {
            return Err(RouterOsError::Resolve {
                host: host.to_string(),
                message: "no addresses returned".to_string(),
            });
        }

        tracing::trace!("Attempting TCP connection to: {}", target);
        let stream = timeout(connect_timeout, TcpStream::connect(&addrs[..]))
            .await
            .map_err(|_| {
                RouterOsError::Timeout(format!(
                    "TCP connect to {target} exceeded {connect_timeout:?}"
                ))
            })??;
        tracing::trace!("TCP connection established to: {}", target);
        Ok(Self::from_stream(stream, connect_timeout.max(READ_TIMEOUT)))
    }
}

impl<S> RouterOsConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub(crate) fn from_stream(stream: S, read_timeout: Duration) -> Self {
        Self {
            stream,
            read_timeout,
        }
    }

    pub(crate) async fn command(
        &mut self,
        path: &str,
        args: &[String],
    ) -> Result<Vec<Sentence>, RouterOsError> {
        let mut words: Vec<String> = Vec::with_capacity(1 + args.len());
        words.push(path.to_string());
        words.extend(args.iter().cloned());
        self.raw_command(words).await
    }

    async fn raw_command(&mut self, words: Vec<String>) -> Result<Vec<Sentence>, RouterOsError> {
        self.send_words(&words).await?;
        self.read_sentences().await
    }

    /// Sends `/quit` and shuts the stream down
    pub(crate) async fn quit(&mut self) -> Result<(), RouterOsError> {
        self.send_words(&["/quit".to_string()]).await?;
        self.stream.shutdown().await?;
        Ok(())
    }

    async fn send_words(&mut self, words: &[String]) -> Result<(), RouterOsError> {
        for w in words {
            self.write_word(w).await?;
        }
        // zero length word terminator
        self.stream.write_all(&[0]).await?;
        self.stream.flush().await?;
        Ok(())
    }

    async fn write_word(&mut self, word: &str) -> Result<(), RouterOsError> {
        let bytes = word.as_bytes();
        self.stream.write_all(&encode_length(bytes.len())).await?;
        self.stream.write_all(bytes).await?;
        Ok(())
    }

    async fn read_sentences(&mut self) -> Result<Vec<Sentence>, RouterOsError> {
        let read_timeout = self.read_timeout;
        // Wrap the entire read operation in a timeout to prevent hanging on slow/dead connections
        timeout(read_timeout, async {
            let mut sentences: Vec<Sentence> = Vec::new();
            let mut current: Option<Sentence> = None;
            let mut done_attrs = Sentence::new();
            let mut in_done = false;
            loop {
                let word = self.read_word().await?;
                if word.is_empty() {
                    if in_done {
                        break;
                    }
                    continue;
                }
                tracing::trace!("Received word: {}", word);
                if word == "!done" {
                    if let Some(s) = current.take() {
                        sentences.push(s);
                    }
                    in_done = true;
                    continue;
                }
                if word == "!trap" || word == "!fatal" {
                    let fatal = word == "!fatal";
                    tracing::trace!("{} received, reading details", word);
                    let msg = self.read_error_details(fatal).await?;
                    return Err(if fatal {
                        RouterOsError::Fatal(msg)
                    } else {
                        RouterOsError::Trap(msg)
                    });
                }
                if word == "!re" {
                    if let Some(s) = current.take() {
                        sentences.push(s);
                    }
                    current = Some(Sentence::new());
                    continue;
                }
                if let Some(stripped) = word.strip_prefix('=') {
                    if let Some((k, v)) = stripped.split_once('=') {
                        let tgt = if in_done {
                            &mut done_attrs
                        } else {
                            current.get_or_insert_with(Sentence::new)
                        };
                        tgt.insert(k.to_string(), v.to_string());
                    }
                }
                // ignore other headers
            }
            // `ret` of an `add` arrives on `!done`
            if !done_attrs.is_empty() {
                sentences.push(done_attrs);
            }
            tracing::trace!("Command complete, {} sentences received", sentences.len());
            Ok(sentences)
        })
        .await
        .map_err(|_| {
            RouterOsError::Timeout(format!(
                "RouterOS did not respond within {read_timeout:?}"
            ))
        })?
    }

    /// Reads `=key=value` words after `!trap`/`!fatal` and drains the rest of the reply
    async fn read_error_details(&mut self, fatal: bool) -> Result<String, RouterOsError> {
        let mut trap = Sentence::new();
        let mut fatal_text = None;
        let mut after_done = false;
        loop {
            let w = self.read_word().await?;
            if w.is_empty() {
                // a trap is followed by a separate !done sentence; fatal ends the stream
                if fatal || after_done {
                    break;
                }
                continue;
            }
            if let Some(stripped) = w.strip_prefix('=') {
                if let Some((k, v)) = stripped.split_once('=') {
                    trap.insert(k.to_string(), v.to_string());
                }
                continue;
            }
            if w == "!done" {
                after_done = true;
                continue;
            }
            if fatal && !w.starts_with('!') {
                fatal_text = Some(w);
            }
        }
        Ok(trap
            .remove("message")
            .or(fatal_text)
            .unwrap_or_else(|| "trap".to_string()))
    }

    async fn read_word(&mut self) -> Result<String, RouterOsError> {
        let len = read_length(&mut self.stream).await?;
        if len == 0 {
            return Ok(String::new());
        }
        if len > MAX_WORD_LEN {
            return Err(RouterOsError::Protocol(format!(
                "word length {len} exceeds limit of {MAX_WORD_LEN} bytes"
            )));
        }
        let mut buf = vec![0u8; len];
        self.stream.read_exact(&mut buf).await?;
        Ok(String::from_utf8_lossy(&buf).into())
    }
}
