// src/panel/link.rs - Line framing for the TFT serial link
use std::collections::VecDeque;
use tokio::sync::mpsc;

/// Longest accepted panel command, including the deepest file path the panel
/// can produce. Lines that exceed this are dropped whole (see below).
pub const MAX_CMND_LEN: usize = 64;

/// One complete line received from the panel, with the parsing helpers the
/// dispatchers need. Created per line, discarded after dispatch.
#[derive(Debug, Clone)]
pub struct PanelCommand {
    raw: String,
}

impl PanelCommand {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Numeric request code: the digits immediately after the first `A`.
    /// `None` when the line carries no `A` token or no digits follow it.
    pub fn code(&self) -> Option<u8> {
        let pos = self.find_token('A')?;
        let digits: String = self.raw[pos + 1..]
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        if digits.is_empty() {
            return None;
        }
        digits.parse().ok()
    }

    /// Position of the first occurrence of `token` in the line.
    pub fn find_token(&self, token: char) -> Option<usize> {
        self.raw.find(token)
    }

    pub fn char_at(&self, index: usize) -> Option<char> {
        self.raw.as_bytes().get(index).map(|&b| b as char)
    }

    /// `atoi`-style integer parse starting at `index`: skips leading spaces,
    /// accepts an optional sign, stops at the first non-digit. 0 on no digits.
    pub fn int_after(&self, index: usize) -> i32 {
        let rest = match self.raw.get(index..) {
            Some(r) => r.trim_start(),
            None => return 0,
        };
        let mut end = 0;
        for (i, c) in rest.char_indices() {
            if i == 0 && (c == '+' || c == '-') {
                end = 1;
                continue;
            }
            if c.is_ascii_digit() {
                end = i + 1;
            } else {
                break;
            }
        }
        rest[..end].parse().unwrap_or(0)
    }

    /// `atof`-style float parse starting at `index`. 0.0 on no number.
    pub fn float_after(&self, index: usize) -> f32 {
        let rest = match self.raw.get(index..) {
            Some(r) => r.trim_start(),
            None => return 0.0,
        };
        let mut end = 0;
        let mut seen_dot = false;
        for (i, c) in rest.char_indices() {
            if i == 0 && (c == '+' || c == '-') {
                end = 1;
                continue;
            }
            if c.is_ascii_digit() {
                end = i + 1;
            } else if c == '.' && !seen_dot {
                seen_dot = true;
                end = i + 1;
            } else {
                break;
            }
        }
        rest[..end].parse().unwrap_or(0.0)
    }

    /// Everything from `index` to the end of the line, trimmed.
    pub fn arg_from(&self, index: usize) -> &str {
        self.raw.get(index..).unwrap_or("").trim()
    }
}

/// Serial framing for the panel link: assembles newline-terminated commands
/// from raw byte chunks and queues outbound text toward the writer task.
///
/// Replies are fire-and-forget: the panel protocol has no acknowledgement or
/// retry, so a send never fails louder than a dropped-channel warning.
pub struct PanelLink {
    pending: VecDeque<u8>,
    line: Vec<u8>,
    discarding: bool,
    out_tx: mpsc::UnboundedSender<String>,
}

impl PanelLink {
    /// Returns the link and the receiving end of the outbound queue. The
    /// binary drains the receiver into the UART; tests inspect it directly.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        (
            Self {
                pending: VecDeque::new(),
                line: Vec::with_capacity(MAX_CMND_LEN),
                discarding: false,
                out_tx,
            },
            out_rx,
        )
    }

    /// Queue raw bytes read from the UART.
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.pending.extend(bytes);
    }

    /// Non-blocking: returns the next complete command line, or `None` when
    /// no full line has been received yet. A line that overruns the buffer
    /// is dropped whole, together with everything up to its newline, rather
    /// than truncated in place (truncation would desynchronise the stream).
    pub fn try_read_line(&mut self) -> Option<PanelCommand> {
        while let Some(byte) = self.pending.pop_front() {
            if self.discarding {
                if byte == b'\n' {
                    self.discarding = false;
                }
                continue;
            }
            if byte == b'\n' {
                if self.line.last() == Some(&b'\r') {
                    self.line.pop();
                }
                let raw = String::from_utf8_lossy(&self.line).into_owned();
                self.line.clear();
                tracing::debug!("panel rx: {}", raw);
                return Some(PanelCommand::new(raw));
            }
            if self.line.len() >= MAX_CMND_LEN {
                tracing::warn!(
                    "panel command exceeded {} bytes, dropping line",
                    MAX_CMND_LEN
                );
                self.line.clear();
                self.discarding = true;
                continue;
            }
            self.line.push(byte);
        }
        None
    }

    /// Write text to the panel without a line terminator.
    pub fn send(&self, text: &str) {
        if self.out_tx.send(text.to_string()).is_err() {
            tracing::warn!("panel tx channel closed, dropping: {}", text);
        }
    }

    /// Write one terminated line to the panel.
    pub fn send_line(&self, text: &str) {
        tracing::debug!("panel tx: {}", text);
        if self.out_tx.send(format!("{text}\r\n")).is_err() {
            tracing::warn!("panel tx channel closed, dropping: {}", text);
        }
    }

    /// The empty acknowledgement used for unroutable requests.
    pub fn send_empty_line(&self) {
        self.send_line("");
    }
}
