//! Learner terminal: CRLF output and line input.
//!
//! Remote line-oriented clients expect `\r\n` regardless of host platform, so
//! every byte written through [`Terminal`] has bare `\n` expanded.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result, anyhow};

const IAC: u8 = 0xFF;
const IAC_SE: u8 = 0xF0;
const IAC_IP: u8 = 0xF4;
const IAC_SB: u8 = 0xFA;
const CTRL_C: u8 = 0x03;
const CTRL_D: u8 = 0x04;

/// Writer that terminates every line with CRLF.
#[derive(Debug)]
pub struct Terminal<W: Write> {
    inner: W,
    after_cr: bool,
}

impl<W: Write> Terminal<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            after_cr: false,
        }
    }

    /// Write `text` followed by a line break.
    pub fn line(&mut self, text: &str) -> Result<()> {
        self.write_all(text.as_bytes())
            .and_then(|()| self.write_all(b"\n"))
            .context("write to terminal")
    }

    pub fn blank(&mut self) -> Result<()> {
        self.line("")
    }

    /// Write `text` without a line break and flush, for prompts and
    /// progress dots.
    pub fn text(&mut self, text: &str) -> Result<()> {
        self.write_all(text.as_bytes())
            .and_then(|()| self.inner.flush())
            .context("write to terminal")
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for Terminal<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut expanded = Vec::with_capacity(buf.len() + buf.len() / 8);
        for &byte in buf {
            if byte == b'\n' && !self.after_cr {
                expanded.push(b'\r');
            }
            expanded.push(byte);
            self.after_cr = byte == b'\r';
        }
        self.inner.write_all(&expanded)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// One read from the learner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Line(String),
    /// Ctrl-C, Ctrl-D or a telnet interrupt arrived.
    Interrupt,
    Eof,
}

/// Source of learner input lines.
pub trait LineSource {
    fn next_line(&mut self) -> Result<Input>;
}

/// Line source over a buffered reader, typically stdin behind a telnet
/// bridge.
#[derive(Debug)]
pub struct StdinLines<R: BufRead> {
    reader: R,
}

impl StdinLines<io::StdinLock<'static>> {
    pub fn stdin() -> Self {
        Self::new(io::stdin().lock())
    }
}

impl<R: BufRead> StdinLines<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> LineSource for StdinLines<R> {
    fn next_line(&mut self) -> Result<Input> {
        let mut raw = Vec::new();
        let read = self
            .reader
            .read_until(b'\n', &mut raw)
            .context("read learner input")?;
        if read == 0 {
            return Ok(Input::Eof);
        }
        decode_line(&raw)
    }
}

/// Turn raw bytes into an [`Input`], stripping telnet negotiation and the
/// line terminator.
pub fn decode_line(raw: &[u8]) -> Result<Input> {
    if raw.iter().any(|&b| b == CTRL_C || b == CTRL_D) {
        return Ok(Input::Interrupt);
    }
    let mut cleaned = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] != IAC {
            cleaned.push(raw[i]);
            i += 1;
            continue;
        }
        match raw.get(i + 1).copied() {
            Some(IAC_IP) => return Ok(Input::Interrupt),
            Some(IAC) => {
                cleaned.push(IAC);
                i += 2;
            }
            Some(IAC_SB) => {
                // Skip the subnegotiation up to and including IAC SE.
                i += 2;
                while i < raw.len() && !(raw[i] == IAC && raw.get(i + 1) == Some(&IAC_SE)) {
                    i += 1;
                }
                i += 2;
            }
            // WILL, WONT, DO, DONT carry an option byte.
            Some(0xFB..=0xFE) => i += 3,
            _ => i += 2,
        }
    }
    while cleaned
        .last()
        .is_some_and(|&b| matches!(b, b'\r' | b'\n' | b'\0'))
    {
        cleaned.pop();
    }
    String::from_utf8(cleaned)
        .map(Input::Line)
        .map_err(|_| anyhow!("learner input is not valid UTF-8"))
}
