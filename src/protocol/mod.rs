//! Proof-of-work challenge protocol
//!
//! One exchange per connection, `\n`-terminated lines:
//!
//! ```text
//! S->C: Send me proof-of-work: The first <BITS>-bits of sha256("<NONCE>" + input.rstrip) is "111...1"
//! C->S: <response>
//! S->C: OK | NG
//! ```
//!
//! The verifier hashes `nonce ++ response` with trailing whitespace removed
//! from the response (leading whitespace is kept).

use std::fmt;
use std::io::{self, BufRead, BufReader, Write};
use std::net::TcpStream;
use std::str::FromStr;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::engine::{self, Algorithm, Pattern, SearchConfig, SearchResult, TargetMask};

/// Random bytes behind each nonce
pub const NONCE_BYTES: usize = 8;

/// Nonce length in hex characters
pub const NONCE_LEN: usize = NONCE_BYTES * 2;

/// Number of variable characters the solver appends to the nonce
pub const RESPONSE_LEN: usize = 12;

/// Verifier reply for an accepted response
pub const ACCEPTED: &[u8] = b"OK";

/// Verifier reply for a rejected response
pub const REJECTED: &[u8] = b"NG";

const CHALLENGE_HEAD: &str = "Send me proof-of-work: The first ";
const CHALLENGE_BITS_TAIL: &str = "-bits of sha256(\"";
const CHALLENGE_TAIL: &str = "\" + input.rstrip) is \"111...1\"";

/// The digest every challenge is posed over
const CHALLENGE_ALGORITHM: Algorithm = Algorithm::Sha256;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Malformed challenge: {0}")]
    MalformedChallenge(String),

    #[error("Unexpected verifier reply: {0:?}")]
    ProtocolMismatch(String),

    #[error("Search space exhausted without a valid response")]
    Exhausted,

    #[error("Search was cancelled")]
    Cancelled,

    #[error("Search error: {0}")]
    Search(#[from] engine::Error),

    #[error("Transport error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to generate nonce: {0}")]
    Random(String),
}

pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Line-oriented duplex channel used by both roles
pub trait Transport {
    /// Read one line, without its `\n` terminator
    fn read_line(&mut self) -> io::Result<Vec<u8>>;

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()>;

    /// Write `bytes` followed by `\n` and flush
    fn send_line(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.write_all(bytes)?;
        self.write_all(b"\n")?;
        self.flush()
    }
}

/// A [`Transport`] over a buffered reader and a writer
pub struct LineTransport<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> LineTransport<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    pub fn into_parts(self) -> (R, W) {
        (self.reader, self.writer)
    }
}

impl LineTransport<BufReader<TcpStream>, TcpStream> {
    /// Split a TCP stream into a buffered read half and a write half
    pub fn tcp(stream: TcpStream) -> io::Result<Self> {
        let writer = stream.try_clone()?;
        Ok(Self::new(BufReader::new(stream), writer))
    }
}

impl<R: BufRead, W: Write> Transport for LineTransport<R, W> {
    fn read_line(&mut self) -> io::Result<Vec<u8>> {
        let mut line = Vec::new();
        if self.reader.read_until(b'\n', &mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed before a line was received",
            ));
        }
        if line.last() == Some(&b'\n') {
            line.pop();
        }
        Ok(line)
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.writer.write_all(bytes)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// A single proof-of-work challenge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    nonce: String,
    bits: u32,
    target: TargetMask,
}

impl Challenge {
    /// Build a challenge from a 16-character lowercase hex nonce
    pub fn new(nonce: impl Into<String>, bits: u32) -> Result<Self> {
        let nonce = nonce.into();
        if nonce.len() != NONCE_LEN
            || !nonce
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        {
            return Err(ProtocolError::MalformedChallenge(format!(
                "nonce must be {NONCE_LEN} lowercase hex characters, got {nonce:?}"
            )));
        }

        let digest_bits = CHALLENGE_ALGORITHM.bits();
        if bits as usize > digest_bits {
            return Err(ProtocolError::MalformedChallenge(format!(
                "{bits} bits exceeds the {digest_bits}-bit digest"
            )));
        }

        let target = TargetMask::leading_ones(bits as usize, CHALLENGE_ALGORITHM.output_len())?;
        Ok(Self {
            nonce,
            bits,
            target,
        })
    }

    /// Fresh challenge with a random nonce
    pub fn random(bits: u32) -> Result<Self> {
        let mut bytes = [0u8; NONCE_BYTES];
        getrandom::getrandom(&mut bytes).map_err(|e| ProtocolError::Random(e.to_string()))?;
        Self::new(hex::encode(bytes), bits)
    }

    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    /// Required number of leading 1-bits
    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// Parse a challenge line, with or without its `\n` terminator.
    ///
    /// The whole line must match the template exactly.
    pub fn parse(line: &[u8]) -> Result<Self> {
        let line = line.strip_suffix(b"\n").unwrap_or(line);
        let line = std::str::from_utf8(line)
            .map_err(|_| malformed("challenge is not valid UTF-8"))?;

        let rest = line
            .strip_prefix(CHALLENGE_HEAD)
            .ok_or_else(|| malformed("missing challenge preamble"))?;

        let digits = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if digits == 0 {
            return Err(malformed("missing bit count"));
        }
        let bits: u32 = rest[..digits]
            .parse()
            .map_err(|_| malformed("bit count out of range"))?;

        let rest = rest[digits..]
            .strip_prefix(CHALLENGE_BITS_TAIL)
            .ok_or_else(|| malformed("expected -bits of sha256(\" after the bit count"))?;

        let nonce = rest
            .get(..NONCE_LEN)
            .ok_or_else(|| malformed("nonce is truncated"))?;
        if rest.get(NONCE_LEN..) != Some(CHALLENGE_TAIL) {
            return Err(malformed("unexpected text after the nonce"));
        }

        Self::new(nonce, bits)
    }

    /// Check a response, ignoring its trailing whitespace
    pub fn verify(&self, response: &[u8]) -> bool {
        let mut message = Vec::with_capacity(NONCE_LEN + response.len());
        message.extend_from_slice(self.nonce.as_bytes());
        message.extend_from_slice(rstrip(response));
        self.target.matches(&CHALLENGE_ALGORITHM.digest(&message))
    }

    /// Search for a response.
    ///
    /// The response is the part of the found candidate after the nonce.
    pub fn solve(&self, config: &SearchConfig) -> Result<Vec<u8>> {
        let prefix = self.nonce.as_bytes();
        let pattern = Pattern::compile(prefix, RESPONSE_LEN, b"", engine::DEFAULT_ALPHABET)?;

        debug!(nonce = %self.nonce, bits = self.bits, "solving challenge");
        match engine::search(&pattern, &self.target, CHALLENGE_ALGORITHM.digest_fn(), config)? {
            SearchResult::Found(candidate) => Ok(candidate[prefix.len()..].to_vec()),
            SearchResult::Exhausted => Err(ProtocolError::Exhausted),
            SearchResult::Cancelled => Err(ProtocolError::Cancelled),
        }
    }
}

impl fmt::Display for Challenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{CHALLENGE_HEAD}{}{CHALLENGE_BITS_TAIL}{}{CHALLENGE_TAIL}",
            self.bits, self.nonce
        )
    }
}

impl FromStr for Challenge {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s.as_bytes())
    }
}

fn malformed(reason: &str) -> ProtocolError {
    ProtocolError::MalformedChallenge(reason.to_string())
}

/// Strip trailing whitespace and NUL bytes
fn rstrip(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|b| !matches!(b, b' ' | b'\t' | b'\n' | b'\x0b' | b'\x0c' | b'\r' | b'\0'))
        .map_or(0, |i| i + 1);
    &bytes[..end]
}

/// Verifier role: issue a fresh challenge and judge the reply.
///
/// Returns whether the response was accepted.
pub fn issue_challenge<T: Transport>(bits: u32, transport: &mut T) -> Result<bool> {
    let challenge = Challenge::random(bits)?;
    run_verifier(&challenge, transport)
}

/// Verifier role with a caller-chosen challenge
pub fn run_verifier<T: Transport>(challenge: &Challenge, transport: &mut T) -> Result<bool> {
    transport.send_line(challenge.to_string().as_bytes())?;

    let response = transport.read_line()?;
    let accepted = challenge.verify(&response);

    if accepted {
        info!(nonce = challenge.nonce(), bits = challenge.bits(), "response accepted");
        transport.send_line(ACCEPTED)?;
    } else {
        warn!(nonce = challenge.nonce(), bits = challenge.bits(), "response rejected");
        transport.send_line(REJECTED)?;
    }
    Ok(accepted)
}

/// Solver role: compute the response for a challenge line
pub fn solve_challenge(line: &[u8], config: &SearchConfig) -> Result<Vec<u8>> {
    Challenge::parse(line)?.solve(config)
}

/// Solver role over a transport: read the challenge, answer it, and read
/// back the verdict. Returns `true` for `OK`, `false` for `NG`.
pub fn respond<T: Transport>(transport: &mut T, config: &SearchConfig) -> Result<bool> {
    let line = transport.read_line()?;
    let challenge = Challenge::parse(&line)?;
    info!(nonce = challenge.nonce(), bits = challenge.bits(), "received challenge");

    let response = challenge.solve(config)?;
    transport.send_line(&response)?;

    let reply = transport.read_line()?;
    match reply.as_slice() {
        ACCEPTED => Ok(true),
        REJECTED => Ok(false),
        other => Err(ProtocolError::ProtocolMismatch(
            String::from_utf8_lossy(other).into_owned(),
        )),
    }
}
