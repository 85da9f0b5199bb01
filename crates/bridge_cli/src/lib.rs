use std::fs;
use std::io::{self, BufRead, BufReader, Write};
use std::net::TcpStream;
use std::thread;
use std::time::{Duration, Instant};

use serde_json::Value;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 46011;
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_RETRY_MS: u64 = 100;
const MAX_RETRY_BACKOFF_MS: u64 = 1_000;
const SOCKET_READ_TIMEOUT_MS: u64 = 100;
const READY_PREFIX: &str = "bridge.ready v1 port:";
const SYNC_COMMAND: &str = "sync";
const SYNC_ACK: &str = "ok: sync";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("timed out waiting for bridge ready on 127.0.0.1:{port}")]
    NotReady { port: u16 },
    #[error("socket setup failed: {0}")]
    Setup(#[source] io::Error),
    #[error("failed to send line: {0}")]
    Send(#[source] io::Error),
    #[error("socket read error while waiting for {waiting_for}: {source}")]
    Read {
        waiting_for: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("socket disconnected while waiting for {waiting_for}")]
    Disconnected { waiting_for: &'static str },
    #[error("timed out waiting for {waiting_for}")]
    Timeout { waiting_for: &'static str },
    #[error("failed to read script file '{path}': {source}")]
    Script {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("request failed: {0}")]
    Rejected(String),
    #[error("request applied only partially: {0}")]
    Partial(String),
}

impl ClientError {
    /// 2 when the host answered but `--strict` refused the answer, 1 for
    /// every transport problem.
    pub fn exit_code(&self) -> u8 {
        match self {
            ClientError::Rejected(_) | ClientError::Partial(_) => 2,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineChannel {
    Control,
    Telemetry,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    pub channel: LineChannel,
    pub payload: String,
}

#[derive(Debug, Clone, Copy)]
pub struct CommonOptions {
    pub port: u16,
    pub timeout_ms: u64,
    pub retry_ms: u64,
    pub include_telemetry: bool,
    pub strict: bool,
    pub pretty: bool,
}

impl Default for CommonOptions {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            retry_ms: DEFAULT_RETRY_MS,
            include_telemetry: false,
            strict: false,
            pretty: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    WaitReady,
    Send { request: String },
    Script { path: String, barrier: bool },
    Barrier,
}

struct Session {
    writer: TcpStream,
    reader: BufReader<TcpStream>,
    pending: Vec<u8>,
}

pub fn parse_wire_line(raw: &str) -> ParsedLine {
    let trimmed = raw.trim_end_matches(['\r', '\n']);
    if let Some(payload) = trimmed.strip_prefix("C ") {
        return ParsedLine {
            channel: LineChannel::Control,
            payload: payload.to_string(),
        };
    }
    if let Some(payload) = trimmed.strip_prefix("T ") {
        return ParsedLine {
            channel: LineChannel::Telemetry,
            payload: payload.to_string(),
        };
    }
    ParsedLine {
        channel: LineChannel::Unknown,
        payload: trimmed.to_string(),
    }
}

pub fn should_print_line(line: &ParsedLine, include_telemetry: bool) -> bool {
    match line.channel {
        LineChannel::Control => true,
        LineChannel::Telemetry => include_telemetry,
        LineChannel::Unknown => false,
    }
}

pub fn is_ready_payload(payload: &str) -> bool {
    payload.starts_with(READY_PREFIX)
}

pub fn is_sync_ok_payload(payload: &str) -> bool {
    payload == SYNC_ACK
}

pub fn parse_script_commands(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Checks a control response under `--strict`: `ok:false` is a rejection,
/// `fullSuccess:false` a partial application. Non-JSON payloads pass.
pub fn check_response(payload: &str) -> Result<(), ClientError> {
    let Ok(response) = serde_json::from_str::<Value>(payload) else {
        return Ok(());
    };
    if response.get("ok") == Some(&Value::Bool(false)) {
        let error = &response["error"];
        let code = error["code"].as_str().unwrap_or("Unknown");
        let message = error["message"].as_str().unwrap_or_default();
        return Err(ClientError::Rejected(format!("{code}: {message}")));
    }
    if response.get("fullSuccess") == Some(&Value::Bool(false)) {
        let failed = response["outcomes"]
            .as_array()
            .map(|outcomes| {
                outcomes
                    .iter()
                    .filter(|outcome| outcome["applied"] == Value::Bool(false))
                    .filter_map(|outcome| outcome["name"].as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();
        return Err(ClientError::Partial(format!("failed fields: {failed}")));
    }
    Ok(())
}

/// Pretty-prints JSON payloads when asked; anything else is returned as is.
pub fn render_payload(payload: &str, pretty: bool) -> String {
    if !pretty {
        return payload.to_string();
    }
    serde_json::from_str::<Value>(payload)
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
        .unwrap_or_else(|| payload.to_string())
}

pub fn run<W: Write>(
    kind: CommandKind,
    opts: CommonOptions,
    stdout: &mut W,
) -> Result<(), ClientError> {
    let timeout = Duration::from_millis(opts.timeout_ms);
    let retry_base = Duration::from_millis(opts.retry_ms.max(1));
    let mut session = connect_and_wait_ready(opts.port, timeout, retry_base, |line| {
        emit_line(stdout, line, opts)
    })?;

    match kind {
        CommandKind::WaitReady => Ok(()),
        CommandKind::Send { request } => {
            exchange(&mut session, &request, timeout, opts, stdout)
        }
        CommandKind::Script { path, barrier } => {
            let content = fs::read_to_string(&path)
                .map_err(|source| ClientError::Script { path, source })?;
            for request in parse_script_commands(&content) {
                exchange(&mut session, &request, timeout, opts, stdout)?;
            }
            if barrier {
                send_barrier_and_wait_ack(&mut session, timeout, |line| {
                    emit_line(stdout, line, opts)
                })?;
            }
            Ok(())
        }
        CommandKind::Barrier => send_barrier_and_wait_ack(&mut session, timeout, |line| {
            emit_line(stdout, line, opts)
        }),
    }
}

/// Sends one request and waits for its single control response.
fn exchange<W: Write>(
    session: &mut Session,
    request: &str,
    timeout: Duration,
    opts: CommonOptions,
    stdout: &mut W,
) -> Result<(), ClientError> {
    send_line(&mut session.writer, request)?;
    let response = wait_for_control(session, timeout, "command response", |line| {
        emit_line(stdout, line, opts)
    })?;
    if opts.strict {
        check_response(&response)?;
    }
    Ok(())
}

fn connect_and_wait_ready<F>(
    port: u16,
    timeout: Duration,
    retry_base: Duration,
    mut on_line: F,
) -> Result<Session, ClientError>
where
    F: FnMut(&ParsedLine),
{
    let deadline = Instant::now() + timeout;
    let mut attempt = 0u32;

    while Instant::now() < deadline {
        if let Ok(writer) = TcpStream::connect(("127.0.0.1", port)) {
            writer
                .set_read_timeout(Some(Duration::from_millis(SOCKET_READ_TIMEOUT_MS)))
                .map_err(ClientError::Setup)?;
            let reader_stream = writer.try_clone().map_err(ClientError::Setup)?;
            let mut session = Session {
                writer,
                reader: BufReader::new(reader_stream),
                pending: Vec::new(),
            };

            match wait_for_ready(&mut session, deadline, &mut on_line) {
                WaitReadyOutcome::Ready => return Ok(session),
                WaitReadyOutcome::Timeout => break,
                WaitReadyOutcome::Disconnected => {}
                WaitReadyOutcome::IoError(source) => {
                    return Err(ClientError::Read {
                        waiting_for: "ready",
                        source,
                    });
                }
            }
        }
        if Instant::now() >= deadline {
            break;
        }

        let shift = attempt.min(8);
        let backoff_ms = (retry_base.as_millis() as u64)
            .saturating_mul(1u64 << shift)
            .min(MAX_RETRY_BACKOFF_MS);
        let sleep_for = Duration::from_millis(backoff_ms.max(1));
        if Instant::now() + sleep_for >= deadline {
            break;
        }
        thread::sleep(sleep_for);
        attempt = attempt.saturating_add(1);
    }

    Err(ClientError::NotReady { port })
}

enum WaitReadyOutcome {
    Ready,
    Timeout,
    Disconnected,
    IoError(io::Error),
}

fn wait_for_ready<F>(session: &mut Session, deadline: Instant, on_line: &mut F) -> WaitReadyOutcome
where
    F: FnMut(&ParsedLine),
{
    loop {
        match read_one_line(session, deadline) {
            ReadOutcome::Line(raw) => {
                let parsed = parse_wire_line(&raw);
                on_line(&parsed);
                if parsed.channel == LineChannel::Control && is_ready_payload(&parsed.payload) {
                    return WaitReadyOutcome::Ready;
                }
            }
            ReadOutcome::NoData => {}
            ReadOutcome::Disconnected => return WaitReadyOutcome::Disconnected,
            ReadOutcome::DeadlineExceeded => return WaitReadyOutcome::Timeout,
            ReadOutcome::IoError(error) => return WaitReadyOutcome::IoError(error),
        }
    }
}

fn send_barrier_and_wait_ack<F>(
    session: &mut Session,
    timeout: Duration,
    mut on_line: F,
) -> Result<(), ClientError>
where
    F: FnMut(&ParsedLine),
{
    send_line(&mut session.writer, SYNC_COMMAND)?;
    let deadline = Instant::now() + timeout;
    loop {
        let parsed = next_line(session, deadline, "barrier ack")?;
        on_line(&parsed);
        if parsed.channel == LineChannel::Control && is_sync_ok_payload(&parsed.payload) {
            return Ok(());
        }
    }
}

/// Reads until the next control line, passing every line to `on_line`, and
/// returns that control payload.
fn wait_for_control<F>(
    session: &mut Session,
    timeout: Duration,
    waiting_for: &'static str,
    mut on_line: F,
) -> Result<String, ClientError>
where
    F: FnMut(&ParsedLine),
{
    let deadline = Instant::now() + timeout;
    loop {
        let parsed = next_line(session, deadline, waiting_for)?;
        on_line(&parsed);
        if parsed.channel == LineChannel::Control {
            return Ok(parsed.payload);
        }
    }
}

fn next_line(
    session: &mut Session,
    deadline: Instant,
    waiting_for: &'static str,
) -> Result<ParsedLine, ClientError> {
    loop {
        match read_one_line(session, deadline) {
            ReadOutcome::Line(raw) => return Ok(parse_wire_line(&raw)),
            ReadOutcome::NoData => {}
            ReadOutcome::Disconnected => return Err(ClientError::Disconnected { waiting_for }),
            ReadOutcome::DeadlineExceeded => return Err(ClientError::Timeout { waiting_for }),
            ReadOutcome::IoError(source) => {
                return Err(ClientError::Read {
                    waiting_for,
                    source,
                })
            }
        }
    }
}

fn emit_line<W: Write>(stdout: &mut W, line: &ParsedLine, opts: CommonOptions) {
    if should_print_line(line, opts.include_telemetry) {
        let _ = writeln!(stdout, "{}", render_payload(&line.payload, opts.pretty));
    }
}

fn send_line(writer: &mut TcpStream, line: &str) -> Result<(), ClientError> {
    writer
        .write_all(line.as_bytes())
        .and_then(|()| writer.write_all(b"\n"))
        .and_then(|()| writer.flush())
        .map_err(ClientError::Send)
}

enum ReadOutcome {
    Line(String),
    NoData,
    Disconnected,
    DeadlineExceeded,
    IoError(io::Error),
}

/// Partial lines survive read timeouts in `session.pending`.
fn read_one_line(session: &mut Session, deadline: Instant) -> ReadOutcome {
    if Instant::now() >= deadline {
        return ReadOutcome::DeadlineExceeded;
    }

    match session.reader.read_until(b'\n', &mut session.pending) {
        Ok(0) => ReadOutcome::Disconnected,
        Ok(_) if session.pending.last() == Some(&b'\n') => {
            let bytes = std::mem::take(&mut session.pending);
            ReadOutcome::Line(String::from_utf8_lossy(&bytes).into_owned())
        }
        Ok(_) => ReadOutcome::NoData,
        Err(error)
            if error.kind() == io::ErrorKind::WouldBlock
                || error.kind() == io::ErrorKind::TimedOut =>
        {
            ReadOutcome::NoData
        }
        Err(error) => ReadOutcome::IoError(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_wire_line_handles_channels_and_crlf() {
        assert_eq!(
            parse_wire_line("C ok: sync\r\n"),
            ParsedLine {
                channel: LineChannel::Control,
                payload: "ok: sync".to_string(),
            }
        );
        assert_eq!(
            parse_wire_line("T bridge.warning v1 {\"severity\":\"info\"}\n"),
            ParsedLine {
                channel: LineChannel::Telemetry,
                payload: "bridge.warning v1 {\"severity\":\"info\"}".to_string(),
            }
        );
        assert_eq!(parse_wire_line("stray\r\n").channel, LineChannel::Unknown);
    }

    #[test]
    fn output_filter_defaults_control_only_and_allows_telemetry() {
        let control = parse_wire_line("C {\"ok\":true}");
        let telemetry = parse_wire_line("T bridge.warning v1 {}");
        let unknown = parse_wire_line("raw");

        assert!(should_print_line(&control, false));
        assert!(!should_print_line(&telemetry, false));
        assert!(!should_print_line(&unknown, true));
        assert!(should_print_line(&telemetry, true));
    }

    #[test]
    fn ready_and_barrier_matchers_work() {
        assert!(is_ready_payload("bridge.ready v1 port:46011"));
        assert!(!is_ready_payload("ok: sync"));
        assert!(is_sync_ok_payload("ok: sync"));
        assert!(!is_sync_ok_payload("{\"ok\":true}"));
    }

    #[test]
    fn parse_script_commands_ignores_blank_and_comment_lines() {
        let content = r#"
            # move the crate
            {"operation":"set_properties","target":"Crate","targetKind":"Transform","fields":{"x":"2"}}

            # and undo it
            {"operation":"undo"}
        "#;
        let commands = parse_script_commands(content);
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[1], r#"{"operation":"undo"}"#);
    }

    #[test]
    fn strict_check_rejects_errors_and_partial_batches() {
        assert!(check_response(r#"{"ok":true,"fullSuccess":true,"outcomes":[]}"#).is_ok());
        assert!(check_response("ok: sync").is_ok());

        let err = check_response(
            r#"{"ok":false,"error":{"code":"TargetNotFound","message":"no object named 'Ghost'"}}"#,
        )
        .expect_err("rejected");
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("TargetNotFound"));

        let err = check_response(
            r#"{"ok":true,"fullSuccess":false,"partialSuccess":true,
                "outcomes":[{"name":"mass","applied":true},{"name":"bogus","applied":false}]}"#,
        )
        .expect_err("partial");
        assert!(matches!(err, ClientError::Partial(ref detail) if detail.ends_with("bogus")));
    }

    #[test]
    fn pretty_rendering_only_touches_json() {
        assert_eq!(render_payload("ok: sync", true), "ok: sync");
        assert_eq!(render_payload("{\"ok\":true}", false), "{\"ok\":true}");
        assert_eq!(render_payload("{\"ok\":true}", true), "{\n  \"ok\": true\n}");
    }

    #[test]
    fn transport_errors_exit_with_one() {
        assert_eq!(ClientError::NotReady { port: 1 }.exit_code(), 1);
        assert_eq!(
            ClientError::Timeout {
                waiting_for: "barrier ack"
            }
            .to_string(),
            "timed out waiting for barrier ack"
        );
    }
}
