use std::io::{self, BufRead, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};

use scene_bridge::mutation::Diagnostic;
use scene_bridge::{CommandRouter, SceneStore};
use thiserror::Error;
use tracing::{debug, info, warn};

const CONTROL_PREFIX: &str = "C ";
const TELEMETRY_PREFIX: &str = "T ";
const SYNC_COMMAND: &str = "sync";
const SYNC_ACK: &str = "ok: sync";
const MAX_PENDING_LINE_BYTES_PER_CLIENT: usize = 256 * 1024;

#[derive(Debug, Error)]
pub(crate) enum HostError {
    #[error("failed to bind 127.0.0.1:{port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: io::Error,
    },
    #[error("transport io failed: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Outbound {
    Control(String),
    Telemetry(String),
}

/// Answers one inbound line. Warnings come first as telemetry so a client
/// that stops reading at the control response has already seen them.
pub(crate) fn respond<S: SceneStore>(router: &mut CommandRouter<S>, line: &str) -> Vec<Outbound> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    if trimmed == SYNC_COMMAND {
        return vec![Outbound::Control(SYNC_ACK.to_string())];
    }

    let response = router.handle(trimmed);
    let mut out = response
        .warnings
        .iter()
        .filter_map(warning_line)
        .map(Outbound::Telemetry)
        .collect::<Vec<_>>();
    out.push(Outbound::Control(response.to_line()));
    out
}

fn warning_line(diagnostic: &Diagnostic) -> Option<String> {
    match serde_json::to_string(diagnostic) {
        Ok(json) => Some(format!("bridge.warning v1 {json}")),
        Err(err) => {
            warn!(error = %err, "bridge_warning_encode_failed");
            None
        }
    }
}

/// Serves requests from `reader` until EOF. Only control lines are written;
/// warnings already travel inside each response and through the log.
pub(crate) fn serve_stdio<S, R, W>(
    router: &mut CommandRouter<S>,
    mut reader: R,
    mut writer: W,
) -> Result<(), HostError>
where
    S: SceneStore,
    R: BufRead,
    W: Write,
{
    info!("bridge_stdio_serving");
    let mut buffer = Vec::new();
    let mut lines = Vec::new();
    loop {
        buffer.clear();
        if reader.read_until(b'\n', &mut buffer)? == 0 {
            break;
        }
        if buffer.last() != Some(&b'\n') {
            buffer.push(b'\n');
        }
        drain_complete_lines(&mut buffer, &mut lines);
        for line in lines.drain(..) {
            for outbound in respond(router, &line) {
                if let Outbound::Control(text) = outbound {
                    writer.write_all(&encode_line_payload(&text))?;
                }
            }
        }
        writer.flush()?;
    }
    info!("bridge_stdio_closed");
    Ok(())
}

/// Localhost-only line server. Clients are served one at a time since the
/// router owns the scene.
#[derive(Debug)]
pub(crate) struct TcpLineServer {
    listener: TcpListener,
    bound_port: u16,
    max_pending_bytes: usize,
}

impl TcpLineServer {
    pub(crate) fn bind_localhost(port: u16) -> Result<Self, HostError> {
        let addr = localhost_bind_addr(port);
        let listener =
            TcpListener::bind(addr).map_err(|source| HostError::Bind { port, source })?;
        let bound_port = listener.local_addr()?.port();
        info!(port = bound_port, "bridge_tcp_listening");
        Ok(Self {
            listener,
            bound_port,
            max_pending_bytes: MAX_PENDING_LINE_BYTES_PER_CLIENT,
        })
    }

    #[cfg(test)]
    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub(crate) fn serve<S: SceneStore>(&self, router: &mut CommandRouter<S>) {
        loop {
            self.serve_next_client(router);
        }
    }

    /// Accepts one client and serves it until it disconnects.
    fn serve_next_client<S: SceneStore>(&self, router: &mut CommandRouter<S>) {
        let (stream, peer) = match self.listener.accept() {
            Ok(accepted) => accepted,
            Err(err) => {
                warn!(error = %err, "bridge_accept_failed");
                return;
            }
        };
        if let Err(err) = stream.set_nodelay(true) {
            warn!(error = %err, "bridge_client_nodelay_failed");
        }
        info!(peer = %peer, "bridge_client_connected");
        match serve_client(stream, self.bound_port, self.max_pending_bytes, router) {
            Ok(()) => info!(peer = %peer, "bridge_client_disconnected"),
            Err(err) => warn!(peer = %peer, error = %err, "bridge_client_io_failed"),
        }
    }
}

/// Serves one client until EOF. A client whose unterminated line outgrows
/// `max_pending_bytes` is dropped.
fn serve_client<S: SceneStore>(
    mut stream: TcpStream,
    port: u16,
    max_pending_bytes: usize,
    router: &mut CommandRouter<S>,
) -> io::Result<()> {
    stream.write_all(&encode_remote_tagged_payload(
        CONTROL_PREFIX,
        &ready_line_text(port),
    ))?;
    let mut read_buf = Vec::new();
    let mut lines = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let bytes_read = stream.read(&mut chunk)?;
        if bytes_read == 0 {
            return Ok(());
        }
        read_buf.extend_from_slice(&chunk[..bytes_read]);
        drain_complete_lines(&mut read_buf, &mut lines);
        for line in lines.drain(..) {
            for outbound in respond(router, &line) {
                stream.write_all(&encode_outbound(&outbound))?;
            }
        }
        stream.flush()?;
        if read_buf.len() > max_pending_bytes {
            warn!(
                pending_bytes = read_buf.len(),
                cap = max_pending_bytes,
                "bridge_client_line_too_long_dropped"
            );
            return Ok(());
        }
    }
}

fn localhost_bind_addr(port: u16) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], port))
}

fn drain_complete_lines(buffer: &mut Vec<u8>, out: &mut Vec<String>) {
    while let Some(newline_index) = buffer.iter().position(|byte| *byte == b'\n') {
        let mut line_bytes = buffer.drain(..=newline_index).collect::<Vec<u8>>();
        line_bytes.pop(); // newline
        if line_bytes.last().copied() == Some(b'\r') {
            line_bytes.pop();
        }

        match String::from_utf8(line_bytes) {
            Ok(line) => {
                debug!(line = %line, "bridge_line_read");
                out.push(line)
            }
            Err(err) => warn!(error = %err, "bridge_invalid_utf8_line_dropped"),
        }
    }
}

fn encode_line_payload(line: &str) -> Vec<u8> {
    let mut payload = Vec::with_capacity(line.len() + 1);
    payload.extend_from_slice(line.as_bytes());
    payload.push(b'\n');
    payload
}

fn encode_remote_tagged_payload(prefix: &str, line: &str) -> Vec<u8> {
    let mut payload = Vec::with_capacity(prefix.len() + line.len() + 1);
    payload.extend_from_slice(prefix.as_bytes());
    payload.extend_from_slice(line.as_bytes());
    payload.push(b'\n');
    payload
}

fn encode_outbound(outbound: &Outbound) -> Vec<u8> {
    match outbound {
        Outbound::Control(line) => encode_remote_tagged_payload(CONTROL_PREFIX, line),
        Outbound::Telemetry(line) => encode_remote_tagged_payload(TELEMETRY_PREFIX, line),
    }
}

fn ready_line_text(port: u16) -> String {
    format!("bridge.ready v1 port:{port}")
}
