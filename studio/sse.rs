use std::io::Write;

use log::info;
use tiny_http::Request;

use lacuna_nn::train::progress::{ProgressMessage, ProgressSink, SinkClosed, TerminalMessage};
use lacuna_nn::train::{run_session, SessionConfig};

/// `GET /train/events`: one training session per connection.
///
/// Takes ownership of the request so we can hold the raw TCP stream for the
/// session's lifetime: headers go out first, then one SSE frame per progress
/// message. A failed write is the disconnect signal; the session driver sees
/// it as a closed sink and stops. The config is fixed at deployment; the
/// client sends nothing after connecting.
pub fn handle_train_stream(request: Request) {
    info!("training stream opened from {:?}", request.remote_addr());
    let mut writer = request.into_writer();

    // Write HTTP response headers manually (tiny_http into_writer path).
    let header = "HTTP/1.1 200 OK\r\n\
                  Content-Type: text/event-stream\r\n\
                  Cache-Control: no-cache\r\n\
                  Connection: keep-alive\r\n\
                  Access-Control-Allow-Origin: *\r\n\
                  X-Accel-Buffering: no\r\n\
                  \r\n";
    if write_all(&mut writer, header.as_bytes()).is_err() {
        return;
    }

    let mut sink = SseSink { writer: &mut writer };
    run_session(&mut sink, &SessionConfig::default());
}

/// Adapts a raw byte writer into the driver's progress channel.
struct SseSink<W: Write> {
    writer: W,
}

impl<W: Write> ProgressSink for SseSink<W> {
    fn send(&mut self, message: &ProgressMessage) -> Result<(), SinkClosed> {
        let event = match message {
            ProgressMessage::Epoch { .. } => "epoch",
            ProgressMessage::Terminal(TerminalMessage::Done { .. }) => "done",
            ProgressMessage::Terminal(TerminalMessage::Error { .. }) => "error",
        };
        let json = serde_json::to_string(message).map_err(|_| SinkClosed)?;
        let frame = format!("event: {}\ndata: {}\n\n", event, json);
        write_all(&mut self.writer, frame.as_bytes()).map_err(|_| SinkClosed)
    }
}

/// Writes all bytes to the writer, flushing immediately so each event
/// reaches the browser before the next blocking fit call starts.
fn write_all<W: Write>(w: &mut W, data: &[u8]) -> std::io::Result<()> {
    w.write_all(data)?;
    w.flush()
}
