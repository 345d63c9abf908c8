//! WebSocket [`Connector`] backed by `tokio-tungstenite`.

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use poolwire_core::{Connection, Connector, Frame, FrameSink, FrameSource, TransportError};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Dials `ws://` and `wss://` URLs.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> Result<Connection, TransportError> {
        let (ws, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| TransportError::Connect {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        let (sink, stream) = ws.split();
        Ok(Connection {
            source: Box::new(WsSource { stream }),
            sink: Box::new(WsSink { sink }),
        })
    }
}

struct WsSource {
    stream: SplitStream<WsStream>,
}

#[async_trait]
impl FrameSource for WsSource {
    async fn next_frame(&mut self) -> Option<Result<Frame, TransportError>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(Frame::Text(text))),
                Ok(Message::Binary(data)) => return Some(Ok(Frame::Binary(data))),
                Ok(Message::Close(_)) => return None,
                // ping/pong are answered by tungstenite
                Ok(_) => continue,
                Err(e) => return Some(Err(TransportError::Read(e.to_string()))),
            }
        }
    }
}

struct WsSink {
    sink: SplitSink<WsStream, Message>,
}

#[async_trait]
impl FrameSink for WsSink {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.sink
            .send(Message::Text(text))
            .await
            .map_err(|e| TransportError::Write(e.to_string()))
    }

    async fn close(&mut self) {
        let _ = self.sink.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn refused_dial_is_connect_error() {
        // port 9 (discard) on localhost is closed in test environments
        let err = WsConnector
            .connect("ws://127.0.0.1:9/ws")
            .await
            .err()
            .unwrap();
        assert!(matches!(err, TransportError::Connect { .. }));
        assert!(err.is_retryable());
    }
}
