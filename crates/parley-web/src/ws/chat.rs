//! Chat connection lifecycle: ticket handshake, then relay loop.
//!
//! A connection starts unauthenticated. Its first text frame must be a
//! ticket issued by `GET /ticket`. A rejected ticket, a non-text first
//! frame, or silence past the handshake timeout closes the socket. Once
//! authenticated, inbound text frames go to the broadcast relay verbatim
//! and relay traffic is written back out.

use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, Utf8Bytes, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use parley_core::TicketError;

use crate::state::AppState;

// 1006 (abnormal closure) cannot be sent on the wire, so the timeout case
// reuses the protocol-error code.
const CLOSE_PROTOCOL_ERROR: u16 = 1002;
const CLOSE_POLICY_VIOLATION: u16 = 1008;

#[derive(Debug)]
enum ConnectionError {
    TicketTimeout,
    TicketInvalid(TicketError),
    NotATicketFrame,
    TransportClosed,
}

impl ConnectionError {
    fn close_frame(&self) -> Option<CloseFrame> {
        match self {
            ConnectionError::TicketTimeout => Some(CloseFrame {
                code: CLOSE_PROTOCOL_ERROR,
                reason: "ticket not received in time".into(),
            }),
            ConnectionError::NotATicketFrame => Some(CloseFrame {
                code: CLOSE_PROTOCOL_ERROR,
                reason: "expected a ticket frame".into(),
            }),
            // One generic reason for every ticket failure; the close frame
            // goes to an unauthenticated peer.
            ConnectionError::TicketInvalid(_) => Some(CloseFrame {
                code: CLOSE_POLICY_VIOLATION,
                reason: "invalid ticket".into(),
            }),
            ConnectionError::TransportClosed => None,
        }
    }
}

pub async fn chat_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_chat(socket, state))
}

async fn handle_chat(mut socket: WebSocket, state: AppState) {
    let username = match authenticate(&mut socket, &state).await {
        Ok(username) => username,
        Err(err) => {
            if let Some(frame) = err.close_frame() {
                tracing::warn!("Rejected chat connection: {}", frame.reason.as_str());
                let _ = socket.send(Message::Close(Some(frame))).await;
            }
            return;
        }
    };

    let (conn_id, mut inbox) = state.relay.register(&username);
    let (mut ws_sender, mut ws_receiver) = socket.split();

    loop {
        tokio::select! {
            broadcast = inbox.recv() => {
                match broadcast {
                    Some(text) => {
                        if ws_sender.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            inbound = ws_receiver.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        state.relay.publish(conn_id, text.as_str());
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => {
                        break;
                    }
                    // Binary and control frames carry no chat text.
                    _ => {}
                }
            }
        }
    }

    state.relay.deregister(conn_id);
}

/// Awaits the single ticket frame and redeems it, bounded by the handshake
/// timeout. Returns the identity the ticket was bound to.
async fn authenticate(socket: &mut WebSocket, state: &AppState) -> Result<String, ConnectionError> {
    let timeout = Duration::from_secs(state.config.ws.handshake_timeout_seconds);

    let frame = match tokio::time::timeout(timeout, socket.recv()).await {
        Err(_) => return Err(ConnectionError::TicketTimeout),
        Ok(frame) => frame,
    };

    let ticket_id = ticket_from_frame(frame)?;

    state.tickets.redeem(ticket_id.as_str()).map_err(|e| {
        tracing::warn!("Ticket redemption failed: {e}");
        ConnectionError::TicketInvalid(e)
    })
}

/// Classifies the first inbound frame: only a text frame carries a ticket.
fn ticket_from_frame(
    frame: Option<Result<Message, axum::Error>>,
) -> Result<Utf8Bytes, ConnectionError> {
    match frame {
        None | Some(Err(_)) | Some(Ok(Message::Close(_))) => {
            Err(ConnectionError::TransportClosed)
        }
        Some(Ok(Message::Text(text))) => Ok(text),
        Some(Ok(_)) => Err(ConnectionError::NotATicketFrame),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_frame_yields_the_ticket() {
        let frame = Some(Ok(Message::Text("ticket-id".into())));
        assert_eq!(ticket_from_frame(frame).unwrap().as_str(), "ticket-id");
    }

    #[test]
    fn non_text_first_frame_is_rejected() {
        let binary = ticket_from_frame(Some(Ok(Message::Binary(vec![1, 2, 3].into()))));
        assert!(matches!(binary, Err(ConnectionError::NotATicketFrame)));

        let ping = ticket_from_frame(Some(Ok(Message::Ping(Vec::new().into()))));
        assert!(matches!(ping, Err(ConnectionError::NotATicketFrame)));
    }

    #[test]
    fn closed_or_failed_transport_gets_no_close_frame() {
        let gone = ticket_from_frame(None).unwrap_err();
        assert!(gone.close_frame().is_none());

        let closed = ticket_from_frame(Some(Ok(Message::Close(None)))).unwrap_err();
        assert!(closed.close_frame().is_none());

        let errored =
            ticket_from_frame(Some(Err(axum::Error::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "reset",
            )))))
            .unwrap_err();
        assert!(errored.close_frame().is_none());
    }

    #[test]
    fn close_codes_match_the_failure() {
        let timeout = ConnectionError::TicketTimeout.close_frame().unwrap();
        assert_eq!(timeout.code, CLOSE_PROTOCOL_ERROR);

        let wrong_frame = ConnectionError::NotATicketFrame.close_frame().unwrap();
        assert_eq!(wrong_frame.code, CLOSE_PROTOCOL_ERROR);

        // Every ticket failure closes with the same code and reason.
        for err in [
            TicketError::NotFound,
            TicketError::Expired,
            TicketError::AlreadyRedeemed,
        ] {
            let frame = ConnectionError::TicketInvalid(err).close_frame().unwrap();
            assert_eq!(frame.code, CLOSE_POLICY_VIOLATION);
            assert_eq!(frame.reason.as_str(), "invalid ticket");
        }
    }
}
