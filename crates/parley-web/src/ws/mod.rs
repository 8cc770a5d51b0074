mod chat;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/chat", get(chat::chat_handler))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures::{SinkExt, StreamExt};
    use parley_core::AccountStore;
    use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
    use tokio_tungstenite::tungstenite::Message;
    use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

    use super::*;
    use crate::config::ServerConfig;
    use crate::test_support::test_state;

    type WsClient = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

    /// Serves the chat router on an ephemeral port and returns the endpoint URL.
    async fn serve(state: AppState) -> String {
        let app = router().with_state(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("ws://{addr}/chat")
    }

    async fn connect(url: &str) -> WsClient {
        let (client, _) = tokio_tungstenite::connect_async(url).await.unwrap();
        client
    }

    async fn recv_text(client: &mut WsClient) -> String {
        let msg = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("timed out waiting for a chat frame")
            .expect("stream ended")
            .expect("websocket error");
        msg.into_text().expect("expected a text frame")
    }

    async fn recv_close_code(client: &mut WsClient) -> CloseCode {
        loop {
            let msg = tokio::time::timeout(Duration::from_secs(5), client.next())
                .await
                .expect("timed out waiting for the close frame")
                .expect("stream ended without a close frame")
                .expect("websocket error");
            match msg {
                Message::Close(Some(frame)) => return frame.code,
                Message::Close(None) => panic!("close frame carried no code"),
                _ => continue,
            }
        }
    }

    async fn wait_for_online(state: &AppState, n: usize) {
        for _ in 0..200 {
            if state.relay.online() == n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {n} connection(s) online, got {}", state.relay.online());
    }

    #[tokio::test]
    async fn valid_ticket_authenticates_and_chat_reaches_everyone() {
        let state = test_state();
        let url = serve(state.clone()).await;

        let t1 = state.tickets.issue("alice");
        let t2 = state.tickets.issue("bob");

        let mut alice = connect(&url).await;
        alice.send(Message::Text(t1)).await.unwrap();
        let mut bob = connect(&url).await;
        bob.send(Message::Text(t2)).await.unwrap();
        wait_for_online(&state, 2).await;

        alice.send(Message::Text("hello".to_string())).await.unwrap();

        // Default echo policy: the sender hears itself too.
        assert_eq!(recv_text(&mut alice).await, "hello");
        assert_eq!(recv_text(&mut bob).await, "hello");
    }

    #[tokio::test]
    async fn invalid_ticket_is_closed_with_policy_violation() {
        let state = test_state();
        let url = serve(state.clone()).await;

        let mut client = connect(&url).await;
        client
            .send(Message::Text("no-such-ticket".to_string()))
            .await
            .unwrap();

        assert_eq!(recv_close_code(&mut client).await, CloseCode::Policy);
        assert_eq!(state.relay.online(), 0);
    }

    #[tokio::test]
    async fn reused_ticket_is_rejected() {
        let state = test_state();
        let url = serve(state.clone()).await;

        let ticket = state.tickets.issue("alice");

        let mut first = connect(&url).await;
        first.send(Message::Text(ticket.clone())).await.unwrap();
        wait_for_online(&state, 1).await;

        let mut second = connect(&url).await;
        second.send(Message::Text(ticket)).await.unwrap();
        assert_eq!(recv_close_code(&mut second).await, CloseCode::Policy);
        assert_eq!(state.relay.online(), 1);
    }

    #[tokio::test]
    async fn non_text_first_frame_is_closed_with_protocol_error() {
        let state = test_state();
        let url = serve(state).await;

        let mut client = connect(&url).await;
        client.send(Message::Binary(vec![1, 2, 3])).await.unwrap();

        assert_eq!(recv_close_code(&mut client).await, CloseCode::Protocol);
    }

    #[tokio::test]
    async fn silent_connection_times_out_and_never_authenticates() {
        let mut config = ServerConfig::default();
        config.ws.handshake_timeout_seconds = 1;
        let state = AppState::new(config, AccountStore::in_memory());
        let url = serve(state.clone()).await;

        let mut client = connect(&url).await;
        // Send nothing; the handshake deadline must close the socket.
        assert_eq!(recv_close_code(&mut client).await, CloseCode::Protocol);
        assert_eq!(state.relay.online(), 0);
    }

    #[tokio::test]
    async fn closing_one_connection_leaves_the_other_usable() {
        let state = test_state();
        let url = serve(state.clone()).await;

        let mut alice = connect(&url).await;
        alice
            .send(Message::Text(state.tickets.issue("alice")))
            .await
            .unwrap();
        let mut bob = connect(&url).await;
        bob.send(Message::Text(state.tickets.issue("bob")))
            .await
            .unwrap();
        wait_for_online(&state, 2).await;

        alice.close(None).await.unwrap();
        wait_for_online(&state, 1).await;

        bob.send(Message::Text("still here".to_string()))
            .await
            .unwrap();
        assert_eq!(recv_text(&mut bob).await, "still here");
    }
}
