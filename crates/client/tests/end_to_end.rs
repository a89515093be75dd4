use std::time::Duration;

use chat_relay::http::router;
use chat_relay::{Relay, RelayConfigBuilder, UpstreamClient};
use chat_relay_client::{ChatSession, ClientError, Phase, RelayClient};
use chat_relay_protocol::ChatMessage;
use chat_relay_test_model::{
    PresetError, PresetEvent, PresetResponse, TestModelProvider,
};
use tokio::net::TcpListener;

async fn serve(
    provider: &TestModelProvider,
    token: Option<&str>,
) -> RelayClient {
    let builder = RelayConfigBuilder::new();
    let config = match token {
        Some(token) => builder.with_api_token(token).build(),
        None => builder.build(),
    };
    let app = router(Relay::new(config, UpstreamClient::new(provider.clone())));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let http = reqwest::Client::builder().no_proxy().build().unwrap();
    RelayClient::with_client(&format!("http://{addr}"), http)
}

#[tokio::test]
async fn test_streamed_reply() {
    let mut provider =
        TestModelProvider::with_response(PresetResponse::with_fragments([
            "안녕하세요!",
            "",
            " 무엇을",
            " 도와드릴까요?",
        ]));
    // Spread the fragments over separate reads.
    provider.set_delay(Duration::from_millis(10));
    let client = serve(&provider, Some("hf_test")).await;

    let health = client.health().await.unwrap();
    assert!(health.token_configured);

    let mut session = ChatSession::new();
    let mut phases = Vec::new();
    let mut texts = Vec::new();
    let accepted = session
        .send(&client, "안녕", |session| {
            phases.push(session.phase());
            if let Some(message) = session.transcript().last() {
                texts.push(message.text.clone());
            }
        })
        .await;

    assert!(accepted);
    assert_eq!(phases.first(), Some(&Phase::Sending));
    assert_eq!(phases.last(), Some(&Phase::Idle));
    assert!(texts.contains(&"안녕하세요! 무엇을".to_owned()));
    assert_eq!(provider.request_count(), 1);

    let reply = session.transcript().last().unwrap();
    assert_eq!(reply.text, "안녕하세요! 무엇을 도와드릴까요?");
    assert!(!reply.is_user);
    assert!(!reply.in_progress);
    assert!(!session.is_loading());
    // Greeting, user turn and reply.
    assert_eq!(session.transcript().len(), 3);
}

#[tokio::test]
async fn test_mid_stream_failure() {
    let provider =
        TestModelProvider::with_response(PresetResponse::with_events([
            PresetEvent::MessageDelta("Hi".to_owned()),
            PresetEvent::Error(PresetError::new("upstream went away")),
        ]));
    let client = serve(&provider, Some("hf_test")).await;

    let mut session = ChatSession::new();
    session.send(&client, "Hi", |_| {}).await;

    let reply = session.transcript().last().unwrap();
    assert!(reply.text.starts_with("Sorry, something went wrong"));
    assert!(reply.text.contains("upstream went away"));
    assert!(!reply.in_progress);
    assert!(!session.is_loading());

    // The session accepts the next message.
    assert!(session.begin("again").is_some());
}

#[tokio::test]
async fn test_missing_token() {
    let provider = TestModelProvider::default();
    let client = serve(&provider, None).await;

    let health = client.health().await.unwrap();
    assert!(!health.token_configured);

    let mut session = ChatSession::new();
    session.send(&client, "Hi", |_| {}).await;
    let reply = session.transcript().last().unwrap();
    assert!(reply.text.contains("token"));
    assert_eq!(provider.request_count(), 0);

    let err = client
        .complete(vec![ChatMessage::user("Hi")])
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Relayed(_)));
}

#[tokio::test]
async fn test_single_shot() {
    let provider = TestModelProvider::with_response(
        PresetResponse::with_fragments(["Hello", ", world"]),
    );
    let client = serve(&provider, Some("hf_test")).await;

    let reply = client.complete(vec![ChatMessage::user("Hi")]).await;
    assert_eq!(reply, Ok("Hello, world".to_owned()));
    assert_eq!(provider.last_request().unwrap().max_tokens, 200);
}

#[tokio::test]
async fn test_unreachable_relay() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let http = reqwest::Client::builder().no_proxy().build().unwrap();
    let client = RelayClient::with_client(&format!("http://{addr}"), http);
    let mut session = ChatSession::new();
    session.send(&client, "Hi", |_| {}).await;

    let reply = session.transcript().last().unwrap();
    assert!(reply.text.contains("relay server is running"));
    assert_eq!(session.phase(), Phase::Idle);
}
