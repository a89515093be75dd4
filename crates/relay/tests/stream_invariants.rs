use chat_relay::{Relay, RelayConfigBuilder, UpstreamClient};
use chat_relay_protocol::{ChatMessage, StreamEvent};
use chat_relay_test_model::{
    PresetError, PresetEvent, PresetResponse, TestModelProvider,
};
use futures_util::StreamExt;

fn relay(response: PresetResponse) -> Relay {
    let config = RelayConfigBuilder::new().with_api_token("hf_test").build();
    let provider = TestModelProvider::with_response(response);
    Relay::new(config, UpstreamClient::new(provider))
}

async fn collect(response: PresetResponse) -> Vec<StreamEvent> {
    relay(response)
        .stream(vec![ChatMessage::user("hello")])
        .collect()
        .await
}

/// Checks the shape of a stream and the cumulative text it carries.
fn assert_well_formed(events: &[StreamEvent]) {
    assert_eq!(events.first(), Some(&StreamEvent::Start));
    let terminals = events.iter().filter(|e| e.is_terminal()).count();
    assert_eq!(terminals, 1, "exactly one terminal event in {events:?}");
    assert!(events.last().is_some_and(StreamEvent::is_terminal));

    let mut concatenated = String::new();
    for event in &events[1..] {
        match event {
            StreamEvent::Chunk {
                content,
                full_response,
            } => {
                assert!(!content.is_empty());
                concatenated.push_str(content);
                assert_eq!(full_response, &concatenated);
            }
            StreamEvent::End { full_response } => {
                assert_eq!(full_response, &concatenated);
            }
            StreamEvent::Error { .. } => {}
            StreamEvent::Start => panic!("second start in {events:?}"),
        }
    }
}

#[tokio::test]
async fn completed_streams_are_well_formed() {
    let scripts: [&[&str]; 5] = [
        &[],
        &["Hi"],
        &["Hi", " there"],
        &["안녕", "하세요", "!", " 😀"],
        &["a", "", "b", "", "", "c"],
    ];
    for script in scripts {
        let events =
            collect(PresetResponse::with_fragments(script.iter().copied()))
                .await;
        assert_well_formed(&events);
        assert_eq!(
            events.last(),
            Some(&StreamEvent::End {
                full_response: script.concat(),
            })
        );
    }
}

#[tokio::test]
async fn failed_streams_are_well_formed() {
    let failure = PresetEvent::Error(PresetError::new("boom"));
    let scripts = [
        vec![failure.clone()],
        vec![PresetEvent::MessageDelta("Hi".to_owned()), failure.clone()],
        vec![
            PresetEvent::MessageDelta("Hi".to_owned()),
            PresetEvent::MessageDelta(" there".to_owned()),
            failure,
        ],
    ];
    for script in scripts {
        let fragments = script.len() - 1;
        let events = collect(PresetResponse::with_events(script)).await;
        assert_well_formed(&events);
        assert_eq!(events.len(), fragments + 2);
        assert_eq!(
            events.last(),
            Some(&StreamEvent::Error {
                error: "boom".to_owned(),
            })
        );
    }
}
