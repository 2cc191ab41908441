use anyhow::Result;
use domain::{
    AlternativeRequest, Attendee, AttendeeAvailability, BusyInterval, InterpretRequest,
    OracleError, Proposal, ReasoningOracle,
};
use llm::{AnthropicProvider, LlmReasoningOracle};
use mockito::Server;
use std::sync::Arc;

fn attendees() -> Vec<AttendeeAvailability> {
    vec![
        AttendeeAvailability {
            attendee: Attendee::new("Gayatri Sriram", "gayatri1@wharton.upenn.edu"),
            busy: vec![BusyInterval::new("Monday", "9:00 AM", "10:30 AM")],
        },
        AttendeeAvailability {
            attendee: Attendee::new("Ash Rk", "ashrk@wharton.upenn.edu").critical(),
            busy: vec![BusyInterval::new("Monday", "1:00 PM", "2:30 PM")],
        },
    ]
}

fn anthropic_body(text: &str) -> String {
    serde_json::json!({
        "content": [{"type": "text", "text": text}],
        "usage": {"input_tokens": 100, "output_tokens": 40},
        "stop_reason": "end_turn"
    })
    .to_string()
}

fn oracle_for(server: &Server) -> Result<LlmReasoningOracle> {
    let provider = AnthropicProvider::new("test-key".to_string(), "claude-test".to_string())?
        .with_endpoint(server.url());
    Ok(LlmReasoningOracle::new(Arc::new(provider)))
}

fn interpret_request() -> InterpretRequest {
    InterpretRequest {
        title: "Team Sync".into(),
        attendees: attendees(),
        transcript: vec![],
        user_turn: "Monday afternoon, one hour, in person".into(),
    }
}

#[tokio::test]
async fn interpret_decodes_fenced_proposal() -> Result<()> {
    let mut server = Server::new_async().await;
    let reply = r#"```json
{"needsMoreInfo": false, "response": "How about Monday at 3:00 PM?",
 "proposedMeeting": {"day": "Monday", "time": "3:00 PM", "duration": "1 hour",
   "location": "Huntsman Hall", "includesZoom": false,
   "criticalCount": 1, "totalCritical": 1, "nonCriticalCount": 1, "totalNonCritical": 1,
   "reasoning": "Everyone is free"}}
```"#;
    let mock = server
        .mock("POST", "/messages")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(anthropic_body(reply))
        .create_async()
        .await;

    let oracle = oracle_for(&server)?;
    let answer = oracle.interpret(&interpret_request()).await?;

    let proposal = answer.proposal.expect("proposal present");
    assert_eq!(proposal.slot_label(), "Monday at 3:00 PM");
    assert!(proposal.is_invitable());
    assert_eq!(answer.response_text, "How about Monday at 3:00 PM?");
    mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn interpret_reports_malformed_output() -> Result<()> {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/messages")
        .with_status(200)
        .with_body(anthropic_body("Monday at 3 works great!"))
        .create_async()
        .await;

    let err = oracle_for(&server)?
        .interpret(&interpret_request())
        .await
        .unwrap_err();
    assert!(matches!(err, OracleError::Malformed(_)));
    Ok(())
}

#[tokio::test]
async fn interpret_reports_transport_failure() -> Result<()> {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/messages")
        .with_status(500)
        .with_body("upstream unavailable")
        .create_async()
        .await;

    let err = oracle_for(&server)?
        .interpret(&interpret_request())
        .await
        .unwrap_err();
    assert!(matches!(err, OracleError::Transport(ref msg) if msg.contains("upstream unavailable")));
    Ok(())
}

#[tokio::test]
async fn find_alternative_rejects_repeated_slot() -> Result<()> {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/messages")
        .with_status(200)
        .with_body(anthropic_body(
            r#"{"alternativeTime": {"day": "Monday", "time": "3:00 PM"}, "reasoning": "same"}"#,
        ))
        .create_async()
        .await;

    let current = Proposal {
        day: "Monday".into(),
        time: "3:00 PM".into(),
        duration: "1 hour".into(),
        location: "Huntsman Hall".into(),
        includes_zoom: false,
        reasoning: String::new(),
        critical_count: 1,
        total_critical: 1,
        non_critical_count: 1,
        total_non_critical: 1,
        is_lunch_meeting: false,
        unavailable: vec![],
    };
    let request = AlternativeRequest {
        title: "Team Sync".into(),
        declined: attendees()[1].attendee.clone(),
        attendees: attendees(),
        current,
    };

    let err = oracle_for(&server)?
        .find_alternative(&request)
        .await
        .unwrap_err();
    assert!(matches!(err, OracleError::Malformed(_)));
    Ok(())
}
