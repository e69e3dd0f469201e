//! End-to-end turns with a scripted model and executor.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::time::Instant;
use ward_agent::intent::READ_ONLY_CLARIFICATION;
use ward_agent::summarizer::{LOOKUP_FAILED_MESSAGE, NOT_FOUND_MESSAGE};
use ward_agent::testing::ScriptedModel;
use ward_agent::{AgentError, MessageRole};
use ward_core::RetryPolicy;
use ward_orchestrator::{Orchestrator, SessionId, GENERIC_FAILURE_MESSAGE};
use ward_query::testing::ScriptedExecutor;
use ward_query::{QueryFault, Row};

const VENTILATOR_SQL: &str = "SELECT l.building, l.floor, l.room_number FROM equipment e JOIN locations l ON e.location_id = l.location_id WHERE e.name ILIKE '%ventilator%'";
const LAST_USER_SQL: &str = "SELECT emp.name FROM usage_logs ul JOIN employees emp ON ul.employee_id = emp.employee_id JOIN equipment e ON ul.equipment_id = e.equipment_id WHERE e.name ILIKE '%ventilator%' ORDER BY ul.used_at DESC LIMIT 1";

fn row(value: Value) -> Row {
    value.as_object().cloned().unwrap()
}

fn data_query(question: &str, sql: &str) -> Value {
    json!({"question": question, "intent": "data_query", "sql": sql})
}

fn items(items: Vec<Value>) -> String {
    json!({ "items": items }).to_string()
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(2, Duration::from_millis(1))
}

fn build(model: &Arc<ScriptedModel>, executor: &Arc<ScriptedExecutor>, retry: RetryPolicy) -> Orchestrator {
    Orchestrator::new(model.clone(), executor.clone(), retry)
}

fn summarizer_prompt(model: &ScriptedModel, call: usize) -> String {
    let requests = model.requests();
    requests[call]
        .messages
        .last()
        .map(|m| m.content.clone())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_ventilator_location() {
    let model = Arc::new(ScriptedModel::replying([
        items(vec![data_query("Where is the ventilator?", VENTILATOR_SQL)]),
        "The ventilator is currently located in the ICU, Floor 2, Room 5.".to_string(),
    ]));
    let executor = Arc::new(ScriptedExecutor::new().rows(
        "from equipment e join locations",
        vec![row(json!({"building": "ICU", "floor": 2, "room_number": "5"}))],
    ));
    let orchestrator = build(&model, &executor, fast_retry());
    let session = orchestrator.create_session().await;

    let answer = orchestrator
        .handle_turn(&session, "Where is the ventilator?")
        .await
        .unwrap();

    assert!(!answer.failed);
    assert_eq!(answer.text, "The ventilator is currently located in the ICU, Floor 2, Room 5.");
    assert_eq!(executor.executed(), vec![VENTILATOR_SQL.to_string()]);
    assert!(summarizer_prompt(&model, 1).contains(r#""building":"ICU""#));

    let history = orchestrator.history(&session).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, MessageRole::User);
    assert_eq!(history[0].content, "Where is the ventilator?");
    assert_eq!(history[1].role, MessageRole::Assistant);
    assert_eq!(history[1].content, answer.text);
}

#[tokio::test]
async fn test_ventilator_location_and_last_user() {
    let model = Arc::new(ScriptedModel::replying([
        items(vec![
            data_query("Where is the ventilator?", VENTILATOR_SQL),
            data_query("Who used it last?", LAST_USER_SQL),
        ]),
        "The ventilator is in the ICU, Floor 2, Room 5. Dr. Patel used it last.".to_string(),
    ]));
    let executor = Arc::new(
        ScriptedExecutor::new()
            .rows(
                "join locations",
                vec![row(json!({"building": "ICU", "floor": 2, "room_number": "5"}))],
            )
            .rows("from usage_logs", vec![row(json!({"name": "Dr. Patel"}))]),
    );
    let orchestrator = build(&model, &executor, fast_retry());
    let session = SessionId::from("icu-desk");

    let answer = orchestrator
        .handle_turn(&session, "Where is the ventilator and who used it last?")
        .await
        .unwrap();

    assert_eq!(answer.text, "The ventilator is in the ICU, Floor 2, Room 5. Dr. Patel used it last.");
    assert_eq!(executor.executed().len(), 2);
    assert_eq!(model.calls(), 2);

    let prompt = summarizer_prompt(&model, 1);
    let first = prompt.find("Question 1: Where is the ventilator?").unwrap();
    let second = prompt.find("Question 2: Who used it last?").unwrap();
    assert!(first < second);
    assert!(prompt.contains("Dr. Patel"));
}

#[tokio::test]
async fn test_defibrillator_explanation() {
    let explanation = "A defibrillator delivers an electric shock to restore a normal heart rhythm.";
    let model = Arc::new(ScriptedModel::replying([
        items(vec![json!({
            "question": "What is a defibrillator?",
            "intent": "explanation",
            "explanation": explanation
        })]),
        explanation.to_string(),
    ]));
    let executor = Arc::new(ScriptedExecutor::new());
    let orchestrator = build(&model, &executor, fast_retry());

    let answer = orchestrator
        .handle_turn(&SessionId::new(), "What is a defibrillator?")
        .await
        .unwrap();

    assert_eq!(answer.text, explanation);
    assert!(executor.executed().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_mixed_and_lookup_keep_asked_order_when_finishing_out_of_order() {
    let explanation = "A ventilator moves air in and out of the lungs.";
    let model = Arc::new(ScriptedModel::replying([items(vec![
        json!({
            "question": "What is a ventilator and where is it?",
            "intent": "mixed",
            "sql": VENTILATOR_SQL,
            "explanation": explanation
        }),
        data_query("Who used it last?", LAST_USER_SQL),
    ])]));
    // The first sub-question finishes last.
    let executor = Arc::new(
        ScriptedExecutor::new()
            .rows("join locations", vec![row(json!({"building": "ICU"}))])
            .rows("from usage_logs", vec![row(json!({"name": "Dr. Patel"}))])
            .delay_on("join locations", Duration::from_secs(3))
            .delay_on("from usage_logs", Duration::from_secs(1)),
    );
    let orchestrator = build(&model, &executor, fast_retry());

    let start = Instant::now();
    let answer = orchestrator
        .handle_turn(&SessionId::new(), "What is a ventilator, where is it, and who used it last?")
        .await
        .unwrap();
    assert!(start.elapsed() < Duration::from_secs(4), "queries ran one after another");

    let prompt = summarizer_prompt(&model, 1);
    let positions: Vec<usize> = [
        "Question 1: What is a ventilator and where is it?",
        explanation,
        r#""building":"ICU""#,
        "Question 2: Who used it last?",
        "Dr. Patel",
    ]
    .iter()
    .map(|needle| prompt.find(needle).unwrap())
    .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{}", prompt);

    // The summarizer model is out of script, so the answer is narrated.
    assert!(!answer.failed);
    assert_eq!(
        answer.text,
        format!(
            "{} Here's what I found for \"What is a ventilator and where is it?\": ICU.\n\n\
             Here's what I found for \"Who used it last?\": Dr. Patel.",
            explanation
        )
    );
}

#[tokio::test]
async fn test_empty_result_answer_has_no_sql() {
    let model = Arc::new(ScriptedModel::replying([
        items(vec![data_query(
            "Where is the MRI scanner?",
            "SELECT l.building FROM equipment e JOIN locations l ON e.location_id = l.location_id WHERE e.name ILIKE '%mri%'",
        )]),
        "I ran SELECT name FROM equipment but found no rows.".to_string(),
    ]));
    let executor = Arc::new(ScriptedExecutor::new());
    let orchestrator = build(&model, &executor, fast_retry());

    let answer = orchestrator
        .handle_turn(&SessionId::new(), "Where is the MRI scanner?")
        .await
        .unwrap();

    assert_eq!(answer.text, NOT_FOUND_MESSAGE);
    assert!(summarizer_prompt(&model, 1).contains("Nothing was found."));
    assert!(!answer.text.to_lowercase().contains("select"));
}

#[tokio::test]
async fn test_fault_message_never_reaches_answer() {
    let fault = "permission denied for relation usage_logs";
    let model = Arc::new(ScriptedModel::new(vec![Ok(items(vec![data_query(
        "Who used the ventilator last?",
        LAST_USER_SQL,
    )]))]));
    let executor = Arc::new(
        ScriptedExecutor::new().on("from usage_logs", vec![Err(QueryFault::remote(fault))]),
    );
    let orchestrator = build(&model, &executor, fast_retry());

    let answer = orchestrator
        .handle_turn(&SessionId::new(), "Who used the ventilator last?")
        .await
        .unwrap();

    // One attempt plus two retries.
    assert_eq!(executor.calls_matching("from usage_logs"), 3);
    // Summarizer model ran out of script, so the answer was narrated locally.
    assert_eq!(answer.text, LOOKUP_FAILED_MESSAGE);
    assert!(!answer.failed);
    assert!(!summarizer_prompt(&model, 1).contains(fault));
    assert_eq!(orchestrator.sessions().len().await, 1);
}

#[tokio::test]
async fn test_rejected_statement_is_not_retried() {
    let model = Arc::new(ScriptedModel::new(vec![Ok(items(vec![data_query(
        "Where is the ventilator?",
        VENTILATOR_SQL,
    )]))]));
    let executor = Arc::new(ScriptedExecutor::new().on(
        "join locations",
        vec![Err(QueryFault::rejected("column l.room does not exist"))],
    ));
    let orchestrator = build(&model, &executor, fast_retry());

    let answer = orchestrator
        .handle_turn(&SessionId::new(), "Where is the ventilator?")
        .await
        .unwrap();

    assert_eq!(executor.executed().len(), 1);
    assert_eq!(answer.text, LOOKUP_FAILED_MESSAGE);
}

#[tokio::test(start_paused = true)]
async fn test_query_recovers_after_two_delayed_retries() {
    let model = Arc::new(ScriptedModel::replying([
        items(vec![data_query("Where is the ventilator?", VENTILATOR_SQL)]),
        "The ventilator is currently located in the ICU, Floor 2, Room 5.".to_string(),
    ]));
    let executor = Arc::new(ScriptedExecutor::new().on(
        "join locations",
        vec![
            Err(QueryFault::transport("connection reset")),
            Err(QueryFault::timeout("timed out")),
            Ok(vec![row(json!({"building": "ICU", "floor": 2, "room_number": "5"}))]),
        ],
    ));
    let orchestrator = build(&model, &executor, RetryPolicy::default());

    let start = Instant::now();
    let answer = orchestrator
        .handle_turn(&SessionId::new(), "Where is the ventilator?")
        .await
        .unwrap();
    let elapsed = start.elapsed();

    assert_eq!(executor.executed().len(), 3);
    assert!(elapsed >= Duration::from_secs(4), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(5), "elapsed {:?}", elapsed);
    assert_eq!(answer.text, "The ventilator is currently located in the ICU, Floor 2, Room 5.");
}

#[tokio::test]
async fn test_interpreter_down_still_appends() {
    let model = Arc::new(ScriptedModel::failing(|| AgentError::Timeout("60s".into())));
    let executor = Arc::new(ScriptedExecutor::new());
    let orchestrator = build(&model, &executor, fast_retry());
    let session = SessionId::new();

    let answer = orchestrator
        .handle_turn(&session, "Where is the ventilator?")
        .await
        .unwrap();

    assert!(answer.failed);
    assert_eq!(answer.text, GENERIC_FAILURE_MESSAGE);
    assert_eq!(model.calls(), 3);
    assert!(executor.executed().is_empty());

    let history = orchestrator.history(&session).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].content, GENERIC_FAILURE_MESSAGE);
}

#[tokio::test]
async fn test_destructive_statement_becomes_clarification() {
    let model = Arc::new(ScriptedModel::replying([items(vec![data_query(
        "Delete the ventilator",
        "DELETE FROM equipment WHERE name ILIKE '%ventilator%'",
    )])]));
    let executor = Arc::new(ScriptedExecutor::new());
    let orchestrator = build(&model, &executor, fast_retry());

    let answer = orchestrator
        .handle_turn(&SessionId::new(), "Delete the ventilator")
        .await
        .unwrap();

    assert_eq!(answer.text, READ_ONLY_CLARIFICATION);
    assert!(executor.executed().is_empty());
    // Clarification-only turns skip the summarizer.
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn test_history_window_limits_context() {
    let reply = || items(vec![json!({"intent": "clarify", "clarification": "Which equipment do you mean?"})]);
    let model = Arc::new(ScriptedModel::replying([reply(), reply(), reply()]));
    let executor = Arc::new(ScriptedExecutor::new());
    let orchestrator = build(&model, &executor, fast_retry()).with_history_window(2);
    let session = SessionId::new();

    for message in ["hello", "the pump", "the infusion pump"] {
        orchestrator.handle_turn(&session, message).await.unwrap();
    }

    let requests = model.requests();
    assert_eq!(requests[0].messages.len(), 1);
    assert_eq!(requests[1].messages.len(), 3);
    // Two earlier messages plus the new one.
    assert_eq!(requests[2].messages.len(), 3);
    assert_eq!(requests[2].messages[0].content, "the pump");
    assert_eq!(orchestrator.history(&session).await.unwrap().len(), 6);
}

#[tokio::test(start_paused = true)]
async fn test_turns_on_one_session_are_serialized() {
    let interpret = items(vec![data_query("Where is the ventilator?", VENTILATOR_SQL)]);
    let model = Arc::new(ScriptedModel::replying([
        interpret.clone(),
        "Answer one.".to_string(),
        interpret,
        "Answer two.".to_string(),
    ]));
    let executor = Arc::new(
        ScriptedExecutor::new()
            .rows("join locations", vec![row(json!({"building": "ICU"}))])
            .with_delay(Duration::from_secs(1)),
    );
    let orchestrator = build(&model, &executor, fast_retry());
    let session = SessionId::from("shared");

    let (a, b) = tokio::join!(
        orchestrator.handle_turn(&session, "Where is the ventilator?"),
        orchestrator.handle_turn(&session, "Where is the ventilator now?"),
    );
    a.unwrap();
    b.unwrap();

    let history = orchestrator.history(&session).await.unwrap();
    let roles: Vec<_> = history.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![MessageRole::User, MessageRole::Assistant, MessageRole::User, MessageRole::Assistant]
    );
    assert_eq!(history[1].content, "Answer one.");
    assert_eq!(history[3].content, "Answer two.");
}

#[tokio::test(start_paused = true)]
async fn test_distinct_sessions_run_concurrently() {
    let interpret = items(vec![data_query("Where is the ventilator?", VENTILATOR_SQL)]);
    let model = Arc::new(ScriptedModel::replying([
        interpret.clone(),
        interpret,
        "The ventilator is in the ICU.".to_string(),
        "The ventilator is in the ICU.".to_string(),
    ]));
    let executor = Arc::new(
        ScriptedExecutor::new()
            .rows("join locations", vec![row(json!({"building": "ICU"}))])
            .with_delay(Duration::from_secs(1)),
    );
    let orchestrator = build(&model, &executor, fast_retry());

    let start = Instant::now();
    let ward_a = SessionId::from("ward-a");
    let ward_b = SessionId::from("ward-b");
    let (a, b) = tokio::join!(
        orchestrator.handle_turn(&ward_a, "Where is the ventilator?"),
        orchestrator.handle_turn(&ward_b, "Where is the ventilator?"),
    );

    assert_eq!(a.unwrap().text, "The ventilator is in the ICU.");
    assert_eq!(b.unwrap().text, "The ventilator is in the ICU.");
    assert!(start.elapsed() < Duration::from_secs(2));
    assert_eq!(orchestrator.sessions().len().await, 2);
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_turn_leaves_history_untouched() {
    let interpret = items(vec![data_query("Where is the ventilator?", VENTILATOR_SQL)]);
    let model = Arc::new(ScriptedModel::replying([
        interpret.clone(),
        interpret,
        "The ventilator is in the ICU.".to_string(),
    ]));
    let executor = Arc::new(
        ScriptedExecutor::new()
            .rows("join locations", vec![row(json!({"building": "ICU"}))])
            .with_delay(Duration::from_secs(10)),
    );
    let orchestrator = build(&model, &executor, fast_retry());
    let session = SessionId::from("kiosk");

    let abandoned = tokio::time::timeout(
        Duration::from_secs(1),
        orchestrator.handle_turn(&session, "Where is the ventilator?"),
    )
    .await;
    assert!(abandoned.is_err());
    assert!(orchestrator.history(&session).await.unwrap().is_empty());

    let answer = orchestrator
        .handle_turn(&session, "Where is the ventilator?")
        .await
        .unwrap();
    assert_eq!(answer.text, "The ventilator is in the ICU.");

    let history = orchestrator.history(&session).await.unwrap();
    let roles: Vec<_> = history.iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![MessageRole::User, MessageRole::Assistant]);
    // The abandoned turn left nothing behind for the next turn's context.
    assert_eq!(model.requests()[1].messages.len(), 1);
}
