//! Agent loop behaviour with scripted model providers.

use async_trait::async_trait;
use dbchat::agent::{Agent, AgentSettings, History, Session};
use dbchat::error::{AgentError, ProviderError, RetrievalError};
use dbchat::inference::ModelProvider;
use dbchat::retrieval::{ContextRetriever, NoContext, PassageStore};
use dbchat::state::AccessGate;
use dbchat::tools::{ToolDefinition, ToolRegistry, ToolSettings};
use dbchat::types::{Message, ModelReply, TokenUsage, ToolCall};
use rusqlite::Connection;
use serde_json::json;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Replays a fixed list of replies and records what it was sent.
#[derive(Default)]
struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<ModelReply, ProviderError>>>,
    seen: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedProvider {
    fn new(replies: Vec<Result<ModelReply, ProviderError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    fn request(&self, n: usize) -> Vec<Message> {
        self.seen.lock().unwrap()[n].clone()
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn chat(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<ModelReply, ProviderError> {
        assert_eq!(tools.len(), 8);
        self.seen.lock().unwrap().push(messages.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::Remote("script exhausted".into())))
    }
}

/// Asks for `list_tables` forever.
#[derive(Default)]
struct ToolHungryProvider {
    calls: AtomicUsize,
}

#[async_trait]
impl ModelProvider for ToolHungryProvider {
    fn name(&self) -> &str {
        "tool-hungry"
    }

    async fn chat(&self, _: &[Message], _: &[ToolDefinition]) -> Result<ModelReply, ProviderError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ModelReply::with_tool_calls(vec![ToolCall::new(
            format!("call-{}", n),
            "list_tables",
            json!({ "reasoning": "again" }),
        )]))
    }
}

struct FailingRetriever;

#[async_trait]
impl ContextRetriever for FailingRetriever {
    async fn retrieve(&self, _: &str, _: usize) -> Result<Vec<String>, RetrievalError> {
        Err(RetrievalError::Poisoned)
    }
}

fn northwind(dir: &Path) -> AccessGate {
    let path = dir.join("northwind.db");
    Connection::open(&path)
        .unwrap()
        .execute_batch(
            "CREATE TABLE Customers (CustomerID TEXT PRIMARY KEY, CompanyName TEXT);
             INSERT INTO Customers VALUES ('ALFKI', 'Alfreds Futterkiste');
             INSERT INTO Customers VALUES ('ANATR', 'Ana Trujillo');
             INSERT INTO Customers VALUES ('ANTON', 'Antonio Moreno');",
        )
        .unwrap();
    AccessGate::new(path)
}

fn agent(
    gate: AccessGate,
    provider: Arc<dyn ModelProvider>,
    retriever: Arc<dyn ContextRetriever>,
    max_iterations: usize,
) -> Agent {
    Agent::new(
        provider,
        retriever,
        ToolRegistry::new(gate, ToolSettings::default()),
        AgentSettings {
            max_iterations,
            ..AgentSettings::default()
        },
    )
}

fn usage(total: u32) -> TokenUsage {
    TokenUsage {
        prompt_tokens: total - 1,
        completion_tokens: 1,
        total_tokens: total,
    }
}

#[tokio::test]
async fn customer_count_question_appends_one_exchange() {
    let dir = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::new(vec![
        Ok(ModelReply {
            tool_calls: vec![ToolCall::new("c1", "list_tables", json!({ "reasoning": "look" }))],
            usage: usage(10),
            ..ModelReply::default()
        }),
        Ok(ModelReply {
            tool_calls: vec![ToolCall::new(
                "c2",
                "count_rows",
                json!({ "table_name": "Customers", "reasoning": "count" }),
            )],
            usage: usage(20),
            ..ModelReply::default()
        }),
        Ok(ModelReply {
            content: "There are **3** customers.".into(),
            usage: usage(30),
            ..ModelReply::default()
        }),
    ]);
    let mut session = Session::new(
        agent(northwind(dir.path()), provider.clone(), Arc::new(NoContext), 20),
        "system prompt",
    );

    let reply = session.ask("How many customers are there?").await.unwrap();
    assert_eq!(reply.answer, "There are **3** customers.");
    assert_eq!(reply.iterations, 3);
    assert_eq!(reply.usage.total_tokens, 60);
    assert_eq!(provider.calls(), 3);

    let history = session.history().messages();
    assert_eq!(history.len(), 3);
    assert_eq!(history[1], Message::human("How many customers are there?"));
    assert_eq!(history[2], Message::ai("There are **3** customers.", Vec::new()));

    // The third request saw both tool results, each tied to its call.
    let last = provider.request(2);
    let results: Vec<_> = last
        .iter()
        .filter_map(|m| match m {
            Message::Tool(r) => Some(r.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].call_id, "c1");
    assert!(results[0].content.contains("- Customers"));
    assert_eq!(results[1].call_id, "c2");
    assert_eq!(results[1].content, "3");
}

#[tokio::test]
async fn every_call_in_a_turn_is_answered_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::new(vec![
        Ok(ModelReply::with_tool_calls(vec![
            ToolCall::new("a", "get_columns", json!({ "table_name": "Customers" })),
            ToolCall::new("b", "count_rows", json!({ "table_name": "Missing" })),
            ToolCall::new("c", "count_rows", json!({ "table_name": "Customers" })),
        ])),
        Ok(ModelReply::text("done")),
    ]);
    let agent = agent(northwind(dir.path()), provider.clone(), Arc::new(NoContext), 5);

    let reply = agent.run("columns?", &History::new("sys")).await.unwrap();
    let tool_ids: Vec<&str> = reply
        .transcript
        .iter()
        .filter_map(|m| match m {
            Message::Tool(r) => Some(r.call_id.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(tool_ids, vec!["a", "b", "c"]);
    assert_eq!(reply.transcript.last().unwrap().content(), "done");
}

#[tokio::test]
async fn budget_is_exhausted_after_exactly_max_iterations() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(ToolHungryProvider::default());
    let mut session = Session::new(
        agent(northwind(dir.path()), provider.clone(), Arc::new(NoContext), 3),
        "sys",
    );

    let err = session.ask("loop forever").await.unwrap_err();
    assert!(matches!(err, AgentError::IterationBudgetExceeded { max_iterations: 3 }));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    assert_eq!(session.history().len(), 1);
    assert_eq!(
        err.user_message(),
        "Maximum number of iterations reached. Please try again with a different query."
    );
}

#[tokio::test]
async fn unknown_tool_ends_the_query() {
    let dir = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::new(vec![Ok(ModelReply::with_tool_calls(vec![
        ToolCall::new("c1", "drop_database", json!({})),
    ]))]);
    let mut session = Session::new(
        agent(northwind(dir.path()), provider, Arc::new(NoContext), 5),
        "sys",
    );

    let err = session.ask("do something bad").await.unwrap_err();
    assert!(matches!(err, AgentError::UnknownTool(ref n) if n == "drop_database"));
    assert_eq!(session.history().len(), 1);
}

#[tokio::test]
async fn provider_failure_leaves_history_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::new(vec![
        Ok(ModelReply::text("first answer")),
        Err(ProviderError::Status {
            status: 500,
            body: "boom".into(),
        }),
    ]);
    let mut session = Session::new(
        agent(northwind(dir.path()), provider, Arc::new(NoContext), 5),
        "sys",
    );

    session.ask("first").await.unwrap();
    let before = session.history().clone();

    let err = session.ask("second").await.unwrap_err();
    assert!(matches!(err, AgentError::Provider(_)));
    assert_eq!(session.history(), &before);
    assert!(!err.user_message().contains("boom"));
}

#[tokio::test]
async fn retrieval_failure_is_terminal() {
    let dir = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::new(vec![Ok(ModelReply::text("unused"))]);
    let agent = agent(
        northwind(dir.path()),
        provider.clone(),
        Arc::new(FailingRetriever),
        5,
    );

    let err = agent.run("anything", &History::new("sys")).await.unwrap_err();
    assert!(matches!(err, AgentError::Retrieval(_)));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn question_is_sent_with_retrieved_context() {
    let dir = tempfile::tempdir().unwrap();
    let store = PassageStore::open_memory().unwrap();
    store
        .add("glossary", "A customer is any company that placed an order.")
        .unwrap();
    let provider = ScriptedProvider::new(vec![Ok(ModelReply::text("ok"))]);
    let mut session = Session::new(
        agent(northwind(dir.path()), provider.clone(), Arc::new(store), 5),
        "sys",
    );

    session.ask("What is a customer?").await.unwrap();

    let sent = provider.request(0);
    assert_eq!(sent.len(), 2);
    assert!(sent[0].is_system());
    let question = sent[1].content();
    assert!(question.starts_with("Document context:\n"));
    assert!(question.contains("A customer is any company that placed an order."));
    assert!(question.ends_with("User question: What is a customer?"));

    // Stored history keeps the raw question, not the contextualized one.
    assert_eq!(session.history().messages()[1].content(), "What is a customer?");
}

#[tokio::test]
async fn follow_up_questions_see_earlier_exchanges() {
    let dir = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::new(vec![
        Ok(ModelReply::text("There are 3 customers.")),
        Ok(ModelReply::text("Alfreds, Ana and Antonio.")),
    ]);
    let mut session = Session::new(
        agent(northwind(dir.path()), provider.clone(), Arc::new(NoContext), 5),
        "sys",
    );

    session.ask("How many customers?").await.unwrap();
    session.ask("Name them.").await.unwrap();

    let second = provider.request(1);
    assert_eq!(second.len(), 4);
    assert_eq!(second[1].content(), "How many customers?");
    assert_eq!(second[2].content(), "There are 3 customers.");
    assert_eq!(session.history().len(), 5);

    session.reset();
    assert_eq!(session.history().len(), 1);
}
