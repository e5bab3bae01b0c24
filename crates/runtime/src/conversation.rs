//! The conversation loop.
//!
//! A [`Conversation`] alternates between asking the model for its next
//! action and executing the tool calls it requested, until a model
//! turn arrives with no tool calls. Transitions:
//!
//! - awaiting model → executing tools: the response contains tool
//!   calls; the assistant message is appended first.
//! - awaiting model → done: the response contains no tool calls.
//! - executing tools → awaiting model: every call in the last model
//!   turn has been answered, in request order.
//!
//! Tool failures of any kind (unknown tool, bad arguments, data-level
//! errors) are contained as failure results the model reads as data.
//! Only errors from the model call itself abort the invocation, and
//! the transcript built so far stays available for inspection.

use crate::model::{Backend, Message, ModelRequest, ToolResult};
use crate::tools::ToolHost;
use crate::{Error, Result};
use storage::{ConversationId, Event, EventKind, EventStore};

/// Default bound on tool rounds per user turn. When reached, one last
/// model call is made with the tool list withheld to force a text
/// answer, guaranteeing termination.
pub const DEFAULT_MAX_TOOL_ROUNDS: u32 = 16;

/// A tool-calling conversation.
///
/// Owns the transcript and call count exclusively for the duration of
/// each [`send`](Self::send); the caller reads both back afterwards
/// and decides about persistence and resumption.
pub struct Conversation<B, T> {
    pub id: ConversationId,
    store: EventStore,
    backend: B,
    tools: T,
    messages: Vec<Message>,
    system: Option<String>,
    call_count: u32,
    max_tool_rounds: u32,
}

impl<B: Backend, T: ToolHost> Conversation<B, T> {
    /// Start a new conversation with the given store, backend, and tools.
    pub fn new(store: EventStore, backend: B, tools: T) -> Result<Self> {
        let id = ConversationId::new();
        store.append(&Event::new(id, EventKind::ConversationStart))?;

        Ok(Self {
            id,
            store,
            backend,
            tools,
            messages: Vec::new(),
            system: None,
            call_count: 0,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
        })
    }

    /// Resume a persisted conversation, replaying its user and
    /// assistant message text into the live transcript. Tool exchanges
    /// stay in the event log but are not replayed.
    pub fn resume(store: EventStore, backend: B, tools: T, id: ConversationId) -> Result<Self> {
        let events = store.load_events(id, Some("message"))?;
        if events.is_empty() {
            return Err(Error::ConversationNotFound(id.to_string()));
        }

        let messages = events
            .into_iter()
            .filter_map(|event| match event.kind {
                EventKind::Message {
                    role: storage::Role::User,
                    content,
                } => Some(Message::user(content)),
                EventKind::Message {
                    role: storage::Role::Assistant,
                    content,
                } => Some(Message::assistant(content)),
                _ => None,
            })
            .collect();

        let call_count = u32::try_from(store.load_events(id, Some("model_call"))?.len())
            .unwrap_or(u32::MAX);

        Ok(Self {
            id,
            store,
            backend,
            tools,
            messages,
            system: None,
            call_count,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
        })
    }

    /// Set the fixed system instruction. It is prepended on every
    /// model call and never stored in the transcript.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Override the tool round bound.
    pub fn with_max_tool_rounds(mut self, max_tool_rounds: u32) -> Self {
        self.max_tool_rounds = max_tool_rounds;
        self
    }

    /// The transcript so far.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Total model invocations across the conversation.
    pub fn call_count(&self) -> u32 {
        self.call_count
    }

    /// Send a user message and run the loop to completion, returning
    /// the model's final text answer.
    pub async fn send(&mut self, user_input: &str) -> Result<String> {
        self.messages.push(Message::user(user_input));
        self.store
            .append(&Event::message(self.id, storage::Role::User, user_input))?;

        let mut rounds = 0;
        loop {
            let withhold_tools = rounds >= self.max_tool_rounds;
            let tools = if withhold_tools {
                &[]
            } else {
                self.tools.specs()
            };

            let response = self
                .backend
                .call(ModelRequest {
                    system: self.system.as_deref(),
                    messages: &self.messages,
                    tools,
                })
                .await?;
            self.call_count += 1;
            self.store.append(&Event::new(
                self.id,
                EventKind::ModelCall {
                    input_tokens: response.usage.input_tokens,
                    output_tokens: response.usage.output_tokens,
                },
            ))?;

            let text = response.message.text();
            let calls = response.message.tool_calls();
            self.store
                .append(&Event::message(self.id, storage::Role::Assistant, &text))?;

            if calls.is_empty() || withhold_tools {
                // With the tool list withheld the model cannot
                // legitimately request tools; stray calls are dropped
                // from the transcript so every stored call stays
                // paired with a result.
                if withhold_tools && !calls.is_empty() {
                    self.messages.push(Message::assistant(text.clone()));
                } else {
                    self.messages.push(response.message);
                }
                return Ok(text);
            }
            self.messages.push(response.message);
            rounds += 1;

            // One result per call, in request order.
            let mut results = Vec::with_capacity(calls.len());
            for call in calls {
                self.store.append(&Event::new(
                    self.id,
                    EventKind::ToolCall {
                        id: call.id.clone(),
                        name: call.name.clone(),
                        input: call.input.clone(),
                    },
                ))?;

                let result = match self.tools.execute(&call).await {
                    Ok(output) => ToolResult::Success {
                        tool_call_id: call.id.clone(),
                        output,
                    },
                    Err(error) => ToolResult::Failure {
                        tool_call_id: call.id.clone(),
                        error,
                    },
                };

                self.store.append(&Event::new(
                    self.id,
                    EventKind::ToolResult {
                        id: call.id,
                        name: call.name,
                        output: serde_json::to_value(&result).map_err(storage::Error::from)?,
                    },
                ))?;
                results.push(result);
            }
            self.messages.push(Message::tool_results(results));
        }
    }

    /// End the conversation.
    pub fn end(self) -> Result<()> {
        self.store
            .append(&Event::new(self.id, EventKind::ConversationEnd))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModelError, ModelResponse, Part, Role, ToolCall, ToolSpec, Usage};
    use crate::tools::{EmptyToolHost, ToolError};
    use serde_json::{Value, json};
    use std::collections::VecDeque;
    use std::result::Result;
    use std::sync::Mutex;

    /// Backend that replays a fixed script of assistant messages.
    struct ScriptedBackend {
        script: Mutex<VecDeque<Message>>,
    }

    impl ScriptedBackend {
        fn new(script: Vec<Message>) -> Self {
            Self {
                script: Mutex::new(script.into()),
            }
        }
    }

    impl Backend for ScriptedBackend {
        async fn call(&self, _request: ModelRequest<'_>) -> Result<ModelResponse, ModelError> {
            let message = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| ModelError::Api("script exhausted".into()))?;
            Ok(ModelResponse {
                message,
                usage: Usage::default(),
            })
        }
    }

    /// Backend that always requests a tool while tools are offered,
    /// and answers with text once they are withheld.
    struct GreedyBackend;

    impl Backend for GreedyBackend {
        async fn call(&self, request: ModelRequest<'_>) -> Result<ModelResponse, ModelError> {
            let message = if request.tools.is_empty() {
                Message::assistant("final answer")
            } else {
                Message {
                    role: Role::Assistant,
                    parts: vec![Part::ToolCall(ToolCall {
                        id: format!("call_{}", request.messages.len()),
                        name: "echo".into(),
                        input: json!({}),
                    })],
                }
            };
            Ok(ModelResponse {
                message,
                usage: Usage::default(),
            })
        }
    }

    /// Backend that requests a tool on every call, tools offered or not.
    struct StubbornBackend;

    impl Backend for StubbornBackend {
        async fn call(&self, request: ModelRequest<'_>) -> Result<ModelResponse, ModelError> {
            Ok(ModelResponse {
                message: Message {
                    role: Role::Assistant,
                    parts: vec![
                        Part::Text("still looking".into()),
                        Part::ToolCall(ToolCall {
                            id: format!("call_{}", request.messages.len()),
                            name: "echo".into(),
                            input: json!({}),
                        }),
                    ],
                },
                usage: Usage::default(),
            })
        }
    }

    /// Host with a single echo tool.
    struct EchoTools {
        specs: Vec<ToolSpec>,
    }

    impl EchoTools {
        fn new() -> Self {
            Self {
                specs: vec![ToolSpec {
                    name: "echo".into(),
                    description: "echo the input".into(),
                    schema: json!({"type": "object"}),
                }],
            }
        }
    }

    impl ToolHost for EchoTools {
        fn specs(&self) -> &[ToolSpec] {
            &self.specs
        }

        async fn execute(&self, call: &ToolCall) -> Result<Value, ToolError> {
            if call.name == "echo" {
                Ok(call.input.clone())
            } else {
                Err(ToolError::UnknownTool(call.name.clone()))
            }
        }
    }

    fn tool_call(id: &str, name: &str, input: Value) -> Message {
        Message {
            role: Role::Assistant,
            parts: vec![Part::ToolCall(ToolCall {
                id: id.into(),
                name: name.into(),
                input,
            })],
        }
    }

    fn conversation<B: Backend, T: ToolHost>(backend: B, tools: T) -> Conversation<B, T> {
        Conversation::new(EventStore::in_memory().unwrap(), backend, tools)
            .unwrap()
            .with_system("You are a helpful shopping assistant.")
    }

    #[tokio::test]
    async fn plain_answer_terminates_after_one_call() {
        let backend = ScriptedBackend::new(vec![Message::assistant("hello there")]);
        let mut conv = conversation(backend, EmptyToolHost);

        let answer = conv.send("hi").await.unwrap();
        assert_eq!(answer, "hello there");
        assert_eq!(conv.call_count(), 1);
        assert_eq!(conv.messages().len(), 2);
    }

    #[tokio::test]
    async fn every_tool_call_is_answered_before_the_next_model_turn() {
        let backend = ScriptedBackend::new(vec![
            Message {
                role: Role::Assistant,
                parts: vec![
                    Part::ToolCall(ToolCall {
                        id: "a".into(),
                        name: "echo".into(),
                        input: json!({"n": 1}),
                    }),
                    Part::ToolCall(ToolCall {
                        id: "b".into(),
                        name: "echo".into(),
                        input: json!({"n": 2}),
                    }),
                ],
            },
            Message::assistant("done"),
        ]);
        let mut conv = conversation(backend, EchoTools::new());

        let answer = conv.send("go").await.unwrap();
        assert_eq!(answer, "done");
        assert_eq!(conv.call_count(), 2);

        // user, assistant(2 calls), results, assistant
        let messages = conv.messages();
        assert_eq!(messages.len(), 4);
        let requested: Vec<_> = messages[1].tool_calls().iter().map(|c| c.id.clone()).collect();
        let answered: Vec<_> = messages[2]
            .tool_result_parts()
            .iter()
            .map(|r| r.tool_call_id().to_string())
            .collect();
        assert_eq!(requested, answered);
    }

    #[tokio::test]
    async fn unknown_tool_becomes_failure_result_and_loop_continues() {
        let backend = ScriptedBackend::new(vec![
            tool_call("a", "order_pizza", json!({})),
            Message::assistant("sorry, no pizza"),
        ]);
        let mut conv = conversation(backend, EchoTools::new());

        let answer = conv.send("pizza please").await.unwrap();
        assert_eq!(answer, "sorry, no pizza");

        let results = conv.messages()[2].tool_result_parts();
        assert_eq!(results.len(), 1);
        assert!(results[0].is_failure());
        assert!(results[0].content().contains("unknown tool"));
    }

    #[tokio::test]
    async fn round_cap_forces_final_text_answer() {
        let mut conv = conversation(GreedyBackend, EchoTools::new()).with_max_tool_rounds(2);

        let answer = conv.send("loop forever").await.unwrap();
        assert_eq!(answer, "final answer");
        // 2 tool rounds + 1 forced final call
        assert_eq!(conv.call_count(), 3);
    }

    #[tokio::test]
    async fn stray_calls_after_cap_are_dropped_from_the_transcript() {
        let mut conv = conversation(StubbornBackend, EchoTools::new()).with_max_tool_rounds(1);

        let answer = conv.send("go").await.unwrap();
        assert_eq!(answer, "still looking");

        // The forced-final assistant message keeps only its text, so a
        // later send never submits an unanswered tool call.
        let last = conv.messages().last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert!(last.tool_calls().is_empty());
        assert_eq!(last.text(), "still looking");

        // Every tool call that remains in the transcript has a result.
        let requested: Vec<_> = conv
            .messages()
            .iter()
            .flat_map(|m| m.tool_calls())
            .map(|c| c.id)
            .collect();
        let answered: Vec<_> = conv
            .messages()
            .iter()
            .flat_map(|m| m.tool_result_parts())
            .map(|r| r.tool_call_id().to_string())
            .collect();
        assert_eq!(requested, answered);
    }

    #[tokio::test]
    async fn model_failure_propagates_with_transcript_intact() {
        let backend = ScriptedBackend::new(vec![]);
        let mut conv = conversation(backend, EmptyToolHost);

        let err = conv.send("hi").await.unwrap_err();
        assert!(matches!(err, Error::Model(_)));
        // The user turn is still in the transcript for inspection.
        assert_eq!(conv.messages().len(), 1);
    }

    #[tokio::test]
    async fn deterministic_given_deterministic_backend_and_tools() {
        let script = || {
            ScriptedBackend::new(vec![
                tool_call("a", "echo", json!({"q": "red shoes"})),
                Message::assistant("here you go"),
            ])
        };
        let mut first = conversation(script(), EchoTools::new());
        let mut second = conversation(script(), EchoTools::new());

        first.send("find red shoes").await.unwrap();
        second.send("find red shoes").await.unwrap();

        let render = |c: &Conversation<ScriptedBackend, EchoTools>| {
            serde_json::to_string(c.messages()).unwrap()
        };
        assert_eq!(render(&first), render(&second));
        assert_eq!(first.call_count(), second.call_count());
    }

    #[tokio::test]
    async fn resume_rebuilds_text_transcript_and_call_count() {
        let store = EventStore::in_memory().unwrap();
        let backend = ScriptedBackend::new(vec![Message::assistant("first answer")]);
        let mut conv = Conversation::new(store, backend, EmptyToolHost).unwrap();
        let id = conv.id;
        conv.send("first question").await.unwrap();

        // Reopen against the same in-memory handle is not possible, so
        // pull the store back out by rebuilding from the same events.
        let Conversation { store, .. } = conv;
        let resumed = Conversation::resume(
            store,
            ScriptedBackend::new(vec![]),
            EmptyToolHost,
            id,
        )
        .unwrap();

        assert_eq!(resumed.messages().len(), 2);
        assert_eq!(resumed.messages()[0].text(), "first question");
        assert_eq!(resumed.call_count(), 1);
    }

    #[tokio::test]
    async fn unknown_conversation_cannot_be_resumed() {
        let store = EventStore::in_memory().unwrap();
        let result = Conversation::resume(
            store,
            ScriptedBackend::new(vec![]),
            EmptyToolHost,
            ConversationId::new(),
        );
        assert!(matches!(result, Err(Error::ConversationNotFound(_))));
    }
}
