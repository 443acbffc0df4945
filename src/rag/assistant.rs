// src/rag/assistant.rs — Question answering over an indexed collection

use std::sync::Arc;

use super::tools::{dispatch_tool_call, search_tool_def};
use super::{format_hits, hit_pages, DocumentIndex};
use crate::core::template::Template;
use crate::infra::errors::NotebookError;
use crate::provider::{ChatRequest, Message, ModelProvider};

/// Maximum number of tool-call round-trips per question.
const MAX_TOOL_ROUNDS: usize = 5;

const SYSTEM_PROMPT: &str = "\
You are a documentation assistant for the '{COLLECTION}' collection. \
Answer questions using only the retrieved documentation pages. \
Cite page numbers in the form (page N) for every claim you take from them. \
If the pages do not contain the answer, say so instead of guessing.";

const TOOLS_HINT: &str = "\
Call the search_documentation tool to retrieve pages before answering. \
You may search more than once with different queries.";

const QUESTION_PROMPT: &str = "\
Retrieved documentation:

{PAGES}

Question: {QUESTION}";

#[derive(Debug, Clone)]
pub struct AssistantConfig {
    pub model: String,
    pub collection: String,
    pub n_results: usize,
    pub use_tools: bool,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// An answer plus the pages it was grounded on.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    pub pages: Vec<u32>,
}

pub fn system_template(collection: &str, use_tools: bool) -> Template {
    let base = Template::new(SYSTEM_PROMPT).bind("COLLECTION", collection);
    if use_tools {
        base.merge(&Template::new(TOOLS_HINT))
    } else {
        base
    }
}

pub fn question_template(pages: &str, question: &str) -> Template {
    Template::new(QUESTION_PROMPT)
        .bind("PAGES", pages)
        .bind("QUESTION", question)
}

/// Conversational assistant. History persists across `ask` calls.
pub struct Assistant {
    provider: Arc<dyn ModelProvider>,
    index: Arc<DocumentIndex>,
    config: AssistantConfig,
    history: Vec<Message>,
}

impl Assistant {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        index: Arc<DocumentIndex>,
        config: AssistantConfig,
    ) -> Result<Self, NotebookError> {
        let system = system_template(&config.collection, config.use_tools).render()?;
        Ok(Self {
            provider,
            index,
            config,
            history: vec![Message::system(system)],
        })
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    fn request(&self, messages: Vec<Message>, with_tools: bool) -> ChatRequest {
        ChatRequest {
            model: self.config.model.clone(),
            messages,
            tools: if with_tools {
                vec![search_tool_def()]
            } else {
                Vec::new()
            },
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        }
    }

    /// Answer one question. On error the history is left as it was.
    pub async fn ask(&mut self, question: &str) -> Result<Answer, NotebookError> {
        let mut messages = self.history.clone();
        let answer = if self.config.use_tools {
            self.ask_with_tools(&mut messages, question).await?
        } else {
            self.ask_direct(&mut messages, question).await?
        };

        messages.push(Message::assistant(answer.text.clone()));
        self.history = messages;
        Ok(answer)
    }

    async fn ask_direct(
        &self,
        messages: &mut Vec<Message>,
        question: &str,
    ) -> Result<Answer, NotebookError> {
        let hits = self
            .index
            .search(&self.config.collection, question, self.config.n_results)
            .await?;
        let prompt = question_template(&format_hits(&hits), question).render()?;
        messages.push(Message::user(prompt));

        let response = self
            .provider
            .chat(self.request(messages.clone(), false))
            .await?;

        Ok(Answer {
            text: response.content,
            pages: hit_pages(&hits),
        })
    }

    async fn ask_with_tools(
        &self,
        messages: &mut Vec<Message>,
        question: &str,
    ) -> Result<Answer, NotebookError> {
        messages.push(Message::user(question));
        let mut pages: Vec<u32> = Vec::new();

        for round in 0..MAX_TOOL_ROUNDS {
            let response = self
                .provider
                .chat(self.request(messages.clone(), true))
                .await?;

            if response.tool_calls.is_empty() {
                return Ok(Answer {
                    text: response.content,
                    pages,
                });
            }

            tracing::debug!(round, calls = response.tool_calls.len(), "Tool round");
            messages.push(Message::assistant_with_tool_calls(
                response.content.clone(),
                response.tool_calls.clone(),
            ));
            for call in &response.tool_calls {
                let output = dispatch_tool_call(
                    &self.index,
                    &self.config.collection,
                    call,
                    self.config.n_results,
                )
                .await;
                for p in output.pages {
                    if !pages.contains(&p) {
                        pages.push(p);
                    }
                }
                messages.push(Message::tool_result(&call.id, output.content));
            }
        }

        tracing::warn!(
            max_rounds = MAX_TOOL_ROUNDS,
            "Tool round limit reached, requesting final answer"
        );
        let response = self
            .provider
            .chat(self.request(messages.clone(), false))
            .await?;
        Ok(Answer {
            text: response.content,
            pages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ChatResponse, Role, StopReason, TokenUsage, ToolCall};
    use crate::rag::test_support::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Embeds like `KeywordEmbedder`; chat replays scripted responses and
    /// records every request.
    struct Scripted {
        replies: Mutex<Vec<ChatResponse>>,
        seen: Mutex<Vec<ChatRequest>>,
    }

    impl Scripted {
        fn new(mut replies: Vec<ChatResponse>) -> Self {
            replies.reverse();
            Self {
                replies: Mutex::new(replies),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    fn text(content: &str) -> ChatResponse {
        ChatResponse {
            content: content.into(),
            tool_calls: Vec::new(),
            usage: TokenUsage::default(),
            stop_reason: StopReason::EndTurn,
        }
    }

    fn tool_use(query: &str) -> ChatResponse {
        ChatResponse {
            content: String::new(),
            tool_calls: vec![ToolCall {
                id: format!("call_{query}"),
                name: "search_documentation".into(),
                arguments: json!({ "query": query, "n_results": 1 }),
            }],
            usage: TokenUsage::default(),
            stop_reason: StopReason::ToolUse,
        }
    }

    #[async_trait]
    impl ModelProvider for Scripted {
        fn id(&self) -> &str {
            "scripted"
        }

        async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, NotebookError> {
            self.seen.lock().unwrap().push(request);
            self.replies
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| NotebookError::Provider {
                    provider: "scripted".into(),
                    message: "script exhausted".into(),
                    retriable: false,
                })
        }

        async fn embed(&self, _model: &str, texts: &[&str]) -> Result<Vec<Vec<f32>>, NotebookError> {
            Ok(texts.iter().map(|t| keyword_vector(t)).collect())
        }
    }

    async fn setup(replies: Vec<ChatResponse>, use_tools: bool) -> (Arc<Scripted>, Assistant) {
        let provider = Arc::new(Scripted::new(replies));
        let index = DocumentIndex::in_memory(provider.clone(), "kw").unwrap();
        index
            .ingest(
                "manual",
                "manual.pdf",
                &[
                    page(1, "install with the package manager"),
                    page(4, "config lives in {HOME}/.toolrc"),
                    page(9, "network error troubleshooting"),
                ],
                1000,
            )
            .await
            .unwrap();
        let assistant = Assistant::new(
            provider.clone(),
            Arc::new(index),
            AssistantConfig {
                model: "gpt-4o".into(),
                collection: "manual".into(),
                n_results: 1,
                use_tools,
                max_tokens: None,
                temperature: None,
            },
        )
        .unwrap();
        (provider, assistant)
    }

    #[test]
    fn test_system_template_names_collection() {
        let rendered = system_template("lammps", false).render().unwrap();
        assert!(rendered.contains("'lammps' collection"));
        assert!(!rendered.contains("search_documentation"));
        assert!(system_template("lammps", true)
            .render()
            .unwrap()
            .contains("search_documentation"));
    }

    #[tokio::test]
    async fn test_direct_mode_injects_pages() {
        let (provider, mut assistant) = setup(vec![text("Edit ~/.toolrc (page 4)")], false).await;
        let answer = assistant.ask("where is the config?").await.unwrap();

        assert_eq!(answer.pages, vec![4]);
        assert_eq!(answer.text, "Edit ~/.toolrc (page 4)");

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].tools.is_empty());
        let user = &seen[0].messages[1];
        assert_eq!(user.role, Role::User);
        // Page text containing braces is passed through untouched.
        assert!(user.content.contains("[page 4]\nconfig lives in {HOME}/.toolrc"));
        assert!(user.content.ends_with("Question: where is the config?"));
    }

    #[tokio::test]
    async fn test_history_kept_across_questions() {
        let (provider, mut assistant) =
            setup(vec![text("first"), text("second")], false).await;
        assistant.ask("install?").await.unwrap();
        assistant.ask("network error?").await.unwrap();

        // system + (user, assistant) * 2
        assert_eq!(assistant.history().len(), 5);
        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen[1].messages.len(), 4);
        assert_eq!(seen[1].messages[2].content, "first");
    }

    #[tokio::test]
    async fn test_tools_mode_dispatches_search() {
        let (provider, mut assistant) =
            setup(vec![tool_use("network error"), text("See page 9")], true).await;
        let answer = assistant.ask("why does it fail?").await.unwrap();

        assert_eq!(answer.text, "See page 9");
        assert_eq!(answer.pages, vec![9]);

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].tools.len(), 1);
        let tool_msg = seen[1].messages.last().unwrap();
        assert_eq!(tool_msg.role, Role::Tool);
        assert_eq!(tool_msg.tool_call_id.as_deref(), Some("call_network error"));
        assert!(tool_msg.content.starts_with("[page 9]"));
    }

    #[tokio::test]
    async fn test_tool_round_limit_forces_answer() {
        let mut replies: Vec<ChatResponse> =
            (0..MAX_TOOL_ROUNDS).map(|_| tool_use("install")).collect();
        replies.push(text("done"));
        let (provider, mut assistant) = setup(replies, true).await;

        let answer = assistant.ask("loop forever").await.unwrap();
        assert_eq!(answer.text, "done");
        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen.len(), MAX_TOOL_ROUNDS + 1);
        assert!(seen.last().unwrap().tools.is_empty());
    }

    #[tokio::test]
    async fn test_failed_question_leaves_history() {
        let (_provider, mut assistant) = setup(vec![], false).await;
        assert!(assistant.ask("install?").await.is_err());
        assert_eq!(assistant.history().len(), 1);
    }
}
