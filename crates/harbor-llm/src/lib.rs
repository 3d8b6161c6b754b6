//! LLM provider abstraction with streaming support for Harbor.
//!
//! Providers implement [`LlmProvider`] to expose a uniform streaming and
//! non-streaming completion interface over Claude, any `OpenAI`-compatible
//! endpoint (LM Studio, vLLM, Ollama, `OpenAI` itself), and Z.AI. The
//! [`pid`] module manages the on-disk record Harbor keeps while it is
//! supervising a locally-spawned model runtime.
//!
//! ```no_run
//! use harbor_llm::prelude::*;
//!
//! # async fn example() -> LlmResult<()> {
//! let provider = ClaudeProvider::new(ProviderConfig::new("sk-...", "claude-sonnet-4-20250514"));
//! let response = provider.complete_simple("hello").await?;
//! # let _ = response;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

mod claude;
mod error;
mod openai_compat;
pub mod pid;
pub mod prelude;
mod provider;
mod types;
mod zai;

pub use claude::ClaudeProvider;
pub use error::{LlmError, LlmResult};
pub use openai_compat::OpenAiCompatProvider;
pub use pid::{
    LocalModelPidFile, LocalModelRecord, OsProcessReuseCheck, PidError, PidResult,
    ProcessReuseCheck,
};
pub use provider::{LlmProvider, ProviderConfig, StreamBox};
pub use types::{
    ContentPart, LlmResponse, LlmToolDefinition, Message, MessageContent, MessageRole, StopReason,
    StreamEvent, ToolCall, ToolCallResult, Usage,
};
pub use zai::ZaiProvider;
