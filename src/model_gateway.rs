use anyhow::Result;
use reqwest::Client;
use std::future::Future;
use std::pin::Pin;
use tracing::debug;

use crate::config::Config;
use crate::model::{ChatRequest, ChatResponse};
use crate::providers;

pub type ChatGatewayFuture<'a> = Pin<Box<dyn Future<Output = Result<ChatResponse>> + 'a>>;

/// The single remote call the pipeline depends on.
pub trait ChatGateway {
    fn complete<'a>(&'a self, request: &'a ChatRequest) -> ChatGatewayFuture<'a>;
}

pub struct OpenAiGateway<'a> {
    client: &'a Client,
    cfg: &'a Config,
}

impl<'a> OpenAiGateway<'a> {
    pub fn new(client: &'a Client, cfg: &'a Config) -> Self {
        Self { client, cfg }
    }
}

impl ChatGateway for OpenAiGateway<'_> {
    fn complete<'b>(&'b self, request: &'b ChatRequest) -> ChatGatewayFuture<'b> {
        Box::pin(async move {
            debug!(
                provider = "openai",
                model = %request.model,
                "dispatching chat completion"
            );
            providers::openai::chat(self.client, self.cfg, request).await
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use anyhow::anyhow;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use super::{ChatGateway, ChatGatewayFuture};
    use crate::model::{ChatRequest, ChatResponse};

    /// Replays scripted responses in order and records every request.
    #[derive(Debug, Default)]
    pub(crate) struct ScriptedGateway {
        pub(crate) calls: RefCell<Vec<ChatRequest>>,
        replies: RefCell<VecDeque<Result<ChatResponse, String>>>,
    }

    impl ScriptedGateway {
        pub(crate) fn replying(texts: &[&str]) -> Self {
            let gateway = Self::default();
            for text in texts {
                gateway.push(ChatResponse::single(*text));
            }
            gateway
        }

        pub(crate) fn push(&self, response: ChatResponse) {
            self.replies.borrow_mut().push_back(Ok(response));
        }

        pub(crate) fn push_err(&self, message: impl Into<String>) {
            self.replies.borrow_mut().push_back(Err(message.into()));
        }

        pub(crate) fn call_count(&self) -> usize {
            self.calls.borrow().len()
        }
    }

    impl ChatGateway for ScriptedGateway {
        fn complete<'a>(&'a self, request: &'a ChatRequest) -> ChatGatewayFuture<'a> {
            self.calls.borrow_mut().push(request.clone());
            let result = match self.replies.borrow_mut().pop_front() {
                Some(Ok(response)) => Ok(response),
                Some(Err(message)) => Err(anyhow!(message)),
                None => Err(anyhow!("scripted gateway ran out of replies")),
            };
            Box::pin(async move { result })
        }
    }
}
