use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::TRACING_TARGET;
use crate::chunk::{CHUNK_SEPARATOR, Chunker, ChunkerConfig, count_words, join_chunks};
use crate::provider::{
    ChatMessage, CompletionRequest, LanguageService, PromptTemplate, ProviderKind,
    ProviderLimits, ProviderRegistry,
};
use crate::text::{clean_dollars, estimate_tokens, protect_math};
use crate::{Error, Result};

/// What to do with a chunk of text and which provider should do it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewriteOptions {
    /// Backend the text is routed to.
    pub provider: ProviderKind,
    /// User instructions describing the transformation.
    pub instructions: String,
    /// Reference material the model may draw facts from.
    #[serde(default)]
    pub content_source: Option<String>,
    /// Reference text whose style should be imitated.
    #[serde(default)]
    pub style_source: Option<String>,
    /// Phrase the result as a concise exam answer.
    #[serde(default)]
    pub exam_mode: bool,
}

impl RewriteOptions {
    /// Creates options with instructions only.
    pub fn new(provider: ProviderKind, instructions: impl Into<String>) -> Self {
        Self {
            provider,
            instructions: instructions.into(),
            content_source: None,
            style_source: None,
            exam_mode: false,
        }
    }

    /// Sets the content source. Blank sources are ignored.
    #[must_use]
    pub fn with_content_source(mut self, source: Option<String>) -> Self {
        self.content_source = source.filter(|s| !s.trim().is_empty());
        self
    }

    /// Sets the style source. Blank sources are ignored.
    #[must_use]
    pub fn with_style_source(mut self, source: Option<String>) -> Self {
        self.style_source = source.filter(|s| !s.trim().is_empty());
        self
    }

    /// Enables exam mode.
    #[must_use]
    pub fn with_exam_mode(mut self, exam_mode: bool) -> Self {
        self.exam_mode = exam_mode;
        self
    }

    /// Returns the prompt template for these options.
    pub fn template(&self) -> PromptTemplate<'_> {
        let instructions = self.instructions.as_str();
        let content_source = self.content_source.as_deref();
        let style_source = self.style_source.as_deref();

        if self.exam_mode {
            PromptTemplate::ExamMode {
                instructions,
                content_source,
                style_source,
            }
        } else {
            PromptTemplate::Rewrite {
                instructions,
                content_source,
                style_source,
            }
        }
    }
}

/// Routes text to a provider from the registry.
///
/// Every text-transforming call protects LaTeX regions before the request
/// and, on the response, spells out dollar signs and restores the formulas.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: ProviderRegistry,
}

impl Dispatcher {
    /// Creates a dispatcher over the configured providers.
    pub fn new(registry: ProviderRegistry) -> Self {
        Self { registry }
    }

    /// Returns the provider registry.
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Rewrites `text` according to `options`.
    pub async fn rewrite(&self, options: &RewriteOptions, text: &str) -> Result<String> {
        self.dispatch(options.provider, options.template(), text)
            .await
    }

    /// Solves or answers an assignment.
    pub async fn solve_homework(
        &self,
        provider: ProviderKind,
        assignment: &str,
        special_instructions: Option<&str>,
    ) -> Result<String> {
        let template = PromptTemplate::Homework {
            special_instructions,
        };
        self.dispatch(provider, template, assignment).await
    }

    /// Humanizes `text`, optionally imitating a style sample.
    pub async fn bypass(
        &self,
        provider: ProviderKind,
        text: &str,
        style_text: Option<&str>,
        custom_instructions: Option<&str>,
    ) -> Result<String> {
        let template = PromptTemplate::Bypass {
            style_text,
            custom_instructions,
        };
        self.dispatch(provider, template, text).await
    }

    /// Sends `text` with the rendered `template`.
    pub async fn dispatch(
        &self,
        provider: ProviderKind,
        template: PromptTemplate<'_>,
        text: &str,
    ) -> Result<String> {
        let system = template.system_prompt();
        self.dispatch_rendered(provider, &system, text, &CancellationToken::new())
            .await
    }

    /// Returns the piece size, in words, `text` is split into when it is
    /// rewritten with `options`, or `None` if it goes out in one request.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the provider is not configured and an
    /// invalid input error if the system prompt alone exceeds the ceiling.
    pub fn split_words_for(&self, options: &RewriteOptions, text: &str) -> Result<Option<usize>> {
        let service = self.registry.get(options.provider)?;
        let system = options.template().system_prompt();
        split_plan(&service.limits(), options.provider, &system, text)
    }

    /// Sends `text` with a pre-rendered system prompt.
    ///
    /// If the estimated prompt exceeds the provider's input ceiling, or the
    /// text is too long for its rewrite to fit the output budget, the text is
    /// split at [`ProviderLimits::split_words`] and the pieces are sent one
    /// after another with the provider's fallback delay.
    ///
    /// # Errors
    ///
    /// Returns an invalid input error if the text is blank or the system
    /// prompt alone exceeds the input ceiling, and a cancellation error if
    /// `cancel` fires between two pieces.
    pub(crate) async fn dispatch_rendered(
        &self,
        provider: ProviderKind,
        system: &str,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        if text.trim().is_empty() {
            return Err(Error::invalid_input().with_message("text to process is empty"));
        }

        let service = self.registry.get(provider)?;
        let limits = service.limits();
        let Some(split_words) = split_plan(&limits, provider, system, text)? else {
            return self.transform(&service, system, text).await;
        };

        let pieces = Chunker::new(ChunkerConfig::fixed(split_words)).chunk(text);
        tracing::info!(
            target: TRACING_TARGET,
            provider = %provider,
            estimated_tokens = estimate_tokens(system) + estimate_tokens(text),
            words = count_words(text),
            max_input_tokens = limits.max_input_tokens,
            max_output_words = limits.max_output_words(),
            pieces = pieces.len(),
            "Text exceeds provider limits, processing in smaller pieces"
        );

        let mut outputs = Vec::with_capacity(pieces.len());
        for (position, piece) in pieces.iter().enumerate() {
            if position > 0 && !limits.fallback_delay.is_zero() {
                tokio::select! {
                    () = cancel.cancelled() => {}
                    () = tokio::time::sleep(limits.fallback_delay) => {}
                }
            }
            if cancel.is_cancelled() {
                return Err(Error::cancelled().with_message("processing was cancelled"));
            }

            let output = self
                .transform(&service, system, &piece.content)
                .await
                .map_err(|error| {
                    let message = format!(
                        "part {} of {}: {}",
                        position + 1,
                        pieces.len(),
                        error.message_or_kind()
                    );
                    error.with_message(message)
                })?;
            outputs.push(output);
        }

        Ok(join_chunks(outputs.iter().map(String::as_str)))
    }

    /// Sends `text` in a single request.
    async fn transform(&self, service: &LanguageService, system: &str, text: &str) -> Result<String> {
        let limits = service.limits();
        let estimated_tokens = estimate_tokens(system) + estimate_tokens(text);
        if !limits.fits(estimated_tokens) {
            return Err(Error::invalid_input()
                .with_provider(service.kind())
                .with_message(format!(
                    "prompt of about {estimated_tokens} tokens exceeds the input ceiling of {} tokens",
                    limits.max_input_tokens
                )));
        }

        let protected = protect_math(text);
        let request = CompletionRequest::single(system, protected.text())
            .with_max_output_tokens(limits.max_output_tokens);

        let response = service.complete(&request).await?;
        let content = response.content.trim();
        if content.is_empty() {
            return Err(Error::external_error()
                .with_provider(service.kind())
                .with_message("provider returned an empty response"));
        }

        Ok(protected.restore(&clean_dollars(content)))
    }

    /// Continues a conversation, optionally about a document.
    ///
    /// Chat replies are returned as generated.
    pub async fn chat(
        &self,
        provider: ProviderKind,
        history: &[ChatMessage],
        message: &str,
        context_document: Option<&str>,
    ) -> Result<String> {
        if message.trim().is_empty() {
            return Err(Error::invalid_input().with_message("message is empty"));
        }

        let service = self.registry.get(provider)?;
        let system = PromptTemplate::Chat { context_document }.system_prompt();

        let mut messages = history.to_vec();
        messages.push(ChatMessage::user(message));

        let limits = service.limits();
        let request = CompletionRequest {
            system: Some(system),
            messages,
            max_tokens: Some(limits.max_output_tokens),
            temperature: None,
        };

        let estimated_tokens = request.estimated_tokens();
        if !limits.fits(estimated_tokens) {
            return Err(Error::invalid_input().with_provider(provider).with_message(format!(
                "conversation of about {estimated_tokens} tokens exceeds the input ceiling of {} \
                 tokens, start a new conversation",
                limits.max_input_tokens
            )));
        }

        let response = service.complete(&request).await?;
        Ok(response.content.trim().to_owned())
    }

    /// Generates `count` new sections continuing `document`.
    ///
    /// The reply is split on blank lines. More paragraphs than requested are
    /// regrouped into `count` sections; fewer are all kept. A document too
    /// long for the input ceiling is sent as its trailing paragraphs.
    pub async fn extend(
        &self,
        provider: ProviderKind,
        document: &str,
        count: usize,
        instructions: &str,
        style_source: Option<&str>,
    ) -> Result<Vec<String>> {
        if count == 0 {
            return Err(Error::invalid_input().with_message("number of new chunks must be at least 1"));
        }

        let service = self.registry.get(provider)?;
        let system = PromptTemplate::Extend {
            count,
            instructions,
            style_source,
        }
        .system_prompt();

        let limits = service.limits();
        let system_tokens = estimate_tokens(&system);
        let room = limits
            .max_input_tokens
            .checked_sub(system_tokens)
            .filter(|&room| room > 0)
            .ok_or_else(|| prompt_exceeds_ceiling(provider, system_tokens, &limits))?;

        let context = trailing_context(document, room);
        if context.len() < document.len() {
            tracing::info!(
                target: TRACING_TARGET,
                provider = %provider,
                document_tokens = estimate_tokens(document),
                context_tokens = estimate_tokens(context),
                "Document exceeds provider ceiling, continuing from its tail"
            );
        }

        let request = CompletionRequest::single(system, context)
            .with_max_output_tokens(limits.max_output_tokens);

        let response = service.complete(&request).await?;
        let content = clean_dollars(response.content.trim()).into_owned();
        let paragraphs: Vec<&str> = content
            .split("\n\n")
            .map(str::trim)
            .filter(|paragraph| !paragraph.is_empty())
            .collect();

        if paragraphs.is_empty() {
            return Err(Error::external_error()
                .with_provider(provider)
                .with_message("provider returned no new content"));
        }

        tracing::debug!(
            target: TRACING_TARGET,
            provider = %provider,
            requested = count,
            paragraphs = paragraphs.len(),
            "Generated additional content"
        );

        Ok(regroup(&paragraphs, count))
    }
}

/// Piece size for `text` under `limits`, or `None` when no split is needed.
fn split_plan(
    limits: &ProviderLimits,
    provider: ProviderKind,
    system: &str,
    text: &str,
) -> Result<Option<usize>> {
    let system_tokens = estimate_tokens(system);
    let split_words = limits
        .split_words(system_tokens)
        .ok_or_else(|| prompt_exceeds_ceiling(provider, system_tokens, limits))?;

    let fits = limits.fits(system_tokens + estimate_tokens(text))
        && count_words(text) <= limits.max_output_words();
    Ok((!fits).then_some(split_words))
}

fn prompt_exceeds_ceiling(provider: ProviderKind, system_tokens: usize, limits: &ProviderLimits) -> Error {
    Error::invalid_input().with_provider(provider).with_message(format!(
        "instructions and sources alone take about {system_tokens} tokens, over the input \
         ceiling of {} tokens; shorten them",
        limits.max_input_tokens
    ))
}

/// Returns the end of `document` estimated at no more than `max_tokens`,
/// starting at a paragraph boundary when one falls inside it.
fn trailing_context(document: &str, max_tokens: usize) -> &str {
    if estimate_tokens(document) <= max_tokens {
        return document;
    }

    let skip = document.chars().count().saturating_sub(max_tokens * 4);
    let start = document
        .char_indices()
        .nth(skip)
        .map_or(document.len(), |(index, _)| index);
    let tail = &document[start..];

    match tail.find(CHUNK_SEPARATOR) {
        Some(boundary) => tail[boundary..].trim_start(),
        None => tail,
    }
}

/// Groups consecutive paragraphs into at most `count` sections.
fn regroup(paragraphs: &[&str], count: usize) -> Vec<String> {
    let total = paragraphs.len();
    if total <= count {
        return paragraphs.iter().map(|p| (*p).to_owned()).collect();
    }

    (0..count)
        .map(|group| {
            let start = group * total / count;
            let end = (group + 1) * total / count;
            paragraphs[start..end].join(CHUNK_SEPARATOR)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::mock::MockProvider;

    fn dispatcher(provider: MockProvider) -> Dispatcher {
        Dispatcher::new(ProviderRegistry::new().with_provider(provider))
    }

    #[tokio::test]
    async fn rewrite_protects_math_and_cleans_dollars() -> anyhow::Result<()> {
        let provider = MockProvider::echo(ProviderKind::OpenAi);
        let dispatcher = dispatcher(provider.clone());
        let options = RewriteOptions::new(ProviderKind::OpenAi, "Keep it");

        let output = dispatcher
            .rewrite(&options, r"It costs $15 and $$x^2$$ holds.")
            .await?;

        assert_eq!(output, r"It costs 15 dollars and $$x^2$$ holds.");
        assert_eq!(provider.calls(), 1);
        assert!(provider.last_input().is_some_and(|input| input.contains("[[MATH_0]]")));
        Ok(())
    }

    #[tokio::test]
    async fn inline_math_keeps_its_dollar_signs() -> anyhow::Result<()> {
        let dispatcher = dispatcher(MockProvider::echo(ProviderKind::Anthropic));
        let options = RewriteOptions::new(ProviderKind::Anthropic, "Keep it");

        let output = dispatcher
            .rewrite(&options, "Let $x$ cost $5 and $y^2$ cost $10.")
            .await?;

        assert_eq!(output, "Let $x$ cost 5 dollars and $y^2$ cost 10 dollars.");
        Ok(())
    }

    #[tokio::test]
    async fn unconfigured_provider_fails_fast() {
        let dispatcher = dispatcher(MockProvider::echo(ProviderKind::OpenAi));
        let options = RewriteOptions::new(ProviderKind::DeepSeek, "Rewrite");

        let error = dispatcher.rewrite(&options, "Some text").await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::Configuration);
        assert!(error.to_string().contains("DEEPSEEK_API_KEY"));
    }

    fn limits(max_input_tokens: usize, max_output_tokens: u32) -> ProviderLimits {
        ProviderLimits {
            max_input_tokens,
            max_output_tokens,
            fallback_chunk_words: 20,
            fallback_delay: std::time::Duration::ZERO,
        }
    }

    fn paragraphs(count: usize) -> String {
        (0..count)
            .map(|i| format!("Paragraph {i} has exactly a dozen words in it for this small test."))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn bypass_system_tokens() -> usize {
        let template = PromptTemplate::Bypass {
            style_text: None,
            custom_instructions: None,
        };
        estimate_tokens(&template.system_prompt())
    }

    #[tokio::test]
    async fn oversized_prompt_falls_back_to_chunks() -> anyhow::Result<()> {
        let provider = MockProvider::echo(ProviderKind::DeepSeek)
            .with_limits(limits(bypass_system_tokens() + 30, 8_192));
        let dispatcher = dispatcher(provider.clone());
        let text = paragraphs(5);

        let output = dispatcher
            .bypass(ProviderKind::DeepSeek, &text, None, None)
            .await?;

        assert_eq!(output, text);
        assert_eq!(provider.calls(), 5);
        Ok(())
    }

    #[tokio::test]
    async fn long_text_is_split_to_fit_the_output_budget() -> anyhow::Result<()> {
        // 30 output tokens leave room for a 20-word rewrite.
        let provider = MockProvider::echo(ProviderKind::OpenAi).with_limits(limits(100_000, 30));
        let dispatcher = dispatcher(provider.clone());
        let options = RewriteOptions::new(ProviderKind::OpenAi, "Rewrite");
        let text = paragraphs(3);

        let output = dispatcher.rewrite(&options, &text).await?;

        assert_eq!(output, text);
        assert_eq!(provider.calls(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn system_prompt_over_the_ceiling_is_rejected() {
        let provider = MockProvider::echo(ProviderKind::Perplexity).with_limits(limits(50, 4_096));
        let dispatcher = dispatcher(provider.clone());
        let options = RewriteOptions::new(ProviderKind::Perplexity, "Rewrite")
            .with_content_source(Some("Background material. ".repeat(40)));

        let error = dispatcher.rewrite(&options, "Short text.").await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::InvalidInput);
        assert_eq!(error.provider, Some(ProviderKind::Perplexity));
        assert!(error.to_string().contains("input ceiling of 50 tokens"));

        let error = dispatcher
            .extend(ProviderKind::Perplexity, "Some document.", 1, "More", None)
            .await
            .unwrap_err();
        assert_eq!(error.kind, ErrorKind::InvalidInput);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn extend_sends_the_tail_of_a_long_document() -> anyhow::Result<()> {
        let system = PromptTemplate::Extend {
            count: 1,
            instructions: "More",
            style_source: None,
        }
        .system_prompt();
        let room = 40;
        let provider = MockProvider::echo(ProviderKind::Anthropic)
            .with_limits(limits(estimate_tokens(&system) + room, 4_096));
        let dispatcher = dispatcher(provider.clone());
        let document = paragraphs(10);

        dispatcher
            .extend(ProviderKind::Anthropic, &document, 1, "More", None)
            .await?;

        let sent = provider.last_input().unwrap_or_default();
        assert!(estimate_tokens(&sent) <= room);
        assert!(sent.starts_with("Paragraph "));
        assert!(document.ends_with(&sent));
        assert!(sent.len() < document.len());
        Ok(())
    }

    #[tokio::test]
    async fn chat_over_the_ceiling_is_rejected() {
        let provider = MockProvider::echo(ProviderKind::OpenAi).with_limits(limits(100, 4_096));
        let dispatcher = dispatcher(provider.clone());
        let history = vec![ChatMessage::user("word ".repeat(200))];

        let error = dispatcher
            .chat(ProviderKind::OpenAi, &history, "and now?", None)
            .await
            .unwrap_err();
        assert_eq!(error.kind, ErrorKind::InvalidInput);
        assert_eq!(provider.calls(), 0);
    }

    #[test]
    fn split_words_for_reports_oversized_text() -> anyhow::Result<()> {
        let provider = MockProvider::echo(ProviderKind::OpenAi).with_limits(limits(100_000, 30));
        let dispatcher = dispatcher(provider);
        let options = RewriteOptions::new(ProviderKind::OpenAi, "Rewrite");

        assert_eq!(dispatcher.split_words_for(&options, "A short sentence.")?, None);
        assert_eq!(dispatcher.split_words_for(&options, &paragraphs(3))?, Some(20));
        Ok(())
    }

    #[test]
    fn trailing_context_starts_at_a_paragraph() {
        let document = "First paragraph here.\n\nSecond one.\n\nThird.";
        assert_eq!(trailing_context(document, 100), document);
        assert_eq!(trailing_context(document, 5), "Third.");
    }

    #[tokio::test]
    async fn extend_regroups_paragraphs() -> anyhow::Result<()> {
        let provider = MockProvider::echo(ProviderKind::Anthropic);
        let dispatcher = dispatcher(provider);

        let sections = dispatcher
            .extend(ProviderKind::Anthropic, "A\n\nB\n\nC\n\nD\n\nE", 2, "More", None)
            .await?;
        assert_eq!(sections, vec!["A\n\nB", "C\n\nD\n\nE"]);

        let sections = dispatcher
            .extend(ProviderKind::Anthropic, "Only one", 3, "More", None)
            .await?;
        assert_eq!(sections, vec!["Only one"]);
        Ok(())
    }

    #[tokio::test]
    async fn chat_appends_message_to_history() -> anyhow::Result<()> {
        let provider = MockProvider::echo(ProviderKind::Perplexity);
        let dispatcher = dispatcher(provider);
        let history = vec![ChatMessage::user("hi"), ChatMessage::assistant("hello")];

        let reply = dispatcher
            .chat(ProviderKind::Perplexity, &history, "what costs $5?", None)
            .await?;
        assert_eq!(reply, "what costs $5?");
        Ok(())
    }

    #[test]
    fn regroup_distributes_contiguously() {
        assert_eq!(regroup(&["a", "b", "c"], 3), vec!["a", "b", "c"]);
        assert_eq!(regroup(&["a", "b", "c", "d"], 2), vec!["a\n\nb", "c\n\nd"]);
    }
}
