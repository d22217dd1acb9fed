//! System prompt templates shared by every provider.

use std::fmt::Write;

/// Instructions appended to every prompt that rewrites user text.
///
/// Formulas are swapped for `[[MATH_n]]` placeholders before dispatch, and
/// literal dollar signs are spelled out afterwards, so the model is told to
/// leave both alone.
pub const REWRITE_GUARDRAILS: &str = "\
Formatting rules:
- Tokens of the form [[MATH_n]] are protected formulas. Copy them exactly, in place, and never alter, translate or remove them.
- Never write a literal dollar sign. Spell out currency amounts in words (for example \"15 dollars\").
- Return only the transformed text, with no preamble, commentary or markdown fences.";

/// Prompt variants used by the dispatcher.
#[derive(Debug, Clone, Copy)]
pub enum PromptTemplate<'a> {
    /// Academic-writing rewrite of a chunk.
    Rewrite {
        /// User instructions describing the transformation.
        instructions: &'a str,
        /// Reference material the model may draw facts from.
        content_source: Option<&'a str>,
        /// Reference text whose tone and style should be imitated.
        style_source: Option<&'a str>,
    },
    /// Rewrite phrased as a concise exam answer.
    ExamMode {
        /// User instructions describing the transformation.
        instructions: &'a str,
        /// Reference material the model may draw facts from.
        content_source: Option<&'a str>,
        /// Reference text whose tone and style should be imitated.
        style_source: Option<&'a str>,
    },
    /// Solve or answer the assignment rather than rewriting it.
    Homework {
        /// Additional constraints from the user.
        special_instructions: Option<&'a str>,
    },
    /// Conversational assistant, optionally grounded in a document.
    Chat {
        /// Document the conversation is about.
        context_document: Option<&'a str>,
    },
    /// Self-assessment of whether a text was machine generated.
    DetectAi,
    /// Generate new chunks continuing the full document.
    Extend {
        /// Number of new sections to write.
        count: usize,
        /// User instructions for the new material.
        instructions: &'a str,
        /// Reference text whose tone and style should be imitated.
        style_source: Option<&'a str>,
    },
    /// Style-guided humanizer used by the GPT-Bypass flow.
    Bypass {
        /// Sample of the target writing style.
        style_text: Option<&'a str>,
        /// Extra user instructions.
        custom_instructions: Option<&'a str>,
    },
}

impl PromptTemplate<'_> {
    /// Returns true if the template transforms user text and therefore carries
    /// the math and dollar-sign guardrails.
    pub const fn rewrites_text(&self) -> bool {
        matches!(
            self,
            Self::Rewrite { .. }
                | Self::ExamMode { .. }
                | Self::Homework { .. }
                | Self::Extend { .. }
                | Self::Bypass { .. }
        )
    }

    /// Renders the system prompt.
    pub fn system_prompt(&self) -> String {
        let mut prompt = String::new();

        match *self {
            Self::Rewrite {
                instructions,
                content_source,
                style_source,
            } => {
                prompt.push_str(
                    "You are an expert academic writing assistant. Rewrite the text supplied by the \
                     user according to the instructions below. Preserve the meaning, the order of \
                     ideas and every factual claim unless the instructions say otherwise.",
                );
                push_section(&mut prompt, "Instructions", instructions);
                push_sources(&mut prompt, content_source, style_source);
            }
            Self::ExamMode {
                instructions,
                content_source,
                style_source,
            } => {
                prompt.push_str(
                    "You are a strong student answering an exam question. Use the text supplied by \
                     the user as your draft answer. Be direct, complete and concise, and do not \
                     mention that the text was rewritten.",
                );
                push_section(&mut prompt, "Instructions", instructions);
                push_sources(&mut prompt, content_source, style_source);
            }
            Self::Homework {
                special_instructions,
            } => {
                prompt.push_str(
                    "You are a meticulous tutor. The user supplies an assignment. Solve or answer \
                     every question it contains, showing the reasoning a strong student would \
                     write. Do not restate the assignment.",
                );
                if let Some(special) = special_instructions {
                    push_section(&mut prompt, "Additional instructions", special);
                }
            }
            Self::Chat { context_document } => {
                prompt.push_str(
                    "You are a helpful writing assistant. Answer the user's questions clearly and \
                     accurately.",
                );
                if let Some(document) = context_document {
                    push_section(
                        &mut prompt,
                        "The conversation concerns the following document",
                        document,
                    );
                }
            }
            Self::DetectAi => {
                prompt.push_str(
                    "You are an AI-text detector. Assess whether the text supplied by the user was \
                     written by a language model. Respond with a single JSON object and nothing \
                     else, shaped as {\"isAI\": boolean, \"confidence\": number between 0 and 1, \
                     \"details\": short explanation}.",
                );
            }
            Self::Extend {
                count,
                instructions,
                style_source,
            } => {
                let _ = write!(
                    prompt,
                    "You are an expert academic writer. The user supplies a complete document. \
                     Write exactly {count} new section(s) that continue it seamlessly. Separate \
                     sections with a blank line. Do not repeat or summarize existing content and \
                     do not return the original document."
                );
                push_section(&mut prompt, "Instructions", instructions);
                if let Some(style) = style_source {
                    push_section(&mut prompt, "Style source", style);
                }
            }
            Self::Bypass {
                style_text,
                custom_instructions,
            } => {
                prompt.push_str(
                    "Rewrite the user's text so it reads as natural human writing: vary sentence \
                     length and structure, prefer concrete wording, and avoid stock phrases. Keep \
                     the meaning intact.",
                );
                if let Some(style) = style_text {
                    push_section(&mut prompt, "Match the style of this sample", style);
                }
                if let Some(custom) = custom_instructions {
                    push_section(&mut prompt, "Additional instructions", custom);
                }
            }
        }

        if self.rewrites_text() {
            prompt.push_str("\n\n");
            prompt.push_str(REWRITE_GUARDRAILS);
        }

        prompt
    }
}

fn push_sources(prompt: &mut String, content_source: Option<&str>, style_source: Option<&str>) {
    if let Some(source) = content_source {
        push_section(
            prompt,
            "Content source (draw facts and arguments from this material)",
            source,
        );
    }
    if let Some(style) = style_source {
        push_section(
            prompt,
            "Style source (imitate its tone, rhythm and vocabulary, not its content)",
            style,
        );
    }
}

fn push_section(prompt: &mut String, title: &str, body: &str) {
    let body = body.trim();
    if body.is_empty() {
        return;
    }
    let _ = write!(prompt, "\n\n{title}:\n{body}");
}
