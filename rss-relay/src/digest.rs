use crate::text::{escape_html, truncate_chars, ELLIPSIS};
use crate::types::{Digest, FeedItem, Summarizer, Translator};
use tracing::{debug, warn};

/// Label of the trailing link to the full article
pub const READ_MORE_LABEL: &str = "Читать полностью";

/// Stands in for the translated block when the translator fails
pub const TRANSLATION_UNAVAILABLE: &str = "[Перевод недоступен]";

/// Per-section character limit
pub const DEFAULT_SECTION_CHARS: usize = 200;

/// Largest visible text the transport accepts (photo caption limit, counted after entity parsing)
pub const DEFAULT_MESSAGE_CHARS: usize = 1024;

const SECTION_SEPARATOR: &str = "\n\n";

/// Builds the bilingual digest for one feed item.
///
/// Every field of the resulting [`Digest`] is plain text capped at the
/// section limit; markup is only added by [`compose_message`].
#[derive(Debug, Clone, Copy)]
pub struct DigestBuilder {
    section_chars: usize,
}

impl DigestBuilder {
    pub fn new(section_chars: usize) -> Self {
        Self { section_chars }
    }

    pub async fn build(&self, item: &FeedItem, summarizer: &dyn Summarizer, translator: &dyn Translator) -> Digest {
        let summary = match summarizer.summarize(&item.summary_text) {
            Ok(summary) => summary,
            Err(e) => {
                warn!("Summarization failed for {}, using raw text: {}", item.identifier, e);
                item.summary_text.clone()
            }
        };

        let (translated_header, translated_body) = match self.translate(&item.title, &summary, translator).await {
            Some(translated) => translated,
            None => (String::new(), TRANSLATION_UNAVAILABLE.to_string()),
        };

        debug!("Built digest for {}", item.identifier);

        Digest {
            header: truncate_chars(&item.title, self.section_chars),
            body: truncate_chars(&summary, self.section_chars),
            translated_header,
            translated_body,
            link: item.link.clone(),
            image_url: item.image_url.clone(),
        }
    }

    async fn translate(&self, title: &str, summary: &str, translator: &dyn Translator) -> Option<(String, String)> {
        let translated_title = match translator.translate(title).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Translation error: {}", e);
                return None;
            }
        };

        let translated_summary = if summary.is_empty() {
            String::new()
        } else {
            match translator.translate(summary).await {
                Ok(text) => text,
                Err(e) => {
                    warn!("Translation error: {}", e);
                    return None;
                }
            }
        };

        Some((
            truncate_chars(&translated_title, self.section_chars),
            truncate_chars(&translated_summary, self.section_chars),
        ))
    }
}

impl Default for DigestBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_SECTION_CHARS)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Plain,
    Bold,
    Italic,
}

/// Render a digest as a Telegram HTML message whose visible text is at most
/// `max_chars` characters.
///
/// The read-more link is never cut: its visible length is reserved up front
/// and only the text sections are truncated, before any markup is applied.
pub fn compose_message(digest: &Digest, max_chars: usize) -> String {
    let translated_style = if digest.translated_body == TRANSLATION_UNAVAILABLE {
        Style::Italic
    } else {
        Style::Plain
    };

    let mut runs: Vec<(&str, Style)> = Vec::with_capacity(7);
    for (text, style) in [
        (digest.header.as_str(), Style::Bold),
        (digest.body.as_str(), Style::Plain),
        (digest.translated_header.as_str(), Style::Bold),
        (digest.translated_body.as_str(), translated_style),
    ] {
        if text.is_empty() {
            continue;
        }
        if !runs.is_empty() {
            runs.push((SECTION_SEPARATOR, Style::Plain));
        }
        runs.push((text, style));
    }

    let link = (!digest.link.is_empty())
        .then(|| format!("<a href=\"{}\">{}</a>", escape_html(&digest.link), READ_MORE_LABEL));
    let reserved = if link.is_some() {
        SECTION_SEPARATOR.chars().count() + READ_MORE_LABEL.chars().count()
    } else {
        0
    };

    let mut message = String::new();
    for (text, style) in fit_runs(runs, max_chars.saturating_sub(reserved)) {
        if text.is_empty() {
            continue;
        }
        let escaped = escape_html(&text);
        match style {
            Style::Plain => message.push_str(&escaped),
            Style::Bold => message.push_str(&format!("<b>{}</b>", escaped)),
            Style::Italic => message.push_str(&format!("<i>{}</i>", escaped)),
        }
    }

    if let Some(link) = link {
        if !message.is_empty() {
            message.push_str(SECTION_SEPARATOR);
        }
        message.push_str(&link);
    }

    message
}

/// Cut the runs to `budget` visible characters, marker included
fn fit_runs(runs: Vec<(&str, Style)>, budget: usize) -> Vec<(String, Style)> {
    let total: usize = runs.iter().map(|(text, _)| text.chars().count()).sum();
    if total <= budget {
        return runs.into_iter().map(|(text, style)| (text.to_string(), style)).collect();
    }

    let mut remaining = budget.saturating_sub(ELLIPSIS.chars().count());
    let mut fitted = Vec::with_capacity(runs.len() + 1);

    for (text, style) in runs {
        if remaining == 0 {
            break;
        }
        let kept: String = text.chars().take(remaining).collect();
        remaining -= kept.chars().count();
        fitted.push((kept, style));
    }

    fitted.push((ELLIPSIS.chars().take(budget).collect(), Style::Plain));
    fitted
}
