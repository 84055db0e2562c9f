//! Text processing utilities shared by the parser, summarizer and digest builder

use scraper::{Html, Node};

/// Marker appended when text is cut short
pub const ELLIPSIS: &str = "...";

/// Elements whose boundaries separate words
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption", "figure", "footer", "h1", "h2",
    "h3", "h4", "h5", "h6", "header", "hr", "li", "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

/// Plain text from a feed field that may carry markup and character references.
///
/// The field is parsed as an HTML fragment, so every entity is decoded and tag
/// attributes never leak; script and style contents are dropped.
pub fn clean_text(raw: &str) -> String {
    let fragment = Html::parse_fragment(raw);
    let mut text = String::with_capacity(raw.len());

    for node in fragment.root_element().descendants() {
        match node.value() {
            Node::Element(element) if BLOCK_ELEMENTS.contains(&element.name()) => text.push(' '),
            Node::Text(fragment_text) => {
                let hidden = node
                    .ancestors()
                    .filter_map(|ancestor| ancestor.value().as_element())
                    .any(|element| matches!(element.name(), "script" | "style" | "noscript"));
                if !hidden {
                    text.push_str(fragment_text);
                }
            }
            _ => {}
        }
    }

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split text into sentences on terminal punctuation followed by whitespace
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?' | '…') {
            continue;
        }
        match chars.peek() {
            Some((_, next)) if next.is_whitespace() => {
                let end = idx + c.len_utf8();
                push_sentence(&mut sentences, &text[start..end]);
                start = end;
            }
            None => {
                push_sentence(&mut sentences, &text[start..]);
                start = text.len();
            }
            _ => {}
        }
    }

    if start < text.len() {
        push_sentence(&mut sentences, &text[start..]);
    }

    sentences
}

fn push_sentence<'a>(sentences: &mut Vec<&'a str>, candidate: &'a str) {
    let trimmed = candidate.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed);
    }
}

/// Lowercased alphanumeric tokens
pub fn tokenize_words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| word.to_lowercase())
        .collect()
}

/// Tokens that carry meaning for ranking: not stop words, not bare numbers of one digit
pub fn is_informative(word: &str) -> bool {
    !is_stop_word(word) && !(word.len() == 1 && word.chars().all(|c| c.is_ascii_digit()))
}

/// Check if a word is a common English, Spanish or Catalan stop word
pub fn is_stop_word(word: &str) -> bool {
    matches!(
        word,
        // English
        "a" | "about" | "above" | "after" | "again" | "against" | "all" | "am" | "an" | "and" |
        "any" | "are" | "as" | "at" | "be" | "because" | "been" | "before" | "being" | "below" |
        "between" | "both" | "but" | "by" | "can" | "could" | "did" | "do" | "does" | "doing" |
        "down" | "during" | "each" | "few" | "for" | "from" | "further" | "had" | "has" | "have" |
        "having" | "he" | "her" | "here" | "hers" | "herself" | "him" | "himself" | "his" | "how" |
        "i" | "if" | "in" | "into" | "is" | "it" | "its" | "itself" | "just" | "may" | "me" |
        "might" | "more" | "most" | "must" | "my" | "myself" | "no" | "nor" | "not" | "now" | "of" |
        "off" | "on" | "once" | "only" | "or" | "other" | "our" | "ours" | "out" | "over" | "own" |
        "same" | "she" | "should" | "so" | "some" | "such" | "than" | "that" | "the" | "their" |
        "theirs" | "them" | "then" | "there" | "these" | "they" | "this" | "those" | "through" |
        "to" | "too" | "under" | "until" | "up" | "very" | "was" | "we" | "were" | "what" |
        "when" | "where" | "which" | "while" | "who" | "whom" | "why" | "will" | "with" |
        "would" | "you" | "your" | "yours" |
        // Spanish
        "al" | "como" | "con" | "contra" | "cual" | "cuando" | "de" | "del" | "desde" | "donde" |
        "durante" | "el" | "ella" | "ellas" | "ellos" | "en" | "entre" | "era" | "es" | "esa" |
        "ese" | "eso" | "esta" | "este" | "esto" | "fue" | "ha" | "han" | "hay" | "la" | "las" |
        "le" | "les" | "lo" | "los" | "mas" | "muy" | "nos" | "o" | "para" | "pero" | "por" |
        "que" | "se" | "sea" | "ser" | "si" | "sin" | "sobre" | "su" | "sus" | "también" |
        "tras" | "un" | "una" | "uno" | "unos" | "unas" | "y" | "ya" | "más" | "sí" |
        // Catalan
        "els" | "és" | "amb" | "dels" | "pel" | "pels" | "què" | "aquest" | "aquesta" |
        "per" | "va" | "hi" | "ni" | "uns" | "unes" | "seu" | "seva" | "més"
    )
}

/// Cap `text` at `max_chars` characters, marker included
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let marker_len = ELLIPSIS.chars().count();
    if max_chars <= marker_len {
        return text.chars().take(max_chars).collect();
    }

    let mut truncated: String = text.chars().take(max_chars - marker_len).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

/// Escape text for Telegram's HTML parse mode (also safe inside attribute values)
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
