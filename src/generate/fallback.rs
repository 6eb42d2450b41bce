//! Local fallback rhymes, used when every generation attempt fails.
//!
//! Nothing here talks to a remote service: the first few sentences of the
//! page are spliced into a fixed per-style template.

use crate::domain::{Length, Style};

/// Sentences at or below this length are skipped
const MIN_SENTENCE_CHARS: usize = 10;

const LINE_JOINER: &str = ",\n";

/// How many sentences a fallback uses for each length tier
pub fn sentence_budget(length: Length) -> usize {
    match length {
        Length::Short => 2,
        Length::Medium => 3,
        Length::Long => 4,
    }
}

/// First `count` sentences longer than the minimum, trimmed
pub fn leading_sentences(text: &str, count: usize) -> Vec<String> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| s.chars().count() > MIN_SENTENCE_CHARS)
        .take(count)
        .map(str::to_string)
        .collect()
}

/// Build the fallback rhyme for `style`
pub fn fallback_rhyme(content: &str, style: Option<Style>, length: Length) -> String {
    let sentences = leading_sentences(content, sentence_budget(length));
    let lines = if sentences.is_empty() {
        "There was a page with words to share".to_string()
    } else {
        sentences.join(LINE_JOINER)
    };

    match style {
        Some(Style::Rap) => format!(
            "Yo, listen up, here's the story today,\n{lines},\nThat's the word, and it's here to stay!"
        ),
        Some(Style::Pop) => format!(
            "Oh-oh, here's a song for you,\n{lines},\nSing it loud, the whole day through!"
        ),
        Some(Style::Nursery) => format!(
            "Gather round, both big and small,\n{lines},\nAnd that's the tale, the end of all!"
        ),
        Some(Style::Ballad) => format!(
            "Let me sing a tale of old,\n{lines},\nA story worth its weight in gold."
        ),
        Some(Style::Country) => format!(
            "Well, down the road I heard it said,\n{lines},\nThat's the song that's in my head."
        ),
        None => format!("Here's a little rhyme for you,\n{lines},\nAnd now the song is through!"),
    }
}
