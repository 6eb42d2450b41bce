//! Prompt construction: style, length and tone tables.

use crate::domain::{GenerationOptions, Length, Style, Tone};

/// Characters of page content embedded in a prompt
pub const MAX_PROMPT_CONTENT_CHARS: usize = 2500;

/// How a style should sound
#[derive(Debug, Clone, Copy)]
pub struct StyleProfile {
    pub rhythm: &'static str,
    pub rhyme_scheme: &'static str,
    pub language: &'static str,
    pub structure: &'static str,
    pub examples: &'static str,
}

pub fn style_profile(style: Style) -> StyleProfile {
    match style {
        Style::Rap => StyleProfile {
            rhythm: "strong beat with punchy flow",
            rhyme_scheme: "AABB with internal rhymes",
            language: "clever wordplay, punchlines and confident delivery",
            structure: "verses with a repeated hook",
            examples: "Eminem, Kendrick Lamar",
        },
        Style::Pop => StyleProfile {
            rhythm: "catchy, upbeat tempo",
            rhyme_scheme: "ABAB or AABA",
            language: "simple, relatable words with a memorable hook",
            structure: "verse-chorus-verse",
            examples: "Taylor Swift, Ed Sheeran",
        },
        Style::Nursery => StyleProfile {
            rhythm: "simple, bouncy, sing-song",
            rhyme_scheme: "AABB",
            language: "easy words a child would understand",
            structure: "short repetitive verses",
            examples: "Mother Goose, Dr. Seuss",
        },
        Style::Ballad => StyleProfile {
            rhythm: "slow, flowing, emotional",
            rhyme_scheme: "ABCB",
            language: "poetic imagery and heartfelt storytelling",
            structure: "narrative verses building to a final refrain",
            examples: "Adele, Elton John",
        },
        Style::Country => StyleProfile {
            rhythm: "steady, storytelling groove",
            rhyme_scheme: "ABAB or AABB",
            language: "down-home, plainspoken and sincere",
            structure: "verse-chorus with a story arc",
            examples: "Johnny Cash, Dolly Parton",
        },
    }
}

/// Target size for a length tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthPlan {
    pub lines: u32,
    pub verses: u32,
}

pub fn length_plan(length: Length) -> LengthPlan {
    match length {
        Length::Short => LengthPlan { lines: 8, verses: 2 },
        Length::Medium => LengthPlan { lines: 16, verses: 3 },
        Length::Long => LengthPlan { lines: 24, verses: 4 },
    }
}

pub fn tone_adjective(tone: Tone) -> &'static str {
    match tone {
        Tone::Fun => "playful and entertaining",
        Tone::Educational => "informative and clear",
        Tone::Humorous => "witty and funny",
        Tone::Dramatic => "intense and emotional",
        Tone::Chill => "relaxed and laid-back",
    }
}

fn truncate(content: &str, max_chars: usize) -> &str {
    match content.char_indices().nth(max_chars) {
        Some((idx, _)) => &content[..idx],
        None => content,
    }
}

/// Render the full prompt for a generation request
pub fn build_prompt(content: &str, options: &GenerationOptions) -> String {
    let profile = style_profile(options.style);
    let size = length_plan(options.length);
    let tone = tone_adjective(options.tone);
    let content = truncate(content.trim(), MAX_PROMPT_CONTENT_CHARS);

    let mut requirements = vec![
        format!("Style: {} - {}", options.style, profile.rhythm),
        format!("Rhyme scheme: {}", profile.rhyme_scheme),
        format!("Language: {}", profile.language),
        format!("Structure: {}", profile.structure),
        format!(
            "Length: about {} lines across {} verses",
            size.lines, size.verses
        ),
        format!("Tone: {}", tone),
        "Keep the key facts and ideas from the content".to_string(),
        format!("Take inspiration from artists like {}", profile.examples),
    ];

    let custom = options.custom_instructions.trim();
    if !custom.is_empty() {
        requirements.push(format!("Additional instructions: {}", custom));
    }

    let mut prompt = format!(
        "Transform the following content into a {} {} song.\n\n",
        tone, options.style
    );

    let title = options.title.trim();
    if !title.is_empty() {
        prompt.push_str(&format!("Title: {}\n\n", title));
    }

    prompt.push_str(&format!("Content:\n{}\n\nRequirements:\n", content));
    for (i, requirement) in requirements.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", i + 1, requirement));
    }
    prompt.push_str("\nReturn only the lyrics, with no explanations or commentary.");

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_combination_mentions_tone_and_artists() {
        for style in Style::ALL {
            for length in Length::ALL {
                for tone in Tone::ALL {
                    let options = GenerationOptions::new(style, length, tone);
                    let prompt = build_prompt("Some page text.", &options);

                    assert!(!prompt.is_empty());
                    assert!(prompt.contains(tone_adjective(tone)), "{style}/{length}/{tone}");
                    assert!(prompt.contains(style_profile(style).examples));
                }
            }
        }
    }

    #[test]
    fn test_pop_descriptors() {
        let options = GenerationOptions::new(Style::Pop, Length::Medium, Tone::Fun);
        let prompt = build_prompt("content", &options);

        assert!(prompt.contains("catchy, upbeat tempo"));
        assert!(prompt.contains("ABAB or AABA"));
        assert!(prompt.contains("about 16 lines across 3 verses"));
    }

    #[test]
    fn test_custom_instructions_are_last_requirement() {
        let options = GenerationOptions::default().with_instructions("Mention the moon");
        let prompt = build_prompt("content", &options);

        assert!(prompt.contains("9. Additional instructions: Mention the moon"));
        assert!(!prompt.contains("10."));
    }

    #[test]
    fn test_no_custom_instructions() {
        let prompt = build_prompt("content", &GenerationOptions::default());
        assert!(!prompt.contains("Additional instructions"));
        assert!(!prompt.contains("9."));
    }

    #[test]
    fn test_content_truncated() {
        let long = "z".repeat(MAX_PROMPT_CONTENT_CHARS + 500);
        let prompt = build_prompt(&long, &GenerationOptions::default());
        assert_eq!(
            prompt.chars().filter(|c| *c == 'z').count(),
            MAX_PROMPT_CONTENT_CHARS
        );
    }

    #[test]
    fn test_title_included() {
        let options = GenerationOptions::default().with_title("Fox News");
        assert!(build_prompt("c", &options).contains("Title: Fox News"));
    }
}
