//! End-to-End Integration Tests
//!
//! A page goes through extraction, generation, audio and history.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pagesong::adapters::{RhymeRequest, TextBackend};
use pagesong::audio::{AudioGenerator, SpeechBackend};
use pagesong::core::{Orchestrator, Stage, TransformRequest};
use pagesong::domain::{
    AudioClip, AudioResult, AudioService, GenerationOptions, Length, Style, Tone, VoiceOptions,
};
use pagesong::generate::{RetryPolicy, RhymeGenerator};
use pagesong::store::{HistoryStore, MemoryStorage};
use pagesong::{Error, Result};

const FOX_PAGE: &str = r#"<html>
<head><title>The Fox</title></head>
<body>
  <nav><a href="/">Home</a></nav>
  <article><p>The quick brown fox jumps over the lazy dog. It was a sunny day.</p></article>
  <footer>All rights reserved</footer>
</body>
</html>"#;

/// Records prompts; fails the first `failures` calls
struct ScriptedBackend {
    failures: usize,
    reply: &'static str,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    fn new(failures: usize, reply: &'static str) -> Arc<Self> {
        Arc::new(Self {
            failures,
            reply,
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl TextBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: &RhymeRequest) -> Result<String> {
        let mut prompts = self.prompts.lock().unwrap();
        prompts.push(request.prompt.clone());
        if prompts.len() <= self.failures {
            return Err(Error::Network("connection reset".into()));
        }
        Ok(self.reply.to_string())
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

struct ClipSpeech;

#[async_trait]
impl SpeechBackend for ClipSpeech {
    fn service(&self) -> AudioService {
        AudioService::Browser
    }

    async fn synthesize(&self, text: &str, _style: Style, _options: &VoiceOptions) -> Result<AudioResult> {
        Ok(AudioResult::clip(
            AudioService::Browser,
            AudioClip::new(text.as_bytes().to_vec(), "audio/wav"),
            "test-voice",
            2.0,
        ))
    }
}

fn pop_medium_fun() -> GenerationOptions {
    GenerationOptions::new(Style::Pop, Length::Medium, Tone::Fun)
}

fn orchestrator(backend: Arc<ScriptedBackend>, history: HistoryStore) -> Orchestrator {
    let generator = RhymeGenerator::new(backend).with_retry_policy(RetryPolicy::immediate(3));
    let speech: Arc<dyn SpeechBackend> = Arc::new(ClipSpeech);
    Orchestrator::new(Arc::new(generator), history)
        .with_audio(Arc::new(AudioGenerator::new(speech.clone(), speech)))
}

#[tokio::test]
async fn test_fox_page_pop_medium_fun() {
    let backend = ScriptedBackend::new(0, "Here's a pop song:\nThe fox is quick, the dog is slow");
    let history = HistoryStore::new(Arc::new(MemoryStorage::new()));
    let stages = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&stages);

    let orchestrator = orchestrator(Arc::clone(&backend), history.clone())
        .with_status_listener(Arc::new(move |stage| seen.lock().unwrap().push(stage)));

    let request = TransformRequest::new(FOX_PAGE, "https://example.com/fox", pop_medium_fun());
    let outcome = orchestrator.transform(request).await.unwrap();

    assert_eq!(
        outcome.content.content,
        "The quick brown fox jumps over the lazy dog. It was a sunny day."
    );
    assert_eq!(outcome.content.title, "The Fox");

    let prompt = backend.prompts.lock().unwrap()[0].clone();
    assert!(prompt.contains("catchy, upbeat tempo"));
    assert!(prompt.contains("ABAB or AABA"));
    assert!(prompt.contains("playful and entertaining"));
    assert!(prompt.contains("Title: The Fox"));
    assert!(prompt.contains("The quick brown fox jumps over the lazy dog."));

    assert!(outcome.rhyme.success);
    assert_eq!(outcome.rhyme.text(), "The fox is quick, the dog is slow");
    assert_eq!(outcome.audio.as_ref().unwrap().voice, "test-voice");
    assert!(outcome.notices.is_empty());

    let saved = history.list().await.unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].rhyme, "The fox is quick, the dog is slow");
    assert_eq!(saved[0].url, "https://example.com/fox");
    assert_eq!(saved[0].settings.style, Style::Pop);

    assert_eq!(stages.lock().unwrap().last(), Some(&Stage::Done));
}

#[tokio::test]
async fn test_fox_page_recovers_after_two_failures() {
    let backend = ScriptedBackend::new(2, "Third time lucky");
    let history = HistoryStore::new(Arc::new(MemoryStorage::new()));
    let orchestrator = orchestrator(Arc::clone(&backend), history);

    let request = TransformRequest::new(FOX_PAGE, "https://example.com/fox", pop_medium_fun());
    let outcome = orchestrator.transform(request).await.unwrap();

    assert_eq!(backend.calls(), 3);
    assert!(outcome.rhyme.success);
    assert_eq!(outcome.rhyme.text(), "Third time lucky");
}

#[tokio::test]
async fn test_fox_page_fallback_when_backend_is_down() {
    let backend = ScriptedBackend::new(usize::MAX, "never");
    let history = HistoryStore::new(Arc::new(MemoryStorage::new()));
    let orchestrator = orchestrator(Arc::clone(&backend), history.clone());

    let request = TransformRequest::new(FOX_PAGE, "https://example.com/fox", pop_medium_fun());
    let outcome = orchestrator.transform(request).await.unwrap();

    assert_eq!(backend.calls(), 3);
    assert!(!outcome.rhyme.success);
    assert_eq!(
        outcome.rhyme.text(),
        "Oh-oh, here's a song for you,\n\
         The quick brown fox jumps over the lazy dog,\n\
         It was a sunny day,\n\
         Sing it loud, the whole day through!"
    );
    assert_eq!(outcome.notices.len(), 1);

    // Audio and history use the fallback text
    let audio = outcome.audio.unwrap();
    assert_eq!(audio.service, AudioService::Browser);
    assert_eq!(history.list().await.unwrap()[0].rhyme, outcome.rhyme.text());
}
