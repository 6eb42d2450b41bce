//! Transform pipeline orchestration.
//!
//! Sequences extraction, rhyme generation, audio synthesis and the
//! history save for one page, reporting progress to a status listener.
//! Only one transform runs at a time; an overlapping request is refused
//! with [`Error::Busy`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, instrument, warn};

use crate::audio::AudioGenerator;
use crate::domain::{
    AudioResult, ExtractedContent, GenerationOptions, HistoryItem, RhymeResult, VoiceOptions,
};
use crate::error::{Error, Result};
use crate::extract::ContentExtractor;
use crate::generate::RhymeGenerator;
use crate::store::HistoryStore;

/// Pipeline stage reported to the status listener
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extracting,
    Generating,
    Synthesizing,
    Saving,
    Done,
}

impl Stage {
    pub fn message(&self) -> &'static str {
        match self {
            Stage::Extracting => "Extracting page content...",
            Stage::Generating => "Writing your song...",
            Stage::Synthesizing => "Generating audio...",
            Stage::Saving => "Saving to history...",
            Stage::Done => "Done!",
        }
    }
}

pub type StatusListener = Arc<dyn Fn(Stage) + Send + Sync>;

/// One page to transform
#[derive(Debug, Clone)]
pub struct TransformRequest {
    pub html: String,
    pub url: String,
    /// An empty title is replaced with the page title
    pub options: GenerationOptions,
    pub voice: VoiceOptions,
    pub with_audio: bool,
}

impl TransformRequest {
    pub fn new(html: impl Into<String>, url: impl Into<String>, options: GenerationOptions) -> Self {
        Self {
            html: html.into(),
            url: url.into(),
            options,
            voice: VoiceOptions::default(),
            with_audio: true,
        }
    }

    pub fn with_voice(mut self, voice: VoiceOptions) -> Self {
        self.voice = voice;
        self
    }

    pub fn without_audio(mut self) -> Self {
        self.with_audio = false;
        self
    }
}

/// Everything one transform produced
#[derive(Debug, Clone)]
pub struct TransformOutcome {
    pub content: ExtractedContent,
    pub rhyme: RhymeResult,
    pub audio: Option<AudioResult>,
    /// Saved history entry, if the save succeeded
    pub history_item: Option<HistoryItem>,
    /// Non-fatal problems (fallback rhyme, audio skipped, history not saved)
    pub notices: Vec<String>,
    pub elapsed_ms: u64,
}

/// Clears the processing flag when the transform ends
struct ProcessingGuard<'a>(&'a AtomicBool);

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Main transform orchestrator
pub struct Orchestrator {
    extractor: ContentExtractor,
    generator: Arc<RhymeGenerator>,
    audio: Option<Arc<AudioGenerator>>,
    history: HistoryStore,
    processing: AtomicBool,
    listener: Option<StatusListener>,
}

impl Orchestrator {
    pub fn new(generator: Arc<RhymeGenerator>, history: HistoryStore) -> Self {
        Self {
            extractor: ContentExtractor::new(),
            generator,
            audio: None,
            history,
            processing: AtomicBool::new(false),
            listener: None,
        }
    }

    pub fn with_audio(mut self, audio: Arc<AudioGenerator>) -> Self {
        self.audio = Some(audio);
        self
    }

    pub fn with_status_listener(mut self, listener: StatusListener) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn extractor(&self) -> &ContentExtractor {
        &self.extractor
    }

    pub fn generator(&self) -> Arc<RhymeGenerator> {
        Arc::clone(&self.generator)
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::SeqCst)
    }

    fn report(&self, stage: Stage) {
        if let Some(listener) = &self.listener {
            listener(stage);
        }
    }

    /// Run extraction, generation, audio and history save for one page.
    ///
    /// Only `Error::Busy` is returned as an error. Generation failures come
    /// back as a fallback rhyme, audio and history failures as notices.
    #[instrument(skip(self, request), fields(url = %request.url, style = %request.options.style))]
    pub async fn transform(&self, request: TransformRequest) -> Result<TransformOutcome> {
        if self
            .processing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("Transform already in progress");
            return Err(Error::Busy);
        }
        let _guard = ProcessingGuard(&self.processing);

        let started = Instant::now();
        let mut notices = Vec::new();

        self.report(Stage::Extracting);
        let content = self.extractor.extract(&request.html, &request.url);
        info!(words = content.word_count, title = %content.title, "Content extracted");

        let mut options = request.options;
        if options.title.trim().is_empty() {
            options.title = content.title.clone();
        }

        self.report(Stage::Generating);
        let rhyme = self.generator.transform(&content.content, &options).await;
        if let Some(error) = &rhyme.error {
            notices.push(format!("Using a fallback rhyme: {}", error));
        }

        let audio = match (&self.audio, request.with_audio) {
            (Some(generator), true) => {
                self.report(Stage::Synthesizing);
                match generator
                    .generate_audio(rhyme.text(), options.style, request.voice)
                    .await
                {
                    Ok(result) => Some(result),
                    Err(e) => {
                        warn!(error = %e, "Audio generation failed");
                        notices.push(format!("Audio unavailable: {}", e));
                        None
                    }
                }
            }
            _ => None,
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;

        self.report(Stage::Saving);
        let item = HistoryItem::new(
            rhyme.text(),
            content.title.clone(),
            content.url.clone(),
            options,
            elapsed_ms,
        );
        let history_item = match self.history.save(item.clone()).await {
            Ok(()) => Some(item),
            Err(e) => {
                warn!(error = %e, "Failed to save history");
                notices.push(format!("History not saved: {}", e));
                None
            }
        };

        self.report(Stage::Done);
        info!(
            success = rhyme.success,
            audio = audio.is_some(),
            elapsed_ms,
            "Transform complete"
        );

        Ok(TransformOutcome {
            content,
            rhyme,
            audio,
            history_item,
            notices,
            elapsed_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{RhymeRequest, TextBackend};
    use crate::audio::{LocalSynthesis, SpeechBackend};
    use crate::audio::local::tests::{CaptureMode, FakePlatform};
    use crate::domain::{AudioService, Style};
    use crate::generate::RetryPolicy;
    use crate::store::MemoryStorage;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    const PAGE: &str = r#"<html><head><title>Foxes</title></head><body>
        <article><p>The quick brown fox jumps over the lazy dog. It was a sunny day.</p></article>
        </body></html>"#;

    struct SlowBackend {
        reply: Result<String>,
        delay: Duration,
    }

    #[async_trait]
    impl TextBackend for SlowBackend {
        fn name(&self) -> &str {
            "slow"
        }

        async fn generate(&self, _request: &RhymeRequest) -> Result<String> {
            tokio::time::sleep(self.delay).await;
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(_) => Err(Error::Network("unreachable".into())),
            }
        }

        async fn health_check(&self) -> Result<()> {
            Ok(())
        }
    }

    fn orchestrator(reply: Result<String>, delay: Duration) -> Orchestrator {
        let backend = Arc::new(SlowBackend { reply, delay });
        let generator = RhymeGenerator::new(backend).with_retry_policy(RetryPolicy::immediate(3));
        let history = HistoryStore::new(Arc::new(MemoryStorage::new()));
        Orchestrator::new(Arc::new(generator), history)
    }

    #[tokio::test]
    async fn test_full_sequence() {
        let stages = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&stages);

        let local: Arc<dyn SpeechBackend> =
            Arc::new(LocalSynthesis::new(Arc::new(FakePlatform::new(CaptureMode::Clip))));
        let audio = Arc::new(AudioGenerator::new(local.clone(), local));

        let orchestrator = orchestrator(Ok("A fox song".into()), Duration::ZERO)
            .with_audio(audio)
            .with_status_listener(Arc::new(move |stage| seen.lock().unwrap().push(stage)));

        let request = TransformRequest::new(PAGE, "https://example.com/fox", GenerationOptions::default());
        let outcome = orchestrator.transform(request).await.unwrap();

        assert!(outcome.rhyme.success);
        assert_eq!(outcome.rhyme.text(), "A fox song");
        assert_eq!(outcome.audio.unwrap().service, AudioService::Browser);
        assert!(outcome.notices.is_empty());
        assert_eq!(outcome.history_item.unwrap().title, "Foxes");
        assert_eq!(
            *stages.lock().unwrap(),
            vec![
                Stage::Extracting,
                Stage::Generating,
                Stage::Synthesizing,
                Stage::Saving,
                Stage::Done
            ]
        );

        let saved = orchestrator.history().list().await.unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].settings.title, "Foxes");
        assert!(!orchestrator.is_processing());
    }

    #[tokio::test]
    async fn test_generation_failure_saves_fallback() {
        let orchestrator = orchestrator(Err(Error::Busy), Duration::ZERO);
        let options = GenerationOptions::default().with_title("Custom");
        let request = TransformRequest::new(PAGE, "https://example.com", options).without_audio();

        let outcome = orchestrator.transform(request).await.unwrap();
        assert!(!outcome.rhyme.success);
        assert!(outcome.audio.is_none());
        assert_eq!(outcome.notices.len(), 1);

        let saved = orchestrator.history().list().await.unwrap();
        assert_eq!(saved[0].rhyme, outcome.rhyme.fallback.unwrap());
        assert_eq!(saved[0].settings.title, "Custom");
    }

    #[tokio::test]
    async fn test_audio_failure_is_a_notice() {
        struct Broken;

        #[async_trait]
        impl SpeechBackend for Broken {
            fn service(&self) -> AudioService {
                AudioService::Browser
            }

            async fn synthesize(&self, _: &str, _: Style, _: &VoiceOptions) -> Result<AudioResult> {
                Err(Error::Unsupported("no speech engine".into()))
            }
        }

        let broken: Arc<dyn SpeechBackend> = Arc::new(Broken);
        let orchestrator = orchestrator(Ok("verse".into()), Duration::ZERO)
            .with_audio(Arc::new(AudioGenerator::new(broken.clone(), broken)));

        let request = TransformRequest::new(PAGE, "https://example.com", GenerationOptions::default());
        let outcome = orchestrator.transform(request).await.unwrap();

        assert!(outcome.rhyme.success);
        assert!(outcome.audio.is_none());
        assert!(outcome.notices[0].contains("no speech engine"));
        assert!(outcome.history_item.is_some());
    }

    #[tokio::test]
    async fn test_overlapping_transform_is_refused() {
        let orchestrator = Arc::new(orchestrator(Ok("verse".into()), Duration::from_millis(200)));

        let first = {
            let orchestrator = Arc::clone(&orchestrator);
            tokio::spawn(async move {
                let request = TransformRequest::new(PAGE, "https://a", GenerationOptions::default());
                orchestrator.transform(request).await
            })
        };

        // Let the first transform reach the backend
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(orchestrator.is_processing());

        let request = TransformRequest::new(PAGE, "https://b", GenerationOptions::default());
        let err = orchestrator.transform(request).await.unwrap_err();
        assert!(matches!(err, Error::Busy));

        assert!(first.await.unwrap().is_ok());
        assert!(!orchestrator.is_processing());
    }
}
