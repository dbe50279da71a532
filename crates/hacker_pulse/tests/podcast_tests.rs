mod mocks;

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use hacker_pulse::{
    audio::{AssembleError, AudioAssembler, FrameConcatMerger},
    cost::CostTracker,
    rate_limit::FixedInterval,
    text::{build_chunks, chunk_transcript, segment},
    tts::RateLimited,
    voice::{Alternating, Fixed},
    PodcastGenerator,
};
use mocks::synthesizer::{mock_audio, MockSynthesizer, PRICE_PER_MILLION_CHARS};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const THREE_SENTENCES: &str = "First sentence here. Second sentence here. Third sentence here.";

struct Scratch {
    dir: TempDir,
}

impl Scratch {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("work")).unwrap();
        std::fs::create_dir(dir.path().join("out")).unwrap();
        Self { dir }
    }

    fn work(&self) -> PathBuf {
        self.dir.path().join("work")
    }

    fn out(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    fn write_transcript(&self, text: &str) -> PathBuf {
        let path = self.dir.path().join("episode.txt");
        std::fs::write(&path, text).unwrap();
        path
    }

    fn assembler<S>(&self, synthesizer: S) -> AudioAssembler<S, FrameConcatMerger>
    where
        S: hacker_pulse::tts::SpeechSynthesizer,
    {
        AudioAssembler::new(synthesizer, FrameConcatMerger).with_workdir_root(self.work())
    }
}

fn dir_entries(path: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(path)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect()
}

// ─── Happy path ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_alternating_voices_follow_chunk_order() {
    let scratch = Scratch::new();
    let input = scratch.write_transcript(THREE_SENTENCES);
    let output = scratch.out().join("episode.mp3");

    let synthesizer = MockSynthesizer::new(25);
    let calls = synthesizer.calls.clone();
    let generator = PodcastGenerator::new(scratch.assembler(synthesizer.clone()));
    let policy = Alternating::new("primary", "secondary").unwrap();
    let mut costs = CostTracker::new();

    let report = generator
        .generate(&input, Some(&output), &policy, &mut costs)
        .await
        .expect("generation should succeed");

    assert_eq!(report.chunk_count, 3);
    assert_eq!(report.synthesized_chunks, 3);
    assert!(report.skipped_chunks.is_empty());
    assert_eq!(
        report
            .voices
            .iter()
            .map(|v| v.voice_id.as_str())
            .collect::<Vec<_>>(),
        ["primary", "secondary", "primary"]
    );
    assert_eq!(synthesizer.voices(), ["primary", "secondary", "primary"]);

    let texts = calls
        .lock()
        .unwrap()
        .iter()
        .map(|(t, _)| t.clone())
        .collect::<Vec<_>>();
    assert_eq!(
        texts,
        [
            "First sentence here.",
            "Second sentence here.",
            "Third sentence here."
        ]
    );

    // Frames land in the output in chunk order
    let expected = texts.iter().flat_map(|t| mock_audio(t)).collect::<Vec<_>>();
    assert_eq!(std::fs::read(&output).unwrap(), expected);

    assert!(dir_entries(&scratch.work()).is_empty(), "working area should be removed");
    assert_eq!(dir_entries(&scratch.out()), [output]);
}

#[tokio::test]
async fn test_default_output_path_and_costs() {
    let scratch = Scratch::new();
    let input = scratch.write_transcript(THREE_SENTENCES);

    let generator = PodcastGenerator::new(scratch.assembler(MockSynthesizer::new(1000)));
    let mut costs = CostTracker::new();

    let report = generator
        .generate(&input, None, &Fixed::new("onyx").unwrap(), &mut costs)
        .await
        .unwrap();

    assert_eq!(report.output_path, input.with_extension("mp3"));
    assert!(report.output_path.exists());
    assert_eq!(report.chunk_count, 1);

    let characters = THREE_SENTENCES.chars().count() as u64;
    assert_eq!(report.characters, characters);
    let expected_cost = characters as f64 / 1_000_000.0 * PRICE_PER_MILLION_CHARS;
    assert!((report.cost - expected_cost).abs() < 1e-12);
    assert!((costs.total() - expected_cost).abs() < 1e-12);
    assert_eq!(costs.entries().len(), 1);
}

#[tokio::test]
async fn test_chunk_limit_override() {
    let scratch = Scratch::new();
    let input = scratch.write_transcript(THREE_SENTENCES);

    let generator = PodcastGenerator::new(scratch.assembler(MockSynthesizer::new(1000)))
        .with_max_chunk_chars(Some(45));
    assert_eq!(generator.chunk_limit(), 45);

    let report = generator
        .generate(&input, None, &Fixed::new("onyx").unwrap(), &mut CostTracker::new())
        .await
        .unwrap();

    // "First sentence here. Second sentence here." is 42 characters
    assert_eq!(report.chunk_count, 2);
}

// ─── Failures ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_failure_on_middle_chunk_leaves_nothing_behind() {
    let scratch = Scratch::new();
    let input = scratch.write_transcript(THREE_SENTENCES);
    let output = scratch.out().join("episode.mp3");

    let synthesizer = MockSynthesizer::failing_on_call(25, 1);
    let calls = synthesizer.calls.clone();
    let generator = PodcastGenerator::new(scratch.assembler(synthesizer));
    let mut costs = CostTracker::new();

    let err = generator
        .generate(&input, Some(&output), &Fixed::new("echo").unwrap(), &mut costs)
        .await
        .unwrap_err();

    assert!(
        matches!(
            err,
            AssembleError::Synthesis {
                chunk_index: 1,
                ref source
            } if source.status() == Some(500)
        ),
        "unexpected error: {err:?}"
    );
    assert_eq!(calls.lock().unwrap().len(), 2, "no call after the failure");
    assert!(!output.exists());
    assert!(dir_entries(&scratch.out()).is_empty(), "no partial output file");
    assert!(dir_entries(&scratch.work()).is_empty(), "working area should be removed");
    // The first chunk was billed before the failure
    assert_eq!(costs.entries().len(), 1);
}

#[tokio::test]
async fn test_oversized_chunk_is_skipped() {
    let scratch = Scratch::new();
    let input = scratch.write_transcript(
        "Hello world. This is a test sentence that is quite long indeed. Bye now.",
    );
    let output = scratch.out().join("episode.mp3");

    let synthesizer = MockSynthesizer::new(30);
    let generator = PodcastGenerator::new(scratch.assembler(synthesizer));

    let report = generator
        .generate(&input, Some(&output), &Fixed::new("echo").unwrap(), &mut CostTracker::new())
        .await
        .unwrap();

    assert_eq!(report.chunk_count, 3);
    assert_eq!(report.skipped_chunks, [1]);
    assert_eq!(report.synthesized_chunks, 2);
    assert_eq!(
        std::fs::read(&output).unwrap(),
        [mock_audio("Hello world."), mock_audio("Bye now.")].concat()
    );
    assert!(dir_entries(&scratch.work()).is_empty());
}

// "First long..." and "Other long..." are 28 characters, the last two sentences 10 each
const LONG_AND_SHORT: &str =
    "First long sentence goes on. Other long sentence goes on. Short one. Tiny tail.";

#[tokio::test]
async fn test_chunk_limit_is_capped_at_provider_limit() {
    let scratch = Scratch::new();
    let input = scratch.write_transcript(LONG_AND_SHORT);
    let output = scratch.out().join("episode.mp3");

    let generator = PodcastGenerator::new(scratch.assembler(MockSynthesizer::new(30)))
        .with_max_chunk_chars(Some(50));
    assert_eq!(generator.chunk_limit(), 30);

    let report = generator
        .generate(&input, Some(&output), &Fixed::new("echo").unwrap(), &mut CostTracker::new())
        .await
        .unwrap();

    assert_eq!(report.chunk_count, 3);
    assert!(report.skipped_chunks.is_empty());
    assert_eq!(
        std::fs::read(&output).unwrap(),
        [
            mock_audio("First long sentence goes on."),
            mock_audio("Other long sentence goes on."),
            mock_audio("Short one. Tiny tail."),
        ]
        .concat()
    );
}

#[tokio::test]
async fn test_rejected_packed_chunk_aborts() {
    let scratch = Scratch::new();
    let output = scratch.out().join("episode.mp3");

    // Built above what the provider accepts: the second chunk packs three sentences
    let chunks = chunk_transcript(LONG_AND_SHORT, 50);
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[1].unit_count, 3);

    let err = scratch
        .assembler(MockSynthesizer::new(30))
        .assemble(&chunks, 50, &Fixed::new("echo").unwrap(), &output, &mut CostTracker::new())
        .await
        .unwrap_err();

    assert!(
        matches!(
            err,
            AssembleError::Synthesis { chunk_index: 1, ref source } if source.status() == Some(400)
        ),
        "unexpected error: {err:?}"
    );
    assert!(!output.exists());
    assert!(dir_entries(&scratch.work()).is_empty());
}

#[tokio::test]
async fn test_lone_unit_over_chunk_limit_is_skipped() {
    let scratch = Scratch::new();
    let output = scratch.out().join("episode.mp3");

    let chunks = chunk_transcript("First long sentence goes on. Short one.", 20);
    assert_eq!(chunks.len(), 2);

    let report = scratch
        .assembler(MockSynthesizer::failing_on_call(1000, 0))
        .assemble(&chunks, 20, &Fixed::new("echo").unwrap(), &output, &mut CostTracker::new())
        .await
        .unwrap();

    assert_eq!(report.skipped_chunks, [0]);
    assert_eq!(std::fs::read(&output).unwrap(), mock_audio("Short one."));
}

#[tokio::test]
async fn test_everything_skipped_is_an_error() {
    let scratch = Scratch::new();
    let input = scratch.write_transcript("This single sentence is far longer than ten characters.");
    let output = scratch.out().join("episode.mp3");

    let generator = PodcastGenerator::new(scratch.assembler(MockSynthesizer::new(10)));

    let err = generator
        .generate(&input, Some(&output), &Fixed::new("echo").unwrap(), &mut CostTracker::new())
        .await
        .unwrap_err();

    assert!(matches!(err, AssembleError::NothingSynthesized));
    assert!(!output.exists());
    assert!(dir_entries(&scratch.work()).is_empty());
}

#[tokio::test]
async fn test_empty_transcript() {
    let scratch = Scratch::new();
    let input = scratch.write_transcript("   \n\t ");

    let generator = PodcastGenerator::new(scratch.assembler(MockSynthesizer::new(100)));
    let err = generator
        .generate(&input, None, &Fixed::new("echo").unwrap(), &mut CostTracker::new())
        .await
        .unwrap_err();

    assert!(matches!(err, AssembleError::EmptyTranscript));
}

#[tokio::test]
async fn test_missing_transcript() {
    let scratch = Scratch::new();
    let missing = scratch.dir.path().join("nope.txt");

    let generator = PodcastGenerator::new(scratch.assembler(MockSynthesizer::new(100)));
    let err = generator
        .generate(&missing, None, &Fixed::new("echo").unwrap(), &mut CostTracker::new())
        .await
        .unwrap_err();

    assert!(matches!(err, AssembleError::Input { ref path, .. } if path == &missing));
    assert!(err.to_string().starts_with("[assemble]"));
}

#[tokio::test]
async fn test_missing_workdir_root() {
    let scratch = Scratch::new();
    let chunks = chunk_transcript(THREE_SENTENCES, 100);

    let assembler = AudioAssembler::new(MockSynthesizer::new(100), FrameConcatMerger)
        .with_workdir_root(scratch.dir.path().join("does-not-exist"));
    let err = assembler
        .assemble(
            &chunks,
            100,
            &Fixed::new("echo").unwrap(),
            &scratch.out().join("episode.mp3"),
            &mut CostTracker::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AssembleError::Workspace { .. }));
}

// ─── Cancellation ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_cancelled_before_start() {
    let scratch = Scratch::new();
    let chunks = chunk_transcript(THREE_SENTENCES, 25);
    let token = CancellationToken::new();
    token.cancel();

    let synthesizer = MockSynthesizer::new(25);
    let calls = synthesizer.calls.clone();
    let assembler = scratch.assembler(synthesizer).with_cancellation(token);

    let err = assembler
        .assemble(
            &chunks,
            25,
            &Fixed::new("echo").unwrap(),
            &scratch.out().join("episode.mp3"),
            &mut CostTracker::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AssembleError::Cancelled { chunk_index: 0 }));
    assert!(calls.lock().unwrap().is_empty());
    assert!(dir_entries(&scratch.work()).is_empty());
}

#[tokio::test]
async fn test_cancelled_mid_run() {
    let scratch = Scratch::new();
    let chunks = chunk_transcript(THREE_SENTENCES, 25);
    let token = CancellationToken::new();

    let synthesizer = MockSynthesizer::cancelling_after(25, 1, token.clone());
    let calls = synthesizer.calls.clone();
    let assembler = scratch.assembler(synthesizer).with_cancellation(token);
    let output = scratch.out().join("episode.mp3");

    let err = assembler
        .assemble(&chunks, 25, &Fixed::new("echo").unwrap(), &output, &mut CostTracker::new())
        .await
        .unwrap_err();

    assert!(matches!(err, AssembleError::Cancelled { chunk_index: 1 }));
    assert_eq!(calls.lock().unwrap().len(), 1);
    assert!(!output.exists());
    assert!(dir_entries(&scratch.work()).is_empty());
}

// ─── Pacing ──────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_synthesis_calls_are_paced() {
    let scratch = Scratch::new();
    let units = segment(THREE_SENTENCES).collect::<Vec<_>>();
    let chunks = build_chunks(units, 25);
    assert_eq!(chunks.len(), 3);

    let interval = Duration::from_millis(1000);
    let synthesizer = RateLimited::new(MockSynthesizer::new(25), FixedInterval::new(interval));
    let assembler = scratch.assembler(synthesizer);

    let start = tokio::time::Instant::now();
    assembler
        .assemble(
            &chunks,
            25,
            &Alternating::new("a", "b").unwrap(),
            &scratch.out().join("episode.mp3"),
            &mut CostTracker::new(),
        )
        .await
        .unwrap();

    assert!(start.elapsed() >= interval * 2);
}
