// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Integration tests: boot, trigger, generate, re-arm.
//!
//! A scripted engine stands in for the model so each test controls
//! exactly what a run does: succeed, fail, panic, or press the button
//! while it is busy. One test at the end drives the real llama2 engine.

use board_io::{BoardError, HostButton, Indicators, InterruptSource, Led, WakeToken};
use lifecycle::{
    DeviceConfig, DeviceController, LifecycleError, LoadStage, Phase, RunOutcome,
};
use std::collections::VecDeque;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use story_engine::llama2::UnigramEngine;
use story_engine::{EngineError, GenerationOutcome, InferenceEngine, ModelSpec, SamplerParams};
use tokio::time::timeout;

// ── Helpers ────────────────────────────────────────────────────

/// Tokens every successful scripted run produces.
const STUB_TOKENS: usize = 5;
/// Throughput every successful scripted run reports.
const STUB_TOKENS_PER_SECOND: f64 = 20.0;

#[derive(Debug, Clone, Copy)]
enum Step {
    Succeed,
    Fail,
    Panic,
}

/// Shared view into a [`StubEngine`] after it has been moved into a device.
#[derive(Clone, Default)]
struct StubHandle {
    /// `(prompt, max_steps)` of every generate call.
    calls: Arc<Mutex<Vec<(String, usize)>>>,
    script: Arc<Mutex<VecDeque<Step>>>,
    /// Signalled this many times from inside each generate call.
    press_during_run: Arc<Mutex<Option<(WakeToken, usize)>>>,
    /// LED state observed from inside each generate call.
    leds_during_run: Arc<Mutex<Vec<(Option<bool>, Option<bool>)>>>,
    leds: Option<RecordingIndicators>,
}

impl StubHandle {
    fn calls(&self) -> Vec<(String, usize)> {
        self.calls.lock().unwrap().clone()
    }

    fn script(&self, steps: &[Step]) {
        self.script.lock().unwrap().extend(steps.iter().copied());
    }
}

/// Engine whose checkpoint is the text `"<vocab> <seq_len>"`.
struct StubEngine {
    handle: StubHandle,
}

impl InferenceEngine for StubEngine {
    type Model = ModelSpec;
    type Tokenizer = ();
    type Sampler = u64;

    fn build_transformer(&self, checkpoint: &[u8]) -> Result<ModelSpec, EngineError> {
        let text = String::from_utf8_lossy(checkpoint);
        let mut nums = text.split_whitespace().map(str::parse::<usize>);
        match (nums.next(), nums.next()) {
            (Some(Ok(vocab_size)), Some(Ok(seq_len))) => Ok(ModelSpec { vocab_size, seq_len }),
            _ => Err(EngineError::Internal(format!("bad checkpoint '{text}'"))),
        }
    }

    fn model_spec(&self, model: &ModelSpec) -> ModelSpec {
        *model
    }

    fn build_tokenizer(&self, _vocab: &[u8], _vocab_size: usize) -> Result<(), EngineError> {
        Ok(())
    }

    fn build_sampler(&self, params: SamplerParams) -> u64 {
        params.seed
    }

    fn generate(
        &self,
        _model: &ModelSpec,
        _tokenizer: &(),
        _sampler: &mut u64,
        prompt: &str,
        max_steps: usize,
    ) -> Result<GenerationOutcome, EngineError> {
        self.handle
            .calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), max_steps));

        if let Some(leds) = &self.handle.leds {
            self.handle
                .leds_during_run
                .lock()
                .unwrap()
                .push((leds.get(Led::Status), leds.get(Led::User)));
        }
        if let Some((token, n)) = self.handle.press_during_run.lock().unwrap().as_ref() {
            for _ in 0..*n {
                assert!(!token.signal(), "press during generation must be dropped");
            }
        }

        let step = self
            .handle
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Step::Succeed);
        match step {
            Step::Succeed => Ok(GenerationOutcome {
                tokens_generated: STUB_TOKENS.min(max_steps),
                tokens_per_second: STUB_TOKENS_PER_SECOND,
            }),
            Step::Fail => Err(EngineError::TokenOutOfRange {
                token: 99,
                vocab_size: 4,
            }),
            Step::Panic => panic!("scripted engine panic"),
        }
    }
}

/// Indicators that keep every write, in order.
#[derive(Clone, Default)]
struct RecordingIndicators {
    log: Arc<Mutex<Vec<(Led, bool)>>>,
}

impl RecordingIndicators {
    fn log(&self) -> Vec<(Led, bool)> {
        self.log.lock().unwrap().clone()
    }

    fn get(&self, led: Led) -> Option<bool> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(l, _)| *l == led)
            .map(|&(_, on)| on)
    }

    fn ever_armed(&self) -> bool {
        self.log().contains(&(Led::User, true))
    }
}

impl Indicators for RecordingIndicators {
    fn set(&mut self, led: Led, on: bool) {
        self.log.lock().unwrap().push((led, on));
    }
}

/// Interrupt source that hands its token to the test.
#[derive(Clone, Default)]
struct TokenSource {
    token: Arc<Mutex<Option<WakeToken>>>,
}

impl TokenSource {
    fn token(&self) -> Option<WakeToken> {
        self.token.lock().unwrap().clone()
    }
}

impl InterruptSource for TokenSource {
    fn configure(&mut self, _debounce: Duration, wake: WakeToken) -> Result<(), BoardError> {
        *self.token.lock().unwrap() = Some(wake);
        Ok(())
    }
}

fn temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("lifecycle_integration").join(tag);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Writes a stub checkpoint and tokenizer and returns a config pointing at them.
fn stub_config(tag: &str, checkpoint: &str, max_steps: usize) -> DeviceConfig {
    let dir = temp_dir(tag);
    let model_path = dir.join("model.bin");
    let tokenizer_path = dir.join("tokenizer.bin");
    std::fs::write(&model_path, checkpoint).unwrap();
    std::fs::write(&tokenizer_path, b"tokenizer").unwrap();
    DeviceConfig {
        model_path,
        tokenizer_path,
        max_steps,
        ..Default::default()
    }
}

type StubDevice = DeviceController<StubEngine, RecordingIndicators, TokenSource>;

fn boot_stub(config: DeviceConfig) -> (StubDevice, StubHandle, RecordingIndicators, TokenSource) {
    let leds = RecordingIndicators::default();
    let handle = StubHandle {
        leds: Some(leds.clone()),
        ..Default::default()
    };
    let source = TokenSource::default();
    let engine = StubEngine {
        handle: handle.clone(),
    };
    let device = DeviceController::boot(config, engine, leds.clone(), source.clone()).unwrap();
    (device, handle, leds, source)
}

/// Signals `token` as soon as the control task is parked.
fn press_when_waiting(token: WakeToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while !token.signal() {
            tokio::task::yield_now().await;
        }
    })
}

/// Runs one full cycle, triggering it once the device waits.
async fn trigger_cycle(device: &mut StubDevice) -> lifecycle::GenerationReport {
    let presser = press_when_waiting(device.wake_token());
    let report = timeout(Duration::from_secs(5), device.run_cycle())
        .await
        .expect("cycle never triggered")
        .unwrap();
    presser.await.unwrap();
    report
}

/// Expected LED writes for a sequence of phases.
fn pattern(phases: &[Phase]) -> Vec<(Led, bool)> {
    phases
        .iter()
        .flat_map(|p| {
            let s = p.indicators();
            [(Led::Status, s.busy), (Led::User, s.armed)]
        })
        .collect()
}

// ── Boot ───────────────────────────────────────────────────────

#[test]
fn test_boot_shows_loading_then_armed() {
    let (device, handle, leds, source) = boot_stub(stub_config("boot", "4 8", 256));

    assert_eq!(device.phase(), Phase::Armed);
    assert_eq!(leds.log(), pattern(&[Phase::Loading, Phase::Armed]));
    assert!(source.token().is_some(), "button bound after load");
    assert!(handle.calls().is_empty(), "no generation at boot");
    assert_eq!(device.load_metrics().effective_steps, 8);
}

#[test]
fn test_step_budget_clamped_to_seq_len() {
    for (tag, configured, expected) in [("clamp0", 0, 8), ("clamp3", 3, 3), ("clamp9", 9, 8)] {
        let (device, _, _, _) = boot_stub(stub_config(tag, "4 8", configured));
        assert_eq!(device.model().effective_steps(), expected, "configured {configured}");
    }
}

#[test]
fn test_params_carry_effective_step_budget() {
    for (tag, configured, expected) in [("params0", 0, 8), ("params256", 256, 8), ("params3", 3, 3)] {
        let (device, _, _, _) = boot_stub(stub_config(tag, "4 8", configured));
        assert_eq!(device.params().max_steps, expected, "configured {configured}");
        assert_eq!(device.config().max_steps, configured);
    }
}

#[test]
fn test_load_failure_is_boot_fatal_and_never_arms() {
    let config = stub_config("corrupt", "garbage", 256);
    let leds = RecordingIndicators::default();
    let source = TokenSource::default();
    let engine = StubEngine {
        handle: StubHandle::default(),
    };

    let err = DeviceController::boot(config, engine, leds.clone(), source.clone()).unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::Load {
            stage: LoadStage::Transformer,
            ..
        }
    ));
    assert!(err.is_boot_fatal());
    assert_eq!(leds.log(), pattern(&[Phase::Loading]));
    assert!(!leds.ever_armed());
    assert!(source.token().is_none(), "button must stay unbound");
}

#[test]
fn test_missing_model_is_boot_fatal() {
    let mut config = stub_config("no_model", "4 8", 256);
    config.model_path = PathBuf::from("/nonexistent/model.bin");
    let leds = RecordingIndicators::default();
    let source = TokenSource::default();
    let engine = StubEngine {
        handle: StubHandle::default(),
    };

    let err = DeviceController::boot(config, engine, leds.clone(), source.clone()).unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::Load {
            stage: LoadStage::ModelFile,
            ..
        }
    ));
    assert!(err.is_boot_fatal());
    assert_eq!(leds.log(), pattern(&[Phase::Loading]));
    assert!(!leds.ever_armed());
    assert!(source.token().is_none(), "button must stay unbound");
}

#[test]
fn test_missing_tokenizer_is_boot_fatal() {
    let mut config = stub_config("no_tokenizer", "4 8", 256);
    config.tokenizer_path = PathBuf::from("/nonexistent/tokenizer.bin");
    let leds = RecordingIndicators::default();
    let engine = StubEngine {
        handle: StubHandle::default(),
    };

    let err = DeviceController::boot(config, engine, leds.clone(), TokenSource::default())
        .unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::Load {
            stage: LoadStage::TokenizerFile,
            ..
        }
    ));
    assert!(!leds.ever_armed());
}

#[test]
fn test_invalid_config_rejected_before_load() {
    let mut config = stub_config("bad_config", "4 8", 256);
    config.top_p = 0.0;
    let leds = RecordingIndicators::default();
    let engine = StubEngine {
        handle: StubHandle::default(),
    };

    let err = DeviceController::boot(config, engine, leds.clone(), TokenSource::default())
        .unwrap_err();
    assert!(matches!(err, LifecycleError::Config(_)));
    assert!(!leds.ever_armed());
}

// ── Trigger semantics ──────────────────────────────────────────

#[tokio::test]
async fn test_cycle_runs_with_configured_prompt_and_budget() {
    let mut config = stub_config("prompt", "4 8", 100);
    config.prompt = "Once upon a time".into();
    let (mut device, handle, _, _) = boot_stub(config);

    let report = trigger_cycle(&mut device).await;
    assert!(report.is_success());
    assert_eq!(report.max_steps, 8);
    assert_eq!(handle.calls(), vec![("Once upon a time".to_string(), 8)]);
    assert_eq!(device.phase(), Phase::Armed);
}

#[tokio::test]
async fn test_wait_does_not_complete_without_new_trigger() {
    let (mut device, handle, _, _) = boot_stub(stub_config("idempotent", "4 8", 8));
    trigger_cycle(&mut device).await;

    // A late signal with nobody waiting is dropped.
    assert!(!device.wake_token().signal());
    assert!(timeout(Duration::from_millis(100), device.run_cycle())
        .await
        .is_err());
    assert!(!device.is_waiting());
    assert_eq!(handle.calls().len(), 1);
    assert_eq!(device.phase(), Phase::Armed);
}

#[tokio::test]
async fn test_presses_during_generation_are_lost() {
    let (mut device, handle, _, _) = boot_stub(stub_config("busy_presses", "4 8", 8));
    *handle.press_during_run.lock().unwrap() = Some((device.wake_token(), 3));

    trigger_cycle(&mut device).await;
    assert_eq!(handle.calls().len(), 1);
    assert_eq!(device.latch_stats().dropped, 3);

    // None of the three presses starts a second run.
    assert!(timeout(Duration::from_millis(100), device.run_cycle())
        .await
        .is_err());
    assert_eq!(handle.calls().len(), 1);

    // Exactly one run per fresh trigger afterwards.
    *handle.press_during_run.lock().unwrap() = None;
    trigger_cycle(&mut device).await;
    assert_eq!(handle.calls().len(), 2);
    assert_eq!(device.stats().triggers_handled, 2);
}

#[tokio::test]
async fn test_debounced_button_drives_cycle() {
    let config = stub_config("button", "4 8", 8);
    let button = HostButton::new();
    let line = button.line();
    let handle = StubHandle::default();
    let engine = StubEngine {
        handle: handle.clone(),
    };
    let mut device =
        DeviceController::boot(config, engine, RecordingIndicators::default(), button).unwrap();

    let presser = tokio::spawn(async move {
        // Retry past the debounce window until a press lands on the wait.
        while !line.press() {
            tokio::time::sleep(Duration::from_millis(60)).await;
        }
    });
    timeout(Duration::from_secs(5), device.run_cycle())
        .await
        .expect("button press never triggered")
        .unwrap();
    presser.await.unwrap();
    assert_eq!(handle.calls().len(), 1);
}

#[tokio::test]
async fn test_zero_debounce_is_rejected_at_boot() {
    let mut config = stub_config("zero_debounce", "4 8", 8);
    config.debounce_us = 0;
    let engine = StubEngine {
        handle: StubHandle::default(),
    };
    let err = DeviceController::boot(config, engine, RecordingIndicators::default(), HostButton::new())
        .unwrap_err();
    assert!(err.is_boot_fatal());
}

// ── Indicators ─────────────────────────────────────────────────

#[tokio::test]
async fn test_indicators_follow_phase_over_two_cycles() {
    let (mut device, handle, leds, _) = boot_stub(stub_config("leds", "4 8", 8));

    trigger_cycle(&mut device).await;
    trigger_cycle(&mut device).await;

    assert_eq!(
        leds.log(),
        pattern(&[
            Phase::Loading,
            Phase::Armed,
            Phase::Generating,
            Phase::Armed,
            Phase::Generating,
            Phase::Armed,
        ])
    );
    // Busy on, armed off while the engine ran.
    assert_eq!(
        *handle.leds_during_run.lock().unwrap(),
        vec![(Some(true), Some(false)); 2]
    );
    assert_eq!(leds.get(Led::Status), Some(false));
    assert_eq!(leds.get(Led::User), Some(true));
}

// ── Failure containment ────────────────────────────────────────

#[tokio::test]
async fn test_generation_failures_rearm() {
    let (mut device, handle, leds, _) = boot_stub(stub_config("failures", "4 8", 8));
    handle.script(&[Step::Fail, Step::Panic, Step::Succeed]);

    let failed = trigger_cycle(&mut device).await;
    assert!(matches!(failed.outcome, RunOutcome::Failed { ref reason } if reason.contains("99")));
    assert_eq!(device.phase(), Phase::Armed);

    let panicked = trigger_cycle(&mut device).await;
    assert!(matches!(
        panicked.outcome,
        RunOutcome::Failed { ref reason } if reason.contains("scripted engine panic")
    ));
    assert_eq!(device.phase(), Phase::Armed);

    let ok = trigger_cycle(&mut device).await;
    assert!(ok.is_success());

    let stats = device.stats();
    assert_eq!(stats.triggers_handled, 3);
    assert_eq!(stats.runs_failed, 2);
    assert_eq!(stats.runs_completed, 1);
    assert_eq!(leds.get(Led::User), Some(true));
}

// ── End-to-end ─────────────────────────────────────────────────

#[tokio::test]
async fn test_reported_throughput_is_engine_value() {
    let (mut device, handle, _, _) = boot_stub(stub_config("throughput", "4 8", 8));

    let report = trigger_cycle(&mut device).await;
    assert_eq!(handle.calls(), vec![(String::new(), 8)]);
    assert_eq!(
        report.outcome,
        RunOutcome::Completed {
            tokens: STUB_TOKENS,
            tokens_per_second: STUB_TOKENS_PER_SECOND,
        }
    );
    assert_eq!(report.tokens_per_second(), Some(STUB_TOKENS_PER_SECOND));
}

#[test]
fn test_shutdown_releases_memory() {
    let (device, _, leds, _) = boot_stub(stub_config("shutdown", "4 8", 8));
    assert!(device.model().resident_bytes() > 0);

    let unloaded = device.shutdown();
    assert_eq!(unloaded.resident_bytes(), 0);
    assert_eq!(leds.get(Led::Status), Some(false));
    assert_eq!(leds.get(Led::User), Some(false));
}

/// Writer shared between the engine and the test.
#[derive(Clone, Default)]
struct SharedSink(Arc<Mutex<Vec<u8>>>);

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Legacy llama2 checkpoint: dim 8, hidden 16, 1 layer, 2 heads, vocab 4,
/// seq_len 8, shared classifier, zero weights.
fn legacy_checkpoint() -> Vec<u8> {
    let mut bytes: Vec<u8> = [8i32, 16, 1, 2, 2, 4, 8]
        .iter()
        .flat_map(|v| v.to_le_bytes())
        .collect();
    // 4 * (matrices 672 + norms 24 + rope 32) floats.
    bytes.resize(bytes.len() + 2912, 0);
    bytes
}

fn tokenizer(entries: &[(&[u8], f32)]) -> Vec<u8> {
    let max = entries.iter().map(|(p, _)| p.len()).max().unwrap_or(0) as i32;
    let mut bytes = max.to_le_bytes().to_vec();
    for (piece, score) in entries {
        bytes.extend_from_slice(&score.to_le_bytes());
        bytes.extend_from_slice(&(piece.len() as i32).to_le_bytes());
        bytes.extend_from_slice(piece);
    }
    bytes
}

#[tokio::test]
async fn test_llama2_engine_end_to_end() {
    let dir = temp_dir("llama2");
    let model_path = dir.join("stories.bin");
    let tokenizer_path = dir.join("tokenizer.bin");
    std::fs::write(&model_path, legacy_checkpoint()).unwrap();
    std::fs::write(
        &tokenizer_path,
        tokenizer(&[
            (b"<unk>", 0.0),
            (b"\n<s>\n", 0.0),
            (b"\n</s>\n", 0.0),
            (b" hi", 10.0),
        ]),
    )
    .unwrap();

    let config = DeviceConfig {
        model_path,
        tokenizer_path,
        temperature: 0.0,
        max_steps: 0,
        ..Default::default()
    };
    let sink = SharedSink::default();
    let engine = UnigramEngine::new(Box::new(sink.clone()));
    let source = TokenSource::default();
    let mut device =
        DeviceController::boot(config, engine, RecordingIndicators::default(), source.clone())
            .unwrap();
    assert_eq!(device.model().spec(), ModelSpec { vocab_size: 4, seq_len: 8 });

    let presser = press_when_waiting(source.token().unwrap());
    let report = timeout(Duration::from_secs(5), device.run_cycle())
        .await
        .unwrap()
        .unwrap();
    presser.await.unwrap();

    assert!(matches!(report.outcome, RunOutcome::Completed { tokens: 8, .. }));
    let text = String::from_utf8(sink.0.lock().unwrap().clone()).unwrap();
    assert_eq!(text, "hi hi hi hi hi hi hi hi\n");
}
