// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The device controller: boot once, then trigger, generate, re-arm.

use crate::{
    run_generation, DeviceConfig, DeviceStats, GenerationParams, GenerationReport, LifecycleError,
    LoadMetrics, Loaded, ModelLifecycle, Phase, TriggerController, Unloaded,
};
use board_io::{Indicators, InterruptSource, LatchStats, Led, WakeToken};
use resident_memory::ResidencyLedger;
use story_engine::InferenceEngine;
use std::convert::Infallible;

/// Owns the model, the indicators, and the trigger for the device's life.
///
/// A value of this type only exists once boot succeeded, so holding one
/// means the model is resident and the button is armed.
pub struct DeviceController<E, I, S>
where
    E: InferenceEngine,
    I: Indicators,
    S: InterruptSource,
{
    config: DeviceConfig,
    params: GenerationParams,
    model: ModelLifecycle<E, Loaded<E>>,
    trigger: TriggerController<S>,
    indicators: I,
    phase: Phase,
    stats: DeviceStats,
}

impl<E, I, S> DeviceController<E, I, S>
where
    E: InferenceEngine,
    I: Indicators,
    S: InterruptSource,
{
    /// Runs the LOADING phase and arms the device.
    ///
    /// Shows LOADING, loads model and tokenizer, binds the button, then
    /// shows ARMED. Any error here is boot-fatal: it is returned before
    /// ARMED is ever shown and the button stays unbound.
    pub fn boot(
        config: DeviceConfig,
        engine: E,
        mut indicators: I,
        source: S,
    ) -> Result<Self, LifecycleError> {
        // Start the tick counter so the sampler seed reflects load time.
        let tick = board_io::boot_ticks();
        Phase::Loading.show(&mut indicators);
        tracing::info!(phase = %Phase::Loading, tick, "booting");

        config.validate().map_err(boot_failed)?;
        let ledger = ResidencyLedger::new(config.parse_budget().map_err(boot_failed)?);
        let model = ModelLifecycle::new(engine, ledger)
            .load(&config)
            .map_err(boot_failed)?;

        let mut trigger = TriggerController::new(source, config.debounce());
        trigger.arm().map_err(boot_failed)?;

        let mut device = Self {
            params: GenerationParams {
                max_steps: model.effective_steps(),
                ..config.generation_params()
            },
            config,
            model,
            trigger,
            indicators,
            phase: Phase::Loading,
            stats: DeviceStats::default(),
        };
        device.enter(Phase::Armed);
        Ok(device)
    }

    fn enter(&mut self, phase: Phase) {
        self.phase = phase;
        phase.show(&mut self.indicators);
        tracing::info!(phase = %phase, "phase change");
    }

    /// One trip around the loop: wait for a trigger, generate a story, re-arm.
    ///
    /// Generation failures do not surface as errors; they come back as a
    /// failed report and the device is ARMED again either way.
    pub async fn run_cycle(&mut self) -> Result<GenerationReport, LifecycleError> {
        self.trigger.wait_for_trigger().await?;
        self.stats.triggers_handled += 1;

        self.enter(Phase::Generating);
        let report = run_generation(&mut self.model, &self.params.prompt);
        self.stats.record(&report);
        self.enter(Phase::Armed);

        Ok(report)
    }

    /// Runs cycles until an unrecoverable error, which in practice never
    /// comes once boot succeeded.
    pub async fn run_forever(self) -> Result<Infallible, LifecycleError> {
        self.run_forever_with(|_| {}).await
    }

    /// As [`run_forever`](Self::run_forever), handing each report to
    /// `on_report`.
    pub async fn run_forever_with(
        mut self,
        mut on_report: impl FnMut(&GenerationReport),
    ) -> Result<Infallible, LifecycleError> {
        loop {
            let report = self.run_cycle().await?;
            on_report(&report);
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn stats(&self) -> DeviceStats {
        self.stats
    }

    pub fn latch_stats(&self) -> LatchStats {
        self.trigger.latch_stats()
    }

    /// Returns `true` while the control task is parked waiting for a press.
    pub fn is_waiting(&self) -> bool {
        self.trigger.is_waiting()
    }

    /// A token that triggers the device like a debounced button press.
    pub fn wake_token(&self) -> WakeToken {
        self.trigger.wake_token()
    }

    pub fn load_metrics(&self) -> &LoadMetrics {
        self.model.load_metrics()
    }

    pub fn model(&self) -> &ModelLifecycle<E, Loaded<E>> {
        &self.model
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    /// Turns the LEDs off and unloads the model.
    ///
    /// Firmware never calls this; it exists for hosts and tests that need
    /// to hand memory back.
    pub fn shutdown(mut self) -> ModelLifecycle<E, Unloaded> {
        self.indicators.set(Led::Status, false);
        self.indicators.set(Led::User, false);
        tracing::info!("shutting down");
        self.model.unload()
    }
}

fn boot_failed(e: LifecycleError) -> LifecycleError {
    tracing::error!("boot failed: {e}");
    e
}

impl<E, I, S> std::fmt::Debug for DeviceController<E, I, S>
where
    E: InferenceEngine,
    I: Indicators,
    S: InterruptSource,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceController")
            .field("phase", &self.phase)
            .field("stats", &self.stats)
            .field("model", &self.model)
            .finish()
    }
}
