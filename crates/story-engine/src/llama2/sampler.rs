// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Temperature and nucleus (top-p) sampling over a logit vector.

use crate::SamplerParams;

/// Seed substituted for zero, which would lock xorshift at zero forever.
const FALLBACK_SEED: u64 = 0x9E37_79B9_7F4A_7C15;

/// Sampling state. Owns its RNG and a scratch buffer sized to the vocabulary
/// so that sampling never allocates.
#[derive(Debug, Clone)]
pub struct Sampler {
    vocab_size: usize,
    temperature: f32,
    top_p: f32,
    rng_state: u64,
    candidates: Vec<(f32, usize)>,
}

impl Sampler {
    pub fn new(params: SamplerParams) -> Self {
        Self {
            vocab_size: params.vocab_size,
            temperature: params.temperature,
            top_p: params.top_p,
            rng_state: if params.seed == 0 {
                FALLBACK_SEED
            } else {
                params.seed
            },
            candidates: Vec::with_capacity(params.vocab_size),
        }
    }

    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    /// Picks the next token from `logits`, which is overwritten with
    /// probabilities unless sampling is greedy.
    pub fn sample(&mut self, logits: &mut [f32]) -> usize {
        let n = self.vocab_size.min(logits.len());
        let logits = &mut logits[..n];
        if self.temperature == 0.0 {
            return argmax(logits);
        }

        for l in logits.iter_mut() {
            *l /= self.temperature;
        }
        softmax(logits);

        let coin = self.random_f32();
        if self.top_p <= 0.0 || self.top_p >= 1.0 {
            sample_mult(logits, coin)
        } else {
            self.sample_top_p(logits, coin)
        }
    }

    /// Samples from the smallest set of tokens whose cumulative probability
    /// exceeds `top_p`.
    fn sample_top_p(&mut self, probs: &[f32], coin: f32) -> usize {
        // Tokens below this probability cannot be part of the nucleus.
        let cutoff = (1.0 - self.top_p) / (probs.len().max(2) - 1) as f32;

        self.candidates.clear();
        self.candidates.extend(
            probs
                .iter()
                .enumerate()
                .filter(|&(_, &p)| p >= cutoff)
                .map(|(i, &p)| (p, i)),
        );
        self.candidates
            .sort_unstable_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        let mut cumulative = 0.0f32;
        let mut last = self.candidates.len().saturating_sub(1);
        for (i, (p, _)) in self.candidates.iter().enumerate() {
            cumulative += p;
            if cumulative > self.top_p {
                last = i;
                break;
            }
        }

        let r = coin * cumulative;
        let mut acc = 0.0f32;
        for (p, idx) in &self.candidates[..=last] {
            acc += p;
            if r < acc {
                return *idx;
            }
        }
        self.candidates.get(last).map_or(0, |c| c.1)
    }

    /// xorshift64* step.
    fn random_u32(&mut self) -> u32 {
        self.rng_state ^= self.rng_state >> 12;
        self.rng_state ^= self.rng_state << 25;
        self.rng_state ^= self.rng_state >> 27;
        (self.rng_state.wrapping_mul(0x2545_F491_4F6C_DD1D) >> 32) as u32
    }

    /// Uniform float in `[0, 1)`.
    fn random_f32(&mut self) -> f32 {
        (self.random_u32() >> 8) as f32 / 16_777_216.0
    }
}

fn argmax(values: &[f32]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |best, (i, &v)| {
            if v > best.1 {
                (i, v)
            } else {
                best
            }
        })
        .0
}

fn softmax(values: &mut [f32]) {
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0;
    for v in values.iter_mut() {
        *v = (*v - max).exp();
        sum += *v;
    }
    for v in values.iter_mut() {
        *v /= sum;
    }
}

fn sample_mult(probs: &[f32], coin: f32) -> usize {
    let mut acc = 0.0;
    for (i, p) in probs.iter().enumerate() {
        acc += p;
        if coin < acc {
            return i;
        }
    }
    probs.len().saturating_sub(1)
}
