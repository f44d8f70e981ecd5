//! Short audible cues, one pattern per notification type.
//!
//! A pattern is a list of frequency steps applied at fixed offsets (the
//! oscillator jumps, it does not glide) under a gain envelope that decays
//! exponentially from the peak to near silence over the pattern duration.

use std::f32::consts::TAU;

use crate::notification::NotificationType;

use super::DeliveryError;

pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;
const GAIN_FLOOR: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
}

impl Waveform {
    /// Amplitude at `phase` (in cycles, any value).
    fn sample(&self, phase: f32) -> f32 {
        let cycle = phase.fract();
        match self {
            Self::Sine => (TAU * cycle).sin(),
            Self::Square => {
                if cycle < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Self::Triangle => 1.0 - 4.0 * (cycle - 0.5).abs(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneStep {
    pub frequency_hz: f32,
    pub at_secs: f32,
}

const fn step(frequency_hz: f32, at_secs: f32) -> ToneStep {
    ToneStep {
        frequency_hz,
        at_secs,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TonePattern {
    pub waveform: Waveform,
    pub steps: &'static [ToneStep],
    pub duration_secs: f32,
    pub peak_gain: f32,
}

// Ascending C major arpeggio, cash-register like.
const SALE: TonePattern = TonePattern {
    waveform: Waveform::Triangle,
    steps: &[
        step(523.25, 0.0),
        step(659.25, 0.08),
        step(783.99, 0.16),
        step(1046.5, 0.24),
    ],
    duration_secs: 0.5,
    peak_gain: 0.3,
};

const MESSAGE: TonePattern = TonePattern {
    waveform: Waveform::Sine,
    steps: &[step(880.0, 0.0), step(1174.66, 0.1)],
    duration_secs: 0.3,
    peak_gain: 0.3,
};

const APPOINTMENT: TonePattern = TonePattern {
    waveform: Waveform::Sine,
    steps: &[step(659.25, 0.0), step(783.99, 0.15), step(987.77, 0.3)],
    duration_secs: 0.6,
    peak_gain: 0.2,
};

const CLIENT: TonePattern = TonePattern {
    waveform: Waveform::Triangle,
    steps: &[step(392.0, 0.0), step(493.88, 0.1), step(587.33, 0.2)],
    duration_secs: 0.45,
    peak_gain: 0.25,
};

const GENERIC: TonePattern = TonePattern {
    waveform: Waveform::Sine,
    steps: &[step(800.0, 0.0), step(600.0, 0.1)],
    duration_secs: 0.3,
    peak_gain: 0.3,
};

pub fn pattern_for(kind: Option<NotificationType>) -> &'static TonePattern {
    match kind {
        Some(NotificationType::NewSale) | Some(NotificationType::PaymentReceived) => &SALE,
        Some(NotificationType::NewMessage) => &MESSAGE,
        Some(NotificationType::NewAppointment) => &APPOINTMENT,
        Some(NotificationType::NewClient) => &CLIENT,
        None => &GENERIC,
    }
}

/// Rendered mono PCM clip.
#[derive(Debug, Clone, PartialEq)]
pub struct ToneClip {
    pub sample_rate: u32,
    pub samples: Vec<f32>,
}

impl ToneClip {
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }

    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
    }
}

impl TonePattern {
    fn frequency_at(&self, t: f32) -> f32 {
        self.steps
            .iter()
            .take_while(|step| step.at_secs <= t)
            .last()
            .or_else(|| self.steps.first())
            .map(|step| step.frequency_hz)
            .unwrap_or(0.0)
    }

    fn gain_at(&self, t: f32) -> f32 {
        if self.duration_secs <= 0.0 {
            return 0.0;
        }
        let progress = (t / self.duration_secs).clamp(0.0, 1.0);
        self.peak_gain * (GAIN_FLOOR / self.peak_gain).powf(progress)
    }

    pub fn render(&self, sample_rate: u32) -> ToneClip {
        let rate = sample_rate.max(1) as f32;
        let total = (self.duration_secs * rate).round() as usize;
        let mut samples = Vec::with_capacity(total);
        let mut phase = 0.0f32;

        for index in 0..total {
            let t = index as f32 / rate;
            samples.push(self.waveform.sample(phase) * self.gain_at(t));
            phase = (phase + self.frequency_at(t) / rate).fract();
        }

        ToneClip {
            sample_rate: sample_rate.max(1),
            samples,
        }
    }
}

/// Plays the cue for a notification type. `None` plays the generic cue.
pub trait ToneEmitter: Send + Sync {
    fn play(&self, kind: Option<NotificationType>) -> Result<(), DeliveryError>;
}

/// Device that accepts rendered clips.
pub trait AudioOutput: Send + Sync {
    fn write(&self, clip: &ToneClip) -> Result<(), DeliveryError>;
}

/// Renders patterns locally and hands the clip to an [`AudioOutput`].
pub struct SynthToneEmitter<A> {
    output: A,
    sample_rate: u32,
}

impl<A: AudioOutput> SynthToneEmitter<A> {
    pub fn new(output: A) -> Self {
        Self {
            output,
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn output(&self) -> &A {
        &self.output
    }
}

impl<A: AudioOutput> ToneEmitter for SynthToneEmitter<A> {
    fn play(&self, kind: Option<NotificationType>) -> Result<(), DeliveryError> {
        if self.sample_rate == 0 {
            return Err(DeliveryError::Audio("sample rate must be positive".to_string()));
        }
        let clip = pattern_for(kind).render(self.sample_rate);
        self.output.write(&clip)
    }
}
