use std::{collections::HashMap, fmt::Debug};

use evdev::{FFEffectData, FFEffectKind};

use crate::drivers::xinput::output::Vibration;

/// Receives force feedback played on a virtual device
pub trait FeedbackSink: Debug + Send + Sync {
    /// Called when an application starts or stops a rumble effect
    fn rumble(&self, vibration: Vibration);
}

/// Force feedback effects uploaded to a virtual device by applications
#[derive(Debug, Default)]
pub struct RumbleEffects {
    effects: HashMap<i16, FFEffectData>,
}

impl RumbleEffects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store or replace the effect with the given id
    pub fn upload(&mut self, effect_id: i16, effect: FFEffectData) {
        log::debug!("Uploading FF effect {effect_id}: {:?}", effect.kind);
        self.effects.insert(effect_id, effect);
    }

    pub fn erase(&mut self, effect_id: i16) {
        log::debug!("Erasing FF effect {effect_id}");
        self.effects.remove(&effect_id);
    }

    /// Returns the motor magnitudes to apply when the given effect is played.
    /// A value of zero stops the effect. Effects other than rumble are
    /// ignored.
    pub fn play(&self, effect_id: i16, value: i32) -> Option<Vibration> {
        if value == 0 {
            log::trace!("Stopping rumble");
            return Some(Vibration::default());
        }
        let Some(effect) = self.effects.get(&effect_id) else {
            log::warn!("No effect id found: {effect_id}");
            return None;
        };
        match effect.kind {
            FFEffectKind::Rumble {
                strong_magnitude,
                weak_magnitude,
            } => Some(Vibration::new(strong_magnitude, weak_magnitude)),
            _ => {
                log::debug!("Unsupported FF effect {effect_id}: {:?}", effect.kind);
                None
            }
        }
    }
}
