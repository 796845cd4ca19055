//! Lighting request dispatch.
//!
//! Maps a caller-supplied color sequence onto every LED of the targeted
//! controllers and chooses the direct or effect write path. The mode register
//! is written only after every baseline color, because the mode write can
//! start the device animating from the just-written baseline.

use crate::aura::{AuraController, EffectMode};
use crate::color::LedColor;
use crate::error::{Error, Result};
use tracing::warn;

/// Which controllers a request applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Every live controller, in discovery order.
    All,
    /// One controller by its discovery index.
    Device(u32),
}

/// One logical lighting request, already validated by the caller: colors are
/// numeric triples and the mode is resolved from a recognized effect name.
#[derive(Debug, Clone)]
pub struct LightingRequest {
    pub target: Target,
    /// Colors to lay across the LEDs; when shorter than the LED count the
    /// final color fills the rest. Empty means no color application.
    pub colors: Vec<LedColor>,
    /// Requested animation mode; absent means the direct write path.
    pub mode: Option<EffectMode>,
}

/// The discovery result set, owned by the caller.
///
/// Holds the live controllers; a controller that stops responding entirely is
/// removed here and needs a fresh probe to come back.
pub struct DeviceSet {
    controllers: Vec<AuraController>,
}

#[derive(Default)]
struct ApplyStats {
    attempted: u32,
    failed: u32,
}

impl ApplyStats {
    fn unreachable(&self) -> bool {
        self.attempted > 0 && self.failed == self.attempted
    }
}

impl DeviceSet {
    pub fn new(controllers: Vec<AuraController>) -> Self {
        Self { controllers }
    }

    /// Live controllers, in discovery order.
    pub fn controllers(&self) -> &[AuraController] {
        &self.controllers
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    /// Applies one request to the targeted controllers.
    ///
    /// Fails fast only on an invalid device index. Write failures are
    /// collected and returned so dispatch to the remaining LEDs and
    /// controllers continues; a controller whose every register access
    /// failed is removed and reported once as unreachable.
    pub fn apply(&mut self, request: &LightingRequest) -> Result<Vec<Error>> {
        let indices: Vec<usize> = match request.target {
            Target::All => (0..self.controllers.len()).collect(),
            Target::Device(index) => {
                if index as usize >= self.controllers.len() {
                    return Err(Error::IndexOutOfRange {
                        index,
                        limit: self.controllers.len() as u32,
                    });
                }
                vec![index as usize]
            }
        };

        let mut failures = Vec::new();
        let mut dead = Vec::new();
        for idx in indices {
            let controller = &mut self.controllers[idx];
            let stats = apply_one(controller, request, &mut failures);
            if stats.unreachable() {
                failures.push(Error::DeviceUnreachable {
                    controller: controller.name().to_string(),
                });
                dead.push(idx);
            }
        }

        for idx in dead.into_iter().rev() {
            let controller = self.controllers.remove(idx);
            warn!(
                "removed unreachable controller {} at {:#04x}",
                controller.name(),
                controller.address()
            );
        }

        Ok(failures)
    }
}

/// Fill-forward application of one request to one controller.
fn apply_one(
    controller: &mut AuraController,
    request: &LightingRequest,
    failures: &mut Vec<Error>,
) -> ApplyStats {
    let mut stats = ApplyStats::default();
    controller.set_direct(request.mode.is_none());

    if !request.colors.is_empty() {
        let last = request.colors.len() - 1;
        for index in 0..controller.led_count() {
            let color = request.colors[(index as usize).min(last)];
            let outcome = if controller.is_direct() {
                controller.set_led_color_direct(index, color)
            } else {
                controller.set_led_color_effect(index, color)
            };
            stats.attempted += 1;
            if let Err(e) = outcome {
                stats.failed += 1;
                failures.push(e);
            }
        }
    }

    if let Some(mode) = request.mode {
        stats.attempted += 1;
        if let Err(e) = controller.set_mode(mode) {
            stats.failed += 1;
            failures.push(e);
        }
    }

    stats
}
