//! Proximity detection for the end-of-list sentinel.

pub const DEFAULT_MARGIN_PX: f64 = 200.0;
pub const DEFAULT_THRESHOLD: f64 = 0.1;

/// Geometry of one layout pass, in document pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentinelObservation {
    pub sentinel_top: f64,
    pub sentinel_height: f64,
    pub viewport_top: f64,
    pub viewport_height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerConfig {
    /// Lookahead added above and below the viewport.
    pub margin: f64,
    /// Minimum visible fraction of the sentinel, in `[0, 1]`.
    pub threshold: f64,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            margin: DEFAULT_MARGIN_PX,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// Signal emitted when the sentinel comes near the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NearEnd;

/// Edge-triggered visibility detector.
///
/// Fires once each time the sentinel goes from not visible to visible; staying
/// visible does not fire again. Guarding against overlapping loads is the
/// list controller's job, not the trigger's.
#[derive(Debug, Clone)]
pub struct VisibilityTrigger {
    config: TriggerConfig,
    visible: bool,
    active: bool,
}

impl VisibilityTrigger {
    pub fn new(config: TriggerConfig) -> Self {
        Self {
            config: TriggerConfig {
                margin: config.margin.max(0.0),
                threshold: config.threshold.clamp(0.0, 1.0),
            },
            visible: false,
            active: true,
        }
    }

    pub fn config(&self) -> TriggerConfig {
        self.config
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Stop observing. An inactive trigger never fires again.
    pub fn deactivate(&mut self) {
        self.active = false;
        self.visible = false;
    }

    /// Forget the last visibility so a sentinel that is still in range fires
    /// on the next observation. Called once new content has been appended.
    pub fn rearm(&mut self) {
        self.visible = false;
    }

    pub fn observe(&mut self, observation: SentinelObservation) -> Option<NearEnd> {
        if !self.active {
            return None;
        }

        let now_visible = self.visible_fraction(observation) >= self.config.threshold
            && self.intersects(observation);
        let fired = now_visible && !self.visible;
        self.visible = now_visible;
        fired.then_some(NearEnd)
    }

    fn expanded_viewport(&self, observation: SentinelObservation) -> (f64, f64) {
        let top = observation.viewport_top - self.config.margin;
        let bottom =
            observation.viewport_top + observation.viewport_height.max(0.0) + self.config.margin;
        (top, bottom)
    }

    fn intersects(&self, observation: SentinelObservation) -> bool {
        let (top, bottom) = self.expanded_viewport(observation);
        let sentinel_bottom = observation.sentinel_top + observation.sentinel_height.max(0.0);
        observation.sentinel_top <= bottom && sentinel_bottom >= top
    }

    fn visible_fraction(&self, observation: SentinelObservation) -> f64 {
        let height = observation.sentinel_height;
        if height <= 0.0 {
            // A zero-height marker is either inside the area or not.
            return if self.intersects(observation) { 1.0 } else { 0.0 };
        }

        let (top, bottom) = self.expanded_viewport(observation);
        let overlap = (observation.sentinel_top + height).min(bottom)
            - observation.sentinel_top.max(top);
        (overlap.max(0.0) / height).min(1.0)
    }
}

impl Default for VisibilityTrigger {
    fn default() -> Self {
        Self::new(TriggerConfig::default())
    }
}
