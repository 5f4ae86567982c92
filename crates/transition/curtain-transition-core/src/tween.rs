//! Tween: one animatable binding of an item.
//!
//! A tween maps the item's normalized time into its `[start, end]` window,
//! shapes it with an easing kind (or a custom curve) and hands the eased
//! value to its effect. In multiple mode the opening and closing eases are
//! cross-faded with a smoothstep while the item closes.

use serde::{Deserialize, Serialize};

use crate::curve::CustomCurve;
use crate::easing::{self, Ease};
use crate::effects::{EffectKind, MaterialProperty};
use crate::item::ItemState;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TweenMode {
    /// One ease for both directions.
    #[default]
    Single,
    /// `ease` while opening, `closing_ease` while closing.
    Multiple,
}

/// Which transitions a tween participates in.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TweenDirection {
    #[default]
    OpenClose,
    Open,
    Close,
    /// Only during a button pulse; always uses the custom curve.
    Button,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tween {
    pub enabled: bool,
    /// Window of item time this tween animates over.
    pub start: f32,
    pub end: f32,
    pub mode: TweenMode,
    pub ease: Ease,
    pub closing_ease: Ease,
    pub direction: TweenDirection,
    pub effect: EffectKind,
    /// Binding for `EffectKind::Property`.
    pub property: Option<MaterialProperty>,
    /// Used when `ease` is `Custom` or the direction is `Button`.
    pub curve: CustomCurve,
    /// Seconds the multiple-mode cross-fade takes.
    pub blend_factor: f32,
    #[serde(skip)]
    blend_time: f32,
}

impl Default for Tween {
    fn default() -> Self {
        Self {
            enabled: true,
            start: 0.0,
            end: 1.0,
            mode: TweenMode::Single,
            ease: Ease::InOutQuad,
            closing_ease: Ease::InOutQuad,
            direction: TweenDirection::OpenClose,
            effect: EffectKind::Alpha,
            property: None,
            curve: CustomCurve::default(),
            blend_factor: 0.25,
            blend_time: 0.0,
        }
    }
}

impl Tween {
    pub fn new(effect: EffectKind, ease: Ease) -> Self {
        Self {
            effect,
            ease,
            closing_ease: ease,
            ..Self::default()
        }
    }

    pub fn with_window(mut self, start: f32, end: f32) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn with_direction(mut self, direction: TweenDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Switch to multiple mode with a separate closing ease.
    pub fn with_closing_ease(mut self, closing_ease: Ease) -> Self {
        self.mode = TweenMode::Multiple;
        self.closing_ease = closing_ease;
        self
    }

    pub fn with_curve(mut self, curve: CustomCurve) -> Self {
        self.curve = curve;
        self
    }

    pub fn with_property(mut self, property: MaterialProperty) -> Self {
        self.effect = EffectKind::Property;
        self.property = Some(property);
        self
    }

    #[inline]
    pub fn blend_time(&self) -> f32 {
        self.blend_time
    }

    #[inline]
    pub(crate) fn reset_blend(&mut self) {
        self.blend_time = 0.0;
    }

    /// Ease to use in the given state when not cross-fading.
    pub fn ease_for(&self, state: ItemState) -> Ease {
        match (self.mode, state) {
            (TweenMode::Multiple, ItemState::Closed | ItemState::Closing) => self.closing_ease,
            _ => self.ease,
        }
    }

    /// Eased value of item time `value` with `ease`. `duration` is the
    /// item's current transition duration; zero means a settled state.
    pub fn evaluate(&self, value: f32, ease: Ease, duration: f32) -> f32 {
        let span = self.end - self.start;
        if ease == Ease::Custom || self.direction == TweenDirection::Button {
            let local = if span.abs() > f32::EPSILON {
                (value - self.start) / span
            } else if value >= self.end {
                1.0
            } else {
                0.0
            };
            return self.curve.evaluate(local);
        }

        let (lo, hi) = if self.start <= self.end {
            (self.start, self.end)
        } else {
            (self.end, self.start)
        };
        let local = (value.clamp(lo, hi) - self.start) * duration;
        let window = if duration == 0.0 { 1.0 } else { span * duration };
        if window <= 0.0 {
            // Degenerate window: jump at its end.
            let t = if value >= self.end { 1.0 } else { 0.0 };
            return easing::evaluate(t, 1.0, ease);
        }
        easing::evaluate(local, window, ease)
    }

    /// Whether this tween runs during automatic ticking in `state`.
    pub fn accepts(&self, state: ItemState) -> bool {
        if !self.enabled {
            return false;
        }
        match self.direction {
            TweenDirection::Button => false,
            TweenDirection::OpenClose => true,
            TweenDirection::Open => !matches!(state, ItemState::Closing | ItemState::Closed),
            TweenDirection::Close => !matches!(state, ItemState::Opening | ItemState::Opened),
        }
    }

    /// Whether this tween takes part in manual evaluation towards `opened`
    /// (`true`) or `closed` (`false`).
    pub fn accepts_key(&self, opened: bool) -> bool {
        if !self.enabled {
            return false;
        }
        match self.direction {
            TweenDirection::OpenClose => true,
            TweenDirection::Open => opened,
            TweenDirection::Close => !opened,
            TweenDirection::Button => false,
        }
    }

    /// Sample for one tick: evaluates the ease(s) at `time` and advances
    /// the cross-fade timer by `dt`.
    pub fn advance(&mut self, time: f32, state: ItemState, dt: f32, duration: f32) -> f32 {
        match self.mode {
            TweenMode::Single => self.evaluate(time, self.ease, duration),
            TweenMode::Multiple => {
                let open = self.evaluate(time, self.ease, duration);
                let close = self.evaluate(time, self.closing_ease, duration);
                match state {
                    ItemState::Closing => self.blend_time = (self.blend_time + dt).min(self.blend_factor.max(0.0)),
                    ItemState::Opening => self.blend_time = (self.blend_time - dt).max(0.0),
                    _ => {}
                }
                easing::smooth_step(open, close, self.blend_weight(state))
            }
        }
    }

    fn blend_weight(&self, state: ItemState) -> f32 {
        if self.blend_factor <= 0.0 {
            return if matches!(state, ItemState::Closing | ItemState::Closed) {
                1.0
            } else {
                0.0
            };
        }
        (self.blend_time / self.blend_factor).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::CurveKey;

    fn approx(a: f32, b: f32, eps: f32) {
        assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
    }

    #[test]
    fn window_maps_item_time() {
        let tw = Tween::new(EffectKind::Alpha, Ease::Linear).with_window(0.5, 1.0);
        approx(tw.evaluate(0.25, Ease::Linear, 2.0), 0.0, 1e-6);
        approx(tw.evaluate(0.75, Ease::Linear, 2.0), 0.5, 1e-6);
        approx(tw.evaluate(1.0, Ease::Linear, 2.0), 1.0, 1e-6);
        approx(tw.evaluate(1.3, Ease::Linear, 2.0), 1.0, 1e-6);
    }

    #[test]
    fn zero_duration_settles_at_start_of_ease() {
        let tw = Tween::new(EffectKind::Alpha, Ease::OutQuad);
        approx(tw.evaluate(0.7, Ease::OutQuad, 0.0), 0.0, 1e-6);
        approx(tw.evaluate(0.7, Ease::NoneOne, 0.0), 1.0, 1e-6);
    }

    #[test]
    fn degenerate_window_steps() {
        let tw = Tween::new(EffectKind::Alpha, Ease::Linear).with_window(0.5, 0.5);
        approx(tw.evaluate(0.4, Ease::Linear, 1.0), 0.0, 1e-6);
        approx(tw.evaluate(0.6, Ease::Linear, 1.0), 1.0, 1e-6);
    }

    #[test]
    fn custom_kind_uses_curve() {
        let curve = CustomCurve::new(vec![
            CurveKey {
                time: 0.0,
                value: 0.0,
                in_tangent: 2.0,
                out_tangent: 2.0,
            },
            CurveKey {
                time: 1.0,
                value: 2.0,
                in_tangent: 2.0,
                out_tangent: 2.0,
            },
        ]);
        let tw = Tween::new(EffectKind::Number, Ease::Custom).with_curve(curve);
        approx(tw.evaluate(0.5, Ease::Custom, 1.0), 1.0, 1e-5);
    }

    #[test]
    fn direction_filter() {
        let open_only = Tween::new(EffectKind::Alpha, Ease::Linear).with_direction(TweenDirection::Open);
        assert!(open_only.accepts(ItemState::Opening));
        assert!(!open_only.accepts(ItemState::Closing));
        let button = Tween::new(EffectKind::Scale, Ease::Linear).with_direction(TweenDirection::Button);
        assert!(!button.accepts(ItemState::Opened));
        assert!(!button.accepts_key(true));
    }

    #[test]
    fn multiple_mode_fades_to_closing_ease() {
        let mut tw = Tween::new(EffectKind::Alpha, Ease::NoneZero).with_closing_ease(Ease::NoneOne);
        tw.blend_factor = 0.2;
        approx(tw.advance(0.5, ItemState::Opening, 0.1, 1.0), 0.0, 1e-6);
        let mid = tw.advance(0.5, ItemState::Closing, 0.1, 1.0);
        approx(mid, 0.5, 1e-6);
        approx(tw.advance(0.5, ItemState::Closing, 0.1, 1.0), 1.0, 1e-6);
        approx(tw.advance(0.5, ItemState::Closing, 0.1, 1.0), 1.0, 1e-6);
        approx(tw.blend_time(), 0.2, 1e-6);
        tw.advance(0.5, ItemState::Opening, 0.1, 1.0);
        approx(tw.blend_time(), 0.1, 1e-6);
        tw.reset_blend();
        approx(tw.blend_time(), 0.0, 0.0);
    }

    #[test]
    fn zero_blend_factor_switches_instantly() {
        let mut tw = Tween::new(EffectKind::Alpha, Ease::NoneZero).with_closing_ease(Ease::NoneOne);
        tw.blend_factor = 0.0;
        approx(tw.advance(0.5, ItemState::Closing, 0.1, 1.0), 1.0, 1e-6);
        approx(tw.advance(0.5, ItemState::Opening, 0.1, 1.0), 0.0, 1e-6);
    }
}
