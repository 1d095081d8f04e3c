// Copyright 2026 the Sylva Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Two-contact pinch recognition.
//!
//! A pinch is active exactly while two touch slots are down. The step it
//! becomes active records the initial distance and angle between the contacts
//! and emits nothing; every later step with the same two contacts reports
//! cumulative and incremental scale and rotation.

use core::f64::consts::{PI, TAU};

use kurbo::Point;

use super::event::PinchInfo;
use crate::node::NodeId;

/// Distance below which a scale ratio is reported as 1.
const MIN_DISTANCE: f64 = 1e-9;

/// What one pinch update observed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum PinchUpdate {
    /// No pinch before or after.
    Idle,
    /// Two contacts just went down.
    Started,
    /// Both contacts still down.
    Moved(PinchInfo),
    /// Fewer (or more) than two contacts remain down.
    Ended,
}

/// The state of the two-contact gesture.
#[derive(Clone, Copy, Debug, Default)]
pub struct PinchState {
    active: bool,
    slots: [usize; 2],
    target: Option<NodeId>,
    initial_distance: f64,
    initial_angle: f64,
    previous_distance: f64,
    previous_angle: f64,
}

impl PinchState {
    /// Returns whether a pinch is in progress.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Returns the two participating pointer slots while active.
    #[must_use]
    pub fn slots(&self) -> Option<[usize; 2]> {
        self.active.then_some(self.slots)
    }

    /// Returns the node under the contacts' midpoint when the pinch began.
    #[must_use]
    pub fn target(&self) -> Option<NodeId> {
        self.target
    }

    /// Returns whether `slot` takes part in the active pinch.
    pub(crate) fn involves(&self, slot: usize) -> bool {
        self.active && self.slots.contains(&slot)
    }

    pub(crate) fn set_target(&mut self, target: Option<NodeId>) {
        self.target = target;
    }

    /// Advances the gesture given every touch slot currently down, in slot
    /// order, with world positions.
    pub(crate) fn update(&mut self, down: &[(usize, Point)]) -> PinchUpdate {
        let [(s0, p0), (s1, p1)] = down else {
            if self.active {
                *self = Self::default();
                return PinchUpdate::Ended;
            }
            return PinchUpdate::Idle;
        };
        let span = *p1 - *p0;
        let distance = span.hypot();
        let angle = span.atan2();

        if !self.active || self.slots != [*s0, *s1] {
            *self = Self {
                active: true,
                slots: [*s0, *s1],
                target: None,
                initial_distance: distance,
                initial_angle: angle,
                previous_distance: distance,
                previous_angle: angle,
            };
            return PinchUpdate::Started;
        }

        let info = PinchInfo {
            center: p0.midpoint(*p1),
            scale: ratio(distance, self.initial_distance),
            rotation: wrap_angle(angle - self.initial_angle),
            delta_scale: ratio(distance, self.previous_distance),
            delta_rotation: wrap_angle(angle - self.previous_angle),
            distance,
        };
        self.previous_distance = distance;
        self.previous_angle = angle;
        PinchUpdate::Moved(info)
    }
}

fn ratio(current: f64, reference: f64) -> f64 {
    if reference < MIN_DISTANCE {
        1.0
    } else {
        current / reference
    }
}

/// Wraps an angle difference into `(-π, π]`.
fn wrap_angle(a: f64) -> f64 {
    let a = a % TAU;
    if a > PI {
        a - TAU
    } else if a <= -PI {
        a + TAU
    } else {
        a
    }
}

#[cfg(test)]
mod tests {
    use core::f64::consts::FRAC_PI_2;

    use super::*;

    fn moved(update: PinchUpdate) -> PinchInfo {
        match update {
            PinchUpdate::Moved(info) => info,
            other => panic!("expected a pinch move, got {other:?}"),
        }
    }

    #[test]
    fn starts_on_two_contacts_without_event() {
        let mut pinch = PinchState::default();
        assert_eq!(pinch.update(&[(1, Point::ORIGIN)]), PinchUpdate::Idle);
        let down = [(1, Point::new(0.0, 0.0)), (2, Point::new(100.0, 0.0))];
        assert_eq!(pinch.update(&down), PinchUpdate::Started);
        assert!(pinch.is_active());
        assert!(pinch.involves(2));
        assert!(!pinch.involves(0));
    }

    #[test]
    fn scale_is_distance_ratio() {
        let mut pinch = PinchState::default();
        let _ = pinch.update(&[(1, Point::new(0.0, 0.0)), (2, Point::new(100.0, 0.0))]);
        let info = moved(pinch.update(&[(1, Point::new(0.0, 0.0)), (2, Point::new(150.0, 0.0))]));
        assert_eq!(info.scale, 1.5);
        assert_eq!(info.delta_scale, 1.5);
        let info = moved(pinch.update(&[(1, Point::new(0.0, 0.0)), (2, Point::new(300.0, 0.0))]));
        assert_eq!(info.scale, 3.0);
        assert_eq!(info.delta_scale, 2.0);
        assert_eq!(info.center, Point::new(150.0, 0.0));
    }

    #[test]
    fn rotation_is_angle_difference() {
        let mut pinch = PinchState::default();
        let _ = pinch.update(&[(1, Point::new(0.0, 0.0)), (2, Point::new(10.0, 0.0))]);
        let info = moved(pinch.update(&[(1, Point::new(0.0, 0.0)), (2, Point::new(0.0, 10.0))]));
        assert!((info.rotation - FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn ends_when_a_contact_lifts() {
        let mut pinch = PinchState::default();
        let _ = pinch.update(&[(1, Point::new(0.0, 0.0)), (2, Point::new(10.0, 0.0))]);
        assert_eq!(pinch.update(&[(1, Point::new(0.0, 0.0))]), PinchUpdate::Ended);
        assert!(!pinch.is_active());
        assert_eq!(pinch.update(&[]), PinchUpdate::Idle);
    }

    #[test]
    fn coincident_contacts_report_unit_scale() {
        let mut pinch = PinchState::default();
        let _ = pinch.update(&[(1, Point::new(5.0, 5.0)), (2, Point::new(5.0, 5.0))]);
        let info = moved(pinch.update(&[(1, Point::new(5.0, 5.0)), (2, Point::new(6.0, 5.0))]));
        assert_eq!(info.scale, 1.0);
    }

    #[test]
    fn wrap_angle_stays_in_range() {
        assert!((wrap_angle(3.0 * PI / 2.0) + FRAC_PI_2).abs() < 1e-12);
        assert!((wrap_angle(-3.0 * PI / 2.0) - FRAC_PI_2).abs() < 1e-12);
        assert_eq!(wrap_angle(0.5), 0.5);
    }
}
