use super::{Action, MoveTarget, MonitorOffsets, Rect};

/// Pure geometry resolution: monitors + offsets + an action + the window's
/// current rectangle in, target rectangle out. Never fails; anything it
/// cannot resolve falls back to the window's current geometry.
#[derive(Debug, Clone, Default)]
pub struct GeometryResolver {
    monitors: Vec<Rect>,
    offsets: MonitorOffsets,
}

impl GeometryResolver {
    pub fn new(monitors: Vec<Rect>, offsets: MonitorOffsets) -> Self {
        Self { monitors, offsets }
    }

    pub fn monitor_count(&self) -> usize {
        self.monitors.len()
    }

    pub fn resolve(&self, action: &Action, current: Rect) -> Rect {
        if self.monitors.is_empty() {
            tracing::warn!("no monitors available, keeping current geometry");
            return current;
        }

        // 1. Target monitor: explicit 1-based index if valid, otherwise the
        // monitor containing the window's center, otherwise the primary.
        let index = match action.target_monitor {
            Some(n) if (1..=self.monitors.len()).contains(&n) => n - 1,
            Some(n) => {
                tracing::warn!(
                    "target_monitor {} out of range 1..={}, auto-detecting",
                    n,
                    self.monitors.len()
                );
                self.monitor_for(current)
            }
            None => self.monitor_for(current),
        };
        let monitor = self.monitors[index];

        // 2. Work area. Explicit coordinates address the full monitor
        // rectangle; anchor targets address the offset-shrunk work area.
        let explicit_coords = matches!(action.move_to, Some(MoveTarget::Coords { .. }));
        let work = if explicit_coords {
            monitor
        } else {
            monitor.shrink(self.offsets.for_monitor(index + 1))
        };

        // 3. Size, each axis independent of the other.
        let width = action
            .resize
            .width
            .map(|v| v.resolve(work.width))
            .unwrap_or(current.width);
        let height = action
            .resize
            .height
            .map(|v| v.resolve(work.height))
            .unwrap_or(current.height);

        // 4. Base position.
        let (base_x, base_y) = match &action.move_to {
            None => return Rect::new(current.x, current.y, width, height),
            Some(MoveTarget::Anchor(target)) => {
                let (rx, ry) = target.ratios();
                (
                    Some(work.x + (work.width as f64 * rx) as i32),
                    Some(work.y + (work.height as f64 * ry) as i32),
                )
            }
            Some(MoveTarget::Coords { x, y }) => (
                x.map(|v| monitor.x + v.resolve(monitor.width)),
                y.map(|v| monitor.y + v.resolve(monitor.height)),
            ),
        };

        if base_x.is_none() && base_y.is_none() {
            return Rect::new(current.x, current.y, width, height);
        }

        // 5. Anchor correction: shift so the window's own anchor point lands
        // on the base position instead of its top-left corner.
        let (ax, ay) = action.anchor.ratios();
        let mut x = base_x.unwrap_or(current.x) - (width as f64 * ax) as i32;
        let mut y = base_y.unwrap_or(current.y) - (height as f64 * ay) as i32;

        // 6. Final pixel offset.
        x += action.offset.0;
        y += action.offset.1;

        Rect::new(x, y, width, height)
    }

    fn monitor_for(&self, rect: Rect) -> usize {
        let (cx, cy) = rect.center();
        self.monitors
            .iter()
            .position(|m| m.contains_point(cx, cy))
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::core::{AnchorPoint, EdgeInsets, ResizeSpec, SizeValue};

    fn single_monitor() -> GeometryResolver {
        GeometryResolver::new(
            vec![Rect::new(0, 0, 1920, 1080)],
            MonitorOffsets::default(),
        )
    }

    fn dual_monitor() -> GeometryResolver {
        GeometryResolver::new(
            vec![
                Rect::new(0, 0, 1920, 1080),
                Rect::new(1920, 0, 2560, 1440),
            ],
            MonitorOffsets::default(),
        )
    }

    #[test]
    fn test_resolve_is_pure() {
        let resolver = single_monitor();
        let action = Action {
            move_to: Some(MoveTarget::Anchor(AnchorPoint::MiddleCenter)),
            ..Default::default()
        };
        let current = Rect::new(10, 20, 640, 480);

        let first = resolver.resolve(&action, current);
        let second = resolver.resolve(&action, current);
        assert_eq!(first, second);
    }

    #[test]
    fn test_calculator_centering() {
        // 320x480 window centered on a 1920x1080 monitor with zero offsets
        let resolver = single_monitor();
        let action = Action {
            anchor: AnchorPoint::MiddleCenter,
            move_to: Some(MoveTarget::Anchor(AnchorPoint::MiddleCenter)),
            resize: ResizeSpec {
                width: Some(SizeValue::Pixels(320)),
                height: Some(SizeValue::Pixels(480)),
            },
            ..Default::default()
        };

        let resolved = resolver.resolve(&action, Rect::new(50, 50, 200, 200));
        assert_eq!(resolved, Rect::new(800, 300, 320, 480));
    }

    #[test]
    fn test_bottom_right_anchor_on_bottom_right_target() {
        let resolver = single_monitor();
        let action = Action {
            anchor: AnchorPoint::BottomRight,
            move_to: Some(MoveTarget::Anchor(AnchorPoint::BottomRight)),
            resize: ResizeSpec {
                width: Some(SizeValue::Pixels(100)),
                height: Some(SizeValue::Pixels(100)),
            },
            ..Default::default()
        };

        let resolved = resolver.resolve(&action, Rect::new(0, 0, 500, 500));
        assert_eq!(resolved, Rect::new(1920 - 100, 1080 - 100, 100, 100));
    }

    #[test]
    fn test_percentage_resize() {
        let resolver = GeometryResolver::new(
            vec![Rect::new(0, 0, 1000, 800)],
            MonitorOffsets::default(),
        );
        let action = Action {
            resize: ResizeSpec {
                width: Some(SizeValue::Percent(50.0)),
                height: None,
            },
            ..Default::default()
        };

        let resolved = resolver.resolve(&action, Rect::new(10, 10, 640, 480));
        assert_eq!(resolved.width, 500);
        // Unset height keeps the current dimension
        assert_eq!(resolved.height, 480);
        // No move target: position stays put
        assert_eq!((resolved.x, resolved.y), (10, 10));
    }

    #[test]
    fn test_no_move_skips_anchor_and_offset() {
        let resolver = single_monitor();
        let action = Action {
            anchor: AnchorPoint::BottomRight,
            offset: (30, 40),
            resize: ResizeSpec {
                width: Some(SizeValue::Pixels(800)),
                height: Some(SizeValue::Pixels(600)),
            },
            ..Default::default()
        };

        let resolved = resolver.resolve(&action, Rect::new(100, 120, 640, 480));
        assert_eq!(resolved, Rect::new(100, 120, 800, 600));
    }

    #[test]
    fn test_work_area_offsets_apply_to_anchor_targets() {
        let offsets = MonitorOffsets {
            default: Some(EdgeInsets {
                top: 0,
                bottom: 48,
                left: 0,
                right: 0,
            }),
            per_monitor: HashMap::new(),
        };
        let resolver = GeometryResolver::new(vec![Rect::new(0, 0, 1920, 1080)], offsets);

        let action = Action {
            anchor: AnchorPoint::BottomLeft,
            move_to: Some(MoveTarget::Anchor(AnchorPoint::BottomLeft)),
            ..Default::default()
        };

        let resolved = resolver.resolve(&action, Rect::new(0, 0, 400, 300));
        // Work area bottom is 1080 - 48 = 1032
        assert_eq!(resolved, Rect::new(0, 1032 - 300, 400, 300));
    }

    #[test]
    fn test_explicit_coords_ignore_work_area_offsets() {
        let offsets = MonitorOffsets {
            default: Some(EdgeInsets {
                top: 100,
                bottom: 100,
                left: 100,
                right: 100,
            }),
            per_monitor: HashMap::new(),
        };
        let resolver = GeometryResolver::new(vec![Rect::new(0, 0, 1920, 1080)], offsets);

        let action = Action {
            move_to: Some(MoveTarget::Coords {
                x: Some(SizeValue::Pixels(10)),
                y: Some(SizeValue::Pixels(20)),
            }),
            ..Default::default()
        };

        let resolved = resolver.resolve(&action, Rect::new(0, 0, 400, 300));
        assert_eq!((resolved.x, resolved.y), (10, 20));
    }

    #[test]
    fn test_explicit_percent_coords_use_monitor_dimensions() {
        let resolver = dual_monitor();
        let action = Action {
            target_monitor: Some(2),
            move_to: Some(MoveTarget::Coords {
                x: Some(SizeValue::Percent(50.0)),
                y: Some(SizeValue::Pixels(0)),
            }),
            ..Default::default()
        };

        let resolved = resolver.resolve(&action, Rect::new(0, 0, 400, 300));
        // Monitor 2 starts at x=1920 and is 2560 wide
        assert_eq!((resolved.x, resolved.y), (1920 + 1280, 0));
    }

    #[test]
    fn test_coords_with_one_axis_missing() {
        let resolver = single_monitor();
        let action = Action {
            move_to: Some(MoveTarget::Coords {
                x: None,
                y: Some(SizeValue::Pixels(200)),
            }),
            ..Default::default()
        };

        let resolved = resolver.resolve(&action, Rect::new(77, 0, 400, 300));
        assert_eq!((resolved.x, resolved.y), (77, 200));
    }

    #[test]
    fn test_coords_with_both_axes_missing_keeps_position() {
        let resolver = single_monitor();
        let action = Action {
            anchor: AnchorPoint::BottomRight,
            offset: (5, 5),
            move_to: Some(MoveTarget::Coords { x: None, y: None }),
            resize: ResizeSpec {
                width: Some(SizeValue::Pixels(800)),
                height: Some(SizeValue::Pixels(600)),
            },
            ..Default::default()
        };

        let resolved = resolver.resolve(&action, Rect::new(40, 60, 400, 300));
        assert_eq!(resolved, Rect::new(40, 60, 800, 600));
    }

    #[test]
    fn test_final_offset_applied() {
        let resolver = single_monitor();
        let action = Action {
            move_to: Some(MoveTarget::Anchor(AnchorPoint::TopLeft)),
            offset: (16, -8),
            ..Default::default()
        };

        let resolved = resolver.resolve(&action, Rect::new(500, 500, 400, 300));
        assert_eq!((resolved.x, resolved.y), (16, -8));
    }

    #[test]
    fn test_monitor_detection_by_center() {
        let resolver = dual_monitor();
        let action = Action {
            move_to: Some(MoveTarget::Anchor(AnchorPoint::TopLeft)),
            ..Default::default()
        };

        // Window centered on the second monitor
        let resolved = resolver.resolve(&action, Rect::new(2500, 200, 400, 300));
        assert_eq!((resolved.x, resolved.y), (1920, 0));
    }

    #[test]
    fn test_center_outside_all_monitors_falls_back_to_primary() {
        let resolver = dual_monitor();
        let action = Action {
            move_to: Some(MoveTarget::Anchor(AnchorPoint::TopLeft)),
            ..Default::default()
        };

        let resolved = resolver.resolve(&action, Rect::new(-5000, -5000, 100, 100));
        assert_eq!((resolved.x, resolved.y), (0, 0));
    }

    #[test]
    fn test_out_of_range_target_monitor_auto_detects() {
        let resolver = dual_monitor();
        let action = Action {
            target_monitor: Some(9),
            move_to: Some(MoveTarget::Anchor(AnchorPoint::TopLeft)),
            ..Default::default()
        };

        let resolved = resolver.resolve(&action, Rect::new(2500, 200, 400, 300));
        assert_eq!((resolved.x, resolved.y), (1920, 0));
    }

    #[test]
    fn test_no_monitors_keeps_current() {
        let resolver = GeometryResolver::new(vec![], MonitorOffsets::default());
        let action = Action {
            move_to: Some(MoveTarget::Anchor(AnchorPoint::MiddleCenter)),
            resize: ResizeSpec {
                width: Some(SizeValue::Pixels(100)),
                height: Some(SizeValue::Pixels(100)),
            },
            ..Default::default()
        };

        let current = Rect::new(5, 6, 700, 800);
        assert_eq!(resolver.resolve(&action, current), current);
    }

    #[test]
    fn test_per_monitor_offsets_override_default() {
        let mut offsets = MonitorOffsets {
            default: Some(EdgeInsets {
                top: 10,
                ..Default::default()
            }),
            per_monitor: HashMap::new(),
        };
        offsets.per_monitor.insert(
            2,
            EdgeInsets {
                top: 200,
                ..Default::default()
            },
        );
        let resolver = GeometryResolver::new(
            vec![
                Rect::new(0, 0, 1920, 1080),
                Rect::new(1920, 0, 2560, 1440),
            ],
            offsets,
        );

        let action = Action {
            target_monitor: Some(2),
            move_to: Some(MoveTarget::Anchor(AnchorPoint::TopLeft)),
            ..Default::default()
        };

        let resolved = resolver.resolve(&action, Rect::new(0, 0, 400, 300));
        assert_eq!((resolved.x, resolved.y), (1920, 200));
    }
}
