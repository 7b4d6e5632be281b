use std::time::Duration;

use serde::Deserialize;

/// The nine named fractional points of a rectangle, used both as a target
/// location on the work area and as the window's own reference point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum AnchorPoint {
    #[default]
    TopLeft,
    TopCenter,
    TopRight,
    MiddleLeft,
    MiddleCenter,
    MiddleRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl AnchorPoint {
    pub fn ratios(&self) -> (f64, f64) {
        match self {
            AnchorPoint::TopLeft => (0.0, 0.0),
            AnchorPoint::TopCenter => (0.5, 0.0),
            AnchorPoint::TopRight => (1.0, 0.0),
            AnchorPoint::MiddleLeft => (0.0, 0.5),
            AnchorPoint::MiddleCenter => (0.5, 0.5),
            AnchorPoint::MiddleRight => (1.0, 0.5),
            AnchorPoint::BottomLeft => (0.0, 1.0),
            AnchorPoint::BottomCenter => (0.5, 1.0),
            AnchorPoint::BottomRight => (1.0, 1.0),
        }
    }
}

/// A size or coordinate value resolved against a base dimension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizeValue {
    Pixels(i32),
    Percent(f64),
}

impl SizeValue {
    /// Resolve to pixels against `base`. Percentages truncate toward zero.
    pub fn resolve(&self, base: i32) -> i32 {
        match self {
            SizeValue::Pixels(px) => *px,
            SizeValue::Percent(pct) => (base as f64 * pct / 100.0) as i32,
        }
    }
}

/// Parse a configuration size/coordinate string: `"50%"`, `"120px"`, or a
/// bare integer. Returns `None` for anything else.
pub fn parse_size_value(raw: &str) -> Option<SizeValue> {
    let raw = raw.trim();
    if let Some(pct) = raw.strip_suffix('%') {
        return pct.trim().parse::<f64>().ok().map(SizeValue::Percent);
    }
    let pixels = raw.strip_suffix("px").unwrap_or(raw);
    pixels.trim().parse::<i32>().ok().map(SizeValue::Pixels)
}

/// Where to move a window: a named anchor on the work area, or explicit
/// monitor-relative coordinates. A `None` coordinate means the value was
/// unparseable at load; that axis keeps the window's current position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveTarget {
    Anchor(AnchorPoint),
    Coords {
        x: Option<SizeValue>,
        y: Option<SizeValue>,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResizeSpec {
    pub width: Option<SizeValue>,
    pub height: Option<SizeValue>,
}

impl ResizeSpec {
    pub fn is_set(&self) -> bool {
        self.width.is_some() || self.height.is_some()
    }
}

/// What to do with a matched window.
#[derive(Debug, Clone, Default)]
pub struct Action {
    pub anchor: AnchorPoint,
    pub move_to: Option<MoveTarget>,
    pub resize: ResizeSpec,
    pub offset: (i32, i32),
    /// 1-based monitor index; out-of-range falls back to auto-detection.
    pub target_monitor: Option<usize>,
    pub maximize: bool,
    pub minimize: bool,
    pub execution_delay: Option<Duration>,
    /// 1-based virtual desktop number.
    pub target_desktop: Option<usize>,
}

impl Action {
    /// Whether the action requests any geometry change at all. Maximize and
    /// minimize are handled separately and take precedence.
    pub fn has_geometry(&self) -> bool {
        self.move_to.is_some() || self.resize.is_set()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_integer() {
        assert_eq!(parse_size_value("320"), Some(SizeValue::Pixels(320)));
        assert_eq!(parse_size_value(" -40 "), Some(SizeValue::Pixels(-40)));
    }

    #[test]
    fn test_parse_px_suffix() {
        assert_eq!(parse_size_value("120px"), Some(SizeValue::Pixels(120)));
    }

    #[test]
    fn test_parse_percent() {
        assert_eq!(parse_size_value("50%"), Some(SizeValue::Percent(50.0)));
        assert_eq!(parse_size_value("33.3%"), Some(SizeValue::Percent(33.3)));
    }

    #[test]
    fn test_parse_garbage() {
        assert_eq!(parse_size_value("wide"), None);
        assert_eq!(parse_size_value("50%%"), None);
        assert_eq!(parse_size_value(""), None);
    }

    #[test]
    fn test_percent_resolution() {
        assert_eq!(SizeValue::Percent(50.0).resolve(1000), 500);
        assert_eq!(SizeValue::Percent(33.3).resolve(1000), 333);
        assert_eq!(SizeValue::Pixels(320).resolve(1000), 320);
    }

    #[test]
    fn test_anchor_ratios() {
        assert_eq!(AnchorPoint::TopLeft.ratios(), (0.0, 0.0));
        assert_eq!(AnchorPoint::MiddleCenter.ratios(), (0.5, 0.5));
        assert_eq!(AnchorPoint::BottomRight.ratios(), (1.0, 1.0));
    }

    #[test]
    fn test_has_geometry() {
        assert!(!Action::default().has_geometry());

        let moved = Action {
            move_to: Some(MoveTarget::Anchor(AnchorPoint::TopLeft)),
            ..Default::default()
        };
        assert!(moved.has_geometry());

        let resized = Action {
            resize: ResizeSpec {
                width: Some(SizeValue::Pixels(800)),
                height: None,
            },
            ..Default::default()
        };
        assert!(resized.has_geometry());
    }
}
