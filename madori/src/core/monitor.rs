use std::collections::HashMap;

/// Rectangle in virtual-screen coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> (i32, i32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    /// Half-open containment: the right and bottom edges belong to the
    /// neighboring monitor.
    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }

    pub fn shrink(&self, insets: EdgeInsets) -> Rect {
        Rect {
            x: self.x + insets.left,
            y: self.y + insets.top,
            width: self.width - insets.left - insets.right,
            height: self.height - insets.top - insets.bottom,
        }
    }
}

/// Reserved edges subtracted from a monitor rectangle to form its work area.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeInsets {
    pub top: i32,
    pub bottom: i32,
    pub left: i32,
    pub right: i32,
}

/// Per-monitor work-area offsets. Lookup order: the monitor's own entry
/// (1-based index), then the default entry, then zero.
#[derive(Debug, Clone, Default)]
pub struct MonitorOffsets {
    pub default: Option<EdgeInsets>,
    pub per_monitor: HashMap<usize, EdgeInsets>,
}

impl MonitorOffsets {
    pub fn for_monitor(&self, monitor_number: usize) -> EdgeInsets {
        self.per_monitor
            .get(&monitor_number)
            .copied()
            .or(self.default)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center() {
        let r = Rect::new(100, 200, 800, 600);
        assert_eq!(r.center(), (500, 500));
    }

    #[test]
    fn test_contains_point_half_open() {
        let r = Rect::new(0, 0, 1920, 1080);
        assert!(r.contains_point(0, 0));
        assert!(r.contains_point(1919, 1079));
        assert!(!r.contains_point(1920, 0));
        assert!(!r.contains_point(0, 1080));
        assert!(!r.contains_point(-1, 0));
    }

    #[test]
    fn test_shrink() {
        let r = Rect::new(0, 0, 1920, 1080);
        let work = r.shrink(EdgeInsets {
            top: 40,
            bottom: 48,
            left: 0,
            right: 0,
        });
        assert_eq!(work, Rect::new(0, 40, 1920, 992));
    }

    #[test]
    fn test_offsets_lookup_order() {
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
                top: 40,
                ..Default::default()
            },
        );

        assert_eq!(offsets.for_monitor(2).top, 40);
        assert_eq!(offsets.for_monitor(1).top, 10);

        let empty = MonitorOffsets::default();
        assert_eq!(empty.for_monitor(1), EdgeInsets::default());
    }
}
