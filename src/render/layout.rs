use crate::config::SplitEdge;

/// A rectangle representing a screen area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    pub fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Cut `rows` rows off the given edge. Returns (rest, cut); the cut part
    /// is clamped so `rest` keeps at least one row.
    pub fn split_fixed(&self, rows: u16, edge: SplitEdge) -> (Rect, Rect) {
        let rows = rows.min(self.height.saturating_sub(1));
        let rest_height = self.height - rows;
        match edge {
            SplitEdge::Bottom => (
                Rect::new(self.x, self.y, self.width, rest_height),
                Rect::new(self.x, self.y + rest_height, self.width, rows),
            ),
            SplitEdge::Top => (
                Rect::new(self.x, self.y + rows, self.width, rest_height),
                Rect::new(self.x, self.y, self.width, rows),
            ),
        }
    }
}

/// Screen areas of the session view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub info: Rect,
    /// Output split including its title row
    pub output: Option<Rect>,
    pub status_row: u16,
}

impl Layout {
    /// `split` is the output split's height in rows, if one is open. The
    /// title row comes on top of that.
    pub fn compute(width: u16, height: u16, split: Option<(u16, SplitEdge)>) -> Self {
        let content = Rect::new(0, 0, width, height.saturating_sub(1));
        let status_row = height.saturating_sub(1);

        match split {
            Some((rows, edge)) => {
                let (info, output) = content.split_fixed(rows.saturating_add(1), edge);
                Self {
                    info,
                    output: Some(output),
                    status_row,
                }
            }
            None => Self {
                info: content,
                output: None,
                status_row,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bottom_split_has_fixed_height() {
        let layout = Layout::compute(80, 40, Some((15, SplitEdge::Bottom)));
        let output = layout.output.unwrap();
        assert_eq!(output.height, 16);
        assert_eq!(output.y + output.height, 39);
        assert_eq!(layout.info, Rect::new(0, 0, 80, 23));
        assert_eq!(layout.status_row, 39);
    }

    #[test]
    fn top_split_pushes_info_down() {
        let layout = Layout::compute(80, 40, Some((15, SplitEdge::Top)));
        assert_eq!(layout.output.unwrap(), Rect::new(0, 0, 80, 16));
        assert_eq!(layout.info.y, 16);
    }

    #[test]
    fn split_clamped_on_tiny_terminal() {
        let layout = Layout::compute(20, 6, Some((15, SplitEdge::Bottom)));
        assert_eq!(layout.info.height, 1);
        assert_eq!(layout.output.unwrap().height, 4);
    }

    #[test]
    fn no_split_uses_whole_content_area() {
        let layout = Layout::compute(80, 24, None);
        assert_eq!(layout.info, Rect::new(0, 0, 80, 23));
        assert!(layout.output.is_none());
    }
}
