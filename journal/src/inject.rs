/// Bounding box of a candidate text field on the host page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldGeometry {
    pub width: f64,
    pub height: f64,
}

impl FieldGeometry {
    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }
}

/// Index of the field the message should be typed into: the largest by
/// area, the first one on ties or when every field is zero-sized.
pub fn most_prominent(fields: &[FieldGeometry]) -> Option<usize> {
    if fields.is_empty() {
        return None;
    }
    let mut best = 0;
    let mut best_area = 0.0;
    for (i, field) in fields.iter().enumerate() {
        let area = field.area();
        if area > best_area {
            best = i;
            best_area = area;
        }
    }
    Some(best)
}
