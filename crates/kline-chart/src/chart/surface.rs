/*
[INPUT]:  Normalized chart points and container width from ChartView
[OUTPUT]: RenderSurface trait implemented by drawable charts
[POS]:    Chart layer - seam between the view and the drawing backend
[UPDATE]: When the view needs new operations from the drawing backend
*/

use crate::normalize::ChartPoint;

/// Drawing backend the chart view writes to.
///
/// Created once per mount and updated in place.
pub trait RenderSurface {
    /// Replace the whole series
    fn set_data(&mut self, points: Vec<ChartPoint>);

    /// Fit the visible time range to the current series
    fn fit_content(&mut self);

    /// Re-apply the container width after a resize
    fn apply_width(&mut self, width: u16);
}
