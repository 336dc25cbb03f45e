/*
[INPUT]:  Calls a ChartView makes on its surface
[OUTPUT]: RecordingSurface and SurfaceCall for unit tests
[POS]:    Test support - surface double for chart and page tests
[UPDATE]: When RenderSurface gains or changes methods
*/

use std::sync::{Arc, Mutex};

use super::RenderSurface;
use crate::normalize::ChartPoint;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SurfaceCall {
    SetData(Vec<ChartPoint>),
    FitContent,
    ApplyWidth(u16),
}

/// Surface that records every call; clones share the log so it can be read
/// after the view has taken ownership.
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingSurface {
    calls: Arc<Mutex<Vec<SurfaceCall>>>,
}

impl RecordingSurface {
    pub(crate) fn calls(&self) -> Vec<SurfaceCall> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn set_data_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, SurfaceCall::SetData(_)))
            .count()
    }
}

impl RenderSurface for RecordingSurface {
    fn set_data(&mut self, points: Vec<ChartPoint>) {
        self.calls.lock().unwrap().push(SurfaceCall::SetData(points));
    }

    fn fit_content(&mut self) {
        self.calls.lock().unwrap().push(SurfaceCall::FitContent);
    }

    fn apply_width(&mut self, width: u16) {
        self.calls.lock().unwrap().push(SurfaceCall::ApplyWidth(width));
    }
}
