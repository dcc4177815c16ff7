use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use crate::geometry::{Bounds, Coordinate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MarkerId(pub u64);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MarkerStyle {
    /// Numbered stop on the static route.
    Stop { sequence: usize },
    /// Directional marker driven by playback.
    Mover,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerSpec {
    pub position: Coordinate,
    pub label: Option<String>,
    pub title: Option<String>,
    pub style: MarkerStyle,
}

/// Map-drawing capability. Loading the map library, retries and script
/// injection all live behind `ready`; drawing calls are fire-and-forget so
/// they can be made from timer ticks and from `Drop`.
#[async_trait]
pub trait MapSurface: Send + Sync {
    /// Resolves once the map can be drawn on.
    async fn ready(&self) -> Result<()>;

    fn add_marker(&self, spec: &MarkerSpec) -> MarkerId;
    fn remove_marker(&self, id: MarkerId);
    fn draw_polyline(&self, path: &[Coordinate]);
    fn move_marker(&self, id: MarkerId, position: Coordinate, heading: f64);
    fn fit_bounds(&self, bounds: &Bounds);
    fn pan_to(&self, position: Coordinate);
    fn show_info(&self, position: Coordinate, content: &str);
}
