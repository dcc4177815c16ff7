use std::{sync::Mutex, time::Duration};

use anyhow::{bail, Result};
use async_trait::async_trait;
use fieldtrack::{
    geometry::{Bounds, Coordinate},
    playback::{MapSurface, MarkerId, MarkerSpec},
};

#[derive(Debug, Clone, PartialEq)]
pub enum MapCall {
    AddMarker(MarkerId, MarkerSpec),
    RemoveMarker(MarkerId),
    Polyline(Vec<Coordinate>),
    Move(MarkerId, Coordinate, f64),
    FitBounds(Bounds),
    PanTo(Coordinate),
    Info(Coordinate, String),
}

#[derive(Default)]
pub struct MockMap {
    calls: Mutex<Vec<MapCall>>,
    next_id: Mutex<u64>,
    broken: bool,
    first_move_delay: Mutex<Option<Duration>>,
}

impl MockMap {
    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    /// The first `move_marker` call blocks its thread for `delay` before it
    /// is recorded, like a slow map redraw.
    pub fn slow_first_move(delay: Duration) -> Self {
        Self {
            first_move_delay: Mutex::new(Some(delay)),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<MapCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn moves(&self) -> Vec<(MarkerId, Coordinate, f64)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                MapCall::Move(id, position, heading) => Some((id, position, heading)),
                _ => None,
            })
            .collect()
    }

    pub fn removed(&self) -> Vec<MarkerId> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                MapCall::RemoveMarker(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: MapCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl MapSurface for MockMap {
    async fn ready(&self) -> Result<()> {
        if self.broken {
            bail!("maps script failed to load");
        }
        Ok(())
    }

    fn add_marker(&self, spec: &MarkerSpec) -> MarkerId {
        let id = {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            MarkerId(*next)
        };
        self.record(MapCall::AddMarker(id, spec.clone()));
        id
    }

    fn remove_marker(&self, id: MarkerId) {
        self.record(MapCall::RemoveMarker(id));
    }

    fn draw_polyline(&self, path: &[Coordinate]) {
        self.record(MapCall::Polyline(path.to_vec()));
    }

    fn move_marker(&self, id: MarkerId, position: Coordinate, heading: f64) {
        let delay = self.first_move_delay.lock().unwrap().take();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        self.record(MapCall::Move(id, position, heading));
    }

    fn fit_bounds(&self, bounds: &Bounds) {
        self.record(MapCall::FitBounds(*bounds));
    }

    fn pan_to(&self, position: Coordinate) {
        self.record(MapCall::PanTo(position));
    }

    fn show_info(&self, position: Coordinate, content: &str) {
        self.record(MapCall::Info(position, content.to_string()));
    }
}
