use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use fieldtrack::{
    geometry::Coordinate,
    sensing::{LocationError, LocationProvider, PermissionState, PositionOptions},
};

/// Replays scripted replies, then keeps answering with `steady`.
pub struct MockLocation {
    permission: Mutex<PermissionState>,
    script: Mutex<VecDeque<Result<Coordinate, LocationError>>>,
    steady: Coordinate,
    calls: Mutex<Vec<PositionOptions>>,
}

impl MockLocation {
    pub fn steady(coordinate: Coordinate) -> Arc<Self> {
        Self::scripted(Vec::new(), coordinate)
    }

    pub fn scripted(script: Vec<Result<Coordinate, LocationError>>, steady: Coordinate) -> Arc<Self> {
        Arc::new(Self {
            permission: Mutex::new(PermissionState::Granted),
            script: Mutex::new(script.into()),
            steady,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn set_permission(&self, permission: PermissionState) {
        *self.permission.lock().unwrap() = permission;
    }

    pub fn calls(&self) -> Vec<PositionOptions> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LocationProvider for MockLocation {
    async fn request_permission(&self) -> PermissionState {
        *self.permission.lock().unwrap()
    }

    async fn current_position(&self, options: PositionOptions) -> Result<Coordinate, LocationError> {
        self.calls.lock().unwrap().push(options);
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or(Ok(self.steady))
    }
}
