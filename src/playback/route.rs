use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

use crate::{
    db::LocationSample,
    geometry::{path_length_km, Bounds, Coordinate},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePoint {
    /// 1-based, in recording order.
    pub sequence: usize,
    pub sample_id: String,
    pub coordinate: Coordinate,
    pub area_label: String,
    pub recorded_at: DateTime<Utc>,
    /// `hh:mm AM`, in the viewer's offset.
    pub time_label: String,
}

impl RoutePoint {
    pub fn info_text(&self) -> String {
        format!("Stop {}\n{}\n{}", self.sequence, self.area_label, self.time_label)
    }
}

/// Static view of one session's route.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteOverview {
    pub points: Vec<RoutePoint>,
    pub total_distance_km: f64,
    pub bounds: Option<Bounds>,
}

impl RouteOverview {
    /// `samples` must already be chronological.
    pub fn from_samples(samples: &[LocationSample], offset: FixedOffset) -> Self {
        let points: Vec<RoutePoint> = samples
            .iter()
            .enumerate()
            .map(|(index, sample)| RoutePoint {
                sequence: index + 1,
                sample_id: sample.id.clone(),
                coordinate: sample.coordinate,
                area_label: sample.area_label.clone(),
                recorded_at: sample.recorded_at,
                time_label: format_time_label(sample.recorded_at, offset),
            })
            .collect();

        let path: Vec<Coordinate> = points.iter().map(|point| point.coordinate).collect();
        Self {
            total_distance_km: path_length_km(&path),
            bounds: Bounds::from_points(&path),
            points,
        }
    }

    pub fn path(&self) -> Vec<Coordinate> {
        self.points.iter().map(|point| point.coordinate).collect()
    }

    pub fn point(&self, sequence: usize) -> Option<&RoutePoint> {
        self.points.iter().find(|point| point.sequence == sequence)
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

pub fn format_time_label(at: DateTime<Utc>, offset: FixedOffset) -> String {
    at.with_timezone(&offset).format("%I:%M %p").to_string()
}
