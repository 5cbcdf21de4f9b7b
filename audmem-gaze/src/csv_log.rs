use crate::error::GazeError;
use crate::sample::{EyeSample, GazeSample};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// Column count of the gaze log: trial index plus 32 sample fields.
pub const GAZE_COLUMNS: usize = 33;

#[derive(Debug, Serialize, Deserialize)]
struct GazeRow {
    trial: usize,
    device_time_stamp: i64,
    system_time_stamp: i64,
    left_gaze_point_on_display_area_x: f64,
    left_gaze_point_on_display_area_y: f64,
    left_gaze_point_in_user_coordinate_system_x: f64,
    left_gaze_point_in_user_coordinate_system_y: f64,
    left_gaze_point_in_user_coordinate_system_z: f64,
    left_gaze_point_validity: u8,
    left_pupil_diameter: f64,
    left_pupil_validity: u8,
    left_gaze_origin_in_user_coordinate_system_x: f64,
    left_gaze_origin_in_user_coordinate_system_y: f64,
    left_gaze_origin_in_user_coordinate_system_z: f64,
    left_gaze_origin_in_trackbox_coordinate_system_x: f64,
    left_gaze_origin_in_trackbox_coordinate_system_y: f64,
    left_gaze_origin_in_trackbox_coordinate_system_z: f64,
    left_gaze_origin_validity: u8,
    right_gaze_point_on_display_area_x: f64,
    right_gaze_point_on_display_area_y: f64,
    right_gaze_point_in_user_coordinate_system_x: f64,
    right_gaze_point_in_user_coordinate_system_y: f64,
    right_gaze_point_in_user_coordinate_system_z: f64,
    right_gaze_point_validity: u8,
    right_pupil_diameter: f64,
    right_pupil_validity: u8,
    right_gaze_origin_in_user_coordinate_system_x: f64,
    right_gaze_origin_in_user_coordinate_system_y: f64,
    right_gaze_origin_in_user_coordinate_system_z: f64,
    right_gaze_origin_in_trackbox_coordinate_system_x: f64,
    right_gaze_origin_in_trackbox_coordinate_system_y: f64,
    right_gaze_origin_in_trackbox_coordinate_system_z: f64,
    right_gaze_origin_validity: u8,
}

impl GazeRow {
    fn new(trial: usize, s: &GazeSample) -> Self {
        let (l, r) = (&s.left, &s.right);
        Self {
            trial,
            device_time_stamp: s.device_time_us,
            system_time_stamp: s.system_time_us,
            left_gaze_point_on_display_area_x: l.gaze_point_display[0],
            left_gaze_point_on_display_area_y: l.gaze_point_display[1],
            left_gaze_point_in_user_coordinate_system_x: l.gaze_point_user[0],
            left_gaze_point_in_user_coordinate_system_y: l.gaze_point_user[1],
            left_gaze_point_in_user_coordinate_system_z: l.gaze_point_user[2],
            left_gaze_point_validity: l.gaze_point_valid as u8,
            left_pupil_diameter: l.pupil_diameter,
            left_pupil_validity: l.pupil_valid as u8,
            left_gaze_origin_in_user_coordinate_system_x: l.gaze_origin_user[0],
            left_gaze_origin_in_user_coordinate_system_y: l.gaze_origin_user[1],
            left_gaze_origin_in_user_coordinate_system_z: l.gaze_origin_user[2],
            left_gaze_origin_in_trackbox_coordinate_system_x: l.gaze_origin_trackbox[0],
            left_gaze_origin_in_trackbox_coordinate_system_y: l.gaze_origin_trackbox[1],
            left_gaze_origin_in_trackbox_coordinate_system_z: l.gaze_origin_trackbox[2],
            left_gaze_origin_validity: l.gaze_origin_valid as u8,
            right_gaze_point_on_display_area_x: r.gaze_point_display[0],
            right_gaze_point_on_display_area_y: r.gaze_point_display[1],
            right_gaze_point_in_user_coordinate_system_x: r.gaze_point_user[0],
            right_gaze_point_in_user_coordinate_system_y: r.gaze_point_user[1],
            right_gaze_point_in_user_coordinate_system_z: r.gaze_point_user[2],
            right_gaze_point_validity: r.gaze_point_valid as u8,
            right_pupil_diameter: r.pupil_diameter,
            right_pupil_validity: r.pupil_valid as u8,
            right_gaze_origin_in_user_coordinate_system_x: r.gaze_origin_user[0],
            right_gaze_origin_in_user_coordinate_system_y: r.gaze_origin_user[1],
            right_gaze_origin_in_user_coordinate_system_z: r.gaze_origin_user[2],
            right_gaze_origin_in_trackbox_coordinate_system_x: r.gaze_origin_trackbox[0],
            right_gaze_origin_in_trackbox_coordinate_system_y: r.gaze_origin_trackbox[1],
            right_gaze_origin_in_trackbox_coordinate_system_z: r.gaze_origin_trackbox[2],
            right_gaze_origin_validity: r.gaze_origin_valid as u8,
        }
    }

    fn into_sample(self) -> GazeSample {
        GazeSample {
            device_time_us: self.device_time_stamp,
            system_time_us: self.system_time_stamp,
            left: EyeSample {
                gaze_point_display: [
                    self.left_gaze_point_on_display_area_x,
                    self.left_gaze_point_on_display_area_y,
                ],
                gaze_point_user: [
                    self.left_gaze_point_in_user_coordinate_system_x,
                    self.left_gaze_point_in_user_coordinate_system_y,
                    self.left_gaze_point_in_user_coordinate_system_z,
                ],
                gaze_point_valid: self.left_gaze_point_validity != 0,
                pupil_diameter: self.left_pupil_diameter,
                pupil_valid: self.left_pupil_validity != 0,
                gaze_origin_user: [
                    self.left_gaze_origin_in_user_coordinate_system_x,
                    self.left_gaze_origin_in_user_coordinate_system_y,
                    self.left_gaze_origin_in_user_coordinate_system_z,
                ],
                gaze_origin_trackbox: [
                    self.left_gaze_origin_in_trackbox_coordinate_system_x,
                    self.left_gaze_origin_in_trackbox_coordinate_system_y,
                    self.left_gaze_origin_in_trackbox_coordinate_system_z,
                ],
                gaze_origin_valid: self.left_gaze_origin_validity != 0,
            },
            right: EyeSample {
                gaze_point_display: [
                    self.right_gaze_point_on_display_area_x,
                    self.right_gaze_point_on_display_area_y,
                ],
                gaze_point_user: [
                    self.right_gaze_point_in_user_coordinate_system_x,
                    self.right_gaze_point_in_user_coordinate_system_y,
                    self.right_gaze_point_in_user_coordinate_system_z,
                ],
                gaze_point_valid: self.right_gaze_point_validity != 0,
                pupil_diameter: self.right_pupil_diameter,
                pupil_valid: self.right_pupil_validity != 0,
                gaze_origin_user: [
                    self.right_gaze_origin_in_user_coordinate_system_x,
                    self.right_gaze_origin_in_user_coordinate_system_y,
                    self.right_gaze_origin_in_user_coordinate_system_z,
                ],
                gaze_origin_trackbox: [
                    self.right_gaze_origin_in_trackbox_coordinate_system_x,
                    self.right_gaze_origin_in_trackbox_coordinate_system_y,
                    self.right_gaze_origin_in_trackbox_coordinate_system_z,
                ],
                gaze_origin_valid: self.right_gaze_origin_validity != 0,
            },
        }
    }
}

/// Append-only CSV log of raw gaze samples, one block of rows per trial.
pub struct GazeLog {
    writer: csv::Writer<File>,
    rows: usize,
}

impl GazeLog {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, GazeError> {
        Ok(Self {
            writer: csv::Writer::from_path(path)?,
            rows: 0,
        })
    }

    pub fn write_trial(&mut self, trial: usize, samples: &[GazeSample]) -> Result<(), GazeError> {
        for sample in samples {
            self.writer.serialize(GazeRow::new(trial, sample))?;
        }
        self.writer.flush()?;
        self.rows += samples.len();
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }
}

/// Loads a gaze log written by [`GazeLog`], dropping the trial column.
pub fn read_gaze_csv(path: impl AsRef<Path>) -> Result<Vec<GazeSample>, GazeError> {
    let mut reader = csv::Reader::from_path(path)?;
    reader
        .deserialize::<GazeRow>()
        .map(|row| Ok(row?.into_sample()))
        .collect()
}
