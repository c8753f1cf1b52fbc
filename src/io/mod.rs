//! File I/O for floor-plate models.

pub mod json;

pub use json::{from_json_string, read_building, read_story, to_json_string, write_building, write_story};
