//! JSON model files.
//!
//! Stories and Buildings are written in their persisted form: Room2Ds as flat
//! point lists plus per-segment attribute arrays. Reading runs the validating
//! constructors, so an inconsistent document fails to load.

use crate::{Building, Story};
use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Writes a Story to a JSON file.
///
/// # Example
/// ```no_run
/// use building2d::{Room2D, Story};
/// use building2d::io::write_story;
/// use std::path::Path;
///
/// let room = Room2D::from_vertices("Office", &[(0., 0.), (5., 0.), (5., 4.), (0., 4.)], &[], 0., 3.).unwrap();
/// let story = Story::new("Level1", vec![room]).unwrap();
/// write_story(Path::new("level1.json"), &story).unwrap();
/// ```
pub fn write_story(path: &Path, story: &Story) -> Result<()> {
    write_json(path, story).with_context(|| format!("Failed to write story {}", story.identifier()))
}

/// Reads a Story from a JSON file.
pub fn read_story(path: &Path) -> Result<Story> {
    read_json(path)
}

/// Writes a Building to a JSON file.
///
/// # Arguments
/// * `path` - Path to the output file
/// * `building` - The building to serialize
pub fn write_building(path: &Path, building: &Building) -> Result<()> {
    write_json(path, building).with_context(|| format!("Failed to write building {}", building.identifier()))
}

/// Reads a Building from a JSON file.
///
/// # Example
/// ```no_run
/// use building2d::io::read_building;
/// use std::path::Path;
///
/// let building = read_building(Path::new("model.json")).unwrap();
/// println!("Loaded building: {}", building.identifier());
/// ```
pub fn read_building(path: &Path) -> Result<Building> {
    read_json(path)
}

/// Serializes any model object to a pretty JSON string.
pub fn to_json_string<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize model to string")
}

/// Deserializes a model object from a JSON string.
pub fn from_json_string<T: DeserializeOwned>(json: &str) -> Result<T> {
    serde_json::from_str(json).context("Failed to deserialize model from string")
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create file: {}", path.display()))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, value)
        .with_context(|| format!("Failed to serialize model to: {}", path.display()))?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;
    let reader = BufReader::new(file);
    let value = serde_json::from_reader(reader)
        .with_context(|| format!("Failed to deserialize model from: {}", path.display()))?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::BoundaryCondition;
    use crate::config::WindowConflictPolicy;
    use crate::windows::WindowParameter;
    use crate::Room2D;
    use tempfile::tempdir;

    fn level(id: &str, z: f64) -> Story {
        let a = Room2D::from_vertices(&format!("{id}_A"), &[(0., 0.), (6., 0.), (6., 5.), (0., 5.)], &[], z, 3.)
            .unwrap();
        let b = Room2D::from_vertices(&format!("{id}_B"), &[(6., 0.), (10., 0.), (10., 5.), (6., 5.)], &[], z, 3.)
            .unwrap();
        let mut story = Story::new(id, vec![a, b]).unwrap();
        story
            .solve_room_2d_adjacency(0.01, WindowConflictPolicy::Strict, false)
            .unwrap();
        story
            .set_outdoor_window_parameters(Some(WindowParameter::simple_ratio(0.3).unwrap()))
            .unwrap();
        story
    }

    #[test]
    fn test_write_and_read_story() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("level.json");
        let original = level("L1", 0.);

        write_story(&path, &original)?;
        let loaded = read_story(&path)?;

        assert_eq!(loaded.identifier(), original.identifier());
        for (a, b) in loaded.room_2ds().iter().zip(original.room_2ds()) {
            assert_eq!(a.segments(), b.segments());
            assert_eq!(a.floor_geometry(), b.floor_geometry());
        }
        assert_eq!(
            loaded.room_2ds()[0].segments()[1].boundary_condition,
            BoundaryCondition::surface("L1_B", 3)
        );
        Ok(())
    }

    #[test]
    fn test_building_file_roundtrip() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("model.json");
        let mut upper = level("L2", 3.);
        upper.set_multiplier(3)?;
        let original = Building::new("Block", vec![level("L1", 0.), upper])?;

        write_building(&path, &original)?;
        let loaded = read_building(&path)?;

        assert_eq!(loaded.unique_stories().len(), 2);
        assert_eq!(loaded.unique_stories()[1].multiplier(), 3);
        assert!((loaded.floor_area() - original.floor_area()).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_string_roundtrip_and_missing_file() -> Result<()> {
        let story = level("L1", 0.);
        let json = to_json_string(&story)?;
        assert!(json.contains("boundary_condition_objects"));
        let back: Story = from_json_string(&json)?;
        assert_eq!(back.room_2ds().len(), 2);

        assert!(from_json_string::<Story>("{\"identifier\": \"L\"}").is_err());
        let dir = tempdir()?;
        assert!(read_story(&dir.path().join("missing.json")).is_err());
        Ok(())
    }
}
