use crate::config::ConversionConfig;
use crate::error::{BatchReport, Error, Result};
use crate::geom::point::Point;
use crate::geom::validate_name;
use crate::geom::vector::Vector;
use crate::name::{FindByName, HasName};
use crate::room2d::Room2D;
use crate::shading::ShadingParameter;
use crate::story::{Conversion, Story};
use crate::uid::UID;
use crate::windows::WindowParameter;
use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Stories stacked into one building.
///
/// Only unique stories are stored; repeats are described by each Story's
/// multiplier and expanded on demand by [`Building::all_stories`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "BuildingData", into = "BuildingData")]
pub struct Building {
    identifier: String,
    pub uid: UID,
    unique_stories: Vec<Story>,
}

impl HasName for Building {
    fn get_name(&self) -> &str {
        &self.identifier
    }
}

impl Building {
    /// Creates a Building. Stories are sorted by floor height.
    ///
    /// Story identifiers and Room2D identifiers must be unique across the Building.
    pub fn new(identifier: &str, stories: Vec<Story>) -> Result<Self> {
        let identifier = validate_name(identifier).map_err(|e| Error::construction("Building", e))?;
        let mut building = Self {
            identifier,
            uid: UID::new(),
            unique_stories: Vec::new(),
        };
        building.set_stories(stories)?;
        Ok(building)
    }

    fn set_stories(&mut self, mut stories: Vec<Story>) -> Result<()> {
        let object = || format!("Building \"{}\"", self.identifier);
        if stories.is_empty() {
            return Err(Error::construction(object(), "a Building needs at least one Story"));
        }
        let dups = stories.duplicate_names();
        if !dups.is_empty() {
            return Err(Error::construction(
                object(),
                format!("duplicate Story identifiers: {}", dups.join(", ")),
            ));
        }
        let rooms: Vec<&Room2D> = stories.iter().flat_map(|s| s.room_2ds()).collect();
        let dups = rooms.duplicate_names();
        if !dups.is_empty() {
            return Err(Error::construction(
                object(),
                format!("duplicate Room2D identifiers: {}", dups.join(", ")),
            ));
        }
        stories.sort_by(|a, b| a.floor_height().total_cmp(&b.floor_height()));
        for story in &mut stories {
            story.parent = Some(self.uid.clone());
        }
        self.unique_stories = stories;
        Ok(())
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn unique_stories(&self) -> &[Story] {
        &self.unique_stories
    }

    pub fn story_by_identifier(&self, identifier: &str) -> Result<&Story> {
        self.unique_stories
            .find_by_name(identifier)
            .ok_or_else(|| Error::not_found("Story", identifier))
    }

    pub fn unique_room_2ds(&self) -> Vec<&Room2D> {
        self.unique_stories.iter().flat_map(|s| s.room_2ds()).collect()
    }

    /// Every floor of the building, with multipliers expanded.
    ///
    /// Repeat `i` (counted from 0) of a Story is moved up by
    /// `i * floor_to_floor_height` and prefixed with `Flr<i+1>`. All returned
    /// stories have a multiplier of 1. Only the bottom repeat keeps ground
    /// contact and only the top repeat stays top exposed.
    pub fn all_stories(&self) -> Vec<Story> {
        let mut stories = Vec::new();
        for story in &self.unique_stories {
            let ftf = story.floor_to_floor_height();
            let multiplier = story.multiplier();
            for i in 0..multiplier {
                let mut repeat = story.single_repeat();
                if i > 0 {
                    repeat.add_prefix(&format!("Flr{}", i + 1));
                    repeat.move_by(&Vector::new(0., 0., ftf * i as f64));
                    repeat.set_ground_contact(false);
                }
                if i + 1 < multiplier {
                    repeat.set_top_exposed(false);
                }
                stories.push(repeat);
            }
        }
        stories
    }

    pub fn all_room_2ds(&self) -> Vec<Room2D> {
        self.all_stories()
            .into_iter()
            .flat_map(|s| s.room_2ds().to_vec())
            .collect()
    }

    /// Elevation of the top of the highest Story repeat.
    pub fn height(&self) -> f64 {
        self.unique_stories
            .iter()
            .map(|s| s.floor_height() + s.floor_to_floor_height() * s.multiplier() as f64)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn height_from_first_floor(&self) -> f64 {
        let first = self.unique_stories.first().map_or(0., |s| s.floor_height());
        self.height() - first
    }

    /// Floor area including Story multipliers.
    pub fn floor_area(&self) -> f64 {
        self.multiplied(Story::floor_area)
    }

    pub fn volume(&self) -> f64 {
        self.multiplied(Story::volume)
    }

    pub fn exterior_wall_area(&self) -> f64 {
        self.multiplied(Story::exterior_wall_area)
    }

    pub fn exterior_aperture_area(&self) -> f64 {
        self.multiplied(Story::exterior_aperture_area)
    }

    fn multiplied(&self, f: fn(&Story) -> f64) -> f64 {
        self.unique_stories.iter().map(|s| f(s) * s.multiplier() as f64).sum()
    }

    /// Marks the lowest Story as in ground contact and the highest as top exposed.
    ///
    /// A multiplied bottom Story has its first repeat separated from the
    /// others (the rest moves up one floor under the `Upper` prefix). A
    /// multiplied top Story has its last repeat separated under the `Top`
    /// prefix. Only the separated repeats get the flags.
    pub fn auto_assign_top_bottom_floors(&mut self) -> Result<()> {
        let mut stories = self.unique_stories.clone();
        separate_top_bottom(&mut stories)?;
        self.set_stories(stories)
    }

    pub fn set_outdoor_window_parameters(&mut self, window: Option<WindowParameter>) -> Result<()> {
        for story in &mut self.unique_stories {
            story.set_outdoor_window_parameters(window.clone())?;
        }
        Ok(())
    }

    pub fn set_outdoor_shading_parameters(&mut self, shading: Option<ShadingParameter>) -> Result<()> {
        for story in &mut self.unique_stories {
            story.set_outdoor_shading_parameters(shading.clone())?;
        }
        Ok(())
    }

    pub fn move_by(&mut self, vec: &Vector) {
        for story in &mut self.unique_stories {
            story.move_by(vec);
        }
    }

    pub fn rotate_xy(&mut self, angle: f64, origin: Point) -> Result<()> {
        for story in &mut self.unique_stories {
            story.rotate_xy(angle, origin)?;
        }
        Ok(())
    }

    pub fn reflect(&mut self, normal: &Vector, origin: Point) -> Result<()> {
        for story in &mut self.unique_stories {
            story.reflect(normal, origin)?;
        }
        Ok(())
    }

    pub fn scale(&mut self, factor: f64, origin: Option<Point>) -> Result<()> {
        for story in &mut self.unique_stories {
            story.scale(factor, origin)?;
        }
        Ok(())
    }

    /// Converts all stories to 3D rooms.
    ///
    /// With `config.use_multiplier` each unique Story is converted once and
    /// its rooms carry the Story multiplier. Otherwise every repeat is
    /// converted as full geometry. Stories are converted in parallel.
    pub fn to_rooms(&self, config: &ConversionConfig) -> Conversion {
        let stories = if config.use_multiplier {
            self.unique_stories.clone()
        } else {
            self.all_stories()
        };
        let parts: Vec<Conversion> = stories.par_iter().map(|s| s.to_rooms(config)).collect();

        let mut conversion = Conversion {
            report: BatchReport::new(&format!("to_rooms on Building {}", self.identifier)),
            ..Default::default()
        };
        for part in parts {
            conversion.rooms.extend(part.rooms);
            conversion.outcomes.extend(part.outcomes);
            conversion.report.extend(part.report);
        }
        info!(
            "Building {}: {} room(s) from {} story(ies)",
            self.identifier,
            conversion.rooms.len(),
            stories.len()
        );
        conversion
    }
}

fn separate_top_bottom(stories: &mut Vec<Story>) -> Result<()> {
    if stories.is_empty() {
        return Ok(());
    }
    let bottom = &mut stories[0];
    if bottom.multiplier() > 1 {
        let mut upper = bottom.duplicate();
        upper.add_prefix("Upper");
        upper.set_multiplier(bottom.multiplier() - 1)?;
        upper.move_by(&Vector::new(0., 0., bottom.floor_to_floor_height()));
        upper.set_ground_contact(false);
        bottom.set_multiplier(1)?;
        stories.insert(1, upper);
    }
    stories[0].set_ground_contact(true);

    let last = stories.len() - 1;
    let top_story = &mut stories[last];
    if top_story.multiplier() > 1 {
        let repeats = top_story.multiplier() - 1;
        let mut top = top_story.duplicate();
        top.add_prefix("Top");
        top.set_multiplier(1)?;
        top.move_by(&Vector::new(0., 0., top_story.floor_to_floor_height() * repeats as f64));
        top.set_ground_contact(false);
        top.set_top_exposed(true);
        top_story.set_multiplier(repeats)?;
        stories.push(top);
    } else {
        top_story.set_top_exposed(true);
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BuildingData {
    identifier: String,
    unique_stories: Vec<Story>,
}

impl From<Building> for BuildingData {
    fn from(building: Building) -> Self {
        Self {
            identifier: building.identifier,
            unique_stories: building.unique_stories,
        }
    }
}

impl TryFrom<BuildingData> for Building {
    type Error = String;

    fn try_from(data: BuildingData) -> std::result::Result<Self, Self::Error> {
        Building::new(&data.identifier, data.unique_stories).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::IsClose;

    fn story(id: &str, room: &str, z: f64, multiplier: usize) -> Story {
        let r = Room2D::from_vertices(room, &[(0., 0.), (10., 0.), (10., 10.), (0., 10.)], &[], z, 3.).unwrap();
        let mut s = Story::new(id, vec![r]).unwrap();
        s.set_multiplier(multiplier).unwrap();
        s
    }

    #[test]
    fn test_stories_are_sorted() {
        let b = Building::new("B", vec![story("Second", "R2", 3., 1), story("First", "R1", 0., 1)]).unwrap();
        let ids: Vec<&str> = b.unique_stories().iter().map(|s| s.identifier()).collect();
        assert_eq!(ids, vec!["First", "Second"]);
        assert!(b.unique_stories().iter().all(|s| s.parent.as_ref() == Some(&b.uid)));
        assert!(b.story_by_identifier("Third").is_err());
    }

    #[test]
    fn test_duplicate_room_ids_rejected() {
        let err = Building::new("B", vec![story("First", "R", 0., 1), story("Second", "R", 3., 1)]);
        assert!(matches!(err, Err(Error::Construction { .. })));
    }

    #[test]
    fn test_multiplier_aware_totals() {
        let b = Building::new("Tower", vec![story("Typical", "Office", 0., 4)]).unwrap();
        assert!(b.floor_area().is_close(400.));
        assert!(b.volume().is_close(1200.));
        assert!(b.height().is_close(12.));
        assert!(b.unique_stories()[0].floor_area().is_close(100.));
    }

    #[test]
    fn test_all_stories_expands_multipliers() {
        let b = Building::new("Tower", vec![story("Typical", "Office", 0., 3)]).unwrap();
        let all = b.all_stories();
        assert_eq!(all.len(), 3);
        assert_eq!(all[2].identifier(), "Flr3_Typical");
        assert_eq!(all[2].room_2ds()[0].identifier(), "Flr3_Office");
        assert!(all[2].floor_height().is_close(6.));
        assert!(all.iter().all(|s| s.multiplier() == 1));
        assert_eq!(b.all_room_2ds().len(), 3);
    }

    #[test]
    fn test_all_stories_keeps_exposure_at_the_ends() {
        let mut typical = story("Typical", "Office", 0., 3);
        typical.set_ground_contact(true);
        typical.set_top_exposed(true);
        let b = Building::new("Tower", vec![typical]).unwrap();
        let flags: Vec<(bool, bool)> = b
            .all_stories()
            .iter()
            .map(|s| (s.room_2ds()[0].is_ground_contact, s.room_2ds()[0].is_top_exposed))
            .collect();
        assert_eq!(flags, vec![(true, false), (false, false), (false, true)]);

        let unique = &b.unique_stories()[0].room_2ds()[0];
        assert!(unique.is_ground_contact && unique.is_top_exposed);
    }

    #[test]
    fn test_auto_assign_top_bottom_floors() {
        let mut b = Building::new("Tower", vec![story("Typical", "Office", 0., 5)]).unwrap();
        b.auto_assign_top_bottom_floors().unwrap();
        let stories = b.unique_stories();
        let summary: Vec<(&str, usize)> = stories.iter().map(|s| (s.identifier(), s.multiplier())).collect();
        assert_eq!(
            summary,
            vec![("Typical", 1), ("Upper_Typical", 3), ("Top_Upper_Typical", 1)]
        );
        assert!(stories[0].room_2ds()[0].is_ground_contact);
        assert!(!stories[1].room_2ds()[0].is_ground_contact);
        assert!(!stories[1].room_2ds()[0].is_top_exposed);
        assert!(stories[2].room_2ds()[0].is_top_exposed);
        assert!(stories[2].floor_height().is_close(12.));
        assert!(b.floor_area().is_close(500.));
    }

    #[test]
    fn test_to_rooms_multiplier_modes() {
        let b = Building::new("Tower", vec![story("Typical", "Office", 0., 3)]).unwrap();
        let with_multiplier = b.to_rooms(&ConversionConfig::default());
        assert_eq!(with_multiplier.rooms.len(), 1);
        assert_eq!(with_multiplier.rooms[0].multiplier, 3);

        let full = b.to_rooms(&ConversionConfig::default().with_use_multiplier(false));
        assert_eq!(full.rooms.len(), 3);
        assert!(full.rooms.iter().all(|r| r.multiplier == 1));
        assert!(full.report.is_ok());
    }
}
