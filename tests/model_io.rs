use anyhow::Result;
use building2d::io::{from_json_string, read_building, read_story, to_json_string, write_building, write_story};
use building2d::{
    BoundaryCondition, Building, Room2D, ShadingParameter, Story, WindowConflictPolicy, WindowParameter,
};
use tempfile::tempdir;

fn courtyard_story() -> Story {
    let mut ring = Room2D::from_vertices(
        "Ring",
        &[(0., 0.), (20., 0.), (20., 20.), (0., 20.)],
        &[vec![(5., 5.), (5., 15.), (15., 15.), (15., 5.)]],
        0.,
        3.5,
    )
    .unwrap();
    ring.set_window_parameter(
        0,
        Some(WindowParameter::repeating_ratio(0.4, 1.6, 0.8, 3., 0.).unwrap()),
    )
    .unwrap();
    ring.set_shading_parameter(0, Some(ShadingParameter::Overhang { depth: 0.6, angle: 10. }))
        .unwrap();
    ring.set_boundary_condition(2, BoundaryCondition::Adiabatic).unwrap();
    ring.is_ground_contact = true;

    let annex = Room2D::from_vertices("Annex", &[(20., 0.), (30., 0.), (30., 20.), (20., 20.)], &[], 0., 3.5).unwrap();
    let mut story = Story::new("Ground", vec![ring, annex]).unwrap();
    story
        .solve_room_2d_adjacency(0.01, WindowConflictPolicy::Strict, true)
        .unwrap();
    story
}

#[test]
fn test_story_file_keeps_segment_arrays() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("ground.json");
    let story = courtyard_story();

    write_story(&path, &story)?;
    let loaded = read_story(&path)?;

    for (a, b) in loaded.room_2ds().iter().zip(story.room_2ds()) {
        assert_eq!(a.identifier(), b.identifier());
        assert_eq!(a.segments(), b.segments());
        assert_eq!(a.floor_geometry(), b.floor_geometry());
        assert_eq!(a.is_ground_contact, b.is_ground_contact);
    }
    assert_eq!(loaded.room_2ds()[0].segment_count(), 8);
    assert!(loaded.room_2ds()[0].segments()[1].air_boundary);
    Ok(())
}

#[test]
fn test_building_string_roundtrip() -> Result<()> {
    let mut upper = Story::new(
        "Upper",
        vec![Room2D::from_vertices("Loft", &[(0., 0.), (30., 0.), (30., 20.), (0., 20.)], &[], 3.5, 3.).unwrap()],
    )?;
    upper.set_multiplier(2)?;
    let building = Building::new("Block", vec![upper, courtyard_story()])?;

    let json = to_json_string(&building)?;
    let back: Building = from_json_string(&json)?;
    assert_eq!(back.unique_stories()[0].identifier(), "Ground");
    assert_eq!(back.unique_stories()[1].multiplier(), 2);
    assert!((back.floor_area() - building.floor_area()).abs() < 1e-9);

    let dir = tempdir()?;
    let path = dir.path().join("block.json");
    write_building(&path, &back)?;
    let again = read_building(&path)?;
    assert_eq!(to_json_string(&again)?, json);
    Ok(())
}

#[test]
fn test_inconsistent_document_is_rejected() {
    let json = r#"{
        "identifier": "Level",
        "room_2ds": [{
            "identifier": "R",
            "floor_boundary": [[0, 0], [4, 0], [4, 4], [0, 4]],
            "floor_height": 0,
            "floor_to_ceiling_height": 3,
            "boundary_conditions": [{"type": "Outdoors"}, {"type": "Outdoors"}, {"type": "Outdoors"}],
            "window_parameters": [null, null, null],
            "shading_parameters": [null, null, null],
            "air_boundaries": [false, false, false]
        }],
        "floor_to_floor_height": 3,
        "floor_height": 0,
        "multiplier": 1
    }"#;
    assert!(from_json_string::<Story>(json).is_err());
}
