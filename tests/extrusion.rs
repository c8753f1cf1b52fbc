use building2d::{
    Building, ConversionConfig, ExtrusionOutcome, FaceBoundary, FaceType, Room2D, Story, WindowConflictPolicy,
    WindowParameter,
};

const TOL: f64 = 0.01;

fn rect(id: &str, x0: f64, w: f64, z: f64, h: f64) -> Room2D {
    Room2D::from_vertices(id, &[(x0, 0.), (x0 + w, 0.), (x0 + w, 10.), (x0, 10.)], &[], z, h).unwrap()
}

fn solved(rooms: Vec<Room2D>) -> Story {
    let mut story = Story::new("Level", rooms).unwrap();
    story
        .solve_room_2d_adjacency(TOL, WindowConflictPolicy::Strict, false)
        .unwrap();
    story
}

#[test]
fn test_story_floor_area_ignores_multiplier() {
    let mut story = Story::new("Typical", vec![rect("Office", 0., 10., 0., 3.)]).unwrap();
    story.set_multiplier(4).unwrap();
    assert!((story.floor_area() - 100.).abs() < 1e-9);

    let building = Building::new("Tower", vec![story]).unwrap();
    assert!((building.floor_area() - 400.).abs() < 1e-9);
}

#[test]
fn test_different_ceilings_split_shared_wall() {
    let story = solved(vec![rect("Low", 0., 10., 0., 3.), rect("Tall", 10., 10., 0., 4.)]);
    let conversion = story.to_rooms(&ConversionConfig::default());
    assert!(conversion.report.is_ok());
    let low = &conversion.rooms[0];
    let tall = &conversion.rooms[1];

    // Low: floor, 4 walls, ceiling. Tall: floor, 4 walls + 1 upper strip, ceiling
    assert_eq!(low.faces.len(), 6);
    assert_eq!(tall.faces.len(), 7);

    let shared: Vec<_> = low
        .faces
        .iter()
        .chain(tall.faces.iter())
        .filter(|f| f.is_wall() && f.polygon.vertices().iter().all(|p| (p.x - 10.).abs() < TOL))
        .collect();
    assert_eq!(shared.len(), 3);

    let middle = tall.face_by_identifier("Tall..Face4").unwrap();
    assert!((middle.area() - 30.).abs() < 1e-6);
    assert_eq!(middle.boundary_condition, FaceBoundary::surface("Low..Face2", "Low"));
    let upper = tall.face_by_identifier("Tall..Face4_Above").unwrap();
    assert!((upper.area() - 10.).abs() < 1e-6);
    assert_eq!(upper.boundary_condition, FaceBoundary::Adiabatic);
    assert_eq!(
        low.face_by_identifier("Low..Face2").unwrap().boundary_condition,
        FaceBoundary::surface("Tall..Face4", "Tall")
    );
}

#[test]
fn test_raised_floor_splits_below() {
    let story = solved(vec![rect("Pit", 0., 10., 0., 4.), rect("Stage", 10., 10., 1., 3.)]);
    let conversion = story.to_rooms(&ConversionConfig::default());
    let pit = &conversion.rooms[0];
    let below = pit.face_by_identifier("Pit..Face2_Below").unwrap();
    assert!((below.area() - 10.).abs() < 1e-6);
    let shared = pit.face_by_identifier("Pit..Face2").unwrap();
    assert!((shared.area() - 30.).abs() < 1e-6);
    assert!(pit.face_by_identifier("Pit..Face2_Above").is_none());
    assert!(pit.check_solid(TOL));
}

#[test]
fn test_plenums_fill_floor_to_floor_gap() {
    let mut story = solved(vec![rect("A", 0., 10., 0., 3.), rect("B", 10., 10., 0., 3.)]);
    story.set_floor_to_floor_height(Some(4.)).unwrap();
    story.set_top_exposed(true);
    let conversion = story.to_rooms(&ConversionConfig::default().with_plenums(true));
    assert_eq!(conversion.rooms.len(), 4);

    let plenum = conversion
        .rooms
        .iter()
        .find(|r| r.identifier == "A_Ceiling_Plenum")
        .unwrap();
    assert!(plenum.is_plenum);
    assert!((plenum.volume() - 100.).abs() < 1e-6);
    assert_eq!(plenum.faces[0].boundary_condition, FaceBoundary::surface("A..Face5", "A"));
    assert_eq!(plenum.faces[5].boundary_condition, FaceBoundary::Outdoors);
    // wall over the shared partition is adiabatic, exterior walls stay outdoors
    assert_eq!(plenum.faces[2].boundary_condition, FaceBoundary::Adiabatic);
    assert_eq!(plenum.faces[1].boundary_condition, FaceBoundary::Outdoors);

    let a = &conversion.rooms[0];
    assert_eq!(
        a.face_by_identifier("A..Face5").unwrap().boundary_condition,
        FaceBoundary::surface("A_Ceiling_Plenum..Face0", "A_Ceiling_Plenum")
    );
}

#[test]
fn test_air_boundaries_and_windows() {
    let mut story = Story::new("Level", vec![rect("A", 0., 10., 0., 3.), rect("B", 10., 10., 0., 3.)]).unwrap();
    story
        .set_outdoor_window_parameters(Some(WindowParameter::simple_ratio(0.4).unwrap()))
        .unwrap();
    // shared walls carry the same ratio window on both sides, so no air boundary
    story
        .solve_room_2d_adjacency(TOL, WindowConflictPolicy::Strict, true)
        .unwrap();
    let a = story.room_by_identifier("A").unwrap();
    assert!(!a.segments()[1].air_boundary);

    let conversion = story.to_rooms(&ConversionConfig::default());
    let a3 = &conversion.rooms[0];
    let shared = a3.face_by_identifier("A..Face2").unwrap();
    assert_eq!(shared.face_type, FaceType::Wall);
    assert_eq!(shared.apertures.len(), 1);
    // interior windows do not count as exterior
    assert!((a3.exterior_aperture_area() - 0.4 * 3. * 30.).abs() < 1e-6);
}

#[test]
fn test_unmatched_surface_becomes_outdoors() {
    let mut story = solved(vec![rect("A", 0., 10., 0., 3.), rect("B", 10., 10., 0., 3.)]);
    story.remove_room_2d("B").unwrap();
    story.add_room_2d(rect("C", 30., 10., 0., 3.)).unwrap();
    story
        .room_by_identifier_mut("A")
        .unwrap()
        .set_boundary_condition(1, building2d::BoundaryCondition::surface("C", 3))
        .unwrap();
    let conversion = story.to_rooms(&ConversionConfig::default());
    let a = &conversion.rooms[0];
    assert_eq!(
        a.face_by_identifier("A..Face2").unwrap().boundary_condition,
        FaceBoundary::Outdoors
    );
}

#[test]
fn test_forced_solid_is_reported_per_room() {
    let bow = Room2D::from_vertices("Bow", &[(20., 0.), (30., 0.), (30., 10.), (24., -3.)], &[], 0., 3.).unwrap();
    let story = Story::new("Level", vec![rect("Good", 0., 10., 0., 3.), bow]).unwrap();
    let conversion = story.to_rooms(&ConversionConfig::default());
    assert_eq!(conversion.rooms.len(), 2);
    assert_eq!(conversion.outcomes[0].1, ExtrusionOutcome::Solid);
    assert!(matches!(conversion.outcomes[1].1, ExtrusionOutcome::ForcedSolid { .. }));
    assert!(conversion.rooms.iter().all(|r| r.check_solid(TOL)));
}

#[test]
fn test_full_geometry_repeats_expose_only_the_ends() {
    let mut typical = Story::new("Typical", vec![rect("Office", 0., 10., 0., 3.)]).unwrap();
    typical.set_multiplier(3).unwrap();
    typical.set_ground_contact(true);
    typical.set_top_exposed(true);
    let building = Building::new("Tower", vec![typical]).unwrap();

    let conversion = building.to_rooms(&ConversionConfig::default().with_use_multiplier(false));
    assert!(conversion.report.is_ok());
    assert_eq!(conversion.rooms.len(), 3);
    let count = |face_type: FaceType, bc: FaceBoundary| {
        conversion
            .rooms
            .iter()
            .flat_map(|r| r.faces.iter())
            .filter(|f| f.face_type == face_type && f.boundary_condition == bc)
            .count()
    };
    assert_eq!(count(FaceType::Floor, FaceBoundary::Ground), 1);
    assert_eq!(count(FaceType::RoofCeiling, FaceBoundary::Outdoors), 1);
    assert_eq!(count(FaceType::Floor, FaceBoundary::Adiabatic), 2);
    assert_eq!(count(FaceType::RoofCeiling, FaceBoundary::Adiabatic), 2);

    let ground_floor = conversion.rooms.iter().find(|r| r.identifier == "Office").unwrap();
    assert_eq!(ground_floor.faces[0].boundary_condition, FaceBoundary::Ground);
}
