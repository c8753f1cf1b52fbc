pub mod adjacency;
pub mod boundary;
pub mod building;
pub mod config;
pub mod error;
pub mod extrude;
pub mod geom;
pub mod io;
pub mod name;
pub mod room2d;
pub mod room3d;
pub mod shading;
pub mod story;
pub mod uid;
pub mod windows;

// Prelude
pub use adjacency::{AdjacencyRecord, intersect_adjacency, solve_adjacency};
pub use boundary::{BoundaryCondition, SurfaceRef};
pub use building::Building;
pub use config::{ConversionConfig, Tolerance, WindowConflictPolicy};
pub use error::{BatchReport, Error, Result};
pub use extrude::{DeferredAdjacency, Extrusion, ExtrusionOutcome, extrude_room};
pub use geom::point::Point;
pub use geom::polygon::Polygon;
pub use geom::vector::Vector;
pub use name::{FindByName, HasName};
pub use room2d::{Room2D, WallSegment};
pub use room3d::{Aperture, Face, FaceBoundary, FaceType, Room3D, Shade};
pub use shading::ShadingParameter;
pub use story::{Conversion, Story};
pub use uid::UID;
pub use windows::WindowParameter;
