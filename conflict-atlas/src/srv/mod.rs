mod polygons;
pub use polygons::{ApiError, get_map_config, get_world_polygons};

mod server;
pub use server::{Server, get_health, new_server, router};
