pub mod colormap;
pub mod error;
pub mod files;
pub mod geometry;
pub mod level2;
pub mod raster;
pub mod render;
pub mod volume;

pub use error::{RenderError, Result};
pub use files::list_files;
pub use level2::{decode_volume, read_volume, VolumeHeader};
pub use render::{format_angle, render_volume, RenderOptions};
pub use volume::{Moment, Radial, Sweep, Volume};
