mod media_source;
mod media_stream;
mod sample_source;

pub use media_source::*;
pub use media_stream::*;
pub use sample_source::*;
