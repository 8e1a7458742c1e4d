//! Output formats for parsed forests
//!
//! - `generator` - back to SFM source
//! - `treeviz` - one line per node tree view
//! - `serialize` - JSON and YAML through serde
//! - `registry` - name based lookup of the above

pub mod generator;
pub mod registry;
pub mod serialize;
pub mod treeviz;

pub use generator::{generate, generate_element};
pub use registry::{FormatError, FormatRegistry, Formatter};
pub use serialize::{to_json, to_yaml};
pub use treeviz::to_treeviz_str;
