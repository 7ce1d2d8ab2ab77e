pub mod apply;
pub mod common;
pub mod diff;
pub mod explain;
pub mod mapping;
pub mod routes;
pub mod test_glob;

pub use apply::{Apply, ApplyOptions};
pub use common::{GlobalOptions, Session};
pub use diff::Diff;
pub use explain::Explain;
pub use mapping::Mapping;
pub use routes::Routes;
pub use test_glob::TestGlob;
