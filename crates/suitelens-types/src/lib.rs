pub mod error;
pub mod outcome;
pub mod rerun;
pub mod result;
pub mod session;
pub mod timestamp;

pub use error::{Error, Result};
pub use outcome::TestOutcome;
pub use rerun::{RerunTestGroup, group_reruns};
pub use result::TestResult;
pub use session::TestSession;
