//! CLI command handlers. Each command is in its own file.

mod detect;
mod fetch;
mod resume;
mod run;
mod shared;
mod status;

pub use detect::run_detect;
pub use fetch::run_fetch;
pub use resume::run_resume;
pub use run::run_run;
pub use status::run_status;
