// Library half of the `tutorsearch` binary, exposed for integration tests.

pub mod cli;
pub mod logging;
pub mod pipeline;
pub mod report;
