pub mod actions;
pub mod assertions;
pub mod mocks;
pub mod setup;

// Re-export main utilities for use by test files
#[allow(unused_imports)]
pub use assertions::{eventually, FrameAssertion};
#[allow(unused_imports)]
pub use mocks::{ClientFrame, SinkEvent};
#[allow(unused_imports)]
pub use setup::{TestClient, TestSetup, TestSetupBuilder};
