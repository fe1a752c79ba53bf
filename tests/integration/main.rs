//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises one level of the mode
//! hierarchy, or the service around it, against the mock boat.  All
//! tests run on the host with no real hardware required.

mod auto_mode_tests;
mod nav_mode_tests;
mod service_tests;
