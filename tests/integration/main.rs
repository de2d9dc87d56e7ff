//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock collaborators.  All tests run on the host with an
//! in-memory database and no real devices.

mod bus_tests;
mod mock_io;
mod persistence_tests;
mod pipeline_tests;
