//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter    | Implements    | Connects to                         |
//! |------------|---------------|-------------------------------------|
//! | `log_sink` | EventSink     | Process log output                  |
//! | `sim`      | SampleSource  | Simulated stationary IMU            |
//! |            | (collaborator)| Simulated GNSS receiver thread      |

pub mod log_sink;
pub mod sim;
