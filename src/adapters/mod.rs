//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter      | Implements   | Connects to                 |
//! |--------------|--------------|-----------------------------|
//! | `console`    | (transport)  | stdin request lines         |
//! | `hardware`   | HardwarePort | In-memory cabinet simulation|
//! | `log_sink`   | ResponseSink | Console log output          |
//! | `file_store` | RecordPort   | Inventory text file         |
//! |              | ConfigPort   | JSON config file            |

pub mod console;
pub mod file_store;
pub mod hardware;
pub mod log_sink;
