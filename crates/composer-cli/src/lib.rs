//! Composer CLI - command line front end for the contract workflow
//!
//! ```text
//! composer types
//! composer describe "California Employment Agreement"
//! composer login --token <TOKEN>
//! composer compose --type "California Employment Agreement" \
//!     --client "Acme Inc." --other "John Doe" \
//!     --param annual_salary=120000 --param overtime_status=Exempt \
//!     --param arbitration_county=Alameda --param governing_law_county=Alameda \
//!     --option arbitration=jams_provider --save --download
//! composer contracts
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod args;
pub mod commands;
pub mod logging;

pub use args::{parse_pair, Cli, Commands, ComposeArgs, ViewMode};
pub use commands::{configure, load_catalog, load_config, run};
pub use logging::{init_tracing, LogFormat, LOG_ENV};
