//! `make-pipe`: create the named pipes a columbo run reads from, or
//! report the kernel buffer size of an existing one.
//!
//! ```text
//! make-pipe create <name>... [-p|--path PATH]
//! make-pipe check <name>
//! ```

use std::env;

use columbo_utils::fifo::{self, PipeCommand};
use columbo_utils::logging;

fn main() -> anyhow::Result<()> {
    logging::init_tracing();

    match PipeCommand::parse(env::args().skip(1))? {
        PipeCommand::Create { names, path } => fifo::create_pipes(&names, path.as_deref())?,
        PipeCommand::Check { name } => {
            let size = fifo::buffer_size(&name)?;
            println!("The pipe {name} has an underlying buffer size of: {size}");
        }
    }
    Ok(())
}
