//! `make-symtables`: dump the text symbol tables columbo uses for symbol
//! translation, one `ELF-BINARY=TARGET-FILE` pair per argument.
//!
//! ```text
//! make-symtables /path/to/bin=/tmp/bin.symtab "/other/bin=/tmp/with space.symtab"
//! ```

use std::env;

use columbo_utils::logging;
use columbo_utils::symtab::{self, Objdump};

fn main() -> anyhow::Result<()> {
    logging::init_tracing();

    println!("START SYMTABLE CREATION");

    let pairs = symtab::parse_pairs(env::args().skip(1))?;
    symtab::create_symtables(&Objdump::default(), &pairs)?;

    println!("FINISHED SYMTABLE CREATION");
    Ok(())
}
