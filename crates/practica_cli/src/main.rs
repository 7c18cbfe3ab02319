//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `practica_core` linkage and
//!   schema bootstrap without the admin surface.

use practica_core::db::migrations::latest_version;
use practica_core::db::open_db_in_memory;

fn main() {
    println!("practica_core version={}", practica_core::core_version());
    match open_db_in_memory() {
        Ok(_conn) => println!("schema bootstrap ok, version={}", latest_version()),
        Err(err) => {
            eprintln!("schema bootstrap failed: {err}");
            std::process::exit(1);
        }
    }
}
