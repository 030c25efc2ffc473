#![deny(unsafe_code)]

use std::{env, io, process::ExitCode};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> ExitCode {
    let mut stderr = io::stderr().lock();
    filed::run(env::args_os(), &mut stderr)
}
