//! Entry point. The seven hook events and the hidden `finalize-worker`
//! re-entry point are intercepted on raw argv before `clap` ever parses,
//! since a usage error on that path would print to the hosting agent's stderr,
//! and a hook must never surface a failure there.

use clap::Parser;
use ghost_cli::{hooks, Cli};

fn main() {
    #[cfg(unix)]
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }

    let mut args = std::env::args();
    let _exe = args.next();
    let first = args.next();

    if let Some(command) = first.as_deref() {
        if hooks::is_hook_command(command) {
            hooks::dispatch(command);
            return;
        }
        if command == "finalize-worker" {
            let rest: Vec<String> = args.collect();
            if rest.len() == 3 {
                let repo_root = std::path::PathBuf::from(&rest[0]);
                let transcript_path = std::path::PathBuf::from(&rest[1]);
                ghost_cli::finalizer::run(&repo_root, &transcript_path, &rest[2]);
            }
            return;
        }
    }

    if std::env::var("GHOST_LOG").is_ok() {
        tracing_subscriber::fmt::init();
    }

    let cli = Cli::parse();
    if let Err(e) = ghost_cli::run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
