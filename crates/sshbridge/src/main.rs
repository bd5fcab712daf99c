//! sshbridge diagnostics.
//!
//! Usage: `sshbridge <command>`

use std::env;
use std::io::{self, Read};
use std::os::fd::AsRawFd;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use sshbridge_agent_socket::AgentSocket;
use sshbridge_terminal::{RawModeController, TermiosOps};

fn main() -> ExitCode {
    sshbridge_host::init_logging();

    let args: Vec<String> = env::args().skip(1).collect();
    tracing::debug!("args: {:?}", args);

    let result = match args.first().map(|s| s.as_str()) {
        Some("size") => return print_size(),
        Some("tty") => {
            let tty = sshbridge_host::is_a_tty();
            println!("{tty}");
            return if tty { ExitCode::SUCCESS } else { ExitCode::FAILURE };
        }
        Some("agent") => connect_agent(args.get(1).map(PathBuf::from)),
        Some("secret") => read_secret(),
        Some("config") => match args.get(1).map(|s| s.as_str()) {
            Some("init") => init_config(),
            _ => show_config(),
        },
        Some("help") | Some("-h") | Some("--help") => {
            print_help();
            Ok(())
        }
        Some(cmd) => {
            eprintln!("Unknown command: {cmd}");
            print_help();
            return ExitCode::FAILURE;
        }
        None => {
            print_help();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn print_size() -> ExitCode {
    match sshbridge_terminal::stdout_window_size() {
        Some(size) => {
            println!("width: {}", size.cols);
            println!("height: {}", size.rows);
            ExitCode::SUCCESS
        }
        None => {
            println!("error!");
            ExitCode::FAILURE
        }
    }
}

fn connect_agent(path: Option<PathBuf>) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => env::var_os("SSH_AUTH_SOCK")
            .map(PathBuf::from)
            .context("no socket path given and SSH_AUTH_SOCK is not set")?,
    };

    let socket = AgentSocket::open(&path)
        .with_context(|| format!("failed to connect to {}", path.display()))?;
    println!(
        "connected: {} (fd {})",
        socket.path().display(),
        socket.as_raw_fd()
    );
    socket.close();
    Ok(())
}

/// Leaves raw mode when dropped, so an early return cannot strand the
/// terminal.
struct RawGuard<'a, T: TermiosOps>(&'a mut RawModeController<T>);

impl<T: TermiosOps> Drop for RawGuard<'_, T> {
    fn drop(&mut self) {
        let _ = self.0.leave(true);
    }
}

/// Bytes up to the first CR, LF or end of input.
fn read_line(input: &mut impl Read) -> io::Result<Vec<u8>> {
    let mut line = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        match input.read(&mut byte)? {
            0 => break,
            _ if matches!(byte[0], b'\r' | b'\n') => break,
            _ => line.push(byte[0]),
        }
    }
    Ok(line)
}

/// Read one line with the terminal in raw mode. The terminal is back in
/// its original mode when this returns, on success or error.
fn read_line_raw<T: TermiosOps>(
    controller: &mut RawModeController<T>,
    input: &mut impl Read,
) -> Result<Vec<u8>> {
    controller
        .enter(false)
        .context("stdin is not a usable terminal")?;
    let _guard = RawGuard(controller);

    eprint!("secret: ");
    Ok(read_line(input)?)
}

fn read_secret() -> Result<()> {
    let config = sshbridge_settings::load_config();
    let mut controller = RawModeController::stdin(config.apply_timing);
    let mut secret = read_line_raw(&mut controller, &mut io::stdin().lock())?;

    eprintln!();
    println!("read {} bytes", secret.len());
    secret.fill(0);
    Ok(())
}

fn show_config() -> Result<()> {
    let path = sshbridge_settings::config_path();
    let config = sshbridge_settings::load_config();
    println!("config file: {}", path.display());
    println!("max-read-len: {}", config.effective_max_read_len());
    println!("apply-timing: {:?}", config.apply_timing);
    println!(
        "log-filter: {}",
        sshbridge_host::default_filter(&config, false)
    );
    Ok(())
}

fn init_config() -> Result<()> {
    let path = sshbridge_settings::ensure_config_file()?;
    println!("{}", path.display());
    Ok(())
}

fn print_help() {
    println!("sshbridge {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("USAGE:");
    println!("    sshbridge <COMMAND>");
    println!();
    println!("COMMANDS:");
    println!("    size            Print the terminal width and height");
    println!("    tty             Print whether stdout is a terminal");
    println!("    agent [PATH]    Connect to an agent socket (default: $SSH_AUTH_SOCK)");
    println!("    secret          Read one line from the terminal in raw mode");
    println!("    config          Show the effective configuration");
    println!("    config init     Write a commented default config file if missing");
    println!("    help            Show this message");
}
