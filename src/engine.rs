use anyhow::Context;
use std::env::consts::OS;
use std::process::{Command, ExitStatus};

use crate::config::Config;

/// Binary argument for the engine on `os`: Windows (and Cygwin) get an `.exe` suffix,
/// everything else runs the binary from the current directory.
pub fn engine_binary_arg(engine: &str, os: &str) -> String {
    let os = os.to_lowercase();
    if os.contains("windows") || os.contains("cygwin") {
        if engine.ends_with(".exe") {
            engine.to_string()
        } else {
            format!("{engine}.exe")
        }
    } else {
        format!("./{engine}")
    }
}

/// Full command line: binary, configured arguments, then `+map <map_file>`.
pub fn engine_command(config: &Config, map_file: &str) -> Vec<String> {
    let mut cmd = vec![engine_binary_arg(&config.engine, OS)];
    cmd.extend(config.engine_args.iter().cloned());
    cmd.push("+map".to_string());
    cmd.push(map_file.to_string());
    cmd
}

pub fn launch_engine(config: &Config, map_file: &str) -> anyhow::Result<ExitStatus> {
    let cmd = engine_command(config, map_file);
    let (program, args) = cmd
        .split_first()
        .context("engine command line is empty")?;
    vprintln!(config.verbose, 1, "launching: {}", cmd.join(" "));

    Command::new(program)
        .args(args)
        .status()
        .with_context(|| format!("running engine: {program}"))
}
