use anyhow::{Result, anyhow};
use log::info;
use pico_args::Arguments;
use std::{env, fs::File, io::BufReader, path::PathBuf};

use gesturectl::config::{Profile, ProfileStore};
use gesturectl::{Dispatcher, trace};

pub fn run() -> Result<()> {
    let mut pargs = Arguments::from_env();

    // No args -> general help
    if env::args().len() == 1 {
        print_help();
        return Ok(());
    }

    if pargs.contains("-h") || pargs.contains("--help") {
        print_help();
        return Ok(());
    }

    let subcmd: Option<String> = pargs.free_from_str().ok();

    match subcmd.as_deref() {
        Some("help") => {
            let topic: Option<String> = pargs.free_from_str().ok();
            if let Some(t) = topic {
                print_subcmd_help(&t);
            } else {
                print_help();
            }
            Ok(())
        }

        Some("replay") => {
            let pretty = pargs.contains("--pretty");
            let profile_name: Option<String> = pargs.opt_value_from_str("--profile")?;
            let profile_file: Option<PathBuf> = pargs.opt_value_from_str("--profile-file")?;
            let path: PathBuf = pargs
                .free_from_str()
                .map_err(|_| anyhow!("usage: gesturectl replay <trace.jsonl> [--profile <name>]"))?;

            let profile = match (profile_name, profile_file) {
                (Some(_), Some(_)) => {
                    return Err(anyhow!("--profile and --profile-file are mutually exclusive"));
                }
                (_, Some(file)) => Profile::from_path(&file)?,
                (Some(name), None) => ProfileStore::open_or_install_default()?.load(&name)?,
                (None, None) => ProfileStore::open_or_install_default()?.load_active()?,
            };
            let mut dispatcher = Dispatcher::from_profile(&profile)?;

            let file = File::open(&path)
                .map_err(|e| anyhow!("failed to open {}: {e}", path.display()))?;
            let records = trace::parse(BufReader::new(file))?;
            let events = trace::replay(&records, &mut dispatcher);
            info!(
                "replayed {} records from {}: {} events",
                records.len(),
                path.display(),
                events.len()
            );
            for ev in &events {
                let line = if pretty {
                    serde_json::to_string_pretty(ev)?
                } else {
                    serde_json::to_string(ev)?
                };
                println!("{line}");
            }
            Ok(())
        }

        Some("check") => {
            let path: PathBuf = pargs
                .free_from_str()
                .map_err(|_| anyhow!("usage: gesturectl check <profile.toml>"))?;
            let profile = Profile::from_path(&path)?;
            let dispatcher = Dispatcher::from_profile(&profile)?;
            println!("ok: {}", path.display());
            for (i, name) in dispatcher.names().enumerate() {
                println!("  {i}. {name}");
            }
            for rule in &profile.blocks {
                let arrow = if rule.mutual { "<->" } else { "->" };
                println!("  block: {} {arrow} {}", rule.recognizer, rule.blocks);
            }
            Ok(())
        }

        Some("list") => {
            let store = ProfileStore::open_or_install_default()?;
            for name in store.list_profiles() {
                let mark = if name == store.active_name { "*" } else { " " };
                println!("{mark} {name}");
            }
            Ok(())
        }

        Some("use") => {
            let name: String = pargs
                .free_from_str()
                .map_err(|_| anyhow!("usage: gesturectl use <profile_name>"))?;
            let mut store = ProfileStore::open_or_install_default()?;
            store.set_active(&name)?;
            println!("ok: active profile is now {name}");
            Ok(())
        }

        Some("show") => {
            let name: Option<String> = pargs.free_from_str().ok();
            let store = ProfileStore::open_or_install_default()?;
            let profile = match name {
                Some(n) => store.load(&n)?,
                None => store.load_active()?,
            };
            println!("{}", serde_json::to_string_pretty(&profile)?);
            Ok(())
        }

        Some(other) => {
            eprintln!("unknown subcommand: {other}\n");
            print_help();
            Ok(())
        }

        None => {
            print_help();
            Ok(())
        }
    }
}

fn print_help() {
    println!(
        r#"gesturectl: multi-pointer gesture recognizer

USAGE:
  gesturectl help [command]                Show general or command-specific help
  gesturectl replay <trace.jsonl>          Replay a pointer trace, print gesture events
      [--profile <name> | --profile-file <path>] [--pretty]
  gesturectl check <profile.toml>          Validate a profile file
  gesturectl list                          List profiles
  gesturectl use <name>                    Switch active profile
  gesturectl show [name]                   Print a profile as JSON

TIPS:
  - Profiles: ~/.config/gesturectl/profiles
  - Active profile pointer: ~/.config/gesturectl/active
  - RUST_LOG=debug shows recognizer state transitions
"#
    );
}

fn print_subcmd_help(cmd: &str) {
    match cmd {
        "replay" => println!(
            "usage: gesturectl replay <trace.jsonl> [--profile <name> | --profile-file <path>] [--pretty]\n\
             Each trace line is one JSON record tagged by \"phase\":\n  \
             down|move|up|leave {{id, x, y, t}}, cancel {{t}}, tick {{t}}, touchmove {{t, touches}}"
        ),
        "check" => println!(
            "usage: gesturectl check <profile.toml>\nValidates thresholds and block rules, prints evaluation order."
        ),
        "list" => {
            println!("usage: gesturectl list\nLists available profiles; marks active with '*'.")
        }
        "use" => {
            println!("usage: gesturectl use <name>\nSwitches the active profile to <name>.")
        }
        "show" => println!(
            "usage: gesturectl show [name]\nPrints the named (or active) profile as JSON."
        ),
        _ => {
            eprintln!("unknown command: {cmd}\n");
            print_help();
        }
    }
}
