use clap::Command;
use std::fmt::Write;

use crate::commands::{categories, check_config, profile, recompute, serve};

#[derive(Clone, Copy)]
pub struct ExampleGroup {
    pub title: &'static str,
    pub commands: &'static [&'static str],
}

const ENVIRONMENT_VARIABLES: &[(&str, &str)] = &[
    ("ALERTMAP_CONFIG", "Path to alertmap.toml"),
    ("ALERTMAP_BACKEND", "Storage backend override (memory | redis)"),
    ("ALERTMAP_BIND", "Listen address for 'serve'"),
    ("REDIS_URL", "Redis connection URL, referenced as ${REDIS_URL} by default"),
    ("RUST_LOG", "Log filter, e.g. alertmap=debug"),
];

/// Subcommand name paired with its example groups.
const COMMAND_EXAMPLES: &[(&str, &[ExampleGroup])] = &[
    ("serve", serve::EXAMPLES),
    ("categories", categories::EXAMPLES),
    ("profile", profile::EXAMPLES),
    ("recompute", recompute::EXAMPLES),
    ("check-config", check_config::EXAMPLES),
];

/// Adds the environment appendix to the top-level help and an examples
/// section to every subcommand's `--help`.
pub fn attach(command: Command) -> Command {
    let mut command = command.after_long_help(environment_help());
    for (name, groups) in COMMAND_EXAMPLES {
        command = command.mut_subcommand(*name, |sub| sub.after_long_help(render(groups)));
    }
    command
}

fn environment_help() -> String {
    let width = ENVIRONMENT_VARIABLES.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut buffer = String::from("Environment Variables:\n");
    for (key, description) in ENVIRONMENT_VARIABLES {
        let _ = writeln!(buffer, "  {key:<width$}  {description}");
    }
    buffer.push_str("\nUse 'alertmap <command> --help' to see examples for each command.");
    buffer
}

fn render(groups: &[ExampleGroup]) -> String {
    let mut buffer = String::from("Examples:");
    for group in groups {
        let _ = write!(buffer, "\n  {}:", group.title);
        for command in group.commands {
            let _ = write!(buffer, "\n    $ {command}");
        }
    }
    buffer
}
