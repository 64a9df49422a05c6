//! Config subcommand handlers.

use std::collections::HashMap;

use dialoguer::Input;
use invsync_config::ConfigError;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Defaults, Profile};
use crate::error::CliError;
use crate::output;

use super::util::{self, prompt_err};

// ── Helpers ─────────────────────────────────────────────────────────

fn available(cfg: &Config) -> String {
    let names = cfg.profile_names();
    if names.is_empty() {
        "(none)".into()
    } else {
        names.join(", ")
    }
}

/// Empty answers clear optional settings.
fn optional(value: String) -> Option<String> {
    Some(value).filter(|v| !v.trim().is_empty())
}

/// Apply `key = value` to a profile.
fn set_key(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    match key {
        "scope" => profile.scope = value,
        "namespace" => profile.namespace = value,
        "datacenter" => profile.datacenter = optional(value),
        "inventory" => profile.inventory = optional(value).map(Into::into),
        "store" => profile.store = optional(value).map(Into::into),
        "interval_secs" | "interval-secs" => {
            let secs: u64 = value.parse().map_err(|_| CliError::Validation {
                field: "interval_secs".into(),
                reason: "must be a number (seconds)".into(),
            })?;
            if secs == 0 {
                return Err(CliError::Validation {
                    field: "interval_secs".into(),
                    reason: "must be at least 1".into(),
                });
            }
            profile.interval_secs = Some(secs);
        }
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!(
                    "unknown config key '{other}'. Valid keys: scope, namespace, \
                     datacenter, inventory, store, interval_secs"
                ),
            });
        }
    }
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = config::config_path(global);

    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            if path.exists()
                && !util::confirm(
                    &format!("Overwrite existing config at {}?", path.display()),
                    global.yes,
                )?
            {
                return Ok(());
            }

            eprintln!("invsync configuration wizard");
            eprintln!("   Config path: {}\n", path.display());

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            let scope: String = Input::new()
                .with_prompt("Credential scope")
                .interact_text()
                .map_err(prompt_err)?;
            if scope.trim().is_empty() {
                return Err(CliError::Validation {
                    field: "scope".into(),
                    reason: "must not be empty".into(),
                });
            }

            let namespace: String = Input::new()
                .with_prompt("Store namespace")
                .default(invsync_core::DEFAULT_NAMESPACE.into())
                .interact_text()
                .map_err(prompt_err)?;

            let inventory: String = Input::new()
                .with_prompt("Inventory snapshot path")
                .allow_empty(true)
                .interact_text()
                .map_err(prompt_err)?;

            let store: String = Input::new()
                .with_prompt("Store directory")
                .allow_empty(true)
                .interact_text()
                .map_err(prompt_err)?;

            let datacenter: String = Input::new()
                .with_prompt("Datacenter (empty for all)")
                .allow_empty(true)
                .interact_text()
                .map_err(prompt_err)?;

            let mut profile = Profile::new(scope);
            profile.namespace = namespace;
            profile.inventory = optional(inventory).map(Into::into);
            profile.store = optional(store).map(Into::into);
            profile.datacenter = optional(datacenter);

            let mut profiles = HashMap::new();
            profiles.insert(profile_name.clone(), profile);

            let cfg = Config {
                default_profile: Some(profile_name.clone()),
                defaults: Defaults::default(),
                profiles,
            };
            config::save_config_to(&cfg, &path)?;

            eprintln!("\n✓ Configuration written to {}", path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Try it: invsync sync");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config_or_default(global);
            let text = toml::to_string_pretty(&cfg).map_err(ConfigError::from)?;
            let out = output::render_single(&global.output, &cfg, |_| text.clone(), |_| {
                path.display().to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_from(&path)?;
            let profile_name = config::active_profile_name(global, &cfg);

            let profile = cfg
                .profiles
                .entry(profile_name.clone())
                .or_insert_with(|| Profile::new(global.scope.clone().unwrap_or_default()));
            set_key(profile, &key, value)?;

            config::save_config_to(&cfg, &path)?;
            if !global.quiet {
                eprintln!("✓ Set {key} on profile '{profile_name}'");
            }
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default(global);
            let default = cfg.active_profile_name(None);
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: invsync config init");
            } else {
                for name in cfg.profile_names() {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_from(&path)?;
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: available(&cfg),
                    name,
                });
            }

            cfg.default_profile = Some(name.clone());
            config::save_config_to(&cfg, &path)?;
            if !global.quiet {
                eprintln!("✓ Default profile set to '{name}'");
            }
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            println!("{}", path.display());
            Ok(())
        }
    }
}
