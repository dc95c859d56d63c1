//! Config subcommand handlers.

use dialoguer::{Input, Select};

use camlay_config::{CameraSection, Config, OverlaySection, PrinterSection, SecretKind};
use camlay_core::ProgressSource;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, SecretTarget};
use crate::config;
use crate::error::CliError;
use crate::output;

const MASK: &str = "****";

// ── Helpers ─────────────────────────────────────────────────────────

/// Copy of the config with plaintext secrets masked.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    if cfg.camera.password.is_some() {
        cfg.camera.password = Some(MASK.into());
    }
    if cfg.printer.api_key.is_some() {
        cfg.printer.api_key = Some(MASK.into());
    }
    cfg
}

/// Format an already-redacted config as TOML for the table view.
fn format_config(cfg: &Config) -> String {
    toml::to_string_pretty(cfg).unwrap_or_else(|e| format!("# failed to render config: {e}"))
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn prompt_secret(prompt: &str, field: &str) -> Result<String, CliError> {
    let secret = rpassword::prompt_password(prompt).map_err(prompt_err)?;
    if secret.is_empty() {
        return Err(CliError::Validation {
            field: field.into(),
            reason: "cannot be empty".into(),
        });
    }
    Ok(secret)
}

/// Offer to store a secret in the system keyring or return it for plaintext config.
///
/// Returns `Some(secret)` if the user chose plaintext, `None` if stored in keyring.
fn prompt_keyring_storage(secret: &str, kind: SecretKind) -> Result<Option<String>, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt(format!("Where to store the {kind}?"))
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if selection == 0 {
        config::store_secret(kind, secret)?;
        eprintln!("   ✓ {kind} stored in system keyring");
        Ok(None)
    } else {
        Ok(Some(secret.to_owned()))
    }
}

fn input(prompt: &str, default: &str) -> Result<String, CliError> {
    Input::new()
        .with_prompt(prompt)
        .default(default.to_owned())
        .interact_text()
        .map_err(prompt_err)
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path(global);
            eprintln!("✨ camlay configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            // 1. Camera
            let host = input("Camera host", "192.168.1.108")?;
            let username = input("Camera username", "admin")?;
            let password = prompt_secret("Camera password: ", "camera.password")?;
            let password = prompt_keyring_storage(&password, SecretKind::CameraPassword)?;

            // 2. OctoPrint
            let url = input("OctoPrint URL", "http://octopi.local")?;
            let api_key = prompt_secret("OctoPrint API key: ", "printer.api_key")?;
            let api_key = prompt_keyring_storage(&api_key, SecretKind::PrinterApiKey)?;

            // 3. Progress source
            let source_choices = &[
                "Firmware M73 lines (slicer-embedded, recommended)",
                "OctoPrint percentage + slicer estimate",
            ];
            let progress_source = match Select::new()
                .with_prompt("Progress source")
                .items(source_choices)
                .default(0)
                .interact()
                .map_err(prompt_err)?
            {
                0 => ProgressSource::FirmwareReported,
                _ => ProgressSource::HostComputed,
            };

            // 4. Write config
            let cfg = Config {
                camera: CameraSection {
                    host,
                    username,
                    password,
                    ..CameraSection::default()
                },
                printer: PrinterSection {
                    url,
                    api_key,
                    progress_source,
                    ..PrinterSection::default()
                },
                overlay: OverlaySection::default(),
            };
            config::save_config_to(&cfg, &config_path)?;

            eprintln!("\n✓ Configuration written to {}", config_path.display());
            eprintln!("\n  Test it: camlay preview");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = redacted(&config::load(global)?);
            let out = output::render_single(&global.output, &cfg, format_config, format_config);
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            println!("{}", config::config_path(global).display());
            Ok(())
        }

        // ── SetPassword ─────────────────────────────────────────────
        ConfigCommand::SetPassword { target } => {
            let (kind, prompt) = match target {
                SecretTarget::Camera => (SecretKind::CameraPassword, "Camera password: "),
                SecretTarget::Printer => (SecretKind::PrinterApiKey, "OctoPrint API key: "),
            };
            let secret = prompt_secret(prompt, kind.keyring_user())?;
            config::store_secret(kind, &secret)?;
            eprintln!("✓ {kind} stored in system keyring");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redaction_masks_plaintext_secrets_only() {
        let cfg = Config {
            camera: CameraSection {
                password: Some("hunter2".into()),
                password_env: Some("CAM_PW".into()),
                ..CameraSection::default()
            },
            ..Config::default()
        };

        let shown = format_config(&redacted(&cfg));

        assert!(!shown.contains("hunter2"));
        assert!(shown.contains("password = \"****\""));
        assert!(shown.contains("password_env = \"CAM_PW\""));
        assert!(!shown.contains("api_key ="));
    }
}
