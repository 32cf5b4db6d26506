// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Master password acquisition from the environment or a TTY prompt.

use std::io::IsTerminal;

use keyward_core::KeywardError;
use secrecy::SecretString;

/// Master password for non-interactive use.
pub const MASTER_PASSWORD_ENV_VAR: &str = "KEYWARD_MASTER_PASSWORD";

/// Replacement master password for non-interactive rotation.
pub const NEW_MASTER_PASSWORD_ENV_VAR: &str = "KEYWARD_NEW_MASTER_PASSWORD";

/// Read the master password.
///
/// `KEYWARD_MASTER_PASSWORD` wins when set and non-empty, otherwise the user
/// is prompted on the terminal.
pub fn get_master_password() -> Result<SecretString, KeywardError> {
    if let Some(password) = from_env(MASTER_PASSWORD_ENV_VAR) {
        return Ok(password);
    }
    prompt_once("Master password: ", MASTER_PASSWORD_ENV_VAR)
}

/// Read a password that is about to be set (init), confirming it on a TTY.
pub fn get_master_password_with_confirm() -> Result<SecretString, KeywardError> {
    get_confirmed(MASTER_PASSWORD_ENV_VAR, "New master password: ")
}

/// Read the replacement password for rotation, confirming it on a TTY.
pub fn get_new_master_password() -> Result<SecretString, KeywardError> {
    get_confirmed(NEW_MASTER_PASSWORD_ENV_VAR, "New master password: ")
}

fn get_confirmed(env_var: &str, label: &str) -> Result<SecretString, KeywardError> {
    if let Some(password) = from_env(env_var) {
        return Ok(password);
    }
    if !std::io::stdin().is_terminal() {
        return Err(no_source(env_var));
    }

    let first = read_tty(label)?;
    let second = read_tty("Confirm master password: ")?;
    if *first != *second {
        return Err(KeywardError::InvalidInput(
            "passwords do not match".to_string(),
        ));
    }
    non_empty(first)
}

fn from_env(var: &str) -> Option<SecretString> {
    match std::env::var(var) {
        Ok(value) if !value.is_empty() => Some(SecretString::from(value)),
        _ => None,
    }
}

fn prompt_once(label: &str, env_var: &str) -> Result<SecretString, KeywardError> {
    if !std::io::stdin().is_terminal() {
        return Err(no_source(env_var));
    }
    non_empty(read_tty(label)?)
}

fn read_tty(label: &str) -> Result<zeroize::Zeroizing<String>, KeywardError> {
    eprint!("{label}");
    rpassword::read_password()
        .map(zeroize::Zeroizing::new)
        .map_err(|e| KeywardError::InvalidInput(format!("failed to read password: {e}")))
}

fn non_empty(password: zeroize::Zeroizing<String>) -> Result<SecretString, KeywardError> {
    if password.is_empty() {
        return Err(KeywardError::InvalidInput(
            "empty master password not allowed".to_string(),
        ));
    }
    Ok(SecretString::from(password.as_str()))
}

fn no_source(env_var: &str) -> KeywardError {
    KeywardError::InvalidInput(format!(
        "no master password provided; set {env_var} or run interactively"
    ))
}
