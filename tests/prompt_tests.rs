//! Tests for operator input: credentials, device prompt and command prompt.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod common;

use pretty_assertions::assert_eq;

use common::ScriptedPrompter;
use devrun::credentials::{PASSWORD_MISMATCH, collect_credentials};
use devrun::devices::{self, DeviceSource, ResolveError, Target};
use devrun::prompt::{PromptError, ask_command};

fn hosts(targets: &[Target]) -> Vec<&str> {
    targets.iter().map(Target::host).collect()
}

#[test]
fn test_collect_matching_passwords() {
    let mut prompter = ScriptedPrompter::new(&["admin", "s3cret", "s3cret"]);
    let creds = collect_credentials(&mut prompter, None).unwrap();

    assert_eq!(creds.username(), "admin");
    assert_eq!(creds.password(), "s3cret");
    assert_eq!(prompter.prompts[0], "Provide username: ");
    assert_eq!(prompter.prompts[1], "Password for admin: ");
    assert_eq!(prompter.prompts[2], "Retype password for admin: ");
    assert!(prompter.notices.is_empty());
}

#[test]
fn test_mismatch_reprompts_until_match() {
    let mut prompter =
        ScriptedPrompter::new(&["admin", "one", "two", "three", "four", "ok", "ok"]);
    let creds = collect_credentials(&mut prompter, None).unwrap();

    assert_eq!(creds.password(), "ok");
    assert_eq!(prompter.notices.len(), 2);
    assert_eq!(prompter.notices[0], PASSWORD_MISMATCH);
    // username + three password pairs
    assert_eq!(prompter.prompts.len(), 7);
}

#[test]
fn test_known_username_skips_prompt() {
    let mut prompter = ScriptedPrompter::new(&["pw", "pw"]);
    let creds = collect_credentials(&mut prompter, Some("netops")).unwrap();

    assert_eq!(creds.username(), "netops");
    assert_eq!(prompter.prompts[0], "Password for netops: ");
}

#[test]
fn test_input_closed_mid_confirmation() {
    let mut prompter = ScriptedPrompter::new(&["admin", "pw"]);
    assert!(matches!(
        collect_credentials(&mut prompter, None),
        Err(PromptError::Interrupted)
    ));
}

#[test]
fn test_resolve_single_does_not_prompt() {
    let mut prompter = ScriptedPrompter::new(&[]);
    let source = DeviceSource::Single("192.168.1.10".to_string());
    let targets = devices::resolve(&source, &mut prompter).unwrap();

    assert_eq!(hosts(&targets), vec!["192.168.1.10"]);
    assert!(prompter.prompts.is_empty());
}

#[test]
fn test_resolve_interactive_validates_answer() {
    let mut prompter = ScriptedPrompter::new(&["not-an-ip"]);
    let result = devices::resolve(&DeviceSource::Interactive, &mut prompter);

    assert!(matches!(result, Err(ResolveError::InvalidAddress { .. })));
    assert_eq!(prompter.prompts.len(), 1);
}

#[test]
fn test_resolve_interactive_accepts_answer() {
    let mut prompter = ScriptedPrompter::new(&["172.16.0.9"]);
    let targets = devices::resolve(&DeviceSource::Interactive, &mut prompter).unwrap();
    assert_eq!(hosts(&targets), vec!["172.16.0.9"]);
}

#[test]
fn test_ask_command_terminates_line() {
    let mut prompter = ScriptedPrompter::new(&["show version"]);
    let command = ask_command(&mut prompter).unwrap();
    assert_eq!(command.as_bytes(), b"show version\n");
    assert_eq!(prompter.prompts.len(), 1);
}

#[test]
fn test_ask_command_rejects_blank() {
    let mut prompter = ScriptedPrompter::new(&[""]);
    assert!(matches!(
        ask_command(&mut prompter),
        Err(PromptError::EmptyCommand)
    ));
}
