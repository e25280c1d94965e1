//! Interactive `setup` and read-only `print` handlers.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, anyhow};
use dialoguer::{Confirm, Input, Password, Select};
use ddns_core::config::{MAX_TTL, MIN_TTL};
use ddns_core::{ConfigStore, DesiredState, ProxyPolicy, RecordSelection, mask_token};

const RECORD_CHOICES: [RecordSelection; 3] =
    [RecordSelection::A, RecordSelection::Aaaa, RecordSelection::Both];

const PROXY_CHOICES: [ProxyPolicy; 3] =
    [ProxyPolicy::Preserve, ProxyPolicy::Enabled, ProxyPolicy::Disabled];

/// Raw answers collected by the prompt sequence
#[derive(Debug, Clone)]
pub struct Answers {
    /// Empty keeps the existing token
    pub api_token: String,
    pub zone_name: String,
    pub zone_id: String,
    pub subdomain: String,
    pub record_type: RecordSelection,
    pub ttl: u32,
    pub proxied: ProxyPolicy,
    pub force: bool,
    pub ipv4_url: String,
    pub ipv6_url: String,
}

/// Turn answers into a validated desired state.
///
/// An empty token answer keeps the token of `existing`.
pub fn build_state(answers: Answers, existing: Option<&DesiredState>) -> ddns_core::Result<DesiredState> {
    let api_token = match (answers.api_token.trim(), existing) {
        ("", Some(current)) => current.api_token.clone(),
        (token, _) => token.to_string(),
    };

    let mut state = DesiredState::new(api_token, answers.zone_name.trim())
        .with_subdomain(answers.subdomain.trim())
        .with_record_type(answers.record_type)
        .with_ttl(answers.ttl)
        .with_force(answers.force)
        .with_proxied(answers.proxied)
        .with_address_urls(answers.ipv4_url.trim(), answers.ipv6_url.trim());

    let zone_id = answers.zone_id.trim();
    if !zone_id.is_empty() {
        state = state.with_zone_id(zone_id);
    }

    state.validate()?;
    Ok(state)
}

fn prompt_err(e: dialoguer::Error) -> anyhow::Error {
    anyhow!("prompt failed: {e}")
}

/// Run the prompt sequence, pre-filling from `existing`
pub fn prompt(existing: Option<&DesiredState>) -> anyhow::Result<Answers> {
    let defaults = existing
        .cloned()
        .unwrap_or_else(|| DesiredState::new("", ""));

    let api_token = if existing.is_some() {
        Password::new()
            .with_prompt("Cloudflare API token (empty keeps the current one)")
            .allow_empty_password(true)
            .interact()
            .map_err(prompt_err)?
    } else {
        Password::new()
            .with_prompt("Cloudflare API token")
            .interact()
            .map_err(prompt_err)?
    };

    let zone_name: String = Input::new()
        .with_prompt("Zone name (e.g. example.com)")
        .with_initial_text(defaults.zone_name.clone())
        .interact_text()
        .map_err(prompt_err)?;

    let subdomain: String = Input::new()
        .with_prompt("Subdomain (empty or @ for the zone apex)")
        .with_initial_text(defaults.subdomain.clone())
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;

    let zone_id: String = Input::new()
        .with_prompt("Zone ID (optional, looked up by name when empty)")
        .with_initial_text(defaults.zone_id.clone().unwrap_or_default())
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;

    let record_index = Select::new()
        .with_prompt("Record type")
        .items(&RECORD_CHOICES.map(RecordSelection::as_str))
        .default(
            RECORD_CHOICES
                .iter()
                .position(|choice| *choice == defaults.record_type)
                .unwrap_or(0),
        )
        .interact()
        .map_err(prompt_err)?;

    let ttl: u32 = Input::new()
        .with_prompt(format!("TTL in seconds ({MIN_TTL}-{MAX_TTL})"))
        .default(defaults.ttl)
        .validate_with(|ttl: &u32| -> Result<(), String> {
            if (MIN_TTL..=MAX_TTL).contains(ttl) {
                Ok(())
            } else {
                Err(format!("TTL must be between {MIN_TTL} and {MAX_TTL}"))
            }
        })
        .interact_text()
        .map_err(prompt_err)?;

    let proxy_index = Select::new()
        .with_prompt("Cloudflare proxy")
        .items(&PROXY_CHOICES.map(ProxyPolicy::as_str))
        .default(
            PROXY_CHOICES
                .iter()
                .position(|choice| *choice == defaults.proxied)
                .unwrap_or(0),
        )
        .interact()
        .map_err(prompt_err)?;

    let force = Confirm::new()
        .with_prompt("Update on every run even if the address is unchanged?")
        .default(defaults.force)
        .interact()
        .map_err(prompt_err)?;

    let ipv4_url: String = Input::new()
        .with_prompt("IPv4 address service")
        .default(defaults.ipv4_url.clone())
        .interact_text()
        .map_err(prompt_err)?;

    let ipv6_url: String = Input::new()
        .with_prompt("IPv6 address service")
        .default(defaults.ipv6_url.clone())
        .interact_text()
        .map_err(prompt_err)?;

    Ok(Answers {
        api_token,
        zone_name,
        zone_id,
        subdomain,
        record_type: RECORD_CHOICES[record_index],
        ttl,
        proxied: PROXY_CHOICES[proxy_index],
        force,
        ipv4_url,
        ipv6_url,
    })
}

/// `setup`: prompt, validate, persist
pub async fn setup(store: &ConfigStore) -> anyhow::Result<()> {
    let existing = match store.load().await {
        Ok(existing) => existing,
        Err(e) => {
            tracing::warn!("Ignoring unreadable configuration: {}", e);
            None
        }
    };

    let answers = {
        let existing = existing.clone();
        tokio::task::spawn_blocking(move || prompt(existing.as_ref()))
            .await
            .context("prompt task panicked")??
    };

    let state = build_state(answers, existing.as_ref())?;
    store.persist(&state).await?;

    eprintln!("Saved configuration to {}", store.path().display());
    Ok(())
}

/// Render the configuration for `print`, token masked
pub fn render(state: &DesiredState, config_path: &Path, cache_dir: &Path) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "config_file = {}", config_path.display());
    let _ = writeln!(out, "cache_dir   = {}", cache_dir.display());
    let _ = writeln!(out, "api_token   = {}", mask_token(&state.api_token));
    let _ = writeln!(out, "zone_name   = {}", state.zone_name);
    let _ = writeln!(
        out,
        "zone_id     = {}",
        state.zone_id.as_deref().unwrap_or("(lookup by name)")
    );
    let _ = writeln!(out, "subdomain   = {}", state.subdomain);
    let _ = writeln!(out, "record_name = {}", state.record_name());
    let _ = writeln!(out, "record_type = {}", state.record_type.as_str());
    let _ = writeln!(out, "ttl         = {}", state.ttl);
    let _ = writeln!(out, "proxied     = {}", state.proxied.as_str());
    let _ = writeln!(out, "force       = {}", state.force);
    let _ = writeln!(out, "ipv4_url    = {}", state.ipv4_url);
    let _ = writeln!(out, "ipv6_url    = {}", state.ipv6_url);

    out
}
