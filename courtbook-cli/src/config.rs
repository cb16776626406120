//! `~/.courtbook/config.toml` plus environment overrides, turned into the
//! immutable `BookingConfig` the engine runs with.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use courtbook_browser::BrowserOptions;
use courtbook_core::{
    BookingConfig, BookingError, BookingRule, BookingSchedule, ContactDirectory, ContactField, ContactProfile,
    PageLayout, WaitBudgets, default_rules, weekday_name,
};

use crate::clock::parse_timezone;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Booking page (Calendly event URL).
    pub site_url: String,
    /// IANA zone the trigger times are written in.
    pub timezone: String,
    pub late_grace_minutes: i64,
    pub trigger_tolerance_minutes: i64,
    pub waits: WaitsSection,
    pub browser: BrowserOptions,
    pub layout: PageLayout,
    pub rules: Vec<RuleEntry>,
    pub profiles: BTreeMap<String, ContactProfile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitsSection {
    pub page_secs: u64,
    pub control_secs: u64,
    pub poll_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleEntry {
    pub trigger: String,
    pub target_day: String,
    pub target_time: String,
    pub contact: String,
}

impl Default for Config {
    fn default() -> Self {
        let rules = default_rules()
            .iter()
            .map(|r| RuleEntry {
                trigger: r.trigger.to_string(),
                target_day: weekday_name(r.target_weekday).to_string(),
                target_time: r.target_time.format("%H:%M").to_string(),
                contact: r.contact.clone(),
            })
            .collect();
        let profiles = ["primary", "secondary"]
            .into_iter()
            .map(|name| (name.to_string(), ContactProfile::default()))
            .collect();

        Self {
            site_url: String::new(),
            timezone: "Asia/Dubai".to_string(),
            late_grace_minutes: courtbook_core::resolver::DEFAULT_LATE_GRACE_MINUTES,
            trigger_tolerance_minutes: 0,
            waits: WaitsSection::default(),
            browser: BrowserOptions::default(),
            layout: PageLayout::default(),
            rules,
            profiles,
        }
    }
}

impl Default for WaitsSection {
    fn default() -> Self {
        let d = WaitBudgets::default();
        Self {
            page_secs: d.page.as_secs(),
            control_secs: d.control.as_secs(),
            poll_ms: d.poll_interval.as_millis() as u64,
        }
    }
}

impl WaitsSection {
    fn budgets(&self) -> WaitBudgets {
        WaitBudgets {
            page: Duration::from_secs(self.page_secs),
            control: Duration::from_secs(self.control_secs),
            poll_interval: Duration::from_millis(self.poll_ms.max(10)),
        }
    }
}

impl Config {
    /// Overlay `COURTBOOK_*` variables read through `var`.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("COURTBOOK_URL") {
            self.site_url = url;
        }
        if let Some(tz) = var("COURTBOOK_TIMEZONE") {
            self.timezone = tz;
        }

        let mut names: Vec<String> = self.profiles.keys().cloned().collect();
        for rule in &self.rules {
            if !names.contains(&rule.contact) {
                names.push(rule.contact.clone());
            }
        }
        for name in names {
            for field in ContactField::ALL {
                let key = format!(
                    "COURTBOOK_{}_{}",
                    env_segment(&name),
                    field.as_str().to_ascii_uppercase()
                );
                if let Some(value) = var(&key) {
                    self.profiles.entry(name.clone()).or_default().set(field, value);
                }
            }
        }
    }

    pub fn tz(&self) -> Result<Tz> {
        parse_timezone(&self.timezone)
    }

    /// Build the engine config. `tolerance` overrides the file value.
    pub fn to_booking_config(&self, tolerance: Option<i64>) -> Result<BookingConfig, BookingError> {
        let rules = self
            .rules
            .iter()
            .map(|r| BookingRule::parse(&r.trigger, &r.target_day, &r.target_time, &r.contact))
            .collect::<Result<Vec<_>, _>>()?;
        let schedule = BookingSchedule::new(rules)?;

        Ok(BookingConfig::new(self.site_url.trim(), schedule, ContactDirectory::new(self.profiles.clone()))
            .with_layout(self.layout.clone())
            .with_waits(self.waits.budgets())
            .with_late_grace(chrono::Duration::minutes(self.late_grace_minutes.max(0)))
            .with_trigger_tolerance(tolerance.unwrap_or(self.trigger_tolerance_minutes)))
    }
}

/// Profile name as it appears in a variable name: `night-owl` -> `NIGHT_OWL`.
fn env_segment(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect()
}

/// `--config` when given, else `~/.courtbook/config.toml`.
pub fn config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(p) = explicit {
        return Ok(p.to_path_buf());
    }
    let home = std::env::var_os("HOME").context("HOME is not set; pass --config")?;
    Ok(Path::new(&home).join(".courtbook").join("config.toml"))
}

/// Read the file (defaults when absent) and overlay the process environment.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let mut cfg = read_config_file(&config_path(explicit)?)?;
    cfg.apply_env(|k| std::env::var(k).ok().filter(|v| !v.trim().is_empty()));
    Ok(cfg)
}

pub fn read_config_file(p: &Path) -> Result<Config> {
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config(cfg: &Config, p: &Path) -> Result<()> {
    if let Some(dir) = p.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config(explicit: Option<&Path>) -> Result<PathBuf> {
    let p = config_path(explicit)?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(p);
    }
    save_config(&Config::default(), &p)?;
    println!("Wrote {}", p.display());
    Ok(p)
}
