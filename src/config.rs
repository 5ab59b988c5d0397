use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{bail, Context};

use crate::models::Area;

pub const DEFAULT_SHEET_ID: &str = "1UajWCygx78XEM6yyIxZsiMpC3HTgV7OjNb99bH8fGqk";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_REFRESH_SECS: u64 = 300;

pub const GENERAL_FORM_LINK: &str = "https://docs.google.com/forms/d/e/1FAIpQLSdv9foMi-FDRfydeMw-MHzTtztvvrZcodjdcNUk3kX9uwk46w/viewform?usp=sharing";
pub const ADMIN_FORM_LINK: &str = "https://docs.google.com/forms/d/e/1FAIpQLSfyK49yrvtELhAekg4icrRzRhxOvBPbseH4iFsj89HP1VPpRQ/viewform?usp=sharing";

/// How a report row is attributed to an area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AreaMatch {
    /// Case-insensitive substring search over the whole serialised row.
    RowText,
    /// Case-insensitive equality against one named column.
    Column(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub sheet_id: String,
    pub sheet_token: Option<String>,
    pub gemini_api_key: Option<String>,
    pub model: String,
    pub refresh_interval: Duration,
    pub area_match: AreaMatch,
    pub general_form_link: String,
    pub admin_form_link: String,
    admin_passwords: BTreeMap<Area, String>,
}

impl Default for Config {
    fn default() -> Self {
        let admin_passwords = BTreeMap::from([
            (Area::Delhi, "dlh_admin_123".to_string()),
            (Area::Noida, "nd_admin_456".to_string()),
            (Area::Mumbai, "mum_admin_789".to_string()),
        ]);

        Self {
            sheet_id: DEFAULT_SHEET_ID.to_string(),
            sheet_token: None,
            gemini_api_key: None,
            model: DEFAULT_MODEL.to_string(),
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_SECS),
            area_match: AreaMatch::RowText,
            general_form_link: GENERAL_FORM_LINK.to_string(),
            admin_form_link: ADMIN_FORM_LINK.to_string(),
            admin_passwords,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup` on top of the defaults. Blank values
    /// count as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Config::default();

        if let Some(sheet_id) = get("WBC_SHEET_ID") {
            config.sheet_id = sheet_id.trim().to_string();
        }
        config.sheet_token = get("WBC_SHEET_TOKEN");
        config.gemini_api_key = get("GEMINI_API_KEY");
        if let Some(model) = get("WBC_MODEL") {
            config.model = model.trim().to_string();
        }
        if let Some(secs) = get("WBC_REFRESH_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .with_context(|| format!("WBC_REFRESH_SECS must be whole seconds, got {secs:?}"))?;
            config.refresh_interval = Duration::from_secs(secs);
        }
        if let Some(column) = get("WBC_AREA_COLUMN") {
            config.area_match = AreaMatch::Column(column.trim().to_string());
        }
        if let Some(list) = get("WBC_ADMIN_PASSWORDS") {
            config
                .apply_password_overrides(&list)
                .context("invalid WBC_ADMIN_PASSWORDS")?;
        }

        Ok(config)
    }

    pub fn admin_password(&self, area: Area) -> Option<&str> {
        self.admin_passwords.get(&area).map(String::as_str)
    }

    fn apply_password_overrides(&mut self, list: &str) -> anyhow::Result<()> {
        for entry in list.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let Some((name, secret)) = entry.split_once('=') else {
                bail!("expected Area=password, got {entry:?}");
            };
            let Some(area) = Area::from_name(name) else {
                bail!("unknown area {:?}", name.trim());
            };
            self.admin_passwords.insert(area, secret.to_string());
        }
        Ok(())
    }
}
