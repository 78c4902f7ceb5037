use crate::ConfigError;
use std::fmt;

pub const EMAIL_VAR: &str = "EMAIL";
pub const PASSWORD_VAR: &str = "PASSWORD";
pub const AGENTQL_API_KEY_VAR: &str = "AGENTQL_API_KEY";
pub const AIRTABLE_API_KEY_VAR: &str = "AIRTABLE_API_KEY";
pub const AIRTABLE_BASE_ID_VAR: &str = "AIRTABLE_BASE_ID";
pub const AIRTABLE_TABLE_NAME_VAR: &str = "AIRTABLE_TABLE_NAME";

/// Secrets read once at process start
///
/// Nothing below the binary reads the environment; components that need a
/// secret receive this struct and ask for exactly what they use.
#[derive(Clone, Default)]
pub struct Credentials {
    email: Option<String>,
    password: Option<String>,
    agentql_api_key: Option<String>,
    airtable_api_key: Option<String>,
    airtable_base_id: Option<String>,
    airtable_table_name: Option<String>,
}

/// Airtable destination resolved from the credentials
#[derive(Debug, Clone, Copy)]
pub struct AirtableTarget<'a> {
    pub api_key: &'a str,
    pub base_id: &'a str,
    pub table_name: &'a str,
}

impl Credentials {
    /// Reads every known variable from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds credentials from an arbitrary key lookup; blank values count as missing
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            email: get(EMAIL_VAR),
            password: get(PASSWORD_VAR),
            agentql_api_key: get(AGENTQL_API_KEY_VAR),
            airtable_api_key: get(AIRTABLE_API_KEY_VAR),
            airtable_base_id: get(AIRTABLE_BASE_ID_VAR),
            airtable_table_name: get(AIRTABLE_TABLE_NAME_VAR),
        }
    }

    /// Email and password for the login form
    pub fn require_login(&self) -> Result<(&str, &str), ConfigError> {
        Ok((
            require(&self.email, EMAIL_VAR)?,
            require(&self.password, PASSWORD_VAR)?,
        ))
    }

    pub fn require_agentql_key(&self) -> Result<&str, ConfigError> {
        require(&self.agentql_api_key, AGENTQL_API_KEY_VAR)
    }

    pub fn require_airtable(&self) -> Result<AirtableTarget<'_>, ConfigError> {
        Ok(AirtableTarget {
            api_key: require(&self.airtable_api_key, AIRTABLE_API_KEY_VAR)?,
            base_id: require(&self.airtable_base_id, AIRTABLE_BASE_ID_VAR)?,
            table_name: require(&self.airtable_table_name, AIRTABLE_TABLE_NAME_VAR)?,
        })
    }
}

fn require<'a>(value: &'a Option<String>, var: &str) -> Result<&'a str, ConfigError> {
    value
        .as_deref()
        .ok_or_else(|| ConfigError::MissingEnv(var.to_string()))
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = |v: &Option<String>| if v.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &mask(&self.password))
            .field("agentql_api_key", &mask(&self.agentql_api_key))
            .field("airtable_api_key", &mask(&self.airtable_api_key))
            .field("airtable_base_id", &self.airtable_base_id)
            .field("airtable_table_name", &self.airtable_table_name)
            .finish()
    }
}
