use anyhow::{Context, Result, anyhow};
use orgchart::{SchemaOptions, WriteMode};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub cors_allowed_origins: Vec<String>,
    pub schema: SchemaOptions,
    pub graphiql: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cors_allowed_origins: vec!["http://localhost:5173".into()],
            schema: SchemaOptions::default(),
            graphiql: true,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let cors_allowed_origins = match lookup("CORS_ALLOWED_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    if trimmed.is_empty() {
                        None
                    } else {
                        Some(trimmed.to_string())
                    }
                })
                .collect::<Vec<_>>(),
            None => defaults.cors_allowed_origins,
        };

        let write_mode = match lookup("ORGCHART_WRITE_MODE") {
            Some(raw) => raw
                .parse::<WriteMode>()
                .context("invalid ORGCHART_WRITE_MODE")?,
            None => defaults.schema.write_mode,
        };
        let check_references = flag(&lookup, "ORGCHART_CHECK_REFERENCES", false)?;
        let batch_lookups = flag(&lookup, "ORGCHART_BATCH_LOOKUPS", false)?;
        let graphiql = flag(&lookup, "GRAPHIQL", defaults.graphiql)?;

        Ok(Self {
            cors_allowed_origins,
            schema: SchemaOptions {
                write_mode,
                check_references,
                batch_lookups,
            },
            graphiql,
        })
    }
}

fn flag(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> Result<bool> {
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow!("{key} must be a boolean, got {other:?}")),
    }
}
