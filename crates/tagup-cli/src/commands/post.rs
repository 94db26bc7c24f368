//! Post command handler

use anyhow::{bail, Result};

use tagup_core::{
    connection, Alert, Config, Controller, FormFields, ListView, StoreError, SubmitOutcome,
};

use crate::output::Output;

/// Shows validation failures on stderr
struct CliAlert<'a> {
    output: &'a Output,
}

impl Alert for CliAlert<'_> {
    fn alert(&mut self, message: &str) {
        self.output.error(message);
    }
}

/// Build the form from command-line arguments
///
/// The author falls back to the configured default name.
pub fn build_form(
    config: &Config,
    name: Option<String>,
    site: Option<String>,
    text: &[String],
) -> FormFields {
    let name = name.or_else(|| config.author.clone()).unwrap_or_default();
    FormFields::new(name, site.unwrap_or_default(), text.join(" "))
}

/// Submit one update
pub async fn post(
    config: &Config,
    name: Option<String>,
    site: Option<String>,
    text: Vec<String>,
    output: &Output,
) -> Result<()> {
    let mut form = build_form(config, name, site, &text);

    let client = connection::connect(config);
    let controller: Controller<_, ListView> = Controller::new(client, None, config.table.as_str());

    let mut alert = CliAlert { output };
    match controller.submit(&mut form, &mut alert).await {
        SubmitOutcome::Inserted => {
            output.success("Update posted");
            Ok(())
        }
        SubmitOutcome::Rejected(_) => bail!("Update not posted"),
        SubmitOutcome::Failed(e) => {
            if let Some(hint) = failure_hint(&e) {
                output.error(hint);
            }
            bail!("Failed to post update: {}", e)
        }
    }
}

/// Hint printed after a failed insert
fn failure_hint(error: &StoreError) -> Option<&'static str> {
    error.recovery_suggestion().or_else(|| {
        error
            .is_retryable()
            .then_some("The service may be briefly unavailable. Try posting again.")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_form_joins_text() {
        let config = Config::default();
        let text = vec!["Shipped".to_string(), "v2".to_string()];
        let form = build_form(&config, Some("Bo".to_string()), Some("HQ".to_string()), &text);
        assert_eq!(form, FormFields::new("Bo", "HQ", "Shipped v2"));
    }

    #[test]
    fn test_build_form_uses_configured_author() {
        let config = Config {
            author: Some("Ann".to_string()),
            ..Config::default()
        };
        let form = build_form(&config, None, None, &["hi".to_string()]);
        assert_eq!(form.user_name, "Ann");
        assert_eq!(form.site, "");

        let explicit = build_form(&config, Some("Bo".to_string()), None, &[]);
        assert_eq!(explicit.user_name, "Bo");
    }

    #[test]
    fn test_failure_hint() {
        let unavailable = StoreError::Api {
            status: 503,
            message: "Service Unavailable".to_string(),
            code: None,
        };
        assert!(failure_hint(&unavailable).unwrap().contains("Try posting again"));

        let denied = StoreError::Api {
            status: 401,
            message: "JWT expired".to_string(),
            code: None,
        };
        assert_eq!(failure_hint(&denied), denied.recovery_suggestion());

        let conflict = StoreError::Api {
            status: 409,
            message: "duplicate key".to_string(),
            code: Some("23505".to_string()),
        };
        assert!(failure_hint(&conflict).is_none());
    }
}
