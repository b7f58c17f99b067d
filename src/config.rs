//! Runtime settings that change how the app looks and who it trusts.

use crate::{Error, timezone::get_local_offset};

/// The default label appended to formatted amounts.
pub const DEFAULT_CURRENCY_LABEL: &str = "€";

/// Settings for rendering expense amounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewConfig {
    /// The label appended to every formatted amount, e.g. "€" in "18.75 €".
    pub currency_label: String,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            currency_label: DEFAULT_CURRENCY_LABEL.to_owned(),
        }
    }
}

/// How the identity provider in front of the server hands over the signed
/// in user, and where to send users to sign in or out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityConfig {
    /// The request header holding the stable ID of the signed in user.
    pub user_header: String,

    /// The request header holding the email address of the signed in user, if any.
    pub email_header: String,

    /// Where to send users that are not signed in.
    pub sign_in_url: String,

    /// Where to send users after their session has been cleared.
    pub sign_out_url: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            user_header: "X-Forwarded-User".to_owned(),
            email_header: "X-Forwarded-Email".to_owned(),
            sign_in_url: "/oauth2/sign_in".to_owned(),
            sign_out_url: "/oauth2/sign_out".to_owned(),
        }
    }
}

/// Everything needed to configure the app apart from the database and the
/// cookie secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,

    /// Settings for rendering expense amounts.
    pub view: ViewConfig,

    /// Settings for the upstream identity provider.
    pub identity: IdentityConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            local_timezone: "Etc/UTC".to_owned(),
            view: ViewConfig::default(),
            identity: IdentityConfig::default(),
        }
    }
}

impl AppConfig {
    /// Check the config before the server starts.
    ///
    /// # Errors
    /// Returns [Error::InvalidTimezone] if the timezone is unknown, or
    /// [Error::EmptyCurrencyLabel] if the currency label is blank.
    pub fn validate(&self) -> Result<(), Error> {
        if get_local_offset(&self.local_timezone).is_none() {
            return Err(Error::InvalidTimezone(self.local_timezone.clone()));
        }

        if self.view.currency_label.trim().is_empty() {
            return Err(Error::EmptyCurrencyLabel);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::Error;

    use super::{AppConfig, ViewConfig};

    #[test]
    fn default_config_is_valid() {
        assert_eq!(AppConfig::default().validate(), Ok(()));
    }

    #[test]
    fn default_currency_label_is_euro() {
        assert_eq!(ViewConfig::default().currency_label, "€");
    }

    #[test]
    fn rejects_unknown_timezone() {
        let config = AppConfig {
            local_timezone: "Not/A_Timezone".to_owned(),
            ..Default::default()
        };

        assert_eq!(
            config.validate(),
            Err(Error::InvalidTimezone("Not/A_Timezone".to_owned()))
        );
    }

    #[test]
    fn rejects_blank_currency_label() {
        let config = AppConfig {
            view: ViewConfig {
                currency_label: "  ".to_owned(),
            },
            ..Default::default()
        };

        assert_eq!(config.validate(), Err(Error::EmptyCurrencyLabel));
    }
}
