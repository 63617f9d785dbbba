//! Session toggles.

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineOption {
    DisableOutputCodeToFile,
    DisableLoggingChatGPTHistory,
    DisableSendingChatGPTHistory,
}

impl EngineOption {
    pub const ALL: [EngineOption; 3] = [
        EngineOption::DisableOutputCodeToFile,
        EngineOption::DisableLoggingChatGPTHistory,
        EngineOption::DisableSendingChatGPTHistory,
    ];

    /// Configuration and REPL name of the option.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::DisableOutputCodeToFile => "disableOutputCodeToFile",
            Self::DisableLoggingChatGPTHistory => "disableLoggingChatGPTHistory",
            Self::DisableSendingChatGPTHistory => "disableSendingChatGPTHistory",
        }
    }
}

impl fmt::Display for EngineOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EngineOption {
    type Err = ConfigError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let trimmed = name.trim();
        Self::ALL
            .into_iter()
            .find(|option| option.name() == trimmed)
            .ok_or_else(|| ConfigError::UnknownOption(trimmed.to_string()))
    }
}

/// The three engine toggles. All default to `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptionSet {
    pub disable_output_code_to_file: bool,
    pub disable_logging_history: bool,
    pub disable_sending_history: bool,
}

impl OptionSet {
    #[must_use]
    pub fn get(&self, option: EngineOption) -> bool {
        match option {
            EngineOption::DisableOutputCodeToFile => self.disable_output_code_to_file,
            EngineOption::DisableLoggingChatGPTHistory => self.disable_logging_history,
            EngineOption::DisableSendingChatGPTHistory => self.disable_sending_history,
        }
    }

    pub fn set(&mut self, option: EngineOption, value: bool) {
        let slot = match option {
            EngineOption::DisableOutputCodeToFile => &mut self.disable_output_code_to_file,
            EngineOption::DisableLoggingChatGPTHistory => &mut self.disable_logging_history,
            EngineOption::DisableSendingChatGPTHistory => &mut self.disable_sending_history,
        };
        *slot = value;
    }

    /// Flips one toggle and returns its new value.
    pub fn flip(&mut self, option: EngineOption) -> bool {
        let next = !self.get(option);
        self.set(option, next);
        next
    }

    pub fn flip_by_name(&mut self, name: &str) -> Result<(EngineOption, bool), ConfigError> {
        let option = name.parse::<EngineOption>()?;
        Ok((option, self.flip(option)))
    }

    /// `(option, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (EngineOption, bool)> + '_ {
        EngineOption::ALL
            .into_iter()
            .map(move |option| (option, self.get(option)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_all_false() {
        let options = OptionSet::default();
        assert!(options.iter().all(|(_, value)| !value));
    }

    #[test]
    fn names_round_trip_through_from_str() {
        for option in EngineOption::ALL {
            assert_eq!(option.name().parse::<EngineOption>().ok(), Some(option));
        }
    }

    #[test]
    fn flip_toggles_only_the_named_option() {
        let mut options = OptionSet::default();

        assert!(options.flip(EngineOption::DisableSendingChatGPTHistory));
        assert!(options.disable_sending_history);
        assert!(!options.disable_logging_history);
        assert!(!options.disable_output_code_to_file);

        assert!(!options.flip(EngineOption::DisableSendingChatGPTHistory));
        assert_eq!(options, OptionSet::default());
    }

    #[test]
    fn flip_by_name_rejects_unknown_names() {
        let mut options = OptionSet::default();

        let error = options
            .flip_by_name("disableEverything")
            .expect_err("unknown option");

        assert!(matches!(error, ConfigError::UnknownOption(name) if name == "disableEverything"));
        assert_eq!(options, OptionSet::default());
    }

    #[test]
    fn flip_by_name_is_case_sensitive() {
        let mut options = OptionSet::default();
        assert!(options.flip_by_name("DISABLEOUTPUTCODETOFILE").is_err());
        assert_eq!(
            options.flip_by_name(" disableOutputCodeToFile ").ok(),
            Some((EngineOption::DisableOutputCodeToFile, true))
        );
    }
}
