use crate::domain::ids::DispositionId;
use crate::domain::modifier::{Modifier, ModifierSet};
use crate::error::CoreError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_DISPOSITION_NAME: &str = "No Disposition";
pub const MAX_WINDOW_DAYS: i32 = 3650;

/// What happens once an exclude-count disposition reaches its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExcludeAction {
    #[default]
    None,
    Dnc,
    #[serde(rename = "timeout")]
    TimeOut,
}

impl ExcludeAction {
    pub const fn as_str(self) -> &'static str {
        match self {
            ExcludeAction::None => "none",
            ExcludeAction::Dnc => "dnc",
            ExcludeAction::TimeOut => "timeout",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" | "" => Some(ExcludeAction::None),
            "dnc" => Some(ExcludeAction::Dnc),
            "timeout" => Some(ExcludeAction::TimeOut),
            _ => None,
        }
    }
}

/// Parameters of an active exclude-count modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExcludeRule {
    pub after_attempts: i32,
    pub action: ExcludeAction,
    pub action_timeout_days: Option<i32>,
}

impl ExcludeRule {
    pub fn is_reached(&self, uses: usize) -> bool {
        self.after_attempts > 0 && uses >= self.after_attempts as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disposition {
    pub id: DispositionId,
    pub name: String,
    pub modifiers: ModifierSet,
    pub timeout_days: Option<i32>,
    pub exclude_after_attempts: Option<i32>,
    pub exclude_action: ExcludeAction,
    pub exclude_action_timeout_days: Option<i32>,
    pub is_default: bool,
}

impl Disposition {
    pub fn system_default() -> Self {
        Self {
            id: DispositionId::system_default(),
            name: DEFAULT_DISPOSITION_NAME.to_string(),
            modifiers: ModifierSet::empty(),
            timeout_days: None,
            exclude_after_attempts: None,
            exclude_action: ExcludeAction::None,
            exclude_action_timeout_days: None,
            is_default: true,
        }
    }

    pub fn has(&self, modifier: Modifier) -> bool {
        self.modifiers.contains(modifier)
    }

    /// Suspension window, only when the timeout modifier is active.
    pub fn timeout_days(&self) -> Option<i32> {
        if self.has(Modifier::TimeOut) {
            self.timeout_days
        } else {
            None
        }
    }

    /// Threshold rule, only when the exclude-count modifier is active.
    pub fn exclude_rule(&self) -> Option<ExcludeRule> {
        if !self.has(Modifier::ExcludeCount) {
            return None;
        }
        let after_attempts = self.exclude_after_attempts?;
        let action_timeout_days = match self.exclude_action {
            ExcludeAction::TimeOut => self.exclude_action_timeout_days,
            _ => None,
        };
        Some(ExcludeRule {
            after_attempts,
            action: self.exclude_action,
            action_timeout_days,
        })
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::EmptyDispositionName);
        }

        if self.has(Modifier::TimeOut) {
            let days = self.timeout_days.ok_or(CoreError::MissingTimeoutDays)?;
            if days <= 0 || days > MAX_WINDOW_DAYS {
                return Err(CoreError::InvalidTimeoutDays(days));
            }
        }

        if self.has(Modifier::ExcludeCount) {
            let attempts = self
                .exclude_after_attempts
                .ok_or(CoreError::MissingExcludeAttempts)?;
            if attempts <= 0 {
                return Err(CoreError::InvalidExcludeAttempts(attempts));
            }
            if self.exclude_action == ExcludeAction::TimeOut {
                let days = self
                    .exclude_action_timeout_days
                    .ok_or(CoreError::MissingExcludeActionDays)?;
                if days <= 0 || days > MAX_WINDOW_DAYS {
                    return Err(CoreError::InvalidExcludeActionDays(days));
                }
            }
        }

        Ok(())
    }

    /// Drops parameters whose modifier is not active.
    pub fn normalized(mut self) -> Self {
        if !self.has(Modifier::TimeOut) {
            self.timeout_days = None;
        }
        if !self.has(Modifier::ExcludeCount) {
            self.exclude_after_attempts = None;
            self.exclude_action = ExcludeAction::None;
        }
        if self.exclude_action != ExcludeAction::TimeOut {
            self.exclude_action_timeout_days = None;
        }
        self.name = self.name.trim().to_string();
        self
    }
}
