//! Remediation-plan policy: typed defaults, an optional override file, and
//! the evaluator that turns a plan into a list of violations.

mod clock;
mod loader;

pub use clock::{Clock, FixedClock, SystemClock};
pub use loader::{PolicyOverride, load_policy};

use crate::workflow::PlanStep;
use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

const RESTART_KEYWORD: &str = "restart";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub max_steps: usize,
    pub business_hours_block_restart: bool,
    /// IANA zone name, e.g. `America/New_York`
    pub business_hours_tz: String,
    /// Inclusive start hour
    pub hours_start: u32,
    /// Exclusive end hour
    pub hours_end: u32,
    pub require_verify_for_cmds: bool,
    pub require_rollback_for_restart: bool,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            max_steps: 10,
            business_hours_block_restart: true,
            business_hours_tz: "America/New_York".into(),
            hours_start: 9,
            hours_end: 17,
            require_verify_for_cmds: true,
            require_rollback_for_restart: true,
        }
    }
}

impl PolicyConfig {
    pub fn time_zone(&self) -> Result<Tz, String> {
        self.business_hours_tz
            .parse::<Tz>()
            .map_err(|_| format!("unknown time zone '{}'", self.business_hours_tz))
    }

    pub fn validate(&self) -> Result<(), String> {
        self.time_zone()?;
        if self.hours_end > 24 || self.hours_start >= self.hours_end {
            return Err(format!(
                "business hours must satisfy 0 <= start < end <= 24, got {}..{}",
                self.hours_start, self.hours_end
            ));
        }
        Ok(())
    }

    /// True when `now`, seen in the configured zone, falls in
    /// `[hours_start, hours_end)`. An unknown zone is read as UTC.
    pub fn in_business_hours(&self, now: DateTime<Utc>) -> bool {
        let hour = match self.time_zone() {
            Ok(tz) => now.with_timezone(&tz).hour(),
            Err(_) => now.hour(),
        };
        (self.hours_start..self.hours_end).contains(&hour)
    }
}

/// Check `plan` against `policy` at time `now`. Every rule runs; all
/// violations are returned together, in plan order.
pub fn evaluate(plan: &[PlanStep], policy: &PolicyConfig, now: DateTime<Utc>) -> Vec<String> {
    let mut violations = Vec::new();

    if plan.len() > policy.max_steps {
        violations.push(format!(
            "Plan has {} steps > max {}.",
            plan.len(),
            policy.max_steps
        ));
    }

    let restart_blocked = policy.business_hours_block_restart && policy.in_business_hours(now);

    for step in plan {
        let Some(command) = step.effective_command() else {
            continue;
        };
        let command = command.to_lowercase();
        let is_restart = command.contains(RESTART_KEYWORD);

        if policy.require_verify_for_cmds && step.effective_verify().is_none() {
            violations.push(format!("Missing verify for cmd: {command}"));
        }
        if is_restart && policy.require_rollback_for_restart && step.effective_rollback().is_none()
        {
            violations.push(format!("Missing rollback for restart cmd: {command}"));
        }
        if restart_blocked && is_restart {
            violations.push(format!("Restart blocked during business hours: {command}"));
        }
    }

    violations
}
