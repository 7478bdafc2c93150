use crate::database::now_millis;
use crate::error::AppError;
use crate::rule::{Rule, RulePatch};
use crate::store::AppState;

pub struct RuleService;

impl RuleService {
    /// Unarchived rules unless `include_archived`, in display order
    pub fn list(state: &AppState, include_archived: bool) -> Result<Vec<Rule>, AppError> {
        state.db.get_rules(include_archived)
    }

    pub fn get(state: &AppState, id: &str) -> Result<Rule, AppError> {
        state
            .db
            .get_rule(id)?
            .ok_or_else(|| AppError::not_found(format!("Rule '{id}'")))
    }

    pub fn create(state: &AppState, name: &str, content: &str) -> Result<Rule, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Rule name must not be empty"));
        }
        let now = now_millis();
        let rule = Rule {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            content: content.to_string(),
            order_index: 0,
            is_archived: false,
            created_at: now,
            updated_at: now,
        };
        state.db.insert_rule(&rule)
    }

    pub fn update(state: &AppState, id: &str, patch: RulePatch) -> Result<Rule, AppError> {
        let mut rule = Self::get(state, id)?;
        if let Some(name) = patch.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(AppError::validation("Rule name must not be empty"));
            }
            rule.name = name.to_string();
        }
        if let Some(content) = patch.content {
            rule.content = content;
        }
        rule.updated_at = now_millis();
        state.db.update_rule(&rule)?;
        Ok(rule)
    }

    /// Soft delete; the content stays available through `restore`
    pub fn delete(state: &AppState, id: &str) -> Result<(), AppError> {
        state.db.set_rule_archived(id, true)?;
        log::info!("Archived rule {id}");
        Ok(())
    }

    pub fn restore(state: &AppState, id: &str) -> Result<Rule, AppError> {
        state.db.set_rule_archived(id, false)?;
        Self::get(state, id)
    }

    pub fn reorder(state: &AppState, ids: &[String]) -> Result<(), AppError> {
        state.db.reorder_rules(ids)
    }
}
