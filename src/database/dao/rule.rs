use crate::error::AppError;
use crate::rule::Rule;
use rusqlite::{params, OptionalExtension, Row};

use crate::database::{lock_conn, now_millis, Database};

const RULE_COLUMNS: &str = "id, name, content, order_index, is_archived, created_at, updated_at";

fn rule_from_row(row: &Row<'_>) -> rusqlite::Result<Rule> {
    Ok(Rule {
        id: row.get(0)?,
        name: row.get(1)?,
        content: row.get(2)?,
        order_index: row.get(3)?,
        is_archived: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

impl Database {
    pub fn get_rules(&self, include_archived: bool) -> Result<Vec<Rule>, AppError> {
        let conn = lock_conn!(self.conn);
        let sql = format!(
            "SELECT {RULE_COLUMNS} FROM rules
             WHERE ?1 OR is_archived = 0
             ORDER BY order_index ASC, created_at ASC, id ASC"
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| AppError::Database(e.to_string()))?;
        let rule_iter = stmt
            .query_map(params![include_archived], rule_from_row)
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut rules = Vec::new();
        for rule_res in rule_iter {
            rules.push(rule_res.map_err(|e| AppError::Database(e.to_string()))?);
        }
        Ok(rules)
    }

    pub fn get_rule(&self, id: &str) -> Result<Option<Rule>, AppError> {
        let conn = lock_conn!(self.conn);
        let sql = format!("SELECT {RULE_COLUMNS} FROM rules WHERE id = ?1");
        conn.query_row(&sql, params![id], rule_from_row)
            .optional()
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a rule at the end of the ordering. The stored `order_index` is
    /// one past the current maximum, archived rules included.
    pub fn insert_rule(&self, rule: &Rule) -> Result<Rule, AppError> {
        let mut conn = lock_conn!(self.conn);
        let tx = conn
            .transaction()
            .map_err(|e| AppError::Database(e.to_string()))?;

        let max_index: Option<i64> = tx
            .query_row("SELECT MAX(order_index) FROM rules", [], |row| row.get(0))
            .map_err(|e| AppError::Database(e.to_string()))?;
        let order_index = max_index.map_or(0, |max| max + 1);

        tx.execute(
            "INSERT INTO rules (id, name, content, order_index, is_archived, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                rule.id,
                rule.name,
                rule.content,
                order_index,
                rule.is_archived,
                rule.created_at,
                rule.updated_at,
            ],
        )
        .map_err(|e| AppError::Database(e.to_string()))?;

        tx.commit().map_err(|e| AppError::Database(e.to_string()))?;
        Ok(Rule {
            order_index,
            ..rule.clone()
        })
    }

    pub fn update_rule(&self, rule: &Rule) -> Result<(), AppError> {
        let conn = lock_conn!(self.conn);
        let affected = conn
            .execute(
                "UPDATE rules SET name = ?2, content = ?3, updated_at = ?4 WHERE id = ?1",
                params![rule.id, rule.name, rule.content, rule.updated_at],
            )
            .map_err(|e| AppError::Database(e.to_string()))?;
        if affected == 0 {
            return Err(AppError::not_found(format!("Rule '{}'", rule.id)));
        }
        Ok(())
    }

    /// Soft delete: the row and its content stay in place
    pub fn set_rule_archived(&self, id: &str, archived: bool) -> Result<(), AppError> {
        let conn = lock_conn!(self.conn);
        let affected = conn
            .execute(
                "UPDATE rules SET is_archived = ?2, updated_at = ?3 WHERE id = ?1",
                params![id, archived, now_millis()],
            )
            .map_err(|e| AppError::Database(e.to_string()))?;
        if affected == 0 {
            return Err(AppError::not_found(format!("Rule '{id}'")));
        }
        Ok(())
    }

    /// Assign `order_index` from list position. Unknown ids fail the whole reorder.
    pub fn reorder_rules(&self, ids: &[String]) -> Result<(), AppError> {
        let mut conn = lock_conn!(self.conn);
        let tx = conn
            .transaction()
            .map_err(|e| AppError::Database(e.to_string()))?;

        for (index, id) in ids.iter().enumerate() {
            let affected = tx
                .execute(
                    "UPDATE rules SET order_index = ?2 WHERE id = ?1",
                    params![id, index as i64],
                )
                .map_err(|e| AppError::Database(e.to_string()))?;
            if affected == 0 {
                return Err(AppError::not_found(format!("Rule '{id}'")));
            }
        }

        tx.commit().map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
