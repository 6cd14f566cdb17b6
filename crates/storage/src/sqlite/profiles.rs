use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pathfinder_core::{Deadline, Goal, GoalStatus, StudentProfile};
use rusqlite::{Row, params};

use super::{Storage, parse_ts, ts};
use crate::error::StorageError;
use crate::traits::ProfileStore;

fn read_profile(row: &Row<'_>) -> rusqlite::Result<StudentProfile> {
    let target_schools: String = row.get(8)?;
    let target_schools = serde_json::from_str(&target_schools)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

    Ok(StudentProfile {
        student_id: row.get(0)?,
        name: row.get(1)?,
        grade_level: row.get(2)?,
        school: row.get(3)?,
        gpa: row.get(4)?,
        sat_score: row.get(5)?,
        act_score: row.get(6)?,
        intended_major: row.get(7)?,
        target_schools,
    })
}

fn read_goal(row: &Row<'_>) -> rusqlite::Result<Goal> {
    let status: String = row.get(3)?;
    let status: GoalStatus = status
        .parse()
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

    Ok(Goal {
        id: row.get(0)?,
        student_id: row.get(1)?,
        title: row.get(2)?,
        status,
        total_tasks: row.get(4)?,
        completed_tasks: row.get(5)?,
    })
}

fn read_deadline(row: &Row<'_>) -> rusqlite::Result<Deadline> {
    let due_date: String = row.get(3)?;
    Ok(Deadline {
        id: row.get(0)?,
        student_id: row.get(1)?,
        title: row.get(2)?,
        due_date: parse_ts(&due_date)?,
        school: row.get(4)?,
    })
}

#[async_trait]
impl ProfileStore for Storage {
    async fn get_profile(&self, student_id: &str) -> Result<Option<StudentProfile>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT student_id, name, grade_level, school, gpa, sat_score, act_score,
                    intended_major, target_schools
             FROM student_profiles WHERE student_id = ?1",
        )?;
        let mut rows = stmt.query_map(params![student_id], read_profile)?;
        rows.next().transpose().map_err(StorageError::from)
    }

    async fn upsert_profile(&self, profile: &StudentProfile) -> Result<(), StorageError> {
        let target_schools = serde_json::to_string(&profile.target_schools)?;
        let conn = self.conn()?;
        conn.execute(
            r"INSERT OR REPLACE INTO student_profiles
              (student_id, name, grade_level, school, gpa, sat_score, act_score,
               intended_major, target_schools)
              VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                profile.student_id,
                profile.name,
                profile.grade_level,
                profile.school,
                profile.gpa,
                profile.sat_score,
                profile.act_score,
                profile.intended_major,
                target_schools,
            ],
        )?;
        Ok(())
    }

    async fn get_open_goals(&self, student_id: &str) -> Result<Vec<Goal>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, student_id, title, status, total_tasks, completed_tasks
             FROM goals
             WHERE student_id = ?1 AND status IN ('planning', 'in_progress')
             ORDER BY title ASC",
        )?;
        let goals = stmt
            .query_map(params![student_id], read_goal)?
            .collect::<rusqlite::Result<Vec<Goal>>>()?;
        Ok(goals)
    }

    async fn upsert_goal(&self, goal: &Goal) -> Result<(), StorageError> {
        let conn = self.conn()?;
        conn.execute(
            r"INSERT OR REPLACE INTO goals
              (id, student_id, title, status, total_tasks, completed_tasks)
              VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                goal.id,
                goal.student_id,
                goal.title,
                goal.status.as_str(),
                goal.total_tasks,
                goal.completed_tasks,
            ],
        )?;
        Ok(())
    }

    async fn get_upcoming_deadlines(
        &self,
        student_id: &str,
        after: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Deadline>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, student_id, title, due_date, school
             FROM deadlines
             WHERE student_id = ?1 AND due_date >= ?2
             ORDER BY due_date ASC
             LIMIT ?3",
        )?;
        let deadlines = stmt
            .query_map(params![student_id, ts(after), limit], read_deadline)?
            .collect::<rusqlite::Result<Vec<Deadline>>>()?;
        Ok(deadlines)
    }

    async fn upsert_deadline(&self, deadline: &Deadline) -> Result<(), StorageError> {
        let conn = self.conn()?;
        conn.execute(
            r"INSERT OR REPLACE INTO deadlines (id, student_id, title, due_date, school)
              VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                deadline.id,
                deadline.student_id,
                deadline.title,
                ts(deadline.due_date),
                deadline.school,
            ],
        )?;
        Ok(())
    }
}
