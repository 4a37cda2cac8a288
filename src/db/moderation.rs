use chrono::{DateTime, Duration, Utc};
use leptos::logging::log;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

use super::restaurants::{insert_restaurant, load_restaurant, update_restaurant};
use super::{json_column, parsed_column, to_json, Database};
use crate::error::AppError;
use crate::models::edit_suggestion::NewEditSuggestion;
use crate::models::report::NewReport;
use crate::models::reviewer_application::{ApplicationReview, NewApplication};
use crate::models::{
    ApplicationStats, DecisionStatus, EditSuggestion, ListingStatus, Report, ReportAction,
    ReportStatus, RestaurantDraft, ReviewerApplication, Submission, SubmissionAction, User,
};
use crate::moderation::{apply_changes, validate_changes};
use crate::validation;
use crate::voting::{VoteDirection, VoteTally};

const SUBMISSION_COLUMNS: &str = "id, restaurant_name, submitted_by, submitted_at, status, data,
    reviewer_comments, reviewed_by, reviewed_at, restaurant_id";

fn submission_from_row(row: &Row<'_>) -> rusqlite::Result<Submission> {
    Ok(Submission {
        id: row.get(0)?,
        restaurant_name: row.get(1)?,
        submitted_by: row.get(2)?,
        submitted_at: row.get(3)?,
        status: parsed_column(row, 4, |s| s.parse().ok())?,
        data: json_column(row, 5)?,
        reviewer_comments: json_column(row, 6)?,
        reviewed_by: row.get(7)?,
        reviewed_at: row.get(8)?,
        restaurant_id: row.get(9)?,
    })
}

fn load_submission(conn: &Connection, id: i64) -> Result<Submission, AppError> {
    conn.query_row(
        &format!("SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE id = ?1"),
        [id],
        submission_from_row,
    )
    .optional()?
    .ok_or_else(|| AppError::not_found(format!("Submission {id}")))
}

fn save_submission(conn: &Connection, s: &Submission) -> Result<(), AppError> {
    conn.execute(
        "UPDATE submissions SET restaurant_name = ?1, status = ?2, data = ?3,
            reviewer_comments = ?4, reviewed_by = ?5, reviewed_at = ?6, restaurant_id = ?7
         WHERE id = ?8",
        params![
            s.restaurant_name,
            s.status.as_str(),
            to_json(&s.data)?,
            to_json(&s.reviewer_comments)?,
            s.reviewed_by,
            s.reviewed_at,
            s.restaurant_id,
            s.id,
        ],
    )?;
    Ok(())
}

// ?1 is the viewer whose vote is reported.
const SUGGESTION_SELECT: &str = "SELECT es.id, es.restaurant_id, COALESCE(r.name, ''), u.email,
        u.display_name, es.changes, es.reason, es.status, es.upvotes, es.downvotes, es.created_at,
        es.rejection_reason, es.reviewed_by, es.reviewed_at, v.direction
    FROM edit_suggestions es
    JOIN users u ON u.id = es.user_id
    LEFT JOIN restaurants r ON r.id = es.restaurant_id
    LEFT JOIN suggestion_votes v ON v.suggestion_id = es.id AND v.user_id = ?1";

fn suggestion_from_row(row: &Row<'_>) -> rusqlite::Result<EditSuggestion> {
    let vote: Option<String> = row.get(14)?;
    Ok(EditSuggestion {
        id: row.get(0)?,
        restaurant_id: row.get(1)?,
        restaurant_name: row.get(2)?,
        user_email: row.get(3)?,
        display_name: row.get(4)?,
        changes: json_column(row, 5)?,
        reason: row.get(6)?,
        status: parsed_column(row, 7, DecisionStatus::parse)?,
        upvotes: row.get(8)?,
        downvotes: row.get(9)?,
        created_at: row.get(10)?,
        rejection_reason: row.get(11)?,
        reviewed_by: row.get(12)?,
        reviewed_at: row.get(13)?,
        current_user_vote: vote.as_deref().and_then(VoteDirection::parse),
    })
}

fn load_suggestion(conn: &Connection, id: i64, viewer: Option<i64>) -> Result<EditSuggestion, AppError> {
    conn.query_row(
        &format!("{SUGGESTION_SELECT} WHERE es.id = ?2"),
        params![viewer, id],
        suggestion_from_row,
    )
    .optional()?
    .ok_or_else(|| AppError::not_found(format!("Edit suggestion {id}")))
}

fn save_suggestion_decision(conn: &Connection, s: &EditSuggestion) -> Result<(), AppError> {
    conn.execute(
        "UPDATE edit_suggestions SET status = ?1, rejection_reason = ?2, reviewed_by = ?3,
            reviewed_at = ?4
         WHERE id = ?5",
        params![
            s.status.as_str(),
            s.rejection_reason,
            s.reviewed_by,
            s.reviewed_at,
            s.id
        ],
    )?;
    Ok(())
}

const REPORT_SELECT: &str = "SELECT rp.id, rp.review_id, rp.restaurant_id, u.email, rp.reason,
        rp.status, rp.created_at, rp.action, rp.resolved_by, rp.resolved_at
    FROM reports rp
    JOIN users u ON u.id = rp.reporter_id";

fn report_from_row(row: &Row<'_>) -> rusqlite::Result<Report> {
    let action: Option<String> = row.get(7)?;
    Ok(Report {
        id: row.get(0)?,
        review_id: row.get(1)?,
        restaurant_id: row.get(2)?,
        reporter: row.get(3)?,
        reason: row.get(4)?,
        status: parsed_column(row, 5, ReportStatus::parse)?,
        created_at: row.get(6)?,
        action: action.as_deref().and_then(ReportAction::parse),
        resolved_by: row.get(8)?,
        resolved_at: row.get(9)?,
    })
}

fn load_report(conn: &Connection, id: i64) -> Result<Report, AppError> {
    conn.query_row(
        &format!("{REPORT_SELECT} WHERE rp.id = ?1"),
        [id],
        report_from_row,
    )
    .optional()?
    .ok_or_else(|| AppError::not_found(format!("Report {id}")))
}

const APPLICATION_SELECT: &str = "SELECT a.id, u.email, u.name, a.motivation, a.experience,
        a.status, a.created_at, a.admin_notes, a.reviewed_by, a.reviewed_at
    FROM reviewer_applications a
    JOIN users u ON u.id = a.user_id";

fn application_from_row(row: &Row<'_>) -> rusqlite::Result<ReviewerApplication> {
    Ok(ReviewerApplication {
        id: row.get(0)?,
        user_email: row.get(1)?,
        user_name: row.get(2)?,
        motivation: row.get(3)?,
        experience: row.get(4)?,
        status: parsed_column(row, 5, DecisionStatus::parse)?,
        created_at: row.get(6)?,
        admin_notes: row.get(7)?,
        reviewed_by: row.get(8)?,
        reviewed_at: row.get(9)?,
    })
}

fn load_application(conn: &Connection, id: i64) -> Result<ReviewerApplication, AppError> {
    conn.query_row(
        &format!("{APPLICATION_SELECT} WHERE a.id = ?1"),
        [id],
        application_from_row,
    )
    .optional()?
    .ok_or_else(|| AppError::not_found(format!("Application {id}")))
}

/// What a maintenance purge removed, or would remove on a dry run.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CleanupReport {
    pub dry_run: bool,
    pub cutoff: DateTime<Utc>,
    pub submission_ids: Vec<i64>,
}

impl Database {
    pub async fn create_submission(&self, submitter: &str, draft: RestaurantDraft) -> Result<Submission, AppError> {
        draft.validate()?;
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO submissions (restaurant_name, submitted_by, submitted_at, status, data)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                draft.name.trim(),
                submitter,
                Utc::now(),
                ListingStatus::Pending.as_str(),
                to_json(&draft)?,
            ],
        )?;
        let submission = load_submission(&conn, conn.last_insert_rowid())?;
        log!("[DB] New submission {} '{}' by {}", submission.id, submission.restaurant_name, submitter);
        Ok(submission)
    }

    pub async fn get_submission(&self, id: i64) -> Result<Submission, AppError> {
        let conn = self.conn.lock().await;
        load_submission(&conn, id)
    }

    /// Submissions newest first, optionally narrowed to one status.
    pub async fn list_submissions(&self, status: Option<ListingStatus>) -> Result<Vec<Submission>, AppError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions
             WHERE (?1 IS NULL OR status = ?1)
             ORDER BY submitted_at DESC, id DESC"
        ))?;
        let rows = stmt.query_map([status.map(|s| s.as_str())], submission_from_row)?;
        let mut submissions = Vec::new();
        for row in rows {
            submissions.push(row?);
        }
        Ok(submissions)
    }

    pub async fn submissions_by(&self, submitter: &str) -> Result<Vec<Submission>, AppError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions
             WHERE submitted_by = ?1
             ORDER BY submitted_at DESC, id DESC"
        ))?;
        let rows = stmt.query_map([submitter], submission_from_row)?;
        let mut submissions = Vec::new();
        for row in rows {
            submissions.push(row?);
        }
        Ok(submissions)
    }

    /// Applies a reviewer decision; approval creates the restaurant in the
    /// same transaction.
    pub async fn review_submission(
        &self,
        id: i64,
        action: SubmissionAction,
        comment: &str,
        reviewer: &str,
    ) -> Result<Submission, AppError> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        let now = Utc::now();

        let mut submission = load_submission(&tx, id)?;
        submission.review(action, comment, reviewer, now)?;
        if action == SubmissionAction::Approved {
            let restaurant = submission.to_restaurant(0, reviewer, now);
            let restaurant_id = insert_restaurant(&tx, &restaurant)?;
            submission.restaurant_id = Some(restaurant_id);
            log!("[DB] Submission {} approved as restaurant {}", id, restaurant_id);
        }
        save_submission(&tx, &submission)?;
        tx.commit()?;

        log!("[DB] Submission {} is now {} (by {})", id, submission.status, reviewer);
        Ok(submission)
    }

    pub async fn resubmit_submission(
        &self,
        id: i64,
        draft: RestaurantDraft,
        submitter: &str,
    ) -> Result<Submission, AppError> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        let mut submission = load_submission(&tx, id)?;
        submission.resubmit(draft, submitter)?;
        save_submission(&tx, &submission)?;
        tx.commit()?;
        log!("[DB] Submission {} resubmitted by {}", id, submitter);
        Ok(submission)
    }

    pub async fn create_edit_suggestion(
        &self,
        restaurant_id: i64,
        author: &User,
        suggestion: NewEditSuggestion,
    ) -> Result<EditSuggestion, AppError> {
        let reason = validation::bounded_text("reason", &suggestion.reason, 0, 500)?;
        let conn = self.conn.lock().await;
        let restaurant = load_restaurant(&conn, restaurant_id)?
            .ok_or_else(|| AppError::not_found(format!("Restaurant {restaurant_id}")))?;
        validate_changes(&restaurant, &suggestion.changes)?;

        conn.execute(
            "INSERT INTO edit_suggestions (restaurant_id, user_id, changes, reason, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                restaurant_id,
                author.id,
                to_json(&suggestion.changes)?,
                reason,
                Utc::now()
            ],
        )?;
        let created = load_suggestion(&conn, conn.last_insert_rowid(), Some(author.id))?;
        log!("[DB] Edit suggestion {} for restaurant {} by {}", created.id, restaurant_id, author.email);
        Ok(created)
    }

    /// Edit suggestions newest first, optionally for one restaurant and/or status.
    pub async fn list_edit_suggestions(
        &self,
        restaurant_id: Option<i64>,
        status: Option<DecisionStatus>,
        viewer: Option<i64>,
    ) -> Result<Vec<EditSuggestion>, AppError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!(
            "{SUGGESTION_SELECT}
             WHERE (?2 IS NULL OR es.restaurant_id = ?2) AND (?3 IS NULL OR es.status = ?3)
             ORDER BY es.created_at DESC, es.id DESC"
        ))?;
        let rows = stmt.query_map(
            params![viewer, restaurant_id, status.map(|s| s.as_str())],
            suggestion_from_row,
        )?;
        let mut suggestions = Vec::new();
        for row in rows {
            suggestions.push(row?);
        }
        Ok(suggestions)
    }

    pub async fn vote_edit_suggestion(
        &self,
        id: i64,
        user_id: i64,
        direction: VoteDirection,
    ) -> Result<EditSuggestion, AppError> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;

        let current = load_suggestion(&tx, id, Some(user_id))?;
        let mut tally = VoteTally::new(current.upvotes, current.downvotes);
        let outcome = tally.cast(current.current_user_vote, direction);

        tx.execute(
            "UPDATE edit_suggestions SET upvotes = ?1, downvotes = ?2 WHERE id = ?3",
            params![outcome.upvotes, outcome.downvotes, id],
        )?;
        match outcome.user_vote {
            Some(vote) => tx.execute(
                "INSERT INTO suggestion_votes (suggestion_id, user_id, direction) VALUES (?1, ?2, ?3)
                 ON CONFLICT (suggestion_id, user_id) DO UPDATE SET direction = excluded.direction",
                params![id, user_id, vote.as_str()],
            )?,
            None => tx.execute(
                "DELETE FROM suggestion_votes WHERE suggestion_id = ?1 AND user_id = ?2",
                params![id, user_id],
            )?,
        };

        let updated = load_suggestion(&tx, id, Some(user_id))?;
        tx.commit()?;
        Ok(updated)
    }

    /// Approves a suggestion and patches the restaurant with its diff.
    pub async fn approve_edit_suggestion(&self, id: i64, reviewer: &str) -> Result<EditSuggestion, AppError> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        let now = Utc::now();

        let mut suggestion = load_suggestion(&tx, id, None)?;
        suggestion.approve(reviewer, now)?;

        let mut restaurant = load_restaurant(&tx, suggestion.restaurant_id)?
            .ok_or_else(|| AppError::not_found(format!("Restaurant {}", suggestion.restaurant_id)))?;
        let applied = apply_changes(&mut restaurant, &suggestion.changes)?;
        restaurant.last_updated = now;
        update_restaurant(&tx, &restaurant)?;
        save_suggestion_decision(&tx, &suggestion)?;
        tx.commit()?;

        log!(
            "[DB] Edit suggestion {} approved by {}, applied {:?} to restaurant {}",
            id,
            reviewer,
            applied,
            restaurant.id
        );
        Ok(suggestion)
    }

    pub async fn reject_edit_suggestion(
        &self,
        id: i64,
        reason: &str,
        reviewer: &str,
    ) -> Result<EditSuggestion, AppError> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        let mut suggestion = load_suggestion(&tx, id, None)?;
        suggestion.reject(reason, reviewer, Utc::now())?;
        save_suggestion_decision(&tx, &suggestion)?;
        tx.commit()?;
        log!("[DB] Edit suggestion {} rejected by {}", id, reviewer);
        Ok(suggestion)
    }

    pub async fn create_report(&self, reporter: &User, report: NewReport) -> Result<Report, AppError> {
        let reason = report.validated_reason()?;
        let conn = self.conn.lock().await;

        let owner: Option<i64> = conn
            .query_row(
                "SELECT restaurant_id FROM reviews WHERE id = ?1",
                [report.review_id],
                |row| row.get(0),
            )
            .optional()?;
        match owner {
            None => return Err(AppError::not_found(format!("Review {}", report.review_id))),
            Some(restaurant_id) if restaurant_id != report.restaurant_id => {
                return Err(AppError::validation(
                    "review does not belong to this restaurant",
                ))
            }
            Some(_) => {}
        }

        let pending: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM reports
                WHERE review_id = ?1 AND reporter_id = ?2 AND status = 'pending')",
            params![report.review_id, reporter.id],
            |row| row.get(0),
        )?;
        if pending {
            return Err(AppError::Conflict(
                "you already have a pending report for this review".to_string(),
            ));
        }

        conn.execute(
            "INSERT INTO reports (review_id, restaurant_id, reporter_id, reason, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                report.review_id,
                report.restaurant_id,
                reporter.id,
                reason,
                ReportStatus::Pending.as_str(),
                Utc::now()
            ],
        )?;
        let created = load_report(&conn, conn.last_insert_rowid())?;
        log!("[DB] Review {} reported by {}", created.review_id, reporter.email);
        Ok(created)
    }

    pub async fn list_reports(&self, status: Option<ReportStatus>) -> Result<Vec<Report>, AppError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!(
            "{REPORT_SELECT} WHERE (?1 IS NULL OR rp.status = ?1) ORDER BY rp.created_at DESC, rp.id DESC"
        ))?;
        let rows = stmt.query_map([status.map(|s| s.as_str())], report_from_row)?;
        let mut reports = Vec::new();
        for row in rows {
            reports.push(row?);
        }
        Ok(reports)
    }

    /// Resolves a report; `review_hidden` also hides the reported review.
    pub async fn resolve_report(&self, id: i64, action: ReportAction, resolver: &str) -> Result<Report, AppError> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        let mut report = load_report(&tx, id)?;
        report.resolve(action, resolver, Utc::now())?;

        if action == ReportAction::ReviewHidden {
            tx.execute("UPDATE reviews SET is_hidden = 1 WHERE id = ?1", [report.review_id])?;
        }
        tx.execute(
            "UPDATE reports SET status = ?1, action = ?2, resolved_by = ?3, resolved_at = ?4
             WHERE id = ?5",
            params![
                report.status.as_str(),
                action.as_str(),
                report.resolved_by,
                report.resolved_at,
                id
            ],
        )?;
        tx.commit()?;
        log!("[DB] Report {} resolved as {} by {}", id, action.as_str(), resolver);
        Ok(report)
    }

    pub async fn create_application(
        &self,
        applicant: &User,
        application: NewApplication,
    ) -> Result<ReviewerApplication, AppError> {
        if applicant.can_moderate() {
            return Err(AppError::Conflict("you are already a reviewer".to_string()));
        }
        let (motivation, experience) = application.validated()?;

        let conn = self.conn.lock().await;
        let pending: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM reviewer_applications WHERE user_id = ?1 AND status = 'pending')",
            [applicant.id],
            |row| row.get(0),
        )?;
        if pending {
            return Err(AppError::Conflict(
                "you already have a pending application".to_string(),
            ));
        }

        conn.execute(
            "INSERT INTO reviewer_applications (user_id, motivation, experience, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                applicant.id,
                motivation,
                experience,
                DecisionStatus::Pending.as_str(),
                Utc::now()
            ],
        )?;
        let created = load_application(&conn, conn.last_insert_rowid())?;
        log!("[DB] Reviewer application {} from {}", created.id, applicant.email);
        Ok(created)
    }

    pub async fn list_applications(&self, status: Option<DecisionStatus>) -> Result<Vec<ReviewerApplication>, AppError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!(
            "{APPLICATION_SELECT} WHERE (?1 IS NULL OR a.status = ?1) ORDER BY a.created_at DESC, a.id DESC"
        ))?;
        let rows = stmt.query_map([status.map(|s| s.as_str())], application_from_row)?;
        let mut applications = Vec::new();
        for row in rows {
            applications.push(row?);
        }
        Ok(applications)
    }

    pub async fn applications_by(&self, user_id: i64) -> Result<Vec<ReviewerApplication>, AppError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!(
            "{APPLICATION_SELECT} WHERE a.user_id = ?1 ORDER BY a.created_at DESC, a.id DESC"
        ))?;
        let rows = stmt.query_map([user_id], application_from_row)?;
        let mut applications = Vec::new();
        for row in rows {
            applications.push(row?);
        }
        Ok(applications)
    }

    /// Approving an application grants the applicant reviewer rights.
    pub async fn decide_application(
        &self,
        id: i64,
        review: ApplicationReview,
        admin: &str,
    ) -> Result<ReviewerApplication, AppError> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        let mut application = load_application(&tx, id)?;
        application.decide(review.action, review.admin_notes.as_deref(), admin, Utc::now())?;

        tx.execute(
            "UPDATE reviewer_applications SET status = ?1, admin_notes = ?2, reviewed_by = ?3,
                reviewed_at = ?4
             WHERE id = ?5",
            params![
                application.status.as_str(),
                application.admin_notes,
                application.reviewed_by,
                application.reviewed_at,
                id
            ],
        )?;
        if application.status == DecisionStatus::Approved {
            tx.execute(
                "UPDATE users SET is_reviewer = 1
                 WHERE id = (SELECT user_id FROM reviewer_applications WHERE id = ?1)",
                [id],
            )?;
        }
        tx.commit()?;
        log!("[DB] Application {} {} by {}", id, application.status.as_str(), admin);
        Ok(application)
    }

    pub async fn application_stats(&self) -> Result<ApplicationStats, AppError> {
        let conn = self.conn.lock().await;
        let stats = conn.query_row(
            "SELECT COUNT(*),
                COALESCE(SUM(status = 'pending'), 0),
                COALESCE(SUM(status = 'approved'), 0),
                COALESCE(SUM(status = 'rejected'), 0)
             FROM reviewer_applications",
            [],
            |row| {
                Ok(ApplicationStats {
                    total: row.get(0)?,
                    pending: row.get(1)?,
                    approved: row.get(2)?,
                    rejected: row.get(3)?,
                })
            },
        )?;
        Ok(stats)
    }

    /// Purges rejected and needs-changes submissions reviewed more than
    /// `older_than_days` ago.
    pub async fn cleanup_submissions(&self, older_than_days: i64, dry_run: bool) -> Result<CleanupReport, AppError> {
        if older_than_days < 1 {
            return Err(AppError::validation("days must be at least 1"));
        }
        let cutoff = Duration::try_days(older_than_days)
            .and_then(|window| Utc::now().checked_sub_signed(window))
            .ok_or_else(|| AppError::validation(format!("days out of range: {older_than_days}")))?;

        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        let candidates: Vec<(i64, Option<DateTime<Utc>>)> = {
            let mut stmt = tx.prepare(
                "SELECT id, reviewed_at FROM submissions WHERE status IN (?1, ?2) ORDER BY id",
            )?;
            let rows = stmt.query_map(
                params![
                    ListingStatus::Rejected.as_str(),
                    ListingStatus::NeedsChanges.as_str()
                ],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            rows.collect::<Result<_, _>>()?
        };

        let submission_ids: Vec<i64> = candidates
            .into_iter()
            .filter(|(_, reviewed_at)| reviewed_at.is_some_and(|at| at < cutoff))
            .map(|(id, _)| id)
            .collect();

        if !dry_run {
            for id in &submission_ids {
                tx.execute("DELETE FROM submissions WHERE id = ?1", [id])?;
            }
        }
        tx.commit()?;

        log!(
            "[DB] Cleanup {}: {} stale submissions older than {}",
            if dry_run { "(dry run)" } else { "done" },
            submission_ids.len(),
            cutoff
        );
        Ok(CleanupReport {
            dry_run,
            cutoff,
            submission_ids,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::{create_test_db, create_test_user, draft};
    use crate::models::reviewer_application::ApplicationDecision;
    use crate::models::FieldChange;
    use serde_json::json;

    #[tokio::test]
    async fn test_submission_approval_creates_restaurant() {
        let db = create_test_db().await;
        let submission = db
            .create_submission("ana@example.pt", draft("Tasca Nova", 8.5))
            .await
            .unwrap();
        assert_eq!(submission.status, ListingStatus::Pending);

        let reviewed = db
            .review_submission(submission.id, SubmissionAction::Approved, "Looks good", "rev@example.pt")
            .await
            .unwrap();
        assert_eq!(reviewed.status, ListingStatus::Approved);
        assert_eq!(reviewed.reviewer_comments.len(), 1);

        let restaurant = db.get_restaurant(reviewed.restaurant_id.unwrap()).await.unwrap();
        assert_eq!(restaurant.name, "Tasca Nova");
        assert_eq!(restaurant.approved_by.as_deref(), Some("rev@example.pt"));

        let again = db
            .review_submission(submission.id, SubmissionAction::Rejected, "", "rev@example.pt")
            .await;
        assert!(matches!(again, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_needs_changes_resubmission() {
        let db = create_test_db().await;
        let submission = db
            .create_submission("ana@example.pt", draft("Tasca", 8.5))
            .await
            .unwrap();
        db.review_submission(submission.id, SubmissionAction::NeedsChanges, "price?", "rev@example.pt")
            .await
            .unwrap();

        let updated = db
            .resubmit_submission(submission.id, draft("Tasca", 9.0), "ana@example.pt")
            .await
            .unwrap();
        assert_eq!(updated.status, ListingStatus::Pending);
        assert_eq!(updated.data.menu_price, 9.0);

        let mine = db.submissions_by("ana@example.pt").await.unwrap();
        assert_eq!(mine.len(), 1);
        let pending = db.list_submissions(Some(ListingStatus::Pending)).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert!(db.list_submissions(Some(ListingStatus::Approved)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_edit_suggestion_lifecycle() {
        let db = create_test_db().await;
        let ana = create_test_user(&db, "Ana", "ana@example.pt").await;
        let rui = create_test_user(&db, "Rui", "rui@example.pt").await;
        let restaurant_id = db
            .insert_restaurant_from_draft(&draft("Tasca", 9.5), "ana@example.pt")
            .await
            .unwrap();

        let changes = [("menuPrice".to_string(), FieldChange::new(json!(9.5), json!(10.0)))]
            .into_iter()
            .collect();
        let suggestion = db
            .create_edit_suggestion(
                restaurant_id,
                &ana,
                NewEditSuggestion {
                    changes,
                    reason: "New prices".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(suggestion.restaurant_name, "Tasca");

        let voted = db
            .vote_edit_suggestion(suggestion.id, rui.id, VoteDirection::Up)
            .await
            .unwrap();
        assert_eq!(voted.upvotes, 1);
        assert_eq!(voted.current_user_vote, Some(VoteDirection::Up));

        let before = db.get_restaurant(restaurant_id).await.unwrap();
        db.approve_edit_suggestion(suggestion.id, "rev@example.pt").await.unwrap();
        let after = db.get_restaurant(restaurant_id).await.unwrap();
        assert_eq!(after.menu_price, 10.0);
        assert_eq!(after.name, before.name);
        assert_eq!(after.dishes, before.dishes);
        assert_eq!(after.google_rating, before.google_rating);

        let approved = db
            .list_edit_suggestions(Some(restaurant_id), Some(DecisionStatus::Approved), None)
            .await
            .unwrap();
        assert_eq!(approved.len(), 1);
        assert!(db.reject_edit_suggestion(suggestion.id, "late", "rev@example.pt").await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_fields_are_refused_at_submission() {
        let db = create_test_db().await;
        let ana = create_test_user(&db, "Ana", "ana@example.pt").await;
        let restaurant_id = db
            .insert_restaurant_from_draft(&draft("Tasca", 9.5), "ana@example.pt")
            .await
            .unwrap();
        let changes = serde_json::from_value(json!({"owner": {"from": null, "to": "me"}})).unwrap();
        let result = db
            .create_edit_suggestion(
                restaurant_id,
                &ana,
                NewEditSuggestion {
                    changes,
                    reason: String::new(),
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_report_hides_review() {
        let db = create_test_db().await;
        let ana = create_test_user(&db, "Ana", "ana@example.pt").await;
        let rui = create_test_user(&db, "Rui", "rui@example.pt").await;
        let restaurant_id = db
            .insert_restaurant_from_draft(&draft("Tasca", 9.5), "ana@example.pt")
            .await
            .unwrap();
        let review = db.create_review(restaurant_id, &ana, 1.0, "spam spam").await.unwrap();

        let new_report = || NewReport {
            review_id: review.id,
            restaurant_id,
            reason: "This is spam".into(),
        };
        let report = db.create_report(&rui, new_report()).await.unwrap();
        assert!(matches!(
            db.create_report(&rui, new_report()).await,
            Err(AppError::Conflict(_))
        ));
        let wrong_restaurant = NewReport {
            restaurant_id: restaurant_id + 1,
            ..new_report()
        };
        assert!(db.create_report(&ana, wrong_restaurant).await.is_err());

        db.resolve_report(report.id, ReportAction::ReviewHidden, "rev@example.pt")
            .await
            .unwrap();
        assert!(db.list_reviews(restaurant_id, None).await.unwrap().is_empty());
        assert_eq!(db.get_restaurant(restaurant_id).await.unwrap().menu_reviews, 0);
        assert_eq!(db.list_reports(Some(ReportStatus::Pending)).await.unwrap().len(), 0);

        // A resolved report no longer blocks a new one.
        db.create_report(&rui, new_report()).await.unwrap();
    }

    #[tokio::test]
    async fn test_reviewer_application_flow() {
        let db = create_test_db().await;
        let ana = create_test_user(&db, "Ana", "ana@example.pt").await;
        let application = NewApplication {
            motivation: "I eat a lunch menu in Porto every single weekday and love writing.".into(),
            experience: Some("Food blog since 2019".into()),
        };

        let created = db.create_application(&ana, application.clone()).await.unwrap();
        assert!(matches!(
            db.create_application(&ana, application.clone()).await,
            Err(AppError::Conflict(_))
        ));

        let stats = db.application_stats().await.unwrap();
        assert_eq!((stats.total, stats.pending), (1, 1));

        db.decide_application(
            created.id,
            ApplicationReview {
                action: ApplicationDecision::Approve,
                admin_notes: Some("Welcome".into()),
            },
            "boss@example.pt",
        )
        .await
        .unwrap();

        let ana = db.find_user_by_id(ana.id).await.unwrap().unwrap();
        assert!(ana.is_reviewer);
        assert!(db.create_application(&ana, application).await.is_err());

        let stats = db.application_stats().await.unwrap();
        assert_eq!((stats.approved, stats.pending), (1, 0));
        assert_eq!(db.applications_by(ana.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cleanup_dry_run_and_purge() {
        let db = create_test_db().await;
        let old = db.create_submission("ana@example.pt", draft("Old", 9.0)).await.unwrap();
        let fresh = db.create_submission("ana@example.pt", draft("Fresh", 9.0)).await.unwrap();
        db.review_submission(old.id, SubmissionAction::Rejected, "", "rev@example.pt")
            .await
            .unwrap();
        db.review_submission(fresh.id, SubmissionAction::Rejected, "", "rev@example.pt")
            .await
            .unwrap();
        {
            let conn = db.conn.lock().await;
            conn.execute(
                "UPDATE submissions SET reviewed_at = ?1 WHERE id = ?2",
                params![Utc::now() - Duration::days(45), old.id],
            )
            .unwrap();
        }

        let dry = db.cleanup_submissions(30, true).await.unwrap();
        assert_eq!(dry.submission_ids, vec![old.id]);
        assert_eq!(db.list_submissions(None).await.unwrap().len(), 2);

        let done = db.cleanup_submissions(30, false).await.unwrap();
        assert_eq!(done.submission_ids, vec![old.id]);
        assert_eq!(db.list_submissions(None).await.unwrap().len(), 1);
        assert!(db.cleanup_submissions(0, true).await.is_err());
        assert!(matches!(
            db.cleanup_submissions(9_000_000_000_000, true).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            db.cleanup_submissions(i64::MAX / 86_400_000, true).await,
            Err(AppError::Validation(_))
        ));
    }
}
