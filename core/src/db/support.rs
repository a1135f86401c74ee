use anyhow::{Context, Result};
use chrono::Local;
use rusqlite::params;
use uuid::Uuid;

use super::{Database, parse_column};
use crate::models::{
    NewSupportTicket, SupportTicket, TicketResponse, TicketStatus, validate_email,
    validate_ticket_message, validate_ticket_text,
};

impl Database {
    fn ticket_responses(&self, ticket_id: i64) -> Result<Vec<TicketResponse>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, message, is_admin, created_at FROM ticket_responses
             WHERE ticket_id = ?1 ORDER BY id",
        )?;
        let responses = stmt
            .query_map(params![ticket_id], |row| {
                Ok(TicketResponse {
                    id: row.get(0)?,
                    message: row.get(1)?,
                    is_admin: row.get(2)?,
                    created_at: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(responses)
    }

    fn ticket_from_row(row: &rusqlite::Row) -> rusqlite::Result<SupportTicket> {
        Ok(SupportTicket {
            id: row.get(0)?,
            uuid: row.get(1)?,
            subject: row.get(2)?,
            message: row.get(3)?,
            priority: parse_column(row, 4)?,
            category: parse_column(row, 5)?,
            status: parse_column(row, 6)?,
            user_email: row.get(7)?,
            contact_number: row.get(8)?,
            responses: Vec::new(),
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }

    pub fn get_ticket(&self, user_id: i64, id: i64) -> Result<Option<SupportTicket>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, uuid, subject, message, priority, category, status, user_email,
                    contact_number, created_at, updated_at
             FROM support_tickets WHERE id = ?1 AND user_id = ?2",
        )?;
        let mut rows = stmt.query(params![id, user_id])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        let mut ticket = Self::ticket_from_row(row)?;
        ticket.responses = self.ticket_responses(ticket.id)?;
        Ok(Some(ticket))
    }

    pub fn create_ticket(&self, user_id: i64, ticket: &NewSupportTicket) -> Result<SupportTicket> {
        validate_ticket_text(&ticket.subject, &ticket.message)?;
        let email = validate_email(&ticket.user_email)?;
        let now = Local::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO support_tickets (uuid, user_id, subject, message, priority, category, status,
                                          user_email, contact_number, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                Uuid::new_v4().to_string(),
                user_id,
                ticket.subject.trim(),
                ticket.message.trim(),
                ticket.priority.as_str(),
                ticket.category.as_str(),
                TicketStatus::Open.as_str(),
                email,
                ticket.contact_number,
                now,
                now
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::info!(user_id, ticket_id = id, priority = %ticket.priority, "support ticket opened");
        self.get_ticket(user_id, id)?
            .context("Ticket not found after insert")
    }

    /// Tickets newest first, each with its responses.
    pub fn list_tickets(&self, user_id: i64) -> Result<Vec<SupportTicket>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, uuid, subject, message, priority, category, status, user_email,
                    contact_number, created_at, updated_at
             FROM support_tickets WHERE user_id = ?1 ORDER BY created_at DESC, id DESC",
        )?;
        let mut tickets = stmt
            .query_map(params![user_id], Self::ticket_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        for ticket in &mut tickets {
            ticket.responses = self.ticket_responses(ticket.id)?;
        }
        Ok(tickets)
    }

    pub fn add_ticket_response(
        &self,
        user_id: i64,
        id: i64,
        message: &str,
        is_admin: bool,
    ) -> Result<Option<SupportTicket>> {
        validate_ticket_message(message)?;
        if self.get_ticket(user_id, id)?.is_none() {
            return Ok(None);
        }
        let now = Local::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO ticket_responses (ticket_id, message, is_admin, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![id, message.trim(), is_admin, now],
        )?;
        self.conn.execute(
            "UPDATE support_tickets SET updated_at = ?1 WHERE id = ?2",
            params![now, id],
        )?;
        self.get_ticket(user_id, id)
    }

    pub fn set_ticket_status(
        &self,
        user_id: i64,
        id: i64,
        status: TicketStatus,
    ) -> Result<Option<SupportTicket>> {
        let rows = self.conn.execute(
            "UPDATE support_tickets SET status = ?1, updated_at = ?2 WHERE id = ?3 AND user_id = ?4",
            params![status.as_str(), Local::now().to_rfc3339(), id, user_id],
        )?;
        if rows == 0 {
            return Ok(None);
        }
        self.get_ticket(user_id, id)
    }
}
