//! [`SqliteStore`], the SQLite implementation of [`DashboardStore`].

use std::{path::Path, sync::Arc};

use chrono::{DateTime, SubsecRound as _, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use vantage_core::{
  clock::{Clock, SystemClock},
  event::{Dimension, Event, EventType, LabelCount, MonthCount, NewEvent},
  store::{Conflict, DashboardStore},
  summary::SummarySnapshot,
  user::{NewUser, User},
};

use crate::{
  encode::{
    dimension_column, encode_dt, encode_uuid, encode_year_start, RawEvent, RawSummary,
    RawUser, SUMMARY_COLUMNS, USER_COLUMNS,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Vantage store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn:  tokio_rusqlite::Connection,
  /// Stamps `created_at` on new users.
  clock: Arc<dyn Clock>,
}

/// Map a UNIQUE constraint failure on `users` to the column it guards.
fn unique_violation(err: &rusqlite::Error) -> Option<Conflict> {
  match err {
    rusqlite::Error::SqliteFailure(e, Some(msg))
      if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
    {
      if msg.contains("users.email") {
        Some(Conflict::Email)
      } else if msg.contains("users.federated_id") {
        Some(Conflict::FederatedId)
      } else {
        None
      }
    }
    _ => None,
  }
}

/// Split a statement result into "conflict" (rolled back, reported to the
/// caller) and every other database error.
fn classify<T>(res: rusqlite::Result<T>) -> tokio_rusqlite::Result<Result<T, Conflict>> {
  match res {
    Ok(v) => Ok(Ok(v)),
    Err(e) => match unique_violation(&e) {
      Some(conflict) => Ok(Err(conflict)),
      None => Err(e.into()),
    },
  }
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, clock: Arc::new(SystemClock) };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, clock: Arc::new(SystemClock) };
    store.init_schema().await?;
    Ok(store)
  }

  /// Use `clock` instead of the system time for record timestamps.
  pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Fetch at most one user where `column = value`.
  ///
  /// `column` is always one of the crate's own literals, never user input.
  async fn find_user_where(&self, column: &'static str, value: String) -> Result<Option<User>> {
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1"),
            rusqlite::params![value],
            RawUser::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }
}

// ─── DashboardStore impl ─────────────────────────────────────────────────────

impl DashboardStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser) -> Result<User> {
    let user = User {
      user_id:       Uuid::new_v4(),
      password_hash: input.password_hash().map(str::to_owned),
      federated_id:  input.federated_id().map(str::to_owned),
      name:          input.name,
      email:         input.email,
      // Stored with microsecond precision; keep the returned value identical.
      created_at:    self.clock.now().trunc_subsecs(6),
    };

    let id_str        = encode_uuid(user.user_id);
    let name          = user.name.clone();
    let email         = user.email.clone();
    let password_hash = user.password_hash.clone();
    let federated_id  = user.federated_id.clone();
    let at_str        = encode_dt(user.created_at);

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let inserted = classify(tx.execute(
          "INSERT INTO users (user_id, name, email, password_hash, federated_id, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, name, email, password_hash, federated_id, at_str],
        ))?;
        if inserted.is_ok() {
          tx.commit()?;
        }
        Ok(inserted.map(|_| ()))
      })
      .await?;

    if let Err(conflict) = outcome {
      tracing::debug!(?conflict, email = %user.email, "user insert rejected");
      return Err(Error::Conflict(conflict));
    }
    Ok(user)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    self.find_user_where("user_id", encode_uuid(id)).await
  }

  async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
    self.find_user_where("email", email.to_owned()).await
  }

  async fn find_user_by_federated_id(&self, federated_id: &str) -> Result<Option<User>> {
    self.find_user_where("federated_id", federated_id.to_owned()).await
  }

  async fn link_federated_id(&self, user_id: Uuid, federated_id: &str) -> Result<User> {
    let id_str       = encode_uuid(user_id);
    let federated_id = federated_id.to_owned();

    let outcome: Result<Option<RawUser>, Conflict> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let updated = match classify(tx.execute(
          "UPDATE users SET federated_id = ?2 WHERE user_id = ?1",
          rusqlite::params![id_str, federated_id],
        ))? {
          Ok(n) => n,
          Err(conflict) => return Ok(Err(conflict)),
        };
        if updated == 0 {
          return Ok(Ok(None));
        }
        let raw = tx.query_row(
          &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
          rusqlite::params![id_str],
          RawUser::from_row,
        )?;
        tx.commit()?;
        Ok(Ok(Some(raw)))
      })
      .await?;

    match outcome {
      Ok(Some(raw)) => raw.into_user(),
      Ok(None) => Err(Error::UserNotFound(user_id)),
      Err(conflict) => Err(Error::Conflict(conflict)),
    }
  }

  // ── Events ────────────────────────────────────────────────────────────────

  async fn record_event(&self, input: NewEvent) -> Result<Event> {
    let event = Event {
      event_id:    Uuid::new_v4(),
      occurred_at: input.occurred_at,
      event_type:  input.event_type,
      user_id:     input.user_id,
      device:      input.device,
      location:    input.location,
      value:       input.value,
    };

    let raw = RawEvent {
      event_id:    encode_uuid(event.event_id),
      occurred_at: encode_dt(event.occurred_at),
      event_type:  event.event_type.as_str().to_owned(),
      user_id:     event.user_id.map(encode_uuid),
      device:      event.device.clone(),
      location:    event.location.clone(),
      value:       event.value,
    };

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO events (event_id, occurred_at, event_type, user_id, device, location, value)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            raw.event_id,
            raw.occurred_at,
            raw.event_type,
            raw.user_id,
            raw.device,
            raw.location,
            raw.value,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(event)
  }

  async fn count_by_month(&self, event_type: &EventType, year: i32) -> Result<Vec<MonthCount>> {
    let type_str = event_type.as_str().to_owned();
    let start    = encode_year_start(year)?;
    let end      = encode_year_start(year + 1)?;

    let rows: Vec<(i64, i64)> = self
      .conn
      .call(move |conn| {
        // Characters 6-7 of the fixed-width timestamp are the month.
        let mut stmt = conn.prepare(
          "SELECT CAST(substr(occurred_at, 6, 2) AS INTEGER) AS month, COUNT(*)
           FROM events
           WHERE event_type = ?1
             AND occurred_at >= ?2
             AND occurred_at <  ?3
           GROUP BY month
           ORDER BY month",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![type_str, start, end], |row| {
            Ok((row.get(0)?, row.get(1)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(
      rows
        .into_iter()
        .map(|(month, count)| MonthCount { month: month as u32, count: count as u64 })
        .collect(),
    )
  }

  async fn count_by_dimension(
    &self,
    event_type: &EventType,
    dimension:  Dimension,
    since:      DateTime<Utc>,
  ) -> Result<Vec<LabelCount>> {
    let type_str  = event_type.as_str().to_owned();
    let since_str = encode_dt(since);
    let column    = dimension_column(dimension);

    let rows: Vec<(String, i64)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {column}, COUNT(*)
           FROM events
           WHERE event_type = ?1
             AND occurred_at >= ?2
             AND {column} IS NOT NULL
           GROUP BY {column}"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![type_str, since_str], |row| {
            Ok((row.get(0)?, row.get(1)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(
      rows
        .into_iter()
        .map(|(label, count)| LabelCount { label, count: count as u64 })
        .collect(),
    )
  }

  // ── Summary snapshot ──────────────────────────────────────────────────────

  async fn summary(&self) -> Result<Option<SummarySnapshot>> {
    let raw: Option<RawSummary> = self
      .conn
      .call(|conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {SUMMARY_COLUMNS} FROM summary_snapshot WHERE id = 1"),
            [],
            RawSummary::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSummary::into_snapshot).transpose()
  }

  async fn replace_summary(&self, snapshot: SummarySnapshot) -> Result<()> {
    let RawSummary(cols) = RawSummary::from_snapshot(&snapshot);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM summary_snapshot", [])?;
        tx.execute(
          &format!(
            "INSERT INTO summary_snapshot (id, {SUMMARY_COLUMNS})
             VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
          ),
          rusqlite::params_from_iter(cols.iter()),
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(())
  }
}
