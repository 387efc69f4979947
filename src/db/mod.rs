pub mod models;

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use models::{Conversation, Message as StoredMessage};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::agents::{builtin_agents, Agent, AgentCatalog, CatalogError, ModelProvider};
use crate::chat::message::{Message, Role};
use crate::chat::store::ConversationStore;

pub const DATABASE_FILE: &str = "agent-chat.db";

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("database lock poisoned")]
    LockPoisoned,
    #[error("invalid stored value: {0}")]
    Invalid(String),
}

impl serde::Serialize for DbError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl From<DbError> for CatalogError {
    fn from(err: DbError) -> Self {
        CatalogError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DbError>;

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the database file inside `app_dir`.
    pub fn new(app_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(app_dir)?;
        Self::open(&app_dir.join(DATABASE_FILE))
    }

    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        Self::from_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        db.seed_agents()?;
        Ok(db)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::LockPoisoned)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA foreign_keys=ON;

            CREATE TABLE IF NOT EXISTS agents (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                title TEXT,
                emoji TEXT,
                description TEXT NOT NULL,
                category TEXT NOT NULL,
                system_prompt TEXT NOT NULL,
                welcome_message TEXT,
                model_provider TEXT NOT NULL DEFAULT 'claude',
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS conversations (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                agent_id TEXT NOT NULL,
                title TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now')),
                FOREIGN KEY (agent_id) REFERENCES agents(id)
            );

            CREATE INDEX IF NOT EXISTS idx_conversations_user
                ON conversations(user_id, updated_at);

            CREATE TABLE IF NOT EXISTS messages (
                id TEXT PRIMARY KEY,
                conversation_id TEXT NOT NULL,
                role TEXT NOT NULL CHECK (role IN ('user', 'assistant')),
                content TEXT NOT NULL,
                mock INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                FOREIGN KEY (conversation_id) REFERENCES conversations(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    fn seed_agents(&self) -> Result<()> {
        let count: i64 = {
            let conn = self.conn()?;
            conn.query_row("SELECT COUNT(*) FROM agents", [], |row| row.get(0))?
        };
        if count == 0 {
            for agent in builtin_agents() {
                self.upsert_agent(&agent)?;
            }
            tracing::debug!("seeded built-in agent catalog");
        }
        Ok(())
    }

    // ── Agents ──

    pub fn upsert_agent(&self, agent: &Agent) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO agents (id, name, title, emoji, description, category, system_prompt, welcome_message, model_provider, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                title = excluded.title,
                emoji = excluded.emoji,
                description = excluded.description,
                category = excluded.category,
                system_prompt = excluded.system_prompt,
                welcome_message = excluded.welcome_message,
                model_provider = excluded.model_provider,
                is_active = excluded.is_active,
                updated_at = datetime('now')",
            params![
                agent.id,
                agent.name,
                agent.title,
                agent.emoji,
                agent.description,
                agent.category,
                agent.system_prompt,
                agent.welcome_message,
                agent.model_provider.as_str(),
                agent.is_active,
            ],
        )?;
        Ok(())
    }

    fn query_agents(&self, active_only: bool) -> Result<Vec<Agent>> {
        let conn = self.conn()?;
        let sql = if active_only {
            "SELECT id, name, title, emoji, description, category, system_prompt, welcome_message, model_provider, is_active
             FROM agents WHERE is_active = 1 ORDER BY rowid ASC"
        } else {
            "SELECT id, name, title, emoji, description, category, system_prompt, welcome_message, model_provider, is_active
             FROM agents ORDER BY rowid ASC"
        };
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([], agent_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn find_agent(&self, id: &str) -> Result<Option<Agent>> {
        let conn = self.conn()?;
        let agent = conn
            .query_row(
                "SELECT id, name, title, emoji, description, category, system_prompt, welcome_message, model_provider, is_active
                 FROM agents WHERE id = ?1",
                params![id],
                agent_from_row,
            )
            .optional()?;
        Ok(agent)
    }

    // ── Conversations ──

    pub fn create_conversation(
        &self,
        user_id: &str,
        agent_id: &str,
        title: Option<&str>,
    ) -> Result<Conversation> {
        let conn = self.conn()?;
        let id = uuid::Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO conversations (id, user_id, agent_id, title) VALUES (?1, ?2, ?3, ?4)",
            params![id, user_id, agent_id, title],
        )?;
        let conv = conn.query_row(
            "SELECT id, user_id, agent_id, title, created_at, updated_at FROM conversations WHERE id = ?1",
            params![id],
            conversation_from_row,
        )?;
        Ok(conv)
    }

    /// Latest conversation between `user_id` and `agent_id`, created if missing.
    pub fn get_or_create_conversation(&self, user_id: &str, agent_id: &str) -> Result<Conversation> {
        let existing = {
            let conn = self.conn()?;
            conn.query_row(
                "SELECT id, user_id, agent_id, title, created_at, updated_at FROM conversations
                 WHERE user_id = ?1 AND agent_id = ?2
                 ORDER BY updated_at DESC, rowid DESC LIMIT 1",
                params![user_id, agent_id],
                conversation_from_row,
            )
            .optional()?
        };
        if let Some(conv) = existing {
            tracing::debug!(conversation_id = %conv.id, "found existing conversation");
            return Ok(conv);
        }
        let title = format!("Chat con {}", agent_id);
        let conv = self.create_conversation(user_id, agent_id, Some(&title))?;
        tracing::info!(conversation_id = %conv.id, user_id, agent_id, "created conversation");
        Ok(conv)
    }

    pub fn list_conversations(&self, user_id: &str) -> Result<Vec<Conversation>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, agent_id, title, created_at, updated_at FROM conversations
             WHERE user_id = ?1 ORDER BY updated_at DESC, rowid DESC",
        )?;
        let rows = stmt.query_map(params![user_id], conversation_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn delete_conversation(&self, id: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM conversations WHERE id = ?1", params![id])?;
        Ok(())
    }

    pub fn update_conversation_title(&self, id: &str, title: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE conversations SET title = ?1, updated_at = datetime('now') WHERE id = ?2",
            params![title, id],
        )?;
        Ok(())
    }

    // ── Messages ──

    pub fn add_message(&self, conversation_id: &str, message: &Message) -> Result<StoredMessage> {
        let conn = self.conn()?;
        insert_message(&conn, conversation_id, message)?;
        touch_conversation(&conn, conversation_id)?;
        let msg = conn.query_row(
            "SELECT id, conversation_id, role, content, mock, created_at FROM messages WHERE id = ?1",
            params![message.id],
            message_from_row,
        )?;
        Ok(msg)
    }

    /// Store a question and its answer atomically: either both rows land or
    /// neither does.
    pub fn add_exchange(&self, conversation_id: &str, question: &Message, reply: &Message) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        insert_message(&tx, conversation_id, question)?;
        insert_message(&tx, conversation_id, reply)?;
        touch_conversation(&tx, conversation_id)?;
        tx.commit()?;
        Ok(())
    }

    pub fn get_messages(&self, conversation_id: &str) -> Result<Vec<StoredMessage>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, conversation_id, role, content, mock, created_at FROM messages
             WHERE conversation_id = ?1 ORDER BY created_at ASC, rowid ASC",
        )?;
        let rows = stmt.query_map(params![conversation_id], message_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    // ── Settings ──

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn delete_setting(&self, key: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM settings WHERE key = ?1", params![key])?;
        Ok(())
    }
}

fn insert_message(conn: &Connection, conversation_id: &str, message: &Message) -> Result<()> {
    let created_at = message
        .timestamp
        .to_rfc3339_opts(SecondsFormat::Millis, true);
    conn.execute(
        "INSERT INTO messages (id, conversation_id, role, content, mock, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            message.id,
            conversation_id,
            message.role.as_str(),
            message.content,
            message.mock,
            created_at
        ],
    )?;
    Ok(())
}

fn touch_conversation(conn: &Connection, conversation_id: &str) -> Result<()> {
    conn.execute(
        "UPDATE conversations SET updated_at = datetime('now') WHERE id = ?1",
        params![conversation_id],
    )?;
    Ok(())
}

fn agent_from_row(row: &Row<'_>) -> rusqlite::Result<Agent> {
    let provider: String = row.get(8)?;
    Ok(Agent {
        id: row.get(0)?,
        name: row.get(1)?,
        title: row.get(2)?,
        emoji: row.get(3)?,
        description: row.get(4)?,
        category: row.get(5)?,
        system_prompt: row.get(6)?,
        welcome_message: row.get(7)?,
        model_provider: ModelProvider::parse(&provider).unwrap_or_default(),
        is_active: row.get(9)?,
    })
}

fn conversation_from_row(row: &Row<'_>) -> rusqlite::Result<Conversation> {
    Ok(Conversation {
        id: row.get(0)?,
        user_id: row.get(1)?,
        agent_id: row.get(2)?,
        title: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<StoredMessage> {
    Ok(StoredMessage {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        role: row.get(2)?,
        content: row.get(3)?,
        mock: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    // SQLite's datetime('now') format.
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .map(|ts| ts.and_utc())
        .map_err(|e| DbError::Invalid(format!("timestamp '{}': {}", raw, e)))
}

impl TryFrom<StoredMessage> for Message {
    type Error = DbError;

    fn try_from(stored: StoredMessage) -> Result<Self> {
        let role: Role = stored
            .role
            .parse()
            .map_err(|e: crate::chat::message::UnknownRole| DbError::Invalid(e.to_string()))?;
        Ok(Message {
            id: stored.id,
            role,
            content: stored.content,
            timestamp: parse_timestamp(&stored.created_at)?,
            is_error: false,
            mock: stored.mock,
            usage: None,
        })
    }
}

impl ConversationStore for Database {
    fn list_conversations(&self, user_id: &str) -> Result<Vec<Conversation>> {
        Database::list_conversations(self, user_id)
    }

    fn load_messages(&self, conversation_id: &str) -> Result<Vec<Message>> {
        self.get_messages(conversation_id)?
            .into_iter()
            .map(Message::try_from)
            .collect()
    }

    fn append_message(&self, conversation_id: &str, message: &Message) -> Result<()> {
        self.add_message(conversation_id, message).map(|_| ())
    }

    fn append_exchange(&self, conversation_id: &str, question: &Message, reply: &Message) -> Result<()> {
        self.add_exchange(conversation_id, question, reply)
    }
}

impl AgentCatalog for Database {
    fn list_agents(&self) -> std::result::Result<Vec<Agent>, CatalogError> {
        Ok(self.query_agents(true)?)
    }

    fn get_agent(&self, id: &str) -> std::result::Result<Option<Agent>, CatalogError> {
        Ok(self.find_agent(id)?)
    }
}
