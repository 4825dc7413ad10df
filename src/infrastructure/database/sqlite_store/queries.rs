pub(super) const INSERT_RECORD: &str = r#"
    INSERT INTO records (
        entity_id, entity_kind, container_id, fields,
        deleted, created_at, updated_at, updated_by
    ) VALUES (?1, ?2, ?3, ?4, 0, ?5, ?5, ?6)
"#;

pub(super) const SELECT_RECORD_BY_ID: &str = r#"
    SELECT entity_id, entity_kind, container_id, fields,
           deleted, created_at, updated_at, updated_by
    FROM records
    WHERE entity_id = ?1
"#;

pub(super) const SELECT_RECORD_FIELDS: &str = r#"
    SELECT fields
    FROM records
    WHERE entity_id = ?1
"#;

pub(super) const UPDATE_RECORD_STATE: &str = r#"
    UPDATE records
    SET fields = ?1,
        container_id = COALESCE(?2, container_id),
        deleted = COALESCE(?3, deleted),
        updated_at = ?4,
        updated_by = ?5
    WHERE entity_id = ?6
"#;

pub(super) const INSERT_SNAPSHOT: &str = r#"
    INSERT INTO record_versions (
        entity_id, sequence_no, captured_fields, change_type,
        actor_id, actor_name, actor_avatar, captured_at, source
    )
    SELECT ?1, COALESCE(MAX(sequence_no), 0) + 1, ?2, ?3, ?4, ?5, ?6, ?7, ?8
    FROM record_versions
    WHERE entity_id = ?1
    RETURNING sequence_no
"#;

pub(super) const SELECT_SNAPSHOTS_BY_ENTITY: &str = r#"
    SELECT entity_id, sequence_no, captured_fields, change_type,
           actor_id, actor_name, actor_avatar, captured_at, source
    FROM record_versions
    WHERE entity_id = ?1
      AND (?2 IS NULL OR sequence_no < ?2)
    ORDER BY sequence_no DESC
    LIMIT ?3
"#;

pub(super) const SELECT_LATEST_SNAPSHOT: &str = r#"
    SELECT entity_id, sequence_no, captured_fields, change_type,
           actor_id, actor_name, actor_avatar, captured_at, source
    FROM record_versions
    WHERE entity_id = ?1
    ORDER BY sequence_no DESC
    LIMIT 1
"#;

pub(super) const UPSERT_PRESENCE: &str = r#"
    INSERT INTO presence_entries (
        entity_kind, entity_id, user_id, session_id,
        user_name, user_avatar, fields, started_at, last_heartbeat_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
    ON CONFLICT(entity_kind, entity_id, user_id) DO UPDATE SET
        session_id = excluded.session_id,
        user_name = excluded.user_name,
        user_avatar = excluded.user_avatar,
        fields = excluded.fields,
        started_at = excluded.started_at,
        last_heartbeat_at = excluded.last_heartbeat_at
"#;

pub(super) const REFRESH_PRESENCE: &str = r#"
    UPDATE presence_entries
    SET last_heartbeat_at = ?1
    WHERE session_id = ?2
      AND last_heartbeat_at > ?3
"#;

pub(super) const REPLACE_PRESENCE_FIELDS: &str = r#"
    UPDATE presence_entries
    SET fields = ?1,
        last_heartbeat_at = ?2
    WHERE session_id = ?3
      AND last_heartbeat_at > ?4
"#;

pub(super) const DELETE_PRESENCE_BY_SESSION: &str = r#"
    DELETE FROM presence_entries
    WHERE session_id = ?1
"#;

pub(super) const SELECT_ACTIVE_PRESENCE: &str = r#"
    SELECT entity_kind, entity_id, user_id, session_id,
           user_name, user_avatar, fields, started_at, last_heartbeat_at
    FROM presence_entries
    WHERE entity_kind = ?1
      AND entity_id = ?2
      AND last_heartbeat_at > ?3
      AND (?4 IS NULL OR user_id <> ?4)
    ORDER BY started_at ASC, user_id ASC
"#;

pub(super) const SELECT_STALE_PRESENCE_KEYS: &str = r#"
    SELECT DISTINCT entity_kind, entity_id
    FROM presence_entries
    WHERE last_heartbeat_at <= ?1
"#;

pub(super) const DELETE_STALE_PRESENCE: &str = r#"
    DELETE FROM presence_entries
    WHERE last_heartbeat_at <= ?1
"#;
