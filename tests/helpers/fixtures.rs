//! Object builders shared by the integration tests.
//!
//! Everything lives in the `app` database so both sides of a comparison
//! line up without rebasing.

use pgshift::catalog::extension::Extension;
use pgshift::catalog::function::{Function, Volatility};
use pgshift::catalog::index::Index;
use pgshift::catalog::role::Role;
use pgshift::catalog::sequence::{Sequence, SequenceOptions};
use pgshift::catalog::table::{Column, Table, TableColumn};
use pgshift::catalog::tablespace::Tablespace;
use pgshift::catalog::triggers::{Trigger, TriggerEvent, TriggerTiming};
use pgshift::catalog::view::{MaterializedView, View};
use pgshift::catalog::{DatabaseObject, ObjectIdentity};
use pgshift::snapshot::Snapshot;

pub const DATABASE: &str = "app";

fn identity(schema: &str, name: &str) -> ObjectIdentity {
    ObjectIdentity::new(DATABASE, schema, name)
}

pub fn column(name: &str, data_type: &str, nullable: bool) -> Column {
    Column::new(name, data_type, nullable)
}

pub fn column_with_default(name: &str, data_type: &str, nullable: bool, default: &str) -> Column {
    Column {
        default: Some(default.to_string()),
        ..Column::new(name, data_type, nullable)
    }
}

pub fn table(schema: &str, name: &str, columns: Vec<Column>) -> DatabaseObject {
    DatabaseObject::Table(Table::new(identity(schema, name), columns))
}

pub fn table_column(schema: &str, table: &str, name: &str, data_type: &str, nullable: bool) -> DatabaseObject {
    DatabaseObject::Column(TableColumn {
        identity: identity(schema, name),
        table_name: table.to_string(),
        data_type: data_type.to_string(),
        is_nullable: nullable,
        default: None,
    })
}

pub fn view(schema: &str, name: &str, query: &str, depends_on: &[&str]) -> DatabaseObject {
    DatabaseObject::View(View {
        identity: identity(schema, name),
        query: query.to_string(),
        depends_on: depends_on.iter().map(|d| d.to_string()).collect(),
    })
}

pub fn materialized_view(schema: &str, name: &str, query: &str, depends_on: &[&str]) -> DatabaseObject {
    DatabaseObject::MaterializedView(MaterializedView {
        identity: identity(schema, name),
        query: query.to_string(),
        with_data: true,
        depends_on: depends_on.iter().map(|d| d.to_string()).collect(),
    })
}

pub fn trigger_function(schema: &str, name: &str) -> DatabaseObject {
    DatabaseObject::Function(Function {
        identity: identity(schema, name),
        arguments: String::new(),
        parameters: None,
        return_type: "trigger".to_string(),
        language: "plpgsql".to_string(),
        body: "BEGIN\n  NEW.updated_at := now();\n  RETURN NEW;\nEND;".to_string(),
        volatility: Some(Volatility::Volatile),
    })
}

pub fn add_function(schema: &str) -> DatabaseObject {
    DatabaseObject::Function(Function {
        identity: identity(schema, "add"),
        arguments: "integer, integer".to_string(),
        parameters: Some("a integer, b integer".to_string()),
        return_type: "integer".to_string(),
        language: "sql".to_string(),
        body: "SELECT a + b".to_string(),
        volatility: Some(Volatility::Immutable),
    })
}

pub fn trigger(schema: &str, name: &str, table: &str, function: &str) -> DatabaseObject {
    DatabaseObject::Trigger(Trigger {
        identity: identity(schema, name),
        table_name: table.to_string(),
        timing: TriggerTiming::Before,
        events: vec![TriggerEvent::Update],
        for_each_row: true,
        function_name: function.to_string(),
        when: None,
    })
}

pub fn index(schema: &str, name: &str, table: &str, columns: &[&str]) -> DatabaseObject {
    DatabaseObject::Index(Index {
        identity: identity(schema, name),
        table_name: table.to_string(),
        columns: columns.iter().map(|c| c.to_string()).collect(),
        method: "btree".to_string(),
        is_unique: false,
        predicate: None,
    })
}

pub fn sequence(schema: &str, name: &str) -> DatabaseObject {
    DatabaseObject::Sequence(Sequence {
        identity: identity(schema, name),
        options: SequenceOptions::default(),
    })
}

pub fn role(name: &str, can_login: bool) -> DatabaseObject {
    DatabaseObject::Role(Role {
        identity: identity("", name),
        is_superuser: false,
        can_create_databases: false,
        can_create_roles: false,
        can_login,
    })
}

pub fn extension(name: &str, version: Option<&str>) -> DatabaseObject {
    DatabaseObject::Extension(Extension {
        identity: identity("public", name),
        ext_version: version.map(str::to_string),
    })
}

pub fn tablespace(name: &str, owner: &str) -> DatabaseObject {
    DatabaseObject::Tablespace(Tablespace {
        identity: identity("", name),
        owner: owner.to_string(),
        location: "/mnt/fast".to_string(),
    })
}

/// The schema currently deployed
pub fn current_schema() -> Vec<DatabaseObject> {
    vec![
        extension("pgcrypto", Some("1.2")),
        role("reporting", false),
        tablespace("fast", "postgres"),
        table(
            "app",
            "users",
            vec![
                column("id", "integer", false),
                column("email", "character varying(255)", true),
                column("name", "text", true),
            ],
        ),
        table(
            "app",
            "orders",
            vec![
                column("id", "integer", false),
                column("user_id", "integer", false),
            ],
        ),
        index("app", "orders_user_id_idx", "orders", &["user_id"]),
        view(
            "reports",
            "order_counts",
            "SELECT user_id, count(*) FROM app.orders GROUP BY user_id",
            &["app.orders"],
        ),
        trigger_function("app", "touch_updated_at"),
    ]
}

/// The schema the migration should produce from [`current_schema`]
pub fn desired_schema() -> Vec<DatabaseObject> {
    vec![
        extension("pgcrypto", Some("1.3")),
        role("reporting", true),
        tablespace("fast", "admin"),
        table(
            "app",
            "users",
            vec![
                column("id", "bigint", false),
                column_with_default("email", "character varying(255)", false, "''::character varying"),
                column("name", "text", true),
                column_with_default("created_at", "timestamp with time zone", true, "now()"),
            ],
        ),
        table(
            "app",
            "orders",
            vec![
                column("id", "integer", false),
                column("user_id", "integer", false),
            ],
        ),
        index("app", "orders_user_id_idx", "orders", &["user_id"]),
        view(
            "analytics",
            "order_counts",
            "SELECT user_id, count(*) FROM app.orders GROUP BY user_id",
            &["app.orders"],
        ),
        trigger_function("app", "touch_updated_at"),
        trigger("app", "users_touch", "users", "app.touch_updated_at"),
        view(
            "app",
            "active_users",
            "SELECT id, email FROM app.users WHERE email <> ''",
            &["app.users"],
        ),
        view(
            "app",
            "user_orders",
            "SELECT u.id, o.id AS order_id FROM app.active_users u JOIN app.orders o ON o.user_id = u.id",
            &["app.active_users", "app.orders"],
        ),
        sequence("app", "invoice_number_seq"),
        add_function("app"),
    ]
}

pub fn snapshot(label: &str, objects: Vec<DatabaseObject>) -> Snapshot {
    Snapshot {
        source: label.to_string(),
        captured_at: None,
        objects,
    }
}
